// Copyright 2020 - present Alex Dukhno
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use binary::Binary;
use std::fmt::{self, Debug, Display, Formatter};
use std::iter::FromIterator;

pub type Key = Binary;
pub type Value = Binary;
pub type StorageResult<R> = Result<R, StorageError>;

/// failures of the record manager. `Io` covers transient device errors,
/// `Corrupt` means the persisted image can not be trusted and the partition
/// must be taken out of service.
#[derive(Debug, PartialEq, Clone)]
pub enum StorageError {
    Io(String),
    Corrupt(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(cause) => write!(f, "storage io failure: {}", cause),
            StorageError::Corrupt(cause) => write!(f, "corrupt store: {}", cause),
        }
    }
}

impl From<StorageError> for model::OperationError {
    fn from(error: StorageError) -> model::OperationError {
        match error {
            StorageError::Io(cause) => model::OperationError::IoError(cause),
            StorageError::Corrupt(cause) => model::OperationError::CorruptStore(cause),
        }
    }
}

pub struct Cursor {
    source: Box<dyn Iterator<Item = (Binary, Binary)>>,
}

impl Debug for Cursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Data Cursor")
    }
}

impl FromIterator<(Binary, Binary)> for Cursor {
    fn from_iter<T: IntoIterator<Item = (Binary, Binary)>>(iter: T) -> Cursor {
        Cursor {
            source: Box::new(iter.into_iter().collect::<Vec<(Binary, Binary)>>().into_iter()),
        }
    }
}

impl Iterator for Cursor {
    type Item = (Binary, Binary);

    fn next(&mut self) -> Option<Self::Item> {
        self.source.next()
    }
}

/// one B+tree of the record manager. Keys are packed `Binary` records;
/// iteration follows the byte order of the keys.
pub trait Tree {
    fn get(&self, key: &Binary) -> StorageResult<Option<Value>>;

    fn put(&self, key: Key, value: Value) -> StorageResult<Option<Value>>;

    fn remove(&self, key: &Binary) -> StorageResult<Option<Value>>;

    fn scan(&self) -> StorageResult<Cursor>;

    fn scan_prefix(&self, prefix: &Binary) -> StorageResult<Cursor>;

    fn contains(&self, key: &Binary) -> StorageResult<bool> {
        self.get(key).map(|value| value.is_some())
    }

    fn count(&self) -> StorageResult<usize>;

    fn flush(&self) -> StorageResult<()>;
}

/// a record manager owning a set of named trees backed by one data file
/// (or one in-memory image). Tree lookup creates the tree if it does not
/// exist yet.
pub trait Storage {
    type Tree: Tree;

    fn lookup_tree<T: Into<String>>(&self, name: T) -> StorageResult<Self::Tree>;

    fn drop_tree<T: Into<String>>(&self, name: T) -> StorageResult<bool>;

    fn tree_names(&self) -> Vec<String>;

    /// commit barrier: all prior writes are on stable storage when this
    /// returns successfully.
    fn flush(&self) -> StorageResult<()>;
}
