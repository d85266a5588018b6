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
use sled::{Db as SledDb, Tree as SledTree};
use std::path::Path;
use storage_api::{Cursor, Key, Storage, StorageError, StorageResult, Tree, Value};

fn storage_error(error: sled::Error) -> StorageError {
    match error {
        sled::Error::Corruption { .. } => StorageError::Corrupt(format!("{}", error)),
        sled::Error::ReportableBug(cause) => StorageError::Corrupt(cause),
        other => StorageError::Io(format!("{}", other)),
    }
}

/// record manager over one sled data file. Every partition owns one
/// `PersistentDatabase`; the master table, the admin table and each index
/// live in their own named tree inside it. sled provides the paged cache
/// and the atomic log-structured commit the mutation path relies on.
pub struct PersistentDatabase {
    sled_db: SledDb,
}

impl PersistentDatabase {
    pub fn open<P: AsRef<Path>>(path: P, cache_capacity: u64) -> StorageResult<PersistentDatabase> {
        let sled_db = sled::Config::new()
            .path(path.as_ref())
            .cache_capacity(cache_capacity)
            .open()
            .map_err(storage_error)?;
        log::debug!(
            "opened record manager at {:?}, recovered: {}",
            path.as_ref(),
            sled_db.was_recovered()
        );
        Ok(PersistentDatabase { sled_db })
    }

    /// `true` when the data file existed before this open.
    pub fn was_recovered(&self) -> bool {
        self.sled_db.was_recovered()
    }
}

impl Storage for PersistentDatabase {
    type Tree = PersistentTree;

    fn lookup_tree<T: Into<String>>(&self, name: T) -> StorageResult<PersistentTree> {
        self.sled_db
            .open_tree(name.into())
            .map(PersistentTree::from)
            .map_err(storage_error)
    }

    fn drop_tree<T: Into<String>>(&self, name: T) -> StorageResult<bool> {
        self.sled_db.drop_tree(name.into()).map_err(storage_error)
    }

    fn tree_names(&self) -> Vec<String> {
        self.sled_db
            .tree_names()
            .into_iter()
            .map(|name| String::from_utf8_lossy(&name).into_owned())
            .collect()
    }

    fn flush(&self) -> StorageResult<()> {
        self.sled_db.flush().map(|_| ()).map_err(storage_error)
    }
}

#[derive(Debug, Clone)]
pub struct PersistentTree {
    sled_tree: SledTree,
}

impl From<SledTree> for PersistentTree {
    fn from(sled_tree: SledTree) -> PersistentTree {
        PersistentTree { sled_tree }
    }
}

impl Tree for PersistentTree {
    fn get(&self, key: &Binary) -> StorageResult<Option<Value>> {
        self.sled_tree
            .get(key.as_ref())
            .map(|value| value.map(|v| Binary::with_data(v.to_vec())))
            .map_err(storage_error)
    }

    fn put(&self, key: Key, value: Value) -> StorageResult<Option<Value>> {
        self.sled_tree
            .insert(key.as_ref(), value.as_ref())
            .map(|old| old.map(|v| Binary::with_data(v.to_vec())))
            .map_err(storage_error)
    }

    fn remove(&self, key: &Binary) -> StorageResult<Option<Value>> {
        self.sled_tree
            .remove(key.as_ref())
            .map(|old| old.map(|v| Binary::with_data(v.to_vec())))
            .map_err(storage_error)
    }

    fn scan(&self) -> StorageResult<Cursor> {
        let mut pairs = vec![];
        for item in self.sled_tree.iter() {
            let (key, value) = item.map_err(storage_error)?;
            pairs.push((Binary::with_data(key.to_vec()), Binary::with_data(value.to_vec())));
        }
        Ok(pairs.into_iter().collect())
    }

    fn scan_prefix(&self, prefix: &Binary) -> StorageResult<Cursor> {
        let mut pairs = vec![];
        for item in self.sled_tree.scan_prefix(prefix.as_ref()) {
            let (key, value) = item.map_err(storage_error)?;
            pairs.push((Binary::with_data(key.to_vec()), Binary::with_data(value.to_vec())));
        }
        Ok(pairs.into_iter().collect())
    }

    fn contains(&self, key: &Binary) -> StorageResult<bool> {
        self.sled_tree.contains_key(key.as_ref()).map_err(storage_error)
    }

    fn count(&self) -> StorageResult<usize> {
        Ok(self.sled_tree.len())
    }

    fn flush(&self) -> StorageResult<()> {
        self.sled_tree.flush().map(|_| ()).map_err(storage_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binary::repr::Datum;

    fn key(id: u64) -> Binary {
        Binary::pack(&[Datum::from_u64(id)])
    }

    fn value(text: &str) -> Binary {
        Binary::pack(&[Datum::from_string(text)])
    }

    #[test]
    fn put_get_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let database = PersistentDatabase::open(dir.path(), 1024 * 1024).unwrap();
        let tree = database.lookup_tree("master").unwrap();

        assert_eq!(tree.put(key(1), value("first")), Ok(None));
        assert_eq!(tree.get(&key(1)), Ok(Some(value("first"))));
        assert_eq!(tree.remove(&key(1)), Ok(Some(value("first"))));
        assert_eq!(tree.get(&key(1)), Ok(None));
    }

    #[test]
    fn prefix_scan_sees_only_matching_keys() {
        let dir = tempfile::tempdir().unwrap();
        let database = PersistentDatabase::open(dir.path(), 1024 * 1024).unwrap();
        let tree = database.lookup_tree("2.5.4.3").unwrap();

        let composite = |id: u64, rest: &str| Binary::pack(&[Datum::from_u64(id), Datum::from_string(rest)]);
        tree.put(composite(1, "a"), Binary::new()).unwrap();
        tree.put(composite(1, "b"), Binary::new()).unwrap();
        tree.put(composite(2, "c"), Binary::new()).unwrap();

        let under_one = tree.scan_prefix(&key(1)).unwrap().collect::<Vec<_>>();
        assert_eq!(under_one.len(), 2);
        assert!(under_one.iter().all(|(k, _)| k.starts_with(&key(1))));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let database = PersistentDatabase::open(dir.path(), 1024 * 1024).unwrap();
            let tree = database.lookup_tree("master").unwrap();
            tree.put(key(7), value("persisted")).unwrap();
            database.flush().unwrap();
        }
        let database = PersistentDatabase::open(dir.path(), 1024 * 1024).unwrap();
        assert!(database.was_recovered());
        let tree = database.lookup_tree("master").unwrap();
        assert_eq!(tree.get(&key(7)), Ok(Some(value("persisted"))));
    }
}
