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

use crate::objects::SchemaObject;
use model::{OperationError, OperationResult};
use std::collections::BTreeMap;

/// one per-kind table of the registry, keyed by canonical OID. Name
/// resolution goes through the shared `OidRegistry` first, so the table
/// itself only deals in OIDs.
#[derive(Debug)]
pub struct SchemaTable<T> {
    kind: &'static str,
    by_oid: BTreeMap<String, T>,
}

impl<T: SchemaObject> SchemaTable<T> {
    pub fn new(kind: &'static str) -> SchemaTable<T> {
        SchemaTable {
            kind,
            by_oid: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn contains(&self, oid: &str) -> bool {
        self.by_oid.contains_key(oid)
    }

    pub fn get(&self, oid: &str) -> Option<&T> {
        self.by_oid.get(oid)
    }

    pub fn require(&self, oid: &str) -> OperationResult<&T> {
        self.by_oid
            .get(oid)
            .ok_or_else(|| OperationError::no_such_schema_object(format!("{} {}", self.kind, oid)))
    }

    pub fn insert(&mut self, object: T) -> OperationResult<()> {
        if self.by_oid.contains_key(object.oid()) {
            return Err(OperationError::non_unique_oid(object.oid()));
        }
        self.by_oid.insert(object.oid().to_owned(), object);
        Ok(())
    }

    pub fn remove(&mut self, oid: &str) -> Option<T> {
        self.by_oid.remove(oid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.by_oid.values()
    }

    pub fn len(&self) -> usize {
        self.by_oid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_oid.is_empty()
    }
}
