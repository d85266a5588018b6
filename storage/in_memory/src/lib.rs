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
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use storage_api::{Cursor, Key, Storage, StorageResult, Tree, Value};

/// record manager with the same tree semantics as the persistent one but
/// held entirely in memory. Used by unit tests and ephemeral partitions.
#[derive(Default)]
pub struct InMemoryDatabase {
    trees: DashMap<String, InMemoryTree>,
}

impl InMemoryDatabase {
    pub fn create() -> InMemoryDatabase {
        InMemoryDatabase::default()
    }
}

impl Storage for InMemoryDatabase {
    type Tree = InMemoryTree;

    fn lookup_tree<T: Into<String>>(&self, name: T) -> StorageResult<InMemoryTree> {
        let name = name.into();
        Ok(self
            .trees
            .entry(name.clone())
            .or_insert_with(|| InMemoryTree::with_name(name))
            .clone())
    }

    fn drop_tree<T: Into<String>>(&self, name: T) -> StorageResult<bool> {
        Ok(self.trees.remove(&name.into()).is_some())
    }

    fn tree_names(&self) -> Vec<String> {
        self.trees.iter().map(|entry| entry.key().clone()).collect()
    }

    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[derive(Default, Debug, Clone)]
pub struct InMemoryTree {
    name: String,
    records: Arc<RwLock<BTreeMap<Binary, Binary>>>,
}

impl InMemoryTree {
    fn with_name(name: String) -> InMemoryTree {
        InMemoryTree {
            name,
            records: Arc::default(),
        }
    }
}

impl Tree for InMemoryTree {
    fn get(&self, key: &Binary) -> StorageResult<Option<Value>> {
        Ok(self.records.read().unwrap().get(key).cloned())
    }

    fn put(&self, key: Key, value: Value) -> StorageResult<Option<Value>> {
        Ok(self.records.write().unwrap().insert(key, value))
    }

    fn remove(&self, key: &Binary) -> StorageResult<Option<Value>> {
        Ok(self.records.write().unwrap().remove(key))
    }

    fn scan(&self) -> StorageResult<Cursor> {
        log::trace!("[SCAN] TREE {:?}", self.name);
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn scan_prefix(&self, prefix: &Binary) -> StorageResult<Cursor> {
        Ok(self
            .records
            .read()
            .unwrap()
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn count(&self) -> StorageResult<usize> {
        Ok(self.records.read().unwrap().len())
    }

    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binary::repr::Datum;

    #[test]
    fn tree_is_shared_between_lookups() {
        let database = InMemoryDatabase::create();
        let first = database.lookup_tree("master").unwrap();
        let second = database.lookup_tree("master").unwrap();

        let key = Binary::pack(&[Datum::from_u64(1)]);
        first.put(key.clone(), Binary::new()).unwrap();
        assert_eq!(second.contains(&key), Ok(true));
    }

    #[test]
    fn prefix_scan_is_bounded() {
        let database = InMemoryDatabase::create();
        let tree = database.lookup_tree("hierarchy").unwrap();
        let composite = |a: u64, b: u64| Binary::pack(&[Datum::from_u64(a), Datum::from_u64(b)]);

        tree.put(composite(1, 10), Binary::new()).unwrap();
        tree.put(composite(1, 11), Binary::new()).unwrap();
        tree.put(composite(2, 12), Binary::new()).unwrap();

        let prefix = Binary::pack(&[Datum::from_u64(1)]);
        assert_eq!(tree.scan_prefix(&prefix).unwrap().count(), 2);
    }
}
