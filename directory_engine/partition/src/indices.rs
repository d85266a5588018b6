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

use binary::{repr::Datum, Binary};
use storage_api::{StorageResult, Tree};

/// names of the system trees inside one partition's record manager.
pub mod names {
    pub const MASTER: &str = "master";
    pub const ADMIN: &str = "admin";
    pub const NORMALIZED_DN: &str = "dn";
    pub const USER_PROVIDED_DN: &str = "updn";
    pub const HIERARCHY: &str = "hierarchy";
    pub const EXISTENCE: &str = "existence";
    pub const ALIAS: &str = "alias";
    pub const ONE_ALIAS: &str = "onealias";
    pub const SUB_ALIAS: &str = "subalias";

    pub fn reverse(forward: &str) -> String {
        format!("{}_r", forward)
    }
}

/// one index: a forward tree mapping key to id set and a reverse tree
/// mapping id to key set. Both sides store composite keys with empty
/// values, so a (key, id) pair inserts and drops idempotently and either
/// side lists through a stable prefix scan.
#[derive(Debug)]
pub struct Index<T: Tree> {
    forward: T,
    reverse: T,
}

fn forward_key(key: &Datum, id: u64) -> Binary {
    Binary::pack(&[key.clone(), Datum::from_u64(id)])
}

fn reverse_key(id: u64, key: &Datum) -> Binary {
    Binary::pack(&[Datum::from_u64(id), key.clone()])
}

fn id_prefix(id: u64) -> Binary {
    Binary::pack(&[Datum::from_u64(id)])
}

fn key_prefix(key: &Datum) -> Binary {
    Binary::pack(&[key.clone()])
}

impl<T: Tree> Index<T> {
    pub fn new(forward: T, reverse: T) -> Index<T> {
        Index { forward, reverse }
    }

    pub fn insert(&self, key: &Datum, id: u64) -> StorageResult<()> {
        self.forward.put(forward_key(key, id), Binary::new())?;
        self.reverse.put(reverse_key(id, key), Binary::new())?;
        Ok(())
    }

    pub fn drop(&self, key: &Datum, id: u64) -> StorageResult<bool> {
        let existed = self.forward.remove(&forward_key(key, id))?.is_some();
        self.reverse.remove(&reverse_key(id, key))?;
        Ok(existed)
    }

    pub fn has(&self, key: &Datum, id: u64) -> StorageResult<bool> {
        self.forward.contains(&forward_key(key, id))
    }

    pub fn has_key(&self, key: &Datum) -> StorageResult<bool> {
        Ok(self.forward.scan_prefix(&key_prefix(key))?.next().is_some())
    }

    pub fn has_id(&self, id: u64) -> StorageResult<bool> {
        Ok(self.reverse.scan_prefix(&id_prefix(id))?.next().is_some())
    }

    /// ids recorded under one key, in id order.
    pub fn ids_for(&self, key: &Datum) -> StorageResult<Vec<u64>> {
        let mut ids = vec![];
        for (composite, _) in self.forward.scan_prefix(&key_prefix(key))? {
            let datums = composite.unpack();
            if let Some(last) = datums.last() {
                ids.push(last.as_u64());
            }
        }
        Ok(ids)
    }

    /// the single id under a unique key, if present.
    pub fn id_for(&self, key: &Datum) -> StorageResult<Option<u64>> {
        Ok(self.ids_for(key)?.into_iter().next())
    }

    /// keys recorded against one id, in key order.
    pub fn keys_for(&self, id: u64) -> StorageResult<Vec<Datum>> {
        let mut keys = vec![];
        for (composite, _) in self.reverse.scan_prefix(&id_prefix(id))? {
            let mut datums = composite.unpack();
            if datums.len() == 2 {
                keys.push(datums.remove(1));
            }
        }
        Ok(keys)
    }

    /// drops every row of the id, both directions. Returns the dropped keys.
    pub fn drop_id(&self, id: u64) -> StorageResult<Vec<Datum>> {
        let keys = self.keys_for(id)?;
        for key in &keys {
            self.drop(key, id)?;
        }
        Ok(keys)
    }

    pub fn count(&self) -> StorageResult<usize> {
        self.forward.count()
    }

    pub fn flush(&self) -> StorageResult<()> {
        self.forward.flush()?;
        self.reverse.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use in_memory::InMemoryDatabase;
    use storage_api::Storage;

    fn index() -> Index<in_memory::InMemoryTree> {
        let database = InMemoryDatabase::create();
        Index::new(
            database.lookup_tree("test").unwrap(),
            database.lookup_tree("test_r").unwrap(),
        )
    }

    #[test]
    fn insert_is_idempotent() {
        let index = index();
        let key = Datum::from_string("person");
        index.insert(&key, 7).unwrap();
        index.insert(&key, 7).unwrap();
        assert_eq!(index.ids_for(&key).unwrap(), vec![7]);
        assert_eq!(index.count().unwrap(), 1);
    }

    #[test]
    fn forward_and_reverse_stay_in_step() {
        let index = index();
        let person = Datum::from_string("person");
        let unit = Datum::from_string("organizationalUnit");
        index.insert(&person, 1).unwrap();
        index.insert(&person, 2).unwrap();
        index.insert(&unit, 2).unwrap();

        assert_eq!(index.ids_for(&person).unwrap(), vec![1, 2]);
        // keys pack length-first, so the shorter key lists first
        assert_eq!(index.keys_for(2).unwrap(), vec![person.clone(), unit.clone()]);

        assert!(index.drop(&person, 2).unwrap());
        assert_eq!(index.ids_for(&person).unwrap(), vec![1]);
        assert_eq!(index.keys_for(2).unwrap(), vec![unit]);
    }

    #[test]
    fn drop_id_clears_both_directions() {
        let index = index();
        let key_a = Datum::from_string("a");
        let key_b = Datum::from_string("b");
        index.insert(&key_a, 5).unwrap();
        index.insert(&key_b, 5).unwrap();
        index.insert(&key_a, 6).unwrap();

        let dropped = index.drop_id(5).unwrap();
        assert_eq!(dropped.len(), 2);
        assert!(!index.has_id(5).unwrap());
        assert_eq!(index.ids_for(&key_a).unwrap(), vec![6]);
    }

    #[test]
    fn numeric_keys_list_in_numeric_order() {
        let index = index();
        for id in [300u64, 2, 40].iter() {
            index.insert(&Datum::from_u64(1), *id).unwrap();
        }
        assert_eq!(index.ids_for(&Datum::from_u64(1)).unwrap(), vec![2, 40, 300]);
    }
}
