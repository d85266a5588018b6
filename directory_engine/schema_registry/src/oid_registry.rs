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

use model::{OperationError, OperationResult};
use std::collections::{BTreeSet, HashMap};

fn is_numeric_oid(value: &str) -> bool {
    value.contains('.') && value.split('.').all(|arc| !arc.is_empty() && arc.chars().all(|ch| ch.is_ascii_digit()))
}

/// aliases every name of every registered schema object to its canonical
/// OID. Names are case-insensitive; an OID always resolves to itself once
/// registered.
#[derive(Debug, Default)]
pub struct OidRegistry {
    names: HashMap<String, String>,
    oids: BTreeSet<String>,
}

impl OidRegistry {
    pub fn new() -> OidRegistry {
        OidRegistry::default()
    }

    pub fn has_oid(&self, oid: &str) -> bool {
        self.oids.contains(oid)
    }

    /// binds the object's names to its OID. Fails with `NonUniqueOid` when
    /// the OID is taken or one of the names already aliases a different OID.
    pub fn register(&mut self, oid: &str, names: &[String]) -> OperationResult<()> {
        if self.oids.contains(oid) {
            return Err(OperationError::non_unique_oid(oid));
        }
        for name in names {
            let key = name.to_ascii_lowercase();
            if let Some(existing) = self.names.get(&key) {
                if existing != oid {
                    return Err(OperationError::non_unique_oid(format!(
                        "name {} already aliases {}",
                        name, existing
                    )));
                }
            }
        }
        self.oids.insert(oid.to_owned());
        for name in names {
            self.names.insert(name.to_ascii_lowercase(), oid.to_owned());
        }
        Ok(())
    }

    pub fn unregister(&mut self, oid: &str, names: &[String]) {
        self.oids.remove(oid);
        for name in names {
            let key = name.to_ascii_lowercase();
            if self.names.get(&key).map(String::as_str) == Some(oid) {
                self.names.remove(&key);
            }
        }
    }

    /// canonical OID for a name or an OID. Unknown inputs fail with
    /// `NoSuchSchemaObject`.
    pub fn resolve(&self, name_or_oid: &str) -> OperationResult<String> {
        if is_numeric_oid(name_or_oid) {
            return if self.oids.contains(name_or_oid) {
                Ok(name_or_oid.to_owned())
            } else {
                Err(OperationError::no_such_schema_object(name_or_oid))
            };
        }
        self.names
            .get(&name_or_oid.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| OperationError::no_such_schema_object(name_or_oid))
    }

    pub fn len(&self) -> usize {
        self.oids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_case_insensitively() {
        let mut registry = OidRegistry::new();
        registry
            .register("2.5.4.3", &["cn".to_owned(), "commonName".to_owned()])
            .unwrap();
        assert_eq!(registry.resolve("CN").unwrap(), "2.5.4.3");
        assert_eq!(registry.resolve("commonname").unwrap(), "2.5.4.3");
        assert_eq!(registry.resolve("2.5.4.3").unwrap(), "2.5.4.3");
    }

    #[test]
    fn duplicate_oid_is_rejected() {
        let mut registry = OidRegistry::new();
        registry.register("2.5.4.3", &["cn".to_owned()]).unwrap();
        assert_eq!(
            registry.register("2.5.4.3", &["other".to_owned()]),
            Err(OperationError::non_unique_oid("2.5.4.3"))
        );
    }

    #[test]
    fn name_stealing_is_rejected() {
        let mut registry = OidRegistry::new();
        registry.register("2.5.4.3", &["cn".to_owned()]).unwrap();
        assert!(registry.register("2.5.4.4", &["cn".to_owned()]).is_err());
    }

    #[test]
    fn unknown_lookups_fail() {
        let registry = OidRegistry::new();
        assert_eq!(
            registry.resolve("missing"),
            Err(OperationError::no_such_schema_object("missing"))
        );
        assert_eq!(
            registry.resolve("1.2.3"),
            Err(OperationError::no_such_schema_object("1.2.3"))
        );
    }

    #[test]
    fn unregister_releases_names() {
        let mut registry = OidRegistry::new();
        registry.register("2.5.4.3", &["cn".to_owned()]).unwrap();
        registry.unregister("2.5.4.3", &["cn".to_owned()]);
        assert!(registry.resolve("cn").is_err());
        assert!(registry.register("2.5.4.3", &["cn".to_owned()]).is_ok());
    }
}
