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

use crate::objects::{ObjectClass, ObjectClassKind};
use crate::oids;
use crate::tables::SchemaTable;
use std::collections::{BTreeSet, HashMap};

/// precomputed facts about one object class: the transitive superior
/// closure (without `top`) and the MUST/MAY/allowed attribute sets closed
/// over that closure. All members are canonical OIDs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassClosure {
    pub superiors: BTreeSet<String>,
    pub must: BTreeSet<String>,
    pub may: BTreeSet<String>,
    pub allowed: BTreeSet<String>,
    pub kind: ObjectClassKind,
}

/// the derived cache of closure facts, rebuilt whenever the object-class graph
/// changes. Lookup is by canonical OID.
#[derive(Debug, Default)]
pub struct ClassClosures {
    map: HashMap<String, ClassClosure>,
}

impl ClassClosures {
    pub fn get(&self, oid: &str) -> Option<&ClassClosure> {
        self.map.get(oid)
    }

    pub fn rebuild(&mut self, classes: &SchemaTable<ObjectClass>) {
        self.map.clear();
        for class in classes.iter() {
            let mut superiors = BTreeSet::new();
            let mut must = BTreeSet::new();
            let mut may = BTreeSet::new();

            let mut queue = vec![class.oid.clone()];
            let mut seen = BTreeSet::new();
            while let Some(oid) = queue.pop() {
                if !seen.insert(oid.clone()) {
                    continue;
                }
                if let Some(current) = classes.get(&oid) {
                    must.extend(current.must_oids.iter().cloned());
                    may.extend(current.may_oids.iter().cloned());
                    for superior in &current.superior_oids {
                        if superior != oids::object_class::TOP {
                            superiors.insert(superior.clone());
                        }
                        queue.push(superior.clone());
                    }
                }
            }
            superiors.remove(&class.oid);

            let allowed = must.union(&may).cloned().collect();
            self.map.insert(
                class.oid.clone(),
                ClassClosure {
                    superiors,
                    must,
                    may,
                    allowed,
                    kind: class.kind,
                },
            );
        }
    }
}
