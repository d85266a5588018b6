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

use super::*;
use filter::parse_filter;
use in_memory::InMemoryDatabase;
use model::SearchScope;
use schema_registry::bootstrap;
use search::SearchRequest;
use std::collections::BTreeSet;
use std::time::Duration;

fn registries() -> Arc<RwLock<Registries>> {
    Arc::new(RwLock::new(bootstrap().unwrap()))
}

fn system_partition() -> Partition<InMemoryDatabase> {
    Partition::open(InMemoryDatabase::create(), PartitionConfig::default(), registries()).unwrap()
}

fn unit(name: &str) -> Entry {
    let mut entry = Entry::new();
    entry.add_value("objectClass", AttributeValue::from("top"));
    entry.add_value("objectClass", AttributeValue::from("organizationalUnit"));
    entry.add_value("ou", AttributeValue::from(name));
    entry
}

fn person(cn: &str, sn: &str) -> Entry {
    let mut entry = Entry::new();
    entry.add_value("objectClass", AttributeValue::from("top"));
    entry.add_value("objectClass", AttributeValue::from("person"));
    entry.add_value("cn", AttributeValue::from(cn));
    entry.add_value("sn", AttributeValue::from(sn));
    entry
}

fn alias_to(target: &str) -> Entry {
    let mut entry = Entry::new();
    entry.add_value("objectClass", AttributeValue::from("top"));
    entry.add_value("objectClass", AttributeValue::from("alias"));
    entry.add_value("objectClass", AttributeValue::from("extensibleObject"));
    entry.add_value("aliasedObjectName", AttributeValue::from(target));
    entry
}

#[cfg(test)]
mod basics {
    use super::*;

    #[test]
    fn open_creates_the_context_entry() {
        let partition = system_partition();
        let context = partition.lookup("ou=system").unwrap().unwrap();
        assert!(context.has_object_class("organizationalUnit"));
        assert_eq!(partition.entry_count().unwrap(), 1);
    }

    #[test]
    fn add_then_lookup_by_any_case() {
        let partition = system_partition();
        partition.add("ou=users,ou=system", unit("users")).unwrap();

        let found = partition.lookup("ou=users,ou=system").unwrap();
        assert!(found.is_some());
        let same = partition.lookup("ou=USERS,ou=SYSTEM").unwrap();
        assert_eq!(found, same);
        assert_eq!(partition.lookup("ou=missing,ou=system").unwrap(), None);
    }

    #[test]
    fn add_rejects_duplicates_and_orphans() {
        let partition = system_partition();
        partition.add("ou=users,ou=system", unit("users")).unwrap();
        assert!(matches!(
            partition.add("ou=Users,ou=System", unit("users")),
            Err(OperationError::EntryAlreadyExists(_))
        ));
        assert!(matches!(
            partition.add("ou=deep,ou=missing,ou=system", unit("deep")),
            Err(OperationError::NoSuchObject(_))
        ));
    }

    #[test]
    fn entries_outside_the_suffix_are_rejected() {
        let partition = system_partition();
        assert!(matches!(
            partition.add("ou=other", unit("other")),
            Err(OperationError::NoSuchObject(_))
        ));
    }

    #[test]
    fn schema_violations_do_not_touch_the_store() {
        let partition = system_partition();
        let before = partition.entry_count().unwrap();
        let mut incomplete = person("x", "y");
        incomplete.remove_attribute("sn");
        assert!(matches!(
            partition.add("cn=x,ou=system", incomplete),
            Err(OperationError::SchemaViolation(_))
        ));
        assert_eq!(partition.entry_count().unwrap(), before);
        // with sn present the same entry lands
        partition.add("cn=x,ou=system", person("x", "y")).unwrap();
    }

    #[test]
    fn ids_are_minted_monotonically() {
        let partition = system_partition();
        let first = partition.add("ou=a,ou=system", unit("a")).unwrap();
        let second = partition.add("ou=b,ou=system", unit("b")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn list_returns_children_in_id_order() {
        let partition = system_partition();
        let root_id = partition.id_for_dn("ou=system").unwrap().unwrap();
        let a = partition.add("ou=a,ou=system", unit("a")).unwrap();
        let b = partition.add("ou=b,ou=system", unit("b")).unwrap();
        assert_eq!(partition.list(root_id).unwrap(), vec![a, b]);
    }
}

#[cfg(test)]
mod modifications {
    use super::*;

    #[test]
    fn modify_patches_value_indices_differentially() {
        let partition = system_partition();
        partition.add("cn=x,ou=system", person("x", "y")).unwrap();
        let id = partition.id_for_dn("cn=x,ou=system").unwrap().unwrap();

        let schema = partition.registries();
        let schema = schema.read().unwrap();
        let object_class_oid = schema.attribute_type("objectClass").unwrap().oid.clone();
        drop(schema);

        let index = partition.user_indices.get(&object_class_oid).unwrap();
        assert!(index.has(&Datum::from_string("person"), id).unwrap());

        partition
            .modify(
                "cn=x,ou=system",
                &[Modification::Add(
                    "description".to_owned(),
                    vec![AttributeValue::from("engineer")],
                )],
            )
            .unwrap();
        let entry = partition.lookup("cn=x,ou=system").unwrap().unwrap();
        assert_eq!(entry.get("description").unwrap().first_text(), Some("engineer"));
        assert!(index.has(&Datum::from_string("person"), id).unwrap());
    }

    #[test]
    fn modify_of_missing_entry_fails() {
        let partition = system_partition();
        assert!(matches!(
            partition.modify(
                "cn=ghost,ou=system",
                &[Modification::Add("description".to_owned(), vec![AttributeValue::from("x")])]
            ),
            Err(OperationError::NoSuchObject(_))
        ));
    }

    #[test]
    fn single_value_cardinality_is_enforced_through_modify() {
        let partition = system_partition();
        partition.add("cn=x,ou=system", person("x", "y")).unwrap();
        partition
            .modify(
                "cn=x,ou=system",
                &[Modification::Add(
                    "objectClass".to_owned(),
                    vec![AttributeValue::from("extensibleObject")],
                )],
            )
            .unwrap();
        partition
            .modify(
                "cn=x,ou=system",
                &[Modification::Add(
                    "aliasedObjectName".to_owned(),
                    vec![AttributeValue::from("ou=system")],
                )],
            )
            .unwrap();
        assert!(matches!(
            partition.modify(
                "cn=x,ou=system",
                &[Modification::Add(
                    "aliasedObjectName".to_owned(),
                    vec![AttributeValue::from("cn=x,ou=system")],
                )]
            ),
            Err(OperationError::SchemaViolation(_))
        ));
    }
}

#[cfg(test)]
mod aliases {
    use super::*;

    #[test]
    fn alias_targeting_an_ancestor_is_rejected() {
        let partition = system_partition();
        assert!(matches!(
            partition.add("cn=a,ou=system", alias_to("ou=system")),
            Err(OperationError::AliasProblem(_))
        ));
    }

    #[test]
    fn alias_to_missing_target_is_a_deref_problem() {
        let partition = system_partition();
        assert!(matches!(
            partition.add("cn=a,ou=system", alias_to("ou=nowhere,ou=system")),
            Err(OperationError::AliasDerefProblem(_))
        ));
    }

    #[test]
    fn alias_chains_are_rejected() {
        let partition = system_partition();
        partition.add("ou=eng,ou=system", unit("eng")).unwrap();
        partition.add("cn=first,ou=system", alias_to("ou=eng,ou=system")).unwrap();
        assert!(matches!(
            partition.add("cn=second,ou=system", alias_to("cn=first,ou=system")),
            Err(OperationError::AliasProblem(_))
        ));
    }

    #[test]
    fn alias_rows_cover_the_ancestor_path() {
        let partition = system_partition();
        partition.add("ou=users,ou=system", unit("users")).unwrap();
        partition.add("ou=eng,ou=system", unit("eng")).unwrap();
        partition
            .add("cn=a,ou=users,ou=system", alias_to("ou=eng,ou=system"))
            .unwrap();

        let users_id = partition.id_for_dn("ou=users,ou=system").unwrap().unwrap();
        let eng_id = partition.id_for_dn("ou=eng,ou=system").unwrap().unwrap();
        let alias_id = partition.id_for_dn("cn=a,ou=users,ou=system").unwrap().unwrap();

        assert!(partition.alias_index.has_id(alias_id).unwrap());
        assert!(partition
            .one_alias_index
            .has(&Datum::from_u64(users_id), eng_id)
            .unwrap());
        assert!(partition
            .sub_alias_index
            .has(&Datum::from_u64(users_id), eng_id)
            .unwrap());
    }

    #[test]
    fn sibling_target_skips_the_one_level_row() {
        let partition = system_partition();
        partition.add("ou=eng,ou=system", unit("eng")).unwrap();
        partition.add("cn=a,ou=system", alias_to("ou=eng,ou=system")).unwrap();

        let root_id = partition.id_for_dn("ou=system").unwrap().unwrap();
        let eng_id = partition.id_for_dn("ou=eng,ou=system").unwrap().unwrap();
        assert!(!partition
            .one_alias_index
            .has(&Datum::from_u64(root_id), eng_id)
            .unwrap());
    }

    #[test]
    fn alias_target_is_protected_from_delete() {
        let partition = system_partition();
        partition.add("ou=eng,ou=system", unit("eng")).unwrap();
        partition.add("cn=a,ou=system", alias_to("ou=eng,ou=system")).unwrap();
        assert!(matches!(
            partition.delete("ou=eng,ou=system"),
            Err(OperationError::UnwillingToPerform(_))
        ));
        // dropping the alias first releases the target
        partition.delete("cn=a,ou=system").unwrap();
        partition.delete("ou=eng,ou=system").unwrap();
    }

    #[test]
    fn deleting_an_alias_clears_every_row(){
        let partition = system_partition();
        partition.add("ou=users,ou=system", unit("users")).unwrap();
        partition.add("ou=eng,ou=system", unit("eng")).unwrap();
        partition
            .add("cn=a,ou=users,ou=system", alias_to("ou=eng,ou=system"))
            .unwrap();
        let alias_id = partition.id_for_dn("cn=a,ou=users,ou=system").unwrap().unwrap();
        partition.delete("cn=a,ou=users,ou=system").unwrap();

        assert!(!partition.alias_index.has_id(alias_id).unwrap());
        assert_eq!(partition.one_alias_index.count().unwrap(), 0);
        assert_eq!(partition.sub_alias_index.count().unwrap(), 0);
    }
}

#[cfg(test)]
mod tree_operations {
    use super::*;

    #[test]
    fn delete_restores_the_pre_add_image() {
        let partition = system_partition();
        let master_before = partition.master.count().unwrap();
        let dn_before = partition.dn_index.count().unwrap();
        let hierarchy_before = partition.hierarchy_index.count().unwrap();
        let existence_before = partition.existence_index.count().unwrap();

        partition.add("ou=scratch,ou=system", unit("scratch")).unwrap();
        partition.delete("ou=scratch,ou=system").unwrap();

        assert_eq!(partition.master.count().unwrap(), master_before);
        assert_eq!(partition.dn_index.count().unwrap(), dn_before);
        assert_eq!(partition.hierarchy_index.count().unwrap(), hierarchy_before);
        assert_eq!(partition.existence_index.count().unwrap(), existence_before);
    }

    #[test]
    fn delete_of_a_non_leaf_is_refused() {
        let partition = system_partition();
        partition.add("ou=a,ou=system", unit("a")).unwrap();
        partition.add("ou=b,ou=a,ou=system", unit("b")).unwrap();
        assert!(matches!(
            partition.delete("ou=a,ou=system"),
            Err(OperationError::UnwillingToPerform(_))
        ));
    }

    #[test]
    fn rename_rewrites_the_rdn_attribute() {
        let partition = system_partition();
        partition.add("cn=x,ou=system", person("x", "y")).unwrap();
        partition.rename("cn=x,ou=system", "cn=z", true).unwrap();

        assert_eq!(partition.lookup("cn=x,ou=system").unwrap(), None);
        let renamed = partition.lookup("cn=z,ou=system").unwrap().unwrap();
        let cn = renamed.get("cn").unwrap();
        assert!(cn.contains(&AttributeValue::from("z")));
        assert!(!cn.contains(&AttributeValue::from("x")));
    }

    #[test]
    fn rename_keeps_the_old_value_without_delete_old_rdn() {
        let partition = system_partition();
        partition.add("cn=x,ou=system", person("x", "y")).unwrap();
        partition.rename("cn=x,ou=system", "cn=z", false).unwrap();
        let renamed = partition.lookup("cn=z,ou=system").unwrap().unwrap();
        let cn = renamed.get("cn").unwrap();
        assert!(cn.contains(&AttributeValue::from("z")));
        assert!(cn.contains(&AttributeValue::from("x")));
    }

    #[test]
    fn move_cascades_dn_changes_through_the_subtree() {
        let partition = system_partition();
        partition.add("ou=users,ou=system", unit("users")).unwrap();
        partition.add("ou=a,ou=system", unit("a")).unwrap();
        partition.add("ou=b,ou=a,ou=system", unit("b")).unwrap();

        partition.move_entry("ou=a,ou=system", "ou=users,ou=system").unwrap();

        assert!(partition.lookup("ou=a,ou=users,ou=system").unwrap().is_some());
        assert!(partition.lookup("ou=b,ou=a,ou=users,ou=system").unwrap().is_some());
        assert_eq!(partition.lookup("ou=b,ou=a,ou=system").unwrap(), None);
        assert_eq!(partition.lookup("ou=a,ou=system").unwrap(), None);
    }

    #[test]
    fn move_below_itself_is_refused() {
        let partition = system_partition();
        partition.add("ou=a,ou=system", unit("a")).unwrap();
        partition.add("ou=b,ou=a,ou=system", unit("b")).unwrap();
        assert!(matches!(
            partition.move_entry("ou=a,ou=system", "ou=b,ou=a,ou=system"),
            Err(OperationError::UnwillingToPerform(_))
        ));
    }

    #[test]
    fn move_and_rename_composes_both_steps() {
        let partition = system_partition();
        partition.add("ou=users,ou=system", unit("users")).unwrap();
        partition.add("cn=x,ou=system", person("x", "y")).unwrap();

        partition
            .move_and_rename("cn=x,ou=system", "ou=users,ou=system", "cn=z", true)
            .unwrap();
        assert!(partition.lookup("cn=z,ou=users,ou=system").unwrap().is_some());
        assert_eq!(partition.lookup("cn=x,ou=system").unwrap(), None);
    }

    #[test]
    fn moved_alias_rows_follow_the_new_ancestor_path() {
        let partition = system_partition();
        partition.add("ou=users,ou=system", unit("users")).unwrap();
        partition.add("ou=box,ou=system", unit("box")).unwrap();
        partition.add("ou=eng,ou=system", unit("eng")).unwrap();
        partition
            .add("cn=a,ou=box,ou=system", alias_to("ou=eng,ou=system"))
            .unwrap();

        let eng_id = partition.id_for_dn("ou=eng,ou=system").unwrap().unwrap();
        let box_id = partition.id_for_dn("ou=box,ou=system").unwrap().unwrap();
        assert!(partition.sub_alias_index.has(&Datum::from_u64(box_id), eng_id).unwrap());

        partition.move_entry("ou=box,ou=system", "ou=users,ou=system").unwrap();

        let users_id = partition.id_for_dn("ou=users,ou=system").unwrap().unwrap();
        assert!(partition.sub_alias_index.has(&Datum::from_u64(box_id), eng_id).unwrap());
        assert!(partition.sub_alias_index.has(&Datum::from_u64(users_id), eng_id).unwrap());
    }
}

#[cfg(test)]
mod searching {
    use super::*;

    fn populated() -> Partition<InMemoryDatabase> {
        let partition = system_partition();
        partition.add("ou=users,ou=system", unit("users")).unwrap();
        partition.add("cn=john,ou=users,ou=system", person("john", "doe")).unwrap();
        partition.add("cn=jane,ou=users,ou=system", person("jane", "roe")).unwrap();
        partition.add("ou=groups,ou=system", unit("groups")).unwrap();
        partition
    }

    fn dns(results: Vec<OperationResult<SearchEntry>>) -> Vec<String> {
        results.into_iter().map(|result| result.unwrap().dn).collect()
    }

    #[test]
    fn subtree_search_sees_base_and_descendants() {
        let partition = populated();
        let request = SearchRequest::new("ou=system", SearchScope::Subtree, parse_filter("(objectClass=*)").unwrap());
        let found = dns(partition.search(request).unwrap().collect());
        assert_eq!(found.len(), 5);
    }

    #[test]
    fn one_level_search_sees_only_children() {
        let partition = populated();
        let request = SearchRequest::new("ou=system", SearchScope::OneLevel, parse_filter("(objectClass=*)").unwrap());
        let found = dns(partition.search(request).unwrap().collect());
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|dn| dn.ends_with(",ou=system")));
    }

    #[test]
    fn object_search_sees_the_base_only() {
        let partition = populated();
        let request = SearchRequest::new(
            "cn=john,ou=users,ou=system",
            SearchScope::Object,
            parse_filter("(objectClass=person)").unwrap(),
        );
        let found = dns(partition.search(request).unwrap().collect());
        assert_eq!(found, vec!["cn=john,ou=users,ou=system".to_owned()]);
    }

    #[test]
    fn filters_narrow_the_result() {
        let partition = populated();
        let request = SearchRequest::new(
            "ou=system",
            SearchScope::Subtree,
            parse_filter("(&(objectClass=person)(sn=doe))").unwrap(),
        );
        let found = dns(partition.search(request).unwrap().collect());
        assert_eq!(found, vec!["cn=john,ou=users,ou=system".to_owned()]);
    }

    #[test]
    fn search_of_a_missing_base_fails() {
        let partition = populated();
        let request = SearchRequest::new("ou=void,ou=system", SearchScope::Subtree, parse_filter("(objectClass=*)").unwrap());
        assert!(matches!(partition.search(request), Err(OperationError::NoSuchObject(_))));
    }

    #[test]
    fn size_limit_emits_exactly_the_limit_then_fails() {
        let partition = system_partition();
        for index in 0..10 {
            partition
                .add(&format!("ou=unit{},ou=system", index), unit(&format!("unit{}", index)))
                .unwrap();
        }
        let request = SearchRequest::new("ou=system", SearchScope::Subtree, parse_filter("(objectClass=*)").unwrap())
            .with_size_limit(3);
        let results = partition.search(request).unwrap().collect::<Vec<_>>();
        assert_eq!(results.len(), 4);
        assert!(results[..3].iter().all(Result::is_ok));
        assert_eq!(results[3], Err(OperationError::SizeLimitExceeded(3)));
    }

    #[test]
    fn time_limit_cuts_the_walk() {
        let partition = populated();
        let request = SearchRequest::new("ou=system", SearchScope::Subtree, parse_filter("(objectClass=*)").unwrap())
            .with_time_limit(Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        let results = partition.search(request).unwrap().collect::<Vec<_>>();
        assert_eq!(results, vec![Err(OperationError::TimeLimitExceeded)]);
    }

    #[test]
    fn projection_honours_the_request_tokens() {
        let partition = populated();
        let request = SearchRequest::new(
            "cn=john,ou=users,ou=system",
            SearchScope::Object,
            parse_filter("(objectClass=*)").unwrap(),
        )
        .with_attributes(vec!["1.1".to_owned()]);
        let results = partition.search(request).unwrap().collect::<Vec<_>>();
        assert!(results[0].as_ref().unwrap().entry.is_empty());

        let request = SearchRequest::new(
            "cn=john,ou=users,ou=system",
            SearchScope::Object,
            parse_filter("(objectClass=*)").unwrap(),
        )
        .with_attributes(vec!["cn".to_owned()]);
        let results = partition.search(request).unwrap().collect::<Vec<_>>();
        let entry = &results[0].as_ref().unwrap().entry;
        assert!(entry.has_attribute("cn"));
        assert!(!entry.has_attribute("sn"));
    }

    #[test]
    fn optimizer_and_full_scan_agree() {
        let mut config = PartitionConfig::default();
        config.indexed_attributes.push("ou".to_owned());
        let optimized = Partition::open(InMemoryDatabase::create(), config, registries()).unwrap();
        let mut config = PartitionConfig::default();
        config.optimizer_enabled = false;
        let scanning = Partition::open(InMemoryDatabase::create(), config, registries()).unwrap();

        for partition in [&optimized, &scanning].iter() {
            partition.add("ou=users,ou=system", unit("users")).unwrap();
            partition.add("ou=groups,ou=system", unit("groups")).unwrap();
            partition.add("cn=john,ou=users,ou=system", person("john", "doe")).unwrap();
        }
        let request = || {
            SearchRequest::new(
                "ou=system",
                SearchScope::Subtree,
                parse_filter("(|(ou=users)(ou=groups))").unwrap(),
            )
        };
        let fast = dns(optimized.search(request()).unwrap().collect());
        let slow = dns(scanning.search(request()).unwrap().collect());
        assert_eq!(fast, slow);
        assert_eq!(fast.len(), 2);
    }

    #[test]
    fn search_soundness_against_direct_evaluation() {
        let partition = populated();
        let filter = parse_filter("(|(sn=doe)(ou=groups))").unwrap();
        let request = SearchRequest::new("ou=system", SearchScope::Subtree, filter.clone());
        let found = partition
            .search(request)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
            .into_iter()
            .map(|result| result.id)
            .collect::<BTreeSet<u64>>();

        let schema = partition.registries();
        let schema = schema.read().unwrap();
        let evaluator = filter::FilterEvaluator::from(&*schema);
        let mut expected = BTreeSet::new();
        let root_id = partition.id_for_dn("ou=system").unwrap().unwrap();
        let mut queue = vec![root_id];
        while let Some(id) = queue.pop() {
            queue.extend(partition.list(id).unwrap());
            let stored = partition.get(id).unwrap().unwrap();
            if evaluator.evaluate(&filter, &stored.entry).unwrap() {
                expected.insert(id);
            }
        }
        assert_eq!(found, expected);
    }
}

#[cfg(test)]
mod properties {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn dn_index_stays_a_bijection_under_random_operations() {
        let partition = system_partition();
        let mut rng = StdRng::seed_from_u64(17);
        let mut live: Vec<String> = vec![];

        for step in 0..200 {
            match rng.gen_range(0..4) {
                0 | 1 => {
                    let dn = format!("ou=n{},ou=system", step);
                    partition.add(&dn, unit(&format!("n{}", step))).unwrap();
                    live.push(dn);
                }
                2 if !live.is_empty() => {
                    let victim = rng.gen_range(0..live.len());
                    let dn = live.remove(victim);
                    partition.delete(&dn).unwrap();
                }
                3 if !live.is_empty() => {
                    let target = rng.gen_range(0..live.len());
                    partition
                        .modify(
                            &live[target],
                            &[Modification::Replace(
                                "description".to_owned(),
                                vec![AttributeValue::from("touched")],
                            )],
                        )
                        .unwrap();
                }
                _ => {}
            }
        }

        // the normalized-DN index pairs off exactly with the master table
        assert_eq!(partition.dn_index.count().unwrap(), partition.master.count().unwrap());
        assert_eq!(partition.master.count().unwrap(), live.len() + 1);
        for dn in &live {
            let id = partition.id_for_dn(dn).unwrap().unwrap();
            let stored = partition.get(id).unwrap().unwrap();
            assert_eq!(partition.id_for_dn(&stored.normalized_dn).unwrap(), Some(id));
            // every indexed value of a live entry has its forward row
            assert!(partition
                .existence_index
                .has(&Datum::from_string("2.5.4.0"), id)
                .unwrap());
        }
    }
}

#[cfg(test)]
mod durability {
    use super::*;
    use persistent::PersistentDatabase;

    #[test]
    fn entries_survive_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let shared = registries();
        {
            let storage = PersistentDatabase::open(dir.path(), PartitionConfig::default().cache_bytes()).unwrap();
            let partition = Partition::open(storage, PartitionConfig::default(), shared.clone()).unwrap();
            partition.add("ou=users,ou=system", unit("users")).unwrap();
            partition.add("cn=john,ou=users,ou=system", person("john", "doe")).unwrap();
            partition.sync().unwrap();
        }
        let storage = PersistentDatabase::open(dir.path(), PartitionConfig::default().cache_bytes()).unwrap();
        let partition = Partition::open(storage, PartitionConfig::default(), shared).unwrap();
        assert!(partition.lookup("cn=john,ou=users,ou=system").unwrap().is_some());
        // the sequence picks up past the recovered ids
        let next = partition.add("ou=fresh,ou=system", unit("fresh")).unwrap();
        let john = partition.id_for_dn("cn=john,ou=users,ou=system").unwrap().unwrap();
        assert!(next > john);
    }

    #[test]
    fn reopen_with_a_different_suffix_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let shared = registries();
        {
            let storage = PersistentDatabase::open(dir.path(), PartitionConfig::default().cache_bytes()).unwrap();
            Partition::open(storage, PartitionConfig::default(), shared.clone()).unwrap();
        }
        let storage = PersistentDatabase::open(dir.path(), PartitionConfig::default().cache_bytes()).unwrap();
        let result = Partition::open(storage, PartitionConfig::with_suffix("ou=elsewhere"), shared);
        assert!(matches!(result, Err(OperationError::UnwillingToPerform(_))));
    }
}
