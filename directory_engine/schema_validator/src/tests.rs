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
use model::Entry;
use naming::Rdn;
use schema_registry::bootstrap;

fn person_entry() -> Entry {
    let mut entry = Entry::new();
    entry.add_value("objectClass", AttributeValue::from("top"));
    entry.add_value("objectClass", AttributeValue::from("person"));
    entry.add_value("cn", AttributeValue::from("John Doe"));
    entry.add_value("sn", AttributeValue::from("Doe"));
    entry
}

fn unit_entry() -> Entry {
    let mut entry = Entry::new();
    entry.add_value("objectClass", AttributeValue::from("top"));
    entry.add_value("objectClass", AttributeValue::from("organizationalUnit"));
    entry.add_value("ou", AttributeValue::from("users"));
    entry
}

#[cfg(test)]
mod validation {
    use super::*;

    #[test]
    fn well_formed_person_passes() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let validated = validator.validate(&person_entry()).unwrap();
        assert!(validated.has_object_class("person"));
        assert!(validated.has_object_class("top"));
    }

    #[test]
    fn missing_must_attribute_is_rejected() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let mut entry = person_entry();
        entry.remove_attribute("sn");
        match validator.validate(&entry) {
            Err(OperationError::SchemaViolation(message)) => assert!(message.contains("sn")),
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn unknown_attribute_is_rejected_even_with_extensible_object() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let mut entry = person_entry();
        entry.add_value("objectClass", AttributeValue::from("extensibleObject"));
        entry.add_value("favouriteDrink", AttributeValue::from("tea"));
        assert_eq!(
            validator.validate(&entry),
            Err(OperationError::unknown_attribute("favouriteDrink"))
        );
    }

    #[test]
    fn extensible_object_lifts_the_may_restriction_only() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let mut entry = person_entry();
        // mail is registered but not allowed on person
        entry.add_value("mail", AttributeValue::from("john@example.com"));
        assert!(matches!(validator.validate(&entry), Err(OperationError::SchemaViolation(_))));

        entry.add_value("objectClass", AttributeValue::from("extensibleObject"));
        assert!(validator.validate(&entry).is_ok());
    }

    #[test]
    fn missing_structural_class_is_rejected() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let mut entry = Entry::new();
        entry.add_value("objectClass", AttributeValue::from("top"));
        entry.add_value("cn", AttributeValue::from("x"));
        match validator.validate(&entry) {
            Err(OperationError::SchemaViolation(message)) => assert!(message.contains("no structural")),
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn two_unrelated_structural_classes_are_rejected() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let mut entry = person_entry();
        entry.add_value("objectClass", AttributeValue::from("organizationalUnit"));
        entry.add_value("ou", AttributeValue::from("staff"));
        match validator.validate(&entry) {
            Err(OperationError::SchemaViolation(message)) => assert!(message.contains("multiple structural")),
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn subordinate_structural_class_chain_is_accepted() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let mut entry = person_entry();
        entry.add_value("objectClass", AttributeValue::from("organizationalPerson"));
        let validated = validator.validate(&entry).unwrap();
        assert_eq!(
            validator.structural_class_of(&validated).unwrap(),
            registries.object_class("organizationalPerson").unwrap().oid
        );
    }

    #[test]
    fn closure_is_written_back() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let mut entry = person_entry();
        entry.remove_attribute("objectClass");
        entry.add_value("objectClass", AttributeValue::from("inetOrgPerson"));
        let validated = validator.validate(&entry).unwrap();
        for class in ["top", "person", "organizationalPerson", "inetOrgPerson"].iter() {
            assert!(validated.has_object_class(class), "{} missing from closure", class);
        }
    }

    #[test]
    fn single_valued_attribute_rejects_second_value() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let mut entry = unit_entry();
        entry.add_value("objectClass", AttributeValue::from("extensibleObject"));
        entry.add_value("aliasedObjectName", AttributeValue::from("ou=a,ou=system"));
        entry.add_value("aliasedObjectName", AttributeValue::from("ou=b,ou=system"));
        match validator.validate(&entry) {
            Err(OperationError::SchemaViolation(message)) => assert!(message.contains("single valued")),
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn syntax_failure_is_reported_per_attribute() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let mut entry = unit_entry();
        entry.add_value("objectClass", AttributeValue::from("extensibleObject"));
        entry.add_value("aliasedObjectName", AttributeValue::from("not a dn at all"));
        assert!(matches!(
            validator.validate(&entry),
            Err(OperationError::InvalidAttributeSyntax { .. })
        ));
    }

    #[test]
    fn human_readable_bytes_are_coerced_to_text() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let mut entry = unit_entry();
        entry.add_value("description", AttributeValue::bytes("printable".as_bytes().to_vec()));
        let validated = validator.validate(&entry).unwrap();
        assert_eq!(
            validated.get("description").unwrap().values(),
            &[AttributeValue::text("printable")]
        );
    }

    #[test]
    fn group_members_must_be_dns() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let mut group = Entry::new();
        group.add_value("objectClass", AttributeValue::from("top"));
        group.add_value("objectClass", AttributeValue::from("groupOfNames"));
        group.add_value("cn", AttributeValue::from("admins"));
        group.add_value("member", AttributeValue::from("cn=x,ou=system"));
        assert!(validator.validate(&group).is_ok());

        group.add_value("member", AttributeValue::from("definitely not a dn"));
        assert!(matches!(
            validator.validate(&group),
            Err(OperationError::InvalidAttributeSyntax { .. })
        ));
    }

    #[test]
    fn broken_utf8_in_human_readable_syntax_is_rejected() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let mut entry = unit_entry();
        entry.add_value("description", AttributeValue::bytes(vec![0xC3, 0x28]));
        assert!(matches!(
            validator.validate(&entry),
            Err(OperationError::InvalidAttributeSyntax { .. })
        ));
    }
}

#[cfg(test)]
mod modifications {
    use super::*;

    fn rdn() -> Rdn {
        Rdn::single("cn", "John Doe")
    }

    #[test]
    fn add_and_replace_apply_in_order() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let entry = person_entry();
        let changed = validator
            .apply_modifications(
                &entry,
                &rdn(),
                &[
                    Modification::Add("telephoneNumber".to_owned(), vec![AttributeValue::from("555 1234")]),
                    Modification::Replace("sn".to_owned(), vec![AttributeValue::from("Smith")]),
                ],
            )
            .unwrap();
        assert!(changed.has_attribute("telephoneNumber"));
        assert_eq!(changed.get("sn").unwrap().first_text(), Some("Smith"));
    }

    #[test]
    fn empty_replace_of_unknown_attribute_is_silently_accepted() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        let entry = person_entry();
        let unchanged = validator
            .apply_modifications(&entry, &rdn(), &[Modification::Replace("unknownAttr".to_owned(), vec![])])
            .unwrap();
        assert_eq!(unchanged.get("cn"), entry.get("cn"));
    }

    #[test]
    fn non_empty_change_of_unknown_attribute_is_rejected() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        assert_eq!(
            validator.apply_modifications(
                &person_entry(),
                &rdn(),
                &[Modification::Add("unknownAttr".to_owned(), vec![AttributeValue::from("v")])]
            ),
            Err(OperationError::unknown_attribute("unknownAttr"))
        );
    }

    #[test]
    fn removing_a_must_attribute_is_rejected() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        assert!(matches!(
            validator.apply_modifications(&person_entry(), &rdn(), &[Modification::Remove("sn".to_owned(), vec![])]),
            Err(OperationError::SchemaViolation(_))
        ));
    }

    #[test]
    fn rdn_value_is_protected_from_remove() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        assert!(matches!(
            validator.apply_modifications(
                &person_entry(),
                &rdn(),
                &[Modification::Remove("cn".to_owned(), vec![AttributeValue::from("John Doe")])]
            ),
            Err(OperationError::NamingViolation(_))
        ));
    }

    #[test]
    fn rdn_value_must_survive_replace() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        assert!(matches!(
            validator.apply_modifications(
                &person_entry(),
                &rdn(),
                &[Modification::Replace("cn".to_owned(), vec![AttributeValue::from("Other Name")])]
            ),
            Err(OperationError::NamingViolation(_))
        ));
        // keeping the rdn value while adding another is fine
        assert!(validator
            .apply_modifications(
                &person_entry(),
                &rdn(),
                &[Modification::Replace(
                    "cn".to_owned(),
                    vec![AttributeValue::from("John Doe"), AttributeValue::from("Johnny")]
                )]
            )
            .is_ok());
    }

    #[test]
    fn structural_class_can_not_be_replaced_away() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        assert!(matches!(
            validator.apply_modifications(
                &person_entry(),
                &rdn(),
                &[Modification::Replace(
                    "objectClass".to_owned(),
                    vec![AttributeValue::from("top"), AttributeValue::from("organizationalUnit")]
                )]
            ),
            Err(OperationError::SchemaViolation(_))
        ));
    }

    #[test]
    fn operational_attributes_are_not_user_modifiable() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        assert!(matches!(
            validator.apply_modifications(
                &person_entry(),
                &rdn(),
                &[Modification::Add(
                    "createTimestamp".to_owned(),
                    vec![AttributeValue::from("20200101000000Z")]
                )]
            ),
            Err(OperationError::UnwillingToPerform(_))
        ));
    }

    #[test]
    fn remove_of_missing_value_reports_no_such_attribute() {
        let registries = bootstrap().unwrap();
        let validator = EntryValidator::from(&registries);
        assert!(matches!(
            validator.apply_modifications(
                &person_entry(),
                &rdn(),
                &[Modification::Remove("telephoneNumber".to_owned(), vec![])]
            ),
            Err(OperationError::NoSuchAttribute(_))
        ));
    }
}
