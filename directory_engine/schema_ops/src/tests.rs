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
use model::AttributeValue;
use schema_registry::bootstrap;

fn controller() -> SchemaOperationController {
    SchemaOperationController::new(Arc::new(RwLock::new(bootstrap().unwrap())))
}

fn meta_entry(class: &str, pairs: &[(&str, &str)]) -> Entry {
    let mut entry = Entry::new();
    entry.add_value("objectClass", AttributeValue::from("top"));
    entry.add_value("objectClass", AttributeValue::from("metaTop"));
    entry.add_value("objectClass", AttributeValue::from(class));
    for (attribute, value) in pairs {
        entry.add_value(*attribute, AttributeValue::from(*value));
    }
    entry
}

fn dn(text: &str) -> Dn {
    Dn::parse(text).unwrap()
}

const NEW_AT_OID: &str = "1.3.6.1.4.1.18060.0.4.3.2.1";
const NEW_OC_OID: &str = "1.3.6.1.4.1.18060.0.4.3.3.1";

fn new_attribute_entry() -> Entry {
    meta_entry(
        "metaAttributeType",
        &[
            ("m-oid", NEW_AT_OID),
            ("m-name", "departmentCode"),
            ("m-syntax", "1.3.6.1.4.1.1466.115.121.1.15"),
            ("m-equality", "caseIgnoreMatch"),
            ("m-singleValue", "TRUE"),
        ],
    )
}

#[cfg(test)]
mod schema_subtree_routing {
    use super::*;

    #[test]
    fn schema_dns_are_recognized() {
        let controller = controller();
        assert!(controller.is_schema_dn(&dn("cn=core,ou=schema")));
        assert!(controller.is_schema_dn(&dn("m-oid=1.2.3,ou=attributeTypes,cn=core,OU=SCHEMA")));
        assert!(!controller.is_schema_dn(&dn("ou=users,ou=system")));
    }

    #[test]
    fn added_attribute_type_becomes_visible() {
        let controller = controller();
        let entry_dn = dn(&format!("m-oid={},ou=attributeTypes,cn=core,ou=schema", NEW_AT_OID));
        controller.entry_added(&entry_dn, &new_attribute_entry()).unwrap();

        let registries = controller.registries.read().unwrap();
        let attribute_type = registries.attribute_type("departmentCode").unwrap();
        assert_eq!(attribute_type.oid, NEW_AT_OID);
        assert!(attribute_type.single_valued);
    }

    #[test]
    fn object_class_with_a_missing_reference_parks_until_it_resolves() {
        let controller = controller();
        let class = meta_entry(
            "metaObjectClass",
            &[
                ("m-oid", NEW_OC_OID),
                ("m-name", "department"),
                ("m-supObjectClass", "top"),
                ("m-must", "departmentCode"),
            ],
        );
        let class_dn = dn(&format!("m-oid={},ou=objectClasses,cn=core,ou=schema", NEW_OC_OID));
        controller.entry_added(&class_dn, &class).unwrap();

        assert_eq!(
            controller.state_of("core", NEW_OC_OID).unwrap(),
            SchemaObjectState::Parked
        );
        {
            let registries = controller.registries.read().unwrap();
            assert!(registries.object_class("department").is_err());
        }

        // the missing attribute arrives and unblocks the parked class
        let attribute_dn = dn(&format!("m-oid={},ou=attributeTypes,cn=core,ou=schema", NEW_AT_OID));
        controller.entry_added(&attribute_dn, &new_attribute_entry()).unwrap();

        assert_eq!(
            controller.state_of("core", NEW_OC_OID).unwrap(),
            SchemaObjectState::Registered
        );
        let registries = controller.registries.read().unwrap();
        assert!(registries.object_class("department").is_ok());
    }

    #[test]
    fn deleting_a_parked_entry_clears_the_queue() {
        let controller = controller();
        let class = meta_entry(
            "metaObjectClass",
            &[
                ("m-oid", NEW_OC_OID),
                ("m-name", "department"),
                ("m-must", "neverDefinedAnywhere"),
            ],
        );
        let class_dn = dn(&format!("m-oid={},ou=objectClasses,cn=core,ou=schema", NEW_OC_OID));
        controller.entry_added(&class_dn, &class).unwrap();
        assert_eq!(
            controller.state_of("core", NEW_OC_OID).unwrap(),
            SchemaObjectState::Parked
        );

        controller.entry_deleted(&class_dn, &class, false).unwrap();
        assert_eq!(
            controller.state_of("core", NEW_OC_OID).unwrap(),
            SchemaObjectState::Absent
        );
    }

    #[test]
    fn duplicate_oid_is_still_refused_outright() {
        let controller = controller();
        let cn_oid = {
            let registries = controller.registries.read().unwrap();
            registries.attribute_type("cn").unwrap().oid.clone()
        };
        let clash = meta_entry(
            "metaAttributeType",
            &[
                ("m-oid", &cn_oid),
                ("m-name", "duplicate"),
                ("m-syntax", "1.3.6.1.4.1.1466.115.121.1.15"),
            ],
        );
        let clash_dn = dn(&format!("m-oid={},ou=attributeTypes,cn=core,ou=schema", cn_oid));
        assert!(matches!(
            controller.entry_added(&clash_dn, &clash),
            Err(OperationError::NonUniqueOid(_))
        ));
    }

    #[test]
    fn container_entries_are_ignored() {
        let controller = controller();
        let mut container = Entry::new();
        container.add_value("objectClass", AttributeValue::from("top"));
        container.add_value("objectClass", AttributeValue::from("organizationalUnit"));
        container.add_value("ou", AttributeValue::from("attributeTypes"));
        controller
            .entry_added(&dn("ou=attributeTypes,cn=core,ou=schema"), &container)
            .unwrap();
    }

    #[test]
    fn delete_of_a_referenced_attribute_type_is_refused() {
        let controller = controller();
        let sn_oid = {
            let registries = controller.registries.read().unwrap();
            registries.attribute_type("sn").unwrap().oid.clone()
        };
        let entry = meta_entry("metaAttributeType", &[("m-oid", &sn_oid)]);
        let entry_dn = dn(&format!("m-oid={},ou=attributeTypes,cn=core,ou=schema", sn_oid));
        assert!(matches!(
            controller.entry_deleted(&entry_dn, &entry, false),
            Err(OperationError::UnwillingToPerform(_))
        ));
    }

    #[test]
    fn cascade_reduces_to_non_cascading_delete() {
        let controller = controller();
        let entry_dn = dn(&format!("m-oid={},ou=attributeTypes,cn=core,ou=schema", NEW_AT_OID));
        controller.entry_added(&entry_dn, &new_attribute_entry()).unwrap();
        controller
            .entry_deleted(&entry_dn, &new_attribute_entry(), true)
            .unwrap();
        let registries = controller.registries.read().unwrap();
        assert!(registries.attribute_type("departmentCode").is_err());
    }

    #[test]
    fn modify_reregisters_the_changed_object() {
        let controller = controller();
        let entry_dn = dn(&format!("m-oid={},ou=attributeTypes,cn=core,ou=schema", NEW_AT_OID));
        let before = new_attribute_entry();
        controller.entry_added(&entry_dn, &before).unwrap();

        let mut after = before.clone();
        after.remove_attribute("m-singleValue");
        controller.entry_modified(&entry_dn, &before, &after).unwrap();

        let registries = controller.registries.read().unwrap();
        assert!(!registries.attribute_type("departmentCode").unwrap().single_valued);
    }
}

#[cfg(test)]
mod schema_units {
    use super::*;

    fn nis_schema_entry(disabled: bool) -> Entry {
        let mut entry = Entry::new();
        entry.add_value("objectClass", AttributeValue::from("top"));
        entry.add_value("objectClass", AttributeValue::from("metaSchema"));
        entry.add_value("cn", AttributeValue::from("nis"));
        if disabled {
            entry.add_value("m-disabled", AttributeValue::from("TRUE"));
        }
        entry
    }

    #[test]
    fn objects_of_a_disabled_schema_are_staged_until_enable() {
        let controller = controller();
        controller
            .entry_added(&dn("cn=nis,ou=schema"), &nis_schema_entry(true))
            .unwrap();

        let entry = meta_entry(
            "metaAttributeType",
            &[
                ("m-oid", NEW_AT_OID),
                ("m-name", "gidNumber"),
                ("m-syntax", "1.3.6.1.4.1.1466.115.121.1.27"),
                ("m-equality", "integerMatch"),
            ],
        );
        let entry_dn = dn(&format!("m-oid={},ou=attributeTypes,cn=nis,ou=schema", NEW_AT_OID));
        controller.entry_added(&entry_dn, &entry).unwrap();

        assert_eq!(
            controller.state_of("nis", NEW_AT_OID).unwrap(),
            SchemaObjectState::Disabled
        );
        {
            let registries = controller.registries.read().unwrap();
            assert!(registries.attribute_type("gidNumber").is_err());
        }

        controller.enable_schema("nis").unwrap();
        assert_eq!(
            controller.state_of("nis", NEW_AT_OID).unwrap(),
            SchemaObjectState::Registered
        );
        let registries = controller.registries.read().unwrap();
        assert!(registries.attribute_type("gidNumber").is_ok());
    }

    #[test]
    fn disable_unregisters_and_restages() {
        let controller = controller();
        controller
            .entry_added(&dn("cn=nis,ou=schema"), &nis_schema_entry(false))
            .unwrap();
        let entry = meta_entry(
            "metaAttributeType",
            &[
                ("m-oid", NEW_AT_OID),
                ("m-name", "gidNumber"),
                ("m-syntax", "1.3.6.1.4.1.1466.115.121.1.27"),
            ],
        );
        let entry_dn = dn(&format!("m-oid={},ou=attributeTypes,cn=nis,ou=schema", NEW_AT_OID));
        controller.entry_added(&entry_dn, &entry).unwrap();

        controller.disable_schema("nis").unwrap();
        assert_eq!(
            controller.state_of("nis", NEW_AT_OID).unwrap(),
            SchemaObjectState::Disabled
        );
        controller.enable_schema("nis").unwrap();
        assert_eq!(
            controller.state_of("nis", NEW_AT_OID).unwrap(),
            SchemaObjectState::Registered
        );
    }

    #[test]
    fn disabling_a_schema_with_enabled_dependents_is_refused() {
        let controller = controller();
        assert!(matches!(
            controller.disable_schema("system"),
            Err(OperationError::UnwillingToPerform(_))
        ));
    }
}

#[cfg(test)]
mod subschema {
    use super::*;

    #[test]
    fn replace_is_always_refused() {
        let controller = controller();
        assert!(matches!(
            controller.subschema_modified(&[Modification::Replace("attributeTypes".to_owned(), vec![])]),
            Err(OperationError::UnwillingToPerform(_))
        ));
    }

    #[test]
    fn descriptions_add_and_remove_through_the_registry() {
        let controller = controller();
        let description = format!(
            "( {} NAME 'roomNumber' EQUALITY caseIgnoreMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
            NEW_AT_OID
        );
        controller
            .subschema_modified(&[Modification::Add(
                "attributeTypes".to_owned(),
                vec![AttributeValue::text(description.clone())],
            )])
            .unwrap();
        {
            let registries = controller.registries.read().unwrap();
            assert!(registries.attribute_type("roomNumber").is_ok());
        }
        controller
            .subschema_modified(&[Modification::Remove(
                "attributeTypes".to_owned(),
                vec![AttributeValue::text(description)],
            )])
            .unwrap();
        let registries = controller.registries.read().unwrap();
        assert!(registries.attribute_type("roomNumber").is_err());
    }

    #[test]
    fn attribute_type_without_syntax_or_superior_is_rejected() {
        let controller = controller();
        let description = format!("( {} NAME 'floating' EQUALITY caseIgnoreMatch )", NEW_AT_OID);
        assert!(matches!(
            controller.subschema_modified(&[Modification::Add(
                "attributeTypes".to_owned(),
                vec![AttributeValue::text(description)],
            )]),
            Err(OperationError::SchemaViolation(_))
        ));
    }

    #[test]
    fn matching_rule_must_reference_an_existing_syntax() {
        let controller = controller();
        let description = "( 1.3.6.1.4.1.18060.0.4.3.4.1 NAME 'bogusMatch' SYNTAX 9.9.9.9 )";
        assert!(matches!(
            controller.subschema_modified(&[Modification::Add(
                "matchingRules".to_owned(),
                vec![AttributeValue::text(description)],
            )]),
            Err(OperationError::NoSuchSchemaObject(_))
        ));
    }
}
