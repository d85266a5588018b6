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

//! renders the live registry as a subschema subentry: one entry whose
//! `attributeTypes`, `objectClasses`, `matchingRules` and `ldapSyntaxes`
//! attributes carry the RFC 4512 description of every registered object.
//! Clients discover the schema by reading this entry.

use model::{AttributeValue, Entry};
use schema_parser::{
    render_attribute_type, render_matching_rule, render_object_class, render_syntax, AttributeTypeDescription,
    MatchingRuleDescription, ObjectClassDescription, SyntaxDescription,
};
use schema_registry::{AttributeType, LdapSyntax, MatchingRule, ObjectClass, Registries};

fn describe_attribute_type(attribute_type: &AttributeType) -> AttributeTypeDescription {
    AttributeTypeDescription {
        oid: attribute_type.oid.clone(),
        names: attribute_type.names.clone(),
        description: attribute_type.description.clone(),
        obsolete: attribute_type.obsolete,
        superior: attribute_type.superior_oid.clone(),
        equality: attribute_type.equality_oid.clone(),
        ordering: attribute_type.ordering_oid.clone(),
        substring: attribute_type.substring_oid.clone(),
        syntax: attribute_type.syntax_oid.clone(),
        single_value: attribute_type.single_valued,
        collective: attribute_type.collective,
        no_user_modification: !attribute_type.user_modifiable,
        usage: Some(attribute_type.usage.to_string()),
    }
}

fn describe_object_class(object_class: &ObjectClass) -> ObjectClassDescription {
    ObjectClassDescription {
        oid: object_class.oid.clone(),
        names: object_class.names.clone(),
        description: object_class.description.clone(),
        obsolete: object_class.obsolete,
        superiors: object_class.superior_oids.clone(),
        kind: Some(object_class.kind.to_string()),
        must: object_class.must_oids.clone(),
        may: object_class.may_oids.clone(),
    }
}

fn describe_matching_rule(rule: &MatchingRule) -> MatchingRuleDescription {
    MatchingRuleDescription {
        oid: rule.oid.clone(),
        names: rule.names.clone(),
        description: rule.description.clone(),
        obsolete: rule.obsolete,
        syntax: Some(rule.syntax_oid.clone()),
    }
}

fn describe_syntax(syntax: &LdapSyntax) -> SyntaxDescription {
    SyntaxDescription {
        oid: syntax.oid.clone(),
        description: syntax.description.clone(),
        not_human_readable: !syntax.human_readable,
    }
}

/// the subschema subentry image of the registry.
pub fn subschema_entry(registries: &Registries) -> Entry {
    let mut entry = Entry::new();
    entry.add_value("objectClass", AttributeValue::text("top"));
    entry.add_value("objectClass", AttributeValue::text("subschema"));
    entry.add_value("objectClass", AttributeValue::text("extensibleObject"));
    entry.add_value("cn", AttributeValue::text("schema"));

    for syntax in registries.syntaxes().iter() {
        entry.add_value(
            "ldapSyntaxes",
            AttributeValue::text(render_syntax(&describe_syntax(syntax))),
        );
    }
    for rule in registries.matching_rules().iter() {
        entry.add_value(
            "matchingRules",
            AttributeValue::text(render_matching_rule(&describe_matching_rule(rule))),
        );
    }
    for attribute_type in registries.attribute_types().iter() {
        entry.add_value(
            "attributeTypes",
            AttributeValue::text(render_attribute_type(&describe_attribute_type(attribute_type))),
        );
    }
    for object_class in registries.object_classes().iter() {
        entry.add_value(
            "objectClasses",
            AttributeValue::text(render_object_class(&describe_object_class(object_class))),
        );
    }
    entry
}
