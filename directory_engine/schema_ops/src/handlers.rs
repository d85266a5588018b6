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

//! converts schema entries (`meta*` object classes, `m-*` attributes) and
//! RFC 4512 description values into registry objects. Pluggable value
//! machinery is selected by well-known implementation names instead of
//! loadable code.

use model::{Entry, OperationError, OperationResult};
use schema_parser::{AttributeTypeDescription, MatchingRuleDescription, ObjectClassDescription, SyntaxDescription};
use schema_registry::{
    AcceptAllChecker, AttributeType, BooleanChecker, Comparator, DeepTrimNormalizer, DeepTrimToLowerNormalizer,
    DirectoryStringChecker, DnChecker, GeneralizedTimeChecker, Ia5StringChecker, IntegerChecker, IntegerComparator,
    LdapSyntax, MatchingRule, NoOpNormalizer, Normalizer, NumericStringChecker, NumericStringNormalizer,
    ObjectClass, ObjectClassKind, OidChecker, StringComparator, SyntaxChecker, TelephoneNumberChecker, Usage,
};
use std::sync::Arc;

pub(crate) fn required_text(entry: &Entry, attribute_id: &str) -> OperationResult<String> {
    entry
        .get(attribute_id)
        .and_then(|attribute| attribute.first_text())
        .map(str::to_owned)
        .ok_or_else(|| OperationError::schema_violation(format!("schema entry has no {} value", attribute_id)))
}

pub(crate) fn optional_text(entry: &Entry, attribute_id: &str) -> Option<String> {
    entry
        .get(attribute_id)
        .and_then(|attribute| attribute.first_text())
        .map(str::to_owned)
}

pub(crate) fn text_values(entry: &Entry, attribute_id: &str) -> Vec<String> {
    entry
        .get(attribute_id)
        .map(|attribute| {
            attribute
                .values()
                .iter()
                .filter_map(|value| value.as_text())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn boolean_flag(entry: &Entry, attribute_id: &str) -> bool {
    optional_text(entry, attribute_id)
        .map(|value| value.eq_ignore_ascii_case("TRUE"))
        .unwrap_or(false)
}

pub(crate) fn attribute_type_from_entry(entry: &Entry, schema_name: &str) -> OperationResult<AttributeType> {
    let usage = match optional_text(entry, "m-usage") {
        Some(value) => Usage::parse(&value)
            .ok_or_else(|| OperationError::schema_violation(format!("unknown usage {}", value)))?,
        None => Usage::UserApplications,
    };
    Ok(AttributeType {
        oid: required_text(entry, "m-oid")?,
        names: text_values(entry, "m-name"),
        description: optional_text(entry, "m-description"),
        obsolete: boolean_flag(entry, "m-obsolete"),
        schema_name: schema_name.to_owned(),
        superior_oid: optional_text(entry, "m-supAttributeType"),
        syntax_oid: optional_text(entry, "m-syntax"),
        equality_oid: optional_text(entry, "m-equality"),
        ordering_oid: optional_text(entry, "m-ordering"),
        substring_oid: optional_text(entry, "m-substr"),
        single_valued: boolean_flag(entry, "m-singleValue"),
        collective: boolean_flag(entry, "m-collective"),
        user_modifiable: !boolean_flag(entry, "m-noUserModification"),
        usage,
    })
}

pub(crate) fn object_class_from_entry(entry: &Entry, schema_name: &str) -> OperationResult<ObjectClass> {
    let kind = match optional_text(entry, "m-typeObjectClass") {
        Some(value) => ObjectClassKind::parse(&value)
            .ok_or_else(|| OperationError::schema_violation(format!("unknown object class kind {}", value)))?,
        None => ObjectClassKind::Structural,
    };
    Ok(ObjectClass {
        oid: required_text(entry, "m-oid")?,
        names: text_values(entry, "m-name"),
        description: optional_text(entry, "m-description"),
        obsolete: boolean_flag(entry, "m-obsolete"),
        schema_name: schema_name.to_owned(),
        superior_oids: text_values(entry, "m-supObjectClass"),
        kind,
        must_oids: text_values(entry, "m-must"),
        may_oids: text_values(entry, "m-may"),
    })
}

pub(crate) fn matching_rule_from_entry(entry: &Entry, schema_name: &str) -> OperationResult<MatchingRule> {
    Ok(MatchingRule {
        oid: required_text(entry, "m-oid")?,
        names: text_values(entry, "m-name"),
        description: optional_text(entry, "m-description"),
        obsolete: boolean_flag(entry, "m-obsolete"),
        schema_name: schema_name.to_owned(),
        syntax_oid: required_text(entry, "m-syntax")?,
    })
}

pub(crate) fn syntax_from_entry(entry: &Entry, schema_name: &str) -> OperationResult<LdapSyntax> {
    Ok(LdapSyntax {
        oid: required_text(entry, "m-oid")?,
        names: vec![],
        description: optional_text(entry, "m-description"),
        obsolete: boolean_flag(entry, "m-obsolete"),
        schema_name: schema_name.to_owned(),
        human_readable: boolean_flag(entry, "m-humanReadable"),
    })
}

/// builtin syntax checkers addressable from `m-implementation`.
pub(crate) fn syntax_checker_by_name(name: &str) -> OperationResult<Arc<dyn SyntaxChecker>> {
    let checker: Arc<dyn SyntaxChecker> = match name {
        "acceptAll" => Arc::new(AcceptAllChecker),
        "directoryString" => Arc::new(DirectoryStringChecker),
        "ia5String" => Arc::new(Ia5StringChecker),
        "integer" => Arc::new(IntegerChecker),
        "boolean" => Arc::new(BooleanChecker),
        "numericString" => Arc::new(NumericStringChecker),
        "oid" => Arc::new(OidChecker),
        "dn" => Arc::new(DnChecker),
        "generalizedTime" => Arc::new(GeneralizedTimeChecker),
        "telephoneNumber" => Arc::new(TelephoneNumberChecker),
        other => {
            return Err(OperationError::unwilling_to_perform(format!(
                "unknown syntax checker implementation {}",
                other
            )))
        }
    };
    Ok(checker)
}

pub(crate) fn normalizer_by_name(name: &str) -> OperationResult<Arc<dyn Normalizer>> {
    let normalizer: Arc<dyn Normalizer> = match name {
        "noOp" => Arc::new(NoOpNormalizer),
        "deepTrimToLower" => Arc::new(DeepTrimToLowerNormalizer),
        "deepTrim" => Arc::new(DeepTrimNormalizer),
        "numericString" => Arc::new(NumericStringNormalizer),
        other => {
            return Err(OperationError::unwilling_to_perform(format!(
                "unknown normalizer implementation {}",
                other
            )))
        }
    };
    Ok(normalizer)
}

pub(crate) fn comparator_by_name(name: &str) -> OperationResult<Arc<dyn Comparator>> {
    let comparator: Arc<dyn Comparator> = match name {
        "string" => Arc::new(StringComparator),
        "integer" => Arc::new(IntegerComparator),
        other => {
            return Err(OperationError::unwilling_to_perform(format!(
                "unknown comparator implementation {}",
                other
            )))
        }
    };
    Ok(comparator)
}

// ---- RFC 4512 description conversions -----------------------------------

pub(crate) fn attribute_type_from_description(
    description: AttributeTypeDescription,
    schema_name: &str,
) -> OperationResult<AttributeType> {
    let usage = match &description.usage {
        Some(value) => {
            Usage::parse(value).ok_or_else(|| OperationError::schema_violation(format!("unknown usage {}", value)))?
        }
        None => Usage::UserApplications,
    };
    Ok(AttributeType {
        oid: description.oid,
        names: description.names,
        description: description.description,
        obsolete: description.obsolete,
        schema_name: schema_name.to_owned(),
        superior_oid: description.superior,
        syntax_oid: description.syntax,
        equality_oid: description.equality,
        ordering_oid: description.ordering,
        substring_oid: description.substring,
        single_valued: description.single_value,
        collective: description.collective,
        user_modifiable: !description.no_user_modification,
        usage,
    })
}

pub(crate) fn object_class_from_description(
    description: ObjectClassDescription,
    schema_name: &str,
) -> OperationResult<ObjectClass> {
    let kind = match &description.kind {
        Some(value) => ObjectClassKind::parse(value)
            .ok_or_else(|| OperationError::schema_violation(format!("unknown object class kind {}", value)))?,
        None => ObjectClassKind::Structural,
    };
    Ok(ObjectClass {
        oid: description.oid,
        names: description.names,
        description: description.description,
        obsolete: description.obsolete,
        schema_name: schema_name.to_owned(),
        superior_oids: description.superiors,
        kind,
        must_oids: description.must,
        may_oids: description.may,
    })
}

pub(crate) fn matching_rule_from_description(
    description: MatchingRuleDescription,
    schema_name: &str,
) -> OperationResult<MatchingRule> {
    let syntax_oid = description
        .syntax
        .ok_or_else(|| OperationError::schema_violation("a matching rule must reference a syntax"))?;
    Ok(MatchingRule {
        oid: description.oid,
        names: description.names,
        description: description.description,
        obsolete: description.obsolete,
        schema_name: schema_name.to_owned(),
        syntax_oid,
    })
}

pub(crate) fn syntax_from_description(description: SyntaxDescription, schema_name: &str) -> LdapSyntax {
    LdapSyntax {
        oid: description.oid,
        names: vec![],
        description: description.description,
        obsolete: false,
        schema_name: schema_name.to_owned(),
        human_readable: !description.not_human_readable,
    }
}
