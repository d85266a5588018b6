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

//! installs the schema every running directory needs before it can accept
//! a single entry: the standard syntaxes with their checkers, the common
//! matching rules with their normalizers and comparators, the attribute
//! backbone, the core object classes, and the `meta*` classes that describe
//! schema objects stored under `ou=schema`.

use crate::checkers::*;
use crate::comparators::{Comparator, IntegerComparator, StringComparator};
use crate::loader::{RegistrationItem, SchemaLoader};
use crate::normalizers::*;
use crate::objects::*;
use crate::oids::{attribute, matching_rule, object_class, syntax};
use crate::Registries;
use model::OperationResult;
use std::sync::Arc;

const META_ATTRIBUTE_BASE: &str = "1.3.6.1.4.1.18060.0.4.0.2";
const META_CLASS_BASE: &str = "1.3.6.1.4.1.18060.0.4.0.3";

fn meta_attribute_oid(suffix: u32) -> String {
    format!("{}.{}", META_ATTRIBUTE_BASE, suffix)
}

fn meta_class_oid(suffix: u32) -> String {
    format!("{}.{}", META_CLASS_BASE, suffix)
}

fn syntaxes() -> Vec<RegistrationItem> {
    vec![
        (syntax::BOOLEAN, "Boolean", true),
        (syntax::DN, "Distinguished Name", true),
        (syntax::DIRECTORY_STRING, "Directory String", true),
        (syntax::GENERALIZED_TIME, "Generalized Time", true),
        (syntax::IA5_STRING, "IA5 String", true),
        (syntax::INTEGER, "Integer", true),
        (syntax::NUMERIC_STRING, "Numeric String", true),
        (syntax::OID, "OID", true),
        (syntax::OCTET_STRING, "Octet String", false),
        (syntax::TELEPHONE_NUMBER, "Telephone Number", true),
        (syntax::SUBSTRING_ASSERTION, "Substring Assertion", true),
    ]
    .into_iter()
    .map(|(oid, description, human_readable)| {
        RegistrationItem::Syntax(LdapSyntax::new(oid, description, human_readable))
    })
    .collect()
}

fn register_checkers(registries: &mut Registries) {
    registries.register_syntax_checker(syntax::BOOLEAN, Arc::new(BooleanChecker));
    registries.register_syntax_checker(syntax::DN, Arc::new(DnChecker));
    registries.register_syntax_checker(syntax::DIRECTORY_STRING, Arc::new(DirectoryStringChecker));
    registries.register_syntax_checker(syntax::GENERALIZED_TIME, Arc::new(GeneralizedTimeChecker));
    registries.register_syntax_checker(syntax::IA5_STRING, Arc::new(Ia5StringChecker));
    registries.register_syntax_checker(syntax::INTEGER, Arc::new(IntegerChecker));
    registries.register_syntax_checker(syntax::NUMERIC_STRING, Arc::new(NumericStringChecker));
    registries.register_syntax_checker(syntax::OID, Arc::new(OidChecker));
    registries.register_syntax_checker(syntax::OCTET_STRING, Arc::new(AcceptAllChecker));
    registries.register_syntax_checker(syntax::TELEPHONE_NUMBER, Arc::new(TelephoneNumberChecker));
    registries.register_syntax_checker(syntax::SUBSTRING_ASSERTION, Arc::new(AcceptAllChecker));
}

fn matching_rules() -> Vec<RegistrationItem> {
    vec![
        (matching_rule::OBJECT_IDENTIFIER, "objectIdentifierMatch", syntax::OID),
        (matching_rule::DISTINGUISHED_NAME, "distinguishedNameMatch", syntax::DN),
        (matching_rule::CASE_IGNORE, "caseIgnoreMatch", syntax::DIRECTORY_STRING),
        (
            matching_rule::CASE_IGNORE_ORDERING,
            "caseIgnoreOrderingMatch",
            syntax::DIRECTORY_STRING,
        ),
        (
            matching_rule::CASE_IGNORE_SUBSTRINGS,
            "caseIgnoreSubstringsMatch",
            syntax::SUBSTRING_ASSERTION,
        ),
        (matching_rule::CASE_EXACT, "caseExactMatch", syntax::DIRECTORY_STRING),
        (matching_rule::NUMERIC_STRING, "numericStringMatch", syntax::NUMERIC_STRING),
        (matching_rule::BOOLEAN, "booleanMatch", syntax::BOOLEAN),
        (matching_rule::INTEGER, "integerMatch", syntax::INTEGER),
        (matching_rule::INTEGER_ORDERING, "integerOrderingMatch", syntax::INTEGER),
        (matching_rule::OCTET_STRING, "octetStringMatch", syntax::OCTET_STRING),
        (
            matching_rule::TELEPHONE_NUMBER,
            "telephoneNumberMatch",
            syntax::TELEPHONE_NUMBER,
        ),
        (
            matching_rule::GENERALIZED_TIME,
            "generalizedTimeMatch",
            syntax::GENERALIZED_TIME,
        ),
        (matching_rule::CASE_EXACT_IA5, "caseExactIA5Match", syntax::IA5_STRING),
        (matching_rule::CASE_IGNORE_IA5, "caseIgnoreIA5Match", syntax::IA5_STRING),
    ]
    .into_iter()
    .map(|(oid, name, syntax_oid)| RegistrationItem::MatchingRule(MatchingRule::new(oid, name, syntax_oid)))
    .collect()
}

fn register_rule_bindings(registries: &mut Registries) {
    let case_ignore: Arc<dyn Normalizer> = Arc::new(DeepTrimToLowerNormalizer);
    let case_exact: Arc<dyn Normalizer> = Arc::new(DeepTrimNormalizer);
    let numeric: Arc<dyn Normalizer> = Arc::new(NumericStringNormalizer);
    let noop: Arc<dyn Normalizer> = Arc::new(NoOpNormalizer);

    registries.register_normalizer(matching_rule::OBJECT_IDENTIFIER, case_ignore.clone());
    registries.register_normalizer(matching_rule::DISTINGUISHED_NAME, case_ignore.clone());
    registries.register_normalizer(matching_rule::CASE_IGNORE, case_ignore.clone());
    registries.register_normalizer(matching_rule::CASE_IGNORE_ORDERING, case_ignore.clone());
    registries.register_normalizer(matching_rule::CASE_IGNORE_SUBSTRINGS, case_ignore.clone());
    registries.register_normalizer(matching_rule::CASE_EXACT, case_exact.clone());
    registries.register_normalizer(matching_rule::NUMERIC_STRING, numeric.clone());
    registries.register_normalizer(matching_rule::BOOLEAN, noop.clone());
    registries.register_normalizer(matching_rule::INTEGER, noop.clone());
    registries.register_normalizer(matching_rule::INTEGER_ORDERING, noop.clone());
    registries.register_normalizer(matching_rule::OCTET_STRING, noop.clone());
    registries.register_normalizer(matching_rule::TELEPHONE_NUMBER, numeric);
    registries.register_normalizer(matching_rule::GENERALIZED_TIME, noop);
    registries.register_normalizer(matching_rule::CASE_EXACT_IA5, case_exact);
    registries.register_normalizer(matching_rule::CASE_IGNORE_IA5, case_ignore);

    let strings: Arc<dyn Comparator> = Arc::new(StringComparator);
    let integers: Arc<dyn Comparator> = Arc::new(IntegerComparator);
    for rule in [
        matching_rule::OBJECT_IDENTIFIER,
        matching_rule::DISTINGUISHED_NAME,
        matching_rule::CASE_IGNORE,
        matching_rule::CASE_IGNORE_ORDERING,
        matching_rule::CASE_IGNORE_SUBSTRINGS,
        matching_rule::CASE_EXACT,
        matching_rule::NUMERIC_STRING,
        matching_rule::BOOLEAN,
        matching_rule::OCTET_STRING,
        matching_rule::TELEPHONE_NUMBER,
        matching_rule::GENERALIZED_TIME,
        matching_rule::CASE_EXACT_IA5,
        matching_rule::CASE_IGNORE_IA5,
    ]
    .iter()
    {
        registries.register_comparator(rule, strings.clone());
    }
    registries.register_comparator(matching_rule::INTEGER, integers.clone());
    registries.register_comparator(matching_rule::INTEGER_ORDERING, integers);
}

fn attribute_types() -> Vec<RegistrationItem> {
    let mut items = vec![];
    let mut push = |attribute_type: AttributeType| items.push(RegistrationItem::AttributeType(attribute_type));

    push(
        AttributeTypeBuilder::default()
            .oid(attribute::OBJECT_CLASS)
            .name("objectClass")
            .syntax(syntax::OID)
            .equality(matching_rule::OBJECT_IDENTIFIER)
            .build(),
    );
    push(
        AttributeTypeBuilder::default()
            .oid(attribute::ALIASED_OBJECT_NAME)
            .name("aliasedObjectName")
            .syntax(syntax::DN)
            .equality(matching_rule::DISTINGUISHED_NAME)
            .single_valued()
            .build(),
    );
    push(
        AttributeTypeBuilder::default()
            .oid(attribute::NAME)
            .name("name")
            .syntax(syntax::DIRECTORY_STRING)
            .equality(matching_rule::CASE_IGNORE)
            .ordering(matching_rule::CASE_IGNORE_ORDERING)
            .substring(matching_rule::CASE_IGNORE_SUBSTRINGS)
            .build(),
    );
    for (oid, name, single) in [
        (attribute::CN, "cn", false),
        (attribute::SN, "sn", false),
        (attribute::OU, "ou", false),
        (attribute::O, "o", false),
        (attribute::C, "c", true),
        (attribute::L, "l", false),
        (attribute::ST, "st", false),
        (attribute::TITLE, "title", false),
        (attribute::GIVEN_NAME, "givenName", false),
    ]
    .iter()
    {
        let mut builder = AttributeTypeBuilder::default().oid(*oid).name(*name).superior("name");
        if *single {
            builder = builder.single_valued();
        }
        push(builder.build());
    }
    push(
        AttributeTypeBuilder::default()
            .oid(attribute::STREET)
            .name("street")
            .syntax(syntax::DIRECTORY_STRING)
            .equality(matching_rule::CASE_IGNORE)
            .substring(matching_rule::CASE_IGNORE_SUBSTRINGS)
            .build(),
    );
    push(
        AttributeTypeBuilder::default()
            .oid(attribute::DESCRIPTION)
            .name("description")
            .syntax(syntax::DIRECTORY_STRING)
            .equality(matching_rule::CASE_IGNORE)
            .substring(matching_rule::CASE_IGNORE_SUBSTRINGS)
            .build(),
    );
    push(
        AttributeTypeBuilder::default()
            .oid("2.5.4.49")
            .name("distinguishedName")
            .syntax(syntax::DN)
            .equality(matching_rule::DISTINGUISHED_NAME)
            .build(),
    );
    for (oid, name) in [
        (attribute::SEE_ALSO, "seeAlso"),
        ("2.5.4.31", "member"),
        ("2.5.4.32", "owner"),
        ("2.5.4.33", "roleOccupant"),
    ]
    .iter()
    {
        push(
            AttributeTypeBuilder::default()
                .oid(*oid)
                .name(*name)
                .superior("distinguishedName")
                .build(),
        );
    }
    push(
        AttributeTypeBuilder::default()
            .oid("2.5.4.50")
            .name("uniqueMember")
            .syntax(syntax::DN)
            .equality(matching_rule::DISTINGUISHED_NAME)
            .build(),
    );
    for (oid, name) in [
        ("2.5.4.15", "businessCategory"),
        ("2.5.4.17", "postalCode"),
        ("2.5.4.18", "postOfficeBox"),
        ("2.5.4.19", "physicalDeliveryOfficeName"),
    ]
    .iter()
    {
        push(
            AttributeTypeBuilder::default()
                .oid(*oid)
                .name(*name)
                .syntax(syntax::DIRECTORY_STRING)
                .equality(matching_rule::CASE_IGNORE)
                .substring(matching_rule::CASE_IGNORE_SUBSTRINGS)
                .build(),
        );
    }
    push(
        AttributeTypeBuilder::default()
            .oid("2.5.4.5")
            .name("serialNumber")
            .syntax(syntax::DIRECTORY_STRING)
            .equality(matching_rule::CASE_IGNORE)
            .build(),
    );
    push(
        AttributeTypeBuilder::default()
            .oid(attribute::USER_PASSWORD)
            .name("userPassword")
            .syntax(syntax::OCTET_STRING)
            .equality(matching_rule::OCTET_STRING)
            .build(),
    );
    push(
        AttributeTypeBuilder::default()
            .oid(attribute::TELEPHONE_NUMBER)
            .name("telephoneNumber")
            .syntax(syntax::TELEPHONE_NUMBER)
            .equality(matching_rule::TELEPHONE_NUMBER)
            .build(),
    );
    push(
        AttributeTypeBuilder::default()
            .oid(attribute::UID)
            .name("uid")
            .syntax(syntax::DIRECTORY_STRING)
            .equality(matching_rule::CASE_IGNORE)
            .substring(matching_rule::CASE_IGNORE_SUBSTRINGS)
            .build(),
    );
    push(
        AttributeTypeBuilder::default()
            .oid(attribute::MAIL)
            .name("mail")
            .syntax(syntax::IA5_STRING)
            .equality(matching_rule::CASE_IGNORE_IA5)
            .build(),
    );
    push(
        AttributeTypeBuilder::default()
            .oid(attribute::DC)
            .name("dc")
            .syntax(syntax::IA5_STRING)
            .equality(matching_rule::CASE_IGNORE_IA5)
            .single_valued()
            .build(),
    );

    push(
        AttributeTypeBuilder::default()
            .oid(attribute::CREATORS_NAME)
            .name("creatorsName")
            .syntax(syntax::DN)
            .equality(matching_rule::DISTINGUISHED_NAME)
            .single_valued()
            .no_user_modification()
            .usage(Usage::DirectoryOperation)
            .build(),
    );
    push(
        AttributeTypeBuilder::default()
            .oid(attribute::CREATE_TIMESTAMP)
            .name("createTimestamp")
            .syntax(syntax::GENERALIZED_TIME)
            .equality(matching_rule::GENERALIZED_TIME)
            .single_valued()
            .no_user_modification()
            .usage(Usage::DirectoryOperation)
            .build(),
    );
    push(
        AttributeTypeBuilder::default()
            .oid(attribute::MODIFIERS_NAME)
            .name("modifiersName")
            .syntax(syntax::DN)
            .equality(matching_rule::DISTINGUISHED_NAME)
            .single_valued()
            .no_user_modification()
            .usage(Usage::DirectoryOperation)
            .build(),
    );
    push(
        AttributeTypeBuilder::default()
            .oid(attribute::MODIFY_TIMESTAMP)
            .name("modifyTimestamp")
            .syntax(syntax::GENERALIZED_TIME)
            .equality(matching_rule::GENERALIZED_TIME)
            .single_valued()
            .no_user_modification()
            .usage(Usage::DirectoryOperation)
            .build(),
    );
    push(
        AttributeTypeBuilder::default()
            .oid(attribute::ENTRY_UUID)
            .name("entryUUID")
            .syntax(syntax::DIRECTORY_STRING)
            .equality(matching_rule::CASE_IGNORE)
            .single_valued()
            .no_user_modification()
            .usage(Usage::DirectoryOperation)
            .build(),
    );

    items
}

fn meta_attribute_types() -> Vec<RegistrationItem> {
    let mut items = vec![];
    let mut push = |attribute_type: AttributeType| items.push(RegistrationItem::AttributeType(attribute_type));

    let oid_valued = |suffix: u32, name: &str, single: bool| {
        let mut builder = AttributeTypeBuilder::default()
            .oid(meta_attribute_oid(suffix))
            .name(name)
            .syntax(syntax::OID)
            .equality(matching_rule::OBJECT_IDENTIFIER);
        if single {
            builder = builder.single_valued();
        }
        builder.build()
    };
    let string_valued = |suffix: u32, name: &str, single: bool| {
        let mut builder = AttributeTypeBuilder::default()
            .oid(meta_attribute_oid(suffix))
            .name(name)
            .syntax(syntax::DIRECTORY_STRING)
            .equality(matching_rule::CASE_IGNORE);
        if single {
            builder = builder.single_valued();
        }
        builder.build()
    };
    let boolean_valued = |suffix: u32, name: &str| {
        AttributeTypeBuilder::default()
            .oid(meta_attribute_oid(suffix))
            .name(name)
            .syntax(syntax::BOOLEAN)
            .equality(matching_rule::BOOLEAN)
            .single_valued()
            .build()
    };

    push(oid_valued(1, "m-oid", true));
    push(string_valued(2, "m-name", false));
    push(string_valued(3, "m-description", true));
    push(boolean_valued(4, "m-obsolete"));
    push(oid_valued(5, "m-supAttributeType", true));
    push(oid_valued(6, "m-supObjectClass", false));
    push(oid_valued(7, "m-must", false));
    push(oid_valued(8, "m-may", false));
    push(string_valued(9, "m-typeObjectClass", true));
    push(oid_valued(10, "m-equality", true));
    push(oid_valued(11, "m-ordering", true));
    push(oid_valued(12, "m-substr", true));
    push(oid_valued(13, "m-syntax", true));
    push(boolean_valued(14, "m-singleValue"));
    push(boolean_valued(15, "m-collective"));
    push(boolean_valued(16, "m-noUserModification"));
    push(string_valued(17, "m-usage", true));
    push(string_valued(18, "m-dependencies", false));
    push(boolean_valued(19, "m-disabled"));
    push(string_valued(20, "m-implementation", true));
    push(boolean_valued(21, "m-humanReadable"));
    push(oid_valued(22, "m-applies", false));
    push(oid_valued(23, "m-aux", false));
    push(oid_valued(24, "m-must-not", false));
    push(oid_valued(25, "m-form", true));

    items
}

fn object_classes() -> Vec<RegistrationItem> {
    let mut items = vec![];
    let mut push = |object_class: ObjectClass| items.push(RegistrationItem::ObjectClass(object_class));

    push(
        ObjectClassBuilder::default()
            .oid(object_class::TOP)
            .name("top")
            .kind(ObjectClassKind::Abstract)
            .must("objectClass")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(object_class::ALIAS)
            .name("alias")
            .superior("top")
            .kind(ObjectClassKind::Structural)
            .must("aliasedObjectName")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(object_class::EXTENSIBLE_OBJECT)
            .name("extensibleObject")
            .superior("top")
            .kind(ObjectClassKind::Auxiliary)
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(object_class::PERSON)
            .name("person")
            .superior("top")
            .kind(ObjectClassKind::Structural)
            .must("sn")
            .must("cn")
            .may("userPassword")
            .may("telephoneNumber")
            .may("seeAlso")
            .may("description")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(object_class::ORGANIZATIONAL_PERSON)
            .name("organizationalPerson")
            .superior("person")
            .kind(ObjectClassKind::Structural)
            .may("title")
            .may("ou")
            .may("st")
            .may("l")
            .may("street")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(object_class::INET_ORG_PERSON)
            .name("inetOrgPerson")
            .superior("organizationalPerson")
            .kind(ObjectClassKind::Structural)
            .may("uid")
            .may("mail")
            .may("givenName")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(object_class::ORGANIZATIONAL_UNIT)
            .name("organizationalUnit")
            .superior("top")
            .kind(ObjectClassKind::Structural)
            .must("ou")
            .may("description")
            .may("l")
            .may("st")
            .may("street")
            .may("seeAlso")
            .may("userPassword")
            .may("telephoneNumber")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(object_class::ORGANIZATION)
            .name("organization")
            .superior("top")
            .kind(ObjectClassKind::Structural)
            .must("o")
            .may("description")
            .may("l")
            .may("st")
            .may("street")
            .may("seeAlso")
            .may("telephoneNumber")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(object_class::COUNTRY)
            .name("country")
            .superior("top")
            .kind(ObjectClassKind::Structural)
            .must("c")
            .may("description")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(object_class::DOMAIN)
            .name("domain")
            .superior("top")
            .kind(ObjectClassKind::Structural)
            .must("dc")
            .may("description")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid("2.5.6.3")
            .name("locality")
            .superior("top")
            .kind(ObjectClassKind::Structural)
            .may("l")
            .may("st")
            .may("street")
            .may("seeAlso")
            .may("description")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid("2.5.6.9")
            .name("groupOfNames")
            .superior("top")
            .kind(ObjectClassKind::Structural)
            .must("member")
            .must("cn")
            .may("businessCategory")
            .may("seeAlso")
            .may("owner")
            .may("ou")
            .may("o")
            .may("description")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid("2.5.6.17")
            .name("groupOfUniqueNames")
            .superior("top")
            .kind(ObjectClassKind::Structural)
            .must("uniqueMember")
            .must("cn")
            .may("businessCategory")
            .may("seeAlso")
            .may("owner")
            .may("ou")
            .may("o")
            .may("description")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid("2.5.6.11")
            .name("applicationProcess")
            .superior("top")
            .kind(ObjectClassKind::Structural)
            .must("cn")
            .may("seeAlso")
            .may("ou")
            .may("l")
            .may("description")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid("2.5.6.14")
            .name("device")
            .superior("top")
            .kind(ObjectClassKind::Structural)
            .must("cn")
            .may("serialNumber")
            .may("seeAlso")
            .may("owner")
            .may("ou")
            .may("o")
            .may("l")
            .may("description")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(object_class::SUBSCHEMA)
            .name("subschema")
            .superior("top")
            .kind(ObjectClassKind::Auxiliary)
            .may("cn")
            .build(),
    );

    items
}

fn meta_object_classes() -> Vec<RegistrationItem> {
    let mut items = vec![];
    let mut push = |object_class: ObjectClass| items.push(RegistrationItem::ObjectClass(object_class));

    push(
        ObjectClassBuilder::default()
            .oid(meta_class_oid(1))
            .name("metaTop")
            .superior("top")
            .kind(ObjectClassKind::Abstract)
            .must("m-oid")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(meta_class_oid(2))
            .name("metaObjectClass")
            .superior("metaTop")
            .kind(ObjectClassKind::Structural)
            .may("m-name")
            .may("m-description")
            .may("m-obsolete")
            .may("m-supObjectClass")
            .may("m-typeObjectClass")
            .may("m-must")
            .may("m-may")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(meta_class_oid(3))
            .name("metaAttributeType")
            .superior("metaTop")
            .kind(ObjectClassKind::Structural)
            .may("m-name")
            .may("m-description")
            .may("m-obsolete")
            .may("m-supAttributeType")
            .may("m-equality")
            .may("m-ordering")
            .may("m-substr")
            .may("m-syntax")
            .may("m-singleValue")
            .may("m-collective")
            .may("m-noUserModification")
            .may("m-usage")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(meta_class_oid(4))
            .name("metaSyntax")
            .superior("metaTop")
            .kind(ObjectClassKind::Structural)
            .may("m-description")
            .may("m-humanReadable")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(meta_class_oid(5))
            .name("metaMatchingRule")
            .superior("metaTop")
            .kind(ObjectClassKind::Structural)
            .may("m-name")
            .may("m-description")
            .may("m-obsolete")
            .may("m-syntax")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(meta_class_oid(6))
            .name("metaSchema")
            .superior("top")
            .kind(ObjectClassKind::Structural)
            .must("cn")
            .may("m-dependencies")
            .may("m-disabled")
            .may("m-description")
            .build(),
    );
    for (suffix, name) in [(7, "metaSyntaxChecker"), (8, "metaNormalizer"), (9, "metaComparator")].iter() {
        push(
            ObjectClassBuilder::default()
                .oid(meta_class_oid(*suffix))
                .name(*name)
                .superior("metaTop")
                .kind(ObjectClassKind::Structural)
                .must("m-implementation")
                .may("m-description")
                .build(),
        );
    }
    push(
        ObjectClassBuilder::default()
            .oid(meta_class_oid(10))
            .name("metaMatchingRuleUse")
            .superior("metaTop")
            .kind(ObjectClassKind::Structural)
            .must("m-applies")
            .may("m-name")
            .may("m-description")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(meta_class_oid(11))
            .name("metaDITContentRule")
            .superior("metaTop")
            .kind(ObjectClassKind::Structural)
            .may("m-name")
            .may("m-description")
            .may("m-aux")
            .may("m-must")
            .may("m-may")
            .may("m-must-not")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(meta_class_oid(12))
            .name("metaDITStructureRule")
            .superior("metaTop")
            .kind(ObjectClassKind::Structural)
            .must("m-form")
            .may("m-name")
            .may("m-description")
            .build(),
    );
    push(
        ObjectClassBuilder::default()
            .oid(meta_class_oid(13))
            .name("metaNameForm")
            .superior("metaTop")
            .kind(ObjectClassKind::Structural)
            .must("m-typeObjectClass")
            .may("m-name")
            .may("m-description")
            .may("m-must")
            .may("m-may")
            .build(),
    );

    items
}

/// builds a registry holding the bootstrap schema. Everything funnels
/// through the deferred-queue loader, the same path user schemas take.
pub fn bootstrap() -> OperationResult<Registries> {
    let mut registries = Registries::new();
    registries.register_schema(Schema::new("system"))?;
    registries.register_schema(Schema::new("core").with_dependencies(vec!["system".to_owned()]))?;

    register_checkers(&mut registries);
    register_rule_bindings(&mut registries);

    let mut items = syntaxes();
    items.extend(matching_rules());
    items.extend(attribute_types());
    items.extend(meta_attribute_types());
    items.extend(object_classes());
    items.extend(meta_object_classes());
    SchemaLoader::load(&mut registries, items)?;

    log::debug!(
        "bootstrap schema loaded: {} syntaxes, {} matching rules, {} attribute types, {} object classes",
        registries.syntaxes().len(),
        registries.matching_rules().len(),
        registries.attribute_types().len(),
        registries.object_classes().len()
    );
    Ok(registries)
}
