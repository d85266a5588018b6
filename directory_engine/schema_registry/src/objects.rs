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

use std::fmt::{self, Display, Formatter};

/// behaviour shared by every registered schema object: a canonical OID,
/// zero or more name aliases and the schema that owns it.
pub trait SchemaObject {
    fn oid(&self) -> &str;

    fn names(&self) -> &[String];

    fn schema_name(&self) -> &str;

    fn is_obsolete(&self) -> bool;
}

macro_rules! schema_object_impl {
    ($ty:ty) => {
        impl SchemaObject for $ty {
            fn oid(&self) -> &str {
                &self.oid
            }

            fn names(&self) -> &[String] {
                &self.names
            }

            fn schema_name(&self) -> &str {
                &self.schema_name
            }

            fn is_obsolete(&self) -> bool {
                self.obsolete
            }
        }
    };
}

/// attribute usage per RFC 4512 §4.1.2. Anything other than
/// `UserApplications` is an operational attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    UserApplications,
    DirectoryOperation,
    DistributedOperation,
    DsaOperation,
}

impl Usage {
    pub fn parse(value: &str) -> Option<Usage> {
        match value {
            v if v.eq_ignore_ascii_case("userApplications") => Some(Usage::UserApplications),
            v if v.eq_ignore_ascii_case("directoryOperation") => Some(Usage::DirectoryOperation),
            v if v.eq_ignore_ascii_case("distributedOperation") => Some(Usage::DistributedOperation),
            v if v.eq_ignore_ascii_case("dSAOperation") => Some(Usage::DsaOperation),
            _ => None,
        }
    }

    pub fn is_operational(self) -> bool {
        self != Usage::UserApplications
    }
}

impl Default for Usage {
    fn default() -> Usage {
        Usage::UserApplications
    }
}

impl Display for Usage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rendered = match self {
            Usage::UserApplications => "userApplications",
            Usage::DirectoryOperation => "directoryOperation",
            Usage::DistributedOperation => "distributedOperation",
            Usage::DsaOperation => "dSAOperation",
        };
        write!(f, "{}", rendered)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClassKind {
    Structural,
    Auxiliary,
    Abstract,
}

impl Default for ObjectClassKind {
    fn default() -> ObjectClassKind {
        ObjectClassKind::Structural
    }
}

impl ObjectClassKind {
    pub fn parse(value: &str) -> Option<ObjectClassKind> {
        match value {
            v if v.eq_ignore_ascii_case("STRUCTURAL") => Some(ObjectClassKind::Structural),
            v if v.eq_ignore_ascii_case("AUXILIARY") => Some(ObjectClassKind::Auxiliary),
            v if v.eq_ignore_ascii_case("ABSTRACT") => Some(ObjectClassKind::Abstract),
            _ => None,
        }
    }
}

impl Display for ObjectClassKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rendered = match self {
            ObjectClassKind::Structural => "STRUCTURAL",
            ObjectClassKind::Auxiliary => "AUXILIARY",
            ObjectClassKind::Abstract => "ABSTRACT",
        };
        write!(f, "{}", rendered)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LdapSyntax {
    pub oid: String,
    pub names: Vec<String>,
    pub description: Option<String>,
    pub obsolete: bool,
    pub schema_name: String,
    pub human_readable: bool,
}

schema_object_impl!(LdapSyntax);

impl LdapSyntax {
    pub fn new<O: Into<String>, D: Into<String>>(oid: O, description: D, human_readable: bool) -> LdapSyntax {
        LdapSyntax {
            oid: oid.into(),
            names: vec![],
            description: Some(description.into()),
            obsolete: false,
            schema_name: "system".to_owned(),
            human_readable,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchingRule {
    pub oid: String,
    pub names: Vec<String>,
    pub description: Option<String>,
    pub obsolete: bool,
    pub schema_name: String,
    pub syntax_oid: String,
}

schema_object_impl!(MatchingRule);

impl MatchingRule {
    pub fn new<O: Into<String>, N: Into<String>, S: Into<String>>(oid: O, name: N, syntax_oid: S) -> MatchingRule {
        MatchingRule {
            oid: oid.into(),
            names: vec![name.into()],
            description: None,
            obsolete: false,
            schema_name: "system".to_owned(),
            syntax_oid: syntax_oid.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeType {
    pub oid: String,
    pub names: Vec<String>,
    pub description: Option<String>,
    pub obsolete: bool,
    pub schema_name: String,
    pub superior_oid: Option<String>,
    pub syntax_oid: Option<String>,
    pub equality_oid: Option<String>,
    pub ordering_oid: Option<String>,
    pub substring_oid: Option<String>,
    pub single_valued: bool,
    pub collective: bool,
    pub user_modifiable: bool,
    pub usage: Usage,
}

schema_object_impl!(AttributeType);

impl AttributeType {
    pub fn primary_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(&self.oid)
    }
}

/// builder mirroring the optional-heavy RFC 4512 attribute description.
#[derive(Debug, Default)]
pub struct AttributeTypeBuilder {
    oid: String,
    names: Vec<String>,
    description: Option<String>,
    obsolete: bool,
    schema_name: Option<String>,
    superior_oid: Option<String>,
    syntax_oid: Option<String>,
    equality_oid: Option<String>,
    ordering_oid: Option<String>,
    substring_oid: Option<String>,
    single_valued: bool,
    collective: bool,
    no_user_modification: bool,
    usage: Usage,
}

impl AttributeTypeBuilder {
    pub fn oid<O: Into<String>>(mut self, oid: O) -> Self {
        self.oid = oid.into();
        self
    }

    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn description<D: Into<String>>(mut self, description: D) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn obsolete(mut self) -> Self {
        self.obsolete = true;
        self
    }

    pub fn schema<S: Into<String>>(mut self, schema: S) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    pub fn superior<S: Into<String>>(mut self, superior: S) -> Self {
        self.superior_oid = Some(superior.into());
        self
    }

    pub fn syntax<S: Into<String>>(mut self, syntax: S) -> Self {
        self.syntax_oid = Some(syntax.into());
        self
    }

    pub fn equality<E: Into<String>>(mut self, equality: E) -> Self {
        self.equality_oid = Some(equality.into());
        self
    }

    pub fn ordering<O: Into<String>>(mut self, ordering: O) -> Self {
        self.ordering_oid = Some(ordering.into());
        self
    }

    pub fn substring<S: Into<String>>(mut self, substring: S) -> Self {
        self.substring_oid = Some(substring.into());
        self
    }

    pub fn single_valued(mut self) -> Self {
        self.single_valued = true;
        self
    }

    pub fn collective(mut self) -> Self {
        self.collective = true;
        self
    }

    pub fn no_user_modification(mut self) -> Self {
        self.no_user_modification = true;
        self
    }

    pub fn usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    pub fn build(self) -> AttributeType {
        AttributeType {
            oid: self.oid,
            names: self.names,
            description: self.description,
            obsolete: self.obsolete,
            schema_name: self.schema_name.unwrap_or_else(|| "system".to_owned()),
            superior_oid: self.superior_oid,
            syntax_oid: self.syntax_oid,
            equality_oid: self.equality_oid,
            ordering_oid: self.ordering_oid,
            substring_oid: self.substring_oid,
            single_valued: self.single_valued,
            collective: self.collective,
            user_modifiable: !self.no_user_modification,
            usage: self.usage,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectClass {
    pub oid: String,
    pub names: Vec<String>,
    pub description: Option<String>,
    pub obsolete: bool,
    pub schema_name: String,
    pub superior_oids: Vec<String>,
    pub kind: ObjectClassKind,
    pub must_oids: Vec<String>,
    pub may_oids: Vec<String>,
}

schema_object_impl!(ObjectClass);

impl ObjectClass {
    pub fn primary_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(&self.oid)
    }
}

#[derive(Debug, Default)]
pub struct ObjectClassBuilder {
    oid: String,
    names: Vec<String>,
    description: Option<String>,
    obsolete: bool,
    schema_name: Option<String>,
    superior_oids: Vec<String>,
    kind: Option<ObjectClassKind>,
    must_oids: Vec<String>,
    may_oids: Vec<String>,
}

impl ObjectClassBuilder {
    pub fn oid<O: Into<String>>(mut self, oid: O) -> Self {
        self.oid = oid.into();
        self
    }

    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn description<D: Into<String>>(mut self, description: D) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn schema<S: Into<String>>(mut self, schema: S) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    pub fn superior<S: Into<String>>(mut self, superior: S) -> Self {
        self.superior_oids.push(superior.into());
        self
    }

    pub fn kind(mut self, kind: ObjectClassKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn must<M: Into<String>>(mut self, attribute: M) -> Self {
        self.must_oids.push(attribute.into());
        self
    }

    pub fn may<M: Into<String>>(mut self, attribute: M) -> Self {
        self.may_oids.push(attribute.into());
        self
    }

    pub fn build(self) -> ObjectClass {
        ObjectClass {
            oid: self.oid,
            names: self.names,
            description: self.description,
            obsolete: self.obsolete,
            schema_name: self.schema_name.unwrap_or_else(|| "system".to_owned()),
            superior_oids: self.superior_oids,
            kind: self.kind.unwrap_or(ObjectClassKind::Structural),
            must_oids: self.must_oids,
            may_oids: self.may_oids,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchingRuleUse {
    pub oid: String,
    pub names: Vec<String>,
    pub description: Option<String>,
    pub obsolete: bool,
    pub schema_name: String,
    pub applies_to: Vec<String>,
}

schema_object_impl!(MatchingRuleUse);

#[derive(Debug, Clone, PartialEq)]
pub struct DitContentRule {
    pub oid: String,
    pub names: Vec<String>,
    pub description: Option<String>,
    pub obsolete: bool,
    pub schema_name: String,
    pub aux_oids: Vec<String>,
    pub must_oids: Vec<String>,
    pub may_oids: Vec<String>,
    pub not_oids: Vec<String>,
}

schema_object_impl!(DitContentRule);

#[derive(Debug, Clone, PartialEq)]
pub struct DitStructureRule {
    pub oid: String,
    pub names: Vec<String>,
    pub description: Option<String>,
    pub obsolete: bool,
    pub schema_name: String,
    pub form_oid: String,
    pub superior_rules: Vec<String>,
}

schema_object_impl!(DitStructureRule);

#[derive(Debug, Clone, PartialEq)]
pub struct NameForm {
    pub oid: String,
    pub names: Vec<String>,
    pub description: Option<String>,
    pub obsolete: bool,
    pub schema_name: String,
    pub structural_class_oid: String,
    pub must_oids: Vec<String>,
    pub may_oids: Vec<String>,
}

schema_object_impl!(NameForm);

/// a named unit of schema objects. Objects of a disabled schema are held
/// staged on the schema instead of being registered.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: String,
    pub owner: String,
    pub dependencies: Vec<String>,
    pub enabled: bool,
}

impl Schema {
    pub fn new<N: Into<String>>(name: N) -> Schema {
        Schema {
            name: name.into(),
            owner: "uid=admin,ou=system".to_owned(),
            dependencies: vec![],
            enabled: true,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Schema {
        self.dependencies = dependencies;
        self
    }

    pub fn disabled(mut self) -> Schema {
        self.enabled = false;
        self
    }
}
