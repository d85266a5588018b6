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

//! reader and writer for the RFC 4512 schema description syntax, the value
//! form of `attributeTypes`, `objectClasses`, `matchingRules` and
//! `ldapSyntaxes` attributes:
//!
//! `( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( sn $ cn ) )`

use itertools::Itertools;
use model::{OperationError, OperationResult};

mod reader;

use reader::DescriptionReader;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeTypeDescription {
    pub oid: String,
    pub names: Vec<String>,
    pub description: Option<String>,
    pub obsolete: bool,
    pub superior: Option<String>,
    pub equality: Option<String>,
    pub ordering: Option<String>,
    pub substring: Option<String>,
    pub syntax: Option<String>,
    pub single_value: bool,
    pub collective: bool,
    pub no_user_modification: bool,
    pub usage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectClassDescription {
    pub oid: String,
    pub names: Vec<String>,
    pub description: Option<String>,
    pub obsolete: bool,
    pub superiors: Vec<String>,
    pub kind: Option<String>,
    pub must: Vec<String>,
    pub may: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchingRuleDescription {
    pub oid: String,
    pub names: Vec<String>,
    pub description: Option<String>,
    pub obsolete: bool,
    pub syntax: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyntaxDescription {
    pub oid: String,
    pub description: Option<String>,
    pub not_human_readable: bool,
}

fn syntax_error(kind: &str, value: &str) -> OperationError {
    OperationError::invalid_syntax(kind, value)
}

pub fn parse_attribute_type(value: &str) -> OperationResult<AttributeTypeDescription> {
    let mut reader = DescriptionReader::new(value).map_err(|_| syntax_error("attributeTypes", value))?;
    let mut description = AttributeTypeDescription {
        oid: reader.read_oid().map_err(|_| syntax_error("attributeTypes", value))?,
        ..AttributeTypeDescription::default()
    };
    while let Some(keyword) = reader.read_keyword() {
        let outcome = match keyword.as_str() {
            "NAME" => reader.read_qdescrs().map(|names| description.names = names),
            "DESC" => reader.read_qdstring().map(|desc| description.description = Some(desc)),
            "OBSOLETE" => {
                description.obsolete = true;
                Ok(())
            }
            "SUP" => reader.read_oid().map(|oid| description.superior = Some(oid)),
            "EQUALITY" => reader.read_oid().map(|oid| description.equality = Some(oid)),
            "ORDERING" => reader.read_oid().map(|oid| description.ordering = Some(oid)),
            "SUBSTR" | "SUBSTRINGS" => reader.read_oid().map(|oid| description.substring = Some(oid)),
            "SYNTAX" => reader.read_noid_len().map(|oid| description.syntax = Some(oid)),
            "SINGLE-VALUE" => {
                description.single_value = true;
                Ok(())
            }
            "COLLECTIVE" => {
                description.collective = true;
                Ok(())
            }
            "NO-USER-MODIFICATION" => {
                description.no_user_modification = true;
                Ok(())
            }
            "USAGE" => reader.read_oid().map(|usage| description.usage = Some(usage)),
            _ => reader.skip_extension(&keyword),
        };
        outcome.map_err(|_| syntax_error("attributeTypes", value))?;
    }
    reader.expect_close().map_err(|_| syntax_error("attributeTypes", value))?;
    Ok(description)
}

pub fn parse_object_class(value: &str) -> OperationResult<ObjectClassDescription> {
    let mut reader = DescriptionReader::new(value).map_err(|_| syntax_error("objectClasses", value))?;
    let mut description = ObjectClassDescription {
        oid: reader.read_oid().map_err(|_| syntax_error("objectClasses", value))?,
        ..ObjectClassDescription::default()
    };
    while let Some(keyword) = reader.read_keyword() {
        let outcome = match keyword.as_str() {
            "NAME" => reader.read_qdescrs().map(|names| description.names = names),
            "DESC" => reader.read_qdstring().map(|desc| description.description = Some(desc)),
            "OBSOLETE" => {
                description.obsolete = true;
                Ok(())
            }
            "SUP" => reader.read_oids().map(|oids| description.superiors = oids),
            "STRUCTURAL" | "AUXILIARY" | "ABSTRACT" => {
                description.kind = Some(keyword.clone());
                Ok(())
            }
            "MUST" => reader.read_oids().map(|oids| description.must = oids),
            "MAY" => reader.read_oids().map(|oids| description.may = oids),
            _ => reader.skip_extension(&keyword),
        };
        outcome.map_err(|_| syntax_error("objectClasses", value))?;
    }
    reader.expect_close().map_err(|_| syntax_error("objectClasses", value))?;
    Ok(description)
}

pub fn parse_matching_rule(value: &str) -> OperationResult<MatchingRuleDescription> {
    let mut reader = DescriptionReader::new(value).map_err(|_| syntax_error("matchingRules", value))?;
    let mut description = MatchingRuleDescription {
        oid: reader.read_oid().map_err(|_| syntax_error("matchingRules", value))?,
        ..MatchingRuleDescription::default()
    };
    while let Some(keyword) = reader.read_keyword() {
        let outcome = match keyword.as_str() {
            "NAME" => reader.read_qdescrs().map(|names| description.names = names),
            "DESC" => reader.read_qdstring().map(|desc| description.description = Some(desc)),
            "OBSOLETE" => {
                description.obsolete = true;
                Ok(())
            }
            "SYNTAX" => reader.read_noid_len().map(|oid| description.syntax = Some(oid)),
            _ => reader.skip_extension(&keyword),
        };
        outcome.map_err(|_| syntax_error("matchingRules", value))?;
    }
    reader.expect_close().map_err(|_| syntax_error("matchingRules", value))?;
    Ok(description)
}

pub fn parse_syntax(value: &str) -> OperationResult<SyntaxDescription> {
    let mut reader = DescriptionReader::new(value).map_err(|_| syntax_error("ldapSyntaxes", value))?;
    let mut description = SyntaxDescription {
        oid: reader.read_oid().map_err(|_| syntax_error("ldapSyntaxes", value))?,
        ..SyntaxDescription::default()
    };
    while let Some(keyword) = reader.read_keyword() {
        let outcome = match keyword.as_str() {
            "DESC" => reader.read_qdstring().map(|desc| description.description = Some(desc)),
            "X-NOT-HUMAN-READABLE" => reader.read_qdstring().map(|flag| {
                description.not_human_readable = flag.eq_ignore_ascii_case("TRUE");
            }),
            _ => reader.skip_extension(&keyword),
        };
        outcome.map_err(|_| syntax_error("ldapSyntaxes", value))?;
    }
    reader.expect_close().map_err(|_| syntax_error("ldapSyntaxes", value))?;
    Ok(description)
}

fn render_names(out: &mut String, names: &[String]) {
    match names.len() {
        0 => {}
        1 => out.push_str(&format!(" NAME '{}'", names[0])),
        _ => out.push_str(&format!(" NAME ( {} )", names.iter().map(|name| format!("'{}'", name)).join(" "))),
    }
}

fn render_oids(out: &mut String, keyword: &str, oids: &[String]) {
    match oids.len() {
        0 => {}
        1 => out.push_str(&format!(" {} {}", keyword, oids[0])),
        _ => out.push_str(&format!(" {} ( {} )", keyword, oids.iter().join(" $ "))),
    }
}

pub fn render_attribute_type(description: &AttributeTypeDescription) -> String {
    let mut out = format!("( {}", description.oid);
    render_names(&mut out, &description.names);
    if let Some(desc) = &description.description {
        out.push_str(&format!(" DESC '{}'", desc));
    }
    if description.obsolete {
        out.push_str(" OBSOLETE");
    }
    if let Some(sup) = &description.superior {
        out.push_str(&format!(" SUP {}", sup));
    }
    if let Some(equality) = &description.equality {
        out.push_str(&format!(" EQUALITY {}", equality));
    }
    if let Some(ordering) = &description.ordering {
        out.push_str(&format!(" ORDERING {}", ordering));
    }
    if let Some(substring) = &description.substring {
        out.push_str(&format!(" SUBSTR {}", substring));
    }
    if let Some(syntax) = &description.syntax {
        out.push_str(&format!(" SYNTAX {}", syntax));
    }
    if description.single_value {
        out.push_str(" SINGLE-VALUE");
    }
    if description.collective {
        out.push_str(" COLLECTIVE");
    }
    if description.no_user_modification {
        out.push_str(" NO-USER-MODIFICATION");
    }
    if let Some(usage) = &description.usage {
        out.push_str(&format!(" USAGE {}", usage));
    }
    out.push_str(" )");
    out
}

pub fn render_object_class(description: &ObjectClassDescription) -> String {
    let mut out = format!("( {}", description.oid);
    render_names(&mut out, &description.names);
    if let Some(desc) = &description.description {
        out.push_str(&format!(" DESC '{}'", desc));
    }
    if description.obsolete {
        out.push_str(" OBSOLETE");
    }
    render_oids(&mut out, "SUP", &description.superiors);
    if let Some(kind) = &description.kind {
        out.push_str(&format!(" {}", kind));
    }
    render_oids(&mut out, "MUST", &description.must);
    render_oids(&mut out, "MAY", &description.may);
    out.push_str(" )");
    out
}

pub fn render_matching_rule(description: &MatchingRuleDescription) -> String {
    let mut out = format!("( {}", description.oid);
    render_names(&mut out, &description.names);
    if let Some(desc) = &description.description {
        out.push_str(&format!(" DESC '{}'", desc));
    }
    if description.obsolete {
        out.push_str(" OBSOLETE");
    }
    if let Some(syntax) = &description.syntax {
        out.push_str(&format!(" SYNTAX {}", syntax));
    }
    out.push_str(" )");
    out
}

pub fn render_syntax(description: &SyntaxDescription) -> String {
    let mut out = format!("( {}", description.oid);
    if let Some(desc) = &description.description {
        out.push_str(&format!(" DESC '{}'", desc));
    }
    if description.not_human_readable {
        out.push_str(" X-NOT-HUMAN-READABLE 'TRUE'");
    }
    out.push_str(" )");
    out
}
