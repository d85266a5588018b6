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

use itertools::Itertools;
use std::fmt::{self, Display, Formatter};

mod evaluator;
mod parser;

pub use evaluator::FilterEvaluator;
pub use parser::parse_filter;

/// a parsed search filter. Composite nodes carry their children; leaves
/// carry the attribute id and the assertion against it.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Present(String),
    Equality(String, String),
    Substring {
        attribute: String,
        initial: Option<String>,
        any: Vec<String>,
        last: Option<String>,
    },
    GreaterOrEqual(String, String),
    LessOrEqual(String, String),
    Approximate(String, String),
    Extensible {
        attribute: Option<String>,
        rule: Option<String>,
        value: String,
    },
}

impl Filter {
    pub fn and(children: Vec<Filter>) -> Filter {
        Filter::And(children)
    }

    pub fn or(children: Vec<Filter>) -> Filter {
        Filter::Or(children)
    }

    pub fn not(child: Filter) -> Filter {
        Filter::Not(Box::new(child))
    }

    pub fn present<A: Into<String>>(attribute: A) -> Filter {
        Filter::Present(attribute.into())
    }

    pub fn equality<A: Into<String>, V: Into<String>>(attribute: A, value: V) -> Filter {
        Filter::Equality(attribute.into(), value.into())
    }

    /// attribute ids this filter touches, for index planning.
    pub fn attributes(&self) -> Vec<&str> {
        match self {
            Filter::And(children) | Filter::Or(children) => {
                children.iter().flat_map(Filter::attributes).collect()
            }
            Filter::Not(child) => child.attributes(),
            Filter::Present(attribute)
            | Filter::Equality(attribute, _)
            | Filter::GreaterOrEqual(attribute, _)
            | Filter::LessOrEqual(attribute, _)
            | Filter::Approximate(attribute, _)
            | Filter::Substring { attribute, .. } => vec![attribute.as_str()],
            Filter::Extensible { attribute, .. } => attribute.iter().map(String::as_str).collect(),
        }
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '*' => out.push_str("\\2a"),
            '(' => out.push_str("\\28"),
            ')' => out.push_str("\\29"),
            '\\' => out.push_str("\\5c"),
            _ => out.push(ch),
        }
    }
    out
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Filter::And(children) => write!(f, "(&{})", children.iter().map(Filter::to_string).join("")),
            Filter::Or(children) => write!(f, "(|{})", children.iter().map(Filter::to_string).join("")),
            Filter::Not(child) => write!(f, "(!{})", child),
            Filter::Present(attribute) => write!(f, "({}=*)", attribute),
            Filter::Equality(attribute, value) => write!(f, "({}={})", attribute, escape(value)),
            Filter::Substring {
                attribute,
                initial,
                any,
                last,
            } => {
                let mut pattern = String::new();
                if let Some(initial) = initial {
                    pattern.push_str(&escape(initial));
                }
                pattern.push('*');
                for part in any {
                    pattern.push_str(&escape(part));
                    pattern.push('*');
                }
                if let Some(last) = last {
                    pattern.push_str(&escape(last));
                }
                write!(f, "({}={})", attribute, pattern)
            }
            Filter::GreaterOrEqual(attribute, value) => write!(f, "({}>={})", attribute, escape(value)),
            Filter::LessOrEqual(attribute, value) => write!(f, "({}<={})", attribute, escape(value)),
            Filter::Approximate(attribute, value) => write!(f, "({}~={})", attribute, escape(value)),
            Filter::Extensible { attribute, rule, value } => {
                let attribute = attribute.as_deref().unwrap_or("");
                match rule {
                    Some(rule) => write!(f, "({}:{}:={})", attribute, rule, escape(value)),
                    None => write!(f, "({}:={})", attribute, escape(value)),
                }
            }
        }
    }
}
