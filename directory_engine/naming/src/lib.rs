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
use model::{OperationError, OperationResult};
use std::fmt::{self, Display, Formatter};

mod parser;

pub use parser::parse_dn;

/// resolves attribute ids to canonical OIDs and applies the type's equality
/// normalizer to a value. Implemented by the schema registry; the seam keeps
/// this crate free of a schema dependency.
pub trait NormalizerSource {
    fn normalize_ava(&self, attribute_id: &str, value: &str) -> OperationResult<(String, String)>;
}

/// escapes one attribute value for RFC 4514 rendering.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let chars = value.chars().collect::<Vec<char>>();
    for (position, ch) in chars.iter().enumerate() {
        let leading = position == 0;
        let trailing = position == chars.len() - 1;
        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                out.push('\\');
                out.push(*ch);
            }
            '#' if leading => {
                out.push('\\');
                out.push(*ch);
            }
            ' ' if leading || trailing => {
                out.push('\\');
                out.push(*ch);
            }
            _ => out.push(*ch),
        }
    }
    out
}

/// a single attribute-value assertion of an RDN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ava {
    attribute: String,
    value: String,
    normalized_attribute: Option<String>,
    normalized_value: Option<String>,
}

impl Ava {
    pub fn new<A: Into<String>, V: Into<String>>(attribute: A, value: V) -> Ava {
        Ava {
            attribute: attribute.into(),
            value: value.into(),
            normalized_attribute: None,
            normalized_value: None,
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn normalized_attribute(&self) -> Option<&str> {
        self.normalized_attribute.as_deref()
    }

    fn normalize(&mut self, source: &dyn NormalizerSource) -> OperationResult<String> {
        let (oid, normalized) = source.normalize_ava(&self.attribute, &self.value)?;
        self.normalized_attribute = Some(oid.clone());
        self.normalized_value = Some(normalized.clone());
        Ok(format!("{}={}", oid, escape_value(&normalized)))
    }
}

impl Display for Ava {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attribute, escape_value(&self.value))
    }
}

/// one relative distinguished name: a set of at least one AVA. Multi-valued
/// RDNs keep all their AVAs; the normalized form orders them by OID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    avas: Vec<Ava>,
    normalized: Option<String>,
}

impl Rdn {
    pub fn new(avas: Vec<Ava>) -> Rdn {
        Rdn { avas, normalized: None }
    }

    pub fn single<A: Into<String>, V: Into<String>>(attribute: A, value: V) -> Rdn {
        Rdn::new(vec![Ava::new(attribute, value)])
    }

    pub fn avas(&self) -> &[Ava] {
        &self.avas
    }

    pub fn normalized(&self) -> Option<&str> {
        self.normalized.as_deref()
    }

    /// the value bound to the given attribute id within this RDN, if any.
    pub fn value_of(&self, attribute_id: &str) -> Option<&str> {
        self.avas
            .iter()
            .find(|ava| ava.attribute.eq_ignore_ascii_case(attribute_id))
            .map(|ava| ava.value.as_str())
    }

    fn normalize(&mut self, source: &dyn NormalizerSource) -> OperationResult<String> {
        let mut parts = Vec::with_capacity(self.avas.len());
        for ava in self.avas.iter_mut() {
            parts.push(ava.normalize(source)?);
        }
        parts.sort();
        let normalized = parts.into_iter().join("+");
        self.normalized = Some(normalized.clone());
        Ok(normalized)
    }
}

impl Display for Rdn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.avas.iter().map(Ava::to_string).join("+"))
    }
}

/// a distinguished name. RDNs are stored leftmost first, so `rdns[0]` names
/// the entry itself and the last RDN sits just under the root. The
/// normalized form is computed lazily through a `NormalizerSource` and
/// cached on the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dn {
    user_provided: String,
    rdns: Vec<Rdn>,
    normalized: Option<String>,
}

impl Dn {
    pub fn parse(input: &str) -> OperationResult<Dn> {
        parse_dn(input)
    }

    pub(crate) fn from_parts(user_provided: String, rdns: Vec<Rdn>) -> Dn {
        Dn {
            user_provided,
            rdns,
            normalized: None,
        }
    }

    /// the empty DN, parent of every suffix.
    pub fn root() -> Dn {
        Dn {
            user_provided: String::new(),
            rdns: vec![],
            normalized: Some(String::new()),
        }
    }

    pub fn user_provided(&self) -> &str {
        &self.user_provided
    }

    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    pub fn rdn(&self) -> Option<&Rdn> {
        self.rdns.first()
    }

    pub fn size(&self) -> usize {
        self.rdns.len()
    }

    pub fn is_root(&self) -> bool {
        self.rdns.is_empty()
    }

    /// computes and caches the normalized form. Safe to call repeatedly;
    /// normalization is idempotent.
    pub fn normalize(&mut self, source: &dyn NormalizerSource) -> OperationResult<&str> {
        if self.normalized.is_none() {
            let mut parts = Vec::with_capacity(self.rdns.len());
            for rdn in self.rdns.iter_mut() {
                parts.push(rdn.normalize(source)?);
            }
            self.normalized = Some(parts.into_iter().join(","));
        }
        Ok(self.normalized.as_deref().unwrap_or(""))
    }

    pub fn normalized(&self) -> Option<&str> {
        self.normalized.as_deref()
    }

    /// the DN with the leftmost RDN removed. `None` for the root.
    pub fn parent(&self) -> Option<Dn> {
        if self.rdns.is_empty() {
            return None;
        }
        let rdns = self.rdns[1..].to_vec();
        let user_provided = rdns.iter().map(Rdn::to_string).join(",");
        let normalized = match &self.normalized {
            Some(_) => {
                let parts = rdns.iter().filter_map(Rdn::normalized).collect::<Vec<_>>();
                if parts.len() == rdns.len() {
                    Some(parts.into_iter().join(","))
                } else {
                    None
                }
            }
            None => None,
        };
        Some(Dn {
            user_provided,
            rdns,
            normalized,
        })
    }

    /// the child of this DN named by `rdn`.
    pub fn child(&self, rdn: Rdn) -> Dn {
        let mut rdns = Vec::with_capacity(self.rdns.len() + 1);
        rdns.push(rdn);
        rdns.extend(self.rdns.iter().cloned());
        let user_provided = rdns.iter().map(Rdn::to_string).join(",");
        Dn {
            user_provided,
            rdns,
            normalized: None,
        }
    }

    /// `true` when `self` sits strictly below `ancestor`. Both DNs must be
    /// normalized first.
    pub fn is_descendant_of(&self, ancestor: &Dn) -> bool {
        if ancestor.rdns.len() >= self.rdns.len() {
            return false;
        }
        let offset = self.rdns.len() - ancestor.rdns.len();
        ancestor
            .rdns
            .iter()
            .zip(self.rdns[offset..].iter())
            .all(|(a, b)| a.normalized() == b.normalized() && a.normalized().is_some())
    }

    pub fn matches(&self, other: &Dn) -> bool {
        match (&self.normalized, &other.normalized) {
            (Some(this), Some(that)) => this == that,
            _ => false,
        }
    }
}

impl Display for Dn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_provided)
    }
}

pub fn invalid_dn<M: Into<String>>(message: M) -> OperationError {
    OperationError::naming_violation(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FoldingSource;

    impl NormalizerSource for FoldingSource {
        fn normalize_ava(&self, attribute_id: &str, value: &str) -> OperationResult<(String, String)> {
            let oid = match attribute_id.to_ascii_lowercase().as_str() {
                "cn" | "2.5.4.3" => "2.5.4.3".to_owned(),
                "ou" | "2.5.4.11" => "2.5.4.11".to_owned(),
                other => other.to_owned(),
            };
            Ok((oid, value.trim().to_ascii_lowercase()))
        }
    }

    #[test]
    fn normalization_folds_case_and_names() {
        let mut dn = Dn::parse("OU=Users,OU=System").unwrap();
        let normalized = dn.normalize(&FoldingSource).unwrap().to_owned();
        assert_eq!(normalized, "2.5.4.11=users,2.5.4.11=system");
    }

    #[test]
    fn normalization_is_idempotent() {
        let mut dn = Dn::parse("ou=Users,ou=system").unwrap();
        let first = dn.normalize(&FoldingSource).unwrap().to_owned();
        let mut reparsed = Dn::parse(&first).unwrap();
        let second = reparsed.normalize(&FoldingSource).unwrap().to_owned();
        assert_eq!(first, second);
    }

    #[test]
    fn parent_of_normalized_dn_keeps_normalized_form() {
        let mut dn = Dn::parse("cn=x,ou=users,ou=system").unwrap();
        dn.normalize(&FoldingSource).unwrap();
        let parent = dn.parent().unwrap();
        assert_eq!(parent.normalized(), Some("2.5.4.11=users,2.5.4.11=system"));
    }

    #[test]
    fn descendant_check_uses_normalized_rdns() {
        let mut base = Dn::parse("ou=system").unwrap();
        base.normalize(&FoldingSource).unwrap();
        let mut child = Dn::parse("ou=users,OU=SYSTEM").unwrap();
        child.normalize(&FoldingSource).unwrap();
        assert!(child.is_descendant_of(&base));
        assert!(!base.is_descendant_of(&child));
    }

    #[test]
    fn multi_valued_rdn_orders_avas_in_normalized_form() {
        let mut dn = Dn::parse("ou=eng+cn=bob,ou=system").unwrap();
        let normalized = dn.normalize(&FoldingSource).unwrap();
        assert_eq!(normalized, "2.5.4.11=eng+2.5.4.3=bob,2.5.4.11=system");
    }

    #[test]
    fn child_extends_on_the_left() {
        let base = Dn::parse("ou=system").unwrap();
        let child = base.child(Rdn::single("ou", "users"));
        assert_eq!(child.user_provided(), "ou=users,ou=system");
        assert_eq!(child.size(), 2);
    }
}
