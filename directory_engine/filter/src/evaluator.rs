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

use crate::Filter;
use model::{AttributeValue, Entry, OperationResult};
use schema_registry::{AttributeType, Registries};
use std::cmp::Ordering;

/// decides a filter against one candidate entry. Leaves delegate to the
/// attribute's matching rules: the equality rule's normalizer for equality
/// and substrings, the ordering rule's comparator for range assertions.
/// An assertion on an unregistered attribute is undefined and reads as
/// `false`, per LDAP filter semantics.
pub struct FilterEvaluator<'a> {
    registries: &'a Registries,
}

impl<'a> From<&'a Registries> for FilterEvaluator<'a> {
    fn from(registries: &'a Registries) -> FilterEvaluator<'a> {
        FilterEvaluator { registries }
    }
}

impl<'a> FilterEvaluator<'a> {
    pub fn evaluate(&self, filter: &Filter, entry: &Entry) -> OperationResult<bool> {
        match filter {
            Filter::And(children) => {
                for child in children {
                    if !self.evaluate(child, entry)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::Or(children) => {
                for child in children {
                    if self.evaluate(child, entry)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Filter::Not(child) => Ok(!self.evaluate(child, entry)?),
            Filter::Present(attribute) => Ok(self.present(attribute, entry)),
            Filter::Equality(attribute, value) => Ok(self.matches_equality(attribute, value, entry)),
            Filter::Substring {
                attribute,
                initial,
                any,
                last,
            } => Ok(self.matches_substring(attribute, initial.as_deref(), any, last.as_deref(), entry)),
            Filter::GreaterOrEqual(attribute, value) => {
                Ok(self.matches_ordering(attribute, value, entry, |ordering| ordering != Ordering::Less))
            }
            Filter::LessOrEqual(attribute, value) => {
                Ok(self.matches_ordering(attribute, value, entry, |ordering| ordering != Ordering::Greater))
            }
            Filter::Approximate(attribute, value) => Ok(self.matches_equality(attribute, value, entry)),
            Filter::Extensible { attribute, rule, value } => {
                Ok(self.matches_extensible(attribute.as_deref(), rule.as_deref(), value, entry))
            }
        }
    }

    /// the attribute type hierarchy below (and including) the asserted id;
    /// an assertion on `name` sees values of `cn`, `ou` and the rest of the
    /// hierarchy.
    fn expanded_attributes(&self, attribute_id: &str) -> Vec<&AttributeType> {
        match self.registries.attribute_descendants(attribute_id) {
            Ok(oids) => oids
                .iter()
                .filter_map(|oid| self.registries.attribute_type(oid).ok())
                .collect(),
            Err(_) => vec![],
        }
    }

    fn present(&self, attribute_id: &str, entry: &Entry) -> bool {
        self.expanded_attributes(attribute_id)
            .iter()
            .any(|attribute_type| entry.has_attribute(attribute_type.primary_name()))
    }

    fn normalizer_of(&self, attribute_type: &AttributeType) -> Option<std::sync::Arc<dyn schema_registry::Normalizer>> {
        self.registries
            .effective_equality(attribute_type)
            .map(|rule| self.registries.normalizer(&rule.oid))
    }

    fn matches_equality(&self, attribute_id: &str, asserted: &str, entry: &Entry) -> bool {
        for attribute_type in self.expanded_attributes(attribute_id) {
            let values = match entry.get(attribute_type.primary_name()) {
                Some(attribute) => attribute.values(),
                None => continue,
            };
            let normalizer = self.normalizer_of(attribute_type);
            let assertion = match &normalizer {
                Some(normalizer) => normalizer.normalize(asserted),
                None => asserted.to_owned(),
            };
            for value in values {
                if let Some(text) = value.as_text() {
                    let candidate = match &normalizer {
                        Some(normalizer) => normalizer.normalize(text),
                        None => text.to_owned(),
                    };
                    if candidate == assertion {
                        return true;
                    }
                } else if value.as_raw_bytes() == asserted.as_bytes() {
                    return true;
                }
            }
        }
        false
    }

    fn matches_substring(
        &self,
        attribute_id: &str,
        initial: Option<&str>,
        any: &[String],
        last: Option<&str>,
        entry: &Entry,
    ) -> bool {
        for attribute_type in self.expanded_attributes(attribute_id) {
            let values = match entry.get(attribute_type.primary_name()) {
                Some(attribute) => attribute.values(),
                None => continue,
            };
            // substring assertions normalize with the equality rule, so
            // caseIgnore attributes match case-insensitively
            let normalizer = self.normalizer_of(attribute_type);
            let normalize = |text: &str| match &normalizer {
                Some(normalizer) => normalizer.normalize(text),
                None => text.to_owned(),
            };
            let initial = initial.map(&normalize);
            let any = any.iter().map(|part| normalize(part)).collect::<Vec<String>>();
            let last = last.map(&normalize);
            for value in values.iter().filter_map(AttributeValue::as_text) {
                if substring_match(&normalize(value), initial.as_deref(), &any, last.as_deref()) {
                    return true;
                }
            }
        }
        false
    }

    fn matches_ordering<F>(&self, attribute_id: &str, asserted: &str, entry: &Entry, accept: F) -> bool
    where
        F: Fn(Ordering) -> bool,
    {
        for attribute_type in self.expanded_attributes(attribute_id) {
            let values = match entry.get(attribute_type.primary_name()) {
                Some(attribute) => attribute.values(),
                None => continue,
            };
            let rule = self
                .registries
                .effective_ordering(attribute_type)
                .or_else(|| self.registries.effective_equality(attribute_type));
            let (normalizer, comparator) = match rule {
                Some(rule) => (self.registries.normalizer(&rule.oid), self.registries.comparator(&rule.oid)),
                None => continue,
            };
            let assertion = normalizer.normalize(asserted);
            for value in values.iter().filter_map(AttributeValue::as_text) {
                if accept(comparator.compare(&normalizer.normalize(value), &assertion)) {
                    return true;
                }
            }
        }
        false
    }

    fn matches_extensible(
        &self,
        attribute_id: Option<&str>,
        rule_id: Option<&str>,
        asserted: &str,
        entry: &Entry,
    ) -> bool {
        let rule = match rule_id {
            Some(rule_id) => match self.registries.matching_rule(rule_id) {
                Ok(rule) => Some(rule.oid.clone()),
                Err(_) => return false,
            },
            None => None,
        };
        match (attribute_id, rule) {
            (Some(attribute_id), Some(rule_oid)) => {
                let normalizer = self.registries.normalizer(&rule_oid);
                let assertion = normalizer.normalize(asserted);
                self.expanded_attributes(attribute_id).iter().any(|attribute_type| {
                    entry
                        .get(attribute_type.primary_name())
                        .map(|attribute| {
                            attribute
                                .values()
                                .iter()
                                .filter_map(AttributeValue::as_text)
                                .any(|value| normalizer.normalize(value) == assertion)
                        })
                        .unwrap_or(false)
                })
            }
            (Some(attribute_id), None) => self.matches_equality(attribute_id, asserted, entry),
            (None, Some(rule_oid)) => {
                // rule-only assertion: try every attribute of the entry
                let normalizer = self.registries.normalizer(&rule_oid);
                let assertion = normalizer.normalize(asserted);
                entry.attributes().any(|attribute| {
                    attribute
                        .values()
                        .iter()
                        .filter_map(AttributeValue::as_text)
                        .any(|value| normalizer.normalize(value) == assertion)
                })
            }
            (None, None) => false,
        }
    }
}

/// initial/any/final matching over one normalized value.
fn substring_match(value: &str, initial: Option<&str>, any: &[String], last: Option<&str>) -> bool {
    let mut remainder = value;
    if let Some(initial) = initial {
        match remainder.strip_prefix(initial) {
            Some(rest) => remainder = rest,
            None => return false,
        }
    }
    if let Some(last) = last {
        match remainder.strip_suffix(last) {
            Some(rest) => remainder = rest,
            None => return false,
        }
    }
    for part in any {
        match remainder.find(part.as_str()) {
            Some(index) => remainder = &remainder[index + part.len()..],
            None => return false,
        }
    }
    true
}
