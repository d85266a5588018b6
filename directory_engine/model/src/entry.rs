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

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// one attribute value, either a UTF-8 string or raw bytes. The schema
/// validator rewrites `Bytes` into `Text` for human-readable syntaxes.
#[derive(Debug, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub enum AttributeValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl AttributeValue {
    pub fn text<S: Into<String>>(value: S) -> AttributeValue {
        AttributeValue::Text(value.into())
    }

    pub fn bytes(value: Vec<u8>) -> AttributeValue {
        AttributeValue::Bytes(value)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(value) => Some(value),
            AttributeValue::Bytes(_) => None,
        }
    }

    pub fn as_raw_bytes(&self) -> &[u8] {
        match self {
            AttributeValue::Text(value) => value.as_bytes(),
            AttributeValue::Bytes(value) => value,
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(value) => write!(f, "{}", value),
            AttributeValue::Bytes(value) => write!(f, "#{} bytes", value.len()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> AttributeValue {
        AttributeValue::Text(value.to_owned())
    }
}

/// an attribute of an entry: the id as it should be displayed plus the
/// ordered set of its values. Values keep insertion order; duplicates are
/// rejected at insertion by byte equality (matching-rule aware duplicate
/// detection happens in the validator).
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    id: String,
    values: Vec<AttributeValue>,
}

impl Attribute {
    pub fn new<S: Into<String>>(id: S, values: Vec<AttributeValue>) -> Attribute {
        let mut attribute = Attribute {
            id: id.into(),
            values: vec![],
        };
        for value in values {
            attribute.add_value(value);
        }
        attribute
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn values(&self) -> &[AttributeValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &AttributeValue) -> bool {
        self.values.contains(value)
    }

    pub fn add_value(&mut self, value: AttributeValue) -> bool {
        if self.values.contains(&value) {
            false
        } else {
            self.values.push(value);
            true
        }
    }

    pub fn remove_value(&mut self, value: &AttributeValue) -> bool {
        match self.values.iter().position(|existing| existing == value) {
            Some(index) => {
                self.values.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn first_text(&self) -> Option<&str> {
        self.values.first().and_then(AttributeValue::as_text)
    }
}

/// an entry body: attribute id to value set. Lookup is case-insensitive on
/// the attribute id; the id under which an attribute was first stored is
/// preserved for display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entry {
    attributes: BTreeMap<String, Attribute>,
}

fn fold(id: &str) -> String {
    id.to_ascii_lowercase()
}

impl Entry {
    pub fn new() -> Entry {
        Entry::default()
    }

    pub fn get(&self, attribute_id: &str) -> Option<&Attribute> {
        self.attributes.get(&fold(attribute_id))
    }

    pub fn has_attribute(&self, attribute_id: &str) -> bool {
        self.attributes.contains_key(&fold(attribute_id))
    }

    pub fn has_value(&self, attribute_id: &str, value: &AttributeValue) -> bool {
        self.get(attribute_id).map(|attr| attr.contains(value)).unwrap_or(false)
    }

    pub fn put(&mut self, attribute: Attribute) -> Option<Attribute> {
        self.attributes.insert(fold(attribute.id()), attribute)
    }

    pub fn add_value<S: AsRef<str>>(&mut self, attribute_id: S, value: AttributeValue) -> bool {
        let key = fold(attribute_id.as_ref());
        match self.attributes.get_mut(&key) {
            Some(attribute) => attribute.add_value(value),
            None => {
                self.attributes
                    .insert(key, Attribute::new(attribute_id.as_ref(), vec![value]));
                true
            }
        }
    }

    pub fn remove_value(&mut self, attribute_id: &str, value: &AttributeValue) -> bool {
        let key = fold(attribute_id);
        let removed = match self.attributes.get_mut(&key) {
            Some(attribute) => attribute.remove_value(value),
            None => false,
        };
        if removed && self.attributes.get(&key).map(Attribute::is_empty).unwrap_or(false) {
            self.attributes.remove(&key);
        }
        removed
    }

    pub fn remove_attribute(&mut self, attribute_id: &str) -> Option<Attribute> {
        self.attributes.remove(&fold(attribute_id))
    }

    /// re-keys an attribute under a canonical id, keeping its values.
    pub fn rename_attribute(&mut self, attribute_id: &str, canonical_id: &str) {
        if let Some(attribute) = self.attributes.remove(&fold(attribute_id)) {
            self.attributes
                .insert(fold(canonical_id), Attribute::new(canonical_id, attribute.values.clone()));
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    pub fn attribute_ids(&self) -> Vec<String> {
        self.attributes.values().map(|attribute| attribute.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn object_classes(&self) -> Vec<String> {
        self.get("objectClass")
            .map(|attribute| {
                attribute
                    .values()
                    .iter()
                    .filter_map(AttributeValue::as_text)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_object_class(&self, name: &str) -> bool {
        self.object_classes().iter().any(|oc| oc.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with_person() -> Entry {
        let mut entry = Entry::new();
        entry.add_value("objectClass", AttributeValue::from("top"));
        entry.add_value("objectClass", AttributeValue::from("person"));
        entry.add_value("cn", AttributeValue::from("John Doe"));
        entry
    }

    #[test]
    fn attribute_lookup_is_case_insensitive() {
        let entry = entry_with_person();
        assert!(entry.has_attribute("CN"));
        assert_eq!(entry.get("Cn").map(Attribute::id), Some("cn"));
    }

    #[test]
    fn duplicate_values_are_not_stored_twice() {
        let mut entry = entry_with_person();
        assert!(!entry.add_value("cn", AttributeValue::from("John Doe")));
        assert_eq!(entry.get("cn").map(Attribute::len), Some(1));
    }

    #[test]
    fn removing_last_value_removes_attribute() {
        let mut entry = entry_with_person();
        assert!(entry.remove_value("cn", &AttributeValue::from("John Doe")));
        assert!(!entry.has_attribute("cn"));
    }

    #[test]
    fn object_classes_are_read_from_any_case() {
        let entry = entry_with_person();
        assert!(entry.has_object_class("PERSON"));
        assert_eq!(entry.object_classes(), vec!["top".to_owned(), "person".to_owned()]);
    }

    #[test]
    fn value_order_is_preserved() {
        let entry = entry_with_person();
        let classes = entry.object_classes();
        assert_eq!(classes[0], "top");
        assert_eq!(classes[1], "person");
    }
}
