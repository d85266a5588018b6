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

//! validates a candidate entry against the live schema: attribute
//! recognition, object-class closure normalization, structural uniqueness,
//! MUST/MAY conformance, single-value cardinality, per-value syntax checks
//! and human-readable coercion — in that order, earlier checks gating later
//! ones. Also applies `modify` operation lists under the modify-specific
//! rules (RDN protection, structural-class protection).

use model::{Attribute, AttributeValue, Entry, Modification, OperationError, OperationResult};
use naming::Rdn;
use schema_registry::{oids, ObjectClassKind, Registries};
use std::collections::BTreeSet;

pub struct EntryValidator<'a> {
    registries: &'a Registries,
}

impl<'a> From<&'a Registries> for EntryValidator<'a> {
    fn from(registries: &'a Registries) -> EntryValidator<'a> {
        EntryValidator { registries }
    }
}

impl<'a> EntryValidator<'a> {
    /// runs the full check chain and returns the canonicalised entry: all
    /// attribute ids rewritten to their primary names, the object-class
    /// closure written back and byte values of human-readable syntaxes
    /// decoded into strings.
    pub fn validate(&self, entry: &Entry) -> OperationResult<Entry> {
        let mut candidate = self.recognize_attributes(entry)?;
        let closure_oids = self.normalize_object_classes(&mut candidate)?;
        self.check_structural_uniqueness(&closure_oids)?;
        self.check_must_and_may(&candidate, &closure_oids)?;
        self.check_single_valued(&candidate)?;
        self.check_syntaxes(&mut candidate)?;
        Ok(candidate)
    }

    /// applies a modify operation list to a clone of `entry` under the
    /// modify-specific rules, then revalidates the outcome. `rdn` is the
    /// entry's own RDN, whose values are protected.
    pub fn apply_modifications(
        &self,
        entry: &Entry,
        rdn: &Rdn,
        modifications: &[Modification],
    ) -> OperationResult<Entry> {
        let mut candidate = entry.clone();
        let original_structural = self.structural_class_of(entry)?;
        for modification in modifications {
            self.apply_one(&mut candidate, rdn, modification)?;
        }
        let validated = self.validate(&candidate)?;
        let new_structural = self.structural_class_of(&validated)?;
        if original_structural != new_structural {
            return Err(OperationError::schema_violation(format!(
                "structural object class can not change from {} to {}",
                original_structural, new_structural
            )));
        }
        Ok(validated)
    }

    /// the OID of the entry's single effective structural class.
    pub fn structural_class_of(&self, entry: &Entry) -> OperationResult<String> {
        let mut closure_oids = BTreeSet::new();
        for declared in entry.object_classes() {
            let object_class = self
                .registries
                .object_class(&declared)
                .map_err(|_| OperationError::schema_violation(format!("unknown object class {}", declared)))?;
            closure_oids.insert(object_class.oid.clone());
            if let Some(closure) = self.registries.closure(&object_class.oid) {
                closure_oids.extend(closure.superiors.iter().cloned());
            }
        }
        self.check_structural_uniqueness(&closure_oids)
    }

    fn apply_one(&self, candidate: &mut Entry, rdn: &Rdn, modification: &Modification) -> OperationResult<()> {
        let attribute_id = modification.attribute_id();
        let known = self.registries.has_attribute_type(attribute_id);

        if let Modification::Replace(_, values) = modification {
            // "remove if present" semantics make an empty REPLACE of an
            // unknown attribute a no-op rather than an error
            if values.is_empty() && !known {
                log::debug!("silently accepting empty replace of unknown attribute {}", attribute_id);
                return Ok(());
            }
        }
        if !known {
            return Err(OperationError::unknown_attribute(attribute_id));
        }
        let attribute_type = self.registries.attribute_type(attribute_id)?;
        if !attribute_type.user_modifiable {
            return Err(OperationError::unwilling_to_perform(format!(
                "attribute {} is not user modifiable",
                attribute_id
            )));
        }

        match modification {
            Modification::Add(_, values) => {
                for value in values {
                    candidate.add_value(attribute_id, value.clone());
                }
            }
            Modification::Remove(_, values) => {
                if let Some(rdn_value) = self.rdn_value_for(rdn, &attribute_type.names, attribute_type.primary_name()) {
                    let removes_rdn_value = values.is_empty()
                        || values
                            .iter()
                            .any(|value| self.values_match(attribute_id, value, &rdn_value));
                    if removes_rdn_value {
                        return Err(OperationError::naming_violation(format!(
                            "attribute {} holds the entry's rdn value and can not be removed",
                            attribute_id
                        )));
                    }
                }
                if values.is_empty() {
                    if candidate.remove_attribute(attribute_id).is_none() {
                        return Err(OperationError::NoSuchAttribute(attribute_id.to_owned()));
                    }
                } else {
                    for value in values {
                        if !candidate.remove_value(attribute_id, value) {
                            return Err(OperationError::NoSuchAttribute(format!(
                                "{}: {}",
                                attribute_id, value
                            )));
                        }
                    }
                }
            }
            Modification::Replace(_, values) => {
                if let Some(rdn_value) = self.rdn_value_for(rdn, &attribute_type.names, attribute_type.primary_name()) {
                    let keeps_rdn_value = values
                        .iter()
                        .any(|value| self.values_match(attribute_id, value, &rdn_value));
                    if !keeps_rdn_value {
                        return Err(OperationError::naming_violation(format!(
                            "attribute {} holds the entry's rdn value and can not be replaced away",
                            attribute_id
                        )));
                    }
                }
                candidate.remove_attribute(attribute_id);
                if !values.is_empty() {
                    candidate.put(Attribute::new(attribute_id, values.clone()));
                }
            }
        }
        Ok(())
    }

    /// the value this entry's RDN binds to the given attribute type, if the
    /// type participates in the RDN at all.
    fn rdn_value_for(&self, rdn: &Rdn, names: &[String], primary_name: &str) -> Option<String> {
        names
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(primary_name))
            .find_map(|name| rdn.value_of(name))
            .map(str::to_owned)
    }

    fn values_match(&self, attribute_id: &str, value: &AttributeValue, other: &str) -> bool {
        let text = match value.as_text() {
            Some(text) => text,
            None => return false,
        };
        match (
            self.registries.normalize_value(attribute_id, text),
            self.registries.normalize_value(attribute_id, other),
        ) {
            (Ok(left), Ok(right)) => left == right,
            _ => text == other,
        }
    }

    // ---- the check chain -------------------------------------------------

    fn recognize_attributes(&self, entry: &Entry) -> OperationResult<Entry> {
        let mut recognized = Entry::new();
        for attribute in entry.attributes() {
            match self.registries.attribute_type(attribute.id()) {
                Ok(attribute_type) => {
                    recognized.put(Attribute::new(attribute_type.primary_name(), attribute.values().to_vec()));
                }
                Err(_) => return Err(OperationError::unknown_attribute(attribute.id())),
            }
        }
        Ok(recognized)
    }

    /// expands declared classes to the full superior closure, drops and
    /// re-adds `top`, and writes the canonical list back onto the entry.
    /// Returns the closure as a set of OIDs.
    fn normalize_object_classes(&self, candidate: &mut Entry) -> OperationResult<BTreeSet<String>> {
        let declared = candidate.object_classes();
        if declared.is_empty() {
            return Err(OperationError::schema_violation("entry has no objectClass attribute"));
        }
        let mut closure_oids = BTreeSet::new();
        for name in &declared {
            let object_class = self
                .registries
                .object_class(name)
                .map_err(|_| OperationError::schema_violation(format!("unknown object class {}", name)))?;
            closure_oids.insert(object_class.oid.clone());
            if let Some(closure) = self.registries.closure(&object_class.oid) {
                closure_oids.extend(closure.superiors.iter().cloned());
            }
        }
        closure_oids.remove(oids::object_class::TOP);

        let mut rendered = vec![AttributeValue::text("top")];
        let mut names = BTreeSet::new();
        for oid in &closure_oids {
            let object_class = self.registries.object_class(oid)?;
            names.insert(object_class.primary_name().to_owned());
        }
        rendered.extend(names.into_iter().map(AttributeValue::Text));
        candidate.put(Attribute::new("objectClass", rendered));

        closure_oids.insert(oids::object_class::TOP.to_owned());
        Ok(closure_oids)
    }

    /// exactly one structural class must remain once superiors of other
    /// structural classes are discounted. Returns its OID.
    fn check_structural_uniqueness(&self, closure_oids: &BTreeSet<String>) -> OperationResult<String> {
        let structural = closure_oids
            .iter()
            .filter(|oid| {
                self.registries
                    .closure(oid)
                    .map(|closure| closure.kind == ObjectClassKind::Structural)
                    .unwrap_or(false)
            })
            .cloned()
            .collect::<Vec<String>>();

        let mut maximal = vec![];
        for candidate_oid in &structural {
            let dominated = structural.iter().any(|other| {
                other != candidate_oid
                    && self
                        .registries
                        .closure(other)
                        .map(|closure| closure.superiors.contains(candidate_oid))
                        .unwrap_or(false)
            });
            if !dominated {
                maximal.push(candidate_oid.clone());
            }
        }
        match maximal.len() {
            0 => Err(OperationError::schema_violation("no structural object class")),
            1 => Ok(maximal.remove(0)),
            _ => Err(OperationError::schema_violation(format!(
                "multiple structural object classes: {}",
                maximal.join(", ")
            ))),
        }
    }

    fn check_must_and_may(&self, candidate: &Entry, closure_oids: &BTreeSet<String>) -> OperationResult<()> {
        let mut must = BTreeSet::new();
        let mut allowed = BTreeSet::new();
        for oid in closure_oids {
            if let Some(closure) = self.registries.closure(oid) {
                must.extend(closure.must.iter().cloned());
                allowed.extend(closure.allowed.iter().cloned());
            }
        }

        let mut present = BTreeSet::new();
        for attribute in candidate.attributes() {
            present.insert(self.registries.attribute_type(attribute.id())?.oid.clone());
        }

        for required in &must {
            if !present.contains(required) {
                let name = self
                    .registries
                    .attribute_type(required)
                    .map(|at| at.primary_name().to_owned())
                    .unwrap_or_else(|_| required.clone());
                return Err(OperationError::schema_violation(format!(
                    "required attribute {} is missing",
                    name
                )));
            }
        }

        let extensible = closure_oids.contains(oids::object_class::EXTENSIBLE_OBJECT);
        if extensible {
            return Ok(());
        }
        for attribute in candidate.attributes() {
            let attribute_type = self.registries.attribute_type(attribute.id())?;
            if attribute_type.usage.is_operational() || attribute_type.collective {
                continue;
            }
            if !allowed.contains(&attribute_type.oid) {
                return Err(OperationError::schema_violation(format!(
                    "attribute {} is not allowed by the object classes",
                    attribute_type.primary_name()
                )));
            }
        }
        Ok(())
    }

    fn check_single_valued(&self, candidate: &Entry) -> OperationResult<()> {
        for attribute in candidate.attributes() {
            let attribute_type = self.registries.attribute_type(attribute.id())?;
            if attribute_type.single_valued && attribute.len() > 1 {
                return Err(OperationError::schema_violation(format!(
                    "attribute {} is single valued but has {} values",
                    attribute_type.primary_name(),
                    attribute.len()
                )));
            }
        }
        Ok(())
    }

    /// syntax conformance plus human-readable coercion: byte values of a
    /// human-readable syntax are decoded as UTF-8 and stored back as text.
    fn check_syntaxes(&self, candidate: &mut Entry) -> OperationResult<()> {
        let mut rewrites: Vec<Attribute> = vec![];
        for attribute in candidate.attributes() {
            let attribute_type = self.registries.attribute_type(attribute.id())?;
            let syntax = self.registries.effective_syntax(attribute_type)?;
            let checker = self.registries.syntax_checker(&syntax.oid);

            let mut coerced = Vec::with_capacity(attribute.len());
            let mut changed = false;
            for value in attribute.values() {
                let value = if syntax.human_readable {
                    match value {
                        AttributeValue::Bytes(bytes) => match String::from_utf8(bytes.clone()) {
                            Ok(text) => {
                                changed = true;
                                AttributeValue::Text(text)
                            }
                            Err(_) => {
                                return Err(OperationError::invalid_syntax(
                                    attribute.id(),
                                    format!("{} undecodable bytes", bytes.len()),
                                ))
                            }
                        },
                        text => text.clone(),
                    }
                } else {
                    value.clone()
                };
                if let Some(checker) = &checker {
                    if !checker.accepts_all() && !checker.is_valid(&value) {
                        return Err(OperationError::invalid_syntax(attribute.id(), value.to_string()));
                    }
                }
                coerced.push(value);
            }
            if changed {
                rewrites.push(Attribute::new(attribute.id(), coerced));
            }
        }
        for attribute in rewrites {
            candidate.put(attribute);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
