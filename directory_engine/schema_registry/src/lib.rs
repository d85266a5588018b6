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

//! the live schema: one table per schema-object kind, a shared OID
//! registry aliasing every name to its canonical OID, the pluggable value
//! machinery (syntax checkers, normalizers, comparators) and the derived
//! object-class closure caches that power entry validation.

use model::{OperationError, OperationResult};
use naming::{Dn, NormalizerSource};
use std::collections::BTreeMap;
use std::sync::Arc;

mod bootstrap;
mod checkers;
mod closures;
mod comparators;
mod loader;
pub mod normalizers;
mod objects;
mod oid_registry;
pub mod oids;
mod tables;

pub use bootstrap::bootstrap;
pub use checkers::{
    AcceptAllChecker, BooleanChecker, DirectoryStringChecker, DnChecker, GeneralizedTimeChecker, Ia5StringChecker,
    IntegerChecker, NumericStringChecker, OidChecker, SyntaxChecker, TelephoneNumberChecker,
};
pub use closures::{ClassClosure, ClassClosures};
pub use comparators::{Comparator, IntegerComparator, StringComparator};
pub use loader::{RegistrationItem, SchemaLoader};
pub use normalizers::{DeepTrimNormalizer, DeepTrimToLowerNormalizer, NoOpNormalizer, Normalizer, NumericStringNormalizer};
pub use objects::{
    AttributeType, AttributeTypeBuilder, DitContentRule, DitStructureRule, LdapSyntax, MatchingRule, MatchingRuleUse,
    NameForm, ObjectClass, ObjectClassBuilder, ObjectClassKind, Schema, SchemaObject, Usage,
};
pub use oid_registry::OidRegistry;
pub use tables::SchemaTable;

pub struct Registries {
    schemas: BTreeMap<String, Schema>,
    oid_registry: OidRegistry,
    syntaxes: SchemaTable<LdapSyntax>,
    matching_rules: SchemaTable<MatchingRule>,
    attribute_types: SchemaTable<AttributeType>,
    object_classes: SchemaTable<ObjectClass>,
    matching_rule_uses: SchemaTable<MatchingRuleUse>,
    dit_content_rules: SchemaTable<DitContentRule>,
    dit_structure_rules: SchemaTable<DitStructureRule>,
    name_forms: SchemaTable<NameForm>,
    syntax_checkers: BTreeMap<String, Arc<dyn SyntaxChecker>>,
    normalizers: BTreeMap<String, Arc<dyn Normalizer>>,
    comparators: BTreeMap<String, Arc<dyn Comparator>>,
    closures: ClassClosures,
}

impl Default for Registries {
    fn default() -> Registries {
        Registries::new()
    }
}

impl Registries {
    pub fn new() -> Registries {
        Registries {
            schemas: BTreeMap::new(),
            oid_registry: OidRegistry::new(),
            syntaxes: SchemaTable::new("syntax"),
            matching_rules: SchemaTable::new("matchingRule"),
            attribute_types: SchemaTable::new("attributeType"),
            object_classes: SchemaTable::new("objectClass"),
            matching_rule_uses: SchemaTable::new("matchingRuleUse"),
            dit_content_rules: SchemaTable::new("dITContentRule"),
            dit_structure_rules: SchemaTable::new("dITStructureRule"),
            name_forms: SchemaTable::new("nameForm"),
            syntax_checkers: BTreeMap::new(),
            normalizers: BTreeMap::new(),
            comparators: BTreeMap::new(),
            closures: ClassClosures::default(),
        }
    }

    // ---- schemas ---------------------------------------------------------

    pub fn register_schema(&mut self, schema: Schema) -> OperationResult<()> {
        for dependency in &schema.dependencies {
            if !self.schemas.contains_key(dependency) {
                return Err(OperationError::no_such_schema_object(format!(
                    "schema {} depended on by {}",
                    dependency, schema.name
                )));
            }
        }
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    pub fn is_schema_enabled(&self, name: &str) -> bool {
        self.schemas.get(name).map(|schema| schema.enabled).unwrap_or(false)
    }

    pub fn set_schema_enabled(&mut self, name: &str, enabled: bool) -> OperationResult<()> {
        match self.schemas.get_mut(name) {
            Some(schema) => {
                schema.enabled = enabled;
                Ok(())
            }
            None => Err(OperationError::no_such_schema_object(format!("schema {}", name))),
        }
    }

    pub fn remove_schema(&mut self, name: &str) -> Option<Schema> {
        self.schemas.remove(name)
    }

    /// every object of the named schema currently registered, as reloadable
    /// registration items. Used when a schema is disabled.
    pub fn objects_of_schema(&self, name: &str) -> Vec<RegistrationItem> {
        let mut items = vec![];
        items.extend(
            self.syntaxes
                .iter()
                .filter(|object| object.schema_name == name)
                .cloned()
                .map(RegistrationItem::Syntax),
        );
        items.extend(
            self.matching_rules
                .iter()
                .filter(|object| object.schema_name == name)
                .cloned()
                .map(RegistrationItem::MatchingRule),
        );
        items.extend(
            self.attribute_types
                .iter()
                .filter(|object| object.schema_name == name)
                .cloned()
                .map(RegistrationItem::AttributeType),
        );
        items.extend(
            self.object_classes
                .iter()
                .filter(|object| object.schema_name == name)
                .cloned()
                .map(RegistrationItem::ObjectClass),
        );
        items
    }

    // ---- pluggable value machinery ---------------------------------------

    pub fn register_syntax_checker(&mut self, syntax_oid: &str, checker: Arc<dyn SyntaxChecker>) {
        self.syntax_checkers.insert(syntax_oid.to_owned(), checker);
    }

    pub fn unregister_syntax_checker(&mut self, syntax_oid: &str) -> OperationResult<()> {
        if self.syntaxes.contains(syntax_oid) {
            return Err(OperationError::unwilling_to_perform(format!(
                "syntax checker {} is referenced by a registered syntax",
                syntax_oid
            )));
        }
        self.syntax_checkers.remove(syntax_oid);
        Ok(())
    }

    pub fn syntax_checker(&self, syntax_oid: &str) -> Option<Arc<dyn SyntaxChecker>> {
        self.syntax_checkers.get(syntax_oid).cloned()
    }

    pub fn has_syntax_checker(&self, syntax_oid: &str) -> bool {
        self.syntax_checkers.contains_key(syntax_oid)
    }

    pub fn register_normalizer(&mut self, rule_oid: &str, normalizer: Arc<dyn Normalizer>) {
        self.normalizers.insert(rule_oid.to_owned(), normalizer);
    }

    pub fn unregister_normalizer(&mut self, rule_oid: &str) -> OperationResult<()> {
        if self.matching_rules.contains(rule_oid) {
            return Err(OperationError::unwilling_to_perform(format!(
                "normalizer {} is referenced by a registered matching rule",
                rule_oid
            )));
        }
        self.normalizers.remove(rule_oid);
        Ok(())
    }

    /// normalizer bound to a matching rule; identity when none is bound.
    pub fn normalizer(&self, rule_oid: &str) -> Arc<dyn Normalizer> {
        self.normalizers
            .get(rule_oid)
            .cloned()
            .unwrap_or_else(|| Arc::new(NoOpNormalizer))
    }

    pub fn register_comparator(&mut self, rule_oid: &str, comparator: Arc<dyn Comparator>) {
        self.comparators.insert(rule_oid.to_owned(), comparator);
    }

    pub fn unregister_comparator(&mut self, rule_oid: &str) -> OperationResult<()> {
        if self.matching_rules.contains(rule_oid) {
            return Err(OperationError::unwilling_to_perform(format!(
                "comparator {} is referenced by a registered matching rule",
                rule_oid
            )));
        }
        self.comparators.remove(rule_oid);
        Ok(())
    }

    pub fn comparator(&self, rule_oid: &str) -> Arc<dyn Comparator> {
        self.comparators
            .get(rule_oid)
            .cloned()
            .unwrap_or_else(|| Arc::new(StringComparator))
    }

    // ---- registration ----------------------------------------------------

    pub fn register_syntax(&mut self, syntax: LdapSyntax) -> OperationResult<()> {
        if !self.has_syntax_checker(&syntax.oid) {
            return Err(OperationError::no_such_schema_object(format!(
                "syntax checker for {}",
                syntax.oid
            )));
        }
        self.oid_registry.register(&syntax.oid, &syntax.names)?;
        if let Err(error) = self.syntaxes.insert(syntax.clone()) {
            self.oid_registry.unregister(&syntax.oid, &syntax.names);
            return Err(error);
        }
        Ok(())
    }

    pub fn register_matching_rule(&mut self, mut rule: MatchingRule) -> OperationResult<()> {
        rule.syntax_oid = self.resolve_syntax_oid(&rule.syntax_oid)?;
        self.oid_registry.register(&rule.oid, &rule.names)?;
        if let Err(error) = self.matching_rules.insert(rule.clone()) {
            self.oid_registry.unregister(&rule.oid, &rule.names);
            return Err(error);
        }
        Ok(())
    }

    pub fn register_attribute_type(&mut self, mut attribute_type: AttributeType) -> OperationResult<()> {
        if let Some(superior) = &attribute_type.superior_oid {
            let superior_oid = self.oid_registry.resolve(superior)?;
            self.attribute_types.require(&superior_oid)?;
            attribute_type.superior_oid = Some(superior_oid);
        }
        if let Some(syntax) = &attribute_type.syntax_oid {
            attribute_type.syntax_oid = Some(self.resolve_syntax_oid(syntax)?);
        }
        if attribute_type.superior_oid.is_none() && attribute_type.syntax_oid.is_none() {
            return Err(OperationError::schema_violation(format!(
                "attribute type {} declares neither a syntax nor a superior",
                attribute_type.oid
            )));
        }
        attribute_type.equality_oid = self.resolve_rule_reference(attribute_type.equality_oid.take())?;
        attribute_type.ordering_oid = self.resolve_rule_reference(attribute_type.ordering_oid.take())?;
        attribute_type.substring_oid = self.resolve_rule_reference(attribute_type.substring_oid.take())?;
        self.oid_registry.register(&attribute_type.oid, &attribute_type.names)?;
        if let Err(error) = self.attribute_types.insert(attribute_type.clone()) {
            self.oid_registry.unregister(&attribute_type.oid, &attribute_type.names);
            return Err(error);
        }
        Ok(())
    }

    pub fn register_object_class(&mut self, mut object_class: ObjectClass) -> OperationResult<()> {
        let mut superiors = Vec::with_capacity(object_class.superior_oids.len());
        for superior in &object_class.superior_oids {
            let superior_oid = self.oid_registry.resolve(superior)?;
            self.object_classes.require(&superior_oid)?;
            superiors.push(superior_oid);
        }
        object_class.superior_oids = superiors;
        for list in [&mut object_class.must_oids, &mut object_class.may_oids].iter_mut() {
            let mut resolved = Vec::with_capacity(list.len());
            for attribute in list.iter() {
                let attribute_oid = self.oid_registry.resolve(attribute)?;
                self.attribute_types.require(&attribute_oid)?;
                resolved.push(attribute_oid);
            }
            **list = resolved;
        }
        self.oid_registry.register(&object_class.oid, &object_class.names)?;
        if let Err(error) = self.object_classes.insert(object_class.clone()) {
            self.oid_registry.unregister(&object_class.oid, &object_class.names);
            return Err(error);
        }
        self.closures.rebuild(&self.object_classes);
        Ok(())
    }

    pub fn register_matching_rule_use(&mut self, mut rule_use: MatchingRuleUse) -> OperationResult<()> {
        self.matching_rules.require(&rule_use.oid)?;
        let mut applies = Vec::with_capacity(rule_use.applies_to.len());
        for attribute in &rule_use.applies_to {
            let attribute_oid = self.oid_registry.resolve(attribute)?;
            self.attribute_types.require(&attribute_oid)?;
            applies.push(attribute_oid);
        }
        rule_use.applies_to = applies;
        self.matching_rule_uses.insert(rule_use)
    }

    pub fn register_dit_content_rule(&mut self, mut rule: DitContentRule) -> OperationResult<()> {
        self.object_classes.require(&self.oid_registry.resolve(&rule.oid)?)?;
        for list in [&mut rule.aux_oids, &mut rule.must_oids, &mut rule.may_oids, &mut rule.not_oids].iter_mut() {
            let mut resolved = Vec::with_capacity(list.len());
            for reference in list.iter() {
                resolved.push(self.oid_registry.resolve(reference)?);
            }
            **list = resolved;
        }
        self.dit_content_rules.insert(rule)
    }

    pub fn register_dit_structure_rule(&mut self, rule: DitStructureRule) -> OperationResult<()> {
        self.name_forms.require(&self.oid_registry.resolve(&rule.form_oid)?)?;
        self.dit_structure_rules.insert(rule)
    }

    pub fn register_name_form(&mut self, mut form: NameForm) -> OperationResult<()> {
        let class_oid = self.oid_registry.resolve(&form.structural_class_oid)?;
        self.object_classes.require(&class_oid)?;
        form.structural_class_oid = class_oid;
        for list in [&mut form.must_oids, &mut form.may_oids].iter_mut() {
            let mut resolved = Vec::with_capacity(list.len());
            for attribute in list.iter() {
                let attribute_oid = self.oid_registry.resolve(attribute)?;
                self.attribute_types.require(&attribute_oid)?;
                resolved.push(attribute_oid);
            }
            **list = resolved;
        }
        self.oid_registry.register(&form.oid, &form.names)?;
        if let Err(error) = self.name_forms.insert(form.clone()) {
            self.oid_registry.unregister(&form.oid, &form.names);
            return Err(error);
        }
        Ok(())
    }

    fn resolve_rule_reference(&self, rule: Option<String>) -> OperationResult<Option<String>> {
        match rule {
            Some(rule) => {
                let rule_oid = self.oid_registry.resolve(&rule)?;
                self.matching_rules.require(&rule_oid)?;
                Ok(Some(rule_oid))
            }
            None => Ok(None),
        }
    }

    fn resolve_syntax_oid(&self, name_or_oid: &str) -> OperationResult<String> {
        if self.syntaxes.contains(name_or_oid) {
            return Ok(name_or_oid.to_owned());
        }
        let oid = self.oid_registry.resolve(name_or_oid)?;
        self.syntaxes.require(&oid)?;
        Ok(oid)
    }

    // ---- unregistration with dependency protection -----------------------

    pub fn unregister_attribute_type(&mut self, oid: &str) -> OperationResult<AttributeType> {
        let dependents = self.attribute_type_dependents(oid);
        if !dependents.is_empty() {
            return Err(OperationError::unwilling_to_perform(format!(
                "attribute type {} is in use by {}",
                oid,
                dependents.join(", ")
            )));
        }
        match self.attribute_types.remove(oid) {
            Some(removed) => {
                self.oid_registry.unregister(oid, &removed.names);
                Ok(removed)
            }
            None => Err(OperationError::no_such_schema_object(format!("attributeType {}", oid))),
        }
    }

    pub fn unregister_object_class(&mut self, oid: &str) -> OperationResult<ObjectClass> {
        let dependents = self.object_class_dependents(oid);
        if !dependents.is_empty() {
            return Err(OperationError::unwilling_to_perform(format!(
                "object class {} is in use by {}",
                oid,
                dependents.join(", ")
            )));
        }
        match self.object_classes.remove(oid) {
            Some(removed) => {
                self.oid_registry.unregister(oid, &removed.names);
                self.closures.rebuild(&self.object_classes);
                Ok(removed)
            }
            None => Err(OperationError::no_such_schema_object(format!("objectClass {}", oid))),
        }
    }

    pub fn unregister_matching_rule(&mut self, oid: &str) -> OperationResult<MatchingRule> {
        let dependents = self.matching_rule_dependents(oid);
        if !dependents.is_empty() {
            return Err(OperationError::unwilling_to_perform(format!(
                "matching rule {} is in use by {}",
                oid,
                dependents.join(", ")
            )));
        }
        match self.matching_rules.remove(oid) {
            Some(removed) => {
                self.oid_registry.unregister(oid, &removed.names);
                Ok(removed)
            }
            None => Err(OperationError::no_such_schema_object(format!("matchingRule {}", oid))),
        }
    }

    pub fn unregister_syntax(&mut self, oid: &str) -> OperationResult<LdapSyntax> {
        let dependents = self.syntax_dependents(oid);
        if !dependents.is_empty() {
            return Err(OperationError::unwilling_to_perform(format!(
                "syntax {} is in use by {}",
                oid,
                dependents.join(", ")
            )));
        }
        match self.syntaxes.remove(oid) {
            Some(removed) => {
                self.oid_registry.unregister(oid, &removed.names);
                Ok(removed)
            }
            None => Err(OperationError::no_such_schema_object(format!("syntax {}", oid))),
        }
    }

    pub fn unregister_matching_rule_use(&mut self, oid: &str) -> OperationResult<MatchingRuleUse> {
        self.matching_rule_uses
            .remove(oid)
            .ok_or_else(|| OperationError::no_such_schema_object(format!("matchingRuleUse {}", oid)))
    }

    /// names of every registered object that references this attribute type.
    pub fn attribute_type_dependents(&self, oid: &str) -> Vec<String> {
        let mut dependents = vec![];
        for attribute_type in self.attribute_types.iter() {
            if attribute_type.superior_oid.as_deref() == Some(oid) {
                dependents.push(format!("attributeType {}", attribute_type.oid));
            }
        }
        for object_class in self.object_classes.iter() {
            if object_class.must_oids.iter().any(|must| must == oid)
                || object_class.may_oids.iter().any(|may| may == oid)
            {
                dependents.push(format!("objectClass {}", object_class.oid));
            }
        }
        for rule_use in self.matching_rule_uses.iter() {
            if rule_use.applies_to.iter().any(|applies| applies == oid) {
                dependents.push(format!("matchingRuleUse {}", rule_use.oid));
            }
        }
        for content_rule in self.dit_content_rules.iter() {
            if content_rule.must_oids.iter().any(|must| must == oid)
                || content_rule.may_oids.iter().any(|may| may == oid)
                || content_rule.not_oids.iter().any(|not| not == oid)
            {
                dependents.push(format!("dITContentRule {}", content_rule.oid));
            }
        }
        for form in self.name_forms.iter() {
            if form.must_oids.iter().any(|must| must == oid) || form.may_oids.iter().any(|may| may == oid) {
                dependents.push(format!("nameForm {}", form.oid));
            }
        }
        dependents
    }

    pub fn object_class_dependents(&self, oid: &str) -> Vec<String> {
        let mut dependents = vec![];
        for object_class in self.object_classes.iter() {
            if object_class.superior_oids.iter().any(|superior| superior == oid) {
                dependents.push(format!("objectClass {}", object_class.oid));
            }
        }
        for content_rule in self.dit_content_rules.iter() {
            if content_rule.oid == oid || content_rule.aux_oids.iter().any(|aux| aux == oid) {
                dependents.push(format!("dITContentRule {}", content_rule.oid));
            }
        }
        for form in self.name_forms.iter() {
            if form.structural_class_oid == oid {
                dependents.push(format!("nameForm {}", form.oid));
            }
        }
        dependents
    }

    pub fn matching_rule_dependents(&self, oid: &str) -> Vec<String> {
        let mut dependents = vec![];
        for attribute_type in self.attribute_types.iter() {
            let used = attribute_type.equality_oid.as_deref() == Some(oid)
                || attribute_type.ordering_oid.as_deref() == Some(oid)
                || attribute_type.substring_oid.as_deref() == Some(oid);
            if used {
                dependents.push(format!("attributeType {}", attribute_type.oid));
            }
        }
        if self.matching_rule_uses.contains(oid) {
            dependents.push(format!("matchingRuleUse {}", oid));
        }
        dependents
    }

    pub fn syntax_dependents(&self, oid: &str) -> Vec<String> {
        let mut dependents = vec![];
        for attribute_type in self.attribute_types.iter() {
            if attribute_type.syntax_oid.as_deref() == Some(oid) {
                dependents.push(format!("attributeType {}", attribute_type.oid));
            }
        }
        for rule in self.matching_rules.iter() {
            if rule.syntax_oid == oid {
                dependents.push(format!("matchingRule {}", rule.oid));
            }
        }
        dependents
    }

    // ---- lookup ----------------------------------------------------------

    pub fn resolve_oid(&self, name_or_oid: &str) -> OperationResult<String> {
        self.oid_registry.resolve(name_or_oid)
    }

    pub fn oid_registry(&self) -> &OidRegistry {
        &self.oid_registry
    }

    pub fn attribute_type(&self, name_or_oid: &str) -> OperationResult<&AttributeType> {
        let oid = self.oid_registry.resolve(name_or_oid)?;
        self.attribute_types.require(&oid)
    }

    pub fn has_attribute_type(&self, name_or_oid: &str) -> bool {
        self.attribute_type(name_or_oid).is_ok()
    }

    pub fn object_class(&self, name_or_oid: &str) -> OperationResult<&ObjectClass> {
        let oid = self.oid_registry.resolve(name_or_oid)?;
        self.object_classes.require(&oid)
    }

    pub fn matching_rule(&self, name_or_oid: &str) -> OperationResult<&MatchingRule> {
        let oid = self.oid_registry.resolve(name_or_oid)?;
        self.matching_rules.require(&oid)
    }

    pub fn syntax(&self, name_or_oid: &str) -> OperationResult<&LdapSyntax> {
        let oid = self.resolve_syntax_oid(name_or_oid)?;
        self.syntaxes.require(&oid)
    }

    pub fn attribute_types(&self) -> &SchemaTable<AttributeType> {
        &self.attribute_types
    }

    pub fn object_classes(&self) -> &SchemaTable<ObjectClass> {
        &self.object_classes
    }

    pub fn matching_rules(&self) -> &SchemaTable<MatchingRule> {
        &self.matching_rules
    }

    pub fn syntaxes(&self) -> &SchemaTable<LdapSyntax> {
        &self.syntaxes
    }

    pub fn closure(&self, class_oid: &str) -> Option<&ClassClosure> {
        self.closures.get(class_oid)
    }

    // ---- resolution along the superior chain -----------------------------

    /// the syntax governing an attribute type, inherited from the superior
    /// chain when not declared directly.
    pub fn effective_syntax(&self, attribute_type: &AttributeType) -> OperationResult<&LdapSyntax> {
        let mut current = attribute_type;
        loop {
            if let Some(syntax_oid) = &current.syntax_oid {
                return self.syntaxes.require(syntax_oid);
            }
            match &current.superior_oid {
                Some(superior) => current = self.attribute_types.require(superior)?,
                None => {
                    return Err(OperationError::schema_violation(format!(
                        "attribute type {} resolves to no syntax",
                        attribute_type.oid
                    )))
                }
            }
        }
    }

    pub fn effective_equality<'a>(&'a self, attribute_type: &'a AttributeType) -> Option<&'a MatchingRule> {
        self.effective_rule(attribute_type, |at| at.equality_oid.as_deref())
    }

    pub fn effective_ordering<'a>(&'a self, attribute_type: &'a AttributeType) -> Option<&'a MatchingRule> {
        self.effective_rule(attribute_type, |at| at.ordering_oid.as_deref())
    }

    pub fn effective_substring<'a>(&'a self, attribute_type: &'a AttributeType) -> Option<&'a MatchingRule> {
        self.effective_rule(attribute_type, |at| at.substring_oid.as_deref())
    }

    fn effective_rule<'a, F>(&'a self, attribute_type: &'a AttributeType, select: F) -> Option<&'a MatchingRule>
    where
        F: Fn(&AttributeType) -> Option<&str>,
    {
        let mut current = attribute_type;
        loop {
            if let Some(rule_oid) = select(current) {
                return self.matching_rules.get(rule_oid);
            }
            match &current.superior_oid {
                Some(superior) => match self.attribute_types.get(superior) {
                    Some(superior_type) => current = superior_type,
                    None => return None,
                },
                None => return None,
            }
        }
    }

    /// the attribute type itself plus every type whose superior chain leads
    /// to it. Powers the `name` virtual-attribute expansion in filters.
    pub fn attribute_descendants(&self, name_or_oid: &str) -> OperationResult<Vec<String>> {
        let root = self.oid_registry.resolve(name_or_oid)?;
        self.attribute_types.require(&root)?;
        let mut result = vec![root.clone()];
        loop {
            let mut grew = false;
            for attribute_type in self.attribute_types.iter() {
                if result.contains(&attribute_type.oid) {
                    continue;
                }
                if let Some(superior) = &attribute_type.superior_oid {
                    if result.contains(superior) {
                        result.push(attribute_type.oid.clone());
                        grew = true;
                    }
                }
            }
            if !grew {
                break;
            }
        }
        Ok(result)
    }

    /// normalized matching key for one value of an attribute. DN-valued
    /// attributes are normalized as DNs so index keys agree with the
    /// normalized-DN plane.
    pub fn normalize_value(&self, attribute_id: &str, value: &str) -> OperationResult<String> {
        let attribute_type = self.attribute_type(attribute_id)?;
        let syntax = self.effective_syntax(attribute_type)?;
        if syntax.oid == oids::syntax::DN {
            let mut dn = Dn::parse(value)?;
            return dn.normalize(self).map(str::to_owned);
        }
        match self.effective_equality(attribute_type) {
            Some(rule) => Ok(self.normalizer(&rule.oid).normalize(value)),
            None => Ok(value.to_owned()),
        }
    }
}

impl NormalizerSource for Registries {
    fn normalize_ava(&self, attribute_id: &str, value: &str) -> OperationResult<(String, String)> {
        let attribute_type = self.attribute_type(attribute_id)?;
        let oid = attribute_type.oid.clone();
        let normalized = match self.effective_equality(attribute_type) {
            Some(rule) => self.normalizer(&rule.oid).normalize(value),
            None => value.to_owned(),
        };
        Ok((oid, normalized))
    }
}
