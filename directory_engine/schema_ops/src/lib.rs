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

//! routes writes under `ou=schema` into the live registry. Every schema
//! entry is dispatched by its `meta*` object class to a per-kind handler
//! that validates references and registers or unregisters the object. An
//! add whose references do not resolve yet is parked, not refused: the
//! object registers as soon as the missing dependency arrives. Objects of
//! disabled schemas are staged instead of registered and load when the
//! schema is enabled. Modifications to a subschema subentry's description
//! attributes are parsed as RFC 4512 values; a REPLACE there is refused.

use model::{Entry, Modification, OperationError, OperationResult};
use naming::Dn;
use schema_registry::{RegistrationItem, Registries, Schema, SchemaLoader, SchemaObject};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

mod handlers;
mod subschema;

use handlers::*;

pub use subschema::subschema_entry;

/// lifecycle of one schema object as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaObjectState {
    /// not present at all
    Absent,
    /// added but waiting on an unresolved reference
    Parked,
    /// live in the registry
    Registered,
    /// persisted but its owning schema is disabled
    Disabled,
}

/// an added schema object whose references did not resolve yet.
struct ParkedItem {
    schema_name: String,
    item: RegistrationItem,
}

fn item_oid(item: &RegistrationItem) -> &str {
    match item {
        RegistrationItem::Syntax(object) => object.oid(),
        RegistrationItem::MatchingRule(object) => object.oid(),
        RegistrationItem::AttributeType(object) => object.oid(),
        RegistrationItem::ObjectClass(object) => object.oid(),
    }
}

pub struct SchemaOperationController {
    registries: Arc<RwLock<Registries>>,
    /// added objects with unresolved references, retried whenever the
    /// registry grows
    parked: Mutex<Vec<ParkedItem>>,
    /// objects of disabled schemas, keyed by schema name, replayed on
    /// enable
    staged: Mutex<HashMap<String, Vec<RegistrationItem>>>,
}

impl SchemaOperationController {
    pub fn new(registries: Arc<RwLock<Registries>>) -> SchemaOperationController {
        SchemaOperationController {
            registries,
            parked: Mutex::new(Vec::new()),
            staged: Mutex::new(HashMap::new()),
        }
    }

    fn write_registries(&self) -> OperationResult<std::sync::RwLockWriteGuard<'_, Registries>> {
        self.registries
            .write()
            .map_err(|_| OperationError::unwilling_to_perform("schema registry lock poisoned"))
    }

    fn read_registries(&self) -> OperationResult<std::sync::RwLockReadGuard<'_, Registries>> {
        self.registries
            .read()
            .map_err(|_| OperationError::unwilling_to_perform("schema registry lock poisoned"))
    }

    fn parked_lock(&self) -> OperationResult<MutexGuard<'_, Vec<ParkedItem>>> {
        self.parked
            .lock()
            .map_err(|_| OperationError::unwilling_to_perform("schema parking lock poisoned"))
    }

    fn stage(&self, schema_name: &str, item: RegistrationItem) -> OperationResult<()> {
        self.staged
            .lock()
            .map_err(|_| OperationError::unwilling_to_perform("schema staging lock poisoned"))?
            .entry(schema_name.to_owned())
            .or_insert_with(Vec::new)
            .push(item);
        Ok(())
    }

    fn register_item(registries: &mut Registries, item: RegistrationItem) -> OperationResult<()> {
        match item {
            RegistrationItem::Syntax(object) => registries.register_syntax(object),
            RegistrationItem::MatchingRule(object) => registries.register_matching_rule(object),
            RegistrationItem::AttributeType(object) => registries.register_attribute_type(object),
            RegistrationItem::ObjectClass(object) => registries.register_object_class(object),
        }
    }

    /// registers one added object, parking it when a reference is still
    /// missing. A successful registration may unblock parked objects, so
    /// the queue is retried until a pass stops shrinking.
    fn register_or_park(&self, schema_name: &str, item: RegistrationItem) -> OperationResult<()> {
        let mut registries = self.write_registries()?;
        let mut parked = self.parked_lock()?;
        match Self::register_item(&mut registries, item.clone()) {
            Ok(()) => {
                Self::retry_parked(&mut registries, &mut parked);
                Ok(())
            }
            Err(OperationError::NoSuchSchemaObject(missing)) => {
                log::debug!("parking schema object {}: waiting for {}", item_oid(&item), missing);
                parked.push(ParkedItem {
                    schema_name: schema_name.to_owned(),
                    item,
                });
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    fn retry_parked(registries: &mut Registries, parked: &mut Vec<ParkedItem>) {
        loop {
            let before = parked.len();
            let mut still = vec![];
            for entry in parked.drain(..) {
                if !registries.is_schema_enabled(&entry.schema_name) {
                    still.push(entry);
                    continue;
                }
                match Self::register_item(registries, entry.item.clone()) {
                    Ok(()) => log::debug!("parked schema object {} registered", item_oid(&entry.item)),
                    Err(OperationError::NoSuchSchemaObject(_)) => still.push(entry),
                    Err(error) => {
                        log::warn!(
                            "parked schema object {} can not register: {}",
                            item_oid(&entry.item),
                            error
                        );
                        still.push(entry);
                    }
                }
            }
            *parked = still;
            if parked.len() == before {
                break;
            }
        }
    }

    /// removes a parked object by OID; `true` when one was parked.
    fn unpark(&self, oid: &str) -> OperationResult<bool> {
        let mut parked = self.parked_lock()?;
        let before = parked.len();
        parked.retain(|entry| item_oid(&entry.item) != oid);
        Ok(parked.len() != before)
    }

    /// `true` when a DN lies inside the reserved `ou=schema` subtree.
    pub fn is_schema_dn(&self, dn: &Dn) -> bool {
        dn.rdns()
            .last()
            .and_then(|rdn| rdn.value_of("ou"))
            .map(|value| value.eq_ignore_ascii_case("schema"))
            .unwrap_or(false)
    }

    /// the owning schema named by a DN under `ou=schema`, e.g.
    /// `m-oid=...,ou=attributeTypes,cn=core,ou=schema` belongs to `core`.
    fn schema_name_of(dn: &Dn) -> Option<String> {
        let rdns = dn.rdns();
        if rdns.len() < 2 {
            return None;
        }
        rdns[rdns.len() - 2].value_of("cn").map(str::to_owned)
    }

    /// dispatches an entry added under `ou=schema` by its meta class.
    pub fn entry_added(&self, dn: &Dn, entry: &Entry) -> OperationResult<()> {
        if entry.has_object_class("metaSchema") {
            return self.schema_added(entry);
        }
        let schema_name = match Self::schema_name_of(dn) {
            Some(name) => name,
            // container entries like ou=attributeTypes,cn=core,ou=schema
            None => return Ok(()),
        };
        let enabled = self.read_registries()?.is_schema_enabled(&schema_name);

        if entry.has_object_class("metaSyntaxChecker") {
            let implementation = required_text(entry, "m-implementation")?;
            let oid = required_text(entry, "m-oid")?;
            let checker = syntax_checker_by_name(&implementation)?;
            let mut registries = self.write_registries()?;
            registries.register_syntax_checker(&oid, checker);
            // a parked syntax may have been waiting for exactly this checker
            let mut parked = self.parked_lock()?;
            Self::retry_parked(&mut registries, &mut parked);
            return Ok(());
        }
        if entry.has_object_class("metaNormalizer") {
            let implementation = required_text(entry, "m-implementation")?;
            let oid = required_text(entry, "m-oid")?;
            let normalizer = normalizer_by_name(&implementation)?;
            self.write_registries()?.register_normalizer(&oid, normalizer);
            return Ok(());
        }
        if entry.has_object_class("metaComparator") {
            let implementation = required_text(entry, "m-implementation")?;
            let oid = required_text(entry, "m-oid")?;
            let comparator = comparator_by_name(&implementation)?;
            self.write_registries()?.register_comparator(&oid, comparator);
            return Ok(());
        }

        let item = if entry.has_object_class("metaSyntax") {
            Some(RegistrationItem::Syntax(syntax_from_entry(entry, &schema_name)?))
        } else if entry.has_object_class("metaMatchingRule") {
            Some(RegistrationItem::MatchingRule(matching_rule_from_entry(entry, &schema_name)?))
        } else if entry.has_object_class("metaAttributeType") {
            Some(RegistrationItem::AttributeType(attribute_type_from_entry(entry, &schema_name)?))
        } else if entry.has_object_class("metaObjectClass") {
            Some(RegistrationItem::ObjectClass(object_class_from_entry(entry, &schema_name)?))
        } else {
            None
        };
        let item = match item {
            Some(item) => item,
            // plain containers and entries of unhandled meta kinds
            None => return Ok(()),
        };
        if !enabled {
            log::debug!("staging schema object for disabled schema {}", schema_name);
            return self.stage(&schema_name, item);
        }
        self.register_or_park(&schema_name, item)
    }

    fn schema_added(&self, entry: &Entry) -> OperationResult<()> {
        let name = required_text(entry, "cn")?;
        let mut schema = Schema::new(name).with_dependencies(text_values(entry, "m-dependencies"));
        if boolean_flag(entry, "m-disabled") {
            schema = schema.disabled();
        }
        self.write_registries()?.register_schema(schema)
    }

    /// dispatches a delete under `ou=schema`. The `cascade` flag is
    /// accepted but reduces to non-cascading behaviour.
    pub fn entry_deleted(&self, dn: &Dn, entry: &Entry, cascade: bool) -> OperationResult<()> {
        if cascade {
            log::warn!("cascading schema delete requested for {}, not supported, deleting non-cascading", dn);
        }
        if entry.has_object_class("metaSchema") {
            let name = required_text(entry, "cn")?;
            let mut registries = self.write_registries()?;
            if !registries.objects_of_schema(&name).is_empty() {
                return Err(OperationError::unwilling_to_perform(format!(
                    "schema {} still holds registered objects",
                    name
                )));
            }
            let dependents = registries
                .schemas()
                .filter(|schema| schema.dependencies.contains(&name))
                .map(|schema| schema.name.clone())
                .collect::<Vec<String>>();
            if !dependents.is_empty() {
                return Err(OperationError::unwilling_to_perform(format!(
                    "schema {} is depended on by {}",
                    name,
                    dependents.join(", ")
                )));
            }
            registries.remove_schema(&name);
            return Ok(());
        }

        let oid = match optional_text(entry, "m-oid") {
            Some(oid) => oid,
            None => return Ok(()),
        };
        // a parked object never reached the registry, taking it off the
        // queue is the whole delete
        if self.unpark(&oid)? {
            log::debug!("removed parked schema object {}", oid);
            return Ok(());
        }
        let mut registries = self.write_registries()?;
        if entry.has_object_class("metaSyntaxChecker") {
            return registries.unregister_syntax_checker(&oid);
        }
        if entry.has_object_class("metaNormalizer") {
            return registries.unregister_normalizer(&oid);
        }
        if entry.has_object_class("metaComparator") {
            return registries.unregister_comparator(&oid);
        }
        if entry.has_object_class("metaSyntax") {
            return registries.unregister_syntax(&oid).map(|_| ());
        }
        if entry.has_object_class("metaMatchingRule") {
            return registries.unregister_matching_rule(&oid).map(|_| ());
        }
        if entry.has_object_class("metaAttributeType") {
            return registries.unregister_attribute_type(&oid).map(|_| ());
        }
        if entry.has_object_class("metaObjectClass") {
            return registries.unregister_object_class(&oid).map(|_| ());
        }
        Ok(())
    }

    /// a modify of a schema entry re-registers the described object from
    /// its post-modification image. Toggling `m-disabled` on a metaSchema
    /// entry enables or disables the schema.
    pub fn entry_modified(&self, dn: &Dn, before: &Entry, after: &Entry) -> OperationResult<()> {
        if after.has_object_class("metaSchema") {
            let name = required_text(after, "cn")?;
            let was_disabled = boolean_flag(before, "m-disabled");
            let is_disabled = boolean_flag(after, "m-disabled");
            if was_disabled && !is_disabled {
                return self.enable_schema(&name);
            }
            if !was_disabled && is_disabled {
                return self.disable_schema(&name);
            }
            return Ok(());
        }
        self.entry_deleted(dn, before, false)?;
        self.entry_added(dn, after)
    }

    /// modifications to a subschema subentry's schema-object attributes,
    /// expressed as RFC 4512 description values. REPLACE is refused:
    /// callers express changes as an add/remove pair.
    pub fn subschema_modified(&self, modifications: &[Modification]) -> OperationResult<()> {
        for modification in modifications {
            match modification {
                Modification::Replace(attribute, _) => {
                    return Err(OperationError::unwilling_to_perform(format!(
                        "REPLACE of {} on a schema subentry is not allowed, use add/remove pairs",
                        attribute
                    )))
                }
                Modification::Add(attribute, values) => {
                    for value in values {
                        let text = value.as_text().ok_or_else(|| {
                            OperationError::invalid_syntax(attribute.as_str(), "binary schema description")
                        })?;
                        self.add_description(attribute, text)?;
                    }
                }
                Modification::Remove(attribute, values) => {
                    for value in values {
                        let text = value.as_text().ok_or_else(|| {
                            OperationError::invalid_syntax(attribute.as_str(), "binary schema description")
                        })?;
                        self.remove_description(attribute, text)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn add_description(&self, attribute: &str, value: &str) -> OperationResult<()> {
        let mut registries = self.write_registries()?;
        match attribute {
            a if a.eq_ignore_ascii_case("attributeTypes") => {
                let description = schema_parser::parse_attribute_type(value)?;
                registries.register_attribute_type(attribute_type_from_description(description, "other")?)
            }
            a if a.eq_ignore_ascii_case("objectClasses") => {
                let description = schema_parser::parse_object_class(value)?;
                registries.register_object_class(object_class_from_description(description, "other")?)
            }
            a if a.eq_ignore_ascii_case("matchingRules") => {
                let description = schema_parser::parse_matching_rule(value)?;
                registries.register_matching_rule(matching_rule_from_description(description, "other")?)
            }
            a if a.eq_ignore_ascii_case("ldapSyntaxes") => {
                let description = schema_parser::parse_syntax(value)?;
                let syntax = syntax_from_description(description, "other");
                if !registries.has_syntax_checker(&syntax.oid) {
                    registries.register_syntax_checker(&syntax.oid, Arc::new(schema_registry::AcceptAllChecker));
                }
                registries.register_syntax(syntax)
            }
            other => Err(OperationError::unwilling_to_perform(format!(
                "{} is not a modifiable schema subentry attribute",
                other
            ))),
        }
    }

    fn remove_description(&self, attribute: &str, value: &str) -> OperationResult<()> {
        let mut registries = self.write_registries()?;
        match attribute {
            a if a.eq_ignore_ascii_case("attributeTypes") => {
                let description = schema_parser::parse_attribute_type(value)?;
                registries.unregister_attribute_type(&description.oid).map(|_| ())
            }
            a if a.eq_ignore_ascii_case("objectClasses") => {
                let description = schema_parser::parse_object_class(value)?;
                registries.unregister_object_class(&description.oid).map(|_| ())
            }
            a if a.eq_ignore_ascii_case("matchingRules") => {
                let description = schema_parser::parse_matching_rule(value)?;
                registries.unregister_matching_rule(&description.oid).map(|_| ())
            }
            a if a.eq_ignore_ascii_case("ldapSyntaxes") => {
                let description = schema_parser::parse_syntax(value)?;
                registries.unregister_syntax(&description.oid).map(|_| ())
            }
            other => Err(OperationError::unwilling_to_perform(format!(
                "{} is not a modifiable schema subentry attribute",
                other
            ))),
        }
    }

    /// reloads the staged objects of a schema through the deferred queue
    /// and marks it enabled.
    pub fn enable_schema(&self, name: &str) -> OperationResult<()> {
        let staged = self
            .staged
            .lock()
            .map_err(|_| OperationError::unwilling_to_perform("schema staging lock poisoned"))?
            .remove(name)
            .unwrap_or_default();
        let mut registries = self.write_registries()?;
        registries.set_schema_enabled(name, true)?;
        SchemaLoader::load(&mut registries, staged)?;
        // the freshly loaded objects may satisfy parked references
        let mut parked = self.parked_lock()?;
        Self::retry_parked(&mut registries, &mut parked);
        log::debug!("schema {} enabled", name);
        Ok(())
    }

    /// unregisters every object of a schema (dependency-safe order found
    /// by fixpoint) and marks the schema disabled. The objects go back to
    /// staging so a later enable can replay them.
    pub fn disable_schema(&self, name: &str) -> OperationResult<()> {
        let mut registries = self.write_registries()?;
        let dependents = registries
            .schemas()
            .filter(|schema| schema.enabled && schema.dependencies.contains(&name.to_owned()))
            .map(|schema| schema.name.clone())
            .collect::<Vec<String>>();
        if !dependents.is_empty() {
            return Err(OperationError::unwilling_to_perform(format!(
                "schema {} is depended on by enabled schemas: {}",
                name,
                dependents.join(", ")
            )));
        }

        let mut remaining = registries.objects_of_schema(name);
        let mut removed = vec![];
        while !remaining.is_empty() {
            let before = remaining.len();
            let mut deferred = vec![];
            for item in remaining {
                let outcome = match &item {
                    RegistrationItem::Syntax(object) => registries.unregister_syntax(&object.oid).map(|_| ()),
                    RegistrationItem::MatchingRule(object) => {
                        registries.unregister_matching_rule(&object.oid).map(|_| ())
                    }
                    RegistrationItem::AttributeType(object) => {
                        registries.unregister_attribute_type(&object.oid).map(|_| ())
                    }
                    RegistrationItem::ObjectClass(object) => {
                        registries.unregister_object_class(&object.oid).map(|_| ())
                    }
                };
                match outcome {
                    Ok(()) => removed.push(item),
                    Err(OperationError::UnwillingToPerform(_)) => deferred.push(item),
                    Err(other) => return Err(other),
                }
            }
            if deferred.len() == before {
                return Err(OperationError::unwilling_to_perform(format!(
                    "schema {} can not be disabled, objects are referenced from other schemas",
                    name
                )));
            }
            remaining = deferred;
        }
        registries.set_schema_enabled(name, false)?;
        drop(registries);

        // parked objects of the schema go back to staging with the rest
        {
            let mut parked = self.parked_lock()?;
            let (mine, keep): (Vec<ParkedItem>, Vec<ParkedItem>) =
                parked.drain(..).partition(|entry| entry.schema_name == name);
            *parked = keep;
            removed.extend(mine.into_iter().map(|entry| entry.item));
        }

        self.staged
            .lock()
            .map_err(|_| OperationError::unwilling_to_perform("schema staging lock poisoned"))?
            .entry(name.to_owned())
            .or_insert_with(Vec::new)
            .extend(removed);
        log::debug!("schema {} disabled", name);
        Ok(())
    }

    /// the subschema subentry image of the current registry state.
    pub fn subschema_entry(&self) -> OperationResult<Entry> {
        Ok(subschema::subschema_entry(&*self.read_registries()?))
    }

    /// where one schema object currently stands.
    pub fn state_of(&self, schema_name: &str, oid: &str) -> OperationResult<SchemaObjectState> {
        let registries = self.read_registries()?;
        if registries.oid_registry().has_oid(oid)
            || registries.matching_rules().contains(oid)
            || registries.syntaxes().contains(oid)
        {
            return Ok(SchemaObjectState::Registered);
        }
        drop(registries);
        if self
            .parked_lock()?
            .iter()
            .any(|entry| item_oid(&entry.item) == oid)
        {
            return Ok(SchemaObjectState::Parked);
        }
        let staged = self
            .staged
            .lock()
            .map_err(|_| OperationError::unwilling_to_perform("schema staging lock poisoned"))?;
        let is_staged = staged
            .get(schema_name)
            .map(|items| {
                items.iter().any(|item| match item {
                    RegistrationItem::Syntax(object) => object.oid == oid,
                    RegistrationItem::MatchingRule(object) => object.oid == oid,
                    RegistrationItem::AttributeType(object) => object.oid == oid,
                    RegistrationItem::ObjectClass(object) => object.oid == oid,
                })
            })
            .unwrap_or(false);
        if is_staged {
            return Ok(SchemaObjectState::Disabled);
        }
        Ok(SchemaObjectState::Absent)
    }
}

#[cfg(test)]
mod tests;
