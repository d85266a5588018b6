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

//! one suffix subtree over one record manager: the master table, the
//! system and user index trees, alias bookkeeping and the search engine.
//! Writers serialize on the partition lock; readers run concurrently and
//! observe the last committed state. A fatal storage error poisons the
//! writer until `recover` runs; readers keep serving.

use binary::{repr::Datum, Binary};
use model::{AttributeValue, Entry, Modification, OperationError, OperationResult};
use naming::{Dn, Rdn};
use schema_registry::{oids, Registries};
use schema_validator::EntryValidator;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard};
use storage_api::{Storage, Tree};

mod alias;
pub mod codec;
pub mod indices;
mod search;

pub use codec::StoredEntry;
pub use search::{SearchEntry, SearchRequest, SearchStream};

use codec::{decode_entry, encode_entry};
use indices::{names, Index};

/// assumed page size when translating the page-count cache setting into
/// a byte budget for the record manager.
pub const PAGE_SIZE: u64 = 4096;

const FORMAT_VERSION: u64 = 1;

const ADMIN_VERSION: &str = "format.version";
const ADMIN_SUFFIX: &str = "suffix";
const ADMIN_SEQUENCE: &str = "sequence";

/// the synthetic parent of the suffix entry.
pub const ROOT_ID: u64 = 0;

#[derive(Debug, Clone)]
pub struct PartitionConfig {
    pub suffix: String,
    pub sync_on_write: bool,
    pub cache_pages: u64,
    pub optimizer_enabled: bool,
    /// attribute ids that get a value index, an existence index row and
    /// optimizer support
    pub indexed_attributes: Vec<String>,
    /// entry written at the suffix DN when the store is created; derived
    /// from the suffix RDN when not given
    pub context_entry: Option<Entry>,
}

impl Default for PartitionConfig {
    fn default() -> PartitionConfig {
        PartitionConfig {
            suffix: "ou=system".to_owned(),
            sync_on_write: true,
            cache_pages: 10_000,
            optimizer_enabled: true,
            indexed_attributes: vec!["objectClass".to_owned()],
            context_entry: None,
        }
    }
}

impl PartitionConfig {
    pub fn with_suffix<S: Into<String>>(suffix: S) -> PartitionConfig {
        PartitionConfig {
            suffix: suffix.into(),
            ..PartitionConfig::default()
        }
    }

    pub fn cache_bytes(&self) -> u64 {
        self.cache_pages * PAGE_SIZE
    }
}

pub struct Partition<S: Storage> {
    storage: S,
    suffix: Dn,
    suffix_ndn: String,
    sync_on_write: bool,
    optimizer_enabled: bool,
    registries: Arc<RwLock<Registries>>,
    master: S::Tree,
    admin: S::Tree,
    dn_index: Index<S::Tree>,
    updn_index: Index<S::Tree>,
    hierarchy_index: Index<S::Tree>,
    existence_index: Index<S::Tree>,
    alias_index: Index<S::Tree>,
    one_alias_index: Index<S::Tree>,
    sub_alias_index: Index<S::Tree>,
    user_indices: BTreeMap<String, Index<S::Tree>>,
    write_lock: Mutex<()>,
    poisoned: AtomicBool,
}

impl<S: Storage> Partition<S> {
    pub fn open(storage: S, config: PartitionConfig, registries: Arc<RwLock<Registries>>) -> OperationResult<Partition<S>> {
        let master = storage.lookup_tree(names::MASTER)?;
        let admin = storage.lookup_tree(names::ADMIN)?;
        let open_index = |forward: &str| -> OperationResult<Index<S::Tree>> {
            Ok(Index::new(
                storage.lookup_tree(forward)?,
                storage.lookup_tree(names::reverse(forward))?,
            ))
        };
        let dn_index = open_index(names::NORMALIZED_DN)?;
        let updn_index = open_index(names::USER_PROVIDED_DN)?;
        let hierarchy_index = open_index(names::HIERARCHY)?;
        let existence_index = open_index(names::EXISTENCE)?;
        let alias_index = open_index(names::ALIAS)?;
        let one_alias_index = open_index(names::ONE_ALIAS)?;
        let sub_alias_index = open_index(names::SUB_ALIAS)?;

        let mut suffix = Dn::parse(&config.suffix)?;
        let suffix_ndn = {
            let schema = registries
                .read()
                .map_err(|_| OperationError::unwilling_to_perform("schema registry lock poisoned"))?;
            suffix.normalize(&*schema)?.to_owned()
        };
        if suffix.is_root() {
            return Err(OperationError::unwilling_to_perform("a partition needs a non-empty suffix"));
        }

        let mut user_indices = BTreeMap::new();
        {
            let schema = registries
                .read()
                .map_err(|_| OperationError::unwilling_to_perform("schema registry lock poisoned"))?;
            for attribute_id in &config.indexed_attributes {
                let oid = schema.attribute_type(attribute_id)?.oid.clone();
                user_indices.insert(oid.clone(), open_index(&oid)?);
            }
        }

        let partition = Partition {
            storage,
            suffix,
            suffix_ndn,
            sync_on_write: config.sync_on_write,
            optimizer_enabled: config.optimizer_enabled,
            registries,
            master,
            admin,
            dn_index,
            updn_index,
            hierarchy_index,
            existence_index,
            alias_index,
            one_alias_index,
            sub_alias_index,
            user_indices,
            write_lock: Mutex::new(()),
            poisoned: AtomicBool::new(false),
        };
        partition.check_or_write_header()?;
        partition.ensure_context_entry(config.context_entry)?;
        Ok(partition)
    }

    // ---- plumbing --------------------------------------------------------

    fn schema(&self) -> OperationResult<RwLockReadGuard<'_, Registries>> {
        self.registries
            .read()
            .map_err(|_| OperationError::unwilling_to_perform("schema registry lock poisoned"))
    }

    fn writer(&self) -> OperationResult<MutexGuard<'_, ()>> {
        if self.poisoned.load(Ordering::SeqCst) {
            return Err(OperationError::unwilling_to_perform(
                "partition writer is poisoned after a storage failure",
            ));
        }
        self.write_lock
            .lock()
            .map_err(|_| OperationError::unwilling_to_perform("partition writer lock poisoned"))
    }

    fn poison_on_fatal<T>(&self, result: OperationResult<T>) -> OperationResult<T> {
        if let Err(error) = &result {
            if error.is_fatal() {
                log::error!("poisoning partition {} writer: {}", self.suffix_ndn, error);
                self.poisoned.store(true, Ordering::SeqCst);
            }
        }
        result
    }

    /// clears the writer poison after the caller has re-established a sane
    /// on-disk state.
    pub fn recover(&self) -> OperationResult<()> {
        self.storage.flush()?;
        self.poisoned.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub fn sync(&self) -> OperationResult<()> {
        self.storage.flush()?;
        Ok(())
    }

    fn commit(&self) -> OperationResult<()> {
        if self.sync_on_write {
            self.storage.flush()?;
        }
        Ok(())
    }

    pub fn suffix_dn(&self) -> &Dn {
        &self.suffix
    }

    pub fn suffix_ndn(&self) -> &str {
        &self.suffix_ndn
    }

    pub fn registries(&self) -> Arc<RwLock<Registries>> {
        self.registries.clone()
    }

    pub fn is_indexed(&self, oid: &str) -> bool {
        self.user_indices.contains_key(oid)
    }

    pub(crate) fn user_index(&self, oid: &str) -> Option<&Index<S::Tree>> {
        self.user_indices.get(oid)
    }

    pub(crate) fn existence(&self) -> &Index<S::Tree> {
        &self.existence_index
    }

    pub(crate) fn hierarchy(&self) -> &Index<S::Tree> {
        &self.hierarchy_index
    }

    pub(crate) fn optimizer_enabled(&self) -> bool {
        self.optimizer_enabled
    }

    // ---- admin table -----------------------------------------------------

    fn admin_key(name: &str) -> Binary {
        Binary::pack(&[Datum::from_string(name)])
    }

    fn admin_get_string(&self, name: &str) -> OperationResult<Option<String>> {
        Ok(self
            .admin
            .get(&Self::admin_key(name))?
            .map(|value| value.unpack())
            .and_then(|datums| datums.into_iter().next())
            .map(|datum| datum.as_string()))
    }

    fn admin_get_u64(&self, name: &str) -> OperationResult<Option<u64>> {
        Ok(self
            .admin
            .get(&Self::admin_key(name))?
            .map(|value| value.unpack())
            .and_then(|datums| datums.into_iter().next())
            .map(|datum| datum.as_u64()))
    }

    fn admin_put_string(&self, name: &str, value: &str) -> OperationResult<()> {
        self.admin
            .put(Self::admin_key(name), Binary::pack(&[Datum::from_string(value)]))?;
        Ok(())
    }

    fn admin_put_u64(&self, name: &str, value: u64) -> OperationResult<()> {
        self.admin
            .put(Self::admin_key(name), Binary::pack(&[Datum::from_u64(value)]))?;
        Ok(())
    }

    fn check_or_write_header(&self) -> OperationResult<()> {
        match self.admin_get_u64(ADMIN_VERSION)? {
            None => {
                self.admin_put_u64(ADMIN_VERSION, FORMAT_VERSION)?;
                self.admin_put_string(ADMIN_SUFFIX, &self.suffix_ndn)?;
                Ok(())
            }
            Some(version) if version == FORMAT_VERSION => {
                match self.admin_get_string(ADMIN_SUFFIX)? {
                    Some(persisted) if persisted == self.suffix_ndn => Ok(()),
                    Some(persisted) => Err(OperationError::unwilling_to_perform(format!(
                        "store was created for suffix {} not {}",
                        persisted, self.suffix_ndn
                    ))),
                    None => Err(OperationError::CorruptStore("missing suffix header".to_owned())),
                }
            }
            Some(version) => Err(OperationError::CorruptStore(format!(
                "unsupported store format version {}",
                version
            ))),
        }
    }

    /// mints the next entry id. Ids start at 1 and never recycle.
    fn next_id(&self) -> OperationResult<u64> {
        let next = self.admin_get_u64(ADMIN_SEQUENCE)?.unwrap_or(1);
        self.admin_put_u64(ADMIN_SEQUENCE, next + 1)?;
        Ok(next)
    }

    fn ensure_context_entry(&self, context_entry: Option<Entry>) -> OperationResult<()> {
        if self.master.count()? > 0 {
            return Ok(());
        }
        let entry = match context_entry {
            Some(entry) => entry,
            None => self.default_context_entry()?,
        };
        let suffix = self.suffix.user_provided().to_owned();
        self.add(&suffix, entry)?;
        Ok(())
    }

    fn default_context_entry(&self) -> OperationResult<Entry> {
        let rdn = self
            .suffix
            .rdn()
            .ok_or_else(|| OperationError::unwilling_to_perform("a partition needs a non-empty suffix"))?;
        let mut entry = Entry::new();
        entry.add_value("objectClass", AttributeValue::text("top"));
        let structural = match rdn.avas().first().map(|ava| ava.attribute().to_ascii_lowercase()) {
            Some(attribute) if attribute == "ou" => "organizationalUnit",
            Some(attribute) if attribute == "o" => "organization",
            Some(attribute) if attribute == "dc" => "domain",
            Some(attribute) if attribute == "cn" => "applicationProcess",
            Some(attribute) if attribute == "l" => "locality",
            _ => {
                return Err(OperationError::unwilling_to_perform(format!(
                    "no default context entry for suffix {}, configure one",
                    self.suffix.user_provided()
                )))
            }
        };
        entry.add_value("objectClass", AttributeValue::text(structural));
        for ava in rdn.avas() {
            entry.add_value(ava.attribute(), AttributeValue::text(ava.value()));
        }
        Ok(entry)
    }

    // ---- reads -----------------------------------------------------------

    fn master_key(id: u64) -> Binary {
        Binary::pack(&[Datum::from_u64(id)])
    }

    pub fn get(&self, id: u64) -> OperationResult<Option<StoredEntry>> {
        match self.master.get(&Self::master_key(id))? {
            Some(row) => decode_entry(&row).map(Some),
            None => Ok(None),
        }
    }

    fn require(&self, id: u64) -> OperationResult<StoredEntry> {
        self.get(id)?
            .ok_or_else(|| OperationError::CorruptStore(format!("master row {} missing", id)))
    }

    /// normalizes the DN and resolves it to an entry id.
    pub fn id_for_dn(&self, dn: &str) -> OperationResult<Option<u64>> {
        let schema = self.schema()?;
        let mut parsed = Dn::parse(dn)?;
        let ndn = parsed.normalize(&*schema)?.to_owned();
        drop(schema);
        self.dn_index.id_for(&Datum::from_string(ndn)).map_err(Into::into)
    }

    pub fn lookup(&self, dn: &str) -> OperationResult<Option<Entry>> {
        match self.id_for_dn(dn)? {
            Some(id) => Ok(self.get(id)?.map(|stored| stored.entry)),
            None => Ok(None),
        }
    }

    /// immediate children of an entry, in id order.
    pub fn list(&self, parent_id: u64) -> OperationResult<Vec<u64>> {
        self.hierarchy_index.ids_for(&Datum::from_u64(parent_id)).map_err(Into::into)
    }

    pub fn entry_count(&self) -> OperationResult<usize> {
        self.master.count().map_err(Into::into)
    }

    pub(crate) fn parent_of(&self, id: u64) -> OperationResult<Option<u64>> {
        let keys = self.hierarchy_index.keys_for(id)?;
        Ok(keys.first().map(Datum::as_u64))
    }

    // ---- add -------------------------------------------------------------

    pub fn add(&self, dn: &str, entry: Entry) -> OperationResult<u64> {
        let _guard = self.writer()?;
        let result = self.add_locked(dn, entry);
        self.poison_on_fatal(result)
    }

    fn add_locked(&self, dn: &str, entry: Entry) -> OperationResult<u64> {
        let schema = self.schema()?;
        let mut parsed = Dn::parse(dn)?;
        let ndn = parsed.normalize(&*schema)?.to_owned();
        let updn = parsed.user_provided().to_owned();

        let is_suffix = ndn == self.suffix_ndn;
        if !is_suffix && !parsed.is_descendant_of(&self.suffix) {
            return Err(OperationError::no_such_object(format!(
                "{} is outside suffix {}",
                updn, self.suffix_ndn
            )));
        }
        if self.dn_index.id_for(&Datum::from_string(ndn.clone()))?.is_some() {
            return Err(OperationError::entry_already_exists(updn));
        }

        let parent_id = if is_suffix {
            ROOT_ID
        } else {
            let parent = parsed
                .parent()
                .ok_or_else(|| OperationError::no_such_object("missing parent"))?;
            let parent_ndn = parent
                .normalized()
                .ok_or_else(|| OperationError::no_such_object("missing parent"))?
                .to_owned();
            match self.dn_index.id_for(&Datum::from_string(parent_ndn))? {
                Some(id) => id,
                None => return Err(OperationError::no_such_object(parent.user_provided().to_owned())),
            }
        };
        if parent_id != ROOT_ID && self.alias_index.has_id(parent_id)? {
            return Err(OperationError::alias_deref_problem(format!(
                "can not add an entry under the alias parent of {}",
                updn
            )));
        }

        // the rdn values name the entry, so they belong to it
        let mut entry = entry;
        if let Some(rdn) = parsed.rdn() {
            for ava in rdn.avas() {
                entry.add_value(ava.attribute(), AttributeValue::text(ava.value()));
            }
        }

        let validator = EntryValidator::from(&*schema);
        let canonical = validator.validate(&entry)?;

        let alias_plan = if canonical.has_object_class(oids::name::ALIAS) {
            Some(self.plan_alias(&schema, &parsed, &canonical)?)
        } else {
            None
        };

        let id = self.next_id()?;

        self.dn_index.insert(&Datum::from_string(ndn.clone()), id)?;
        self.updn_index.insert(&Datum::from_string(updn.clone()), id)?;
        self.hierarchy_index.insert(&Datum::from_u64(parent_id), id)?;
        self.insert_value_indices(&schema, &canonical, id)?;
        if let Some(plan) = alias_plan {
            self.apply_alias_plan(&plan, id)?;
        }

        let stored = StoredEntry {
            id,
            user_provided_dn: updn,
            normalized_dn: ndn,
            entry: canonical,
        };
        self.master.put(Self::master_key(id), encode_entry(&stored))?;
        drop(schema);
        self.commit()?;
        log::debug!("added entry {} as id {}", stored.user_provided_dn, id);
        Ok(id)
    }

    fn insert_value_indices(&self, schema: &Registries, entry: &Entry, id: u64) -> OperationResult<()> {
        for attribute in entry.attributes() {
            let oid = schema.attribute_type(attribute.id())?.oid.clone();
            if let Some(index) = self.user_indices.get(&oid) {
                self.existence_index.insert(&Datum::from_string(oid.clone()), id)?;
                for value in attribute.values() {
                    if let Some(text) = value.as_text() {
                        let key = schema.normalize_value(attribute.id(), text)?;
                        index.insert(&Datum::from_string(key), id)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn drop_value_indices(&self, id: u64) -> OperationResult<()> {
        self.existence_index.drop_id(id)?;
        for index in self.user_indices.values() {
            index.drop_id(id)?;
        }
        Ok(())
    }

    // ---- modify ----------------------------------------------------------

    pub fn modify(&self, dn: &str, modifications: &[Modification]) -> OperationResult<()> {
        let _guard = self.writer()?;
        let result = self.modify_locked(dn, modifications);
        self.poison_on_fatal(result)
    }

    fn modify_locked(&self, dn: &str, modifications: &[Modification]) -> OperationResult<()> {
        let schema = self.schema()?;
        let mut parsed = Dn::parse(dn)?;
        let ndn = parsed.normalize(&*schema)?.to_owned();
        let id = self
            .dn_index
            .id_for(&Datum::from_string(ndn))?
            .ok_or_else(|| OperationError::no_such_object(parsed.user_provided().to_owned()))?;
        let stored = self.require(id)?;

        let rdn = parsed
            .rdn()
            .cloned()
            .ok_or_else(|| OperationError::naming_violation("entry has no rdn"))?;
        let validator = EntryValidator::from(&*schema);
        let changed = validator.apply_modifications(&stored.entry, &rdn, modifications)?;

        let was_alias = self.alias_index.has_id(id)?;
        let alias_plan = if changed.has_object_class(oids::name::ALIAS) {
            Some(self.plan_alias(&schema, &parsed, &changed)?)
        } else {
            None
        };

        // differential index patch: drop and re-add only this entry's rows
        self.drop_value_indices(id)?;
        self.insert_value_indices(&schema, &changed, id)?;
        if was_alias {
            self.drop_alias_rows(&schema, id)?;
        }
        if let Some(plan) = alias_plan {
            self.apply_alias_plan(&plan, id)?;
        }

        let stored = StoredEntry { entry: changed, ..stored };
        self.master.put(Self::master_key(id), encode_entry(&stored))?;
        drop(schema);
        self.commit()
    }

    // ---- delete ----------------------------------------------------------

    pub fn delete(&self, dn: &str) -> OperationResult<()> {
        let _guard = self.writer()?;
        let result = self.delete_locked(dn);
        self.poison_on_fatal(result)
    }

    fn delete_locked(&self, dn: &str) -> OperationResult<()> {
        let schema = self.schema()?;
        let mut parsed = Dn::parse(dn)?;
        let ndn = parsed.normalize(&*schema)?.to_owned();
        let id = self
            .dn_index
            .id_for(&Datum::from_string(ndn.clone()))?
            .ok_or_else(|| OperationError::no_such_object(parsed.user_provided().to_owned()))?;
        let stored = self.require(id)?;

        if !self.hierarchy_index.ids_for(&Datum::from_u64(id))?.is_empty() {
            return Err(OperationError::unwilling_to_perform(format!(
                "{} has children and can not be deleted",
                stored.user_provided_dn
            )));
        }
        if self.alias_index.has_key(&Datum::from_string(ndn.clone()))? {
            return Err(OperationError::unwilling_to_perform(format!(
                "{} is the target of an alias and can not be deleted",
                stored.user_provided_dn
            )));
        }

        if self.alias_index.has_id(id)? {
            self.drop_alias_rows(&schema, id)?;
        }
        self.drop_value_indices(id)?;
        self.dn_index.drop(&Datum::from_string(ndn), id)?;
        self.updn_index
            .drop(&Datum::from_string(stored.user_provided_dn.clone()), id)?;
        if let Some(parent_id) = self.parent_of(id)? {
            self.hierarchy_index.drop(&Datum::from_u64(parent_id), id)?;
        }
        self.master.remove(&Self::master_key(id))?;
        drop(schema);
        self.commit()?;
        log::debug!("deleted entry {} (id {})", stored.user_provided_dn, id);
        Ok(())
    }

    // ---- rename / move ---------------------------------------------------

    pub fn rename(&self, dn: &str, new_rdn: &str, delete_old_rdn: bool) -> OperationResult<()> {
        let _guard = self.writer()?;
        let result = self.rename_locked(dn, new_rdn, delete_old_rdn);
        self.poison_on_fatal(result)
    }

    fn rename_locked(&self, dn: &str, new_rdn: &str, delete_old_rdn: bool) -> OperationResult<()> {
        let schema = self.schema()?;
        let mut parsed = Dn::parse(dn)?;
        parsed.normalize(&*schema)?;
        let ndn = parsed
            .normalized()
            .map(str::to_owned)
            .unwrap_or_default();
        let id = self
            .dn_index
            .id_for(&Datum::from_string(ndn.clone()))?
            .ok_or_else(|| OperationError::no_such_object(parsed.user_provided().to_owned()))?;
        if ndn == self.suffix_ndn {
            return Err(OperationError::unwilling_to_perform("the suffix entry can not be renamed"));
        }
        let stored = self.require(id)?;

        let rdn_holder = Dn::parse(new_rdn)?;
        if rdn_holder.size() != 1 {
            return Err(OperationError::naming_violation(format!("{} is not a single rdn", new_rdn)));
        }
        let new_rdn_parsed = rdn_holder.rdns()[0].clone();

        let parent = parsed
            .parent()
            .ok_or_else(|| OperationError::unwilling_to_perform("the suffix entry can not be renamed"))?;
        let mut new_dn = parent.child(new_rdn_parsed.clone());
        let new_ndn = new_dn.normalize(&*schema)?.to_owned();
        if new_ndn != ndn && self.dn_index.id_for(&Datum::from_string(new_ndn.clone()))?.is_some() {
            return Err(OperationError::entry_already_exists(new_dn.user_provided().to_owned()));
        }

        // recompute the entry's own rdn attribute values
        let mut entry = stored.entry.clone();
        for ava in new_rdn_parsed.avas() {
            entry.add_value(ava.attribute(), AttributeValue::text(ava.value()));
        }
        if delete_old_rdn {
            if let Some(old_rdn) = parsed.rdn() {
                for ava in old_rdn.avas() {
                    let survives = new_rdn_parsed
                        .avas()
                        .iter()
                        .any(|new_ava| {
                            new_ava.attribute().eq_ignore_ascii_case(ava.attribute())
                                && schema
                                    .normalize_value(ava.attribute(), new_ava.value())
                                    .and_then(|new_norm| {
                                        schema
                                            .normalize_value(ava.attribute(), ava.value())
                                            .map(|old_norm| new_norm == old_norm)
                                    })
                                    .unwrap_or(false)
                        });
                    if !survives {
                        entry.remove_value(ava.attribute(), &AttributeValue::text(ava.value()));
                    }
                }
            }
        }
        let validator = EntryValidator::from(&*schema);
        let canonical = validator.validate(&entry)?;

        self.drop_value_indices(id)?;
        self.insert_value_indices(&schema, &canonical, id)?;
        let stored = StoredEntry { entry: canonical, ..stored };
        self.master.put(Self::master_key(id), encode_entry(&stored))?;

        self.propagate_dn(&schema, id, new_dn.user_provided().to_owned(), new_ndn, false)?;
        drop(schema);
        self.commit()
    }

    pub fn move_entry(&self, dn: &str, new_parent_dn: &str) -> OperationResult<()> {
        let _guard = self.writer()?;
        let result = self.move_locked(dn, new_parent_dn);
        self.poison_on_fatal(result)
    }

    fn move_locked(&self, dn: &str, new_parent_dn: &str) -> OperationResult<()> {
        let schema = self.schema()?;
        let mut parsed = Dn::parse(dn)?;
        let ndn = parsed.normalize(&*schema)?.to_owned();
        let id = self
            .dn_index
            .id_for(&Datum::from_string(ndn.clone()))?
            .ok_or_else(|| OperationError::no_such_object(parsed.user_provided().to_owned()))?;
        if ndn == self.suffix_ndn {
            return Err(OperationError::unwilling_to_perform("the suffix entry can not be moved"));
        }

        let mut new_parent = Dn::parse(new_parent_dn)?;
        let new_parent_ndn = new_parent.normalize(&*schema)?.to_owned();
        let new_parent_id = self
            .dn_index
            .id_for(&Datum::from_string(new_parent_ndn.clone()))?
            .ok_or_else(|| OperationError::no_such_object(new_parent.user_provided().to_owned()))?;
        if self.alias_index.has_id(new_parent_id)? {
            return Err(OperationError::alias_deref_problem(
                "can not move an entry under an alias",
            ));
        }
        if new_parent_ndn == ndn || new_parent.is_descendant_of(&parsed) {
            return Err(OperationError::unwilling_to_perform(
                "an entry can not be moved below itself",
            ));
        }

        let rdn = parsed
            .rdn()
            .cloned()
            .ok_or_else(|| OperationError::naming_violation("entry has no rdn"))?;
        let mut new_dn = new_parent.child(rdn);
        let new_ndn = new_dn.normalize(&*schema)?.to_owned();
        if self.dn_index.id_for(&Datum::from_string(new_ndn.clone()))?.is_some() {
            return Err(OperationError::entry_already_exists(new_dn.user_provided().to_owned()));
        }

        // alias rows tied to the old ancestor path come off before the move
        for alias_id in self.subtree_alias_ids(id)? {
            self.drop_one_and_sub_rows(&schema, alias_id)?;
        }

        let old_parent_id = self
            .parent_of(id)?
            .ok_or_else(|| OperationError::CorruptStore(format!("entry {} has no parent edge", id)))?;
        self.hierarchy_index.drop(&Datum::from_u64(old_parent_id), id)?;
        self.hierarchy_index.insert(&Datum::from_u64(new_parent_id), id)?;

        self.propagate_dn(&schema, id, new_dn.user_provided().to_owned(), new_ndn, true)?;
        drop(schema);
        self.commit()
    }

    pub fn move_and_rename(
        &self,
        dn: &str,
        new_parent_dn: &str,
        new_rdn: &str,
        delete_old_rdn: bool,
    ) -> OperationResult<()> {
        self.rename(dn, new_rdn, delete_old_rdn)?;
        let parsed = Dn::parse(dn)?;
        let renamed = match parsed.parent() {
            Some(parent) => format!("{},{}", new_rdn, parent.user_provided()),
            None => new_rdn.to_owned(),
        };
        self.move_entry(&renamed, new_parent_dn)
    }

    /// rewrites the DN plane of an entry and all of its descendants. On a
    /// move, alias rows of affected aliases are re-added under the new
    /// ancestor path.
    fn propagate_dn(
        &self,
        schema: &Registries,
        id: u64,
        new_updn: String,
        new_ndn: String,
        moving: bool,
    ) -> OperationResult<()> {
        let stored = self.require(id)?;

        self.dn_index
            .drop(&Datum::from_string(stored.normalized_dn.clone()), id)?;
        self.updn_index
            .drop(&Datum::from_string(stored.user_provided_dn.clone()), id)?;
        self.dn_index.insert(&Datum::from_string(new_ndn.clone()), id)?;
        self.updn_index.insert(&Datum::from_string(new_updn.clone()), id)?;

        let stored = StoredEntry {
            user_provided_dn: new_updn.clone(),
            normalized_dn: new_ndn.clone(),
            ..stored
        };
        self.master.put(Self::master_key(id), encode_entry(&stored))?;

        if moving && self.alias_index.has_id(id)? {
            let mut alias_dn = Dn::parse(&new_updn)?;
            alias_dn.normalize(schema)?;
            let plan = self.plan_alias(schema, &alias_dn, &stored.entry)?;
            self.apply_alias_plan(&plan, id)?;
        }

        for child_id in self.hierarchy_index.ids_for(&Datum::from_u64(id))? {
            let child = self.require(child_id)?;
            let child_rdn_updn = Dn::parse(&child.user_provided_dn)?
                .rdns()
                .first()
                .map(Rdn::to_string)
                .ok_or_else(|| OperationError::CorruptStore(format!("entry {} has an empty dn", child_id)))?;
            let child_rdn_ndn = Dn::parse(&child.normalized_dn)?
                .rdns()
                .first()
                .map(Rdn::to_string)
                .ok_or_else(|| OperationError::CorruptStore(format!("entry {} has an empty dn", child_id)))?;
            self.propagate_dn(
                schema,
                child_id,
                format!("{},{}", child_rdn_updn, new_updn),
                format!("{},{}", child_rdn_ndn, new_ndn),
                moving,
            )?;
        }
        Ok(())
    }

    /// ids of every alias entry within the subtree rooted at `id`.
    fn subtree_alias_ids(&self, id: u64) -> OperationResult<Vec<u64>> {
        let mut aliases = vec![];
        let mut queue = vec![id];
        while let Some(current) = queue.pop() {
            if self.alias_index.has_id(current)? {
                aliases.push(current);
            }
            queue.extend(self.hierarchy_index.ids_for(&Datum::from_u64(current))?);
        }
        Ok(aliases)
    }
}

#[cfg(test)]
mod tests;
