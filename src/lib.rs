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

//! wires the directory engine together: one shared schema registry, a
//! data partition under the configured suffix, the reserved `ou=schema`
//! partition, and the controller that keeps the registry consistent with
//! persisted schema entries. Everything outside this crate talks to a
//! `DirectoryNode`.

use in_memory::InMemoryDatabase;
use naming::Dn;
use partition::{Partition, PartitionConfig};
use persistent::PersistentDatabase;
use schema_ops::SchemaOperationController;
use schema_registry::{bootstrap, Registries};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use storage_api::Storage;

pub use filter::{parse_filter, Filter};
pub use model::{Attribute, AttributeValue, Entry, Modification, OperationError, OperationResult, SearchScope};
pub use partition::{SearchEntry, SearchRequest, SearchStream, StoredEntry};

pub const SCHEMA_SUFFIX: &str = "ou=schema";

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// data files live under this directory; `None` keeps everything in
    /// memory
    pub working_dir: Option<PathBuf>,
    pub suffix: String,
    pub sync_on_write: bool,
    pub cache_pages: u64,
    pub optimizer_enabled: bool,
    pub indexed_attributes: Vec<String>,
}

impl Default for DirectoryConfig {
    fn default() -> DirectoryConfig {
        DirectoryConfig {
            working_dir: None,
            suffix: "ou=system".to_owned(),
            sync_on_write: true,
            cache_pages: 10_000,
            optimizer_enabled: true,
            indexed_attributes: vec!["objectClass".to_owned()],
        }
    }
}

impl DirectoryConfig {
    fn partition_config(&self) -> PartitionConfig {
        PartitionConfig {
            suffix: self.suffix.clone(),
            sync_on_write: self.sync_on_write,
            cache_pages: self.cache_pages,
            optimizer_enabled: self.optimizer_enabled,
            indexed_attributes: self.indexed_attributes.clone(),
            context_entry: None,
        }
    }

    fn schema_partition_config(&self) -> PartitionConfig {
        PartitionConfig {
            suffix: SCHEMA_SUFFIX.to_owned(),
            sync_on_write: self.sync_on_write,
            cache_pages: self.cache_pages,
            optimizer_enabled: self.optimizer_enabled,
            indexed_attributes: vec!["objectClass".to_owned()],
            context_entry: None,
        }
    }
}

pub struct DirectoryNode<S: Storage> {
    registries: Arc<RwLock<Registries>>,
    controller: SchemaOperationController,
    data: Partition<S>,
    schema: Partition<S>,
}

impl DirectoryNode<InMemoryDatabase> {
    /// a node holding everything in memory, mostly for tests and tooling.
    pub fn in_memory(config: DirectoryConfig) -> OperationResult<DirectoryNode<InMemoryDatabase>> {
        let registries = Arc::new(RwLock::new(bootstrap()?));
        let data = Partition::open(InMemoryDatabase::create(), config.partition_config(), registries.clone())?;
        let schema = Partition::open(
            InMemoryDatabase::create(),
            config.schema_partition_config(),
            registries.clone(),
        )?;
        DirectoryNode::assemble(registries, data, schema)
    }
}

impl DirectoryNode<PersistentDatabase> {
    /// a node backed by on-disk record managers, one directory per
    /// partition under the configured working directory.
    pub fn open(config: DirectoryConfig) -> OperationResult<DirectoryNode<PersistentDatabase>> {
        let working_dir = config
            .working_dir
            .clone()
            .ok_or_else(|| OperationError::unwilling_to_perform("a persistent node needs a working directory"))?;
        let registries = Arc::new(RwLock::new(bootstrap()?));
        let data_storage = PersistentDatabase::open(working_dir.join("data"), config.partition_config().cache_bytes())?;
        let schema_storage =
            PersistentDatabase::open(working_dir.join("schema"), config.schema_partition_config().cache_bytes())?;
        let data = Partition::open(data_storage, config.partition_config(), registries.clone())?;
        let schema = Partition::open(schema_storage, config.schema_partition_config(), registries.clone())?;
        DirectoryNode::assemble(registries, data, schema)
    }
}

impl<S: Storage> DirectoryNode<S> {
    fn assemble(
        registries: Arc<RwLock<Registries>>,
        data: Partition<S>,
        schema: Partition<S>,
    ) -> OperationResult<DirectoryNode<S>> {
        let controller = SchemaOperationController::new(registries.clone());
        let node = DirectoryNode {
            registries,
            controller,
            data,
            schema,
        };
        node.replay_schema_entries()?;
        Ok(node)
    }

    /// replays persisted `ou=schema` entries through the controller so a
    /// reopened node carries user schemas again. Ids are monotonic, so
    /// walking them in order registers containers before members.
    fn replay_schema_entries(&self) -> OperationResult<()> {
        let suffix_id = match self.schema.id_for_dn(SCHEMA_SUFFIX)? {
            Some(id) => id,
            None => return Ok(()),
        };
        let mut queue = vec![suffix_id];
        let mut replayable = vec![];
        while let Some(id) = queue.pop() {
            queue.extend(self.schema.list(id)?);
            if id != suffix_id {
                if let Some(stored) = self.schema.get(id)? {
                    replayable.push(stored);
                }
            }
        }
        replayable.sort_by_key(|stored| stored.id);
        for stored in replayable {
            let dn = Dn::parse(&stored.user_provided_dn)?;
            if let Err(error) = self.controller.entry_added(&dn, &stored.entry) {
                log::warn!(
                    "skipping replay of schema entry {}: {}",
                    stored.user_provided_dn,
                    error
                );
            }
        }
        Ok(())
    }

    pub fn registries(&self) -> Arc<RwLock<Registries>> {
        self.registries.clone()
    }

    pub fn schema_controller(&self) -> &SchemaOperationController {
        &self.controller
    }

    pub fn data_partition(&self) -> &Partition<S> {
        &self.data
    }

    fn partition_for(&self, dn: &Dn) -> &Partition<S> {
        if self.controller.is_schema_dn(dn) {
            &self.schema
        } else {
            &self.data
        }
    }

    // ---- the partition API, routed by suffix -----------------------------

    pub fn add(&self, dn: &str, entry: Entry) -> OperationResult<()> {
        let parsed = Dn::parse(dn)?;
        if !self.controller.is_schema_dn(&parsed) {
            return self.data.add(dn, entry).map(|_| ());
        }
        let id = self.schema.add(dn, entry)?;
        let stored = self
            .schema
            .get(id)?
            .ok_or_else(|| OperationError::CorruptStore(format!("schema entry {} vanished", id)))?;
        if let Err(error) = self.controller.entry_added(&parsed, &stored.entry) {
            // keep store and registry in step: take the entry back out
            if let Err(undo) = self.schema.delete(dn) {
                log::error!("schema store and registry diverged for {}: {}", dn, undo);
            }
            return Err(error);
        }
        Ok(())
    }

    pub fn lookup(&self, dn: &str) -> OperationResult<Option<Entry>> {
        let parsed = Dn::parse(dn)?;
        self.partition_for(&parsed).lookup(dn)
    }

    pub fn list(&self, dn: &str) -> OperationResult<Vec<u64>> {
        let parsed = Dn::parse(dn)?;
        let partition = self.partition_for(&parsed);
        match partition.id_for_dn(dn)? {
            Some(id) => partition.list(id),
            None => Err(OperationError::no_such_object(dn)),
        }
    }

    pub fn modify(&self, dn: &str, modifications: &[Modification]) -> OperationResult<()> {
        let parsed = Dn::parse(dn)?;
        if !self.controller.is_schema_dn(&parsed) {
            return self.data.modify(dn, modifications);
        }
        let before = self
            .schema
            .lookup(dn)?
            .ok_or_else(|| OperationError::no_such_object(dn))?;
        self.schema.modify(dn, modifications)?;
        let after = self
            .schema
            .lookup(dn)?
            .ok_or_else(|| OperationError::no_such_object(dn))?;
        if let Err(error) = self.controller.entry_modified(&parsed, &before, &after) {
            if let Err(undo) = self.restore_schema_entry(dn, &before) {
                log::error!("schema store and registry diverged for {}: {}", dn, undo);
            }
            return Err(error);
        }
        Ok(())
    }

    fn restore_schema_entry(&self, dn: &str, image: &Entry) -> OperationResult<()> {
        self.schema.delete(dn)?;
        self.schema.add(dn, image.clone()).map(|_| ())
    }

    pub fn rename(&self, dn: &str, new_rdn: &str, delete_old_rdn: bool) -> OperationResult<()> {
        let parsed = Dn::parse(dn)?;
        if self.controller.is_schema_dn(&parsed) {
            return Err(OperationError::unwilling_to_perform(
                "entries under ou=schema can not be renamed",
            ));
        }
        self.data.rename(dn, new_rdn, delete_old_rdn)
    }

    pub fn move_entry(&self, dn: &str, new_parent_dn: &str) -> OperationResult<()> {
        let parsed = Dn::parse(dn)?;
        let target = Dn::parse(new_parent_dn)?;
        if self.controller.is_schema_dn(&parsed) || self.controller.is_schema_dn(&target) {
            return Err(OperationError::unwilling_to_perform(
                "entries can not be moved into or out of ou=schema",
            ));
        }
        self.data.move_entry(dn, new_parent_dn)
    }

    pub fn move_and_rename(
        &self,
        dn: &str,
        new_parent_dn: &str,
        new_rdn: &str,
        delete_old_rdn: bool,
    ) -> OperationResult<()> {
        let parsed = Dn::parse(dn)?;
        let target = Dn::parse(new_parent_dn)?;
        if self.controller.is_schema_dn(&parsed) || self.controller.is_schema_dn(&target) {
            return Err(OperationError::unwilling_to_perform(
                "entries can not be moved into or out of ou=schema",
            ));
        }
        self.data.move_and_rename(dn, new_parent_dn, new_rdn, delete_old_rdn)
    }

    /// delete with an optional cascade request for schema entries; the
    /// cascade flag reduces to non-cascading behaviour with a warning.
    pub fn delete_with_cascade(&self, dn: &str, cascade: bool) -> OperationResult<()> {
        let parsed = Dn::parse(dn)?;
        if !self.controller.is_schema_dn(&parsed) {
            return self.data.delete(dn);
        }
        let entry = self
            .schema
            .lookup(dn)?
            .ok_or_else(|| OperationError::no_such_object(dn))?;
        // dependency rules gate the registry first, then the store row goes
        self.controller.entry_deleted(&parsed, &entry, cascade)?;
        if let Err(error) = self.schema.delete(dn) {
            if let Err(undo) = self.controller.entry_added(&parsed, &entry) {
                log::error!("schema store and registry diverged for {}: {}", dn, undo);
            }
            return Err(error);
        }
        Ok(())
    }

    pub fn delete(&self, dn: &str) -> OperationResult<()> {
        self.delete_with_cascade(dn, false)
    }

    pub fn search(&self, request: SearchRequest) -> OperationResult<SearchStream<'_, S>> {
        let parsed = Dn::parse(&request.base)?;
        self.partition_for(&parsed).search(request)
    }

    /// RFC 4512 description edits against the subschema subentry.
    pub fn modify_subschema(&self, modifications: &[Modification]) -> OperationResult<()> {
        self.controller.subschema_modified(modifications)
    }

    /// the subschema subentry: every registered schema object rendered as
    /// its RFC 4512 description.
    pub fn subschema_entry(&self) -> OperationResult<Entry> {
        self.controller.subschema_entry()
    }

    pub fn sync(&self) -> OperationResult<()> {
        self.data.sync()?;
        self.schema.sync()
    }
}

