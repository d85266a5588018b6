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

//! alias bookkeeping. An alias may not target itself, an ancestor, its own
//! subtree, anything outside the suffix or another alias. The one-level and
//! subtree alias indices record, per ancestor of the alias, the target id —
//! skipping ancestors the target already sits under, so dereference never
//! yields an entry already in scope.

use crate::Partition;
use binary::repr::Datum;
use model::{Entry, OperationError, OperationResult};
use naming::Dn;
use schema_registry::{oids, Registries};
use storage_api::Storage;

/// the index rows one alias contributes, computed up front so validation
/// finishes before any tree is touched.
#[derive(Debug, PartialEq)]
pub(crate) struct AliasPlan {
    pub(crate) target_ndn: String,
    pub(crate) target_id: u64,
    /// `(parent(alias), target)` unless the target is a sibling
    pub(crate) one_level_row: Option<u64>,
    /// `(ancestor, target)` per non-target-ancestor above the alias
    pub(crate) subtree_rows: Vec<u64>,
}

impl<S: Storage> Partition<S> {
    /// validates an alias entry and computes its index rows. `alias_dn`
    /// must be normalized.
    pub(crate) fn plan_alias(
        &self,
        schema: &Registries,
        alias_dn: &Dn,
        entry: &Entry,
    ) -> OperationResult<AliasPlan> {
        let target_text = entry
            .get(oids::name::ALIASED_OBJECT_NAME)
            .and_then(|attribute| attribute.first_text())
            .ok_or_else(|| OperationError::alias_problem("alias entry has no aliasedObjectName value"))?
            .to_owned();
        let mut target = Dn::parse(&target_text)?;
        let target_ndn = target.normalize(schema)?.to_owned();
        let alias_ndn = alias_dn
            .normalized()
            .ok_or_else(|| OperationError::alias_problem("alias dn is not normalized"))?;

        if target_ndn != self.suffix_ndn() && !target.is_descendant_of(self.suffix_dn()) {
            return Err(OperationError::alias_problem(format!(
                "target {} is outside the partition suffix",
                target_text
            )));
        }
        if target_ndn == alias_ndn {
            return Err(OperationError::alias_problem("alias targets itself"));
        }
        if alias_dn.is_descendant_of(&target) {
            return Err(OperationError::alias_problem(format!(
                "target {} is an ancestor of the alias",
                target_text
            )));
        }
        if target.is_descendant_of(alias_dn) {
            return Err(OperationError::alias_problem(format!(
                "target {} lies under the alias itself",
                target_text
            )));
        }

        let target_id = self
            .dn_index
            .id_for(&Datum::from_string(target_ndn.clone()))?
            .ok_or_else(|| OperationError::alias_deref_problem(format!("target {} does not exist", target_text)))?;
        if self.alias_index.has_id(target_id)? {
            return Err(OperationError::alias_problem(format!(
                "target {} is itself an alias, chains are not allowed",
                target_text
            )));
        }

        let (one_level_row, subtree_rows) = self.alias_rows(alias_dn, &target)?;
        Ok(AliasPlan {
            target_ndn,
            target_id,
            one_level_row,
            subtree_rows,
        })
    }

    /// one-level and subtree ancestor ids for an alias at `alias_dn`
    /// targeting `target`. Both DNs must be normalized.
    fn alias_rows(&self, alias_dn: &Dn, target: &Dn) -> OperationResult<(Option<u64>, Vec<u64>)> {
        let parent = match alias_dn.parent() {
            Some(parent) => parent,
            None => return Ok((None, vec![])),
        };
        let target_parent_ndn = target.parent().and_then(|p| p.normalized().map(str::to_owned));
        let alias_parent_ndn = parent.normalized().map(str::to_owned);

        let one_level_row = if target_parent_ndn == alias_parent_ndn {
            None
        } else {
            match alias_parent_ndn.as_deref() {
                Some(ndn) => self.dn_index.id_for(&Datum::from_string(ndn))?,
                None => None,
            }
        };

        let mut subtree_rows = vec![];
        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            match current.normalized() {
                Some(ndn) if ndn == self.suffix_ndn() => break,
                Some(_) => {}
                None => break,
            }
            if !target.is_descendant_of(&current) {
                if let Some(ndn) = current.normalized() {
                    if let Some(ancestor_id) = self.dn_index.id_for(&Datum::from_string(ndn))? {
                        subtree_rows.push(ancestor_id);
                    }
                }
            }
            ancestor = current.parent();
        }
        Ok((one_level_row, subtree_rows))
    }

    pub(crate) fn apply_alias_plan(&self, plan: &AliasPlan, alias_id: u64) -> OperationResult<()> {
        self.alias_index
            .insert(&Datum::from_string(plan.target_ndn.clone()), alias_id)?;
        if let Some(parent_id) = plan.one_level_row {
            self.one_alias_index
                .insert(&Datum::from_u64(parent_id), plan.target_id)?;
        }
        for ancestor_id in &plan.subtree_rows {
            self.sub_alias_index
                .insert(&Datum::from_u64(*ancestor_id), plan.target_id)?;
        }
        Ok(())
    }

    /// drops the one-level and subtree rows this alias contributed,
    /// recomputed from its recorded target.
    pub(crate) fn drop_one_and_sub_rows(&self, schema: &Registries, alias_id: u64) -> OperationResult<()> {
        let (alias_dn, target, target_id) = match self.recorded_alias(schema, alias_id)? {
            Some(recorded) => recorded,
            None => return Ok(()),
        };
        let (one_level_row, subtree_rows) = self.alias_rows(&alias_dn, &target)?;
        if let Some(parent_id) = one_level_row {
            self.one_alias_index.drop(&Datum::from_u64(parent_id), target_id)?;
        }
        for ancestor_id in subtree_rows {
            self.sub_alias_index.drop(&Datum::from_u64(ancestor_id), target_id)?;
        }
        Ok(())
    }

    /// drops every index row of an alias: one-level, subtree, then the
    /// alias index itself.
    pub(crate) fn drop_alias_rows(&self, schema: &Registries, alias_id: u64) -> OperationResult<()> {
        self.drop_one_and_sub_rows(schema, alias_id)?;
        self.alias_index.drop_id(alias_id)?;
        Ok(())
    }

    /// the alias's own normalized DN, its target DN and target id, read
    /// back from the store.
    fn recorded_alias(&self, schema: &Registries, alias_id: u64) -> OperationResult<Option<(Dn, Dn, u64)>> {
        let target_ndn = match self.alias_index.keys_for(alias_id)?.into_iter().next() {
            Some(key) => key.as_string(),
            None => return Ok(None),
        };
        let stored = match self.get(alias_id)? {
            Some(stored) => stored,
            None => return Ok(None),
        };
        let mut alias_dn = Dn::parse(&stored.normalized_dn)?;
        alias_dn.normalize(schema)?;
        let mut target = Dn::parse(&target_ndn)?;
        target.normalize(schema)?;
        let target_id = match self
            .dn_index
            .id_for(&Datum::from_string(target.normalized().unwrap_or_default()))?
        {
            Some(id) => id,
            None => return Ok(None),
        };
        Ok(Some((alias_dn, target, target_id)))
    }
}
