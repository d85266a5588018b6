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

use crate::Partition;
use binary::repr::Datum;
use filter::{Filter, FilterEvaluator};
use model::{Entry, OperationError, OperationResult, RequestedAttributes, SearchScope};
use naming::Dn;
use std::collections::{BTreeSet, VecDeque};
use std::time::{Duration, Instant};
use storage_api::Storage;

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub base: String,
    pub scope: SearchScope,
    pub filter: Filter,
    /// attribute-request tokens: explicit ids, `*`, `+` or `1.1`
    pub attributes: Vec<String>,
    pub size_limit: Option<usize>,
    pub time_limit: Option<Duration>,
}

impl SearchRequest {
    pub fn new<B: Into<String>>(base: B, scope: SearchScope, filter: Filter) -> SearchRequest {
        SearchRequest {
            base: base.into(),
            scope,
            filter,
            attributes: vec![],
            size_limit: None,
            time_limit: None,
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<String>) -> SearchRequest {
        self.attributes = attributes;
        self
    }

    pub fn with_size_limit(mut self, limit: usize) -> SearchRequest {
        self.size_limit = Some(limit);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> SearchRequest {
        self.time_limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchEntry {
    pub id: u64,
    pub dn: String,
    pub entry: Entry,
}

/// lazily walks the in-scope ids, evaluates the filter per candidate and
/// projects the requested attributes. Emits `SizeLimitExceeded` in place
/// of the first over-limit match and `TimeLimitExceeded` when the clock
/// runs out mid-walk.
pub struct SearchStream<'a, S: Storage> {
    partition: &'a Partition<S>,
    queue: VecDeque<u64>,
    expand: bool,
    filter: Filter,
    requested: RequestedAttributes,
    candidates: Option<BTreeSet<u64>>,
    size_limit: Option<usize>,
    deadline: Option<Instant>,
    emitted: usize,
    finished: bool,
}

impl<S: Storage> Partition<S> {
    pub fn search(&self, request: SearchRequest) -> OperationResult<SearchStream<'_, S>> {
        let schema = self.schema()?;
        let mut base = Dn::parse(&request.base)?;
        let base_ndn = base.normalize(&*schema)?.to_owned();
        drop(schema);
        let base_id = self
            .dn_index
            .id_for(&Datum::from_string(base_ndn))?
            .ok_or_else(|| OperationError::no_such_object(base.user_provided().to_owned()))?;

        let (queue, expand) = match request.scope {
            SearchScope::Object => (VecDeque::from(vec![base_id]), false),
            SearchScope::OneLevel => (
                VecDeque::from(self.hierarchy_index.ids_for(&Datum::from_u64(base_id))?),
                false,
            ),
            SearchScope::Subtree => (VecDeque::from(vec![base_id]), true),
        };

        let candidates = if self.optimizer_enabled() {
            self.optimize(&request.filter)?
        } else {
            None
        };
        if let Some(candidates) = &candidates {
            log::debug!(
                "optimizer preselected {} candidates for {}",
                candidates.len(),
                request.filter
            );
        }

        Ok(SearchStream {
            partition: self,
            queue,
            expand,
            filter: request.filter,
            requested: RequestedAttributes::from_tokens(&request.attributes),
            candidates,
            size_limit: request.size_limit,
            deadline: request.time_limit.map(|limit| Instant::now() + limit),
            emitted: 0,
            finished: false,
        })
    }

    /// candidate preselection from forward-index ranges. `None` means full
    /// scan: the leaf's attribute has no index, or the shape of the filter
    /// gives no sound range.
    fn optimize(&self, filter: &Filter) -> OperationResult<Option<BTreeSet<u64>>> {
        match filter {
            Filter::Equality(attribute, value) => {
                let schema = self.schema()?;
                let oid = match schema.attribute_type(attribute) {
                    Ok(attribute_type) => attribute_type.oid.clone(),
                    Err(_) => return Ok(Some(BTreeSet::new())),
                };
                match self.user_index(&oid) {
                    Some(index) => {
                        let key = schema.normalize_value(attribute, value)?;
                        drop(schema);
                        Ok(Some(index.ids_for(&Datum::from_string(key))?.into_iter().collect()))
                    }
                    None => Ok(None),
                }
            }
            Filter::Present(attribute) => {
                let schema = self.schema()?;
                let oid = match schema.attribute_type(attribute) {
                    Ok(attribute_type) => attribute_type.oid.clone(),
                    Err(_) => return Ok(Some(BTreeSet::new())),
                };
                drop(schema);
                if self.is_indexed(&oid) {
                    Ok(Some(
                        self.existence()
                            .ids_for(&Datum::from_string(oid))?
                            .into_iter()
                            .collect(),
                    ))
                } else {
                    Ok(None)
                }
            }
            Filter::And(children) => {
                // any child's range is a sound superset for a conjunction
                let mut narrowed: Option<BTreeSet<u64>> = None;
                for child in children {
                    if let Some(ids) = self.optimize(child)? {
                        narrowed = Some(match narrowed {
                            None => ids,
                            Some(current) => current.intersection(&ids).copied().collect(),
                        });
                    }
                }
                Ok(narrowed)
            }
            Filter::Or(children) => {
                // a union is only sound when every branch is enumerable
                let mut union = BTreeSet::new();
                for child in children {
                    match self.optimize(child)? {
                        Some(ids) => union.extend(ids),
                        None => return Ok(None),
                    }
                }
                Ok(Some(union))
            }
            _ => Ok(None),
        }
    }

    fn project(&self, entry: &Entry, requested: &RequestedAttributes) -> OperationResult<Entry> {
        if requested.no_attributes() {
            return Ok(Entry::new());
        }
        let schema = self.schema()?;
        let mut projected = Entry::new();
        for attribute in entry.attributes() {
            let attribute_type = schema.attribute_type(attribute.id())?;
            let operational = attribute_type.usage.is_operational();
            let wanted = (requested.all_user() && !operational)
                || (requested.all_operational() && operational)
                || requested.names_explicitly(&attribute_type.oid)
                || attribute_type
                    .names
                    .iter()
                    .any(|name| requested.names_explicitly(name));
            if wanted {
                projected.put(attribute.clone());
            }
        }
        Ok(projected)
    }
}

impl<'a, S: Storage> Iterator for SearchStream<'a, S> {
    type Item = OperationResult<SearchEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            if let Some(deadline) = self.deadline {
                if Instant::now() > deadline {
                    self.finished = true;
                    return Some(Err(OperationError::TimeLimitExceeded));
                }
            }
            let id = match self.queue.pop_front() {
                Some(id) => id,
                None => {
                    self.finished = true;
                    return None;
                }
            };
            if self.expand {
                match self.partition.list(id) {
                    Ok(children) => self.queue.extend(children),
                    Err(error) => {
                        self.finished = true;
                        return Some(Err(error));
                    }
                }
            }
            if let Some(candidates) = &self.candidates {
                if !candidates.contains(&id) {
                    continue;
                }
            }
            let stored = match self.partition.get(id) {
                Ok(Some(stored)) => stored,
                Ok(None) => continue,
                Err(error) => {
                    self.finished = true;
                    return Some(Err(error));
                }
            };
            let matched = {
                let schema = match self.partition.schema() {
                    Ok(schema) => schema,
                    Err(error) => {
                        self.finished = true;
                        return Some(Err(error));
                    }
                };
                FilterEvaluator::from(&*schema).evaluate(&self.filter, &stored.entry)
            };
            match matched {
                Ok(false) => continue,
                Ok(true) => {
                    if let Some(limit) = self.size_limit {
                        if self.emitted >= limit {
                            self.finished = true;
                            return Some(Err(OperationError::SizeLimitExceeded(limit)));
                        }
                    }
                    let projected = match self.partition.project(&stored.entry, &self.requested) {
                        Ok(projected) => projected,
                        Err(error) => {
                            self.finished = true;
                            return Some(Err(error));
                        }
                    };
                    self.emitted += 1;
                    return Some(Ok(SearchEntry {
                        id,
                        dn: stored.user_provided_dn,
                        entry: projected,
                    }));
                }
                Err(error) => {
                    self.finished = true;
                    return Some(Err(error));
                }
            }
        }
    }
}
