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

use crate::objects::{AttributeType, LdapSyntax, MatchingRule, ObjectClass, SchemaObject};
use crate::Registries;
use itertools::Itertools;
use model::{OperationError, OperationResult};

/// one registrable schema object, discovered in arbitrary order during a
/// schema load.
#[derive(Debug, Clone)]
pub enum RegistrationItem {
    Syntax(LdapSyntax),
    MatchingRule(MatchingRule),
    AttributeType(AttributeType),
    ObjectClass(ObjectClass),
}

impl RegistrationItem {
    fn oid(&self) -> &str {
        match self {
            RegistrationItem::Syntax(object) => object.oid(),
            RegistrationItem::MatchingRule(object) => object.oid(),
            RegistrationItem::AttributeType(object) => object.oid(),
            RegistrationItem::ObjectClass(object) => object.oid(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RegistrationItem::Syntax(_) => "syntax",
            RegistrationItem::MatchingRule(_) => "matchingRule",
            RegistrationItem::AttributeType(_) => "attributeType",
            RegistrationItem::ObjectClass(_) => "objectClass",
        }
    }

    fn schema_name(&self) -> &str {
        match self {
            RegistrationItem::Syntax(object) => object.schema_name(),
            RegistrationItem::MatchingRule(object) => object.schema_name(),
            RegistrationItem::AttributeType(object) => object.schema_name(),
            RegistrationItem::ObjectClass(object) => object.schema_name(),
        }
    }
}

/// registers a batch of schema objects that may arrive in any order.
/// Objects whose references do not resolve yet are parked on a deferred
/// queue and retried; every full pass over the queue must strictly shrink
/// it, otherwise a reference cycle (or a reference to nothing) exists and
/// the load fails with a diagnostic naming the still-deferred items.
pub struct SchemaLoader;

impl SchemaLoader {
    pub fn load(registries: &mut Registries, items: Vec<RegistrationItem>) -> OperationResult<()> {
        let mut queue = items
            .into_iter()
            .filter(|item| {
                let enabled = registries.is_schema_enabled(item.schema_name());
                if !enabled {
                    log::debug!(
                        "skipping {} {} of disabled schema {}",
                        item.kind(),
                        item.oid(),
                        item.schema_name()
                    );
                }
                enabled
            })
            .collect::<Vec<RegistrationItem>>();

        while !queue.is_empty() {
            let before = queue.len();
            let mut deferred = vec![];
            let mut last_failures = vec![];
            for item in queue {
                match Self::register(registries, item.clone()) {
                    Ok(()) => {}
                    Err(OperationError::NoSuchSchemaObject(missing)) => {
                        log::debug!("deferring {} {}: waiting for {}", item.kind(), item.oid(), missing);
                        last_failures.push(format!("{} {} waits for {}", item.kind(), item.oid(), missing));
                        deferred.push(item);
                    }
                    Err(other) => return Err(other),
                }
            }
            if deferred.len() == before {
                return Err(OperationError::unwilling_to_perform(format!(
                    "schema load did not converge, still deferred: {}",
                    last_failures.iter().join("; ")
                )));
            }
            queue = deferred;
        }
        Ok(())
    }

    fn register(registries: &mut Registries, item: RegistrationItem) -> OperationResult<()> {
        match item {
            RegistrationItem::Syntax(object) => registries.register_syntax(object),
            RegistrationItem::MatchingRule(object) => registries.register_matching_rule(object),
            RegistrationItem::AttributeType(object) => registries.register_attribute_type(object),
            RegistrationItem::ObjectClass(object) => registries.register_object_class(object),
        }
    }
}
