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

use std::fmt::{self, Display, Formatter};

pub type OperationResult<T> = Result<T, OperationError>;

/// every way a directory operation can fail. Validation errors abort the
/// single operation with no persisted side effect; `Io` and `CorruptStore`
/// poison the partition writer.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationError {
    /// MUST missing, disallowed attribute present, structural rule broken
    /// or single-value cardinality violated
    SchemaViolation(String),
    /// a value failed its syntax checker
    InvalidAttributeSyntax { attribute: String, value: String },
    /// attribute id unknown and the entry is not extensibleObject
    InvalidAttributeIdentifier(String),
    /// target entry missing
    NoSuchObject(String),
    /// target attribute missing
    NoSuchAttribute(String),
    /// DN already bound
    EntryAlreadyExists(String),
    /// alias cycle, chain or target outside the suffix
    AliasProblem(String),
    /// alias target does not resolve
    AliasDerefProblem(String),
    /// RDN attribute missing from the entry, schema-subtree naming broken
    NamingViolation(String),
    /// delete with live dependents, REPLACE on a schema subentry and other
    /// refused operations
    UnwillingToPerform(String),
    /// search emitted the size limit worth of entries and stopped
    SizeLimitExceeded(usize),
    /// search ran past its wall-clock limit
    TimeLimitExceeded,
    /// OID collision on schema registration
    NonUniqueOid(String),
    /// schema name or OID did not resolve
    NoSuchSchemaObject(String),
    /// record-manager failure, fatal for the partition
    IoError(String),
    /// persisted image can not be trusted
    CorruptStore(String),
}

impl OperationError {
    pub fn schema_violation<M: Into<String>>(message: M) -> OperationError {
        OperationError::SchemaViolation(message.into())
    }

    pub fn invalid_syntax<A: Into<String>, V: Into<String>>(attribute: A, value: V) -> OperationError {
        OperationError::InvalidAttributeSyntax {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn unknown_attribute<A: Into<String>>(attribute: A) -> OperationError {
        OperationError::InvalidAttributeIdentifier(attribute.into())
    }

    pub fn no_such_object<D: Into<String>>(dn: D) -> OperationError {
        OperationError::NoSuchObject(dn.into())
    }

    pub fn entry_already_exists<D: Into<String>>(dn: D) -> OperationError {
        OperationError::EntryAlreadyExists(dn.into())
    }

    pub fn alias_problem<M: Into<String>>(message: M) -> OperationError {
        OperationError::AliasProblem(message.into())
    }

    pub fn alias_deref_problem<M: Into<String>>(message: M) -> OperationError {
        OperationError::AliasDerefProblem(message.into())
    }

    pub fn naming_violation<M: Into<String>>(message: M) -> OperationError {
        OperationError::NamingViolation(message.into())
    }

    pub fn unwilling_to_perform<M: Into<String>>(message: M) -> OperationError {
        OperationError::UnwillingToPerform(message.into())
    }

    pub fn non_unique_oid<O: Into<String>>(oid: O) -> OperationError {
        OperationError::NonUniqueOid(oid.into())
    }

    pub fn no_such_schema_object<N: Into<String>>(name: N) -> OperationError {
        OperationError::NoSuchSchemaObject(name.into())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, OperationError::IoError(_) | OperationError::CorruptStore(_))
    }
}

impl Display for OperationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OperationError::SchemaViolation(message) => write!(f, "schema violation: {}", message),
            OperationError::InvalidAttributeSyntax { attribute, value } => {
                write!(f, "value {:?} does not conform to the syntax of {}", value, attribute)
            }
            OperationError::InvalidAttributeIdentifier(attribute) => {
                write!(f, "attribute {} is not registered in the schema", attribute)
            }
            OperationError::NoSuchObject(dn) => write!(f, "entry {} does not exist", dn),
            OperationError::NoSuchAttribute(attribute) => write!(f, "attribute {} is not present", attribute),
            OperationError::EntryAlreadyExists(dn) => write!(f, "entry {} already exists", dn),
            OperationError::AliasProblem(message) => write!(f, "alias problem: {}", message),
            OperationError::AliasDerefProblem(message) => write!(f, "alias dereference problem: {}", message),
            OperationError::NamingViolation(message) => write!(f, "naming violation: {}", message),
            OperationError::UnwillingToPerform(message) => write!(f, "unwilling to perform: {}", message),
            OperationError::SizeLimitExceeded(limit) => write!(f, "size limit of {} entries exceeded", limit),
            OperationError::TimeLimitExceeded => write!(f, "time limit exceeded"),
            OperationError::NonUniqueOid(oid) => write!(f, "oid {} is already registered", oid),
            OperationError::NoSuchSchemaObject(name) => write!(f, "schema object {} does not exist", name),
            OperationError::IoError(cause) => write!(f, "io failure: {}", cause),
            OperationError::CorruptStore(cause) => write!(f, "corrupt store: {}", cause),
        }
    }
}
