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

mod entry;
mod errors;

pub use entry::{Attribute, AttributeValue, Entry};
pub use errors::{OperationError, OperationResult};

/// search scope of a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// only the base entry
    Object,
    /// immediate children of the base entry
    OneLevel,
    /// base entry and all descendants
    Subtree,
}

/// a single client-requested change applied by `modify`.
#[derive(Debug, Clone, PartialEq)]
pub enum Modification {
    Add(String, Vec<AttributeValue>),
    Remove(String, Vec<AttributeValue>),
    Replace(String, Vec<AttributeValue>),
}

impl Modification {
    pub fn attribute_id(&self) -> &str {
        match self {
            Modification::Add(id, _) => id,
            Modification::Remove(id, _) => id,
            Modification::Replace(id, _) => id,
        }
    }
}

/// the attribute-request list of a search: `*` selects all user attributes,
/// `+` all operational attributes, `1.1` none. An empty request list reads
/// as `*`; `1.1` combined with any real attribute id is discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestedAttributes {
    all_user: bool,
    all_operational: bool,
    no_attributes: bool,
    explicit: Vec<String>,
}

impl RequestedAttributes {
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> RequestedAttributes {
        let mut all_user = false;
        let mut all_operational = false;
        let mut no_attributes = false;
        let mut explicit = vec![];
        for token in tokens {
            match token.as_ref() {
                "*" => all_user = true,
                "+" => all_operational = true,
                "1.1" => no_attributes = true,
                id => explicit.push(id.to_owned()),
            }
        }
        if tokens.is_empty() {
            all_user = true;
        }
        if no_attributes && (all_user || all_operational || !explicit.is_empty()) {
            no_attributes = false;
            if !all_user && !all_operational && explicit.is_empty() {
                all_user = true;
            }
        }
        RequestedAttributes {
            all_user,
            all_operational,
            no_attributes,
            explicit,
        }
    }

    pub fn all_user(&self) -> bool {
        self.all_user
    }

    pub fn all_operational(&self) -> bool {
        self.all_operational
    }

    pub fn no_attributes(&self) -> bool {
        self.no_attributes
    }

    pub fn explicit(&self) -> &[String] {
        &self.explicit
    }

    pub fn names_explicitly(&self, attribute_id: &str) -> bool {
        self.explicit.iter().any(|id| id.eq_ignore_ascii_case(attribute_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(test)]
    mod requested_attributes {
        use super::*;

        #[test]
        fn empty_list_selects_all_user_attributes() {
            let requested = RequestedAttributes::from_tokens::<&str>(&[]);
            assert!(requested.all_user());
            assert!(!requested.all_operational());
        }

        #[test]
        fn no_attributes_token_alone() {
            let requested = RequestedAttributes::from_tokens(&["1.1"]);
            assert!(requested.no_attributes());
            assert!(!requested.all_user());
        }

        #[test]
        fn no_attributes_token_is_discarded_next_to_real_ids() {
            let requested = RequestedAttributes::from_tokens(&["1.1", "cn"]);
            assert!(!requested.no_attributes());
            assert!(requested.names_explicitly("CN"));
        }

        #[test]
        fn star_and_plus_combine() {
            let requested = RequestedAttributes::from_tokens(&["*", "+"]);
            assert!(requested.all_user());
            assert!(requested.all_operational());
        }
    }
}
