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

//! well-known OIDs used across the engine. Only the subset the bootstrap
//! schema installs; user schemas bring their own.

pub mod syntax {
    pub const BOOLEAN: &str = "1.3.6.1.4.1.1466.115.121.1.7";
    pub const DN: &str = "1.3.6.1.4.1.1466.115.121.1.12";
    pub const DIRECTORY_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.15";
    pub const GENERALIZED_TIME: &str = "1.3.6.1.4.1.1466.115.121.1.24";
    pub const IA5_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.26";
    pub const INTEGER: &str = "1.3.6.1.4.1.1466.115.121.1.27";
    pub const NUMERIC_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.36";
    pub const OID: &str = "1.3.6.1.4.1.1466.115.121.1.38";
    pub const OCTET_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.40";
    pub const TELEPHONE_NUMBER: &str = "1.3.6.1.4.1.1466.115.121.1.50";
    pub const SUBSTRING_ASSERTION: &str = "1.3.6.1.4.1.1466.115.121.1.58";
}

pub mod matching_rule {
    pub const OBJECT_IDENTIFIER: &str = "2.5.13.0";
    pub const DISTINGUISHED_NAME: &str = "2.5.13.1";
    pub const CASE_IGNORE: &str = "2.5.13.2";
    pub const CASE_IGNORE_ORDERING: &str = "2.5.13.3";
    pub const CASE_IGNORE_SUBSTRINGS: &str = "2.5.13.4";
    pub const CASE_EXACT: &str = "2.5.13.5";
    pub const NUMERIC_STRING: &str = "2.5.13.8";
    pub const BOOLEAN: &str = "2.5.13.13";
    pub const INTEGER: &str = "2.5.13.14";
    pub const INTEGER_ORDERING: &str = "2.5.13.15";
    pub const OCTET_STRING: &str = "2.5.13.17";
    pub const TELEPHONE_NUMBER: &str = "2.5.13.20";
    pub const GENERALIZED_TIME: &str = "2.5.13.27";
    pub const CASE_EXACT_IA5: &str = "1.3.6.1.4.1.1466.109.114.1";
    pub const CASE_IGNORE_IA5: &str = "1.3.6.1.4.1.1466.109.114.2";
}

pub mod attribute {
    pub const OBJECT_CLASS: &str = "2.5.4.0";
    pub const ALIASED_OBJECT_NAME: &str = "2.5.4.1";
    pub const CN: &str = "2.5.4.3";
    pub const SN: &str = "2.5.4.4";
    pub const C: &str = "2.5.4.6";
    pub const L: &str = "2.5.4.7";
    pub const ST: &str = "2.5.4.8";
    pub const STREET: &str = "2.5.4.9";
    pub const O: &str = "2.5.4.10";
    pub const OU: &str = "2.5.4.11";
    pub const TITLE: &str = "2.5.4.12";
    pub const DESCRIPTION: &str = "2.5.4.13";
    pub const SEE_ALSO: &str = "2.5.4.34";
    pub const USER_PASSWORD: &str = "2.5.4.35";
    pub const NAME: &str = "2.5.4.41";
    pub const GIVEN_NAME: &str = "2.5.4.42";
    pub const TELEPHONE_NUMBER: &str = "2.5.4.20";
    pub const UID: &str = "0.9.2342.19200300.100.1.1";
    pub const MAIL: &str = "0.9.2342.19200300.100.1.3";
    pub const DC: &str = "0.9.2342.19200300.100.1.25";
    pub const CREATORS_NAME: &str = "2.5.18.3";
    pub const CREATE_TIMESTAMP: &str = "2.5.18.1";
    pub const MODIFIERS_NAME: &str = "2.5.18.4";
    pub const MODIFY_TIMESTAMP: &str = "2.5.18.2";
    pub const ENTRY_UUID: &str = "1.3.6.1.1.16.4";
}

pub mod object_class {
    pub const TOP: &str = "2.5.6.0";
    pub const ALIAS: &str = "2.5.6.1";
    pub const COUNTRY: &str = "2.5.6.2";
    pub const ORGANIZATION: &str = "2.5.6.4";
    pub const ORGANIZATIONAL_UNIT: &str = "2.5.6.5";
    pub const PERSON: &str = "2.5.6.6";
    pub const ORGANIZATIONAL_PERSON: &str = "2.5.6.7";
    pub const INET_ORG_PERSON: &str = "2.16.840.1.113730.3.2.2";
    pub const EXTENSIBLE_OBJECT: &str = "1.3.6.1.4.1.1466.101.120.111";
    pub const SUBSCHEMA: &str = "2.5.20.1";
    pub const DOMAIN: &str = "0.9.2342.19200300.100.4.13";
}

/// well-known names that the engine itself keys on.
pub mod name {
    pub const OBJECT_CLASS: &str = "objectClass";
    pub const ALIASED_OBJECT_NAME: &str = "aliasedObjectName";
    pub const ALIAS: &str = "alias";
    pub const TOP: &str = "top";
    pub const EXTENSIBLE_OBJECT: &str = "extensibleObject";
    pub const NAME_ATTRIBUTE: &str = "name";
}
