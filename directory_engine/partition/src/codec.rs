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

use binary::{repr::Datum, Binary};
use model::{AttributeValue, Entry, OperationError, OperationResult};

/// an entry as it sits in the master table: both DN forms plus the
/// attribute body.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub id: u64,
    pub user_provided_dn: String,
    pub normalized_dn: String,
    pub entry: Entry,
}

/// master row layout: the two DN strings, the attribute count, then per
/// attribute its display id, value count and tagged values. Text and byte
/// values keep their own datum tags so the reader restores the exact
/// variant.
pub fn encode_entry(stored: &StoredEntry) -> Binary {
    let mut datums = vec![
        Datum::from_u64(stored.id),
        Datum::from_string(stored.user_provided_dn.clone()),
        Datum::from_string(stored.normalized_dn.clone()),
        Datum::from_u64(stored.entry.len() as u64),
    ];
    for attribute in stored.entry.attributes() {
        datums.push(Datum::from_string(attribute.id()));
        datums.push(Datum::from_u64(attribute.len() as u64));
        for value in attribute.values() {
            match value {
                AttributeValue::Text(text) => datums.push(Datum::from_string(text.clone())),
                AttributeValue::Bytes(bytes) => datums.push(Datum::from_bytes(bytes.clone())),
            }
        }
    }
    Binary::pack(&datums)
}

pub fn decode_entry(row: &Binary) -> OperationResult<StoredEntry> {
    let datums = row.unpack();
    let mut cursor = datums.into_iter();
    let corrupt = || OperationError::CorruptStore("truncated master row".to_owned());

    let id = cursor.next().ok_or_else(corrupt)?.as_u64();
    let user_provided_dn = cursor.next().ok_or_else(corrupt)?.as_string();
    let normalized_dn = cursor.next().ok_or_else(corrupt)?.as_string();
    let attribute_count = cursor.next().ok_or_else(corrupt)?.as_u64();

    let mut entry = Entry::new();
    for _ in 0..attribute_count {
        let attribute_id = cursor.next().ok_or_else(corrupt)?.as_string();
        let value_count = cursor.next().ok_or_else(corrupt)?.as_u64();
        for _ in 0..value_count {
            let value = match cursor.next().ok_or_else(corrupt)? {
                Datum::String(text) => AttributeValue::Text(text),
                Datum::Bytes(bytes) => AttributeValue::Bytes(bytes),
                Datum::UInt64(_) => return Err(corrupt()),
            };
            entry.add_value(&attribute_id, value);
        }
    }
    Ok(StoredEntry {
        id,
        user_provided_dn,
        normalized_dn,
        entry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_values_and_dns() {
        let mut entry = Entry::new();
        entry.add_value("objectClass", AttributeValue::from("top"));
        entry.add_value("objectClass", AttributeValue::from("person"));
        entry.add_value("cn", AttributeValue::from("John"));
        entry.add_value("userPassword", AttributeValue::bytes(vec![1, 2, 3]));

        let stored = StoredEntry {
            id: 42,
            user_provided_dn: "CN=John,OU=Users,OU=System".to_owned(),
            normalized_dn: "2.5.4.3=john,2.5.4.11=users,2.5.4.11=system".to_owned(),
            entry,
        };
        let decoded = decode_entry(&encode_entry(&stored)).unwrap();
        assert_eq!(decoded, stored);
    }

    #[test]
    fn binary_values_keep_their_variant() {
        let mut entry = Entry::new();
        entry.add_value("objectClass", AttributeValue::from("top"));
        entry.add_value("userPassword", AttributeValue::bytes(vec![0xFF, 0x00]));
        let stored = StoredEntry {
            id: 1,
            user_provided_dn: "ou=x".to_owned(),
            normalized_dn: "2.5.4.11=x".to_owned(),
            entry,
        };
        let decoded = decode_entry(&encode_entry(&stored)).unwrap();
        assert_eq!(
            decoded.entry.get("userPassword").unwrap().values(),
            &[AttributeValue::bytes(vec![0xFF, 0x00])]
        );
    }
}
