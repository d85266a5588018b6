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

use model::AttributeValue;
use naming::Dn;

/// value-level conformance test bound to one syntax OID. Checkers are
/// pure and shared behind `Arc`.
pub trait SyntaxChecker: Send + Sync {
    fn is_valid(&self, value: &AttributeValue) -> bool;

    /// accept-all checkers are skipped on the validation hot path.
    fn accepts_all(&self) -> bool {
        false
    }
}

/// octet string and every other syntax without value constraints.
#[derive(Debug, Default)]
pub struct AcceptAllChecker;

impl SyntaxChecker for AcceptAllChecker {
    fn is_valid(&self, _value: &AttributeValue) -> bool {
        true
    }

    fn accepts_all(&self) -> bool {
        true
    }
}

/// Directory String: any non-empty UTF-8 text.
#[derive(Debug, Default)]
pub struct DirectoryStringChecker;

impl SyntaxChecker for DirectoryStringChecker {
    fn is_valid(&self, value: &AttributeValue) -> bool {
        match value {
            AttributeValue::Text(text) => !text.is_empty(),
            AttributeValue::Bytes(bytes) => std::str::from_utf8(bytes).map(|text| !text.is_empty()).unwrap_or(false),
        }
    }
}

/// IA5 String: ASCII only.
#[derive(Debug, Default)]
pub struct Ia5StringChecker;

impl SyntaxChecker for Ia5StringChecker {
    fn is_valid(&self, value: &AttributeValue) -> bool {
        value.as_raw_bytes().iter().all(u8::is_ascii)
    }
}

#[derive(Debug, Default)]
pub struct IntegerChecker;

impl SyntaxChecker for IntegerChecker {
    fn is_valid(&self, value: &AttributeValue) -> bool {
        match value.as_text() {
            None => false,
            Some(text) => {
                let digits = text.strip_prefix('-').unwrap_or(text);
                !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit())
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct BooleanChecker;

impl SyntaxChecker for BooleanChecker {
    fn is_valid(&self, value: &AttributeValue) -> bool {
        matches!(value.as_text(), Some("TRUE") | Some("FALSE"))
    }
}

#[derive(Debug, Default)]
pub struct NumericStringChecker;

impl SyntaxChecker for NumericStringChecker {
    fn is_valid(&self, value: &AttributeValue) -> bool {
        match value.as_text() {
            None => false,
            Some(text) => !text.is_empty() && text.chars().all(|ch| ch.is_ascii_digit() || ch == ' '),
        }
    }
}

/// numeric OID or descriptor form.
#[derive(Debug, Default)]
pub struct OidChecker;

impl SyntaxChecker for OidChecker {
    fn is_valid(&self, value: &AttributeValue) -> bool {
        match value.as_text() {
            None => false,
            Some(text) if text.is_empty() => false,
            Some(text) => {
                let numeric = text.split('.').all(|arc| !arc.is_empty() && arc.chars().all(|ch| ch.is_ascii_digit()));
                let descriptor = text.chars().next().map(|ch| ch.is_ascii_alphabetic()).unwrap_or(false)
                    && text.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-');
                numeric || descriptor
            }
        }
    }
}

/// the value must read as an RFC 4514 DN.
#[derive(Debug, Default)]
pub struct DnChecker;

impl SyntaxChecker for DnChecker {
    fn is_valid(&self, value: &AttributeValue) -> bool {
        match value.as_text() {
            None => false,
            Some(text) => Dn::parse(text).is_ok(),
        }
    }
}

/// `YYYYMMDDHHMMSSZ` and the fractional / offset forms of RFC 4517.
#[derive(Debug, Default)]
pub struct GeneralizedTimeChecker;

impl SyntaxChecker for GeneralizedTimeChecker {
    fn is_valid(&self, value: &AttributeValue) -> bool {
        let text = match value.as_text() {
            Some(text) => text,
            None => return false,
        };
        if text.len() < 11 {
            return false;
        }
        let (digits, rest) = text.split_at(10);
        if !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return false;
        }
        rest.chars().all(|ch| ch.is_ascii_digit() || ch == '.' || ch == ',' || ch == 'Z' || ch == '+' || ch == '-')
            && (rest.ends_with('Z') || rest.contains('+') || rest.contains('-'))
    }
}

#[derive(Debug, Default)]
pub struct TelephoneNumberChecker;

impl SyntaxChecker for TelephoneNumberChecker {
    fn is_valid(&self, value: &AttributeValue) -> bool {
        match value.as_text() {
            None => false,
            Some(text) => {
                !text.is_empty()
                    && text
                        .chars()
                        .all(|ch| ch.is_ascii_digit() || matches!(ch, '+' | '-' | ' ' | '(' | ')' | '.'))
            }
        }
    }
}
