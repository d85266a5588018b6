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

use crate::{invalid_dn, Ava, Dn, Rdn};
use model::OperationResult;

fn is_descriptor(attribute: &str) -> bool {
    let mut chars = attribute.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
}

fn is_numeric_oid(attribute: &str) -> bool {
    !attribute.is_empty()
        && attribute.split('.').all(|arc| !arc.is_empty() && arc.chars().all(|ch| ch.is_ascii_digit()))
        && attribute.contains('.')
}

fn hex_value(ch: char) -> Option<u8> {
    ch.to_digit(16).map(|digit| digit as u8)
}

struct DnReader<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> DnReader<'a> {
    fn new(input: &'a str) -> DnReader<'a> {
        DnReader {
            chars: input.chars().peekable(),
        }
    }

    fn skip_spaces(&mut self) {
        while self.chars.peek() == Some(&' ') {
            self.chars.next();
        }
    }

    fn read_attribute(&mut self) -> OperationResult<String> {
        self.skip_spaces();
        let mut attribute = String::new();
        loop {
            match self.chars.peek() {
                Some('=') => break,
                Some(',') | Some('+') | None => {
                    return Err(invalid_dn(format!("attribute {:?} has no value part", attribute)))
                }
                Some(_) => attribute.push(self.chars.next().unwrap()),
            }
        }
        self.chars.next();
        let attribute = attribute.trim_end().to_owned();
        if !is_descriptor(&attribute) && !is_numeric_oid(&attribute) {
            return Err(invalid_dn(format!("{:?} is not an attribute descriptor or oid", attribute)));
        }
        Ok(attribute)
    }

    /// reads an attribute value until an unescaped separator, resolving
    /// backslash escapes and hex pairs. Returns the value and the separator
    /// that ended it.
    fn read_value(&mut self) -> OperationResult<(String, Option<char>)> {
        self.skip_spaces();
        let mut value = String::new();
        let mut pending_bytes: Vec<u8> = vec![];
        let mut flush = |value: &mut String, pending: &mut Vec<u8>| -> OperationResult<()> {
            if !pending.is_empty() {
                match String::from_utf8(pending.clone()) {
                    Ok(decoded) => value.push_str(&decoded),
                    Err(_) => return Err(invalid_dn("hex escapes do not decode as utf-8")),
                }
                pending.clear();
            }
            Ok(())
        };
        let terminator = loop {
            match self.chars.next() {
                None => break None,
                Some(',') => break Some(','),
                Some('+') => break Some('+'),
                Some('\\') => match self.chars.next() {
                    None => return Err(invalid_dn("dangling escape at end of dn")),
                    Some(escaped) => match hex_value(escaped) {
                        Some(high) => match self.chars.next().and_then(hex_value) {
                            Some(low) => pending_bytes.push(high * 16 + low),
                            None => return Err(invalid_dn("truncated hex escape")),
                        },
                        None => {
                            flush(&mut value, &mut pending_bytes)?;
                            value.push(escaped);
                        }
                    },
                },
                Some(ch) => {
                    flush(&mut value, &mut pending_bytes)?;
                    value.push(ch);
                }
            }
        };
        flush(&mut value, &mut pending_bytes)?;
        Ok((value.trim_end().to_owned(), terminator))
    }
}

/// reads an RFC 4514 string into a `Dn`, keeping the input as the
/// user-provided form. The empty string parses to the root DN.
pub fn parse_dn(input: &str) -> OperationResult<Dn> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Dn::root());
    }

    let mut reader = DnReader::new(trimmed);
    let mut rdns = vec![];
    let mut avas = vec![];
    loop {
        let attribute = reader.read_attribute()?;
        let (value, terminator) = reader.read_value()?;
        if value.is_empty() {
            return Err(invalid_dn(format!("attribute {} has an empty value", attribute)));
        }
        avas.push(Ava::new(attribute, value));
        match terminator {
            Some('+') => continue,
            Some(_) => {
                rdns.push(Rdn::new(std::mem::take(&mut avas)));
            }
            None => {
                rdns.push(Rdn::new(std::mem::take(&mut avas)));
                break;
            }
        }
    }
    Ok(Dn::from_parts(trimmed.to_owned(), rdns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn single_rdn() {
        let dn = parse_dn("ou=system").unwrap();
        assert_eq!(dn.size(), 1);
        assert_eq!(dn.rdn().unwrap().value_of("ou"), Some("system"));
    }

    #[test]
    fn rdn_order_is_leftmost_first() {
        let dn = parse_dn("cn=x,ou=users,ou=system").unwrap();
        assert_eq!(dn.rdns()[0].value_of("cn"), Some("x"));
        assert_eq!(dn.rdns()[2].value_of("ou"), Some("system"));
    }

    #[test]
    fn multi_valued_rdn() {
        let dn = parse_dn("cn=bob+ou=eng,ou=system").unwrap();
        assert_eq!(dn.rdns()[0].avas().len(), 2);
        assert_eq!(dn.rdns()[0].value_of("ou"), Some("eng"));
    }

    #[test]
    fn escaped_comma_stays_in_value() {
        let dn = parse_dn(r"cn=Doe\, John,ou=system").unwrap();
        assert_eq!(dn.size(), 2);
        assert_eq!(dn.rdn().unwrap().value_of("cn"), Some("Doe, John"));
    }

    #[test]
    fn hex_escape_decodes() {
        let dn = parse_dn(r"cn=a\2Cb,ou=system").unwrap();
        assert_eq!(dn.rdn().unwrap().value_of("cn"), Some("a,b"));
    }

    #[test]
    fn spaces_around_separators_are_ignored() {
        let dn = parse_dn("cn=x, ou=users , ou=system").unwrap();
        assert_eq!(dn.rdns()[1].value_of("ou"), Some("users"));
    }

    #[test]
    fn numeric_oid_attribute_is_accepted() {
        let dn = parse_dn("2.5.4.3=x,ou=system").unwrap();
        assert_eq!(dn.rdn().unwrap().value_of("2.5.4.3"), Some("x"));
    }

    #[test]
    fn empty_string_is_root() {
        let dn = parse_dn("").unwrap();
        assert!(dn.is_root());
    }

    #[rstest]
    #[case("ou")]
    #[case("=x")]
    #[case("ou=")]
    #[case("1ou=x")]
    #[case(r"cn=x\")]
    fn malformed_dns_are_rejected(#[case] input: &str) {
        assert!(parse_dn(input).is_err());
    }

    #[test]
    fn user_provided_form_is_preserved() {
        let dn = parse_dn("OU=Users,OU=System").unwrap();
        assert_eq!(dn.user_provided(), "OU=Users,OU=System");
        assert_eq!(dn.to_string(), "OU=Users,OU=System");
    }
}
