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

use crate::Filter;
use model::{OperationError, OperationResult};

fn parse_error<M: Into<String>>(message: M) -> OperationError {
    OperationError::unwilling_to_perform(format!("malformed filter: {}", message.into()))
}

struct FilterReader<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> FilterReader<'a> {
    fn new(input: &'a str) -> FilterReader<'a> {
        FilterReader {
            input: input.as_bytes(),
            position: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek();
        if byte.is_some() {
            self.position += 1;
        }
        byte
    }

    fn expect(&mut self, expected: u8) -> OperationResult<()> {
        match self.advance() {
            Some(byte) if byte == expected => Ok(()),
            Some(byte) => Err(parse_error(format!(
                "expected {:?} at {}, found {:?}",
                expected as char, self.position, byte as char
            ))),
            None => Err(parse_error("unexpected end of input")),
        }
    }

    fn read_filter(&mut self) -> OperationResult<Filter> {
        self.expect(b'(')?;
        let filter = match self.peek() {
            Some(b'&') => {
                self.advance();
                Filter::And(self.read_children()?)
            }
            Some(b'|') => {
                self.advance();
                Filter::Or(self.read_children()?)
            }
            Some(b'!') => {
                self.advance();
                if self.peek() == Some(b')') {
                    return Err(parse_error("NOT with no child"));
                }
                Filter::Not(Box::new(self.read_filter()?))
            }
            Some(_) => self.read_leaf()?,
            None => return Err(parse_error("unexpected end of input")),
        };
        self.expect(b')')?;
        Ok(filter)
    }

    fn read_children(&mut self) -> OperationResult<Vec<Filter>> {
        let mut children = vec![];
        while self.peek() == Some(b'(') {
            children.push(self.read_filter()?);
        }
        if children.is_empty() {
            return Err(parse_error("composite filter with no children"));
        }
        Ok(children)
    }

    fn read_leaf(&mut self) -> OperationResult<Filter> {
        let attribute = self.read_until(&[b'=', b'>', b'<', b'~', b':'])?;
        match self.peek() {
            Some(b'=') => {
                self.advance();
                self.finish_equality(attribute)
            }
            Some(b'>') => {
                self.advance();
                self.expect(b'=')?;
                Ok(Filter::GreaterOrEqual(attribute, self.read_value()?))
            }
            Some(b'<') => {
                self.advance();
                self.expect(b'=')?;
                Ok(Filter::LessOrEqual(attribute, self.read_value()?))
            }
            Some(b'~') => {
                self.advance();
                self.expect(b'=')?;
                Ok(Filter::Approximate(attribute, self.read_value()?))
            }
            Some(b':') => {
                self.advance();
                let mut rule = None;
                if self.peek() != Some(b'=') {
                    rule = Some(self.read_until(&[b':'])?);
                    self.expect(b':')?;
                }
                self.expect(b'=')?;
                Ok(Filter::Extensible {
                    attribute: if attribute.is_empty() { None } else { Some(attribute) },
                    rule,
                    value: self.read_value()?,
                })
            }
            _ => Err(parse_error("leaf without an assertion operator")),
        }
    }

    /// after `attr=`: presence, plain equality or a substring pattern.
    fn finish_equality(&mut self, attribute: String) -> OperationResult<Filter> {
        let mut parts = vec![String::new()];
        loop {
            match self.peek() {
                Some(b')') | None => break,
                Some(b'*') => {
                    self.advance();
                    parts.push(String::new());
                }
                Some(_) => {
                    let chunk = self.read_value_chunk()?;
                    parts
                        .last_mut()
                        .map(|last| last.push_str(&chunk))
                        .ok_or_else(|| parse_error("empty pattern"))?;
                }
            }
        }
        if parts.len() == 1 {
            let value = parts.remove(0);
            if value.is_empty() {
                return Err(parse_error(format!("empty assertion value for {}", attribute)));
            }
            return Ok(Filter::Equality(attribute, value));
        }
        if parts.len() == 2 && parts[0].is_empty() && parts[1].is_empty() {
            return Ok(Filter::Present(attribute));
        }
        let last_part = parts.pop().map(|part| if part.is_empty() { None } else { Some(part) });
        let first = parts.remove(0);
        Ok(Filter::Substring {
            attribute,
            initial: if first.is_empty() { None } else { Some(first) },
            any: parts.into_iter().filter(|part| !part.is_empty()).collect(),
            last: last_part.flatten(),
        })
    }

    fn read_value(&mut self) -> OperationResult<String> {
        let mut value = String::new();
        loop {
            match self.peek() {
                Some(b')') | None => break,
                Some(_) => value.push_str(&self.read_value_chunk()?),
            }
        }
        if value.is_empty() {
            return Err(parse_error("empty assertion value"));
        }
        Ok(value)
    }

    /// one run of value bytes up to a structural character, with `\xx` hex
    /// escapes resolved.
    fn read_value_chunk(&mut self) -> OperationResult<String> {
        let mut bytes = vec![];
        loop {
            match self.peek() {
                Some(b')') | Some(b'*') | None => break,
                Some(b'\\') => {
                    self.advance();
                    let high = self.advance().and_then(|byte| (byte as char).to_digit(16));
                    let low = self.advance().and_then(|byte| (byte as char).to_digit(16));
                    match (high, low) {
                        (Some(high), Some(low)) => bytes.push((high * 16 + low) as u8),
                        _ => return Err(parse_error("broken hex escape")),
                    }
                }
                Some(byte) => {
                    self.advance();
                    bytes.push(byte);
                }
            }
        }
        String::from_utf8(bytes).map_err(|_| parse_error("assertion value is not utf-8"))
    }

    fn read_until(&mut self, stops: &[u8]) -> OperationResult<String> {
        let mut out = String::new();
        loop {
            match self.peek() {
                None | Some(b')') | Some(b'(') => break,
                Some(byte) if stops.contains(&byte) => break,
                Some(byte) => {
                    self.advance();
                    out.push(byte as char);
                }
            }
        }
        Ok(out.trim().to_owned())
    }
}

/// reads an RFC 4515 filter string into a `Filter` tree.
pub fn parse_filter(input: &str) -> OperationResult<Filter> {
    let mut reader = FilterReader::new(input.trim());
    let filter = reader.read_filter()?;
    if reader.peek().is_some() {
        return Err(parse_error("trailing input after filter"));
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn presence() {
        assert_eq!(parse_filter("(objectClass=*)").unwrap(), Filter::present("objectClass"));
    }

    #[test]
    fn equality() {
        assert_eq!(parse_filter("(cn=John Doe)").unwrap(), Filter::equality("cn", "John Doe"));
    }

    #[test]
    fn composite_tree() {
        let filter = parse_filter("(&(objectClass=person)(|(cn=a)(cn=b))(!(sn=c)))").unwrap();
        match filter {
            Filter::And(children) => {
                assert_eq!(children.len(), 3);
                assert!(matches!(children[1], Filter::Or(_)));
                assert!(matches!(children[2], Filter::Not(_)));
            }
            other => panic!("expected and, got {:?}", other),
        }
    }

    #[test]
    fn substring_components() {
        let filter = parse_filter("(cn=ab*cd*ef)").unwrap();
        assert_eq!(
            filter,
            Filter::Substring {
                attribute: "cn".to_owned(),
                initial: Some("ab".to_owned()),
                any: vec!["cd".to_owned()],
                last: Some("ef".to_owned()),
            }
        );
    }

    #[test]
    fn substring_with_open_ends() {
        let filter = parse_filter("(cn=*middle*)").unwrap();
        assert_eq!(
            filter,
            Filter::Substring {
                attribute: "cn".to_owned(),
                initial: None,
                any: vec!["middle".to_owned()],
                last: None,
            }
        );
    }

    #[test]
    fn ordering_and_approx() {
        assert_eq!(
            parse_filter("(uid>=100)").unwrap(),
            Filter::GreaterOrEqual("uid".to_owned(), "100".to_owned())
        );
        assert_eq!(
            parse_filter("(uid<=200)").unwrap(),
            Filter::LessOrEqual("uid".to_owned(), "200".to_owned())
        );
        assert_eq!(
            parse_filter("(cn~=jon)").unwrap(),
            Filter::Approximate("cn".to_owned(), "jon".to_owned())
        );
    }

    #[test]
    fn extensible_with_rule() {
        assert_eq!(
            parse_filter("(cn:caseExactMatch:=John)").unwrap(),
            Filter::Extensible {
                attribute: Some("cn".to_owned()),
                rule: Some("caseExactMatch".to_owned()),
                value: "John".to_owned(),
            }
        );
    }

    #[test]
    fn escaped_bytes_are_resolved() {
        assert_eq!(
            parse_filter(r"(cn=a\2ab)").unwrap(),
            Filter::equality("cn", "a*b")
        );
        assert_eq!(
            parse_filter(r"(cn=\28paren\29)").unwrap(),
            Filter::equality("cn", "(paren)")
        );
    }

    #[rstest]
    #[case("")]
    #[case("cn=x")]
    #[case("(cn=x")]
    #[case("(&)")]
    #[case("(!)")]
    #[case("(cn=)")]
    #[case("(cn=x)(sn=y)")]
    fn malformed_filters_are_rejected(#[case] input: &str) {
        assert!(parse_filter(input).is_err(), "{:?} should not parse", input);
    }

    #[test]
    fn round_trip_through_display() {
        let source = "(&(objectClass=person)(cn=ab*cd))";
        let filter = parse_filter(source).unwrap();
        assert_eq!(parse_filter(&filter.to_string()).unwrap(), filter);
    }
}
