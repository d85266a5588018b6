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

/// token-level reader shared by the per-kind description parsers. The
/// description grammar is flat enough that a peekable token stream covers
/// all of it: parentheses, quoted strings, `$`-separated oid lists and bare
/// keywords.
pub(crate) struct DescriptionReader {
    tokens: Vec<String>,
    position: usize,
}

#[derive(Debug)]
pub(crate) struct ReadError;

fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = vec![];
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            ch if ch.is_whitespace() => continue,
            '(' | ')' | '$' => tokens.push(ch.to_string()),
            '\'' => {
                let mut literal = String::from("'");
                for inner in chars.by_ref() {
                    literal.push(inner);
                    if inner == '\'' {
                        break;
                    }
                }
                tokens.push(literal);
            }
            first => {
                let mut word = String::new();
                word.push(first);
                while let Some(next) = chars.peek() {
                    if next.is_whitespace() || *next == '(' || *next == ')' || *next == '$' {
                        break;
                    }
                    word.push(chars.next().unwrap());
                }
                tokens.push(word);
            }
        }
    }
    tokens
}

impl DescriptionReader {
    /// tokenizes and consumes the opening parenthesis.
    pub(crate) fn new(input: &str) -> Result<DescriptionReader, ReadError> {
        let tokens = tokenize(input);
        let mut reader = DescriptionReader { tokens, position: 0 };
        match reader.next_token() {
            Some(token) if token == "(" => Ok(reader),
            _ => Err(ReadError),
        }
    }

    fn next_token(&mut self) -> Option<String> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.position).map(String::as_str)
    }

    pub(crate) fn read_oid(&mut self) -> Result<String, ReadError> {
        match self.next_token() {
            Some(token) if token != "(" && token != ")" && token != "$" => {
                Ok(token.trim_matches('\'').to_owned())
            }
            _ => Err(ReadError),
        }
    }

    /// `SYNTAX` values may carry a `{len}` bound; the bound is dropped.
    pub(crate) fn read_noid_len(&mut self) -> Result<String, ReadError> {
        let oid = self.read_oid()?;
        match oid.find('{') {
            Some(index) => Ok(oid[..index].to_owned()),
            None => Ok(oid),
        }
    }

    /// a keyword between the oid and the closing parenthesis, or `None`
    /// when the closing parenthesis is next.
    pub(crate) fn read_keyword(&mut self) -> Option<String> {
        match self.peek() {
            Some(")") | None => None,
            Some(_) => self.next_token(),
        }
    }

    pub(crate) fn read_qdstring(&mut self) -> Result<String, ReadError> {
        match self.next_token() {
            Some(token) if token.starts_with('\'') && token.ends_with('\'') && token.len() >= 2 => {
                Ok(token[1..token.len() - 1].to_owned())
            }
            _ => Err(ReadError),
        }
    }

    /// `NAME 'cn'` or `NAME ( 'cn' 'commonName' )`
    pub(crate) fn read_qdescrs(&mut self) -> Result<Vec<String>, ReadError> {
        if self.peek() == Some("(") {
            self.next_token();
            let mut names = vec![];
            loop {
                match self.peek() {
                    Some(")") => {
                        self.next_token();
                        return Ok(names);
                    }
                    Some(_) => names.push(self.read_qdstring()?),
                    None => return Err(ReadError),
                }
            }
        }
        Ok(vec![self.read_qdstring()?])
    }

    /// `SUP top` or `SUP ( a $ b )`
    pub(crate) fn read_oids(&mut self) -> Result<Vec<String>, ReadError> {
        if self.peek() == Some("(") {
            self.next_token();
            let mut oids = vec![];
            loop {
                match self.next_token() {
                    Some(token) if token == ")" => return Ok(oids),
                    Some(token) if token == "$" => continue,
                    Some(token) => oids.push(token.trim_matches('\'').to_owned()),
                    None => return Err(ReadError),
                }
            }
        }
        Ok(vec![self.read_oid()?])
    }

    /// `X-` extensions carry one qdstring or a parenthesized list; both are
    /// consumed and dropped.
    pub(crate) fn skip_extension(&mut self, keyword: &str) -> Result<(), ReadError> {
        if !keyword.starts_with("X-") {
            return Err(ReadError);
        }
        if self.peek() == Some("(") {
            self.next_token();
            loop {
                match self.next_token() {
                    Some(token) if token == ")" => return Ok(()),
                    Some(_) => continue,
                    None => return Err(ReadError),
                }
            }
        }
        self.next_token().map(|_| ()).ok_or(ReadError)
    }

    pub(crate) fn expect_close(&mut self) -> Result<(), ReadError> {
        match self.next_token() {
            Some(token) if token == ")" => Ok(()),
            _ => Err(ReadError),
        }
    }
}
