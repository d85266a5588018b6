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

/// a single typed field of a packed record. Records stored in the master
/// table and in index trees are sequences of datums packed into a `Binary`.
#[derive(Debug, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub enum Datum {
    UInt64(u64),
    String(String),
    Bytes(Vec<u8>),
}

impl Datum {
    pub fn size(&self) -> usize {
        match self {
            Self::UInt64(_) => 1 + std::mem::size_of::<u64>(),
            Self::String(val) => 1 + std::mem::size_of::<u32>() + val.len(),
            Self::Bytes(val) => 1 + std::mem::size_of::<u32>() + val.len(),
        }
    }

    pub const fn from_u64(val: u64) -> Datum {
        Datum::UInt64(val)
    }

    pub fn from_string<S: Into<String>>(val: S) -> Datum {
        Datum::String(val.into())
    }

    pub fn from_bytes(val: Vec<u8>) -> Datum {
        Datum::Bytes(val)
    }

    pub fn as_u64(&self) -> u64 {
        match self {
            Self::UInt64(val) => *val,
            _ => panic!("invalid use of Datum::as_u64"),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::String(val) => val,
            _ => panic!("invalid use of Datum::as_str"),
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            Self::String(val) => val.clone(),
            _ => panic!("invalid use of Datum::as_string"),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(val) => val,
            _ => panic!("invalid use of Datum::as_bytes"),
        }
    }
}

impl Display for Datum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt64(val) => write!(f, "{}", val),
            Self::String(val) => write!(f, "{}", val),
            Self::Bytes(val) => write!(f, "{} bytes", val.len()),
        }
    }
}

impl PartialEq<&str> for Datum {
    fn eq(&self, other: &&str) -> bool {
        match self {
            Datum::String(this) => this == other,
            _ => false,
        }
    }
}
