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

use crate::repr::Datum;

pub mod repr;

#[repr(u8)]
enum TypeTag {
    U64 = 1,
    Str = 2,
    Bytes = 3,
}

fn push_tag(data: &mut Vec<u8>, tag: TypeTag) {
    data.push(tag as u8);
}

fn read_tag(data: &[u8], idx: &mut usize) -> u8 {
    let tag = data[*idx];
    *idx += 1;
    tag
}

fn read_u64(data: &[u8], idx: &mut usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[*idx..*idx + 8]);
    *idx += 8;
    u64::from_be_bytes(buf)
}

fn read_len(data: &[u8], idx: &mut usize) -> usize {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[*idx..*idx + 4]);
    *idx += 4;
    u32::from_be_bytes(buf) as usize
}

/// on-disk representation of a record. Datums are packed with a one byte
/// type tag; integers are big endian so packed keys sort numerically under
/// the byte order of the underlying tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
pub struct Binary(Vec<u8>);

impl Binary {
    pub fn new() -> Binary {
        Binary::default()
    }

    pub fn to_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn with_data(data: Vec<u8>) -> Binary {
        Binary(data)
    }

    pub fn pack(other: &[Datum]) -> Binary {
        let size = other.iter().map(Datum::size).sum();
        let mut data = Vec::with_capacity(size);
        for datum in other {
            match datum {
                Datum::UInt64(val) => {
                    push_tag(&mut data, TypeTag::U64);
                    data.extend_from_slice(&val.to_be_bytes());
                }
                Datum::String(val) => {
                    push_tag(&mut data, TypeTag::Str);
                    data.extend_from_slice(&(val.len() as u32).to_be_bytes());
                    data.extend_from_slice(val.as_bytes());
                }
                Datum::Bytes(val) => {
                    push_tag(&mut data, TypeTag::Bytes);
                    data.extend_from_slice(&(val.len() as u32).to_be_bytes());
                    data.extend_from_slice(val);
                }
            }
        }

        Binary(data)
    }

    pub fn unpack(&self) -> Vec<Datum> {
        let data = self.0.as_slice();
        let mut index = 0;
        let mut res = Vec::new();
        while index < data.len() {
            let tag = read_tag(data, &mut index);
            let datum = match tag {
                tag if tag == TypeTag::U64 as u8 => Datum::from_u64(read_u64(data, &mut index)),
                tag if tag == TypeTag::Str as u8 => {
                    let len = read_len(data, &mut index);
                    let val = String::from_utf8_lossy(&data[index..index + len]).into_owned();
                    index += len;
                    Datum::String(val)
                }
                tag if tag == TypeTag::Bytes as u8 => {
                    let len = read_len(data, &mut index);
                    let val = data[index..index + len].to_vec();
                    index += len;
                    Datum::Bytes(val)
                }
                tag => panic!("unknown type tag {} in packed record", tag),
            };
            res.push(datum);
        }
        res
    }

    pub fn starts_with(&self, other: &Binary) -> bool {
        self.0.starts_with(&other.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for Binary {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(test)]
    mod pack_unpack_types {
        use super::*;

        #[test]
        fn unsigned_integers() {
            let data = vec![Datum::from_u64(0), Datum::from_u64(42), Datum::from_u64(u64::MAX)];
            let row = Binary::pack(&data);
            assert_eq!(data, row.unpack());
        }

        #[test]
        fn strings() {
            let data = vec![Datum::from_string("ou=users,ou=system"), Datum::from_string("")];
            let row = Binary::pack(&data);
            assert_eq!(data, row.unpack());
        }

        #[test]
        fn bytes() {
            let data = vec![Datum::from_bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]), Datum::from_bytes(vec![])];
            let row = Binary::pack(&data);
            assert_eq!(data, row.unpack());
        }

        #[test]
        fn mixed_record() {
            let data = vec![
                Datum::from_u64(7),
                Datum::from_string("2.5.4.3"),
                Datum::from_bytes(vec![1, 2, 3]),
            ];
            let row = Binary::pack(&data);
            assert_eq!(data, row.unpack());
        }
    }

    #[cfg(test)]
    mod ordering {
        use super::*;

        #[test]
        fn packed_u64_sorts_numerically() {
            let small = Binary::pack(&[Datum::from_u64(2)]);
            let large = Binary::pack(&[Datum::from_u64(256)]);
            assert!(small < large);
        }

        #[test]
        fn composite_key_prefix() {
            let prefix = Binary::pack(&[Datum::from_u64(17)]);
            let full = Binary::pack(&[Datum::from_u64(17), Datum::from_string("cn=x")]);
            assert!(full.starts_with(&prefix));
        }
    }
}
