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

use std::cmp::Ordering;

/// orders two already-normalized values under one matching rule.
pub trait Comparator: Send + Sync {
    fn compare(&self, left: &str, right: &str) -> Ordering;
}

/// plain byte order of the normalized forms; correct for every string
/// matching rule once the normalizer has run.
#[derive(Debug, Default)]
pub struct StringComparator;

impl Comparator for StringComparator {
    fn compare(&self, left: &str, right: &str) -> Ordering {
        left.cmp(right)
    }
}

/// numeric order; values that do not parse fall back to byte order so the
/// ordering stays total.
#[derive(Debug, Default)]
pub struct IntegerComparator;

impl Comparator for IntegerComparator {
    fn compare(&self, left: &str, right: &str) -> Ordering {
        match (left.parse::<i64>(), right.parse::<i64>()) {
            (Ok(this), Ok(that)) => this.cmp(&that),
            _ => left.cmp(right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_comparator_orders_numerically() {
        assert_eq!(IntegerComparator.compare("9", "10"), Ordering::Less);
        assert_eq!(IntegerComparator.compare("-1", "0"), Ordering::Less);
    }

    #[test]
    fn integer_comparator_is_total_on_junk() {
        assert_eq!(IntegerComparator.compare("a", "a"), Ordering::Equal);
    }
}
