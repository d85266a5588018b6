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

use itertools::Itertools;

/// canonicalizes one value for matching and index keys. Bound to a
/// matching rule; equality of two values is equality of their normalized
/// forms under the attribute's equality rule.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, value: &str) -> String;
}

fn deep_trim(value: &str) -> String {
    value.split_whitespace().join(" ")
}

/// trim, collapse internal runs of whitespace, fold to lower case. The
/// normalizer behind `caseIgnoreMatch`.
#[derive(Debug, Default)]
pub struct DeepTrimToLowerNormalizer;

impl Normalizer for DeepTrimToLowerNormalizer {
    fn normalize(&self, value: &str) -> String {
        deep_trim(value).to_lowercase()
    }
}

/// trim and collapse whitespace but keep case. `caseExactMatch`.
#[derive(Debug, Default)]
pub struct DeepTrimNormalizer;

impl Normalizer for DeepTrimNormalizer {
    fn normalize(&self, value: &str) -> String {
        deep_trim(value)
    }
}

/// spaces are insignificant in numeric strings.
#[derive(Debug, Default)]
pub struct NumericStringNormalizer;

impl Normalizer for NumericStringNormalizer {
    fn normalize(&self, value: &str) -> String {
        value.chars().filter(|ch| !ch.is_whitespace()).collect()
    }
}

#[derive(Debug, Default)]
pub struct NoOpNormalizer;

impl Normalizer for NoOpNormalizer {
    fn normalize(&self, value: &str) -> String {
        value.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  John   Doe  ", "john doe")]
    #[case("ABC", "abc")]
    #[case("a\tb", "a b")]
    fn case_ignore(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(DeepTrimToLowerNormalizer.normalize(input), expected);
    }

    #[test]
    fn case_exact_keeps_case() {
        assert_eq!(DeepTrimNormalizer.normalize("  John  Doe "), "John Doe");
    }

    #[test]
    fn numeric_string_drops_spaces() {
        assert_eq!(NumericStringNormalizer.normalize("123 456 789"), "123456789");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = DeepTrimToLowerNormalizer.normalize("  Mixed   Case ");
        let twice = DeepTrimToLowerNormalizer.normalize(&once);
        assert_eq!(once, twice);
    }
}
