//! Short human-readable order codes shown next to a ticket's QR image.
//!
//! Codes are 8 characters drawn from `[0-9A-Z]`. They are identifiers for
//! manual lookup, not secrets: generation uses a general-purpose RNG and
//! uniqueness is probabilistic only.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of characters in an order code.
pub const ORDER_CODE_LEN: usize = 8;

/// Base-36 digits, uppercased.
pub const ORDER_CODE_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Rejected order code text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidOrderCode {
    /// Wrong number of characters
    #[error("order code must be {expected} characters, got {actual}")]
    Length {
        /// Required length
        expected: usize,
        /// Length received
        actual: usize,
    },

    /// A character outside `[0-9A-Z]`
    #[error("order code contains {found:?} at position {position}, expected [0-9A-Z]")]
    Character {
        /// Offending character
        found: char,
        /// Zero-based character index
        position: usize,
    },
}

/// A validated 8-character base-36 order code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderCode(String);

impl OrderCode {
    /// Parse and validate an order code.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOrderCode`] if the text is not exactly
    /// [`ORDER_CODE_LEN`] characters from `[0-9A-Z]`.
    pub fn parse(text: &str) -> Result<Self, InvalidOrderCode> {
        let actual = text.chars().count();
        if actual != ORDER_CODE_LEN {
            return Err(InvalidOrderCode::Length {
                expected: ORDER_CODE_LEN,
                actual,
            });
        }

        if let Some((position, found)) = text
            .chars()
            .enumerate()
            .find(|(_, c)| !(c.is_ascii_digit() || c.is_ascii_uppercase()))
        {
            return Err(InvalidOrderCode::Character { found, position });
        }

        Ok(Self(text.to_owned()))
    }

    /// Draw a fresh code from `source`.
    ///
    /// Sources hand back base-36 tokens; lowercase letters are folded to
    /// uppercase. A source that yields something unusable is logged and
    /// replaced by the thread RNG so opening a ticket never fails on it.
    #[must_use]
    pub fn generate(source: &dyn OrderCodeSource) -> Self {
        let token = source.next_token(ORDER_CODE_LEN).to_ascii_uppercase();
        match Self::parse(&token) {
            Ok(code) => code,
            Err(error) => {
                tracing::warn!(%error, "Order code source returned an unusable token, falling back to thread RNG");
                Self(sample_token(&mut rand::thread_rng(), ORDER_CODE_LEN))
            }
        }
    }

    /// The code as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OrderCode {
    type Err = InvalidOrderCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OrderCode {
    type Error = InvalidOrderCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderCode> for String {
    fn from(code: OrderCode) -> Self {
        code.0
    }
}

/// Pluggable provider of random base-36 tokens.
pub trait OrderCodeSource: Send + Sync {
    /// Return `len` characters from `[0-9A-Z]`.
    fn next_token(&self, len: usize) -> String;
}

/// Production source backed by `rand::thread_rng()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngOrderCodes;

impl OrderCodeSource for ThreadRngOrderCodes {
    fn next_token(&self, len: usize) -> String {
        sample_token(&mut rand::thread_rng(), len)
    }
}

/// Sample `len` characters uniformly from [`ORDER_CODE_ALPHABET`].
pub fn sample_token<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(ORDER_CODE_ALPHABET[rng.gen_range(0..ORDER_CODE_ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Constant(&'static str);

    impl OrderCodeSource for Constant {
        fn next_token(&self, _len: usize) -> String {
            self.0.to_owned()
        }
    }

    #[test]
    fn test_parse_accepts_valid_code() {
        let code = OrderCode::parse("AB12CD34").unwrap();
        assert_eq!(code.as_str(), "AB12CD34");
        assert_eq!(code.to_string(), "AB12CD34");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!(
            OrderCode::parse("AB12"),
            Err(InvalidOrderCode::Length { expected: 8, actual: 4 })
        );
    }

    #[test]
    fn test_parse_rejects_lowercase() {
        assert_eq!(
            OrderCode::parse("AB12cD34"),
            Err(InvalidOrderCode::Character { found: 'c', position: 4 })
        );
    }

    #[test]
    fn test_generate_uppercases_source_token() {
        let code = OrderCode::generate(&Constant("ab12cd34"));
        assert_eq!(code.as_str(), "AB12CD34");
    }

    #[test]
    fn test_generate_falls_back_on_bad_token() {
        let code = OrderCode::generate(&Constant("not-a-code"));
        assert!(OrderCode::parse(code.as_str()).is_ok());
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let json = serde_json::to_string(&OrderCode::parse("ZZ00YY11").unwrap()).unwrap();
        assert_eq!(json, "\"ZZ00YY11\"");
        assert!(serde_json::from_str::<OrderCode>("\"zz00yy11\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_sampled_tokens_are_valid_codes(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let token = sample_token(&mut rng, ORDER_CODE_LEN);
            prop_assert_eq!(token.len(), ORDER_CODE_LEN);
            prop_assert!(token.bytes().all(|b| ORDER_CODE_ALPHABET.contains(&b)));
            prop_assert!(OrderCode::parse(&token).is_ok());
        }
    }

    #[test]
    fn test_thread_rng_codes_vary() {
        let source = ThreadRngOrderCodes;
        let codes: std::collections::HashSet<_> =
            (0..32).map(|_| OrderCode::generate(&source)).collect();
        // 36^8 possibilities; 32 draws colliding down to one value is not plausible.
        assert!(codes.len() > 1);
    }
}
