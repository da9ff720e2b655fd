//! Correlation identifiers.
//!
//! A node echoes the `id` of each request in its response. Uniqueness within a
//! single client is all that is required, so the strategies below trade global
//! guarantees for being stateless.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Alphabet used by [`IdStrategy::NanoId`].
const NANOID_ALPHABET: &[u8; 64] =
    b"_-0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of identifiers produced by [`IdStrategy::NanoId`].
pub const NANOID_LENGTH: usize = 21;

/// Client-generated token echoed by the node.
///
/// Equality compares the variant as well as the value, so `"1"` and `1`
/// are different identifiers. An absent id is `Option::None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrelationId {
    /// Integer identifier.
    Number(i64),
    /// Text identifier.
    Text(String),
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationId::Number(n) => write!(f, "{}", n),
            CorrelationId::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i64> for CorrelationId {
    fn from(n: i64) -> Self { CorrelationId::Number(n) }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self { CorrelationId::Text(s.to_string()) }
}

impl From<String> for CorrelationId {
    fn from(s: String) -> Self { CorrelationId::Text(s) }
}

/// Strategy used to mint a fresh [`CorrelationId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// Milliseconds since the Unix epoch.
    ///
    /// Not strictly increasing if the wall clock is adjusted; only
    /// uniqueness matters for correlation.
    Timestamp,
    /// Random v4 UUID in its hyphenated string form.
    Uuid,
    /// 21 random characters from a URL-safe alphabet.
    NanoId,
}

impl IdStrategy {
    /// Produces a new identifier.
    pub fn next(self) -> CorrelationId {
        match self {
            IdStrategy::Timestamp => CorrelationId::Number(chrono::Utc::now().timestamp_millis()),
            IdStrategy::Uuid => CorrelationId::Text(uuid::Uuid::new_v4().to_string()),
            IdStrategy::NanoId => CorrelationId::Text(nanoid(NANOID_LENGTH)),
        }
    }
}

fn nanoid(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len).map(|_| NANOID_ALPHABET[rng.random_range(0..NANOID_ALPHABET.len())] as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_recent_millis() {
        let before = chrono::Utc::now().timestamp_millis();
        let id = IdStrategy::Timestamp.next();
        let after = chrono::Utc::now().timestamp_millis();

        match id {
            CorrelationId::Number(n) => assert!(n >= before && n <= after),
            other => panic!("expected numeric id, got {:?}", other),
        }
    }

    #[test]
    fn test_uuid_shape() {
        let CorrelationId::Text(s) = IdStrategy::Uuid.next() else {
            panic!("expected text id");
        };
        assert_eq!(s.len(), 36);
        assert!(uuid::Uuid::parse_str(&s).is_ok());
        assert_ne!(IdStrategy::Uuid.next(), IdStrategy::Uuid.next());
    }

    #[test]
    fn test_nanoid_alphabet_and_length() {
        let CorrelationId::Text(s) = IdStrategy::NanoId.next() else {
            panic!("expected text id");
        };
        assert_eq!(s.len(), NANOID_LENGTH);
        assert!(s.bytes().all(|b| NANOID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_equality_is_variant_aware() {
        assert_ne!(CorrelationId::from(1), CorrelationId::from("1"));
        assert_eq!(CorrelationId::from("abc"), CorrelationId::Text("abc".to_string()));
    }

    #[test]
    fn test_strategy_serde_names() {
        let parsed: IdStrategy = serde_json::from_str("\"nanoid\"").expect("nanoid");
        assert_eq!(parsed, IdStrategy::NanoId);
        assert_eq!(serde_json::to_string(&IdStrategy::Timestamp).expect("ser"), "\"timestamp\"");
        assert!(serde_json::from_str::<IdStrategy>("\"sequential\"").is_err());
    }
}
