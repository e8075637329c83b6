//! Content fingerprints for schema deduplication

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::schema::ParsedSchema;

/// SHA-256 fingerprint of a schema's canonical form
///
/// Equality of fingerprints is the registry's dedup identity: two submissions
/// with the same fingerprint are the same schema, regardless of how the source
/// text was formatted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Fingerprint of a parsed schema's canonical form
    pub fn of_schema(schema: &ParsedSchema) -> Self {
        Self::from_bytes(schema.canonical().as_bytes())
    }

    /// The hex digest string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a schema's canonical form matches this fingerprint
    pub fn matches(&self, schema: &ParsedSchema) -> bool {
        *self == Self::of_schema(schema)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{AvroParser, SchemaParser};

    #[test]
    fn test_fingerprint_consistency() {
        let data = br#"{"type":"record","name":"Order","fields":[]}"#;
        assert_eq!(Fingerprint::from_bytes(data), Fingerprint::from_bytes(data));
    }

    #[test]
    fn test_fingerprint_differs_for_different_content() {
        let a = Fingerprint::from_bytes(b"one");
        let b = Fingerprint::from_bytes(b"two");
        assert_ne!(a, b);
    }

    #[test]
    fn test_formatting_does_not_change_schema_fingerprint() {
        let parser = AvroParser::new();
        let compact = parser
            .parse(r#"{"type":"record","name":"User","fields":[{"name":"id","type":"int"}]}"#)
            .unwrap();
        let spaced = parser
            .parse(
                r#"{
                    "name": "User",
                    "type": "record",
                    "fields": [ { "name": "id", "type": "int" } ]
                }"#,
            )
            .unwrap();

        let fingerprint = Fingerprint::of_schema(&compact);
        assert_eq!(fingerprint, Fingerprint::of_schema(&spaced));
        assert!(fingerprint.matches(&spaced));
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fingerprint = Fingerprint::from_bytes(b"abc");
        assert_eq!(fingerprint.as_str().len(), 64);
        assert!(fingerprint.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
