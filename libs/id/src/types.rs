//! Identifier definitions.
//!
//! Operation IDs are opaque strings issued by the daemon. Fingerprints are
//! content hashes and double as the canonical existence key for images.

use crate::IdError;

// =============================================================================
// Operations
// =============================================================================

/// Identifier of a server-side asynchronous operation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationId(String);

impl OperationId {
    /// Parses an operation ID, rejecting empty input and embedded whitespace.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(IdError::Whitespace(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Extracts the ID from an operation path such as `/1.0/operations/<id>`.
    pub fn from_operation_path(path: &str) -> Result<Self, IdError> {
        let path = path.split('?').next().unwrap_or_default();
        let last = path.rsplit('/').next().unwrap_or_default();
        Self::parse(last)
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OperationId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for OperationId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for OperationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Images
// =============================================================================

/// Content hash identifying an image independently of its aliases.
///
/// Stored in canonical lowercase form. A full fingerprint is a 64 character
/// sha256 hex digest; shorter values are accepted so a hash prefix can be
/// used as a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Length of a full sha256 fingerprint in hex characters.
    pub const FULL_LEN: usize = 64;

    /// Parses a fingerprint, normalizing to lowercase.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        if s.len() > Self::FULL_LEN {
            return Err(IdError::TooLong {
                len: s.len(),
                max: Self::FULL_LEN,
            });
        }
        if let Some(found) = s.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(IdError::InvalidHex {
                value: s.to_string(),
                found,
            });
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Returns true for a complete 64 character digest.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.0.len() == Self::FULL_LEN
    }

    /// Returns true if `prefix` (case-insensitive) is a prefix of this fingerprint.
    #[must_use]
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        !prefix.is_empty()
            && prefix.len() <= self.0.len()
            && self.0[..prefix.len()].eq_ignore_ascii_case(prefix)
    }

    /// Short form used in log lines and tables.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }

    /// Returns the fingerprint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Fingerprint {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for Fingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Fingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BIONIC: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_operation_id_from_path() {
        let id = OperationId::from_operation_path(
            "/1.0/operations/0a19a412-03d0-4118-bee8-a3095f06d4da?project=vmvault",
        )
        .unwrap();
        assert_eq!(id.as_str(), "0a19a412-03d0-4118-bee8-a3095f06d4da");
    }

    #[test]
    fn test_operation_id_empty() {
        let result: Result<OperationId, _> = "".parse();
        assert!(matches!(result.unwrap_err(), IdError::Empty));
        assert!(matches!(
            OperationId::from_operation_path("/1.0/operations/").unwrap_err(),
            IdError::Empty
        ));
        assert!(OperationId::from_operation_path("/1.0/operations/?project=vmvault").is_err());
    }

    #[test]
    fn test_operation_id_whitespace() {
        let result: Result<OperationId, _> = "abc def".parse();
        assert!(matches!(result.unwrap_err(), IdError::Whitespace(_)));
    }

    #[test]
    fn test_fingerprint_full() {
        let fp = Fingerprint::parse(BIONIC).unwrap();
        assert!(fp.is_full());
        assert_eq!(fp.short(), "e3b0c44298fc");
    }

    #[test]
    fn test_fingerprint_normalizes_case() {
        let fp = Fingerprint::parse(&BIONIC.to_uppercase()).unwrap();
        assert_eq!(fp.as_str(), BIONIC);
    }

    #[test]
    fn test_fingerprint_prefix() {
        let fp = Fingerprint::parse(BIONIC).unwrap();
        assert!(fp.matches_prefix("e3b0c442"));
        assert!(fp.matches_prefix("E3B0C442"));
        assert!(!fp.matches_prefix(""));
        assert!(!fp.matches_prefix("ffff"));
    }

    #[test]
    fn test_fingerprint_rejects_non_hex() {
        let result = Fingerprint::parse("xenial");
        assert!(matches!(
            result.unwrap_err(),
            IdError::InvalidHex { found: 'x', .. }
        ));
    }

    #[test]
    fn test_fingerprint_rejects_too_long() {
        let long = format!("{BIONIC}00");
        assert!(matches!(
            Fingerprint::parse(&long).unwrap_err(),
            IdError::TooLong { len: 66, .. }
        ));
    }

    #[test]
    fn test_fingerprint_json_roundtrip() {
        let fp = Fingerprint::parse(BIONIC).unwrap();
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{BIONIC}\""));
        let parsed: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(fp, parsed);
    }

    proptest! {
        #[test]
        fn prop_fingerprint_accepts_hex(s in "[0-9a-fA-F]{1,64}") {
            let fp = Fingerprint::parse(&s).unwrap();
            prop_assert_eq!(fp.as_str(), s.to_ascii_lowercase());
            prop_assert!(fp.matches_prefix(&s[..1]));
        }

        #[test]
        fn prop_operation_id_roundtrip(s in "[A-Za-z0-9-]{1,40}") {
            let id = OperationId::parse(&s).unwrap();
            let path = format!("/1.0/operations/{}", id);
            prop_assert_eq!(OperationId::from_operation_path(&path).unwrap(), id);
        }
    }
}
