// Validated Types
// Strongly-typed wrappers for request parameters and store enums.
// These types cannot be constructed with invalid data, so validation
// happens once at the HTTP boundary and never again downstream.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::{Uuid, Version};

/// A key identifier that is guaranteed to be a non-nil UUIDv4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatedKeyId {
    inner: Uuid,
}

impl ValidatedKeyId {
    /// Create from an existing UUID with validation
    pub fn from_uuid(id: Uuid) -> Result<Self> {
        ensure!(!id.is_nil(), "Key ID cannot be nil UUID");
        ensure!(
            id.get_version() == Some(Version::Random),
            "Key ID must be a version 4 UUID"
        );
        Ok(Self { inner: id })
    }

    /// Parse from a path parameter string
    pub fn parse(s: &str) -> Result<Self> {
        let uuid = Uuid::parse_str(s)?;
        Self::from_uuid(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.inner
    }
}

impl fmt::Display for ValidatedKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// A revision identifier with the same UUIDv4 guarantees as [`ValidatedKeyId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatedRevisionId {
    inner: Uuid,
}

impl ValidatedRevisionId {
    pub fn from_uuid(id: Uuid) -> Result<Self> {
        ensure!(!id.is_nil(), "Revision ID cannot be nil UUID");
        ensure!(
            id.get_version() == Some(Version::Random),
            "Revision ID must be a version 4 UUID"
        );
        Ok(Self { inner: id })
    }

    pub fn parse(s: &str) -> Result<Self> {
        let uuid = Uuid::parse_str(s)?;
        Self::from_uuid(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.inner
    }
}

impl fmt::Display for ValidatedRevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// A media identifier; the media table uses positive integer keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidatedMediaId {
    inner: i64,
}

impl ValidatedMediaId {
    pub fn new(id: i64) -> Result<Self> {
        ensure!(id > 0, "Media ID must be a positive integer");
        Ok(Self { inner: id })
    }

    /// Parse from a path parameter string
    pub fn parse(s: &str) -> Result<Self> {
        let id: i64 = s
            .parse()
            .map_err(|_| anyhow::anyhow!("Media ID must be an integer"))?;
        Self::new(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.inner
    }
}

impl fmt::Display for ValidatedMediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// The two content languages the dataset carries.
///
/// Localized info rows are keyed by these codes; requests asking for any
/// other language are rejected at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    No,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::No => "no",
            Language::En => "en",
        }
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "no" => Ok(Language::No),
            "en" => Ok(Language::En),
            other => anyhow::bail!("Unsupported language code: {other}"),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication status of a key as stored in the `status` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyStatus {
    Draft,
    Private,
    Beta,
    Published,
}

impl KeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::Draft => "DRAFT",
            KeyStatus::Private => "PRIVATE",
            KeyStatus::Beta => "BETA",
            KeyStatus::Published => "PUBLISHED",
        }
    }

    /// Statuses visible through the default (non-revision) lookups
    pub fn publicly_visible() -> &'static [&'static str] {
        &["PUBLISHED", "BETA"]
    }

    /// Statuses visible when an explicit revision is requested
    pub fn revision_visible() -> &'static [&'static str] {
        &["PUBLISHED", "BETA", "PRIVATE"]
    }
}

impl FromStr for KeyStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DRAFT" => Ok(KeyStatus::Draft),
            "PRIVATE" => Ok(KeyStatus::Private),
            "BETA" => Ok(KeyStatus::Beta),
            "PUBLISHED" => Ok(KeyStatus::Published),
            other => anyhow::bail!("Unknown key status: {other}"),
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_id_accepts_v4() {
        let id = Uuid::new_v4();
        let validated = ValidatedKeyId::from_uuid(id).unwrap();
        assert_eq!(validated.as_uuid(), id);
    }

    #[test]
    fn test_key_id_rejects_nil() {
        assert!(ValidatedKeyId::from_uuid(Uuid::nil()).is_err());
    }

    #[test]
    fn test_key_id_rejects_non_v4() {
        // Fixed v1 UUID (version nibble is 1)
        let v1 = Uuid::parse_str("c232ab00-9414-11ec-b3c8-9f68deced846").unwrap();
        assert!(ValidatedKeyId::from_uuid(v1).is_err());
        assert!(ValidatedKeyId::parse("c232ab00-9414-11ec-b3c8-9f68deced846").is_err());
    }

    #[test]
    fn test_key_id_rejects_garbage() {
        assert!(ValidatedKeyId::parse("not-a-uuid").is_err());
        assert!(ValidatedKeyId::parse("").is_err());
    }

    #[test]
    fn test_revision_id_roundtrip() {
        let id = Uuid::new_v4();
        let validated = ValidatedRevisionId::parse(&id.to_string()).unwrap();
        assert_eq!(validated.as_uuid(), id);
    }

    #[test]
    fn test_media_id_bounds() {
        assert!(ValidatedMediaId::new(1).is_ok());
        assert!(ValidatedMediaId::new(0).is_err());
        assert!(ValidatedMediaId::new(-42).is_err());
        assert_eq!(ValidatedMediaId::parse("42").unwrap().as_i64(), 42);
        assert!(ValidatedMediaId::parse("forty-two").is_err());
    }

    #[test]
    fn test_language_parse() {
        assert_eq!("no".parse::<Language>().unwrap(), Language::No);
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert!("xx".parse::<Language>().is_err());
        assert!("NO".parse::<Language>().is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!("PUBLISHED".parse::<KeyStatus>().unwrap(), KeyStatus::Published);
        assert_eq!(KeyStatus::Beta.as_str(), "BETA");
        assert!("RETIRED".parse::<KeyStatus>().is_err());
        assert!(!KeyStatus::publicly_visible().contains(&"PRIVATE"));
        assert!(KeyStatus::revision_visible().contains(&"PRIVATE"));
    }
}
