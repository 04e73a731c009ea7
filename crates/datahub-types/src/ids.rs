//! Typed identifier for remote products.
//!
//! Catalogs hand out product identifiers as opaque strings (usually UUIDs,
//! but nothing here depends on that). `ProductId` wraps the string so it
//! cannot be confused with a product name or a mission name at call sites.
//! The `short()` form is for log lines only, never a lookup key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque product identifier assigned by the remote catalog.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

/// Error returned when an identifier is empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("product identifier must not be empty")]
pub struct EmptyIdError;

impl ProductId {
    /// Wrap an identifier string.
    ///
    /// Empty identifiers are accepted here; use [`ProductId::parse`] at
    /// trust boundaries.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse an identifier, rejecting the empty string.
    pub fn parse(s: &str) -> Result<Self, EmptyIdError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Err(EmptyIdError)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for human display only.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductId({})", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_truncates() {
        let id = ProductId::new("63a6c50d-1bba-45eb-a7db-85ecd334e30b");
        assert_eq!(id.short(), "63a6c50d");
        assert_eq!(ProductId::new("abc").short(), "abc");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(ProductId::parse("   "), Err(EmptyIdError));
        assert_eq!(ProductId::parse(" uuid ").unwrap().as_str(), "uuid");
    }

    #[test]
    fn test_display_is_full_id() {
        let id = ProductId::new("725adbf7-dd68-49c2-b466-061fa5b07861");
        assert_eq!(id.to_string(), "725adbf7-dd68-49c2-b466-061fa5b07861");
        assert_eq!(format!("{id:?}"), "ProductId(725adbf7)");
    }

    #[test]
    fn test_serde_transparent() {
        let id = ProductId::new("uuid");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"uuid\"");
        let back: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
