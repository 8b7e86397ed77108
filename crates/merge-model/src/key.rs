//! Join key normalization.
//!
//! Keys from independently produced exports differ in case and surrounding
//! whitespace. Every comparison goes through [`normalize_key`] on both sides.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Trims surrounding whitespace and lowercases.
///
/// Lowercasing is the only case fold: `"STRASSE"` and `"straße"` stay
/// distinct keys.
///
/// Idempotent: `normalize_key(&normalize_key(s)) == normalize_key(s)`.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A normalized, non-empty join key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinKey(String);

impl JoinKey {
    /// Normalizes `raw`; returns `None` when nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize_key(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JoinKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_lowercases() {
        assert_eq!(normalize_key("  UC123 "), "uc123");
        assert_eq!(normalize_key("\tUcAbC\n"), "ucabc");
    }

    #[test]
    fn parse_rejects_blank() {
        assert!(JoinKey::parse("").is_none());
        assert!(JoinKey::parse("   ").is_none());
        assert_eq!(JoinKey::parse("UC1").map(|k| k.to_string()), Some("uc1".to_string()));
    }

    #[test]
    fn fold_is_unicode_lowercase_only() {
        assert_eq!(normalize_key("ÉCOLE"), "école");
        assert_ne!(normalize_key("STRASSE"), normalize_key("straße"));
    }

    #[test]
    fn keys_equal_after_normalization() {
        assert_eq!(JoinKey::parse("UC123 "), JoinKey::parse("uc123"));
    }
}
