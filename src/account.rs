//! Account credentials and typed identity keys.
//!
//! An [`Account`] is what the user configures; an [`AccountKey`] is the
//! stable `(slug, label)` identity the aggregator uses to attribute items
//! and errors. Two accounts at the same library must carry distinct labels
//! or usernames so their keys never collide.

use std::fmt;

use serde::Deserialize;

/// Credentials for one account at one library portal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    /// Portal subdomain, e.g. `shemesh` for `shemesh.library.org.il`.
    pub slug: String,
    /// Login username, normally the Teudat Zehut.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Optional human-readable label, e.g. a family member's name.
    #[serde(default)]
    pub label: Option<String>,
}

impl Account {
    /// Creates an unlabeled account.
    pub fn new(
        slug: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            slug: slug.into(),
            username: username.into(),
            password: password.into(),
            label: None,
        }
    }

    /// Creates a labeled account.
    pub fn with_label(
        slug: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new(slug, username, password)
        }
    }

    /// The identity key for this account: the label when one is set, the
    /// username otherwise.
    #[must_use]
    pub fn key(&self) -> AccountKey {
        AccountKey {
            slug: self.slug.clone(),
            label: self
                .label
                .clone()
                .unwrap_or_else(|| self.username.clone()),
        }
    }
}

/// Stable identity of one account: `(slug, label)`.
///
/// Used as the map key for login outcomes and per-account errors, and to
/// tag every scraped item with its source account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountKey {
    slug: String,
    label: String,
}

impl AccountKey {
    /// Creates a key from its parts.
    pub fn new(slug: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            label: label.into(),
        }
    }

    /// The library slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// The distinguishing label (configured label or username).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.slug, self.label)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unlabeled_key_uses_username() {
        let account = Account::new("shemesh", "123456789", "pw");
        let key = account.key();
        assert_eq!(key.slug(), "shemesh");
        assert_eq!(key.label(), "123456789");
        assert_eq!(key.to_string(), "shemesh:123456789");
    }

    #[test]
    fn test_label_overrides_username_in_key() {
        let account = Account::with_label("shemesh", "123456789", "pw", "parent");
        assert_eq!(account.key(), AccountKey::new("shemesh", "parent"));
    }

    #[test]
    fn test_same_credentials_at_different_libraries_have_distinct_keys() {
        let a = Account::new("shemesh", "111", "pw").key();
        let b = Account::new("betshemesh", "111", "pw").key();
        assert_ne!(a, b);
    }

    #[test]
    fn test_keys_order_by_slug_then_label() {
        let mut keys = vec![
            AccountKey::new("shemesh", "child"),
            AccountKey::new("betshemesh", "parent"),
            AccountKey::new("shemesh", "adult"),
        ];
        keys.sort();
        assert_eq!(keys[0].slug(), "betshemesh");
        assert_eq!(keys[1].label(), "adult");
    }

    #[test]
    fn test_account_deserializes_without_label() {
        let account: Account =
            serde_json::from_str(r#"{"slug": "shemesh", "username": "111", "password": "pw"}"#)
                .unwrap();
        assert_eq!(account.label, None);
        assert_eq!(account.key().label(), "111");
    }
}
