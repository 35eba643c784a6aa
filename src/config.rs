//! Account configuration loading.
//!
//! Accounts come from a JSON config file (an ordered array of account
//! objects) or from environment variables when one set of credentials is
//! shared across libraries.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::account::Account;

/// Env var holding the default username; on these portals the Teudat Zehut
/// doubles as the default password.
pub const USERNAME_ENV: &str = "TEUDAT_ZEHUT";

/// Env var overriding the password.
pub const PASSWORD_ENV: &str = "LIBRARY_PASSWORD";

/// Loads accounts from a JSON config file.
///
/// Format: `[{"slug": "...", "username": "...", "password": "...",
/// "label": "..."?}, ...]`. Order is preserved; duplicate keys are
/// rejected later at aggregator construction.
///
/// # Errors
///
/// Fails with context when the file is missing or not valid JSON.
pub fn load_accounts_file(path: &Path) -> Result<Vec<Account>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let accounts: Vec<Account> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    Ok(accounts)
}

/// Username from the environment, if set and non-empty.
#[must_use]
pub fn env_username() -> Option<String> {
    non_empty_var(USERNAME_ENV)
}

/// Password from the environment: `LIBRARY_PASSWORD` when set, otherwise
/// the Teudat Zehut itself.
#[must_use]
pub fn env_password() -> Option<String> {
    non_empty_var(PASSWORD_ENV).or_else(|| non_empty_var(USERNAME_ENV))
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
