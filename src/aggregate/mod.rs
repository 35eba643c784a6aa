//! Parallel aggregation across library accounts.
//!
//! The aggregator owns one session client per account and fans every
//! operation out concurrently: all logins at once, all fetches at once.
//! Per-account failures are captured independently — one account's fault
//! never aborts a sibling — and merging happens only after every future
//! has resolved, so there is no shared state to race on.
//!
//! Per-account session lifecycle:
//!
//! ```text
//! NotLoggedIn -> LoggingIn -> { Active, LoginFailed }
//! Active -> { Active, Expired }   (on each fetch)
//! ```
//!
//! `Expired` and `LoginFailed` are terminal until the caller invokes
//! [`Aggregator::login_all`] again; failed accounts are never silently
//! retried.

mod report;

pub use report::{AggregatedBooks, AggregatedHistory};

use std::collections::{BTreeMap, BTreeSet};

use futures_util::future::join_all;
use thiserror::Error;
use tracing::warn;

use crate::account::{Account, AccountKey};
use crate::client::{ClientError, LibraryClient, PortalClient};

/// Errors raised while assembling an aggregator.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// Two accounts resolved to the same `(slug, label)` key. Rejected at
    /// construction so neither account's data can be silently dropped.
    #[error("duplicate account key {key}: add labels to distinguish accounts at the same library")]
    DuplicateAccount {
        /// The colliding key.
        key: AccountKey,
    },

    /// A session client could not be constructed for an account.
    #[error("failed to build client for {key}")]
    ClientBuild {
        /// The account the client was for.
        key: AccountKey,
        /// Underlying construction error.
        #[source]
        source: ClientError,
    },
}

/// Per-account session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    /// No login attempted since construction (or since the last reset).
    NotLoggedIn,
    /// Login in flight.
    LoggingIn,
    /// Session established; fetches will be attempted.
    Active,
    /// Login failed; excluded from fetches until `login_all` runs again.
    LoginFailed,
    /// A fetch found the session dead; excluded until `login_all` runs again.
    Expired,
}

/// Result of one account's login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Session established.
    Success,
    /// Login failed with a human-readable message.
    Failed(String),
}

impl LoginOutcome {
    /// True for [`LoginOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Factory building one session client per account.
///
/// Injectable so tests can substitute fake portals for real HTTP clients.
pub type ClientFactory =
    dyn Fn(&Account) -> Result<Box<dyn PortalClient>, ClientError> + Send + Sync;

struct Slot {
    account: Account,
    client: Box<dyn PortalClient>,
    state: AccountState,
}

/// Drives session clients for a set of accounts in parallel and merges
/// their results.
pub struct Aggregator {
    slots: Vec<Slot>,
}

impl Aggregator {
    /// Creates an aggregator with real portal clients.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::DuplicateAccount`] when two accounts share
    /// a key, or [`AggregateError::ClientBuild`] when client construction
    /// fails.
    pub fn new(accounts: Vec<Account>) -> Result<Self, AggregateError> {
        Self::with_factory(accounts, &|account| {
            LibraryClient::new(
                account.slug.clone(),
                account.username.clone(),
                account.password.clone(),
            )
            .map(|client| Box::new(client) as Box<dyn PortalClient>)
        })
    }

    /// Creates an aggregator using the same credentials at several
    /// libraries.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Aggregator::new`].
    pub fn from_slugs(
        slugs: &[String],
        username: &str,
        password: &str,
    ) -> Result<Self, AggregateError> {
        let accounts = slugs
            .iter()
            .map(|slug| Account::new(slug.clone(), username, password))
            .collect();
        Self::new(accounts)
    }

    /// Creates an aggregator with clients built by `factory`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Aggregator::new`].
    pub fn with_factory(
        accounts: Vec<Account>,
        factory: &ClientFactory,
    ) -> Result<Self, AggregateError> {
        let mut seen = BTreeSet::new();
        let mut slots = Vec::with_capacity(accounts.len());

        for account in accounts {
            let key = account.key();
            if !seen.insert(key.clone()) {
                return Err(AggregateError::DuplicateAccount { key });
            }
            let client = factory(&account)
                .map_err(|source| AggregateError::ClientBuild { key, source })?;
            slots.push(Slot {
                account,
                client,
                state: AccountState::NotLoggedIn,
            });
        }

        Ok(Self { slots })
    }

    /// The configured accounts, in insertion order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.slots.iter().map(|slot| &slot.account)
    }

    /// Lifecycle state for one account.
    #[must_use]
    pub fn state(&self, key: &AccountKey) -> Option<AccountState> {
        self.slots
            .iter()
            .find(|slot| slot.account.key() == *key)
            .map(|slot| slot.state)
    }

    /// Number of accounts currently holding an active session.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state == AccountState::Active)
            .count()
    }

    /// Logs in to every account concurrently.
    ///
    /// Each account succeeds or fails independently; the returned map has
    /// exactly one outcome per configured account.
    pub async fn login_all(&mut self) -> BTreeMap<AccountKey, LoginOutcome> {
        join_all(self.slots.iter_mut().map(|slot| async move {
            let key = slot.account.key();
            slot.state = AccountState::LoggingIn;
            match slot.client.login().await {
                Ok(()) => {
                    slot.state = AccountState::Active;
                    (key, LoginOutcome::Success)
                }
                Err(error) => {
                    slot.state = AccountState::LoginFailed;
                    warn!(account = %key, error = %error, "login failed");
                    (key, LoginOutcome::Failed(error.to_string()))
                }
            }
        }))
        .await
        .into_iter()
        .collect()
    }

    /// Fetches checked out books from every active account concurrently.
    ///
    /// An account whose fetch fails contributes zero items and one entry in
    /// the error map; its siblings are unaffected. Accounts that never
    /// logged in are skipped entirely.
    pub async fn get_all_checked_out_books(&mut self) -> AggregatedBooks {
        let outcomes = join_all(
            self.slots
                .iter_mut()
                .filter(|slot| slot.state == AccountState::Active)
                .map(|slot| async move {
                    let key = slot.account.key();
                    match slot.client.checked_out_books().await {
                        Ok(mut books) => {
                            for book in &mut books {
                                book.account = Some(key.clone());
                            }
                            (key, Ok(books))
                        }
                        Err(error) => {
                            if error.is_session_expired() {
                                slot.state = AccountState::Expired;
                            }
                            warn!(account = %key, error = %error, "loans fetch failed");
                            (key, Err(error.to_string()))
                        }
                    }
                }),
        )
        .await;

        let mut aggregate = AggregatedBooks::default();
        for (key, outcome) in outcomes {
            aggregate.libraries.push(key.clone());
            match outcome {
                Ok(books) => aggregate.books.extend(books),
                Err(message) => {
                    aggregate.errors.insert(key, message);
                }
            }
        }
        aggregate
    }

    /// Fetches checkout history from every active account concurrently.
    ///
    /// Failure handling mirrors [`Aggregator::get_all_checked_out_books`].
    pub async fn get_all_checkout_history(&mut self) -> AggregatedHistory {
        let outcomes = join_all(
            self.slots
                .iter_mut()
                .filter(|slot| slot.state == AccountState::Active)
                .map(|slot| async move {
                    let key = slot.account.key();
                    match slot.client.checkout_history().await {
                        Ok(mut items) => {
                            for item in &mut items {
                                item.account = Some(key.clone());
                            }
                            (key, Ok(items))
                        }
                        Err(error) => {
                            if error.is_session_expired() {
                                slot.state = AccountState::Expired;
                            }
                            warn!(account = %key, error = %error, "history fetch failed");
                            (key, Err(error.to_string()))
                        }
                    }
                }),
        )
        .await;

        let mut aggregate = AggregatedHistory::default();
        for (key, outcome) in outcomes {
            aggregate.libraries.push(key.clone());
            match outcome {
                Ok(items) => aggregate.items.extend(items),
                Err(message) => {
                    aggregate.errors.insert(key, message);
                }
            }
        }
        aggregate
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("accounts", &self.slots.len())
            .field("active", &self.active_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_unlabeled_accounts_rejected() {
        let accounts = vec![
            Account::new("shemesh", "111", "pw"),
            Account::new("shemesh", "111", "pw2"),
        ];
        let error = Aggregator::new(accounts).unwrap_err();
        assert!(matches!(error, AggregateError::DuplicateAccount { .. }));
        assert!(error.to_string().contains("shemesh:111"));
    }

    #[test]
    fn test_same_library_distinct_labels_accepted() {
        let accounts = vec![
            Account::with_label("shemesh", "111", "pw", "parent"),
            Account::with_label("shemesh", "222", "pw", "child"),
        ];
        let aggregator = Aggregator::new(accounts).unwrap();
        assert_eq!(aggregator.accounts().count(), 2);
        assert_eq!(
            aggregator.state(&AccountKey::new("shemesh", "parent")),
            Some(AccountState::NotLoggedIn)
        );
    }

    #[test]
    fn test_from_slugs_shares_credentials() {
        let slugs = vec!["shemesh".to_string(), "betshemesh".to_string()];
        let aggregator = Aggregator::from_slugs(&slugs, "111", "pw").unwrap();
        let usernames: Vec<&str> = aggregator
            .accounts()
            .map(|account| account.username.as_str())
            .collect();
        assert_eq!(usernames, ["111", "111"]);
    }
}
