//! Error types for portal sessions.
//!
//! Variants carry the slug/URL context the underlying errors lack, via
//! helper constructors rather than blanket `From` impls.

use thiserror::Error;

/// Errors raised by a portal session client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Credential or session-establishment fault.
    #[error("login failed for {slug}: {reason}")]
    Login {
        /// Portal the login targeted.
        slug: String,
        /// Human-readable cause.
        reason: String,
    },

    /// An authenticated call found the session invalidated (redirect back
    /// to the login page). Distinct from [`ClientError::Login`] so callers
    /// can tell "never got in" from "got kicked out".
    #[error("session expired for {slug}: login again to continue")]
    SessionExpired {
        /// Portal whose session died.
        slug: String,
    },

    /// Authenticated call made before `login()`.
    #[error("not logged in to {slug}: call login() first")]
    NotLoggedIn {
        /// Portal the call targeted.
        slug: String,
    },

    /// Network-level fault (DNS, connect, TLS, body read).
    #[error("network error talking to {url}: {source}")]
    Network {
        /// Request URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP response from the portal.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// A portal path could not be joined onto the base URL.
    #[error("invalid portal URL: {url}")]
    InvalidUrl {
        /// The offending URL or path.
        url: String,
    },

    /// HTTP client construction failed.
    #[error("failed to build HTTP client for {slug}: {reason}")]
    Build {
        /// Portal the client was for.
        slug: String,
        /// Builder error text.
        reason: String,
    },
}

impl ClientError {
    /// Creates a login error.
    pub fn login(slug: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Login {
            slug: slug.into(),
            reason: reason.into(),
        }
    }

    /// Creates a session-expired error.
    pub fn session_expired(slug: impl Into<String>) -> Self {
        Self::SessionExpired { slug: slug.into() }
    }

    /// Creates a not-logged-in error.
    pub fn not_logged_in(slug: impl Into<String>) -> Self {
        Self::NotLoggedIn { slug: slug.into() }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a client construction error.
    pub fn build(slug: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Build {
            slug: slug.into(),
            reason: reason.into(),
        }
    }

    /// True when this error means the session died and a fresh login is
    /// needed.
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_error_display_names_account_and_cause() {
        let error = ClientError::login("shemesh", "credentials may be incorrect");
        let msg = error.to_string();
        assert!(msg.contains("shemesh"), "Expected slug in: {msg}");
        assert!(
            msg.contains("credentials may be incorrect"),
            "Expected cause in: {msg}"
        );
    }

    #[test]
    fn test_session_expired_is_distinct_from_login() {
        let expired = ClientError::session_expired("shemesh");
        assert!(expired.is_session_expired());
        assert!(!ClientError::login("shemesh", "x").is_session_expired());
        assert!(expired.to_string().contains("login again"));
    }

    #[test]
    fn test_http_status_display() {
        let error = ClientError::http_status("https://shemesh.library.org.il/mng", 503);
        let msg = error.to_string();
        assert!(msg.contains("503"), "Expected status in: {msg}");
        assert!(msg.contains("/mng"), "Expected URL in: {msg}");
    }
}
