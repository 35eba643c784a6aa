//! Shared HTTP client construction policy for portal sessions.
//!
//! Centralizes networking defaults so every session client stays consistent
//! on timeouts, headers, compression, and cookie handling. The portals are
//! cookie-session Joomla sites and reject clients that do not look like a
//! browser, hence the browser User-Agent and Hebrew Accept-Language.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};

use super::ClientError;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

const PORTAL_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const PORTAL_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const PORTAL_ACCEPT_LANGUAGE: &str = "he-IL,he;q=0.9,en-US;q=0.8,en;q=0.7";

/// Builds the HTTP client for one portal session.
///
/// The cookie store is the session: login deposits the Joomla session
/// cookie and every later call rides on it. Redirects are followed so the
/// post-login and session-expiry redirects can be observed via the final
/// URL.
///
/// # Errors
///
/// Returns [`ClientError::Build`] when client construction fails.
pub fn build_portal_http_client(slug: &str) -> Result<Client, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(PORTAL_ACCEPT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(PORTAL_ACCEPT_LANGUAGE),
    );

    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
        .user_agent(PORTAL_USER_AGENT)
        .default_headers(headers)
        .cookie_store(true)
        .gzip(true)
        .build()
        .map_err(|error| ClientError::build(slug, error.to_string()))
}
