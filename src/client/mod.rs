//! Authenticated session client for one library.org.il portal.
//!
//! A [`LibraryClient`] owns one cookie-backed HTTP session for one
//! `(library, account)` pair: login, fetch checked out books, fetch
//! checkout history, renew. The aggregator drives clients through the
//! object-safe [`PortalClient`] trait so tests can substitute fakes.
//!
//! Every call is a single attempt; callers needing resilience must wrap
//! calls externally.

mod error;
mod http;

pub use error::ClientError;
pub use http::build_portal_http_client;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::model::{CheckedOutBook, HistoryItem, RenewalResult};
use crate::parser::{
    self, LoginCheck, parse_history_page, parse_loans_page, parse_renewal_outcome,
};

const LOGIN_PATH: &str = "/mng";
const LOGIN_SUBMIT_PATH: &str = "/mng?task=user.login";
const LOANS_PATH: &str = "/user-loans";
const HISTORY_PATH: &str = "/loans-history";
const RENEW_PATH: &str = "/index.php/user-loans?task=length&view=loans";

/// Operations the aggregator needs from a portal session.
///
/// `async_trait` keeps this object-safe for `Box<dyn PortalClient>`
/// dispatch (Rust 2024 native async traits are not object-safe).
#[async_trait]
pub trait PortalClient: Send + Sync {
    /// The portal slug this session targets.
    fn slug(&self) -> &str;

    /// Whether a login has succeeded on this session.
    fn is_logged_in(&self) -> bool;

    /// Establishes the session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Login`] on credential or markup faults, or a
    /// network-level variant when the portal is unreachable.
    async fn login(&mut self) -> Result<(), ClientError>;

    /// Fetches the currently checked out books.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SessionExpired`] when the portal bounced the
    /// call back to the login page, [`ClientError::NotLoggedIn`] before
    /// login.
    async fn checked_out_books(&self) -> Result<Vec<CheckedOutBook>, ClientError>;

    /// Fetches the checkout history.
    ///
    /// # Errors
    ///
    /// Same conditions as [`PortalClient::checked_out_books`].
    async fn checkout_history(&self) -> Result<Vec<HistoryItem>, ClientError>;

    /// Attempts to renew a batch of books.
    ///
    /// A declined renewal is reported inside the [`RenewalResult`], never
    /// as an error; books without a barcode get a failed result.
    ///
    /// # Errors
    ///
    /// Only session/network faults error; renewal refusals do not.
    async fn renew_many(&self, books: &[CheckedOutBook]) -> Result<Vec<RenewalResult>, ClientError>;

    /// Attempts to renew a single book.
    ///
    /// # Errors
    ///
    /// Same conditions as [`PortalClient::renew_many`].
    async fn renew(&self, book: &CheckedOutBook) -> Result<RenewalResult, ClientError> {
        if book.barcode.is_none() {
            return Ok(RenewalResult {
                book: book.clone(),
                success: false,
                message: "Cannot renew: no barcode available".to_string(),
                new_due_date: None,
            });
        }
        let mut results = self.renew_many(std::slice::from_ref(book)).await?;
        results
            .pop()
            .ok_or_else(|| ClientError::login(self.slug(), "empty renewal response"))
    }

    /// Renews every renewable book currently on loan.
    ///
    /// # Errors
    ///
    /// Same conditions as [`PortalClient::renew_many`].
    async fn renew_all(&self) -> Result<Vec<RenewalResult>, ClientError> {
        let books: Vec<CheckedOutBook> = self
            .checked_out_books()
            .await?
            .into_iter()
            .filter(|book| book.can_renew && book.barcode.is_some())
            .collect();
        if books.is_empty() {
            return Ok(Vec::new());
        }
        self.renew_many(&books).await
    }
}

/// Session client for one library.org.il portal.
pub struct LibraryClient {
    slug: String,
    base_url: Url,
    username: String,
    password: String,
    logged_in: bool,
    client: Client,
}

impl LibraryClient {
    /// Creates a client for `https://{slug}.library.org.il`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the base URL is invalid or HTTP client
    /// construction fails.
    pub fn new(
        slug: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let slug = slug.into();
        let base = format!("https://{slug}.library.org.il");
        Self::with_base_url(&base, slug, username, password)
    }

    /// Creates a client against an explicit base URL (for tests).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the base URL is invalid or HTTP client
    /// construction fails.
    pub fn with_base_url(
        base_url: &str,
        slug: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let slug = slug.into();
        let base_url = Url::parse(base_url).map_err(|_| ClientError::invalid_url(base_url))?;
        let client = build_portal_http_client(&slug)?;

        Ok(Self {
            slug,
            base_url,
            username: username.into(),
            password: password.into(),
            logged_in: false,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|_| ClientError::invalid_url(path))
    }

    /// True when the final URL of an authenticated call landed back on the
    /// login page: the portal redirects dead sessions to `/mng`.
    fn url_signals_expired_session(url: &Url) -> bool {
        let text = url.as_str();
        text.contains(LOGIN_PATH) && !text.contains("profile")
    }

    async fn get_html(&self, url: Url) -> Result<(Url, String), ClientError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|error| ClientError::network(url.as_str(), error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::http_status(url.as_str(), status.as_u16()));
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|error| ClientError::network(url.as_str(), error))?;
        Ok((final_url, body))
    }

    async fn authenticated_html(&self, path: &str) -> Result<String, ClientError> {
        if !self.logged_in {
            return Err(ClientError::not_logged_in(&self.slug));
        }

        let url = self.endpoint(path)?;
        let (final_url, body) = self.get_html(url).await?;

        if Self::url_signals_expired_session(&final_url) {
            return Err(ClientError::session_expired(&self.slug));
        }
        Ok(body)
    }

    /// Downloads raw HTML from a portal path using the authenticated
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotLoggedIn`] before login and
    /// [`ClientError::SessionExpired`] when the session has died.
    pub async fn download_html(&self, path: &str) -> Result<String, ClientError> {
        self.authenticated_html(path).await
    }
}

impl std::fmt::Debug for LibraryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryClient")
            .field("slug", &self.slug)
            .field("base_url", &self.base_url.as_str())
            .field("logged_in", &self.logged_in)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PortalClient for LibraryClient {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    #[tracing::instrument(skip(self), fields(slug = %self.slug))]
    async fn login(&mut self) -> Result<(), ClientError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(ClientError::login(
                &self.slug,
                "username and password are required",
            ));
        }

        // The login page carries the per-session CSRF token.
        let login_url = self.endpoint(LOGIN_PATH)?;
        let (_, login_page) = self.get_html(login_url).await?;
        let token = parser::csrf_token(&login_page);
        if token.is_none() {
            debug!(slug = %self.slug, "no CSRF token on login page; submitting without one");
        }

        let mut form: Vec<(String, String)> = vec![
            ("username".to_string(), self.username.clone()),
            ("password".to_string(), self.password.clone()),
            ("option".to_string(), "com_users".to_string()),
            ("task".to_string(), "user.login".to_string()),
            ("return".to_string(), String::new()),
        ];
        if let Some(token) = token {
            form.push((token, "1".to_string()));
        }

        let submit_url = self.endpoint(LOGIN_SUBMIT_PATH)?;
        let response = self
            .client
            .post(submit_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|error| ClientError::network(submit_url.as_str(), error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::http_status(
                submit_url.as_str(),
                status.as_u16(),
            ));
        }

        let landed_on_profile = response.url().as_str().contains("profile");
        let body = response
            .text()
            .await
            .map_err(|error| ClientError::network(submit_url.as_str(), error))?;

        match parser::inspect_login_page(&body) {
            LoginCheck::ErrorMessage(message) => {
                Err(ClientError::login(&self.slug, format!("login failed: {message}")))
            }
            LoginCheck::LoggedIn | LoginCheck::NoSignals => {
                self.logged_in = true;
                Ok(())
            }
            LoginCheck::StillOnLoginForm(_) if landed_on_profile => {
                self.logged_in = true;
                Ok(())
            }
            LoginCheck::StillOnLoginForm(message) => Err(ClientError::login(
                &self.slug,
                message.unwrap_or_else(|| "credentials may be incorrect".to_string()),
            )),
        }
    }

    #[tracing::instrument(skip(self), fields(slug = %self.slug))]
    async fn checked_out_books(&self) -> Result<Vec<CheckedOutBook>, ClientError> {
        let html = self.authenticated_html(LOANS_PATH).await?;
        Ok(parse_loans_page(&html, &self.slug))
    }

    #[tracing::instrument(skip(self), fields(slug = %self.slug))]
    async fn checkout_history(&self) -> Result<Vec<HistoryItem>, ClientError> {
        let html = self.authenticated_html(HISTORY_PATH).await?;
        Ok(parse_history_page(&html, &self.slug))
    }

    #[tracing::instrument(skip(self, books), fields(slug = %self.slug, count = books.len()))]
    async fn renew_many(&self, books: &[CheckedOutBook]) -> Result<Vec<RenewalResult>, ClientError> {
        if !self.logged_in {
            return Err(ClientError::not_logged_in(&self.slug));
        }
        if books.is_empty() {
            return Ok(Vec::new());
        }

        let barcodes: Vec<&str> = books
            .iter()
            .filter_map(|book| book.barcode.as_deref())
            .collect();

        let no_barcode_result = |book: &CheckedOutBook| RenewalResult {
            book: book.clone(),
            success: false,
            message: "Cannot renew: no barcode available".to_string(),
            new_due_date: None,
        };

        if barcodes.is_empty() {
            return Ok(books.iter().map(no_barcode_result).collect());
        }

        let mut form: Vec<(String, String)> = vec![
            ("task".to_string(), "length".to_string()),
            ("boxchecked".to_string(), barcodes.len().to_string()),
        ];
        for barcode in &barcodes {
            form.push(("cid[]".to_string(), (*barcode).to_string()));
        }

        let renew_url = self.endpoint(RENEW_PATH)?;
        let response = self
            .client
            .post(renew_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|error| ClientError::network(renew_url.as_str(), error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::http_status(renew_url.as_str(), status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|error| ClientError::network(renew_url.as_str(), error))?;
        let outcome = parse_renewal_outcome(&body, &self.slug);

        Ok(books
            .iter()
            .map(|book| {
                let Some(barcode) = book.barcode.as_deref() else {
                    return no_barcode_result(book);
                };
                RenewalResult {
                    book: book.clone(),
                    success: outcome.succeeded,
                    message: outcome.message.clone(),
                    new_due_date: outcome.due_dates.get(barcode).copied(),
                }
            })
            .collect())
    }
}
