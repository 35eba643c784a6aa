//! Library IL Core Library
//!
//! Client and aggregation layer for the library.org.il family of Israeli
//! public-library portals: authenticate per account, scrape checked out
//! books and checkout history out of the portal HTML, renew loans, and
//! merge results from many accounts into unified, exportable views.
//!
//! # Architecture
//!
//! - [`account`] - account credentials and typed identity keys
//! - [`cli`] - command line argument definitions
//! - [`model`] - record types produced by scraping
//! - [`parser`] - pure HTML-to-record extraction
//! - [`client`] - authenticated per-portal session client
//! - [`aggregate`] - concurrent multi-account fan-out and merged views
//! - [`config`] - accounts file and environment credentials
//! - [`export`] - CSV / Markdown rendering

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod account;
pub mod aggregate;
pub mod cli;
pub mod client;
pub mod config;
pub mod export;
pub mod model;
pub mod parser;

// Re-export commonly used types
pub use account::{Account, AccountKey};
pub use aggregate::{
    AccountState, AggregateError, AggregatedBooks, AggregatedHistory, Aggregator, LoginOutcome,
};
pub use client::{ClientError, LibraryClient, PortalClient};
pub use model::{CheckedOutBook, HistoryItem, RenewalResult};
