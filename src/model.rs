//! Record types produced by scraping the portal pages.
//!
//! Every field beyond the title is optional: the portals render these
//! tables inconsistently across libraries, and a partially-understood row
//! is still worth reporting.

use std::fmt;

use chrono::NaiveDate;

use crate::account::AccountKey;

/// One book currently on loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedOutBook {
    /// Book title.
    pub title: String,
    /// Author, when the portal exposes one on the loans page.
    pub author: Option<String>,
    /// Copy barcode, taken from the renewal checkbox when present.
    pub barcode: Option<String>,
    /// Media category as shown by the portal (Hebrew text).
    pub media_type: Option<String>,
    /// Date the loan started.
    pub checkout_date: Option<NaiveDate>,
    /// Date the loan is due back.
    pub due_date: Option<NaiveDate>,
    /// Slug of the portal the book was scraped from.
    pub library_slug: String,
    /// Whether the loans page offered a renewal checkbox for this copy.
    pub can_renew: bool,
    /// The account the book belongs to; set by the aggregator.
    pub account: Option<AccountKey>,
}

impl CheckedOutBook {
    /// Creates a book with only a title and source library, everything else
    /// unknown.
    pub fn untracked(title: impl Into<String>, library_slug: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            barcode: None,
            media_type: None,
            checkout_date: None,
            due_date: None,
            library_slug: library_slug.into(),
            can_renew: false,
            account: None,
        }
    }
}

impl fmt::Display for CheckedOutBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.title, self.library_slug)?;
        if let Some(due) = self.due_date {
            write!(f, " due {due}")?;
        }
        Ok(())
    }
}

/// One past loan from the checkout history page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    /// Book title.
    pub title: String,
    /// Author, when the history table has an author column.
    pub author: Option<String>,
    /// Copy barcode.
    pub barcode: Option<String>,
    /// Media category as shown by the portal (Hebrew text).
    pub media_type: Option<String>,
    /// Date the loan started.
    pub checkout_date: Option<NaiveDate>,
    /// Date the copy was returned; `None` when still out or unrecorded.
    pub return_date: Option<NaiveDate>,
    /// Slug of the portal the item was scraped from.
    pub library_slug: String,
    /// The account the item belongs to; set by the aggregator.
    pub account: Option<AccountKey>,
}

impl fmt::Display for HistoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.title, self.library_slug)?;
        if let Some(returned) = self.return_date {
            write!(f, " returned {returned}")?;
        }
        Ok(())
    }
}

/// Outcome of one renewal attempt for one book.
///
/// A refused renewal is a `success: false` result, not an error; errors are
/// reserved for session and network faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalResult {
    /// The book the attempt was for.
    pub book: CheckedOutBook,
    /// Whether the portal accepted the renewal.
    pub success: bool,
    /// The portal's message, verbatim where available.
    pub message: String,
    /// The new due date, when the confirmation page revealed one.
    pub new_due_date: Option<NaiveDate>,
}

impl fmt::Display for RenewalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.success { '✓' } else { '✗' };
        write!(f, "{mark} {}: {}", self.book.title, self.message)?;
        if let Some(due) = self.new_due_date {
            write!(f, " (due {due})")?;
        }
        Ok(())
    }
}
