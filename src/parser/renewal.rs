//! Interpretation of the renewal submission response.
//!
//! The portal answers a renewal POST with a full loans page plus a system
//! message. Success and failure are detected from Hebrew keywords in the
//! page text; new due dates come from re-reading the embedded loans table.

use std::collections::HashMap;

use chrono::NaiveDate;
use scraper::Html;

use super::loans::parse_loans_page;
use super::{compile_static_selector, element_text};

/// Keywords indicating the renewal went through.
const SUCCESS_KEYWORDS: [&str; 4] = ["הוארך", "הצלחה", "חודש", "הארכה בוצעה"];

/// Keywords indicating the renewal was declined.
const ERROR_KEYWORDS: [&str; 4] = ["שגיאה", "נכשל", "לא ניתן", "אי אפשר"];

/// Parsed outcome of a renewal submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalOutcome {
    /// Whether the page reports success (and no error keyword).
    pub succeeded: bool,
    /// The system message shown to the patron, verbatim.
    pub message: String,
    /// New due date per barcode, from the refreshed loans table.
    pub due_dates: HashMap<String, NaiveDate>,
}

/// Parses the response page of a renewal POST.
#[must_use]
pub fn parse_renewal_outcome(html: &str, library_slug: &str) -> RenewalOutcome {
    let document = Html::parse_document(html);

    let message_selector = compile_static_selector("#system-message-container");
    let message = document
        .select(&message_selector)
        .next()
        .map(element_text)
        .unwrap_or_default();

    let page_text = document
        .root_element()
        .text()
        .collect::<String>();

    let has_success = SUCCESS_KEYWORDS.iter().any(|kw| page_text.contains(kw));
    let has_error = ERROR_KEYWORDS.iter().any(|kw| page_text.contains(kw));

    let due_dates = parse_loans_page(html, library_slug)
        .into_iter()
        .filter_map(|book| Some((book.barcode?, book.due_date?)))
        .collect();

    RenewalOutcome {
        succeeded: has_success && !has_error,
        message,
        due_dates,
    }
}
