//! Merged, cross-account views of books and history.
//!
//! Invariant: every account queried by an aggregate call appears exactly
//! once — either contributing items or in the error map, never silently
//! dropped.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::account::AccountKey;
use crate::model::{CheckedOutBook, HistoryItem};

/// Checked out books merged from every queried account.
#[derive(Debug, Default, Clone)]
pub struct AggregatedBooks {
    /// Merged books in completion order.
    pub books: Vec<CheckedOutBook>,
    /// Accounts a fetch was attempted for.
    pub libraries: Vec<AccountKey>,
    /// Per-account failure messages.
    pub errors: BTreeMap<AccountKey, String>,
}

impl AggregatedBooks {
    /// Total number of books across all accounts.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.books.len()
    }

    /// Books grouped by library slug.
    #[must_use]
    pub fn by_library(&self) -> BTreeMap<&str, Vec<&CheckedOutBook>> {
        let mut groups: BTreeMap<&str, Vec<&CheckedOutBook>> = BTreeMap::new();
        for book in &self.books {
            groups.entry(book.library_slug.as_str()).or_default().push(book);
        }
        groups
    }

    /// All books sorted ascending by due date.
    ///
    /// Undated entries sort after every dated entry, preserving their
    /// relative insertion order (stable sort on date presence only).
    #[must_use]
    pub fn sorted_by_due_date(&self) -> Vec<CheckedOutBook> {
        let mut books = self.books.clone();
        books.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        books
    }
}

/// Checkout history merged from every queried account.
#[derive(Debug, Default, Clone)]
pub struct AggregatedHistory {
    /// Merged history items in completion order.
    pub items: Vec<HistoryItem>,
    /// Accounts a fetch was attempted for.
    pub libraries: Vec<AccountKey>,
    /// Per-account failure messages.
    pub errors: BTreeMap<AccountKey, String>,
}

impl AggregatedHistory {
    /// Total number of history items across all accounts.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.items.len()
    }

    /// History grouped by library slug.
    #[must_use]
    pub fn by_library(&self) -> BTreeMap<&str, Vec<&HistoryItem>> {
        let mut groups: BTreeMap<&str, Vec<&HistoryItem>> = BTreeMap::new();
        for item in &self.items {
            groups.entry(item.library_slug.as_str()).or_default().push(item);
        }
        groups
    }

    /// All items sorted by return date, newest first by default.
    ///
    /// Items with no return date sort last regardless of direction,
    /// preserving relative insertion order.
    #[must_use]
    pub fn sorted_by_return_date(&self, descending: bool) -> Vec<HistoryItem> {
        let mut items = self.items.clone();
        items.sort_by(|a, b| match (a.return_date, b.return_date) {
            (Some(left), Some(right)) => {
                if descending {
                    right.cmp(&left)
                } else {
                    left.cmp(&right)
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        items
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn book(title: &str, due: Option<NaiveDate>) -> CheckedOutBook {
        let mut book = CheckedOutBook::untracked(title, "shemesh");
        book.due_date = due;
        book
    }

    fn history_item(title: &str, returned: Option<NaiveDate>) -> HistoryItem {
        HistoryItem {
            title: title.to_string(),
            author: None,
            barcode: None,
            media_type: None,
            checkout_date: None,
            return_date: returned,
            library_slug: "shemesh".to_string(),
            account: None,
        }
    }

    #[test]
    fn test_sorted_by_due_date_puts_undated_last_stably() {
        let aggregate = AggregatedBooks {
            books: vec![
                book("undated-a", None),
                book("late", Some(date(2026, 2, 1))),
                book("undated-b", None),
                book("soon", Some(date(2025, 12, 1))),
            ],
            ..AggregatedBooks::default()
        };

        let titles: Vec<String> = aggregate
            .sorted_by_due_date()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, ["soon", "late", "undated-a", "undated-b"]);
    }

    #[test]
    fn test_sorted_by_return_date_descending_with_none_last() {
        let aggregate = AggregatedHistory {
            items: vec![
                history_item("january", Some(date(2025, 1, 1))),
                history_item("march", Some(date(2025, 3, 1))),
                history_item("unreturned", None),
            ],
            ..AggregatedHistory::default()
        };

        let titles: Vec<String> = aggregate
            .sorted_by_return_date(true)
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, ["march", "january", "unreturned"]);
    }

    #[test]
    fn test_sorted_by_return_date_ascending_still_puts_none_last() {
        let aggregate = AggregatedHistory {
            items: vec![
                history_item("unreturned", None),
                history_item("march", Some(date(2025, 3, 1))),
                history_item("january", Some(date(2025, 1, 1))),
            ],
            ..AggregatedHistory::default()
        };

        let titles: Vec<String> = aggregate
            .sorted_by_return_date(false)
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, ["january", "march", "unreturned"]);
    }

    #[test]
    fn test_by_library_groups_on_slug() {
        let mut other = book("elsewhere", None);
        other.library_slug = "betshemesh".to_string();
        let aggregate = AggregatedBooks {
            books: vec![book("one", None), book("two", None), other],
            ..AggregatedBooks::default()
        };

        let groups = aggregate.by_library();
        assert_eq!(groups["shemesh"].len(), 2);
        assert_eq!(groups["betshemesh"].len(), 1);
    }
}
