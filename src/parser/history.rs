//! Extraction of checkout history from the loans-history page.
//!
//! Unlike the loans table, the history table carries enough headers to map
//! columns by name, so extraction is positional against a header-keyword
//! index instead of content classification.

use scraper::{ElementRef, Html};

use crate::model::HistoryItem;

use super::dates::parse_portal_date;
use super::{compile_static_selector, element_text};

/// Header keyword identifying the history table (the loans table has no
/// author column).
const HISTORY_HEADER_KEYWORD: &str = "מחבר";

/// Column positions resolved from the table headers.
#[derive(Debug, Default, Clone, Copy)]
struct ColumnIndices {
    media: Option<usize>,
    barcode: Option<usize>,
    author: Option<usize>,
    title: Option<usize>,
    checkout_date: Option<usize>,
    return_date: Option<usize>,
}

impl ColumnIndices {
    fn from_headers(headers: &[String]) -> Self {
        Self {
            media: header_index(headers, "מדיה"),
            barcode: header_index(headers, "מספר עותק"),
            author: header_index(headers, "מחבר"),
            title: header_index(headers, "כותר"),
            checkout_date: header_index(headers, "תאריך השאלה"),
            return_date: header_index(headers, "תאריך החזרה"),
        }
    }
}

fn header_index(headers: &[String], keyword: &str) -> Option<usize> {
    headers.iter().position(|header| header.contains(keyword))
}

/// Parses the `/loans-history` page into history items.
///
/// Rows without a title are skipped; one bad row never aborts the rest.
#[must_use]
pub fn parse_history_page(html: &str, library_slug: &str) -> Vec<HistoryItem> {
    let document = Html::parse_document(html);
    let table_selector = compile_static_selector("table");
    let header_selector = compile_static_selector("th");
    let row_selector = compile_static_selector("tr");
    let cell_selector = compile_static_selector("td");

    let mut items = Vec::new();

    for table in document.select(&table_selector) {
        let headers: Vec<String> = table
            .select(&header_selector)
            .map(element_text)
            .collect();
        if !headers
            .iter()
            .any(|header| header.contains(HISTORY_HEADER_KEYWORD))
        {
            continue;
        }

        let columns = ColumnIndices::from_headers(&headers);

        for row in table.select(&row_selector) {
            let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
            if cells.len() < 4 {
                continue;
            }
            if let Some(item) = parse_history_row(&cells, columns, library_slug) {
                items.push(item);
            }
        }
    }

    items
}

fn parse_history_row(
    cells: &[ElementRef<'_>],
    columns: ColumnIndices,
    library_slug: &str,
) -> Option<HistoryItem> {
    let texts: Vec<String> = cells.iter().map(|cell| element_text(*cell)).collect();

    let cell = |index: Option<usize>| -> Option<&str> {
        index
            .and_then(|i| texts.get(i))
            .map(String::as_str)
            .filter(|text| !text.is_empty())
    };

    Some(HistoryItem {
        title: cell(columns.title)?.to_string(),
        author: cell(columns.author).map(str::to_string),
        barcode: cell(columns.barcode).map(str::to_string),
        media_type: cell(columns.media).map(str::to_string),
        checkout_date: cell(columns.checkout_date).and_then(parse_portal_date),
        return_date: cell(columns.return_date).and_then(parse_portal_date),
        library_slug: library_slug.to_string(),
        account: None,
    })
}
