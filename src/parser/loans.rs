//! Extraction of currently checked out books from the loans page.
//!
//! The loans table has no stable column order across portal templates, so
//! cells are classified by content: the renewal checkbox carries the
//! barcode, media types come from a known keyword set, dates appear in
//! checkout-then-due order, and the longest remaining text is the title.

use scraper::{ElementRef, Html};

use crate::model::CheckedOutBook;

use super::dates::parse_portal_date;
use super::{compile_static_selector, element_text};

/// Media type labels the portals use in the loans table.
const MEDIA_TYPE_KEYWORDS: [&str; 4] = ["ספרים", "סרטים", "תקליטורים", "כתבי עת"];

/// Header keyword identifying the loans table.
const LOANS_HEADER_KEYWORD: &str = "כותר";

/// Parses the `/user-loans` page into checked out books.
///
/// Rows that cannot be interpreted (no title, too few cells) are skipped;
/// one bad row never aborts the rest of the table.
#[must_use]
pub fn parse_loans_page(html: &str, library_slug: &str) -> Vec<CheckedOutBook> {
    let document = Html::parse_document(html);
    let table_selector = compile_static_selector("table");
    let header_selector = compile_static_selector("th");
    let row_selector = compile_static_selector("tr");
    let cell_selector = compile_static_selector("td");

    let mut books = Vec::new();

    for table in document.select(&table_selector) {
        let is_loans_table = table
            .select(&header_selector)
            .any(|th| element_text(th).contains(LOANS_HEADER_KEYWORD));
        if !is_loans_table {
            continue;
        }

        for row in table.select(&row_selector) {
            let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
            if cells.len() < 5 {
                continue;
            }
            if let Some(book) = parse_loan_row(row, &cells, library_slug) {
                books.push(book);
            }
        }
    }

    books
}

fn parse_loan_row(
    row: ElementRef<'_>,
    cells: &[ElementRef<'_>],
    library_slug: &str,
) -> Option<CheckedOutBook> {
    let checkbox_selector = compile_static_selector(r#"input[name="cid[]"]"#);
    let link_selector = compile_static_selector("a");

    // The renewal checkbox value is the copy barcode.
    let checkbox = row.select(&checkbox_selector).next();
    let mut barcode = checkbox
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string);

    let mut media_type = None;
    let mut title = None;
    let mut checkout_date = None;
    let mut due_date = None;

    for cell in cells {
        let text = element_text(*cell);

        // Barcode column sometimes renders as a catalog link.
        if cell.select(&link_selector).next().is_some() && is_all_digits(&text) {
            if barcode.is_none() && !text.is_empty() {
                barcode = Some(text);
            }
            continue;
        }

        if MEDIA_TYPE_KEYWORDS.contains(&text.as_str()) {
            media_type = Some(text);
            continue;
        }

        if let Some(parsed) = parse_portal_date(&text) {
            if checkout_date.is_none() {
                checkout_date = Some(parsed);
            } else if due_date.is_none() {
                due_date = Some(parsed);
            }
            continue;
        }

        // Row number and days-remaining columns are bare digits.
        if is_all_digits(&text) {
            continue;
        }

        if text.chars().count() > 2 {
            title = Some(text);
        }
    }

    Some(CheckedOutBook {
        title: title?,
        author: None,
        barcode,
        media_type,
        checkout_date,
        due_date,
        library_slug: library_slug.to_string(),
        can_renew: checkbox.is_some(),
        account: None,
    })
}

fn is_all_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const LOANS_PAGE: &str = r#"
        <html><body>
        <table>
            <tr>
                <th></th><th>מס</th><th>מדיה</th><th>מספר עותק</th><th>כותר</th>
                <th>תאריך השאלה</th><th>תאריך החזרה</th><th>ימים נותרים</th>
            </tr>
            <tr>
                <td><input type="checkbox" name="cid[]" value="1000123"></td>
                <td>1</td>
                <td>ספרים</td>
                <td><a href="/details">1000123</a></td>
                <td>הארי פוטר ואבן החכמים</td>
                <td>רביעי, 19/11/2025</td>
                <td>17/12/2025</td>
                <td>28</td>
            </tr>
            <tr>
                <td></td>
                <td>2</td>
                <td>סרטים</td>
                <td><a href="/details">1000456</a></td>
                <td>מסע בין כוכבים</td>
                <td>19/11/2025</td>
                <td></td>
                <td>12</td>
            </tr>
            <tr>
                <td></td><td>3</td><td></td><td></td><td></td><td></td><td></td><td></td>
            </tr>
        </table>
        </body></html>
    "#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parses_full_row() {
        let books = parse_loans_page(LOANS_PAGE, "shemesh");
        assert_eq!(books.len(), 2);

        let first = &books[0];
        assert_eq!(first.title, "הארי פוטר ואבן החכמים");
        assert_eq!(first.barcode.as_deref(), Some("1000123"));
        assert_eq!(first.media_type.as_deref(), Some("ספרים"));
        assert_eq!(first.checkout_date, Some(date(2025, 11, 19)));
        assert_eq!(first.due_date, Some(date(2025, 12, 17)));
        assert_eq!(first.library_slug, "shemesh");
        assert!(first.can_renew);
    }

    #[test]
    fn test_row_without_checkbox_is_not_renewable() {
        let books = parse_loans_page(LOANS_PAGE, "shemesh");
        let second = &books[1];
        assert!(!second.can_renew);
        // Barcode recovered from the catalog link instead.
        assert_eq!(second.barcode.as_deref(), Some("1000456"));
    }

    #[test]
    fn test_row_missing_due_date_still_parses() {
        let books = parse_loans_page(LOANS_PAGE, "shemesh");
        assert_eq!(books[1].checkout_date, Some(date(2025, 11, 19)));
        assert_eq!(books[1].due_date, None);
    }

    #[test]
    fn test_titleless_row_is_skipped_without_aborting() {
        // The third row has cells but no title; the first two still parse.
        let books = parse_loans_page(LOANS_PAGE, "shemesh");
        assert_eq!(books.len(), 2);
    }

    #[test]
    fn test_tables_without_title_header_are_ignored() {
        let html = r#"
            <table><tr><th>something</th></tr>
            <tr><td>a</td><td>b</td><td>c</td><td>d</td><td>e</td></tr></table>
        "#;
        assert!(parse_loans_page(html, "shemesh").is_empty());
    }

    #[test]
    fn test_parsing_is_idempotent() {
        assert_eq!(
            parse_loans_page(LOANS_PAGE, "shemesh"),
            parse_loans_page(LOANS_PAGE, "shemesh")
        );
    }
}
