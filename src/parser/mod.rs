//! Pure HTML-to-record extraction for portal pages.
//!
//! The portals are Joomla sites rendering data as table markup; everything
//! in this module is a pure function from an HTML document to structured
//! records. No network access, no session state. A malformed row degrades
//! to "skip this row" and never aborts the rest of the document.
//!
//! - [`loans`] - currently checked out books (`/user-loans`)
//! - [`history`] - checkout history (`/loans-history`)
//! - [`renewal`] - renewal submission response
//! - [`session`] - login/session page inspection
//! - [`dates`] - Hebrew-aware portal date parsing

pub mod dates;
pub mod history;
pub mod loans;
pub mod renewal;
pub mod session;

pub use history::parse_history_page;
pub use loans::parse_loans_page;
pub use renewal::{RenewalOutcome, parse_renewal_outcome};
pub use session::{LoginCheck, inspect_login_page};

use scraper::{ElementRef, Html, Selector};

/// Compiles a developer-authored CSS selector, panicking on invalid input.
///
/// Only used with static selector literals.
pub(crate) fn compile_static_selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid static selector '{css}': {e:?}"))
}

/// Concatenated, whitespace-collapsed text of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts the Joomla CSRF token from a page containing a form.
///
/// Joomla emits the token as a hidden input whose *name* is 32 lowercase
/// hex characters (the value is always "1").
#[must_use]
pub fn csrf_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let hidden = compile_static_selector(r#"input[type="hidden"]"#);

    document.select(&hidden).find_map(|input| {
        let name = input.value().attr("name")?;
        (name.len() == 32
            && name
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()))
        .then(|| name.to_string())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_csrf_token_found_in_login_form() {
        let html = r#"
            <form id="login-form">
                <input type="hidden" name="return" value="">
                <input type="hidden" name="a1b2c3d4e5f60718293a4b5c6d7e8f90" value="1">
            </form>
        "#;
        assert_eq!(
            csrf_token(html).unwrap(),
            "a1b2c3d4e5f60718293a4b5c6d7e8f90"
        );
    }

    #[test]
    fn test_csrf_token_ignores_wrong_length_and_case() {
        let html = r#"
            <input type="hidden" name="short" value="1">
            <input type="hidden" name="A1B2C3D4E5F60718293A4B5C6D7E8F90" value="1">
        "#;
        assert!(csrf_token(html).is_none());
    }

    #[test]
    fn test_csrf_token_requires_hidden_inputs() {
        let html = r#"<input type="text" name="a1b2c3d4e5f60718293a4b5c6d7e8f90">"#;
        assert!(csrf_token(html).is_none());
    }

    #[test]
    fn test_element_text_collapses_nested_whitespace() {
        let html = Html::parse_fragment("<table><tr><td>  הארי\n  <a>פוטר</a> </td></tr></table>");
        let td = html.select(&compile_static_selector("td")).next().unwrap();
        assert_eq!(element_text(td), "הארי פוטר");
    }
}
