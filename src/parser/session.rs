//! Inspection of the page returned by a login submission.
//!
//! Joomla does not answer a login POST with a status code we can trust;
//! the outcome has to be read off the markup. This module classifies the
//! page, and the client combines the classification with the final URL
//! (a redirect to `/profile` also means success).

use scraper::Html;

use super::{compile_static_selector, element_text};

/// Classification of a post-login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginCheck {
    /// An explicit error alert is on the page.
    ErrorMessage(String),
    /// Markers only rendered for authenticated users are present.
    LoggedIn,
    /// The login form is still being shown; optional system message.
    StillOnLoginForm(Option<String>),
    /// No form, no markers: the redirect landed on some other page.
    NoSignals,
}

/// Classifies the page returned by the login POST.
#[must_use]
pub fn inspect_login_page(html: &str) -> LoginCheck {
    let document = Html::parse_document(html);

    let alert_selector = compile_static_selector(".alert-error, .alert-danger");
    if let Some(alert) = document.select(&alert_selector).next() {
        return LoginCheck::ErrorMessage(element_text(alert));
    }

    // The user-loans menu link only renders for a logged-in patron.
    let loans_link_selector = compile_static_selector(r#"a[href="/user-loans"]"#);
    if document.select(&loans_link_selector).next().is_some() {
        return LoginCheck::LoggedIn;
    }

    let login_form_selector = compile_static_selector("form#login-form");
    if document.select(&login_form_selector).next().is_some() {
        let message_selector = compile_static_selector("#system-message-container");
        let message = document
            .select(&message_selector)
            .next()
            .map(element_text)
            .filter(|text| !text.is_empty());
        return LoginCheck::StillOnLoginForm(message);
    }

    LoginCheck::NoSignals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_error_reported_with_text() {
        let html = r#"<div class="alert-error">שם משתמש או סיסמה שגויים</div>"#;
        assert_eq!(
            inspect_login_page(html),
            LoginCheck::ErrorMessage("שם משתמש או סיסמה שגויים".to_string())
        );
    }

    #[test]
    fn test_alert_danger_also_counts() {
        let html = r#"<div class="alert-danger">חשבון נעול</div>"#;
        assert!(matches!(
            inspect_login_page(html),
            LoginCheck::ErrorMessage(_)
        ));
    }

    #[test]
    fn test_user_loans_link_means_logged_in() {
        let html = r#"<nav><a href="/user-loans">ההשאלות שלי</a></nav>"#;
        assert_eq!(inspect_login_page(html), LoginCheck::LoggedIn);
    }

    #[test]
    fn test_login_form_with_system_message() {
        let html = r#"
            <div id="system-message-container">פרטי ההתחברות שגויים</div>
            <form id="login-form"><input name="username"></form>
        "#;
        assert_eq!(
            inspect_login_page(html),
            LoginCheck::StillOnLoginForm(Some("פרטי ההתחברות שגויים".to_string()))
        );
    }

    #[test]
    fn test_login_form_without_message() {
        let html = r#"<form id="login-form"></form>"#;
        assert_eq!(inspect_login_page(html), LoginCheck::StillOnLoginForm(None));
    }

    #[test]
    fn test_unrelated_page_has_no_signals() {
        assert_eq!(
            inspect_login_page("<html><body><p>ברוכים הבאים</p></body></html>"),
            LoginCheck::NoSignals
        );
    }
}
