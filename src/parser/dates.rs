//! Date parsing for portal-rendered date strings.
//!
//! The portals render dates as `DD/MM/YYYY`, often prefixed with a Hebrew
//! day name ("רביעי, 17/12/2025"). Older templates use dash or dot
//! separators.

use chrono::NaiveDate;

/// Hebrew day names stripped before parsing.
const HEBREW_DAY_NAMES: [&str; 7] = [
    "ראשון", "שני", "שלישי", "רביעי", "חמישי", "שישי", "שבת",
];

/// Formats observed across portal templates, tried in order.
const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d", "%d.%m.%Y"];

/// Parses a portal date string, returning `None` for anything unparseable.
///
/// Unparseable input is common (empty cells, "ימים נותרים" counters landing
/// in the wrong column), so this never errors.
#[must_use]
pub fn parse_portal_date(raw: &str) -> Option<NaiveDate> {
    let mut text = raw.trim().to_string();
    for day in HEBREW_DAY_NAMES {
        text = text.replace(day, "");
    }
    let text = text.trim().trim_start_matches([',', ' ']).trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}
