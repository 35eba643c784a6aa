//! Rendering of aggregated results to CSV, Markdown, and console tables.
//!
//! Titles and authors are Hebrew-script text, so everything here is UTF-8;
//! the CSV rendering is prefixed with a BOM because Excel otherwise guesses
//! a legacy codepage and mangles the Hebrew.

/// One exportable block: a titled table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section heading.
    pub title: String,
    /// Column headers.
    pub headers: Vec<String>,
    /// Table rows.
    pub rows: Vec<Vec<String>>,
}

/// Output format for file export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// UTF-8 (BOM) CSV with one titled block per section.
    Csv,
    /// GitHub-style Markdown tables.
    Markdown,
}

/// Renders sections in the requested format.
#[must_use]
pub fn render(sections: &[Section], format: ExportFormat) -> String {
    match format {
        ExportFormat::Csv => render_csv(sections),
        ExportFormat::Markdown => render_markdown(sections),
    }
}

/// Renders sections as CSV with a UTF-8 BOM, sections separated by a blank
/// row.
#[must_use]
pub fn render_csv(sections: &[Section]) -> String {
    let mut out = String::from("\u{feff}");
    for (index, section) in sections.iter().enumerate() {
        if index > 0 {
            out.push_str("\r\n");
        }
        out.push_str(&csv_row(std::slice::from_ref(&section.title)));
        out.push_str(&csv_row(&section.headers));
        for row in &section.rows {
            out.push_str(&csv_row(row));
        }
    }
    out
}

fn csv_row(fields: &[String]) -> String {
    let mut row = fields
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}

/// RFC 4180 quoting: wrap when the field contains a comma, quote, or line
/// break; double embedded quotes.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Renders sections as Markdown with `##` headings and pipe tables.
#[must_use]
pub fn render_markdown(sections: &[Section]) -> String {
    let mut out = String::new();
    for (index, section) in sections.iter().enumerate() {
        if index > 0 {
            out.push_str("\n\n");
        }
        out.push_str(&format!("## {}\n\n", section.title));
        out.push_str(&markdown_table(&section.headers, &section.rows));
    }
    out
}

/// Builds an aligned pipe table; also used for console display.
#[must_use]
pub fn markdown_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().take(columns).enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&table_row(headers, &widths));
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat((*w).max(3))).collect();
    out.push_str(&table_row(&separator, &widths));
    for row in rows {
        out.push_str(&table_row(row, &widths));
    }
    out
}

fn table_row(cells: &[String], widths: &[usize]) -> String {
    let mut row = String::from("|");
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map_or("", String::as_str);
        let cell = escape_pipes(cell);
        let padding = width.saturating_sub(cell.chars().count());
        row.push_str(&format!(" {cell}{} |", " ".repeat(padding)));
    }
    row.push('\n');
    row
}

fn escape_pipes(value: &str) -> String {
    value.replace('|', "\\|")
}

/// Truncates text to at most `width` chars, appending an ellipsis if
/// truncated.
#[must_use]
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let length = text.chars().count();
    if length <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    if width == 1 {
        return "…".to_string();
    }

    let mut output: String = text.chars().take(width - 1).collect();
    output.push('…');
    output
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn section() -> Section {
        Section {
            title: "Currently Checked Out Books".to_string(),
            headers: vec!["Library".to_string(), "Title".to_string()],
            rows: vec![
                vec!["shemesh:parent".to_string(), "הארי פוטר".to_string()],
                vec!["betshemesh:111".to_string(), "ספר עם, פסיק".to_string()],
            ],
        }
    }

    #[test]
    fn test_csv_starts_with_bom_for_excel() {
        let csv = render_csv(&[section()]);
        assert!(csv.starts_with('\u{feff}'));
    }

    #[test]
    fn test_csv_quotes_fields_with_commas() {
        let csv = render_csv(&[section()]);
        assert!(csv.contains("\"ספר עם, פסיק\""));
    }

    #[test]
    fn test_csv_doubles_embedded_quotes() {
        assert_eq!(csv_field("a \"b\" c"), "\"a \"\"b\"\" c\"");
    }

    #[test]
    fn test_csv_sections_separated_by_blank_row() {
        let csv = render_csv(&[section(), section()]);
        assert!(csv.contains("\r\n\r\nCurrently Checked Out Books"));
    }

    #[test]
    fn test_markdown_has_heading_and_separator() {
        let md = render_markdown(&[section()]);
        assert!(md.starts_with("## Currently Checked Out Books\n\n"));
        assert!(md.contains("| Library"));
        assert!(md.lines().nth(3).unwrap().contains("---"));
    }

    #[test]
    fn test_markdown_escapes_pipes_in_cells() {
        let mut section = section();
        section.rows[0][1] = "a|b".to_string();
        let md = render_markdown(&[section]);
        assert!(md.contains("a\\|b"));
    }

    #[test]
    fn test_truncate_to_width_handles_hebrew() {
        assert_eq!(truncate_to_width("הארי פוטר", 20), "הארי פוטר");
        assert_eq!(truncate_to_width("הארי פוטר ואבן החכמים", 6), "הארי …");
        assert_eq!(truncate_to_width("abc", 1), "…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }
}
