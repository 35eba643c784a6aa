//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::export::ExportFormat;

/// Aggregate loans and checkout history across library.org.il accounts.
///
/// Logs in to every configured account in parallel, scrapes the loans and
/// history pages, and prints (or exports) a merged view. Partial failures
/// are reported inline; the exit code is non-zero only when every account
/// fails to login.
#[derive(Parser, Debug)]
#[command(name = "library-il")]
#[command(author, version, about)]
pub struct Args {
    /// Path to JSON config file with account credentials
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Library slugs (used with --username/--password or env credentials)
    #[arg(short = 'l', long, num_args = 1..)]
    pub libraries: Vec<String>,

    /// Username (Teudat Zehut); falls back to TEUDAT_ZEHUT
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password; falls back to LIBRARY_PASSWORD, then TEUDAT_ZEHUT
    #[arg(short, long)]
    pub password: Option<String>,

    /// Show currently checked out books
    #[arg(short, long)]
    pub books: bool,

    /// Show checkout history
    #[arg(short = 'H', long)]
    pub history: bool,

    /// Show both books and history (default when nothing is selected)
    #[arg(short, long)]
    pub all: bool,

    /// Limit number of rows per section (0 = no limit)
    #[arg(short = 'n', long, default_value_t = 0)]
    pub limit: usize,

    /// Export results to a file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export file format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Csv)]
    pub format: FormatArg,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Whether the books section was requested (directly or via default).
    #[must_use]
    pub fn wants_books(&self) -> bool {
        self.books || self.all || (!self.books && !self.history)
    }

    /// Whether the history section was requested (directly or via default).
    #[must_use]
    pub fn wants_history(&self) -> bool {
        self.history || self.all || (!self.books && !self.history)
    }
}

/// Export format flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// UTF-8 CSV with a BOM.
    Csv,
    /// GitHub-style Markdown tables.
    Markdown,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => Self::Csv,
            FormatArg::Markdown => Self::Markdown,
        }
    }
}
