//! CLI entry point for the library-il aggregator.

use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Parser;
use library_il::cli::Args;
use library_il::export::{self, ExportFormat, Section};
use library_il::{Account, AccountKey, Aggregator, config};
use tracing::{debug, info, warn};

/// Console column caps, matching a typical 100-column terminal.
const LABEL_WIDTH: usize = 18;
const TITLE_WIDTH: usize = 58;
const AUTHOR_WIDTH: usize = 28;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let accounts = assemble_accounts(&args)?;
    let labels = display_labels(&accounts);

    let mut aggregator = Aggregator::new(accounts)?;

    println!("Logging in to {} account(s)...", labels.len());
    let login_outcomes = aggregator.login_all().await;
    for (key, outcome) in &login_outcomes {
        let label = labels.get(key).cloned().unwrap_or_else(|| key.to_string());
        if outcome.is_success() {
            println!("  ✓ {label}");
        } else {
            println!("  ✗ {label}");
        }
    }

    if !login_outcomes.values().any(library_il::LoginOutcome::is_success) {
        bail!("failed to login to any account");
    }
    println!();

    let mut sections: Vec<Section> = Vec::new();

    if args.wants_books() {
        sections.extend(show_books(&mut aggregator, &labels, args.limit).await);
    }
    if args.wants_history() {
        sections.extend(show_history(&mut aggregator, &labels, args.limit).await);
    }

    if let Some(output) = &args.output {
        if sections.is_empty() {
            info!("nothing to export");
        } else {
            let format = ExportFormat::from(args.format);
            fs::write(output, export::render(&sections, format))
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Exported to {}", output.display());
        }
    }

    Ok(())
}

/// Builds the account list from config file, CLI flags, or environment.
fn assemble_accounts(args: &Args) -> Result<Vec<Account>> {
    if let Some(path) = &args.config {
        let accounts = config::load_accounts_file(path)?;
        if accounts.is_empty() {
            bail!("config file {} contains no accounts", path.display());
        }
        return Ok(accounts);
    }

    if args.libraries.is_empty() {
        bail!(
            "no accounts configured: pass --config FILE, or --libraries SLUG... \
             with --username/--password (or TEUDAT_ZEHUT / LIBRARY_PASSWORD)"
        );
    }

    let username = args
        .username
        .clone()
        .or_else(config::env_username)
        .context("username required: use --username or set TEUDAT_ZEHUT")?;
    let password = args
        .password
        .clone()
        .or_else(config::env_password)
        .context("password required: use --password or set LIBRARY_PASSWORD")?;

    Ok(args
        .libraries
        .iter()
        .map(|slug| Account::new(slug.clone(), username.clone(), password.clone()))
        .collect())
}

/// Display label per account: the configured label when present, the full
/// `slug:username` key otherwise.
fn display_labels(accounts: &[Account]) -> BTreeMap<AccountKey, String> {
    accounts
        .iter()
        .map(|account| {
            let key = account.key();
            let label = account.label.clone().unwrap_or_else(|| key.to_string());
            (key, label)
        })
        .collect()
}

fn account_label<'a>(
    labels: &'a BTreeMap<AccountKey, String>,
    key: Option<&AccountKey>,
    slug: &'a str,
) -> &'a str {
    key.and_then(|key| labels.get(key))
        .map_or(slug, String::as_str)
}

async fn show_books(
    aggregator: &mut Aggregator,
    labels: &BTreeMap<AccountKey, String>,
    limit: usize,
) -> Option<Section> {
    println!("## Currently Checked Out Books");
    println!();

    let aggregate = aggregator.get_all_checked_out_books().await;
    for (key, message) in &aggregate.errors {
        let label = labels.get(key).cloned().unwrap_or_else(|| key.to_string());
        warn!(account = %label, "{message}");
    }

    let mut books = aggregate.sorted_by_due_date();
    if limit > 0 {
        books.truncate(limit);
    }

    if books.is_empty() {
        println!("No books currently checked out.");
        println!();
        return None;
    }

    println!("**Total: {} books**", aggregate.total_count());
    println!();

    let today = Local::now().date_naive();
    let headers = ["Library", "Title", "Due Date", "Days Remaining"];
    let mut full_rows = Vec::with_capacity(books.len());
    let mut console_rows = Vec::with_capacity(books.len());

    for book in &books {
        let label = account_label(labels, book.account.as_ref(), &book.library_slug);
        let due = book
            .due_date
            .map_or_else(|| "N/A".to_string(), |date| date.to_string());
        let days = book
            .due_date
            .map_or_else(|| "N/A".to_string(), |date| {
                (date - today).num_days().to_string()
            });

        full_rows.push(vec![
            label.to_string(),
            book.title.clone(),
            due.clone(),
            days.clone(),
        ]);
        console_rows.push(vec![
            export::truncate_to_width(label, LABEL_WIDTH),
            export::truncate_to_width(&book.title, TITLE_WIDTH),
            due,
            days,
        ]);
    }

    let headers: Vec<String> = headers.iter().map(ToString::to_string).collect();
    print!("{}", export::markdown_table(&headers, &console_rows));
    println!();

    Some(Section {
        title: "Currently Checked Out Books".to_string(),
        headers,
        rows: full_rows,
    })
}

async fn show_history(
    aggregator: &mut Aggregator,
    labels: &BTreeMap<AccountKey, String>,
    limit: usize,
) -> Option<Section> {
    println!("## Checkout History");
    println!();

    let aggregate = aggregator.get_all_checkout_history().await;
    for (key, message) in &aggregate.errors {
        let label = labels.get(key).cloned().unwrap_or_else(|| key.to_string());
        warn!(account = %label, "{message}");
    }

    let mut items = aggregate.sorted_by_return_date(true);
    if limit > 0 {
        items.truncate(limit);
    }

    if items.is_empty() {
        println!("No checkout history found.");
        println!();
        return None;
    }

    println!("**Total: {} items**", aggregate.total_count());
    println!();

    let headers = ["Library", "Title", "Author", "Return Date"];
    let mut full_rows = Vec::with_capacity(items.len());
    let mut console_rows = Vec::with_capacity(items.len());

    for item in &items {
        let label = account_label(labels, item.account.as_ref(), &item.library_slug);
        let author = item.author.clone().unwrap_or_default();
        let returned = item
            .return_date
            .map_or_else(|| "N/A".to_string(), |date| date.to_string());

        full_rows.push(vec![
            label.to_string(),
            item.title.clone(),
            author.clone(),
            returned.clone(),
        ]);
        console_rows.push(vec![
            export::truncate_to_width(label, LABEL_WIDTH),
            export::truncate_to_width(&item.title, TITLE_WIDTH),
            export::truncate_to_width(&author, AUTHOR_WIDTH),
            returned,
        ]);
    }

    let headers: Vec<String> = headers.iter().map(ToString::to_string).collect();
    print!("{}", export::markdown_table(&headers, &console_rows));
    println!();

    Some(Section {
        title: "Checkout History".to_string(),
        headers,
        rows: full_rows,
    })
}
