//! stmt-ingest: statement PDF loading, layout detection and HDFC/ICICI parsers.

pub mod error;
pub mod fields;
pub mod layout;
pub mod loader;
pub mod parsers;
pub mod types;

use std::path::Path;

use tracing::{debug, info, warn};

pub use error::{IngestError, Result};
pub use layout::{detect_layout, BankLayout};
pub use loader::{load_pdf, load_pdf_with, Document, Extractor};
pub use types::Statement;

/// Detect the layout, then extract account info and transactions.
pub fn extract_statement(doc: &Document) -> Result<Statement> {
    let layout = detect_layout(doc)?;
    info!("detected {} statement layout", layout.code());

    let account = fields::extract_account_info(doc, layout)?;

    let text = doc.text();
    let outcome = match layout {
        BankLayout::Hdfc => parsers::hdfc::parse_hdfc_text(&text)?,
        BankLayout::Icici => parsers::icici::parse_icici_text(&text)?,
    };

    if outcome.transactions.is_empty() {
        if outcome.skipped > 0 {
            return Err(IngestError::UnparsableTable {
                layout: layout.code(),
                skipped: outcome.skipped,
            });
        }
        warn!("transaction table found but it has no rows");
    }
    info!(
        "normalized {} transactions ({} rows skipped)",
        outcome.transactions.len(),
        outcome.skipped
    );

    Ok(Statement {
        layout,
        account,
        transactions: outcome.transactions,
        skipped: outcome.skipped,
    })
}

/// Load a statement PDF from disk and extract it.
///
/// When the first extractor's text yields an error or no transactions, the
/// other extractor gets one try and its result is kept if it does better.
pub fn extract_statement_from_pdf(path: &Path) -> Result<Statement> {
    let doc = load_pdf(path)?;
    let first = extract_statement(&doc);
    let usable = matches!(&first, Ok(s) if !s.transactions.is_empty());
    let Some(source) = doc.source() else {
        return first;
    };
    if usable || matches!(first, Err(IngestError::UnsupportedLayout)) {
        return first;
    }

    let other = source.other();
    info!("{} text gave no transactions, retrying with {}", source.name(), other.name());
    let second = load_pdf_with(path, other).and_then(|doc| extract_statement(&doc));
    if let Err(e) = &second {
        debug!("{} retry failed: {e}", other.name());
    }
    prefer_statement(first, second)
}

/// Keep the second attempt only when it is strictly better than the first.
fn prefer_statement(first: Result<Statement>, second: Result<Statement>) -> Result<Statement> {
    match (&first, &second) {
        (_, Ok(s)) if !s.transactions.is_empty() => second,
        (Err(_), Ok(_)) => second,
        _ => first,
    }
}
