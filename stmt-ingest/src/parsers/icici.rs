//! ICICI Bank account statement parser (text)
//!
//! Expected extracted-text section:
//!   S No. Value Date Transaction Date Cheque Number Transaction Remarks Withdrawal Amount (INR ) Deposit Amount (INR ) Balance (INR )
//!   2     03/04/2023 02/04/2023       -             BY RTGS/SBIN/ARIF  0.00                     80,000.00               1,05,000.00
//!
//! ICICI prints `0.00` in the unused amount column, so every row ends with
//! withdrawal, deposit and balance.

use std::sync::OnceLock;

use regex::Regex;
use stmt_core::Transaction;
use tracing::{debug, warn};

use super::{collect_rows, is_page_furniture, split_trailing_amounts, ParseOutcome, TableShape};
use crate::error::Result;

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Transaction\s+Remarks").expect("icici header regex"))
}

// Optional serial number, value date, optional transaction date, rest of row.
fn row_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^\s*(?:\d{1,4}\s+)?",
            r"(?P<value>\d{2}[/-]\d{2}[/-]\d{4})",
            r"(?:\s+(?P<txn>\d{2}[/-]\d{2}[/-]\d{4}))?",
            r"(?:\s+(?P<rest>.*))?$"
        ))
        .expect("icici row regex")
    })
}

fn end_of_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)^\s*(?:Legends|Total\b|Account\s+Related\s+Other\s+Information",
            r"|This\s+is\s+a\s+(?:system|computer)[\s-]generated)"
        ))
        .expect("icici end regex")
    })
}

const PAGE_NOISE: &[&str] = &[
    "www.icicibank.com",
    "Statement of Transactions",
    "Please call",
];

fn is_noise(line: &str) -> bool {
    is_page_furniture(line)
        || header_re().is_match(line)
        || PAGE_NOISE.iter().any(|n| line.contains(n))
}

/// Brought-forward rows restate the opening balance; they are not transactions.
fn is_carried_balance(description: &str) -> bool {
    let d = description.to_uppercase();
    d.contains("B/F") || d.contains("OPENING BALANCE") || d.contains("BALANCE FORWARD")
}

// Booking date wins over value date when both are printed.
fn row_start(line: &str) -> Option<(&str, &str)> {
    let caps = row_start_re().captures(line)?;
    let date = caps.name("txn").or_else(|| caps.name("value"))?;
    Some((date.as_str(), caps.name("rest").map_or("", |m| m.as_str())))
}

/// Parse extracted ICICI statement text into transactions.
pub fn parse_icici_text(text: &str) -> Result<ParseOutcome> {
    let table = collect_rows(
        text,
        &TableShape {
            layout: "ICICI",
            header: header_re(),
            end: end_of_table_re(),
            is_noise,
            row_start,
        },
    )?;
    let rows = table.rows;

    let mut out = ParseOutcome {
        skipped: table.bad_dates,
        ..ParseOutcome::default()
    };
    for row in &rows {
        let Some(split) = split_trailing_amounts(&row.joined(), 3) else {
            warn!(line = row.line_no, "ICICI row without withdrawal/deposit/balance, skipped");
            out.skipped += 1;
            continue;
        };
        let description = split
            .description
            .strip_prefix("- ")
            .unwrap_or(&split.description)
            .trim()
            .to_string();
        if is_carried_balance(&description) {
            debug!(line = row.line_no, "brought-forward balance row");
            continue;
        }

        let (withdrawal, deposit, balance) = (split.amounts[0], split.amounts[1], split.amounts[2]);
        match Transaction::from_columns(row.date, description, Some(withdrawal), Some(deposit), balance) {
            Ok(t) => out.transactions.push(t),
            Err(e) => {
                warn!(line = row.line_no, "ICICI row rejected: {e}");
                out.skipped += 1;
            }
        }
    }

    Ok(out)
}
