//! HDFC Bank savings/current account statement parser (text)
//!
//! Expected extracted-text section:
//!   Date     Narration                    Chq./Ref.No.      Value Dt  Withdrawal Amt. Deposit Amt. Closing Balance
//!   01/04/23 UPI-GUDDU KUMAR-GUDDU@OKSBI  0000309112345678  01/04/23         1,500.00              48,500.00
//!
//! Text extraction collapses the empty withdrawal/deposit column, so each row
//! carries one amount and the closing balance. Direction comes from the
//! balance movement against the previous row (or the opening balance from the
//! statement summary), then from a `Cr`/`Dr` marker.

use std::sync::OnceLock;

use regex::Regex;
use stmt_core::Transaction;
use tracing::{debug, warn};

use super::{collect_rows, is_page_furniture, parse_amount, split_trailing_amounts, Marker, ParseOutcome, TableShape};
use crate::error::Result;

/// Rounding slack when reconciling balances printed to two decimals.
const BALANCE_EPSILON: f64 = 0.005;

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bNarration\b").expect("hdfc header regex"))
}

fn row_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d{2}/\d{2}/\d{2,4})\s+(.*)$").expect("hdfc row regex"))
}

fn value_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\b\d{2}/\d{2}/\d{2,4}\b").expect("hdfc value date regex"))
}

fn end_of_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:STATEMENT\s+SUMMARY|Opening\s+Balance|Generated\s+On|\**\s*End\s+of\s+Statement)")
            .expect("hdfc end regex")
    })
}

fn opening_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Opening\s+Balance").expect("hdfc opening regex"))
}

fn narration_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(CR|DR)\b").expect("hdfc narration marker regex"))
}

// Footer text HDFC repeats on every page.
const PAGE_NOISE: &[&str] = &[
    "HDFC BANK LIMITED",
    "Closing balance includes",
    "Contents of this statement",
    "State account branch GSTN",
    "Registered Office",
];

fn is_noise(line: &str) -> bool {
    is_page_furniture(line)
        || header_re().is_match(line)
        || PAGE_NOISE.iter().any(|n| line.contains(n))
}

/// Opening balance from the statement summary block, when present.
///
/// The summary prints labels on one line and figures on the next:
///   Opening Balance   Dr Count   Cr Count   Debits   Credits   Closing Bal
///   50,000.00         3          2          ...
pub fn opening_balance(text: &str) -> Option<f64> {
    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        let Some(m) = opening_label_re().find(line) else { continue };
        let after = &line[m.end()..];
        let first_amount = |s: &str| {
            s.split_whitespace()
                .find(|t| t.contains('.'))
                .and_then(parse_amount)
        };
        if let Some(v) = first_amount(after) {
            return Some(v);
        }
        return lines
            .find(|l| !l.trim().is_empty())
            .and_then(first_amount);
    }
    None
}

fn row_start(line: &str) -> Option<(&str, &str)> {
    let caps = row_start_re().captures(line)?;
    Some((caps.get(1)?.as_str(), caps.get(2).map_or("", |m| m.as_str())))
}

/// Parse extracted HDFC statement text into transactions.
pub fn parse_hdfc_text(text: &str) -> Result<ParseOutcome> {
    let table = collect_rows(
        text,
        &TableShape {
            layout: "HDFC",
            header: header_re(),
            end: end_of_table_re(),
            is_noise,
            row_start,
        },
    )?;
    debug!(rows = table.rows.len(), bad_dates = table.bad_dates, "HDFC table rows collected");
    let rows = table.rows;

    let mut out = ParseOutcome {
        skipped: table.bad_dates,
        ..ParseOutcome::default()
    };
    let mut prev_balance = opening_balance(text);

    for row in &rows {
        let Some(split) = split_trailing_amounts(&row.joined(), 2) else {
            warn!(line = row.line_no, "HDFC row without amount and balance, skipped");
            out.skipped += 1;
            continue;
        };
        let (amount, balance) = (split.amounts[0], split.amounts[1]);
        let description = value_date_re().replace_all(&split.description, "").trim().to_string();

        let direction = resolve_direction(prev_balance, amount, balance)
            .or(split.marker)
            .or_else(|| narration_marker(&description));
        prev_balance = Some(balance);

        let Some(direction) = direction else {
            warn!(line = row.line_no, "HDFC row direction undecidable, skipped");
            out.skipped += 1;
            continue;
        };
        let (withdrawal, deposit) = match direction {
            Marker::Debit => (Some(amount), None),
            Marker::Credit => (None, Some(amount)),
        };
        match Transaction::from_columns(row.date, description, withdrawal, deposit, balance) {
            Ok(t) => out.transactions.push(t),
            Err(e) => {
                warn!(line = row.line_no, "HDFC row rejected: {e}");
                out.skipped += 1;
            }
        }
    }

    Ok(out)
}

fn resolve_direction(prev: Option<f64>, amount: f64, balance: f64) -> Option<Marker> {
    let prev = prev?;
    if (prev - amount - balance).abs() < BALANCE_EPSILON {
        Some(Marker::Debit)
    } else if (prev + amount - balance).abs() < BALANCE_EPSILON {
        Some(Marker::Credit)
    } else {
        None
    }
}

// "NEFT CR-..." / "NEFT DR-..." style narrations.
fn narration_marker(description: &str) -> Option<Marker> {
    match narration_marker_re().captures(description)?.get(1)?.as_str() {
        "CR" => Some(Marker::Credit),
        _ => Some(Marker::Debit),
    }
}
