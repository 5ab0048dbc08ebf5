//! Layout-specific transaction table parsers and the helpers they share.
//!
//! Both layouts print one transaction per dated line, with narrations that
//! may wrap onto following undated lines and amounts at the end of the row.
//! Parsers collect a [`RowBuffer`] per transaction and normalize it once the
//! next row starts.

pub mod hdfc;
pub mod icici;

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use stmt_core::Transaction;
use tracing::warn;

use crate::error::{IngestError, Result};

/// Normalized rows from one statement plus the number of rejected rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub transactions: Vec<Transaction>,
    pub skipped: usize,
}

/// Credit/debit marker printed next to an amount or inside a narration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Credit,
    Debit,
}

impl Marker {
    fn from_token(tok: &str) -> Option<Self> {
        match tok.trim_matches(|c: char| c == '(' || c == ')' || c == '.') {
            "Cr" | "CR" | "cr" => Some(Marker::Credit),
            "Dr" | "DR" | "dr" => Some(Marker::Debit),
            _ => None,
        }
    }
}

/// Parse an amount cell such as `1,00,000.00`, `₹ 250.50` or `1,234.00 Cr`.
pub fn parse_amount(s: &str) -> Option<f64> {
    let mut cleaned = s.trim().to_string();
    for noise in ["₹", "INR", "Rs.", "Rs", "Cr", "CR", "Dr", "DR", ","] {
        cleaned = cleaned.replace(noise, "");
    }
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    let digits = cleaned.strip_prefix('-').unwrap_or(cleaned);
    if !digits.chars().all(|c| c.is_ascii_digit() || c == '.') || digits.matches('.').count() > 1 {
        return None;
    }
    cleaned.parse().ok()
}

/// Parse the day-first dates used by Indian statements.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let parts: Vec<&str> = s.split(['/', '-', ' ']).filter(|p| !p.is_empty()).collect();
    let formats: &[&str] = match parts.as_slice() {
        [y, _, _] if y.len() == 4 => &["%Y-%m-%d", "%Y/%m/%d"],
        [_, _, y] if y.len() == 2 => &["%d/%m/%y", "%d-%m-%y"],
        [_, _, _] => &["%d/%m/%Y", "%d-%m-%Y", "%d-%b-%Y", "%d %b %Y"],
        _ => return None,
    };
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn amount_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d[\d,]*\.\d{2}(?:Cr|CR|Dr|DR)?$").expect("amount token regex"))
}

fn page_furniture_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*page\s*(?:no\b)?[.:\s]*\d+(?:\s*of\s*\d+)?\s*$").expect("page regex")
    })
}

/// Page numbers and similar lines that carry no table content.
pub(crate) fn is_page_furniture(line: &str) -> bool {
    page_furniture_re().is_match(line)
}

/// One transaction's worth of text, from its dated line to the next
#[derive(Debug, Clone)]
pub(crate) struct RowBuffer {
    pub line_no: usize,
    pub date: NaiveDate,
    pub texts: Vec<String>,
}

impl RowBuffer {
    pub fn new(line_no: usize, date: NaiveDate, first: &str) -> Self {
        Self {
            line_no,
            date,
            texts: vec![first.trim().to_string()],
        }
    }

    pub fn push(&mut self, line: &str) {
        let line = line.trim();
        if !line.is_empty() {
            self.texts.push(line.to_string());
        }
    }

    pub fn joined(&self) -> String {
        self.texts.join(" ")
    }
}

/// Line classifiers for one layout's transaction table
pub(crate) struct TableShape<'a> {
    pub layout: &'static str,
    pub header: &'a Regex,
    pub end: &'a Regex,
    pub is_noise: fn(&str) -> bool,
    /// Split a dated line into its raw date and the rest of the row.
    pub row_start: fn(&str) -> Option<(&str, &str)>,
}

/// Rows gathered between the table header and its end marker
#[derive(Debug, Default)]
pub(crate) struct TableRows {
    pub rows: Vec<RowBuffer>,
    /// Dated-looking lines whose date does not exist, dropped with their continuations
    pub bad_dates: usize,
}

/// Walk `text` and group table lines into dated rows.
///
/// A line that looks dated but carries an impossible date (31/02) starts a
/// discarded row, so neither it nor its wrapped lines bleed into the row above.
pub(crate) fn collect_rows(text: &str, shape: &TableShape<'_>) -> Result<TableRows> {
    let mut in_section = false;
    let mut discarding = false;
    let mut out = TableRows::default();

    for (idx, line) in text.lines().enumerate() {
        if !in_section {
            if shape.header.is_match(line) {
                in_section = true;
            }
            continue;
        }
        if shape.end.is_match(line) {
            break;
        }
        if line.trim().is_empty() || (shape.is_noise)(line) {
            continue;
        }

        if let Some((raw_date, rest)) = (shape.row_start)(line) {
            match parse_date(raw_date) {
                Some(date) => {
                    out.rows.push(RowBuffer::new(idx + 1, date, rest));
                    discarding = false;
                }
                None => {
                    warn!(line = idx + 1, "{} row with invalid date {raw_date:?}, skipped", shape.layout);
                    out.bad_dates += 1;
                    discarding = true;
                }
            }
            continue;
        }
        if discarding {
            continue;
        }
        if let Some(row) = out.rows.last_mut() {
            row.push(line);
        }
    }

    if !in_section {
        return Err(IngestError::MissingSection {
            layout: shape.layout,
            section: "transaction table",
        });
    }
    Ok(out)
}

/// A row split into narration and its trailing amount columns
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SplitRow {
    pub description: String,
    pub amounts: Vec<f64>,
    pub marker: Option<Marker>,
}

/// Take the last `n` amount tokens out of a row's text.
///
/// Returns `None` when the row holds fewer than `n` amounts.
pub(crate) fn split_trailing_amounts(text: &str, n: usize) -> Option<SplitRow> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let amount_idx: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| amount_token_re().is_match(t))
        .map(|(i, _)| i)
        .collect();
    if amount_idx.len() < n {
        return None;
    }
    let picked = &amount_idx[amount_idx.len() - n..];

    let mut marker = None;
    let mut amounts = Vec::with_capacity(n);
    let mut drop = vec![false; tokens.len()];
    for &i in picked {
        let tok = tokens[i];
        amounts.push(parse_amount(tok)?);
        if tok.ends_with(['r', 'R']) {
            marker = Marker::from_token(&tok[tok.len() - 2..]);
        }
        drop[i] = true;
        if let Some(m) = tokens.get(i + 1).and_then(|t| Marker::from_token(t)) {
            marker = Some(m);
            drop[i + 1] = true;
        }
    }

    let description = tokens
        .iter()
        .zip(&drop)
        .filter(|(_, d)| !**d)
        .map(|(t, _)| *t)
        .collect::<Vec<_>>()
        .join(" ");

    Some(SplitRow { description, amounts, marker })
}
