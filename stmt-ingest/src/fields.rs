//! Account metadata from the statement header.

use std::sync::OnceLock;

use regex::Regex;
use stmt_core::AccountInfo;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::layout::BankLayout;
use crate::loader::Document;

/// Account details are printed on the first pages only.
const HEADER_PAGES: usize = 3;
const NAME_FALLBACK_LINES: usize = 10;
const ADDRESS_MAX_LINES: usize = 3;

fn account_no_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:Account\s*(?:No\.?|Number)|A/C\s*No\.?)\s*[:\-]?\s*([A-Za-z0-9\-]{6,})")
            .expect("account regex")
    })
}

fn ifsc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)IFSC(?:\s*Code)?\s*[:\-]?\s*([A-Z]{4}0[A-Z0-9]{6})\b").expect("ifsc regex")
    })
}

fn micr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)MICR(?:\s*Code)?\s*[:\-]?\s*(\d{6,9})\b").expect("micr regex")
    })
}

fn honorific_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*((?i:MRS|MR|MS|M/S)\.?\s+[A-Za-z][A-Za-z.&'-]*(?: [A-Za-z.&'-]+)*)")
            .expect("name regex")
    })
}

fn account_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(savings|current)\b").expect("account type regex"))
}

/// Pull account metadata out of the statement header.
///
/// Account number, holder name, IFSC and MICR are required; a statement
/// without them is rejected.
pub fn extract_account_info(doc: &Document, layout: BankLayout) -> Result<AccountInfo> {
    let text = doc.head_text(HEADER_PAGES);
    let missing = |field| IngestError::MissingField { layout: layout.code(), field };

    let account_number = account_no_re()
        .captures_iter(&text)
        .map(|c| c[1].trim_matches('-').to_string())
        .find(|tok| tok.chars().any(|ch| ch.is_ascii_digit()))
        .ok_or_else(|| missing("account number"))?;

    let ifsc = ifsc_re()
        .captures(&text)
        .map(|c| c[1].to_uppercase())
        .ok_or_else(|| missing("IFSC code"))?;

    let micr = micr_re()
        .captures(&text)
        .map(|c| c[1].to_string())
        .ok_or_else(|| missing("MICR code"))?;

    let holder_name = holder_name(&text).ok_or_else(|| missing("account holder name"))?;

    let mut info = AccountInfo::new(account_number, holder_name, ifsc, micr)
        .with_bank_name(layout.bank_name());
    if let Some(c) = account_type_re().captures(&text) {
        info = info.with_account_type(title_case(&c[1]));
    }
    if let Some(address) = address(&text) {
        info = info.with_address(address);
    }

    debug!(account = %info.account_number, ifsc = %info.ifsc, "account info extracted");
    Ok(info)
}

fn holder_name(text: &str) -> Option<String> {
    if let Some(c) = honorific_name_re().captures(text) {
        return Some(c[1].trim().to_string());
    }
    // Fallback: the first shouting line that is not a bank banner.
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(NAME_FALLBACK_LINES)
        .find(|l| {
            l.len() >= 6
                && l.chars().any(|c| c.is_alphabetic())
                && l.chars().all(|c| c.is_ascii_uppercase() || c == ' ' || c == '.')
                && !["BANK", "STATEMENT", "ACCOUNT"].iter().any(|w| l.contains(w))
        })
        .map(str::to_string)
}

fn address(text: &str) -> Option<String> {
    let mut lines = text.lines();
    let first = lines.by_ref().find_map(|l| {
        let idx = l.to_lowercase().find("address")?;
        let rest = l[idx + "address".len()..].trim_start_matches([' ', ':', '-']).trim();
        Some(rest.to_string())
    })?;

    let mut parts: Vec<String> = Vec::new();
    if !first.is_empty() {
        parts.push(first);
    }
    for line in lines.take(ADDRESS_MAX_LINES) {
        let line = line.trim();
        // Blank lines and the next "Label :" end the block.
        if line.is_empty() || line.contains(':') {
            break;
        }
        parts.push(line.to_string());
    }
    if parts.is_empty() { None } else { Some(parts.join(", ")) }
}

fn title_case(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
