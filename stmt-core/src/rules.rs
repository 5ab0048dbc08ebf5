//! Static flagging rules over normalized transactions.
//!
//! Every rule is a pure predicate on a single [`Transaction`]; no state is
//! carried between rows, so flagging never drops, merges or reorders input.

use std::sync::OnceLock;

use regex::Regex;

use crate::transaction::{FlaggedTransaction, Flags, Transaction};

/// Withdrawals strictly above this amount are "large" for the DD rule.
pub const DD_WITHDRAWAL_THRESHOLD: f64 = 10_000.0;

/// Deposits strictly above this amount are "large" for the RTGS rule.
pub const RTGS_DEPOSIT_THRESHOLD: f64 = 50_000.0;

/// Names whose presence in a description raises the entity flag.
pub const WATCH_LIST: [&str; 4] = ["Guddu", "Prabhat", "Arif", "Coal India"];

const RTGS_MARKER: &str = "rtgs";

// "DD" must stand alone: "GUDDU" or "ADDRESS" are not demand drafts.
fn dd_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:DD|DEMAND\s+DRAFT)\b").expect("dd marker regex"))
}

/// Description mentions a demand draft.
pub fn has_dd_marker(description: &str) -> bool {
    dd_marker_re().is_match(description)
}

/// Description mentions an RTGS transfer.
pub fn has_rtgs_marker(description: &str) -> bool {
    description.to_lowercase().contains(RTGS_MARKER)
}

/// Withdrawal above 10,000 paid out as a demand draft.
pub fn is_dd_large_withdrawal(txn: &Transaction) -> bool {
    txn.withdrawal_amount()
        .is_some_and(|amount| amount > DD_WITHDRAWAL_THRESHOLD)
        && has_dd_marker(&txn.description)
}

/// Deposit above 50,000 received over RTGS.
pub fn is_rtgs_large_deposit(txn: &Transaction) -> bool {
    txn.deposit_amount()
        .is_some_and(|amount| amount > RTGS_DEPOSIT_THRESHOLD)
        && has_rtgs_marker(&txn.description)
}

/// Description names someone on the watch-list, ignoring case.
pub fn mentions_watched_entity(description: &str) -> bool {
    let desc = description.to_lowercase();
    WATCH_LIST
        .iter()
        .any(|name| desc.contains(&name.to_lowercase()))
}

/// Watch-list names found in a description, in watch-list order.
pub fn watched_entities_in(description: &str) -> Vec<&'static str> {
    let desc = description.to_lowercase();
    WATCH_LIST
        .iter()
        .copied()
        .filter(|name| desc.contains(&name.to_lowercase()))
        .collect()
}

/// Evaluate all three rules for one transaction.
pub fn evaluate(txn: &Transaction) -> Flags {
    Flags {
        dd_large_withdrawal: is_dd_large_withdrawal(txn),
        rtgs_large_deposit: is_rtgs_large_deposit(txn),
        entities: mentions_watched_entity(&txn.description),
    }
}

/// Attach flags to a single transaction.
pub fn flag_transaction(txn: Transaction) -> FlaggedTransaction {
    let flags = evaluate(&txn);
    FlaggedTransaction { transaction: txn, flags }
}

/// Flag every transaction, preserving order and count.
pub fn flag_all(txns: Vec<Transaction>) -> Vec<FlaggedTransaction> {
    txns.into_iter().map(flag_transaction).collect()
}
