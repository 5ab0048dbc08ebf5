//! Aggregates over flagged transactions for the chart and report.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::transaction::{FlaggedTransaction, Movement};

/// Number of transactions raising each flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagCounts {
    pub dd_large_withdrawal: usize,
    pub rtgs_large_deposit: usize,
    pub entities: usize,
}

impl FlagCounts {
    pub fn tally(txns: &[FlaggedTransaction]) -> Self {
        txns.iter().fold(Self::default(), |mut acc, t| {
            acc.dd_large_withdrawal += t.flags.dd_large_withdrawal as usize;
            acc.rtgs_large_deposit += t.flags.rtgs_large_deposit as usize;
            acc.entities += t.flags.entities as usize;
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.dd_large_withdrawal + self.rtgs_large_deposit + self.entities
    }
}

/// Deposits and withdrawals summed over one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub deposits: f64,
    pub withdrawals: f64,
}

/// Per-day totals sorted by date. Days without transactions are absent.
pub fn daily_totals(txns: &[FlaggedTransaction]) -> Vec<DailyTotal> {
    let mut by_day: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for t in txns {
        let entry = by_day.entry(t.transaction.date).or_insert((0.0, 0.0));
        match t.transaction.movement() {
            Movement::Deposit(a) => entry.0 += a,
            Movement::Withdrawal(a) => entry.1 += a,
        }
    }
    by_day
        .into_iter()
        .map(|(date, (deposits, withdrawals))| DailyTotal {
            date,
            deposits,
            withdrawals,
        })
        .collect()
}

/// Whole-statement figures shown in the report header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTotals {
    pub transaction_count: usize,
    pub total_deposits: f64,
    pub total_withdrawals: f64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub closing_balance: Option<f64>,
}

impl StatementTotals {
    pub fn from_transactions(txns: &[FlaggedTransaction]) -> Self {
        let total_deposits = txns
            .iter()
            .filter_map(|t| t.transaction.deposit_amount())
            .sum();
        let total_withdrawals = txns
            .iter()
            .filter_map(|t| t.transaction.withdrawal_amount())
            .sum();
        Self {
            transaction_count: txns.len(),
            total_deposits,
            total_withdrawals,
            first_date: txns.iter().map(|t| t.transaction.date).min(),
            last_date: txns.iter().map(|t| t.transaction.date).max(),
            closing_balance: txns.last().map(|t| t.transaction.balance()),
        }
    }
}
