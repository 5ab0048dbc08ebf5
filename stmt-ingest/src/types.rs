use serde::Serialize;
use stmt_core::{AccountInfo, Transaction};

use crate::layout::BankLayout;

/// Normalized output of statement ingestion (layout-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub layout: BankLayout,
    pub account: AccountInfo,
    /// In statement order
    pub transactions: Vec<Transaction>,
    /// Table rows rejected as malformed
    pub skipped: usize,
}
