//! stmt-core: statement data model, flagging rules and summaries

pub mod rules;
pub mod summary;
pub mod transaction;

pub use rules::{flag_all, flag_transaction, WATCH_LIST};
pub use summary::{daily_totals, DailyTotal, FlagCounts, StatementTotals};
pub use transaction::{
    AccountInfo, FlaggedTransaction, Flags, InvalidTransaction, Movement, Transaction,
};
