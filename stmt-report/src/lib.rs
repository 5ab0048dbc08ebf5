//! stmt-report: CSV, chart and PDF artifacts for a flagged statement

pub mod chart;
pub mod csv_out;
pub mod report;

pub use chart::{render_timeline, save_png, y_axis_ceiling};
pub use csv_out::{
    read_account_csv, read_transactions_csv, write_account_csv, write_transactions_csv, TransactionRow,
};
pub use report::{build_report, write_report, ReportInput};
