use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use stmt_core::{daily_totals, flag_all, AccountInfo, FlagCounts};
use stmt_ingest::{extract_statement_from_pdf, BankLayout, Statement};
use stmt_report::{render_timeline, save_png, write_account_csv, write_report, write_transactions_csv, ReportInput};
use tracing::{info, warn};

use crate::config::Config;

/// Resolved settings for one `run`, config values with CLI overrides applied.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub outdir: PathBuf,
    pub name: String,
    pub email: String,
    pub chart: bool,
    pub max_pages: usize,
    pub account_csv: String,
    pub transactions_csv: String,
    pub chart_png: String,
    pub report_pdf: String,
}

impl RunPlan {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            outdir: cfg.output.dir.clone(),
            name: cfg.report.name.clone(),
            email: cfg.report.email.clone(),
            chart: cfg.output.chart,
            max_pages: cfg.report.max_pages,
            account_csv: cfg.output.account_csv.clone(),
            transactions_csv: cfg.output.transactions_csv.clone(),
            chart_png: cfg.output.chart_png.clone(),
            report_pdf: cfg.output.report_pdf.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub layout: BankLayout,
    pub transactions: usize,
    pub skipped: usize,
    pub flags: FlagCounts,
    pub report_pages: usize,
    pub written: Vec<PathBuf>,
}

/// What `inspect` prints; nothing is written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct InspectSummary {
    pub layout: BankLayout,
    pub account: AccountInfo,
    pub transactions: usize,
    pub skipped: usize,
    pub flags: FlagCounts,
}

pub fn run(pdf: &Path, plan: &RunPlan) -> Result<RunSummary> {
    info!("reading statement {}", pdf.display());
    let statement = extract_statement_from_pdf(pdf).with_context(|| format!("extracting {}", pdf.display()))?;
    write_artifacts(statement, plan)
}

pub fn inspect(pdf: &Path) -> Result<InspectSummary> {
    let statement = extract_statement_from_pdf(pdf).with_context(|| format!("extracting {}", pdf.display()))?;
    let flagged = flag_all(statement.transactions);
    Ok(InspectSummary {
        layout: statement.layout,
        account: statement.account,
        transactions: flagged.len(),
        skipped: statement.skipped,
        flags: FlagCounts::tally(&flagged),
    })
}

/// Flag an extracted statement and write CSVs, chart and report under `plan.outdir`.
pub fn write_artifacts(statement: Statement, plan: &RunPlan) -> Result<RunSummary> {
    let Statement {
        layout,
        account,
        transactions,
        skipped,
    } = statement;

    let flagged = flag_all(transactions);
    let flags = FlagCounts::tally(&flagged);
    info!(
        dd = flags.dd_large_withdrawal,
        rtgs = flags.rtgs_large_deposit,
        entities = flags.entities,
        "flagged {} transactions",
        flagged.len()
    );

    fs::create_dir_all(&plan.outdir).with_context(|| format!("creating {}", plan.outdir.display()))?;
    let mut written = Vec::new();

    let account_path = plan.outdir.join(&plan.account_csv);
    write_account_csv(&account_path, &account)?;
    written.push(account_path);

    let txn_path = plan.outdir.join(&plan.transactions_csv);
    write_transactions_csv(&txn_path, &flagged)?;
    written.push(txn_path);

    let chart = if plan.chart {
        match render_timeline(&daily_totals(&flagged)) {
            Some(img) => {
                let chart_path = plan.outdir.join(&plan.chart_png);
                match save_png(&chart_path, &img) {
                    Ok(()) => {
                        written.push(chart_path);
                        Some(img)
                    }
                    Err(e) => {
                        warn!("chart skipped: {e:#}");
                        None
                    }
                }
            }
            None => {
                info!("no transactions to chart");
                None
            }
        }
    } else {
        None
    };

    let report_path = plan.outdir.join(&plan.report_pdf);
    let input = ReportInput {
        name: &plan.name,
        email: &plan.email,
        account: &account,
        transactions: &flagged,
        chart: chart.as_ref(),
        max_pages: plan.max_pages,
    };
    let report_pages = write_report(&report_path, &input)?;
    written.push(report_path);

    Ok(RunSummary {
        layout,
        transactions: flagged.len(),
        skipped,
        flags,
        report_pages,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stmt_ingest::{extract_statement, Document, IngestError};

    const ICICI: &str = r#"ICICI BANK LIMITED
MS. PRIYA NAIR
A/C No. 000401234567   Account Type: Savings
IFSC Code: ICIC0000004   MICR Code: 400229002
S No. Value Date Transaction Date Cheque Number Transaction Remarks Withdrawal Amount (INR ) Deposit Amount (INR ) Balance (INR )
1  01/05/2023  01/05/2023  -  BY RTGS/SBIN/ARIF TRADERS      0.00        80,000.00   80,000.00
2  02/05/2023  02/05/2023  -  TO DD/PRABHAT SINGH            15,000.00   0.00        65,000.00
3  04/05/2023  04/05/2023  -  UPI/ZOMATO                     250.00      0.00        64,750.00
Legends Used in Account Statement
"#;

    fn plan(outdir: &Path, chart: bool) -> RunPlan {
        RunPlan {
            outdir: outdir.to_path_buf(),
            chart,
            ..RunPlan::from_config(&Config::default())
        }
    }

    #[test]
    fn test_write_artifacts() {
        let statement = extract_statement(&Document::from_text(ICICI)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let summary = write_artifacts(statement, &plan(&out, true)).unwrap();

        assert_eq!(summary.transactions, 3);
        assert_eq!(summary.flags.dd_large_withdrawal, 1);
        assert_eq!(summary.flags.rtgs_large_deposit, 1);
        assert_eq!(summary.flags.entities, 2);
        assert_eq!(summary.report_pages, 1);
        for name in ["account_info.csv", "transactions.csv", "timeline.png", "report.pdf"] {
            assert!(out.join(name).exists(), "{name} missing");
        }

        let rows = stmt_report::read_transactions_csv(out.join("transactions.csv")).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].flags.dd_large_withdrawal);
    }

    #[test]
    fn test_no_chart() {
        let statement = extract_statement(&Document::from_text(ICICI)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let summary = write_artifacts(statement, &plan(dir.path(), false)).unwrap();
        assert!(!dir.path().join("timeline.png").exists());
        assert_eq!(summary.written.len(), 3);
    }

    #[test]
    fn test_missing_pdf_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let err = run(&dir.path().join("missing.pdf"), &plan(&out, true)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IngestError>(),
            Some(IngestError::FileNotFound { .. })
        ));
        assert!(!out.exists());
    }
}
