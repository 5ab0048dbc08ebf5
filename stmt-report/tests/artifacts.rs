use chrono::NaiveDate;
use stmt_core::{daily_totals, flag_all, AccountInfo, Transaction};
use stmt_report::{
    read_account_csv, read_transactions_csv, render_timeline, save_png, write_account_csv, write_report,
    write_transactions_csv, ReportInput,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 4, d).unwrap()
}

#[test]
fn writes_every_artifact() {
    let account = AccountInfo::new("000401234567", "MS. PRIYA NAIR", "ICIC0000004", "400229002")
        .with_bank_name("ICICI Bank")
        .with_account_type("Savings");
    let flagged = flag_all(vec![
        Transaction::withdrawal(day(1), "DD withdrawal Guddu 12000", 12_000.0, 38_000.0).unwrap(),
        Transaction::deposit(day(3), "RTGS transfer ABC Corp", 60_000.0, 98_000.0).unwrap(),
        Transaction::withdrawal(day(3), "ATM WDL", 2_000.0, 96_000.0).unwrap(),
        Transaction::deposit(day(8), "NEFT-COAL INDIA LTD", 500.0, 96_500.0).unwrap(),
    ]);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path();

    write_account_csv(out.join("account_info.csv"), &account).unwrap();
    write_transactions_csv(out.join("transactions.csv"), &flagged).unwrap();

    let days = daily_totals(&flagged);
    assert_eq!(days.len(), 3);
    let chart = render_timeline(&days).unwrap();
    save_png(out.join("timeline.png"), &chart).unwrap();

    let input = ReportInput {
        name: "Test User",
        email: "test@example.com",
        account: &account,
        transactions: &flagged,
        chart: Some(&chart),
        max_pages: 1,
    };
    assert_eq!(write_report(out.join("report.pdf"), &input).unwrap(), 1);

    assert_eq!(read_account_csv(out.join("account_info.csv")).unwrap(), account);
    let back = read_transactions_csv(out.join("transactions.csv")).unwrap();
    assert_eq!(back, flagged);
    assert!(back[0].flags.dd_large_withdrawal && back[0].flags.entities);
    assert!(back[1].flags.rtgs_large_deposit);
    assert!(!back[2].flags.any());
    assert!(back[3].flags.entities);

    let pdf = lopdf::Document::load(out.join("report.pdf")).unwrap();
    assert_eq!(pdf.get_pages().len(), 1);
}
