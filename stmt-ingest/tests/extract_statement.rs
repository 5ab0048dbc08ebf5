use std::path::Path;

use chrono::NaiveDate;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream, StringFormat};
use stmt_ingest::{extract_statement, extract_statement_from_pdf, load_pdf, BankLayout, Document, IngestError};

/// Single-page PDF with every cell as its own text object, the way bank
/// statement generators lay out tables.
fn write_statement_pdf(path: &Path, cells: &[(i64, i64, &str)]) {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! { "Font" => dictionary! { "F1" => font_id } });
    let mut operations = Vec::new();
    for &(x, y, text) in cells {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 9i64.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::String(text.as_bytes().to_vec(), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
    }
    let content_id = doc.add_object(Stream::new(dictionary! {}, Content { operations }.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0i64.into(), 0i64.into(), 595i64.into(), 842i64.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => vec![Object::from(page_id)], "Count" => 1i64 }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn hdfc_cells() -> Vec<(i64, i64, &'static str)> {
    let mut cells = vec![
        (40, 800, "HDFC BANK Ltd."),
        (40, 780, "MR. RAMESH KUMAR"),
        (40, 760, "Account No : 50100123456789"),
        (40, 740, "IFSC : HDFC0000123"),
        (40, 720, "MICR : 400240015"),
    ];
    let columns: [i64; 6] = [40, 90, 250, 330, 400, 480];
    let rows: [(i64, [&'static str; 6]); 3] = [
        (680, ["Date", "Narration", "Chq./Ref.No.", "Value Dt", "Withdrawal Amt.", "Closing Balance"]),
        (660, ["01/04/23", "NEFT CR-ACME CORP", "0000411", "01/04/23", "60,000.00", "60,000.00"]),
        (640, ["03/04/23", "ATM WDL-ANDHERI", "0000412", "03/04/23", "1,000.00", "59,000.00"]),
    ];
    for (y, row) in rows {
        cells.extend(columns.iter().zip(row).map(|(&x, text)| (x, y, text)));
    }
    cells
}

fn hdfc_pages() -> Vec<String> {
    vec![
        r#"HDFC BANK Ltd.                                   Page No .: 1
MR. RAMESH KUMAR SHARMA                          Account Branch : ANDHERI EAST
Address : 12 LAKE VIEW ROAD
ANDHERI EAST

Account Type : SAVINGS - RESIDENT
Account No :50100123456789
IFSC : HDFC0000123    MICR : 400240015
Date     Narration                          Chq./Ref.No.      Value Dt  Withdrawal Amt. Deposit Amt. Closing Balance
01/04/23 DD ISSUED-GUDDU ENTERPRISES        000451            01/04/23  12,000.00     38,000.00
03/04/23 RTGS CR-SBIN0001234-ABC CORP       SBINR52023040312  03/04/23  60,000.00     98,000.00
"#
        .to_string(),
        r#"Page No .: 2
Date     Narration                          Chq./Ref.No.      Value Dt  Withdrawal Amt. Deposit Amt. Closing Balance
06/04/23 UPI-SWIGGY-SWIGGY@ICICI            0000309198765432  06/04/23  640.00        97,360.00

STATEMENT SUMMARY :-
Opening Balance   Dr Count   Cr Count   Debits      Credits    Closing Bal
50,000.00         2          1          12,640.00   60,000.00  97,360.00
"#
        .to_string(),
    ]
}

#[test]
fn extracts_hdfc_statement() {
    let stmt = extract_statement(&Document::from_pages(hdfc_pages())).unwrap();
    assert_eq!(stmt.layout, BankLayout::Hdfc);
    assert_eq!(stmt.account.account_number, "50100123456789");
    assert_eq!(stmt.account.holder_name, "MR. RAMESH KUMAR SHARMA");
    assert_eq!(stmt.account.ifsc, "HDFC0000123");
    assert_eq!(stmt.account.micr, "400240015");
    assert_eq!(stmt.skipped, 0);

    let txns = &stmt.transactions;
    assert_eq!(txns.len(), 3);
    assert_eq!(txns[0].withdrawal_amount(), Some(12_000.0));
    assert_eq!(txns[1].deposit_amount(), Some(60_000.0));
    assert_eq!(txns[2].date, NaiveDate::from_ymd_opt(2023, 4, 6).unwrap());
    assert_eq!(txns[2].withdrawal_amount(), Some(640.0));
    assert_eq!(txns[2].balance(), 97_360.0);
}

#[test]
fn extracts_icici_statement() {
    let text = r#"ICICI BANK LIMITED
MS. PRIYA NAIR
A/C No. 000401234567   Account Type: Savings
IFSC Code: ICIC0000004   MICR Code: 400229002
S No. Value Date Transaction Date Cheque Number Transaction Remarks Withdrawal Amount (INR ) Deposit Amount (INR ) Balance (INR )
1  01/05/2023  01/05/2023  -  NEFT-COAL INDIA LTD-PENSION   0.00       30,000.00   30,000.00
2  02/05/2023  02/05/2023  -  ATM/CASH WDL                  2,000.00   0.00        28,000.00
Legends Used in Account Statement
"#;
    let stmt = extract_statement(&Document::from_text(text)).unwrap();
    assert_eq!(stmt.layout, BankLayout::Icici);
    assert_eq!(stmt.account.holder_name, "MS. PRIYA NAIR");
    assert_eq!(stmt.account.account_type.as_deref(), Some("Savings"));
    assert_eq!(stmt.account.bank_name.as_deref(), Some("ICICI Bank"));
    assert_eq!(stmt.transactions.len(), 2);
    assert!(stmt.transactions[0].description.contains("COAL INDIA"));
}

#[test]
fn rejects_unknown_bank() {
    let doc = Document::from_text("STATE BANK OF INDIA\nAccount No : 12345678901\n");
    assert!(matches!(extract_statement(&doc), Err(IngestError::UnsupportedLayout)));
}

#[test]
fn missing_micr_fails_whole_run() {
    let text = "HDFC BANK Ltd.\nMR. A KUMAR\nAccount No : 50100123456789\nIFSC : HDFC0000123\n\
                Date Narration Value Dt Withdrawal Amt. Deposit Amt. Closing Balance\n";
    let err = extract_statement(&Document::from_text(text)).unwrap_err();
    assert!(matches!(err, IngestError::MissingField { field: "MICR code", .. }));
    assert!(err.to_string().contains("MICR"));
}

#[test]
fn extracts_rows_from_generated_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hdfc.pdf");
    write_statement_pdf(&path, &hdfc_cells());

    let stmt = extract_statement_from_pdf(&path).unwrap();
    assert_eq!(stmt.layout, BankLayout::Hdfc);
    assert_eq!(stmt.account.micr, "400240015");
    assert_eq!(stmt.skipped, 0);

    let txns = &stmt.transactions;
    assert_eq!(txns.len(), 2, "{txns:?}");
    assert_eq!(txns[0].date, NaiveDate::from_ymd_opt(2023, 4, 1).unwrap());
    assert_eq!(txns[0].deposit_amount(), Some(60_000.0));
    assert_eq!(txns[1].withdrawal_amount(), Some(1_000.0));
    assert_eq!(txns[1].balance(), 59_000.0);
    assert!(txns[1].description.contains("ATM WDL"));
}

#[test]
fn blank_pdf_has_no_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.pdf");
    write_statement_pdf(&path, &[]);

    assert!(matches!(load_pdf(&path), Err(IngestError::NoText { .. })));
    assert!(matches!(extract_statement_from_pdf(&path), Err(IngestError::NoText { .. })));
}
