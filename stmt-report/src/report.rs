//! Page-capped PDF summary of a flagged statement.
//!
//! Layout is a single top-down column on A4 in Times-Roman 11pt. Every block
//! asks the [`Pager`] for room first; once `max_pages` is used up, remaining
//! flagged rows collapse into one "N more flagged transactions not shown" line.
//! One line at the foot of the page stays reserved for it while anything is
//! flagged.

use std::path::Path;

use anyhow::{bail, Context, Result};
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use stmt_core::rules::{watched_entities_in, DD_WITHDRAWAL_THRESHOLD, RTGS_DEPOSIT_THRESHOLD};
use stmt_core::{daily_totals, AccountInfo, FlagCounts, FlaggedTransaction, StatementTotals, WATCH_LIST};

use crate::chart::{y_axis_ceiling, GRID_LINES};
use tracing::{debug, info, warn};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 56;
const FONT_SIZE: i64 = 11;
const TITLE_SIZE: i64 = 16;
const LINE_HEIGHT: i64 = 14;
const VALUE_COLUMN: i64 = 200;
const CHART_BOX: (i64, i64) = (400, 160);
// Times-Roman at 11pt averages a little over 5pt per glyph.
const WRAP_COLUMNS: usize = 92;
const DESCRIPTION_COLUMNS: usize = 48;
const VALUE_COLUMNS: usize = 60;

const METHODOLOGY: &str = "Transactions were extracted from the statement text and checked against three \
static rules: withdrawals above the demand-draft threshold whose description mentions a demand draft \
(DD), deposits above the RTGS threshold whose description mentions RTGS, and any transaction whose \
description names a watched entity. Thresholds are strict and matching ignores case.";

/// Everything the report renders.
pub struct ReportInput<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub account: &'a AccountInfo,
    pub transactions: &'a [FlaggedTransaction],
    pub chart: Option<&'a RgbImage>,
    pub max_pages: usize,
}

/// Builds page content top to bottom, refusing to open a page past the cap.
struct Pager {
    max_pages: usize,
    pages: Vec<Vec<Operation>>,
    y: i64,
    /// Height kept free above the bottom margin.
    footer: i64,
}

impl Pager {
    fn new(max_pages: usize) -> Self {
        Self {
            max_pages,
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
            footer: 0,
        }
    }

    fn fits_here(&self, height: i64) -> bool {
        self.y - height >= MARGIN + self.footer
    }

    /// Move to a fresh page when `height` does not fit. False when capped.
    fn reserve(&mut self, height: i64) -> bool {
        if self.fits_here(height) {
            return true;
        }
        if self.pages.len() >= self.max_pages {
            return false;
        }
        self.pages.push(Vec::new());
        self.y = PAGE_HEIGHT - MARGIN;
        true
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        // `pages` is never empty.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn text_at(&mut self, x: i64, font: &str, size: i64, text: &str) {
        let y = self.y - size;
        self.ops().extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::String(encode_text(text), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn line(&mut self, text: &str) -> bool {
        if !self.reserve(LINE_HEIGHT) {
            return false;
        }
        self.text_at(MARGIN, "F1", FONT_SIZE, text);
        self.y -= LINE_HEIGHT;
        true
    }

    fn row(&mut self, label: &str, value: &str) -> bool {
        if !self.reserve(LINE_HEIGHT) {
            return false;
        }
        self.text_at(MARGIN, "F2", FONT_SIZE, label);
        self.text_at(VALUE_COLUMN, "F1", FONT_SIZE, value);
        self.y -= LINE_HEIGHT;
        true
    }

    fn heading(&mut self, text: &str) -> bool {
        // Keep a heading with at least one line beneath it.
        if !self.reserve(LINE_HEIGHT * 3) {
            return false;
        }
        self.y -= LINE_HEIGHT / 2;
        self.text_at(MARGIN, "F2", FONT_SIZE + 1, text);
        self.y -= LINE_HEIGHT + 2;
        true
    }

    /// Image with caption lines below it, kept on one page.
    fn image(&mut self, name: &str, width: i64, height: i64, caption: &[String]) -> bool {
        let caption_height = LINE_HEIGHT * caption.len() as i64;
        if !self.reserve(height + LINE_HEIGHT + caption_height) {
            return false;
        }
        let y = self.y - height;
        self.ops().extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![width.into(), 0i64.into(), 0i64.into(), height.into(), MARGIN.into(), y.into()],
            ),
            Operation::new("Do", vec![name.into()]),
            Operation::new("Q", vec![]),
        ]);
        self.y -= height + LINE_HEIGHT / 2;
        for line in caption {
            self.text_at(MARGIN, "F1", FONT_SIZE - 2, line);
            self.y -= LINE_HEIGHT;
        }
        self.y -= LINE_HEIGHT / 2;
        true
    }
}

/// Lay out the report as an uncompressed in-memory PDF.
pub fn build_report(input: &ReportInput<'_>) -> Result<Document> {
    if input.max_pages == 0 {
        bail!("report page limit must be at least 1");
    }
    let mut pager = Pager::new(input.max_pages);
    let flagged: Vec<&FlaggedTransaction> = input.transactions.iter().filter(|t| t.flags.any()).collect();
    if !flagged.is_empty() {
        pager.footer = LINE_HEIGHT;
    }

    pager.text_at(MARGIN, "F2", TITLE_SIZE, "Bank Statement Transaction Flag Report");
    pager.y -= TITLE_SIZE + LINE_HEIGHT / 2;
    pager.line(&format!("Prepared by: {} <{}>", input.name, input.email));

    if pager.heading("Methodology") {
        for line in wrap(METHODOLOGY, WRAP_COLUMNS) {
            pager.line(&line);
        }
        pager.line(&format!(
            "DD threshold: {:.2}   RTGS threshold: {:.2}   Watch-list: {}",
            DD_WITHDRAWAL_THRESHOLD,
            RTGS_DEPOSIT_THRESHOLD,
            WATCH_LIST.join(", ")
        ));
    }

    if pager.heading("Account") {
        let a = input.account;
        let mut rows = vec![
            ("Account holder", a.holder_name.clone()),
            ("Account number", a.account_number.clone()),
            ("IFSC", a.ifsc.clone()),
            ("MICR", a.micr.clone()),
        ];
        if let Some(bank) = &a.bank_name {
            rows.insert(0, ("Bank", bank.clone()));
        }
        if let Some(kind) = &a.account_type {
            rows.push(("Account type", kind.clone()));
        }
        if let Some(address) = &a.address {
            rows.push(("Address", address.clone()));
        }
        for (label, value) in rows {
            let lines = wrap(&value, VALUE_COLUMNS);
            if lines.is_empty() {
                pager.row(label, "");
            }
            for (i, line) in lines.iter().enumerate() {
                pager.row(if i == 0 { label } else { "" }, line);
            }
        }
    }

    let totals = StatementTotals::from_transactions(input.transactions);
    if pager.heading("Statement") {
        let period = match (totals.first_date, totals.last_date) {
            (Some(first), Some(last)) => format!("{first} to {last}"),
            _ => "no transactions".to_string(),
        };
        pager.row("Period", &period);
        pager.row("Transactions", &totals.transaction_count.to_string());
        pager.row("Total deposits", &format!("{:.2}", totals.total_deposits));
        pager.row("Total withdrawals", &format!("{:.2}", totals.total_withdrawals));
        if let Some(balance) = totals.closing_balance {
            pager.row("Closing balance", &format!("{balance:.2}"));
        }
    }

    let counts = FlagCounts::tally(input.transactions);
    if pager.heading("Flag summary") {
        pager.row("Large DD withdrawals", &counts.dd_large_withdrawal.to_string());
        pager.row("Large RTGS deposits", &counts.rtgs_large_deposit.to_string());
        pager.row("Watched entities", &counts.entities.to_string());
    }

    let chart_placed = match input.chart {
        Some(_) => {
            let caption = chart_caption(input.transactions);
            let placed = pager.heading("Daily deposits and withdrawals")
                && pager.image("Im1", CHART_BOX.0, CHART_BOX.1, &caption);
            if !placed {
                warn!("no room left for the chart within the page limit");
            }
            placed
        }
        None => false,
    };

    let mut shown = 0;
    if pager.heading("Flagged transactions") {
        if flagged.is_empty() {
            pager.line("No transactions were flagged.");
        }
        for t in &flagged {
            if !pager.line(&flagged_line(t)) {
                break;
            }
            shown += 1;
        }
    }
    let hidden = flagged.len() - shown;
    pager.footer = 0;
    if hidden > 0 {
        debug!(shown, hidden, "flagged listing truncated at page limit");
        if !pager.line(&format!("\u{2026} {hidden} more flagged transactions not shown")) {
            warn!(hidden, "no room for the overflow line");
        }
    }

    let doc = assemble(pager.pages, chart_placed.then_some(input.chart).flatten())?;
    info!(pages = doc.get_pages().len(), flagged = flagged.len(), shown, "report laid out");
    Ok(doc)
}

/// Build, compress and save the report. Returns the page count.
pub fn write_report(path: impl AsRef<Path>, input: &ReportInput<'_>) -> Result<usize> {
    let path = path.as_ref();
    let mut doc = build_report(input)?;
    let pages = doc.get_pages().len();
    doc.compress();
    doc.save(path).with_context(|| format!("writing report {}", path.display()))?;
    Ok(pages)
}

fn assemble(pages: Vec<Vec<Operation>>, chart: Option<&RgbImage>) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Roman",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut resources = dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    };
    if let Some(img) = chart {
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => img.width() as i64,
                "Height" => img.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
            },
            img.as_raw().clone(),
        ));
        resources.set("XObject", dictionary! { "Im1" => image_id });
    }
    let resources_id = doc.add_object(resources);

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0i64.into(), 0i64.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

fn flagged_line(t: &FlaggedTransaction) -> String {
    let txn = &t.transaction;
    let (kind, amount) = match (txn.withdrawal_amount(), txn.deposit_amount()) {
        (Some(w), _) => ("Dr", w),
        (_, Some(d)) => ("Cr", d),
        _ => ("", 0.0),
    };
    let mut tags = Vec::new();
    if t.flags.dd_large_withdrawal {
        tags.push("DD".to_string());
    }
    if t.flags.rtgs_large_deposit {
        tags.push("RTGS".to_string());
    }
    if t.flags.entities {
        tags.push(format!("ENTITY: {}", watched_entities_in(&txn.description).join("/")));
    }
    format!(
        "{}  {} {:>12.2}  {}  [{}]",
        txn.date,
        kind,
        amount,
        truncate(&txn.description, DESCRIPTION_COLUMNS),
        tags.join(", ")
    )
}

/// Explains what the chart image cannot label itself.
fn chart_caption(transactions: &[FlaggedTransaction]) -> Vec<String> {
    let days = daily_totals(transactions);
    let ceiling = y_axis_ceiling(&days);
    let span = match (days.first(), days.last()) {
        (Some(first), Some(last)) => format!(" X axis: {} to {}.", first.date, last.date),
        _ => String::new(),
    };
    vec![
        "Green: total deposits per day. Red: total withdrawals per day.".to_string(),
        format!(
            "Y axis: 0 to {} INR, grid lines every {} INR.{span}",
            axis_value(ceiling),
            axis_value(ceiling / GRID_LINES as f64)
        ),
    ]
}

fn axis_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('\u{2026}');
    out
}

/// Greedy word wrap on character count.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// WinAnsi bytes for the standard fonts. Anything outside printable ASCII
// becomes '?', except the ellipsis and the rupee sign.
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' '..='~' => out.push(c as u8),
            '\u{2026}' => out.push(0x85),
            '\u{20b9}' => out.extend_from_slice(b"Rs."),
            '\t' => out.push(b' '),
            _ => out.push(b'?'),
        }
    }
    out
}
