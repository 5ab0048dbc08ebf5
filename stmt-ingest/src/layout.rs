//! Which of the two supported statement layouts a document uses.

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};
use crate::loader::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BankLayout {
    #[serde(rename = "hdfc")]
    Hdfc,
    #[serde(rename = "icici")]
    Icici,
}

impl BankLayout {
    /// Short code used in logs and errors
    pub fn code(&self) -> &'static str {
        match self {
            BankLayout::Hdfc => "HDFC",
            BankLayout::Icici => "ICICI",
        }
    }

    /// Bank name as shown in the report
    pub fn bank_name(&self) -> &'static str {
        match self {
            BankLayout::Hdfc => "HDFC Bank",
            BankLayout::Icici => "ICICI Bank",
        }
    }
}

const HDFC_MARKERS: &[&str] = &["HDFC BANK", "HDFC0", "WITHDRAWAL AMT.", "CLOSING BALANCE"];
const ICICI_MARKERS: &[&str] = &["ICICI BANK", "ICIC0", "TRANSACTION REMARKS"];

/// Pick the layout whose markers appear most often in the document.
pub fn detect_layout(doc: &Document) -> Result<BankLayout> {
    let text = doc.text().to_uppercase();
    let score = |markers: &[&str]| markers.iter().filter(|m| text.contains(*m)).count();

    let hdfc = score(HDFC_MARKERS);
    let icici = score(ICICI_MARKERS);
    tracing::debug!(hdfc, icici, "layout marker scores");

    match (hdfc, icici) {
        (0, 0) => Err(IngestError::UnsupportedLayout),
        (h, i) if h > i => Ok(BankLayout::Hdfc),
        (h, i) if i > h => Ok(BankLayout::Icici),
        // Tie: the bank banner is the strongest signal.
        _ if text.contains("ICICI BANK") => Ok(BankLayout::Icici),
        _ if text.contains("HDFC BANK") => Ok(BankLayout::Hdfc),
        _ => Err(IngestError::UnsupportedLayout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_hdfc() {
        let doc = Document::from_text(
            "HDFC BANK Ltd.\nIFSC : HDFC0001234\nDate Narration Chq./Ref.No. Value Dt Withdrawal Amt. Deposit Amt. Closing Balance",
        );
        assert_eq!(detect_layout(&doc).unwrap(), BankLayout::Hdfc);
    }

    #[test]
    fn test_detect_icici() {
        let doc = Document::from_text(
            "ICICI Bank Limited\nIFSC Code: ICIC0000104\nS No. Value Date Transaction Date Cheque Number Transaction Remarks",
        );
        assert_eq!(detect_layout(&doc).unwrap(), BankLayout::Icici);
    }

    #[test]
    fn test_icici_statement_mentioning_hdfc_transfer() {
        // A counterparty bank in a narration must not flip the layout.
        let doc = Document::from_text(
            "ICICI BANK\nIFSC ICIC0000104\nTransaction Remarks\nNEFT-HDFC BANK-RAMESH",
        );
        assert_eq!(detect_layout(&doc).unwrap(), BankLayout::Icici);
    }

    #[test]
    fn test_unknown_layout() {
        let doc = Document::from_text("STATE BANK OF INDIA\nAccount Statement");
        assert!(matches!(detect_layout(&doc), Err(IngestError::UnsupportedLayout)));
    }
}
