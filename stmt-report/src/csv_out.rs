//! CSV serialization of account info and flagged transactions.
//!
//! Column names are fixed:
//!   account_info.csv:  account_number,account_holder_name,account_type,ifsc,micr,bank_name,address
//!   transactions.csv:  transaction_date,description,withdrawal_amount,deposit_amount,balance,
//!                      flag_DD_large_withdrawal,flag_RTGS_large_deposit,flag_entities

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use stmt_core::{AccountInfo, FlaggedTransaction, Flags, Transaction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AccountRow {
    account_number: String,
    account_holder_name: String,
    account_type: Option<String>,
    ifsc: String,
    micr: String,
    bank_name: Option<String>,
    address: Option<String>,
}

impl From<&AccountInfo> for AccountRow {
    fn from(a: &AccountInfo) -> Self {
        Self {
            account_number: a.account_number.clone(),
            account_holder_name: a.holder_name.clone(),
            account_type: a.account_type.clone(),
            ifsc: a.ifsc.clone(),
            micr: a.micr.clone(),
            bank_name: a.bank_name.clone(),
            address: a.address.clone(),
        }
    }
}

impl From<AccountRow> for AccountInfo {
    fn from(r: AccountRow) -> Self {
        AccountInfo {
            account_number: r.account_number,
            holder_name: r.account_holder_name,
            ifsc: r.ifsc,
            micr: r.micr,
            bank_name: r.bank_name,
            account_type: r.account_type,
            address: r.address,
        }
    }
}

/// One line of transactions.csv
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub transaction_date: NaiveDate,
    pub description: String,
    pub withdrawal_amount: Option<f64>,
    pub deposit_amount: Option<f64>,
    pub balance: f64,
    #[serde(rename = "flag_DD_large_withdrawal")]
    pub flag_dd_large_withdrawal: bool,
    #[serde(rename = "flag_RTGS_large_deposit")]
    pub flag_rtgs_large_deposit: bool,
    pub flag_entities: bool,
}

impl From<&FlaggedTransaction> for TransactionRow {
    fn from(f: &FlaggedTransaction) -> Self {
        let t = &f.transaction;
        Self {
            transaction_date: t.date,
            description: t.description.clone(),
            withdrawal_amount: t.withdrawal_amount(),
            deposit_amount: t.deposit_amount(),
            balance: t.balance(),
            flag_dd_large_withdrawal: f.flags.dd_large_withdrawal,
            flag_rtgs_large_deposit: f.flags.rtgs_large_deposit,
            flag_entities: f.flags.entities,
        }
    }
}

impl TryFrom<TransactionRow> for FlaggedTransaction {
    type Error = stmt_core::InvalidTransaction;

    fn try_from(r: TransactionRow) -> std::result::Result<Self, Self::Error> {
        let transaction = Transaction::from_columns(
            r.transaction_date,
            r.description,
            r.withdrawal_amount,
            r.deposit_amount,
            r.balance,
        )?;
        Ok(FlaggedTransaction {
            transaction,
            flags: Flags {
                dd_large_withdrawal: r.flag_dd_large_withdrawal,
                rtgs_large_deposit: r.flag_rtgs_large_deposit,
                entities: r.flag_entities,
            },
        })
    }
}

/// Write the single-row account_info.csv.
pub fn write_account_csv(path: impl AsRef<Path>, account: &AccountInfo) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    wtr.serialize(AccountRow::from(account))?;
    wtr.flush().with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Read account_info.csv back.
pub fn read_account_csv(path: impl AsRef<Path>) -> Result<AccountInfo> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let row = rdr
        .deserialize::<AccountRow>()
        .next()
        .with_context(|| format!("{} has no data row", path.display()))??;
    Ok(row.into())
}

/// Write transactions.csv, one row per transaction in input order.
pub fn write_transactions_csv(path: impl AsRef<Path>, txns: &[FlaggedTransaction]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    if txns.is_empty() {
        // Keep the header so consumers still see the schema.
        wtr.write_record(TRANSACTION_HEADERS)?;
    }
    for t in txns {
        wtr.serialize(TransactionRow::from(t))?;
    }
    wtr.flush().with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

const TRANSACTION_HEADERS: [&str; 8] = [
    "transaction_date",
    "description",
    "withdrawal_amount",
    "deposit_amount",
    "balance",
    "flag_DD_large_withdrawal",
    "flag_RTGS_large_deposit",
    "flag_entities",
];

/// Read transactions.csv back into flagged transactions.
pub fn read_transactions_csv(path: impl AsRef<Path>) -> Result<Vec<FlaggedTransaction>> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let mut out = Vec::new();
    for (i, row) in rdr.deserialize::<TransactionRow>().enumerate() {
        let row = row.with_context(|| format!("{} row {}", path.display(), i + 1))?;
        out.push(FlaggedTransaction::try_from(row).with_context(|| format!("{} row {}", path.display(), i + 1))?);
    }
    Ok(out)
}
