//! Statement record types: account metadata and normalized transactions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Account metadata read from the statement header. One per document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_number: String,
    pub holder_name: String,
    pub ifsc: String,
    pub micr: String,
    /// Bank name as printed on the statement (e.g. "HDFC Bank")
    pub bank_name: Option<String>,
    /// "Savings" or "Current" when the statement says so
    pub account_type: Option<String>,
    pub address: Option<String>,
}

impl AccountInfo {
    /// Create account info with the four required identifiers.
    pub fn new(
        account_number: impl Into<String>,
        holder_name: impl Into<String>,
        ifsc: impl Into<String>,
        micr: impl Into<String>,
    ) -> Self {
        Self {
            account_number: account_number.into(),
            holder_name: holder_name.into(),
            ifsc: ifsc.into(),
            micr: micr.into(),
            bank_name: None,
            account_type: None,
            address: None,
        }
    }

    pub fn with_bank_name(mut self, bank_name: impl Into<String>) -> Self {
        self.bank_name = Some(bank_name.into());
        self
    }

    pub fn with_account_type(mut self, account_type: impl Into<String>) -> Self {
        self.account_type = Some(account_type.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// Money leaving or entering the account. Amounts are non-negative INR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Movement {
    #[serde(rename = "withdrawal")]
    Withdrawal(f64),
    #[serde(rename = "deposit")]
    Deposit(f64),
}

impl Movement {
    pub fn amount(&self) -> f64 {
        match self {
            Movement::Withdrawal(a) | Movement::Deposit(a) => *a,
        }
    }
}

/// Reasons a row cannot become a [`Transaction`]
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidTransaction {
    BothAmounts,
    NoAmount,
    NegativeAmount(f64),
    NonFiniteAmount,
}

impl std::fmt::Display for InvalidTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidTransaction::BothAmounts => write!(f, "row has both withdrawal and deposit"),
            InvalidTransaction::NoAmount => write!(f, "row has neither withdrawal nor deposit"),
            InvalidTransaction::NegativeAmount(a) => write!(f, "negative amount {a}"),
            InvalidTransaction::NonFiniteAmount => write!(f, "amount is not a finite number"),
        }
    }
}

impl std::error::Error for InvalidTransaction {}

/// A normalized statement row. Exactly one of withdrawal/deposit is present.
///
/// Every constructor, deserialization included, goes through
/// [`Transaction::from_columns`], so the amount is always positive and finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTransaction")]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    movement: Movement,
    /// Running balance after this row
    balance: f64,
}

#[derive(Deserialize)]
struct RawTransaction {
    date: NaiveDate,
    description: String,
    movement: Movement,
    balance: f64,
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = InvalidTransaction;

    fn try_from(r: RawTransaction) -> Result<Self, Self::Error> {
        let (withdrawal, deposit) = match r.movement {
            Movement::Withdrawal(a) => (Some(a), None),
            Movement::Deposit(a) => (None, Some(a)),
        };
        Transaction::from_columns(r.date, r.description, withdrawal, deposit, r.balance)
    }
}

impl Transaction {
    pub fn withdrawal(
        date: NaiveDate,
        description: impl Into<String>,
        amount: f64,
        balance: f64,
    ) -> Result<Self, InvalidTransaction> {
        Self::from_columns(date, description, Some(amount), None, balance)
    }

    pub fn deposit(
        date: NaiveDate,
        description: impl Into<String>,
        amount: f64,
        balance: f64,
    ) -> Result<Self, InvalidTransaction> {
        Self::from_columns(date, description, None, Some(amount), balance)
    }

    /// Build from the two optional amount columns of a statement table.
    /// A zero in one column counts as empty.
    pub fn from_columns(
        date: NaiveDate,
        description: impl Into<String>,
        withdrawal: Option<f64>,
        deposit: Option<f64>,
        balance: f64,
    ) -> Result<Self, InvalidTransaction> {
        let withdrawal = withdrawal.filter(|a| *a != 0.0);
        let deposit = deposit.filter(|a| *a != 0.0);
        let movement = match (withdrawal, deposit) {
            (Some(_), Some(_)) => return Err(InvalidTransaction::BothAmounts),
            (None, None) => return Err(InvalidTransaction::NoAmount),
            (Some(a), None) => Movement::Withdrawal(a),
            (None, Some(a)) => Movement::Deposit(a),
        };
        let amount = movement.amount();
        if !amount.is_finite() || !balance.is_finite() {
            return Err(InvalidTransaction::NonFiniteAmount);
        }
        if amount < 0.0 {
            return Err(InvalidTransaction::NegativeAmount(amount));
        }
        Ok(Self {
            date,
            description: description.into(),
            movement,
            balance,
        })
    }

    pub fn movement(&self) -> Movement {
        self.movement
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn withdrawal_amount(&self) -> Option<f64> {
        match self.movement {
            Movement::Withdrawal(a) => Some(a),
            Movement::Deposit(_) => None,
        }
    }

    pub fn deposit_amount(&self) -> Option<f64> {
        match self.movement {
            Movement::Deposit(a) => Some(a),
            Movement::Withdrawal(_) => None,
        }
    }
}

/// Rule outcomes attached to one transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub dd_large_withdrawal: bool,
    pub rtgs_large_deposit: bool,
    pub entities: bool,
}

impl Flags {
    pub fn any(&self) -> bool {
        self.dd_large_withdrawal || self.rtgs_large_deposit || self.entities
    }
}

/// A transaction paired with its flags, produced once by the rule engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedTransaction {
    pub transaction: Transaction,
    pub flags: Flags,
}
