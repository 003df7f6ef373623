//! Domain types for the accounts module

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

/// An account from the user parameter data (`HIUPD`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInformation {
    /// National account number.
    pub number: String,
    pub subaccount: String,
    /// Bank code the account is held at.
    pub bank_code: String,
    pub iban: String,
    pub bic: String,
    pub customer_id: String,
    /// Account type code, e.g. `1` for a current account.
    pub account_type: String,
    pub currency: String,
    pub owner: String,
    /// Product name, e.g. `Girokonto`.
    pub product: String,
    /// Segment ids of the business operations allowed on this account.
    pub permissions: Vec<String>,
}

impl AccountInformation {
    /// Returns `true` if the user may run the operation with the given segment id on this account.
    pub fn is_permitted(&self, segment_id: &str) -> bool {
        self.permissions.iter().any(|permission| permission == segment_id)
    }
}

impl fmt::Display for AccountInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.iban.is_empty() {
            write!(f, "{} ({})", self.number, self.product)
        } else {
            write!(f, "{} ({})", self.iban, self.product)
        }
    }
}

/// A signed amount at a booking date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Negative for debit balances.
    pub amount: Decimal,
    pub currency: String,
    pub date: Date,
}

/// Balance of an account (`HISAL`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account: String,
    pub product: String,
    pub currency: String,
    pub booked: Balance,
    /// Booked plus pending transactions, if the bank reports it.
    pub pending: Option<Balance>,
    pub credit_line: Option<Decimal>,
    /// Amount available for withdrawal.
    pub available: Option<Decimal>,
}
