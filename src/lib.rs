//! A client implementation of the German FinTS/HBCI online banking protocol (FinTS 3.0, PIN/TAN).
//!
//! The crate implements the protocol dialog engine: segment encoding and escaping, the
//! synchronization, initialization, operation and TAN (strong customer authentication)
//! sequence, parsing of bank return codes and paginated statement retrieval.
//!
//! HTTP transport, SEPA `pain` document generation and MT940/camt statement parsing are
//! left to the caller and plugged in through [Transport](crate::transport::Transport),
//! [PainDocumentBuilder](crate::transactions::PainDocumentBuilder) and
//! [StatementDecoder](crate::statements::StatementDecoder).
//!
//!```no_run
//!     use fints::connection::ConnectionDetails;
//!     use fints::dialog::Dialog;
//!     use fints::tan::{TanChallenge, TanResponse};
//!     use fints::Error;
//!
//!     fn main() -> anyhow::Result<()> {
//!         let connection = ConnectionDetails {
//!             url: "https://banking.example.com/fints".into(),
//!             bank_code: "12345678".into(),
//!             user_id: "user".into(),
//!             pin: "12345".into(),
//!             account: "1234567".into(),
//!             ..Default::default()
//!         };
//!
//!         let transport = |request: &str| -> Result<String, Error> {
//!             // POST base64(request) to connection.url and decode the reply
//!             unimplemented!("{request}")
//!         };
//!
//!         let mut dialog = Dialog::new(connection, transport, |_: &TanChallenge| TanResponse::Cancelled);
//!         let balance = dialog.balance()?;
//!
//!         for message in balance.messages() {
//!             println!("{message}");
//!         }
//!         println!("balance: {:?}", balance.data());
//!         Ok(())
//!     }
//!```
//!
//! ## Features
//!
//! - `sync` (default): blocking [Dialog](crate::dialog::Dialog).
//! - `async`: the same engine on top of `async`/`await`. Takes precedence over `sync`.

use rust_decimal::Decimal;
use time::Date;

/// Accounts from the user parameter data and balances.
pub mod accounts;

/// Login data, customer system id and engine options.
pub mod connection;

/// The dialog engine.
pub mod dialog;

/// Segment model and wire codec.
pub mod messages;

/// Continuation cursors and page accumulation.
pub mod pagination;

/// Bank return codes and dialog results.
pub mod responses;

/// Per-dialog session state.
pub mod session;

/// Statement payloads and decoders.
pub mod statements;

/// Strong customer authentication.
pub mod tan;

/// Business operation builders.
pub mod transactions;

/// Transport collaborator.
pub mod transport;

mod errors;

#[doc(inline)]
pub use errors::Error;

#[doc(inline)]
pub use responses::{BankMessage, DialogResult, Severity};

#[cfg(test)]
pub(crate) mod stubs;

#[cfg(test)]
pub(crate) mod common;

#[cfg(test)]
pub(crate) mod testdata;

/// Conversion of values into the text of a single data element.
pub(crate) trait ToField {
    fn to_field(&self) -> String;
}

impl ToField for bool {
    fn to_field(&self) -> String {
        if *self {
            String::from("J")
        } else {
            String::from("N")
        }
    }
}

impl ToField for String {
    fn to_field(&self) -> String {
        self.clone()
    }
}

impl ToField for &str {
    fn to_field(&self) -> String {
        <&str>::clone(self).to_string()
    }
}

impl ToField for u32 {
    fn to_field(&self) -> String {
        self.to_string()
    }
}

impl ToField for usize {
    fn to_field(&self) -> String {
        self.to_string()
    }
}

impl ToField for i32 {
    fn to_field(&self) -> String {
        self.to_string()
    }
}

// FinTS amounts use a decimal comma and always carry it, e.g. `100,` or `12,5`.
impl ToField for Decimal {
    fn to_field(&self) -> String {
        let text = self.normalize().to_string();
        if text.contains('.') {
            text.replace('.', ",")
        } else {
            format!("{text},")
        }
    }
}

impl ToField for Date {
    fn to_field(&self) -> String {
        format!("{:04}{:02}{:02}", self.year(), u8::from(self.month()), self.day())
    }
}

impl<T: ToField> ToField for Option<T> {
    fn to_field(&self) -> String {
        encode_option_field(self)
    }
}

fn encode_option_field<T: ToField>(val: &Option<T>) -> String {
    match val {
        Some(val) => val.to_field(),
        None => String::from(""),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use super::*;

    #[test]
    fn test_decimal_to_field() {
        assert_eq!(Decimal::new(12345, 2).to_field(), "123,45");
        assert_eq!(Decimal::new(100, 0).to_field(), "100,");
        assert_eq!(Decimal::new(1250, 2).to_field(), "12,5");
    }

    #[test]
    fn test_date_to_field() {
        assert_eq!(date!(2024 - 01 - 05).to_field(), "20240105");
        assert_eq!(Some(date!(2023 - 12 - 31)).to_field(), "20231231");
        assert_eq!(Option::<Date>::None.to_field(), "");
    }
}
