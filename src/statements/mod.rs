//! # Statements
//!
//! Payloads the bank embeds in responses: MT940/MT942 statement data (`HIKAZ`),
//! camt documents (`HICAZ`), standing orders (`HICDB`), scheduled transfers (`HICSB`)
//! and TAN media (`HITAB`). Binary payloads are read by their declared length, so
//! documents containing delimiter characters or several documents in one response
//! are extracted exactly.
//!
//! Turning MT940 or camt payloads into statement records is left to a
//! [StatementDecoder] supplied by the caller.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::transactions::{CamtVersion, StandingOrderSchedule};
use crate::Error;

mod decoders;

pub(crate) use decoders::{decode_camt, decode_scheduled_transfers, decode_standing_orders, decode_swift, decode_tan_media};


/// Encoding of a statement payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementFormat {
    /// SWIFT MT940 (booked) or MT942 (pending).
    Mt940,
    Camt(CamtVersion),
}

/// MT940 booked and MT942 pending transactions, pages concatenated in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwiftStatements {
    pub booked: String,
    pub pending: String,
}

impl SwiftStatements {
    pub(crate) fn append(&mut self, page: SwiftStatements) {
        self.booked.push_str(&page.booked);
        self.pending.push_str(&page.pending);
    }
}

/// camt documents, one entry per document, pages in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CamtStatements {
    pub booked: Vec<String>,
    pub pending: Vec<String>,
}

impl CamtStatements {
    pub(crate) fn append(&mut self, mut page: CamtStatements) {
        self.booked.append(&mut page.booked);
        self.pending.append(&mut page.pending);
    }
}

/// A standing order held by the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingOrder {
    pub account: String,
    /// Scheme descriptor of `document`.
    pub scheme: String,
    /// The pain.001 document describing the payment.
    pub document: String,
    /// Order id needed to modify or delete the order.
    pub order_id: String,
    pub schedule: Option<StandingOrderSchedule>,
}

/// A scheduled (terminated) transfer not yet executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTransfer {
    pub account: String,
    pub scheme: String,
    pub document: String,
    pub order_id: String,
    pub execution_date: Option<Date>,
}

/// Turns raw statement payloads into records. Implemented by the caller.
pub trait StatementDecoder {
    type Statement;

    /// Decode `payload` of `account`, keeping the order of the payload.
    fn decode(&self, payload: &str, account: &str, format: StatementFormat) -> Result<Vec<Self::Statement>, Error>;
}

impl<F, S> StatementDecoder for F
where
    F: Fn(&str, &str, StatementFormat) -> Result<Vec<S>, Error>,
{
    type Statement = S;

    fn decode(&self, payload: &str, account: &str, format: StatementFormat) -> Result<Vec<S>, Error> {
        self(payload, account, format)
    }
}
