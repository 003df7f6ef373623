//! # Accounts
//!
//! Accounts the user may access, as reported in the user parameter data (`HIUPD`)
//! during dialog initialization, and account balances (`HISAL`).

mod decoders;
mod types;

pub use types::*;

pub(crate) use decoders::{decode_account_information, decode_balance, parse_amount, parse_date};

use log::warn;

use crate::messages::{IncomingSegments, Segment};

/// All accounts found in the user parameter data of a response. Entries the bank
/// sends without account number and IBAN are skipped.
pub(crate) fn decode_accounts(segments: &[Segment]) -> Vec<AccountInformation> {
    segments
        .iter()
        .filter(|segment| segment.kind() == IncomingSegments::AccountParameters)
        .filter_map(|segment| match decode_account_information(segment) {
            Ok(account) => Some(account),
            Err(err) => {
                warn!("skipping account parameters: {err}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests;
