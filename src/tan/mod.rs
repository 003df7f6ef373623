//! # Strong customer authentication
//!
//! When the bank answers an order with one of the configured SCA return codes, the
//! dialog asks a TAN provider for a response. The provider either returns a TAN,
//! which is submitted in a follow-up `HKTAN` message, or cancels, which ends the
//! dialog.
//!
//! Providers can be closures or a channel pair created with `tan_channel`, where the
//! receiving side is served by another thread or task (for example a UI).

use crate::responses::DialogResult;

#[cfg(all(feature = "sync", not(feature = "async")))]
mod sync;

#[cfg(feature = "async")]
mod r#async;

#[cfg(all(feature = "sync", not(feature = "async")))]
pub use sync::{tan_channel, ChannelTanProvider, TanProvider, TanRequest};

#[cfg(feature = "async")]
pub use r#async::{tan_channel, AsyncTanProvider, ChannelTanProvider, TanRequest};

/// A TAN challenge issued by the bank.
#[derive(Debug, Clone)]
pub struct TanChallenge {
    result: DialogResult<()>,
    challenge: Option<String>,
    order_reference: Option<String>,
}

impl TanChallenge {
    pub(crate) fn new(result: DialogResult<()>, challenge: Option<String>, order_reference: Option<String>) -> TanChallenge {
        TanChallenge {
            result,
            challenge,
            order_reference,
        }
    }

    /// The response that announced the challenge.
    pub fn result(&self) -> &DialogResult<()> {
        &self.result
    }

    /// Challenge text to show the user, if the bank sent one.
    pub fn challenge(&self) -> Option<&str> {
        self.challenge.as_deref()
    }

    /// Reference of the order awaiting the TAN.
    pub fn order_reference(&self) -> Option<&str> {
        self.order_reference.as_deref()
    }
}

/// Answer of a TAN provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TanResponse {
    Tan(String),
    /// The user declined. The dialog is ended and the operation fails.
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::decode;
    use crate::responses::ScaCodes;
    use crate::testdata::responses::SCA_REQUIRED;

    #[test]
    fn test_challenge_accessors() {
        let segments = decode(SCA_REQUIRED).unwrap();
        let result = DialogResult::from_segments(SCA_REQUIRED, segments, &ScaCodes::default());

        let challenge = TanChallenge::new(result, Some("Bitte TAN eingeben".into()), Some("ORDERREF1".into()));

        assert!(challenge.result().is_sca_required());
        assert_eq!(challenge.challenge(), Some("Bitte TAN eingeben"));
        assert_eq!(challenge.order_reference(), Some("ORDERREF1"));
    }
}
