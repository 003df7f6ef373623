//! Which business segments need a TAN.

use crate::messages::OutgoingSegments;
use crate::session::{DialogSession, SINGLE_STEP_PROCEDURE};

/// Static TAN requirement of a segment, used when the bank sent no PIN/TAN parameters for it.
pub fn tan_required(segment: OutgoingSegments) -> bool {
    match segment {
        OutgoingSegments::Identification
        | OutgoingSegments::Statements
        | OutgoingSegments::StatementsCamt
        | OutgoingSegments::Transfer
        | OutgoingSegments::TransferScheduled
        | OutgoingSegments::CollectiveTransfer
        | OutgoingSegments::CollectiveTransferScheduled
        | OutgoingSegments::Rebooking
        | OutgoingSegments::DirectDebit
        | OutgoingSegments::CollectiveDirectDebit
        | OutgoingSegments::Prepaid
        | OutgoingSegments::StandingOrderCreate
        | OutgoingSegments::StandingOrderModify
        | OutgoingSegments::StandingOrderDelete => true,
        _ => false,
    }
}

/// Whether a TAN announcement must accompany `segment` in this session.
///
/// Never with the one-step procedure. Otherwise the bank's `HIPINS` entry wins over the static table.
pub(crate) fn requires_tan(session: &DialogSession, segment: OutgoingSegments) -> bool {
    if session.security_function == SINGLE_STEP_PROCEDURE {
        return false;
    }

    session
        .tan_requirements
        .get(segment.as_str())
        .copied()
        .unwrap_or_else(|| tan_required(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_table() {
        assert!(tan_required(OutgoingSegments::Transfer));
        assert!(tan_required(OutgoingSegments::StandingOrderDelete));
        assert!(!tan_required(OutgoingSegments::Balance));
        assert!(!tan_required(OutgoingSegments::TanMedia));
        assert!(!tan_required(OutgoingSegments::DialogEnd));
    }

    #[test]
    fn test_one_step_procedure_never_requires_tan() {
        let session = DialogSession::new();

        assert!(!requires_tan(&session, OutgoingSegments::Transfer));
    }

    #[test]
    fn test_bank_parameters_override_table() {
        let mut session = DialogSession::new();
        session.security_function = "942".into();

        assert!(requires_tan(&session, OutgoingSegments::Statements));
        assert!(!requires_tan(&session, OutgoingSegments::Balance));

        session.tan_requirements.insert("HKKAZ".into(), false);
        session.tan_requirements.insert("HKSAL".into(), true);

        assert!(!requires_tan(&session, OutgoingSegments::Statements));
        assert!(requires_tan(&session, OutgoingSegments::Balance));
    }
}
