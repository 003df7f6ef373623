//! Pieces shared by the blocking and the asynchronous dialog.

use log::{debug, info, warn};

use crate::accounts::{decode_accounts, AccountInformation};
use crate::connection::{ConnectionDetails, DialogOptions};
use crate::messages::envelope::{Authentication, MessageFrame};
use crate::messages::Segment;
use crate::responses::{parameters, parse_response, DialogResult};
use crate::session::{DialogSession, SINGLE_STEP_PROCEDURE};
use crate::transactions::{PainKind, PainRequest};
use crate::Error;

use super::DialogState;

/// Continue with a successful [DialogResult], or return the failed one from the enclosing function.
macro_rules! proceed {
    ($result:expr) => {
        match $result.into_step() {
            Ok(result) => result,
            Err(failed) => return Ok(failed),
        }
    };
}

pub(crate) use proceed;

/// Build the operation segments and wrap them into a complete message.
pub(crate) fn prepare_message<F>(
    connection: &ConnectionDetails,
    options: &DialogOptions,
    session: &mut DialogSession,
    authentication: Authentication,
    build: F,
) -> Result<String, Error>
where
    F: FnOnce(&ConnectionDetails, &DialogOptions, &mut DialogSession) -> Result<Vec<Segment>, Error>,
{
    let frame = MessageFrame::open(session, authentication);
    let segments: Vec<Segment> = build(connection, options, session)?;
    frame.close(connection, session, segments)
}

/// Parse a response and remember what the bank told us about the dialog.
pub(crate) fn absorb_response(options: &DialogOptions, session: &mut DialogSession, raw: &str) -> Result<DialogResult<()>, Error> {
    let result = parse_response(raw, &options.sca_codes)?;
    let segments = result.segments();

    if let Some(dialog_id) = parameters::dialog_id(segments) {
        session.dialog_id = dialog_id;
    }

    let allowed = parameters::allowed_tan_procedures(result.messages());
    if !allowed.is_empty() {
        if let Some(procedure) = select_tan_procedure(options, &allowed) {
            if procedure != session.security_function {
                info!("using TAN procedure {procedure}");
            }
            session.security_function = procedure;
        }
        session.allowed_tan_procedures = allowed;
    }

    if let Some((order_reference, challenge)) = parameters::tan_challenge(segments) {
        if order_reference.is_some() {
            session.order_reference = order_reference;
        }
        session.challenge = challenge;
    }
    session.sca_pending = result.is_sca_required();

    let requirements = parameters::tan_requirements(segments);
    if !requirements.is_empty() {
        session.tan_requirements = requirements;
    }

    let schemes = parameters::pain_schemes(segments);
    if !schemes.is_empty() {
        session.pain_schemes = schemes;
    }

    let accounts = decode_accounts(segments);
    if !accounts.is_empty() {
        debug!("bank reported {} accounts", accounts.len());
        session.accounts = accounts;
    }

    Ok(result)
}

/// The caller's preferred procedure if the bank allows it, else the first two-step procedure.
pub(crate) fn select_tan_procedure(options: &DialogOptions, allowed: &[String]) -> Option<String> {
    if let Some(preferred) = &options.tan_procedure {
        if allowed.contains(preferred) {
            return Some(preferred.clone());
        }
        warn!("TAN procedure {preferred} is not allowed, choosing from {allowed:?}");
    }

    allowed
        .iter()
        .find(|procedure| procedure.as_str() != SINGLE_STEP_PROCEDURE)
        .or_else(|| allowed.first())
        .cloned()
}

/// A fresh session for a dialog created with `options`.
pub(crate) fn new_session(options: &DialogOptions) -> DialogSession {
    let mut session = DialogSession::new();
    session.tan_medium = options.tan_medium.clone();
    session
}

/// Record the outcome of an operation, unless the dialog was terminated on the way.
pub(crate) fn complete<T>(session: &mut DialogSession, result: &DialogResult<T>) -> Result<(), Error> {
    match session.state {
        DialogState::Terminated => Ok(()),
        _ if result.is_success() => session.transition(DialogState::Completed),
        _ => session.transition(DialogState::Failed),
    }
}

pub(crate) fn ensure_kind(request: &PainRequest, expected: PainKind) -> Result<(), Error> {
    if request.kind != expected {
        return Err(Error::Document(format!("expected a {expected:?} request, got {:?}", request.kind)));
    }
    Ok(())
}

/// Number of the account operations act on.
pub(crate) fn account_number(connection: &ConnectionDetails, session: &DialogSession) -> String {
    session
        .active_account
        .as_ref()
        .map(|account: &AccountInformation| account.number.clone())
        .unwrap_or_else(|| connection.account.clone())
}
