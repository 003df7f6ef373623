//! Segment builders for every business operation.
//!
//! Builders allocate segment numbers from the session and never perform I/O. When
//! an operation needs a TAN, a two-step `HKTAN` announcement (process 4) follows
//! the operation segment.

use rust_decimal::Decimal;
use time::Date;

use crate::connection::{ConnectionDetails, DialogOptions, COUNTRY_CODE};
use crate::messages::{Field, OutgoingSegments, Segment};
use crate::pagination::ContinuationCursor;
use crate::session::DialogSession;
use crate::{Error, ToField};

use super::rules::requires_tan;
use super::{CamtVersion, PainScheme, PrepaidTopUp, StandingOrderSchedule};


const ANONYMOUS_CUSTOMER_ID: &str = "9999999999";
const CURRENCY: &str = "EUR";

const TAN_VERSION: u32 = 6;
const TAN_PROCESS_ANNOUNCE: &str = "4";
const TAN_PROCESS_SUBMIT: &str = "2";
// Position of the TAN medium name in HKTAN version 6.
const TAN_MEDIUM_FIELD: usize = 10;

fn segment(session: &mut DialogSession, kind: OutgoingSegments, version: u32) -> Segment {
    Segment::new(kind.as_str(), session.next_segment_number(), version)
}

fn bank_identification(connection: &ConnectionDetails) -> Field {
    Field::group([COUNTRY_CODE, connection.bank_code.as_str()])
}

// IBAN:BIC:account:subaccount:country:bank code
fn account_identification(connection: &ConnectionDetails, session: &DialogSession) -> Field {
    match &session.active_account {
        Some(account) => {
            let bic = if account.bic.is_empty() { &connection.bic } else { &account.bic };
            let bank_code = if account.bank_code.is_empty() { &connection.bank_code } else { &account.bank_code };
            Field::group([
                account.iban.as_str(),
                bic.as_str(),
                account.number.as_str(),
                account.subaccount.as_str(),
                COUNTRY_CODE,
                bank_code.as_str(),
            ])
        }
        None => Field::group([
            connection.iban.as_str(),
            connection.bic.as_str(),
            connection.account.as_str(),
            "",
            COUNTRY_CODE,
            connection.bank_code.as_str(),
        ]),
    }
}

// IBAN:BIC
fn sepa_account(connection: &ConnectionDetails, session: &DialogSession) -> Field {
    match &session.active_account {
        Some(account) if !account.iban.is_empty() => {
            let bic = if account.bic.is_empty() { &connection.bic } else { &account.bic };
            Field::group([account.iban.as_str(), bic.as_str()])
        }
        _ => Field::group([connection.iban.as_str(), connection.bic.as_str()]),
    }
}

fn amount(value: Decimal) -> Field {
    Field::group([value.to_field(), CURRENCY.to_owned()])
}

fn tan_announcement(session: &mut DialogSession, reference: OutgoingSegments) -> Segment {
    let mut tan = segment(session, OutgoingSegments::Tan, TAN_VERSION);
    tan.push_field(&TAN_PROCESS_ANNOUNCE);
    tan.push_field(&reference);

    if let Some(medium) = session.tan_medium.clone() {
        while tan.fields.len() < TAN_MEDIUM_FIELD {
            tan.push_field(&"");
        }
        tan.push_field(&medium);
    }

    tan
}

/// Appends the TAN announcement if `kind` needs one in this session.
fn finish(session: &mut DialogSession, kind: OutgoingSegments, operation: Segment) -> Vec<Segment> {
    let mut segments = vec![operation];
    if requires_tan(session, kind) {
        segments.push(tan_announcement(session, kind));
    }
    segments
}

fn identification(connection: &ConnectionDetails, session: &mut DialogSession, customer_id: &str, system_id: &str) -> Segment {
    let mut identification = segment(session, OutgoingSegments::Identification, 2);
    identification.push(bank_identification(connection));
    identification.push_field(&customer_id);
    identification.push_field(&system_id);
    identification.push_field(&if system_id == "0" && customer_id == ANONYMOUS_CUSTOMER_ID { "0" } else { "1" });
    identification
}

fn processing_preparation(options: &DialogOptions, session: &mut DialogSession) -> Segment {
    let mut preparation = segment(session, OutgoingSegments::ProcessingPreparation, 3);
    preparation.push_field(&"0"); // BPD version
    preparation.push_field(&"0"); // UPD version
    preparation.push_field(&"0"); // dialog language
    preparation.push_field(&options.product_id);
    preparation.push_field(&options.product_version);
    preparation
}

/// HKIDN + HKVVB + HKSYN: request a customer system id.
pub(crate) fn encode_synchronization(connection: &ConnectionDetails, options: &DialogOptions, session: &mut DialogSession) -> Result<Vec<Segment>, Error> {
    let identification = identification(connection, session, connection.customer_id(), "0");
    let preparation = processing_preparation(options, session);

    let mut synchronization = segment(session, OutgoingSegments::Synchronization, 3);
    synchronization.push_field(&"0");

    Ok(vec![identification, preparation, synchronization])
}

/// HKIDN + HKVVB, with a TAN announcement for two-step procedures.
pub(crate) fn encode_initialization(connection: &ConnectionDetails, options: &DialogOptions, session: &mut DialogSession) -> Result<Vec<Segment>, Error> {
    let system_id = connection.customer_system_id()?.unwrap_or_else(|| String::from("0"));

    let identification = identification(connection, session, connection.customer_id(), &system_id);
    let preparation = processing_preparation(options, session);

    let mut segments = vec![identification, preparation];
    if requires_tan(session, OutgoingSegments::Identification) {
        segments.push(tan_announcement(session, OutgoingSegments::Identification));
    }
    Ok(segments)
}

/// HKIDN + HKVVB for an anonymous dialog.
pub(crate) fn encode_anonymous_initialization(connection: &ConnectionDetails, options: &DialogOptions, session: &mut DialogSession) -> Result<Vec<Segment>, Error> {
    let identification = identification(connection, session, ANONYMOUS_CUSTOMER_ID, "0");
    let preparation = processing_preparation(options, session);

    Ok(vec![identification, preparation])
}

/// HKEND
pub(crate) fn encode_dialog_end(_connection: &ConnectionDetails, session: &mut DialogSession) -> Result<Vec<Segment>, Error> {
    let mut end = segment(session, OutgoingSegments::DialogEnd, 1);
    end.push_field(&session.dialog_id);
    Ok(vec![end])
}

/// HKTAN process 2. The TAN itself travels in the signature trailer.
pub(crate) fn encode_tan_submission(_connection: &ConnectionDetails, session: &mut DialogSession) -> Result<Vec<Segment>, Error> {
    let Some(order_reference) = session.order_reference.clone() else {
        return Err(Error::InvalidState("no TAN order reference to answer".into()));
    };

    let mut tan = segment(session, OutgoingSegments::Tan, TAN_VERSION);
    tan.push_field(&TAN_PROCESS_SUBMIT);
    tan.push_field(&""); // segment id
    tan.push_field(&""); // account
    tan.push_field(&""); // order hash
    tan.push_field(&order_reference);
    tan.push_field(&false); // further TAN follows
    Ok(vec![tan])
}

/// HKTAB: list the user's TAN media.
pub(crate) fn encode_tan_media(_connection: &ConnectionDetails, session: &mut DialogSession) -> Result<Vec<Segment>, Error> {
    let mut media = segment(session, OutgoingSegments::TanMedia, 4);
    media.push_field(&"0"); // medium type: all
    media.push_field(&"A"); // medium class: all
    Ok(vec![media])
}

/// HKSAL
pub(crate) fn encode_balance(connection: &ConnectionDetails, session: &mut DialogSession) -> Result<Vec<Segment>, Error> {
    let mut balance = segment(session, OutgoingSegments::Balance, 7);
    balance.push(account_identification(connection, session));
    balance.push_field(&false); // all accounts
    Ok(finish(session, OutgoingSegments::Balance, balance))
}

/// HKKAZ: MT940 statements, continued from `cursor`.
pub(crate) fn encode_statements(
    connection: &ConnectionDetails,
    session: &mut DialogSession,
    from: Option<Date>,
    to: Option<Date>,
    cursor: Option<&ContinuationCursor>,
) -> Result<Vec<Segment>, Error> {
    let mut statements = segment(session, OutgoingSegments::Statements, 7);
    statements.push(account_identification(connection, session));
    statements.push_field(&false); // all accounts
    statements.push_field(&from);
    statements.push_field(&to);
    statements.push_field(&""); // maximum entries
    statements.push_field(&cursor.map(|cursor| cursor.as_str().to_owned()));
    Ok(finish(session, OutgoingSegments::Statements, statements))
}

/// HKCAZ: camt statements, continued from `cursor`.
pub(crate) fn encode_statements_camt(
    connection: &ConnectionDetails,
    session: &mut DialogSession,
    version: CamtVersion,
    from: Option<Date>,
    to: Option<Date>,
    cursor: Option<&ContinuationCursor>,
) -> Result<Vec<Segment>, Error> {
    let mut statements = segment(session, OutgoingSegments::StatementsCamt, 1);
    statements.push(account_identification(connection, session));
    statements.push_field(&version.urn());
    statements.push_field(&false);
    statements.push_field(&from);
    statements.push_field(&to);
    statements.push_field(&"");
    statements.push_field(&cursor.map(|cursor| cursor.as_str().to_owned()));
    Ok(finish(session, OutgoingSegments::StatementsCamt, statements))
}

// IBAN:BIC + scheme + @document
fn single_order(connection: &ConnectionDetails, session: &mut DialogSession, kind: OutgoingSegments, scheme: PainScheme, document: &str) -> Vec<Segment> {
    let mut order = segment(session, kind, 1);
    order.push(sepa_account(connection, session));
    order.push_field(&scheme.urn());
    order.push_binary(document);
    finish(session, kind, order)
}

// IBAN:BIC + total:EUR + J + scheme + @document
fn collective_order(
    connection: &ConnectionDetails,
    session: &mut DialogSession,
    kind: OutgoingSegments,
    scheme: PainScheme,
    document: &str,
    total: Decimal,
) -> Vec<Segment> {
    let mut order = segment(session, kind, 1);
    order.push(sepa_account(connection, session));
    order.push(amount(total));
    order.push_field(&true); // single bookings requested
    order.push_field(&scheme.urn());
    order.push_binary(document);
    finish(session, kind, order)
}

/// HKCCS
pub(crate) fn encode_transfer(connection: &ConnectionDetails, session: &mut DialogSession, scheme: PainScheme, document: &str) -> Result<Vec<Segment>, Error> {
    Ok(single_order(connection, session, OutgoingSegments::Transfer, scheme, document))
}

/// HKCSE
pub(crate) fn encode_transfer_scheduled(connection: &ConnectionDetails, session: &mut DialogSession, scheme: PainScheme, document: &str) -> Result<Vec<Segment>, Error> {
    Ok(single_order(connection, session, OutgoingSegments::TransferScheduled, scheme, document))
}

/// HKCCM
pub(crate) fn encode_collective_transfer(
    connection: &ConnectionDetails,
    session: &mut DialogSession,
    scheme: PainScheme,
    document: &str,
    total: Decimal,
) -> Result<Vec<Segment>, Error> {
    Ok(collective_order(connection, session, OutgoingSegments::CollectiveTransfer, scheme, document, total))
}

/// HKCME
pub(crate) fn encode_collective_transfer_scheduled(
    connection: &ConnectionDetails,
    session: &mut DialogSession,
    scheme: PainScheme,
    document: &str,
    total: Decimal,
) -> Result<Vec<Segment>, Error> {
    Ok(collective_order(
        connection,
        session,
        OutgoingSegments::CollectiveTransferScheduled,
        scheme,
        document,
        total,
    ))
}

/// HKCUM
pub(crate) fn encode_rebooking(connection: &ConnectionDetails, session: &mut DialogSession, scheme: PainScheme, document: &str) -> Result<Vec<Segment>, Error> {
    Ok(single_order(connection, session, OutgoingSegments::Rebooking, scheme, document))
}

/// HKDSE
pub(crate) fn encode_direct_debit(connection: &ConnectionDetails, session: &mut DialogSession, scheme: PainScheme, document: &str) -> Result<Vec<Segment>, Error> {
    Ok(single_order(connection, session, OutgoingSegments::DirectDebit, scheme, document))
}

/// HKDME
pub(crate) fn encode_collective_direct_debit(
    connection: &ConnectionDetails,
    session: &mut DialogSession,
    scheme: PainScheme,
    document: &str,
    total: Decimal,
) -> Result<Vec<Segment>, Error> {
    Ok(collective_order(connection, session, OutgoingSegments::CollectiveDirectDebit, scheme, document, total))
}

/// HKPPD
pub(crate) fn encode_prepaid(connection: &ConnectionDetails, session: &mut DialogSession, top_up: &PrepaidTopUp) -> Result<Vec<Segment>, Error> {
    let mut prepaid = segment(session, OutgoingSegments::Prepaid, 2);
    prepaid.push(sepa_account(connection, session));
    prepaid.push_field(&top_up.provider);
    prepaid.push_field(&top_up.phone_number);
    prepaid.push(amount(top_up.amount));
    Ok(finish(session, OutgoingSegments::Prepaid, prepaid))
}

// first execution:unit:rota:day[:last execution]
fn schedule_field(schedule: &StandingOrderSchedule) -> Field {
    Field::group([
        schedule.first_execution.to_field(),
        schedule.unit.code().to_owned(),
        schedule.rota.to_field(),
        schedule.day.to_field(),
        schedule.last_execution.to_field(),
    ])
}

/// HKCDE, HKCDN or HKCDL. Modifications and deletions name the bank's order id.
pub(crate) fn encode_standing_order(
    connection: &ConnectionDetails,
    session: &mut DialogSession,
    kind: OutgoingSegments,
    order_id: Option<&str>,
    scheme: PainScheme,
    document: &str,
    schedule: &StandingOrderSchedule,
) -> Result<Vec<Segment>, Error> {
    if !matches!(
        kind,
        OutgoingSegments::StandingOrderCreate | OutgoingSegments::StandingOrderModify | OutgoingSegments::StandingOrderDelete
    ) {
        return Err(Error::Simple(format!("{kind} is not a standing order segment")));
    }
    if kind != OutgoingSegments::StandingOrderCreate && order_id.is_none() {
        return Err(Error::Simple(format!("{kind} requires an order id")));
    }

    let mut order = segment(session, kind, 1);
    order.push(account_identification(connection, session));
    order.push_field(&scheme.urn());
    order.push_binary(document);
    order.push_field(&order_id.unwrap_or_default());
    order.push(schedule_field(schedule));
    Ok(finish(session, kind, order))
}

/// HKCDB
pub(crate) fn encode_standing_orders(connection: &ConnectionDetails, session: &mut DialogSession, scheme: PainScheme) -> Result<Vec<Segment>, Error> {
    let mut orders = segment(session, OutgoingSegments::StandingOrders, 1);
    orders.push(sepa_account(connection, session));
    orders.push_field(&scheme.urn());
    Ok(finish(session, OutgoingSegments::StandingOrders, orders))
}

/// HKCSB
pub(crate) fn encode_scheduled_transfers(connection: &ConnectionDetails, session: &mut DialogSession, scheme: PainScheme) -> Result<Vec<Segment>, Error> {
    let mut transfers = segment(session, OutgoingSegments::ScheduledTransfers, 1);
    transfers.push(sepa_account(connection, session));
    transfers.push_field(&scheme.urn());
    Ok(finish(session, OutgoingSegments::ScheduledTransfers, transfers))
}
