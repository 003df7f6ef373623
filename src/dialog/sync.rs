//! Blocking dialog engine.

use log::{debug, error, info, warn};
use time::Date;

use crate::accounts::{decode_accounts, decode_balance, AccountBalance, AccountInformation};
use crate::connection::{ConnectionDetails, DialogOptions};
use crate::messages::envelope::{redact, Authentication};
use crate::messages::{IncomingSegments, OutgoingSegments, Segment};
use crate::pagination::{continuation_cursor, ContinuationCursor, PageCollector};
use crate::responses::{parameters, DialogResult};
use crate::session::{DialogSession, INITIAL_DIALOG_ID};
use crate::statements::{
    decode_camt, decode_scheduled_transfers, decode_standing_orders, decode_swift, decode_tan_media, CamtStatements, ScheduledTransfer, StandingOrder,
    StatementDecoder, StatementFormat, SwiftStatements,
};
use crate::tan::{TanChallenge, TanProvider, TanResponse};
use crate::transactions::encoders::*;
use crate::transactions::{CamtVersion, PainDocumentBuilder, PainKind, PainRequest, PainScheme, PrepaidTopUp, StandingOrderSchedule};
use crate::transport::recorder::MessageRecorder;
use crate::transport::Transport;
use crate::Error;

use super::common::{absorb_response, account_number, complete, ensure_kind, new_session, prepare_message, proceed};
use super::DialogState;


/// A FinTS dialog with one bank connection.
///
/// Every operation runs synchronization (when needed), initialization, the operation
/// itself and the TAN exchange over the given [Transport]. TAN challenges are answered
/// by the [TanProvider].
pub struct Dialog<T: Transport, P: TanProvider> {
    connection: ConnectionDetails,
    options: DialogOptions,
    session: DialogSession,
    transport: T,
    tan_provider: P,
    recorder: MessageRecorder,
}

impl<T: Transport, P: TanProvider> Dialog<T, P> {
    /// Creates a dialog with default [DialogOptions].
    ///
    /// # Arguments
    /// * `connection`   - login data; clones share the cached customer system id
    /// * `transport`    - sends messages to the bank
    /// * `tan_provider` - answers TAN challenges
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fints::connection::ConnectionDetails;
    /// use fints::dialog::Dialog;
    /// use fints::tan::tan_channel;
    /// use fints::Error;
    ///
    /// let connection = ConnectionDetails::default();
    /// let transport = |_request: &str| -> Result<String, Error> { Err(Error::Transport("offline".into())) };
    /// let (provider, _requests) = tan_channel();
    ///
    /// let mut dialog = Dialog::new(connection, transport, provider);
    /// println!("{}", dialog.state());
    /// ```
    pub fn new(connection: ConnectionDetails, transport: T, tan_provider: P) -> Self {
        Self::with_options(connection, DialogOptions::default(), transport, tan_provider)
    }

    pub fn with_options(connection: ConnectionDetails, options: DialogOptions, transport: T, tan_provider: P) -> Self {
        let session = new_session(&options);
        Dialog {
            connection,
            options,
            session,
            transport,
            tan_provider,
            recorder: MessageRecorder::from_env(),
        }
    }

    pub fn connection(&self) -> &ConnectionDetails {
        &self.connection
    }

    pub fn options(&self) -> &DialogOptions {
        &self.options
    }

    pub fn state(&self) -> DialogState {
        self.session.state
    }

    pub fn session(&self) -> &DialogSession {
        &self.session
    }

    /// Run operations against `account` instead of the connection's own account.
    pub fn select_account(&mut self, account: Option<AccountInformation>) {
        self.session.active_account = account;
    }

    /// Forget all dialog state. The customer system id cached on the connection is kept.
    pub fn reset(&mut self) {
        info!("resetting dialog");
        self.session = new_session(&self.options);
    }

    // Transport

    fn exchange(&mut self, message: String) -> Result<DialogResult<()>, Error> {
        debug!("-> {}", redact(&message));
        self.recorder.record_request(&message);

        let raw = match self.transport.send(&message) {
            Ok(raw) => raw,
            Err(err) => {
                error!("error sending message: {err}");
                self.session.fail();
                return Err(err);
            }
        };

        debug!("<- {raw}");
        self.recorder.record_response(&raw);

        match absorb_response(&self.options, &mut self.session, &raw) {
            Ok(result) => Ok(result),
            Err(err) => {
                error!("error parsing response: {err}");
                self.session.fail();
                Err(err)
            }
        }
    }

    fn send<F>(&mut self, authentication: Authentication, build: F) -> Result<DialogResult<()>, Error>
    where
        F: FnOnce(&ConnectionDetails, &DialogOptions, &mut DialogSession) -> Result<Vec<Segment>, Error>,
    {
        let message = match prepare_message(&self.connection, &self.options, &mut self.session, authentication, build) {
            Ok(message) => message,
            Err(err) => {
                error!("error building message: {err}");
                self.session.fail();
                return Err(err);
            }
        };

        self.exchange(message)
    }

    // Strong customer authentication

    /// Hand a TAN challenge to the provider and answer it.
    ///
    /// If the provider fails, its error is returned and the dialog stays in
    /// [DialogState::AwaitingSca] with the challenge pending: the bank still holds the
    /// order, so it can be confirmed with [submit_tan](Self::submit_tan) or dropped
    /// with [reset](Self::reset). Other operations fail with [Error::InvalidState] meanwhile.
    fn process_sca(&mut self, result: DialogResult<()>) -> Result<DialogResult<()>, Error> {
        if !result.is_sca_required() {
            return Ok(result);
        }

        self.session.transition(DialogState::AwaitingSca)?;

        let challenge = TanChallenge::new(result, self.session.challenge.clone(), self.session.order_reference.clone());
        info!("TAN required for order {:?}", challenge.order_reference());

        match self.tan_provider.request_tan(&challenge)? {
            TanResponse::Tan(tan) => self.send_tan(tan),
            TanResponse::Cancelled => self.abandon(),
        }
    }

    fn send_tan(&mut self, tan: String) -> Result<DialogResult<()>, Error> {
        self.send(Authentication::with_tan(tan), |connection, _, session| encode_tan_submission(connection, session))
    }

    fn abandon(&mut self) -> Result<DialogResult<()>, Error> {
        info!("TAN challenge cancelled, ending dialog {}", self.session.dialog_id);

        let result = self.send(self.authentication(), |connection, _, session| encode_dialog_end(connection, session))?;
        self.session.transition(DialogState::Terminated)?;
        self.session.sca_pending = false;

        Ok(result.abandon())
    }

    /// Answer the pending TAN challenge, e.g. after the TAN provider failed.
    ///
    /// Fails with [Error::InvalidState] unless the dialog is in [DialogState::AwaitingSca]
    /// with an order reference from the bank.
    pub fn submit_tan(&mut self, tan: &str) -> Result<DialogResult<()>, Error> {
        if self.session.state != DialogState::AwaitingSca || self.session.order_reference.is_none() {
            return Err(Error::InvalidState(format!("no TAN challenge pending in state {}", self.session.state)));
        }

        let result = self.send_tan(tan.to_owned())?;
        complete(&mut self.session, &result)?;
        Ok(result)
    }

    // Dialog lifecycle

    /// Request a customer system id and store it on the connection.
    pub fn synchronize(&mut self) -> Result<DialogResult<()>, Error> {
        self.session.transition(DialogState::Synchronizing)?;
        self.session.begin_dialog();

        let result = self.send(Authentication::pin(), encode_synchronization)?;
        if !result.is_success() {
            warn!("synchronization failed: {:?}", result.messages());
            self.session.transition(DialogState::Failed)?;
            return Ok(result);
        }

        match parameters::system_id(result.segments()) {
            Some(system_id) => {
                info!("synchronized, customer system id {system_id}");
                self.connection.system_id.set(system_id)?;
            }
            None => warn!("synchronization response carries no customer system id"),
        }

        self.session.transition(DialogState::Synchronized)?;
        Ok(result)
    }

    /// Open a dialog at the bank.
    ///
    /// # Arguments
    /// * `anonymous` - open an anonymous dialog without PIN
    pub fn initialize(&mut self, anonymous: bool) -> Result<DialogResult<()>, Error> {
        self.session.transition(DialogState::Initializing)?;
        self.session.begin_dialog();

        let result = if anonymous {
            self.send(Authentication::Anonymous, encode_anonymous_initialization)?
        } else {
            let result = self.send(Authentication::pin(), encode_initialization)?;
            self.process_sca(result)?
        };

        match self.session.state {
            DialogState::Terminated => {}
            _ if result.is_success() => {
                info!("dialog {} opened", self.session.dialog_id);
                self.session.transition(DialogState::Ready)?;
            }
            _ => self.session.transition(DialogState::Failed)?,
        }

        Ok(result)
    }

    /// End the open dialog at the bank (`HKEND`). The dialog stays terminated until [reset](Self::reset).
    pub fn end(&mut self) -> Result<DialogResult<()>, Error> {
        if self.session.state == DialogState::Terminated {
            return Err(Error::InvalidState("dialog already terminated".into()));
        }
        if self.session.dialog_id == INITIAL_DIALOG_ID {
            return Err(Error::InvalidState("no dialog open at the bank".into()));
        }

        let result = self.send(self.authentication(), |connection, _, session| encode_dialog_end(connection, session))?;
        self.session.transition(DialogState::Terminated)?;
        info!("dialog ended");
        Ok(result)
    }

    fn open(&mut self) -> Result<DialogResult<()>, Error> {
        if self.options.anonymous {
            return self.initialize(true);
        }
        if self.connection.customer_system_id()?.is_none() {
            proceed!(self.synchronize()?);
        }
        self.initialize(false)
    }

    fn authentication(&self) -> Authentication {
        if self.options.anonymous {
            Authentication::Anonymous
        } else {
            Authentication::pin()
        }
    }

    fn operate<F>(&mut self, build: F) -> Result<DialogResult<()>, Error>
    where
        F: FnOnce(&ConnectionDetails, &DialogOptions, &mut DialogSession) -> Result<Vec<Segment>, Error>,
    {
        proceed!(self.open()?);
        self.session.transition(DialogState::Operating)?;

        let result = self.send(self.authentication(), build)?;
        let result = self.process_sca(result)?;

        complete(&mut self.session, &result)?;
        Ok(result)
    }

    /// Repeat a retrieval while the bank returns continuation cursors.
    fn collect_pages<B, E, S>(&mut self, build: B, extract: E) -> Result<DialogResult<Vec<S>>, Error>
    where
        B: Fn(&ConnectionDetails, &mut DialogSession, Option<&ContinuationCursor>) -> Result<Vec<Segment>, Error>,
        E: Fn(&[Segment]) -> S,
    {
        proceed!(self.open()?);

        let mut pages = PageCollector::new(self.options.max_pages);
        let mut messages = Vec::new();
        let mut cursor: Option<ContinuationCursor> = None;

        loop {
            self.session.transition(DialogState::Operating)?;

            let result = self.send(self.authentication(), |connection, _, session| build(connection, session, cursor.as_ref()))?;
            let result = self.process_sca(result)?;

            if !result.is_success() {
                complete(&mut self.session, &result)?;
                return Ok(result.merge_messages(messages).retype());
            }

            pages.push(extract(result.segments()))?;

            match continuation_cursor(result.messages()) {
                Some(next) => {
                    if let Err(err) = pages.reserve() {
                        error!("bank still continues after {} pages", pages.len());
                        self.session.fail();
                        return Err(err);
                    }
                    debug!("continuing with cursor {next}");
                    messages.extend(result.messages().iter().cloned());
                    cursor = Some(next);
                }
                None => {
                    complete(&mut self.session, &result)?;
                    return Ok(result.merge_messages(messages).typed(pages.into_pages()));
                }
            }
        }
    }

    fn submit_order<B, E>(&mut self, request: &PainRequest, builder: &B, encode: E) -> Result<DialogResult<()>, Error>
    where
        B: PainDocumentBuilder,
        E: FnOnce(&ConnectionDetails, &mut DialogSession, PainScheme, &str) -> Result<Vec<Segment>, Error>,
    {
        self.operate(|connection, _, session| {
            let scheme = PainScheme::select(request.kind, &session.pain_schemes);
            let document = builder.build(request, scheme)?;
            encode(connection, session, scheme, &document)
        })
    }

    // Account information

    /// Accounts the user may access, from the user parameter data.
    pub fn accounts(&mut self) -> Result<DialogResult<Vec<AccountInformation>>, Error> {
        let result = proceed!(self.open()?);
        let accounts = decode_accounts(result.segments());
        Ok(result.typed(accounts))
    }

    /// Balance of the selected account (`HKSAL`).
    pub fn balance(&mut self) -> Result<DialogResult<AccountBalance>, Error> {
        let result = proceed!(self.operate(|connection, _, session| encode_balance(connection, session))?);
        let balance = result.segments_of(IncomingSegments::Balance).next().map(decode_balance).transpose()?;
        Ok(result.with_data(balance))
    }

    /// MT940 booked and MT942 pending transactions (`HKKAZ`), all pages.
    ///
    /// # Arguments
    /// * `from` - first booking date, bank default when `None`
    /// * `to`   - last booking date, bank default when `None`
    pub fn transactions(&mut self, from: Option<Date>, to: Option<Date>) -> Result<DialogResult<SwiftStatements>, Error> {
        let result = self.collect_pages(
            |connection, session, cursor| encode_statements(connection, session, from, to, cursor),
            decode_swift,
        )?;

        Ok(result.map(|pages| {
            pages.into_iter().fold(SwiftStatements::default(), |mut statements, page| {
                statements.append(page);
                statements
            })
        }))
    }

    /// Booked transactions decoded by `decoder`.
    pub fn transactions_with<D: StatementDecoder>(&mut self, from: Option<Date>, to: Option<Date>, decoder: &D) -> Result<DialogResult<Vec<D::Statement>>, Error> {
        let account = account_number(&self.connection, &self.session);
        self.transactions(from, to)?
            .try_map(|statements| decoder.decode(&statements.booked, &account, StatementFormat::Mt940))
    }

    /// camt.052/053 documents (`HKCAZ`), all pages.
    pub fn transactions_camt(&mut self, version: CamtVersion, from: Option<Date>, to: Option<Date>) -> Result<DialogResult<CamtStatements>, Error> {
        let result = self.collect_pages(
            |connection, session, cursor| encode_statements_camt(connection, session, version, from, to, cursor),
            decode_camt,
        )?;

        Ok(result.map(|pages| {
            pages.into_iter().fold(CamtStatements::default(), |mut statements, page| {
                statements.append(page);
                statements
            })
        }))
    }

    /// Booked camt documents decoded by `decoder`, in document order.
    pub fn transactions_camt_with<D: StatementDecoder>(
        &mut self,
        version: CamtVersion,
        from: Option<Date>,
        to: Option<Date>,
        decoder: &D,
    ) -> Result<DialogResult<Vec<D::Statement>>, Error> {
        let account = account_number(&self.connection, &self.session);
        self.transactions_camt(version, from, to)?.try_map(|statements| {
            let mut decoded = Vec::new();
            for document in &statements.booked {
                decoded.extend(decoder.decode(document, &account, StatementFormat::Camt(version))?);
            }
            Ok(decoded)
        })
    }

    // SEPA orders

    /// Single SEPA credit transfer (`HKCCS`).
    pub fn transfer<B: PainDocumentBuilder>(&mut self, request: &PainRequest, builder: &B) -> Result<DialogResult<()>, Error> {
        ensure_kind(request, PainKind::CreditTransfer)?;
        self.submit_order(request, builder, encode_transfer)
    }

    /// Credit transfer executed at the request's execution date (`HKCSE`).
    pub fn transfer_scheduled<B: PainDocumentBuilder>(&mut self, request: &PainRequest, builder: &B) -> Result<DialogResult<()>, Error> {
        ensure_kind(request, PainKind::CreditTransfer)?;
        self.submit_order(request, builder, encode_transfer_scheduled)
    }

    /// Several credit transfers in one order (`HKCCM`).
    pub fn collective_transfer<B: PainDocumentBuilder>(&mut self, request: &PainRequest, builder: &B) -> Result<DialogResult<()>, Error> {
        ensure_kind(request, PainKind::CreditTransfer)?;
        let total = request.total();
        self.submit_order(request, builder, |connection, session, scheme, document| {
            encode_collective_transfer(connection, session, scheme, document, total)
        })
    }

    /// Scheduled collective credit transfer (`HKCME`).
    pub fn collective_transfer_scheduled<B: PainDocumentBuilder>(&mut self, request: &PainRequest, builder: &B) -> Result<DialogResult<()>, Error> {
        ensure_kind(request, PainKind::CreditTransfer)?;
        let total = request.total();
        self.submit_order(request, builder, |connection, session, scheme, document| {
            encode_collective_transfer_scheduled(connection, session, scheme, document, total)
        })
    }

    /// Transfer between the user's own accounts (`HKCUM`).
    pub fn rebooking<B: PainDocumentBuilder>(&mut self, request: &PainRequest, builder: &B) -> Result<DialogResult<()>, Error> {
        ensure_kind(request, PainKind::CreditTransfer)?;
        self.submit_order(request, builder, encode_rebooking)
    }

    /// Single SEPA direct debit (`HKDSE`).
    pub fn collect<B: PainDocumentBuilder>(&mut self, request: &PainRequest, builder: &B) -> Result<DialogResult<()>, Error> {
        ensure_kind(request, PainKind::DirectDebit)?;
        self.submit_order(request, builder, encode_direct_debit)
    }

    /// Several direct debits in one order (`HKDME`).
    pub fn collective_collect<B: PainDocumentBuilder>(&mut self, request: &PainRequest, builder: &B) -> Result<DialogResult<()>, Error> {
        ensure_kind(request, PainKind::DirectDebit)?;
        let total = request.total();
        self.submit_order(request, builder, |connection, session, scheme, document| {
            encode_collective_direct_debit(connection, session, scheme, document, total)
        })
    }

    /// Prepaid mobile top-up (`HKPPD`).
    pub fn prepaid(&mut self, top_up: &PrepaidTopUp) -> Result<DialogResult<()>, Error> {
        self.operate(|connection, _, session| encode_prepaid(connection, session, top_up))
    }

    // Standing orders

    /// Create a standing order (`HKCDE`).
    pub fn submit_standing_order<B: PainDocumentBuilder>(
        &mut self,
        request: &PainRequest,
        schedule: &StandingOrderSchedule,
        builder: &B,
    ) -> Result<DialogResult<()>, Error> {
        ensure_kind(request, PainKind::CreditTransfer)?;
        self.submit_order(request, builder, |connection, session, scheme, document| {
            encode_standing_order(connection, session, OutgoingSegments::StandingOrderCreate, None, scheme, document, schedule)
        })
    }

    /// Replace payment and schedule of the standing order `order_id` (`HKCDN`).
    pub fn modify_standing_order<B: PainDocumentBuilder>(
        &mut self,
        order_id: &str,
        request: &PainRequest,
        schedule: &StandingOrderSchedule,
        builder: &B,
    ) -> Result<DialogResult<()>, Error> {
        ensure_kind(request, PainKind::CreditTransfer)?;
        self.submit_order(request, builder, |connection, session, scheme, document| {
            encode_standing_order(connection, session, OutgoingSegments::StandingOrderModify, Some(order_id), scheme, document, schedule)
        })
    }

    /// Delete a standing order previously listed by [standing_orders](Self::standing_orders) (`HKCDL`).
    pub fn delete_standing_order(&mut self, order: &StandingOrder) -> Result<DialogResult<()>, Error> {
        let Some(schedule) = &order.schedule else {
            return Err(Error::Simple(format!("standing order {} has no schedule", order.order_id)));
        };
        let Some(scheme) = PainScheme::from_descriptor(&order.scheme) else {
            return Err(Error::Simple(format!("unknown pain scheme {}", order.scheme)));
        };

        self.operate(|connection, _, session| {
            encode_standing_order(
                connection,
                session,
                OutgoingSegments::StandingOrderDelete,
                Some(&order.order_id),
                scheme,
                &order.document,
                schedule,
            )
        })
    }

    /// Standing orders of the selected account (`HKCDB`).
    pub fn standing_orders(&mut self) -> Result<DialogResult<Vec<StandingOrder>>, Error> {
        let result = proceed!(self.operate(|connection, _, session| {
            let scheme = PainScheme::select(PainKind::CreditTransfer, &session.pain_schemes);
            encode_standing_orders(connection, session, scheme)
        })?);

        let orders = decode_standing_orders(result.segments())?;
        Ok(result.typed(orders))
    }

    /// Scheduled transfers not yet executed (`HKCSB`).
    pub fn terminated_transfers(&mut self) -> Result<DialogResult<Vec<ScheduledTransfer>>, Error> {
        let result = proceed!(self.operate(|connection, _, session| {
            let scheme = PainScheme::select(PainKind::CreditTransfer, &session.pain_schemes);
            encode_scheduled_transfers(connection, session, scheme)
        })?);

        let transfers = decode_scheduled_transfers(result.segments())?;
        Ok(result.typed(transfers))
    }

    /// Names of the user's TAN media (`HKTAB`).
    pub fn tan_media(&mut self) -> Result<DialogResult<Vec<String>>, Error> {
        let result = proceed!(self.operate(|connection, _, session| encode_tan_media(connection, session))?);
        let media = decode_tan_media(result.segments());
        Ok(result.typed(media))
    }
}
