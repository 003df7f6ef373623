//! Dialog-scoped session state.
//!
//! Every [Dialog](crate::dialog::Dialog) owns exactly one [DialogSession]. Nothing in
//! here is shared between dialogs, so independent dialogs can run concurrently
//! against different connections.

use std::collections::HashMap;

use log::{debug, error};

use crate::accounts::AccountInformation;
use crate::dialog::DialogState;
use crate::Error;

/// First segment number handed out in a dialog. Segment 1 is the message header.
pub const INITIAL_SEGMENT_NUMBER: u32 = 2;

/// Dialog id used until the bank assigns one.
pub const INITIAL_DIALOG_ID: &str = "0";

/// One-step security function (no TAN).
pub const SINGLE_STEP_PROCEDURE: &str = "999";

/// Allocates strictly increasing segment numbers within one dialog.
#[derive(Debug, Clone)]
pub struct SegmentNumbers {
    start: u32,
    next: u32,
}

impl SegmentNumbers {
    pub fn new(start: u32) -> Self {
        Self { start, next: start }
    }

    /// Gets the next number, advancing the counter.
    pub fn next(&mut self) -> u32 {
        let number = self.next;
        self.next += 1;
        number
    }

    /// Restarts at the initial value.
    pub fn reset(&mut self) {
        self.next = self.start;
    }
}

impl Default for SegmentNumbers {
    fn default() -> Self {
        Self::new(INITIAL_SEGMENT_NUMBER)
    }
}

/// State of the running dialog.
#[derive(Debug, Clone)]
pub struct DialogSession {
    pub(crate) state: DialogState,
    pub(crate) segment_numbers: SegmentNumbers,
    pub(crate) message_number: u32,
    pub(crate) dialog_id: String,

    // TAN handling
    pub(crate) security_function: String,
    pub(crate) allowed_tan_procedures: Vec<String>,
    pub(crate) sca_pending: bool,
    pub(crate) order_reference: Option<String>,
    pub(crate) challenge: Option<String>,
    pub(crate) tan_medium: Option<String>,

    // Bank and user parameters learned during initialization
    pub(crate) tan_requirements: HashMap<String, bool>,
    pub(crate) pain_schemes: Vec<String>,
    pub(crate) accounts: Vec<AccountInformation>,

    pub(crate) active_account: Option<AccountInformation>,
}

impl Default for DialogSession {
    fn default() -> Self {
        DialogSession {
            state: DialogState::Unsynchronized,
            segment_numbers: SegmentNumbers::default(),
            message_number: 0,
            dialog_id: String::from(INITIAL_DIALOG_ID),
            security_function: String::from(SINGLE_STEP_PROCEDURE),
            allowed_tan_procedures: Vec::new(),
            sca_pending: false,
            order_reference: None,
            challenge: None,
            tan_medium: None,
            tan_requirements: HashMap::new(),
            pain_schemes: Vec::new(),
            accounts: Vec::new(),
            active_account: None,
        }
    }
}

impl DialogSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current engine state.
    pub fn state(&self) -> DialogState {
        self.state
    }

    /// Dialog id assigned by the bank, `"0"` before initialization.
    pub fn dialog_id(&self) -> &str {
        &self.dialog_id
    }

    pub fn message_number(&self) -> u32 {
        self.message_number
    }

    /// The security function (TAN procedure) used for signed messages.
    pub fn security_function(&self) -> &str {
        &self.security_function
    }

    /// TAN procedures the bank allowed for this user (return code 3920).
    pub fn allowed_tan_procedures(&self) -> &[String] {
        &self.allowed_tan_procedures
    }

    /// `true` while a TAN challenge issued by the bank is unanswered.
    pub fn is_sca_pending(&self) -> bool {
        self.sca_pending
    }

    /// Order reference of the pending TAN challenge (HITAN).
    pub fn order_reference(&self) -> Option<&str> {
        self.order_reference.as_deref()
    }

    /// Accounts reported in the user parameter data.
    pub fn accounts(&self) -> &[AccountInformation] {
        &self.accounts
    }

    /// Account that operations act on, when different from the connection's own.
    pub fn active_account(&self) -> Option<&AccountInformation> {
        self.active_account.as_ref()
    }

    pub(crate) fn next_segment_number(&mut self) -> u32 {
        self.segment_numbers.next()
    }

    pub(crate) fn next_message_number(&mut self) -> u32 {
        self.message_number += 1;
        self.message_number
    }

    /// Start a new dialog. Counters, dialog id and pending challenges are cleared;
    /// parameters learned from the bank and the active account are kept.
    pub(crate) fn begin_dialog(&mut self) {
        self.segment_numbers.reset();
        self.message_number = 0;
        self.dialog_id = String::from(INITIAL_DIALOG_ID);
        self.sca_pending = false;
        self.order_reference = None;
        self.challenge = None;
    }

    /// Restore the initial state, forgetting everything learned from the bank.
    pub fn reset(&mut self) {
        *self = DialogSession::default();
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub(crate) fn transition(&mut self, next: DialogState) -> Result<(), Error> {
        let current = self.state;
        if current == next {
            return Ok(());
        }

        if !current.can_transition_to(next) {
            error!("rejected dialog transition {current} -> {next}");
            return Err(Error::InvalidState(format!("cannot move from {current} to {next}")));
        }

        debug!("dialog state {current} -> {next}");
        self.state = next;
        Ok(())
    }

    /// Mark the dialog failed after a transport or protocol fault. A terminated dialog stays terminated.
    pub(crate) fn fail(&mut self) {
        if self.state != DialogState::Terminated {
            debug!("dialog state {} -> {}", self.state, DialogState::Failed);
            self.state = DialogState::Failed;
        }
    }
}
