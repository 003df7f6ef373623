//! # Dialog engine
//!
//! A [Dialog] runs every public operation through the full protocol sequence:
//!
//! 1. synchronization (`HKSYN`), only while the connection has no customer system id,
//! 2. initialization (`HKIDN`/`HKVVB`), which opens a dialog at the bank,
//! 3. the operation itself, followed by the TAN exchange when the bank asks for
//!    strong customer authentication,
//! 4. for statement retrievals, one further request per continuation cursor.
//!
//! Bank-reported failures are returned as failed [DialogResult](crate::DialogResult)s and
//! stop the sequence at the step that failed. Transport and framing faults are
//! returned as [Error](crate::Error).
//!
//! The dialog does not send `HKEND` after an operation; call `end` for that. A
//! cancelled TAN challenge ends the dialog and leaves it [DialogState::Terminated]
//! until `reset` is called.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

mod common;

#[cfg(all(feature = "sync", not(feature = "async")))]
mod sync;

#[cfg(feature = "async")]
mod r#async;

#[cfg(all(feature = "sync", not(feature = "async")))]
pub use sync::Dialog;

#[cfg(feature = "async")]
pub use r#async::Dialog;

/// States of the dialog state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogState {
    /// No customer system id is known yet.
    Unsynchronized,
    Synchronizing,
    /// A customer system id is cached on the connection.
    Synchronized,
    Initializing,
    /// A dialog is open at the bank.
    Ready,
    Operating,
    /// Waiting for the TAN provider.
    AwaitingSca,
    Completed,
    Failed,
    /// Ended by `HKEND`. Nothing but a reset leaves this state.
    Terminated,
}

impl DialogState {
    pub fn can_transition_to(self, next: DialogState) -> bool {
        use DialogState::*;

        match (self, next) {
            (Terminated, _) => false,
            (_, Terminated) => true,
            (Unsynchronized | Synchronized | Ready | Completed | Failed, Synchronizing | Initializing) => true,
            (Synchronizing, Synchronized | Failed) => true,
            (Initializing, Ready | AwaitingSca | Failed) => true,
            (Ready, Operating) => true,
            (Operating, AwaitingSca | Completed | Failed) => true,
            (AwaitingSca, Ready | Operating | Completed | Failed) => true,
            _ => false,
        }
    }
}

impl Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
