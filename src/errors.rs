use std::num::ParseIntError;

use thiserror::Error;

/// Errors raised by the dialog engine.
///
/// Bank-reported business errors are never represented here. They are carried as
/// [BankMessage](crate::responses::BankMessage) values inside a
/// [DialogResult](crate::responses::DialogResult).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // Errors from external libraries
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ParseInt(#[from] ParseIntError),

    #[error(transparent)]
    ParseDecimal(#[from] rust_decimal::Error),

    #[error(transparent)]
    ParseTime(#[from] time::error::Parse),

    #[error(transparent)]
    FormatTime(#[from] time::error::Format),

    #[error("lock poisoned: {0}")]
    Poison(String),

    // Errors raised by the FinTS library
    /// The transport collaborator failed to deliver a request or read the reply.
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed framing in a bank response. The offending raw text is kept for diagnostics.
    #[error("protocol error: {message}")]
    Protocol { message: String, raw: String },

    /// The bank kept returning continuation cursors beyond the configured page limit.
    #[error("pagination exceeded {0} pages")]
    PaginationExceeded(usize),

    /// The caller side of a TAN channel went away without answering.
    #[error("TAN channel closed")]
    TanChannelClosed,

    /// An operation was requested in a dialog state that does not allow it.
    #[error("invalid dialog state: {0}")]
    InvalidState(String),

    /// A collaborator (SEPA builder, statement decoder) failed.
    #[error("document error: {0}")]
    Document(String),

    #[error("parse error: {0} - {1} - {2}")]
    Parse(usize, String, String),

    #[error("error occurred: {0}")]
    Simple(String),
}

impl Error {
    pub(crate) fn protocol(message: impl Into<String>, raw: impl Into<String>) -> Error {
        Error::Protocol {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Returns `true` for transport failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Io(_))
    }

    /// Raw response text attached to a protocol error.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Error::Protocol { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Error {
        Error::Poison(format!("Mutex poison error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_keeps_raw_text() {
        let error = Error::protocol("declared length exceeds input", "HIKAZ:5:7:3+@99@abc'");

        assert_eq!(error.raw(), Some("HIKAZ:5:7:3+@99@abc'"));
        assert_eq!(error.to_string(), "protocol error: declared length exceeds input");
        assert!(!error.is_transport());
    }

    #[test]
    fn test_transport_error() {
        let error = Error::Transport("connection refused".into());

        assert!(error.is_transport());
        assert_eq!(error.raw(), None);
        assert_eq!(error.to_string(), "transport error: connection refused");
    }

    #[test]
    fn test_from_poison_error() {
        let lock = std::sync::Mutex::new(0);
        let _ = std::panic::catch_unwind(|| {
            let _guard = lock.lock().unwrap();
            panic!("poison");
        });

        let error: Error = lock.lock().unwrap_err().into();
        assert!(matches!(error, Error::Poison(_)));
    }
}
