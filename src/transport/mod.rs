//! Transport collaborator.
//!
//! The dialog engine hands complete protocol messages to a transport and expects the
//! bank's complete reply. Framing for the wire (HTTPS POST, base64) is the
//! transport's concern. Failures are reported as [Error::Transport](crate::Error::Transport).

#[cfg(all(feature = "sync", not(feature = "async")))]
mod sync;

#[cfg(feature = "async")]
mod r#async;

#[cfg(all(feature = "sync", not(feature = "async")))]
pub use sync::Transport;

#[cfg(feature = "async")]
pub use r#async::AsyncTransport;

pub(crate) mod recorder;
