//! # Business operations
//!
//! Parameter types of the business operations, the [PainDocumentBuilder]
//! collaborator that renders SEPA documents, the TAN requirement table and
//! the segment builders used by the dialog engine.

pub(crate) mod encoders;
pub mod rules;
mod types;

pub use types::*;
