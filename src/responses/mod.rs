//! Bank return codes and the result of one dialog round trip.
//!
//! Every bank response carries return codes in `HIRMG` (message level) and `HIRMS`
//! (segment level) segments. Each data element group is one [BankMessage]:
//!
//! ```text
//! HIRMS:3:2:4+0020::Auftrag ausgeführt.+3920::Zugelassene TAN-Verfahren:942:999'
//!             ^code ^ref ^text                                          ^parameters
//! ```

use std::fmt::{self, Display};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::messages::{envelope, IncomingSegments, Segment};
use crate::Error;

pub(crate) mod parameters;


/// Return code announcing that a TAN challenge was issued.
pub const CODE_SCA_CHALLENGE: &str = "0030";
/// Return code announcing a decoupled (app based) TAN procedure.
pub const CODE_SCA_DECOUPLED: &str = "3955";
/// Return code listing the TAN procedures allowed for the user.
pub const CODE_ALLOWED_TAN_PROCEDURES: &str = "3920";
/// Return code announcing more data behind a continuation cursor.
pub const CODE_CONTINUATION: &str = "3040";

/// Severity of a bank message, derived from the first digit of the return code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// `0xxx`: success or information.
    Info,
    /// `3xxx`: warning, the order was (partly) executed.
    Warning,
    /// `9xxx`: error, the order was rejected.
    Error,
}

impl Severity {
    pub fn from_code(code: &str) -> Severity {
        match code.chars().next() {
            Some('9') => Severity::Error,
            Some('3') => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{name}")
    }
}

/// A return code reported by the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankMessage {
    /// Four digit return code.
    pub code: String,
    pub severity: Severity,
    pub text: String,
    /// Element the code refers to, if the bank named one.
    pub reference: Option<String>,
    /// Additional parameters, e.g. the allowed TAN procedures of code 3920 or the cursor of code 3040.
    pub parameters: Vec<String>,
}

impl BankMessage {
    pub fn new(code: impl Into<String>, text: impl Into<String>) -> BankMessage {
        let code = code.into();
        BankMessage {
            severity: Severity::from_code(&code),
            code,
            text: text.into(),
            reference: None,
            parameters: Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for BankMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.text)
    }
}

/// Return codes that announce a strong customer authentication challenge.
///
/// The codes differ between banks and protocol versions, so the set is configurable
/// through [DialogOptions](crate::connection::DialogOptions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScaCodes(Vec<String>);

impl ScaCodes {
    pub fn new<I, S>(codes: I) -> ScaCodes
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScaCodes(codes.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.iter().any(|candidate| candidate == code)
    }
}

impl Default for ScaCodes {
    fn default() -> Self {
        ScaCodes::new([CODE_SCA_CHALLENGE, CODE_SCA_DECOUPLED])
    }
}

/// Outcome of one request/response round trip, optionally carrying typed data.
///
/// A result is never changed after it was built; [typed](Self::typed) and
/// [retype](Self::retype) consume it and build a new one.
#[derive(Debug, Clone)]
pub struct DialogResult<T = ()> {
    messages: Vec<BankMessage>,
    raw: String,
    segments: Vec<Segment>,
    sca_required: bool,
    abandoned: bool,
    data: Option<T>,
}

impl<T> DialogResult<T> {
    /// Bank messages in the order the bank reported them.
    pub fn messages(&self) -> &[BankMessage] {
        &self.messages
    }

    /// The unmodified response text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Decoded response segments, security envelope removed.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// `false` if any message has error severity, or the TAN challenge was cancelled.
    pub fn is_success(&self) -> bool {
        !self.abandoned && !self.messages.iter().any(BankMessage::is_error)
    }

    /// `true` if a message carries one of the configured SCA challenge codes.
    pub fn is_sca_required(&self) -> bool {
        self.sca_required
    }

    /// `true` if this result ends a dialog whose TAN challenge was cancelled.
    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    /// First message with the given code.
    pub fn message(&self, code: &str) -> Option<&BankMessage> {
        self.messages.iter().find(|message| message.code == code)
    }

    /// Segments of the given kind.
    pub fn segments_of(&self, kind: IncomingSegments) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(move |segment| segment.kind() == kind)
    }

    /// Replace the data.
    pub fn typed<U>(self, data: U) -> DialogResult<U> {
        self.with_data(Some(data))
    }

    /// Drop the data, keeping messages and raw text.
    pub fn retype<U>(self) -> DialogResult<U> {
        self.with_data(None)
    }

    /// Convert the data, keeping messages and raw text.
    pub fn map<U>(mut self, f: impl FnOnce(T) -> U) -> DialogResult<U> {
        let data = self.data.take().map(f);
        self.with_data(data)
    }

    pub(crate) fn try_map<U>(mut self, f: impl FnOnce(T) -> Result<U, Error>) -> Result<DialogResult<U>, Error> {
        let data = self.data.take().map(f).transpose()?;
        Ok(self.with_data(data))
    }

    pub(crate) fn with_data<U>(self, data: Option<U>) -> DialogResult<U> {
        DialogResult {
            messages: self.messages,
            raw: self.raw,
            segments: self.segments,
            sca_required: self.sca_required,
            abandoned: self.abandoned,
            data,
        }
    }

    /// Mark the result as the end of an abandoned TAN challenge.
    pub(crate) fn abandon(mut self) -> DialogResult<T> {
        self.abandoned = true;
        self
    }

    /// Continue with a successful result, or stop with the failed one.
    pub(crate) fn into_step<U>(self) -> Result<DialogResult<T>, DialogResult<U>> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.retype())
        }
    }

    /// Prepend messages of earlier round trips that belong to the same operation.
    pub(crate) fn merge_messages(mut self, mut earlier: Vec<BankMessage>) -> DialogResult<T> {
        earlier.append(&mut self.messages);
        self.messages = earlier;
        self
    }
}

impl DialogResult<()> {
    /// Build a result from already decoded segments.
    pub fn from_segments(raw: impl Into<String>, segments: Vec<Segment>, sca_codes: &ScaCodes) -> DialogResult<()> {
        let messages = collect_messages(&segments);
        let sca_required = messages.iter().any(|message| sca_codes.contains(&message.code));

        DialogResult {
            messages,
            raw: raw.into(),
            segments,
            sca_required,
            abandoned: false,
            data: None,
        }
    }
}

/// Parse a raw bank response.
///
/// Fails only on malformed framing. Error return codes are data in the result.
pub fn parse_response(raw: &str, sca_codes: &ScaCodes) -> Result<DialogResult<()>, Error> {
    let segments = envelope::unwrap(raw)?;
    let result = DialogResult::from_segments(raw, segments, sca_codes);

    for message in result.messages() {
        if message.severity == Severity::Warning {
            warn!("bank warning {message}");
        }
    }

    Ok(result)
}

fn collect_messages(segments: &[Segment]) -> Vec<BankMessage> {
    segments
        .iter()
        .filter(|segment| matches!(segment.kind(), IncomingSegments::MessageReturnCodes | IncomingSegments::SegmentReturnCodes))
        .flat_map(|segment| segment.fields.iter())
        .filter(|field| !field.get_or_empty(0).is_empty())
        .map(|field| {
            let code = field.get_or_empty(0);
            let reference = field.get(1).filter(|reference| !reference.is_empty()).map(str::to_owned);

            BankMessage {
                severity: Severity::from_code(code),
                code: code.to_owned(),
                text: field.get_or_empty(2).to_owned(),
                reference,
                parameters: field.elements().iter().skip(3).map(|element| element.as_str().to_owned()).collect(),
            }
        })
        .collect()
}
