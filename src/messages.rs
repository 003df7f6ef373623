//! Segment encoding and decoding for FinTS messages.
//!
//! A FinTS message is a sequence of segments. Each segment starts with a header
//! `ID:NUMBER:VERSION[:REFERENCE]`, carries fields separated by `+` and is
//! terminated by `'`. Inside a field, data elements are separated by `:`.
//! The reserved characters `? + : ' @` are escaped with `?`. Binary data
//! (e.g. an embedded XML document) is framed as `@<length>@<payload>` and is
//! read by its declared length, never by scanning for delimiters.

use std::fmt::Display;
use std::str::FromStr;

use log::trace;

use crate::{Error, ToField};

pub(crate) mod envelope;

#[cfg(test)]
mod tests;

/// Terminates a segment.
pub const SEGMENT_TERMINATOR: char = '\'';
/// Separates fields (data element groups) inside a segment.
pub const FIELD_SEPARATOR: char = '+';
/// Separates data elements inside a field.
pub const ELEMENT_SEPARATOR: char = ':';
/// Escapes the following reserved character.
pub const ESCAPE_CHARACTER: char = '?';
/// Opens and closes the length prefix of a binary data element.
pub const BINARY_MARKER: char = '@';

const RESERVED: [char; 5] = [ESCAPE_CHARACTER, FIELD_SEPARATOR, ELEMENT_SEPARATOR, SEGMENT_TERMINATOR, BINARY_MARKER];

/// Segments sent by the client.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum OutgoingSegments {
    /// Message header (`HNHBK`).
    MessageHeader,
    /// Message trailer (`HNHBS`).
    MessageTrailer,
    /// Signature header (`HNSHK`).
    SignatureHeader,
    /// Signature trailer carrying PIN and TAN (`HNSHA`).
    SignatureTrailer,
    /// Encryption header (`HNVSK`).
    EncryptionHeader,
    /// Encrypted data wrapper (`HNVSD`).
    EncryptedData,
    /// Identification (`HKIDN`).
    Identification,
    /// Processing preparation (`HKVVB`).
    ProcessingPreparation,
    /// Synchronization (`HKSYN`).
    Synchronization,
    /// Dialog end (`HKEND`).
    DialogEnd,
    /// Two-step TAN procedure (`HKTAN`).
    Tan,
    /// TAN media list (`HKTAB`).
    TanMedia,
    /// Balance inquiry (`HKSAL`).
    Balance,
    /// SWIFT MT940 statement retrieval (`HKKAZ`).
    Statements,
    /// camt statement retrieval (`HKCAZ`).
    StatementsCamt,
    /// SEPA single transfer (`HKCCS`).
    Transfer,
    /// SEPA scheduled single transfer (`HKCSE`).
    TransferScheduled,
    /// SEPA collective transfer (`HKCCM`).
    CollectiveTransfer,
    /// SEPA scheduled collective transfer (`HKCME`).
    CollectiveTransferScheduled,
    /// SEPA rebooking between own accounts (`HKCUM`).
    Rebooking,
    /// SEPA single direct debit (`HKDSE`).
    DirectDebit,
    /// SEPA collective direct debit (`HKDME`).
    CollectiveDirectDebit,
    /// Prepaid mobile top-up (`HKPPD`).
    Prepaid,
    /// Create standing order (`HKCDE`).
    StandingOrderCreate,
    /// Modify standing order (`HKCDN`).
    StandingOrderModify,
    /// Delete standing order (`HKCDL`).
    StandingOrderDelete,
    /// List standing orders (`HKCDB`).
    StandingOrders,
    /// List scheduled (terminated) transfers (`HKCSB`).
    ScheduledTransfers,
}

impl OutgoingSegments {
    /// The segment identifier used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutgoingSegments::MessageHeader => "HNHBK",
            OutgoingSegments::MessageTrailer => "HNHBS",
            OutgoingSegments::SignatureHeader => "HNSHK",
            OutgoingSegments::SignatureTrailer => "HNSHA",
            OutgoingSegments::EncryptionHeader => "HNVSK",
            OutgoingSegments::EncryptedData => "HNVSD",
            OutgoingSegments::Identification => "HKIDN",
            OutgoingSegments::ProcessingPreparation => "HKVVB",
            OutgoingSegments::Synchronization => "HKSYN",
            OutgoingSegments::DialogEnd => "HKEND",
            OutgoingSegments::Tan => "HKTAN",
            OutgoingSegments::TanMedia => "HKTAB",
            OutgoingSegments::Balance => "HKSAL",
            OutgoingSegments::Statements => "HKKAZ",
            OutgoingSegments::StatementsCamt => "HKCAZ",
            OutgoingSegments::Transfer => "HKCCS",
            OutgoingSegments::TransferScheduled => "HKCSE",
            OutgoingSegments::CollectiveTransfer => "HKCCM",
            OutgoingSegments::CollectiveTransferScheduled => "HKCME",
            OutgoingSegments::Rebooking => "HKCUM",
            OutgoingSegments::DirectDebit => "HKDSE",
            OutgoingSegments::CollectiveDirectDebit => "HKDME",
            OutgoingSegments::Prepaid => "HKPPD",
            OutgoingSegments::StandingOrderCreate => "HKCDE",
            OutgoingSegments::StandingOrderModify => "HKCDN",
            OutgoingSegments::StandingOrderDelete => "HKCDL",
            OutgoingSegments::StandingOrders => "HKCDB",
            OutgoingSegments::ScheduledTransfers => "HKCSB",
        }
    }
}

impl ToField for OutgoingSegments {
    fn to_field(&self) -> String {
        self.as_str().to_string()
    }
}

impl Display for OutgoingSegments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutgoingSegments {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HNHBK" => Ok(OutgoingSegments::MessageHeader),
            "HNHBS" => Ok(OutgoingSegments::MessageTrailer),
            "HNSHK" => Ok(OutgoingSegments::SignatureHeader),
            "HNSHA" => Ok(OutgoingSegments::SignatureTrailer),
            "HNVSK" => Ok(OutgoingSegments::EncryptionHeader),
            "HNVSD" => Ok(OutgoingSegments::EncryptedData),
            "HKIDN" => Ok(OutgoingSegments::Identification),
            "HKVVB" => Ok(OutgoingSegments::ProcessingPreparation),
            "HKSYN" => Ok(OutgoingSegments::Synchronization),
            "HKEND" => Ok(OutgoingSegments::DialogEnd),
            "HKTAN" => Ok(OutgoingSegments::Tan),
            "HKTAB" => Ok(OutgoingSegments::TanMedia),
            "HKSAL" => Ok(OutgoingSegments::Balance),
            "HKKAZ" => Ok(OutgoingSegments::Statements),
            "HKCAZ" => Ok(OutgoingSegments::StatementsCamt),
            "HKCCS" => Ok(OutgoingSegments::Transfer),
            "HKCSE" => Ok(OutgoingSegments::TransferScheduled),
            "HKCCM" => Ok(OutgoingSegments::CollectiveTransfer),
            "HKCME" => Ok(OutgoingSegments::CollectiveTransferScheduled),
            "HKCUM" => Ok(OutgoingSegments::Rebooking),
            "HKDSE" => Ok(OutgoingSegments::DirectDebit),
            "HKDME" => Ok(OutgoingSegments::CollectiveDirectDebit),
            "HKPPD" => Ok(OutgoingSegments::Prepaid),
            "HKCDE" => Ok(OutgoingSegments::StandingOrderCreate),
            "HKCDN" => Ok(OutgoingSegments::StandingOrderModify),
            "HKCDL" => Ok(OutgoingSegments::StandingOrderDelete),
            "HKCDB" => Ok(OutgoingSegments::StandingOrders),
            "HKCSB" => Ok(OutgoingSegments::ScheduledTransfers),
            _ => Err(Error::Simple(format!("Unknown outgoing segment: {}", s))),
        }
    }
}

/// Segments emitted by the bank.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum IncomingSegments {
    /// Unknown or unsupported segment.
    NotValid,
    /// Message header (`HNHBK`).
    MessageHeader,
    /// Encrypted data wrapper (`HNVSD`).
    EncryptedData,
    /// Return codes for the whole message (`HIRMG`).
    MessageReturnCodes,
    /// Return codes for a single segment (`HIRMS`).
    SegmentReturnCodes,
    /// Synchronization reply carrying the customer system id (`HISYN`).
    Synchronization,
    /// Bank parameter data (`HIBPA`).
    BankParameters,
    /// User parameter data, one per account (`HIUPD`).
    AccountParameters,
    /// PIN/TAN transaction parameters (`HIPINS`).
    PinTanParameters,
    /// SEPA account parameters (`HISPAS`).
    SepaParameters,
    /// Two-step TAN reply (`HITAN`).
    Tan,
    /// TAN media list (`HITAB`).
    TanMedia,
    /// Balance (`HISAL`).
    Balance,
    /// MT940/MT942 statement data (`HIKAZ`).
    Statements,
    /// camt statement data (`HICAZ`).
    StatementsCamt,
    /// Standing order list entry (`HICDB`).
    StandingOrders,
    /// Scheduled transfer list entry (`HICSB`).
    ScheduledTransfers,
}

impl From<&str> for IncomingSegments {
    fn from(value: &str) -> IncomingSegments {
        match value {
            "HNHBK" => IncomingSegments::MessageHeader,
            "HNVSD" => IncomingSegments::EncryptedData,
            "HIRMG" => IncomingSegments::MessageReturnCodes,
            "HIRMS" => IncomingSegments::SegmentReturnCodes,
            "HISYN" => IncomingSegments::Synchronization,
            "HIBPA" => IncomingSegments::BankParameters,
            "HIUPD" => IncomingSegments::AccountParameters,
            "HIPINS" => IncomingSegments::PinTanParameters,
            "HISPAS" => IncomingSegments::SepaParameters,
            "HITAN" => IncomingSegments::Tan,
            "HITAB" => IncomingSegments::TanMedia,
            "HISAL" => IncomingSegments::Balance,
            "HIKAZ" => IncomingSegments::Statements,
            "HICAZ" => IncomingSegments::StatementsCamt,
            "HICDB" => IncomingSegments::StandingOrders,
            "HICSB" => IncomingSegments::ScheduledTransfers,
            _ => IncomingSegments::NotValid,
        }
    }
}

/// A single data element: either escaped text or a length-framed binary payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataElement {
    Text(String),
    Binary(String),
}

impl DataElement {
    /// The decoded content of the element.
    pub fn as_str(&self) -> &str {
        match self {
            DataElement::Text(text) => text,
            DataElement::Binary(payload) => payload,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, DataElement::Binary(_))
    }

    fn is_empty(&self) -> bool {
        matches!(self, DataElement::Text(text) if text.is_empty())
    }

    fn encode_into(&self, out: &mut String) {
        match self {
            DataElement::Text(text) => out.push_str(&escape(text)),
            DataElement::Binary(payload) => {
                out.push(BINARY_MARKER);
                out.push_str(&payload.len().to_string());
                out.push(BINARY_MARKER);
                out.push_str(payload);
            }
        }
    }
}

/// A field (data element group): data elements separated by `:`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub(crate) elements: Vec<DataElement>,
}

impl Field {
    /// A field holding a single text element.
    pub fn text(value: impl Into<String>) -> Field {
        Field {
            elements: vec![DataElement::Text(value.into())],
        }
    }

    /// A field holding a single binary element.
    pub fn binary(payload: impl Into<String>) -> Field {
        Field {
            elements: vec![DataElement::Binary(payload.into())],
        }
    }

    /// A field holding several text elements.
    pub fn group<I, S>(values: I) -> Field
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Field {
            elements: values.into_iter().map(|value| DataElement::Text(value.into())).collect(),
        }
    }

    pub fn elements(&self) -> &[DataElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.iter().all(DataElement::is_empty)
    }

    /// Content of the element at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.elements.get(index).map(DataElement::as_str)
    }

    /// Content of the element at `index`, or an empty string.
    pub fn get_or_empty(&self, index: usize) -> &str {
        self.get(index).unwrap_or_default()
    }

    fn encode_into(&self, out: &mut String) {
        let used = self.elements.iter().rposition(|element| !element.is_empty()).map_or(0, |i| i + 1);
        for (i, element) in self.elements[..used].iter().enumerate() {
            if i > 0 {
                out.push(ELEMENT_SEPARATOR);
            }
            element.encode_into(out);
        }
    }
}

/// A FinTS segment.
///
/// Used in both directions: operation builders fill one in before it is encoded,
/// and [decode] produces them from bank responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    pub id: String,
    pub number: u32,
    pub version: u32,
    /// Number of the request segment this one answers. Only set on bank responses.
    pub reference: Option<u32>,
    pub fields: Vec<Field>,
}

impl Segment {
    /// Create an empty segment.
    pub fn new(id: impl Into<String>, number: u32, version: u32) -> Self {
        Segment {
            id: id.into(),
            number,
            version,
            reference: None,
            fields: Vec::new(),
        }
    }

    /// Append a single-element text field.
    pub(crate) fn push_field<T: ToField>(&mut self, val: &T) -> &mut Segment {
        self.fields.push(Field::text(val.to_field()));
        self
    }

    /// Append a field built from several elements.
    pub(crate) fn push_group(&mut self, values: &[&dyn ToField]) -> &mut Segment {
        self.fields.push(Field::group(values.iter().map(|value| value.to_field())));
        self
    }

    /// Append a length-framed binary field.
    pub(crate) fn push_binary(&mut self, payload: &str) -> &mut Segment {
        self.fields.push(Field::binary(payload));
        self
    }

    /// Append a prepared field.
    pub(crate) fn push(&mut self, field: Field) -> &mut Segment {
        self.fields.push(field);
        self
    }

    /// Returns `true` if the segment has the given identifier.
    pub fn is(&self, id: &str) -> bool {
        self.id == id
    }

    /// The segment kind, for bank responses.
    pub fn kind(&self) -> IncomingSegments {
        IncomingSegments::from(self.id.as_str())
    }

    /// Field at `index`, if present.
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Content of element `element` of field `field`, if present.
    pub fn get(&self, field: usize, element: usize) -> Option<&str> {
        self.field(field).and_then(|f| f.get(element))
    }

    /// Content of element `element` of field `field`, or an empty string.
    pub fn peek_string(&self, field: usize, element: usize) -> String {
        self.get(field, element).unwrap_or_default().to_owned()
    }

    /// Serialize the segment into the wire format, escaping reserved characters.
    pub fn encode(&self) -> String {
        let mut data = format!("{}{ELEMENT_SEPARATOR}{}{ELEMENT_SEPARATOR}{}", self.id, self.number, self.version);
        if let Some(reference) = self.reference {
            data.push(ELEMENT_SEPARATOR);
            data.push_str(&reference.to_string());
        }

        let used = self.fields.iter().rposition(|field| !field.is_empty()).map_or(0, |i| i + 1);
        for field in &self.fields[..used] {
            data.push(FIELD_SEPARATOR);
            field.encode_into(&mut data);
        }

        data.push(SEGMENT_TERMINATOR);
        data
    }

    fn from_fields(mut fields: Vec<Field>, raw: &str) -> Result<Segment, Error> {
        if fields.is_empty() {
            return Err(Error::protocol("empty segment", raw));
        }
        let header = fields.remove(0);

        let id = header.get_or_empty(0);
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::protocol(format!("malformed segment identifier {id:?}"), raw));
        }

        let number = parse_header_number(&header, 1, raw)?;
        let version = parse_header_number(&header, 2, raw)?;
        let reference = match header.get(3) {
            Some(value) if !value.is_empty() => Some(parse_header_number(&header, 3, raw)?),
            _ => None,
        };

        Ok(Segment {
            id: id.to_owned(),
            number,
            version,
            reference,
            fields,
        })
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

fn parse_header_number(header: &Field, index: usize, raw: &str) -> Result<u32, Error> {
    let value = header.get_or_empty(index);
    value
        .parse()
        .map_err(|_| Error::protocol(format!("malformed segment header: element {index} is {value:?}"), raw))
}

/// Escape reserved characters in a text value.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if RESERVED.contains(&c) {
            escaped.push(ESCAPE_CHARACTER);
        }
        escaped.push(c);
    }
    escaped
}

/// Concatenate encoded segments.
pub fn encode(segments: &[Segment]) -> String {
    segments.iter().map(Segment::encode).collect()
}

/// Decode raw text into segments.
pub fn decode(raw: &str) -> Result<Vec<Segment>, Error> {
    let mut tokenizer = Tokenizer::new(raw);
    let mut segments = Vec::new();

    while tokenizer.skip_line_breaks() {
        let fields = tokenizer.next_segment()?;
        segments.push(Segment::from_fields(fields, raw)?);
    }

    trace!("decoded {} segments", segments.len());
    Ok(segments)
}

/// Single pass tokenizer over the wire grammar.
struct Tokenizer<'a> {
    raw: &'a str,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(raw: &'a str) -> Self {
        Tokenizer { raw, position: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.raw[self.position..].chars().next()
    }

    // Banks occasionally put line breaks between segments.
    fn skip_line_breaks(&mut self) -> bool {
        while let Some(c) = self.peek() {
            if c == '\r' || c == '\n' {
                self.position += 1;
            } else {
                return true;
            }
        }
        false
    }

    fn next_segment(&mut self) -> Result<Vec<Field>, Error> {
        let mut fields = Vec::new();
        let mut field = Field::default();
        let mut text = String::new();
        let mut binary: Option<String> = None;

        loop {
            let Some(c) = self.peek() else {
                return Err(Error::protocol("unterminated segment", self.raw));
            };

            match c {
                ESCAPE_CHARACTER => {
                    self.position += c.len_utf8();
                    let Some(escaped) = self.peek() else {
                        return Err(Error::protocol("dangling escape character at end of input", self.raw));
                    };
                    if binary.is_some() {
                        return Err(Error::protocol("unexpected data after binary element", self.raw));
                    }
                    text.push(escaped);
                    self.position += escaped.len_utf8();
                }
                BINARY_MARKER if text.is_empty() && binary.is_none() => {
                    binary = Some(self.read_binary()?);
                }
                ELEMENT_SEPARATOR | FIELD_SEPARATOR | SEGMENT_TERMINATOR => {
                    self.position += 1;
                    let element = match binary.take() {
                        Some(payload) => DataElement::Binary(payload),
                        None => DataElement::Text(std::mem::take(&mut text)),
                    };
                    field.elements.push(element);

                    if c != ELEMENT_SEPARATOR {
                        fields.push(std::mem::take(&mut field));
                    }
                    if c == SEGMENT_TERMINATOR {
                        return Ok(fields);
                    }
                }
                _ => {
                    if binary.is_some() {
                        return Err(Error::protocol("unexpected data after binary element", self.raw));
                    }
                    text.push(c);
                    self.position += c.len_utf8();
                }
            }
        }
    }

    // Reads `@<length>@<payload>` starting at the opening marker.
    fn read_binary(&mut self) -> Result<String, Error> {
        let start = self.position + 1;
        let Some(close) = self.raw[start..].find(BINARY_MARKER) else {
            return Err(Error::protocol("missing closing @ of binary length", self.raw));
        };

        let digits = &self.raw[start..start + close];
        let length: usize = digits
            .parse()
            .map_err(|_| Error::protocol(format!("invalid binary length {digits:?}"), self.raw))?;

        let payload_start = start + close + 1;
        let payload = payload_start
            .checked_add(length)
            .and_then(|payload_end| self.raw.get(payload_start..payload_end));
        let Some(payload) = payload else {
            return Err(Error::protocol(
                format!("declared binary length {length} does not match the remaining input"),
                self.raw,
            ));
        };

        self.position = payload_start + payload.len();
        Ok(payload.to_owned())
    }
}
