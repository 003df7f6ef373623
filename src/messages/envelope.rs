//! Message framing: header, security envelope and trailer.
//!
//! Signed PIN/TAN messages look like
//!
//! ```text
//! HNHBK:1:3+<length>+300+<dialog id>+<message number>'
//! HNVSK:998:3+PIN:2+998+1+1::<system id>+1:<date>:<time>+2:2:13:@8@00000000:5:1+280:<blz>:<user>:V:0:0+0'
//! HNVSD:999:1+@<n>@HNSHK:...'<operation segments>HNSHA:...+<ref>++<pin>[:<tan>]''
//! HNHBS:<n>:1+<message number>'
//! ```
//!
//! Anonymous messages carry the operation segments between header and trailer only.

use time::macros::format_description;
use time::OffsetDateTime;

use super::{decode, encode, DataElement, Field, OutgoingSegments, Segment};
use crate::connection::{ConnectionDetails, COUNTRY_CODE};
use crate::session::{DialogSession, SINGLE_STEP_PROCEDURE};
use crate::Error;

const HEADER_VERSION: u32 = 3;
const TRAILER_VERSION: u32 = 1;
const ENCRYPTION_HEADER_NUMBER: u32 = 998;
const ENCRYPTED_DATA_NUMBER: u32 = 999;
const LENGTH_DIGITS: usize = 12;

/// How a message is authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Authentication {
    /// No security segments (anonymous dialogs).
    Anonymous,
    /// PIN, and a TAN when answering a challenge.
    Pin { tan: Option<String> },
}

impl Authentication {
    pub(crate) fn pin() -> Self {
        Authentication::Pin { tan: None }
    }

    pub(crate) fn with_tan(tan: impl Into<String>) -> Self {
        Authentication::Pin { tan: Some(tan.into()) }
    }
}

/// An open message. Opening reserves the signature header's segment number so
/// that operation segments allocated afterwards follow it.
#[derive(Debug)]
pub(crate) struct MessageFrame {
    authentication: Authentication,
    signature_number: Option<u32>,
    timestamp: OffsetDateTime,
}

impl MessageFrame {
    pub(crate) fn open(session: &mut DialogSession, authentication: Authentication) -> MessageFrame {
        let signature_number = match authentication {
            Authentication::Anonymous => None,
            Authentication::Pin { .. } => Some(session.next_segment_number()),
        };

        MessageFrame {
            authentication,
            signature_number,
            timestamp: OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()),
        }
    }

    /// Wrap `segments` and produce the wire text.
    pub(crate) fn close(self, connection: &ConnectionDetails, session: &mut DialogSession, segments: Vec<Segment>) -> Result<String, Error> {
        let message_number = session.next_message_number();

        let body = match (&self.authentication, self.signature_number) {
            (Authentication::Pin { tan }, Some(signature_number)) => {
                let system_id = connection.customer_system_id()?.unwrap_or_else(|| String::from("0"));
                let control_reference = control_reference(&self.timestamp, message_number);
                let date = self.timestamp.format(format_description!("[year][month][day]"))?;
                let time = self.timestamp.format(format_description!("[hour][minute][second]"))?;

                let mut signed = Vec::with_capacity(segments.len() + 2);
                signed.push(signature_header(
                    connection,
                    session,
                    signature_number,
                    &control_reference,
                    &system_id,
                    &date,
                    &time,
                ));
                signed.extend(segments);
                signed.push(signature_trailer(
                    session.next_segment_number(),
                    &control_reference,
                    &connection.pin,
                    tan.as_deref(),
                ));

                let mut encrypted_data = Segment::new(OutgoingSegments::EncryptedData.as_str(), ENCRYPTED_DATA_NUMBER, 1);
                encrypted_data.push_binary(&encode(&signed));

                let mut body = encryption_header(connection, session, &system_id, &date, &time).encode();
                body.push_str(&encrypted_data.encode());
                body
            }
            _ => encode(&segments),
        };

        let mut trailer = Segment::new(OutgoingSegments::MessageTrailer.as_str(), session.next_segment_number(), TRAILER_VERSION);
        trailer.push_field(&message_number);

        let mut header = Segment::new(OutgoingSegments::MessageHeader.as_str(), 1, HEADER_VERSION);
        header.push_field(&"0".repeat(LENGTH_DIGITS));
        header.push_field(&connection.hbci_version());
        header.push_field(&session.dialog_id);
        header.push_field(&message_number);

        let header_length = header.encode().len();
        let trailer = trailer.encode();
        let total = header_length + body.len() + trailer.len();
        header.fields[0] = Field::text(format!("{total:0width$}", width = LENGTH_DIGITS));

        let mut message = header.encode();
        message.push_str(&body);
        message.push_str(&trailer);
        Ok(message)
    }
}

fn security_profile(session: &DialogSession) -> Field {
    let version = if session.security_function == SINGLE_STEP_PROCEDURE { "1" } else { "2" };
    Field::group(["PIN", version])
}

fn key_name(connection: &ConnectionDetails, key_type: &str) -> Field {
    Field::group([COUNTRY_CODE, connection.bank_code.as_str(), connection.user_id.as_str(), key_type, "0", "0"])
}

fn encryption_header(connection: &ConnectionDetails, session: &DialogSession, system_id: &str, date: &str, time: &str) -> Segment {
    let mut segment = Segment::new(OutgoingSegments::EncryptionHeader.as_str(), ENCRYPTION_HEADER_NUMBER, 3);
    segment.push(security_profile(session));
    segment.push_field(&"998");
    segment.push_field(&"1");
    segment.push(Field::group(["1", "", system_id]));
    segment.push(Field::group(["1", date, time]));
    segment.push(Field {
        elements: vec![
            DataElement::Text("2".into()),
            DataElement::Text("2".into()),
            DataElement::Text("13".into()),
            DataElement::Binary("00000000".into()),
            DataElement::Text("5".into()),
            DataElement::Text("1".into()),
        ],
    });
    segment.push(key_name(connection, "V"));
    segment.push_field(&"0");
    segment
}

fn signature_header(
    connection: &ConnectionDetails,
    session: &DialogSession,
    number: u32,
    control_reference: &str,
    system_id: &str,
    date: &str,
    time: &str,
) -> Segment {
    let mut segment = Segment::new(OutgoingSegments::SignatureHeader.as_str(), number, 4);
    segment.push(security_profile(session));
    segment.push_field(&session.security_function);
    segment.push_field(&control_reference);
    segment.push_field(&"1");
    segment.push_field(&"1");
    segment.push(Field::group(["1", "", system_id]));
    segment.push_field(&"1");
    segment.push(Field::group(["1", date, time]));
    segment.push(Field::group(["1", "999", "1"]));
    segment.push(Field::group(["6", "10", "16"]));
    segment.push(key_name(connection, "S"));
    segment
}

fn signature_trailer(number: u32, control_reference: &str, pin: &str, tan: Option<&str>) -> Segment {
    let mut segment = Segment::new(OutgoingSegments::SignatureTrailer.as_str(), number, 2);
    segment.push_field(&control_reference);
    segment.push_field(&"");
    match tan {
        Some(tan) => segment.push(Field::group([pin, tan])),
        None => segment.push_field(&pin),
    };
    segment
}

fn control_reference(timestamp: &OffsetDateTime, message_number: u32) -> String {
    let seed = timestamp.nanosecond() as u64 + message_number as u64;
    format!("{}", 1_000_000 + seed % 9_000_000)
}

/// Decode a response and flatten `HNVSD` payloads into the surrounding segment list.
pub(crate) fn unwrap(raw: &str) -> Result<Vec<Segment>, Error> {
    let mut segments = Vec::new();

    for segment in decode(raw)? {
        if segment.is(OutgoingSegments::EncryptedData.as_str()) {
            let payload = segment.get(0, 0).unwrap_or_default();
            segments.extend(decode(payload)?);
        } else if !segment.is(OutgoingSegments::EncryptionHeader.as_str()) {
            segments.push(segment);
        }
    }

    Ok(segments)
}

/// Hide PIN and TAN in wire text before it is logged.
///
/// The secret is the third data element of `HNSHA` and runs to the first unescaped
/// segment terminator, so escaped `'`, `+` and `?` inside the PIN are masked too.
pub(crate) fn redact(message: &str) -> String {
    let Some(start) = message.find("HNSHA:") else {
        return message.to_owned();
    };

    let mut separators = 0;
    let mut secret_start = None;
    let mut chars = message[start..].char_indices();
    while let Some((offset, c)) = chars.next() {
        match c {
            '?' => {
                chars.next();
            }
            '+' if secret_start.is_none() => {
                separators += 1;
                if separators == 2 {
                    secret_start = Some(start + offset + 1);
                }
            }
            '\'' => {
                let Some(secret_start) = secret_start else {
                    return message.to_owned();
                };
                let secret_end = start + offset;
                let mut redacted = String::with_capacity(message.len());
                redacted.push_str(&message[..secret_start]);
                redacted.push_str("***");
                redacted.push_str(&message[secret_end..]);
                return redacted;
            }
            _ => {}
        }
    }

    match secret_start {
        Some(secret_start) => format!("{}***", &message[..secret_start]),
        None => message.to_owned(),
    }
}
