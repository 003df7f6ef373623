//! Values the engine learns from bank responses and keeps in the session.

use std::collections::HashMap;

use crate::messages::{IncomingSegments, Segment};
use crate::responses::{BankMessage, CODE_ALLOWED_TAN_PROCEDURES};

/// Customer system id assigned by synchronization (`HISYN`).
pub(crate) fn system_id(segments: &[Segment]) -> Option<String> {
    segments
        .iter()
        .find(|segment| segment.kind() == IncomingSegments::Synchronization)
        .and_then(|segment| segment.get(0, 0))
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}

/// Dialog id from the message header (`HNHBK`).
pub(crate) fn dialog_id(segments: &[Segment]) -> Option<String> {
    segments
        .iter()
        .find(|segment| segment.kind() == IncomingSegments::MessageHeader)
        .and_then(|segment| segment.get(2, 0))
        .filter(|id| !id.is_empty() && *id != "0")
        .map(str::to_owned)
}

/// TAN procedures (security functions) allowed for the user, from return code 3920.
pub(crate) fn allowed_tan_procedures(messages: &[BankMessage]) -> Vec<String> {
    messages
        .iter()
        .filter(|message| message.code == CODE_ALLOWED_TAN_PROCEDURES)
        .flat_map(|message| message.parameters.iter())
        .filter(|procedure| !procedure.is_empty())
        .cloned()
        .collect()
}

/// Order reference and challenge text of a two-step TAN reply (`HITAN`).
///
/// ```text
/// HITAN:5:6:4+4++<order reference>+<challenge>'
/// ```
pub(crate) fn tan_challenge(segments: &[Segment]) -> Option<(Option<String>, Option<String>)> {
    let segment = segments.iter().find(|segment| segment.kind() == IncomingSegments::Tan)?;

    let non_empty = |value: Option<&str>| value.filter(|value| !value.is_empty()).map(str::to_owned);
    Some((non_empty(segment.get(2, 0)), non_empty(segment.get(3, 0))))
}

/// Per segment TAN requirements from the PIN/TAN parameters (`HIPINS`).
///
/// ```text
/// HIPINS:78:1:3+1+1+0+5:20:6:USERID:CUSTID:HKSAL:N:HKCCS:J'
/// ```
pub(crate) fn tan_requirements(segments: &[Segment]) -> HashMap<String, bool> {
    let mut requirements = HashMap::new();

    for segment in segments.iter().filter(|segment| segment.kind() == IncomingSegments::PinTanParameters) {
        let Some(field) = segment.field(3) else {
            continue;
        };

        let pairs = field.elements().get(5..).unwrap_or_default();
        for pair in pairs.chunks(2) {
            if let [id, required] = pair {
                if !id.as_str().is_empty() {
                    requirements.insert(id.as_str().to_owned(), required.as_str() == "J");
                }
            }
        }
    }

    requirements
}

/// SEPA pain schemes supported by the bank (`HISPAS`), in the order the bank lists them.
pub(crate) fn pain_schemes(segments: &[Segment]) -> Vec<String> {
    let mut schemes: Vec<String> = Vec::new();

    for segment in segments.iter().filter(|segment| segment.kind() == IncomingSegments::SepaParameters) {
        for element in segment.fields.iter().flat_map(|field| field.elements()) {
            let value = element.as_str();
            if value.contains("pain.") && !schemes.iter().any(|scheme| scheme == value) {
                schemes.push(value.to_owned());
            }
        }
    }

    schemes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::decode;

    #[test]
    fn test_system_and_dialog_id() {
        let segments = decode("HNHBK:1:3+000000000120+300+DIALOG42+1'HISYN:4:4:5+SYSID123'HNHBS:5:1+1'").unwrap();

        assert_eq!(system_id(&segments), Some("SYSID123".to_string()));
        assert_eq!(dialog_id(&segments), Some("DIALOG42".to_string()));
    }

    #[test]
    fn test_dialog_id_zero_is_ignored() {
        let segments = decode("HNHBK:1:3+000000000120+300+0+1'").unwrap();

        assert_eq!(dialog_id(&segments), None);
        assert_eq!(system_id(&segments), None);
    }

    #[test]
    fn test_tan_challenge() {
        let segments = decode("HITAN:5:6:4+4++76ma3j/MKH0BAABsRcJNhG?+owAQA+Bitte TAN eingeben'").unwrap();

        let (reference, challenge) = tan_challenge(&segments).unwrap();
        assert_eq!(reference.as_deref(), Some("76ma3j/MKH0BAABsRcJNhG+owAQA"));
        assert_eq!(challenge.as_deref(), Some("Bitte TAN eingeben"));
    }

    #[test]
    fn test_tan_requirements() {
        let segments = decode("HIPINS:78:1:3+1+1+0+5:20:6:USERID:CUSTID:HKSAL:N:HKCCS:J:HKKAZ:N'").unwrap();

        let requirements = tan_requirements(&segments);
        assert_eq!(requirements.len(), 3);
        assert_eq!(requirements.get("HKSAL"), Some(&false));
        assert_eq!(requirements.get("HKCCS"), Some(&true));
        assert_eq!(requirements.get("HKKAZ"), Some(&false));
    }

    #[test]
    fn test_pain_schemes() {
        let raw = "HISPAS:147:1:3+1+1+1+J:J:N:urn?:iso?:std?:iso?:20022?:tech?:xsd?:pain.001.001.03:urn?:iso?:std?:iso?:20022?:tech?:xsd?:pain.008.001.02'";
        let segments = decode(raw).unwrap();

        assert_eq!(
            pain_schemes(&segments),
            vec![
                "urn:iso:std:iso:20022:tech:xsd:pain.001.001.03".to_string(),
                "urn:iso:std:iso:20022:tech:xsd:pain.008.001.02".to_string()
            ]
        );
    }

    #[test]
    fn test_allowed_tan_procedures() {
        let mut message = BankMessage::new("3920", "Zugelassene TAN-Verfahren");
        message.parameters = vec!["942".into(), "999".into()];

        assert_eq!(allowed_tan_procedures(&[message]), vec!["942".to_string(), "999".to_string()]);
        assert!(allowed_tan_procedures(&[BankMessage::new("0020", "ok")]).is_empty());
    }
}
