use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_segment_encodes_fields() {
    let mut segment = Segment::new(OutgoingSegments::Identification.as_str(), 2, 2);

    segment.push_group(&[&"280", &"12345678"]);
    segment.push_field(&"user1");
    segment.push_field(&"0");
    segment.push_field(&1u32);

    assert_eq!(segment.encode(), "HKIDN:2:2+280:12345678+user1+0+1'");
}

#[test]
fn test_segment_encodes_bool_as_j_n() {
    let mut segment = Segment::new("HKTST", 3, 1);

    segment.push_field(&true);
    segment.push_field(&false);

    assert_eq!(segment.encode(), "HKTST:3:1+J+N'");
}

#[test]
fn test_trailing_empty_fields_are_trimmed() {
    let mut segment = Segment::new("HKKAZ", 3, 7);

    segment.push_field(&"N");
    segment.push_field(&"");
    segment.push_group(&[&"a", &"", &""]);
    segment.push_field(&"");
    segment.push_field(&Option::<String>::None);

    assert_eq!(segment.encode(), "HKKAZ:3:7+N++a'");
}

#[test]
fn test_inner_empty_fields_are_kept() {
    let mut segment = Segment::new("HKKAZ", 3, 7);

    segment.push_field(&"N");
    segment.push_field(&"");
    segment.push_field(&"");
    segment.push_field(&"cursor");

    assert_eq!(segment.encode(), "HKKAZ:3:7+N+++cursor'");
}

#[test]
fn test_reserved_characters_are_escaped() {
    assert_eq!(escape("a?b+c:d'e@f"), "a??b?+c?:d?'e?@f");
    assert_eq!(escape("plain"), "plain");
}

#[test]
fn test_round_trip_with_reserved_characters() {
    let values = ["?", "+", ":", "'", "@", "??++::''@@", "Miete 01'2024: 500+50?", "@12@not binary", ""];

    for value in values {
        let mut segment = Segment::new("HKTST", 2, 1);
        segment.push_field(&"head");
        segment.push_group(&[&value, &"tail"]);

        let decoded = decode(&segment.encode()).unwrap();

        assert_eq!(decoded.len(), 1, "value {value:?}");
        assert_eq!(decoded[0].get(1, 0), Some(value), "value {value:?}");
        assert_eq!(decoded[0].get(1, 1), Some("tail"), "value {value:?}");
    }
}

#[test]
fn test_binary_payload_framing() {
    let document = "<Document><Nm>A+B:C'D?E@F</Nm></Document>";
    let mut segment = Segment::new(OutgoingSegments::Transfer.as_str(), 3, 1);

    segment.push_group(&[&"DE02120300000000202051", &"BYLADEM1001"]);
    segment.push_field(&"urn:iso:std:iso:20022:tech:xsd:pain.001.001.03");
    segment.push_binary(document);

    let encoded = segment.encode();
    let token = format!("@{}@{}", document.len(), document);

    assert!(encoded.contains(&token));
    assert!(encoded.ends_with(&format!("{token}'")));
}

#[test]
fn test_binary_length_counts_bytes() {
    let document = "Zahlung für Müller";
    let mut segment = Segment::new("HKTST", 2, 1);
    segment.push_binary(document);

    let encoded = segment.encode();

    assert!(encoded.contains(&format!("@{}@", document.len())));
    assert_eq!(decode(&encoded).unwrap()[0].get(0, 0), Some(document));
}

#[test]
fn test_decode_binary_read_by_length() {
    let raw = "HIKAZ:5:7:3+@10@a'b+c:d?e@+@0@'HNHBS:6:1+1'";

    let segments = decode(raw).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].id, "HIKAZ");
    assert_eq!(segments[0].reference, Some(3));
    assert_eq!(segments[0].get(0, 0), Some("a'b+c:d?e@"));
    assert!(segments[0].fields[0].elements()[0].is_binary());
    assert_eq!(segments[0].get(1, 0), Some(""));
    assert_eq!(segments[1].id, "HNHBS");
}

#[test]
fn test_decode_multiple_binary_documents() {
    let first = "<Document>1</Document>";
    let second = "<Document>2'@</Document>";
    let raw = format!("HICAZ:5:1:3+DE02120300000000202051+camt:052+@{}@{}:@{}@{}'", first.len(), first, second.len(), second);

    let segments = decode(&raw).unwrap();

    assert_eq!(segments[0].get(2, 0), Some(first));
    assert_eq!(segments[0].get(2, 1), Some(second));
}

#[test]
fn test_decode_skips_line_breaks_between_segments() {
    let raw = "HIRMG:2:2+0010::Nachricht entgegengenommen.'\r\nHIRMS:3:2:3+0020::Auftrag ausgeführt.'\n";

    let segments = decode(raw).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[1].kind(), IncomingSegments::SegmentReturnCodes);
    assert_eq!(segments[1].get(0, 2), Some("Auftrag ausgeführt."));
}

#[test]
fn test_decode_errors() {
    let cases = [
        ("HIKAZ:5:7:3+@99@abc'", "does not match"),
        ("HIKAZ:5:7:3+@x1@abc'", "invalid binary length"),
        ("HIKAZ:5:7:3+@12", "missing closing @"),
        ("HIRMG:2:2+0010?", "dangling escape"),
        ("HIRMG:2:2+0010", "unterminated segment"),
        ("HIRMG:x:2+0010'", "malformed segment header"),
        ("HI-MG:2:2+0010'", "malformed segment identifier"),
        ("HIKAZ:5:7:3+@3@abcdef'", "unexpected data after binary"),
    ];

    for (raw, expected) in cases {
        let error = decode(raw).unwrap_err();

        assert!(error.to_string().contains(expected), "{raw}: {error}");
        assert_eq!(error.raw(), Some(raw));
    }
}

#[test]
fn test_decode_oversized_binary_length() {
    for raw in ["HIKAZ:1:1+@18446744073709551615@x'", "HIKAZ:1:1+@18446744073709551600@x'", "HIKAZ:1:1+@99999999999999999999@x'"] {
        let error = decode(raw).unwrap_err();

        assert!(matches!(error, Error::Protocol { .. }), "{raw}: {error}");
        assert_eq!(error.raw(), Some(raw));
    }
}

#[test]
fn test_decode_empty_input() {
    assert!(decode("").unwrap().is_empty());
}

#[test]
fn test_segment_accessors() {
    let segments = decode("HISAL:4:7:3+1234567::280:12345678+Girokonto+EUR+C:1234,56:EUR:20240115'").unwrap();
    let segment = &segments[0];

    assert_eq!(segment.kind(), IncomingSegments::Balance);
    assert_eq!(segment.get(0, 0), Some("1234567"));
    assert_eq!(segment.get(0, 2), Some("280"));
    assert_eq!(segment.peek_string(3, 1), "1234,56");
    assert_eq!(segment.peek_string(9, 0), "");
    assert_eq!(segment.get(9, 0), None);
}

#[test]
fn test_outgoing_segments_from_str() {
    assert_eq!("HKSAL".parse::<OutgoingSegments>().unwrap(), OutgoingSegments::Balance);
    assert_eq!(OutgoingSegments::StandingOrderCreate.to_string(), "HKCDE");
    assert!("HXXXX".parse::<OutgoingSegments>().is_err());
}
