use crate::accounts::parse_date;
use crate::messages::{IncomingSegments, Segment};
use crate::transactions::{StandingOrderSchedule, TimeUnit};
use crate::Error;

use super::{CamtStatements, ScheduledTransfer, StandingOrder, SwiftStatements};

fn of_kind(segments: &[Segment], kind: IncomingSegments) -> impl Iterator<Item = &Segment> {
    segments.iter().filter(move |segment| segment.kind() == kind)
}

// HIKAZ:5:7:3+@<n>@<MT940>+@<n>@<MT942>'
pub(crate) fn decode_swift(segments: &[Segment]) -> SwiftStatements {
    let mut statements = SwiftStatements::default();

    for segment in of_kind(segments, IncomingSegments::Statements) {
        statements.booked.push_str(segment.get(0, 0).unwrap_or_default());
        statements.pending.push_str(segment.get(1, 0).unwrap_or_default());
    }

    statements
}

// HICAZ:5:1:3+<account>+<camt descriptor>+@<n>@<doc>:@<n>@<doc>+@<n>@<pending doc>'
pub(crate) fn decode_camt(segments: &[Segment]) -> CamtStatements {
    let mut statements = CamtStatements::default();

    let documents = |segment: &Segment, index: usize| -> Vec<String> {
        segment
            .field(index)
            .map(|field| {
                field
                    .elements()
                    .iter()
                    .filter(|element| !element.as_str().is_empty())
                    .map(|element| element.as_str().to_owned())
                    .collect()
            })
            .unwrap_or_default()
    };

    for segment in of_kind(segments, IncomingSegments::StatementsCamt) {
        statements.booked.extend(documents(segment, 2));
        statements.pending.extend(documents(segment, 3));
    }

    statements
}

// first execution:unit:rota:day[:last execution]
fn decode_schedule(segment: &Segment, index: usize) -> Result<Option<StandingOrderSchedule>, Error> {
    let Some(field) = segment.field(index).filter(|field| !field.is_empty()) else {
        return Ok(None);
    };

    let Some(unit) = TimeUnit::from_code(field.get_or_empty(1)) else {
        return Err(Error::Parse(index, segment.encode(), format!("unknown time unit {:?}", field.get_or_empty(1))));
    };

    let last_execution = match field.get(4) {
        Some(value) if !value.is_empty() => Some(parse_date(value)?),
        _ => None,
    };

    Ok(Some(StandingOrderSchedule {
        first_execution: parse_date(field.get_or_empty(0))?,
        unit,
        rota: field.get_or_empty(2).parse()?,
        day: field.get_or_empty(3).parse()?,
        last_execution,
    }))
}

// HICDB:5:1:3+<IBAN:BIC>+<scheme>+@<n>@<pain.001>+<order id>+<schedule>'
pub(crate) fn decode_standing_orders(segments: &[Segment]) -> Result<Vec<StandingOrder>, Error> {
    of_kind(segments, IncomingSegments::StandingOrders)
        .map(|segment| {
            Ok(StandingOrder {
                account: segment.peek_string(0, 0),
                scheme: segment.peek_string(1, 0),
                document: segment.peek_string(2, 0),
                order_id: segment.peek_string(3, 0),
                schedule: decode_schedule(segment, 4)?,
            })
        })
        .collect()
}

// HICSB:5:1:3+<IBAN:BIC>+<scheme>+@<n>@<pain.001>+<order id>+<execution date>'
pub(crate) fn decode_scheduled_transfers(segments: &[Segment]) -> Result<Vec<ScheduledTransfer>, Error> {
    of_kind(segments, IncomingSegments::ScheduledTransfers)
        .map(|segment| {
            let execution_date = match segment.get(4, 0) {
                Some(value) if !value.is_empty() => Some(parse_date(value)?),
                _ => None,
            };

            Ok(ScheduledTransfer {
                account: segment.peek_string(0, 0),
                scheme: segment.peek_string(1, 0),
                document: segment.peek_string(2, 0),
                order_id: segment.peek_string(3, 0),
                execution_date,
            })
        })
        .collect()
}

// HITAB:4:4:3+0+A:1:::::::::::<name>::::::::+...
// The name is the first element after the medium class and status that is not numeric.
pub(crate) fn decode_tan_media(segments: &[Segment]) -> Vec<String> {
    of_kind(segments, IncomingSegments::TanMedia)
        .flat_map(|segment| segment.fields.iter().skip(1))
        .filter_map(|field| {
            field
                .elements()
                .iter()
                .skip(2)
                .map(|element| element.as_str())
                .find(|value| value.chars().any(|c| !c.is_ascii_digit()))
                .map(str::to_owned)
        })
        .collect()
}
