//! Test utilities shared across all modules for testing

#[cfg(test)]
pub mod helpers {
    use rust_decimal::Decimal;

    use crate::connection::ConnectionDetails;
    use crate::messages::{envelope, Segment};
    use crate::transactions::{PainRequest, PainScheme, Party, Payment};
    use crate::Error;

    /// Connection details of a test user that has not been synchronized yet
    pub fn connection_details() -> ConnectionDetails {
        ConnectionDetails {
            url: "https://fints.example.com/fints".into(),
            bank_code: "12345678".into(),
            bic: "BYLADEM1001".into(),
            user_id: "user1".into(),
            pin: "secret".into(),
            account: "1234567".into(),
            iban: "DE02120300000000202051".into(),
            account_holder: "Max Mustermann".into(),
            ..Default::default()
        }
    }

    /// Connection details with a cached customer system id
    pub fn synchronized_connection_details() -> ConnectionDetails {
        let connection = connection_details();
        connection.system_id.set("SYSID123").unwrap();
        connection
    }

    /// Decodes a request the way the bank would see it, security envelope removed
    pub fn request_segments(request: &str) -> Vec<Segment> {
        envelope::unwrap(request).unwrap()
    }

    /// Ids of the segments in a request
    pub fn segment_ids(request: &str) -> Vec<String> {
        request_segments(request).into_iter().map(|segment| segment.id).collect()
    }

    /// The first segment with the given id in a request
    pub fn find_segment(request: &str, id: &str) -> Segment {
        request_segments(request)
            .into_iter()
            .find(|segment| segment.is(id))
            .unwrap_or_else(|| panic!("segment {id} not found in {request}"))
    }

    /// Encodes each segment separately
    pub fn encoded(segments: &[Segment]) -> Vec<String> {
        segments.iter().map(Segment::encode).collect()
    }

    /// A transfer of 100 EUR to a single payee
    pub fn transfer_request() -> PainRequest {
        let debtor = Party::new("Max Mustermann", "DE02120300000000202051", "BYLADEM1001");
        let payee = Party::new("Erika Mustermann", "DE44500105175407324931", "INGDDEFFXXX");
        PainRequest::credit_transfer(debtor, vec![Payment::new(payee, Decimal::new(10000, 2), "Miete Januar")])
    }

    /// A pain document builder rendering a minimal document naming the scheme
    pub fn pain_builder(request: &PainRequest, scheme: PainScheme) -> Result<String, Error> {
        Ok(format!(
            "<Document xmlns='urn:iso:std:iso:20022:tech:xsd:{}'><Payments>{}</Payments><Sum>{}</Sum></Document>",
            scheme.version(),
            request.payments.len(),
            request.total()
        ))
    }
}
