use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::Error;

/// Debtor or creditor of a SEPA payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub iban: String,
    pub bic: String,
}

impl Party {
    pub fn new(name: impl Into<String>, iban: impl Into<String>, bic: impl Into<String>) -> Party {
        Party {
            name: name.into(),
            iban: iban.into(),
            bic: bic.into(),
        }
    }
}

/// Direct debit mandate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mandate {
    pub id: String,
    pub signed_on: Date,
}

/// One payment of a SEPA order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payee of a transfer, payer of a direct debit.
    pub counterparty: Party,
    pub amount: Decimal,
    /// Remittance information.
    pub purpose: String,
    pub end_to_end_id: Option<String>,
    /// Required for direct debits.
    pub mandate: Option<Mandate>,
}

impl Payment {
    pub fn new(counterparty: Party, amount: Decimal, purpose: impl Into<String>) -> Payment {
        Payment {
            counterparty,
            amount,
            purpose: purpose.into(),
            end_to_end_id: None,
            mandate: None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PainKind {
    /// pain.001
    CreditTransfer,
    /// pain.008
    DirectDebit,
}

/// Everything a [PainDocumentBuilder] needs to build the XML document of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PainRequest {
    pub kind: PainKind,
    /// Debtor of a transfer, creditor of a direct debit.
    pub originator: Party,
    pub payments: Vec<Payment>,
    /// Requested execution (transfers) or collection (direct debits) date.
    pub execution_date: Option<Date>,
    /// SEPA creditor identifier, direct debits only.
    pub creditor_id: Option<String>,
}

impl PainRequest {
    pub fn credit_transfer(originator: Party, payments: Vec<Payment>) -> PainRequest {
        PainRequest {
            kind: PainKind::CreditTransfer,
            originator,
            payments,
            execution_date: None,
            creditor_id: None,
        }
    }

    pub fn direct_debit(originator: Party, creditor_id: impl Into<String>, payments: Vec<Payment>, collection_date: Date) -> PainRequest {
        PainRequest {
            kind: PainKind::DirectDebit,
            originator,
            payments,
            execution_date: Some(collection_date),
            creditor_id: Some(creditor_id.into()),
        }
    }

    pub fn with_execution_date(mut self, date: Date) -> PainRequest {
        self.execution_date = Some(date);
        self
    }

    /// Sum of all payment amounts, announced in collective orders.
    pub fn total(&self) -> Decimal {
        self.payments.iter().map(|payment| payment.amount).sum()
    }
}

/// Supported versions of the SEPA `pain` schemas.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PainScheme {
    Pain001_001_03,
    Pain001_002_03,
    Pain001_003_03,
    Pain008_001_02,
    Pain008_002_02,
    Pain008_003_02,
}

impl PainScheme {
    const ALL: [PainScheme; 6] = [
        PainScheme::Pain001_001_03,
        PainScheme::Pain001_002_03,
        PainScheme::Pain001_003_03,
        PainScheme::Pain008_001_02,
        PainScheme::Pain008_002_02,
        PainScheme::Pain008_003_02,
    ];

    /// Version part of the schema name, e.g. `pain.001.001.03`.
    pub fn version(&self) -> &'static str {
        match self {
            PainScheme::Pain001_001_03 => "pain.001.001.03",
            PainScheme::Pain001_002_03 => "pain.001.002.03",
            PainScheme::Pain001_003_03 => "pain.001.003.03",
            PainScheme::Pain008_001_02 => "pain.008.001.02",
            PainScheme::Pain008_002_02 => "pain.008.002.02",
            PainScheme::Pain008_003_02 => "pain.008.003.02",
        }
    }

    /// Descriptor sent in the order segment.
    pub fn urn(&self) -> String {
        format!("urn:iso:std:iso:20022:tech:xsd:{}", self.version())
    }

    pub fn kind(&self) -> PainKind {
        match self {
            PainScheme::Pain001_001_03 | PainScheme::Pain001_002_03 | PainScheme::Pain001_003_03 => PainKind::CreditTransfer,
            PainScheme::Pain008_001_02 | PainScheme::Pain008_002_02 | PainScheme::Pain008_003_02 => PainKind::DirectDebit,
        }
    }

    /// Recognizes URNs as well as file style names such as `sepade.pain.001.003.03.xsd`.
    pub fn from_descriptor(descriptor: &str) -> Option<PainScheme> {
        PainScheme::ALL.into_iter().find(|scheme| descriptor.contains(scheme.version()))
    }

    /// The first scheme of `kind` the bank supports, or the common default.
    pub fn select(kind: PainKind, supported: &[String]) -> PainScheme {
        supported
            .iter()
            .filter_map(|descriptor| PainScheme::from_descriptor(descriptor))
            .find(|scheme| scheme.kind() == kind)
            .unwrap_or(match kind {
                PainKind::CreditTransfer => PainScheme::Pain001_001_03,
                PainKind::DirectDebit => PainScheme::Pain008_001_02,
            })
    }
}

impl fmt::Display for PainScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version())
    }
}

/// Builds SEPA XML documents. Implemented by the caller.
pub trait PainDocumentBuilder {
    fn build(&self, request: &PainRequest, scheme: PainScheme) -> Result<String, Error>;
}

impl<F> PainDocumentBuilder for F
where
    F: Fn(&PainRequest, PainScheme) -> Result<String, Error>,
{
    fn build(&self, request: &PainRequest, scheme: PainScheme) -> Result<String, Error> {
        self(request, scheme)
    }
}

/// camt statement format requested from the bank.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CamtVersion {
    /// Account report (intraday).
    Camt052,
    /// Account statement.
    Camt053,
}

impl CamtVersion {
    pub fn urn(&self) -> &'static str {
        match self {
            CamtVersion::Camt052 => "urn:iso:std:iso:20022:tech:xsd:camt.052.001.02",
            CamtVersion::Camt053 => "urn:iso:std:iso:20022:tech:xsd:camt.053.001.02",
        }
    }
}

/// Execution interval unit of a standing order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Monthly,
    Weekly,
}

impl TimeUnit {
    pub fn code(&self) -> &'static str {
        match self {
            TimeUnit::Monthly => "M",
            TimeUnit::Weekly => "W",
        }
    }

    pub fn from_code(code: &str) -> Option<TimeUnit> {
        match code {
            "M" => Some(TimeUnit::Monthly),
            "W" => Some(TimeUnit::Weekly),
            _ => None,
        }
    }
}

/// When a standing order is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingOrderSchedule {
    pub first_execution: Date,
    pub unit: TimeUnit,
    /// Every `rota` units.
    pub rota: u32,
    /// Day of month (monthly) or weekday `1..=7` (weekly).
    pub day: u32,
    pub last_execution: Option<Date>,
}

/// Prepaid mobile phone top-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepaidTopUp {
    /// Mobile network provider name as listed by the bank.
    pub provider: String,
    pub phone_number: String,
    pub amount: Decimal,
}
