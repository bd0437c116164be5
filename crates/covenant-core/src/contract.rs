//! Contract records as seen by the document and analysis core.
//!
//! Contract CRUD lives elsewhere; the core only needs enough of a contract to
//! check that it exists and to render it into an analysis prompt.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Commercial category of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractType {
    ServiceAgreement,
    License,
    ProfessionalServices,
    RealEstate,
    Employment,
    Nda,
    Partnership,
    Vendor,
    Customer,
    #[default]
    Other,
}

impl ContractType {
    pub const ALL: [ContractType; 10] = [
        Self::ServiceAgreement,
        Self::License,
        Self::ProfessionalServices,
        Self::RealEstate,
        Self::Employment,
        Self::Nda,
        Self::Partnership,
        Self::Vendor,
        Self::Customer,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceAgreement => "SERVICE_AGREEMENT",
            Self::License => "LICENSE",
            Self::ProfessionalServices => "PROFESSIONAL_SERVICES",
            Self::RealEstate => "REAL_ESTATE",
            Self::Employment => "EMPLOYMENT",
            Self::Nda => "NDA",
            Self::Partnership => "PARTNERSHIP",
            Self::Vendor => "VENDOR",
            Self::Customer => "CUSTOMER",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractType {
    type Err = String;

    /// Accepts the wire name in any case, with `-` or `_` separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown contract type: {s}"))
    }
}

/// A contract under management.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub name: String,
    pub party_name: String,
    pub contract_type: ContractType,
    pub value: Option<f64>,
    pub currency: String,
    pub start_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Contract {
    /// A contract with a fresh id, no value, no dates, and currency `USD`.
    pub fn new(
        name: impl Into<String>,
        party_name: impl Into<String>,
        contract_type: ContractType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            party_name: party_name.into(),
            contract_type,
            value: None,
            currency: "USD".to_string(),
            start_date: None,
            expiry_date: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    /// `"{currency} {value}"`, or `None` when no value is recorded.
    pub fn formatted_value(&self) -> Option<String> {
        self.value.map(|v| format!("{} {}", self.currency, v))
    }
}
