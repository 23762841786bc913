//! Extraction profiles and their policies.
//!
//! A profile bundles everything that varies between document kinds: the
//! provider model id, the schema key list, the provider field-name alias
//! tables, the identifier-field set with its match threshold, and the
//! merge fill policy. The tables live here, once, instead of drifting
//! across endpoint variants.

use serde::{Deserialize, Serialize};

use crate::fields::FieldKey;

// ---------------------------------------------------------------------------
// DocumentProfile
// ---------------------------------------------------------------------------

/// A named schema + identifier-field set + merge policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentProfile {
    /// General document profile: workshop/service invoices with company,
    /// invoice, vehicle, and financial sections.
    ServiceInvoice,
    /// Identity/license profile: vehicle registration records.
    VehicleRegistration,
}

/// Full invoice-profile schema, in section order.
const INVOICE_SCHEMA: &[FieldKey] = &[
    FieldKey::CompanyName,
    FieldKey::CompanyAddress,
    FieldKey::InvoiceNumber,
    FieldKey::CustomerNumber,
    FieldKey::OrderNumber,
    FieldKey::DateOfDelivery,
    FieldKey::Uid,
    FieldKey::OperatingNumber,
    FieldKey::OfficialLabel,
    FieldKey::TypeModel,
    FieldKey::FirstRegistration,
    FieldKey::ChassisNumber,
    FieldKey::InstallationDate,
    FieldKey::ServiceConsultant,
    FieldKey::KmStatus,
    FieldKey::WorkPrice,
    FieldKey::MaterialPrice,
    FieldKey::TaxBasis,
    FieldKey::VatPercentage,
    FieldKey::VatTotal,
    FieldKey::TotalAmount,
];

/// Registration-profile schema.
const REGISTRATION_SCHEMA: &[FieldKey] = &[
    FieldKey::Make,
    FieldKey::Model,
    FieldKey::FinNumber,
    FieldKey::FirstRegistration,
    FieldKey::LastService,
];

/// Invoice identifier fields: discriminating keys, not descriptive ones.
const INVOICE_IDENTIFIERS: &[FieldKey] = &[
    FieldKey::InvoiceNumber,
    FieldKey::CustomerNumber,
    FieldKey::OrderNumber,
    FieldKey::DateOfDelivery,
    FieldKey::Uid,
    FieldKey::OperatingNumber,
    FieldKey::ChassisNumber,
];

/// Registration identifier fields.
const REGISTRATION_IDENTIFIERS: &[FieldKey] = &[
    FieldKey::FinNumber,
    FieldKey::FirstRegistration,
    FieldKey::Make,
];

impl DocumentProfile {
    /// Stable name used in config files and CLI flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceInvoice => "invoice",
            Self::VehicleRegistration => "registration",
        }
    }

    /// Provider model id submitted with every analyze request.
    pub fn model_id(&self) -> &'static str {
        match self {
            Self::ServiceInvoice => "final",
            Self::VehicleRegistration => "registration",
        }
    }

    /// Every semantic key in this profile's schema.
    pub fn schema(&self) -> &'static [FieldKey] {
        match self {
            Self::ServiceInvoice => INVOICE_SCHEMA,
            Self::VehicleRegistration => REGISTRATION_SCHEMA,
        }
    }

    /// Provider field labels that may populate `key`, in preference order.
    ///
    /// The first non-empty cleaned value among these wins. Labels reproduce
    /// the provider model's trained spellings, `"costumer number"` included.
    pub fn provider_aliases(&self, key: FieldKey) -> &'static [&'static str] {
        use FieldKey::*;
        match self {
            Self::ServiceInvoice => match key {
                CompanyName => &["company name"],
                CompanyAddress => &["company address"],
                InvoiceNumber => &["invoice number"],
                CustomerNumber => &["costumer number", "customer number"],
                OrderNumber => &["order number"],
                DateOfDelivery => &["date/day of delivery", "date of delivery"],
                Uid => &["UID"],
                OperatingNumber => &["operating number"],
                OfficialLabel => &["official label"],
                TypeModel => &["type/model"],
                FirstRegistration => &["date of first registration"],
                ChassisNumber => &["unit/chassis number", "chassis number"],
                InstallationDate => &["installation/recording date"],
                ServiceConsultant => &["service consultant"],
                KmStatus => &["km-status"],
                WorkPrice => &["work price total"],
                MaterialPrice => &["material price total"],
                TaxBasis => &["tax basis"],
                VatPercentage => &["VAT percentage"],
                VatTotal => &["VAT total"],
                TotalAmount => &["total amount"],
                _ => &[],
            },
            Self::VehicleRegistration => match key {
                Make => &["vehicle make", "make"],
                Model => &["vehicle model", "model"],
                FinNumber => &["chassis/FIN number", "FIN", "unit/chassis number"],
                FirstRegistration => &["date of first registration", "first registration"],
                LastService => &["date of last service", "last service"],
                _ => &[],
            },
        }
    }

    /// The identity-match policy for this profile.
    pub fn match_policy(&self) -> MatchPolicy {
        match self {
            // 7 identifiers, threshold 3
            Self::ServiceInvoice => MatchPolicy::new(INVOICE_IDENTIFIERS.to_vec(), -1),
            // 3 identifiers, threshold 2
            Self::VehicleRegistration => MatchPolicy::new(REGISTRATION_IDENTIFIERS.to_vec(), 0),
        }
    }

    /// The merge fill policy for this profile.
    pub fn fill_policy(&self) -> FillPolicy {
        match self {
            Self::ServiceInvoice => FillPolicy::FirstNonEmpty,
            Self::VehicleRegistration => FillPolicy::LongestValue,
        }
    }
}

impl std::fmt::Display for DocumentProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invoice" => Ok(Self::ServiceInvoice),
            "registration" => Ok(Self::VehicleRegistration),
            other => Err(format!(
                "unknown profile '{other}': expected 'invoice' or 'registration'"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// MatchPolicy
// ---------------------------------------------------------------------------

/// Identifier-field set plus threshold rule for same-document decisions.
///
/// The threshold is a strict majority of the identifier fields, rounded up,
/// shifted by a per-profile `correction`. This generalizes the observed
/// per-endpoint thresholds (5 of 11, 3 of 7, 2 of 3) into one formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPolicy {
    /// Schema keys considered discriminating for this profile.
    pub identifiers: Vec<FieldKey>,
    /// Signed adjustment applied to the majority threshold.
    pub correction: i32,
}

impl MatchPolicy {
    pub fn new(identifiers: Vec<FieldKey>, correction: i32) -> Self {
        Self {
            identifiers,
            correction,
        }
    }

    /// Minimum number of agreeing identifier fields for a "same" verdict.
    ///
    /// Never below 1: a pair with zero agreements must always fail, even
    /// under an aggressive negative correction.
    pub fn threshold(&self) -> usize {
        let majority = self.identifiers.len().div_ceil(2) as i64;
        (majority + self.correction as i64).max(1) as usize
    }
}

// ---------------------------------------------------------------------------
// FillPolicy / CompareStrategy
// ---------------------------------------------------------------------------

/// How the merge reducer resolves a key present in several records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// First non-empty value in upload order wins (fill-once).
    FirstNonEmpty,
    /// Longest non-empty value wins; ties keep the earlier page's value.
    LongestValue,
}

/// Which page pairs the orchestrator checks for identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareStrategy {
    /// Each page against its predecessor in upload order.
    PairwiseAdjacent,
    /// Every page against the first page.
    Anchor,
}

impl CompareStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PairwiseAdjacent => "adjacent",
            Self::Anchor => "anchor",
        }
    }
}

impl std::fmt::Display for CompareStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CompareStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adjacent" => Ok(Self::PairwiseAdjacent),
            "anchor" => Ok(Self::Anchor),
            other => Err(format!(
                "unknown strategy '{other}': expected 'adjacent' or 'anchor'"
            )),
        }
    }
}
