//! The fixed record schema: sections and enumerated field keys.
//!
//! Every organized record is keyed by [`FieldKey`]; a key outside the
//! schema cannot be represented, which removes the string-literal key
//! typos the ad hoc dictionary approach invites.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// Named section of an organized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    CompanyInformation,
    InvoiceInformation,
    VehicleInformation,
    FinancialInformation,
}

impl Section {
    /// Wire name used in serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyInformation => "company_information",
            Self::InvoiceInformation => "invoice_information",
            Self::VehicleInformation => "vehicle_information",
            Self::FinancialInformation => "financial_information",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FieldKey
// ---------------------------------------------------------------------------

/// Semantic field key. The full set across all profiles; each profile's
/// schema is a subset (see `DocumentProfile::schema`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    // Company
    CompanyName,
    CompanyAddress,
    // Invoice
    InvoiceNumber,
    CustomerNumber,
    OrderNumber,
    DateOfDelivery,
    // Vehicle (invoice profile)
    Uid,
    OperatingNumber,
    OfficialLabel,
    TypeModel,
    FirstRegistration,
    ChassisNumber,
    InstallationDate,
    ServiceConsultant,
    KmStatus,
    // Vehicle (registration profile)
    Make,
    Model,
    FinNumber,
    LastService,
    // Financial
    WorkPrice,
    MaterialPrice,
    TaxBasis,
    VatPercentage,
    VatTotal,
    TotalAmount,
}

impl FieldKey {
    /// The section this key belongs to.
    pub fn section(&self) -> Section {
        use FieldKey::*;
        match self {
            CompanyName | CompanyAddress => Section::CompanyInformation,
            InvoiceNumber | CustomerNumber | OrderNumber | DateOfDelivery => {
                Section::InvoiceInformation
            }
            Uid | OperatingNumber | OfficialLabel | TypeModel | FirstRegistration
            | ChassisNumber | InstallationDate | ServiceConsultant | KmStatus | Make | Model
            | FinNumber | LastService => Section::VehicleInformation,
            WorkPrice | MaterialPrice | TaxBasis | VatPercentage | VatTotal | TotalAmount => {
                Section::FinancialInformation
            }
        }
    }

    /// Wire name used in serialized records.
    pub fn as_str(&self) -> &'static str {
        use FieldKey::*;
        match self {
            CompanyName => "company_name",
            CompanyAddress => "company_address",
            InvoiceNumber => "invoice_number",
            CustomerNumber => "customer_number",
            OrderNumber => "order_number",
            DateOfDelivery => "date_of_delivery",
            Uid => "uid",
            OperatingNumber => "operating_number",
            OfficialLabel => "official_label",
            TypeModel => "type_model",
            FirstRegistration => "first_registration",
            ChassisNumber => "chassis_number",
            InstallationDate => "installation_date",
            ServiceConsultant => "service_consultant",
            KmStatus => "km_status",
            Make => "make",
            Model => "model",
            FinNumber => "fin_number",
            LastService => "last_service",
            WorkPrice => "work_price",
            MaterialPrice => "material_price",
            TaxBasis => "tax_basis",
            VatPercentage => "vat_percentage",
            VatTotal => "vat_total",
            TotalAmount => "total_amount",
        }
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
