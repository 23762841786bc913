//! Record organization: raw provider fields → fixed-schema record.

use docstitch_schema::{DocumentProfile, OrganizedRecord};
use docstitch_shared::RawFieldSet;
use tracing::debug;

use crate::normalize::normalize;

/// Map a flat bag of provider fields into the profile's fixed schema.
///
/// For each semantic key, the profile's provider alias list is consulted
/// in preference order and the first non-empty cleaned value wins. Keys
/// with no usable match stay empty; nothing here can fail.
pub fn organize(raw: &RawFieldSet, profile: DocumentProfile) -> OrganizedRecord {
    let mut record = OrganizedRecord::empty(profile);

    for key in profile.schema() {
        for alias in profile.provider_aliases(*key) {
            let Some(Some(text)) = raw.get(*alias) else {
                continue;
            };
            let cleaned = normalize(*key, text);
            if !cleaned.is_empty() {
                record.set(*key, cleaned);
                break;
            }
        }
    }

    debug!(
        profile = %profile,
        raw_fields = raw.len(),
        populated = record.populated_count(),
        "organized page fields"
    );

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstitch_schema::FieldKey;

    fn raw(entries: &[(&str, Option<&str>)]) -> RawFieldSet {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(String::from)))
            .collect()
    }

    #[test]
    fn maps_provider_names_into_sections() {
        let raw = raw(&[
            ("company name", Some("Autohaus Muster GmbH")),
            ("invoice number", Some("RE-2024-001")),
            ("costumer number", Some("K-778")),
            ("total amount", Some("1.234,56")),
        ]);

        let record = organize(&raw, DocumentProfile::ServiceInvoice);
        assert_eq!(record.get(FieldKey::CompanyName), "Autohaus Muster GmbH");
        assert_eq!(record.get(FieldKey::InvoiceNumber), "RE-2024-001");
        assert_eq!(record.get(FieldKey::CustomerNumber), "K-778");
        assert_eq!(record.get(FieldKey::TotalAmount), "1.234,56");
        // Unmentioned keys stay empty.
        assert_eq!(record.get(FieldKey::ChassisNumber), "");
    }

    #[test]
    fn values_are_normalized_on_the_way_in() {
        let raw = raw(&[
            ("UID", Some("UID: 12345\nUID: 12345")),
            ("work price total", Some("Summe")),
        ]);

        let record = organize(&raw, DocumentProfile::ServiceInvoice);
        assert_eq!(record.get(FieldKey::Uid), "12345");
        assert_eq!(record.get(FieldKey::WorkPrice), "");
    }

    #[test]
    fn first_non_empty_alias_wins() {
        // Both spellings present: the provider's trained label is
        // preferred, the corrected one is the fallback.
        let both = raw(&[
            ("costumer number", Some("K-1")),
            ("customer number", Some("K-2")),
        ]);
        let record = organize(&both, DocumentProfile::ServiceInvoice);
        assert_eq!(record.get(FieldKey::CustomerNumber), "K-1");

        // Preferred label present but empty after cleaning: fall through.
        let fallback = raw(&[
            ("costumer number", Some("  ")),
            ("customer number", Some("K-2")),
        ]);
        let record = organize(&fallback, DocumentProfile::ServiceInvoice);
        assert_eq!(record.get(FieldKey::CustomerNumber), "K-2");
    }

    #[test]
    fn absent_and_valueless_fields_read_as_empty() {
        let raw = raw(&[("order number", None)]);
        let record = organize(&raw, DocumentProfile::ServiceInvoice);
        assert_eq!(record.get(FieldKey::OrderNumber), "");
    }

    #[test]
    fn unknown_provider_fields_are_ignored() {
        let raw = raw(&[
            ("something the model invented", Some("noise")),
            ("vehicle make", Some("Volkswagen")),
        ]);
        let record = organize(&raw, DocumentProfile::VehicleRegistration);
        assert_eq!(record.get(FieldKey::Make), "Volkswagen");
        assert_eq!(record.populated_count(), 1);
    }
}
