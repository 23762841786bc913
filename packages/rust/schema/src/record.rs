//! Organized records: the fixed-schema output of the organizer and the
//! merge reducer.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::fields::FieldKey;
use crate::profile::DocumentProfile;

/// A profile-tagged record with every schema key present.
///
/// Empty string means "absent"; there is no null. Keys outside the
/// profile's schema cannot enter the record: `set` drops them and `get`
/// reads them as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizedRecord {
    profile: DocumentProfile,
    fields: BTreeMap<FieldKey, String>,
}

impl OrganizedRecord {
    /// Create a record with all schema keys initialized to empty.
    pub fn empty(profile: DocumentProfile) -> Self {
        let fields = profile
            .schema()
            .iter()
            .map(|key| (*key, String::new()))
            .collect();
        Self { profile, fields }
    }

    /// The profile this record was organized under.
    pub fn profile(&self) -> DocumentProfile {
        self.profile
    }

    /// Read a field value. Out-of-schema keys read as empty.
    pub fn get(&self, key: FieldKey) -> &str {
        self.fields.get(&key).map(String::as_str).unwrap_or("")
    }

    /// True when the field holds a non-empty value.
    pub fn has(&self, key: FieldKey) -> bool {
        !self.get(key).is_empty()
    }

    /// Write a field value. Keys outside the profile's schema are dropped,
    /// preserving the fixed-schema invariant.
    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        if self.fields.contains_key(&key) {
            self.fields.insert(key, value.into());
        }
    }

    /// Iterate over all schema keys and their current values.
    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Number of non-empty fields.
    pub fn populated_count(&self) -> usize {
        self.fields.values().filter(|v| !v.is_empty()).count()
    }

    /// Render as nested `{section: {key: value}}` JSON.
    pub fn to_value(&self) -> Value {
        let mut sections: Map<String, Value> = Map::new();
        for key in self.profile.schema() {
            let section_name = key.section().as_str();
            let entry = sections
                .entry(section_name.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(section) = entry {
                section.insert(
                    key.as_str().to_string(),
                    Value::String(self.get(*key).to_string()),
                );
            }
        }
        Value::Object(sections)
    }
}

impl Serialize for OrganizedRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_value().serialize(serializer)
    }
}
