//! Shared domain types for docstitch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Named fields returned by the extraction provider for a single page.
///
/// Keys are the provider's trained field labels; a field may be present
/// with no value. Built once per page and never mutated afterward.
pub type RawFieldSet = BTreeMap<String, Option<String>>;

// ---------------------------------------------------------------------------
// BatchId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for reconciliation batch identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub Uuid);

impl BatchId {
    /// Generate a new time-sortable batch identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// PageSource
// ---------------------------------------------------------------------------

/// Trace metadata for one received page, kept alongside its extraction
/// result for logging and the final outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSource {
    /// Original filename as uploaded.
    pub filename: String,
    /// SHA-256 hash of the page bytes.
    pub content_hash: String,
    /// Page size in bytes.
    pub byte_len: usize,
    /// When the page entered the batch.
    pub received_at: DateTime<Utc>,
}

impl PageSource {
    /// Build a trace for a page from its filename and raw bytes.
    pub fn from_bytes(filename: impl Into<String>, bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self {
            filename: filename.into(),
            content_hash: format!("{:x}", hasher.finalize()),
            byte_len: bytes.len(),
            received_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// MismatchReport
// ---------------------------------------------------------------------------

/// How one identifier field compared across two records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    /// Both populated with equal values.
    Agreed,
    /// Both populated with differing values.
    Conflict,
    /// Only the right record has a value.
    EmptyLeft,
    /// Only the left record has a value.
    EmptyRight,
    /// Neither record has a value.
    EmptyBoth,
}

impl ComparisonStatus {
    /// True when at least one side carried no value.
    pub fn is_unpopulated(&self) -> bool {
        matches!(self, Self::EmptyLeft | Self::EmptyRight | Self::EmptyBoth)
    }
}

/// One identifier field on which two pages both had a value and disagreed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDispute {
    /// Wire name of the schema field.
    pub field: String,
    /// Value on the earlier page.
    pub left: String,
    /// Value on the later page.
    pub right: String,
}

/// Per-identifier comparison detail carried in a mismatch report, so a
/// rejected caller can tell a genuine conflict from a merely unpopulated
/// field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierComparison {
    /// Wire name of the schema field.
    pub field: String,
    /// Value on the earlier page, empty when unpopulated.
    pub left: String,
    /// Value on the later page, empty when unpopulated.
    pub right: String,
    /// How the two sides compared.
    pub status: ComparisonStatus,
}

/// Why a multi-page batch was rejected: the pair of pages that failed the
/// identity check, the identifier fields they disagreed on, and the full
/// per-identifier comparison detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MismatchReport {
    /// Filename of the earlier page in the failing pair.
    pub left_file: String,
    /// Filename of the later page in the failing pair.
    pub right_file: String,
    /// Identifier fields populated on both sides with differing values.
    pub disputes: Vec<FieldDispute>,
    /// Every identifier field of the profile, in policy order, with its
    /// populated/empty comparison status.
    pub comparisons: Vec<IdentifierComparison>,
    /// Identifier agreements found for the failing pair.
    pub agreements: usize,
    /// Agreements the profile required.
    pub threshold: usize,
}

impl std::fmt::Display for MismatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn list(fields: Vec<&str>) -> String {
            if fields.is_empty() {
                "none".to_string()
            } else {
                fields.join(", ")
            }
        }

        let disputed: Vec<&str> = self.disputes.iter().map(|d| d.field.as_str()).collect();
        let unpopulated: Vec<&str> = self
            .comparisons
            .iter()
            .filter(|c| c.status.is_unpopulated())
            .map(|c| c.field.as_str())
            .collect();
        write!(
            f,
            "'{}' vs '{}' agreed on {}/{} identifier fields (disputed: {}; unpopulated: {})",
            self.left_file,
            self.right_file,
            self.agreements,
            self.threshold,
            list(disputed),
            list(unpopulated)
        )
    }
}
