//! Identity matching: do two organized records plausibly describe the
//! same physical document?

use docstitch_schema::{FieldKey, MatchPolicy, OrganizedRecord};
use docstitch_shared::{FieldDispute, IdentifierComparison};
use tracing::debug;

pub use docstitch_shared::ComparisonStatus;

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Per-field comparison detail for reporting.
#[derive(Debug, Clone)]
pub struct FieldComparison {
    pub field: FieldKey,
    pub left: String,
    pub right: String,
    pub status: ComparisonStatus,
}

/// Result of comparing two records under a match policy.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Same-document verdict.
    pub matched: bool,
    /// Identifier fields where both sides agreed.
    pub agreements: usize,
    /// Agreements the policy required.
    pub threshold: usize,
    /// One entry per identifier field, in policy order.
    pub comparisons: Vec<FieldComparison>,
}

impl MatchOutcome {
    /// The conflicting fields, in report form (both sides populated and
    /// differing — empties never conflict).
    pub fn disputes(&self) -> Vec<FieldDispute> {
        self.comparisons
            .iter()
            .filter(|c| c.status == ComparisonStatus::Conflict)
            .map(|c| FieldDispute {
                field: c.field.as_str().to_string(),
                left: c.left.clone(),
                right: c.right.clone(),
            })
            .collect()
    }

    /// Every identifier comparison in report form, statuses included, so
    /// a mismatch report can tell conflicts from unpopulated fields.
    pub fn identifier_comparisons(&self) -> Vec<IdentifierComparison> {
        self.comparisons
            .iter()
            .map(|c| IdentifierComparison {
                field: c.field.as_str().to_string(),
                left: c.left.clone(),
                right: c.right.clone(),
                status: c.status,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Compare two records on the policy's identifier fields.
///
/// An identifier agrees when both records carry a non-empty, equal value.
/// Emptiness on either side is neutral: it neither agrees nor conflicts.
/// With zero populated identifiers the agreement count is zero, which
/// always fails the threshold — ambiguous pairs are rejected, never
/// silently merged. Symmetric in its verdict: `compare(a, b)` and
/// `compare(b, a)` agree on `matched`.
pub fn compare(left: &OrganizedRecord, right: &OrganizedRecord, policy: &MatchPolicy) -> MatchOutcome {
    let mut comparisons = Vec::with_capacity(policy.identifiers.len());
    let mut agreements = 0usize;

    for field in &policy.identifiers {
        let l = left.get(*field);
        let r = right.get(*field);

        let status = match (l.is_empty(), r.is_empty()) {
            (true, true) => ComparisonStatus::EmptyBoth,
            (true, false) => ComparisonStatus::EmptyLeft,
            (false, true) => ComparisonStatus::EmptyRight,
            (false, false) if l == r => ComparisonStatus::Agreed,
            (false, false) => ComparisonStatus::Conflict,
        };

        if status == ComparisonStatus::Agreed {
            agreements += 1;
        }

        comparisons.push(FieldComparison {
            field: *field,
            left: l.to_string(),
            right: r.to_string(),
            status,
        });
    }

    let threshold = policy.threshold();
    let matched = agreements >= threshold;

    debug!(
        agreements,
        threshold,
        matched,
        identifiers = policy.identifiers.len(),
        "identity comparison"
    );

    MatchOutcome {
        matched,
        agreements,
        threshold,
        comparisons,
    }
}
