//! Merge reducer: fold N organized records into one.

use docstitch_schema::{DocumentProfile, FillPolicy, OrganizedRecord};
use tracing::debug;

/// Fold a sequence of records into one merged record.
///
/// Records must already be identity-verified; the reducer resolves each
/// schema key independently under the given fill policy and never fails.
/// A key empty in every input stays empty. Input order is significant
/// under `FirstNonEmpty` (earliest non-empty wins), so callers must pass
/// records in upload order.
pub fn merge(
    profile: DocumentProfile,
    records: &[OrganizedRecord],
    policy: FillPolicy,
) -> OrganizedRecord {
    let mut merged = OrganizedRecord::empty(profile);

    for key in profile.schema() {
        let winner = match policy {
            FillPolicy::FirstNonEmpty => records
                .iter()
                .map(|r| r.get(*key))
                .find(|v| !v.is_empty()),
            FillPolicy::LongestValue => records
                .iter()
                .map(|r| r.get(*key))
                .filter(|v| !v.is_empty())
                // max_by_key keeps the later element on ties; reverse the
                // scan so the earlier page wins equal-length values.
                .rev()
                .max_by_key(|v| v.chars().count()),
        };
        if let Some(value) = winner {
            merged.set(*key, value);
        }
    }

    debug!(
        profile = %profile,
        pages = records.len(),
        populated = merged.populated_count(),
        ?policy,
        "merged records"
    );

    merged
}
