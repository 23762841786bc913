//! Reconciliation core for docstitch: normalization, organization,
//! identity matching, and merging of per-page extraction results.
//!
//! Pure engine crate: receives already-extracted field values, returns
//! organized and merged records. No IO and no provider dependencies.

pub mod matcher;
pub mod merge;
pub mod normalize;
pub mod organize;

pub use matcher::{ComparisonStatus, FieldComparison, MatchOutcome, compare};
pub use merge::merge;
pub use normalize::normalize;
pub use organize::organize;
