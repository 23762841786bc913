//! Pipeline orchestration for docstitch.
//!
//! Ties the provider client and the reconciliation core together into the
//! end-to-end `reconcile` workflow: extract every page, verify the pages
//! describe the same document, and merge them into one record.

pub mod pipeline;

pub use pipeline::{
    BatchOutcome, PageResult, PageUpload, ProgressReporter, ReconcileConfig, SilentProgress,
    reconcile,
};
