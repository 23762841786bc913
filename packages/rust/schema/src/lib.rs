//! Fixed record schema and extraction profiles for docstitch.
//!
//! This crate owns everything that is static and profile-keyed:
//! - [`Section`] and [`FieldKey`] — the enumerated schema
//! - [`OrganizedRecord`] — the fixed-schema record type
//! - [`DocumentProfile`] — per-profile provider name tables, identifier
//!   sets, match thresholds, and merge fill policies

pub mod fields;
pub mod profile;
pub mod record;

pub use fields::{FieldKey, Section};
pub use profile::{CompareStrategy, DocumentProfile, FillPolicy, MatchPolicy};
pub use record::OrganizedRecord;
