//! Extraction provider client for docstitch.
//!
//! Wraps the provider's async analyze protocol (submit → poll → field
//! map). The reconciliation core consumes only the resulting
//! [`docstitch_shared::RawFieldSet`]; everything provider-specific stays
//! in this crate.

mod client;

pub use client::ExtractionClient;
