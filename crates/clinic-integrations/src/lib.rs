//! HTTP integrations for the clinic core.
//!
//! Implements the two outbound boundaries the core defines as traits:
//! the billing webhook ([`clinic_core::invoicing::InvoiceWebhook`]) and the
//! accounting item catalog ([`clinic_core::cache::ItemCatalogProvider`]).

pub mod accounting;
pub mod webhook;

pub use accounting::*;
pub use webhook::*;
