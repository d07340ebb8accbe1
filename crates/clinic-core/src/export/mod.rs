//! Export functionality for invoices and animal histories.

mod history;
mod invoices;

pub use history::*;
pub use invoices::*;
