//! Deletion guard: dependency checks, cascades and batch deletes.

mod deleter;
mod policy;

pub use deleter::*;
pub use policy::*;
