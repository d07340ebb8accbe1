//! Data tables: joined display rows and client-side table state.

mod loader;
mod rows;
mod state;

pub use loader::*;
pub use rows::*;
pub use state::*;
