//! Domain models for the clinic.

mod animal;
mod contact;
mod event;
mod invoice;

pub use animal::*;
pub use contact::*;
pub use event::*;
pub use invoice::*;
