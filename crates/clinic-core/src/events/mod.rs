//! Event logging: form controller, status cascade and submission.

mod cascade;
mod form;
mod recorder;

pub use cascade::*;
pub use form::*;
pub use recorder::*;
