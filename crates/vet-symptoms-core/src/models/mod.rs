//! Domain models for the symptom lookup service.

mod query;
mod record;
mod response;

pub use query::*;
pub use record::*;
pub use response::*;
