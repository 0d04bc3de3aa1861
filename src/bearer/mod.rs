// Broadcast bearer identifiers (ETSI TS 103 270 bearer URIs)
pub mod dab;

pub use dab::{BearerError, DabBearer};
