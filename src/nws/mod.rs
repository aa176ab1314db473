//! National Weather Service access: a retrying fetcher, one cached
//! wrapper per resource, and the bundle assembler built on top of them.

pub mod bundle;
pub mod client;
pub mod error;
pub mod fetch;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use bundle::ForecastBundle;
pub use client::NwsClient;
pub use error::{Endpoint, ErrorKind, NwsError};
