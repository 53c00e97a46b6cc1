//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod registry;
pub mod request;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use registry::{ModelRegistry, RemovalOutcome};
pub use request::parse_period;
