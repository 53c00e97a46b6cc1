//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, ModelingService)
//! but are themselves concrete structs, not traits.

mod dashboard;

pub use dashboard::{DashboardService, ModelView, ProfileView};
