//! Service container for dependency injection
//!
//! Wires up the dashboard service with its dependencies.

use std::path::Path;
use std::sync::Arc;

use crate::application::services::DashboardService;
use crate::config::Settings;
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::service::{DocumentFileService, RestModelingService};
use crate::infrastructure::traits::{FileSystem, ModelingService, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Remote modeling service
    pub modeling: Arc<dyn ModelingService>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let modeling = RestModelingService::new(settings.service.clone())?;
        Ok(Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(modeling),
        ))
    }

    /// Answer every process from a saved document instead of the network.
    pub fn from_document(settings: Settings, document: &Path) -> Self {
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(DocumentFileService::new(document)),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        modeling: Arc<dyn ModelingService>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
            modeling,
        }
    }

    /// Dashboard service for the given period.
    pub fn dashboard(&self, period: u32) -> DashboardService {
        DashboardService::new(
            Arc::clone(&self.modeling),
            Arc::clone(&self.fs),
            Arc::clone(&self.settings),
        )
        .with_period(period)
    }
}
