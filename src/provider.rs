//! Test certificate sync provider.
//!
//! Registers targets that ask to be enabled. Loaded as an external extension,
//! the host trust model is expected to force them disabled ("Extension not
//! authorized for certificate sync") and never call `synchronize`. When it
//! does get called anyway, the provider plays back a simulated sync so the
//! host's progress and error handling can be observed.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{
    progress_task, CertificateSyncTargetProvider, ProgressLocation, ProgressOptions, SyncTarget,
    Window,
};
use crate::catalog::{self, CatalogVariant};
use crate::error::Result;
use crate::settings::{FixtureSettings, SyncMode};
use crate::sync::{SimulationPlan, SyncSimulator};

pub struct TestCertificateSyncProvider {
    catalog: CatalogVariant,
    mode: SyncMode,
    simulator: SyncSimulator,
    window: Arc<dyn Window>,
}

impl TestCertificateSyncProvider {
    pub fn new(settings: &FixtureSettings, window: Arc<dyn Window>) -> Self {
        Self {
            catalog: settings.catalog,
            mode: settings.mode,
            simulator: SyncSimulator::new(SimulationPlan::from(settings)),
            window,
        }
    }

    fn progress_options(target_id: &str) -> ProgressOptions {
        ProgressOptions {
            location: ProgressLocation::TaskWidget,
            title: format!("Synchronizing certificates to {}", target_id),
        }
    }
}

#[async_trait]
impl CertificateSyncTargetProvider for TestCertificateSyncProvider {
    async fn get_targets(&self) -> Result<Vec<SyncTarget>> {
        Ok(catalog::targets(self.catalog))
    }

    async fn synchronize(&self, target_id: &str, certificates: &[String]) -> Result<()> {
        tracing::info!(
            "synchronize called for {} with {} certificates",
            target_id,
            certificates.len()
        );
        tracing::warn!("synchronize reached; external extensions should never get here");

        match self.mode {
            SyncMode::Notify => {
                self.window
                    .show_information_message(&format!(
                        "Test sync to {}: Would sync {} certificates",
                        target_id,
                        certificates.len()
                    ))
                    .await
            }
            SyncMode::Progress => {
                let simulator = &self.simulator;
                self.window
                    .with_progress(
                        Self::progress_options(target_id),
                        progress_task(move |sink| async move {
                            simulator.run(target_id, certificates, sink.as_ref()).await
                        }),
                    )
                    .await
            }
        }
    }
}
