//! Simulated certificate sync.
//!
//! Plays back the progress sequence a real sync provider would produce:
//! anchors directory setup, one upload step per certificate, trust store
//! update and service restart. One configurable target fails halfway through
//! the upload phase so the host's error path can be exercised too.
//!
//! Percent bands:
//! - 5: setup
//! - 6..=85: uploads, spread linearly over the simulated count
//! - 90, 95, 100: trust store, restart, done

pub mod progress;

use crate::api::ProgressSink;
use crate::error::{FixtureError, Result};
use crate::settings::{
    FixtureSettings, SyncDelays, DEFAULT_CERTIFICATE_COUNT, DEFAULT_FAILING_TARGET,
};

use progress::{FinishGuard, ProgressEvent};

const SETUP_PERCENT: u8 = 5;
const UPLOAD_BAND: u128 = 80;
const TRUST_STORE_PERCENT: u8 = 90;
const RESTART_PERCENT: u8 = 95;
const DONE_PERCENT: u8 = 100;

/// Percent reported for upload step `step` (0-based) out of `total`.
///
/// `5 + floor((step + 1) / total * 80)`, so the first step lands on 6 and
/// the last on 85 for the default count.
pub fn upload_percent(step: usize, total: usize) -> u8 {
    if total == 0 {
        return SETUP_PERCENT;
    }
    let done = (step as u128 + 1).min(total as u128);
    let band = done * UPLOAD_BAND / total as u128;
    // band <= 80, fits.
    SETUP_PERCENT + band as u8
}

/// Parameters of one simulated sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationPlan {
    pub failing_target_id: Option<String>,
    pub certificate_count: usize,
    pub delays: SyncDelays,
}

impl Default for SimulationPlan {
    fn default() -> Self {
        Self {
            failing_target_id: Some(DEFAULT_FAILING_TARGET.to_string()),
            certificate_count: DEFAULT_CERTIFICATE_COUNT,
            delays: SyncDelays::default(),
        }
    }
}

impl From<&FixtureSettings> for SimulationPlan {
    fn from(settings: &FixtureSettings) -> Self {
        Self {
            failing_target_id: settings.failing_target_id.clone(),
            certificate_count: settings.certificate_count,
            delays: settings.delays.clone(),
        }
    }
}

/// Drives the simulated sync against a progress sink.
#[derive(Debug, Clone, Default)]
pub struct SyncSimulator {
    plan: SimulationPlan,
}

impl SyncSimulator {
    pub fn new(plan: SimulationPlan) -> Self {
        Self { plan }
    }

    /// Whether a sync to `target_id` is scheduled to fail.
    pub fn fails_on(&self, target_id: &str) -> bool {
        self.plan.failing_target_id.as_deref() == Some(target_id)
    }

    /// 0-based upload step at which the failing target errors out.
    pub fn failure_step(&self) -> usize {
        self.plan.certificate_count / 2
    }

    /// Run the simulation for `target_id`.
    ///
    /// `certificates` is accepted for interface compatibility only; the
    /// plan's count drives the loop. Sends [`ProgressEvent::Finished`] last on
    /// every exit path. Cancellation from the host is not observed.
    pub async fn run(
        &self,
        target_id: &str,
        certificates: &[String],
        sink: &dyn ProgressSink,
    ) -> Result<()> {
        let _finish = FinishGuard::arm(sink);
        let total = self.plan.certificate_count;
        let delays = &self.plan.delays;
        let failing = self.fails_on(target_id);

        tracing::info!(
            "Simulating sync to {} ({} certificates requested, {} simulated)",
            target_id,
            certificates.len(),
            total
        );

        emit(
            sink,
            SETUP_PERCENT,
            format!("creating anchors directory on {}", target_id),
        );
        tokio::time::sleep(delays.setup()).await;

        for step in 0..total {
            emit(
                sink,
                upload_percent(step, total),
                format!("({}/{}) uploading certificate to {}", step + 1, total, target_id),
            );
            tokio::time::sleep(delays.per_certificate()).await;

            if failing && step == self.failure_step() {
                tracing::warn!(
                    "Injected sync failure on {} at certificate {}/{}",
                    target_id,
                    step + 1,
                    total
                );
                return Err(FixtureError::SyncFailed {
                    target_id: target_id.to_string(),
                    index: step + 1,
                    total,
                });
            }
        }

        emit(sink, TRUST_STORE_PERCENT, "updating CA trust store".to_string());
        tokio::time::sleep(delays.trust_store()).await;

        emit(sink, RESTART_PERCENT, "restarting services".to_string());
        tokio::time::sleep(delays.restart()).await;

        emit(
            sink,
            DONE_PERCENT,
            format!("synchronized {} certificates to {}", total, target_id),
        );
        tracing::info!("Simulated sync to {} complete", target_id);
        Ok(())
    }
}

fn emit(sink: &dyn ProgressSink, percent: u8, message: String) {
    tracing::debug!("progress {}%: {}", percent, message);
    sink.report(ProgressEvent::report(percent, message));
}
