pub mod api;
pub mod catalog;
mod error;
pub mod host;
pub mod provider;
pub mod settings;
pub mod sync;

use std::sync::Arc;

pub use api::{ExtensionContext, HostApi, SyncTarget};
pub use error::{FixtureError, Result};
pub use provider::TestCertificateSyncProvider;
pub use settings::FixtureSettings;

/// Provider id the fixture registers under.
pub const PROVIDER_ID: &str = "test-external-provider";

/// Install the fmt subscriber. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("certsync_provider_test=info")
            }),
        )
        .try_init();
}

/// Register the test provider with the host and keep the registration in
/// `context` so the host can release it on unload.
pub fn activate(context: &mut ExtensionContext, host: &HostApi, settings: &FixtureSettings) {
    tracing::info!("Starting certificate sync provider test extension");

    let provider = Arc::new(TestCertificateSyncProvider::new(
        settings,
        host.window.clone(),
    ));
    let registration = host
        .certificates
        .register_sync_target_provider(PROVIDER_ID, provider);
    context.subscriptions.push(registration);

    tracing::info!("Registered certificate sync provider \"{}\"", PROVIDER_ID);
    tracing::info!(
        "Targets should appear DISABLED in Certificates Preferences if loaded as external extension"
    );
}

pub fn deactivate() {
    tracing::info!("Certificate sync provider test extension deactivated");
}

/// Harness entry point: activate inside the in-memory host, sync every target
/// the provider advertises, then unload.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();
    tracing::info!("Starting certsync-provider-test v{}", env!("CARGO_PKG_VERSION"));

    let settings_path = FixtureSettings::default_path();
    let settings = FixtureSettings::load(&settings_path);
    tracing::info!(
        "Fixture settings: catalog={:?} mode={:?} failing_target={:?}",
        settings.catalog,
        settings.mode,
        settings.failing_target_id
    );

    let host = host::MemoryHost::new();
    let mut context = ExtensionContext::new();
    activate(&mut context, &host.api(), &settings);

    let mut failures = 0usize;
    for target in host.targets(PROVIDER_ID).await? {
        if target.is_declared_disabled() {
            tracing::info!(
                "Skipping {} ({})",
                target.id,
                target.disabled_reason.as_deref().unwrap_or("disabled")
            );
            continue;
        }
        match host.synchronize(PROVIDER_ID, &target.id, &[]).await {
            Ok(()) => tracing::info!("Sync to {} succeeded", target.id),
            Err(e) => {
                failures += 1;
                tracing::warn!("Sync to {} failed: {}", target.id, e);
            }
        }
    }

    context.dispose_all();
    deactivate();
    tracing::info!(
        "Harness finished: {} progress tasks, {} failed",
        host.progress_tasks().len(),
        failures
    );
    Ok(())
}
