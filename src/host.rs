//! In-memory host.
//!
//! A recording implementation of the host API. It keeps registered providers,
//! runs progress tasks inline and remembers everything the extension reported
//! so tests and the harness binary can inspect it afterwards. It applies no
//! trust policy; targets come back exactly as the provider declared them.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::api::{
    CertificateSyncTargetProvider, Certificates, Disposable, HostApi, ProgressOptions,
    ProgressSink, ProgressTask, Window,
};
use crate::api::SyncTarget;
use crate::error::{FixtureError, Result};
use crate::sync::progress::ProgressEvent;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Progress sink that keeps every event with the time it arrived.
pub struct RecordingSink {
    started: Instant,
    events: Mutex<Vec<(ProgressEvent, Duration)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        lock(&self.events).iter().map(|(e, _)| e.clone()).collect()
    }

    /// Events paired with their offset from sink creation.
    pub fn timeline(&self) -> Vec<(ProgressEvent, Duration)> {
        lock(&self.events).clone()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, event: ProgressEvent) {
        let at = self.started.elapsed();
        lock(&self.events).push((event, at));
    }
}

/// One finished `with_progress` call.
#[derive(Debug, Clone)]
pub struct ProgressTaskRecord {
    pub options: ProgressOptions,
    pub events: Vec<ProgressEvent>,
    /// `Err` carries the error text the host surfaced to the user.
    pub outcome: std::result::Result<(), String>,
}

type ProviderMap = BTreeMap<String, Arc<dyn CertificateSyncTargetProvider>>;

#[derive(Default)]
struct HostState {
    information_messages: Vec<String>,
    error_messages: Vec<String>,
    progress_tasks: Vec<ProgressTaskRecord>,
}

/// Recording host implementing [`Certificates`] and [`Window`].
#[derive(Clone, Default)]
pub struct MemoryHost {
    providers: Arc<Mutex<ProviderMap>>,
    state: Arc<Mutex<HostState>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capability bundle backed by this host.
    pub fn api(&self) -> HostApi {
        HostApi {
            certificates: Arc::new(self.clone()),
            window: Arc::new(self.clone()),
        }
    }

    pub fn provider(&self, provider_id: &str) -> Option<Arc<dyn CertificateSyncTargetProvider>> {
        lock(&self.providers).get(provider_id).cloned()
    }

    fn registered(&self, provider_id: &str) -> Result<Arc<dyn CertificateSyncTargetProvider>> {
        self.provider(provider_id).ok_or_else(|| {
            FixtureError::Host(format!(
                "no sync target provider registered as {}",
                provider_id
            ))
        })
    }

    /// Ask a registered provider for its targets, as the preferences page would.
    pub async fn targets(&self, provider_id: &str) -> Result<Vec<SyncTarget>> {
        self.registered(provider_id)?.get_targets().await
    }

    /// Dispatch a sync to a registered provider.
    pub async fn synchronize(
        &self,
        provider_id: &str,
        target_id: &str,
        certificates: &[String],
    ) -> Result<()> {
        let provider = self.registered(provider_id)?;
        tracing::debug!("Dispatching sync of {} to {}", target_id, provider_id);
        provider.synchronize(target_id, certificates).await
    }

    pub fn provider_ids(&self) -> Vec<String> {
        lock(&self.providers).keys().cloned().collect()
    }

    pub fn information_messages(&self) -> Vec<String> {
        lock(&self.state).information_messages.clone()
    }

    pub fn error_messages(&self) -> Vec<String> {
        lock(&self.state).error_messages.clone()
    }

    pub fn progress_tasks(&self) -> Vec<ProgressTaskRecord> {
        lock(&self.state).progress_tasks.clone()
    }
}

struct Registration {
    provider_id: String,
    providers: Weak<Mutex<ProviderMap>>,
}

impl Disposable for Registration {
    fn dispose(&self) {
        if let Some(providers) = self.providers.upgrade() {
            if lock(&providers).remove(&self.provider_id).is_some() {
                tracing::debug!("Provider {} unregistered", self.provider_id);
            }
        }
    }
}

impl Certificates for MemoryHost {
    fn register_sync_target_provider(
        &self,
        provider_id: &str,
        provider: Arc<dyn CertificateSyncTargetProvider>,
    ) -> Box<dyn Disposable> {
        if lock(&self.providers)
            .insert(provider_id.to_string(), provider)
            .is_some()
        {
            tracing::warn!("Provider {} re-registered, replacing previous", provider_id);
        }
        Box::new(Registration {
            provider_id: provider_id.to_string(),
            providers: Arc::downgrade(&self.providers),
        })
    }
}

#[async_trait]
impl Window for MemoryHost {
    async fn show_information_message(&self, message: &str) -> Result<()> {
        tracing::info!("[info] {}", message);
        lock(&self.state)
            .information_messages
            .push(message.to_string());
        Ok(())
    }

    async fn with_progress<'a>(
        &self,
        options: ProgressOptions,
        task: ProgressTask<'a>,
    ) -> Result<()> {
        tracing::debug!("Progress task started: {}", options.title);
        let sink = Arc::new(RecordingSink::new());
        let handle: Arc<dyn ProgressSink> = sink.clone();
        let result = task(handle).await;

        let outcome = match &result {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!("Progress task '{}' failed: {}", options.title, e);
                Err(e.to_string())
            }
        };

        let mut state = lock(&self.state);
        if let Err(message) = &outcome {
            state.error_messages.push(message.clone());
        }
        state.progress_tasks.push(ProgressTaskRecord {
            options,
            events: sink.events(),
            outcome,
        });
        result
    }
}
