// Certsync host API
//
// Capabilities the fixture consumes from the host application. The host owns
// every implementation: provider registry, trust filtering, the progress
// widget and notifications. This module only fixes the shape of the seam.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sync::progress::ProgressEvent;

/// A named destination a provider can push certificates to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTarget {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Requested state. The host may override it based on trust policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_reason: Option<String>,
}

impl SyncTarget {
    /// Target with no `enabled` flag; host defaults apply.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: None,
            disabled_reason: None,
        }
    }

    pub fn enabled(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            enabled: Some(true),
            ..Self::new(id, name)
        }
    }

    pub fn disabled(
        id: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            enabled: Some(false),
            disabled_reason: Some(reason.into()),
            ..Self::new(id, name)
        }
    }

    /// Whether the target was explicitly declared disabled.
    pub fn is_declared_disabled(&self) -> bool {
        self.enabled == Some(false)
    }
}

/// Where the host renders a progress task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressLocation {
    TaskWidget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressOptions {
    pub location: ProgressLocation,
    pub title: String,
}

/// Receives progress reports from a running task.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Body of a host progress task; receives the sink the host renders.
pub type ProgressTask<'a> =
    Box<dyn FnOnce(Arc<dyn ProgressSink>) -> BoxFuture<'a, Result<()>> + Send + 'a>;

/// Box an async closure into a [`ProgressTask`].
pub fn progress_task<'a, F, Fut>(task: F) -> ProgressTask<'a>
where
    F: FnOnce(Arc<dyn ProgressSink>) -> Fut + Send + 'a,
    Fut: Future<Output = Result<()>> + Send + 'a,
{
    Box::new(move |sink| task(sink).boxed())
}

/// Window-level host capabilities.
#[async_trait]
pub trait Window: Send + Sync {
    async fn show_information_message(&self, message: &str) -> Result<()>;

    /// Run `task` under a host progress widget and return its outcome.
    async fn with_progress<'a>(
        &self,
        options: ProgressOptions,
        task: ProgressTask<'a>,
    ) -> Result<()>;
}

/// The provider contract the host calls into.
#[async_trait]
pub trait CertificateSyncTargetProvider: Send + Sync {
    async fn get_targets(&self) -> Result<Vec<SyncTarget>>;

    async fn synchronize(&self, target_id: &str, certificates: &[String]) -> Result<()>;
}

/// Handle to a host-side resource, released on dispose.
pub trait Disposable: Send + Sync {
    fn dispose(&self);
}

/// Host provider registry.
pub trait Certificates: Send + Sync {
    fn register_sync_target_provider(
        &self,
        provider_id: &str,
        provider: Arc<dyn CertificateSyncTargetProvider>,
    ) -> Box<dyn Disposable>;
}

/// Capabilities handed to the extension at activation.
#[derive(Clone)]
pub struct HostApi {
    pub certificates: Arc<dyn Certificates>,
    pub window: Arc<dyn Window>,
}

/// Per-activation state. The host disposes the subscriptions on unload.
#[derive(Default)]
pub struct ExtensionContext {
    pub subscriptions: Vec<Box<dyn Disposable>>,
}

impl ExtensionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release every subscription in registration order.
    pub fn dispose_all(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(Arc<AtomicUsize>);

    impl Disposable for Counter {
        fn dispose(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_target_serialization_omits_missing_flags() {
        let json = serde_json::to_value(SyncTarget::new("a", "A")).unwrap();
        assert_eq!(json, serde_json::json!({ "id": "a", "name": "A" }));
    }

    #[test]
    fn test_disabled_target_serializes_camel_case() {
        let json = serde_json::to_value(SyncTarget::disabled("a", "A", "nope")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "a",
                "name": "A",
                "enabled": false,
                "disabledReason": "nope"
            })
        );
    }

    #[test]
    fn test_progress_location_wire_name() {
        let json = serde_json::to_string(&ProgressLocation::TaskWidget).unwrap();
        assert_eq!(json, "\"TASK_WIDGET\"");
    }

    #[test]
    fn test_dispose_all_drains_subscriptions() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut context = ExtensionContext::new();
        context.subscriptions.push(Box::new(Counter(count.clone())));
        context.subscriptions.push(Box::new(Counter(count.clone())));

        context.dispose_all();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(context.subscriptions.is_empty());

        context.dispose_all();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
