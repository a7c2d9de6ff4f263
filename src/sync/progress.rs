//! Progress events and the guard that finalizes a progress task.

use serde::{Deserialize, Serialize};

use crate::api::ProgressSink;

/// Wire value telling the host progress widget to detach.
pub const TERMINAL_SENTINEL: i32 = -1;

/// One report sent to the host's progress sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ProgressReport", try_from = "ProgressReport")]
pub enum ProgressEvent {
    /// Sets the displayed percentage (absolute, not an increment).
    Report { message: Option<String>, percent: u8 },
    /// Task finished; emitted once on every exit path.
    Finished,
}

impl ProgressEvent {
    pub fn report(percent: u8, message: impl Into<String>) -> Self {
        Self::Report {
            message: Some(message.into()),
            percent,
        }
    }

    /// The value the host receives in its `increment` field.
    pub fn increment(&self) -> i32 {
        match self {
            Self::Report { percent, .. } => i32::from(*percent),
            Self::Finished => TERMINAL_SENTINEL,
        }
    }

    pub fn percent(&self) -> Option<u8> {
        match self {
            Self::Report { percent, .. } => Some(*percent),
            Self::Finished => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Report { message, .. } => message.as_deref(),
            Self::Finished => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// Host payload shape: `{ message?, increment? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment: Option<i32>,
}

impl From<ProgressEvent> for ProgressReport {
    fn from(event: ProgressEvent) -> Self {
        let increment = Some(event.increment());
        match event {
            ProgressEvent::Report { message, .. } => Self { message, increment },
            ProgressEvent::Finished => Self {
                message: None,
                increment,
            },
        }
    }
}

impl TryFrom<ProgressReport> for ProgressEvent {
    type Error = String;

    fn try_from(report: ProgressReport) -> Result<Self, Self::Error> {
        match report.increment {
            Some(TERMINAL_SENTINEL) => Ok(Self::Finished),
            Some(value) => u8::try_from(value)
                .ok()
                .filter(|percent| *percent <= 100)
                .map(|percent| Self::Report {
                    message: report.message,
                    percent,
                })
                .ok_or_else(|| format!("progress increment out of range: {}", value)),
            None => Err("progress report without increment".to_string()),
        }
    }
}

/// Emits [`ProgressEvent::Finished`] when dropped.
///
/// Arm it before the first report; whichever way the task exits (return,
/// `?`, or the future being dropped) the sentinel goes out exactly once.
pub struct FinishGuard<'a> {
    sink: &'a dyn ProgressSink,
}

impl<'a> FinishGuard<'a> {
    pub fn arm(sink: &'a dyn ProgressSink) -> Self {
        Self { sink }
    }
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.sink.report(ProgressEvent::Finished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct VecSink(Mutex<Vec<ProgressEvent>>);

    impl ProgressSink for VecSink {
        fn report(&self, event: ProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_report_wire_format() {
        let json = serde_json::to_value(ProgressEvent::report(5, "hello")).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "hello", "increment": 5 }));
    }

    #[test]
    fn test_finished_wire_format() {
        let json = serde_json::to_value(ProgressEvent::Finished).unwrap();
        assert_eq!(json, serde_json::json!({ "increment": -1 }));
        assert_eq!(ProgressEvent::Finished.increment(), TERMINAL_SENTINEL);
    }

    #[test]
    fn test_parse_host_payload() {
        let event: ProgressEvent = serde_json::from_str(r#"{"increment":-1}"#).unwrap();
        assert!(event.is_finished());

        let event: ProgressEvent =
            serde_json::from_str(r#"{"message":"x","increment":42}"#).unwrap();
        assert_eq!(event.percent(), Some(42));
        assert_eq!(event.message(), Some("x"));

        assert!(serde_json::from_str::<ProgressEvent>(r#"{"increment":101}"#).is_err());
        assert!(serde_json::from_str::<ProgressEvent>(r#"{"message":"x"}"#).is_err());
    }

    #[test]
    fn test_guard_emits_once_on_drop() {
        let sink = VecSink::default();
        {
            let _guard = FinishGuard::arm(&sink);
            sink.report(ProgressEvent::report(10, "working"));
        }
        let events = sink.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[1].is_finished());
    }

    #[test]
    fn test_guard_emits_on_early_error() {
        fn fails(sink: &dyn ProgressSink) -> Result<(), &'static str> {
            let _guard = FinishGuard::arm(sink);
            let step: Result<(), &'static str> = Err("boom");
            step?;
            Ok(())
        }

        let sink = VecSink::default();
        assert!(fails(&sink).is_err());
        let events = sink.0.lock().unwrap();
        assert_eq!(events.as_slice(), &[ProgressEvent::Finished]);
    }
}
