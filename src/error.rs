use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("simulated sync failure on {target_id} at certificate {index}/{total}")]
    SyncFailed {
        target_id: String,
        index: usize,
        total: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Host error: {0}")]
    Host(String),
}

impl serde::Serialize for FixtureError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FixtureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_failed_message_names_target_and_index() {
        let err = FixtureError::SyncFailed {
            target_id: "test-target-fail".into(),
            index: 39,
            total: 77,
        };
        let msg = err.to_string();
        assert!(msg.contains("test-target-fail"));
        assert!(msg.contains("39/77"));
    }

    #[test]
    fn test_serializes_as_display_string() {
        let err = FixtureError::Host("window closed".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Host error: window closed\"");
    }
}
