//! Static sync targets advertised by the test provider.

use serde::{Deserialize, Serialize};

use crate::api::SyncTarget;

/// Which target list the provider advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogVariant {
    /// Targets carry an explicit `enabled` flag (one of them pre-disabled).
    /// Exercises the host forcing external targets to disabled.
    Declared,
    /// Targets carry no `enabled` flag at all, leaving host defaults in charge.
    /// Exercises the host hiding untrusted targets entirely.
    Undeclared,
}

pub const DISABLED_TARGET_ID: &str = "test-target-disabled";
pub const DISABLED_REASON: &str = "Intentionally disabled by provider";

/// Targets for the given variant. Same order on every call.
pub fn targets(variant: CatalogVariant) -> Vec<SyncTarget> {
    match variant {
        CatalogVariant::Declared => vec![
            SyncTarget::enabled("test-target-1", "Test Target 1 (External)"),
            SyncTarget::enabled("test-target-2", "Test Target 2 (External)"),
            SyncTarget::disabled(
                DISABLED_TARGET_ID,
                "Test Target (Already Disabled)",
                DISABLED_REASON,
            ),
        ],
        CatalogVariant::Undeclared => vec![
            SyncTarget::new("test-target-success", "Test Target (Succeeds)"),
            SyncTarget::new("test-target-fail", "Test Target (Fails Halfway)"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_targets() {
        let targets = targets(CatalogVariant::Declared);
        let ids: Vec<&str> = targets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["test-target-1", "test-target-2", "test-target-disabled"]
        );
        assert_eq!(targets[0].enabled, Some(true));
        assert_eq!(targets[1].enabled, Some(true));
    }

    #[test]
    fn test_disabled_target_keeps_reason() {
        let targets = targets(CatalogVariant::Declared);
        let disabled = targets.iter().find(|t| t.id == DISABLED_TARGET_ID).unwrap();
        assert_eq!(disabled.enabled, Some(false));
        assert!(!disabled.disabled_reason.as_deref().unwrap_or("").is_empty());
    }

    #[test]
    fn test_undeclared_targets_have_no_flag() {
        let targets = targets(CatalogVariant::Undeclared);
        assert!(!targets.is_empty());
        assert!(targets.iter().all(|t| t.enabled.is_none()));
        assert!(targets.iter().all(|t| t.disabled_reason.is_none()));
    }

    #[test]
    fn test_targets_are_stable() {
        for variant in [CatalogVariant::Declared, CatalogVariant::Undeclared] {
            assert_eq!(targets(variant), targets(variant));
        }
    }
}
