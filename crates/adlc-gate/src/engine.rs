use crate::{GateFlags, GateRefusal, GateVerdict, Operation};

/// Evaluate the gate rules in order; the first matching rule wins.
pub fn evaluate(flags: &GateFlags, op: Operation) -> GateVerdict {
    if flags.privileged_unlock {
        return GateVerdict::Deny(GateRefusal::PrivilegedUnlock);
    }
    if !flags.ads_enabled {
        return GateVerdict::Deny(GateRefusal::AdsDisabled);
    }
    if op.is_parent_facing_gated() && !flags.is_parent_facing_context {
        return GateVerdict::Deny(GateRefusal::NotParentFacing);
    }
    GateVerdict::Allow
}

/// Boolean form of [`evaluate`].
pub fn allowed(flags: &GateFlags, op: Operation) -> bool {
    evaluate(flags, op).is_allowed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adlc_schemas::AdKind;

    fn open() -> GateFlags {
        GateFlags {
            ads_enabled: true,
            privileged_unlock: false,
            is_parent_facing_context: true,
            using_test_provider: false,
        }
    }

    #[test]
    fn all_clear_allows_every_operation() {
        for op in [
            Operation::Initialize,
            Operation::Load(AdKind::Interstitial),
            Operation::Show(AdKind::Rewarded),
            Operation::CreateBanner,
        ] {
            assert_eq!(evaluate(&open(), op), GateVerdict::Allow);
        }
    }

    #[test]
    fn unlock_wins_over_disabled() {
        let flags = GateFlags {
            privileged_unlock: true,
            ads_enabled: false,
            ..open()
        };
        assert_eq!(
            evaluate(&flags, Operation::Load(AdKind::Rewarded)),
            GateVerdict::Deny(GateRefusal::PrivilegedUnlock)
        );
    }

    #[test]
    fn disabled_denies_initialize() {
        let flags = GateFlags {
            ads_enabled: false,
            ..open()
        };
        assert_eq!(
            evaluate(&flags, Operation::Initialize),
            GateVerdict::Deny(GateRefusal::AdsDisabled)
        );
    }

    #[test]
    fn disabled_wins_over_parent_facing() {
        let flags = GateFlags {
            ads_enabled: false,
            is_parent_facing_context: false,
            ..open()
        };
        assert_eq!(
            evaluate(&flags, Operation::Show(AdKind::Interstitial)),
            GateVerdict::Deny(GateRefusal::AdsDisabled)
        );
    }

    #[test]
    fn child_context_denies_gated_ops_but_not_initialize() {
        let flags = GateFlags {
            is_parent_facing_context: false,
            ..open()
        };
        assert!(allowed(&flags, Operation::Initialize));
        assert_eq!(
            evaluate(&flags, Operation::CreateBanner),
            GateVerdict::Deny(GateRefusal::NotParentFacing)
        );
        assert!(!allowed(&flags, Operation::Load(AdKind::Interstitial)));
    }

    #[test]
    fn test_provider_flag_does_not_gate() {
        let flags = GateFlags {
            using_test_provider: true,
            ..open()
        };
        assert!(allowed(&flags, Operation::Show(AdKind::Rewarded)));
    }
}
