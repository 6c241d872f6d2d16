use adlc_schemas::AdKind;

/// Flags sampled at call time. Read-only to the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GateFlags {
    pub ads_enabled: bool,
    pub privileged_unlock: bool,
    pub is_parent_facing_context: bool,
    pub using_test_provider: bool,
}

/// Operation being gated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Provider SDK initialisation. Not tied to a screen, so not parent-facing-gated.
    Initialize,
    Load(AdKind),
    Show(AdKind),
    CreateBanner,
}

impl Operation {
    /// `true` when the operation may only run in a parent-facing context.
    pub fn is_parent_facing_gated(&self) -> bool {
        !matches!(self, Operation::Initialize)
    }
}

/// Why an operation was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateRefusal {
    PrivilegedUnlock,
    AdsDisabled,
    NotParentFacing,
}

impl GateRefusal {
    /// `true` when the refusal comes from a build/runtime mode in which real
    /// ads are bypassed entirely (as opposed to a per-screen refusal).
    /// Callers substitute the fake-reward path for these.
    pub fn bypasses_ads(&self) -> bool {
        matches!(self, GateRefusal::PrivilegedUnlock | GateRefusal::AdsDisabled)
    }
}

impl std::fmt::Display for GateRefusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateRefusal::PrivilegedUnlock => write!(f, "GATE_REFUSED: privileged unlock active"),
            GateRefusal::AdsDisabled => write!(f, "GATE_REFUSED: ads disabled"),
            GateRefusal::NotParentFacing => {
                write!(f, "GATE_REFUSED: not a parent-facing context")
            }
        }
    }
}

impl std::error::Error for GateRefusal {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateVerdict {
    Allow,
    Deny(GateRefusal),
}

impl GateVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateVerdict::Allow)
    }

    pub fn refusal(&self) -> Option<GateRefusal> {
        match self {
            GateVerdict::Allow => None,
            GateVerdict::Deny(r) => Some(*r),
        }
    }
}
