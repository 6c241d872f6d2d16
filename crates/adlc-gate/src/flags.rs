use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::GateFlags;

/// Supplies the current gate flags.
///
/// Called once per gated operation. Implementations must return the value as
/// of the call, so toggles take effect on the next operation.
pub trait FlagSource: Send + Sync {
    fn current(&self) -> GateFlags;
}

/// Fixed flags, e.g. read once from configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticFlags(pub GateFlags);

impl FlagSource for StaticFlags {
    fn current(&self) -> GateFlags {
        self.0
    }
}

/// Runtime-toggleable flags shared between the host and the controller.
///
/// Clones share the same underlying switches.
#[derive(Clone, Debug, Default)]
pub struct SharedFlags {
    ads_enabled: Arc<AtomicBool>,
    privileged_unlock: Arc<AtomicBool>,
    parent_facing: Arc<AtomicBool>,
    test_provider: Arc<AtomicBool>,
}

impl SharedFlags {
    pub fn new(initial: GateFlags) -> Self {
        let s = Self::default();
        s.set_ads_enabled(initial.ads_enabled);
        s.set_privileged_unlock(initial.privileged_unlock);
        s.set_parent_facing(initial.is_parent_facing_context);
        s.test_provider
            .store(initial.using_test_provider, Ordering::SeqCst);
        s
    }

    pub fn set_ads_enabled(&self, v: bool) {
        self.ads_enabled.store(v, Ordering::SeqCst);
    }

    pub fn set_privileged_unlock(&self, v: bool) {
        self.privileged_unlock.store(v, Ordering::SeqCst);
    }

    pub fn set_parent_facing(&self, v: bool) {
        self.parent_facing.store(v, Ordering::SeqCst);
    }
}

impl FlagSource for SharedFlags {
    fn current(&self) -> GateFlags {
        GateFlags {
            ads_enabled: self.ads_enabled.load(Ordering::SeqCst),
            privileged_unlock: self.privileged_unlock.load(Ordering::SeqCst),
            is_parent_facing_context: self.parent_facing.load(Ordering::SeqCst),
            using_test_provider: self.test_provider.load(Ordering::SeqCst),
        }
    }
}
