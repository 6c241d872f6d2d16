//! Banner supervisor bookkeeping.
//!
//! Banners have no state machine, no retry and no cooldown. Each created
//! surface gets exactly one load: immediately if the SDK is ready,
//! otherwise once when readiness arrives.

use adlc_schemas::SurfaceHandle;

#[derive(Debug, Default)]
pub(crate) struct BannerSupervisor {
    created: usize,
    deferred: Vec<SurfaceHandle>,
}

impl BannerSupervisor {
    /// Register a new surface. Returns it back when its load should be
    /// issued now; otherwise the load is parked until [`take_deferred`].
    ///
    /// [`take_deferred`]: BannerSupervisor::take_deferred
    pub(crate) fn surface_created(
        &mut self,
        surface: SurfaceHandle,
        sdk_ready: bool,
    ) -> Option<SurfaceHandle> {
        self.created += 1;
        if sdk_ready {
            Some(surface)
        } else {
            self.deferred.push(surface);
            None
        }
    }

    /// Parked loads, each returned exactly once.
    pub(crate) fn take_deferred(&mut self) -> Vec<SurfaceHandle> {
        std::mem::take(&mut self.deferred)
    }

    pub(crate) fn surface_count(&self) -> usize {
        self.created
    }

    pub(crate) fn deferred_count(&self) -> usize {
        self.deferred.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deferred_load_is_released_once() {
        let mut b = BannerSupervisor::default();
        assert_eq!(b.surface_created(SurfaceHandle::new("s1"), false), None);
        assert_eq!(b.deferred_count(), 1);
        assert_eq!(b.take_deferred(), vec![SurfaceHandle::new("s1")]);
        assert!(b.take_deferred().is_empty());
        assert_eq!(b.surface_count(), 1);
    }

    #[test]
    fn ready_sdk_loads_immediately() {
        let mut b = BannerSupervisor::default();
        let s = SurfaceHandle::new("s2");
        assert_eq!(b.surface_created(s.clone(), true), Some(s));
        assert_eq!(b.surface_created(SurfaceHandle::new("s3"), true), Some(SurfaceHandle::new("s3")));
        assert_eq!(b.deferred_count(), 0);
        assert_eq!(b.surface_count(), 2);
    }
}
