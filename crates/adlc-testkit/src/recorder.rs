use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use adlc_schemas::Reward;

/// Counts dismissal callbacks and collects rewards for one or more show
/// requests.
#[derive(Clone, Default, Debug)]
pub struct CallbackRecorder {
    dismissed: Arc<AtomicUsize>,
    rewards: Arc<Mutex<Vec<Reward>>>,
}

impl CallbackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_dismissed(&self) -> impl FnOnce() + Send + 'static {
        let dismissed = self.dismissed.clone();
        move || {
            dismissed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn on_reward(&self) -> impl FnOnce(Reward) + Send + 'static {
        let rewards = self.rewards.clone();
        move |r| rewards.lock().unwrap_or_else(|p| p.into_inner()).push(r)
    }

    pub fn dismissed(&self) -> usize {
        self.dismissed.load(Ordering::SeqCst)
    }

    pub fn rewards(&self) -> Vec<Reward> {
        self.rewards
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}
