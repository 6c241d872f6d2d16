//! adlc-cooldown
//!
//! Display cooldown per full-screen ad kind.
//!
//! - [`CooldownTracker`] answers "may this kind be shown now?" from an
//!   in-memory cache that is written through to a [`CooldownStore`].
//! - Stores: [`MemoryCooldownStore`] (process lifetime) and
//!   [`JsonFileCooldownStore`] (survives restarts).
//! - [`CooldownWriter`] moves store IO off async tasks, in order.
//! - [`Clock`] abstracts wall time so callers and tests control `now`.
//!
//! Banner has no cooldown: it is always eligible and never recorded.

mod clock;
mod store;
mod tracker;
mod writer;

pub use clock::{Clock, SystemClock};
pub use store::{CooldownStore, JsonFileCooldownStore, MemoryCooldownStore, STORE_SCHEMA_VERSION};
pub use tracker::CooldownTracker;
pub use writer::CooldownWriter;
