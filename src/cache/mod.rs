//! Cache module
//!
//! Read-through TTL cache and the event bus that invalidates it.

pub mod bus;
pub mod clock;
pub mod ttl;

pub use bus::{ClosingEventBus, Subscriber};
pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl::TtlCache;
