pub mod bus;
pub mod event;
pub mod job_registry;

pub use bus::{EventBus, EventHandler, SubscriptionToken};
pub use event::{DiscoveryProgress, Event, EventType};
pub use job_registry::JobRegistry;
