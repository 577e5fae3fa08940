pub mod orchestrator;

pub use orchestrator::{DiscoveryOptions, DiscoveryOrchestrator, DiscoveryOutcome, DiscoveryTaskDescriptor, ExtrasPolicy};
