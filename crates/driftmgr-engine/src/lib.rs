pub mod logging;
pub mod manager;

pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use manager::DriftManager;
