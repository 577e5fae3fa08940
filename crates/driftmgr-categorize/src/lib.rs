pub mod categorizer;
pub mod scoring;
pub mod tables;

pub use categorizer::{categorize, CategorizationContext};
pub use scoring::{import_command, score_import_candidate};
