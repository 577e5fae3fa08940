//! Structured logging installed once at process startup, grounded on
//! `aion_core::logging::init_logging`: an `EnvFilter` seeded from a global
//! level plus per-module overrides, feeding one of three `tracing_subscriber`
//! formatters. Never called by a library crate — only by this composition
//! root, exactly once.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub module_levels: HashMap<String, String>,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), module_levels: HashMap::new(), format: LogFormat::Pretty }
    }
}

pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let mut filter = EnvFilter::from_default_env()
        .add_directive(config.level.parse().unwrap_or_else(|_| LevelFilter::INFO.into()));

    for (module, level) in &config.module_levels {
        let directive = format!("{module}={level}");
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    match config.format {
        LogFormat::Json => {
            let subscriber = Registry::default().with(filter).with(fmt::layer().json());
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Pretty => {
            let subscriber = Registry::default().with(filter).with(fmt::layer().pretty());
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Compact => {
            let subscriber = Registry::default().with(filter).with(fmt::layer().compact());
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}
