//! # dump-core
//!
//! Shared runtime pieces for the dump persistence layer: layered
//! configuration ([`DumpConfig`]) and tracing initialisation
//! ([`init_tracing`]).

pub mod config;
pub mod logging;

pub use config::{ConfigError, ConfigProperties, ConfigValue, DumpConfig, FromConfigValue};
pub use logging::{init_tracing, LogFormat, LoggingConfig};
