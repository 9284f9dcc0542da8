use super::{ConfigError, DumpConfig};

/// Trait for strongly-typed configuration sections.
///
/// ```ignore
/// impl ConfigProperties for DatabaseConfig {
///     fn prefix() -> &'static str { "database" }
///
///     fn from_config(config: &DumpConfig) -> Result<Self, ConfigError> {
///         Ok(Self {
///             url: config.get("database.url")?,
///             max_connections: config.get_or("database.max_connections", 10),
///         })
///     }
/// }
/// ```
pub trait ConfigProperties: Sized {
    /// The configuration key prefix (e.g., `"database"`).
    fn prefix() -> &'static str;

    /// Construct from a `DumpConfig` instance.
    fn from_config(config: &DumpConfig) -> Result<Self, ConfigError>;

    /// Absolute key for a property of this section.
    fn key(property: &str) -> String {
        format!("{}.{property}", Self::prefix())
    }
}
