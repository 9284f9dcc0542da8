mod loader;
pub mod typed;
pub mod value;

use std::path::Path;

use loader::Values;
pub use typed::ConfigProperties;
pub use value::{ConfigValue, FromConfigValue};

/// Environment variable selecting the active profile.
pub const PROFILE_ENV: &str = "DUMP_PROFILE";

/// Failure to load or read configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// No value under this key.
    NotFound(String),
    TypeMismatch { key: String, expected: &'static str },
    /// A file could not be read or is not valid YAML.
    Load(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "missing config key `{key}`"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "config key `{key}` is not a valid {expected}")
            }
            ConfigError::Load(msg) => write!(f, "failed to load config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Flattened dot-key configuration.
///
/// Sources, later ones winning:
/// 1. `application.yaml`
/// 2. `application-{profile}.yaml`
/// 3. `.env`, then `.env.{profile}`, both loaded into the process environment
///    without replacing variables that are already set
/// 4. the process environment, `DATABASE_URL` becoming `database.url`
///
/// The profile argument is replaced by `DUMP_PROFILE` when that is set.
#[derive(Debug, Clone)]
pub struct DumpConfig {
    values: Values,
    profile: String,
}

impl DumpConfig {
    /// Load from the current working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."), profile)
    }

    pub fn load_from_dir(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let profile = std::env::var(PROFILE_ENV).unwrap_or_else(|_| profile.to_string());

        let mut values = Values::new();
        for file in ["application.yaml".to_string(), format!("application-{profile}.yaml")] {
            loader::load_yaml_file(&dir.join(file), &mut values)?;
        }
        for file in [".env".to_string(), format!(".env.{profile}")] {
            if dotenvy::from_path(dir.join(&file)).is_ok() {
                tracing::trace!(file = %file, "env file loaded");
            }
        }
        overlay_env(&mut values);

        tracing::debug!(profile = %profile, keys = values.len(), "configuration loaded");
        Ok(Self { values, profile })
    }

    /// Parse a YAML document directly, without files or environment.
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = Values::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(Self {
            values,
            profile: profile.to_string(),
        })
    }

    pub fn empty() -> Self {
        Self {
            values: Values::new(),
            profile: "test".to_string(),
        }
    }

    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Typed value under a dot-separated key such as `database.url`.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        match self.values.get(key) {
            Some(value) => V::from_config_value(value).ok_or_else(|| ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: V::KIND,
            }),
            None => Err(ConfigError::NotFound(key.to_string())),
        }
    }

    /// Like [`get`](Self::get), with `default` on a missing or unreadable value.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Read a typed section, e.g. `config.section::<DatabaseConfig>()`.
    pub fn section<C: ConfigProperties>(&self) -> Result<C, ConfigError> {
        C::from_config(self)
    }
}

/// `DATABASE_URL=...` becomes `database.url`. Every `_` maps to `.`, and the
/// name is also stored with only the first `_` mapped, so
/// `DATABASE_MAX_CONNECTIONS` sets both `database.max.connections` and
/// `database.max_connections`.
fn overlay_env(values: &mut Values) {
    for (name, raw) in std::env::vars() {
        for key in env_keys(&name) {
            values.insert(key, ConfigValue::String(raw.clone()));
        }
    }
}

fn env_keys(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();
    let dotted = lower.replace('_', ".");
    match lower.split_once('_') {
        Some((section, rest)) if rest.contains('_') => {
            vec![dotted, format!("{section}.{rest}")]
        }
        _ => vec![dotted],
    }
}
