use std::time::Duration;

/// A single configuration value as read from YAML or the environment.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
    List(Vec<ConfigValue>),
}

impl ConfigValue {
    pub(crate) fn from_yaml(value: &serde_yaml::Value) -> Self {
        use serde_yaml::Value as Yaml;
        match value {
            Yaml::Null => Self::Null,
            Yaml::Bool(b) => Self::Bool(*b),
            Yaml::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or_else(|| Self::String(n.to_string())),
            Yaml::String(s) => Self::String(s.clone()),
            Yaml::Sequence(items) => Self::List(items.iter().map(Self::from_yaml).collect()),
            other => Self::String(format!("{other:?}")),
        }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.trim()),
            _ => None,
        }
    }
}

/// Conversion from a raw [`ConfigValue`]. `None` means the value has the wrong
/// shape; the caller turns it into [`ConfigError::TypeMismatch`](super::ConfigError)
/// naming [`KIND`](Self::KIND).
pub trait FromConfigValue: Sized {
    const KIND: &'static str;

    fn from_config_value(value: &ConfigValue) -> Option<Self>;
}

impl FromConfigValue for String {
    const KIND: &'static str = "string";

    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        Some(match value {
            ConfigValue::String(s) => s.clone(),
            ConfigValue::Integer(i) => i.to_string(),
            ConfigValue::Float(f) => f.to_string(),
            ConfigValue::Bool(b) => b.to_string(),
            ConfigValue::Null | ConfigValue::List(_) => return None,
        })
    }
}

impl FromConfigValue for i64 {
    const KIND: &'static str = "integer";

    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Integer(i) => Some(*i),
            other => other.as_text()?.parse().ok(),
        }
    }
}

impl FromConfigValue for f64 {
    const KIND: &'static str = "number";

    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Integer(i) => Some(*i as f64),
            other => other.as_text()?.parse().ok(),
        }
    }
}

impl FromConfigValue for bool {
    const KIND: &'static str = "boolean";

    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        if let ConfigValue::Bool(b) = value {
            return Some(*b);
        }
        match value.as_text()?.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

/// Whole seconds.
impl FromConfigValue for Duration {
    const KIND: &'static str = "duration in seconds";

    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        u64::from_config_value(value).map(Duration::from_secs)
    }
}

impl<T: FromConfigValue> FromConfigValue for Option<T> {
    const KIND: &'static str = T::KIND;

    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Null => Some(None),
            other => T::from_config_value(other).map(Some),
        }
    }
}

/// A YAML sequence, or a comma-separated string as set through the environment.
impl<T: FromConfigValue> FromConfigValue for Vec<T> {
    const KIND: &'static str = "list";

    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::List(items) => items.iter().map(T::from_config_value).collect(),
            ConfigValue::String(s) => s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| T::from_config_value(&ConfigValue::String(part.to_owned())))
                .collect(),
            single => T::from_config_value(single).map(|item| vec![item]),
        }
    }
}

macro_rules! narrow_int {
    ($($ty:ty),+) => {$(
        impl FromConfigValue for $ty {
            const KIND: &'static str = stringify!($ty);

            fn from_config_value(value: &ConfigValue) -> Option<Self> {
                i64::from_config_value(value).and_then(|wide| <$ty>::try_from(wide).ok())
            }
        }
    )+};
}

narrow_int!(u16, u32, u64, i32, usize);
