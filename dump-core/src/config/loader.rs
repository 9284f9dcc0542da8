use std::collections::BTreeMap;
use std::path::Path;

use super::value::ConfigValue;
use super::ConfigError;

/// Flattened `dot.key` → value map.
pub(crate) type Values = BTreeMap<String, ConfigValue>;

/// Read a YAML file into the values map. A missing file is not an error.
pub(crate) fn load_yaml_file(path: &Path, values: &mut Values) -> Result<(), ConfigError> {
    if !path.exists() {
        return Ok(());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    load_yaml_str(&content, values)
}

pub(crate) fn load_yaml_str(content: &str, values: &mut Values) -> Result<(), ConfigError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    flatten_yaml("", &yaml, values);
    Ok(())
}

/// Flatten nested mappings into dot-separated keys; sequences are kept whole.
pub(crate) fn flatten_yaml(prefix: &str, value: &serde_yaml::Value, out: &mut Values) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let segment = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    other => format!("{other:?}"),
                };
                let key = if prefix.is_empty() {
                    segment
                } else {
                    format!("{prefix}.{segment}")
                };
                flatten_yaml(&key, v, out);
            }
        }
        leaf if !prefix.is_empty() => {
            out.insert(prefix.to_string(), ConfigValue::from_yaml(leaf));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_keys_are_flattened() {
        let mut values = Values::new();
        load_yaml_str(
            "database:\n  url: \"sqlite::memory:\"\n  pool:\n    max: 4\n",
            &mut values,
        )
        .unwrap();
        assert_eq!(
            values.get("database.url"),
            Some(&ConfigValue::String("sqlite::memory:".into()))
        );
        assert_eq!(values.get("database.pool.max"), Some(&ConfigValue::Integer(4)));
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let mut values = Values::new();
        load_yaml_file(Path::new("does-not-exist.yaml"), &mut values).unwrap();
        assert!(values.is_empty());
    }
}
