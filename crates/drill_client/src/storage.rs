use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A storage plugin as listed by `/storage.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoragePlugin {
    pub name: String,
    /// Plugin specific configuration, kept as returned by drill.
    #[serde(default)]
    pub config: Value,
}

impl StoragePlugin {
    /// Whether `config.enabled` is set to a truthy value.
    ///
    /// Older drill versions report the flag as `0`/`1` rather than a bool.
    pub fn is_enabled(&self) -> bool {
        match self.config.get("enabled") {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => !matches!(s.as_str(), "" | "0" | "false"),
            _ => false,
        }
    }

    /// The `type` field of the plugin config, e.g. `file` or `jdbc`.
    pub fn config_type(&self) -> Option<&str> {
        self.config.get("type").and_then(Value::as_str)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToggleResponse {
    pub result: Option<String>,
}

impl ToggleResponse {
    pub fn is_success(&self) -> bool {
        self.result.as_deref() == Some("success")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn plugin(config: Value) -> StoragePlugin {
        StoragePlugin {
            name: "dfs".to_string(),
            config,
        }
    }

    #[test]
    fn enabled_flag_values() {
        assert!(plugin(json!({"enabled": true})).is_enabled());
        assert!(plugin(json!({"enabled": 1})).is_enabled());
        assert!(plugin(json!({"enabled": "true"})).is_enabled());

        assert!(!plugin(json!({"enabled": false})).is_enabled());
        assert!(!plugin(json!({"enabled": 0})).is_enabled());
        assert!(!plugin(json!({"enabled": "0"})).is_enabled());
        assert!(!plugin(json!({"enabled": null})).is_enabled());
        assert!(!plugin(json!({})).is_enabled());
        assert!(!plugin(Value::Null).is_enabled());
    }

    #[test]
    fn deserialize_listing() {
        let plugins: Vec<StoragePlugin> = serde_json::from_value(json!([
            {"name": "cp", "config": {"type": "file", "enabled": true}},
            {"name": "mongo", "config": {"type": "mongo", "enabled": false}},
        ]))
        .unwrap();

        assert_eq!(2, plugins.len());
        assert_eq!(Some("file"), plugins[0].config_type());
        assert!(plugins[0].is_enabled());
        assert!(!plugins[1].is_enabled());
    }

    #[test]
    fn toggle_result() {
        let ok: ToggleResponse = serde_json::from_value(json!({"result": "success"})).unwrap();
        assert!(ok.is_success());

        let failed: ToggleResponse =
            serde_json::from_value(json!({"result": "error (unable to enable)"})).unwrap();
        assert!(!failed.is_success());

        let empty: ToggleResponse = serde_json::from_value(json!({})).unwrap();
        assert!(!empty.is_success());
    }
}
