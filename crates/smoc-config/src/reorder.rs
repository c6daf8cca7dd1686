use anyhow::{bail, Result};
use serde_json::Value;
use smoc_field::ControllerConfig;

pub use smoc_field::DEFAULT_ACTION;

pub const ENV_ENDPOINT: &str = "SMOC_ENDPOINT";
pub const ENV_RECORD_TYPE: &str = "SMOC_RECORD_TYPE";

/// Page context for a reorder session.
///
/// `record_type` and `endpoint` stay optional here: a page rendered without
/// them is a real installation fault, and it is the controller that turns
/// it into disabled fields and a diagnostic, not the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderConfig {
    pub record_type: Option<String>,
    pub endpoint: Option<String>,
    pub action: String,
}

impl ReorderConfig {
    /// Build from canonical config JSON (produced by the loader).
    ///
    /// Optional:
    /// - reorder.record_type
    /// - reorder.endpoint
    /// - reorder.action; default=smoc_reorder
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let record_type = optional_str(cfg, "/reorder/record_type")?;
        let endpoint = optional_str(cfg, "/reorder/endpoint")?;
        let action = optional_str(cfg, "/reorder/action")?
            .unwrap_or_else(|| DEFAULT_ACTION.to_string());

        if action.trim().is_empty() {
            bail!("reorder.action must not be empty");
        }

        Ok(Self {
            record_type,
            endpoint,
            action,
        })
    }

    /// Apply `SMOC_ENDPOINT` / `SMOC_RECORD_TYPE` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|k| std::env::var(k).ok())
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty(ENV_ENDPOINT) {
            self.endpoint = Some(v);
        }
        if let Some(v) = non_empty(ENV_RECORD_TYPE) {
            self.record_type = Some(v);
        }
        self
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::new(
            self.record_type.clone().unwrap_or_default(),
            self.endpoint.clone().unwrap_or_default(),
        )
    }
}

fn optional_str(cfg: &Value, ptr: &str) -> Result<Option<String>> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => bail!("config {ptr} must be a string (got {other})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_defaults_when_absent() {
        let cfg = json!({"reorder": {"record_type": "product", "endpoint": "https://x/ajax"}});
        let rc = ReorderConfig::from_config_json(&cfg).unwrap();
        assert_eq!(rc.action, DEFAULT_ACTION);
        assert!(rc.controller_config().is_complete());
    }

    #[test]
    fn missing_context_yields_incomplete_controller_config() {
        let rc = ReorderConfig::from_config_json(&json!({})).unwrap();
        assert_eq!(rc.record_type, None);
        assert!(!rc.controller_config().is_complete());
    }

    #[test]
    fn non_string_value_is_rejected() {
        let err = ReorderConfig::from_config_json(&json!({"reorder": {"endpoint": 5}}))
            .unwrap_err()
            .to_string();
        assert!(err.contains("/reorder/endpoint"), "{err}");
    }

    #[test]
    fn overrides_replace_config_values_but_not_with_blanks() {
        let rc = ReorderConfig::from_config_json(&json!({"reorder": {"record_type": "post"}}))
            .unwrap()
            .with_overrides(|k| match k {
                ENV_ENDPOINT => Some("https://override/ajax".to_string()),
                ENV_RECORD_TYPE => Some("  ".to_string()),
                _ => None,
            });
        assert_eq!(rc.endpoint.as_deref(), Some("https://override/ajax"));
        assert_eq!(rc.record_type.as_deref(), Some("post"));
    }
}
