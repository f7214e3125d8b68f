//! Interpreter configuration.

use serde::Deserialize;

use crate::target::BASE_TARGET;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenerConfig {
    /// The target whose statements are applied.
    pub target: String,
    /// Log deprecation notices for lenient legacy forms.
    pub warn_deprecations: bool,
}

impl ListenerConfig {
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            target: BASE_TARGET.to_string(),
            warn_deprecations: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ListenerConfig::default();
        assert_eq!(cfg.target, "base");
        assert!(cfg.warn_deprecations);
    }

    #[test]
    fn deserialize_partial() {
        let cfg: ListenerConfig = serde_json::from_str(r#"{"target":"docker"}"#).unwrap();
        assert_eq!(cfg, ListenerConfig::for_target("docker"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let parsed = serde_json::from_str::<ListenerConfig>(r#"{"targt":"docker"}"#);
        assert!(parsed.is_err());
    }
}
