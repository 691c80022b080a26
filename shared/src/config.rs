use crate::IdentityPoolError;

pub const DEFAULT_AUTH_SETTINGS_FILENAME: &str = "auth-settings.json";
pub const DEFAULT_SHARED_POOLS_FILENAME: &str = "cognito-pools.json";

/// Handler configuration read from the Lambda environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Name of the auth settings document under `player-access/`
    pub auth_settings_filename: String,
    /// Name of the shared-pools document under the deployment's configuration key
    pub shared_pools_filename: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            auth_settings_filename: DEFAULT_AUTH_SETTINGS_FILENAME.to_string(),
            shared_pools_filename: DEFAULT_SHARED_POOLS_FILENAME.to_string(),
        }
    }
}

impl HandlerConfig {
    /// Create config from AUTH_SETTINGS_FILENAME and SHARED_POOLS_FILENAME,
    /// falling back to the defaults when unset
    pub fn from_env() -> Result<Self, IdentityPoolError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, IdentityPoolError> {
        let read = |name: &str, default: &str| match lookup(name) {
            Some(value) if value.trim().is_empty() => Err(IdentityPoolError::Configuration(
                format!("{} is set but empty", name),
            )),
            Some(value) => Ok(value),
            None => Ok(default.to_string()),
        };

        let config = Self {
            auth_settings_filename: read("AUTH_SETTINGS_FILENAME", DEFAULT_AUTH_SETTINGS_FILENAME)?,
            shared_pools_filename: read("SHARED_POOLS_FILENAME", DEFAULT_SHARED_POOLS_FILENAME)?,
        };

        tracing::info!(
            "HandlerConfig loaded - auth settings: {}, shared pools: {}",
            config.auth_settings_filename,
            config.shared_pools_filename
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HandlerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, HandlerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = HandlerConfig::from_lookup(lookup(&[
            ("AUTH_SETTINGS_FILENAME", "auth.json"),
            ("SHARED_POOLS_FILENAME", "pools.json"),
        ]))
        .unwrap();

        assert_eq!(config.auth_settings_filename, "auth.json");
        assert_eq!(config.shared_pools_filename, "pools.json");
    }

    #[test]
    fn test_empty_value_rejected() {
        let result = HandlerConfig::from_lookup(lookup(&[("SHARED_POOLS_FILENAME", " ")]));
        assert!(matches!(result, Err(IdentityPoolError::Configuration(_))));
    }
}
