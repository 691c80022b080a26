use serde::Deserialize;
use std::collections::HashMap;

use crate::{CognitoRoleMapping, IdentityPoolError, IdentityPoolResult};

/// Value of the `ShareMode` property that delegates to a pool owned elsewhere
pub const SHARE_MODE_SHARED: &str = "SHARED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareMode {
    /// This resource owns its pool
    #[default]
    Exclusive,
    /// The pool is owned by another stack and listed in the shared-pools document
    Shared,
}

impl ShareMode {
    /// Only the exact string `SHARED` enables delegation
    pub fn parse(value: &str) -> Self {
        if value == SHARE_MODE_SHARED {
            ShareMode::Shared
        } else {
            ShareMode::Exclusive
        }
    }
}

/// Template flags arrive as strings; anything other than a case-insensitive
/// `true` is false.
pub fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Typed view over the `Custom::CognitoIdentityPool` resource properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceProperties {
    pub configuration_bucket: String,
    /// Changes on every deployment, which forces an update of the resource
    pub configuration_key: String,
    pub identity_pool_name: String,
    pub use_auth_settings_object: bool,
    pub allow_unauthenticated_identities: bool,
    pub developer_provider_name: Option<String>,
    pub share_mode: ShareMode,
    /// Role kind (`authenticated`, `unauthenticated`) to role ARN
    pub roles: HashMap<String, String>,
    pub cognito_role_mapping: CognitoRoleMapping,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProperties {
    #[serde(rename = "ServiceToken", default)]
    _service_token: Option<serde_json::Value>,
    #[serde(rename = "ConfigurationBucket", default)]
    configuration_bucket: Option<String>,
    #[serde(rename = "ConfigurationKey", default)]
    configuration_key: Option<String>,
    #[serde(rename = "IdentityPoolName", default)]
    identity_pool_name: Option<String>,
    #[serde(rename = "UseAuthSettingsObject", default)]
    use_auth_settings_object: Option<String>,
    #[serde(rename = "AllowUnauthenticatedIdentities", default)]
    allow_unauthenticated_identities: Option<String>,
    #[serde(rename = "DeveloperProviderName", default)]
    developer_provider_name: Option<String>,
    #[serde(rename = "ShareMode", default)]
    share_mode: Option<String>,
    #[serde(rename = "Roles", default)]
    roles: Option<HashMap<String, String>>,
    #[serde(rename = "RoleMappings", default)]
    role_mappings: Option<RawRoleMappings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRoleMappings {
    #[serde(rename = "Cognito", default)]
    cognito: CognitoRoleMapping,
}

fn required(value: Option<String>, name: &str) -> IdentityPoolResult<String> {
    value.ok_or_else(|| {
        IdentityPoolError::SchemaValidation(format!("The {} property is required", name))
    })
}

impl ResourceProperties {
    /// Parse and validate the raw `ResourceProperties` object of a request
    pub fn from_value(value: &serde_json::Value) -> IdentityPoolResult<Self> {
        if !value.is_object() {
            return Err(IdentityPoolError::SchemaValidation(
                "ResourceProperties must be an object".to_string(),
            ));
        }

        let raw: RawProperties = serde_json::from_value(value.clone()).map_err(|e| {
            IdentityPoolError::SchemaValidation(format!("Invalid resource properties: {}", e))
        })?;

        let use_auth_settings_object =
            required(raw.use_auth_settings_object, "UseAuthSettingsObject")?;
        let allow_unauthenticated_identities = required(
            raw.allow_unauthenticated_identities,
            "AllowUnauthenticatedIdentities",
        )?;

        Ok(Self {
            configuration_bucket: required(raw.configuration_bucket, "ConfigurationBucket")?,
            configuration_key: required(raw.configuration_key, "ConfigurationKey")?,
            identity_pool_name: required(raw.identity_pool_name, "IdentityPoolName")?,
            use_auth_settings_object: parse_flag(&use_auth_settings_object),
            allow_unauthenticated_identities: parse_flag(&allow_unauthenticated_identities),
            developer_provider_name: raw.developer_provider_name.filter(|name| !name.is_empty()),
            share_mode: ShareMode::parse(raw.share_mode.as_deref().unwrap_or_default()),
            roles: raw.roles.unwrap_or_default(),
            cognito_role_mapping: raw.role_mappings.unwrap_or_default().cognito,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:handler",
            "ConfigurationBucket": "config-bucket",
            "ConfigurationKey": "upload/20240101",
            "IdentityPoolName": "PlayerAccess",
            "UseAuthSettingsObject": "false",
            "AllowUnauthenticatedIdentities": "false"
        })
    }

    #[test]
    fn test_defaults_applied() {
        let props = ResourceProperties::from_value(&minimal()).unwrap();

        assert_eq!(props.configuration_bucket, "config-bucket");
        assert_eq!(props.identity_pool_name, "PlayerAccess");
        assert!(!props.use_auth_settings_object);
        assert_eq!(props.developer_provider_name, None);
        assert_eq!(props.share_mode, ShareMode::Exclusive);
        assert!(props.roles.is_empty());
        assert_eq!(props.cognito_role_mapping, CognitoRoleMapping::default());
    }

    #[test]
    fn test_flags_are_case_insensitive() {
        let mut value = minimal();
        value["AllowUnauthenticatedIdentities"] = json!("TRUE");
        value["UseAuthSettingsObject"] = json!("True");

        let props = ResourceProperties::from_value(&value).unwrap();
        assert!(props.allow_unauthenticated_identities);
        assert!(props.use_auth_settings_object);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("tRuE"));
        assert!(!parse_flag("yes"));
        assert!(!parse_flag("1"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_missing_required_property() {
        let mut value = minimal();
        value.as_object_mut().unwrap().remove("IdentityPoolName");

        match ResourceProperties::from_value(&value) {
            Err(IdentityPoolError::SchemaValidation(msg)) => assert!(msg.contains("IdentityPoolName")),
            other => panic!("expected schema validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_mistyped_property() {
        let mut value = minimal();
        value["Roles"] = json!({ "authenticated": 42 });

        assert!(matches!(
            ResourceProperties::from_value(&value),
            Err(IdentityPoolError::SchemaValidation(_))
        ));
    }

    #[test]
    fn test_unknown_property_rejected() {
        let mut value = minimal();
        value["PoolColour"] = json!("blue");

        assert!(matches!(
            ResourceProperties::from_value(&value),
            Err(IdentityPoolError::SchemaValidation(_))
        ));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            ResourceProperties::from_value(&serde_json::Value::Null),
            Err(IdentityPoolError::SchemaValidation(_))
        ));
    }

    #[test]
    fn test_optional_properties() {
        let mut value = minimal();
        value["DeveloperProviderName"] = json!("login.game");
        value["ShareMode"] = json!("SHARED");
        value["Roles"] = json!({ "authenticated": "arn:aws:iam::123456789012:role/Auth" });
        value["RoleMappings"] = json!({
            "Cognito": { "Type": "Rules", "AmbiguousRoleResolution": "Deny",
                "RulesConfiguration": { "Rules": [
                    { "Claim": "isAdmin", "MatchType": "Equals", "Value": "yes",
                      "RoleARN": "arn:aws:iam::123456789012:role/Admin" }
                ] } }
        });

        let props = ResourceProperties::from_value(&value).unwrap();
        assert_eq!(props.developer_provider_name.as_deref(), Some("login.game"));
        assert_eq!(props.share_mode, ShareMode::Shared);
        assert_eq!(props.roles.len(), 1);
        assert_eq!(props.cognito_role_mapping.mapping_type, "Rules");
        assert_eq!(props.cognito_role_mapping.ambiguous_role_resolution, "Deny");
        assert_eq!(
            props.cognito_role_mapping.rules_configuration.unwrap().rules[0].claim,
            "isAdmin"
        );
    }

    #[test]
    fn test_partial_cognito_mapping_defaults() {
        let mut value = minimal();
        value["RoleMappings"] = json!({ "Cognito": { "Type": "Token" } });

        let props = ResourceProperties::from_value(&value).unwrap();
        assert_eq!(props.cognito_role_mapping.mapping_type, "Token");
        assert_eq!(props.cognito_role_mapping.ambiguous_role_resolution, "");
    }

    #[test]
    fn test_share_mode_is_exact_match() {
        assert_eq!(ShareMode::parse("SHARED"), ShareMode::Shared);
        assert_eq!(ShareMode::parse("shared"), ShareMode::Exclusive);
        assert_eq!(ShareMode::parse(""), ShareMode::Exclusive);
    }
}
