use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Physical id reported when a request fails before any pool id is known.
/// It is not a valid pool id, so a follow-up Delete treats it as already gone.
pub const PHYSICAL_RESOURCE_ID_FAILURE: &str = "FAILURE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// CloudFormation custom-resource lifecycle request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomResourceRequest {
    #[serde(rename = "RequestType")]
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    #[serde(rename = "StackId")]
    pub stack_id: String,
    #[serde(rename = "RequestId")]
    pub request_id: String,
    #[serde(rename = "ResourceType", default)]
    pub resource_type: String,
    #[serde(rename = "LogicalResourceId")]
    pub logical_resource_id: String,
    #[serde(rename = "PhysicalResourceId", default)]
    pub physical_resource_id: Option<String>,
    #[serde(rename = "ResourceProperties", default)]
    pub resource_properties: serde_json::Value,
    #[serde(rename = "OldResourceProperties", default)]
    pub old_resource_properties: Option<serde_json::Value>,
    #[serde(rename = "ServiceToken", default)]
    pub service_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

/// Body PUT to the request's pre-signed response URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomResourceResponse {
    #[serde(rename = "Status")]
    pub status: ResponseStatus,
    #[serde(rename = "Reason", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "PhysicalResourceId")]
    pub physical_resource_id: String,
    #[serde(rename = "StackId")]
    pub stack_id: String,
    #[serde(rename = "RequestId")]
    pub request_id: String,
    #[serde(rename = "LogicalResourceId")]
    pub logical_resource_id: String,
    #[serde(rename = "NoEcho")]
    pub no_echo: bool,
    #[serde(rename = "Data")]
    pub data: HashMap<String, String>,
}

impl CustomResourceResponse {
    /// Success response for a handled request
    pub fn success(
        request: &CustomResourceRequest,
        physical_resource_id: String,
        data: HashMap<String, String>,
    ) -> Self {
        Self {
            status: ResponseStatus::Success,
            reason: None,
            physical_resource_id,
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
            no_echo: false,
            data,
        }
    }

    /// Failure response; keeps the request's physical id so CloudFormation
    /// does not mistake the failure for a replacement
    pub fn failure(request: &CustomResourceRequest, reason: impl Into<String>) -> Self {
        let physical_resource_id = request
            .physical_resource_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| PHYSICAL_RESOURCE_ID_FAILURE.to_string());

        Self {
            status: ResponseStatus::Failed,
            reason: Some(reason.into()),
            physical_resource_id,
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
            no_echo: false,
            data: HashMap::new(),
        }
    }

    /// Failure response for an event that did not parse as a request;
    /// echoes whatever identifying fields it does carry
    pub fn rejected(event: &serde_json::Value, reason: impl Into<String>) -> Self {
        let field = |name: &str| {
            event
                .get(name)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let physical_resource_id = Some(field("PhysicalResourceId"))
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| PHYSICAL_RESOURCE_ID_FAILURE.to_string());

        Self {
            status: ResponseStatus::Failed,
            reason: Some(reason.into()),
            physical_resource_id,
            stack_id: field("StackId"),
            request_id: field("RequestId"),
            logical_resource_id: field("LogicalResourceId"),
            no_echo: false,
            data: HashMap::new(),
        }
    }
}

/// Pre-signed URL of an event that may not parse as a full request
pub fn raw_response_url(event: &serde_json::Value) -> Option<&str> {
    event
        .get("ResponseURL")
        .and_then(serde_json::Value::as_str)
        .filter(|url| !url.is_empty())
}

/// Cognito user pool client linked to an identity pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProvider {
    #[serde(rename = "ProviderName")]
    pub provider_name: String,
    #[serde(rename = "ClientId")]
    pub client_id: String,
    #[serde(rename = "ServerSideTokenCheck", default)]
    pub server_side_token_check: bool,
}

impl IdentityProvider {
    /// Key used by Cognito to address this provider in role mappings
    pub fn role_mapping_key(&self) -> String {
        format!("{}:{}", self.provider_name, self.client_id)
    }
}

/// Identity pool as reported by the identity service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPool {
    pub identity_pool_id: String,
    pub identity_pool_name: String,
    pub allow_unauthenticated_identities: bool,
}

/// Argument set shared by create and update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPoolArgs {
    pub identity_pool_name: String,
    pub allow_unauthenticated_identities: bool,
    pub supported_login_providers: HashMap<String, String>,
    pub cognito_identity_providers: Vec<IdentityProvider>,
    pub tags: HashMap<String, String>,
    /// Omitted from the request entirely when `None`
    pub developer_provider_name: Option<String>,
}

/// Pool owned by another stack, as recorded in the shared-pools document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedPoolDescriptor {
    #[serde(rename = "PhysicalResourceId")]
    pub physical_resource_id: String,
}

/// One entry of the player-access auth settings document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettingsEntry {
    pub provider_uri: String,
    pub app_id: String,
}

/// `RoleMappings.Cognito` property. Missing fields default to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CognitoRoleMapping {
    #[serde(rename = "Type")]
    pub mapping_type: String,
    #[serde(rename = "AmbiguousRoleResolution")]
    pub ambiguous_role_resolution: String,
    #[serde(rename = "RulesConfiguration", skip_serializing_if = "Option::is_none")]
    pub rules_configuration: Option<RulesConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfiguration {
    #[serde(rename = "Rules")]
    pub rules: Vec<MappingRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingRule {
    #[serde(rename = "Claim")]
    pub claim: String,
    #[serde(rename = "MatchType")]
    pub match_type: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "RoleARN")]
    pub role_arn: String,
}
