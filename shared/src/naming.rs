use serde::Deserialize;
use std::collections::HashMap;

use crate::{IdentityPoolError, IdentityPoolResult};

pub const PROJECT_NAME_TAG: &str = "cloudcanvas:project-name";
pub const STACK_ID_TAG: &str = "cloudcanvas:stack-id";

/// Prefix of the auth settings document inside the configuration bucket
pub const PLAYER_ACCESS_PREFIX: &str = "player-access";

/// Separator between a readable physical id and its embedded JSON payload
const EMBEDDED_ID_SEPARATOR: &str = "::";

/// Stack identity derived from a CloudFormation stack ARN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackInfo {
    pub stack_id: String,
    pub stack_name: String,
    pub project_name: String,
    pub region: String,
}

impl StackInfo {
    /// Parse `arn:<partition>:cloudformation:<region>:<account>:stack/<name>/<guid>`
    pub fn from_stack_id(stack_id: &str) -> IdentityPoolResult<Self> {
        let invalid =
            || IdentityPoolError::StackMetadata(format!("Invalid stack id: {}", stack_id));

        let parts: Vec<&str> = stack_id.splitn(6, ':').collect();
        if parts.len() != 6 || parts[0] != "arn" || parts[2] != "cloudformation" {
            return Err(invalid());
        }

        let mut resource = parts[5].split('/');
        let stack_name = match (resource.next(), resource.next()) {
            (Some("stack"), Some(name)) if !name.is_empty() => name,
            _ => return Err(invalid()),
        };

        // Project stacks are named after the project; every other stack
        // appends hyphen-separated segments to it.
        let project_name = stack_name.split('-').next().unwrap_or(stack_name);

        Ok(Self {
            stack_id: stack_id.to_string(),
            stack_name: stack_name.to_string(),
            project_name: project_name.to_string(),
            region: parts[3].to_string(),
        })
    }

    /// Tags applied to every pool this stack owns
    pub fn resource_tags(&self) -> HashMap<String, String> {
        let mut tags = HashMap::new();
        tags.insert(PROJECT_NAME_TAG.to_string(), self.project_name.clone());
        tags.insert(STACK_ID_TAG.to_string(), self.stack_id.clone());
        tags
    }
}

/// Display name of a pool: stack name plus configured name, hyphens as spaces.
/// Deterministic so repeated updates never rename the pool.
pub fn qualified_pool_name(stack_name: &str, identity_pool_name: &str) -> String {
    format!("{}{}", stack_name, identity_pool_name).replace('-', " ")
}

#[derive(Debug, Deserialize)]
struct EmbeddedPhysicalId {
    id: String,
}

/// Extract the pool id from a physical resource id.
///
/// Physical ids are either the plain pool id or `<readable>::{"id": "<pool id>"}`.
pub fn embedded_physical_id(physical_resource_id: &str) -> IdentityPoolResult<String> {
    match physical_resource_id.split_once(EMBEDDED_ID_SEPARATOR) {
        Some((_, embedded)) => {
            let embedded: EmbeddedPhysicalId = serde_json::from_str(embedded).map_err(|e| {
                IdentityPoolError::SchemaValidation(format!(
                    "Invalid embedded physical id {}: {}",
                    physical_resource_id, e
                ))
            })?;
            Ok(embedded.id)
        }
        None => Ok(physical_resource_id.to_string()),
    }
}

/// Identity pool ids look like `<region>:<guid>`
pub fn is_identity_pool_id(id: &str) -> bool {
    match id.split_once(':') {
        Some((region, guid)) => {
            !region.is_empty()
                && region.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                && !guid.is_empty()
                && guid.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
        }
        None => false,
    }
}

/// Key of the auth settings document
pub fn auth_settings_key(auth_settings_filename: &str) -> String {
    format!("{}/{}", PLAYER_ACCESS_PREFIX, auth_settings_filename)
}

/// Key of the shared-pools document for a deployment's configuration key
pub fn shared_pools_key(configuration_key: &str, shared_pools_filename: &str) -> String {
    format!(
        "{}/{}",
        configuration_key.trim_end_matches('/'),
        shared_pools_filename
    )
}

/// Identity provider name of a Cognito user pool; the region is the pool id prefix
pub fn user_pool_provider_name(user_pool_id: &str) -> IdentityPoolResult<String> {
    let region = user_pool_id
        .split_once('_')
        .map(|(region, _)| region)
        .filter(|region| !region.is_empty())
        .ok_or_else(|| {
            IdentityPoolError::StackMetadata(format!("Invalid user pool id: {}", user_pool_id))
        })?;

    Ok(format!("cognito-idp.{}.amazonaws.com/{}", region, user_pool_id))
}
