use async_trait::async_trait;
use aws_sdk_cloudformation::Client as CloudFormationClient;
use aws_sdk_cognitoidentityprovider::Client as CognitoIdpClient;
use serde::Deserialize;
use std::collections::HashMap;

use crate::{
    user_pool_provider_name, IdentityPoolError, IdentityPoolResult, IdentityProvider, StackInfo,
    StackMetadataSource,
};

/// One user pool linked to an identity pool through template metadata
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityProviderLink {
    /// Logical id of the user pool resource in the same stack
    #[serde(rename = "UserPool")]
    pub user_pool: String,
    /// Client app names of the user pool that may sign in
    #[serde(rename = "ClientApps", default)]
    pub client_apps: Vec<String>,
    #[serde(rename = "ServerSideTokenCheck", default)]
    pub server_side_token_check: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ResourceMetadata {
    #[serde(rename = "CloudCanvas", default)]
    cloud_canvas: CloudCanvasMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct CloudCanvasMetadata {
    #[serde(rename = "IdentityProviders", default)]
    identity_providers: Vec<IdentityProviderLink>,
}

/// Read `Metadata.CloudCanvas.IdentityProviders` of an identity pool resource
pub fn parse_identity_provider_links(
    metadata: Option<&str>,
) -> IdentityPoolResult<Vec<IdentityProviderLink>> {
    let metadata = match metadata.map(str::trim) {
        Some(metadata) if !metadata.is_empty() => metadata,
        _ => return Ok(Vec::new()),
    };

    let parsed: ResourceMetadata = serde_json::from_str(metadata).map_err(|e| {
        IdentityPoolError::StackMetadata(format!("Invalid resource metadata: {}", e))
    })?;
    Ok(parsed.cloud_canvas.identity_providers)
}

/// A metadata link resolved against the deployed user pool
#[derive(Debug, Clone)]
pub struct LinkedUserPool {
    pub link: IdentityProviderLink,
    pub user_pool_id: String,
    /// Client name to client id
    pub clients: HashMap<String, String>,
}

/// One provider per client app, in link order then client app order
pub fn assemble_identity_providers(
    user_pools: &[LinkedUserPool],
) -> IdentityPoolResult<Vec<IdentityProvider>> {
    let mut providers = Vec::new();
    for user_pool in user_pools {
        let provider_name = user_pool_provider_name(&user_pool.user_pool_id)?;

        for client_app in &user_pool.link.client_apps {
            let client_id = user_pool.clients.get(client_app).ok_or_else(|| {
                IdentityPoolError::StackMetadata(format!(
                    "Client app {} not found in user pool {}",
                    client_app, user_pool.user_pool_id
                ))
            })?;

            providers.push(IdentityProvider {
                provider_name: provider_name.clone(),
                client_id: client_id.clone(),
                server_side_token_check: user_pool.link.server_side_token_check,
            });
        }
    }
    Ok(providers)
}

/// Stack lookups backed by CloudFormation and Cognito user pools
pub struct CloudFormationStackMetadata {
    cloudformation: CloudFormationClient,
    user_pools: CognitoIdpClient,
}

impl CloudFormationStackMetadata {
    pub fn new(cloudformation: CloudFormationClient, user_pools: CognitoIdpClient) -> Self {
        Self {
            cloudformation,
            user_pools,
        }
    }

    /// Returns `(metadata, physical_resource_id)` of a stack resource
    async fn describe_resource(
        &self,
        stack_id: &str,
        logical_resource_id: &str,
    ) -> IdentityPoolResult<(Option<String>, Option<String>)> {
        let output = self
            .cloudformation
            .describe_stack_resource()
            .stack_name(stack_id)
            .logical_resource_id(logical_resource_id)
            .send()
            .await
            .map_err(|e| {
                IdentityPoolError::StackMetadata(format!(
                    "DescribeStackResource {} failed: {}",
                    logical_resource_id, e
                ))
            })?;

        let detail = output.stack_resource_detail();
        Ok((
            detail.and_then(|d| d.metadata()).map(str::to_string),
            detail
                .and_then(|d| d.physical_resource_id())
                .map(str::to_string),
        ))
    }

    /// Client name to client id for every app client of a user pool
    async fn user_pool_clients(&self, user_pool_id: &str) -> IdentityPoolResult<HashMap<String, String>> {
        let mut clients = HashMap::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .user_pools
                .list_user_pool_clients()
                .user_pool_id(user_pool_id)
                .max_results(60)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    IdentityPoolError::StackMetadata(format!(
                        "ListUserPoolClients {} failed: {}",
                        user_pool_id, e
                    ))
                })?;

            for client in output.user_pool_clients() {
                if let (Some(name), Some(id)) = (client.client_name(), client.client_id()) {
                    clients.insert(name.to_string(), id.to_string());
                }
            }

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(clients)
    }
}

#[async_trait]
impl StackMetadataSource for CloudFormationStackMetadata {
    async fn stack_info(&self, stack_id: &str) -> IdentityPoolResult<StackInfo> {
        StackInfo::from_stack_id(stack_id)
    }

    async fn identity_providers(
        &self,
        stack: &StackInfo,
        logical_resource_id: &str,
    ) -> IdentityPoolResult<Vec<IdentityProvider>> {
        let (metadata, _) = self
            .describe_resource(&stack.stack_id, logical_resource_id)
            .await?;
        let links = parse_identity_provider_links(metadata.as_deref())?;

        let mut user_pools = Vec::with_capacity(links.len());
        for link in links {
            let (_, user_pool_id) = self.describe_resource(&stack.stack_id, &link.user_pool).await?;
            let user_pool_id = user_pool_id.ok_or_else(|| {
                IdentityPoolError::StackMetadata(format!(
                    "User pool {} has no physical id yet",
                    link.user_pool
                ))
            })?;
            let clients = self.user_pool_clients(&user_pool_id).await?;

            user_pools.push(LinkedUserPool {
                link,
                user_pool_id,
                clients,
            });
        }

        let providers = assemble_identity_providers(&user_pools)?;
        tracing::debug!(
            "Identity providers for {}: {:?}",
            logical_resource_id,
            providers
        );
        Ok(providers)
    }
}
