use std::collections::HashMap;
use tracing::{info, warn};

use crate::{
    auth_settings_key, embedded_physical_id, is_identity_pool_id, qualified_pool_name,
    shared_pools_key, AuthSettingsEntry, CognitoRoleMapping, ConfigurationStore,
    CustomResourceRequest, HandlerConfig, IdentityPool, IdentityPoolArgs, IdentityPoolClient,
    IdentityPoolError, IdentityPoolResult, IdentityProvider, RequestType, ResourceProperties,
    ShareMode, SharedPoolDescriptor, StackInfo, StackMetadataSource,
    PHYSICAL_RESOURCE_ID_FAILURE,
};

pub const IDENTITY_POOL_NAME_KEY: &str = "IdentityPoolName";
pub const IDENTITY_POOL_ID_KEY: &str = "IdentityPoolId";

/// Result of a handled request: response data plus the physical id to report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOutcome {
    pub data: HashMap<String, String>,
    pub physical_resource_id: String,
}

impl HandlerOutcome {
    fn pool(identity_pool_name: String, identity_pool_id: String) -> Self {
        let mut data = HashMap::new();
        data.insert(IDENTITY_POOL_NAME_KEY.to_string(), identity_pool_name);
        data.insert(IDENTITY_POOL_ID_KEY.to_string(), identity_pool_id.clone());
        Self {
            data,
            physical_resource_id: identity_pool_id,
        }
    }
}

/// Who owns the pool behind this resource, decided once per invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolOwnership {
    /// Pool owned by another stack; this resource never mutates it
    Delegated(SharedPoolDescriptor),
    /// Pool owned by this resource
    Owned {
        /// Id taken from the request's physical id, if any
        identity_pool_id: Option<String>,
        /// The pool as it currently exists in the service
        existing: Option<IdentityPool>,
    },
}

/// Mapping keyed by the first linked provider, or nothing when no mapping
/// type is configured or no provider is linked
pub fn build_role_mappings(
    cognito: &CognitoRoleMapping,
    providers: &[IdentityProvider],
) -> HashMap<String, CognitoRoleMapping> {
    let mut role_mappings = HashMap::new();
    if cognito.mapping_type.is_empty() {
        return role_mappings;
    }
    if let Some(provider) = providers.first() {
        role_mappings.insert(provider.role_mapping_key(), cognito.clone());
    }
    role_mappings
}

/// Provider URI to app id for every entry of the auth settings document
pub fn supported_login_providers(document: &str) -> IdentityPoolResult<HashMap<String, String>> {
    if document.trim().is_empty() {
        return Ok(HashMap::new());
    }

    let entries: HashMap<String, AuthSettingsEntry> = serde_json::from_str(document)?;
    Ok(entries
        .into_values()
        .map(|entry| (entry.provider_uri, entry.app_id))
        .collect())
}

/// Reconciles `Custom::CognitoIdentityPool` requests against the identity service
pub struct IdentityPoolHandler<S, I, M> {
    store: S,
    identity: I,
    stacks: M,
    config: HandlerConfig,
}

impl<S, I, M> IdentityPoolHandler<S, I, M>
where
    S: ConfigurationStore,
    I: IdentityPoolClient,
    M: StackMetadataSource,
{
    pub fn new(store: S, identity: I, stacks: M, config: HandlerConfig) -> Self {
        Self {
            store,
            identity,
            stacks,
            config,
        }
    }

    pub async fn handle(&self, request: &CustomResourceRequest) -> IdentityPoolResult<HandlerOutcome> {
        let props = ResourceProperties::from_value(&request.resource_properties)?;
        let stack = self.stacks.stack_info(&request.stack_id).await?;
        let identity_pool_name = qualified_pool_name(&stack.stack_name, &props.identity_pool_name);

        info!(
            "{:?} request for {} in stack {} (pool name: {})",
            request.request_type, request.logical_resource_id, stack.stack_name, identity_pool_name
        );

        match self.resolve_ownership(request, &props, &stack).await? {
            PoolOwnership::Delegated(shared) => {
                info!(
                    "Using shared identity pool {} for {}; no changes made",
                    shared.physical_resource_id, request.logical_resource_id
                );
                Ok(HandlerOutcome::pool(identity_pool_name, shared.physical_resource_id))
            }
            PoolOwnership::Owned {
                identity_pool_id,
                existing,
            } => match request.request_type {
                RequestType::Delete => self.delete(identity_pool_id, existing).await,
                RequestType::Create | RequestType::Update => {
                    self.create_or_update(request, &props, &stack, identity_pool_name, existing)
                        .await
                }
            },
        }
    }

    pub async fn resolve_ownership(
        &self,
        request: &CustomResourceRequest,
        props: &ResourceProperties,
        stack: &StackInfo,
    ) -> IdentityPoolResult<PoolOwnership> {
        if props.share_mode == ShareMode::Shared {
            match self
                .load_shared_pool(props, stack, &request.logical_resource_id)
                .await?
            {
                Some(shared) => return Ok(PoolOwnership::Delegated(shared)),
                None => warn!(
                    "ShareMode is SHARED but no shared pool is recorded for {} in {}; managing an owned pool",
                    request.logical_resource_id, stack.stack_name
                ),
            }
        }

        let identity_pool_id = current_pool_id(request)?;
        let existing = match &identity_pool_id {
            Some(id) => self.find_pool(id).await?,
            None => None,
        };

        Ok(PoolOwnership::Owned {
            identity_pool_id,
            existing,
        })
    }

    async fn find_pool(&self, identity_pool_id: &str) -> IdentityPoolResult<Option<IdentityPool>> {
        if !is_identity_pool_id(identity_pool_id) {
            info!("{} is not an identity pool id; treating as absent", identity_pool_id);
            return Ok(None);
        }
        self.identity.describe_pool(identity_pool_id).await
    }

    async fn load_shared_pool(
        &self,
        props: &ResourceProperties,
        stack: &StackInfo,
        logical_resource_id: &str,
    ) -> IdentityPoolResult<Option<SharedPoolDescriptor>> {
        let key = shared_pools_key(&props.configuration_key, &self.config.shared_pools_filename);
        let document = match self
            .store
            .read_document(&props.configuration_bucket, &key)
            .await?
        {
            Some(document) => document,
            None => return Ok(None),
        };

        let pools: serde_json::Value = serde_json::from_str(&document)?;
        let entry = match pools
            .get(&stack.stack_name)
            .and_then(|stack_pools| stack_pools.get(logical_resource_id))
        {
            Some(entry) => entry.clone(),
            None => return Ok(None),
        };

        let descriptor: SharedPoolDescriptor = serde_json::from_value(entry)?;
        if descriptor.physical_resource_id.is_empty() {
            warn!(
                "Shared pool entry for {} in {} has an empty PhysicalResourceId",
                logical_resource_id, key
            );
            return Ok(None);
        }
        Ok(Some(descriptor))
    }

    async fn load_login_providers(&self, bucket: &str) -> IdentityPoolResult<HashMap<String, String>> {
        let key = auth_settings_key(&self.config.auth_settings_filename);
        let document = match self.store.read_document(bucket, &key).await {
            Ok(Some(document)) => document,
            Ok(None) => {
                info!("No auth settings at s3://{}/{}", bucket, key);
                return Ok(HashMap::new());
            }
            Err(IdentityPoolError::StorageAccessDenied(location)) => {
                warn!("Access denied reading auth settings at {}", location);
                return Ok(HashMap::new());
            }
            Err(e) => return Err(e),
        };

        supported_login_providers(&document)
    }

    async fn delete(
        &self,
        identity_pool_id: Option<String>,
        existing: Option<IdentityPool>,
    ) -> IdentityPoolResult<HandlerOutcome> {
        match &existing {
            Some(pool) => self.identity.delete_pool(&pool.identity_pool_id).await?,
            None => info!("Identity pool {:?} is already gone", identity_pool_id),
        }

        Ok(HandlerOutcome {
            data: HashMap::new(),
            physical_resource_id: identity_pool_id
                .unwrap_or_else(|| PHYSICAL_RESOURCE_ID_FAILURE.to_string()),
        })
    }

    async fn create_or_update(
        &self,
        request: &CustomResourceRequest,
        props: &ResourceProperties,
        stack: &StackInfo,
        identity_pool_name: String,
        existing: Option<IdentityPool>,
    ) -> IdentityPoolResult<HandlerOutcome> {
        let supported_login_providers = if props.use_auth_settings_object {
            self.load_login_providers(&props.configuration_bucket).await?
        } else {
            HashMap::new()
        };

        let providers = self
            .stacks
            .identity_providers(stack, &request.logical_resource_id)
            .await?;
        info!("Identity providers: {:?}", providers);

        let args = IdentityPoolArgs {
            identity_pool_name: identity_pool_name.clone(),
            allow_unauthenticated_identities: props.allow_unauthenticated_identities,
            supported_login_providers,
            cognito_identity_providers: providers,
            tags: stack.resource_tags(),
            developer_provider_name: props.developer_provider_name.clone(),
        };

        let identity_pool_id = match existing {
            Some(pool) => {
                self.identity.update_pool(&pool.identity_pool_id, &args).await?;
                pool.identity_pool_id
            }
            None => self.identity.create_pool(&args).await?,
        };

        let role_mappings =
            build_role_mappings(&props.cognito_role_mapping, &args.cognito_identity_providers);
        info!("Role mappings: {:?}", role_mappings);
        self.identity
            .set_pool_roles(&identity_pool_id, &props.roles, &role_mappings)
            .await?;

        Ok(HandlerOutcome::pool(identity_pool_name, identity_pool_id))
    }
}

/// Pool id carried by the request; only Create may arrive without one
fn current_pool_id(request: &CustomResourceRequest) -> IdentityPoolResult<Option<String>> {
    match request
        .physical_resource_id
        .as_deref()
        .filter(|id| !id.is_empty())
    {
        Some(physical_resource_id) => Ok(Some(embedded_physical_id(physical_resource_id)?)),
        None if request.request_type == RequestType::Create => Ok(None),
        None => Err(IdentityPoolError::SchemaValidation(format!(
            "PhysicalResourceId is required for {:?} requests",
            request.request_type
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str, client_id: &str) -> IdentityProvider {
        IdentityProvider {
            provider_name: name.to_string(),
            client_id: client_id.to_string(),
            server_side_token_check: false,
        }
    }

    fn token_mapping() -> CognitoRoleMapping {
        CognitoRoleMapping {
            mapping_type: "Token".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_role_mapping_uses_first_provider() {
        let providers = vec![
            provider("accounts.google.com", "abc"),
            provider("graph.facebook.com", "xyz"),
        ];

        let mappings = build_role_mappings(&token_mapping(), &providers);

        let mut expected = HashMap::new();
        expected.insert("accounts.google.com:abc".to_string(), token_mapping());
        assert_eq!(mappings, expected);
    }

    #[test]
    fn test_role_mapping_requires_provider() {
        assert!(build_role_mappings(&token_mapping(), &[]).is_empty());
    }

    #[test]
    fn test_role_mapping_requires_type() {
        let providers = vec![provider("accounts.google.com", "abc")];
        assert!(build_role_mappings(&CognitoRoleMapping::default(), &providers).is_empty());
    }

    #[test]
    fn test_supported_login_providers() {
        let document = r#"{
            "amazon": { "provider_uri": "www.amazon.com", "app_id": "amzn1.application.1", "client_secret": "s" },
            "google": { "provider_uri": "accounts.google.com", "app_id": "google-app" }
        }"#;

        let providers = supported_login_providers(document).unwrap();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers["www.amazon.com"], "amzn1.application.1");
        assert_eq!(providers["accounts.google.com"], "google-app");
    }

    #[test]
    fn test_empty_auth_settings() {
        assert!(supported_login_providers("{ }").unwrap().is_empty());
        assert!(supported_login_providers("").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_auth_settings() {
        assert!(matches!(
            supported_login_providers(r#"{"google": {"app_id": "x"}}"#),
            Err(IdentityPoolError::Serialization(_))
        ));
    }
}
