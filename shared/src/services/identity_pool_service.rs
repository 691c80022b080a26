use async_trait::async_trait;
use aws_sdk_cognitoidentity::{
    types::{
        AmbiguousRoleResolutionType, CognitoIdentityProvider, MappingRule, MappingRuleMatchType,
        RoleMapping, RoleMappingType, RulesConfigurationType,
    },
    Client as CognitoIdentityClient,
};
use std::collections::HashMap;

use crate::{
    CognitoRoleMapping, IdentityPool, IdentityPoolArgs, IdentityPoolClient, IdentityPoolError,
    IdentityPoolResult, IdentityProvider,
};

pub struct CognitoIdentityPoolService {
    client: CognitoIdentityClient,
}

impl CognitoIdentityPoolService {
    pub fn new(client: CognitoIdentityClient) -> Self {
        Self { client }
    }
}

fn to_sdk_provider(provider: &IdentityProvider) -> CognitoIdentityProvider {
    CognitoIdentityProvider::builder()
        .provider_name(&provider.provider_name)
        .client_id(&provider.client_id)
        .server_side_token_check(provider.server_side_token_check)
        .build()
}

fn to_sdk_role_mapping(mapping: &CognitoRoleMapping) -> IdentityPoolResult<RoleMapping> {
    let rules_configuration = match &mapping.rules_configuration {
        Some(configuration) => {
            let rules = configuration
                .rules
                .iter()
                .map(|rule| {
                    MappingRule::builder()
                        .claim(&rule.claim)
                        .match_type(MappingRuleMatchType::from(rule.match_type.as_str()))
                        .value(&rule.value)
                        .role_arn(&rule.role_arn)
                        .build()
                        .map_err(|e| IdentityPoolError::IdentityService(e.to_string()))
                })
                .collect::<IdentityPoolResult<Vec<_>>>()?;

            Some(
                RulesConfigurationType::builder()
                    .set_rules(Some(rules))
                    .build()
                    .map_err(|e| IdentityPoolError::IdentityService(e.to_string()))?,
            )
        }
        None => None,
    };

    // Cognito rejects an empty enum value, so an unset resolution is omitted
    let ambiguous_role_resolution = Some(mapping.ambiguous_role_resolution.as_str())
        .filter(|value| !value.is_empty())
        .map(AmbiguousRoleResolutionType::from);

    RoleMapping::builder()
        .r#type(RoleMappingType::from(mapping.mapping_type.as_str()))
        .set_ambiguous_role_resolution(ambiguous_role_resolution)
        .set_rules_configuration(rules_configuration)
        .build()
        .map_err(|e| IdentityPoolError::IdentityService(e.to_string()))
}

fn sdk_providers(args: &IdentityPoolArgs) -> Vec<CognitoIdentityProvider> {
    args.cognito_identity_providers
        .iter()
        .map(to_sdk_provider)
        .collect()
}

#[async_trait]
impl IdentityPoolClient for CognitoIdentityPoolService {
    async fn describe_pool(&self, identity_pool_id: &str) -> IdentityPoolResult<Option<IdentityPool>> {
        match self
            .client
            .describe_identity_pool()
            .identity_pool_id(identity_pool_id)
            .send()
            .await
        {
            Ok(output) => Ok(Some(IdentityPool {
                identity_pool_id: output.identity_pool_id().to_string(),
                identity_pool_name: output.identity_pool_name().to_string(),
                allow_unauthenticated_identities: output.allow_unauthenticated_identities(),
            })),
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .map(|e| e.is_resource_not_found_exception())
                    .unwrap_or(false);
                if not_found {
                    tracing::info!("Identity pool {} not found", identity_pool_id);
                    return Ok(None);
                }
                Err(IdentityPoolError::IdentityService(format!(
                    "DescribeIdentityPool {} failed: {}",
                    identity_pool_id, err
                )))
            }
        }
    }

    async fn create_pool(&self, args: &IdentityPoolArgs) -> IdentityPoolResult<String> {
        let output = self
            .client
            .create_identity_pool()
            .identity_pool_name(&args.identity_pool_name)
            .allow_unauthenticated_identities(args.allow_unauthenticated_identities)
            .set_supported_login_providers(Some(args.supported_login_providers.clone()))
            .set_cognito_identity_providers(Some(sdk_providers(args)))
            .set_identity_pool_tags(Some(args.tags.clone()))
            .set_developer_provider_name(args.developer_provider_name.clone())
            .send()
            .await
            .map_err(|e| {
                IdentityPoolError::IdentityService(format!("CreateIdentityPool failed: {}", e))
            })?;

        let identity_pool_id = output.identity_pool_id().to_string();
        tracing::info!(
            "Created identity pool {} ({})",
            identity_pool_id,
            args.identity_pool_name
        );
        Ok(identity_pool_id)
    }

    async fn update_pool(&self, identity_pool_id: &str, args: &IdentityPoolArgs) -> IdentityPoolResult<()> {
        self.client
            .update_identity_pool()
            .identity_pool_id(identity_pool_id)
            .identity_pool_name(&args.identity_pool_name)
            .allow_unauthenticated_identities(args.allow_unauthenticated_identities)
            .set_supported_login_providers(Some(args.supported_login_providers.clone()))
            .set_cognito_identity_providers(Some(sdk_providers(args)))
            .set_identity_pool_tags(Some(args.tags.clone()))
            .set_developer_provider_name(args.developer_provider_name.clone())
            .send()
            .await
            .map_err(|e| {
                IdentityPoolError::IdentityService(format!(
                    "UpdateIdentityPool {} failed: {}",
                    identity_pool_id, e
                ))
            })?;

        tracing::info!("Updated identity pool {}", identity_pool_id);
        Ok(())
    }

    async fn delete_pool(&self, identity_pool_id: &str) -> IdentityPoolResult<()> {
        self.client
            .delete_identity_pool()
            .identity_pool_id(identity_pool_id)
            .send()
            .await
            .map_err(|e| {
                IdentityPoolError::IdentityService(format!(
                    "DeleteIdentityPool {} failed: {}",
                    identity_pool_id, e
                ))
            })?;

        tracing::info!("Deleted identity pool {}", identity_pool_id);
        Ok(())
    }

    async fn set_pool_roles(
        &self,
        identity_pool_id: &str,
        roles: &HashMap<String, String>,
        role_mappings: &HashMap<String, CognitoRoleMapping>,
    ) -> IdentityPoolResult<()> {
        let sdk_mappings = role_mappings
            .iter()
            .map(|(key, mapping)| Ok((key.clone(), to_sdk_role_mapping(mapping)?)))
            .collect::<IdentityPoolResult<HashMap<_, _>>>()?;

        self.client
            .set_identity_pool_roles()
            .identity_pool_id(identity_pool_id)
            .set_roles(Some(roles.clone()))
            .set_role_mappings(Some(sdk_mappings))
            .send()
            .await
            .map_err(|e| {
                IdentityPoolError::IdentityService(format!(
                    "SetIdentityPoolRoles {} failed: {}",
                    identity_pool_id, e
                ))
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MappingRule as RuleConfig, RulesConfiguration};

    #[test]
    fn test_token_mapping_omits_empty_resolution() {
        let mapping = CognitoRoleMapping {
            mapping_type: "Token".to_string(),
            ambiguous_role_resolution: String::new(),
            rules_configuration: None,
        };

        let sdk = to_sdk_role_mapping(&mapping).unwrap();
        assert_eq!(sdk.r#type(), &RoleMappingType::Token);
        assert!(sdk.ambiguous_role_resolution().is_none());
        assert!(sdk.rules_configuration().is_none());
    }

    #[test]
    fn test_rules_mapping() {
        let mapping = CognitoRoleMapping {
            mapping_type: "Rules".to_string(),
            ambiguous_role_resolution: "Deny".to_string(),
            rules_configuration: Some(RulesConfiguration {
                rules: vec![RuleConfig {
                    claim: "isAdmin".to_string(),
                    match_type: "Equals".to_string(),
                    value: "yes".to_string(),
                    role_arn: "arn:aws:iam::123456789012:role/Admin".to_string(),
                }],
            }),
        };

        let sdk = to_sdk_role_mapping(&mapping).unwrap();
        assert_eq!(sdk.r#type(), &RoleMappingType::Rules);
        assert_eq!(
            sdk.ambiguous_role_resolution(),
            Some(&AmbiguousRoleResolutionType::Deny)
        );
        assert_eq!(sdk.rules_configuration().map(|c| c.rules().len()), Some(1));
    }

    #[test]
    fn test_provider_conversion() {
        let provider = IdentityProvider {
            provider_name: "cognito-idp.us-east-1.amazonaws.com/us-east-1_abc".to_string(),
            client_id: "client".to_string(),
            server_side_token_check: true,
        };

        let sdk = to_sdk_provider(&provider);
        assert_eq!(sdk.provider_name(), Some(provider.provider_name.as_str()));
        assert_eq!(sdk.client_id(), Some("client"));
    }
}
