pub mod s3_service;
pub mod identity_pool_service;
pub mod stack_metadata_service;
pub mod response_service;

pub use s3_service::*;
pub use identity_pool_service::*;
pub use stack_metadata_service::*;
pub use response_service::*;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::{
    CognitoRoleMapping, IdentityPool, IdentityPoolArgs, IdentityPoolResult, IdentityProvider,
    StackInfo,
};

/// Read access to documents in the configuration bucket
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// `Ok(None)` when the key does not exist; access denied is reported as
    /// `IdentityPoolError::StorageAccessDenied`
    async fn read_document(&self, bucket: &str, key: &str) -> IdentityPoolResult<Option<String>>;
}

/// Identity pool management operations
#[async_trait]
pub trait IdentityPoolClient: Send + Sync {
    /// `Ok(None)` when no pool exists with this id
    async fn describe_pool(&self, identity_pool_id: &str) -> IdentityPoolResult<Option<IdentityPool>>;

    /// Returns the id assigned by the service
    async fn create_pool(&self, args: &IdentityPoolArgs) -> IdentityPoolResult<String>;

    async fn update_pool(&self, identity_pool_id: &str, args: &IdentityPoolArgs) -> IdentityPoolResult<()>;

    async fn delete_pool(&self, identity_pool_id: &str) -> IdentityPoolResult<()>;

    async fn set_pool_roles(
        &self,
        identity_pool_id: &str,
        roles: &HashMap<String, String>,
        role_mappings: &HashMap<String, CognitoRoleMapping>,
    ) -> IdentityPoolResult<()>;
}

/// Stack lookups needed to name and link a pool
#[async_trait]
pub trait StackMetadataSource: Send + Sync {
    async fn stack_info(&self, stack_id: &str) -> IdentityPoolResult<StackInfo>;

    /// Identity providers linked to the given identity pool resource, in declaration order
    async fn identity_providers(
        &self,
        stack: &StackInfo,
        logical_resource_id: &str,
    ) -> IdentityPoolResult<Vec<IdentityProvider>>;
}
