use async_trait::async_trait;
use aws_sdk_s3::{
    error::ProvideErrorMetadata, operation::get_object::GetObjectError, Client as S3Client,
};

use crate::{ConfigurationStore, IdentityPoolError, IdentityPoolResult};

/// A missing key reads as no document; only AccessDenied is told apart from
/// other failures
fn classify(err: &GetObjectError, location: &str) -> IdentityPoolResult<Option<String>> {
    if err.is_no_such_key() {
        tracing::info!("{} does not exist", location);
        return Ok(None);
    }
    if err.code() == Some("AccessDenied") {
        return Err(IdentityPoolError::StorageAccessDenied(location.to_string()));
    }
    Err(IdentityPoolError::StorageAccess(format!(
        "GetObject {} failed: {}",
        location, err
    )))
}

pub struct S3ConfigurationStore {
    client: S3Client,
}

impl S3ConfigurationStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigurationStore for S3ConfigurationStore {
    async fn read_document(&self, bucket: &str, key: &str) -> IdentityPoolResult<Option<String>> {
        tracing::debug!("Reading s3://{}/{}", bucket, key);

        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(err) => {
                let location = format!("s3://{}/{}", bucket, key);
                return match err.as_service_error() {
                    Some(service_err) => classify(service_err, &location),
                    None => Err(IdentityPoolError::StorageAccess(format!(
                        "GetObject {} failed: {}",
                        location, err
                    ))),
                };
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| {
                IdentityPoolError::StorageAccess(format!(
                    "Reading s3://{}/{} failed: {}",
                    bucket, key, e
                ))
            })?
            .into_bytes();

        let document = String::from_utf8(bytes.to_vec()).map_err(|e| {
            IdentityPoolError::Serialization(format!("s3://{}/{} is not UTF-8: {}", bucket, key, e))
        })?;

        Ok(Some(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::types::error::NoSuchKey;

    const LOCATION: &str = "s3://config-bucket/player-access/auth-settings.json";

    fn with_code(code: &str) -> GetObjectError {
        GetObjectError::generic(ErrorMetadata::builder().code(code).message("from S3").build())
    }

    #[test]
    fn test_missing_key_is_no_document() {
        let err = GetObjectError::NoSuchKey(NoSuchKey::builder().build());
        assert_eq!(classify(&err, LOCATION).unwrap(), None);
    }

    #[test]
    fn test_access_denied() {
        match classify(&with_code("AccessDenied"), LOCATION) {
            Err(IdentityPoolError::StorageAccessDenied(location)) => assert_eq!(location, LOCATION),
            other => panic!("expected StorageAccessDenied, got {:?}", other),
        }
    }

    #[test]
    fn test_other_errors_are_storage_failures() {
        for code in ["SlowDown", "InternalError", "NoSuchBucket"] {
            assert!(matches!(
                classify(&with_code(code), LOCATION),
                Err(IdentityPoolError::StorageAccess(_))
            ));
        }
    }
}
