use crate::{CustomResourceResponse, IdentityPoolError, IdentityPoolResult};

/// Delivers custom-resource responses to CloudFormation's pre-signed URL
pub struct ResponseService {
    client: reqwest::Client,
}

impl ResponseService {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Serialize the response body exactly as it is uploaded
    pub fn render(response: &CustomResourceResponse) -> IdentityPoolResult<String> {
        Ok(serde_json::to_string(response)?)
    }

    pub async fn send(&self, response_url: &str, response: &CustomResourceResponse) -> IdentityPoolResult<()> {
        let body = Self::render(response)?;

        tracing::info!(
            "Sending {:?} response for {} (physical id {})",
            response.status,
            response.logical_resource_id,
            response.physical_resource_id
        );

        // The pre-signed URL is signed without a content type
        let result = self
            .client
            .put(response_url)
            .header(reqwest::header::CONTENT_TYPE, "")
            .body(body)
            .send()
            .await?;

        let status = result.status();
        if !status.is_success() {
            let text = result.text().await.unwrap_or_default();
            return Err(IdentityPoolError::ResponseDelivery(format!(
                "response URL returned {}: {}",
                status, text
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CustomResourceRequest, RequestType};
    use std::collections::HashMap;

    fn request() -> CustomResourceRequest {
        CustomResourceRequest {
            request_type: RequestType::Create,
            response_url: "https://example.com/response".to_string(),
            stack_id: "arn:aws:cloudformation:us-east-1:123456789012:stack/Game/guid".to_string(),
            request_id: "req-1".to_string(),
            resource_type: "Custom::CognitoIdentityPool".to_string(),
            logical_resource_id: "PlayerAccessIdentityPool".to_string(),
            physical_resource_id: None,
            resource_properties: serde_json::json!({}),
            old_resource_properties: None,
            service_token: None,
        }
    }

    #[test]
    fn test_render_failure() {
        let response = CustomResourceResponse::failure(&request(), "Identity service error: denied");
        let body: serde_json::Value =
            serde_json::from_str(&ResponseService::render(&response).unwrap()).unwrap();

        assert_eq!(body["Status"], "FAILED");
        assert_eq!(body["Reason"], "Identity service error: denied");
        assert_eq!(body["PhysicalResourceId"], "FAILURE");
        assert_eq!(body["LogicalResourceId"], "PlayerAccessIdentityPool");
        assert_eq!(body["NoEcho"], false);
        assert_eq!(body["Data"], serde_json::json!({}));
    }

    #[test]
    fn test_render_success() {
        let mut data = HashMap::new();
        data.insert("IdentityPoolName".to_string(), "Game PlayerAccess".to_string());
        let response = CustomResourceResponse::success(&request(), "us-east-1:abc".to_string(), data);

        let body: serde_json::Value =
            serde_json::from_str(&ResponseService::render(&response).unwrap()).unwrap();
        assert_eq!(body["Status"], "SUCCESS");
        assert_eq!(body["Data"]["IdentityPoolName"], "Game PlayerAccess");
    }
}
