use anyhow::{anyhow, Context};
use aws_config::BehaviorVersion;
use identity_pool_shared::{
    CloudFormationStackMetadata, CognitoIdentityPoolService, CustomResourceRequest,
    CustomResourceResponse, HandlerConfig, HandlerOutcome, IdentityPoolHandler,
    IdentityPoolResult, ResponseService, S3ConfigurationStore, raw_response_url,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

async fn handle_request(request: &CustomResourceRequest) -> IdentityPoolResult<HandlerOutcome> {
    let config = HandlerConfig::from_env()?;

    // Initialize AWS clients
    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let handler = IdentityPoolHandler::new(
        S3ConfigurationStore::new(aws_sdk_s3::Client::new(&sdk_config)),
        CognitoIdentityPoolService::new(aws_sdk_cognitoidentity::Client::new(&sdk_config)),
        CloudFormationStackMetadata::new(
            aws_sdk_cloudformation::Client::new(&sdk_config),
            aws_sdk_cognitoidentityprovider::Client::new(&sdk_config),
        ),
        config,
    );

    handler.handle(request).await
}

async fn function_handler(event: LambdaEvent<Value>) -> Result<(), Error> {
    let (payload, _context) = event.into_parts();
    let responder = ResponseService::new(reqwest::Client::new());

    let request: CustomResourceRequest = match serde_json::from_value(payload.clone()) {
        Ok(request) => request,
        Err(e) => {
            error!("Invalid custom resource event: {}", e);
            let response_url = raw_response_url(&payload)
                .ok_or_else(|| anyhow!("Invalid custom resource event without ResponseURL: {}", e))?;
            let response =
                CustomResourceResponse::rejected(&payload, format!("Invalid custom resource event: {}", e));
            responder
                .send(response_url, &response)
                .await
                .context("Failed to deliver custom resource response")?;
            return Ok(());
        }
    };

    info!(
        "Received {:?} request {} for {} ({})",
        request.request_type, request.request_id, request.logical_resource_id, request.resource_type
    );

    let response = match handle_request(&request).await {
        Ok(outcome) => {
            info!(
                "Successfully handled {:?} for {} - physical id: {}",
                request.request_type, request.logical_resource_id, outcome.physical_resource_id
            );
            CustomResourceResponse::success(&request, outcome.physical_resource_id, outcome.data)
        }
        Err(e) => {
            error!(
                "Failed to handle {:?} for {}: {}",
                request.request_type, request.logical_resource_id, e
            );
            CustomResourceResponse::failure(&request, e.to_string())
        }
    };

    // Only a failed delivery surfaces as an invocation error
    responder
        .send(&request.response_url, &response)
        .await
        .context("Failed to deliver custom resource response")?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing; CloudWatch adds timestamps
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    info!("Starting Cognito identity pool resource handler");

    run(service_fn(function_handler)).await
}
