// crates/newman-gate-aws/src/sdk.rs
// ============================================================================
// Module: Shared SDK Configuration
// Description: Loads the AWS SDK configuration shared by all clients.
// Purpose: Apply the configured region once for every service client.
// Dependencies: aws-config, newman-gate-config
// ============================================================================

//! ## Overview
//! Credentials and region come from the standard provider chain (the Lambda
//! execution role in production). The storage section may pin the region;
//! endpoint overrides apply to S3 only and are handled by
//! [`crate::S3UrlResolver::from_config`].

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_config::SdkConfig;
use newman_gate_config::StorageConfig;
use tracing::debug;

/// Loads the shared SDK configuration.
pub async fn load_sdk_config(storage: &StorageConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &storage.region {
        loader = loader.region(Region::new(region.clone()));
    }
    let config = loader.load().await;
    let region = config.region().map_or("unset", |region| region.as_ref());
    debug!(region, "loaded aws sdk configuration");
    config
}
