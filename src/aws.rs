use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::Credentials;

use crate::config::DeployConfig;

/// Builds the shared SDK config from the startup snapshot. Credentials come
/// from the snapshot, never from ambient lookups at call time.
pub async fn sdk_config(config: &DeployConfig) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()))
        .credentials_provider(Credentials::new(
            config.aws_access_key_id.clone(),
            config.aws_secret_access_key.clone(),
            None,
            None,
            "shipctl-env",
        ))
        .load()
        .await
}
