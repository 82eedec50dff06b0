use aws_sdk_s3::error::DisplayErrorContext;

use crate::aws;
use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::ssh;

/// Connectivity preflight: proves the AWS credentials work by listing
/// buckets, then opens and closes an SSH session when an EC2 host is
/// configured. Makes no changes anywhere.
pub async fn run(config: &DeployConfig) -> Result<()> {
    let sdk = aws::sdk_config(config).await;
    let client = aws_sdk_s3::Client::new(&sdk);
    let buckets = client.list_buckets().send().await.map_err(|err| {
        DeployError::Verification(format!("list buckets: {}", DisplayErrorContext(&err)))
    })?;
    println!(
        "AWS credentials OK ({} buckets visible in {})",
        buckets.buckets().len(),
        config.aws_region
    );

    match (&config.ec2_host, &config.ec2_username) {
        (Some(host), Some(username)) => {
            let session = ssh::connect(host, config.ec2_port, username, &config.ec2_key_path)?;
            drop(session);
            println!("SSH connection to {username}@{host} OK");
        }
        _ => println!("EC2 host not configured; skipping SSH check"),
    }
    Ok(())
}
