use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

use crate::aws;
use crate::cli::SyncArgs;
use crate::config::{DeployConfig, ObjectStorageTarget};
use crate::error::{DeployError, Result};
use crate::manifest::{self, FileManifestEntry};

static INVALIDATION_SEQ: AtomicU64 = AtomicU64::new(0);

pub async fn sync(config: &DeployConfig, args: SyncArgs) -> Result<()> {
    let target = config.object_storage_target(args.prefix);
    let entries = manifest::walk(&args.path)?;
    let sdk = aws::sdk_config(config).await;

    let client = aws_sdk_s3::Client::new(&sdk);
    upload_manifest(&client, &target, &entries).await?;
    println!(
        "Uploaded {} files from {} to s3://{}",
        entries.len(),
        args.path.display(),
        target.bucket
    );

    if let Some(distribution_id) = &target.distribution_id {
        let cloudfront = aws_sdk_cloudfront::Client::new(&sdk);
        invalidate(&cloudfront, distribution_id).await?;
        println!("CloudFront invalidation issued for /* on {distribution_id}");
    }
    Ok(())
}

/// Uploads every manifest entry under the target's key prefix. Fail-fast:
/// the first upload error aborts the rest. Objects uploaded before the
/// failure stay in the bucket (non-transactional bulk operation); an
/// existing object at the same key is simply replaced.
pub async fn upload_manifest(
    client: &aws_sdk_s3::Client,
    target: &ObjectStorageTarget,
    entries: &[FileManifestEntry],
) -> Result<()> {
    for entry in entries {
        let key = manifest::object_key(target.key_prefix.as_deref(), &entry.relative_path);
        let body = ByteStream::from_path(&entry.local_path).await.map_err(|err| {
            DeployError::Transfer(format!("read {}: {err}", entry.local_path.display()))
        })?;
        client
            .put_object()
            .bucket(&target.bucket)
            .key(&key)
            .content_type(entry.content_type)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                DeployError::Transfer(format!("put {key}: {}", DisplayErrorContext(&err)))
            })?;
        tracing::info!(key, content_type = entry.content_type, "uploaded");
    }
    Ok(())
}

/// Issues exactly one wildcard invalidation.
pub async fn invalidate(client: &aws_sdk_cloudfront::Client, distribution_id: &str) -> Result<()> {
    let paths = Paths::builder()
        .quantity(1)
        .items("/*")
        .build()
        .map_err(|err| DeployError::Transfer(format!("invalidation paths: {err}")))?;
    let batch = InvalidationBatch::builder()
        .paths(paths)
        .caller_reference(caller_reference())
        .build()
        .map_err(|err| DeployError::Transfer(format!("invalidation batch: {err}")))?;
    client
        .create_invalidation()
        .distribution_id(distribution_id)
        .invalidation_batch(batch)
        .send()
        .await
        .map_err(|err| {
            DeployError::Transfer(format!(
                "invalidate {distribution_id}: {}",
                DisplayErrorContext(&err)
            ))
        })?;
    Ok(())
}

/// Millisecond timestamp plus a process-wide counter. Two invalidations in
/// the same instant still get distinct references.
fn caller_reference() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let seq = INVALIDATION_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("shipctl-{millis}-{seq}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_references_never_collide() {
        let a = caller_reference();
        let b = caller_reference();
        let c = caller_reference();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert!(a.starts_with("shipctl-"));
    }
}
