//! The AWS SDK implementation of [`ObjectStore`].
//!
//! Construction goes through the SDK's default config loader so the usual
//! credential chain, sleep implementation, and retry wiring apply; a
//! configured static key pair or endpoint override narrows that down for
//! S3-compatible backends such as MinIO. Every call carries the configured
//! operation timeout, so a stuck backend surfaces as an error instead of a
//! hang.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::primitives::{ByteStream, DateTime, DateTimeFormat};
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectIdentifier,
};
use bytes::Bytes;
use tracing::{debug, info};

use crate::config::{DEFAULT_REGION, S3Config};
use crate::error::{BackendError, BackendResult, from_sdk_error};
use crate::store::ObjectStore;
use crate::types::{BucketDeletion, BucketInfo, ObjectSummary, StoredObject};

/// Credential provider name attached to static credentials.
const CREDENTIAL_PROVIDER_NAME: &str = "rustbucket";

/// [`ObjectStore`] backed by the AWS S3 SDK.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    config: S3Config,
}

impl S3ObjectStore {
    /// Build a store from configuration, resolving SDK defaults.
    ///
    /// A static credential pair in the configuration takes precedence over
    /// the SDK's default provider chain; an endpoint override also enables
    /// path-style addressing for S3-compatible backends.
    pub async fn connect(config: S3Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some((access_key, secret_key)) = config.static_credentials() {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                CREDENTIAL_PROVIDER_NAME,
            ));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let shared = loader.load().await;

        let timeout = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(config.operation_timeout_secs))
            .build();

        let mut builder = aws_sdk_s3::config::Builder::from(&shared).timeout_config(timeout);
        if config.endpoint_url.is_some() {
            builder = builder.force_path_style(true);
        }

        let client = Client::from_conf(builder.build());
        Self { client, config }
    }

    /// Wrap an already-built SDK client.
    #[must_use]
    pub fn from_client(client: Client, config: S3Config) -> Self {
        Self { client, config }
    }

    /// Delete every current object in the bucket, page by page.
    async fn purge_objects(&self, bucket: &str) -> BackendResult<()> {
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }
            let page = request.send().await.map_err(from_sdk_error)?;

            let identifiers = page
                .contents()
                .iter()
                .filter_map(|object| object.key())
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(BackendError::transport)?;

            self.delete_batch(bucket, identifiers).await?;

            if page.is_truncated() == Some(true) {
                continuation_token = page.next_continuation_token().map(ToOwned::to_owned);
            } else {
                return Ok(());
            }
        }
    }

    /// Delete every object version and delete marker, page by page.
    async fn purge_versions(&self, bucket: &str) -> BackendResult<()> {
        let mut key_marker: Option<String> = None;
        let mut version_id_marker: Option<String> = None;

        loop {
            let mut request = self.client.list_object_versions().bucket(bucket);
            if let Some(marker) = key_marker.take() {
                request = request.key_marker(marker);
            }
            if let Some(marker) = version_id_marker.take() {
                request = request.version_id_marker(marker);
            }
            let page = request.send().await.map_err(from_sdk_error)?;

            let mut identifiers = Vec::new();
            for marker in page.delete_markers() {
                if let (Some(key), Some(version)) = (marker.key(), marker.version_id()) {
                    identifiers.push(
                        ObjectIdentifier::builder()
                            .key(key)
                            .version_id(version)
                            .build()
                            .map_err(BackendError::transport)?,
                    );
                }
            }
            for version in page.versions() {
                if let (Some(key), Some(id)) = (version.key(), version.version_id()) {
                    identifiers.push(
                        ObjectIdentifier::builder()
                            .key(key)
                            .version_id(id)
                            .build()
                            .map_err(BackendError::transport)?,
                    );
                }
            }

            self.delete_batch(bucket, identifiers).await?;

            if page.is_truncated() == Some(true) {
                key_marker = page.next_key_marker().map(ToOwned::to_owned);
                version_id_marker = page.next_version_id_marker().map(ToOwned::to_owned);
            } else {
                return Ok(());
            }
        }
    }

    /// Issue one batch deletion; a listing page never exceeds the
    /// backend's batch limit, so pages map one-to-one onto batches.
    async fn delete_batch(
        &self,
        bucket: &str,
        identifiers: Vec<ObjectIdentifier>,
    ) -> BackendResult<()> {
        if identifiers.is_empty() {
            return Ok(());
        }

        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .build()
            .map_err(BackendError::transport)?;

        self.client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(from_sdk_error)?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_buckets(&self) -> BackendResult<Vec<BucketInfo>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(from_sdk_error)?;

        let mut buckets: Vec<BucketInfo> = output
            .buckets()
            .iter()
            .filter_map(|bucket| {
                bucket.name().map(|name| BucketInfo {
                    name: name.to_owned(),
                    creation_date: bucket.creation_date().and_then(format_timestamp),
                })
            })
            .collect();

        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        buckets.truncate(self.config.max_buckets);
        Ok(buckets)
    }

    async fn create_bucket(&self, bucket: &str, region: Option<&str>) -> BackendResult<String> {
        let region = region.unwrap_or(&self.config.region);

        let mut request = self.client.create_bucket().bucket(bucket);
        if let Some(configuration) = location_constraint(region) {
            request = request.create_bucket_configuration(configuration);
        }

        let output = request.send().await.map_err(from_sdk_error)?;
        info!(bucket, region, "created bucket");
        Ok(format!("{output:?}"))
    }

    async fn delete_bucket(&self, bucket: &str, force: bool) -> BackendResult<BucketDeletion> {
        if force {
            if !self.head_bucket(bucket).await? {
                debug!(bucket, "bucket absent, forced deletion is a no-op");
                return Ok(BucketDeletion::NotFound);
            }

            self.purge_objects(bucket).await?;

            // Version listing fails on backends without versioning
            // support; the plain deletion below decides the outcome.
            if let Err(err) = self.purge_versions(bucket).await {
                debug!(bucket, error = %err, "skipping version purge");
            }
        }

        let output = self
            .client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(from_sdk_error)?;

        info!(bucket, force, "deleted bucket");
        Ok(BucketDeletion::Deleted {
            response: format!("{output:?}"),
        })
    }

    async fn head_bucket(&self, bucket: &str) -> BackendResult<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    Ok(false)
                } else {
                    Err(from_sdk_error(err))
                }
            }
        }
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i64,
    ) -> BackendResult<Vec<ObjectSummary>> {
        let cap = usize::try_from(max_keys.max(0)).unwrap_or(usize::MAX);
        let mut objects: Vec<ObjectSummary> = Vec::new();
        if cap == 0 {
            return Ok(objects);
        }

        let mut continuation_token: Option<String> = None;

        loop {
            let remaining = cap - objects.len();
            let page_size = i32::try_from(remaining.min(1000)).unwrap_or(1000);

            let mut request = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .max_keys(page_size);
            if !prefix.is_empty() {
                request = request.prefix(prefix);
            }
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let page = request.send().await.map_err(from_sdk_error)?;

            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                objects.push(ObjectSummary {
                    key: key.to_owned(),
                    size: object.size().unwrap_or(0),
                    last_modified: object.last_modified().and_then(format_timestamp),
                    e_tag: object.e_tag().map(ToOwned::to_owned),
                    storage_class: object.storage_class().map(|c| c.as_str().to_owned()),
                });
                if objects.len() == cap {
                    return Ok(objects);
                }
            }

            if page.is_truncated() == Some(true) {
                continuation_token = page.next_continuation_token().map(ToOwned::to_owned);
            } else {
                return Ok(objects);
            }
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<StoredObject> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(from_sdk_error)?;

        let content_type = output.content_type().map(ToOwned::to_owned);
        let e_tag = output.e_tag().map(ToOwned::to_owned);
        let last_modified = output.last_modified().and_then(format_timestamp);

        let body = output
            .body
            .collect()
            .await
            .map_err(BackendError::transport)?
            .into_bytes();

        Ok(StoredObject {
            size: body.len() as u64,
            body,
            content_type,
            last_modified,
            e_tag,
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> BackendResult<String> {
        let size = body.len();

        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(from_sdk_error)?;

        info!(bucket, key, size, "stored object");
        Ok(format!("{output:?}"))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> BackendResult<String> {
        let output = self
            .client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(from_sdk_error)?;

        info!(bucket, key, "deleted object");
        Ok(format!("{output:?}"))
    }
}

/// The location constraint to send when creating a bucket in `region`.
///
/// `us-east-1` is the one region that must not carry a constraint; any
/// other region is passed through verbatim.
fn location_constraint(region: &str) -> Option<CreateBucketConfiguration> {
    if region == DEFAULT_REGION {
        return None;
    }

    Some(
        CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::from(region))
            .build(),
    )
}

/// Render a backend timestamp for the wire.
fn format_timestamp(timestamp: &DateTime) -> Option<String> {
    timestamp.fmt(DateTimeFormat::DateTime).ok()
}
