//! The storage capability trait the tool layer dispatches against.
//!
//! [`ObjectStore`] is the only seam between tools and storage: handlers
//! hold an `Arc<dyn ObjectStore>` and never see the SDK. The production
//! implementation is [`S3ObjectStore`](crate::S3ObjectStore); tests
//! substitute memory-backed fakes.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BackendResult;
use crate::types::{BucketDeletion, BucketInfo, ObjectSummary, StoredObject};

/// The capability set the tool layer is allowed to assume.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// List buckets, sorted by name.
    async fn list_buckets(&self) -> BackendResult<Vec<BucketInfo>>;

    /// Create a bucket.
    ///
    /// `region` of `None` means the store's configured default region.
    /// Returns the backend's response description.
    async fn create_bucket(&self, bucket: &str, region: Option<&str>) -> BackendResult<String>;

    /// Delete a bucket.
    ///
    /// With `force`, the bucket's objects (and versions, where the backend
    /// supports them) are removed first, and a bucket that does not exist
    /// counts as a successful deletion.
    async fn delete_bucket(&self, bucket: &str, force: bool) -> BackendResult<BucketDeletion>;

    /// Whether a bucket exists. `Ok(false)` means a definitive not-found;
    /// any other failure is an error.
    async fn head_bucket(&self, bucket: &str) -> BackendResult<bool>;

    /// List up to `max_keys` objects under `prefix`, paginating as needed.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i64,
    ) -> BackendResult<Vec<ObjectSummary>>;

    /// Fetch an object's bytes and metadata.
    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<StoredObject>;

    /// Store an object. Returns the backend's response description.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> BackendResult<String>;

    /// Delete an object. Returns the backend's response description.
    async fn delete_object(&self, bucket: &str, key: &str) -> BackendResult<String>;
}
