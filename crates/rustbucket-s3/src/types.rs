//! Storage metadata types shared across the adapter and the tool layer.
//!
//! Listing types serialize with the AWS wire casing (`Name`, `Key`,
//! `Size`, ...) because that is what clients of the tool surface index
//! into.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A bucket as reported by a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    /// Bucket name.
    #[serde(rename = "Name")]
    pub name: String,

    /// Creation timestamp, when the backend reported one.
    #[serde(rename = "CreationDate", skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
}

/// An object as reported by an object listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    /// Object key.
    #[serde(rename = "Key")]
    pub key: String,

    /// Object size in bytes.
    #[serde(rename = "Size")]
    pub size: i64,

    /// Last-modified timestamp, when the backend reported one.
    #[serde(rename = "LastModified", skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    /// Entity tag, when the backend reported one.
    #[serde(rename = "ETag", skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,

    /// Storage class, when the backend reported one.
    #[serde(rename = "StorageClass", skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

/// A fetched object: raw bytes plus the metadata the transport layer
/// reports alongside them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// The object's raw bytes.
    pub body: Bytes,
    /// Content type, when the backend reported one.
    pub content_type: Option<String>,
    /// Size of the body in bytes.
    pub size: u64,
    /// Last-modified timestamp, when the backend reported one.
    pub last_modified: Option<String>,
    /// Entity tag, when the backend reported one.
    pub e_tag: Option<String>,
}

/// Result of a bucket deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketDeletion {
    /// The bucket was deleted; carries the backend's response description.
    Deleted {
        /// Rendered backend response for the final delete call.
        response: String,
    },
    /// Forced deletion found no bucket to delete; success by idempotence.
    NotFound,
}
