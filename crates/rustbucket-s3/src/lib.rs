//! S3 storage backing for the rustbucket tool server.
//!
//! This crate owns everything that touches object storage: the
//! [`ObjectStore`] capability trait and its AWS SDK implementation
//! [`S3ObjectStore`], the tool handlers that expose the storage operations
//! through a [`ToolRegistry`](rustbucket_core::ToolRegistry), and the
//! `s3://{bucket}/{key}` resource router. Nothing else in the workspace
//! depends on the AWS SDK directly.

mod client;
mod config;
mod error;
mod resource;
mod store;
mod tools;
mod types;

pub use client::S3ObjectStore;
pub use config::S3Config;
pub use error::{BackendError, BackendResult};
pub use resource::{ResourceObject, S3ResourceRouter, S3_URI_TEMPLATE};
pub use store::ObjectStore;
pub use tools::build_registry;
pub use types::{BucketDeletion, BucketInfo, ObjectSummary, StoredObject};
