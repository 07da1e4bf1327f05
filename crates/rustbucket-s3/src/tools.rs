//! The storage tool handlers and the registry that exposes them.
//!
//! Each tool is a thin adapter from validated arguments onto one
//! [`ObjectStore`] capability, shaping the result the way callers of the
//! tool surface expect: listing payloads keep AWS casing, status payloads
//! carry `status`/`response` fields, and object reads go through the
//! content classifier so binary payloads travel base64 with an explicit
//! marker. Handler failures stay inside the dispatch boundary as failure
//! outcomes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use bytes::Bytes;
use serde_json::json;

use rustbucket_core::{
    ContentEncoding, EncodedObject, ParamKind, RegistryResult, ToolArguments, ToolDescriptor,
    ToolHandler, ToolParam, ToolPayload, ToolRegistry, classify, encode_for_transport,
};

use crate::store::ObjectStore;
use crate::types::BucketDeletion;

/// Build the tool registry exposing the full storage surface.
///
/// Registers `ListBuckets`, `CreateBucket`, `DeleteBucket`, `ListObjects`,
/// `GetObject`, `PutObject`, and `DeleteObject` over the given store.
pub fn build_registry(store: Arc<dyn ObjectStore>) -> RegistryResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    registry.register(
        ToolDescriptor::new(
            "ListBuckets",
            "List S3 buckets available to the authenticated user",
        ),
        ListBucketsTool {
            store: Arc::clone(&store),
        },
    )?;

    registry.register(
        ToolDescriptor::new("CreateBucket", "Create a new S3 bucket")
            .with_param(ToolParam::required(
                "bucket",
                ParamKind::String,
                "Name of the bucket to create",
            ))
            .with_param(ToolParam::optional(
                "region",
                ParamKind::String,
                json!(""),
                "Region for the bucket; empty means the server's default region",
            )),
        CreateBucketTool {
            store: Arc::clone(&store),
        },
    )?;

    registry.register(
        ToolDescriptor::new("DeleteBucket", "Delete an empty S3 bucket")
            .with_param(ToolParam::required(
                "bucket",
                ParamKind::String,
                "Name of the bucket to delete",
            ))
            .with_param(ToolParam::optional(
                "force",
                ParamKind::Boolean,
                json!(false),
                "Delete all objects and versions first, and treat a missing bucket as success",
            )),
        DeleteBucketTool {
            store: Arc::clone(&store),
        },
    )?;

    registry.register(
        ToolDescriptor::new(
            "ListObjects",
            "List objects in an S3 bucket with optional prefix filtering",
        )
        .with_param(ToolParam::required(
            "bucket",
            ParamKind::String,
            "Bucket to list",
        ))
        .with_param(ToolParam::optional(
            "prefix",
            ParamKind::String,
            json!(""),
            "Only list keys starting with this prefix",
        ))
        .with_param(ToolParam::optional(
            "max_keys",
            ParamKind::Integer,
            json!(1000),
            "Maximum number of keys to return",
        )),
        ListObjectsTool {
            store: Arc::clone(&store),
        },
    )?;

    registry.register(
        ToolDescriptor::new("GetObject", "Retrieve an object from S3 by bucket and key")
            .with_param(ToolParam::required(
                "bucket",
                ParamKind::String,
                "Bucket holding the object",
            ))
            .with_param(ToolParam::required(
                "key",
                ParamKind::String,
                "Key of the object to fetch",
            )),
        GetObjectTool {
            store: Arc::clone(&store),
        },
    )?;

    registry.register(
        ToolDescriptor::new("PutObject", "Upload content to an S3 object")
            .with_param(ToolParam::required(
                "bucket",
                ParamKind::String,
                "Bucket to store the object in",
            ))
            .with_param(ToolParam::required(
                "key",
                ParamKind::String,
                "Key to store the object under",
            ))
            .with_param(ToolParam::required(
                "content",
                ParamKind::String,
                "Object content; base64-encoded when is_base64 is set",
            ))
            .with_param(ToolParam::optional(
                "content_type",
                ParamKind::String,
                json!("text/plain"),
                "Content type stored with the object",
            ))
            .with_param(ToolParam::optional(
                "is_base64",
                ParamKind::Boolean,
                json!(false),
                "Whether content is base64-encoded binary data",
            )),
        PutObjectTool {
            store: Arc::clone(&store),
        },
    )?;

    registry.register(
        ToolDescriptor::new("DeleteObject", "Delete an object from S3")
            .with_param(ToolParam::required(
                "bucket",
                ParamKind::String,
                "Bucket holding the object",
            ))
            .with_param(ToolParam::required(
                "key",
                ParamKind::String,
                "Key of the object to delete",
            )),
        DeleteObjectTool { store },
    )?;

    Ok(registry)
}

/// `ListBuckets`: the visible bucket set, AWS casing.
struct ListBucketsTool {
    store: Arc<dyn ObjectStore>,
}

impl ToolHandler for ListBucketsTool {
    fn call(
        &self,
        _args: ToolArguments,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolPayload>> + Send>> {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let buckets = store
                .list_buckets()
                .await
                .context("Failed to list buckets")?;
            Ok(ToolPayload::Structured(json!({ "buckets": buckets })))
        })
    }
}

/// `CreateBucket`: create with the region branch handled by the store.
struct CreateBucketTool {
    store: Arc<dyn ObjectStore>,
}

impl ToolHandler for CreateBucketTool {
    fn call(
        &self,
        args: ToolArguments,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolPayload>> + Send>> {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let bucket = args.require_str("bucket")?.to_owned();
            let region = args.str_or("region", "").to_owned();
            let region = (!region.is_empty()).then_some(region);

            let response = store
                .create_bucket(&bucket, region.as_deref())
                .await
                .context("Failed to create bucket")?;

            Ok(ToolPayload::Structured(json!({
                "status": "success",
                "bucket": bucket,
                "response": response,
            })))
        })
    }
}

/// `DeleteBucket`: plain deletion, or the forced purge-then-delete path.
struct DeleteBucketTool {
    store: Arc<dyn ObjectStore>,
}

impl ToolHandler for DeleteBucketTool {
    fn call(
        &self,
        args: ToolArguments,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolPayload>> + Send>> {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let bucket = args.require_str("bucket")?.to_owned();
            let force = args.bool_or("force", false);

            let deletion = store
                .delete_bucket(&bucket, force)
                .await
                .context("Failed to delete bucket")?;

            let payload = match deletion {
                BucketDeletion::NotFound => json!({
                    "status": "success",
                    "message": format!("Bucket {bucket} does not exist"),
                }),
                BucketDeletion::Deleted { response } => json!({
                    "status": "success",
                    "message": format!("Bucket {bucket} deleted"),
                    "response": response,
                }),
            };
            Ok(ToolPayload::Structured(payload))
        })
    }
}

/// `ListObjects`: prefix-filtered listing with a key cap.
struct ListObjectsTool {
    store: Arc<dyn ObjectStore>,
}

impl ToolHandler for ListObjectsTool {
    fn call(
        &self,
        args: ToolArguments,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolPayload>> + Send>> {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let bucket = args.require_str("bucket")?.to_owned();
            let prefix = args.str_or("prefix", "").to_owned();
            let max_keys = args.i64_or("max_keys", 1000);

            let objects = store
                .list_objects(&bucket, &prefix, max_keys)
                .await
                .context("Failed to list objects")?;

            Ok(ToolPayload::Structured(json!({ "objects": objects })))
        })
    }
}

/// `GetObject`: fetch, classify, and encode for transport.
struct GetObjectTool {
    store: Arc<dyn ObjectStore>,
}

impl ToolHandler for GetObjectTool {
    fn call(
        &self,
        args: ToolArguments,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolPayload>> + Send>> {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let bucket = args.require_str("bucket")?.to_owned();
            let key = args.require_str("key")?.to_owned();

            let object = store
                .get_object(&bucket, &key)
                .await
                .context("Failed to get object")?;

            let encoded = encode_for_transport(&object.body, classify(&key));
            match encoded.encoding {
                ContentEncoding::Utf8 => Ok(ToolPayload::Text(encoded.body)),
                ContentEncoding::Base64 => Ok(ToolPayload::Binary(EncodedObject {
                    content: encoded.body,
                    encoding: ContentEncoding::Base64,
                    content_type: object.content_type,
                    size_bytes: object.size,
                    last_modified: object.last_modified,
                })),
            }
        })
    }
}

/// `PutObject`: store text, or base64-decoded binary when flagged.
struct PutObjectTool {
    store: Arc<dyn ObjectStore>,
}

impl ToolHandler for PutObjectTool {
    fn call(
        &self,
        args: ToolArguments,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolPayload>> + Send>> {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let bucket = args.require_str("bucket")?.to_owned();
            let key = args.require_str("key")?.to_owned();
            let content = args.require_str("content")?.to_owned();
            let content_type = args.str_or("content_type", "text/plain").to_owned();
            let is_base64 = args.bool_or("is_base64", false);

            let body: Bytes = if is_base64 {
                BASE64_STANDARD
                    .decode(content.as_bytes())
                    .map(Bytes::from)
                    .context("Failed to put object: content is not valid base64")?
            } else {
                Bytes::from(content)
            };

            let response = store
                .put_object(&bucket, &key, body, &content_type)
                .await
                .context("Failed to put object")?;

            Ok(ToolPayload::Structured(json!({
                "status": "success",
                "response": response,
            })))
        })
    }
}

/// `DeleteObject`: single-key deletion.
struct DeleteObjectTool {
    store: Arc<dyn ObjectStore>,
}

impl ToolHandler for DeleteObjectTool {
    fn call(
        &self,
        args: ToolArguments,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolPayload>> + Send>> {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let bucket = args.require_str("bucket")?.to_owned();
            let key = args.require_str("key")?.to_owned();

            let response = store
                .delete_object(&bucket, &key)
                .await
                .context("Failed to delete object")?;

            Ok(ToolPayload::Structured(json!({
                "status": "success",
                "response": response,
            })))
        })
    }
}
