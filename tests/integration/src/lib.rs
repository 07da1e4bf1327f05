//! Integration tests for the rustbucket server.
//!
//! Most tests start the full transport in-process on an ephemeral port,
//! back it with [`MemoryStore`], and drive it through [`McpClient`] or
//! raw HTTP. They run during normal `cargo test`.
//!
//! The `test_live_s3` module instead exercises the real S3 adapter and
//! requires an S3-compatible endpoint (LocalStack or MinIO) configured
//! via `S3_ENDPOINT_URL`. Those tests are marked `#[ignore]`; run them
//! with:
//! ```text
//! S3_ENDPOINT_URL=http://localhost:4566 cargo test -p rustbucket-integration -- --ignored
//! ```

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Once};

use async_trait::async_trait;
use bytes::Bytes;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use parking_lot::RwLock;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::debug;

use rustbucket_core::{ToolArguments, ToolOutcome, ToolPayload};
use rustbucket_mcp::{
    McpClient, McpServerConfig, McpSseService, ResourceContents, ResourceReader, ResourceTemplate,
    SessionRegistry,
};
use rustbucket_s3::{
    BackendError, BackendResult, BucketDeletion, BucketInfo, ObjectStore, ObjectSummary,
    S3ResourceRouter, S3_URI_TEMPLATE, StoredObject, build_registry,
};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Objects in one memory bucket, keyed by object key.
type ObjectMap = BTreeMap<String, StoredObject>;

/// Memory-backed [`ObjectStore`] covering the full capability set.
///
/// Buckets and objects live in process memory. The seeding and
/// inspection helpers bypass the tool surface so tests can arrange
/// state and assert on side effects directly.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: RwLock<BTreeMap<String, ObjectMap>>,
    regions: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already contains the given empty buckets.
    #[must_use]
    pub fn with_buckets(names: &[&str]) -> Self {
        let store = Self::new();
        for name in names {
            store.add_bucket(name);
        }
        store
    }

    /// Add an empty bucket.
    pub fn add_bucket(&self, bucket: &str) {
        self.buckets.write().entry(bucket.to_owned()).or_default();
    }

    /// Seed an object directly, creating the bucket if needed.
    pub fn add_object(&self, bucket: &str, key: &str, body: &[u8], content_type: Option<&str>) {
        let object = StoredObject {
            body: Bytes::copy_from_slice(body),
            content_type: content_type.map(ToOwned::to_owned),
            size: body.len() as u64,
            last_modified: Some("2024-05-01T00:00:00Z".to_owned()),
            e_tag: Some(format!("\"{:08x}\"", body.len())),
        };
        self.buckets
            .write()
            .entry(bucket.to_owned())
            .or_default()
            .insert(key.to_owned(), object);
    }

    /// Region recorded when a bucket was created through the store.
    #[must_use]
    pub fn region_of(&self, bucket: &str) -> Option<String> {
        self.regions.read().get(bucket).cloned()
    }

    /// Raw bytes of a stored object, if present.
    #[must_use]
    pub fn object_bytes(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        let buckets = self.buckets.read();
        Some(buckets.get(bucket)?.get(key)?.body.to_vec())
    }

    /// Number of objects currently in a bucket.
    #[must_use]
    pub fn object_count(&self, bucket: &str) -> usize {
        self.buckets.read().get(bucket).map_or(0, BTreeMap::len)
    }
}

fn no_such_bucket() -> BackendError {
    BackendError::Service {
        code: "NoSuchBucket".to_owned(),
        message: "The specified bucket does not exist".to_owned(),
    }
}

fn no_such_key() -> BackendError {
    BackendError::Service {
        code: "NoSuchKey".to_owned(),
        message: "The specified key does not exist".to_owned(),
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> BackendResult<Vec<BucketInfo>> {
        Ok(self
            .buckets
            .read()
            .keys()
            .map(|name| BucketInfo {
                name: name.clone(),
                creation_date: Some("2024-05-01T00:00:00Z".to_owned()),
            })
            .collect())
    }

    async fn create_bucket(&self, bucket: &str, region: Option<&str>) -> BackendResult<String> {
        let mut buckets = self.buckets.write();
        if buckets.contains_key(bucket) {
            return Err(BackendError::Service {
                code: "BucketAlreadyOwnedByYou".to_owned(),
                message: "Your previous request to create the named bucket succeeded".to_owned(),
            });
        }

        buckets.insert(bucket.to_owned(), ObjectMap::new());
        self.regions
            .write()
            .insert(bucket.to_owned(), region.unwrap_or("us-east-1").to_owned());
        Ok(format!("created bucket {bucket}"))
    }

    async fn delete_bucket(&self, bucket: &str, force: bool) -> BackendResult<BucketDeletion> {
        let mut buckets = self.buckets.write();
        let Some(objects) = buckets.get(bucket) else {
            if force {
                return Ok(BucketDeletion::NotFound);
            }
            return Err(no_such_bucket());
        };

        if !objects.is_empty() && !force {
            return Err(BackendError::Service {
                code: "BucketNotEmpty".to_owned(),
                message: "The bucket you tried to delete is not empty".to_owned(),
            });
        }

        buckets.remove(bucket);
        self.regions.write().remove(bucket);
        Ok(BucketDeletion::Deleted {
            response: format!("deleted bucket {bucket}"),
        })
    }

    async fn head_bucket(&self, bucket: &str) -> BackendResult<bool> {
        Ok(self.buckets.read().contains_key(bucket))
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i64,
    ) -> BackendResult<Vec<ObjectSummary>> {
        let buckets = self.buckets.read();
        let objects = buckets.get(bucket).ok_or_else(no_such_bucket)?;

        let cap = usize::try_from(max_keys).unwrap_or(0);
        Ok(objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .take(cap)
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                size: i64::try_from(object.size).unwrap_or(i64::MAX),
                last_modified: object.last_modified.clone(),
                e_tag: object.e_tag.clone(),
                storage_class: Some("STANDARD".to_owned()),
            })
            .collect())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<StoredObject> {
        let buckets = self.buckets.read();
        let objects = buckets.get(bucket).ok_or_else(no_such_bucket)?;
        objects.get(key).cloned().ok_or_else(no_such_key)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> BackendResult<String> {
        let mut buckets = self.buckets.write();
        let objects = buckets.get_mut(bucket).ok_or_else(no_such_bucket)?;

        let object = StoredObject {
            size: body.len() as u64,
            e_tag: Some(format!("\"{:08x}\"", body.len())),
            last_modified: Some("2024-05-01T00:00:00Z".to_owned()),
            content_type: Some(content_type.to_owned()),
            body,
        };
        objects.insert(key.to_owned(), object);
        Ok(format!("put {key}"))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> BackendResult<String> {
        let mut buckets = self.buckets.write();
        let objects = buckets.get_mut(bucket).ok_or_else(no_such_bucket)?;
        objects.remove(key);
        Ok(format!("deleted {key}"))
    }
}

/// Resource surface over the S3 router, wired the way the server app
/// wires it.
#[derive(Debug, Clone)]
pub struct TestResources(
    /// The router answering reads.
    pub S3ResourceRouter,
);

impl ResourceReader for TestResources {
    fn templates(&self) -> Vec<ResourceTemplate> {
        vec![ResourceTemplate {
            uri_template: S3_URI_TEMPLATE.to_owned(),
            name: S3ResourceRouter::TEMPLATE_NAME.to_owned(),
            description: Some(S3ResourceRouter::TEMPLATE_DESCRIPTION.to_owned()),
            mime_type: None,
        }]
    }

    fn read(
        &self,
        uri: String,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ResourceContents>> + Send>> {
        let router = self.0.clone();
        Box::pin(async move {
            let object = router.read(&uri).await?;
            Ok(ResourceContents {
                uri,
                mime_type: Some(object.mime_type),
                text: object.text,
            })
        })
    }
}

/// A transport server bound to an ephemeral port for one test.
///
/// Dropping the server closes every open session and stops the accept
/// loop.
#[derive(Debug)]
pub struct TestServer {
    /// Base URL of the server, e.g. `http://127.0.0.1:49152`.
    pub base_url: String,
    sessions: SessionRegistry,
    accept: JoinHandle<()>,
}

impl TestServer {
    /// URL of the SSE endpoint.
    #[must_use]
    pub fn sse_url(&self) -> String {
        format!("{}/sse", self.base_url)
    }

    /// URL of the message endpoint with the given query string appended.
    #[must_use]
    pub fn messages_url(&self, query: &str) -> String {
        format!("{}/messages{query}", self.base_url)
    }

    /// Registry of sessions currently open on this server.
    #[must_use]
    pub fn sessions(&self) -> SessionRegistry {
        self.sessions.clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.sessions.close_all();
        self.accept.abort();
    }
}

/// Start a transport server over the given store on an ephemeral port.
pub async fn spawn_server(store: Arc<MemoryStore>) -> TestServer {
    let object_store: Arc<dyn ObjectStore> = store;
    let registry =
        build_registry(Arc::clone(&object_store)).expect("registry should build");
    let router = S3ResourceRouter::new(object_store);
    let config = McpServerConfig::builder()
        .server_name("rustbucket-test".into())
        .keepalive_secs(0)
        .build();

    spawn_service(McpSseService::new(registry, TestResources(router), config)).await
}

/// Serve an already-built service on an ephemeral port.
pub async fn spawn_service<R: ResourceReader>(service: McpSseService<R>) -> TestServer {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let sessions = service.sessions();
    debug!(%addr, "test server listening");

    let accept = tokio::spawn(async move {
        let http = HttpConnBuilder::new(TokioExecutor::new());
        loop {
            let Ok((stream, _peer)) = listener.accept().await else {
                break;
            };
            let conn = http
                .serve_connection(TokioIo::new(stream), service.clone())
                .into_owned();
            tokio::spawn(async move {
                let _ = conn.await;
            });
        }
    });

    TestServer {
        base_url: format!("http://{addr}"),
        sessions,
        accept,
    }
}

/// Connect a client to the server and complete the initialize handshake.
pub async fn connect_client(server: &TestServer) -> McpClient {
    let mut client = McpClient::connect(&server.sse_url())
        .await
        .expect("client should connect");
    client.initialize().await.expect("initialize handshake");
    client
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Build tool arguments from name/value pairs.
#[must_use]
pub fn tool_args(pairs: &[(&str, serde_json::Value)]) -> ToolArguments {
    let mut args = ToolArguments::new();
    for (name, value) in pairs {
        args.insert(*name, value.clone());
    }
    args
}

/// Unwrap a structured success payload into its JSON value.
///
/// Panics with the full outcome when the shape differs, so failing
/// tests show what actually came back.
#[must_use]
pub fn expect_structured(outcome: ToolOutcome) -> serde_json::Value {
    match outcome {
        ToolOutcome::Success(ToolPayload::Structured(value)) => value,
        other => panic!("expected structured payload, got {other:?}"),
    }
}

mod test_resources;
mod test_session;
mod test_tools;
