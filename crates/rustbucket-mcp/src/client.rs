//! SSE client: a scoped session against one transport server.
//!
//! [`McpClient::connect`] opens the event stream, learns the session's
//! message endpoint from the first event, and spawns a reader task that
//! correlates `message` events back to in-flight calls by request id.
//! Calls are plain POSTs; their responses arrive on the stream. There is
//! no reconnection: when the stream ends, outstanding and future calls
//! fail and the client should be dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use futures::StreamExt;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use rustbucket_core::{ToolArguments, ToolOutcome};

use crate::error::{ClientError, ClientResult};
use crate::message::{JsonRpcRequest, JsonRpcResponse, RequestId};
use crate::model::{
    CallToolResult, InitializeResult, ListResourceTemplatesResult, ListResourcesResult,
    ListToolsResult, PROTOCOL_VERSION, ReadResourceResult, Resource, ResourceTemplate, ToolInfo,
};
use crate::sse::SseDecoder;

/// How long a call waits for its response on the stream.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);
/// How long connection setup waits for the endpoint announcement.
const ENDPOINT_TIMEOUT: Duration = Duration::from_secs(10);

type PendingMap = Arc<DashMap<i64, oneshot::Sender<JsonRpcResponse>>>;

/// A connected client session.
///
/// Dropping the client aborts its stream reader and fails any
/// outstanding calls.
#[derive(Debug)]
pub struct McpClient {
    http: reqwest::Client,
    message_url: reqwest::Url,
    pending: PendingMap,
    next_id: AtomicI64,
    reader: JoinHandle<()>,
    server: Option<InitializeResult>,
}

impl McpClient {
    /// Connect to a server's SSE endpoint (e.g. `http://localhost:9999/sse`).
    ///
    /// Returns once the server has announced the session's message
    /// endpoint on the stream.
    pub async fn connect(sse_url: &str) -> ClientResult<Self> {
        let base = reqwest::Url::parse(sse_url).map_err(|e| ClientError::Url(e.to_string()))?;
        let http = reqwest::Client::new();

        let response = http
            .get(base.clone())
            .header(http::header::ACCEPT, "text/event-stream")
            .send()
            .await?
            .error_for_status()?;

        let pending: PendingMap = Arc::new(DashMap::new());
        let (endpoint_tx, endpoint_rx) = oneshot::channel();
        let reader = tokio::spawn(read_stream(response, Arc::clone(&pending), endpoint_tx));

        let endpoint = tokio::time::timeout(ENDPOINT_TIMEOUT, endpoint_rx)
            .await
            .map_err(|_| ClientError::NoEndpoint)?
            .map_err(|_| ClientError::NoEndpoint)?;
        let message_url = base
            .join(&endpoint)
            .map_err(|e| ClientError::Url(e.to_string()))?;
        debug!(%message_url, "session endpoint announced");

        Ok(Self {
            http,
            message_url,
            pending,
            next_id: AtomicI64::new(1),
            reader,
            server: None,
        })
    }

    /// Perform the `initialize` handshake and confirm it.
    pub async fn initialize(&mut self) -> ClientResult<InitializeResult> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "rustbucket-client",
                "version": env!("CARGO_PKG_VERSION"),
            },
        });

        let value = self.request("initialize", Some(params)).await?;
        let result: InitializeResult = decode("initialize", value)?;
        self.notify("notifications/initialized", None).await?;

        self.server = Some(result.clone());
        Ok(result)
    }

    /// Identity the server reported during [`McpClient::initialize`].
    #[must_use]
    pub fn server_info(&self) -> Option<&InitializeResult> {
        self.server.as_ref()
    }

    /// Liveness probe.
    pub async fn ping(&self) -> ClientResult<()> {
        self.request("ping", None).await.map(|_| ())
    }

    /// List the server's tools.
    pub async fn list_tools(&self) -> ClientResult<Vec<ToolInfo>> {
        let value = self.request("tools/list", None).await?;
        let result: ListToolsResult = decode("tools/list", value)?;
        Ok(result.tools)
    }

    /// Invoke a tool and recover its outcome.
    ///
    /// Tool failures come back as [`ToolOutcome::Failure`], not as
    /// errors; an `Err` here means the channel itself failed.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: ToolArguments,
    ) -> ClientResult<ToolOutcome> {
        let params = json!({
            "name": name,
            "arguments": Value::Object(arguments.into()),
        });

        let value = self.request("tools/call", Some(params)).await?;
        let result: CallToolResult = decode("tools/call", value)?;
        Ok(ToolOutcome::from(result))
    }

    /// List concrete resources. Servers whose objects are reached through
    /// URI templates advertise none.
    pub async fn list_resources(&self) -> ClientResult<Vec<Resource>> {
        let value = self.request("resources/list", None).await?;
        let result: ListResourcesResult = decode("resources/list", value)?;
        Ok(result.resources)
    }

    /// List the URI templates the server's resources follow.
    pub async fn list_resource_templates(&self) -> ClientResult<Vec<ResourceTemplate>> {
        let value = self.request("resources/templates/list", None).await?;
        let result: ListResourceTemplatesResult = decode("resources/templates/list", value)?;
        Ok(result.resource_templates)
    }

    /// Read a resource by URI.
    pub async fn read_resource(&self, uri: &str) -> ClientResult<ReadResourceResult> {
        let value = self
            .request("resources/read", Some(json!({"uri": uri})))
            .await?;
        decode("resources/read", value)
    }

    /// End the session.
    pub fn close(self) {
        // Drop aborts the reader task.
    }

    /// Send one call and await its correlated response.
    async fn request(&self, method: &str, params: Option<Value>) -> ClientResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        let frame = JsonRpcRequest::call(id, method, params);
        let sent = self
            .http
            .post(self.message_url.clone())
            .json(&frame)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);
        if let Err(e) = sent {
            self.pending.remove(&id);
            return Err(ClientError::Http(e));
        }

        let response = match tokio::time::timeout(RESPONSE_TIMEOUT, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(ClientError::StreamClosed {
                    method: method.to_owned(),
                });
            }
            Err(_) => {
                self.pending.remove(&id);
                return Err(ClientError::ResponseTimeout {
                    method: method.to_owned(),
                });
            }
        };

        Ok(response.into_result()?)
    }

    /// Send one notification; nothing comes back.
    async fn notify(&self, method: &str, params: Option<Value>) -> ClientResult<()> {
        let frame = JsonRpcRequest::notification(method, params);
        self.http
            .post(self.message_url.clone())
            .json(&frame)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl Drop for McpClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Pump the event stream, routing responses to their waiters.
async fn read_stream(
    response: reqwest::Response,
    pending: PendingMap,
    endpoint_tx: oneshot::Sender<String>,
) {
    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    let mut endpoint_tx = Some(endpoint_tx);

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, "sse stream failed");
                break;
            }
        };

        for event in decoder.feed(&chunk) {
            match event.event.as_str() {
                "endpoint" => {
                    if let Some(tx) = endpoint_tx.take() {
                        let _ = tx.send(event.data);
                    }
                }
                "message" => deliver(&pending, &event.data),
                other => debug!(event = other, "ignoring unexpected event type"),
            }
        }
    }

    debug!("sse stream ended");
    // Dropping the senders fails every outstanding call.
    pending.clear();
}

/// Route one response frame to the call waiting on its id.
fn deliver(pending: &DashMap<i64, oneshot::Sender<JsonRpcResponse>>, data: &str) {
    let response: JsonRpcResponse = match serde_json::from_str(data) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "undecodable response frame");
            return;
        }
    };

    let id = match &response.id {
        RequestId::Number(id) => *id,
        RequestId::String(id) => {
            debug!(%id, "response with a foreign id");
            return;
        }
    };

    if let Some((_, tx)) = pending.remove(&id) {
        let _ = tx.send(response);
    } else {
        debug!(id, "response for an unknown request id");
    }
}

/// Decode a result payload, labeling failures with the method name.
fn decode<T: serde::de::DeserializeOwned>(method: &str, value: Value) -> ClientResult<T> {
    serde_json::from_value(value).map_err(|e| ClientError::UnexpectedPayload {
        method: method.to_owned(),
        detail: e.to_string(),
    })
}
