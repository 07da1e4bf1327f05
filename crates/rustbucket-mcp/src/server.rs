//! The SSE transport service implementing hyper's `Service` trait.
//!
//! [`McpSseService`] ties sessions, dispatch, and response framing into a
//! single hyper-compatible service. It handles:
//!
//! 1. Stream establishment (`GET /sse`): opens a session and announces
//!    its message endpoint as the first event.
//! 2. Frame intake (`POST /messages?session_id=…`): acknowledges with
//!    `202 Accepted` and delivers the response on the session's stream,
//!    one frame at a time per session.
//! 3. Health check interception (`GET /health`).
//!
//! Tool failures ride inside `tools/call` results with `isError` set;
//! JSON-RPC errors are reserved for envelope problems, unknown methods,
//! and resource read failures.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use rustbucket_core::{ToolArguments, ToolCallRequest, ToolRegistry};

use crate::body::SseBody;
use crate::config::McpServerConfig;
use crate::error::TransportError;
use crate::message::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
use crate::model::{
    CallToolResult, InitializeResult, ListResourceTemplatesResult, ListResourcesResult,
    ListToolsResult, PROTOCOL_VERSION, ReadResourceResult, ResourceContents, ResourceTemplate,
    ServerCapabilities, ServerInfo, ToolInfo,
};
use crate::session::SessionRegistry;
use crate::sse::{SseEvent, keepalive_frame};

/// Reads resources addressed by URI.
///
/// Implementations back `resources/templates/list` and `resources/read`.
/// Read failures become JSON-RPC errors on the wire, so the returned
/// error should carry the full story.
pub trait ResourceReader: Send + Sync + 'static {
    /// Templates advertised by `resources/templates/list`.
    fn templates(&self) -> Vec<ResourceTemplate>;

    /// Read the resource at `uri`.
    fn read(
        &self,
        uri: String,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ResourceContents>> + Send>>;
}

/// A resource surface with no templates and no readable URIs.
///
/// Useful for serving a tools-only registry or testing the transport in
/// isolation.
#[derive(Debug, Clone, Default)]
pub struct NoResources;

impl ResourceReader for NoResources {
    fn templates(&self) -> Vec<ResourceTemplate> {
        Vec::new()
    }

    fn read(
        &self,
        uri: String,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ResourceContents>> + Send>> {
        Box::pin(async move { Err(anyhow::anyhow!("no resource matches {uri}")) })
    }
}

/// The SSE transport service.
///
/// # Type Parameters
///
/// - `R`: The resource surface implementing [`ResourceReader`].
#[derive(Debug)]
pub struct McpSseService<R: ResourceReader> {
    registry: Arc<ToolRegistry>,
    resources: Arc<R>,
    sessions: SessionRegistry,
    config: Arc<McpServerConfig>,
}

impl<R: ResourceReader> McpSseService<R> {
    /// Create a service over the given registry and resource surface.
    #[must_use]
    pub fn new(registry: ToolRegistry, resources: R, config: McpServerConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            resources: Arc::new(resources),
            sessions: SessionRegistry::new(),
            config: Arc::new(config),
        }
    }

    /// The live session registry.
    ///
    /// Shutdown paths call [`SessionRegistry::close_all`] on it to end
    /// open streams so connections can drain.
    #[must_use]
    pub fn sessions(&self) -> SessionRegistry {
        self.sessions.clone()
    }
}

impl<R: ResourceReader> Clone for McpSseService<R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            resources: Arc::clone(&self.resources),
            sessions: self.sessions.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R: ResourceReader> Service<http::Request<Incoming>> for McpSseService<R> {
    type Response = http::Response<SseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let registry = Arc::clone(&self.registry);
        let resources = Arc::clone(&self.resources);
        let sessions = self.sessions.clone();
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let response = route_request(req, registry, resources, sessions, config).await;
            Ok(response)
        })
    }
}

/// Route an incoming HTTP request to its transport operation.
async fn route_request<R: ResourceReader>(
    req: http::Request<Incoming>,
    registry: Arc<ToolRegistry>,
    resources: Arc<R>,
    sessions: SessionRegistry,
    config: Arc<McpServerConfig>,
) -> http::Response<SseBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    debug!(%method, path, "processing transport request");

    if method == http::Method::GET && path == "/sse" {
        return open_stream(&sessions, &config).await;
    }
    if method == http::Method::POST && path == "/messages" {
        return match accept_message(req, registry, resources, sessions, config).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "rejected inbound frame");
                text_response(err.status(), &err.to_string())
            }
        };
    }
    if method == http::Method::GET && path == "/health" {
        return health_response();
    }

    text_response(http::StatusCode::NOT_FOUND, "not found")
}

/// Open a session and respond with its event stream.
///
/// The first event announces the message endpoint; a background task
/// then emits keepalive comments until the stream goes away.
async fn open_stream(
    sessions: &SessionRegistry,
    config: &McpServerConfig,
) -> http::Response<SseBody> {
    let (rx, guard) = sessions.open();
    let session_id = guard.id().to_owned();

    let Some(handle) = sessions.get(&session_id) else {
        error!(session_id = %session_id, "freshly opened session disappeared");
        return text_response(
            http::StatusCode::INTERNAL_SERVER_ERROR,
            "failed to open session",
        );
    };

    let endpoint = format!("/messages?session_id={session_id}");
    let _ = handle.send(SseEvent::new("endpoint", endpoint).encode()).await;

    if config.keepalive_secs > 0 {
        let weak = handle.weak_sender();
        let period = Duration::from_secs(config.keepalive_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(tx) = weak.upgrade() else { break };
                if tx.send(keepalive_frame()).await.is_err() {
                    break;
                }
            }
        });
    }

    info!(session_id = %session_id, "sse session opened");

    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "text/event-stream")
        .header(http::header::CACHE_CONTROL, "no-cache")
        .body(SseBody::stream(rx, guard))
        .expect("static stream response should be valid")
}

/// Accept one JSON-RPC frame for a session.
///
/// The frame is acknowledged with `202 Accepted` immediately; handling
/// runs on a background task under the session's dispatch gate and the
/// response is delivered as a `message` event on the stream.
async fn accept_message<R: ResourceReader>(
    req: http::Request<Incoming>,
    registry: Arc<ToolRegistry>,
    resources: Arc<R>,
    sessions: SessionRegistry,
    config: Arc<McpServerConfig>,
) -> Result<http::Response<SseBody>, TransportError> {
    let session_id = req
        .uri()
        .query()
        .and_then(|query| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(name, _)| name == "session_id")
                .map(|(_, value)| value.into_owned())
        })
        .ok_or(TransportError::MissingSessionId)?;

    let handle = sessions
        .get(&session_id)
        .ok_or_else(|| TransportError::UnknownSession(session_id.clone()))?;

    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|_| TransportError::Malformed)?
        .to_bytes();
    let frame: JsonRpcRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!(session_id = %session_id, error = %e, "unparseable frame");
        TransportError::Malformed
    })?;

    debug!(session_id = %session_id, method = %frame.method, "accepted frame");

    tokio::spawn(async move {
        let _gate = handle.acquire_gate().await;
        if let Some(wire) = handle_frame(frame, &registry, resources.as_ref(), &config).await {
            let event = SseEvent::new("message", wire).encode();
            if !handle.send(event).await {
                debug!(session_id = %session_id, "stream closed before response delivery");
            }
        }
    });

    Ok(text_response(http::StatusCode::ACCEPTED, "Accepted"))
}

/// Handle one frame, returning the encoded response for requests and
/// `None` for notifications.
async fn handle_frame<R: ResourceReader>(
    frame: JsonRpcRequest,
    registry: &ToolRegistry,
    resources: &R,
    config: &McpServerConfig,
) -> Option<String> {
    let Some(id) = frame.id else {
        handle_notification(&frame.method);
        return None;
    };

    let response = match frame.method.as_str() {
        "initialize" => initialize_response(id, frame.params.as_ref(), config),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => list_tools_response(id, registry),
        "tools/call" => call_tool_response(id, frame.params, registry).await,
        "resources/list" => success_payload(id, &ListResourcesResult { resources: vec![] }),
        "resources/templates/list" => success_payload(
            id,
            &ListResourceTemplatesResult {
                resource_templates: resources.templates(),
            },
        ),
        "resources/read" => read_resource_response(id, frame.params, resources).await,
        other => {
            warn!(method = other, "unknown method");
            JsonRpcResponse::error(id, JsonRpcError::method_not_found(other))
        }
    };

    serde_json::to_string(&response)
        .inspect_err(|e| error!(error = %e, "failed to encode response frame"))
        .ok()
}

/// Log a notification; the transport never answers them.
fn handle_notification(method: &str) {
    match method {
        "notifications/initialized" => debug!("client initialized"),
        other => debug!(method = other, "ignoring notification"),
    }
}

/// Answer `initialize` with the server's identity and capabilities.
fn initialize_response(
    id: RequestId,
    params: Option<&Value>,
    config: &McpServerConfig,
) -> JsonRpcResponse {
    let client = params
        .and_then(|p| p.pointer("/clientInfo/name"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    info!(client, "initialize handshake");

    success_payload(
        id,
        &InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            capabilities: ServerCapabilities::tools_and_resources(),
            server_info: ServerInfo {
                name: config.server_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
            },
            instructions: config.instructions.clone(),
        },
    )
}

/// Answer `tools/list` with every registered descriptor.
fn list_tools_response(id: RequestId, registry: &ToolRegistry) -> JsonRpcResponse {
    let tools: Vec<ToolInfo> = registry.descriptors().into_iter().map(ToolInfo::from).collect();
    success_payload(id, &ListToolsResult { tools })
}

/// Answer `tools/call` by dispatching through the registry.
///
/// Only envelope problems produce JSON-RPC errors here; tool failures
/// come back as results with `isError` set.
async fn call_tool_response(
    id: RequestId,
    params: Option<Value>,
    registry: &ToolRegistry,
) -> JsonRpcResponse {
    let Some(Value::Object(params)) = params else {
        return JsonRpcResponse::error(
            id,
            JsonRpcError::invalid_params("tools/call requires an object with name and arguments"),
        );
    };
    let Some(name) = params.get("name").and_then(Value::as_str).map(str::to_owned) else {
        return JsonRpcResponse::error(
            id,
            JsonRpcError::invalid_params("tools/call requires a tool name"),
        );
    };
    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => ToolArguments::new(),
        Some(Value::Object(map)) => ToolArguments::from(map.clone()),
        Some(_) => {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params("tools/call arguments must be an object"),
            );
        }
    };

    let outcome = registry
        .dispatch(ToolCallRequest::new(&name, arguments))
        .await;
    success_payload(id, &CallToolResult::from(outcome))
}

/// Answer `resources/read`; read failures become JSON-RPC errors.
async fn read_resource_response<R: ResourceReader>(
    id: RequestId,
    params: Option<Value>,
    resources: &R,
) -> JsonRpcResponse {
    let uri = params
        .as_ref()
        .and_then(|p| p.pointer("/uri"))
        .and_then(Value::as_str)
        .map(str::to_owned);
    let Some(uri) = uri else {
        return JsonRpcResponse::error(
            id,
            JsonRpcError::invalid_params("resources/read requires a uri"),
        );
    };

    match resources.read(uri).await {
        Ok(contents) => success_payload(
            id,
            &ReadResourceResult {
                contents: vec![contents],
            },
        ),
        Err(e) => {
            warn!(error = %e, "resource read failed");
            JsonRpcResponse::error(id, JsonRpcError::internal(format!("{e:#}")))
        }
    }
}

/// Encode a payload into a success response.
fn success_payload<T: serde::Serialize>(id: RequestId, payload: &T) -> JsonRpcResponse {
    match serde_json::to_value(payload) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            error!(error = %e, "failed to encode result payload");
            JsonRpcResponse::error(id, JsonRpcError::internal("failed to encode result payload"))
        }
    }
}

/// Produce a plain-text response.
fn text_response(status: http::StatusCode, message: &str) -> http::Response<SseBody> {
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(SseBody::from_string(message))
        .expect("static text response should be valid")
}

/// Produce a health check response.
fn health_response() -> http::Response<SseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(SseBody::from_string(
            r#"{"status":"running","service":"rustbucket"}"#,
        ))
        .expect("static health response should be valid")
}
