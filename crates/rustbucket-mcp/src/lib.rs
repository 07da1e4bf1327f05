//! JSON-RPC over SSE transport for the rustbucket tool server.
//!
//! This crate provides both halves of the channel. It handles:
//!
//! - **Wire messages** ([`message`]): JSON-RPC 2.0 request, response, and
//!   error frames with the standard error codes.
//!
//! - **Protocol model** ([`model`]): the typed payloads exchanged during
//!   `initialize`, `tools/list`, `tools/call`, and the `resources/*`
//!   methods, including the conversions between
//!   [`ToolOutcome`](rustbucket_core::ToolOutcome) and its wire form.
//!
//! - **SSE framing** ([`sse`]): the event encoder the server writes with
//!   and the incremental decoder the client reads with.
//!
//! - **Sessions** ([`session`]): the registry mapping session ids to live
//!   stream senders, with a per-session dispatch gate.
//!
//! - **Server** ([`server`]): the [`McpSseService`](server::McpSseService)
//!   that implements hyper's `Service` trait, tying sessions, dispatch,
//!   and framing together.
//!
//! - **Client** ([`client`]): the [`McpClient`](client::McpClient) used by
//!   the interactive CLI and the integration tests.
//!
//! # Architecture
//!
//! ```text
//! GET /sse
//!   -> McpSseService (hyper Service)
//!     -> SessionRegistry opens a session
//!     -> `endpoint` event, then keepalive comments
//!   <- 200 text/event-stream (held open)
//!
//! POST /messages?session_id=...
//!   -> session lookup + JSON-RPC frame parse
//!   -> background dispatch under the session's gate
//!   <- 202 Accepted (response arrives as a `message` event)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use rustbucket_core::ToolRegistry;
//! use rustbucket_mcp::{McpServerConfig, McpSseService, NoResources};
//!
//! let registry = ToolRegistry::new();
//! let service = McpSseService::new(registry, NoResources, McpServerConfig::default());
//! // Serve `service` with hyper.
//! ```

pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod model;
pub mod server;
pub mod session;
pub mod sse;

// Re-export key types for convenience.
pub use body::SseBody;
pub use client::McpClient;
pub use config::McpServerConfig;
pub use error::{ClientError, ClientResult, TransportError};
pub use message::{JSONRPC_VERSION, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
pub use model::{
    CallToolResult, ContentBlock, InitializeResult, ListResourceTemplatesResult,
    ListResourcesResult, ListToolsResult, PROTOCOL_VERSION, ReadResourceResult, Resource,
    ResourceContents, ResourceTemplate, ResourcesCapability, ServerCapabilities, ServerInfo,
    ToolInfo, ToolsCapability,
};
pub use server::{McpSseService, NoResources, ResourceReader};
pub use session::{SessionGuard, SessionHandle, SessionRegistry};
pub use sse::{SseDecoder, SseEvent, keepalive_frame};
