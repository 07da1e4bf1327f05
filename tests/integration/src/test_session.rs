//! Session and transport behavior tests against raw HTTP.
//!
//! These bypass [`McpClient`](rustbucket_mcp::McpClient) where the point
//! is the wire itself: status codes, event ordering, and session
//! lifecycle.

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::{Value, json};
    use tokio::sync::Notify;

    use rustbucket_core::{ToolArguments, ToolDescriptor, ToolHandler, ToolPayload, ToolRegistry};
    use rustbucket_mcp::{
        McpClient, McpServerConfig, McpSseService, NoResources, PROTOCOL_VERSION, SseDecoder,
        SseEvent,
    };

    use crate::{MemoryStore, TestServer, connect_client, spawn_server, spawn_service};

    const EVENT_DEADLINE: Duration = Duration::from_secs(5);

    /// An open `/sse` response with incremental event decoding.
    struct RawStream {
        response: reqwest::Response,
        decoder: SseDecoder,
        queued: VecDeque<SseEvent>,
    }

    impl RawStream {
        async fn open(server: &TestServer) -> Self {
            let response = reqwest::Client::new()
                .get(server.sse_url())
                .header("accept", "text/event-stream")
                .send()
                .await
                .expect("open stream");
            assert_eq!(response.status(), reqwest::StatusCode::OK);
            assert_eq!(
                response
                    .headers()
                    .get("content-type")
                    .and_then(|v| v.to_str().ok()),
                Some("text/event-stream")
            );

            Self {
                response,
                decoder: SseDecoder::new(),
                queued: VecDeque::new(),
            }
        }

        async fn next_event(&mut self) -> SseEvent {
            loop {
                if let Some(event) = self.queued.pop_front() {
                    return event;
                }
                let chunk = tokio::time::timeout(EVENT_DEADLINE, self.response.chunk())
                    .await
                    .expect("no event within deadline")
                    .expect("stream read")
                    .expect("stream ended early");
                self.queued.extend(self.decoder.feed(&chunk));
            }
        }

        /// Read the endpoint announcement and return the absolute URL to
        /// post frames to.
        async fn message_url(&mut self, server: &TestServer) -> String {
            let endpoint = self.next_event().await;
            assert_eq!(endpoint.event, "endpoint");
            assert!(endpoint.data.starts_with("/messages?session_id="));
            format!("{}{}", server.base_url, endpoint.data)
        }

        /// Read the next `message` event as parsed JSON.
        async fn next_response(&mut self) -> Value {
            let event = self.next_event().await;
            assert_eq!(event.event, "message");
            serde_json::from_str(&event.data).expect("response frame is json")
        }
    }

    async fn post_frame(url: &str, frame: &Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(url)
            .json(frame)
            .send()
            .await
            .expect("post frame")
    }

    #[tokio::test]
    async fn test_should_announce_the_endpoint_as_the_first_event() {
        let server = spawn_server(Arc::new(MemoryStore::new())).await;
        let mut stream = RawStream::open(&server).await;

        let endpoint = stream.next_event().await;
        assert_eq!(endpoint.event, "endpoint");
        let session_id = endpoint
            .data
            .strip_prefix("/messages?session_id=")
            .expect("endpoint carries a session id");
        uuid::Uuid::parse_str(session_id).expect("session id is a uuid");
        assert_eq!(server.sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_should_acknowledge_frames_and_answer_on_the_stream() {
        let server = spawn_server(Arc::new(MemoryStore::new())).await;
        let mut stream = RawStream::open(&server).await;
        let url = stream.message_url(&server).await;

        let ack = post_frame(&url, &json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})).await;
        assert_eq!(ack.status(), reqwest::StatusCode::ACCEPTED);
        assert_eq!(ack.text().await.expect("ack body"), "Accepted");

        let response = stream.next_response().await;
        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"], json!({}));
    }

    #[tokio::test]
    async fn test_should_reject_posts_without_a_session_id() {
        let server = spawn_server(Arc::new(MemoryStore::new())).await;

        let response = post_frame(
            &server.messages_url(""),
            &json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
        )
        .await;
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(
            response.text().await.expect("error body"),
            "missing session_id query parameter"
        );
    }

    #[tokio::test]
    async fn test_should_reject_posts_for_unknown_sessions() {
        let server = spawn_server(Arc::new(MemoryStore::new())).await;

        let response = post_frame(
            &server.messages_url("?session_id=ghost"),
            &json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
        )
        .await;
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
        assert_eq!(
            response.text().await.expect("error body"),
            "unknown session: ghost"
        );
    }

    #[tokio::test]
    async fn test_should_reject_unparseable_frames() {
        let server = spawn_server(Arc::new(MemoryStore::new())).await;
        let mut stream = RawStream::open(&server).await;
        let url = stream.message_url(&server).await;

        let response = reqwest::Client::new()
            .post(&url)
            .header("content-type", "application/json")
            .body("definitely not json")
            .send()
            .await
            .expect("post garbage");
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(
            response.text().await.expect("error body"),
            "Could not parse message"
        );

        // The session stays usable afterwards.
        let ack = post_frame(&url, &json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})).await;
        assert_eq!(ack.status(), reqwest::StatusCode::ACCEPTED);
        assert_eq!(stream.next_response().await["id"], 1);
    }

    #[tokio::test]
    async fn test_should_answer_unknown_methods_with_method_not_found() {
        let server = spawn_server(Arc::new(MemoryStore::new())).await;
        let mut stream = RawStream::open(&server).await;
        let url = stream.message_url(&server).await;

        let ack = post_frame(
            &url,
            &json!({"jsonrpc": "2.0", "id": 5, "method": "bogus/method"}),
        )
        .await;
        assert_eq!(ack.status(), reqwest::StatusCode::ACCEPTED);

        let response = stream.next_response().await;
        assert_eq!(response["id"], 5);
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["error"]["message"], "Method not found: bogus/method");
    }

    #[tokio::test]
    async fn test_should_swallow_notifications() {
        let server = spawn_server(Arc::new(MemoryStore::new())).await;
        let mut stream = RawStream::open(&server).await;
        let url = stream.message_url(&server).await;

        let ack = post_frame(
            &url,
            &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await;
        assert_eq!(ack.status(), reqwest::StatusCode::ACCEPTED);

        // The next frame on the stream answers the ping, not the
        // notification.
        let ack = post_frame(&url, &json!({"jsonrpc": "2.0", "id": 7, "method": "ping"})).await;
        assert_eq!(ack.status(), reqwest::StatusCode::ACCEPTED);
        assert_eq!(stream.next_response().await["id"], 7);
    }

    #[tokio::test]
    async fn test_should_complete_the_initialize_handshake() {
        let server = spawn_server(Arc::new(MemoryStore::new())).await;

        let mut client = McpClient::connect(&server.sse_url())
            .await
            .expect("client connects");
        let init = client.initialize().await.expect("handshake");

        assert_eq!(init.protocol_version, PROTOCOL_VERSION);
        assert_eq!(init.server_info.name, "rustbucket-test");
        assert!(init.capabilities.tools.is_some());
        assert!(init.capabilities.resources.is_some());
        assert_eq!(init.instructions, None);
        assert_eq!(client.server_info(), Some(&init));
    }

    #[tokio::test]
    async fn test_should_report_health_without_a_session() {
        let server = spawn_server(Arc::new(MemoryStore::new())).await;

        let response = reqwest::get(format!("{}/health", server.base_url))
            .await
            .expect("health request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response.text().await.expect("health body"),
            r#"{"status":"running","service":"rustbucket"}"#
        );

        let missing = reqwest::get(format!("{}/nowhere", server.base_url))
            .await
            .expect("request");
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    }

    /// Tool that signals when it starts and then stalls, keeping the
    /// session's dispatch gate held.
    struct SlowTool {
        started: Arc<Notify>,
    }

    impl ToolHandler for SlowTool {
        fn call(
            &self,
            _args: ToolArguments,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolPayload>> + Send>> {
            let started = Arc::clone(&self.started);
            Box::pin(async move {
                started.notify_one();
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(ToolPayload::Text("slow done".to_owned()))
            })
        }
    }

    #[tokio::test]
    async fn test_should_serialize_dispatch_within_a_session() {
        let started = Arc::new(Notify::new());
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolDescriptor::new("Slow", "Signals, stalls, then answers"),
                SlowTool {
                    started: Arc::clone(&started),
                },
            )
            .expect("register tool");

        let config = McpServerConfig::builder().keepalive_secs(0).build();
        let server = spawn_service(McpSseService::new(registry, NoResources, config)).await;
        let mut stream = RawStream::open(&server).await;
        let url = stream.message_url(&server).await;

        let slow = post_frame(
            &url,
            &json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": {"name": "Slow", "arguments": {}},
            }),
        )
        .await;
        assert_eq!(slow.status(), reqwest::StatusCode::ACCEPTED);

        // Post the ping only once the slow call holds the gate; its
        // response must still come second.
        started.notified().await;
        let fast = post_frame(&url, &json!({"jsonrpc": "2.0", "id": 2, "method": "ping"})).await;
        assert_eq!(fast.status(), reqwest::StatusCode::ACCEPTED);

        let first = stream.next_response().await;
        assert_eq!(first["id"], 1);
        assert_eq!(first["result"]["content"][0]["text"], "slow done");
        let second = stream.next_response().await;
        assert_eq!(second["id"], 2);
        assert_eq!(second["result"], json!({}));
    }

    #[tokio::test]
    async fn test_should_close_the_session_when_its_stream_drops() {
        let server = spawn_server(Arc::new(MemoryStore::new())).await;
        let mut stream = RawStream::open(&server).await;
        let url = stream.message_url(&server).await;
        assert_eq!(server.sessions().len(), 1);

        drop(stream);

        // The disconnect has to propagate through the connection task.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let status = post_frame(&url, &json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
                .await
                .status();
            if status == reqwest::StatusCode::NOT_FOUND {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "session outlived its stream"
            );
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        assert!(server.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_should_fail_calls_after_sessions_close() {
        let server = spawn_server(Arc::new(MemoryStore::new())).await;
        let client = connect_client(&server).await;

        server.sessions().close_all();
        assert!(server.sessions().is_empty());
        assert!(client.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_should_emit_keepalive_comments_on_idle_streams() {
        let config = McpServerConfig::builder().keepalive_secs(1).build();
        let server = spawn_service(McpSseService::new(
            ToolRegistry::new(),
            NoResources,
            config,
        ))
        .await;

        let mut response = reqwest::Client::new()
            .get(server.sse_url())
            .send()
            .await
            .expect("open stream");

        let mut seen = String::new();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(4);
        while !seen.contains(": keepalive") {
            assert!(
                tokio::time::Instant::now() < deadline,
                "no keepalive within deadline"
            );
            let chunk = tokio::time::timeout(EVENT_DEADLINE, response.chunk())
                .await
                .expect("chunk within deadline")
                .expect("stream read")
                .expect("stream still open");
            seen.push_str(&String::from_utf8_lossy(&chunk));
        }
    }
}
