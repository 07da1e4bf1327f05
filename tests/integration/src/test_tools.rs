//! Tool-surface tests over the in-process transport.
//!
//! Every test here goes through the full path: client POST, SSE
//! response frame, dispatcher, and the memory-backed store.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
    use serde_json::json;

    use rustbucket_core::{ContentEncoding, ToolOutcome, ToolPayload};

    use crate::{MemoryStore, connect_client, expect_structured, spawn_server, tool_args};

    #[tokio::test]
    async fn test_should_round_trip_text_through_the_tool_surface() {
        let store = Arc::new(MemoryStore::with_buckets(&["data"]));
        let server = spawn_server(Arc::clone(&store)).await;
        let client = connect_client(&server).await;

        let put = client
            .call_tool(
                "PutObject",
                tool_args(&[
                    ("bucket", json!("data")),
                    ("key", json!("notes/hello.txt")),
                    ("content", json!("hello world")),
                ]),
            )
            .await
            .expect("put call");
        assert_eq!(expect_structured(put)["status"], "success");
        assert_eq!(
            store.object_bytes("data", "notes/hello.txt").as_deref(),
            Some(b"hello world".as_slice())
        );

        let got = client
            .call_tool(
                "GetObject",
                tool_args(&[
                    ("bucket", json!("data")),
                    ("key", json!("notes/hello.txt")),
                ]),
            )
            .await
            .expect("get call");
        assert_eq!(
            got,
            ToolOutcome::Success(ToolPayload::Text("hello world".to_owned()))
        );

        client.close();
    }

    #[tokio::test]
    async fn test_should_round_trip_binary_content_as_base64() {
        let png: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        let store = Arc::new(MemoryStore::with_buckets(&["assets"]));
        let server = spawn_server(Arc::clone(&store)).await;
        let client = connect_client(&server).await;

        let put = client
            .call_tool(
                "PutObject",
                tool_args(&[
                    ("bucket", json!("assets")),
                    ("key", json!("logo.png")),
                    ("content", json!(BASE64_STANDARD.encode(png))),
                    ("content_type", json!("image/png")),
                    ("is_base64", json!(true)),
                ]),
            )
            .await
            .expect("put call");
        assert!(!put.is_failure());
        assert_eq!(store.object_bytes("assets", "logo.png").as_deref(), Some(png));

        let got = client
            .call_tool(
                "GetObject",
                tool_args(&[("bucket", json!("assets")), ("key", json!("logo.png"))]),
            )
            .await
            .expect("get call");
        let ToolOutcome::Success(ToolPayload::Binary(object)) = got else {
            panic!("expected binary payload, got {got:?}");
        };
        assert_eq!(object.encoding, ContentEncoding::Base64);
        assert_eq!(object.content_type.as_deref(), Some("image/png"));
        assert_eq!(object.size_bytes, png.len() as u64);
        let decoded = BASE64_STANDARD
            .decode(object.content.as_bytes())
            .expect("payload decodes");
        assert_eq!(decoded, png);
    }

    #[tokio::test]
    async fn test_should_fall_back_to_base64_when_a_text_key_is_not_utf8() {
        let raw: &[u8] = &[0xFF, 0xFE, 0x00, 0x01];
        let store = Arc::new(MemoryStore::with_buckets(&["data"]));
        store.add_object("data", "legacy.txt", raw, None);
        let server = spawn_server(store).await;
        let client = connect_client(&server).await;

        let got = client
            .call_tool(
                "GetObject",
                tool_args(&[("bucket", json!("data")), ("key", json!("legacy.txt"))]),
            )
            .await
            .expect("get call");
        let ToolOutcome::Success(ToolPayload::Binary(object)) = got else {
            panic!("expected binary payload, got {got:?}");
        };
        assert_eq!(object.encoding, ContentEncoding::Base64);
        let decoded = BASE64_STANDARD
            .decode(object.content.as_bytes())
            .expect("payload decodes");
        assert_eq!(decoded, raw);
    }

    #[tokio::test]
    async fn test_should_treat_forced_bucket_deletion_as_idempotent() {
        let store = Arc::new(MemoryStore::with_buckets(&["doomed"]));
        store.add_object("doomed", "a.txt", b"x", None);
        let server = spawn_server(Arc::clone(&store)).await;
        let client = connect_client(&server).await;

        let args = || tool_args(&[("bucket", json!("doomed")), ("force", json!(true))]);

        let first = client
            .call_tool("DeleteBucket", args())
            .await
            .expect("first delete");
        let value = expect_structured(first);
        assert_eq!(value["status"], "success");
        assert_eq!(value["message"], "Bucket doomed deleted");

        let second = client
            .call_tool("DeleteBucket", args())
            .await
            .expect("second delete");
        let value = expect_structured(second);
        assert_eq!(value["status"], "success");
        assert_eq!(value["message"], "Bucket doomed does not exist");
    }

    #[tokio::test]
    async fn test_should_refuse_plain_deletion_of_a_nonempty_bucket() {
        let store = Arc::new(MemoryStore::with_buckets(&["busy"]));
        store.add_object("busy", "keep.txt", b"data", None);
        let server = spawn_server(Arc::clone(&store)).await;
        let client = connect_client(&server).await;

        let outcome = client
            .call_tool("DeleteBucket", tool_args(&[("bucket", json!("busy"))]))
            .await
            .expect("delete call");
        assert_eq!(
            outcome,
            ToolOutcome::Failure(
                "Failed to delete bucket: BucketNotEmpty: \
                 The bucket you tried to delete is not empty"
                    .to_owned()
            )
        );
        assert_eq!(store.object_count("busy"), 1);
    }

    #[tokio::test]
    async fn test_should_list_objects_with_prefix_and_cap() {
        let store = Arc::new(MemoryStore::with_buckets(&["logs"]));
        for i in 1..=12 {
            store.add_object("logs", &format!("2024/{i:02}.log"), b"line", None);
        }
        store.add_object("logs", "misc/readme.md", b"notes", None);
        let server = spawn_server(store).await;
        let client = connect_client(&server).await;

        let capped = client
            .call_tool(
                "ListObjects",
                tool_args(&[
                    ("bucket", json!("logs")),
                    ("prefix", json!("2024/")),
                    ("max_keys", json!(5)),
                ]),
            )
            .await
            .expect("capped listing");
        let value = expect_structured(capped);
        let objects = value["objects"].as_array().expect("objects array");
        assert_eq!(objects.len(), 5);
        assert!(
            objects
                .iter()
                .all(|o| o["Key"].as_str().is_some_and(|k| k.starts_with("2024/")))
        );

        let full = client
            .call_tool("ListObjects", tool_args(&[("bucket", json!("logs"))]))
            .await
            .expect("full listing");
        let value = expect_structured(full);
        assert_eq!(value["objects"].as_array().expect("objects array").len(), 13);
    }

    #[tokio::test]
    async fn test_should_surface_missing_key_as_tool_failure() {
        let store = Arc::new(MemoryStore::with_buckets(&["data"]));
        let server = spawn_server(store).await;
        let client = connect_client(&server).await;

        let outcome = client
            .call_tool(
                "GetObject",
                tool_args(&[("bucket", json!("data")), ("key", json!("absent.txt"))]),
            )
            .await
            .expect("get call");
        assert_eq!(
            outcome,
            ToolOutcome::Failure(
                "Failed to get object: NoSuchKey: The specified key does not exist".to_owned()
            )
        );
    }

    #[tokio::test]
    async fn test_should_fail_unknown_tool_without_breaking_the_session() {
        let store = Arc::new(MemoryStore::with_buckets(&["data"]));
        let server = spawn_server(store).await;
        let client = connect_client(&server).await;

        let outcome = client
            .call_tool("Teleport", tool_args(&[]))
            .await
            .expect("unknown tool call");
        assert_eq!(outcome, ToolOutcome::Failure("unknown tool: Teleport".to_owned()));

        // The session survives the failed call.
        client.ping().await.expect("ping after failure");
        let listed = client
            .call_tool("ListBuckets", tool_args(&[]))
            .await
            .expect("list call");
        assert!(!listed.is_failure());
    }

    #[tokio::test]
    async fn test_should_validate_arguments_before_dispatch() {
        let store = Arc::new(MemoryStore::new());
        let server = spawn_server(store).await;
        let client = connect_client(&server).await;

        let missing = client
            .call_tool("CreateBucket", tool_args(&[]))
            .await
            .expect("call without arguments");
        assert_eq!(
            missing,
            ToolOutcome::Failure("tool CreateBucket requires argument bucket".to_owned())
        );

        let mistyped = client
            .call_tool("CreateBucket", tool_args(&[("bucket", json!(42))]))
            .await
            .expect("call with wrong type");
        assert_eq!(
            mistyped,
            ToolOutcome::Failure("tool CreateBucket argument bucket must be a string".to_owned())
        );
    }

    #[tokio::test]
    async fn test_should_record_bucket_region_from_create() {
        let store = Arc::new(MemoryStore::new());
        let server = spawn_server(Arc::clone(&store)).await;
        let client = connect_client(&server).await;

        let explicit = client
            .call_tool(
                "CreateBucket",
                tool_args(&[("bucket", json!("eu-data")), ("region", json!("eu-west-1"))]),
            )
            .await
            .expect("create with region");
        let value = expect_structured(explicit);
        assert_eq!(value["status"], "success");
        assert_eq!(value["bucket"], "eu-data");
        assert_eq!(store.region_of("eu-data").as_deref(), Some("eu-west-1"));

        let defaulted = client
            .call_tool("CreateBucket", tool_args(&[("bucket", json!("plain"))]))
            .await
            .expect("create without region");
        assert!(!defaulted.is_failure());
        assert_eq!(store.region_of("plain").as_deref(), Some("us-east-1"));
    }

    #[tokio::test]
    async fn test_should_list_buckets_sorted_by_name() {
        let store = Arc::new(MemoryStore::with_buckets(&["zulu", "alpha", "mike"]));
        let server = spawn_server(store).await;
        let client = connect_client(&server).await;

        let outcome = client
            .call_tool("ListBuckets", tool_args(&[]))
            .await
            .expect("list call");
        let value = expect_structured(outcome);
        let names: Vec<&str> = value["buckets"]
            .as_array()
            .expect("buckets array")
            .iter()
            .filter_map(|b| b["Name"].as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "mike", "zulu"]);
    }

    #[tokio::test]
    async fn test_should_advertise_all_tools_in_registration_order() {
        let store = Arc::new(MemoryStore::new());
        let server = spawn_server(store).await;
        let client = connect_client(&server).await;

        let tools = client.list_tools().await.expect("tools listing");
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "ListBuckets",
                "CreateBucket",
                "DeleteBucket",
                "ListObjects",
                "GetObject",
                "PutObject",
                "DeleteObject",
            ]
        );

        let create = &tools[1];
        assert_eq!(create.description, "Create a new S3 bucket");
        assert_eq!(create.input_schema["type"], "object");
        assert_eq!(create.input_schema["required"], json!(["bucket"]));
        assert!(create.input_schema["properties"]["region"].is_object());
    }
}
