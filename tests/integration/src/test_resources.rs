//! Resource-surface tests over the in-process transport.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rustbucket_mcp::{ClientError, JsonRpcError};
    use rustbucket_s3::{S3ResourceRouter, S3_URI_TEMPLATE};

    use crate::{MemoryStore, connect_client, spawn_server};

    #[tokio::test]
    async fn test_should_advertise_the_s3_uri_template() {
        let server = spawn_server(Arc::new(MemoryStore::new())).await;
        let client = connect_client(&server).await;

        let templates = client
            .list_resource_templates()
            .await
            .expect("templates listing");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].uri_template, S3_URI_TEMPLATE);
        assert_eq!(templates[0].name, S3ResourceRouter::TEMPLATE_NAME);
        assert_eq!(
            templates[0].description.as_deref(),
            Some(S3ResourceRouter::TEMPLATE_DESCRIPTION)
        );

        let resources = client.list_resources().await.expect("resources listing");
        assert!(resources.is_empty());
    }

    #[tokio::test]
    async fn test_should_read_text_resources() {
        let store = Arc::new(MemoryStore::with_buckets(&["data"]));
        store.add_object("data", "hello.txt", b"hello world", Some("text/plain"));
        let server = spawn_server(store).await;
        let client = connect_client(&server).await;

        let result = client
            .read_resource("s3://data/hello.txt")
            .await
            .expect("resource read");
        assert_eq!(result.contents.len(), 1);
        assert_eq!(result.contents[0].uri, "s3://data/hello.txt");
        assert_eq!(result.contents[0].mime_type.as_deref(), Some("text/plain"));
        assert_eq!(result.contents[0].text, "hello world");
    }

    #[tokio::test]
    async fn test_should_read_binary_resources_as_base64() {
        let store = Arc::new(MemoryStore::with_buckets(&["data"]));
        store.add_object("data", "logo.png", &[0x89, 0x50, 0x4E, 0x47], None);
        let server = spawn_server(store).await;
        let client = connect_client(&server).await;

        let result = client
            .read_resource("s3://data/logo.png")
            .await
            .expect("resource read");
        assert_eq!(result.contents[0].text, "iVBORw==");
        assert_eq!(
            result.contents[0].mime_type.as_deref(),
            Some("application/octet-stream")
        );
    }

    #[tokio::test]
    async fn test_should_percent_decode_resource_keys() {
        let store = Arc::new(MemoryStore::with_buckets(&["data"]));
        store.add_object("data", "quarterly report.txt", b"numbers", Some("text/plain"));
        let server = spawn_server(store).await;
        let client = connect_client(&server).await;

        let result = client
            .read_resource("s3://data/quarterly%20report.txt")
            .await
            .expect("resource read");
        assert_eq!(result.contents[0].text, "numbers");
        assert_eq!(result.contents[0].uri, "s3://data/quarterly%20report.txt");
    }

    #[tokio::test]
    async fn test_should_report_missing_objects_as_rpc_errors() {
        let store = Arc::new(MemoryStore::with_buckets(&["data"]));
        let server = spawn_server(store).await;
        let client = connect_client(&server).await;

        let err = client
            .read_resource("s3://data/none.txt")
            .await
            .expect_err("missing object should fail");
        let ClientError::Rpc(rpc) = err else {
            panic!("expected an rpc error, got {err:?}");
        };
        assert_eq!(rpc.code, JsonRpcError::INTERNAL_ERROR);
        assert_eq!(
            rpc.message,
            "Error reading S3 object: NoSuchKey: The specified key does not exist"
        );
    }

    #[tokio::test]
    async fn test_should_reject_foreign_uri_schemes() {
        let server = spawn_server(Arc::new(MemoryStore::new())).await;
        let client = connect_client(&server).await;

        let err = client
            .read_resource("http://example.com/x")
            .await
            .expect_err("foreign scheme should fail");
        let ClientError::Rpc(rpc) = err else {
            panic!("expected an rpc error, got {err:?}");
        };
        assert_eq!(rpc.code, JsonRpcError::INTERNAL_ERROR);
        assert_eq!(
            rpc.message,
            "resource URI must match s3://{bucket}/{key}: http://example.com/x"
        );
    }
}
