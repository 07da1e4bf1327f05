//! Rustbucket CLI - interactive client for the rustbucket server.
//!
//! Connects to a running server over SSE, lists the tools it offers, and
//! drives the bucket and object operations from a numbered menu. Tool
//! failures are printed and the session keeps going; only a lost
//! connection or a closed stdin ends the loop.
//!
//! # Usage
//!
//! ```text
//! MCP_SERVER_URL=http://localhost:9999/sse rustbucket-cli
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MCP_SERVER_URL` | `http://localhost:9999/sse` | SSE endpoint of the server |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::io::Write;

use anyhow::{Context, Result};
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rustbucket_core::{ContentEncoding, EncodedObject, ToolArguments, ToolOutcome, ToolPayload};
use rustbucket_mcp::McpClient;

/// SSE endpoint used when `MCP_SERVER_URL` is unset.
const DEFAULT_SERVER_URL: &str = "http://localhost:9999/sse";

/// Longest object preview printed to the terminal, in characters.
const PREVIEW_LIMIT: usize = 1000;

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to `LOG_LEVEL`.
fn init_tracing() -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
        EnvFilter::try_new(&log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Ok(())
}

/// Print a prompt and read one trimmed line from stdin.
fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    std::io::stdout().flush().context("failed to flush stdout")?;

    let mut line = String::new();
    let read = std::io::stdin()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    if read == 0 {
        anyhow::bail!("stdin closed");
    }
    Ok(line.trim().to_owned())
}

/// Ask a yes/no question; only `y` (any case) counts as yes.
fn confirm(label: &str) -> Result<bool> {
    Ok(prompt(label)?.eq_ignore_ascii_case("y"))
}

fn print_menu() {
    println!("\n=== S3 Operations Menu ===");
    println!("1. List Buckets");
    println!("2. Create Bucket");
    println!("3. Delete Bucket");
    println!("4. List Objects in Bucket");
    println!("5. Get Object");
    println!("6. Upload Object");
    println!("7. Delete Object");
    println!("8. Exit");
}

/// Render an outcome for the generic `result: ...` lines of the menu.
fn render(outcome: &ToolOutcome) -> String {
    match outcome {
        ToolOutcome::Success(ToolPayload::Structured(value)) => value.to_string(),
        ToolOutcome::Success(ToolPayload::Text(text)) => text.clone(),
        ToolOutcome::Success(ToolPayload::Binary(object)) => format!(
            "binary content ({} bytes, {})",
            object.size_bytes,
            object.content_type.as_deref().unwrap_or("unknown type"),
        ),
        ToolOutcome::Failure(message) => message.clone(),
    }
}

/// Truncate long object content for terminal display.
fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_LIMIT {
        let head: String = content.chars().take(PREVIEW_LIMIT).collect();
        format!("{head}...")
    } else {
        content.to_owned()
    }
}

/// Guess an upload content type from the file extension.
fn infer_content_type(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else if lower.ends_with(".png") {
        "image/png"
    } else {
        "application/octet-stream"
    }
}

async fn list_buckets(client: &McpClient) {
    info!("listing buckets");
    match client.call_tool("ListBuckets", ToolArguments::new()).await {
        Ok(ToolOutcome::Success(ToolPayload::Structured(value)))
            if value.get("buckets").is_some() =>
        {
            println!("\nAvailable Buckets:");
            if let Some(buckets) = value["buckets"].as_array() {
                for bucket in buckets {
                    if let Some(name) = bucket.get("Name").and_then(Value::as_str) {
                        println!("- {name}");
                    }
                }
            }
        }
        Ok(outcome) => println!("\nBuckets response: {}", render(&outcome)),
        Err(e) => println!("Error listing buckets: {e}"),
    }
}

async fn create_bucket(client: &McpClient) -> Result<()> {
    let bucket = prompt("Enter name for new bucket: ")?;
    let region = prompt("Enter region (leave blank for default): ")?;

    info!(%bucket, "creating bucket");
    let mut args = ToolArguments::new();
    args.insert("bucket", json!(bucket));
    args.insert("region", json!(region));

    match client.call_tool("CreateBucket", args).await {
        Ok(outcome) => println!("\nBucket creation result: {}", render(&outcome)),
        Err(e) => println!("Error creating bucket: {e}"),
    }
    Ok(())
}

async fn delete_bucket(client: &McpClient) -> Result<()> {
    let bucket = prompt("Enter bucket name to delete: ")?;
    let force = confirm("Force deletion of non-empty bucket? (y/n): ")?;

    info!(%bucket, force, "deleting bucket");
    let mut args = ToolArguments::new();
    args.insert("bucket", json!(bucket));
    args.insert("force", json!(force));

    match client.call_tool("DeleteBucket", args).await {
        Ok(outcome) => println!("\nBucket deletion result: {}", render(&outcome)),
        Err(e) => println!("Error deleting bucket: {e}"),
    }
    Ok(())
}

async fn list_objects(client: &McpClient) -> Result<()> {
    let bucket = prompt("Enter bucket name to list objects: ")?;
    let prefix = prompt("Enter prefix filter (optional): ")?;

    info!(%bucket, "listing objects");
    let mut args = ToolArguments::new();
    args.insert("bucket", json!(bucket));
    args.insert("prefix", json!(prefix));
    args.insert("max_keys", json!(50));

    match client.call_tool("ListObjects", args).await {
        Ok(ToolOutcome::Success(ToolPayload::Structured(value)))
            if value.get("objects").is_some() =>
        {
            println!("\nObjects in bucket {bucket}:");
            if let Some(objects) = value["objects"].as_array() {
                for object in objects {
                    if let Some(key) = object.get("Key").and_then(Value::as_str) {
                        println!("- {key}");
                    }
                }
            }
        }
        Ok(outcome) => println!("\nObjects response: {}", render(&outcome)),
        Err(e) => println!("Error listing objects: {e}"),
    }
    Ok(())
}

async fn get_object(client: &McpClient) -> Result<()> {
    let bucket = prompt("Enter bucket name: ")?;
    let key = prompt("Enter object key: ")?;

    info!(%bucket, %key, "retrieving object");
    let mut args = ToolArguments::new();
    args.insert("bucket", json!(bucket));
    args.insert("key", json!(key));

    match client.call_tool("GetObject", args).await {
        Ok(ToolOutcome::Success(ToolPayload::Binary(object))) => save_binary(&object)?,
        Ok(ToolOutcome::Success(ToolPayload::Text(content))) => show_text(&key, &content)?,
        Ok(outcome) => {
            println!("\nContent of {key}:");
            println!("-----------------------------------");
            println!("{}", preview(&render(&outcome)));
            println!("-----------------------------------");
        }
        Err(e) => println!("Error retrieving object: {e}"),
    }
    Ok(())
}

/// Show binary object metadata and offer to save the decoded bytes.
fn save_binary(object: &EncodedObject) -> Result<()> {
    let content_type = object.content_type.as_deref().unwrap_or("Unknown");
    println!("\nObject Information:");
    println!("Content Type: {content_type}");
    println!("Size: {} bytes", object.size_bytes);
    println!(
        "Last Modified: {}",
        object.last_modified.as_deref().unwrap_or("Unknown")
    );
    println!("\nBinary content detected ({content_type})");

    if !confirm("Save to file? (y/n): ")? {
        return Ok(());
    }
    let save_path = prompt("Enter save path: ")?;

    let decoded = match object.encoding {
        ContentEncoding::Base64 => BASE64_STANDARD.decode(object.content.as_bytes()),
        ContentEncoding::Utf8 => Ok(object.content.clone().into_bytes()),
    };
    match decoded {
        Ok(data) => match std::fs::write(&save_path, data) {
            Ok(()) => println!("File saved successfully to {save_path}"),
            Err(e) => println!("Error saving file: {e}"),
        },
        Err(e) => println!("Error saving file: {e}"),
    }
    Ok(())
}

/// Show text content with a preview cap and offer to save it.
fn show_text(key: &str, content: &str) -> Result<()> {
    println!("\nContent of {key}:");
    println!("-----------------------------------");
    println!("{}", preview(content));
    println!("-----------------------------------");

    if confirm("Save text to file? (y/n): ")? {
        let save_path = prompt("Enter save path: ")?;
        match std::fs::write(&save_path, content) {
            Ok(()) => println!("File saved successfully to {save_path}"),
            Err(e) => println!("Error saving file: {e}"),
        }
    }
    Ok(())
}

async fn upload_object(client: &McpClient) -> Result<()> {
    let bucket = prompt("Enter bucket name: ")?;
    let key = prompt("Enter object key for the new file: ")?;
    let source = prompt("Upload from (1) Text input or (2) File path? ")?;

    let (content, content_type, is_base64) = if source == "1" {
        let content = prompt("Enter content for the new file: ")?;
        (content, "text/plain".to_owned(), false)
    } else {
        let file_path = prompt("Enter path to file: ")?;
        match std::fs::read(&file_path) {
            Ok(bytes) => (
                BASE64_STANDARD.encode(&bytes),
                infer_content_type(&file_path).to_owned(),
                true,
            ),
            Err(e) => {
                println!("Error reading file: {e}");
                return Ok(());
            }
        }
    };

    info!(%bucket, %key, "uploading object");
    let mut args = ToolArguments::new();
    args.insert("bucket", json!(bucket));
    args.insert("key", json!(key));
    args.insert("content", json!(content));
    args.insert("content_type", json!(content_type));
    args.insert("is_base64", json!(is_base64));

    match client.call_tool("PutObject", args).await {
        Ok(outcome) => println!("\nUpload result: {}", render(&outcome)),
        Err(e) => println!("Error uploading object: {e}"),
    }
    Ok(())
}

async fn delete_object(client: &McpClient) -> Result<()> {
    let bucket = prompt("Enter bucket name: ")?;
    let key = prompt("Enter object key to delete: ")?;

    info!(%bucket, %key, "deleting object");
    let mut args = ToolArguments::new();
    args.insert("bucket", json!(bucket));
    args.insert("key", json!(key));

    match client.call_tool("DeleteObject", args).await {
        Ok(outcome) => println!("\nDelete result: {}", render(&outcome)),
        Err(e) => println!("Error deleting object: {e}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let server_url =
        std::env::var("MCP_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_owned());
    info!(%server_url, "connecting to rustbucket server");

    let mut client = McpClient::connect(&server_url)
        .await
        .with_context(|| format!("failed to connect to {server_url}"))?;
    let init = client.initialize().await.context("initialize handshake failed")?;
    info!(
        server = %init.server_info.name,
        version = %init.server_info.version,
        "connection initialized"
    );

    match client.list_tools().await {
        Ok(tools) if !tools.is_empty() => {
            println!("\nAvailable Tools:");
            for tool in &tools {
                println!("- {}: {}", tool.name, tool.description);
            }
        }
        Ok(_) => println!("\nNo tools available from server"),
        Err(e) => println!("Error retrieving tools: {e}"),
    }

    loop {
        print_menu();
        let choice = prompt("\nSelect an operation (1-8): ")?;

        match choice.as_str() {
            "1" => list_buckets(&client).await,
            "2" => create_bucket(&client).await?,
            "3" => delete_bucket(&client).await?,
            "4" => list_objects(&client).await?,
            "5" => get_object(&client).await?,
            "6" => upload_object(&client).await?,
            "7" => delete_object(&client).await?,
            "8" => {
                println!("Exiting...");
                break;
            }
            _ => println!("Invalid choice, please try again."),
        }
    }

    client.close();
    Ok(())
}
