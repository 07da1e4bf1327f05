//! Resource-style access to objects through `s3://{bucket}/{key}` URIs.
//!
//! The router is the bridge between a URI-addressed resource surface and
//! the [`ObjectStore`] adapter: it parses and percent-decodes the URI,
//! fetches the object, and hands back text that is either the decoded
//! UTF-8 payload or its base64 form, together with a best-effort mime
//! type. Template metadata for discovery is advertised alongside.

use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use percent_encoding::percent_decode_str;
use tracing::{debug, error};

use rustbucket_core::{ContentEncoding, classify, encode_for_transport};

use crate::store::ObjectStore;

/// URI template matched by [`S3ResourceRouter::read`].
pub const S3_URI_TEMPLATE: &str = "s3://{bucket}/{key}";

/// A resource payload ready for the wire: text plus its mime type.
///
/// `text` is the object body decoded as UTF-8 when the content classifier
/// says it is text and the bytes decode cleanly, and the base64 form of
/// the raw bytes otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceObject {
    /// Decoded text, or base64 text for binary payloads.
    pub text: String,
    /// Mime type reported by the backend, with a content-based fallback.
    pub mime_type: String,
}

/// Routes `s3://{bucket}/{key}` reads onto an [`ObjectStore`].
#[derive(Clone)]
pub struct S3ResourceRouter {
    store: Arc<dyn ObjectStore>,
}

impl fmt::Debug for S3ResourceRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3ResourceRouter").finish_non_exhaustive()
    }
}

impl S3ResourceRouter {
    /// Display name advertised with the URI template.
    pub const TEMPLATE_NAME: &'static str = "S3 Object";
    /// Description advertised with the URI template.
    pub const TEMPLATE_DESCRIPTION: &'static str =
        "Access S3 objects using s3://bucket/key format";

    /// Create a router over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Read the object addressed by `uri` and encode it for transport.
    ///
    /// # Errors
    ///
    /// Fails when the URI does not match the template or when the backend
    /// read fails; the failure message carries the full cause.
    pub async fn read(&self, uri: &str) -> anyhow::Result<ResourceObject> {
        let (bucket, key) = parse_uri(uri)?;
        debug!(%bucket, %key, "reading s3 resource");

        let object = match self.store.get_object(&bucket, &key).await {
            Ok(object) => object,
            Err(e) => {
                error!(%bucket, %key, error = %e, "failed to read s3 resource");
                return Err(anyhow::Error::new(e).context("Error reading S3 object"));
            }
        };

        let encoded = encode_for_transport(&object.body, classify(&key));
        let mime_type = object.content_type.unwrap_or_else(|| match encoded.encoding {
            ContentEncoding::Utf8 => mime::TEXT_PLAIN.to_string(),
            ContentEncoding::Base64 => mime::APPLICATION_OCTET_STREAM.to_string(),
        });

        Ok(ResourceObject {
            text: encoded.body,
            mime_type,
        })
    }
}

/// Split a resource URI into bucket and percent-decoded key.
fn parse_uri(uri: &str) -> anyhow::Result<(String, String)> {
    let rest = uri
        .strip_prefix("s3://")
        .with_context(|| format!("resource URI must match s3://{{bucket}}/{{key}}: {uri}"))?;
    let (bucket, key) = rest
        .split_once('/')
        .with_context(|| format!("resource URI must match s3://{{bucket}}/{{key}}: {uri}"))?;
    if bucket.is_empty() || key.is_empty() {
        anyhow::bail!("resource URI must name a bucket and a key: {uri}");
    }

    let key = percent_decode_str(key)
        .decode_utf8()
        .with_context(|| format!("resource key is not valid UTF-8 once decoded: {uri}"))?
        .into_owned();
    Ok((bucket.to_owned(), key))
}
