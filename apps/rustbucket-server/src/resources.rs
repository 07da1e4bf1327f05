//! Bridges the S3 resource router into the transport's resource surface.

use std::future::Future;
use std::pin::Pin;

use rustbucket_mcp::{ResourceContents, ResourceReader, ResourceTemplate};
use rustbucket_s3::{S3_URI_TEMPLATE, S3ResourceRouter};

/// Resource surface backed by [`S3ResourceRouter`].
#[derive(Debug, Clone)]
pub struct ServerResources(
    /// The router answering reads.
    pub S3ResourceRouter,
);

impl ResourceReader for ServerResources {
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
