//! Normalized results of dispatched tool calls.
//!
//! Every dispatched call produces exactly one [`ToolOutcome`]: either a
//! [`ToolPayload`] on success or a rendered failure message. Transport
//! layers map these onto their own result framing; nothing above the
//! dispatcher ever observes a raised error.

use serde::{Deserialize, Serialize};

use crate::content::ContentEncoding;

/// An object payload encoded for transport together with its metadata.
///
/// Returned by object reads whose content cannot travel as plain text.
/// The `encoding` marker tells the consumer how to reverse `content`;
/// consumers never guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedObject {
    /// The encoded payload.
    pub content: String,
    /// How `content` must be decoded.
    pub encoding: ContentEncoding,
    /// The object's content type, when the backend reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Size of the decoded payload in bytes.
    pub size_bytes: u64,
    /// Last-modified timestamp as reported by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// What a successful tool call hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolPayload {
    /// A structured JSON document (listings, status reports).
    Structured(serde_json::Value),
    /// Plain text content.
    Text(String),
    /// An encoded object payload with metadata.
    Binary(EncodedObject),
}

/// The single result type of a dispatched tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// The call succeeded and produced a payload.
    Success(ToolPayload),
    /// The call failed; the message describes why.
    Failure(String),
}

impl ToolOutcome {
    /// Build a failure outcome from any displayable message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    /// Whether this outcome is a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Borrow the success payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&ToolPayload> {
        match self {
            Self::Success(payload) => Some(payload),
            Self::Failure(_) => None,
        }
    }
}
