//! Content classification and transport encoding for object payloads.
//!
//! Object bodies fetched from storage are raw bytes; the transport speaks
//! JSON strings. [`classify`] decides from the object key whether a payload
//! is expected to be text, and [`encode_for_transport`] turns the bytes into
//! a string plus an explicit encoding marker: UTF-8 text travels as-is,
//! everything else travels as base64. [`decode_content`] is the exact
//! inverse, so `decode(encode(bytes)) == bytes` for every byte string.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::ContentError;

/// Key extensions treated as text for transport encoding.
///
/// Compared ASCII case-insensitively against the portion of the key after
/// the last `.`. Everything else is handled as binary.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "log", "md", "markdown", "rst", "json", "xml", "yml", "yaml", "csv", "tsv", "ini",
    "cfg", "conf", "toml", "html", "htm", "css", "js", "ts", "py", "rs", "sh", "sql",
];

/// Expected payload class for an object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    /// The key looks like a text file; try UTF-8 first.
    Text,
    /// The key looks like a binary file; always base64.
    Binary,
}

/// How an encoded payload string must be reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentEncoding {
    /// The payload string is the object's bytes, verbatim UTF-8.
    #[serde(rename = "utf-8")]
    Utf8,
    /// The payload string is the standard base64 encoding of the bytes.
    #[serde(rename = "base64")]
    Base64,
}

impl ContentEncoding {
    /// The wire name of this encoding.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Base64 => "base64",
        }
    }
}

impl std::fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An object payload encoded for transport, with its reversal marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedContent {
    /// How [`EncodedContent::body`] must be decoded.
    pub encoding: ContentEncoding,
    /// The encoded payload.
    pub body: String,
}

/// Classify an object key as text-like or binary from its extension.
///
/// Deterministic: equal keys always classify equally. Keys without an
/// extension classify as binary.
///
/// # Examples
///
/// ```
/// use rustbucket_core::{ContentClass, classify};
///
/// assert_eq!(classify("notes/readme.txt"), ContentClass::Text);
/// assert_eq!(classify("photos/cat.png"), ContentClass::Binary);
/// assert_eq!(classify("no-extension"), ContentClass::Binary);
/// ```
#[must_use]
pub fn classify(key: &str) -> ContentClass {
    let Some((_, extension)) = key.rsplit_once('.') else {
        return ContentClass::Binary;
    };

    let extension = extension.to_ascii_lowercase();
    if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        ContentClass::Text
    } else {
        ContentClass::Binary
    }
}

/// Encode raw object bytes for transport.
///
/// Text-classified payloads are attempted as strict UTF-8 and fall back to
/// base64 when the bytes do not decode; binary-classified payloads always
/// encode as base64. Never fails.
#[must_use]
pub fn encode_for_transport(bytes: &[u8], class: ContentClass) -> EncodedContent {
    match class {
        ContentClass::Text => match std::str::from_utf8(bytes) {
            Ok(text) => EncodedContent {
                encoding: ContentEncoding::Utf8,
                body: text.to_owned(),
            },
            Err(_) => EncodedContent {
                encoding: ContentEncoding::Base64,
                body: BASE64_STANDARD.encode(bytes),
            },
        },
        ContentClass::Binary => EncodedContent {
            encoding: ContentEncoding::Base64,
            body: BASE64_STANDARD.encode(bytes),
        },
    }
}

/// Recover the original bytes from an encoded payload.
///
/// Exact inverse of [`encode_for_transport`]; only fails when a payload
/// marked base64 carries text that is not valid base64.
pub fn decode_content(content: &EncodedContent) -> Result<Vec<u8>, ContentError> {
    match content.encoding {
        ContentEncoding::Utf8 => Ok(content.body.clone().into_bytes()),
        ContentEncoding::Base64 => Ok(BASE64_STANDARD.decode(&content.body)?),
    }
}
