//! Tool registry, dispatch, and content classification for rustbucket.
//!
//! This crate provides the storage-agnostic building blocks of the tool
//! server: declared tool contracts ([`ToolDescriptor`]), the explicit
//! [`ToolRegistry`] that validates and dispatches calls, the normalized
//! [`ToolOutcome`] result type, and the content classifier that decides
//! whether object payloads travel as UTF-8 text or base64.

mod content;
mod descriptor;
mod error;
mod outcome;
mod registry;

pub use content::{
    ContentClass, ContentEncoding, EncodedContent, classify, decode_content, encode_for_transport,
};
pub use descriptor::{ParamKind, ToolDescriptor, ToolParam};
pub use error::{ContentError, DispatchError, RegistryError, RegistryResult};
pub use outcome::{EncodedObject, ToolOutcome, ToolPayload};
pub use registry::{ToolArguments, ToolCallRequest, ToolHandler, ToolRegistry};
