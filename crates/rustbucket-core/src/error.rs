//! Error types for tool registration, dispatch, and content decoding.
//!
//! Dispatch errors never cross the transport boundary as errors: the
//! dispatcher converts every [`DispatchError`] into a
//! [`ToolOutcome::Failure`](crate::ToolOutcome::Failure) carrying the
//! rendered message, so a caller always receives a well-formed result.

use crate::descriptor::ParamKind;

/// Errors raised while assembling the tool registry at startup.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A tool with the same name is already registered.
    #[error("a tool named {name} is already registered")]
    DuplicateTool {
        /// The conflicting tool name.
        name: String,
    },
}

/// Errors produced while validating and executing a single tool call.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    // -----------------------------------------------------------------------
    // Request validation errors
    // -----------------------------------------------------------------------
    /// The requested tool is not registered.
    #[error("unknown tool: {tool}")]
    UnknownTool {
        /// The tool name that was requested.
        tool: String,
    },

    /// A required argument was not supplied.
    #[error("tool {tool} requires argument {argument}")]
    MissingArgument {
        /// The tool being called.
        tool: String,
        /// The missing argument name.
        argument: String,
    },

    /// An argument was supplied with the wrong JSON type.
    #[error("tool {tool} argument {argument} must be a {expected}")]
    InvalidArgument {
        /// The tool being called.
        tool: String,
        /// The offending argument name.
        argument: String,
        /// The declared argument type.
        expected: ParamKind,
    },

    // -----------------------------------------------------------------------
    // Handler errors
    // -----------------------------------------------------------------------
    /// The tool's handler returned an error.
    ///
    /// The message renders the full error chain so backend diagnostics
    /// reach the caller verbatim.
    #[error("{source:#}")]
    Handler {
        /// Name of the tool whose handler failed.
        tool: String,
        /// The handler's error chain.
        source: anyhow::Error,
    },
}

/// Errors raised while reversing a transport encoding.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The payload claims base64 encoding but does not decode as base64.
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Convenience result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
