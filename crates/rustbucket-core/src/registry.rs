//! The explicit tool registry and its dispatcher.
//!
//! Tools are registered once at startup by pairing a
//! [`ToolDescriptor`] with a [`ToolHandler`]; duplicate names are rejected.
//! Dispatch is total: every call request produces a [`ToolOutcome`],
//! whatever the caller sent and however the handler failed. Validation
//! checks required arguments and declared JSON types, merges defaults for
//! omitted optionals, and silently drops undeclared arguments so older
//! servers keep working with newer clients.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::descriptor::ToolDescriptor;
use crate::error::{DispatchError, RegistryError, RegistryResult};
use crate::outcome::{ToolOutcome, ToolPayload};

/// Validated arguments handed to a tool handler.
///
/// After validation the map contains every declared argument that was
/// supplied plus defaults for omitted optionals, and nothing else. The
/// typed accessors are for handlers, which may rely on declared types
/// having been checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolArguments(serde_json::Map<String, Value>);

impl ToolArguments {
    /// Create an empty argument map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an argument value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Borrow an argument value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Number of arguments in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fetch a string argument that validation guarantees to be present.
    pub fn require_str(&self, name: &str) -> anyhow::Result<&str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("missing required string argument: {name}"))
    }

    /// Fetch a string argument, falling back when absent.
    #[must_use]
    pub fn str_or<'a>(&'a self, name: &str, fallback: &'a str) -> &'a str {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or(fallback)
    }

    /// Fetch a boolean argument, falling back when absent.
    #[must_use]
    pub fn bool_or(&self, name: &str, fallback: bool) -> bool {
        self.0
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(fallback)
    }

    /// Fetch an integer argument, falling back when absent.
    #[must_use]
    pub fn i64_or(&self, name: &str, fallback: i64) -> i64 {
        self.0.get(name).and_then(Value::as_i64).unwrap_or(fallback)
    }
}

impl From<serde_json::Map<String, Value>> for ToolArguments {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<ToolArguments> for serde_json::Map<String, Value> {
    fn from(args: ToolArguments) -> Self {
        args.0
    }
}

/// A tool call as received from the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Name of the tool to invoke.
    pub tool: String,
    /// Caller-supplied arguments, not yet validated.
    #[serde(default)]
    pub arguments: ToolArguments,
}

impl ToolCallRequest {
    /// Build a call request for a named tool.
    #[must_use]
    pub fn new(tool: &str, arguments: ToolArguments) -> Self {
        Self {
            tool: tool.to_owned(),
            arguments,
        }
    }
}

/// Business logic behind a registered tool.
///
/// Handlers receive arguments that already passed validation against the
/// tool's descriptor. Errors are reported through the returned `Result`;
/// the dispatcher converts them into failure outcomes.
pub trait ToolHandler: Send + Sync + 'static {
    /// Execute the tool.
    fn call(
        &self,
        args: ToolArguments,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolPayload>> + Send>>;
}

/// A descriptor paired with the handler that implements it.
struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

/// Explicit registry of tools and the dispatcher over them.
///
/// # Examples
///
/// ```
/// use rustbucket_core::{ToolDescriptor, ToolRegistry};
///
/// let registry = ToolRegistry::new();
/// assert!(registry.is_empty());
/// ```
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its descriptor's name.
    ///
    /// Fails with [`RegistryError::DuplicateTool`] when the name is taken;
    /// registration happens at startup, so a duplicate is a wiring bug the
    /// process should refuse to start with.
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: impl ToolHandler,
    ) -> RegistryResult<()> {
        if self.tools.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateTool {
                name: descriptor.name.clone(),
            });
        }

        let name = descriptor.name.clone();
        self.order.push(name.clone());
        self.tools.insert(
            name,
            RegisteredTool {
                descriptor,
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The registered descriptors, in registration order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name).map(|tool| &tool.descriptor))
            .collect()
    }

    /// Dispatch a tool call to its handler.
    ///
    /// Total over its input: unknown tools, bad arguments, and handler
    /// errors all come back as [`ToolOutcome::Failure`] with a message;
    /// nothing escapes as an error.
    pub async fn dispatch(&self, request: ToolCallRequest) -> ToolOutcome {
        debug!(tool = %request.tool, "dispatching tool call");

        match self.dispatch_inner(request).await {
            Ok(payload) => ToolOutcome::Success(payload),
            Err(err) => {
                warn!(error = %err, "tool call failed");
                ToolOutcome::Failure(err.to_string())
            }
        }
    }

    async fn dispatch_inner(&self, request: ToolCallRequest) -> Result<ToolPayload, DispatchError> {
        let Some(tool) = self.tools.get(&request.tool) else {
            return Err(DispatchError::UnknownTool { tool: request.tool });
        };

        let args = validate_arguments(&tool.descriptor, request.arguments)?;
        let handler = Arc::clone(&tool.handler);

        handler
            .call(args)
            .await
            .map_err(|source| DispatchError::Handler {
                tool: tool.descriptor.name.clone(),
                source,
            })
    }
}

/// Check supplied arguments against a descriptor and build the map the
/// handler will see.
///
/// Declared arguments are type-checked; omitted optionals (including
/// explicit `null`) pick up their defaults; undeclared arguments are
/// dropped with a debug log entry.
fn validate_arguments(
    descriptor: &ToolDescriptor,
    supplied: ToolArguments,
) -> Result<ToolArguments, DispatchError> {
    let mut supplied: serde_json::Map<String, Value> = supplied.into();
    let mut args = ToolArguments::new();

    for param in &descriptor.params {
        match supplied.remove(&param.name) {
            Some(value) if param.kind.matches(&value) => {
                args.insert(param.name.clone(), value);
            }
            Some(value) if value.is_null() && !param.required => {
                if let Some(default) = &param.default {
                    args.insert(param.name.clone(), default.clone());
                }
            }
            Some(_) => {
                return Err(DispatchError::InvalidArgument {
                    tool: descriptor.name.clone(),
                    argument: param.name.clone(),
                    expected: param.kind,
                });
            }
            None if param.required => {
                return Err(DispatchError::MissingArgument {
                    tool: descriptor.name.clone(),
                    argument: param.name.clone(),
                });
            }
            None => {
                if let Some(default) = &param.default {
                    args.insert(param.name.clone(), default.clone());
                }
            }
        }
    }

    if !supplied.is_empty() {
        let ignored: Vec<&String> = supplied.keys().collect();
        debug!(
            tool = %descriptor.name,
            ignored = ?ignored,
            "ignoring undeclared arguments"
        );
    }

    Ok(args)
}
