// SPDX-License-Identifier: MIT

//! Typed error handling for tripflow-rs
//!
//! The error hierarchy mirrors the failure taxonomy of the planning
//! pipeline: tool and model failures abort a workflow invocation, while
//! recovery failures are caught inside the response pipeline and resolved
//! to the deterministic fallback plan.

use thiserror::Error;

/// Top-level error type for tripflow-rs
#[derive(Debug, Error)]
pub enum TripflowError {
    /// A data-source tool call failed or returned an error payload
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The text-generation capability failed
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Graph execution errors
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// Response recovery errors (extraction/repair/schema)
    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    /// Configuration errors (missing env vars, invalid config)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors from external data-source tools
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool not found in the adapter registry
    #[error("Tool '{name}' not found")]
    NotFound { name: String },

    /// Provider returned a non-success status or error payload
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// Malformed tool arguments
    #[error("Invalid arguments for tool '{name}': {message}")]
    InvalidArgs { name: String, message: String },

    /// Transport-level failure
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Provider returned a non-success status
    #[error("Model API error: {0}")]
    Api(String),

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    /// Transport-level failure
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Graph execution errors
#[derive(Debug, Error)]
pub enum FlowError {
    /// A node referenced by an edge is not defined
    #[error("Unknown node in graph: {0}")]
    UnknownNode(String),

    /// A node returned an error; the invocation aborts with no retry
    #[error("Node '{node}' failed: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: Box<TripflowError>,
    },

    /// Safety cap on scheduler iterations
    #[error("Graph execution exceeded {0} iterations")]
    MaxIterations(u32),

    /// A node task panicked or was cancelled
    #[error("Node task panicked: {0}")]
    Panicked(String),

    /// Execution finished without reaching the end node
    #[error("Graph execution stalled before reaching the end node")]
    Stalled,
}

/// Response recovery errors, caught inside the recovery pipeline
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// No JSON-like span found in the generated text
    #[error("No JSON payload found in model output")]
    Extraction,

    /// Bracket repair could not produce parseable text
    #[error("Could not repair truncated JSON: {0}")]
    Repair(String),

    /// Parsed structure fails schema validation
    #[error("Plan failed schema validation: {0}")]
    Schema(String),
}

impl ToolError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a tool-not-found error
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}

impl TripflowError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
