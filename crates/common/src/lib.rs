//! Common types and utilities for smithy-mcp
//!
//! This crate contains the parsed-model intermediate representation, the
//! semantic schema store, error types, runtime configuration, and naming
//! helpers shared across the parser, generator, runtime, and CLI components.

use thiserror::Error;

pub mod config;
pub mod model;
pub mod naming;
pub mod schema;

pub use config::RuntimeConfig;
pub use model::{
    Acceptor, AcceptorState, Channel, Comparator, Deprecated, HttpBinding, HttpSpec,
    PaginationConfig, ParsedMember, ParsedOperation, ParsedService, ParsedStructure, Protocol,
    WaiterConfig,
};
pub use schema::{Property, Schema, SchemaKind, SchemaNode, SchemaStore, MAX_SCHEMA_DEPTH};

/// Errors that can occur while parsing models, generating servers, or
/// invoking the modeled API.
#[derive(Error, Debug)]
pub enum SmithyMcpError {
    /// The AST document is not valid JSON or lacks the expected shape map.
    #[error("Model parse error: {0}")]
    ModelParse(String),

    /// Template rendering or output writing failed.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Missing or invalid base URL, region, or signing credentials.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The downstream HTTP call returned a non-2xx status.
    #[error("API error {status}: {body}")]
    ApiRequest { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// A waiter exceeded its deadline while polling.
    #[error("Waiter timed out after {attempts} attempts: {last_error}")]
    WaiterTimeout { attempts: u32, last_error: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for smithy-mcp operations
pub type Result<T> = std::result::Result<T, SmithyMcpError>;
