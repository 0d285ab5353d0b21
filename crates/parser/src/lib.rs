//! Smithy 2.0 JSON AST parsing for smithy-mcp.
//!
//! Loads a Smithy model document, resolves every referenced shape into a
//! schema store, classifies HTTP bindings and extracts the parsed service
//! model the generator and the dynamic server consume.

pub mod ast;
pub mod binding;
pub mod convert;
pub mod parser;
pub mod schema;

pub use parser::{ParsedModel, SmithyParser};
pub use schema::SchemaResolver;
