//! Smithy model file parser

use std::fs;
use std::path::Path;

use smithy_mcp_common::{ParsedService, Result, SchemaStore, SmithyMcpError};

use crate::ast::SmithyModel;
use crate::convert;

/// A fully parsed model: the extracted services plus the schema store their
/// member schemas reference into. Immutable once built.
#[derive(Debug, Clone)]
pub struct ParsedModel {
    pub services: Vec<ParsedService>,
    pub store: SchemaStore,
}

/// Smithy JSON AST parser
///
/// Reads Smithy 2.0 JSON AST documents as emitted by `smithy build` or
/// shipped in the AWS api-models repositories.
#[derive(Debug)]
pub struct SmithyParser {
    model: SmithyModel,
}

impl SmithyParser {
    /// Load a Smithy model from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            SmithyMcpError::ModelParse(format!(
                "Failed to read Smithy file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse a Smithy model from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let model: SmithyModel = serde_json::from_str(json).map_err(|e| {
            SmithyMcpError::ModelParse(format!("Failed to parse Smithy JSON: {}", e))
        })?;
        Ok(Self { model })
    }

    /// Extract every service and resolve all referenced schemas.
    pub fn parse(&self) -> ParsedModel {
        let (services, store) = convert::parse_services(&self.model);
        ParsedModel { services, store }
    }

    /// Get a reference to the underlying Smithy model
    pub fn model(&self) -> &SmithyModel {
        &self.model
    }
}
