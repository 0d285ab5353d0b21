//! Code generation for standalone MCP server crates
//!
//! This crate transforms a parsed Smithy service into a self-contained
//! Rust package: a static tool table plus a request handler, rendered
//! through tera templates.

mod templates;

use serde::Serialize;
use smithy_mcp_common::config::{DEFAULT_LOCAL_BASE_URL, DEFAULT_REGION};
use smithy_mcp_common::naming::to_kebab_case;
use smithy_mcp_common::{
    Channel, ParsedOperation, ParsedService, Result, SchemaStore, SmithyMcpError,
};
use std::fs;
use std::path::Path;
use tera::Tera;

/// Knobs for the emitted package.
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    pub server_name: Option<String>,
    pub server_version: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Serialize)]
struct MemberContext {
    name: String,
    wire: String,
    channel: &'static str,
    idempotency_token: bool,
}

#[derive(Serialize)]
struct ToolContext {
    name: String,
    description: String,
    method: String,
    uri: String,
    schema_json: String,
    members: Vec<MemberContext>,
}

/// MCP server generator
///
/// Transforms a ParsedService into a complete server package:
/// - Cargo.toml
/// - src/main.rs
/// - README.md
pub struct McpServerGenerator {
    service: ParsedService,
    store: SchemaStore,
    options: GeneratorOptions,
    tera: Tera,
}

impl McpServerGenerator {
    /// Create a new generator from a parsed service and its schema store.
    pub fn new(
        service: ParsedService,
        store: SchemaStore,
        options: GeneratorOptions,
    ) -> Result<Self> {
        let tera = templates::load_templates()?;
        Ok(Self {
            service,
            store,
            options,
            tera,
        })
    }

    /// Generate all server artifacts to a directory
    pub fn generate_to_directory(&self, output_dir: &Path) -> Result<()> {
        fs::create_dir_all(output_dir).map_err(|e| {
            SmithyMcpError::Generation(format!("Failed to create output directory: {}", e))
        })?;

        let src_dir = output_dir.join("src");
        fs::create_dir_all(&src_dir).map_err(|e| {
            SmithyMcpError::Generation(format!("Failed to create src directory: {}", e))
        })?;

        self.generate_cargo_toml(output_dir)?;
        self.generate_main_rs(&src_dir)?;
        self.generate_readme(output_dir)?;

        Ok(())
    }

    /// Generate Cargo.toml
    fn generate_cargo_toml(&self, output_dir: &Path) -> Result<()> {
        let context = self.create_context()?;
        let rendered = self
            .tera
            .render("Cargo.toml", &context)
            .map_err(|e| SmithyMcpError::Generation(format!("Template error: {}", e)))?;

        let output_path = output_dir.join("Cargo.toml");
        fs::write(output_path, rendered).map_err(|e| {
            SmithyMcpError::Generation(format!("Failed to write Cargo.toml: {}", e))
        })?;

        Ok(())
    }

    /// Generate src/main.rs
    fn generate_main_rs(&self, src_dir: &Path) -> Result<()> {
        let context = self.create_context()?;
        let rendered = self
            .tera
            .render("main.rs", &context)
            .map_err(|e| SmithyMcpError::Generation(format!("Template error: {}", e)))?;

        let output_path = src_dir.join("main.rs");
        fs::write(output_path, rendered)
            .map_err(|e| SmithyMcpError::Generation(format!("Failed to write main.rs: {}", e)))?;

        Ok(())
    }

    /// Generate README.md
    fn generate_readme(&self, output_dir: &Path) -> Result<()> {
        let context = self.create_context()?;
        let rendered = self
            .tera
            .render("README.md", &context)
            .map_err(|e| SmithyMcpError::Generation(format!("Template error: {}", e)))?;

        let output_path = output_dir.join("README.md");
        fs::write(output_path, rendered)
            .map_err(|e| SmithyMcpError::Generation(format!("Failed to write README.md: {}", e)))?;

        Ok(())
    }

    /// Create the template context from the parsed service.
    fn create_context(&self) -> Result<tera::Context> {
        let server_name = self
            .options
            .server_name
            .clone()
            .unwrap_or_else(|| self.service.name.clone());
        let server_version = self
            .options
            .server_version
            .clone()
            .or_else(|| self.service.version.clone())
            .unwrap_or_else(|| "1.0.0".to_string());
        let package_name = format!("{}-mcp-server", to_kebab_case(&server_name));

        // Base URL precedence: explicit option, then endpoint-prefix-derived
        // (with any host prefix prepended), then localhost. API_BASE_URL
        // still overrides at runtime.
        let (endpoint_prefix, default_base_url) = match (&self.options.base_url, &self.service.endpoint_prefix) {
            (Some(url), _) => (None, url.clone()),
            (None, Some(prefix)) => {
                let host_prefix = self.service.host_prefix.as_deref().unwrap_or("");
                (Some(format!("{host_prefix}{prefix}")), String::new())
            }
            (None, None) => (None, DEFAULT_LOCAL_BASE_URL.to_string()),
        };
        let display_base_url = match &endpoint_prefix {
            Some(prefix) => format!("https://{}.{}.amazonaws.com", prefix, DEFAULT_REGION),
            None => default_base_url.clone(),
        };

        let tools = self.tool_contexts()?;

        let mut context = tera::Context::new();
        context.insert("server_name", &server_name);
        context.insert("server_version", &server_version);
        context.insert("package_name", &package_name);
        context.insert("endpoint_prefix", &endpoint_prefix);
        context.insert("default_base_url", &default_base_url);
        context.insert("display_base_url", &display_base_url);
        context.insert("tool_count", &tools.len());
        context.insert("tools", &tools);
        Ok(context)
    }

    fn tool_contexts(&self) -> Result<Vec<ToolContext>> {
        self.service
            .operations
            .iter()
            .filter(|op| !op.internal)
            .map(|op| self.tool_context(op))
            .collect()
    }

    fn tool_context(&self, operation: &ParsedOperation) -> Result<ToolContext> {
        let schema = operation.input_schema(&self.store);
        let schema_json = serde_json::to_string(&schema).map_err(|e| {
            SmithyMcpError::Generation(format!(
                "Failed to serialize input schema for {}: {}",
                operation.name, e
            ))
        })?;

        let members = operation
            .input
            .iter()
            .flat_map(|input| input.members.iter())
            .map(|member| {
                let channel = member
                    .http_binding
                    .as_ref()
                    .map(|b| b.channel)
                    .unwrap_or(Channel::Body);
                let wire = match channel {
                    Channel::Query | Channel::Header | Channel::PrefixHeaders => member
                        .http_binding
                        .as_ref()
                        .and_then(|b| b.wire_name.clone())
                        .unwrap_or_else(|| member.name.clone()),
                    Channel::Body => member.wire_name().to_string(),
                    _ => member.name.clone(),
                };
                MemberContext {
                    name: member.name.clone(),
                    wire,
                    channel: channel_variant(channel),
                    idempotency_token: member.idempotency_token,
                }
            })
            .collect();

        Ok(ToolContext {
            name: operation.tool_name(),
            description: operation.tool_description(),
            method: operation.method().to_string(),
            uri: operation.uri_template(),
            schema_json,
            members,
        })
    }
}

fn channel_variant(channel: Channel) -> &'static str {
    match channel {
        Channel::Label => "Label",
        Channel::Query => "Query",
        Channel::QueryParams => "QueryParams",
        Channel::Header => "Header",
        Channel::PrefixHeaders => "PrefixHeaders",
        Channel::Payload => "Payload",
        Channel::Body => "Body",
    }
}

/// Generate server artifacts (convenience function)
pub fn generate_server(
    service: ParsedService,
    store: SchemaStore,
    options: GeneratorOptions,
    output_path: &Path,
) -> Result<()> {
    let generator = McpServerGenerator::new(service, store, options)?;
    generator.generate_to_directory(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_creation() {
        let service = ParsedService {
            name: "weather".to_string(),
            shape_id: "example.weather#Weather".to_string(),
            version: Some("2024-01-01".to_string()),
            documentation: None,
            operations: vec![],
            protocol: None,
            endpoint_prefix: None,
            bearer_auth: false,
            sigv4_service_name: None,
            host_prefix: None,
        };

        let result = McpServerGenerator::new(service, SchemaStore::new(), GeneratorOptions::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_package_name_is_kebab_case() {
        let service = ParsedService {
            name: "WeatherService".to_string(),
            shape_id: "example.weather#WeatherService".to_string(),
            version: None,
            documentation: None,
            operations: vec![],
            protocol: None,
            endpoint_prefix: None,
            bearer_auth: false,
            sigv4_service_name: None,
            host_prefix: None,
        };

        let generator =
            McpServerGenerator::new(service, SchemaStore::new(), GeneratorOptions::default())
                .unwrap();
        let context = generator.create_context().unwrap();
        assert_eq!(
            context.get("package_name").unwrap().as_str().unwrap(),
            "weather-service-mcp-server"
        );
    }
}
