//! smithy-mcp CLI
//!
//! Command-line interface for turning Smithy models into MCP tool servers,
//! either by generating a standalone server crate or by serving the model
//! directly.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use smithy_mcp_common::RuntimeConfig;
use smithy_mcp_generator::{GeneratorOptions, McpServerGenerator};
use smithy_mcp_parser::SmithyParser;
use smithy_mcp_runtime::DynamicMcpServer;
use std::path::{Path, PathBuf};

const WEATHER_EXAMPLE: &str = include_str!("../assets/weather-service.json");

#[derive(Parser)]
#[command(name = "smithy-mcp")]
#[command(version, about = "Turn Smithy models into MCP tool servers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a Smithy model and display its services and operations
    #[command(after_help = "EXAMPLES:\n  \
        # Inspect a model\n  \
        smithy-mcp inspect weather-service.json\n\n  \
        # Machine-readable output\n  \
        smithy-mcp inspect weather-service.json --json")]
    Inspect {
        /// Path to the Smithy JSON AST file
        model: PathBuf,

        /// Print the parsed services as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a standalone MCP server crate from a Smithy model
    #[command(after_help = "EXAMPLES:\n  \
        # Generate a server crate\n  \
        smithy-mcp generate weather-service.json -o ./weather-server\n\n  \
        # Override the advertised name and API endpoint\n  \
        smithy-mcp generate weather-service.json \\\n    \
        -o ./weather-server \\\n    \
        --name weather \\\n    \
        --base-url https://api.example.com")]
    Generate {
        /// Path to the Smithy JSON AST file
        model: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Server name (defaults to the service shape name)
        #[arg(long)]
        name: Option<String>,

        /// Server version (defaults to the service version)
        #[arg(long)]
        server_version: Option<String>,

        /// Base URL baked into the generated server
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Serve a Smithy model as an MCP server without generating code
    #[command(after_help = "EXAMPLES:\n  \
        # Serve over stdio\n  \
        smithy-mcp serve weather-service.json --base-url https://api.example.com\n\n  \
        # Serve over streamable HTTP with a bearer token\n  \
        smithy-mcp serve weather-service.json \\\n    \
        --http --port 9000 --bearer-token secret")]
    Serve {
        /// Path to the Smithy JSON AST file
        model: PathBuf,

        /// Base URL of the backing API
        #[arg(long)]
        base_url: Option<String>,

        /// API key sent as a bearer token to the backing API
        #[arg(long)]
        api_key: Option<String>,

        /// AWS region for SigV4 signing and endpoint derivation
        #[arg(long)]
        region: Option<String>,

        /// Request timeout in milliseconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Serve over streamable HTTP instead of stdio
        #[arg(long)]
        http: bool,

        /// Host to bind in HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind in HTTP mode
        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Require this bearer token on incoming HTTP requests
        #[arg(long)]
        bearer_token: Option<String>,
    },

    /// Write an example weather-service model to get started
    Init {
        /// Output path for the example model
        #[arg(short, long, default_value = "./weather-service.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.verbose {
        println!("{} Verbose mode enabled", "→".cyan());
    }

    match cli.command {
        Commands::Inspect { model, json } => {
            inspect_command(model.as_path(), json, cli.verbose)?;
        }
        Commands::Generate {
            model,
            output,
            name,
            server_version,
            base_url,
        } => {
            generate_command(
                model.as_path(),
                output.as_path(),
                GeneratorOptions {
                    server_name: name,
                    server_version,
                    base_url,
                },
            )?;
        }
        Commands::Serve {
            model,
            base_url,
            api_key,
            region,
            timeout,
            http,
            host,
            port,
            bearer_token,
        } => {
            let config = RuntimeConfig::resolve(base_url, api_key, region, timeout);
            serve_command(model.as_path(), config, http, &host, port, bearer_token)?;
        }
        Commands::Init { output } => {
            init_command(output.as_path())?;
        }
    }

    Ok(())
}

fn load_model(model_path: &Path) -> Result<smithy_mcp_parser::ParsedModel> {
    let parser = SmithyParser::from_file(model_path)
        .with_context(|| format!("Failed to load Smithy model {}", model_path.display()))?;
    Ok(parser.parse())
}

fn inspect_command(model_path: &Path, json: bool, verbose: bool) -> Result<()> {
    if !json {
        println!(
            "{} Parsing Smithy model: {}",
            "→".cyan(),
            model_path.display()
        );
    }

    let parsed = load_model(model_path)?;
    if parsed.services.is_empty() {
        bail!("No service shape found in the model");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&parsed.services)?);
        return Ok(());
    }

    println!("\n{}", "✓ Parse successful!".green().bold());
    for service in &parsed.services {
        println!("\n{}", "Service:".bold());
        println!("  Name: {}", service.name.yellow());
        if let Some(version) = &service.version {
            println!("  Version: {}", version.yellow());
        }
        if let Some(protocol) = &service.protocol {
            println!("  Protocol: {}", protocol.as_str());
        }
        if let Some(prefix) = &service.endpoint_prefix {
            println!("  Endpoint prefix: {}", prefix);
        }
        println!("  Operations: {}", service.operations.len());

        for operation in &service.operations {
            let marker = if operation.internal {
                " (internal, not exposed)".dimmed().to_string()
            } else {
                String::new()
            };
            println!(
                "  • {} — {} {}{}",
                operation.tool_name().cyan(),
                operation.method(),
                operation.uri_template(),
                marker
            );
            if verbose {
                if let Some(input) = &operation.input {
                    for member in &input.members {
                        let required = if member.required { " (required)" } else { "" };
                        println!("      {}{}", member.name, required);
                    }
                }
                for waiter in &operation.waiters {
                    println!("      waiter: {}", waiter.tool_name().cyan());
                }
            }
        }
    }

    println!("\n  Resolved schemas: {}", parsed.store.len());

    Ok(())
}

fn generate_command(model_path: &Path, output: &Path, options: GeneratorOptions) -> Result<()> {
    println!(
        "{} Generating MCP server from: {}",
        "→".cyan(),
        model_path.display()
    );

    let parsed = load_model(model_path)?;
    let service = parsed
        .services
        .into_iter()
        .next()
        .context("No service shape found in the model")?;
    let tool_count = service.operations.iter().filter(|op| !op.internal).count();

    println!("{} Parsed {} operations", "✓".green(), tool_count);

    println!("{} Generating server files...", "→".cyan());
    let generator = McpServerGenerator::new(service, parsed.store, options)
        .context("Failed to create generator")?;
    generator
        .generate_to_directory(output)
        .context("Failed to generate server")?;

    println!("\n{}", "✓ Generation complete!".green().bold());
    println!("\n{}", "Generated files:".bold());
    println!("  {}/Cargo.toml", output.display());
    println!("  {}/src/main.rs", output.display());
    println!("  {}/README.md", output.display());
    println!("\n{}", "Next steps:".bold());
    println!("  1. Review generated files in {}", output.display());
    println!("  2. Build the server: cd {} && cargo build", output.display());
    println!("  3. Register the binary with your MCP client");

    Ok(())
}

fn serve_command(
    model_path: &Path,
    config: RuntimeConfig,
    http: bool,
    host: &str,
    port: u16,
    bearer_token: Option<String>,
) -> Result<()> {
    let parsed = load_model(model_path)?;
    let service = parsed
        .services
        .into_iter()
        .next()
        .context("No service shape found in the model")?;

    // stdout carries the MCP protocol in stdio mode; status goes to stderr.
    eprintln!("Serving {} from {}", service.name, model_path.display());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let server = DynamicMcpServer::new(service, parsed.store, config).await?;
        if http {
            server.serve_http(host, port, bearer_token).await
        } else {
            server.serve_stdio().await
        }
    })?;

    Ok(())
}

fn init_command(output: &Path) -> Result<()> {
    if output.exists() {
        bail!("{} already exists, refusing to overwrite", output.display());
    }

    std::fs::write(output, WEATHER_EXAMPLE)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{} Wrote example model to {}", "✓".green(), output.display());
    println!("\n{}", "Try it:".bold());
    println!("  smithy-mcp inspect {}", output.display());
    println!("  smithy-mcp serve {}", output.display());

    Ok(())
}
