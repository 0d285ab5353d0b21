//! Runtime interpretation of parsed Smithy services as MCP servers.
//!
//! Instead of emitting code, this crate walks the parsed model at startup,
//! registers one MCP tool per operation (plus one per waiter) and translates
//! tool calls into HTTP requests on the fly.

pub mod client;
pub mod request;
pub mod server;
pub mod sigv4;
pub mod waiter;

pub use client::ApiClient;
pub use request::{synthesize, SynthesizedRequest};
pub use server::DynamicMcpServer;
pub use sigv4::SigV4Signer;
pub use waiter::{check_acceptors, extract_path, run_waiter, WaiterOutcome};
