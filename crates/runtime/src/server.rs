//! Dynamic MCP server interpreting a parsed service at runtime.
//!
//! Tools are not known at compile time, so this implements
//! `rmcp::ServerHandler` by hand instead of going through the tool router
//! macros: `list_tools` serves the tool table built from the parsed model
//! and `call_tool` dispatches by name.

use std::sync::Arc;
use std::time::Duration;

use axum::response::IntoResponse;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ErrorData, Implementation, JsonObject,
    ListToolsResult, PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use rmcp::{RoleServer, ServerHandler, ServiceExt};
use serde_json::{json, Map, Value};
use smithy_mcp_common::model::DEFAULT_WAITER_DEADLINE_SECS;
use smithy_mcp_common::{
    AcceptorState, ParsedOperation, ParsedService, Result, RuntimeConfig, SchemaStore,
    SmithyMcpError, WaiterConfig,
};

use crate::client::ApiClient;
use crate::request;
use crate::sigv4::SigV4Signer;
use crate::waiter;

enum ToolTarget {
    Operation(usize),
    Waiter { operation: usize, waiter: usize },
}

struct ToolEntry {
    tool: Tool,
    target: ToolTarget,
}

struct ServerState {
    service: ParsedService,
    base_url: String,
    client: ApiClient,
    signer: Option<SigV4Signer>,
    tools: Vec<ToolEntry>,
}

/// MCP server whose tool table is interpreted from a parsed Smithy service.
#[derive(Clone)]
pub struct DynamicMcpServer {
    state: Arc<ServerState>,
}

impl DynamicMcpServer {
    /// Build the server: resolve the base URL, construct the HTTP client,
    /// load SigV4 credentials when the service requires signing, and
    /// assemble the tool table.
    pub async fn new(
        service: ParsedService,
        store: SchemaStore,
        config: RuntimeConfig,
    ) -> Result<Self> {
        let base_url = config.base_url_for(&service);
        let client = ApiClient::new(&config)?;
        let signer = match &service.sigv4_service_name {
            Some(name) => Some(SigV4Signer::load(name, &config.region).await?),
            None => None,
        };
        let tools = build_tools(&service, &store);

        log::info!(
            "Serving {} tools for {} against {}",
            tools.len(),
            service.name,
            base_url
        );

        Ok(Self {
            state: Arc::new(ServerState {
                service,
                base_url,
                client,
                signer,
                tools,
            }),
        })
    }

    /// Serve over stdio until the peer disconnects.
    pub async fn serve_stdio(self) -> Result<()> {
        let service = self
            .serve(stdio())
            .await
            .map_err(|e| SmithyMcpError::Transport(format!("stdio transport: {e}")))?;
        service
            .waiting()
            .await
            .map_err(|e| SmithyMcpError::Transport(format!("stdio transport: {e}")))?;
        Ok(())
    }

    /// Serve the streamable HTTP transport at `/mcp`, optionally guarded by
    /// a bearer token.
    pub async fn serve_http(
        self,
        host: &str,
        port: u16,
        bearer_token: Option<String>,
    ) -> Result<()> {
        let service: StreamableHttpService<DynamicMcpServer, LocalSessionManager> =
            StreamableHttpService::new(
                move || Ok(self.clone()),
                Arc::new(LocalSessionManager::default()),
                StreamableHttpServerConfig {
                    stateful_mode: true,
                    ..Default::default()
                },
            );

        let mut router = axum::Router::new().nest_service("/mcp", service);
        if let Some(token) = bearer_token {
            let expected = format!("Bearer {token}");
            router = router.layer(axum::middleware::from_fn(
                move |req: axum::extract::Request, next: axum::middleware::Next| {
                    let expected = expected.clone();
                    async move {
                        let authorized = req
                            .headers()
                            .get(http::header::AUTHORIZATION)
                            .and_then(|v| v.to_str().ok())
                            .is_some_and(|v| v == expected);
                        if authorized {
                            next.run(req).await
                        } else {
                            http::StatusCode::UNAUTHORIZED.into_response()
                        }
                    }
                },
            ));
        }

        let listener = tokio::net::TcpListener::bind((host, port)).await?;
        log::info!("Listening on http://{host}:{port}/mcp");
        axum::serve(listener, router).await?;
        Ok(())
    }

    async fn call_operation(
        &self,
        operation: &ParsedOperation,
        arguments: &Map<String, Value>,
    ) -> Result<Value> {
        let request = request::synthesize(operation, arguments, &self.state.base_url)?;
        self.state
            .client
            .execute(&request, self.state.signer.as_ref())
            .await
    }

    async fn call_waiter(
        &self,
        operation: &ParsedOperation,
        config: &WaiterConfig,
        arguments: &Map<String, Value>,
    ) -> CallToolResult {
        let max_wait = arguments
            .get("maxWaitTime")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_WAITER_DEADLINE_SECS);

        let outcome = waiter::run_waiter(config, Duration::from_secs(max_wait), || {
            self.call_operation(operation, arguments)
        })
        .await;

        match outcome {
            Ok(outcome) => {
                let status = match outcome.state {
                    AcceptorState::Success => "success",
                    _ => "failure",
                };
                let report = json!({
                    "status": status,
                    "attempts": outcome.attempts,
                    "result": outcome.result,
                });
                let text = serde_json::to_string_pretty(&report).unwrap_or_default();
                if outcome.state == AcceptorState::Success {
                    CallToolResult::success(vec![Content::text(text)])
                } else {
                    CallToolResult::error(vec![Content::text(text)])
                }
            }
            Err(e) => CallToolResult::error(vec![Content::text(e.to_string())]),
        }
    }
}

impl ServerHandler for DynamicMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: self.state.service.name.clone(),
                version: self
                    .state
                    .service
                    .version
                    .clone()
                    .unwrap_or_else(|| "1.0.0".to_string()),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: self.state.service.documentation.clone(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.state.tools.iter().map(|e| e.tool.clone()).collect(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let entry = self
            .state
            .tools
            .iter()
            .find(|e| e.tool.name == request.name)
            .ok_or_else(|| {
                ErrorData::invalid_params(format!("Unknown tool: {}", request.name), None)
            })?;
        let arguments = request.arguments.unwrap_or_default();

        match entry.target {
            ToolTarget::Operation(index) => {
                let operation = &self.state.service.operations[index];
                match self.call_operation(operation, &arguments).await {
                    Ok(result) => {
                        let text = serde_json::to_string_pretty(&result)
                            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
                        Ok(CallToolResult::success(vec![Content::text(text)]))
                    }
                    Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
                }
            }
            ToolTarget::Waiter { operation, waiter } => {
                let operation = &self.state.service.operations[operation];
                let config = &operation.waiters[waiter];
                Ok(self.call_waiter(operation, config, &arguments).await)
            }
        }
    }
}

/// Build the tool table: one tool per non-internal operation, plus one
/// waiter tool per waiter.
fn build_tools(service: &ParsedService, store: &SchemaStore) -> Vec<ToolEntry> {
    let mut tools = Vec::new();

    for (index, operation) in service.operations.iter().enumerate() {
        if operation.internal {
            continue;
        }

        let tool_name = operation.tool_name();
        if let Some(d) = &operation.deprecated {
            log::warn!(
                "Tool '{}' is deprecated{}{}",
                tool_name,
                d.since.as_deref().map(|s| format!(" since {s}")).unwrap_or_default(),
                d.message.as_deref().map(|m| format!(": {m}")).unwrap_or_default(),
            );
        }

        tools.push(ToolEntry {
            tool: Tool::new(
                tool_name,
                operation.tool_description(),
                Arc::new(schema_object(operation.input_schema(store))),
            ),
            target: ToolTarget::Operation(index),
        });

        for (waiter_index, config) in operation.waiters.iter().enumerate() {
            tools.push(ToolEntry {
                tool: Tool::new(
                    config.tool_name(),
                    config.description(&operation.name),
                    Arc::new(schema_object(operation.waiter_input_schema(store))),
                ),
                target: ToolTarget::Waiter {
                    operation: index,
                    waiter: waiter_index,
                },
            });
        }
    }

    tools
}

fn schema_object(schema: Value) -> JsonObject {
    match schema {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithy_mcp_parser::SmithyParser;

    const MODEL: &str = r#"{
        "smithy": "2.0",
        "shapes": {
            "example#Api": {
                "type": "service",
                "version": "1.0",
                "operations": [
                    { "target": "example#GetJob" },
                    { "target": "example#Audit" }
                ]
            },
            "example#GetJob": {
                "type": "operation",
                "traits": {
                    "smithy.api#http": { "method": "GET", "uri": "/jobs/{id}" },
                    "smithy.waiters#waitable": {
                        "JobComplete": {
                            "acceptors": [{
                                "state": "success",
                                "matcher": {
                                    "output": {
                                        "path": "status",
                                        "expected": "COMPLETE",
                                        "comparator": "stringEquals"
                                    }
                                }
                            }]
                        }
                    }
                },
                "input": { "target": "example#GetJobInput" }
            },
            "example#GetJobInput": {
                "type": "structure",
                "members": {
                    "id": {
                        "target": "smithy.api#String",
                        "traits": { "smithy.api#required": {}, "smithy.api#httpLabel": {} }
                    }
                }
            },
            "example#Audit": {
                "type": "operation",
                "traits": { "smithy.api#internal": {} }
            }
        }
    }"#;

    #[test]
    fn test_tool_table_skips_internal_and_adds_waiters() {
        let parsed = SmithyParser::from_json(MODEL).unwrap().parse();
        let service = parsed.services.into_iter().next().unwrap();
        let tools = build_tools(&service, &parsed.store);

        let names: Vec<_> = tools.iter().map(|e| e.tool.name.as_ref()).collect();
        assert_eq!(names, ["get-job", "wait-for-job-complete"]);

        let waiter_schema = &tools[1].tool.input_schema;
        assert!(waiter_schema["properties"]["maxWaitTime"].is_object());
        assert!(waiter_schema["properties"]["id"].is_object());
    }
}
