//! Parsed service model: the service/operation/member IR extracted from a
//! Smithy AST, independent of how it gets served (generated code or the
//! dynamic interpreter).

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::naming::{strip_html, to_kebab_case};
use crate::schema::{SchemaNode, SchemaStore};

/// Wire protocol advertised by the service shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Protocol {
    RestJson1,
    RestXml,
    AwsJson1_0,
    AwsJson1_1,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::RestJson1 => "restJson1",
            Protocol::RestXml => "restXml",
            Protocol::AwsJson1_0 => "awsJson1_0",
            Protocol::AwsJson1_1 => "awsJson1_1",
        }
    }
}

/// The `smithy.api#http` trait of an operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpSpec {
    pub method: String,
    pub uri: String,
    pub code: Option<u16>,
}

/// Which part of the HTTP request a member travels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    Label,
    Query,
    Header,
    PrefixHeaders,
    QueryParams,
    Payload,
    Body,
}

/// A member's HTTP binding. `wire_name` carries the query/header name (or
/// header prefix); body members use jsonName handling instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpBinding {
    pub channel: Channel,
    pub wire_name: Option<String>,
}

impl HttpBinding {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            wire_name: None,
        }
    }

    pub fn named(channel: Channel, wire_name: impl Into<String>) -> Self {
        Self {
            channel,
            wire_name: Some(wire_name.into()),
        }
    }
}

/// `smithy.api#deprecated` metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Deprecated {
    pub since: Option<String>,
    pub message: Option<String>,
}

/// `smithy.api#paginated` field names. Informational only: paginated calls
/// are surfaced in the tool description, not aggregated automatically.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaginationConfig {
    pub input_token: Option<String>,
    pub output_token: Option<String>,
    pub page_size: Option<String>,
    pub items: Option<String>,
}

/// Terminal state an acceptor transitions the waiter into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptorState {
    Success,
    Failure,
    Retry,
}

/// Output-matcher comparator from `smithy.waiters#waitable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparator {
    StringEquals,
    BooleanEquals,
    AllStringEquals,
    AnyStringEquals,
}

/// One output acceptor: extract `path` from the response, compare against
/// `expected`, and on match transition to `state`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Acceptor {
    pub state: AcceptorState,
    pub path: String,
    pub expected: String,
    pub comparator: Comparator,
}

/// One named waiter attached to an operation. Delays are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaiterConfig {
    pub name: String,
    pub documentation: Option<String>,
    pub min_delay: u64,
    pub max_delay: u64,
    pub acceptors: Vec<Acceptor>,
}

pub const DEFAULT_WAITER_MIN_DELAY: u64 = 2;
pub const DEFAULT_WAITER_MAX_DELAY: u64 = 120;
pub const DEFAULT_WAITER_DEADLINE_SECS: u64 = 300;

impl WaiterConfig {
    pub fn tool_name(&self) -> String {
        format!("wait-for-{}", to_kebab_case(&self.name))
    }

    pub fn description(&self, operation_name: &str) -> String {
        match &self.documentation {
            Some(doc) => strip_html(doc),
            None => format!(
                "Wait until {} condition is met by polling {} (polls every {}-{}s)",
                self.name, operation_name, self.min_delay, self.max_delay
            ),
        }
    }
}

/// One structure member with its resolved schema and HTTP binding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedMember {
    pub name: String,
    pub target: String,
    pub documentation: Option<String>,
    pub required: bool,
    pub schema: SchemaNode,
    pub http_binding: Option<HttpBinding>,
    pub json_name: Option<String>,
    pub deprecated: Option<Deprecated>,
    pub sensitive: bool,
    pub idempotency_token: bool,
    pub streaming: bool,
}

impl ParsedMember {
    /// The name this member travels under in a JSON body.
    pub fn wire_name(&self) -> &str {
        self.json_name.as_deref().unwrap_or(&self.name)
    }

    /// Member documentation with informational markers prefixed.
    pub fn description(&self) -> String {
        let mut markers = Vec::new();
        if let Some(d) = &self.deprecated {
            let mut text = String::from("DEPRECATED");
            if let Some(since) = &d.since {
                text.push_str(&format!(" since {since}"));
            }
            if let Some(message) = &d.message {
                text.push_str(&format!(": {message}"));
            }
            markers.push(text);
        }
        if self.sensitive {
            markers.push("SENSITIVE".to_string());
        }
        if self.idempotency_token {
            markers.push("Auto-generated UUID if not provided".to_string());
        }
        if self.streaming {
            markers.push("STREAMING".to_string());
        }

        let docs = self
            .documentation
            .as_deref()
            .map(strip_html)
            .unwrap_or_default();
        if markers.is_empty() {
            return docs;
        }
        let marker_str = format!("[{}]", markers.join("] ["));
        if docs.is_empty() {
            marker_str
        } else {
            format!("{marker_str} {docs}")
        }
    }
}

/// A parsed input or output structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedStructure {
    pub name: String,
    pub shape_id: String,
    pub documentation: Option<String>,
    pub members: Vec<ParsedMember>,
}

/// One operation with everything needed to expose it as a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedOperation {
    pub name: String,
    pub shape_id: String,
    pub documentation: Option<String>,
    pub http: Option<HttpSpec>,
    pub input: Option<ParsedStructure>,
    pub output: Option<ParsedStructure>,
    pub errors: Vec<String>,
    pub pagination: Option<PaginationConfig>,
    pub waiters: Vec<WaiterConfig>,
    pub deprecated: Option<Deprecated>,
    pub internal: bool,
    pub idempotent: bool,
    pub readonly: bool,
    pub unstable: bool,
    pub tags: Vec<String>,
}

impl ParsedOperation {
    pub fn tool_name(&self) -> String {
        to_kebab_case(&self.name)
    }

    pub fn method(&self) -> &str {
        self.http.as_ref().map(|h| h.method.as_str()).unwrap_or("POST")
    }

    pub fn uri_template(&self) -> String {
        match &self.http {
            Some(h) => h.uri.clone(),
            None => format!("/{}", self.name),
        }
    }

    /// HTML-stripped documentation annotated with deprecation, stability,
    /// call characteristics, pagination fields and tags.
    pub fn tool_description(&self) -> String {
        let mut description = match &self.documentation {
            Some(doc) => strip_html(doc),
            None => format!("Execute {} operation", self.name),
        };

        if let Some(d) = &self.deprecated {
            let mut parts = vec!["DEPRECATED".to_string()];
            if let Some(since) = &d.since {
                parts.push(format!("since {since}"));
            }
            if let Some(message) = &d.message {
                parts.push(message.clone());
            }
            description = format!("[{}] {description}", parts.join(": "));
        }

        if self.unstable {
            description = format!("[UNSTABLE] {description}");
        }

        let mut characteristics = Vec::new();
        if self.idempotent {
            characteristics.push("idempotent");
        }
        if self.readonly {
            characteristics.push("read-only");
        }
        if !characteristics.is_empty() {
            description.push_str(&format!(" [{}]", characteristics.join(", ")));
        }

        if let Some(p) = &self.pagination {
            let mut parts = Vec::new();
            if let Some(f) = &p.input_token {
                parts.push(format!("inputToken: {f}"));
            }
            if let Some(f) = &p.output_token {
                parts.push(format!("outputToken: {f}"));
            }
            if let Some(f) = &p.page_size {
                parts.push(format!("pageSize: {f}"));
            }
            if let Some(f) = &p.items {
                parts.push(format!("items: {f}"));
            }
            if !parts.is_empty() {
                description.push_str(&format!(" [Paginated: {}]", parts.join(", ")));
            }
        }

        if !self.tags.is_empty() {
            description.push_str(&format!(" [Tags: {}]", self.tags.join(", ")));
        }

        description
    }

    /// The MCP tool input schema for this operation. Required members stay
    /// required except idempotency tokens, which are auto-filled at call
    /// time and therefore always optional.
    pub fn input_schema(&self, store: &SchemaStore) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        if let Some(input) = &self.input {
            for member in &input.members {
                let mut rendered = store.render_node(&member.schema, 0);
                let description = member.description();
                if !description.is_empty() {
                    if let Some(obj) = rendered.as_object_mut() {
                        obj.insert("description".into(), json!(description));
                    }
                }
                properties.insert(member.name.clone(), rendered);
                if member.required && !member.idempotency_token {
                    required.push(member.name.clone());
                }
            }
        }

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), json!(required));
        }
        Value::Object(schema)
    }

    /// Input schema for a waiter tool: the operation's inputs plus an
    /// optional `maxWaitTime` override.
    pub fn waiter_input_schema(&self, store: &SchemaStore) -> Value {
        let mut schema = self.input_schema(store);
        if let Some(properties) = schema
            .get_mut("properties")
            .and_then(|p| p.as_object_mut())
        {
            properties.insert(
                "maxWaitTime".into(),
                json!({
                    "type": "integer",
                    "description": "Maximum time to wait in seconds (default: 300)",
                }),
            );
        }
        schema
    }
}

/// A parsed service with its operations and service-level traits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedService {
    pub name: String,
    pub shape_id: String,
    pub version: Option<String>,
    pub documentation: Option<String>,
    pub operations: Vec<ParsedOperation>,
    pub protocol: Option<Protocol>,
    pub bearer_auth: bool,
    pub endpoint_prefix: Option<String>,
    pub sigv4_service_name: Option<String>,
    pub host_prefix: Option<String>,
}
