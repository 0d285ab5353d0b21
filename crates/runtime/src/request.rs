//! Request synthesis: operation plus argument map in, HTTP request out.
//!
//! This is a pure function of its inputs so both the dynamic server and the
//! waiter engine share one code path.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};
use smithy_mcp_common::{Channel, ParsedOperation, Result, SmithyMcpError};
use url::Url;
use uuid::Uuid;

/// Characters escaped when a label value is spliced into the path.
const PATH_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A fully assembled request, ready to hand to the HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedRequest {
    pub method: String,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Build the request for one operation invocation.
///
/// Members travel in the channel their binding names. Absent optional values
/// (missing or JSON null) are skipped entirely, except idempotency-token
/// members which are filled with a fresh UUID. Body members only assemble
/// into a JSON object for POST, PUT and PATCH; a payload member becomes the
/// raw body regardless of method.
pub fn synthesize(
    operation: &ParsedOperation,
    arguments: &Map<String, Value>,
    base_url: &str,
) -> Result<SynthesizedRequest> {
    let method = operation.method().to_string();
    let mut path = operation.uri_template();
    let mut query: Vec<(String, String)> = Vec::new();
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut body_object = Map::new();
    let mut payload: Option<Value> = None;

    if let Some(input) = &operation.input {
        for member in &input.members {
            let mut value = arguments.get(&member.name).cloned();
            if member.idempotency_token && !matches!(value, Some(ref v) if !v.is_null()) {
                value = Some(Value::String(Uuid::new_v4().to_string()));
            }
            let Some(value) = value else { continue };
            if value.is_null() {
                continue;
            }

            let channel = member
                .http_binding
                .as_ref()
                .map(|b| b.channel)
                .unwrap_or(Channel::Body);
            match channel {
                Channel::Label => {
                    let encoded =
                        utf8_percent_encode(&stringify(&value), PATH_COMPONENT).to_string();
                    path = path
                        .replace(&format!("{{{}+}}", member.name), &encoded)
                        .replace(&format!("{{{}}}", member.name), &encoded);
                }
                Channel::Query => {
                    query.push((wire_name(member), stringify(&value)));
                }
                Channel::QueryParams => {
                    if let Value::Object(entries) = &value {
                        for (k, v) in entries {
                            if !v.is_null() {
                                query.push((k.clone(), stringify(v)));
                            }
                        }
                    }
                }
                Channel::Header => {
                    headers.push((wire_name(member), stringify(&value)));
                }
                Channel::PrefixHeaders => {
                    if let Value::Object(entries) = &value {
                        let prefix = member
                            .http_binding
                            .as_ref()
                            .and_then(|b| b.wire_name.as_deref())
                            .unwrap_or("");
                        for (k, v) in entries {
                            if !v.is_null() {
                                headers.push((format!("{prefix}{k}"), stringify(v)));
                            }
                        }
                    }
                }
                Channel::Payload => {
                    payload = Some(value);
                }
                Channel::Body => {
                    body_object.insert(member.wire_name().to_string(), value);
                }
            }
        }
    }

    let base = Url::parse(base_url)
        .map_err(|e| SmithyMcpError::Configuration(format!("Invalid base URL {base_url}: {e}")))?;
    let mut url = base
        .join(&path)
        .map_err(|e| SmithyMcpError::Configuration(format!("Invalid request path {path}: {e}")))?;
    for (key, value) in &query {
        url.query_pairs_mut().append_pair(key, value);
    }

    let body = if let Some(payload) = payload {
        Some(serde_json::to_string(&payload)?)
    } else if !body_object.is_empty() && matches!(method.as_str(), "POST" | "PUT" | "PATCH") {
        Some(serde_json::to_string(&Value::Object(body_object))?)
    } else {
        None
    };

    Ok(SynthesizedRequest {
        method,
        url,
        headers,
        body,
    })
}

fn wire_name(member: &smithy_mcp_common::ParsedMember) -> String {
    member
        .http_binding
        .as_ref()
        .and_then(|b| b.wire_name.clone())
        .unwrap_or_else(|| member.name.clone())
}

/// Stringify a value for a query, header or label slot: scalars through
/// their display form, arrays comma-joined, objects as compact JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(stringify)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smithy_mcp_common::{
        HttpBinding, HttpSpec, ParsedMember, ParsedOperation, ParsedStructure, Schema, SchemaKind,
        SchemaNode,
    };

    fn member(name: &str, channel: Channel, wire: Option<&str>) -> ParsedMember {
        ParsedMember {
            name: name.to_string(),
            target: "smithy.api#String".to_string(),
            documentation: None,
            required: false,
            schema: SchemaNode::Inline(Box::new(Schema {
                kind: SchemaKind::String,
                ..Schema::default()
            })),
            http_binding: Some(match wire {
                Some(w) => HttpBinding::named(channel, w),
                None => HttpBinding::new(channel),
            }),
            json_name: None,
            deprecated: None,
            sensitive: false,
            idempotency_token: false,
            streaming: false,
        }
    }

    fn operation(method: &str, uri: &str, members: Vec<ParsedMember>) -> ParsedOperation {
        ParsedOperation {
            name: "TestOperation".to_string(),
            shape_id: "example#TestOperation".to_string(),
            documentation: None,
            http: Some(HttpSpec {
                method: method.to_string(),
                uri: uri.to_string(),
                code: None,
            }),
            input: Some(ParsedStructure {
                name: "TestOperationInput".to_string(),
                shape_id: "example#TestOperationInput".to_string(),
                documentation: None,
                members,
            }),
            output: None,
            errors: vec![],
            pagination: None,
            waiters: vec![],
            deprecated: None,
            internal: false,
            idempotent: false,
            readonly: false,
            unstable: false,
            tags: vec![],
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_label_is_percent_encoded() {
        let op = operation(
            "GET",
            "/weather/{city}",
            vec![member("city", Channel::Label, None)],
        );
        let req = synthesize(&op, &args(json!({ "city": "São Paulo" })), "http://localhost:8080")
            .unwrap();
        assert_eq!(req.url.path(), "/weather/S%C3%A3o%20Paulo");
        assert!(req.body.is_none());
    }

    #[test]
    fn test_absent_query_member_is_omitted() {
        let op = operation(
            "GET",
            "/weather/{city}",
            vec![
                member("city", Channel::Label, None),
                member("units", Channel::Query, Some("units")),
            ],
        );
        let req = synthesize(&op, &args(json!({ "city": "Lisbon" })), "http://localhost:8080")
            .unwrap();
        assert_eq!(req.url.as_str(), "http://localhost:8080/weather/Lisbon");

        let req = synthesize(
            &op,
            &args(json!({ "city": "Lisbon", "units": "celsius" })),
            "http://localhost:8080",
        )
        .unwrap();
        assert_eq!(req.url.query(), Some("units=celsius"));
    }

    #[test]
    fn test_query_stringification() {
        let op = operation(
            "GET",
            "/search",
            vec![
                member("tags", Channel::Query, Some("tags")),
                member("limit", Channel::Query, Some("limit")),
            ],
        );
        let req = synthesize(
            &op,
            &args(json!({ "tags": ["a", "b", "c"], "limit": 25 })),
            "http://localhost:8080",
        )
        .unwrap();
        let query: Vec<_> = req.url.query_pairs().collect();
        assert_eq!(query[0], ("tags".into(), "a,b,c".into()));
        assert_eq!(query[1], ("limit".into(), "25".into()));
    }

    #[test]
    fn test_idempotency_token_filled_and_fresh() {
        let mut token = member("clientToken", Channel::Body, None);
        token.idempotency_token = true;
        let op = operation("POST", "/jobs", vec![token]);

        let first = synthesize(&op, &Map::new(), "http://localhost:8080").unwrap();
        let second = synthesize(&op, &Map::new(), "http://localhost:8080").unwrap();

        let token_of = |req: &SynthesizedRequest| {
            let body: Value = serde_json::from_str(req.body.as_ref().unwrap()).unwrap();
            body["clientToken"].as_str().unwrap().to_string()
        };
        let a = token_of(&first);
        let b = token_of(&second);
        assert_eq!(a.len(), 36);
        assert_ne!(a, b);

        // A supplied token is passed through untouched.
        let explicit = synthesize(
            &op,
            &args(json!({ "clientToken": "provided" })),
            "http://localhost:8080",
        )
        .unwrap();
        assert_eq!(token_of(&explicit), "provided");
    }

    #[test]
    fn test_no_body_without_body_members() {
        // POST with every member bound away from the body must not invent
        // an empty JSON object body.
        let op = operation(
            "POST",
            "/things/{id}",
            vec![
                member("id", Channel::Label, None),
                member("trace", Channel::Header, Some("x-trace-id")),
            ],
        );
        let req = synthesize(
            &op,
            &args(json!({ "id": "t-1", "trace": "abc" })),
            "http://localhost:8080",
        )
        .unwrap();
        assert!(req.body.is_none());
        assert_eq!(req.headers, vec![("x-trace-id".to_string(), "abc".to_string())]);
    }

    #[test]
    fn test_body_only_for_mutating_methods() {
        let op = operation("GET", "/things", vec![member("note", Channel::Body, None)]);
        let req = synthesize(&op, &args(json!({ "note": "hi" })), "http://localhost:8080")
            .unwrap();
        assert!(req.body.is_none());

        let op = operation("POST", "/things", vec![member("note", Channel::Body, None)]);
        let req = synthesize(&op, &args(json!({ "note": "hi" })), "http://localhost:8080")
            .unwrap();
        assert_eq!(req.body.as_deref(), Some(r#"{"note":"hi"}"#));
    }

    #[test]
    fn test_payload_member_is_raw_body() {
        let op = operation(
            "PUT",
            "/objects/{key}",
            vec![
                member("key", Channel::Label, None),
                member("content", Channel::Payload, None),
            ],
        );
        let req = synthesize(
            &op,
            &args(json!({ "key": "a", "content": { "data": [1, 2] } })),
            "http://localhost:8080",
        )
        .unwrap();
        assert_eq!(req.body.as_deref(), Some(r#"{"data":[1,2]}"#));
    }

    #[test]
    fn test_prefix_headers_and_query_params_spread() {
        let op = operation(
            "POST",
            "/items",
            vec![
                member("meta", Channel::PrefixHeaders, Some("x-meta-")),
                member("filters", Channel::QueryParams, None),
            ],
        );
        let req = synthesize(
            &op,
            &args(json!({
                "meta": { "owner": "ops" },
                "filters": { "state": "open" }
            })),
            "http://localhost:8080",
        )
        .unwrap();
        assert_eq!(
            req.headers,
            vec![("x-meta-owner".to_string(), "ops".to_string())]
        );
        assert_eq!(req.url.query(), Some("state=open"));
    }

    #[test]
    fn test_invalid_base_url_is_configuration_error() {
        let op = operation("GET", "/x", vec![]);
        let err = synthesize(&op, &Map::new(), "not a url").unwrap_err();
        assert!(matches!(err, SmithyMcpError::Configuration(_)));
    }
}
