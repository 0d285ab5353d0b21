//! Walks the shape graph and extracts the parsed service model.

use std::collections::BTreeSet;

use serde_json::Value;
use smithy_mcp_common::naming::shape_name;
use smithy_mcp_common::{
    Acceptor, AcceptorState, Comparator, Deprecated, HttpSpec, PaginationConfig, ParsedMember,
    ParsedOperation, ParsedService, ParsedStructure, Protocol, SchemaStore, WaiterConfig,
};
use smithy_mcp_common::model::{DEFAULT_WAITER_MAX_DELAY, DEFAULT_WAITER_MIN_DELAY};

use crate::ast::{self, traits, Shape, ShapeReference, SmithyModel, TraitMap};
use crate::binding;
use crate::schema::SchemaResolver;

/// Extract every service in the model along with the schema store populated
/// during resolution.
pub fn parse_services(model: &SmithyModel) -> (Vec<ParsedService>, SchemaStore) {
    let mut resolver = SchemaResolver::new(model);
    let services = model
        .services()
        .into_iter()
        .map(|(shape_id, shape)| parse_service(model, &mut resolver, shape_id, shape))
        .collect();
    (services, resolver.into_store())
}

fn parse_service(
    model: &SmithyModel,
    resolver: &mut SchemaResolver,
    shape_id: &str,
    shape: &Shape,
) -> ParsedService {
    let Shape::Service {
        version,
        operations,
        resources,
        traits: service_traits,
        ..
    } = shape
    else {
        unreachable!("parse_service called on non-service shape");
    };

    let mut parsed_ops = Vec::new();
    collect_operations(model, resolver, operations, &mut parsed_ops);
    for resource_ref in resources {
        collect_resource_operations(model, resolver, &resource_ref.target, &mut parsed_ops);
    }

    let protocol = if service_traits.contains_key(traits::REST_JSON1) {
        Some(Protocol::RestJson1)
    } else if service_traits.contains_key(traits::REST_XML) {
        Some(Protocol::RestXml)
    } else if service_traits.contains_key(traits::AWS_JSON1_0) {
        Some(Protocol::AwsJson1_0)
    } else if service_traits.contains_key(traits::AWS_JSON1_1) {
        Some(Protocol::AwsJson1_1)
    } else {
        None
    };

    ParsedService {
        name: shape_name(shape_id).to_string(),
        shape_id: shape_id.to_string(),
        version: version.clone(),
        documentation: ast::get_documentation(service_traits),
        operations: parsed_ops,
        protocol,
        bearer_auth: service_traits.contains_key(traits::HTTP_BEARER_AUTH),
        endpoint_prefix: trait_field_string(service_traits, traits::AWS_SERVICE, "endpointPrefix"),
        sigv4_service_name: trait_field_string(service_traits, traits::SIGV4, "name"),
        host_prefix: trait_field_string(service_traits, traits::ENDPOINT, "hostPrefix"),
    }
}

fn collect_operations(
    model: &SmithyModel,
    resolver: &mut SchemaResolver,
    refs: &[ShapeReference],
    out: &mut Vec<ParsedOperation>,
) {
    for op_ref in refs {
        if let Some(shape @ Shape::Operation { .. }) = model.get_shape(&op_ref.target) {
            out.push(parse_operation(model, resolver, &op_ref.target, shape));
        }
    }
}

/// Lifecycle slots first (create, put, read, update, delete, list), then
/// the resource's own operations, then collection operations, then nested
/// resources depth-first. Missing slots are skipped.
fn collect_resource_operations(
    model: &SmithyModel,
    resolver: &mut SchemaResolver,
    resource_id: &str,
    out: &mut Vec<ParsedOperation>,
) {
    let Some(Shape::Resource {
        create,
        put,
        read,
        update,
        delete,
        list,
        operations,
        collection_operations,
        resources,
        ..
    }) = model.get_shape(resource_id)
    else {
        return;
    };

    for slot in [create, put, read, update, delete, list]
        .into_iter()
        .flatten()
    {
        if let Some(shape @ Shape::Operation { .. }) = model.get_shape(&slot.target) {
            out.push(parse_operation(model, resolver, &slot.target, shape));
        }
    }
    collect_operations(model, resolver, operations, out);
    collect_operations(model, resolver, collection_operations, out);
    for nested in resources {
        collect_resource_operations(model, resolver, &nested.target, out);
    }
}

fn parse_operation(
    model: &SmithyModel,
    resolver: &mut SchemaResolver,
    shape_id: &str,
    shape: &Shape,
) -> ParsedOperation {
    let Shape::Operation {
        input,
        output,
        errors,
        traits: op_traits,
    } = shape
    else {
        unreachable!("parse_operation called on non-operation shape");
    };

    let name = shape_name(shape_id).to_string();
    let http = parse_http_trait(op_traits);
    let uri_labels = http
        .as_ref()
        .map(|h| binding::uri_labels(&h.uri))
        .unwrap_or_default();

    let input = input
        .as_ref()
        .and_then(|r| parse_structure(model, resolver, &r.target, &uri_labels));
    let output = output
        .as_ref()
        .and_then(|r| parse_structure(model, resolver, &r.target, &BTreeSet::new()));

    if let (Some(http), Some(input)) = (&http, &input) {
        binding::check_label_coverage(&name, &http.uri, &input.members);
    }

    ParsedOperation {
        name,
        shape_id: shape_id.to_string(),
        documentation: ast::get_documentation(op_traits),
        http,
        input,
        output,
        errors: errors
            .iter()
            .map(|e| shape_name(&e.target).to_string())
            .collect(),
        pagination: parse_pagination(op_traits),
        waiters: parse_waiters(op_traits),
        deprecated: parse_deprecated(op_traits),
        internal: op_traits.contains_key(traits::INTERNAL),
        idempotent: op_traits.contains_key(traits::IDEMPOTENT),
        readonly: op_traits.contains_key(traits::READONLY),
        unstable: op_traits.contains_key(traits::UNSTABLE),
        tags: op_traits
            .get(traits::TAGS)
            .and_then(|v| v.as_array())
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn parse_structure(
    model: &SmithyModel,
    resolver: &mut SchemaResolver,
    shape_id: &str,
    uri_labels: &BTreeSet<String>,
) -> Option<ParsedStructure> {
    let Some(Shape::Structure {
        members,
        traits: struct_traits,
    }) = model.get_shape(shape_id)
    else {
        return None;
    };

    let parsed_members = members
        .iter()
        .map(|(member_name, member)| ParsedMember {
            name: member_name.clone(),
            target: member.target.clone(),
            documentation: ast::get_documentation(&member.traits),
            required: ast::is_required(&member.traits),
            schema: resolver.resolve(&member.target),
            http_binding: Some(binding::classify_member(
                member_name,
                &member.traits,
                uri_labels,
            )),
            json_name: member
                .traits
                .get(traits::JSON_NAME)
                .and_then(|v| v.as_str())
                .map(String::from),
            deprecated: parse_deprecated(&member.traits),
            sensitive: member.traits.contains_key(traits::SENSITIVE),
            idempotency_token: member.traits.contains_key(traits::IDEMPOTENCY_TOKEN),
            streaming: member.traits.contains_key(traits::STREAMING),
        })
        .collect();

    Some(ParsedStructure {
        name: shape_name(shape_id).to_string(),
        shape_id: shape_id.to_string(),
        documentation: ast::get_documentation(struct_traits),
        members: parsed_members,
    })
}

fn parse_http_trait(op_traits: &TraitMap) -> Option<HttpSpec> {
    let value = op_traits.get(traits::HTTP)?;
    Some(HttpSpec {
        method: value.get("method")?.as_str()?.to_string(),
        uri: value.get("uri")?.as_str()?.to_string(),
        code: value
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok()),
    })
}

/// Read one string field out of a trait's value object.
fn trait_field_string(trait_map: &TraitMap, trait_id: &str, key: &str) -> Option<String> {
    trait_map
        .get(trait_id)?
        .get(key)
        .and_then(|v| v.as_str())
        .map(String::from)
}

fn parse_pagination(op_traits: &TraitMap) -> Option<PaginationConfig> {
    let value = op_traits.get(traits::PAGINATED)?;
    let field = |key: &str| value.get(key).and_then(|v| v.as_str()).map(String::from);
    Some(PaginationConfig {
        input_token: field("inputToken"),
        output_token: field("outputToken"),
        page_size: field("pageSize"),
        items: field("items"),
    })
}

fn parse_deprecated(trait_map: &TraitMap) -> Option<Deprecated> {
    let value = trait_map.get(traits::DEPRECATED)?;
    Some(Deprecated {
        since: value.get("since").and_then(|v| v.as_str()).map(String::from),
        message: value
            .get("message")
            .and_then(|v| v.as_str())
            .map(String::from),
    })
}

/// Parse the `smithy.waiters#waitable` trait: a map of waiter name to
/// configuration. Acceptors without an output matcher are skipped.
fn parse_waiters(op_traits: &TraitMap) -> Vec<WaiterConfig> {
    let Some(Value::Object(waiters)) = op_traits.get(traits::WAITABLE) else {
        return Vec::new();
    };

    waiters
        .iter()
        .map(|(name, config)| WaiterConfig {
            name: name.clone(),
            documentation: config
                .get("documentation")
                .and_then(|v| v.as_str())
                .map(String::from),
            min_delay: config
                .get("minDelay")
                .and_then(Value::as_u64)
                .unwrap_or(DEFAULT_WAITER_MIN_DELAY),
            max_delay: config
                .get("maxDelay")
                .and_then(Value::as_u64)
                .unwrap_or(DEFAULT_WAITER_MAX_DELAY),
            acceptors: config
                .get("acceptors")
                .and_then(|v| v.as_array())
                .map(|acceptors| acceptors.iter().filter_map(parse_acceptor).collect())
                .unwrap_or_default(),
        })
        .collect()
}

fn parse_acceptor(value: &Value) -> Option<Acceptor> {
    let state = match value.get("state").and_then(|v| v.as_str())? {
        "success" => AcceptorState::Success,
        "failure" => AcceptorState::Failure,
        "retry" => AcceptorState::Retry,
        _ => return None,
    };
    let output = value.get("matcher")?.get("output")?;
    let comparator = match output.get("comparator").and_then(|v| v.as_str()) {
        Some("booleanEquals") => Comparator::BooleanEquals,
        Some("allStringEquals") => Comparator::AllStringEquals,
        Some("anyStringEquals") => Comparator::AnyStringEquals,
        _ => Comparator::StringEquals,
    };
    Some(Acceptor {
        state,
        path: output.get("path")?.as_str()?.to_string(),
        expected: output.get("expected")?.as_str()?.to_string(),
        comparator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smithy_mcp_common::Channel;

    fn model(shapes: Value) -> SmithyModel {
        serde_json::from_value(json!({ "smithy": "2.0", "shapes": shapes })).unwrap()
    }

    #[test]
    fn test_resource_lifecycle_order() {
        let operation = |uri: &str| {
            json!({
                "type": "operation",
                "traits": { "smithy.api#http": { "method": "POST", "uri": uri } }
            })
        };
        let model = model(json!({
            "example#Api": {
                "type": "service",
                "version": "1.0",
                "resources": [{ "target": "example#Thing" }]
            },
            "example#Thing": {
                "type": "resource",
                "create": { "target": "example#CreateThing" },
                "put": { "target": "example#PutThing" },
                "read": { "target": "example#GetThing" },
                "delete": { "target": "example#DeleteThing" },
                "collectionOperations": [{ "target": "example#CountThings" }]
            },
            "example#CreateThing": operation("/things"),
            "example#PutThing": operation("/things/put"),
            "example#GetThing": operation("/things/get"),
            "example#DeleteThing": operation("/things/delete"),
            "example#CountThings": operation("/things/count")
        }));

        let (services, _) = parse_services(&model);
        let names: Vec<_> = services[0].operations.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            ["CreateThing", "PutThing", "GetThing", "DeleteThing", "CountThings"]
        );
    }

    #[test]
    fn test_service_trait_detection() {
        let model = model(json!({
            "example#Api": {
                "type": "service",
                "version": "1.0",
                "traits": {
                    "aws.protocols#restJson1": {},
                    "aws.api#service": { "sdkId": "Api", "endpointPrefix": "api" },
                    "aws.auth#sigv4": { "name": "execute-api" },
                    "smithy.api#endpoint": { "hostPrefix": "data." }
                }
            }
        }));

        let (services, _) = parse_services(&model);
        let service = &services[0];
        assert_eq!(service.protocol, Some(Protocol::RestJson1));
        assert_eq!(service.endpoint_prefix.as_deref(), Some("api"));
        assert_eq!(service.sigv4_service_name.as_deref(), Some("execute-api"));
        assert_eq!(service.host_prefix.as_deref(), Some("data."));
        assert!(!service.bearer_auth);
    }

    #[test]
    fn test_member_bindings_and_flags() {
        let model = model(json!({
            "example#Api": {
                "type": "service",
                "version": "1.0",
                "operations": [{ "target": "example#CreateJob" }]
            },
            "example#CreateJob": {
                "type": "operation",
                "traits": { "smithy.api#http": { "method": "POST", "uri": "/jobs/{queue}" } },
                "input": { "target": "example#CreateJobInput" }
            },
            "example#CreateJobInput": {
                "type": "structure",
                "members": {
                    "queue": {
                        "target": "smithy.api#String",
                        "traits": { "smithy.api#required": {} }
                    },
                    "dryRun": {
                        "target": "smithy.api#Boolean",
                        "traits": { "smithy.api#httpQuery": "dry-run" }
                    },
                    "clientToken": {
                        "target": "smithy.api#String",
                        "traits": { "smithy.api#idempotencyToken": {} }
                    },
                    "payload": {
                        "target": "smithy.api#String",
                        "traits": { "smithy.api#jsonName": "Payload" }
                    }
                }
            }
        }));

        let (services, _) = parse_services(&model);
        let input = services[0].operations[0].input.as_ref().unwrap();
        let member = |name: &str| input.members.iter().find(|m| m.name == name).unwrap();

        // No httpLabel trait, but the name matches a URI placeholder.
        assert_eq!(
            member("queue").http_binding.as_ref().unwrap().channel,
            Channel::Label
        );
        assert_eq!(
            member("dryRun").http_binding.as_ref().unwrap().wire_name.as_deref(),
            Some("dry-run")
        );
        assert!(member("clientToken").idempotency_token);
        assert_eq!(member("payload").wire_name(), "Payload");
    }

    #[test]
    fn test_waiter_parsing_defaults() {
        let model = model(json!({
            "example#Api": {
                "type": "service",
                "version": "1.0",
                "operations": [{ "target": "example#GetJob" }]
            },
            "example#GetJob": {
                "type": "operation",
                "traits": {
                    "smithy.waiters#waitable": {
                        "JobComplete": {
                            "acceptors": [
                                {
                                    "state": "success",
                                    "matcher": {
                                        "output": {
                                            "path": "status",
                                            "expected": "COMPLETE",
                                            "comparator": "stringEquals"
                                        }
                                    }
                                },
                                {
                                    "state": "failure",
                                    "matcher": { "errorType": "NotFound" }
                                }
                            ]
                        }
                    }
                }
            }
        }));

        let (services, _) = parse_services(&model);
        let waiters = &services[0].operations[0].waiters;
        assert_eq!(waiters.len(), 1);
        assert_eq!(waiters[0].min_delay, DEFAULT_WAITER_MIN_DELAY);
        assert_eq!(waiters[0].max_delay, DEFAULT_WAITER_MAX_DELAY);
        // The errorType acceptor has no output matcher and is skipped.
        assert_eq!(waiters[0].acceptors.len(), 1);
        assert_eq!(waiters[0].acceptors[0].state, AcceptorState::Success);
    }
}
