//! Shape graph to schema resolution.
//!
//! Resolution is memoized in a [`SchemaStore`]: before a shape is converted
//! a placeholder is installed under its id, so recursive references (even
//! cycles) immediately resolve to a `Ref` node instead of recursing.

use serde_json::{Number, Value};
use smithy_mcp_common::schema::Property;
use smithy_mcp_common::{Schema, SchemaKind, SchemaNode, SchemaStore};

use crate::ast::{self, traits, Shape, SmithyModel, TraitMap};

/// Resolves shape ids to schemas, owning the memo table.
pub struct SchemaResolver<'a> {
    model: &'a SmithyModel,
    store: SchemaStore,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(model: &'a SmithyModel) -> Self {
        Self {
            model,
            store: SchemaStore::new(),
        }
    }

    /// Hand the populated store to the caller.
    pub fn into_store(self) -> SchemaStore {
        self.store
    }

    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    /// Resolve a shape id to a schema node. Prelude ids yield inline
    /// schemas; model shapes are resolved into the store and referenced.
    /// Unknown ids resolve to a permissive open object, never an error.
    pub fn resolve(&mut self, shape_id: &str) -> SchemaNode {
        if let Some(schema) = prelude_schema(shape_id) {
            return SchemaNode::Inline(Box::new(schema));
        }

        if self.store.contains(shape_id) {
            return SchemaNode::Ref(shape_id.to_string());
        }

        let Some(shape) = self.model.get_shape(shape_id) else {
            return SchemaNode::Inline(Box::new(Schema::open_object()));
        };

        // Placeholder before recursion so cyclic references terminate.
        self.store
            .insert(shape_id.to_string(), Schema::open_object());
        let schema = self.convert(shape);
        self.store.insert(shape_id.to_string(), schema);
        SchemaNode::Ref(shape_id.to_string())
    }

    fn convert(&mut self, shape: &Shape) -> Schema {
        let documentation = shape.traits().and_then(ast::get_documentation);

        let mut schema = match shape {
            Shape::String { traits } => string_schema(traits),
            Shape::Boolean { traits } => Schema {
                kind: SchemaKind::Boolean,
                default: traits.get(traits::DEFAULT).cloned(),
                ..Schema::default()
            },
            Shape::Byte { traits } => number_schema(traits, SchemaKind::Integer, Some((-128, 127))),
            Shape::Short { traits } => {
                number_schema(traits, SchemaKind::Integer, Some((-32768, 32767)))
            }
            Shape::Integer { traits } | Shape::Long { traits } => {
                number_schema(traits, SchemaKind::Integer, None)
            }
            Shape::Float { traits } | Shape::Double { traits } => {
                number_schema(traits, SchemaKind::Number, None)
            }
            Shape::BigInteger { .. } => formatted_string("bigint"),
            Shape::BigDecimal { .. } => formatted_string("decimal"),
            Shape::Timestamp { .. } => formatted_string("date-time"),
            Shape::Blob { .. } => formatted_string("base64"),
            Shape::List { member, .. } => Schema {
                kind: SchemaKind::Array,
                items: Some(self.resolve(&member.target)),
                ..Schema::default()
            },
            Shape::Map { value, .. } => Schema {
                kind: SchemaKind::Object,
                additional_properties: Some(self.resolve(&value.target)),
                ..Schema::default()
            },
            Shape::Structure { members, .. } => {
                let mut properties = Vec::new();
                let mut required = Vec::new();
                for (name, member) in members {
                    let node = self.resolve(&member.target);
                    properties.push((
                        name.clone(),
                        Property {
                            node,
                            description: ast::get_documentation(&member.traits),
                        },
                    ));
                    if ast::is_required(&member.traits) {
                        required.push(name.clone());
                    }
                }
                Schema {
                    kind: SchemaKind::Object,
                    properties,
                    required,
                    ..Schema::default()
                }
            }
            Shape::Union { members, .. } => {
                let one_of = members
                    .iter()
                    .map(|(name, member)| (name.clone(), self.resolve(&member.target)))
                    .collect();
                Schema {
                    kind: SchemaKind::Union,
                    one_of,
                    ..Schema::default()
                }
            }
            Shape::Enum { members, .. } => {
                // Wire value comes from the enumValue trait, falling back to
                // the member name.
                let enum_values = members
                    .iter()
                    .map(|(name, member)| {
                        member
                            .traits
                            .get(traits::ENUM_VALUE)
                            .cloned()
                            .unwrap_or_else(|| Value::String(name.clone()))
                    })
                    .collect();
                Schema {
                    kind: SchemaKind::String,
                    enum_values,
                    ..Schema::default()
                }
            }
            Shape::IntEnum { members, .. } => {
                let enum_values = members
                    .values()
                    .filter_map(|member| member.traits.get(traits::ENUM_VALUE).cloned())
                    .collect();
                Schema {
                    kind: SchemaKind::Integer,
                    enum_values,
                    ..Schema::default()
                }
            }
            _ => Schema::open_object(),
        };

        schema.description = documentation;
        schema
    }
}

fn string_schema(traits: &TraitMap) -> Schema {
    let mut schema = Schema {
        kind: SchemaKind::String,
        default: traits.get(traits::DEFAULT).cloned(),
        pattern: traits
            .get(traits::PATTERN)
            .and_then(|v| v.as_str())
            .map(String::from),
        ..Schema::default()
    };
    if let Some(length) = traits.get(traits::LENGTH) {
        schema.min_length = length.get("min").and_then(Value::as_u64);
        schema.max_length = length.get("max").and_then(Value::as_u64);
    }
    schema
}

fn number_schema(traits: &TraitMap, kind: SchemaKind, bounds: Option<(i64, i64)>) -> Schema {
    let mut schema = Schema {
        kind,
        default: traits.get(traits::DEFAULT).cloned(),
        ..Schema::default()
    };
    if let Some((min, max)) = bounds {
        schema.minimum = Some(Number::from(min));
        schema.maximum = Some(Number::from(max));
    }
    // An explicit range trait overrides the type's intrinsic bounds.
    if let Some(range) = traits.get(traits::RANGE) {
        if let Some(min) = trait_number(range, "min") {
            schema.minimum = Some(min);
        }
        if let Some(max) = trait_number(range, "max") {
            schema.maximum = Some(max);
        }
    }
    schema
}

fn trait_number(value: &Value, key: &str) -> Option<Number> {
    match value.get(key) {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    }
}

fn formatted_string(format: &str) -> Schema {
    Schema {
        kind: SchemaKind::String,
        format: Some(format.to_string()),
        ..Schema::default()
    }
}

/// Fixed schemas for the Smithy prelude, served without graph lookups.
pub fn prelude_schema(shape_id: &str) -> Option<Schema> {
    let schema = match shape_id {
        "smithy.api#String" => Schema {
            kind: SchemaKind::String,
            ..Schema::default()
        },
        "smithy.api#Blob" => formatted_string("base64"),
        "smithy.api#Boolean" | "smithy.api#PrimitiveBoolean" => Schema {
            kind: SchemaKind::Boolean,
            ..Schema::default()
        },
        "smithy.api#Byte" => Schema {
            kind: SchemaKind::Integer,
            minimum: Some(Number::from(-128)),
            maximum: Some(Number::from(127)),
            ..Schema::default()
        },
        "smithy.api#Short" => Schema {
            kind: SchemaKind::Integer,
            minimum: Some(Number::from(-32768)),
            maximum: Some(Number::from(32767)),
            ..Schema::default()
        },
        "smithy.api#Integer"
        | "smithy.api#Long"
        | "smithy.api#PrimitiveInteger"
        | "smithy.api#PrimitiveLong" => Schema {
            kind: SchemaKind::Integer,
            ..Schema::default()
        },
        "smithy.api#Float" | "smithy.api#Double" => Schema {
            kind: SchemaKind::Number,
            ..Schema::default()
        },
        "smithy.api#BigInteger" => formatted_string("bigint"),
        "smithy.api#BigDecimal" => formatted_string("decimal"),
        "smithy.api#Timestamp" => formatted_string("date-time"),
        "smithy.api#Document" | "smithy.api#Unit" => Schema::open_object(),
        _ => return None,
    };
    Some(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(shapes: Value) -> SmithyModel {
        serde_json::from_value(json!({ "smithy": "2.0", "shapes": shapes })).unwrap()
    }

    #[test]
    fn test_prelude_without_graph_lookup() {
        let model = model(json!({}));
        let mut resolver = SchemaResolver::new(&model);
        let node = resolver.resolve("smithy.api#Byte");
        let rendered = resolver.store().render_node(&node, 0);
        assert_eq!(rendered["type"], "integer");
        assert_eq!(rendered["minimum"], -128);
        assert_eq!(rendered["maximum"], 127);
        assert!(resolver.store().is_empty());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let model = model(json!({
            "example#Name": {
                "type": "string",
                "traits": { "smithy.api#length": { "min": 1, "max": 32 } }
            }
        }));
        let mut resolver = SchemaResolver::new(&model);
        let first = resolver.resolve("example#Name");
        let first_schema = resolver.store().get("example#Name").cloned();
        let second = resolver.resolve("example#Name");
        assert_eq!(first, second);
        assert_eq!(first_schema.as_ref(), resolver.store().get("example#Name"));
        assert_eq!(resolver.store().len(), 1);
    }

    #[test]
    fn test_cyclic_shapes_terminate() {
        let model = model(json!({
            "example#TreeNode": {
                "type": "structure",
                "members": {
                    "value": { "target": "smithy.api#String" },
                    "children": { "target": "example#TreeNodeList" }
                }
            },
            "example#TreeNodeList": {
                "type": "list",
                "member": { "target": "example#TreeNode" }
            }
        }));
        let mut resolver = SchemaResolver::new(&model);
        let node = resolver.resolve("example#TreeNode");
        assert_eq!(resolver.store().len(), 2);

        let rendered = resolver.store().render_node(&node, 0);
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["properties"]["children"]["type"], "array");
    }

    #[test]
    fn test_enum_wire_values() {
        let model = model(json!({
            "example#TemperatureUnits": {
                "type": "enum",
                "members": {
                    "CELSIUS": {
                        "target": "smithy.api#Unit",
                        "traits": { "smithy.api#enumValue": "celsius" }
                    },
                    "FAHRENHEIT": {
                        "target": "smithy.api#Unit",
                        "traits": { "smithy.api#enumValue": "fahrenheit" }
                    },
                    "KELVIN": { "target": "smithy.api#Unit" }
                }
            }
        }));
        let mut resolver = SchemaResolver::new(&model);
        let node = resolver.resolve("example#TemperatureUnits");
        let rendered = resolver.store().render_node(&node, 0);
        assert_eq!(rendered["enum"], json!(["celsius", "fahrenheit", "KELVIN"]));
    }

    #[test]
    fn test_unknown_shape_is_open_object() {
        let model = model(json!({}));
        let mut resolver = SchemaResolver::new(&model);
        let node = resolver.resolve("other.ns#Missing");
        let rendered = resolver.store().render_node(&node, 0);
        assert_eq!(rendered, json!({ "type": "object" }));
    }
}
