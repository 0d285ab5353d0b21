//! Semantic schema model resolved from Smithy shapes.
//!
//! Shapes form a possibly cyclic graph, so resolved schemas live in a
//! [`SchemaStore`] keyed by shape id and refer to each other through
//! [`SchemaNode::Ref`] entries rather than owned children. Rendering to a
//! JSON Schema value dereferences those entries with a recursion depth cap
//! so self-referential type graphs terminate.

use serde::Serialize;
use serde_json::{json, Map, Number, Value};
use std::collections::BTreeMap;

/// Maximum nesting depth when rendering a schema to JSON Schema. Past this
/// depth the rendering degrades to an unconstrained value.
pub const MAX_SCHEMA_DEPTH: usize = 10;

/// The resolved kind of a schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Union,
    #[default]
    Unknown,
}

/// A child schema reference: either inline (prelude and fallback schemas)
/// or a shape id pointing into the [`SchemaStore`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SchemaNode {
    Inline(Box<Schema>),
    Ref(String),
}

/// One structure property: the member's schema plus an optional member-level
/// documentation override (member docs take precedence over the referenced
/// shape's docs).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub node: SchemaNode,
    pub description: Option<String>,
}

/// The resolved semantic description of one shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    pub kind: SchemaKind,
    pub description: Option<String>,
    pub format: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub enum_values: Vec<Value>,
    pub default: Option<Value>,
    pub items: Option<SchemaNode>,
    pub additional_properties: Option<SchemaNode>,
    pub properties: Vec<(String, Property)>,
    pub required: Vec<String>,
    pub one_of: Vec<(String, SchemaNode)>,
}

impl Schema {
    /// A permissive open-object schema, used for unknown or foreign shape
    /// references so partial models never break generation.
    pub fn open_object() -> Self {
        Self {
            kind: SchemaKind::Object,
            ..Self::default()
        }
    }
}

/// Memo table of resolved schemas keyed by fully-qualified shape id.
///
/// The store exclusively owns each entry; consumers hold `Ref` nodes and
/// dereference through the store when rendering.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaStore {
    schemas: BTreeMap<String, Schema>,
}

impl SchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, shape_id: &str) -> bool {
        self.schemas.contains_key(shape_id)
    }

    pub fn get(&self, shape_id: &str) -> Option<&Schema> {
        self.schemas.get(shape_id)
    }

    /// Install a schema (or the pre-recursion placeholder) for a shape id.
    pub fn insert(&mut self, shape_id: String, schema: Schema) {
        self.schemas.insert(shape_id, schema);
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Render a schema node to a JSON Schema value, dereferencing store
    /// entries and capping recursion at [`MAX_SCHEMA_DEPTH`].
    pub fn render_node(&self, node: &SchemaNode, depth: usize) -> Value {
        if depth > MAX_SCHEMA_DEPTH {
            return json!({});
        }
        match node {
            SchemaNode::Inline(schema) => self.render(schema, depth),
            SchemaNode::Ref(shape_id) => match self.schemas.get(shape_id) {
                Some(schema) => self.render(schema, depth),
                None => json!({ "type": "object" }),
            },
        }
    }

    /// Render a schema to a JSON Schema value.
    pub fn render(&self, schema: &Schema, depth: usize) -> Value {
        if depth > MAX_SCHEMA_DEPTH {
            return json!({});
        }

        let mut obj = Map::new();
        match schema.kind {
            SchemaKind::String | SchemaKind::Integer | SchemaKind::Number | SchemaKind::Boolean => {
                let type_name = match schema.kind {
                    SchemaKind::String => "string",
                    SchemaKind::Integer => "integer",
                    SchemaKind::Number => "number",
                    _ => "boolean",
                };
                obj.insert("type".into(), json!(type_name));
                if let Some(format) = &schema.format {
                    obj.insert("format".into(), json!(format));
                }
                if let Some(min) = schema.min_length {
                    obj.insert("minLength".into(), json!(min));
                }
                if let Some(max) = schema.max_length {
                    obj.insert("maxLength".into(), json!(max));
                }
                if let Some(pattern) = &schema.pattern {
                    obj.insert("pattern".into(), json!(pattern));
                }
                if let Some(min) = &schema.minimum {
                    obj.insert("minimum".into(), Value::Number(min.clone()));
                }
                if let Some(max) = &schema.maximum {
                    obj.insert("maximum".into(), Value::Number(max.clone()));
                }
                if !schema.enum_values.is_empty() {
                    obj.insert("enum".into(), Value::Array(schema.enum_values.clone()));
                }
                if let Some(default) = &schema.default {
                    obj.insert("default".into(), default.clone());
                }
            }
            SchemaKind::Array => {
                obj.insert("type".into(), json!("array"));
                let items = match &schema.items {
                    Some(node) => self.render_node(node, depth + 1),
                    None => json!({}),
                };
                obj.insert("items".into(), items);
            }
            SchemaKind::Object => {
                obj.insert("type".into(), json!("object"));
                if let Some(values) = &schema.additional_properties {
                    obj.insert(
                        "additionalProperties".into(),
                        self.render_node(values, depth + 1),
                    );
                } else if !schema.properties.is_empty() {
                    let mut props = Map::new();
                    for (name, property) in &schema.properties {
                        let mut rendered = self.render_node(&property.node, depth + 1);
                        if let Some(doc) = &property.description {
                            if let Some(prop_obj) = rendered.as_object_mut() {
                                prop_obj.insert("description".into(), json!(doc));
                            }
                        }
                        props.insert(name.clone(), rendered);
                    }
                    obj.insert("properties".into(), Value::Object(props));
                    if !schema.required.is_empty() {
                        obj.insert("required".into(), json!(schema.required));
                    }
                }
            }
            SchemaKind::Union => {
                let alternatives: Vec<Value> = schema
                    .one_of
                    .iter()
                    .map(|(name, node)| {
                        json!({
                            "type": "object",
                            "properties": { name: self.render_node(node, depth + 1) },
                            "required": [name],
                        })
                    })
                    .collect();
                obj.insert("oneOf".into(), Value::Array(alternatives));
            }
            SchemaKind::Unknown => {}
        }

        if let Some(doc) = &schema.description {
            obj.insert("description".into(), json!(doc));
        }
        Value::Object(obj)
    }
}
