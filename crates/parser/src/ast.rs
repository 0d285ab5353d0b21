//! Smithy 2.0 JSON AST type definitions
//!
//! These types mirror the structure of Smithy JSON AST documents as emitted
//! by `smithy build` or shipped in the AWS api-models repositories.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Trait maps carry arbitrary JSON values keyed by trait shape id.
pub type TraitMap = HashMap<String, serde_json::Value>;

/// Root Smithy model document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmithyModel {
    /// Smithy IDL version (e.g., "2.0")
    pub smithy: String,

    /// Shape definitions keyed by `namespace#Name`. A document without a
    /// shapes map is rejected at load time.
    pub shapes: HashMap<String, Shape>,

    /// Model-level metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A Smithy shape. Member maps use `BTreeMap` so member order is stable
/// across runs regardless of JSON key order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Shape {
    /// Service definition
    Service {
        #[serde(default)]
        version: Option<String>,

        #[serde(default)]
        operations: Vec<ShapeReference>,

        #[serde(default)]
        resources: Vec<ShapeReference>,

        #[serde(default)]
        errors: Vec<ShapeReference>,

        #[serde(default)]
        traits: TraitMap,
    },

    /// Resource definition with lifecycle operation slots
    Resource {
        #[serde(default)]
        identifiers: BTreeMap<String, ShapeReference>,

        #[serde(default)]
        create: Option<ShapeReference>,

        #[serde(default)]
        put: Option<ShapeReference>,

        #[serde(default)]
        read: Option<ShapeReference>,

        #[serde(default)]
        update: Option<ShapeReference>,

        #[serde(default)]
        delete: Option<ShapeReference>,

        #[serde(default)]
        list: Option<ShapeReference>,

        #[serde(default)]
        operations: Vec<ShapeReference>,

        #[serde(default, rename = "collectionOperations")]
        collection_operations: Vec<ShapeReference>,

        #[serde(default)]
        resources: Vec<ShapeReference>,

        #[serde(default)]
        traits: TraitMap,
    },

    /// Operation definition
    Operation {
        #[serde(default)]
        input: Option<ShapeReference>,

        #[serde(default)]
        output: Option<ShapeReference>,

        #[serde(default)]
        errors: Vec<ShapeReference>,

        #[serde(default)]
        traits: TraitMap,
    },

    /// Structure definition (input/output types)
    Structure {
        #[serde(default)]
        members: BTreeMap<String, Member>,

        #[serde(default)]
        traits: TraitMap,
    },

    /// Tagged union
    Union {
        #[serde(default)]
        members: BTreeMap<String, Member>,

        #[serde(default)]
        traits: TraitMap,
    },

    /// String enum (Smithy 2.0 enum shape)
    Enum {
        #[serde(default)]
        members: BTreeMap<String, Member>,

        #[serde(default)]
        traits: TraitMap,
    },

    /// Integer enum
    IntEnum {
        #[serde(default)]
        members: BTreeMap<String, Member>,

        #[serde(default)]
        traits: TraitMap,
    },

    /// List type
    List {
        member: Member,

        #[serde(default)]
        traits: TraitMap,
    },

    /// Map type
    Map {
        key: Member,
        value: Member,

        #[serde(default)]
        traits: TraitMap,
    },

    Blob {
        #[serde(default)]
        traits: TraitMap,
    },

    Boolean {
        #[serde(default)]
        traits: TraitMap,
    },

    String {
        #[serde(default)]
        traits: TraitMap,
    },

    Byte {
        #[serde(default)]
        traits: TraitMap,
    },

    Short {
        #[serde(default)]
        traits: TraitMap,
    },

    Integer {
        #[serde(default)]
        traits: TraitMap,
    },

    Long {
        #[serde(default)]
        traits: TraitMap,
    },

    Float {
        #[serde(default)]
        traits: TraitMap,
    },

    Double {
        #[serde(default)]
        traits: TraitMap,
    },

    BigInteger {
        #[serde(default)]
        traits: TraitMap,
    },

    BigDecimal {
        #[serde(default)]
        traits: TraitMap,
    },

    Timestamp {
        #[serde(default)]
        traits: TraitMap,
    },

    Document {
        #[serde(default)]
        traits: TraitMap,
    },

    /// Fallback for unrecognized shape types
    #[serde(other)]
    Other,
}

impl Shape {
    /// The shape's trait map, empty for unrecognized shapes.
    pub fn traits(&self) -> Option<&TraitMap> {
        match self {
            Shape::Service { traits, .. }
            | Shape::Resource { traits, .. }
            | Shape::Operation { traits, .. }
            | Shape::Structure { traits, .. }
            | Shape::Union { traits, .. }
            | Shape::Enum { traits, .. }
            | Shape::IntEnum { traits, .. }
            | Shape::List { traits, .. }
            | Shape::Map { traits, .. }
            | Shape::Blob { traits }
            | Shape::Boolean { traits }
            | Shape::String { traits }
            | Shape::Byte { traits }
            | Shape::Short { traits }
            | Shape::Integer { traits }
            | Shape::Long { traits }
            | Shape::Float { traits }
            | Shape::Double { traits }
            | Shape::BigInteger { traits }
            | Shape::BigDecimal { traits }
            | Shape::Timestamp { traits }
            | Shape::Document { traits } => Some(traits),
            Shape::Other => None,
        }
    }
}

/// Reference to another shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeReference {
    /// Target shape ID (e.g., "com.amazonaws.s3#Bucket")
    pub target: String,
}

/// Structure/union/enum member definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Target shape for this member
    pub target: String,

    #[serde(default)]
    pub traits: TraitMap,
}

impl SmithyModel {
    /// Get a shape by its ID
    pub fn get_shape(&self, shape_id: &str) -> Option<&Shape> {
        self.shapes.get(shape_id)
    }

    /// All service shapes in the model, sorted by shape id for stable output.
    pub fn services(&self) -> Vec<(&String, &Shape)> {
        let mut services: Vec<_> = self
            .shapes
            .iter()
            .filter(|(_, shape)| matches!(shape, Shape::Service { .. }))
            .collect();
        services.sort_by(|(a, _), (b, _)| a.cmp(b));
        services
    }
}

/// Smithy trait shape ids recognized by the pipeline
pub mod traits {
    pub const DOCUMENTATION: &str = "smithy.api#documentation";
    pub const REQUIRED: &str = "smithy.api#required";
    pub const HTTP: &str = "smithy.api#http";
    pub const HTTP_LABEL: &str = "smithy.api#httpLabel";
    pub const HTTP_QUERY: &str = "smithy.api#httpQuery";
    pub const HTTP_QUERY_PARAMS: &str = "smithy.api#httpQueryParams";
    pub const HTTP_HEADER: &str = "smithy.api#httpHeader";
    pub const HTTP_PREFIX_HEADERS: &str = "smithy.api#httpPrefixHeaders";
    pub const HTTP_PAYLOAD: &str = "smithy.api#httpPayload";
    pub const HTTP_BEARER_AUTH: &str = "smithy.api#httpBearerAuth";
    pub const JSON_NAME: &str = "smithy.api#jsonName";
    pub const PAGINATED: &str = "smithy.api#paginated";
    pub const ENUM_VALUE: &str = "smithy.api#enumValue";
    pub const LENGTH: &str = "smithy.api#length";
    pub const RANGE: &str = "smithy.api#range";
    pub const PATTERN: &str = "smithy.api#pattern";
    pub const DEFAULT: &str = "smithy.api#default";
    pub const DEPRECATED: &str = "smithy.api#deprecated";
    pub const SENSITIVE: &str = "smithy.api#sensitive";
    pub const IDEMPOTENCY_TOKEN: &str = "smithy.api#idempotencyToken";
    pub const IDEMPOTENT: &str = "smithy.api#idempotent";
    pub const READONLY: &str = "smithy.api#readonly";
    pub const INTERNAL: &str = "smithy.api#internal";
    pub const UNSTABLE: &str = "smithy.api#unstable";
    pub const TAGS: &str = "smithy.api#tags";
    pub const STREAMING: &str = "smithy.api#streaming";
    pub const ENDPOINT: &str = "smithy.api#endpoint";
    pub const AWS_SERVICE: &str = "aws.api#service";
    pub const SIGV4: &str = "aws.auth#sigv4";
    pub const REST_JSON1: &str = "aws.protocols#restJson1";
    pub const REST_XML: &str = "aws.protocols#restXml";
    pub const AWS_JSON1_0: &str = "aws.protocols#awsJson1_0";
    pub const AWS_JSON1_1: &str = "aws.protocols#awsJson1_1";
    pub const WAITABLE: &str = "smithy.waiters#waitable";
}

/// Trait map helpers shared by the resolver and the extractor.
pub fn get_documentation(traits: &TraitMap) -> Option<String> {
    traits
        .get(traits::DOCUMENTATION)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

pub fn is_required(traits: &TraitMap) -> bool {
    traits.contains_key(traits::REQUIRED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_shapes() {
        let json = r#"{
            "smithy": "2.0",
            "shapes": {
                "example#Weather": {
                    "type": "service",
                    "version": "2024-01-01",
                    "operations": [{ "target": "example#GetForecast" }]
                },
                "example#TemperatureUnits": {
                    "type": "enum",
                    "members": {
                        "CELSIUS": {
                            "target": "smithy.api#Unit",
                            "traits": { "smithy.api#enumValue": "celsius" }
                        }
                    }
                },
                "example#CityList": {
                    "type": "list",
                    "member": { "target": "smithy.api#String" }
                }
            }
        }"#;

        let model: SmithyModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.smithy, "2.0");
        assert!(matches!(
            model.get_shape("example#Weather"),
            Some(Shape::Service { .. })
        ));
        assert!(matches!(
            model.get_shape("example#TemperatureUnits"),
            Some(Shape::Enum { .. })
        ));
        assert!(matches!(
            model.get_shape("example#CityList"),
            Some(Shape::List { .. })
        ));
    }

    #[test]
    fn test_unknown_shape_type_falls_back() {
        let json = r#"{
            "smithy": "2.0",
            "shapes": {
                "example#Mystery": { "type": "somethingNew" }
            }
        }"#;

        let model: SmithyModel = serde_json::from_str(json).unwrap();
        assert!(matches!(model.get_shape("example#Mystery"), Some(Shape::Other)));
    }
}
