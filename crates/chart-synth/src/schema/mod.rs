//! Chart schema described as data
//!
//! The shape of a valid chart spec lives in `schema/chart_spec.json` rather than
//! in code. The same descriptor drives both the format instructions given to the
//! model and the validation of whatever the model sends back, so changing the
//! chart shape means editing the schema file, not the parser.

mod validate;

pub use validate::{is_hex_colour, Violation};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::error::{Error, Result};

/// Schema bundled with the crate
const BUNDLED_SCHEMA: &str = include_str!("../../schema/chart_spec.json");

/// Pattern accepted for `hexColour` strings
pub const HEX_COLOUR_PATTERN: &str =
    "^#([0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$";

/// A versioned chart schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSchema {
    pub name: String,
    pub version: u32,
    pub root: SchemaNode,
    /// Rules spanning several fields
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

/// A node of the schema tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// Value kinds a node accepts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    Object {
        fields: Vec<Field>,
    },
    Array {
        items: Box<SchemaNode>,
    },
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<StringFormat>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
    },
    Boolean,
    Enum {
        values: Vec<String>,
    },
}

/// Named member of an object node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// May be absent from the output entirely
    #[serde(default)]
    pub optional: bool,
    /// Value filled in when the model omits the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(flatten)]
    pub node: SchemaNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StringFormat {
    HexColour,
}

/// Cross-field rule
///
/// Paths are dot separated; a `[]` suffix visits every element of an array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum Constraint {
    /// Every array at `path` has the same length as the array at `reference`
    SameLength { path: String, reference: String },
}

impl ChartSchema {
    /// The schema shipped with the crate
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_SCHEMA)
    }

    /// Load a schema file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
            .map_err(|e| Error::Config(format!("schema {}: {}", path.display(), e)))
    }

    /// Parse a schema document
    pub fn from_json(raw: &str) -> Result<Self> {
        let schema: ChartSchema = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("invalid chart schema: {}", e)))?;

        if !matches!(schema.root.kind, NodeKind::Object { .. }) {
            return Err(Error::Config(
                "chart schema root must be an object".to_string(),
            ));
        }

        Ok(schema)
    }

    /// Render the schema as a JSON Schema (draft-07) document
    pub fn to_json_schema(&self) -> Value {
        let mut schema = self.root.to_json_schema();
        if let Value::Object(map) = &mut schema {
            map.insert(
                "$schema".to_string(),
                json!("http://json-schema.org/draft-07/schema#"),
            );
            map.insert("title".to_string(), json!(self.name));
        }
        schema
    }

    /// Human-readable statements of the cross-field rules
    pub fn constraint_notes(&self) -> Vec<String> {
        self.constraints
            .iter()
            .map(|c| match c {
                Constraint::SameLength { path, reference } => format!(
                    "every `{}` array must contain exactly as many items as `{}`",
                    path, reference
                ),
            })
            .collect()
    }
}

impl SchemaNode {
    fn to_json_schema(&self) -> Value {
        let mut out = Map::new();

        match &self.kind {
            NodeKind::Object { fields } => {
                let mut properties = Map::new();
                let mut required = Vec::new();

                for field in fields {
                    let mut property = field.node.to_json_schema();
                    if let (Some(default), Value::Object(map)) = (&field.default, &mut property) {
                        map.insert("default".to_string(), default.clone());
                    }
                    properties.insert(field.name.clone(), property);

                    if !field.optional {
                        required.push(json!(field.name));
                    }
                }

                out.insert("type".to_string(), json!("object"));
                out.insert("properties".to_string(), Value::Object(properties));
                out.insert("required".to_string(), Value::Array(required));
                out.insert("additionalProperties".to_string(), json!(false));
            }
            NodeKind::Array { items } => {
                out.insert("type".to_string(), json!("array"));
                out.insert("items".to_string(), items.to_json_schema());
            }
            NodeKind::String { format } => {
                out.insert("type".to_string(), json!("string"));
                if let Some(StringFormat::HexColour) = format {
                    out.insert("pattern".to_string(), json!(HEX_COLOUR_PATTERN));
                }
            }
            NodeKind::Number { minimum, maximum } => {
                out.insert("type".to_string(), json!("number"));
                if let Some(min) = minimum {
                    out.insert("minimum".to_string(), json!(min));
                }
                if let Some(max) = maximum {
                    out.insert("maximum".to_string(), json!(max));
                }
            }
            NodeKind::Integer { minimum } => {
                out.insert("type".to_string(), json!("integer"));
                if let Some(min) = minimum {
                    out.insert("minimum".to_string(), json!(min));
                }
            }
            NodeKind::Boolean => {
                out.insert("type".to_string(), json!("boolean"));
            }
            NodeKind::Enum { values } => {
                out.insert("type".to_string(), json!("string"));
                out.insert("enum".to_string(), json!(values));
            }
        }

        if let Some(description) = &self.description {
            out.insert("description".to_string(), json!(description));
        }

        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_schema_loads() {
        let schema = ChartSchema::bundled().unwrap();
        assert_eq!(schema.name, "ChartSpec");
        assert_eq!(schema.constraints.len(), 1);

        let NodeKind::Object { fields } = &schema.root.kind else {
            panic!("root is not an object");
        };
        let chart_type = fields.iter().find(|f| f.name == "chartType").unwrap();
        match &chart_type.node.kind {
            NodeKind::Enum { values } => assert_eq!(values.len(), 8),
            other => panic!("unexpected kind {:?}", other),
        }
        let height = fields.iter().find(|f| f.name == "height").unwrap();
        assert_eq!(height.default, Some(json!(400)));
    }

    #[test]
    fn test_border_widths_are_bounded() {
        let schema = ChartSchema::bundled().unwrap().to_json_schema();
        let dataset = &schema["properties"]["data"]["properties"]["datasets"]["items"]["properties"];

        assert_eq!(dataset["borderWidth"]["minimum"], 0.0);
        assert_eq!(dataset["borderWidth"]["maximum"], 64.0);
        assert_eq!(dataset["borderRadius"]["maximum"], 64.0);
    }

    #[test]
    fn test_json_schema_rendering() {
        let schema = ChartSchema::bundled().unwrap().to_json_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["chartType"]["enum"][5], "polarArea");
        assert_eq!(schema["properties"]["width"]["default"], 400);
        assert_eq!(
            schema["properties"]["backgroundColour"]["pattern"],
            HEX_COLOUR_PATTERN
        );

        let plugins = &schema["properties"]["options"]["properties"]["plugins"];
        let required = plugins["required"].as_array().unwrap();
        assert!(required.is_empty(), "legend and title are optional");
    }

    #[test]
    fn test_rejects_non_object_root() {
        let err = ChartSchema::from_json(
            r#"{"name": "x", "version": 1, "root": {"type": "string"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_constraint_notes() {
        let notes = ChartSchema::bundled().unwrap().constraint_notes();
        assert_eq!(
            notes,
            vec!["every `data.datasets[].data` array must contain exactly as many items as `data.labels`"]
        );
    }
}
