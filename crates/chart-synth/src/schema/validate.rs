//! Validation of model output against a [`ChartSchema`]

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;

use super::{ChartSchema, Constraint, NodeKind, SchemaNode, StringFormat, HEX_COLOUR_PATTERN};

static HEX_COLOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(HEX_COLOUR_PATTERN).expect("hex colour pattern is valid"));

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON path of the offending value, e.g. `$.data.datasets[0].borderColor`
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Whether a string is a `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA` colour
pub fn is_hex_colour(s: &str) -> bool {
    HEX_COLOUR.is_match(s)
}

impl ChartSchema {
    /// Check `value` against the schema, filling documented defaults in place.
    ///
    /// Returns every violation found; an empty list means the value is valid.
    pub fn validate(&self, value: &mut Value) -> Vec<Violation> {
        let mut violations = Vec::new();
        validate_node(&self.root, value, "$", &mut violations);

        for constraint in &self.constraints {
            check_constraint(constraint, value, &mut violations);
        }

        violations
    }
}

fn validate_node(node: &SchemaNode, value: &mut Value, path: &str, out: &mut Vec<Violation>) {
    match &node.kind {
        NodeKind::Object { fields } => {
            let Some(map) = value.as_object_mut() else {
                out.push(type_mismatch(path, "object", value));
                return;
            };

            for field in fields {
                let field_path = format!("{}.{}", path, field.name);
                let present = map.get(&field.name).is_some_and(|v| !v.is_null());

                if !present {
                    if let Some(default) = &field.default {
                        map.insert(field.name.clone(), default.clone());
                    } else if field.optional {
                        map.remove(&field.name);
                        continue;
                    } else {
                        out.push(Violation {
                            path: field_path,
                            message: "required field is missing".to_string(),
                        });
                        continue;
                    }
                }

                if let Some(child) = map.get_mut(&field.name) {
                    validate_node(&field.node, child, &field_path, out);
                }
            }
        }
        NodeKind::Array { items } => {
            let Some(elements) = value.as_array_mut() else {
                out.push(type_mismatch(path, "array", value));
                return;
            };

            for (i, element) in elements.iter_mut().enumerate() {
                validate_node(items, element, &format!("{}[{}]", path, i), out);
            }
        }
        NodeKind::String { format } => {
            let Some(s) = value.as_str() else {
                out.push(type_mismatch(path, "string", value));
                return;
            };

            if let Some(StringFormat::HexColour) = format {
                if !is_hex_colour(s) {
                    out.push(Violation {
                        path: path.to_string(),
                        message: format!("'{}' is not a hex colour", s),
                    });
                }
            }
        }
        NodeKind::Number { minimum, maximum } => {
            let Some(n) = value.as_f64() else {
                out.push(type_mismatch(path, "number", value));
                return;
            };

            if let Some(min) = minimum {
                if n < *min {
                    out.push(Violation {
                        path: path.to_string(),
                        message: format!("{} is below the minimum of {}", n, min),
                    });
                }
            }
            if let Some(max) = maximum {
                if n > *max {
                    out.push(Violation {
                        path: path.to_string(),
                        message: format!("{} is above the maximum of {}", n, max),
                    });
                }
            }
        }
        NodeKind::Integer { minimum } => {
            let n = match value.as_i64() {
                Some(n) => n,
                // `400.0` is accepted and normalized to `400`
                None => match value.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        *value = Value::from(f as i64);
                        f as i64
                    }
                    _ => {
                        out.push(type_mismatch(path, "integer", value));
                        return;
                    }
                },
            };

            if let Some(min) = minimum {
                if n < *min {
                    out.push(Violation {
                        path: path.to_string(),
                        message: format!("{} is below the minimum of {}", n, min),
                    });
                }
            }
        }
        NodeKind::Boolean => {
            if !value.is_boolean() {
                out.push(type_mismatch(path, "boolean", value));
            }
        }
        NodeKind::Enum { values } => match value.as_str() {
            Some(s) if values.iter().any(|v| v == s) => {}
            Some(s) => out.push(Violation {
                path: path.to_string(),
                message: format!("'{}' is not one of [{}]", s, values.join(", ")),
            }),
            None => out.push(type_mismatch(path, "string", value)),
        },
    }
}

fn check_constraint(constraint: &Constraint, root: &Value, out: &mut Vec<Violation>) {
    match constraint {
        Constraint::SameLength { path, reference } => {
            let references = resolve(root, reference);
            // Structural violations were already reported
            let [(_, Value::Array(expected))] = references.as_slice() else {
                return;
            };

            for (concrete, value) in resolve(root, path) {
                if let Value::Array(actual) = value {
                    if actual.len() != expected.len() {
                        out.push(Violation {
                            path: concrete,
                            message: format!(
                                "has {} items but `{}` has {}",
                                actual.len(),
                                reference,
                                expected.len()
                            ),
                        });
                    }
                }
            }
        }
    }
}

/// Resolve a constraint path to every concrete value it names
fn resolve<'a>(root: &'a Value, path: &str) -> Vec<(String, &'a Value)> {
    let mut current = vec![("$".to_string(), root)];

    for segment in path.split('.') {
        let (name, each) = match segment.strip_suffix("[]") {
            Some(name) => (name, true),
            None => (segment, false),
        };

        let mut next = Vec::new();
        for (prefix, value) in current {
            let Some(child) = value.get(name) else {
                continue;
            };
            let child_path = format!("{}.{}", prefix, name);

            if each {
                if let Value::Array(elements) = child {
                    for (i, element) in elements.iter().enumerate() {
                        next.push((format!("{}[{}]", child_path, i), element));
                    }
                }
            } else {
                next.push((child_path, child));
            }
        }
        current = next;
    }

    current
}

fn type_mismatch(path: &str, expected: &str, found: &Value) -> Violation {
    Violation {
        path: path.to_string(),
        message: format!("expected {}, found {}", expected, json_kind(found)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ChartSchema {
        ChartSchema::bundled().unwrap()
    }

    fn minimal() -> Value {
        json!({
            "chartType": "bar",
            "data": {
                "labels": ["A", "B"],
                "datasets": [{
                    "label": "Totals",
                    "data": [1, 2],
                    "borderColor": "#36A2EB",
                    "backgroundColor": ["#36A2EB", "#FF6384"],
                    "borderWidth": 1,
                    "borderRadius": 0
                }]
            }
        })
    }

    #[test]
    fn test_hex_colours() {
        for ok in ["#fff", "#FFFA", "#36a2eb", "#36A2EB80"] {
            assert!(is_hex_colour(ok), "{}", ok);
        }
        for bad in ["fff", "#ff", "#GGGGGG", "#1234567", "red", "rgb(0,0,0)"] {
            assert!(!is_hex_colour(bad), "{}", bad);
        }
    }

    #[test]
    fn test_defaults_are_filled() {
        let mut value = minimal();
        let violations = schema().validate(&mut value);

        assert!(violations.is_empty(), "{:?}", violations);
        assert_eq!(value["height"], 400);
        assert_eq!(value["width"], 400);
        assert_eq!(value["backgroundColour"], "#FFFFFF");
        assert_eq!(value["options"]["indexAxis"], "x");
        assert_eq!(value["options"]["scales"]["y"]["stacked"], false);
        assert_eq!(value["data"]["datasets"][0]["borderSkipped"], false);
        assert!(value["options"]["plugins"].get("title").is_none());
    }

    #[test]
    fn test_nested_optional_defaults() {
        let mut value = minimal();
        value["options"] = json!({"plugins": {"title": {"text": "Totals"}, "legend": {}}});

        assert!(schema().validate(&mut value).is_empty());
        assert_eq!(value["options"]["plugins"]["title"]["display"], true);
        assert_eq!(value["options"]["plugins"]["legend"]["position"], "bottom");
    }

    #[test]
    fn test_missing_chart_type() {
        let mut value = minimal();
        value.as_object_mut().unwrap().remove("chartType");

        let violations = schema().validate(&mut value);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "$.chartType");
    }

    #[test]
    fn test_collects_every_violation() {
        let mut value = minimal();
        value["chartType"] = json!("area");
        value["width"] = json!(0);
        value["data"]["datasets"][0]["borderColor"] = json!("blue");
        value["data"]["datasets"][0]["data"] = json!([1, "2"]);

        let violations = schema().validate(&mut value);
        let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();

        assert!(paths.contains(&"$.chartType"));
        assert!(paths.contains(&"$.width"));
        assert!(paths.contains(&"$.data.datasets[0].borderColor"));
        assert!(paths.contains(&"$.data.datasets[0].data[1]"));
    }

    #[test]
    fn test_oversized_border_width_is_rejected() {
        let mut value = minimal();
        value["data"]["datasets"][0]["borderWidth"] = json!(1e12);

        let violations = schema().validate(&mut value);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "$.data.datasets[0].borderWidth");
        assert!(violations[0].message.contains("maximum"));
    }

    #[test]
    fn test_dataset_length_must_match_labels() {
        let mut value = minimal();
        value["data"]["datasets"][0]["data"] = json!([1, 2, 3]);

        let violations = schema().validate(&mut value);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "$.data.datasets[0].data");
        assert!(violations[0].message.contains("has 3 items"));
    }

    #[test]
    fn test_integral_float_is_normalized() {
        let mut value = minimal();
        value["height"] = json!(600.0);
        value["width"] = json!(512.5);

        let violations = schema().validate(&mut value);
        assert_eq!(value["height"], json!(600));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "$.width");
    }

    #[test]
    fn test_null_optional_is_dropped() {
        let mut value = minimal();
        value["options"] = json!({"plugins": {"legend": null}});

        assert!(schema().validate(&mut value).is_empty());
        assert!(value["options"]["plugins"].get("legend").is_none());
    }
}
