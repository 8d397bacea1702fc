//! Parameter schemas for registered tools.
//!
//! Model-declared arguments cross an untrusted boundary, so every dispatch
//! re-validates them against the owning tool's schema before the
//! implementation runs.

use std::fmt;

use serde_json::{json, Map, Value};

/// Constraint set for a single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    String {
        min_len: Option<usize>,
        max_len: Option<usize>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Enum(Vec<String>),
}

impl ParamType {
    fn check(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            ParamType::String { min_len, max_len } => {
                let text = value
                    .as_str()
                    .ok_or_else(|| "must be a string".to_string())?;
                let chars = text.chars().count();
                if let Some(min) = min_len {
                    if chars < *min {
                        return Err(format!("must be at least {min} characters"));
                    }
                }
                if let Some(max) = max_len {
                    if chars > *max {
                        return Err(format!("must be at most {max} characters"));
                    }
                }
                Ok(())
            }
            ParamType::Number { min, max } => {
                let number = value
                    .as_f64()
                    .ok_or_else(|| "must be a number".to_string())?;
                if let Some(min) = min {
                    if number < *min {
                        return Err(format!("must be at least {min}"));
                    }
                }
                if let Some(max) = max {
                    if number > *max {
                        return Err(format!("must be at most {max}"));
                    }
                }
                Ok(())
            }
            ParamType::Enum(variants) => {
                let text = value
                    .as_str()
                    .ok_or_else(|| "must be a string".to_string())?;
                if variants.iter().any(|v| v == text) {
                    Ok(())
                } else {
                    Err(format!("must be one of: {}", variants.join(", ")))
                }
            }
        }
    }

    fn json_schema(&self, description: &str) -> Value {
        match self {
            ParamType::String { min_len, max_len } => {
                let mut schema = Map::new();
                schema.insert("type".into(), json!("string"));
                schema.insert("description".into(), json!(description));
                if let Some(min) = min_len {
                    schema.insert("minLength".into(), json!(min));
                }
                if let Some(max) = max_len {
                    schema.insert("maxLength".into(), json!(max));
                }
                Value::Object(schema)
            }
            ParamType::Number { min, max } => {
                let mut schema = Map::new();
                schema.insert("type".into(), json!("number"));
                schema.insert("description".into(), json!(description));
                if let Some(min) = min {
                    schema.insert("minimum".into(), json!(min));
                }
                if let Some(max) = max {
                    schema.insert("maximum".into(), json!(max));
                }
                Value::Object(schema)
            }
            ParamType::Enum(variants) => json!({
                "type": "string",
                "description": description,
                "enum": variants,
            }),
        }
    }
}

/// One named, typed parameter of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub required: bool,
    pub description: String,
}

impl ParamSpec {
    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamType::String {
                min_len: None,
                max_len: None,
            },
            required: true,
            description: description.into(),
        }
    }

    pub fn number(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamType::Number {
                min: None,
                max: None,
            },
            required: true,
            description: description.into(),
        }
    }

    pub fn one_of<I, S>(
        name: impl Into<String>,
        variants: I,
        description: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: ParamType::Enum(variants.into_iter().map(Into::into).collect()),
            required: true,
            description: description.into(),
        }
    }

    pub fn with_len(mut self, min: usize, max: usize) -> Self {
        if let ParamType::String { min_len, max_len } = &mut self.kind {
            *min_len = Some(min);
            *max_len = Some(max);
        }
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// A violation found while checking model-supplied arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolation {
    pub field: String,
    pub constraint: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.field, self.constraint)
    }
}

/// Immutable description of a registered tool: its name, the free-text
/// description the model reads, and the parameter schema arguments are
/// validated against.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn validate(&self, args: &Value) -> std::result::Result<(), SchemaViolation> {
        let object = args.as_object().ok_or_else(|| SchemaViolation {
            field: "arguments".into(),
            constraint: "must be a JSON object".into(),
        })?;

        for param in &self.params {
            match object.get(&param.name) {
                None if param.required => {
                    return Err(SchemaViolation {
                        field: param.name.clone(),
                        constraint: "is required".into(),
                    })
                }
                None => {}
                Some(value) => {
                    param.kind.check(value).map_err(|constraint| SchemaViolation {
                        field: param.name.clone(),
                        constraint,
                    })?;
                }
            }
        }
        Ok(())
    }

    /// JSON-Schema object advertised to the remote model.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            properties.insert(param.name.clone(), param.kind.json_schema(&param.description));
            if param.required {
                required.push(json!(param.name));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
