//! tree::kind
//!
//! Setting types: coercion, validation, defaults and document attributes.
//!
//! # Type names
//!
//! Each kind has one canonical name, written to documents, plus aliases
//! accepted when reading:
//!
//! | canonical | aliases |
//! |-----------|---------|
//! | `bool`    | `boolean`, `true_false`, `yes_no` |
//! | `int`     | `integer` |
//! | `double`  | `float` |
//! | `string`  | `str` |
//! | `choice`  | |
//! | `list`    | |
//! | `dict`    | `dictionary`, `map` |
//! | `generic` | |

use std::fmt;

use serde_json::{Map, Number, Value};

use super::TreeError;

/// 2^63, the first float past `i64::MAX`.
const I64_END: f64 = 9_223_372_036_854_775_808.0;
/// 2^64, the first float past `u64::MAX`.
const U64_END: f64 = 18_446_744_073_709_551_616.0;

/// Why a value was rejected.
///
/// `message_id` is a stable identifier (`below_min`, `invalid_type`, ...)
/// suitable for matching in code; `message` is for people.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueNotValid {
    pub message: String,
    pub message_id: String,
}

impl ValueNotValid {
    pub fn new(message: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            message_id: message_id.into(),
        }
    }

    fn invalid_type(expected: &str, value: &Value) -> Self {
        Self::new(
            format!("expected {}, got {}", expected, json_type_name(value)),
            "invalid_type",
        )
    }
}

impl fmt::Display for ValueNotValid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.message_id)
    }
}

/// One selectable item of a [`SettingKind::Choice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceItem {
    pub name: String,
    pub display_name: String,
}

impl ChoiceItem {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
        }
    }
}

/// The type of a setting, with its type-specific attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingKind {
    Bool,
    Int { min: Option<i64>, max: Option<i64> },
    Double { min: Option<f64>, max: Option<f64> },
    String,
    Choice { items: Vec<ChoiceItem> },
    List { nullable: bool },
    Dict { nullable: bool },
    Generic,
}

impl SettingKind {
    pub fn int() -> Self {
        SettingKind::Int {
            min: None,
            max: None,
        }
    }

    pub fn double() -> Self {
        SettingKind::Double {
            min: None,
            max: None,
        }
    }

    pub fn list() -> Self {
        SettingKind::List { nullable: false }
    }

    pub fn dict() -> Self {
        SettingKind::Dict { nullable: false }
    }

    /// Choice over `(name, display_name)` pairs.
    pub fn choice<I, N, D>(items: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<String>,
    {
        SettingKind::Choice {
            items: items
                .into_iter()
                .map(|(name, display_name)| ChoiceItem::new(name, display_name))
                .collect(),
        }
    }

    /// Canonical type name written to documents.
    pub fn type_name(&self) -> &'static str {
        match self {
            SettingKind::Bool => "bool",
            SettingKind::Int { .. } => "int",
            SettingKind::Double { .. } => "double",
            SettingKind::String => "string",
            SettingKind::Choice { .. } => "choice",
            SettingKind::List { .. } => "list",
            SettingKind::Dict { .. } => "dict",
            SettingKind::Generic => "generic",
        }
    }

    /// Resolve a type name or alias, reading type attributes from `attributes`.
    ///
    /// `attributes` is typically a whole document node; unrelated keys are
    /// ignored.
    pub fn from_type_name(type_name: &str, attributes: &Map<String, Value>) -> Result<Self, TreeError> {
        let kind = match type_name {
            "bool" | "boolean" | "true_false" | "yes_no" => SettingKind::Bool,
            "int" | "integer" => SettingKind::Int {
                min: int_attribute(type_name, attributes, "min_value")?,
                max: int_attribute(type_name, attributes, "max_value")?,
            },
            "double" | "float" => SettingKind::Double {
                min: float_attribute(type_name, attributes, "min_value")?,
                max: float_attribute(type_name, attributes, "max_value")?,
            },
            "string" | "str" => SettingKind::String,
            "choice" => SettingKind::Choice {
                items: choice_items(type_name, attributes)?,
            },
            "list" => SettingKind::List {
                nullable: bool_attribute(type_name, attributes, "nullable")?,
            },
            "dict" | "dictionary" | "map" => SettingKind::Dict {
                nullable: bool_attribute(type_name, attributes, "nullable")?,
            },
            "generic" => SettingKind::Generic,
            other => return Err(TreeError::UnknownType(other.to_string())),
        };
        Ok(kind)
    }

    /// Type-specific attributes to store alongside the value.
    pub fn attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        match self {
            SettingKind::Int { min, max } => {
                if let Some(min) = min {
                    attributes.insert("min_value".into(), Value::from(*min));
                }
                if let Some(max) = max {
                    attributes.insert("max_value".into(), Value::from(*max));
                }
            }
            SettingKind::Double { min, max } => {
                if let Some(min) = min {
                    attributes.insert("min_value".into(), Value::from(*min));
                }
                if let Some(max) = max {
                    attributes.insert("max_value".into(), Value::from(*max));
                }
            }
            SettingKind::Choice { items } => {
                let items = items
                    .iter()
                    .map(|item| Value::from(vec![item.name.clone(), item.display_name.clone()]))
                    .collect();
                attributes.insert("items".into(), Value::Array(items));
            }
            SettingKind::List { nullable } | SettingKind::Dict { nullable } => {
                if *nullable {
                    attributes.insert("nullable".into(), Value::Bool(true));
                }
            }
            SettingKind::Bool | SettingKind::String | SettingKind::Generic => {}
        }
        attributes
    }

    /// Default value used when a setting is built without one.
    pub fn implicit_default(&self) -> Value {
        match self {
            SettingKind::Bool => Value::Bool(false),
            SettingKind::Int { .. } => Value::from(0),
            SettingKind::Double { .. } => Value::from(0.0),
            SettingKind::String => Value::from(""),
            SettingKind::Choice { items } => items
                .first()
                .map(|item| Value::from(item.name.clone()))
                .unwrap_or_else(|| Value::from("")),
            SettingKind::List { .. } => Value::Array(Vec::new()),
            SettingKind::Dict { .. } => Value::Object(Map::new()),
            SettingKind::Generic => Value::Null,
        }
    }

    /// Convert a raw value to the kind's representation where that is lossless.
    ///
    /// Integers a float holds exactly become floats for `double`, integral
    /// floats inside the `i64` range become integers for `int`, and integers
    /// become booleans for `bool`. Anything else is
    /// returned unchanged and left for [`validate`](Self::validate) to judge.
    pub fn coerce(&self, raw: Value) -> Value {
        match (self, &raw) {
            (SettingKind::Double { .. }, Value::Number(n)) if !n.is_f64() => exact_f64(n)
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(raw),
            (SettingKind::Int { .. }, Value::Number(n)) if n.is_f64() => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= -I64_END && f < I64_END => {
                    Value::from(f as i64)
                }
                _ => raw,
            },
            (SettingKind::Bool, Value::Number(n)) => match n.as_i64() {
                Some(i) => Value::Bool(i != 0),
                None => raw,
            },
            _ => raw,
        }
    }

    /// Check `value` against the kind. No coercion is applied.
    pub fn validate(&self, value: &Value) -> Result<(), ValueNotValid> {
        match self {
            SettingKind::Bool => match value {
                Value::Bool(_) => Ok(()),
                other => Err(ValueNotValid::invalid_type("a boolean", other)),
            },
            SettingKind::Int { min, max } => {
                let number = value
                    .as_i64()
                    .ok_or_else(|| ValueNotValid::invalid_type("an integer", value))?;
                check_bounds(number, *min, *max)
            }
            SettingKind::Double { min, max } => {
                let Value::Number(n) = value else {
                    return Err(ValueNotValid::invalid_type("a number", value));
                };
                let number = exact_f64(n).ok_or_else(|| {
                    ValueNotValid::new(
                        format!("{} has no exact floating-point representation", n),
                        "invalid_value",
                    )
                })?;
                check_bounds(number, *min, *max)
            }
            SettingKind::String => match value {
                Value::String(_) => Ok(()),
                other => Err(ValueNotValid::invalid_type("a string", other)),
            },
            SettingKind::Choice { items } => {
                let name = value
                    .as_str()
                    .ok_or_else(|| ValueNotValid::invalid_type("a choice name", value))?;
                if items.is_empty() || items.iter().any(|item| item.name == name) {
                    Ok(())
                } else {
                    let names: Vec<&str> = items.iter().map(|item| item.name.as_str()).collect();
                    Err(ValueNotValid::new(
                        format!("'{}' is not one of: {}", name, names.join(", ")),
                        "invalid_value",
                    ))
                }
            }
            SettingKind::List { nullable } => match value {
                Value::Array(_) => Ok(()),
                Value::Null if *nullable => Ok(()),
                Value::Null => Err(ValueNotValid::new("value cannot be null", "value_is_none")),
                other => Err(ValueNotValid::invalid_type("a list", other)),
            },
            SettingKind::Dict { nullable } => match value {
                Value::Object(_) => Ok(()),
                Value::Null if *nullable => Ok(()),
                Value::Null => Err(ValueNotValid::new("value cannot be null", "value_is_none")),
                other => Err(ValueNotValid::invalid_type("a dictionary", other)),
            },
            SettingKind::Generic => Ok(()),
        }
    }
}

/// The number as a float, or `None` for integers a float cannot hold exactly.
fn exact_f64(n: &Number) -> Option<f64> {
    if n.is_f64() {
        return n.as_f64();
    }
    if let Some(i) = n.as_i64() {
        let f = i as f64;
        return (f < I64_END && f as i64 == i).then_some(f);
    }
    let u = n.as_u64()?;
    let f = u as f64;
    (f < U64_END && f as u64 == u).then_some(f)
}

fn check_bounds<T>(number: T, min: Option<T>, max: Option<T>) -> Result<(), ValueNotValid>
where
    T: PartialOrd + fmt::Display + Copy,
{
    if let Some(min) = min {
        if number < min {
            return Err(ValueNotValid::new(
                format!("value {} is below the minimum {}", number, min),
                "below_min",
            ));
        }
    }
    if let Some(max) = max {
        if number > max {
            return Err(ValueNotValid::new(
                format!("value {} is above the maximum {}", number, max),
                "above_max",
            ));
        }
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_f64() => "a float",
        Value::Number(_) => "an integer",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a dictionary",
    }
}

fn attribute_error(type_name: &str, attribute: &str, message: &str) -> TreeError {
    TreeError::InvalidAttribute {
        type_name: type_name.to_string(),
        attribute: attribute.to_string(),
        message: message.to_string(),
    }
}

fn int_attribute(
    type_name: &str,
    attributes: &Map<String, Value>,
    key: &str,
) -> Result<Option<i64>, TreeError> {
    match attributes.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| attribute_error(type_name, key, "expected an integer")),
    }
}

fn float_attribute(
    type_name: &str,
    attributes: &Map<String, Value>,
    key: &str,
) -> Result<Option<f64>, TreeError> {
    match attributes.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| attribute_error(type_name, key, "expected a number")),
    }
}

fn bool_attribute(
    type_name: &str,
    attributes: &Map<String, Value>,
    key: &str,
) -> Result<bool, TreeError> {
    match attributes.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(_) => Err(attribute_error(type_name, key, "expected a boolean")),
    }
}

/// Items are stored as `[name, display_name]` pairs; a bare string is
/// accepted as both.
fn choice_items(type_name: &str, attributes: &Map<String, Value>) -> Result<Vec<ChoiceItem>, TreeError> {
    let items = match attributes.get("items") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(attribute_error(type_name, "items", "expected a list")),
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(name) => Ok(ChoiceItem::new(name.clone(), name.clone())),
            Value::Array(pair) => match pair.as_slice() {
                [Value::String(name), Value::String(display_name)] => {
                    Ok(ChoiceItem::new(name.clone(), display_name.clone()))
                }
                _ => Err(attribute_error(
                    type_name,
                    "items",
                    "expected [name, display_name] pairs",
                )),
            },
            _ => Err(attribute_error(
                type_name,
                "items",
                "expected [name, display_name] pairs",
            )),
        })
        .collect()
}
