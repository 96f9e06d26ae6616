//! Typed attributes for custom elements.
//!
//! Hosts carry string attributes. A definition declares which of them it
//! reads, with a type and a default; [`Props::resolve`] turns the host's
//! strings into typed values. Undeclared attributes are ignored, and values
//! that do not parse fall back to the default.

use indexmap::IndexMap;
use serde::Serialize;

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// An integer.
    Int(i64),
    /// Free text.
    Text(String),
    /// A boolean flag.
    Flag(bool),
}

/// Declaration of one attribute: its name and its typed default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    name: String,
    default: AttrValue,
}

impl AttributeSpec {
    /// An integer attribute.
    pub fn int(name: impl Into<String>, default: i64) -> Self {
        Self {
            name: name.into(),
            default: AttrValue::Int(default),
        }
    }

    /// A text attribute.
    pub fn text(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: AttrValue::Text(default.into()),
        }
    }

    /// A boolean attribute. Present means `true` unless its value is `"false"`.
    pub fn flag(name: impl Into<String>, default: bool) -> Self {
        Self {
            name: name.into(),
            default: AttrValue::Flag(default),
        }
    }

    /// The attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The default value.
    pub fn default_value(&self) -> &AttrValue {
        &self.default
    }

    /// Convert a raw host value into this attribute's type.
    pub fn parse(&self, raw: Option<&str>) -> AttrValue {
        let Some(raw) = raw else {
            return self.default.clone();
        };

        match &self.default {
            AttrValue::Int(_) => match raw.trim().parse::<i64>() {
                Ok(value) => AttrValue::Int(value),
                Err(_) => {
                    tracing::warn!(attribute = %self.name, value = raw, "not an integer, using default");
                    self.default.clone()
                }
            },
            AttrValue::Text(_) => AttrValue::Text(raw.to_owned()),
            AttrValue::Flag(_) => AttrValue::Flag(!raw.trim().eq_ignore_ascii_case("false")),
        }
    }
}

/// Resolved, typed attribute values of one element instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Props {
    values: IndexMap<String, AttrValue>,
}

impl Props {
    /// Resolve every declared attribute against the host's raw attributes.
    pub fn resolve(specs: &[AttributeSpec], raw: &IndexMap<String, String>) -> Self {
        let values = specs
            .iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    spec.parse(raw.get(&spec.name).map(String::as_str)),
                )
            })
            .collect();
        Self { values }
    }

    /// Look up a value by attribute name.
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    /// An integer attribute.
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(AttrValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    /// A text attribute.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(AttrValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    /// A flag attribute.
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(AttrValue::Flag(value)) => Some(*value),
            _ => None,
        }
    }

    /// Number of resolved attributes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no attribute was declared.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
