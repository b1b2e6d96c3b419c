// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property definitions, values and snapshots

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strip the display ordinal from a property or variant name
///
/// Names like `"2Final time"` or `"03 - Name"` carry a leading ordinal that
/// only orders entries in an editor; matching always uses the stripped key.
pub fn strip_ordinal(name: &str) -> String {
    let rest = name.trim_start().trim_start_matches(|c: char| c.is_ascii_digit());
    // Only strip separators when an ordinal was actually present
    let rest = if rest.len() != name.trim_start().len() {
        rest.trim_start_matches([' ', '-', '.', ')', '_'])
    } else {
        rest
    };
    rest.trim().to_string()
}

/// Compare two keys the way all tree and snapshot lookups do
pub fn key_matches(key: &str, query: &str) -> bool {
    key.eq_ignore_ascii_case(&strip_ordinal(query))
}

/// A single property value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Integer or label-coded value
    Int(i64),
    /// Real value
    Float(f64),
    /// Free text (names, file names, function names)
    Text(String),
    /// Vector of reals (axes, per-DOF factors)
    Vector(Vec<f64>),
}

impl PropertyValue {
    /// Try to get as float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as vector
    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            PropertyValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Check if the value carries no content
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::Text(s) => s.trim().is_empty(),
            PropertyValue::Vector(v) => v.is_empty(),
            _ => false,
        }
    }

    /// Name of the value kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyValue::Int(_) => "integer",
            PropertyValue::Float(_) => "real",
            PropertyValue::Text(_) => "text",
            PropertyValue::Vector(_) => "vector",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Vector(v) => {
                for (i, x) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", x)?;
                }
                Ok(())
            }
        }
    }
}

/// Definition of one editable property on a tree node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    /// Display name, possibly with a leading ordinal
    pub name: String,
    /// Matching key (name without ordinal)
    pub key: String,
    /// Current value
    pub value: PropertyValue,
    /// Label to integer code map for choice properties
    pub labels: Vec<(String, i64)>,
    /// Whether the property is shown (hidden properties are never required)
    pub visible: bool,
    /// Whether an empty value is rejected
    pub required: bool,
    /// Inclusive numeric bounds
    pub bounds: Option<(f64, f64)>,
}

impl PropertyDef {
    /// Create a new property definition
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        let name = name.into();
        Self {
            key: strip_ordinal(&name),
            name,
            value,
            labels: Vec::new(),
            visible: true,
            required: false,
            bounds: None,
        }
    }

    /// Integer property
    pub fn int(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, PropertyValue::Int(value))
    }

    /// Real property
    pub fn float(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, PropertyValue::Float(value))
    }

    /// Text property
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, PropertyValue::Text(value.into()))
    }

    /// Vector property
    pub fn vector(name: impl Into<String>, value: Vec<f64>) -> Self {
        Self::new(name, PropertyValue::Vector(value))
    }

    /// Attach a label map (the value must be an integer code)
    pub fn with_labels(mut self, labels: &[(&str, i64)]) -> Self {
        self.labels = labels
            .iter()
            .map(|(label, code)| (label.to_string(), *code))
            .collect();
        self
    }

    /// Attach inclusive numeric bounds
    pub fn with_bounds(mut self, lo: f64, hi: f64) -> Self {
        self.bounds = Some((lo, hi));
        self
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark as hidden
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Label of the current value, if this is a choice property
    pub fn label(&self) -> Option<&str> {
        self.label_of(&self.value)
    }

    /// Label of an arbitrary value of this property
    pub fn label_of(&self, value: &PropertyValue) -> Option<&str> {
        let code = value.as_int()?;
        self.labels
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(label, _)| label.as_str())
    }

    /// Convert raw text to a value of this property's kind
    ///
    /// Labels are converted to their integer code; numbers are checked
    /// against the bounds. The definition itself is left untouched.
    pub fn parse_value(&self, raw: &str) -> Result<PropertyValue> {
        let raw = raw.trim();
        let value = match &self.value {
            PropertyValue::Int(_) => {
                if let Some((_, code)) = self
                    .labels
                    .iter()
                    .find(|(label, _)| label.eq_ignore_ascii_case(raw))
                {
                    PropertyValue::Int(*code)
                } else {
                    let code = lexical_core::parse::<i64>(raw.as_bytes()).map_err(|_| {
                        Error::format(format!(
                            "'{}' is not a valid value for '{}'",
                            raw, self.key
                        ))
                    })?;
                    if !self.labels.is_empty() && !self.labels.iter().any(|(_, c)| *c == code) {
                        return Err(Error::format(format!(
                            "{} is not a valid choice for '{}'",
                            code, self.key
                        )));
                    }
                    PropertyValue::Int(code)
                }
            }
            PropertyValue::Float(_) => {
                let value = lexical_core::parse::<f64>(raw.as_bytes()).map_err(|_| {
                    Error::format(format!("'{}' is not a number for '{}'", raw, self.key))
                })?;
                PropertyValue::Float(value)
            }
            PropertyValue::Text(_) => PropertyValue::Text(raw.to_string()),
            PropertyValue::Vector(_) => {
                let parts = raw
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|part| !part.is_empty())
                    .map(|part| lexical_core::parse::<f64>(part.as_bytes()))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|_| {
                        Error::format(format!("'{}' is not a vector for '{}'", raw, self.key))
                    })?;
                PropertyValue::Vector(parts)
            }
        };
        self.check_bounds(&value)?;
        Ok(value)
    }

    /// Check a value against this property's bounds
    pub fn check_bounds(&self, value: &PropertyValue) -> Result<()> {
        if let (Some((lo, hi)), Some(x)) = (self.bounds, value.as_f64()) {
            if x < lo || x > hi {
                return Err(Error::format(format!(
                    "{} is outside [{}, {}] for '{}'",
                    x, lo, hi, self.key
                )));
            }
        }
        Ok(())
    }

    /// Parse and store a new value
    pub fn set_from_str(&mut self, raw: &str) -> Result<()> {
        self.value = self.parse_value(raw)?;
        Ok(())
    }

    /// Render the value the way persisted files carry it
    pub fn display_value(&self, value: &PropertyValue) -> String {
        match self.label_of(value) {
            Some(label) => label.to_string(),
            None => value.to_string(),
        }
    }
}

/// Captured values of one tree leaf, attached to an entity, group or catalog entry
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertySnapshot {
    /// Selected sub-type of the category (e.g. "Trapezoidal")
    pub subtype: Option<String>,
    /// Selected sub-category below the sub-type
    pub subcategory: Option<String>,
    /// Property values keyed by ordinal-free key, in template order
    pub values: Vec<(String, PropertyValue)>,
}

impl PropertySnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sub-type
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    /// Builder form of [`PropertySnapshot::set`]
    pub fn with(mut self, key: &str, value: PropertyValue) -> Self {
        self.set(key, value);
        self
    }

    /// Builder shorthand for a text value
    pub fn with_text(self, key: &str, value: impl Into<String>) -> Self {
        self.with(key, PropertyValue::Text(value.into()))
    }

    /// Builder shorthand for a real value
    pub fn with_float(self, key: &str, value: f64) -> Self {
        self.with(key, PropertyValue::Float(value))
    }

    /// Replace or append a value
    pub fn set(&mut self, key: &str, value: PropertyValue) {
        let key = strip_ordinal(key);
        match self.values.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(slot) => slot.1 = value,
            None => self.values.push((key, value)),
        }
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values
            .iter()
            .find(|(k, _)| key_matches(k, key))
            .map(|(_, v)| v)
    }

    /// Get a text value by key
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_text())
    }

    /// Get a numeric value by key
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    /// Get a vector value by key
    pub fn vector(&self, key: &str) -> Option<&[f64]> {
        self.get(key).and_then(|v| v.as_vector())
    }

    /// Catalog name field, for snapshots that reference a catalog entry
    pub fn name(&self) -> Option<&str> {
        self.text("Name").filter(|s| !s.trim().is_empty())
    }

    /// Compact one-line description used in error messages and joins
    pub fn summary(&self) -> String {
        if let Some(name) = self.name() {
            return name.to_string();
        }
        let fields = self
            .values
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        match &self.subtype {
            Some(subtype) => format!("{}({})", subtype, fields),
            None => fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ordinal() {
        assert_eq!(strip_ordinal("2Final time"), "Final time");
        assert_eq!(strip_ordinal("03 - Name"), "Name");
        assert_eq!(strip_ordinal("Name"), "Name");
        assert_eq!(strip_ordinal("-Name"), "-Name");
    }

    #[test]
    fn test_parse_label_to_code() {
        let def = PropertyDef::int("1Strategy", 0)
            .with_labels(&[("Pure NR", 0), ("Modified NR", 1)]);
        assert_eq!(def.key, "Strategy");
        assert_eq!(def.parse_value("modified nr").unwrap(), PropertyValue::Int(1));
        assert_eq!(def.parse_value("0").unwrap(), PropertyValue::Int(0));
        assert!(def.parse_value("7").is_err());
        assert!(def.parse_value("Newton").is_err());
    }

    #[test]
    fn test_parse_bounds() {
        let mut def = PropertyDef::float("Poisson ratio", 0.3).with_bounds(0.0, 0.5);
        assert!(def.set_from_str("0.6").is_err());
        // Rejected values leave the definition untouched
        assert_eq!(def.value, PropertyValue::Float(0.3));
        def.set_from_str("0.2").unwrap();
        assert_eq!(def.value, PropertyValue::Float(0.2));
    }

    #[test]
    fn test_parse_numbers() {
        let def = PropertyDef::float("Compressive strength", 0.0);
        assert_eq!(def.parse_value(" 25e6 ").unwrap(), PropertyValue::Float(25e6));
        assert_eq!(def.parse_value("-1.5").unwrap(), PropertyValue::Float(-1.5));
        assert!(def.parse_value("1.5MPa").is_err());
        assert!(def.parse_value("").is_err());

        let def = PropertyDef::int("NPTTOT", 100);
        assert_eq!(def.parse_value("250").unwrap(), PropertyValue::Int(250));
        assert!(def.parse_value("2.5").is_err());
    }

    #[test]
    fn test_parse_vector() {
        let def = PropertyDef::vector("Vector", vec![0.0, 0.0, 1.0]);
        assert_eq!(
            def.parse_value("1, 0 0").unwrap(),
            PropertyValue::Vector(vec![1.0, 0.0, 0.0])
        );
        assert!(def.parse_value("1 x 0").is_err());
    }

    #[test]
    fn test_snapshot_lookup_ignores_ordinal() {
        let snap = PropertySnapshot::new()
            .with_text("0Name", "steel")
            .with_float("Thickness", 0.2);
        assert_eq!(snap.name(), Some("steel"));
        assert_eq!(snap.number("1 Thickness"), Some(0.2));
        assert_eq!(snap.summary(), "steel");
    }

    #[test]
    fn test_display_value_uses_label() {
        let def = PropertyDef::int("X", 0).with_labels(&[("NO", 0), ("YES", 1)]);
        assert_eq!(def.display_value(&PropertyValue::Int(1)), "YES");
        assert_eq!(PropertyValue::Vector(vec![1.0, 0.5]).to_string(), "1 0.5");
    }
}
