//! Output formats for API responses
//!
//! Callers pick the format per request with the `format` query parameter.
//! Unknown or missing values fall back to JSON.

use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Response serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Xml,
    Yaml,
}

impl OutputFormat {
    /// Parse a format parameter, case-insensitive
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(|p| p.trim().to_ascii_lowercase()).as_deref() {
            Some("xml") => OutputFormat::Xml,
            Some("yaml") | Some("yml") => OutputFormat::Yaml,
            _ => OutputFormat::Json,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Xml => "application/xml",
            OutputFormat::Yaml => "application/x-yaml",
        }
    }

    /// Encode any serializable value in this format
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => to_json_pretty(value),
            OutputFormat::Yaml => {
                serde_yaml::to_string(value).map_err(|e| Error::Encode(e.to_string()))
            }
            OutputFormat::Xml => {
                let tree = serde_json::to_value(value).map_err(|e| Error::Encode(e.to_string()))?;
                Ok(to_xml(&tree))
            }
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
            OutputFormat::Yaml => "yaml",
        };
        f.write_str(name)
    }
}

/// JSON with 4-space indentation, fields in declaration order
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| Error::Encode(e.to_string()))?;
    String::from_utf8(out).map_err(|e| Error::Encode(e.to_string()))
}

/// Render a JSON tree as XML under a `<data>` root
///
/// Objects become nested elements, arrays become repeated `<item>` elements.
fn to_xml(value: &Value) -> String {
    let mut out = String::from("<?xml version='1.0'?>\n");
    write_element(&mut out, "data", value, 0);
    out
}

fn write_element(out: &mut String, name: &str, value: &Value, depth: usize) {
    let indent = "    ".repeat(depth);
    match value {
        Value::Object(map) => {
            out.push_str(&format!("{indent}<{name}>\n"));
            for (key, child) in map {
                write_element(out, &element_name(key), child, depth + 1);
            }
            out.push_str(&format!("{indent}</{name}>\n"));
        }
        Value::Array(items) => {
            out.push_str(&format!("{indent}<{name}>\n"));
            for item in items {
                write_element(out, "item", item, depth + 1);
            }
            out.push_str(&format!("{indent}</{name}>\n"));
        }
        Value::Null => out.push_str(&format!("{indent}<{name}/>\n")),
        Value::String(s) => {
            out.push_str(&format!("{indent}<{name}>{}</{name}>\n", escape_xml(s)))
        }
        other => out.push_str(&format!("{indent}<{name}>{other}</{name}>\n")),
    }
}

/// Keys are JSON strings; XML names are not. Replace anything unsafe.
fn element_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() || !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
