//! Canonical submission shape
//!
//! This is exactly what gets written to disk and echoed back to the caller.
//! Field order of the structs is the serialized field order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The six content flags every stored submission carries
pub const FLAG_NAMES: [&str; 6] = [
    "nsfw",
    "religious",
    "political",
    "racist",
    "sexist",
    "explicit",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub nsfw: bool,
    pub religious: bool,
    pub political: bool,
    pub racist: bool,
    pub sexist: bool,
    pub explicit: bool,
}

impl Flags {
    /// Copy each known flag individually; anything else in `value` is dropped
    ///
    /// Missing or non-boolean members read as `false`.
    pub fn from_value(value: Option<&Value>) -> Self {
        let empty = Map::new();
        let flags = value.and_then(Value::as_object).unwrap_or(&empty);
        let flag = |name: &str| flags.get(name).and_then(Value::as_bool).unwrap_or(false);

        Self {
            nsfw: flag("nsfw"),
            religious: flag("religious"),
            political: flag("political"),
            racist: flag("racist"),
            sexist: flag("sexist"),
            explicit: flag("explicit"),
        }
    }
}

/// Joke body, tagged by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JokeContent {
    #[serde(rename = "single")]
    Single { joke: String },
    #[serde(rename = "twopart")]
    TwoPart { setup: String, delivery: String },
}

impl JokeContent {
    pub fn type_name(&self) -> &'static str {
        match self {
            JokeContent::Single { .. } => "single",
            JokeContent::TwoPart { .. } => "twopart",
        }
    }
}

/// A submission reduced to its whitelisted fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<u32>,
    pub category: String,
    #[serde(flatten)]
    pub content: JokeContent,
    pub flags: Flags,
    pub lang: String,
    /// Pre-assigned identity, passed through as submitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub safe: bool,
}
