//! Block model: one typed unit of logged activity within a workout day.
//!
//! A block carries a string discriminator and an open JSON payload. Only the
//! discriminator and the payload's container shape are validated; what goes
//! inside `data` depends on the kind and is read defensively by analytics.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Block discriminators recognized by analytics
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// Resistance work: `data.exercise`, `data.sets[].weight`
    Strength,
    /// Cardio / daily movement: `data.steps`
    Activity,
    /// Anything else, kept verbatim
    Other(String),
}

impl BlockKind {
    /// Parse a discriminator. Matching is exact, `"Strength"` is an `Other`.
    pub fn parse(s: &str) -> Self {
        match s {
            "strength" => BlockKind::Strength,
            "activity" => BlockKind::Activity,
            other => BlockKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BlockKind::Strength => "strength",
            BlockKind::Activity => "activity",
            BlockKind::Other(s) => s,
        }
    }
}

/// One logged item within a day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock")]
pub struct Block {
    #[serde(rename = "type")]
    kind: String,
    data: Map<String, Value>,
}

/// Wire shape before validation
#[derive(Debug, Deserialize)]
struct RawBlock {
    #[serde(rename = "type", alias = "kind")]
    kind: Option<String>,
    #[serde(default)]
    data: Value,
}

impl TryFrom<RawBlock> for Block {
    type Error = Error;

    fn try_from(raw: RawBlock) -> Result<Self> {
        let kind = raw
            .kind
            .ok_or_else(|| Error::Validation("block is missing its type".into()))?;
        Block::new(kind, raw.data)
    }
}

impl Block {
    /// Build a block, validating the discriminator and the payload shape
    ///
    /// `data` may be `null`, which is treated as an empty mapping. Any other
    /// non-object payload is rejected.
    pub fn new(kind: impl Into<String>, data: Value) -> Result<Self> {
        let kind = kind.into();
        if kind.trim().is_empty() {
            return Err(Error::Validation(
                "block type must be a non-empty string".into(),
            ));
        }

        let data = match data {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(Error::Validation(format!(
                    "block data must be an object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        Ok(Self { kind, data })
    }

    /// Raw discriminator as logged
    pub fn kind_str(&self) -> &str {
        &self.kind
    }

    pub fn kind(&self) -> BlockKind {
        BlockKind::parse(&self.kind)
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Look up one payload field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
