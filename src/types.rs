//! Shared entity types used by both stores and the HTTP layer

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A house a character may belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    pub id: i32,
    pub name: String,
}

/// A strength a character is known for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strength {
    pub id: i32,
    pub description: String,
}

/// A catalog character in its response (and flat-file) shape.
///
/// `house` and `strength` always serialize as objects: the nested
/// `{id, name}` / `{id, description}` pair, or `{}` when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Character {
    pub id: i32,
    pub name: String,
    #[serde(serialize_with = "nested_or_empty")]
    pub house: Option<House>,
    pub animal: Option<String>,
    pub symbol: Option<String>,
    pub nickname: Option<String>,
    pub role: String,
    pub age: Option<i32>,
    pub death: Option<i32>,
    #[serde(serialize_with = "nested_or_empty")]
    pub strength: Option<Strength>,
}

impl Character {
    pub fn house_id(&self) -> Option<i32> {
        self.house.as_ref().map(|h| h.id)
    }

    pub fn strength_id(&self) -> Option<i32> {
        self.strength.as_ref().map(|s| s.id)
    }
}

fn nested_or_empty<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    match value {
        Some(inner) => inner.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}
