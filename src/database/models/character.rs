use sqlx::FromRow;

use crate::types::{House, Strength};

/// Row of the `characters` table, with relations still as foreign keys
#[derive(Debug, Clone, FromRow)]
pub struct CharacterRow {
    pub id: i32,
    pub name: String,
    pub house_id: Option<i32>,
    pub animal: Option<String>,
    pub symbol: Option<String>,
    pub nickname: Option<String>,
    pub role: String,
    pub age: Option<i32>,
    pub death: Option<i32>,
    pub strength_id: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct HouseRow {
    pub id: i32,
    pub name: String,
}

impl From<HouseRow> for House {
    fn from(row: HouseRow) -> Self {
        House { id: row.id, name: row.name }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StrengthRow {
    pub id: i32,
    pub description: String,
}

impl From<StrengthRow> for Strength {
    fn from(row: StrengthRow) -> Self {
        Strength { id: row.id, description: row.description }
    }
}
