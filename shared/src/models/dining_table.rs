//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Occupancy state of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TableStatus {
    Available,
    /// Held by a non-terminal booking (or closed by an admin)
    Unavailable,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Unavailable => "UNAVAILABLE",
        }
    }
}

/// Dining table entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    /// Human-readable number printed on the table, unique
    pub table_number: String,
    pub capacity: i32,
    pub floor: i32,
    pub status: TableStatus,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub table_number: String,
    pub capacity: i32,
    pub floor: Option<i32>,
}

/// Update dining table payload (absent fields stay unchanged)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    pub table_number: Option<String>,
    pub capacity: Option<i32>,
    pub floor: Option<i32>,
}

/// Administrative status override
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStatusUpdate {
    pub status: TableStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_upper_case_names() {
        let json = serde_json::to_string(&TableStatus::Unavailable).unwrap();
        assert_eq!(json, "\"UNAVAILABLE\"");
        assert_eq!(TableStatus::Available.as_str(), "AVAILABLE");
    }

    #[test]
    fn create_payload_floor_is_optional() {
        let payload: DiningTableCreate =
            serde_json::from_str(r#"{"table_number":"A1","capacity":4}"#).unwrap();
        assert_eq!(payload.table_number, "A1");
        assert!(payload.floor.is_none());
    }
}
