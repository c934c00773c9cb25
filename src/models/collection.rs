use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A collection as listed by `GET /collections`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub num_fish: i64,
    pub avg_weight: Option<f64>,
}

/// Reply of `POST /collections`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCollection {
    pub collection_id: i64,
}
