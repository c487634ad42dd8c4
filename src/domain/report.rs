//! Persisted run report and the JSON pruning applied before it is written

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::product::{PriceFilter, ProductRecord};

/// The single artifact of a run. Field order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    #[serde(rename = "date", with = "report_date")]
    pub generated_at: NaiveDateTime,
    pub product_count: usize,
    pub best_item: Option<ProductRecord>,
    pub currency: String,
    pub filters: PriceFilter,
    pub base_link: String,
    pub products: Vec<ProductRecord>,
}

impl Report {
    /// Serialize to a JSON tree with empty values already pruned
    pub fn to_pruned_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self).map(prune_empty)
    }
}

/// `DD/MM/YYYY HH:MM:SS`, local wall-clock time
pub mod report_date {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%d/%m/%Y %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Recursively drop nulls, empty arrays and empty objects from mappings and
/// sequences. Children are pruned first, so a container that only held empty
/// values disappears too. Idempotent.
pub fn prune_empty(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(prune_empty)
                .filter(|v| !is_empty(v))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, prune_empty(v)))
                .filter(|(_, v)| !is_empty(v))
                .collect(),
        ),
        other => other,
    }
}
