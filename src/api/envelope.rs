//! List-envelope adapter for the platform's inconsistent collection
//! responses.
//!
//! Different deployments wrap list responses differently: a bare array,
//! a DRF-style `results` page, or ad hoc `data`/`posts`/`items` keys.
//! All shape sniffing lives in [`extract_rows`] so nothing else in the
//! client has to care.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Wrapper keys probed in priority order.
const LIST_KEYS: [&str; 4] = ["results", "data", "posts", "items"];

/// Pull the row list out of a collection response.
///
/// Resolution order: the value itself when it is an array; then the
/// known wrapper keys; then the first array-valued field; then a single
/// object carrying an `id` becomes a one-element list. Anything else
/// yields an empty list.
pub fn extract_rows(value: &Value) -> Vec<Value> {
    if let Value::Array(rows) = value {
        return rows.clone();
    }

    let Value::Object(map) = value else {
        return Vec::new();
    };

    for key in LIST_KEYS {
        if let Some(Value::Array(rows)) = map.get(key) {
            return rows.clone();
        }
    }

    if let Some(Value::Array(rows)) = map.values().find(|v| v.is_array()) {
        return rows.clone();
    }

    if map.contains_key("id") {
        return vec![value.clone()];
    }

    Vec::new()
}

/// Extract rows and deserialize each into `T`.
///
/// Malformed rows are skipped with a warning instead of failing the
/// whole list; the feed should survive one bad record.
pub fn parse_rows<T: DeserializeOwned>(value: &Value) -> Vec<T> {
    extract_rows(value)
        .into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(item) => Some(item),
            Err(e) => {
                log::warn!("Skipping malformed row: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array_passes_through() {
        let rows = extract_rows(&json!([{ "id": 1 }, { "id": 2 }]));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], 1);
    }

    #[test]
    fn test_results_envelope() {
        let rows = extract_rows(&json!({ "count": 2, "results": [{ "id": 1 }, { "id": 2 }] }));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_data_envelope() {
        let rows = extract_rows(&json!({ "data": [{ "id": 7 }] }));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 7);
    }

    #[test]
    fn test_posts_and_items_envelopes() {
        assert_eq!(extract_rows(&json!({ "posts": [{ "id": 1 }] })).len(), 1);
        assert_eq!(extract_rows(&json!({ "items": [{ "id": 1 }] })).len(), 1);
    }

    #[test]
    fn test_known_keys_beat_other_arrays() {
        let rows = extract_rows(&json!({
            "extra": [{ "id": 99 }],
            "results": [{ "id": 1 }],
        }));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 1);
    }

    #[test]
    fn test_first_array_valued_field_fallback() {
        let rows = extract_rows(&json!({ "count": 1, "records": [{ "id": 5 }] }));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 5);
    }

    #[test]
    fn test_single_object_with_id_becomes_one_row() {
        let rows = extract_rows(&json!({ "id": 3, "title": "solo" }));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "solo");
    }

    #[test]
    fn test_unrecognized_shapes_yield_empty() {
        assert!(extract_rows(&json!({ "count": 0 })).is_empty());
        assert!(extract_rows(&json!("nope")).is_empty());
        assert!(extract_rows(&json!(null)).is_empty());
    }

    #[test]
    fn test_parse_rows_skips_malformed() {
        #[derive(serde::Deserialize)]
        struct Row {
            id: u64,
        }
        let rows: Vec<Row> = parse_rows(&json!([{ "id": 1 }, { "id": "not-a-number" }, { "id": 3 }]));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[1].id, 3);
    }
}
