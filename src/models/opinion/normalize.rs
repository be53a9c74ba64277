use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use super::types::{Opinion, OpinionId, Stance};

/// Turn a loosely shaped stored record into an `Opinion`.
///
/// Accepts string or numeric ids, and RFC 3339 or epoch-millisecond timestamps.
/// Text fields must be strings; the stance must be one of the three tags.
/// Returns a reason string for anything else so the caller can log it.
pub fn opinion_from_value(value: &Value) -> Result<Opinion, String> {
    let obj = value.as_object().ok_or("record is not an object")?;

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => OpinionId(s.clone()),
        Some(Value::Number(n)) => OpinionId(n.to_string()),
        _ => return Err("missing id".to_string()),
    };

    let text = |key: &str| -> Result<String, String> {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| format!("missing {key}"))
    };

    let stance: Stance = text("stance")?.parse().map_err(|e| format!("{e}"))?;

    let timestamp = match obj.get("timestamp") {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| format!("bad timestamp: {e}"))?,
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or("bad timestamp")?,
        _ => return Err("missing timestamp".to_string()),
    };

    Ok(Opinion {
        id,
        name: text("name")?,
        partner: text("partner")?,
        stance,
        opinion: text("opinion")?,
        timestamp,
    })
}

/// Normalize a whole stored list, dropping records that don't fit the shape.
pub fn normalize_list(values: &[Value]) -> Vec<Opinion> {
    values
        .iter()
        .enumerate()
        .filter_map(|(idx, v)| match opinion_from_value(v) {
            Ok(o) => Some(o),
            Err(reason) => {
                log::warn!("Skipping stored opinion #{idx}: {reason}");
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
    fn accepts_browser_storage_shape() {
        let v = json!({
            "id": "1718000000000",
            "name": "Sam",
            "partner": "Lee",
            "stance": "beneficial",
            "opinion": "Helps with tutoring.",
            "timestamp": "2024-06-10T08:00:00.000Z"
        });
        let o = opinion_from_value(&v).unwrap();
        assert_eq!(o.id.as_str(), "1718000000000");
        assert_eq!(o.stance, Stance::Beneficial);
        assert_eq!(o.timestamp.timestamp(), 1_718_006_400);
    }

    #[test]
    fn accepts_numeric_id_and_millisecond_timestamp() {
        let v = json!({
            "id": 42,
            "name": "A",
            "partner": "B",
            "stance": "neutral",
            "opinion": "ok",
            "timestamp": 1_000
        });
        let o = opinion_from_value(&v).unwrap();
        assert_eq!(o.id.as_str(), "42");
        assert_eq!(o.timestamp.timestamp_millis(), 1_000);
    }

    #[test]
    fn rejects_free_text_stance() {
        let v = json!({
            "id": "x", "name": "A", "partner": "B",
            "stance": "mostly good", "opinion": "ok",
            "timestamp": "2024-06-10T08:00:00Z"
        });
        let err = opinion_from_value(&v).unwrap_err();
        assert!(err.contains("unknown stance"));
    }

    #[test]
    fn normalize_list_skips_bad_records_and_keeps_order() {
        let values = vec![
            json!({"id": "2", "name": "A", "partner": "B", "stance": "detrimental",
                   "opinion": "x", "timestamp": "2024-06-10T09:00:00Z"}),
            json!("garbage"),
            json!({"id": "1", "name": "C", "partner": "D"}),
            json!({"id": "0", "name": "E", "partner": "F", "stance": "neutral",
                   "opinion": "y", "timestamp": "2024-06-10T07:00:00Z"}),
        ];
        let list = normalize_list(&values);
        let ids: Vec<&str> = list.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "0"]);
    }
}
