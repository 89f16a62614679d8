use serde_json::{Map, Value};

use crate::models::Campaign;
use super::coerce::{coerce_multiplier, DEFAULT_ROI};
use super::decode::{string_list, string_list_or, string_map, string_or, value_at_path};

const DEFAULT_TITLE: &str = "Marketing Campaign";
const DEFAULT_TARGET: &str = "Target Audience";
const DEFAULT_THEME: &str = "Campaign Theme";
const DEFAULT_KEY_MESSAGE: &str = "Engaging marketing message";
const DEFAULT_VALUE_PROPOSITIONS: [&str; 2] = ["Clear value for money", "Proven results"];
const DEFAULT_CHANNELS: [&str; 2] = ["Email", "Social Media"];
const DEFAULT_SUCCESS_METRICS: [&str; 2] = ["Engagement rate", "Conversion rate"];
const DEFAULT_CONVERSION_RATE: &str = "5.0%";
const DEFAULT_PAYBACK_PERIOD: &str = "12 months";
const DEFAULT_CONFIDENCE_INTERVAL: &str = "N/A";

/// The two-item filler used when no content strategy survives coercion.
pub const DEFAULT_CONTENT_STRATEGY: [&str; 2] = ["Brand Awareness", "Customer Engagement"];

// The content strategy arrives in four shapes: a sequence, a single string,
// a mapping with a `content_pillars` key, or a mapping of arbitrary pillar
// names. Everything else (null included) collapses to the default filler.
fn decode_content_strategy(value: Option<&Value>) -> Vec<String> {
    let filler = || {
        DEFAULT_CONTENT_STRATEGY
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
    };

    let value = match value {
        Some(v) => v,
        None => return filler(),
    };

    let decoded = match value {
        Value::Object(map) => match map.get("content_pillars") {
            Some(pillars) => string_list(pillars),
            None => {
                // Arbitrary pillar mapping: the pillar names carry the
                // displayable content.
                let keys: Vec<String> = map.keys().cloned().collect();
                if keys.is_empty() {
                    None
                } else {
                    Some(keys)
                }
            }
        },
        other => string_list(other),
    };

    decoded.unwrap_or_else(filler)
}

/// Normalize an arbitrary mapping purporting to describe one campaign into
/// the canonical shape. Same contract as the persona normalizer: every field
/// present and typed, sequences never empty, idempotent on canonical input.
pub fn normalize_campaign(raw: &Value) -> Campaign {
    let empty = Map::new();
    let map = raw.as_object().unwrap_or(&empty);

    let key_message = match map.get("key_message") {
        Some(_) => string_or(map, &["key_message"], DEFAULT_KEY_MESSAGE),
        None => value_at_path(map, &["core_messaging", "primary_message"])
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_KEY_MESSAGE)
            .to_string(),
    };

    let predicted_roi = map
        .get("predicted_roi")
        .or_else(|| value_at_path(map, &["performance_predictions", "projected_roi"]))
        .map(|value| coerce_multiplier(value, &["projected_roi"], DEFAULT_ROI))
        .unwrap_or(DEFAULT_ROI);

    let conversion_rate = display_string(map, "conversion_rate", &["performance_predictions", "predicted_conversion_rate"], DEFAULT_CONVERSION_RATE);
    let payback_period = display_string(map, "payback_period", &["performance_predictions", "payback_period"], DEFAULT_PAYBACK_PERIOD);

    Campaign {
        title: string_or(map, &["title"], DEFAULT_TITLE),
        persona_target: string_or(map, &["persona_target"], DEFAULT_TARGET),
        theme: string_or(map, &["theme", "campaign_theme"], DEFAULT_THEME),
        key_message,
        value_propositions: string_list_or(map, &["value_propositions"], &DEFAULT_VALUE_PROPOSITIONS),
        channels: string_list_or(map, &["channels"], &DEFAULT_CHANNELS),
        content_strategy: decode_content_strategy(map.get("content_strategy")),
        success_metrics: string_list_or(map, &["success_metrics"], &DEFAULT_SUCCESS_METRICS),
        predicted_roi,
        conversion_rate,
        payback_period,
        confidence_interval: string_or(map, &["confidence_interval"], DEFAULT_CONFIDENCE_INTERVAL),
        budget_allocation: string_map(map.get("budget_allocation")),
    }
}

// Display strings keep whatever format the model chose; numbers are
// stringified, everything else falls through the nested alternate path to
// the default.
fn display_string(map: &Map<String, Value>, key: &str, alt_path: &[&str], default: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => value_at_path(map, alt_path)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_get_defaults() {
        let campaign = normalize_campaign(&json!({}));
        assert_eq!(campaign.title, DEFAULT_TITLE);
        assert_eq!(campaign.predicted_roi, DEFAULT_ROI);
        assert_eq!(campaign.conversion_rate, DEFAULT_CONVERSION_RATE);
        assert!(!campaign.channels.is_empty());
        assert!(!campaign.value_propositions.is_empty());
        assert!(!campaign.success_metrics.is_empty());
    }

    #[test]
    fn test_content_strategy_sequence_shape() {
        let campaign = normalize_campaign(&json!({"content_strategy": ["Tips", "Stories"]}));
        assert_eq!(campaign.content_strategy, vec!["Tips", "Stories"]);
    }

    #[test]
    fn test_content_strategy_single_string_shape() {
        let campaign = normalize_campaign(&json!({"content_strategy": "Thought leadership"}));
        assert_eq!(campaign.content_strategy, vec!["Thought leadership"]);
    }

    #[test]
    fn test_content_strategy_content_pillars_shape() {
        let campaign = normalize_campaign(&json!({
            "content_strategy": {"content_pillars": ["Education", "Community"]}
        }));
        assert_eq!(campaign.content_strategy, vec!["Education", "Community"]);
    }

    #[test]
    fn test_content_strategy_arbitrary_pillar_mapping_shape() {
        let campaign = normalize_campaign(&json!({
            "content_strategy": {"How-to guides": {"cadence": "weekly"}, "Case studies": {"cadence": "monthly"}}
        }));
        assert_eq!(campaign.content_strategy.len(), 2);
        assert!(campaign.content_strategy.contains(&"How-to guides".to_string()));
    }

    #[test]
    fn test_content_strategy_null_and_junk_shapes_get_filler() {
        for wire in [json!({"content_strategy": null}), json!({"content_strategy": 42}), json!({})] {
            let campaign = normalize_campaign(&wire);
            assert_eq!(
                campaign.content_strategy,
                DEFAULT_CONTENT_STRATEGY.iter().map(|s| s.to_string()).collect::<Vec<_>>()
            );
            assert!(!campaign.content_strategy.is_empty());
        }
    }

    #[test]
    fn test_roi_and_rates_read_from_performance_block() {
        let campaign = normalize_campaign(&json!({
            "performance_predictions": {
                "projected_roi": "3.4x",
                "predicted_conversion_rate": "8.5%",
                "payback_period": "6 months"
            }
        }));
        assert_eq!(campaign.predicted_roi, 3.4);
        assert_eq!(campaign.conversion_rate, "8.5%");
        assert_eq!(campaign.payback_period, "6 months");
    }

    #[test]
    fn test_theme_alternate_key() {
        let campaign = normalize_campaign(&json!({"campaign_theme": "Smart Choices"}));
        assert_eq!(campaign.theme, "Smart Choices");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let wire = json!({
            "title": "Launch",
            "channels": "Email",
            "content_strategy": {"content_pillars": "Stories"},
            "predicted_roi": "2.8x",
            "budget_allocation": {"paid": "40%", "organic": "60%"}
        });
        let first = normalize_campaign(&wire);
        let second = normalize_campaign(&serde_json::to_value(&first).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_round_trip_on_canonical_input() {
        for campaign in crate::normalizer::fallback::fallback_campaigns() {
            let reparsed: serde_json::Value =
                serde_json::from_str(&serde_json::to_string(&campaign).unwrap()).unwrap();
            assert_eq!(normalize_campaign(&reparsed), campaign);
        }
    }
}
