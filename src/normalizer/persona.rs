use std::collections::BTreeMap;
use serde_json::{Map, Value};

use crate::models::{Persona, RefinementEntry, DEMOGRAPHIC_KEYS};
use super::coerce::{coerce_confidence, coerce_percent, DEFAULT_CONFIDENCE, DEFAULT_MARKET_SIZE};
use super::decode::{string_list, string_list_or, string_map, string_or, value_at_path};

const DEFAULT_NAME: &str = "Unknown Persona";
const DEFAULT_TAGLINE: &str = "Marketing persona";
const DEFAULT_BUSINESS_VALUE: &str = "Medium";
const DEFAULT_TRAITS: [&str; 2] = ["analytical", "focused"];
const DEFAULT_PAIN_POINTS: [&str; 1] = ["Various challenges and concerns"];
const DEFAULT_GOALS: [&str; 1] = ["Achieve success"];
const DEFAULT_CHANNELS: [&str; 2] = ["Email", "Social Media"];

// Demographics keep every displayable wire entry, fold the short alternate
// keys into the canonical ones, and guarantee the recognized keys exist.
fn decode_demographics(map: &Map<String, Value>) -> BTreeMap<String, String> {
    let mut demographics = string_map(map.get("demographics"));

    for (canonical, alternate) in [("age_range", "age"), ("income_range", "income")] {
        if !demographics.contains_key(canonical) {
            if let Some(value) = demographics.remove(alternate) {
                demographics.insert(canonical.to_string(), value);
            }
        }
    }

    for key in DEMOGRAPHIC_KEYS {
        demographics
            .entry(key.to_string())
            .or_insert_with(|| "N/A".to_string());
    }

    demographics
}

// Every psychographic value becomes a sequence; `personality_traits` is
// always present.
fn decode_psychographics(map: &Map<String, Value>) -> BTreeMap<String, Vec<String>> {
    let mut psychographics = BTreeMap::new();

    if let Some(Value::Object(entries)) = map.get("psychographics") {
        for (key, value) in entries {
            if let Some(items) = string_list(value) {
                psychographics.insert(key.clone(), items);
            }
        }
    }

    psychographics
        .entry("personality_traits".to_string())
        .or_insert_with(|| DEFAULT_TRAITS.iter().map(|s| s.to_string()).collect());

    psychographics
}

fn decode_refinement_history(map: &Map<String, Value>) -> Vec<RefinementEntry> {
    match map.get("refinement_history") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Normalize an arbitrary mapping purporting to describe one persona into
/// the canonical shape. Every canonical field is present and type-correct in
/// the output; normalizing an already-canonical record is a no-op.
pub fn normalize_persona(raw: &Value) -> Persona {
    let empty = Map::new();
    let map = raw.as_object().unwrap_or(&empty);

    let confidence_score = map
        .get("confidence_score")
        .or_else(|| value_at_path(map, &["confidence_metrics", "overall_confidence"]))
        .map(|value| coerce_confidence(value, DEFAULT_CONFIDENCE))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let market_size = map
        .get("market_size")
        .or_else(|| value_at_path(map, &["business_metrics", "market_segment_size"]))
        .map(|value| coerce_percent(value, &["market_segment_size"], DEFAULT_MARKET_SIZE))
        .unwrap_or(DEFAULT_MARKET_SIZE);

    let business_value = match map.get("business_value") {
        Some(_) => string_or(map, &["business_value"], DEFAULT_BUSINESS_VALUE),
        None => value_at_path(map, &["business_metrics", "estimated_value"])
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_BUSINESS_VALUE)
            .to_string(),
    };

    let preferred_channels = match value_at_path(map, &["communication_preferences", "channels"])
        .and_then(string_list)
    {
        Some(channels) => channels,
        None => string_list_or(map, &["preferred_channels", "channels"], &DEFAULT_CHANNELS),
    };

    Persona {
        name: string_or(map, &["name"], DEFAULT_NAME),
        tagline: string_or(map, &["tagline"], DEFAULT_TAGLINE),
        demographics: decode_demographics(map),
        psychographics: decode_psychographics(map),
        pain_points: string_list_or(map, &["pain_points"], &DEFAULT_PAIN_POINTS),
        goals: string_list_or(map, &["goals", "goals_motivations"], &DEFAULT_GOALS),
        preferred_channels,
        confidence_score,
        market_size,
        business_value,
        is_refined: map.get("is_refined").and_then(Value::as_bool).unwrap_or(false),
        refinement_history: decode_refinement_history(map),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_get_defaults() {
        let persona = normalize_persona(&json!({}));
        assert_eq!(persona.name, "Unknown Persona");
        assert_eq!(persona.confidence_score, DEFAULT_CONFIDENCE);
        assert_eq!(persona.market_size, DEFAULT_MARKET_SIZE);
        assert_eq!(persona.demographics.get("age_range").unwrap(), "N/A");
        assert!(!persona.pain_points.is_empty());
        assert!(!persona.is_refined);
    }

    #[test]
    fn test_non_object_input_degrades_to_defaults() {
        let persona = normalize_persona(&json!("not even close"));
        assert_eq!(persona.name, "Unknown Persona");
        assert!(!persona.goals.is_empty());
    }

    #[test]
    fn test_goals_fall_back_to_alternate_key() {
        let persona = normalize_persona(&json!({"goals_motivations": ["ship it"]}));
        assert_eq!(persona.goals, vec!["ship it"]);
    }

    #[test]
    fn test_single_string_sequences_are_wrapped() {
        let persona = normalize_persona(&json!({
            "pain_points": "only one complaint",
            "psychographics": {"values": "efficiency"}
        }));
        assert_eq!(persona.pain_points, vec!["only one complaint"]);
        assert_eq!(persona.psychographics.get("values").unwrap(), &vec!["efficiency".to_string()]);
    }

    #[test]
    fn test_demographic_alternate_keys_are_folded() {
        let persona = normalize_persona(&json!({
            "demographics": {"age": "25-35", "income": "$50k"}
        }));
        assert_eq!(persona.demographics.get("age_range").unwrap(), "25-35");
        assert_eq!(persona.demographics.get("income_range").unwrap(), "$50k");
    }

    #[test]
    fn test_metrics_read_from_nested_blocks() {
        let persona = normalize_persona(&json!({
            "confidence_metrics": {"overall_confidence": 0.8},
            "business_metrics": {"market_segment_size": "30%", "estimated_value": "Very High"}
        }));
        assert_eq!(persona.confidence_score, 0.8);
        assert_eq!(persona.market_size, 30.0);
        assert_eq!(persona.business_value, "Very High");
    }

    #[test]
    fn test_market_size_scenarios() {
        let suffixed = normalize_persona(&json!({"market_size": "25%"}));
        assert_eq!(suffixed.market_size, 25.0);

        let bare = normalize_persona(&json!({"market_size": 25}));
        assert_eq!(bare.market_size, 25.0);

        let nested = normalize_persona(&json!({"market_size": {"market_segment_size": "30%"}}));
        assert_eq!(nested.market_size, 30.0);
    }

    #[test]
    fn test_channels_prefer_communication_preferences() {
        let persona = normalize_persona(&json!({
            "communication_preferences": {"channels": ["LinkedIn", "Podcasts"]},
            "channels": ["ignored"]
        }));
        assert_eq!(persona.preferred_channels, vec!["LinkedIn", "Podcasts"]);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let wire = json!({
            "name": "Alex",
            "tagline": "fast and focused",
            "demographics": {"age": "28-40"},
            "psychographics": {"lifestyle": "urban"},
            "pain_points": "too many tools",
            "confidence_score": "92%",
            "market_size": "25%",
            "business_value": "High"
        });
        let first = normalize_persona(&wire);
        let second = normalize_persona(&serde_json::to_value(&first).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_round_trip_on_canonical_input() {
        let canonical = crate::normalizer::fallback::fallback_personas(5);
        for persona in canonical {
            let reparsed: serde_json::Value =
                serde_json::from_str(&serde_json::to_string(&persona).unwrap()).unwrap();
            assert_eq!(normalize_persona(&reparsed), persona);
        }
    }
}
