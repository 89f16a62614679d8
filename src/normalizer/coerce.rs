use serde_json::Value;

/// Documented defaults used when coercion is impossible.
pub const DEFAULT_CONFIDENCE: f64 = 0.85;
pub const DEFAULT_MARKET_SIZE: f64 = 25.0;
pub const DEFAULT_ROI: f64 = 2.5;

/// Alternate key consulted when a confidence value arrives as an object.
const CONFIDENCE_ALT_KEYS: [&str; 1] = ["overall_confidence"];

// Parse a number out of a JSON number or a string, tolerating one trailing
// unit suffix ("%" or "x").
fn numeric_with_suffix(value: &Value, suffix: char) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            let trimmed = trimmed.strip_suffix(suffix).unwrap_or(trimmed).trim();
            trimmed.parse::<f64>().ok()
        }
        _ => None,
    }
}

// Look up the first matching alternate key inside a mapping.
fn lookup_alternate<'a>(value: &'a Value, alt_keys: &[&str]) -> Option<&'a Value> {
    let map = value.as_object()?;
    alt_keys.iter().find_map(|key| map.get(*key))
}

/// Coerce a percentage from a number, a "NN%" string, or a mapping carrying
/// one of `alt_keys` (e.g. `market_segment_size`). The result is clamped to
/// [0, 100]; anything unusable yields `default`. This function sits on the
/// critical path of every rendered metric and therefore never fails.
pub fn coerce_percent(value: &Value, alt_keys: &[&str], default: f64) -> f64 {
    let target = if value.is_object() {
        match lookup_alternate(value, alt_keys) {
            Some(inner) => inner,
            None => return default,
        }
    } else {
        value
    };

    match numeric_with_suffix(target, '%') {
        Some(v) if v.is_finite() => v.clamp(0.0, 100.0),
        _ => default,
    }
}

/// Coerce a multiplier from a number, a "N.Nx" string, or a mapping carrying
/// one of `alt_keys` (e.g. `projected_roi`). Unusable input yields `default`.
pub fn coerce_multiplier(value: &Value, alt_keys: &[&str], default: f64) -> f64 {
    let target = if value.is_object() {
        match lookup_alternate(value, alt_keys) {
            Some(inner) => inner,
            None => return default,
        }
    } else {
        value
    };

    match numeric_with_suffix(target, 'x') {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}

/// Coerce a confidence fraction. Accepts a fraction, a percentage (any value
/// above 1 is treated as one and divided by 100), a "NN%" string, or a
/// mapping with `overall_confidence`. Always returns a value in [0, 1].
pub fn coerce_confidence(value: &Value, default: f64) -> f64 {
    let target = if value.is_object() {
        match lookup_alternate(value, &CONFIDENCE_ALT_KEYS) {
            Some(inner) => inner,
            None => return default,
        }
    } else {
        value
    };

    match numeric_with_suffix(target, '%') {
        Some(v) if v.is_finite() => {
            let fraction = if v > 1.0 { v / 100.0 } else { v };
            fraction.clamp(0.0, 1.0)
        }
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_confidence_from_percentage_string() {
        assert_eq!(coerce_confidence(&json!("92%"), DEFAULT_CONFIDENCE), 0.92);
    }

    #[test]
    fn test_confidence_above_one_is_treated_as_percentage() {
        let coerced = coerce_confidence(&json!(1.2), DEFAULT_CONFIDENCE);
        assert!((0.0..=1.0).contains(&coerced));
        assert!((coerced - 0.012).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_from_nested_object() {
        let value = json!({"overall_confidence": 0.8});
        assert_eq!(coerce_confidence(&value, DEFAULT_CONFIDENCE), 0.8);
    }

    #[test]
    fn test_confidence_invalid_string_yields_default() {
        assert_eq!(
            coerce_confidence(&json!("not a number"), DEFAULT_CONFIDENCE),
            DEFAULT_CONFIDENCE
        );
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(coerce_confidence(&json!(-0.3), DEFAULT_CONFIDENCE), 0.0);
        assert_eq!(coerce_confidence(&json!("250%"), DEFAULT_CONFIDENCE), 1.0);
    }

    #[test]
    fn test_percent_from_suffixed_string() {
        assert_eq!(
            coerce_percent(&json!("25%"), &["market_segment_size"], DEFAULT_MARKET_SIZE),
            25.0
        );
    }

    #[test]
    fn test_percent_from_bare_number() {
        assert_eq!(
            coerce_percent(&json!(25), &["market_segment_size"], DEFAULT_MARKET_SIZE),
            25.0
        );
    }

    #[test]
    fn test_percent_from_mapping_alternate_key() {
        let value = json!({"market_segment_size": "30%"});
        assert_eq!(
            coerce_percent(&value, &["market_segment_size"], DEFAULT_MARKET_SIZE),
            30.0
        );
    }

    #[test]
    fn test_percent_mapping_without_known_key_yields_default() {
        let value = json!({"something_else": "30%"});
        assert_eq!(
            coerce_percent(&value, &["market_segment_size"], DEFAULT_MARKET_SIZE),
            DEFAULT_MARKET_SIZE
        );
    }

    #[test]
    fn test_percent_is_clamped_to_range() {
        assert_eq!(coerce_percent(&json!(140), &[], DEFAULT_MARKET_SIZE), 100.0);
        assert_eq!(coerce_percent(&json!(-3), &[], DEFAULT_MARKET_SIZE), 0.0);
    }

    #[test]
    fn test_multiplier_strips_suffix() {
        assert_eq!(coerce_multiplier(&json!("3.4x"), &[], DEFAULT_ROI), 3.4);
    }

    #[test]
    fn test_multiplier_from_mapping_alternate_key() {
        let value = json!({"projected_roi": "2.8x"});
        assert_eq!(coerce_multiplier(&value, &["projected_roi"], DEFAULT_ROI), 2.8);
    }

    #[test]
    fn test_multiplier_failure_yields_caller_default() {
        assert_eq!(coerce_multiplier(&json!([1, 2]), &[], 2.5), 2.5);
        assert_eq!(coerce_multiplier(&json!("fast"), &[], 2.5), 2.5);
    }
}
