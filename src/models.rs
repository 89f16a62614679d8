use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

// Define the structure for a single refinement pass applied to a persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementEntry {
    pub timestamp: DateTime<Utc>,
    pub feedback: String,
}

impl RefinementEntry {
    pub fn new(feedback: String) -> Self {
        Self {
            timestamp: Utc::now(),
            feedback,
        }
    }
}

// Define the canonical structure for a marketing persona.
// Every field is guaranteed present and type-correct once a record has gone
// through the normalizer (or was authored directly in the fallback library),
// so display and export code never re-checks shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub tagline: String,
    // Recognized keys (age_range, income_range, education, location,
    // occupation) are always present, defaulting to "N/A".
    pub demographics: BTreeMap<String, String>,
    // Values are always sequences; a single string on the wire gets wrapped.
    pub psychographics: BTreeMap<String, Vec<String>>,
    pub pain_points: Vec<String>,
    pub goals: Vec<String>,
    pub preferred_channels: Vec<String>,
    // Always a valid probability in [0, 1].
    pub confidence_score: f64,
    // Percentage of the addressable market, in [0, 100].
    pub market_size: f64,
    pub business_value: String,
    pub is_refined: bool,
    pub refinement_history: Vec<RefinementEntry>,
}

// Define the canonical structure for a campaign strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub title: String,
    pub persona_target: String,
    pub theme: String,
    pub key_message: String,
    // Sequence fields are never empty after normalization.
    pub value_propositions: Vec<String>,
    pub channels: Vec<String>,
    pub content_strategy: Vec<String>,
    pub success_metrics: Vec<String>,
    // Stored without the "x" suffix; rendered with it.
    pub predicted_roi: f64,
    // Kept as display strings, the wire format varies too much to coerce.
    pub conversion_rate: String,
    pub payback_period: String,
    pub confidence_interval: String,
    pub budget_allocation: BTreeMap<String, String>,
}

// The demographic keys every canonical persona carries
pub const DEMOGRAPHIC_KEYS: [&str; 5] = [
    "age_range",
    "income_range",
    "education",
    "location",
    "occupation",
];

impl Persona {
    pub fn market_size_display(&self) -> String {
        format!("{}%", self.market_size)
    }
}

impl Campaign {
    pub fn roi_display(&self) -> String {
        format!("{}x", self.predicted_roi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::fallback;

    #[test]
    fn test_roi_display_has_multiplier_suffix() {
        let campaign = fallback::fallback_campaigns()[0].clone();
        assert!(campaign.roi_display().ends_with('x'));
    }

    #[test]
    fn test_market_size_display_has_percent_suffix() {
        let persona = fallback::fallback_personas(2)[0].clone();
        assert!(persona.market_size_display().ends_with('%'));
    }

    #[test]
    fn test_refinement_entry_keeps_feedback() {
        let entry = RefinementEntry::new("tone it down".to_string());
        assert_eq!(entry.feedback, "tone it down");
    }
}
