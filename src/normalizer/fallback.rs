use std::collections::BTreeMap;
use lazy_static::lazy_static;
use serde_json::{json, Value};

use crate::models::{Campaign, Persona};

// The fallback library is the availability guarantee of the whole flow: it
// is authored directly in canonical shape, so it never passes through the
// normalizer and can be substituted for any failed or unparsable generation
// step without leaving the single rendering code path.

fn strs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn list_map(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    pairs.iter().map(|(k, v)| (k.to_string(), strs(v))).collect()
}

#[allow(clippy::too_many_arguments)]
fn persona(
    name: &str,
    tagline: &str,
    demographics: &[(&str, &str)],
    psychographics: &[(&str, &[&str])],
    pain_points: &[&str],
    goals: &[&str],
    preferred_channels: &[&str],
    confidence_score: f64,
    market_size: f64,
    business_value: &str,
) -> Persona {
    Persona {
        name: name.to_string(),
        tagline: tagline.to_string(),
        demographics: string_map(demographics),
        psychographics: list_map(psychographics),
        pain_points: strs(pain_points),
        goals: strs(goals),
        preferred_channels: strs(preferred_channels),
        confidence_score,
        market_size,
        business_value: business_value.to_string(),
        is_refined: false,
        refinement_history: Vec::new(),
    }
}

fn build_personas() -> Vec<Persona> {
    vec![
        persona(
            "Alex the Efficiency Expert",
            "Time is money, quality is non-negotiable",
            &[
                ("age_range", "28-40"),
                ("income_range", "$65k-$120k"),
                ("education", "Bachelor's+"),
                ("location", "Urban/Suburban"),
                ("occupation", "N/A"),
            ],
            &[
                ("values", &["efficiency", "innovation", "work-life balance"]),
                ("personality_traits", &["analytical", "goal-oriented", "tech-savvy"]),
                ("lifestyle", &["Fast-paced, digitally connected, career-focused"]),
            ],
            &[
                "Information overload and decision fatigue",
                "Time-consuming processes and poor UX",
                "Lack of integration between tools",
            ],
            &[
                "Maximize productivity and efficiency",
                "Stay ahead of technology trends",
                "Achieve work-life balance",
            ],
            &["Email", "LinkedIn", "Mobile apps"],
            0.89,
            32.0,
            "High",
        ),
        persona(
            "Jordan the Value Optimizer",
            "Smart choices for smart families",
            &[
                ("age_range", "35-50"),
                ("income_range", "$45k-$85k"),
                ("education", "High School - Bachelor's"),
                ("location", "Suburban/Small City"),
                ("occupation", "N/A"),
            ],
            &[
                ("values", &["family", "financial security", "practical solutions"]),
                ("personality_traits", &["cautious", "caring", "community-minded"]),
                ("lifestyle", &["Family-centered, budget-conscious"]),
            ],
            &[
                "Limited budget with growing family needs",
                "Difficulty evaluating value vs cost",
                "Hidden fees and unexpected costs",
            ],
            &[
                "Provide best value for family",
                "Financial stability and security",
                "Make smart, informed decisions",
            ],
            &["Facebook", "Email newsletters", "Community forums"],
            0.88,
            28.0,
            "Medium-High",
        ),
        persona(
            "Sam the Premium Pursuer",
            "Quality over everything else",
            &[
                ("age_range", "40-65"),
                ("income_range", "$100k+"),
                ("education", "Bachelor's - Advanced Degree"),
                ("location", "Urban/Affluent Suburban"),
                ("occupation", "N/A"),
            ],
            &[
                ("values", &["quality", "exclusivity", "expertise"]),
                ("personality_traits", &["discerning", "confident", "success-oriented"]),
                ("lifestyle", &["Premium-focused, time-rich but selective"]),
            ],
            &[
                "Finding authentic premium quality",
                "Distinguishing between genuine and inflated value",
                "Lack of personalized service",
            ],
            &[
                "Access the highest quality solutions",
                "Maintain status and exclusivity",
                "Save time with premium service",
            ],
            &["Email", "Premium publications", "Exclusive events"],
            0.88,
            25.0,
            "Very High",
        ),
        persona(
            "Casey the Innovation Adopter",
            "First to try, first to succeed",
            &[
                ("age_range", "25-35"),
                ("income_range", "$55k-$95k"),
                ("education", "Bachelor's+"),
                ("location", "Urban/Tech Hubs"),
                ("occupation", "N/A"),
            ],
            &[
                ("values", &["innovation", "trendsetting", "social influence"]),
                ("personality_traits", &["curious", "social", "risk-tolerant"]),
                ("lifestyle", &["Tech-forward, socially connected, early adopter"]),
            ],
            &[
                "Missing out on latest trends",
                "Limited social proof for new products",
                "Overwhelming choice of new options",
            ],
            &[
                "Stay ahead of the curve",
                "Build social influence and credibility",
                "Find innovative solutions to everyday problems",
            ],
            &["Instagram", "TikTok", "Tech blogs", "Twitter"],
            0.86,
            22.0,
            "High",
        ),
        persona(
            "Riley the Relationship Builder",
            "Connection and community first",
            &[
                ("age_range", "30-55"),
                ("income_range", "$40k-$75k"),
                ("education", "High School - Bachelor's"),
                ("location", "Suburban/Rural"),
                ("occupation", "N/A"),
            ],
            &[
                ("values", &["community", "relationships", "authenticity"]),
                ("personality_traits", &["empathetic", "loyal", "collaborative"]),
                ("lifestyle", &["Community-focused, relationship-driven, authentic"]),
            ],
            &[
                "Impersonal service experiences",
                "Lack of genuine connection with brands",
                "Difficulty finding trustworthy recommendations",
            ],
            &[
                "Build meaningful connections",
                "Support businesses that share values",
                "Create positive community impact",
            ],
            &["Community events", "Word-of-mouth", "Local social media"],
            0.87,
            18.0,
            "Medium",
        ),
    ]
}

fn build_campaigns() -> Vec<Campaign> {
    vec![
        Campaign {
            title: "Efficiency Accelerator Campaign".to_string(),
            persona_target: "Alex the Efficiency Expert".to_string(),
            theme: "Time is Your Most Valuable Asset".to_string(),
            key_message: "Transform your productivity with intelligent automation".to_string(),
            value_propositions: strs(&[
                "Hours saved every week",
                "Integrates with the tools already in use",
            ]),
            channels: strs(&["LinkedIn Ads", "Google Search", "Email Marketing"]),
            content_strategy: strs(&[
                "Productivity Tips & Hacks",
                "Industry Efficiency Trends",
                "Customer Success Stories",
            ]),
            success_metrics: strs(&["Qualified sign-ups", "Activation rate", "Email click-through"]),
            predicted_roi: 3.4,
            conversion_rate: "8.5%".to_string(),
            payback_period: "6 months".to_string(),
            confidence_interval: "3.0x to 3.8x".to_string(),
            budget_allocation: string_map(&[
                ("LinkedIn Ads", "40%"),
                ("Google Search", "35%"),
                ("Email Marketing", "25%"),
            ]),
        },
        Campaign {
            title: "Smart Family Value Campaign".to_string(),
            persona_target: "Jordan the Value Optimizer".to_string(),
            theme: "Smart Choices for Smart Families".to_string(),
            key_message: "The smart choice families trust for value and quality".to_string(),
            value_propositions: strs(&[
                "Transparent pricing with no hidden fees",
                "Built for the whole household",
            ]),
            channels: strs(&["Facebook", "Instagram", "Community Partnerships"]),
            content_strategy: strs(&[
                "Family Success Stories",
                "Money-Saving Tips",
                "Community Spotlights",
            ]),
            success_metrics: strs(&["Cost per acquisition", "Referral rate", "Repeat purchases"]),
            predicted_roi: 2.8,
            conversion_rate: "6.2%".to_string(),
            payback_period: "8 months".to_string(),
            confidence_interval: "2.4x to 3.2x".to_string(),
            budget_allocation: string_map(&[
                ("Facebook", "45%"),
                ("Instagram", "30%"),
                ("Community Partnerships", "25%"),
            ]),
        },
        Campaign {
            title: "Premium Excellence Experience".to_string(),
            persona_target: "Sam the Premium Pursuer".to_string(),
            theme: "Exceptional Quality for Discerning Individuals".to_string(),
            key_message: "Uncompromising excellence for those who accept nothing less".to_string(),
            value_propositions: strs(&[
                "White-glove onboarding and support",
                "Access reserved for a select tier",
            ]),
            channels: strs(&["Premium Email", "Industry Publications", "Executive Networks"]),
            content_strategy: strs(&[
                "Industry Leadership",
                "Premium Insights",
                "Exclusive Access",
            ]),
            success_metrics: strs(&["Average order value", "Retention rate", "NPS"]),
            predicted_roi: 4.1,
            conversion_rate: "12.3%".to_string(),
            payback_period: "4 months".to_string(),
            confidence_interval: "3.6x to 4.6x".to_string(),
            budget_allocation: string_map(&[
                ("Premium Email", "30%"),
                ("Industry Publications", "40%"),
                ("Executive Networks", "30%"),
            ]),
        },
    ]
}

lazy_static! {
    static ref FALLBACK_PERSONAS: Vec<Persona> = build_personas();
    static ref FALLBACK_CAMPAIGNS: Vec<Campaign> = build_campaigns();
}

/// The first `count` pre-authored personas, in fixed authored order.
/// Requesting more than the library holds returns the whole list.
pub fn fallback_personas(count: usize) -> Vec<Persona> {
    FALLBACK_PERSONAS.iter().take(count).cloned().collect()
}

/// All pre-authored campaign strategies.
pub fn fallback_campaigns() -> Vec<Campaign> {
    FALLBACK_CAMPAIGNS.clone()
}

/// Pre-authored substitute for the customer-data analysis step.
pub fn fallback_analysis() -> Value {
    json!({
        "customer_segments": [
            {
                "name": "Efficiency Seekers",
                "size": "35%",
                "traits": ["time-conscious", "tech-savvy", "quality-focused"]
            },
            {
                "name": "Value Optimizers",
                "size": "30%",
                "traits": ["budget-conscious", "research-driven", "family-oriented"]
            },
            {
                "name": "Premium Pursuers",
                "size": "25%",
                "traits": ["quality-first", "brand-loyal", "premium-willing"]
            }
        ],
        "key_insights": {
            "primary_pain_points": ["time constraints", "complex processes", "poor value"],
            "top_motivations": ["efficiency", "savings", "quality"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_count_is_honored_exactly() {
        for count in 2..=5 {
            assert_eq!(fallback_personas(count).len(), count);
        }
    }

    #[test]
    fn test_overshoot_returns_full_list_without_erroring() {
        let all = fallback_personas(50);
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_order_is_fixed_and_never_sampled() {
        let three = fallback_personas(3);
        assert_eq!(three[0].name, "Alex the Efficiency Expert");
        assert_eq!(three[1].name, "Jordan the Value Optimizer");
        assert_eq!(three[2].name, "Sam the Premium Pursuer");

        // A second request yields the same prefix.
        assert_eq!(fallback_personas(3), three);
    }

    #[test]
    fn test_personas_are_already_canonical() {
        for persona in fallback_personas(5) {
            assert!((0.0..=1.0).contains(&persona.confidence_score));
            assert!((0.0..=100.0).contains(&persona.market_size));
            for key in crate::models::DEMOGRAPHIC_KEYS {
                assert!(persona.demographics.contains_key(key));
            }
            assert!(!persona.pain_points.is_empty());
            assert!(!persona.goals.is_empty());
        }
    }

    #[test]
    fn test_campaigns_are_already_canonical() {
        for campaign in fallback_campaigns() {
            assert!(!campaign.channels.is_empty());
            assert!(!campaign.content_strategy.is_empty());
            assert!(!campaign.value_propositions.is_empty());
            assert!(!campaign.success_metrics.is_empty());
            assert!(campaign.predicted_roi > 0.0);
        }
    }

    #[test]
    fn test_analysis_payload_is_an_object() {
        assert!(fallback_analysis().is_object());
    }
}
