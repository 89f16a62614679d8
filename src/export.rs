use chrono::Utc;
use serde_json::{json, Value};

use crate::models::{Campaign, Persona};
use crate::session_store::SessionData;

// Fixed CSV headers; the export consumer relies on these exact columns.
pub const PERSONA_CSV_HEADER: &str = "Name,Tagline,Age Range,Income,Confidence Score,Market Size";
pub const CAMPAIGN_CSV_HEADER: &str = "Title,Target Persona,Theme,Predicted ROI,Conversion Rate";

fn demographic<'a>(persona: &'a Persona, key: &str) -> &'a str {
    persona
        .demographics
        .get(key)
        .map(String::as_str)
        .unwrap_or("N/A")
}

/// Sectioned Markdown report over the canonical records.
pub fn markdown_report(personas: &[Persona], campaigns: &[Campaign]) -> String {
    let mut content = String::from("# Marketing Persona & Campaign Analysis Report\n\n");
    content.push_str(&format!(
        "Generated on: {}\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    ));

    content.push_str("## Customer Personas\n\n");
    for persona in personas {
        content.push_str(&format!("### {}\n", persona.name));
        content.push_str(&format!("*{}*\n\n", persona.tagline));

        content.push_str(&format!("**Age:** {}\n", demographic(persona, "age_range")));
        content.push_str(&format!("**Income:** {}\n", demographic(persona, "income_range")));
        content.push_str(&format!("**Education:** {}\n\n", demographic(persona, "education")));

        content.push_str("**Pain Points:**\n");
        for pain in &persona.pain_points {
            content.push_str(&format!("- {}\n", pain));
        }
        content.push('\n');

        content.push_str("**Goals:**\n");
        for goal in &persona.goals {
            content.push_str(&format!("- {}\n", goal));
        }
        content.push('\n');
    }

    content.push_str("## Campaign Strategies\n\n");
    for campaign in campaigns {
        content.push_str(&format!("### {}\n", campaign.title));
        content.push_str(&format!("**Target:** {}\n", campaign.persona_target));
        content.push_str(&format!("**Theme:** {}\n", campaign.theme));
        content.push_str(&format!("**ROI:** {}\n\n", campaign.roi_display()));
    }

    content
}

/// Two-block CSV export. Values are wrapped in double quotes with no
/// further escaping; embedded quotes pass through as-is.
pub fn csv_export(personas: &[Persona], campaigns: &[Campaign]) -> String {
    let mut output = String::from("Persona Analysis\n");
    output.push_str(PERSONA_CSV_HEADER);
    output.push('\n');

    for persona in personas {
        output.push_str(&format!(
            "\"{}\",\"{}\",\"{}\",\"{}\",{},\"{}\"\n",
            persona.name,
            persona.tagline,
            demographic(persona, "age_range"),
            demographic(persona, "income_range"),
            persona.confidence_score,
            persona.market_size_display(),
        ));
    }

    output.push_str("\n\nCampaign Strategies\n");
    output.push_str(CAMPAIGN_CSV_HEADER);
    output.push('\n');

    for campaign in campaigns {
        output.push_str(&format!(
            "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"\n",
            campaign.title,
            campaign.persona_target,
            campaign.theme,
            campaign.roi_display(),
            campaign.conversion_rate,
        ));
    }

    output
}

/// Short shareable Markdown summary for stakeholders.
pub fn share_summary(personas: &[Persona], campaigns: &[Campaign]) -> String {
    let mut content = String::from("# Marketing Intelligence Summary\n\n");
    content.push_str(&format!("**Generated:** {}\n", Utc::now().format("%Y-%m-%d")));
    content.push_str(&format!("**Personas Created:** {}\n", personas.len()));
    content.push_str(&format!("**Campaigns Developed:** {}\n\n", campaigns.len()));

    content.push_str("## Key Insights\n\n");
    if !personas.is_empty() {
        content.push_str("### Target Personas:\n");
        for persona in personas {
            content.push_str(&format!(
                "- **{}** - Market Share: {}\n",
                persona.name,
                persona.market_size_display()
            ));
        }
        content.push('\n');
    }

    if !campaigns.is_empty() {
        content.push_str("### Campaign Performance Predictions:\n");
        for campaign in campaigns {
            content.push_str(&format!(
                "- **{}** - Expected ROI: {}\n",
                campaign.title,
                campaign.roi_display()
            ));
        }
    }

    content
}

/// Direct serialization of the canonical session data plus a metadata block.
pub fn json_export(session: &SessionData, engine_id: &str) -> Value {
    let timestamp = session.generated_at.unwrap_or_else(Utc::now);

    json!({
        "analysis": session.analysis.clone().unwrap_or(Value::Null),
        "personas": session.personas,
        "campaigns": session.campaigns,
        "metadata": {
            "analysis_timestamp": timestamp.to_rfc3339(),
            "personas_generated": session.personas.len(),
            "campaigns_created": session.campaigns.len(),
            "ai_engine": engine_id,
            "analysis_status": if session.has_results() { "Complete" } else { "Pending" },
            "used_fallback": {
                "analysis": session.analysis_from_fallback,
                "personas": session.personas_from_fallback,
                "campaigns": session.campaigns_from_fallback,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::fallback;

    fn sample() -> (Vec<Persona>, Vec<Campaign>) {
        (fallback::fallback_personas(3), fallback::fallback_campaigns())
    }

    #[test]
    fn test_csv_blocks_carry_fixed_headers() {
        let (personas, campaigns) = sample();
        let csv = csv_export(&personas, &campaigns);

        assert!(csv.contains(PERSONA_CSV_HEADER));
        assert!(csv.contains(CAMPAIGN_CSV_HEADER));
        assert!(csv.starts_with("Persona Analysis\n"));
        assert!(csv.contains("\nCampaign Strategies\n"));
    }

    #[test]
    fn test_csv_rows_are_quoted_and_suffixed() {
        let (personas, campaigns) = sample();
        let csv = csv_export(&personas, &campaigns);

        assert!(csv.contains("\"Alex the Efficiency Expert\""));
        assert!(csv.contains("\"32%\""));
        assert!(csv.contains("\"3.4x\""));
    }

    #[test]
    fn test_report_has_both_sections() {
        let (personas, campaigns) = sample();
        let report = markdown_report(&personas, &campaigns);

        assert!(report.contains("## Customer Personas"));
        assert!(report.contains("## Campaign Strategies"));
        assert!(report.contains("### Alex the Efficiency Expert"));
        assert!(report.contains("**ROI:** 3.4x"));
    }

    #[test]
    fn test_json_export_metadata_counts() {
        let (personas, campaigns) = sample();
        let now = Utc::now();
        let session = SessionData {
            id: "test-session".to_string(),
            analysis: Some(fallback::fallback_analysis()),
            personas,
            campaigns,
            analysis_from_fallback: true,
            personas_from_fallback: false,
            campaigns_from_fallback: false,
            requested_personas: 3,
            generated_at: Some(now),
            created_at: now,
            last_activity: now,
        };

        let exported = json_export(&session, "gemini-2.0-flash-exp");
        let metadata = &exported["metadata"];

        assert_eq!(metadata["personas_generated"], 3);
        assert_eq!(metadata["campaigns_created"], 3);
        assert_eq!(metadata["ai_engine"], "gemini-2.0-flash-exp");
        assert_eq!(metadata["analysis_status"], "Complete");
    }

    #[test]
    fn test_share_summary_counts_records() {
        let (personas, campaigns) = sample();
        let summary = share_summary(&personas, &campaigns);

        assert!(summary.contains("**Personas Created:** 3"));
        assert!(summary.contains("Expected ROI: 3.4x"));
    }
}
