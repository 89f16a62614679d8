use serde_json::Value;
use tracing::{info, warn};

use crate::engine_config::{render_template, EngineConfig};
use crate::llm_handler::{parse_object, parse_record_envelope, LLMProvider, LLMProviderImpl};
use crate::models::{Campaign, Persona, RefinementEntry};
use crate::normalizer::{
    fallback, normalize_campaign, normalize_persona, EngineError, EngineResult, ResponseOrigin,
};

/// Bounds for the requested persona count, matching the dashboard slider.
pub const MIN_PERSONAS: usize = 2;
pub const MAX_PERSONAS: usize = 5;

/// Result of one generation step: the canonical data plus which path
/// produced it, so callers and tests can observe fallback substitution.
#[derive(Debug, Clone)]
pub struct StepOutput<T> {
    pub value: T,
    pub origin: ResponseOrigin,
}

impl<T> StepOutput<T> {
    fn parsed(value: T) -> Self {
        Self {
            value,
            origin: ResponseOrigin::Parsed,
        }
    }

    fn substituted(value: T) -> Self {
        Self {
            value,
            origin: ResponseOrigin::FallbackSubstituted,
        }
    }
}

/// Everything one full generation request produces. Each step held a
/// concrete result before the next one ran.
pub struct GenerationResult {
    pub analysis: StepOutput<Value>,
    pub personas: StepOutput<Vec<Persona>>,
    pub campaigns: StepOutput<Vec<Campaign>>,
}

pub fn clamp_persona_count(count: usize) -> usize {
    count.clamp(MIN_PERSONAS, MAX_PERSONAS)
}

/// Rough input-volume score shown on the dashboard, in [0, 100].
pub fn data_quality_score(customer_data: &str) -> u32 {
    (customer_data.split_whitespace().count() as u32 * 2).min(100)
}

// The analysis engine drives the generation chain. All substance lives in
// the external model; this type owns request formatting, the single parse
// attempt, normalization, and fallback substitution.
pub struct AnalysisEngine {
    provider: LLMProviderImpl,
    config: EngineConfig,
}

impl AnalysisEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            provider: LLMProviderImpl::from_config(&config),
            config,
        }
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub fn provider_type(&self) -> LLMProvider {
        self.provider.provider_type()
    }

    /// Credential precondition, checked before any step of a chain runs.
    pub fn check_ready(&self) -> EngineResult<()> {
        self.provider.check_credentials()
    }

    /// Run the full chain: analyze, then personas, then campaigns. Each step
    /// must complete with a concrete result (parsed or substituted) before
    /// the next one starts; a precondition failure aborts the whole request
    /// before the first provider call.
    pub async fn generate(
        &self,
        customer_data: &str,
        product_info: &str,
        num_personas: usize,
    ) -> EngineResult<GenerationResult> {
        let analysis = self.analyze(customer_data, product_info).await?;
        let personas = self.create_personas(&analysis.value, num_personas).await?;
        let campaigns = self.create_campaigns(&personas.value).await?;

        info!(
            personas = personas.value.len(),
            campaigns = campaigns.value.len(),
            used_fallback = analysis.origin.used_fallback()
                || personas.origin.used_fallback()
                || campaigns.origin.used_fallback(),
            "generation chain complete"
        );

        Ok(GenerationResult {
            analysis,
            personas,
            campaigns,
        })
    }

    /// Analyze raw customer research. The result is loose JSON: it is only
    /// ever fed back into the persona prompt, never rendered directly.
    pub async fn analyze(
        &self,
        customer_data: &str,
        product_info: &str,
    ) -> EngineResult<StepOutput<Value>> {
        if customer_data.trim().is_empty() {
            return Err(EngineError::Precondition(
                "customer research data is required".to_string(),
            ));
        }
        if product_info.trim().is_empty() {
            return Err(EngineError::Precondition(
                "product information is required".to_string(),
            ));
        }
        self.check_ready()?;

        let (system, template) = self.config.analyze_prompts();
        let user = render_template(
            template,
            &[("customer_data", customer_data), ("product_info", product_info)],
        );

        match self.request_object(system, &user).await {
            Ok(parsed) => Ok(StepOutput::parsed(parsed)),
            Err(err) if err.is_substitutable() => {
                warn!("analysis step substituted fallback data: {}", err);
                Ok(StepOutput::substituted(fallback::fallback_analysis()))
            }
            Err(err) => Err(err),
        }
    }

    /// Create `count` personas from the analysis payload. The count is
    /// clamped to the supported range before it reaches the prompt.
    pub async fn create_personas(
        &self,
        analysis: &Value,
        count: usize,
    ) -> EngineResult<StepOutput<Vec<Persona>>> {
        self.check_ready()?;
        let count = clamp_persona_count(count);

        let analysis_json = serde_json::to_string_pretty(analysis)?;
        let (system, template) = self.config.personas_prompts();
        let user = render_template(
            template,
            &[("count", count.to_string().as_str()), ("analysis", analysis_json.as_str())],
        );

        match self.request_records(system, &user, "personas").await {
            Ok(records) if !records.is_empty() => {
                Ok(StepOutput::parsed(records.iter().map(normalize_persona).collect()))
            }
            Ok(_) => {
                warn!("persona step returned an empty array, substituting fallback personas");
                Ok(StepOutput::substituted(fallback::fallback_personas(count)))
            }
            Err(err) if err.is_substitutable() => {
                warn!("persona step substituted fallback data: {}", err);
                Ok(StepOutput::substituted(fallback::fallback_personas(count)))
            }
            Err(err) => Err(err),
        }
    }

    /// Create one campaign strategy per persona.
    pub async fn create_campaigns(
        &self,
        personas: &[Persona],
    ) -> EngineResult<StepOutput<Vec<Campaign>>> {
        if personas.is_empty() {
            return Err(EngineError::Precondition(
                "campaign creation requires at least one persona".to_string(),
            ));
        }
        self.check_ready()?;

        let personas_json = serde_json::to_string_pretty(personas)?;
        let (system, template) = self.config.campaigns_prompts();
        let user = render_template(template, &[("personas", personas_json.as_str())]);

        match self.request_records(system, &user, "campaigns").await {
            Ok(records) if !records.is_empty() => {
                Ok(StepOutput::parsed(records.iter().map(normalize_campaign).collect()))
            }
            Ok(_) => {
                warn!("campaign step returned an empty array, substituting fallback campaigns");
                Ok(StepOutput::substituted(fallback::fallback_campaigns()))
            }
            Err(err) if err.is_substitutable() => {
                warn!("campaign step substituted fallback data: {}", err);
                Ok(StepOutput::substituted(fallback::fallback_campaigns()))
            }
            Err(err) => Err(err),
        }
    }

    /// Refine one persona against stakeholder feedback. On any
    /// substitutable failure the original persona is kept unchanged rather
    /// than replaced with library content.
    pub async fn refine_persona(
        &self,
        persona: &Persona,
        feedback: &str,
    ) -> EngineResult<StepOutput<Persona>> {
        if feedback.trim().is_empty() {
            return Err(EngineError::Precondition(
                "refinement feedback is required".to_string(),
            ));
        }
        self.check_ready()?;

        let persona_json = serde_json::to_string_pretty(persona)?;
        let (system, template) = self.config.refine_prompts();
        let user = render_template(
            template,
            &[("persona", persona_json.as_str()), ("feedback", feedback)],
        );

        match self.request_records(system, &user, "personas").await {
            Ok(records) if !records.is_empty() => {
                Ok(StepOutput::parsed(apply_refinement(persona, &records[0], feedback)))
            }
            Ok(_) => {
                warn!("refine step returned an empty array, keeping the original persona");
                Ok(StepOutput::substituted(persona.clone()))
            }
            Err(err) if err.is_substitutable() => {
                warn!("refine step kept the original persona: {}", err);
                Ok(StepOutput::substituted(persona.clone()))
            }
            Err(err) => Err(err),
        }
    }

    async fn request_object(&self, system: &str, user: &str) -> EngineResult<Value> {
        let text = self.provider.send_prompt(system, user).await?;
        parse_object(&text)
    }

    async fn request_records(
        &self,
        system: &str,
        user: &str,
        expected_key: &str,
    ) -> EngineResult<Vec<Value>> {
        let text = self.provider.send_prompt(system, user).await?;
        parse_record_envelope(&text, expected_key)
    }
}

// Normalize the refined record, then replace the history with the original
// one plus the new entry; the model's copy of the history is never trusted.
fn apply_refinement(original: &Persona, refined_record: &Value, feedback: &str) -> Persona {
    let mut refined = normalize_persona(refined_record);
    refined.is_refined = true;
    refined.refinement_history = original.refinement_history.clone();
    refined.refinement_history.push(RefinementEntry::new(feedback.to_string()));
    refined
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_persona_count_is_clamped_to_slider_range() {
        assert_eq!(clamp_persona_count(0), MIN_PERSONAS);
        assert_eq!(clamp_persona_count(3), 3);
        assert_eq!(clamp_persona_count(12), MAX_PERSONAS);
    }

    #[test]
    fn test_data_quality_score_caps_at_100() {
        assert_eq!(data_quality_score(""), 0);
        assert_eq!(data_quality_score("three short words"), 6);
        let long = "word ".repeat(200);
        assert_eq!(data_quality_score(&long), 100);
    }

    #[test]
    fn test_apply_refinement_appends_history_and_marks_persona() {
        let original = fallback::fallback_personas(2)[0].clone();
        let refined_record = json!({
            "name": "Alex the Efficiency Expert",
            "tagline": "Sharper focus, same standards",
            "confidence_score": 0.9,
            "market_size": 32
        });

        let refined = apply_refinement(&original, &refined_record, "sharpen the tagline");

        assert!(refined.is_refined);
        assert_eq!(refined.tagline, "Sharper focus, same standards");
        assert_eq!(refined.refinement_history.len(), 1);
        assert_eq!(refined.refinement_history[0].feedback, "sharpen the tagline");
    }

    #[test]
    fn test_apply_refinement_ignores_model_supplied_history() {
        let mut original = fallback::fallback_personas(2)[0].clone();
        original.refinement_history.push(RefinementEntry::new("first pass".to_string()));

        let refined_record = json!({
            "name": "Alex",
            "refinement_history": [
                {"timestamp": "2020-01-01T00:00:00Z", "feedback": "hallucinated"}
            ]
        });

        let refined = apply_refinement(&original, &refined_record, "second pass");

        assert_eq!(refined.refinement_history.len(), 2);
        assert_eq!(refined.refinement_history[0].feedback, "first pass");
        assert_eq!(refined.refinement_history[1].feedback, "second pass");
    }
}
