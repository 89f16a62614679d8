use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use crate::llm_handler::LLMProvider;

pub const ENGINE_CONFIG_FILE: &str = "engine_config.json";

// Default prompts for the generation steps. Each template carries named
// placeholders that are substituted before the prompt is sent.
pub const DEFAULT_ANALYZE_SYSTEM_PROMPT: &str = "You are an expert marketing data analyst. You respond with valid JSON only, without any markdown formatting.";
pub const DEFAULT_ANALYZE_USER_PROMPT: &str = "Analyze this customer research data and product information:\n\nCUSTOMER DATA:\n{customer_data}\n\nPRODUCT INFO:\n{product_info}\n\nProvide a comprehensive analysis in JSON format with:\n1. Customer segments (3-4 distinct behavioral clusters)\n2. Key demographic patterns\n3. Pain points and motivations\n4. Communication preferences\n5. Market opportunities\n\nReturn only valid JSON without any markdown formatting.";

pub const DEFAULT_PERSONAS_SYSTEM_PROMPT: &str = "You are an expert marketing strategist who designs detailed customer personas. You respond with valid JSON only, without any markdown formatting.";
pub const DEFAULT_PERSONAS_USER_PROMPT: &str = "Based on this customer analysis data, create exactly {count} detailed marketing personas:\n\nANALYSIS DATA:\n{analysis}\n\nFor each persona, provide:\n1. Name and tagline\n2. Detailed demographics\n3. Psychographic profile\n4. Pain points and goals\n5. Preferred communication channels\n6. Confidence score (0-1), market size percentage, and business value\n\nReturn as JSON with a \"personas\" array containing exactly {count} personas. No markdown formatting.";

pub const DEFAULT_CAMPAIGNS_SYSTEM_PROMPT: &str = "You are an expert marketing strategist who builds campaign strategies for given personas. You respond with valid JSON only, without any markdown formatting.";
pub const DEFAULT_CAMPAIGNS_USER_PROMPT: &str = "Create comprehensive marketing campaign strategies for these personas:\n\nPERSONAS:\n{personas}\n\nFor each persona, create a campaign with:\n1. Campaign title and theme\n2. Core messaging strategy and value propositions\n3. Channel recommendations\n4. Content strategy\n5. ROI predictions, conversion rate, and payback period\n6. Success metrics and budget allocation\n\nReturn as JSON with a \"campaigns\" array. No markdown formatting.";

pub const DEFAULT_REFINE_SYSTEM_PROMPT: &str = "You are an expert marketing strategist who refines customer personas based on stakeholder feedback. You respond with valid JSON only, without any markdown formatting.";
pub const DEFAULT_REFINE_USER_PROMPT: &str = "Refine the following marketing persona according to the feedback. Keep the overall structure and every field, adjusting content where the feedback applies:\n\nPERSONA:\n{persona}\n\nFEEDBACK:\n{feedback}\n\nReturn as JSON with a \"personas\" array containing exactly one refined persona. No markdown formatting.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub llm_provider: Option<LLMProvider>,
    pub gemini_model: Option<String>,
    pub anthropic_model: Option<String>,
    pub openrouter_model: Option<String>,

    // User-configurable prompts
    pub analyze_system_prompt: Option<String>,
    pub analyze_user_prompt: Option<String>,
    pub personas_system_prompt: Option<String>,
    pub personas_user_prompt: Option<String>,
    pub campaigns_system_prompt: Option<String>,
    pub campaigns_user_prompt: Option<String>,
    pub refine_system_prompt: Option<String>,
    pub refine_user_prompt: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            llm_provider: None,
            gemini_model: None,
            anthropic_model: None,
            openrouter_model: None,

            analyze_system_prompt: Some(DEFAULT_ANALYZE_SYSTEM_PROMPT.to_string()),
            analyze_user_prompt: Some(DEFAULT_ANALYZE_USER_PROMPT.to_string()),
            personas_system_prompt: Some(DEFAULT_PERSONAS_SYSTEM_PROMPT.to_string()),
            personas_user_prompt: Some(DEFAULT_PERSONAS_USER_PROMPT.to_string()),
            campaigns_system_prompt: Some(DEFAULT_CAMPAIGNS_SYSTEM_PROMPT.to_string()),
            campaigns_user_prompt: Some(DEFAULT_CAMPAIGNS_USER_PROMPT.to_string()),
            refine_system_prompt: Some(DEFAULT_REFINE_SYSTEM_PROMPT.to_string()),
            refine_user_prompt: Some(DEFAULT_REFINE_USER_PROMPT.to_string()),
        }
    }
}

impl EngineConfig {
    pub fn analyze_prompts(&self) -> (&str, &str) {
        (
            self.analyze_system_prompt.as_deref().unwrap_or(DEFAULT_ANALYZE_SYSTEM_PROMPT),
            self.analyze_user_prompt.as_deref().unwrap_or(DEFAULT_ANALYZE_USER_PROMPT),
        )
    }

    pub fn personas_prompts(&self) -> (&str, &str) {
        (
            self.personas_system_prompt.as_deref().unwrap_or(DEFAULT_PERSONAS_SYSTEM_PROMPT),
            self.personas_user_prompt.as_deref().unwrap_or(DEFAULT_PERSONAS_USER_PROMPT),
        )
    }

    pub fn campaigns_prompts(&self) -> (&str, &str) {
        (
            self.campaigns_system_prompt.as_deref().unwrap_or(DEFAULT_CAMPAIGNS_SYSTEM_PROMPT),
            self.campaigns_user_prompt.as_deref().unwrap_or(DEFAULT_CAMPAIGNS_USER_PROMPT),
        )
    }

    pub fn refine_prompts(&self) -> (&str, &str) {
        (
            self.refine_system_prompt.as_deref().unwrap_or(DEFAULT_REFINE_SYSTEM_PROMPT),
            self.refine_user_prompt.as_deref().unwrap_or(DEFAULT_REFINE_USER_PROMPT),
        )
    }
}

pub struct EngineConfigManager {
    config_file: String,
    config: Mutex<EngineConfig>,
}

impl EngineConfigManager {
    pub fn new(config_file: &str) -> Self {
        Self {
            config_file: config_file.to_string(),
            config: Mutex::new(EngineConfig::default()),
        }
    }

    pub fn load_config(&self) -> io::Result<EngineConfig> {
        let config_path = Path::new(&self.config_file);

        // A missing file means the defaults apply
        if !config_path.exists() {
            return Ok(EngineConfig::default());
        }

        let config_str = fs::read_to_string(config_path)?;
        let config: EngineConfig = serde_json::from_str(&config_str)?;

        // Update the internal config
        let mut internal_config = self.config.lock().unwrap();
        *internal_config = config.clone();

        Ok(config)
    }

    pub fn save_config(&self, config: &EngineConfig) -> io::Result<()> {
        let config_str = serde_json::to_string_pretty(config)?;

        // Update the internal config
        let mut internal_config = self.config.lock().unwrap();
        *internal_config = config.clone();

        // Create the directory if it doesn't exist
        if let Some(parent) = Path::new(&self.config_file).parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.config_file, config_str)?;

        Ok(())
    }

    pub fn get_config(&self) -> EngineConfig {
        self.config.lock().unwrap().clone()
    }
}

/// Substitute the named placeholders of a prompt template.
pub fn render_template(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (name, value) in substitutions {
        rendered = rendered.replace(&format!("{{{}}}", name), value);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine_config.json");
        let manager = EngineConfigManager::new(path.to_str().unwrap());

        let config = manager.load_config().unwrap();
        assert_eq!(config.analyze_system_prompt.as_deref(), Some(DEFAULT_ANALYZE_SYSTEM_PROMPT));
        assert!(config.llm_provider.is_none());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine_config.json");
        let manager = EngineConfigManager::new(path.to_str().unwrap());

        let mut config = EngineConfig::default();
        config.gemini_model = Some("gemini-1.5-pro".to_string());
        manager.save_config(&config).unwrap();

        let reloaded = manager.load_config().unwrap();
        assert_eq!(reloaded.gemini_model.as_deref(), Some("gemini-1.5-pro"));
    }

    #[test]
    fn test_render_template_substitutes_named_placeholders() {
        let rendered = render_template(
            "make {count} personas from {analysis}",
            &[("count", "3"), ("analysis", "{\"segments\": []}")],
        );
        assert_eq!(rendered, "make 3 personas from {\"segments\": []}");
    }
}
