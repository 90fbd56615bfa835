use crate::error::{NarravidError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default OpenRouter model for segment planning and image cues.
const DEFAULT_LLM_MODEL: &str = "openai/gpt-4o-mini";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub llm_model: String,
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openrouter_api_key: None,
            google_api_key: None,
            search_engine_id: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            concurrency: 4,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.openai_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
            config.openrouter_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            config.google_api_key = Some(key);
        }
        if let Ok(id) = std::env::var("SEARCH_ENGINE_ID") {
            config.search_engine_id = Some(id);
        }
        if let Ok(model) = std::env::var("NARRAVID_LLM_MODEL") {
            config.llm_model = model;
        }
        if let Ok(concurrency) = std::env::var("NARRAVID_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                config.concurrency = c;
            }
        }

        Ok(config)
    }

    /// Check that every stage the run needs has its credentials.
    pub fn validate(&self, needs_planner: bool, needs_images: bool) -> Result<()> {
        if self.openai_api_key.is_none() {
            return Err(NarravidError::Config(
                "OPENAI_API_KEY not set. Export it with: export OPENAI_API_KEY=sk-...".to_string(),
            ));
        }

        if (needs_planner || needs_images) && self.openrouter_api_key.is_none() {
            return Err(NarravidError::Config(
                "OPENROUTER_API_KEY not set. Get one at https://openrouter.ai/keys".to_string(),
            ));
        }

        if needs_images {
            if self.google_api_key.is_none() {
                return Err(NarravidError::Config(
                    "GOOGLE_API_KEY not set (required for image search)".to_string(),
                ));
            }
            if self.search_engine_id.is_none() {
                return Err(NarravidError::Config(
                    "SEARCH_ENGINE_ID not set (required for image search)".to_string(),
                ));
            }
        }

        if self.concurrency == 0 {
            return Err(NarravidError::Config(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("narravid").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm_model, DEFAULT_LLM_MODEL);
        assert_eq!(config.concurrency, 4);
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_validate_missing_openai_key() {
        let config = Config::default();
        assert!(config.validate(false, false).is_err());
    }

    #[test]
    fn test_validate_transcription_only() {
        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        assert!(config.validate(false, false).is_ok());
        // Planner and images still need their own keys
        assert!(config.validate(true, false).is_err());
        assert!(config.validate(false, true).is_err());
    }

    #[test]
    fn test_validate_full_pipeline() {
        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            openrouter_api_key: Some("or-test".to_string()),
            google_api_key: Some("g-test".to_string()),
            search_engine_id: Some("cx-test".to_string()),
            ..Default::default()
        };
        assert!(config.validate(true, true).is_ok());
    }

    #[test]
    fn test_validate_images_need_both_google_values() {
        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            openrouter_api_key: Some("or-test".to_string()),
            google_api_key: Some("g-test".to_string()),
            ..Default::default()
        };
        assert!(config.validate(false, true).is_err());
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate(false, false).is_err());
    }
}
