use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::core::error::{ChatError, Result};
use crate::core::providers::Provider;
use crate::ui::ansi::{BOLD, BLUE, CYAN, GREEN, RESET, RULE};

pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

/// Persisted client configuration. Rewritten after every menu action that
/// changes it; the file format stays compatible with `config.json` files
/// produced by earlier versions of this client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_version: Option<String>,
    pub api_key: String,
    pub model: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    #[serde(default)]
    pub use_streaming: bool,
    #[serde(default)]
    pub autosave: bool,
}

impl Config {
    pub fn load_from_path(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ChatError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = serde_json::from_str(&contents)
            .map_err(|e| ChatError::Config(format!("cannot parse {}: {e}", path.display())))?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Platform config location, falling back to the working directory when
    /// no home directory can be resolved.
    pub fn default_path() -> PathBuf {
        match ProjectDirs::from("org", "permacommons", "trichat") {
            Some(dirs) => dirs.config_dir().join("config.json"),
            None => PathBuf::from("config.json"),
        }
    }

    /// Recompute the chat endpoint after a provider or model change.
    pub fn refresh_url(&mut self) {
        self.url = self.provider.chat_url(&self.model);
    }

    /// Checked before a session starts; a failure here ends the process
    /// without entering the chat loop.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ChatError::Validation("API key is missing".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(ChatError::Validation("model is not selected".to_string()));
        }
        Ok(())
    }

    pub fn print_summary(&self) {
        println!("\n{CYAN}{RULE}{RESET}");
        println!("{BOLD}{BLUE}⚙️ Current Configuration:{RESET}");
        println!("  {GREEN}Provider:{RESET} {}", self.provider);
        println!("  {GREEN}Model:{RESET} {}", self.model);
        if let Some(version) = &self.anthropic_version {
            println!("  {GREEN}Anthropic Version:{RESET} {version}");
        }
        if let Some(app_name) = &self.app_name {
            println!("  {GREEN}App Name:{RESET} {app_name}");
        }
        if let Some(site_url) = &self.site_url {
            println!("  {GREEN}Site URL:{RESET} {site_url}");
        }
        println!(
            "  {GREEN}Autosave on exit:{RESET} {}",
            if self.autosave { "enabled" } else { "disabled" }
        );
        println!("{CYAN}{RULE}{RESET}\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_config() -> Config {
        Config {
            provider: Provider::OpenRouter,
            anthropic_version: None,
            api_key: "sk-or-test".to_string(),
            model: "openai/gpt-4o-mini".to_string(),
            url: Provider::OpenRouter.chat_url("openai/gpt-4o-mini"),
            app_name: Some("trichat".to_string()),
            site_url: None,
            use_streaming: true,
            autosave: false,
        }
    }

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = sample_config();
        config.save_to_path(&path).unwrap();
        let loaded = Config::load_from_path(&path).unwrap();

        assert_eq!(loaded.provider, Provider::OpenRouter);
        assert_eq!(loaded.model, config.model);
        assert_eq!(loaded.app_name, config.app_name);
        assert!(loaded.use_streaming);
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{
            "provider": "anthropic",
            "api_key": "sk-test",
            "model": "claude-3-5-haiku-20241022",
            "url": "https://api.anthropic.com/v1/messages"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.provider, Provider::Anthropic);
        assert!(!config.use_streaming);
        assert!(!config.autosave);
        assert!(config.anthropic_version.is_none());
    }

    #[test]
    fn validation_rejects_blank_key_and_model() {
        let mut config = sample_config();
        config.api_key = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ChatError::Validation(_))
        ));

        let mut config = sample_config();
        config.model = String::new();
        assert!(config.validate().is_err());

        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn refresh_url_tracks_gemini_model() {
        let mut config = sample_config();
        config.provider = Provider::Gemini;
        config.model = "gemini-2.5-pro".to_string();
        config.refresh_url();
        assert!(config.url.contains("gemini-2.5-pro:generateContent"));
    }
}
