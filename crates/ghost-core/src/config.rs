use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::dispatch::Route;

pub const DEFAULT_TEXT_ENDPOINT: &str = "https://backend.buildpicoapps.com/aero/run/llm-api?pk=v1-Z0FBQUFBQm5HUEtMSjJkakVjcF9IQ0M0VFhRQ0FmSnNDSHNYTlJSblE0UXo1Q3RBcjFPcl9YYy1OZUhteDZWekxHdWRLM1M1alNZTkJMWEhNOWd4S1NPSDBTWC12M0U2UGc9PQ==";
pub const DEFAULT_IMAGE_ENDPOINT: &str = "https://backend.buildpicoapps.com/aero/run/image-generation-api?pk=v1-Z0FBQUFBQm5HUEtMSjJkakVjcF9IQ0M0VFhRQ0FmSnNDSHNYTlJSblE0UXo1Q3RBcjFPcl9YYy1OZUhteDZWekxHdWRLM1M1alNZTkJMWEhNOWd4S1NPSDBTWC12M0U2UGc9PQ==";

pub const TEXT_ENDPOINT_ENV: &str = "GHOST_TEXT_ENDPOINT";
pub const IMAGE_ENDPOINT_ENV: &str = "GHOST_IMAGE_ENDPOINT";

/// Persisted user settings.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub text_endpoint: Option<String>,
    pub image_endpoint: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("ghost").join("config.json"))
    }
}

/// The two remote URLs a prompt can be routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub text: String,
    pub image: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT_ENDPOINT.to_string(),
            image: DEFAULT_IMAGE_ENDPOINT.to_string(),
        }
    }
}

impl Endpoints {
    /// Environment variables win over the config file, which wins over the defaults.
    pub fn from_config(config: &Config) -> Self {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    pub fn resolve_with(config: &Config, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let pick = |key: &str, file: &Option<String>, default: String| {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file.clone())
                .unwrap_or(default)
        };

        Self {
            text: pick(TEXT_ENDPOINT_ENV, &config.text_endpoint, defaults.text),
            image: pick(IMAGE_ENDPOINT_ENV, &config.image_endpoint, defaults.image),
        }
    }

    pub fn with_overrides(mut self, text: Option<String>, image: Option<String>) -> Self {
        if let Some(text) = text {
            self.text = text;
        }
        if let Some(image) = image {
            self.image = image;
        }
        self
    }

    pub fn url_for(&self, route: Route) -> &str {
        match route {
            Route::Text => &self.text,
            Route::Image => &self.image,
        }
    }
}
