// ABOUTME: Configuration module for the deckforge application
// ABOUTME: Provides configuration settings and environment variable handling

use crate::errors::{DeckError, Result};
use crate::generator::GeneratorConfig;
use crate::pptx::PptxConfig;
use std::env;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://picsum.photos";

/// Global configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub temperature: f32,
    pub request_timeout_ms: u64,
    pub image_base_url: String,
    pub embed_images: bool,
    pub aspect_ratio: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            temperature: 0.7,
            request_timeout_ms: 120_000, // generation of a full deck is slow
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            embed_images: true,
            aspect_ratio: "16:9".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        let model = env::var("GEMINI_MODEL").unwrap_or(defaults.model);
        let api_base_url = env::var("GEMINI_BASE_URL").unwrap_or(defaults.api_base_url);
        let temperature = env::var("GEMINI_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse::<f32>().ok())
            .unwrap_or(defaults.temperature);
        let request_timeout_ms = env::var("REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.request_timeout_ms);
        let image_base_url = env::var("IMAGE_BASE_URL").unwrap_or(defaults.image_base_url);
        let embed_images = env::var("EMBED_IMAGES")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(defaults.embed_images);
        let aspect_ratio = env::var("ASPECT_RATIO").unwrap_or(defaults.aspect_ratio);
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        Self {
            api_key,
            model,
            api_base_url,
            temperature,
            request_timeout_ms,
            image_base_url,
            embed_images,
            aspect_ratio,
            port,
        }
    }

    /// The API credential, or a configuration error when it is not set
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(DeckError::ConfigError(
                "GEMINI_API_KEY (or API_KEY) environment variable not set".to_string(),
            )),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Get a generator configuration with defaults from this config
    pub fn get_generator_config(&self, temperature: Option<f32>) -> GeneratorConfig {
        GeneratorConfig {
            temperature: temperature.unwrap_or(self.temperature),
        }
    }

    /// Get a PPTX configuration with defaults from this config
    pub fn get_pptx_config(
        &self,
        title: Option<String>,
        aspect_ratio: Option<String>,
        embed_images: Option<bool>,
    ) -> PptxConfig {
        PptxConfig {
            title: title.unwrap_or_else(|| "Presentation".to_string()),
            aspect_ratio: aspect_ratio.unwrap_or_else(|| self.aspect_ratio.clone()),
            embed_images: embed_images.unwrap_or(self.embed_images),
            image_base_url: self.image_base_url.clone(),
            image_timeout: Duration::from_secs(10),
        }
    }
}
