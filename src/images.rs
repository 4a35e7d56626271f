// ABOUTME: Image handling for the deckforge application
// ABOUTME: Derives placeholder image URLs from slide prompts and fetches them for embedding

use crate::errors::{DeckError, Result};
use image::ImageFormat;
use log::{debug, info};
use reqwest::blocking::Client;
use std::time::Duration;

/// Longest seed kept from an image prompt
pub const SEED_LENGTH: usize = 10;

/// Requested image resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    /// Card thumbnails
    Small,
    /// Detail view and export
    Large,
}

impl ImageSize {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ImageSize::Small => (400, 300),
            ImageSize::Large => (1280, 720),
        }
    }
}

/// Deterministic seed for an image prompt: its ASCII alphanumerics, capped.
///
/// The same prompt always yields the same seed, so preview and export show
/// the same picture.
pub fn image_seed(image_prompt: &str) -> String {
    image_prompt
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(SEED_LENGTH)
        .collect()
}

/// Resolves a seed string to an image URL
pub trait ImageResolver: Send + Sync {
    fn url(&self, seed: &str, size: ImageSize) -> String;
}

/// Placeholder images from a picsum-compatible service
#[derive(Debug, Clone)]
pub struct PicsumResolver {
    pub base_url: String,
}

impl PicsumResolver {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl ImageResolver for PicsumResolver {
    fn url(&self, seed: &str, size: ImageSize) -> String {
        let (width, height) = size.dimensions();
        format!("{}/seed/{}/{}/{}", self.base_url, seed, width, height)
    }
}

/// Downloaded image bytes ready to be stored in a package
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
}

impl FetchedImage {
    /// Check the bytes decode as an image and remember their format
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let format = image::guess_format(&data)
            .map_err(|e| DeckError::ImageError(format!("Unknown image format: {}", e)))?;
        image::load_from_memory_with_format(&data, format)
            .map_err(|e| DeckError::ImageError(format!("Failed to decode image: {}", e)))?;
        Ok(Self { data, format })
    }

    pub fn extension(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::WebP => "webp",
            ImageFormat::Tiff => "tiff",
            _ => "jpeg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self.extension() {
            "png" => "image/png",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "webp" => "image/webp",
            "tiff" => "image/tiff",
            _ => "image/jpeg",
        }
    }
}

/// Fetches image bytes over HTTP with retry
pub struct ImageFetcher {
    client: Client,
    attempts: u32,
    initial_delay: Duration,
}

impl ImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DeckError::FetchError)?;
        Ok(Self {
            client,
            attempts: 3,
            initial_delay: Duration::from_millis(500),
        })
    }

    /// Fetch and validate an image, retrying with exponential backoff
    pub fn fetch(&self, url: &str) -> Result<FetchedImage> {
        info!("Fetching image: {}", url);

        let mut retry_delay = self.initial_delay;
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            match self.client.get(url).send() {
                Ok(response) => {
                    if response.status().is_success() {
                        let bytes = response.bytes().map_err(DeckError::FetchError)?;
                        return FetchedImage::from_bytes(bytes.to_vec());
                    }
                    last_error = Some(DeckError::ImageError(format!(
                        "HTTP error: {}",
                        response.status()
                    )));
                }
                Err(e) => {
                    last_error = Some(DeckError::FetchError(e));
                }
            }

            if attempt < self.attempts {
                debug!(
                    "Fetch attempt {} failed, retrying in {} ms",
                    attempt,
                    retry_delay.as_millis()
                );
                std::thread::sleep(retry_delay);
                retry_delay *= 2;
            }
        }

        Err(last_error
            .unwrap_or_else(|| DeckError::ImageError("Unknown error fetching image".to_string())))
    }
}
