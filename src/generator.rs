// ABOUTME: Presentation generator for the deckforge application
// ABOUTME: Builds the slide prompt, calls the text model and validates the answer

use crate::errors::{DeckError, Result};
use crate::gemini::{GenerationRequest, TextModel};
use crate::schema::{response_schema, Presentation};
use log::{error, info, warn};

/// Shown to the user for any failure of the AI call or its answer
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate presentation content from AI. The topic may be too complex or the service may be unavailable.";

/// Shown to the user when the AI answers with no slides at all
pub const EMPTY_PRESENTATION_MESSAGE: &str =
    "The generated presentation was empty. Please try a different topic.";

/// Slide count requested from the model; not enforced on the answer
pub const REQUESTED_SLIDES: std::ops::RangeInclusive<usize> = 7..=10;

/// Configuration for presentation generation
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub temperature: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self { temperature: 0.7 }
    }
}

/// Turns a topic into a presentation through a text model
pub struct Generator {
    model: Box<dyn TextModel>,
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(model: Box<dyn TextModel>, config: GeneratorConfig) -> Self {
        Self { model, config }
    }

    /// Generate a presentation for an already trimmed, non-empty topic
    pub fn generate(&self, topic: &str) -> Result<Presentation> {
        info!("Generating presentation for topic {:?}", topic);

        let request = GenerationRequest {
            prompt: build_prompt(topic),
            response_schema: response_schema(),
            temperature: self.config.temperature,
        };

        let text = self.model.generate_json(&request).map_err(|e| {
            error!("Error generating presentation: {}", e);
            DeckError::generation(GENERATION_FAILED_MESSAGE, e)
        })?;

        let presentation = Presentation::from_json(&text).map_err(|e| {
            error!("AI returned data in an unexpected format: {}", e);
            DeckError::generation(GENERATION_FAILED_MESSAGE, e)
        })?;

        if presentation.is_empty() {
            error!("AI returned a presentation without slides");
            return Err(DeckError::GenerationError {
                message: EMPTY_PRESENTATION_MESSAGE.to_string(),
                source: None,
            });
        }

        if !REQUESTED_SLIDES.contains(&presentation.len()) {
            warn!(
                "Model returned {} slides, asked for {} to {}",
                presentation.len(),
                REQUESTED_SLIDES.start(),
                REQUESTED_SLIDES.end()
            );
        }

        info!("Generated {} slides", presentation.len());
        Ok(presentation)
    }
}

/// Instruction template sent to the model for a topic
pub fn build_prompt(topic: &str) -> String {
    format!(
        r#"You are a presentation design assistant for a modern AI tool called DeckForge.
Your task is to generate a visually structured presentation outline based on the topic: "{topic}".
The goal is to produce slides that feel like high-end Canva or Pitch templates: clean, data-backed, and balanced between text, imagery, and whitespace.

Follow these rules strictly:
- Create between {min} and {max} slides.
- The first slide must be a 'title-only' layout, and the last slide should be a simple 'title-only' conclusion.
- Each slide must have a clear title, short bullet points, and a layout.
- For visual slides, provide a vivid, detailed text-to-image prompt for AI image generation.
- For data slides, specify an infographic type ('bar chart', 'timeline' or 'statistic highlight') and provide sample JSON-friendly data.
- Keep all text concise, clear, and impactful.
- The design aesthetic should be monochrome (black, white, gray).
- The output must be a single valid JSON object that strictly follows the provided schema."#,
        topic = topic,
        min = REQUESTED_SLIDES.start(),
        max = REQUESTED_SLIDES.end(),
    )
}
