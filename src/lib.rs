// ABOUTME: Library module for the deckforge program.
// ABOUTME: Contains slide generation, preview rendering and PPTX export.

// Reexport modules
pub mod chart;
pub mod config;
pub mod controller;
pub mod errors;
pub mod gemini;
pub mod generator;
pub mod html;
pub mod images;
pub mod pptx;
pub mod preview;
pub mod schema;
pub mod server;
pub mod utils;

// Reexport common types and functions
pub use config::Config;
pub use controller::{Screen, ScreenController};
pub use errors::{DeckError, Result};
pub use gemini::{GeminiClient, GenerationRequest, TextModel};
pub use generator::{Generator, GeneratorConfig};
pub use images::{image_seed, ImageResolver, ImageSize, PicsumResolver};
pub use pptx::{export_presentation, export_to_bytes, export_to_file, PptxConfig};
pub use preview::{render_preview, DismissSignal, PreviewState};
pub use schema::{Infographic, Layout, Presentation, Slide};
pub use server::{serve, App};
pub use utils::export_file_name;

#[cfg(test)]
mod tests;
