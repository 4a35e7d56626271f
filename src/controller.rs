// ABOUTME: Screen controller for the deckforge application
// ABOUTME: Drives the home, loading, preview and error screens around one generation at a time

use crate::errors::{DeckError, Result};
use crate::generator::{Generator, EMPTY_PRESENTATION_MESSAGE, GENERATION_FAILED_MESSAGE};
use crate::schema::Presentation;
use log::{error, info, warn};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

/// The screen currently shown to the user
#[derive(Debug)]
pub enum Screen {
    Home,
    /// A generation is running; its outcome arrives on `receiver`
    Loading {
        topic: String,
        receiver: Receiver<Result<Presentation>>,
    },
    Preview {
        topic: String,
        presentation: Arc<Presentation>,
    },
    Error {
        message: String,
    },
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::Loading { .. } => "loading",
            Screen::Preview { .. } => "preview",
            Screen::Error { .. } => "error",
        }
    }
}

/// State machine over [`Screen`], owned by a single thread
pub struct ScreenController {
    screen: Screen,
    generator: Option<Arc<Generator>>,
}

impl ScreenController {
    pub fn new(generator: Generator) -> Self {
        Self {
            screen: Screen::Home,
            generator: Some(Arc::new(generator)),
        }
    }

    /// Start on the preview screen with an existing deck.
    ///
    /// Without a generator, going back to home works but a new topic
    /// cannot be submitted.
    pub fn with_presentation(
        topic: &str,
        presentation: Presentation,
        generator: Option<Generator>,
    ) -> Result<Self> {
        if presentation.is_empty() {
            return Err(DeckError::ValidationError(
                "Cannot preview a presentation without slides".to_string(),
            ));
        }
        Ok(Self {
            screen: Screen::Preview {
                topic: topic.trim().to_string(),
                presentation: Arc::new(presentation),
            },
            generator: generator.map(Arc::new),
        })
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.screen, Screen::Loading { .. })
    }

    pub fn topic(&self) -> Option<&str> {
        match &self.screen {
            Screen::Loading { topic, .. } | Screen::Preview { topic, .. } => Some(topic),
            Screen::Home | Screen::Error { .. } => None,
        }
    }

    pub fn presentation(&self) -> Option<Arc<Presentation>> {
        match &self.screen {
            Screen::Preview { presentation, .. } => Some(Arc::clone(presentation)),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.screen {
            Screen::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Submit a topic from the home screen and start generating in the background
    pub fn submit(&mut self, topic: &str) -> Result<()> {
        if !matches!(self.screen, Screen::Home) {
            return Err(self.rejected("submit"));
        }

        let topic = topic.trim();
        if topic.is_empty() {
            return Err(DeckError::EmptyTopic);
        }

        let generator = self.generator.clone().ok_or_else(|| {
            DeckError::ConfigError("No text model configured for generation".to_string())
        })?;

        let (sender, receiver) = mpsc::channel();
        let worker_topic = topic.to_string();
        thread::Builder::new()
            .name("generation".to_string())
            .spawn(move || {
                let result = generator.generate(&worker_topic);
                // The controller may be gone; nobody is left to tell
                let _ = sender.send(result);
            })
            .map_err(|e| DeckError::generation(GENERATION_FAILED_MESSAGE, e))?;

        info!("Generation started for topic {:?}", topic);
        self.screen = Screen::Loading {
            topic: topic.to_string(),
            receiver,
        };
        Ok(())
    }

    /// Apply the generation outcome if it has arrived. Returns true on a transition.
    pub fn poll(&mut self) -> bool {
        let outcome = match &self.screen {
            Screen::Loading { receiver, .. } => match receiver.try_recv() {
                Ok(result) => result,
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => Err(worker_lost()),
            },
            _ => return false,
        };
        self.complete(outcome);
        true
    }

    /// Block until the running generation finishes
    pub fn wait(&mut self) -> Result<()> {
        let outcome = match &self.screen {
            Screen::Loading { receiver, .. } => receiver.recv().unwrap_or_else(|_| Err(worker_lost())),
            _ => return Err(self.rejected("wait")),
        };
        self.complete(outcome);
        Ok(())
    }

    /// Leave the error screen for a fresh home screen
    pub fn retry(&mut self) -> Result<()> {
        match self.screen {
            Screen::Error { .. } => {
                self.screen = Screen::Home;
                Ok(())
            }
            _ => Err(self.rejected("retry")),
        }
    }

    /// Drop the current deck and return home
    pub fn back(&mut self) -> Result<()> {
        match self.screen {
            Screen::Preview { .. } => {
                info!("Discarding presentation");
                self.screen = Screen::Home;
                Ok(())
            }
            _ => Err(self.rejected("back")),
        }
    }

    fn complete(&mut self, outcome: Result<Presentation>) {
        let topic = match std::mem::replace(&mut self.screen, Screen::Home) {
            Screen::Loading { topic, .. } => topic,
            other => {
                self.screen = other;
                return;
            }
        };

        self.screen = match outcome {
            Ok(presentation) if !presentation.is_empty() => {
                info!(
                    "Presentation ready for {:?} with {} slides",
                    topic,
                    presentation.len()
                );
                Screen::Preview {
                    topic,
                    presentation: Arc::new(presentation),
                }
            }
            Ok(_) => {
                warn!("Generation for {:?} produced no slides", topic);
                Screen::Error {
                    message: EMPTY_PRESENTATION_MESSAGE.to_string(),
                }
            }
            Err(e) => {
                error!("Generation for {:?} failed: {}", topic, e);
                Screen::Error {
                    message: e.to_string(),
                }
            }
        };
    }

    fn rejected(&self, action: &str) -> DeckError {
        warn!("Rejected {} on the {} screen", action, self.screen.name());
        DeckError::InvalidTransition(format!(
            "cannot {} from the {} screen",
            action,
            self.screen.name()
        ))
    }
}

fn worker_lost() -> DeckError {
    DeckError::GenerationError {
        message: GENERATION_FAILED_MESSAGE.to_string(),
        source: None,
    }
}
