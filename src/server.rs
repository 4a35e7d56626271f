// ABOUTME: Web server module for the deckforge application
// ABOUTME: Serves the home, loading, preview and error screens for a single session

use crate::controller::{Screen, ScreenController};
use crate::errors::{DeckError, Result};
use crate::html;
use crate::images::PicsumResolver;
use crate::pptx::{self, PptxConfig};
use crate::preview::{self, DismissSignal, PreviewState};
use crate::utils;
use log::{debug, error, info, warn};
use std::io::{Cursor, Read};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// What a request resolves to, before it is written to the socket
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Html { status: u16, body: String },
    Redirect(String),
    Download { file_name: String, data: Vec<u8> },
    NotFound,
}

/// The single session behind the web UI
pub struct App {
    controller: ScreenController,
    resolver: PicsumResolver,
    pptx_config: PptxConfig,
}

impl App {
    pub fn new(controller: ScreenController, pptx_config: PptxConfig) -> Self {
        let resolver = PicsumResolver::new(&pptx_config.image_base_url);
        Self {
            controller,
            resolver,
            pptx_config,
        }
    }

    pub fn controller(&self) -> &ScreenController {
        &self.controller
    }

    /// Route one request. `url` is the raw request target, `body` the form body.
    pub fn handle(&mut self, method: &Method, url: &str, body: &str) -> Reply {
        let (path, query) = split_target(url);
        debug!("{} {} {:?}", method, path, query);

        match (method, path.as_str()) {
            (Method::Get, "/") => {
                self.controller.poll();
                let slide = query_value(&query, "slide").and_then(|value| value.parse().ok());
                let dismiss = query_value(&query, "dismiss").and_then(DismissSignal::from_query);
                self.render_current(slide, dismiss, None)
            }
            (Method::Post, "/generate") => {
                let topic = form_value(body, "topic").unwrap_or_default();
                match self.controller.submit(&topic) {
                    Ok(()) => Reply::Redirect("/".to_string()),
                    Err(DeckError::EmptyTopic) => Reply::Html {
                        status: 200,
                        body: html::home_page(Some("Please enter a topic.")),
                    },
                    Err(DeckError::InvalidTransition(_)) => Reply::Redirect("/".to_string()),
                    Err(e) => {
                        warn!("Could not start generation: {}", e);
                        Reply::Html {
                            status: 200,
                            body: html::home_page(Some(&e.to_string())),
                        }
                    }
                }
            }
            (Method::Post, "/back") => {
                let result = match self.controller.screen() {
                    Screen::Preview { .. } => self.controller.back(),
                    Screen::Error { .. } => self.controller.retry(),
                    _ => Ok(()),
                };
                if let Err(e) = result {
                    debug!("Ignoring back request: {}", e);
                }
                Reply::Redirect("/".to_string())
            }
            (Method::Get, "/export") => self.export(),
            _ => Reply::NotFound,
        }
    }

    fn render_current(
        &self,
        slide: Option<usize>,
        dismiss: Option<DismissSignal>,
        alert: Option<&str>,
    ) -> Reply {
        let page = match self.controller.screen() {
            Screen::Home => html::home_page(None),
            Screen::Loading { topic, .. } => html::loading_page(topic),
            Screen::Error { message } => html::error_page(message),
            Screen::Preview {
                topic,
                presentation,
            } => {
                let mut state = PreviewState::new();
                if let Some(index) = slide {
                    state.select(index, presentation.len());
                }
                if let Some(signal) = dismiss {
                    state.dismiss(signal);
                }
                preview::render_preview(topic, presentation, &state, &self.resolver)
            }
        };

        let body = match alert {
            Some(message) => html::with_alert(&page, message),
            None => page,
        };
        Reply::Html { status: 200, body }
    }

    fn export(&self) -> Reply {
        let (topic, presentation) = match self.controller.screen() {
            Screen::Preview {
                topic,
                presentation,
            } => (topic.clone(), presentation.clone()),
            _ => return Reply::Redirect("/".to_string()),
        };

        let config = PptxConfig {
            title: topic.clone(),
            ..self.pptx_config.clone()
        };

        match pptx::export_to_bytes(&presentation, &config, &self.resolver) {
            Ok(data) => {
                info!("Exported {} slides for download", presentation.len());
                Reply::Download {
                    file_name: utils::export_file_name(&topic),
                    data,
                }
            }
            Err(e) => {
                error!("Export failed: {}", e);
                let unavailable = DeckError::ExportUnavailable(e.to_string());
                self.render_current(None, None, Some(&unavailable.to_string()))
            }
        }
    }
}

/// Split a request target into its path and decoded query pairs
fn split_target(target: &str) -> (String, Vec<(String, String)>) {
    match url::Url::parse("http://localhost").and_then(|base| base.join(target)) {
        Ok(parsed) => (
            parsed.path().to_string(),
            parsed.query_pairs().into_owned().collect(),
        ),
        Err(_) => (target.to_string(), Vec::new()),
    }
}

fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn form_value(body: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(body.as_bytes())
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

pub(crate) fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|_| DeckError::ServerError(format!("Invalid header {}: {}", name, value)))
}

/// `Content-Disposition` for a download. Header values must be ASCII, so the
/// plain `filename` is a lossy fallback and `filename*` carries the UTF-8 name.
pub(crate) fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // form encoding leaves `*` alone and turns spaces into `+`; neither is valid here
    let encoded = url::form_urlencoded::byte_serialize(file_name.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace('*', "%2A");

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

pub(crate) fn download_response(
    file_name: &str,
    data: Vec<u8>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    Ok(Response::from_data(data)
        .with_header(header("Content-Type", PPTX_CONTENT_TYPE)?)
        .with_header(header(
            "Content-Disposition",
            &content_disposition(file_name),
        )?))
}

fn respond(request: Request, reply: Reply) -> Result<()> {
    let result = match reply {
        Reply::Html { status, body } => request.respond(
            Response::from_string(body)
                .with_status_code(StatusCode(status))
                .with_header(header("Content-Type", "text/html; charset=utf-8")?),
        ),
        Reply::Redirect(location) => request.respond(
            Response::empty(StatusCode(303)).with_header(header("Location", &location)?),
        ),
        Reply::Download { file_name, data } => {
            request.respond(download_response(&file_name, data)?)
        }
        Reply::NotFound => request
            .respond(Response::from_string("404 Not Found").with_status_code(StatusCode(404))),
    };
    result.map_err(|e| DeckError::ServerError(format!("Failed to send response: {}", e)))
}

/// Serve the app on `port` until the process is stopped
pub fn serve(mut app: App, port: u16) -> Result<()> {
    let server = Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| DeckError::ServerError(format!("Failed to start HTTP server: {}", e)))?;

    info!("HTTP server listening on http://localhost:{}", port);
    println!("DeckForge running on http://localhost:{}", port);

    for mut request in server.incoming_requests() {
        let mut body = String::new();
        if let Err(e) = request.as_reader().read_to_string(&mut body) {
            warn!("Failed to read request body: {}", e);
        }

        let method = request.method().clone();
        let url = request.url().to_string();
        let reply = app.handle(&method, &url, &body);

        if let Err(e) = respond(request, reply) {
            error!("{}", e);
        }
    }

    Ok(())
}
