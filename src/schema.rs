// ABOUTME: Slide schema shared by the generator, preview and exporter
// ABOUTME: Parses the flat AI wire format into typed slides and describes the response schema

use crate::errors::{DeckError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Composition template of a slide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    VisualLeft,
    VisualRight,
    DataCentric,
    TitleOnly,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::VisualLeft => "visual-left",
            Layout::VisualRight => "visual-right",
            Layout::DataCentric => "data-centric",
            Layout::TitleOnly => "title-only",
        }
    }

    pub fn is_visual(&self) -> bool {
        matches!(self, Layout::VisualLeft | Layout::VisualRight)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BarChartData {
    pub title: Option<String>,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl BarChartData {
    /// Label/value pairs, truncated to the shorter of the two arrays
    pub fn points(&self) -> Vec<(&str, f64)> {
        if self.labels.len() != self.values.len() {
            warn!(
                "Bar chart has {} labels but {} values, pairing the first {}",
                self.labels.len(),
                self.values.len(),
                self.labels.len().min(self.values.len())
            );
        }
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimelineData {
    pub title: Option<String>,
    pub years: Vec<String>,
    /// Event text per year, carried as `values` on the wire
    pub events: Vec<String>,
}

impl TimelineData {
    /// Year/event pairs, truncated to the shorter of the two arrays
    pub fn entries(&self) -> Vec<(&str, &str)> {
        if self.years.len() != self.events.len() {
            warn!(
                "Timeline has {} years but {} events, pairing the first {}",
                self.years.len(),
                self.events.len(),
                self.years.len().min(self.events.len())
            );
        }
        self.years
            .iter()
            .map(String::as_str)
            .zip(self.events.iter().map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatisticData {
    pub value: String,
    pub unit: String,
    pub title: String,
}

/// A data visualisation attached to a data-centric slide
#[derive(Debug, Clone, PartialEq)]
pub enum Infographic {
    BarChart(BarChartData),
    Timeline(TimelineData),
    StatisticHighlight(StatisticData),
    /// A kind this tool does not draw, kept by name
    Unsupported { kind: String },
}

impl Infographic {
    pub fn kind(&self) -> &str {
        match self {
            Infographic::BarChart(_) => "bar chart",
            Infographic::Timeline(_) => "timeline",
            Infographic::StatisticHighlight(_) => "statistic highlight",
            Infographic::Unsupported { kind } => kind,
        }
    }
}

/// One slide of a deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireSlide", into = "WireSlide")]
pub struct Slide {
    pub title: String,
    pub subtitle: Option<String>,
    pub bullets: Vec<String>,
    pub layout: Layout,
    pub image_prompt: String,
    pub infographic: Option<Infographic>,
}

impl Slide {
    pub fn new(title: &str, layout: Layout) -> Self {
        Self {
            title: title.to_string(),
            subtitle: None,
            bullets: Vec::new(),
            layout,
            image_prompt: String::new(),
            infographic: None,
        }
    }
}

/// An ordered deck of slides
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Presentation {
    pub slides: Vec<Slide>,
}

impl Presentation {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self { slides }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Parse a JSON document of the form `{"slides": [...]}`.
    ///
    /// The top level must be an object whose `slides` field is an array; each
    /// element must satisfy the slide schema. An empty array is accepted here,
    /// callers decide whether an empty deck is an error.
    pub fn from_json(text: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(text)?;

        let slides = match document.get("slides") {
            Some(Value::Array(slides)) => slides,
            Some(_) => {
                return Err(DeckError::SchemaError(
                    "`slides` is not an array".to_string(),
                ))
            }
            None => {
                return Err(DeckError::SchemaError(
                    "response has no `slides` field".to_string(),
                ))
            }
        };

        let mut parsed = Vec::with_capacity(slides.len());
        for (i, slide) in slides.iter().enumerate() {
            let slide: Slide = serde_json::from_value(slide.clone()).map_err(|e| {
                DeckError::SchemaError(format!("slide {}: {}", i + 1, e))
            })?;
            parsed.push(slide);
        }

        debug!("Parsed {} slides", parsed.len());
        Ok(Self { slides: parsed })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// Flat representation used by the AI service and by saved decks

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireSlide {
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subtitle: Option<String>,
    bullets: Vec<String>,
    layout: Layout,
    image_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    infographic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<WireData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    labels: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    years: Option<Vec<Value>>,
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn number_of(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or_else(|_| {
            warn!("Non-numeric chart value {:?}, using 0", s);
            0.0
        }),
        other => {
            warn!("Non-numeric chart value {}, using 0", other);
            0.0
        }
    }
}

fn texts(values: Option<Vec<Value>>) -> Vec<String> {
    values.unwrap_or_default().iter().map(text_of).collect()
}

fn infographic_from_wire(kind: &str, data: WireData) -> Infographic {
    let normalized = kind.trim().to_lowercase().replace(['-', '_'], " ");
    match normalized.as_str() {
        "bar chart" => Infographic::BarChart(BarChartData {
            title: data.title,
            labels: texts(data.labels),
            values: data.values.unwrap_or_default().iter().map(number_of).collect(),
        }),
        "timeline" => Infographic::Timeline(TimelineData {
            title: data.title,
            years: texts(data.years),
            events: texts(data.values),
        }),
        "statistic highlight" => Infographic::StatisticHighlight(StatisticData {
            value: data.value.as_ref().map(text_of).unwrap_or_default(),
            unit: data.unit.unwrap_or_default(),
            title: data.title.unwrap_or_default(),
        }),
        _ => Infographic::Unsupported {
            kind: kind.to_string(),
        },
    }
}

fn infographic_to_wire(infographic: Infographic) -> (String, Option<WireData>) {
    let kind = infographic.kind().to_string();
    let data = match infographic {
        Infographic::BarChart(chart) => Some(WireData {
            title: chart.title,
            labels: Some(chart.labels.into_iter().map(Value::String).collect()),
            values: Some(chart.values.into_iter().map(|v| json!(v)).collect()),
            ..WireData::default()
        }),
        Infographic::Timeline(timeline) => Some(WireData {
            title: timeline.title,
            years: Some(timeline.years.into_iter().map(Value::String).collect()),
            values: Some(timeline.events.into_iter().map(Value::String).collect()),
            ..WireData::default()
        }),
        Infographic::StatisticHighlight(stat) => Some(WireData {
            title: Some(stat.title),
            value: Some(Value::String(stat.value)),
            unit: Some(stat.unit),
            ..WireData::default()
        }),
        Infographic::Unsupported { .. } => Some(WireData::default()),
    };
    (kind, data)
}

impl From<WireSlide> for Slide {
    fn from(wire: WireSlide) -> Self {
        let infographic = match (wire.infographic, wire.data) {
            (Some(kind), Some(data)) if !kind.trim().is_empty() => {
                Some(infographic_from_wire(&kind, data))
            }
            (Some(kind), None) => {
                debug!("Infographic {:?} has no data, ignoring it", kind);
                None
            }
            _ => None,
        };

        Slide {
            title: wire.title,
            subtitle: wire.subtitle.filter(|s| !s.trim().is_empty()),
            bullets: wire.bullets,
            layout: wire.layout,
            image_prompt: wire.image_prompt,
            infographic,
        }
    }
}

impl From<Slide> for WireSlide {
    fn from(slide: Slide) -> Self {
        let (infographic, data) = match slide.infographic {
            Some(infographic) => {
                let (kind, data) = infographic_to_wire(infographic);
                (Some(kind), data)
            }
            None => (None, None),
        };

        WireSlide {
            title: slide.title,
            subtitle: slide.subtitle,
            bullets: slide.bullets,
            layout: slide.layout,
            image_prompt: slide.image_prompt,
            infographic,
            data,
        }
    }
}

/// Output schema handed to the AI service so it emits conforming JSON.
///
/// Uses the OpenAPI subset understood by Gemini's `responseSchema`.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "slides": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": {
                            "type": "STRING",
                            "description": "The concise, impactful title for the slide (3-7 words)."
                        },
                        "subtitle": {
                            "type": "STRING",
                            "description": "Optional. A short, supporting phrase for the title."
                        },
                        "bullets": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                            "description": "An array of 2-4 short, clear bullet points."
                        },
                        "layout": {
                            "type": "STRING",
                            "enum": ["visual-left", "visual-right", "data-centric", "title-only"],
                            "description": "Slide layout. Use 'title-only' for the first and last slide."
                        },
                        "image_prompt": {
                            "type": "STRING",
                            "description": "A descriptive prompt for an AI image generator, e.g. 'minimalist shot of a single green leaf on a white marble background'. Can be empty if layout is 'data-centric' or 'title-only'."
                        },
                        "infographic": {
                            "type": "STRING",
                            "nullable": true,
                            "description": "If layout is 'data-centric', choose one: 'bar chart', 'timeline', 'statistic highlight'. Otherwise, null."
                        },
                        "data": {
                            "type": "OBJECT",
                            "nullable": true,
                            "description": "The data for the infographic. Must be provided if 'infographic' is not null.",
                            "properties": {
                                "title": { "type": "STRING", "description": "Title for the infographic." },
                                "labels": { "type": "ARRAY", "items": { "type": "STRING" }, "description": "Labels for bar chart." },
                                "values": { "type": "ARRAY", "items": { "type": "NUMBER" }, "description": "Values for bar chart or timeline events as strings." },
                                "value": { "type": "STRING", "description": "Main value for a statistic highlight." },
                                "unit": { "type": "STRING", "description": "Unit for a statistic highlight (e.g., '%', 'M')." },
                                "years": { "type": "ARRAY", "items": { "type": "STRING" }, "description": "Years/time points for a timeline." }
                            }
                        }
                    },
                    "required": ["title", "bullets", "layout", "image_prompt"]
                }
            }
        },
        "required": ["slides"]
    })
}
