use super::*;
use crate::generator::{EMPTY_PRESENTATION_MESSAGE, GENERATION_FAILED_MESSAGE};
use crate::schema::{BarChartData, StatisticData, TimelineData};
use serde_json::{json, Value};
use std::io::{Cursor, Read};
use tempfile::TempDir;
use tiny_http::Method;
use zip::ZipArchive;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Answers every request with a fixed text, or fails like an unavailable service
struct MockModel {
    answer: Option<String>,
}

impl TextModel for MockModel {
    fn generate_json(&self, _request: &GenerationRequest) -> Result<String> {
        match &self.answer {
            Some(answer) => Ok(answer.clone()),
            None => Err(DeckError::ModelError(
                "Gemini API error (503 Service Unavailable): overloaded".to_string(),
            )),
        }
    }
}

struct PanickingModel;

impl TextModel for PanickingModel {
    fn generate_json(&self, _request: &GenerationRequest) -> Result<String> {
        panic!("model crashed");
    }
}

fn generator_answering(answer: Option<String>) -> Generator {
    Generator::new(Box::new(MockModel { answer }), GeneratorConfig::default())
}

fn slide_json(title: &str, layout: &str) -> Value {
    match layout {
        "title-only" => json!({
            "title": title,
            "subtitle": format!("About {}", title),
            "bullets": [],
            "layout": layout,
            "image_prompt": ""
        }),
        "data-centric" => json!({
            "title": title,
            "bullets": ["Growth is steady"],
            "layout": layout,
            "image_prompt": "",
            "infographic": "bar chart",
            "data": { "title": "Output", "labels": ["2022", "2023"], "values": [10, 20] }
        }),
        _ => json!({
            "title": title,
            "bullets": ["First point", "Second point", "Third point", "Fourth point"],
            "layout": layout,
            "image_prompt": format!("minimalist photo of {}", title)
        }),
    }
}

/// A deck of `count` slides, title-only first and last
fn deck_json(count: usize) -> String {
    let layouts = ["visual-left", "visual-right", "data-centric"];
    let slides: Vec<Value> = (0..count)
        .map(|i| {
            let title = format!("Slide {}", i + 1);
            if i == 0 || i + 1 == count {
                slide_json(&title, "title-only")
            } else {
                slide_json(&title, layouts[i % layouts.len()])
            }
        })
        .collect();
    json!({ "slides": slides }).to_string()
}

fn deck(count: usize) -> Presentation {
    Presentation::from_json(&deck_json(count)).unwrap()
}

fn offline_pptx_config() -> PptxConfig {
    PptxConfig {
        title: "Test Deck".to_string(),
        embed_images: false,
        ..PptxConfig::default()
    }
}

fn picsum() -> PicsumResolver {
    PicsumResolver::new("https://picsum.photos")
}

/// Export without fetching images
fn offline_pptx(presentation: &Presentation) -> Vec<u8> {
    export_to_bytes(presentation, &offline_pptx_config(), &picsum()).unwrap()
}

fn part_names(pptx: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(pptx)).unwrap();
    archive.file_names().map(String::from).collect()
}

fn read_part(pptx: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(pptx)).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut content = String::new();
    part.read_to_string(&mut content).unwrap();
    content
}

fn slide_part_count(pptx: &[u8]) -> usize {
    part_names(pptx)
        .iter()
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .count()
}

// Schema

#[test]
fn test_parse_full_slide() {
    let text = json!({
        "slides": [{
            "title": "The Numbers",
            "bullets": ["a", "b"],
            "layout": "data-centric",
            "image_prompt": "",
            "infographic": "statistic highlight",
            "data": { "title": "of energy is solar", "value": 42, "unit": "%" }
        }]
    })
    .to_string();

    let presentation = Presentation::from_json(&text).unwrap();
    assert_eq!(presentation.len(), 1);
    let slide = &presentation.slides[0];
    assert_eq!(slide.layout, Layout::DataCentric);
    assert_eq!(
        slide.infographic,
        Some(Infographic::StatisticHighlight(StatisticData {
            value: "42".to_string(),
            unit: "%".to_string(),
            title: "of energy is solar".to_string(),
        }))
    );
}

#[test]
fn test_parse_rejects_missing_slides_field() {
    let err = Presentation::from_json(r#"{"deck": []}"#).unwrap_err();
    assert!(matches!(err, DeckError::SchemaError(_)));
}

#[test]
fn test_parse_rejects_slides_not_array() {
    let err = Presentation::from_json(r#"{"slides": "none"}"#).unwrap_err();
    assert!(matches!(err, DeckError::SchemaError(_)));
}

#[test]
fn test_parse_rejects_unknown_layout() {
    let text = json!({
        "slides": [{ "title": "x", "bullets": [], "layout": "two-column", "image_prompt": "" }]
    })
    .to_string();
    let err = Presentation::from_json(&text).unwrap_err();
    assert!(err.to_string().contains("slide 1"));
}

#[test]
fn test_parse_rejects_missing_bullets() {
    let text = json!({
        "slides": [{ "title": "x", "layout": "title-only", "image_prompt": "" }]
    })
    .to_string();
    assert!(Presentation::from_json(&text).is_err());
}

#[test]
fn test_parse_infographic_without_data_is_dropped() {
    let text = json!({
        "slides": [{
            "title": "x", "bullets": [], "layout": "data-centric",
            "image_prompt": "", "infographic": "bar chart", "data": null
        }]
    })
    .to_string();
    let presentation = Presentation::from_json(&text).unwrap();
    assert_eq!(presentation.slides[0].infographic, None);
}

#[test]
fn test_parse_unknown_infographic_kind_is_kept() {
    let text = json!({
        "slides": [{
            "title": "x", "bullets": [], "layout": "data-centric",
            "image_prompt": "", "infographic": "pie chart", "data": { "labels": ["a"] }
        }]
    })
    .to_string();
    let presentation = Presentation::from_json(&text).unwrap();
    assert_eq!(
        presentation.slides[0].infographic,
        Some(Infographic::Unsupported {
            kind: "pie chart".to_string()
        })
    );
}

#[test]
fn test_parse_bar_chart_tolerates_string_values() {
    let text = json!({
        "slides": [{
            "title": "x", "bullets": [], "layout": "data-centric", "image_prompt": "",
            "infographic": "bar_chart",
            "data": { "labels": ["a", "b", "c"], "values": ["1,5", "2.5", 7] }
        }]
    })
    .to_string();
    let presentation = Presentation::from_json(&text).unwrap();
    match &presentation.slides[0].infographic {
        Some(Infographic::BarChart(data)) => assert_eq!(data.values, vec![0.0, 2.5, 7.0]),
        other => panic!("expected a bar chart, got {:?}", other),
    }
}

#[test]
fn test_parse_timeline_events_from_values() {
    let text = json!({
        "slides": [{
            "title": "x", "bullets": [], "layout": "data-centric", "image_prompt": "",
            "infographic": "timeline",
            "data": { "years": ["1969", 1971], "values": ["Moon landing", "First space station"] }
        }]
    })
    .to_string();
    let presentation = Presentation::from_json(&text).unwrap();
    match &presentation.slides[0].infographic {
        Some(Infographic::Timeline(data)) => {
            assert_eq!(data.years, vec!["1969", "1971"]);
            assert_eq!(data.entries()[1], ("1971", "First space station"));
        }
        other => panic!("expected a timeline, got {:?}", other),
    }
}

#[test]
fn test_saved_deck_reloads() {
    let presentation = deck(5);
    let saved = presentation.to_json_pretty().unwrap();
    assert!(saved.contains("\"image_prompt\""));
    assert_eq!(Presentation::from_json(&saved).unwrap(), presentation);
}

#[test]
fn test_response_schema_lists_layouts() {
    let schema = schema::response_schema();
    let layouts = &schema["properties"]["slides"]["items"]["properties"]["layout"]["enum"];
    assert_eq!(layouts.as_array().map(|a| a.len()), Some(4));
    assert_eq!(schema["required"], json!(["slides"]));
}

// Generator

#[test]
fn test_generate_accepts_slide_counts_outside_requested_range() {
    init_logger();
    for count in [6, 7, 10, 11] {
        let generator = generator_answering(Some(deck_json(count)));
        let presentation = generator.generate("Mars Colonization").unwrap();
        assert_eq!(presentation.len(), count);
    }
}

#[test]
fn test_generate_empty_deck_is_an_error() {
    let generator = generator_answering(Some(r#"{"slides": []}"#.to_string()));
    let err = generator.generate("Anything").unwrap_err();
    assert_eq!(err.to_string(), EMPTY_PRESENTATION_MESSAGE);
}

#[test]
fn test_generate_wraps_model_failure() {
    let generator = generator_answering(None);
    let err = generator.generate("Anything").unwrap_err();
    assert_eq!(err.to_string(), GENERATION_FAILED_MESSAGE);
    let source = std::error::Error::source(&err).map(|s| s.to_string());
    assert!(source.unwrap_or_default().contains("503"));
}

#[test]
fn test_generate_wraps_invalid_json() {
    let generator = generator_answering(Some("Here is your deck!".to_string()));
    let err = generator.generate("Anything").unwrap_err();
    assert!(matches!(err, DeckError::GenerationError { .. }));
    assert_eq!(err.to_string(), GENERATION_FAILED_MESSAGE);
}

#[test]
fn test_prompt_embeds_topic() {
    let prompt = generator::build_prompt("Deep Sea Mining");
    assert!(prompt.contains("\"Deep Sea Mining\""));
    assert!(prompt.contains("between 7 and 10 slides"));
}

// Gemini

#[test]
fn test_extract_text_joins_parts() {
    let body = json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": "{\"slides\":" }, { "text": " []}" }] } }]
    })
    .to_string();
    assert_eq!(gemini::extract_text(&body).unwrap(), "{\"slides\": []}");
}

#[test]
fn test_extract_text_reports_block_reason() {
    let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } }).to_string();
    let err = gemini::extract_text(&body).unwrap_err();
    assert!(matches!(err, DeckError::ModelError(_)));
    assert!(err.to_string().starts_with("AI service error:"));
    assert!(err.to_string().contains("SAFETY"));
}

#[test]
fn test_extract_text_requires_candidates() {
    let err = gemini::extract_text(r#"{"candidates": []}"#).unwrap_err();
    assert!(matches!(err, DeckError::ModelError(_)));
    assert!(err.to_string().contains("no candidates"));

    let body = json!({ "candidates": [{ "content": { "parts": [{ "text": "  " }] } }] }).to_string();
    let err = gemini::extract_text(&body).unwrap_err();
    assert!(matches!(err, DeckError::ModelError(_)));
    assert!(!err.to_string().contains("Input validation"));
}

#[test]
fn test_gemini_client_requires_api_key() {
    let config = Config::default();
    assert!(matches!(
        GeminiClient::new(&config),
        Err(DeckError::ConfigError(_))
    ));

    let config = Config {
        api_key: Some("test-key".to_string()),
        api_base_url: "http://localhost:9999/v1beta/".to_string(),
        ..Config::default()
    };
    let client = GeminiClient::new(&config).unwrap();
    assert_eq!(
        client.endpoint(),
        "http://localhost:9999/v1beta/models/gemini-2.5-pro:generateContent"
    );
}

// Images and naming

#[test]
fn test_image_seed_is_deterministic() {
    let prompt = "A lone astronaut, on red dunes at dusk!";
    assert_eq!(image_seed(prompt), "Aloneastro");
    assert_eq!(image_seed(prompt), image_seed(prompt));
    assert_eq!(image_seed("!!! ..."), "");

    let resolver = PicsumResolver::new("https://picsum.photos/");
    let seed = image_seed(prompt);
    assert_eq!(
        resolver.url(&seed, ImageSize::Large),
        "https://picsum.photos/seed/Aloneastro/1280/720"
    );
    assert_eq!(
        resolver.url(&seed, ImageSize::Small),
        "https://picsum.photos/seed/Aloneastro/400/300"
    );
}

#[test]
fn test_export_file_name() {
    assert_eq!(
        export_file_name("Mars Colonization"),
        "mars_colonization_presentation.pptx"
    );
    assert_eq!(export_file_name("AI/ML Basics"), "ai_ml_basics_presentation.pptx");
}

#[test]
fn test_fetched_image_rejects_garbage() {
    let result = images::FetchedImage::from_bytes(b"not an image".to_vec());
    assert!(matches!(result, Err(DeckError::ImageError(_))));
}

// Export

#[test]
fn test_export_slide_part_count_matches_deck() {
    init_logger();
    for count in [1, 7, 10] {
        let pptx = offline_pptx(&deck(count));
        assert_eq!(slide_part_count(&pptx), count);
    }
}

#[test]
fn test_export_preserves_slide_order() {
    let presentation = deck(8);
    let pptx = offline_pptx(&presentation);
    for (i, slide) in presentation.slides.iter().enumerate() {
        let xml = read_part(&pptx, &format!("ppt/slides/slide{}.xml", i + 1));
        assert!(
            xml.contains(&format!("<a:t>{}</a:t>", slide.title)),
            "slide {} should carry its own title",
            i + 1
        );
    }
}

#[test]
fn test_export_uses_layout_templates() {
    let pptx = offline_pptx(&deck(4));
    let first = read_part(&pptx, "ppt/slides/_rels/slide1.xml.rels");
    let second = read_part(&pptx, "ppt/slides/_rels/slide2.xml.rels");
    assert!(first.contains("slideLayouts/slideLayout1.xml"));
    assert!(second.contains("slideLayouts/slideLayout2.xml"));

    let title_layout = read_part(&pptx, "ppt/slideLayouts/slideLayout1.xml");
    assert!(title_layout.contains("TITLE_SLIDE"));
    assert!(read_part(&pptx, "ppt/slideLayouts/slideLayout2.xml").contains("CONTENT_SLIDE"));
}

#[test]
fn test_export_without_title_slides_at_the_ends() {
    let presentation = Presentation::new(vec![
        Slide::new("Opening visual", Layout::VisualRight),
        Slide::new("Closing numbers", Layout::DataCentric),
    ]);

    let pptx = offline_pptx(&presentation);
    assert_eq!(slide_part_count(&pptx), 2);

    let resolver = PicsumResolver::new("https://picsum.photos");
    let page = render_preview("Edge", &presentation, &PreviewState::new(), &resolver);
    assert!(page.contains("Opening visual"));
    assert!(page.contains("Closing numbers"));
}

#[test]
fn test_export_empty_presentation_is_rejected() {
    let result = export_to_bytes(&Presentation::default(), &offline_pptx_config(), &picsum());
    assert!(matches!(result, Err(DeckError::ValidationError(_))));
}

#[test]
fn test_export_links_images_when_not_embedding() {
    let mut slide = Slide::new("Forest", Layout::VisualLeft);
    slide.image_prompt = "misty pine forest".to_string();
    slide.bullets = vec!["Trees".to_string()];

    let pptx = offline_pptx(&Presentation::new(vec![slide]));
    let rels = read_part(&pptx, "ppt/slides/_rels/slide1.xml.rels");
    assert!(rels.contains("https://picsum.photos/seed/mistypinef/1280/720"));
    assert!(rels.contains("TargetMode=\"External\""));
    assert!(read_part(&pptx, "ppt/slides/slide1.xml").contains("r:link=\"rId2\""));
    assert!(!part_names(&pptx).iter().any(|name| name.starts_with("ppt/media/")));
}

/// Serves every image from one local path
struct LocalResolver;

impl ImageResolver for LocalResolver {
    fn url(&self, seed: &str, size: ImageSize) -> String {
        format!("http://assets.local/{}/{:?}.jpg", seed, size)
    }
}

#[test]
fn test_export_uses_given_image_resolver() {
    let mut slide = Slide::new("Forest", Layout::VisualLeft);
    slide.image_prompt = "misty pine forest".to_string();
    let presentation = Presentation::new(vec![slide]);

    let pptx = export_to_bytes(&presentation, &offline_pptx_config(), &LocalResolver).unwrap();
    let rels = read_part(&pptx, "ppt/slides/_rels/slide1.xml.rels");
    assert!(rels.contains("http://assets.local/mistypinef/"));
    assert!(!rels.contains("picsum.photos"));

    let mut state = PreviewState::new();
    state.select(0, presentation.len());
    let page = render_preview("Forest", &presentation, &state, &LocalResolver);
    assert!(page.contains("http://assets.local/mistypinef/"));
}

#[test]
fn test_export_skips_image_for_empty_seed() {
    let mut slide = Slide::new("Abstract", Layout::VisualRight);
    slide.image_prompt = "   ".to_string();

    let pptx = offline_pptx(&Presentation::new(vec![slide]));
    assert!(!read_part(&pptx, "ppt/slides/slide1.xml").contains("<p:pic>"));
}

#[test]
fn test_export_bar_chart_truncates_mismatched_arrays() {
    let mut slide = Slide::new("Revenue", Layout::DataCentric);
    slide.infographic = Some(Infographic::BarChart(BarChartData {
        title: None,
        labels: vec!["Q1".to_string(), "Q2".to_string(), "Q3".to_string()],
        values: vec![1200.0, 3400.0],
    }));

    let pptx = offline_pptx(&Presentation::new(vec![slide]));
    let chart = read_part(&pptx, "ppt/charts/chart1.xml");
    assert_eq!(chart.matches(r#"<c:ptCount val="2"/>"#).count(), 2);
    assert!(!chart.contains("Q3"));
    assert!(chart.contains("<c:v>Data</c:v>"));
    assert!(chart.contains(r##"formatCode="#,##0""##));
    assert!(!chart.contains("<c:legend>"));

    let content_types = read_part(&pptx, "[Content_Types].xml");
    assert!(content_types.contains("/ppt/charts/chart1.xml"));
}

#[test]
fn test_export_timeline_truncates_mismatched_arrays() {
    let mut slide = Slide::new("History", Layout::DataCentric);
    slide.infographic = Some(Infographic::Timeline(TimelineData {
        title: Some("Milestones".to_string()),
        years: vec!["1990".to_string(), "2000".to_string(), "2010".to_string()],
        events: vec!["Start".to_string(), "Growth".to_string()],
    }));

    let pptx = offline_pptx(&Presentation::new(vec![slide]));
    let xml = read_part(&pptx, "ppt/slides/slide1.xml");
    assert!(xml.contains("<a:t>2000</a:t>"));
    assert!(xml.contains("<a:t>Growth</a:t>"));
    assert!(!xml.contains("<a:t>2010</a:t>"));
    assert!(xml.contains("<p:cxnSp>"));
}

#[test]
fn test_export_statistic_and_escaping() {
    let mut slide = Slide::new("R&D <spend>", Layout::DataCentric);
    slide.infographic = Some(Infographic::StatisticHighlight(StatisticData {
        value: "85".to_string(),
        unit: "%".to_string(),
        title: "of budget".to_string(),
    }));

    let pptx = offline_pptx(&Presentation::new(vec![slide]));
    let xml = read_part(&pptx, "ppt/slides/slide1.xml");
    assert!(xml.contains("<a:t>85%</a:t>"));
    assert!(xml.contains("sz=\"8000\""));
    assert!(xml.contains("R&amp;D &lt;spend&gt;"));
}

#[test]
fn test_export_skips_unsupported_infographic() {
    let mut slide = Slide::new("Share", Layout::DataCentric);
    slide.infographic = Some(Infographic::Unsupported {
        kind: "pie chart".to_string(),
    });

    let pptx = offline_pptx(&Presentation::new(vec![slide]));
    assert_eq!(slide_part_count(&pptx), 1);
    assert!(!part_names(&pptx).iter().any(|name| name.starts_with("ppt/charts/")));
}

#[test]
fn test_export_slide_size_follows_aspect_ratio() {
    let config = PptxConfig {
        aspect_ratio: "4:3".to_string(),
        ..offline_pptx_config()
    };
    let pptx = export_to_bytes(&deck(1), &config, &picsum()).unwrap();
    assert!(read_part(&pptx, "ppt/presentation.xml")
        .contains(r#"<p:sldSz cx="9144000" cy="6858000"/>"#));

    let config = PptxConfig {
        aspect_ratio: "21:9".to_string(),
        ..offline_pptx_config()
    };
    assert_eq!(config.slide_size(), (9_144_000, 5_143_500));
}

#[test]
fn test_export_to_file_names_output_after_topic() {
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("decks");

    let path = export_to_file(
        &deck(3),
        "Mars Colonization",
        &output_dir,
        &offline_pptx_config(),
        &picsum(),
    )
    .unwrap();

    assert_eq!(path, output_dir.join("mars_colonization_presentation.pptx"));
    assert!(path.exists());
}

#[test]
fn test_export_to_file_unavailable_target() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not_a_dir");
    std::fs::write(&blocker, "file").unwrap();

    let result = export_to_file(
        &deck(2),
        "Topic",
        &blocker,
        &offline_pptx_config(),
        &picsum(),
    );
    assert!(matches!(result, Err(DeckError::ExportUnavailable(_))));
}

// Preview

#[test]
fn test_preview_state_select_and_dismiss() {
    let mut state = PreviewState::new();
    assert!(!state.select(5, 3));
    assert_eq!(state.selected(), None);

    for signal in [
        DismissSignal::OverlayClick,
        DismissSignal::CloseButton,
        DismissSignal::EscapeKey,
    ] {
        assert!(state.select(2, 3));
        assert_eq!(state.selected(), Some(2));
        state.dismiss(signal);
        assert_eq!(state.selected(), None);
    }
}

#[test]
fn test_preview_cards_and_detail() {
    let presentation = deck(4);
    let resolver = PicsumResolver::new("https://picsum.photos");

    let page = render_preview("Oceans", &presentation, &PreviewState::new(), &resolver);
    assert!(page.contains("href=\"/?slide=3\""));
    assert!(page.contains("/400/300"));
    assert!(page.contains("Export to .pptx"));
    assert!(!page.contains("class=\"overlay\""));

    let mut state = PreviewState::new();
    state.select(1, presentation.len());
    let page = render_preview("Oceans", &presentation, &state, &resolver);
    assert!(page.contains("class=\"overlay\""));
    assert!(page.contains("/1280/720"));
}

#[test]
fn test_preview_card_shows_three_bullets() {
    let mut slide = Slide::new("Points", Layout::DataCentric);
    slide.bullets = (1..=4).map(|i| format!("Point {}", i)).collect();
    let card = preview::render_card(0, &slide, &PicsumResolver::new("https://picsum.photos"));
    assert!(card.contains("Point 3"));
    assert!(!card.contains("Point 4"));
}

#[test]
fn test_preview_bar_chart_truncates_mismatched_arrays() {
    let chart = preview::render_infographic(&Infographic::BarChart(BarChartData {
        title: Some("Sales".to_string()),
        labels: vec!["A".to_string()],
        values: vec![1500.0, 3000.0],
    }));
    assert_eq!(chart.matches("class=\"bar\"").count(), 1);
    assert!(chart.contains("1,500"));
    assert!(chart.contains("height: 100.0%"));
}

#[test]
fn test_preview_timeline_truncates_mismatched_arrays() {
    let timeline = preview::render_infographic(&Infographic::Timeline(TimelineData {
        title: None,
        years: vec!["1990".to_string(), "2000".to_string(), "2010".to_string()],
        events: vec!["Start".to_string(), "Growth".to_string()],
    }));
    assert_eq!(timeline.matches("class=\"row\"").count(), 2);
    assert!(timeline.contains("Growth"));
    assert!(!timeline.contains("2010"));
}

#[test]
fn test_preview_unsupported_infographic_placeholder() {
    let html = preview::render_infographic(&Infographic::Unsupported {
        kind: "comparison".to_string(),
    });
    assert!(html.contains("Infographic: comparison"));
}

// Controller

#[test]
fn test_controller_generates_and_goes_back() {
    init_logger();
    let mut controller = ScreenController::new(generator_answering(Some(deck_json(7))));
    controller.submit("  Mars Colonization  ").unwrap();
    assert!(controller.is_loading());
    assert_eq!(controller.topic(), Some("Mars Colonization"));

    // Only one request may be in flight
    assert!(matches!(
        controller.submit("Another"),
        Err(DeckError::InvalidTransition(_))
    ));

    controller.wait().unwrap();
    assert_eq!(controller.screen().name(), "preview");
    assert_eq!(controller.presentation().map(|p| p.len()), Some(7));

    controller.back().unwrap();
    assert!(matches!(controller.screen(), Screen::Home));
    assert!(controller.presentation().is_none());
}

#[test]
fn test_controller_rejects_empty_topic() {
    let mut controller = ScreenController::new(generator_answering(Some(deck_json(7))));
    assert!(matches!(controller.submit("   "), Err(DeckError::EmptyTopic)));
    assert!(matches!(controller.screen(), Screen::Home));
}

#[test]
fn test_controller_empty_deck_reaches_error_then_home() {
    let mut controller =
        ScreenController::new(generator_answering(Some(r#"{"slides": []}"#.to_string())));
    controller.submit("Nothing").unwrap();
    controller.wait().unwrap();

    assert_eq!(controller.error_message(), Some(EMPTY_PRESENTATION_MESSAGE));
    controller.retry().unwrap();
    assert!(matches!(controller.screen(), Screen::Home));
}

#[test]
fn test_controller_model_failure_shows_message() {
    let mut controller = ScreenController::new(generator_answering(None));
    controller.submit("Anything").unwrap();
    controller.wait().unwrap();
    assert_eq!(controller.error_message(), Some(GENERATION_FAILED_MESSAGE));
}

#[test]
fn test_controller_worker_panic_becomes_error() {
    let generator = Generator::new(Box::new(PanickingModel), GeneratorConfig::default());
    let mut controller = ScreenController::new(generator);
    controller.submit("Crash").unwrap();
    controller.wait().unwrap();
    assert_eq!(controller.screen().name(), "error");
}

#[test]
fn test_controller_poll_eventually_completes() {
    let mut controller = ScreenController::new(generator_answering(Some(deck_json(3))));
    controller.submit("Polling").unwrap();

    let mut transitioned = false;
    for _ in 0..200 {
        if controller.poll() {
            transitioned = true;
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    assert!(transitioned);
    assert_eq!(controller.screen().name(), "preview");
    assert!(!controller.poll());
}

#[test]
fn test_controller_rejects_invalid_transitions() {
    let mut controller = ScreenController::new(generator_answering(None));
    assert!(matches!(controller.back(), Err(DeckError::InvalidTransition(_))));
    assert!(matches!(controller.retry(), Err(DeckError::InvalidTransition(_))));
    assert!(matches!(controller.wait(), Err(DeckError::InvalidTransition(_))));
    assert!(matches!(controller.screen(), Screen::Home));
}

#[test]
fn test_controller_with_presentation_without_generator() {
    let mut controller = ScreenController::with_presentation("Saved", deck(3), None).unwrap();
    assert_eq!(controller.topic(), Some("Saved"));
    controller.back().unwrap();
    assert!(matches!(
        controller.submit("New"),
        Err(DeckError::ConfigError(_))
    ));
    assert!(ScreenController::with_presentation("Empty", Presentation::default(), None).is_err());
}

// Web app

fn preview_app() -> App {
    let controller =
        ScreenController::with_presentation("Mars Colonization", deck(4), None).unwrap();
    App::new(controller, offline_pptx_config())
}

#[test]
fn test_app_renders_preview_and_detail() {
    let mut app = preview_app();
    match app.handle(&Method::Get, "/?slide=2", "") {
        server::Reply::Html { status, body } => {
            assert_eq!(status, 200);
            assert!(body.contains("class=\"overlay\""));
        }
        other => panic!("unexpected reply {:?}", other),
    }
}

#[test]
fn test_app_dismiss_closes_detail() {
    let mut app = preview_app();
    for target in [
        "/",
        "/?dismiss=close",
        "/?slide=2&dismiss=escape",
        "/?slide=1&dismiss=overlay",
    ] {
        match app.handle(&Method::Get, target, "") {
            server::Reply::Html { body, .. } => {
                assert!(!body.contains("class=\"overlay\""), "{} left the overlay open", target)
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    // Unknown signals do not close anything
    match app.handle(&Method::Get, "/?slide=1&dismiss=swipe", "") {
        server::Reply::Html { body, .. } => {
            assert!(body.contains("class=\"overlay\""));
            assert!(body.contains("href=\"/?dismiss=close\""));
            assert!(body.contains("/?dismiss=escape"));
        }
        other => panic!("unexpected reply {:?}", other),
    }

    assert_eq!(
        DismissSignal::from_query("overlay"),
        Some(DismissSignal::OverlayClick)
    );
    assert_eq!(DismissSignal::from_query(""), None);
}

#[test]
fn test_app_export_download() {
    let mut app = preview_app();
    match app.handle(&Method::Get, "/export", "") {
        server::Reply::Download { file_name, data } => {
            assert_eq!(file_name, "mars_colonization_presentation.pptx");
            assert_eq!(slide_part_count(&data), 4);
        }
        other => panic!("unexpected reply {:?}", other),
    }
}

#[test]
fn test_app_export_download_non_ascii_topic() {
    let controller = ScreenController::with_presentation("Café Culture", deck(2), None).unwrap();
    let mut app = App::new(controller, offline_pptx_config());

    let (file_name, data) = match app.handle(&Method::Get, "/export", "") {
        server::Reply::Download { file_name, data } => (file_name, data),
        other => panic!("unexpected reply {:?}", other),
    };
    assert_eq!(file_name, "café_culture_presentation.pptx");

    let disposition = server::content_disposition(&file_name);
    assert!(disposition.is_ascii());
    assert!(disposition.contains("filename=\"caf__culture_presentation.pptx\""));
    assert!(disposition.contains("filename*=UTF-8''caf%C3%A9_culture_presentation.pptx"));
    assert!(server::download_response(&file_name, data).is_ok());
}

#[test]
fn test_content_disposition_strips_control_characters() {
    let disposition = server::content_disposition("line\r\nbreak \"deck\".pptx");
    assert!(disposition.is_ascii());
    assert!(!disposition.contains('\r'));
    assert!(!disposition.contains('\n'));
    assert!(disposition.starts_with("attachment; filename=\"line__break _deck_.pptx\";"));
    assert!(disposition.ends_with("filename*=UTF-8''line%0D%0Abreak%20%22deck%22.pptx"));
    assert!(server::header("Content-Disposition", &disposition).is_ok());
}

#[test]
fn test_app_back_then_empty_topic() {
    let mut app = preview_app();
    assert_eq!(
        app.handle(&Method::Post, "/back", ""),
        server::Reply::Redirect("/".to_string())
    );
    assert!(matches!(app.controller().screen(), Screen::Home));

    match app.handle(&Method::Post, "/generate", "topic=+++") {
        server::Reply::Html { body, .. } => assert!(body.contains("Please enter a topic.")),
        other => panic!("unexpected reply {:?}", other),
    }
    assert_eq!(app.handle(&Method::Get, "/export", ""), server::Reply::Redirect("/".to_string()));
}

#[test]
fn test_app_generate_redirects_to_loading() {
    let controller = ScreenController::new(generator_answering(Some(deck_json(7))));
    let mut app = App::new(controller, offline_pptx_config());

    assert_eq!(
        app.handle(&Method::Post, "/generate", "topic=Deep+Sea%20Mining"),
        server::Reply::Redirect("/".to_string())
    );
    assert_eq!(app.controller().topic(), Some("Deep Sea Mining"));
}

#[test]
fn test_app_unknown_path() {
    let mut app = preview_app();
    assert_eq!(app.handle(&Method::Get, "/admin", ""), server::Reply::NotFound);
}

#[test]
fn test_alert_script_is_inserted_before_body_end() {
    let page = html::with_alert(&html::home_page(None), "Export failed: \"disk\" </script>");
    let script = page.find("<script>alert(").unwrap();
    assert!(script < page.rfind("</body>").unwrap());
    assert!(page.contains(r"<\/script>"));
}

// Config

#[test]
fn test_config_builders() {
    let config = Config {
        aspect_ratio: "4:3".to_string(),
        embed_images: true,
        ..Config::default()
    };
    let pptx_config = config.get_pptx_config(Some("Topic".to_string()), None, Some(false));
    assert_eq!(pptx_config.title, "Topic");
    assert_eq!(pptx_config.aspect_ratio, "4:3");
    assert!(!pptx_config.embed_images);

    assert_eq!(config.get_generator_config(None).temperature, 0.7);
    assert_eq!(config.get_generator_config(Some(0.2)).temperature, 0.2);
    assert!(config.require_api_key().is_err());
}
