// ABOUTME: Preview module for the deckforge application
// ABOUTME: Renders a generated deck as a card grid with a slide detail overlay

use crate::html;
use crate::images::{image_seed, ImageResolver, ImageSize};
use crate::schema::{
    BarChartData, Infographic, Layout, Presentation, Slide, StatisticData, TimelineData,
};
use log::debug;
use quick_xml::escape::escape;
use std::fmt::Write;

/// Number of bullets shown on a preview card
pub const CARD_BULLETS: usize = 3;

/// Ways the user can close the detail overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissSignal {
    OverlayClick,
    CloseButton,
    EscapeKey,
}

impl DismissSignal {
    /// Parse the `dismiss` query value the overlay navigates with
    pub fn from_query(value: &str) -> Option<Self> {
        match value {
            "overlay" => Some(DismissSignal::OverlayClick),
            "close" => Some(DismissSignal::CloseButton),
            "escape" => Some(DismissSignal::EscapeKey),
            _ => None,
        }
    }
}

/// Which slide, if any, is open in the detail overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewState {
    selected: Option<usize>,
}

impl PreviewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Open slide `index`; out of range indices are ignored
    pub fn select(&mut self, index: usize, slide_count: usize) -> bool {
        if index >= slide_count {
            debug!("Ignoring selection of slide {} of {}", index, slide_count);
            return false;
        }
        self.selected = Some(index);
        true
    }

    pub fn dismiss(&mut self, signal: DismissSignal) {
        debug!("Closing slide detail ({:?})", signal);
        self.selected = None;
    }
}

/// Render the preview screen: toolbar, card grid and the open slide if any
pub fn render_preview(
    topic: &str,
    presentation: &Presentation,
    state: &PreviewState,
    resolver: &dyn ImageResolver,
) -> String {
    let mut body = String::new();

    body.push_str("<header class=\"toolbar\">\n");
    body.push_str("<form method=\"post\" action=\"/back\"><button class=\"secondary\" type=\"submit\">New Topic</button></form>\n");
    let _ = writeln!(body, "<h1>{}</h1>", escape(topic));
    body.push_str("<a class=\"button\" href=\"/export\">Export to .pptx</a>\n");
    body.push_str("</header>\n");

    body.push_str("<section class=\"grid\">\n");
    for (index, slide) in presentation.slides.iter().enumerate() {
        body.push_str(&render_card(index, slide, resolver));
    }
    body.push_str("</section>\n");

    if let Some(slide) = state
        .selected()
        .and_then(|index| presentation.slides.get(index))
    {
        body.push_str(&render_detail(slide, resolver));
    }

    html::page(topic, &body, None)
}

/// A clickable thumbnail of one slide
pub fn render_card(index: usize, slide: &Slide, resolver: &dyn ImageResolver) -> String {
    let mut card = String::new();
    let _ = writeln!(card, "<a class=\"card\" href=\"/?slide={}\">", index);
    let _ = writeln!(card, "<span class=\"number\">{}</span>", index + 1);
    let _ = writeln!(card, "<h3>{}</h3>", escape(slide.title.as_str()));

    match visual_url(slide, ImageSize::Small, resolver) {
        Some(url) => {
            let _ = writeln!(
                card,
                "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
                escape(url.as_str()),
                escape(slide.image_prompt.as_str())
            );
        }
        None => {
            card.push_str(&bullet_list(slide.bullets.iter().take(CARD_BULLETS)));
        }
    }

    card.push_str("</a>\n");
    card
}

/// The full-size view of one slide inside the dismissable overlay
pub fn render_detail(slide: &Slide, resolver: &dyn ImageResolver) -> String {
    let mut detail = String::new();
    detail.push_str("<div class=\"overlay\" id=\"overlay\">\n");
    detail.push_str("<div class=\"modal\">\n");
    detail.push_str(
        "<a class=\"close\" href=\"/?dismiss=close\" aria-label=\"Close\">&times;</a>\n",
    );

    match slide.layout {
        Layout::TitleOnly => {
            detail.push_str("<div class=\"slide-title\">\n");
            let _ = writeln!(detail, "<h2>{}</h2>", escape(slide.title.as_str()));
            if let Some(subtitle) = &slide.subtitle {
                let _ = writeln!(detail, "<p>{}</p>", escape(subtitle.as_str()));
            }
            detail.push_str("</div>\n");
        }
        Layout::VisualLeft | Layout::VisualRight | Layout::DataCentric => {
            let text = bullet_list(slide.bullets.iter());
            let visual = render_visual(slide, resolver);

            detail.push_str("<div class=\"slide-content\">\n");
            let _ = writeln!(detail, "<h2>{}</h2>", escape(slide.title.as_str()));
            detail.push_str("<div class=\"columns\">\n");
            if slide.layout == Layout::VisualLeft {
                let _ = write!(detail, "<div>{}</div>\n<div>{}</div>\n", visual, text);
            } else {
                let _ = write!(detail, "<div>{}</div>\n<div>{}</div>\n", text, visual);
            }
            detail.push_str("</div>\n</div>\n");
        }
    }

    detail.push_str("</div>\n</div>\n");
    detail.push_str(DISMISS_SCRIPT);
    detail
}

// Escape and backdrop clicks leave the overlay, each naming its dismiss signal
const DISMISS_SCRIPT: &str = r#"<script>
document.addEventListener('keydown', function (e) { if (e.key === 'Escape') { window.location = '/?dismiss=escape'; } });
document.getElementById('overlay').addEventListener('click', function (e) { if (e.target === this) { window.location = '/?dismiss=overlay'; } });
</script>
"#;

fn visual_url(slide: &Slide, size: ImageSize, resolver: &dyn ImageResolver) -> Option<String> {
    if !slide.layout.is_visual() {
        return None;
    }
    let seed = image_seed(&slide.image_prompt);
    if seed.is_empty() {
        return None;
    }
    Some(resolver.url(&seed, size))
}

fn render_visual(slide: &Slide, resolver: &dyn ImageResolver) -> String {
    if let Some(url) = visual_url(slide, ImageSize::Large, resolver) {
        return format!(
            "<img src=\"{}\" alt=\"{}\">",
            escape(url.as_str()),
            escape(slide.image_prompt.as_str())
        );
    }
    match (&slide.layout, &slide.infographic) {
        (Layout::DataCentric, Some(infographic)) => render_infographic(infographic),
        _ => String::new(),
    }
}

fn bullet_list<'a>(bullets: impl Iterator<Item = &'a String>) -> String {
    let mut list = String::from("<ul>\n");
    for bullet in bullets {
        let _ = writeln!(list, "<li>{}</li>", escape(bullet.as_str()));
    }
    list.push_str("</ul>\n");
    list
}

/// HTML for an infographic
pub fn render_infographic(infographic: &Infographic) -> String {
    match infographic {
        Infographic::BarChart(data) => render_bar_chart(data),
        Infographic::StatisticHighlight(data) => render_statistic(data),
        Infographic::Timeline(data) => render_timeline(data),
        Infographic::Unsupported { kind } => format!(
            "<div class=\"placeholder\">Infographic: {}</div>\n",
            escape(kind.as_str())
        ),
    }
}

fn render_bar_chart(data: &BarChartData) -> String {
    let points = data.points();
    let max = points
        .iter()
        .map(|(_, value)| *value)
        .filter(|value| value.is_finite())
        .fold(0.0_f64, f64::max);

    let mut chart = String::from("<figure class=\"chart\">\n");
    if let Some(title) = &data.title {
        let _ = writeln!(chart, "<figcaption>{}</figcaption>", escape(title.as_str()));
    }
    chart.push_str("<div class=\"bars\">\n");
    for (label, value) in &points {
        let height = if max > 0.0 && value.is_finite() {
            (value / max * 100.0).max(0.0)
        } else {
            0.0
        };
        let _ = writeln!(
            chart,
            "<div class=\"bar\"><span class=\"value\">{}</span><div class=\"fill\" style=\"height: {:.1}%\"></div><span class=\"label\">{}</span></div>",
            format_number(*value),
            height,
            escape(*label)
        );
    }
    chart.push_str("</div>\n</figure>\n");
    chart
}

fn render_statistic(data: &StatisticData) -> String {
    format!(
        "<div class=\"stat\"><span class=\"stat-value\">{}{}</span><p>{}</p></div>\n",
        escape(data.value.as_str()),
        escape(data.unit.as_str()),
        escape(data.title.as_str())
    )
}

fn render_timeline(data: &TimelineData) -> String {
    let mut timeline = String::new();
    if let Some(title) = &data.title {
        let _ = writeln!(timeline, "<h3>{}</h3>", escape(title.as_str()));
    }
    timeline.push_str("<div class=\"timeline\">\n");
    for (year, event) in data.entries() {
        let _ = writeln!(
            timeline,
            "<div class=\"row\"><div class=\"year\">{}</div><div class=\"event\">{}</div></div>",
            escape(year),
            escape(event)
        );
    }
    timeline.push_str("</div>\n");
    timeline
}

/// Whole numbers without a trailing `.0`, thousands separated
fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.fract() != 0.0 {
        return format!("{:.1}", value);
    }

    let digits = format!("{}", value.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
