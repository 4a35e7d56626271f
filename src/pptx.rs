// ABOUTME: PPTX generation module for the deckforge application
// ABOUTME: Writes a Presentation as a PowerPoint package with title and content templates

use crate::chart;
use crate::errors::{DeckError, Result};
use crate::images::{image_seed, FetchedImage, ImageFetcher, ImageResolver, ImageSize};
use crate::schema::{Infographic, Layout, Presentation, Slide, StatisticData, TimelineData};
use crate::utils;
use log::{debug, info, warn};
use quick_xml::escape::escape;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use zip::{write::FileOptions, ZipWriter};

const EMU_PER_INCH: f64 = 914_400.0;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const REL_CHART: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
const REL_PRES_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";

const TITLE_FONT: &str = "Playfair Display";
const BODY_FONT: &str = "Inter";

/// Configuration for PPTX generation
#[derive(Debug, Clone)]
pub struct PptxConfig {
    pub title: String,
    pub aspect_ratio: String, // "16:9" or "4:3"
    pub embed_images: bool,
    pub image_base_url: String,
    pub image_timeout: Duration,
}

impl Default for PptxConfig {
    fn default() -> Self {
        Self {
            title: "Presentation".to_string(),
            aspect_ratio: "16:9".to_string(),
            embed_images: true,
            image_base_url: crate::config::DEFAULT_IMAGE_BASE_URL.to_string(),
            image_timeout: Duration::from_secs(10),
        }
    }
}

impl PptxConfig {
    /// Slide size in EMU for the configured aspect ratio
    pub fn slide_size(&self) -> (i64, i64) {
        match self.aspect_ratio.as_str() {
            "16:9" => (9_144_000, 5_143_500),
            "4:3" => (9_144_000, 6_858_000),
            _ => {
                warn!(
                    "Unsupported aspect ratio: {}. Using 16:9 instead.",
                    self.aspect_ratio
                );
                (9_144_000, 5_143_500)
            }
        }
    }
}

/// Export a presentation into `output_dir`, named after the topic.
///
/// Returns the path of the written file. Fails with `ExportUnavailable` when
/// the target cannot be created; the presentation itself is untouched.
pub fn export_to_file(
    presentation: &Presentation,
    topic: &str,
    output_dir: &Path,
    config: &PptxConfig,
    resolver: &dyn ImageResolver,
) -> Result<PathBuf> {
    utils::validate_directory_writable(output_dir)
        .map_err(|e| DeckError::ExportUnavailable(e.to_string()))?;

    let output_file = output_dir.join(utils::export_file_name(topic));
    info!("Exporting presentation to {:?}", output_file);

    let file = fs::File::create(&output_file).map_err(|e| {
        DeckError::ExportUnavailable(format!("Failed to create {:?}: {}", output_file, e))
    })?;
    export_presentation(presentation, file, config, resolver)?;

    info!("PPTX file created at {:?}", output_file);
    Ok(output_file)
}

/// Export a presentation into an in-memory PPTX file
pub fn export_to_bytes(
    presentation: &Presentation,
    config: &PptxConfig,
    resolver: &dyn ImageResolver,
) -> Result<Vec<u8>> {
    let cursor = export_presentation(presentation, Cursor::new(Vec::new()), config, resolver)?;
    Ok(cursor.into_inner())
}

/// Write a presentation as a PPTX package, one slide per slide in order.
///
/// Image URLs come from `resolver`, the same one the preview uses, so both
/// show the same picture for a slide.
pub fn export_presentation<W: Write + Seek>(
    presentation: &Presentation,
    writer: W,
    config: &PptxConfig,
    resolver: &dyn ImageResolver,
) -> Result<W> {
    if presentation.is_empty() {
        return Err(DeckError::ValidationError(
            "Presentation has no slides to export".to_string(),
        ));
    }

    let (cx, cy) = config.slide_size();
    let fetcher = if config.embed_images {
        match ImageFetcher::new(config.image_timeout) {
            Ok(fetcher) => Some(fetcher),
            Err(e) => {
                warn!("Image embedding disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let mut context = ExportContext {
        slide_width: cx as f64 / EMU_PER_INCH,
        resolver,
        fetcher: fetcher.as_ref(),
        charts: Vec::new(),
        media: Vec::new(),
        fetched: HashMap::new(),
    };

    // Build every slide first so charts and media are known up front
    let slides: Vec<SlideBuilder> = presentation
        .slides
        .iter()
        .enumerate()
        .map(|(i, slide)| {
            info!("Processing slide {}: {:?}", i + 1, slide.title);
            render_slide(slide, &mut context)
        })
        .collect();

    let mut zip = ZipWriter::new(writer);

    write_part(
        &mut zip,
        "[Content_Types].xml",
        &content_types_xml(slides.len(), context.charts.len(), &context.media),
    )?;
    write_part(&mut zip, "_rels/.rels", ROOT_RELS_XML)?;
    write_part(&mut zip, "docProps/app.xml", &app_xml(slides.len()))?;
    write_part(&mut zip, "docProps/core.xml", &core_xml(&config.title))?;
    write_part(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        &presentation_rels_xml(slides.len()),
    )?;
    write_part(
        &mut zip,
        "ppt/presentation.xml",
        &presentation_xml(slides.len(), cx, cy),
    )?;
    write_part(&mut zip, "ppt/presProps.xml", PRES_PROPS_XML)?;
    write_part(&mut zip, "ppt/slideMasters/slideMaster1.xml", &slide_master_xml())?;
    write_part(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        SLIDE_MASTER_RELS_XML,
    )?;
    for template in [SlideTemplate::Title, SlideTemplate::Content] {
        write_part(
            &mut zip,
            &format!("ppt/slideLayouts/slideLayout{}.xml", template.layout_number()),
            &slide_layout_xml(template),
        )?;
        write_part(
            &mut zip,
            &format!(
                "ppt/slideLayouts/_rels/slideLayout{}.xml.rels",
                template.layout_number()
            ),
            SLIDE_LAYOUT_RELS_XML,
        )?;
    }
    write_part(&mut zip, "ppt/theme/theme1.xml", THEME_XML)?;

    for (i, slide) in slides.iter().enumerate() {
        let slide_num = i + 1;
        debug!("Creating slide XML: ppt/slides/slide{}.xml", slide_num);
        write_part(
            &mut zip,
            &format!("ppt/slides/slide{}.xml", slide_num),
            &slide.slide_xml(),
        )?;
        write_part(
            &mut zip,
            &format!("ppt/slides/_rels/slide{}.xml.rels", slide_num),
            &slide.rels_xml(),
        )?;
    }

    for (i, chart_xml) in context.charts.iter().enumerate() {
        write_part(&mut zip, &format!("ppt/charts/chart{}.xml", i + 1), chart_xml)?;
    }

    for (i, image) in context.media.iter().enumerate() {
        let name = format!("ppt/media/image{}.{}", i + 1, image.extension());
        debug!("Adding image to PPTX: {}", name);
        zip.start_file(name, FileOptions::default())?;
        zip.write_all(&image.data)?;
    }

    info!("Finalizing PPTX file");
    Ok(zip.finish()?)
}

fn write_part<W: Write + Seek>(zip: &mut ZipWriter<W>, name: &str, content: &str) -> Result<()> {
    zip.start_file(name, FileOptions::default())?;
    zip.write_all(content.as_bytes())?;
    Ok(())
}

fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

/// Placement of a shape, in inches
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Frame {
    const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    fn with_x(self, x: f64) -> Self {
        Self { x, ..self }
    }

    fn xfrm(&self, prefix: &str) -> String {
        format!(
            r#"<{p}:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></{p}:xfrm>"#,
            emu(self.x),
            emu(self.y),
            emu(self.w),
            emu(self.h),
            p = prefix
        )
    }
}

const BULLETS_FRAME: Frame = Frame::new(0.75, 1.5, 4.0, 3.5);
const IMAGE_FRAME: Frame = Frame::new(5.25, 1.0, 4.25, 4.0);
const CHART_FRAME: Frame = Frame::new(1.0, 1.5, 8.0, 3.5);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone)]
struct TextStyle {
    font_face: &'static str,
    size_pt: u32,
    color: &'static str,
    bold: bool,
    align: Align,
    anchor_middle: bool,
    bullet: bool,
    line_spacing_pt: Option<u32>,
}

impl TextStyle {
    fn bullets() -> Self {
        Self {
            font_face: BODY_FONT,
            size_pt: 16,
            color: "111111",
            bold: false,
            align: Align::Left,
            anchor_middle: false,
            bullet: true,
            line_spacing_pt: Some(28),
        }
    }

    fn statistic_value() -> Self {
        Self {
            font_face: TITLE_FONT,
            size_pt: 80,
            color: "000000",
            bold: true,
            align: Align::Center,
            anchor_middle: true,
            bullet: false,
            line_spacing_pt: None,
        }
    }

    fn caption(size_pt: u32, color: &'static str, align: Align) -> Self {
        Self {
            font_face: BODY_FONT,
            size_pt,
            color,
            bold: false,
            align,
            anchor_middle: true,
            bullet: false,
            line_spacing_pt: None,
        }
    }

    fn paragraph(&self, text: &str) -> String {
        let mut xml = String::from("<a:p>");

        let algn = match self.align {
            Align::Left => "l",
            Align::Center => "ctr",
        };
        if self.bullet {
            let _ = write!(xml, r#"<a:pPr marL="304800" indent="-304800" algn="{}">"#, algn);
        } else {
            let _ = write!(xml, r#"<a:pPr algn="{}">"#, algn);
        }
        if let Some(spacing) = self.line_spacing_pt {
            let _ = write!(xml, r#"<a:lnSpc><a:spcPts val="{}"/></a:lnSpc>"#, spacing * 100);
        }
        if self.bullet {
            xml.push_str(r#"<a:buFont typeface="Arial"/><a:buChar char="&#8226;"/>"#);
        } else {
            xml.push_str("<a:buNone/>");
        }
        xml.push_str("</a:pPr>");

        let _ = write!(
            xml,
            r#"<a:r><a:rPr lang="en-US" sz="{}" b="{}" dirty="0"><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:latin typeface="{}"/></a:rPr><a:t>{}</a:t></a:r>"#,
            self.size_pt * 100,
            if self.bold { 1 } else { 0 },
            self.color,
            self.font_face,
            escape(text)
        );
        xml.push_str("</a:p>");
        xml
    }
}

/// Which slide layout a slide is built on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlideTemplate {
    /// Centered title and subtitle, for title-only slides
    Title,
    /// Left-aligned title header, for everything else
    Content,
}

impl SlideTemplate {
    fn for_layout(layout: Layout) -> Self {
        match layout {
            Layout::TitleOnly => SlideTemplate::Title,
            Layout::VisualLeft | Layout::VisualRight | Layout::DataCentric => {
                SlideTemplate::Content
            }
        }
    }

    fn layout_number(&self) -> usize {
        match self {
            SlideTemplate::Title => 1,
            SlideTemplate::Content => 2,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SlideTemplate::Title => "TITLE_SLIDE",
            SlideTemplate::Content => "CONTENT_SLIDE",
        }
    }
}

struct Relationship {
    id: String,
    rel_type: &'static str,
    target: String,
    external: bool,
}

/// Accumulates the shapes and relationships of one slide part
struct SlideBuilder {
    shapes: String,
    next_id: u32,
    rels: Vec<Relationship>,
}

impl SlideBuilder {
    fn new(template: SlideTemplate) -> Self {
        let mut builder = Self {
            shapes: String::new(),
            next_id: 2,
            rels: Vec::new(),
        };
        builder.add_rel(
            REL_SLIDE_LAYOUT,
            format!("../slideLayouts/slideLayout{}.xml", template.layout_number()),
            false,
        );
        builder
    }

    fn shape_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn add_rel(&mut self, rel_type: &'static str, target: String, external: bool) -> String {
        let id = format!("rId{}", self.rels.len() + 1);
        self.rels.push(Relationship {
            id: id.clone(),
            rel_type,
            target,
            external,
        });
        id
    }

    /// Fill a layout placeholder; position and formatting come from the layout
    fn add_placeholder(&mut self, ph: &str, text: &str) {
        let id = self.shape_id();
        let _ = write!(
            self.shapes,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Placeholder {id}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{ph}</p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            id = id,
            ph = ph,
            text = escape(text)
        );
    }

    fn add_text(&mut self, frame: Frame, lines: &[&str], style: &TextStyle) {
        let id = self.shape_id();
        let _ = write!(
            self.shapes,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr wrap="square" rtlCol="0" anchor="{anchor}"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#,
            id = id,
            xfrm = frame.xfrm("a"),
            anchor = if style.anchor_middle { "ctr" } else { "t" }
        );
        if lines.is_empty() {
            self.shapes.push_str(&style.paragraph(""));
        }
        for line in lines {
            self.shapes.push_str(&style.paragraph(line));
        }
        self.shapes.push_str("</p:txBody></p:sp>");
    }

    /// Place a picture; `linked` pictures reference an external URL
    fn add_picture(&mut self, frame: Frame, rel_id: &str, linked: bool, description: &str) {
        let id = self.shape_id();
        let blip = if linked {
            format!(r#"<a:blip r:link="{}"/>"#, rel_id)
        } else {
            format!(r#"<a:blip r:embed="{}"/>"#, rel_id)
        };
        let _ = write!(
            self.shapes,
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}" descr="{descr}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill>{blip}<a:srcRect/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
            id = id,
            descr = escape(description),
            blip = blip,
            xfrm = frame.xfrm("a")
        );
    }

    fn add_chart(&mut self, frame: Frame, rel_id: &str) {
        let id = self.shape_id();
        let _ = write!(
            self.shapes,
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Chart {id}"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr>{xfrm}<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" r:id="{rel}"/></a:graphicData></a:graphic></p:graphicFrame>"#,
            id = id,
            xfrm = frame.xfrm("p"),
            rel = rel_id
        );
    }

    /// Thin vertical rule
    fn add_line(&mut self, x: f64, y: f64, height: f64) {
        let id = self.shape_id();
        let _ = write!(
            self.shapes,
            r#"<p:cxnSp><p:nvCxnSpPr><p:cNvPr id="{id}" name="Connector {id}"/><p:cNvCxnSpPr/><p:nvPr/></p:nvCxnSpPr><p:spPr>{xfrm}<a:prstGeom prst="line"><a:avLst/></a:prstGeom><a:ln w="12700"><a:solidFill><a:srgbClr val="BBBBBB"/></a:solidFill></a:ln></p:spPr></p:cxnSp>"#,
            id = id,
            xfrm = Frame::new(x, y, 0.0, height).xfrm("a")
        );
    }

    fn slide_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
            a = NS_A,
            r = NS_R,
            p = NS_P,
            shapes = self.shapes
        )
    }

    fn rels_xml(&self) -> String {
        relationships_xml(&self.rels)
    }
}

fn relationships_xml(rels: &[Relationship]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        let _ = write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
            rel.id,
            rel.rel_type,
            escape(rel.target.as_str()),
            if rel.external {
                r#" TargetMode="External""#
            } else {
                ""
            }
        );
    }
    xml.push_str("</Relationships>");
    xml
}

/// Package-wide state shared while slides are rendered
struct ExportContext<'a> {
    slide_width: f64,
    resolver: &'a dyn ImageResolver,
    fetcher: Option<&'a ImageFetcher>,
    charts: Vec<String>,
    media: Vec<FetchedImage>,
    /// Media index per fetched URL, `None` when the fetch failed
    fetched: HashMap<String, Option<usize>>,
}

impl ExportContext<'_> {
    fn place_image(&mut self, builder: &mut SlideBuilder, slide: &Slide, frame: Frame) {
        let seed = image_seed(&slide.image_prompt);
        if seed.is_empty() {
            debug!("Slide {:?} has no usable image prompt, no image placed", slide.title);
            return;
        }
        let url = self.resolver.url(&seed, ImageSize::Large);

        if let Some(media_index) = self.embedded_media(&url) {
            let target = format!(
                "../media/image{}.{}",
                media_index + 1,
                self.media[media_index].extension()
            );
            let rel = builder.add_rel(REL_IMAGE, target, false);
            builder.add_picture(frame, &rel, false, &slide.image_prompt);
        } else {
            let rel = builder.add_rel(REL_IMAGE, url, true);
            builder.add_picture(frame, &rel, true, &slide.image_prompt);
        }
    }

    fn embedded_media(&mut self, url: &str) -> Option<usize> {
        let fetcher = self.fetcher?;
        if let Some(cached) = self.fetched.get(url) {
            return *cached;
        }

        let index = match fetcher.fetch(url) {
            Ok(image) => {
                self.media.push(image);
                Some(self.media.len() - 1)
            }
            Err(e) => {
                warn!("Failed to embed image {}: {}. Linking it instead.", url, e);
                None
            }
        };
        self.fetched.insert(url.to_string(), index);
        index
    }

    fn add_chart_part(&mut self, chart_xml: String) -> String {
        self.charts.push(chart_xml);
        format!("../charts/chart{}.xml", self.charts.len())
    }
}

fn render_slide(slide: &Slide, context: &mut ExportContext) -> SlideBuilder {
    let template = SlideTemplate::for_layout(slide.layout);
    let mut builder = SlideBuilder::new(template);

    match slide.layout {
        Layout::TitleOnly => {
            builder.add_placeholder(r#"<p:ph type="ctrTitle"/>"#, &slide.title);
            if let Some(subtitle) = &slide.subtitle {
                builder.add_placeholder(r#"<p:ph type="subTitle" idx="1"/>"#, subtitle);
            }
        }
        Layout::VisualLeft => {
            builder.add_placeholder(r#"<p:ph type="title"/>"#, &slide.title);
            add_bullets(&mut builder, slide, BULLETS_FRAME.with_x(5.25));
            context.place_image(&mut builder, slide, IMAGE_FRAME.with_x(0.5));
        }
        Layout::VisualRight => {
            builder.add_placeholder(r#"<p:ph type="title"/>"#, &slide.title);
            add_bullets(&mut builder, slide, BULLETS_FRAME.with_x(0.75));
            context.place_image(&mut builder, slide, IMAGE_FRAME.with_x(5.25));
        }
        Layout::DataCentric => {
            builder.add_placeholder(r#"<p:ph type="title"/>"#, &slide.title);
            match &slide.infographic {
                Some(Infographic::BarChart(data)) => {
                    let target = context.add_chart_part(chart::bar_chart_xml(data));
                    let rel = builder.add_rel(REL_CHART, target, false);
                    builder.add_chart(CHART_FRAME, &rel);
                }
                Some(Infographic::StatisticHighlight(data)) => {
                    add_statistic(&mut builder, data, context.slide_width);
                }
                Some(Infographic::Timeline(data)) => {
                    add_timeline(&mut builder, data);
                }
                Some(Infographic::Unsupported { kind }) => {
                    warn!(
                        "Infographic {:?} on slide {:?} cannot be exported",
                        kind, slide.title
                    );
                }
                None => {
                    debug!("Data slide {:?} has no infographic", slide.title);
                }
            }
        }
    }

    builder
}

fn add_bullets(builder: &mut SlideBuilder, slide: &Slide, frame: Frame) {
    if slide.bullets.is_empty() {
        return;
    }
    let lines: Vec<&str> = slide.bullets.iter().map(String::as_str).collect();
    builder.add_text(frame, &lines, &TextStyle::bullets());
}

fn add_statistic(builder: &mut SlideBuilder, data: &StatisticData, slide_width: f64) {
    let headline = format!("{}{}", data.value, data.unit);
    builder.add_text(
        Frame::new(0.0, 1.5, slide_width, 2.0),
        &[headline.as_str()],
        &TextStyle::statistic_value(),
    );
    builder.add_text(
        Frame::new(0.0, 3.5, slide_width, 1.0),
        &[data.title.as_str()],
        &TextStyle::caption(20, "666666", Align::Center),
    );
}

const TIMELINE_TOP: f64 = 1.8;
const TIMELINE_HEIGHT: f64 = 3.4;
const TIMELINE_MAX_ROW: f64 = 0.7;

fn add_timeline(builder: &mut SlideBuilder, data: &TimelineData) {
    if let Some(title) = data.title.as_deref().filter(|t| !t.trim().is_empty()) {
        let mut style = TextStyle::caption(14, "111111", Align::Left);
        style.bold = true;
        builder.add_text(Frame::new(1.0, 1.2, 8.0, 0.5), &[title], &style);
    }

    let entries = data.entries();
    if entries.is_empty() {
        return;
    }

    let row_height = (TIMELINE_HEIGHT / entries.len() as f64).min(TIMELINE_MAX_ROW);
    builder.add_line(0.85, TIMELINE_TOP, row_height * entries.len() as f64);

    let mut year_style = TextStyle::caption(16, "000000", Align::Left);
    year_style.bold = true;
    let event_style = TextStyle::caption(14, "444444", Align::Left);

    for (i, &(year, event)) in entries.iter().enumerate() {
        let y = TIMELINE_TOP + row_height * i as f64;
        builder.add_text(Frame::new(1.0, y, 1.8, row_height), &[year], &year_style);
        builder.add_text(Frame::new(2.9, y, 6.1, row_height), &[event], &event_style);
    }
}

fn content_types_xml(slide_count: usize, chart_count: usize, media: &[FetchedImage]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );

    let extensions: BTreeSet<(&str, &str)> = media
        .iter()
        .map(|image| (image.extension(), image.content_type()))
        .collect();
    for (extension, content_type) in extensions {
        let _ = write!(
            xml,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            extension, content_type
        );
    }

    xml.push_str(r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/presProps.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presProps+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/slideLayouts/slideLayout2.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#);

    for i in 1..=slide_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            i
        );
    }
    for i in 1..=chart_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/ppt/charts/chart{}.xml" ContentType="application/vnd.openxmlformats-officedocument.drawingml.chart+xml"/>"#,
            i
        );
    }

    xml.push_str("</Types>");
    xml
}

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/></Relationships>"#;

fn app_xml(slide_count: usize) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>deckforge</Application><Slides>{}</Slides></Properties>"#,
        slide_count
    )
}

fn core_xml(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title><dc:creator>deckforge</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created><cp:revision>1</cp:revision></cp:coreProperties>"#,
        escape(title),
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    )
}

// rId1 is the master, slides follow, then presProps and the theme
fn presentation_rels_xml(slide_count: usize) -> String {
    let mut rels = vec![Relationship {
        id: "rId1".to_string(),
        rel_type: REL_SLIDE_MASTER,
        target: "slideMasters/slideMaster1.xml".to_string(),
        external: false,
    }];
    for i in 1..=slide_count {
        rels.push(Relationship {
            id: format!("rId{}", i + 1),
            rel_type: REL_SLIDE,
            target: format!("slides/slide{}.xml", i),
            external: false,
        });
    }
    rels.push(Relationship {
        id: format!("rId{}", slide_count + 2),
        rel_type: REL_PRES_PROPS,
        target: "presProps.xml".to_string(),
        external: false,
    });
    rels.push(Relationship {
        id: format!("rId{}", slide_count + 3),
        rel_type: REL_THEME,
        target: "theme/theme1.xml".to_string(),
        external: false,
    });
    relationships_xml(&rels)
}

fn presentation_xml(slide_count: usize, cx: i64, cy: i64) -> String {
    let slide_ids = (1..=slide_count)
        .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + i, i + 1))
        .collect::<Vec<String>>()
        .join("");

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}" saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="{cx}" cy="{cy}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        slide_ids = slide_ids,
        cx = cx,
        cy = cy
    )
}

const PRES_PROPS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentationPr xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#;

const SLIDE_MASTER_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout2.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/></Relationships>"#;

const SLIDE_LAYOUT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#;

const EMPTY_GROUP: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

const WHITE_BACKGROUND: &str =
    r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="FFFFFF"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#;

/// A placeholder definition for a master or layout
fn placeholder_shape(
    id: u32,
    name: &str,
    ph: &str,
    frame: Frame,
    style: &TextStyle,
    anchor: &str,
) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{ph}</p:nvPr></p:nvSpPr><p:spPr>{xfrm}</p:spPr><p:txBody><a:bodyPr anchor="{anchor}"><a:normAutofit/></a:bodyPr><a:lstStyle><a:lvl1pPr marL="0" indent="0" algn="{algn}"><a:buNone/><a:defRPr sz="{sz}" b="{b}"><a:solidFill><a:srgbClr val="{color}"/></a:solidFill><a:latin typeface="{font}"/></a:defRPr></a:lvl1pPr></a:lstStyle><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#,
        id = id,
        name = name,
        ph = ph,
        xfrm = frame.xfrm("a"),
        anchor = anchor,
        algn = if style.align == Align::Center { "ctr" } else { "l" },
        sz = style.size_pt * 100,
        b = if style.bold { 1 } else { 0 },
        color = style.color,
        font = style.font_face
    )
}

fn title_style(size_pt: u32, align: Align) -> TextStyle {
    TextStyle {
        font_face: TITLE_FONT,
        size_pt,
        color: "000000",
        bold: true,
        align,
        anchor_middle: true,
        bullet: false,
        line_spacing_pt: None,
    }
}

fn slide_master_xml() -> String {
    let title = placeholder_shape(
        2,
        "Title Placeholder 1",
        r#"<p:ph type="title"/>"#,
        Frame::new(0.5, 0.2, 9.0, 1.0),
        &title_style(28, Align::Left),
        "ctr",
    );
    let body = placeholder_shape(
        3,
        "Text Placeholder 2",
        r#"<p:ph type="body" idx="1"/>"#,
        BULLETS_FRAME,
        &TextStyle::caption(16, "111111", Align::Left),
        "t",
    );

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}"><p:cSld>{bg}<p:spTree>{group}{title}{body}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/><p:sldLayoutId id="2147483650" r:id="rId2"/></p:sldLayoutIdLst><p:txStyles><p:titleStyle><a:lvl1pPr algn="l"><a:defRPr sz="2800" b="1"><a:solidFill><a:srgbClr val="000000"/></a:solidFill><a:latin typeface="{title_font}"/></a:defRPr></a:lvl1pPr></p:titleStyle><p:bodyStyle><a:lvl1pPr marL="0" indent="0" algn="l"><a:buNone/><a:defRPr sz="1600"><a:solidFill><a:srgbClr val="111111"/></a:solidFill><a:latin typeface="{body_font}"/></a:defRPr></a:lvl1pPr></p:bodyStyle><p:otherStyle><a:defPPr><a:defRPr lang="en-US"/></a:defPPr></p:otherStyle></p:txStyles></p:sldMaster>"#,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        bg = WHITE_BACKGROUND,
        group = EMPTY_GROUP,
        title = title,
        body = body,
        title_font = TITLE_FONT,
        body_font = BODY_FONT
    )
}

fn slide_layout_xml(template: SlideTemplate) -> String {
    let (layout_type, shapes) = match template {
        SlideTemplate::Title => {
            let title = placeholder_shape(
                2,
                "Title 1",
                r#"<p:ph type="ctrTitle"/>"#,
                Frame::new(0.5, 2.5, 9.0, 1.6),
                &title_style(44, Align::Center),
                "ctr",
            );
            let subtitle = placeholder_shape(
                3,
                "Subtitle 2",
                r#"<p:ph type="subTitle" idx="1"/>"#,
                Frame::new(0.5, 4.0, 9.0, 1.0),
                &TextStyle::caption(20, "333333", Align::Center),
                "ctr",
            );
            ("title", format!("{}{}", title, subtitle))
        }
        SlideTemplate::Content => {
            let title = placeholder_shape(
                2,
                "Title 1",
                r#"<p:ph type="title"/>"#,
                Frame::new(0.5, 0.2, 9.0, 1.0),
                &title_style(28, Align::Left),
                "ctr",
            );
            ("titleOnly", title)
        }
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}" type="{layout_type}" preserve="1"><p:cSld name="{name}">{bg}<p:spTree>{group}{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        layout_type = layout_type,
        name = template.name(),
        bg = WHITE_BACKGROUND,
        group = EMPTY_GROUP,
        shapes = shapes
    )
}

const THEME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Monochrome"><a:themeElements><a:clrScheme name="Monochrome"><a:dk1><a:srgbClr val="000000"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="111111"/></a:dk2><a:lt2><a:srgbClr val="F8F8F2"/></a:lt2><a:accent1><a:srgbClr val="111111"/></a:accent1><a:accent2><a:srgbClr val="333333"/></a:accent2><a:accent3><a:srgbClr val="555555"/></a:accent3><a:accent4><a:srgbClr val="777777"/></a:accent4><a:accent5><a:srgbClr val="999999"/></a:accent5><a:accent6><a:srgbClr val="BBBBBB"/></a:accent6><a:hlink><a:srgbClr val="000000"/></a:hlink><a:folHlink><a:srgbClr val="666666"/></a:folHlink></a:clrScheme><a:fontScheme name="Monochrome"><a:majorFont><a:latin typeface="Playfair Display"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Inter"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Monochrome"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#;
