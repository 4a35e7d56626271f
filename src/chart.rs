// ABOUTME: Chart part generation for the deckforge application
// ABOUTME: Writes DrawingML column charts for bar-chart infographics

use crate::schema::BarChartData;
use quick_xml::escape::escape;
use std::fmt::Write;

const CATEGORY_AXIS_ID: u32 = 111_111_111;
const VALUE_AXIS_ID: u32 = 222_222_222;

/// Render `ppt/charts/chartN.xml` for a bar chart.
///
/// One clustered column series named after the chart title (or "Data"),
/// categories and values inlined as literals, no legend, and a `#,##0`
/// value axis.
pub fn bar_chart_xml(data: &BarChartData) -> String {
    let points = data.points();
    let series_name = data
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("Data");

    let mut xml = String::with_capacity(2048 + points.len() * 96);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str(r#"<c:date1904 val="0"/><c:lang val="en-US"/><c:roundedCorners val="0"/>"#);
    xml.push_str("<c:chart>");
    xml.push_str(r#"<c:autoTitleDeleted val="1"/>"#);
    xml.push_str("<c:plotArea><c:layout/>");

    xml.push_str("<c:barChart>");
    xml.push_str(r#"<c:barDir val="col"/><c:grouping val="clustered"/><c:varyColors val="0"/>"#);

    xml.push_str(r#"<c:ser><c:idx val="0"/><c:order val="0"/>"#);
    let _ = write!(xml, "<c:tx><c:v>{}</c:v></c:tx>", escape(series_name));
    xml.push_str(r#"<c:spPr><a:solidFill><a:srgbClr val="111111"/></a:solidFill></c:spPr>"#);
    xml.push_str(r#"<c:invertIfNegative val="0"/>"#);

    xml.push_str("<c:cat><c:strLit>");
    let _ = write!(xml, r#"<c:ptCount val="{}"/>"#, points.len());
    for (i, (label, _)) in points.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<c:pt idx="{}"><c:v>{}</c:v></c:pt>"#,
            i,
            escape(*label)
        );
    }
    xml.push_str("</c:strLit></c:cat>");

    xml.push_str("<c:val><c:numLit><c:formatCode>General</c:formatCode>");
    let _ = write!(xml, r#"<c:ptCount val="{}"/>"#, points.len());
    for (i, (_, value)) in points.iter().enumerate() {
        let value = if value.is_finite() { *value } else { 0.0 };
        let _ = write!(xml, r#"<c:pt idx="{}"><c:v>{}</c:v></c:pt>"#, i, value);
    }
    xml.push_str("</c:numLit></c:val>");
    xml.push_str("</c:ser>");

    xml.push_str(r#"<c:gapWidth val="150"/>"#);
    let _ = write!(
        xml,
        r#"<c:axId val="{}"/><c:axId val="{}"/>"#,
        CATEGORY_AXIS_ID, VALUE_AXIS_ID
    );
    xml.push_str("</c:barChart>");

    // Category axis
    xml.push_str("<c:catAx>");
    let _ = write!(xml, r#"<c:axId val="{}"/>"#, CATEGORY_AXIS_ID);
    xml.push_str(r#"<c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/><c:axPos val="b"/>"#);
    xml.push_str(r#"<c:numFmt formatCode="General" sourceLinked="0"/>"#);
    xml.push_str(r#"<c:majorTickMark val="none"/><c:minorTickMark val="none"/><c:tickLblPos val="nextTo"/>"#);
    xml.push_str(&axis_text_properties("666666"));
    let _ = write!(xml, r#"<c:crossAx val="{}"/>"#, VALUE_AXIS_ID);
    xml.push_str(r#"<c:crosses val="autoZero"/><c:auto val="1"/><c:lblAlgn val="ctr"/><c:lblOffset val="100"/><c:noMultiLvlLbl val="0"/>"#);
    xml.push_str("</c:catAx>");

    // Value axis
    xml.push_str("<c:valAx>");
    let _ = write!(xml, r#"<c:axId val="{}"/>"#, VALUE_AXIS_ID);
    xml.push_str(r#"<c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/><c:axPos val="l"/>"#);
    xml.push_str(r#"<c:majorGridlines><c:spPr><a:ln w="6350"><a:solidFill><a:srgbClr val="E5E5E5"/></a:solidFill></a:ln></c:spPr></c:majorGridlines>"#);
    xml.push_str(r##"<c:numFmt formatCode="#,##0" sourceLinked="0"/>"##);
    xml.push_str(r#"<c:majorTickMark val="none"/><c:minorTickMark val="none"/><c:tickLblPos val="nextTo"/>"#);
    xml.push_str(&axis_text_properties("666666"));
    let _ = write!(xml, r#"<c:crossAx val="{}"/>"#, CATEGORY_AXIS_ID);
    xml.push_str(r#"<c:crosses val="autoZero"/><c:crossBetween val="between"/>"#);
    xml.push_str("</c:valAx>");

    xml.push_str("</c:plotArea>");
    xml.push_str(r#"<c:plotVisOnly val="1"/><c:dispBlanksAs val="gap"/>"#);
    xml.push_str("</c:chart>");
    xml.push_str("</c:chartSpace>");

    xml
}

fn axis_text_properties(color: &str) -> String {
    format!(
        r#"<c:txPr><a:bodyPr/><a:lstStyle/><a:p><a:pPr><a:defRPr sz="1200"><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:latin typeface="Inter"/></a:defRPr></a:pPr><a:endParaRPr lang="en-US"/></a:p></c:txPr>"#,
        color
    )
}
