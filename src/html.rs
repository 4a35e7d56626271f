// ABOUTME: HTML generation module for the deckforge application
// ABOUTME: Provides the page shell and the home, loading and error screens

use quick_xml::escape::escape;

const STYLE: &str = r#"
* { box-sizing: border-box; }
body { margin: 0; font-family: Inter, Helvetica, Arial, sans-serif; background: #f8f8f2; color: #111; }
h1, h2, h3 { font-family: "Playfair Display", Georgia, serif; }
a { color: inherit; }
.center { min-height: 100vh; display: flex; flex-direction: column; align-items: center; justify-content: center; padding: 2rem; text-align: center; }
.brand { font-size: 3rem; margin: 0 0 0.5rem; }
.tagline { color: #666; margin: 0 0 2rem; }
form.topic { display: flex; gap: 0.5rem; width: 100%; max-width: 36rem; }
form.topic input { flex: 1; padding: 0.8rem 1rem; border: 1px solid #ccc; border-radius: 999px; font-size: 1rem; }
button, .button { padding: 0.8rem 1.4rem; border: 0; border-radius: 999px; background: #111; color: #fff; font-size: 1rem; cursor: pointer; text-decoration: none; }
button.secondary, .button.secondary { background: #fff; color: #111; border: 1px solid #111; }
.notice { color: #a00; margin-top: 1rem; }
.spinner { width: 3rem; height: 3rem; border: 4px solid #ddd; border-top-color: #111; border-radius: 50%; animation: spin 1s linear infinite; margin-bottom: 1.5rem; }
@keyframes spin { to { transform: rotate(360deg); } }
header.toolbar { display: flex; align-items: center; justify-content: space-between; padding: 1rem 2rem; background: #fff; border-bottom: 1px solid #e5e5e5; position: sticky; top: 0; }
header.toolbar h1 { font-size: 1.4rem; margin: 0; }
header.toolbar form { display: inline; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(16rem, 1fr)); gap: 1.5rem; padding: 2rem; }
.card { display: block; background: #fff; border: 1px solid #e5e5e5; border-radius: 0.75rem; padding: 1rem; text-decoration: none; aspect-ratio: 16 / 10; overflow: hidden; }
.card:hover { border-color: #111; }
.card .number { color: #999; font-size: 0.8rem; }
.card h3 { margin: 0.3rem 0 0.6rem; font-size: 1.1rem; }
.card img { width: 100%; border-radius: 0.4rem; }
.card ul { margin: 0; padding-left: 1.1rem; color: #444; font-size: 0.85rem; }
.overlay { position: fixed; inset: 0; background: rgba(0, 0, 0, 0.6); display: flex; align-items: center; justify-content: center; padding: 2rem; }
.modal { position: relative; background: #fff; width: 100%; max-width: 64rem; aspect-ratio: 16 / 9; border-radius: 0.75rem; padding: 3rem; overflow: auto; }
.modal .close { position: absolute; top: 0.8rem; right: 1.2rem; font-size: 2rem; text-decoration: none; }
.slide-title { height: 100%; display: flex; flex-direction: column; align-items: center; justify-content: center; text-align: center; }
.slide-title h2 { font-size: 3rem; margin: 0; }
.slide-title p { font-size: 1.4rem; color: #333; }
.slide-content h2 { font-size: 2rem; margin: 0 0 1.5rem; }
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 2rem; align-items: center; }
.columns ul { font-size: 1.1rem; line-height: 1.8; }
.columns img { width: 100%; border-radius: 0.5rem; }
.bars { display: flex; align-items: flex-end; gap: 0.8rem; height: 14rem; }
.bar { flex: 1; display: flex; flex-direction: column; align-items: center; justify-content: flex-end; height: 100%; }
.bar .fill { width: 100%; background: #111; border-radius: 0.25rem 0.25rem 0 0; }
.bar .label { font-size: 0.75rem; color: #666; margin-top: 0.3rem; }
.bar .value { font-size: 0.75rem; margin-bottom: 0.2rem; }
.stat { text-align: center; }
.stat .stat-value { font-family: "Playfair Display", Georgia, serif; font-size: 5rem; font-weight: bold; }
.stat p { color: #666; font-size: 1.2rem; }
.timeline { border-left: 2px solid #bbb; padding-left: 1.2rem; }
.timeline .row { margin-bottom: 1rem; }
.timeline .year { font-weight: bold; }
.placeholder { border: 1px dashed #bbb; color: #999; padding: 3rem; text-align: center; border-radius: 0.5rem; }
"#;

/// Wrap a body fragment in a complete HTML document
pub fn page(title: &str, body: &str, extra_head: Option<&str>) -> String {
    let mut html_doc = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html_doc.push_str("<meta charset=\"UTF-8\">\n");
    html_doc
        .push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html_doc.push_str(&format!("<title>{} - DeckForge</title>\n", escape(title)));
    html_doc.push_str("<style>");
    html_doc.push_str(STYLE);
    html_doc.push_str("</style>\n");

    if let Some(head) = extra_head {
        html_doc.push_str(head);
        html_doc.push('\n');
    }

    html_doc.push_str("</head>\n<body>\n");
    html_doc.push_str(body);
    html_doc.push_str("\n</body>\n</html>");

    html_doc
}

/// Topic entry screen, with an optional notice under the form
pub fn home_page(notice: Option<&str>) -> String {
    let mut body = String::from("<main class=\"center\">\n");
    body.push_str("<h1 class=\"brand\">DeckForge</h1>\n");
    body.push_str("<p class=\"tagline\">Type a topic and get a designed slide deck.</p>\n");
    body.push_str("<form class=\"topic\" method=\"post\" action=\"/generate\">\n");
    body.push_str("<input type=\"text\" name=\"topic\" placeholder=\"e.g. The future of renewable energy\" autofocus>\n");
    body.push_str("<button type=\"submit\">Generate</button>\n");
    body.push_str("</form>\n");

    if let Some(notice) = notice {
        body.push_str(&format!("<p class=\"notice\">{}</p>\n", escape(notice)));
    }

    body.push_str("</main>");
    page("Home", &body, None)
}

/// Shown while a generation is in flight; reloads itself every second
pub fn loading_page(topic: &str) -> String {
    let mut body = String::from("<main class=\"center\">\n");
    body.push_str("<div class=\"spinner\"></div>\n");
    body.push_str(&format!(
        "<h2>Designing your deck on &ldquo;{}&rdquo;</h2>\n",
        escape(topic)
    ));
    body.push_str("<p class=\"tagline\">This can take up to a minute.</p>\n");
    body.push_str("</main>");
    page(
        "Generating",
        &body,
        Some("<meta http-equiv=\"refresh\" content=\"1\">"),
    )
}

pub fn error_page(message: &str) -> String {
    let mut body = String::from("<main class=\"center\">\n");
    body.push_str("<h2>Something went wrong</h2>\n");
    body.push_str(&format!("<p class=\"tagline\">{}</p>\n", escape(message)));
    body.push_str("<form method=\"post\" action=\"/back\">\n");
    body.push_str("<button type=\"submit\">Try again</button>\n");
    body.push_str("</form>\n");
    body.push_str("</main>");
    page("Error", &body, None)
}

/// Insert a script showing `message` in a browser alert before `</body>`
pub fn with_alert(html_doc: &str, message: &str) -> String {
    // serde_json gives a correctly quoted JS string literal
    let literal = serde_json::to_string(message).unwrap_or_else(|_| "\"\"".to_string());
    let script = format!(
        "<script>alert({});</script>\n",
        literal.replace("</", "<\\/")
    );

    match html_doc.rfind("</body>") {
        Some(pos) => {
            let mut html_doc = html_doc.to_string();
            html_doc.insert_str(pos, &script);
            html_doc
        }
        None => format!("{}{}", html_doc, script),
    }
}
