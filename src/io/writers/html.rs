use std::path::Path;

use quick_xml::escape::escape;

use crate::core::markup::Markup;

pub const SIDE_NOTICE: &str = "NOTE: This PDF is for review purposes only and does not reflect all USFM content. Footnotes and other elements are omitted.";

pub const DEFAULT_TITLE: &str = "Bible Text";

/// Assemble a complete HTML document around the emitted fragments.
/// `inline_css` is embedded in the head; PDF rendering passes the stylesheet separately.
pub fn html_document(markup: &Markup, inline_css: Option<&str>) -> String {
    let title = markup.title.as_deref().unwrap_or(DEFAULT_TITLE);
    let generated = chrono::Utc::now().to_rfc3339();

    let mut html = vec![
        "<!DOCTYPE html>".to_string(),
        "<html>".to_string(),
        "<head>".to_string(),
        r#"<meta charset="UTF-8">"#.to_string(),
        format!(
            r#"<meta name="generator" content="usfm2pdf {}">"#,
            env!("CARGO_PKG_VERSION")
        ),
        format!(r#"<meta name="generated" content="{}">"#, generated),
        format!("<title>{}</title>", escape(title)),
    ];
    if let Some(css) = inline_css {
        html.push(format!("<style>{}</style>", css));
    }
    html.push("</head>".to_string());
    html.push("<body>".to_string());
    html.push(format!(r#"<div class="side-notice">{}</div>"#, SIDE_NOTICE));
    html.push(r#"<div class="bible-content">"#.to_string());
    html.extend(markup.fragments.iter().cloned());
    html.push("</div>".to_string());
    html.push("</body>".to_string());
    html.push("</html>".to_string());

    html.join("\n")
}

pub fn write_html(output: &Path, markup: &Markup, css: &str) -> std::io::Result<()> {
    std::fs::write(output, html_document(markup, Some(css)))
}
