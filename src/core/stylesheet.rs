//! Print stylesheet for the review document: letter pages, two text columns,
//! running header and page counters.
use crate::core::params::StyleOptions;

const MAIN_CSS: &str = r#"
body {
    font-family: Noto Serif, serif;
    font-size: 9pt;
    line-height: 1.4;
    color: oklch(0.208 0.042 265.755);
}

/* Disclaimer running up the left margin */
.side-notice {
    position: absolute;
    left: -0.4in;
    top: 50%;
    width: 7in;
    transform: rotate(270deg) translateX(-50%);
    transform-origin: left top;
    font-size: 8pt;
    color: oklch(0.554 0.046 257.417);
    text-align: center;
    font-style: italic;
}

.bible-content {
    margin: 0 auto;
    column-count: 2;
    column-gap: 2em;
    column-rule: 1px solid oklch(0.929 0.013 255.508);
}

.book-title, .introductory-material {
    column-span: all;
}

.book-title {
    font-size: 14pt;
    font-weight: bold;
    text-align: center;
    margin-bottom: 1em;
}

.book-title ~ .section-heading,
.introductory-material ~ .section-heading,
.book-title ~ .paragraph,
.introductory-material ~ .paragraph {
    margin-top: 0;
}

.chapter-number {
    font-size: 16pt;
    font-weight: bold;
    margin: 0 0.2em;
    float: left;
}

.paragraph {
    text-indent: 1.5em;
    margin-bottom: 0.5em;
    text-align: justify;
}

.paragraph.suppress-indent {
    text-indent: 0;
}

.section-heading {
    font-size: 9pt;
    font-weight: bold;
    margin-top: 1em;
    margin-bottom: 0.5em;
    text-indent: 0;
}

.poetry-q1 {
    margin-left: 1.5em;
    text-indent: 0;
}

.paragraph ~ .poetry-q1,
.poetry-q1 ~ .poetry-q2,
.poetry-q2 ~ .poetry-q1 {
    margin-top: -0.5em;
}

.poetry-q2 {
    margin-left: 2.5em;
    text-indent: 0;
}

.verse-number {
    font-size: 6pt;
    color: oklch(0.546 0.245 262.881);
    font-weight: bold;
    vertical-align: super;
    margin-right: 0.2em;
}

.divine-name {
    font-variant: small-caps;
    font-weight: bold;
}

.blank-line {
    height: 0.8em;
}

p {
    orphans: 2;
    widows: 2;
}
"#;

/// Escape a value for use inside a quoted CSS string.
///
/// `<` becomes a hex escape so the stylesheet can be inlined in a `<style>`
/// element without `</style>` ever appearing in it.
fn escape_css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.replace("\r\n", "\n").chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '<' => out.push_str("\\3C "),
            '\n' | '\r' => out.push_str("\\A "),
            c => out.push(c),
        }
    }
    out
}

fn page_css(header: Option<&str>) -> String {
    let header_css = match header {
        Some(text) if !text.is_empty() => format!(
            r#"
        @top-center {{
            content: "{}";
            font-family: Noto Serif, serif;
            font-weight: bold;
            font-size: 9pt;
            color: oklch(0.554 0.046 257.417);
        }}
"#,
            escape_css_string(text)
        ),
        _ => String::new(),
    };

    format!(
        r#"
@page:first {{
    size: letter;
    margin: 1in;
{header_css}
    @top-right {{
        content: "";
    }}

    @bottom-center {{
        content: counter(page);
        font-family: Noto Serif, serif;
        font-size: 9pt;
        color: oklch(0.208 0.042 265.755);
    }}
}}

@page {{
    size: letter;
    margin: 1in;
{header_css}
    @top-right {{
        content: counter(page);
        font-family: Noto Serif, serif;
        font-size: 9pt;
    }}
}}
"#
    )
}

/// Build the complete stylesheet for the given options.
///
/// `@import` must precede every other rule, so the font URL (when set) comes first.
pub fn generate_css(options: &StyleOptions) -> String {
    let mut css = String::new();
    if let Some(url) = options.font_url.as_deref().filter(|u| !u.is_empty()) {
        css.push_str(&format!("@import url('{}');\n", escape_css_string(url)));
    }
    css.push_str(&page_css(options.header.as_deref()));
    css.push_str(MAIN_CSS);
    css
}
