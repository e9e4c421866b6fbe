//! Tree walk that turns a USX element tree into HTML fragments.
//!
//! The walk is a single depth-first pass over the tree. Only `book`, `chapter` and
//! `para` elements produce output; a paragraph renders its direct children inline.
use quick_xml::escape::escape;
use tracing::debug;

use crate::core::element::Element;
use crate::types::Tag;

/// Presentation class of a `para` element.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ParaClass {
    SectionHeading,
    PoetryQ1,
    PoetryQ2,
    Blank,
    IntroductoryMaterial,
    Paragraph,
}

impl ParaClass {
    /// Classify a paragraph style. Unrecognized styles are plain paragraphs.
    pub fn classify(style: Option<&str>, in_intro: bool) -> Self {
        match style {
            Some("b") => ParaClass::Blank,
            Some("s" | "s1" | "s2" | "s3" | "s4") => ParaClass::SectionHeading,
            _ if in_intro => ParaClass::IntroductoryMaterial,
            Some(s) if s.starts_with('i') => ParaClass::IntroductoryMaterial,
            Some("q" | "q1") => ParaClass::PoetryQ1,
            Some("q2") => ParaClass::PoetryQ2,
            _ => ParaClass::Paragraph,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            ParaClass::SectionHeading => "section-heading",
            ParaClass::PoetryQ1 => "poetry-q1",
            ParaClass::PoetryQ2 => "poetry-q2",
            ParaClass::Blank => "blank-line",
            ParaClass::IntroductoryMaterial => "introductory-material",
            ParaClass::Paragraph => "paragraph",
        }
    }

    /// Whether the pending chapter label may be attached to a paragraph of this
    /// class. Heading styles that render as plain paragraphs are excluded by
    /// [`is_heading_style`].
    pub fn takes_chapter_label(&self) -> bool {
        matches!(
            self,
            ParaClass::Paragraph | ParaClass::PoetryQ1 | ParaClass::PoetryQ2
        )
    }
}

/// Title and heading styles other than `s`/`s1`-`s4`: major titles and
/// sections (`mt*`, `mte*`, `ms*`, `mr`), references (`r`, `sr`), speaker,
/// descriptive titles (`d`, `sd*`) and chapter labels (`cl`, `cd`).
pub fn is_heading_style(style: &str) -> bool {
    let base = style.trim_end_matches(|c: char| c.is_ascii_digit());
    matches!(
        base,
        "mt" | "mte" | "ms" | "mr" | "r" | "sr" | "sp" | "d" | "sd" | "cl" | "cd"
    )
}

struct RenderState {
    chapter: Option<String>,
    label_printed: bool,
    in_intro: bool,
}

impl RenderState {
    fn new() -> Self {
        Self {
            chapter: None,
            label_printed: false,
            in_intro: true,
        }
    }

    /// Chapter label for a paragraph of `class`, at most once per chapter.
    fn take_chapter_label(&mut self, class: ParaClass, style: Option<&str>) -> Option<&str> {
        if self.label_printed
            || !class.takes_chapter_label()
            || style.is_some_and(is_heading_style)
        {
            return None;
        }
        let chapter = self.chapter.as_deref()?;
        self.label_printed = true;
        Some(chapter)
    }
}

/// Output of the tree walk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Markup {
    /// Title of the first `book` element, if any
    pub title: Option<String>,
    pub fragments: Vec<String>,
}

pub fn emit_markup(root: &Element) -> Markup {
    let mut state = RenderState::new();
    let mut markup = Markup::default();

    for elem in root.iter() {
        match elem.tag {
            Tag::Book => {
                let title = book_title(elem);
                markup
                    .fragments
                    .push(format!(r#"<h1 class="book-title">{}</h1>"#, escape(title)));
                if markup.title.is_none() {
                    markup.title = Some(title.to_string());
                }
            }
            Tag::Chapter => {
                if let Some(number) = elem.number.as_deref().filter(|n| !n.is_empty()) {
                    debug!("Chapter {}", number);
                    state.chapter = Some(number.to_string());
                    state.label_printed = false;
                    state.in_intro = false;
                }
            }
            Tag::Para => {
                let class = ParaClass::classify(elem.style.as_deref(), state.in_intro);
                if class == ParaClass::Blank {
                    markup
                        .fragments
                        .push(r#"<div class="blank-line"></div>"#.to_string());
                    continue;
                }
                let label = state
                    .take_chapter_label(class, elem.style.as_deref())
                    .map(str::to_string);
                markup.fragments.push(render_para(elem, class, label.as_deref()));
            }
            _ => {}
        }
    }

    markup
}

fn book_title(book: &Element) -> &str {
    book.text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or(book.code.as_deref())
        .unwrap_or("")
}

fn render_para(para: &Element, class: ParaClass, chapter_label: Option<&str>) -> String {
    let mut out = String::new();
    match chapter_label {
        Some(chapter) => {
            out.push_str(&format!(
                r#"<p class="{} suppress-indent"><span class="chapter-number">{}</span>"#,
                class.css_class(),
                escape(chapter)
            ));
        }
        None => out.push_str(&format!(r#"<p class="{}">"#, class.css_class())),
    }

    push_text(&mut out, para.text.as_deref());

    for child in &para.children {
        match (&child.tag, child.style.as_deref()) {
            (Tag::Verse, _) if child.number.is_some() => {
                let number = child.number.as_deref().unwrap_or_default();
                // Verse 1 sits next to the chapter label
                if number != "1" {
                    out.push_str(&format!(
                        r#"<span class="verse-number">{}</span>"#,
                        escape(number)
                    ));
                }
                push_text(&mut out, child.text.as_deref());
            }
            (Tag::Char, Some("nd")) => {
                out.push_str(&format!(
                    r#"<span class="divine-name">{}</span>"#,
                    escape(child.text.as_deref().unwrap_or(""))
                ));
            }
            _ => push_text(&mut out, child.text.as_deref()),
        }
        push_text(&mut out, child.tail.as_deref());
    }

    out.push_str("</p>");
    out
}

fn push_text(out: &mut String, text: Option<&str>) {
    if let Some(t) = text {
        out.push_str(&escape(t));
    }
}
