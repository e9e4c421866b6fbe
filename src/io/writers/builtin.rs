//! In-process PDF rendering with the standard PDF fonts.
//!
//! The markup fragments are read back with `quick-xml` and laid out in two
//! columns on letter pages. The stylesheet is not interpreted: block and span
//! classes map to fixed styles that follow it, and every page carries the
//! rotated review notice in its left margin. The standard fonts only cover
//! Latin text, so other scripts need an HTML/CSS engine.
use std::path::Path;

use printpdf::color::Color;
use printpdf::{
    BuiltinFont, Layer, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt, Rgb, TextItem,
    TextMatrix,
};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::core::markup::Markup;
use crate::io::writers::html::{DEFAULT_TITLE, SIDE_NOTICE};
use crate::io::writers::pdf::{EngineError, PdfEngine};

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const COLUMN_GAP: f32 = 18.0;
const COLUMN_WIDTH: f32 = (PAGE_WIDTH - 2.0 * MARGIN - COLUMN_GAP) / 2.0;
const CONTENT_HEIGHT: f32 = PAGE_HEIGHT - 2.0 * MARGIN;

const BODY_SIZE: f32 = 9.0;
const LEADING: f32 = 1.4;
const SPACE_WIDTH: f32 = BODY_SIZE * 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
enum RunStyle {
    Body,
    Intro,
    Heading,
    Title,
    DivineName,
    VerseNumber,
    ChapterNumber,
}

impl RunStyle {
    fn font(self) -> BuiltinFont {
        match self {
            RunStyle::Body => BuiltinFont::TimesRoman,
            RunStyle::Intro => BuiltinFont::TimesItalic,
            RunStyle::Heading | RunStyle::Title | RunStyle::DivineName | RunStyle::ChapterNumber => {
                BuiltinFont::TimesBold
            }
            RunStyle::VerseNumber => BuiltinFont::HelveticaBold,
        }
    }

    fn size(self) -> f32 {
        match self {
            RunStyle::Title => 14.0,
            RunStyle::ChapterNumber => 16.0,
            RunStyle::VerseNumber => 6.0,
            _ => BODY_SIZE,
        }
    }

    /// Baseline shift, for superscripts
    fn rise(self) -> f32 {
        match self {
            RunStyle::VerseNumber => 3.5,
            _ => 0.0,
        }
    }

    fn gap_after(self) -> f32 {
        match self {
            RunStyle::ChapterNumber => 4.0,
            RunStyle::VerseNumber => 1.0,
            _ => 0.0,
        }
    }

    /// Approximate advance width. The standard fonts carry no metrics here, so
    /// an average of half an em (a little less for Times) is used.
    fn width(self, text: &str) -> f32 {
        let em = match self {
            RunStyle::Body | RunStyle::Intro => 0.45,
            _ => 0.5,
        };
        text.chars().count() as f32 * self.size() * em
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BlockStyle {
    base: RunStyle,
    indent: f32,
    first_line_indent: f32,
    space_before: f32,
    space_after: f32,
}

impl BlockStyle {
    fn for_element(name: &[u8], classes: &[String]) -> Self {
        let has = |class: &str| classes.iter().any(|c| c == class);
        let plain = BlockStyle {
            base: RunStyle::Body,
            indent: 0.0,
            first_line_indent: 0.0,
            space_before: 0.0,
            space_after: 2.0,
        };
        match name {
            b"h1" => BlockStyle {
                base: RunStyle::Title,
                space_after: 10.0,
                ..plain
            },
            b"div" => BlockStyle {
                space_after: BODY_SIZE * 0.8,
                ..plain
            },
            _ if has("section-heading") => BlockStyle {
                base: RunStyle::Heading,
                space_before: 6.0,
                space_after: 4.0,
                ..plain
            },
            _ if has("introductory-material") => BlockStyle {
                base: RunStyle::Intro,
                ..plain
            },
            _ if has("poetry-q1") => BlockStyle {
                indent: BODY_SIZE * 1.5,
                space_after: 0.0,
                ..plain
            },
            _ if has("poetry-q2") => BlockStyle {
                indent: BODY_SIZE * 2.5,
                space_after: 0.0,
                ..plain
            },
            _ if has("suppress-indent") => plain,
            _ => BlockStyle {
                first_line_indent: BODY_SIZE * 1.5,
                ..plain
            },
        }
    }
}

fn span_style(classes: &[String], base: RunStyle) -> RunStyle {
    let has = |class: &str| classes.iter().any(|c| c == class);
    if has("chapter-number") {
        RunStyle::ChapterNumber
    } else if has("verse-number") {
        RunStyle::VerseNumber
    } else if has("divine-name") {
        RunStyle::DivineName
    } else {
        base
    }
}

#[derive(Debug)]
struct Block {
    style: BlockStyle,
    runs: Vec<(String, RunStyle)>,
}

fn class_list(start: &BytesStart<'_>) -> Result<Vec<String>, EngineError> {
    let mut classes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == b"class" {
            classes.extend(attr.unescape_value()?.split_whitespace().map(str::to_string));
        }
    }
    Ok(classes)
}

/// Read one markup fragment back into a styled block.
fn read_block(fragment: &str) -> Result<Option<Block>, EngineError> {
    let mut reader = Reader::from_str(fragment);
    let mut block: Option<Block> = None;
    let mut spans: Vec<RunStyle> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let classes = class_list(e)?;
                if let Some(b) = &block {
                    spans.push(span_style(&classes, b.style.base));
                } else {
                    block = Some(Block {
                        style: BlockStyle::for_element(e.name().as_ref(), &classes),
                        runs: Vec::new(),
                    });
                }
            }
            Event::End(_) => {
                spans.pop();
            }
            Event::Text(e) => {
                if let Some(b) = block.as_mut() {
                    let style = spans.last().copied().unwrap_or(b.style.base);
                    let text = e.unescape()?;
                    if !text.is_empty() {
                        b.runs.push((text.to_string(), style));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(block)
}

/// Pieces that must stay on one line, such as a verse number and its first word
#[derive(Debug, Default)]
struct Word {
    pieces: Vec<(String, RunStyle)>,
    width: f32,
}

impl Word {
    fn push(&mut self, text: &str, style: RunStyle) {
        self.width += style.width(text) + style.gap_after();
        self.pieces.push((text.to_string(), style));
    }
}

fn split_words(runs: &[(String, RunStyle)]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current = Word::default();
    for (text, style) in runs {
        // small capitals are not available in the standard fonts
        let text = match style {
            RunStyle::DivineName => text.to_uppercase(),
            _ => text.clone(),
        };
        for (i, part) in text.split(' ').enumerate() {
            if i > 0 && !current.pieces.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            if !part.is_empty() {
                current.push(part, *style);
            }
        }
    }
    if !current.pieces.is_empty() {
        words.push(current);
    }
    words
}

#[derive(Debug)]
struct Line {
    words: Vec<Word>,
    indent: f32,
}

impl Line {
    fn ascent(&self) -> f32 {
        self.words
            .iter()
            .flat_map(|w| w.pieces.iter())
            .map(|(_, style)| style.size())
            .fold(BODY_SIZE, f32::max)
    }

    fn width(&self) -> f32 {
        let words: f32 = self.words.iter().map(|w| w.width).sum();
        words + SPACE_WIDTH * self.words.len().saturating_sub(1) as f32
    }
}

/// Greedy line breaking into the column width.
fn break_lines(words: Vec<Word>, style: &BlockStyle) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line = Line {
        words: Vec::new(),
        indent: style.indent + style.first_line_indent,
    };
    let mut used = 0.0;

    for word in words {
        let needed = if line.words.is_empty() {
            word.width
        } else {
            used + SPACE_WIDTH + word.width
        };
        if !line.words.is_empty() && line.indent + needed > COLUMN_WIDTH {
            let next = Line {
                words: Vec::new(),
                indent: style.indent,
            };
            lines.push(std::mem::replace(&mut line, next));
            used = word.width;
        } else {
            used = needed;
        }
        line.words.push(word);
    }
    if !line.words.is_empty() {
        lines.push(line);
    }
    lines
}

fn place_text(ops: &mut Vec<Op>, text: &str, font: BuiltinFont, size: f32, matrix: TextMatrix) {
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(size),
        font,
    });
    ops.push(Op::SetTextMatrix { matrix });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(text.to_string())],
        font,
    });
}

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

/// Two-column text flow over letter pages
struct Flow {
    pages: Vec<Vec<Op>>,
    ops: Vec<Op>,
    column: usize,
    y: f32,
}

impl Flow {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            column: 0,
            y: 0.0,
        }
    }

    fn next_column(&mut self) {
        if self.column == 0 {
            self.column = 1;
        } else {
            self.pages.push(std::mem::take(&mut self.ops));
            self.column = 0;
        }
        self.y = 0.0;
    }

    /// Vertical space; dropped at the top of a column.
    fn skip(&mut self, amount: f32) {
        if self.y == 0.0 {
            return;
        }
        self.y += amount;
        if self.y >= CONTENT_HEIGHT {
            self.next_column();
        }
    }

    fn draw_line(&mut self, line: &Line) {
        let ascent = line.ascent();
        let height = ascent * LEADING;
        if self.y > 0.0 && self.y + height > CONTENT_HEIGHT {
            self.next_column();
        }
        let baseline = PAGE_HEIGHT - MARGIN - self.y - ascent;
        let mut x = MARGIN + self.column as f32 * (COLUMN_WIDTH + COLUMN_GAP) + line.indent;
        for word in &line.words {
            for (text, style) in &word.pieces {
                let matrix = TextMatrix::Translate(Pt(x), Pt(baseline + style.rise()));
                place_text(&mut self.ops, text, style.font(), style.size(), matrix);
                x += style.width(text) + style.gap_after();
            }
            x += SPACE_WIDTH;
        }
        self.y += height;
    }

    fn finish(mut self) -> Vec<Vec<Op>> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(self.ops);
        }
        self.pages
    }
}

/// Lay out every fragment and return the content operations of each page.
fn layout(markup: &Markup) -> Result<Vec<Vec<Op>>, EngineError> {
    let mut flow = Flow::new();
    for fragment in &markup.fragments {
        let Some(block) = read_block(fragment)? else {
            continue;
        };
        flow.skip(block.style.space_before);
        for line in break_lines(split_words(&block.runs), &block.style) {
            flow.draw_line(&line);
        }
        flow.skip(block.style.space_after);
    }
    Ok(flow.finish())
}

/// Renders the markup in-process; needs no external program.
#[derive(Debug, Clone, Default)]
pub struct BuiltinEngine {
    /// Running header drawn top-center on every page
    pub header: Option<String>,
}

impl BuiltinEngine {
    pub fn new(header: Option<String>) -> Self {
        Self { header }
    }

    /// Notice, header and page number of page `number` (1-based).
    fn page_furniture(&self, number: usize) -> Vec<Op> {
        let mut ops = vec![Op::SetFillColor {
            col: rgb(0.38, 0.45, 0.56),
        }];
        place_text(
            &mut ops,
            SIDE_NOTICE,
            BuiltinFont::Helvetica,
            7.0,
            TextMatrix::TranslateRotate(Pt(MARGIN / 2.0), Pt(MARGIN), 90.0),
        );

        ops.push(Op::SetFillColor {
            col: rgb(0.0, 0.0, 0.0),
        });
        let top = PAGE_HEIGHT - MARGIN / 2.0;
        if let Some(header) = self.header.as_deref().filter(|h| !h.is_empty()) {
            let x = (PAGE_WIDTH - RunStyle::Heading.width(header)) / 2.0;
            place_text(
                &mut ops,
                header,
                BuiltinFont::TimesBold,
                BODY_SIZE,
                TextMatrix::Translate(Pt(x), Pt(top)),
            );
        }

        // first page: bottom center, later pages: top right
        let label = number.to_string();
        let width = RunStyle::Body.width(&label);
        let (x, y) = if number == 1 {
            ((PAGE_WIDTH - width) / 2.0, MARGIN / 2.0)
        } else {
            (PAGE_WIDTH - MARGIN - width, top)
        };
        place_text(
            &mut ops,
            &label,
            BuiltinFont::TimesRoman,
            BODY_SIZE,
            TextMatrix::Translate(Pt(x), Pt(y)),
        );
        ops
    }

    /// Lay out `markup` and return the PDF bytes.
    pub fn render_bytes(&self, markup: &Markup) -> Result<Vec<u8>, EngineError> {
        let pages = layout(markup)?;
        let title = markup.title.as_deref().unwrap_or(DEFAULT_TITLE);
        let mut doc = PdfDocument::new(title);

        for (i, content) in pages.into_iter().enumerate() {
            let layer_name = format!("Page {} Layer 1", i + 1);
            let layer_id = doc.add_layer(&Layer::new(&*layer_name));
            let mut ops = vec![Op::BeginLayer { layer_id }, Op::StartTextSection];
            ops.extend(self.page_furniture(i + 1));
            ops.extend(content);
            ops.push(Op::EndTextSection);
            doc.pages.push(PdfPage::new(Mm(215.9), Mm(279.4), ops));
        }

        let mut warnings = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(
            "Laid out {} page(s), {} warning(s)",
            doc.pages.len(),
            warnings.len()
        );
        Ok(bytes)
    }
}

impl PdfEngine for BuiltinEngine {
    fn render(&self, markup: &Markup, _css: &str, output: &Path) -> Result<(), EngineError> {
        std::fs::write(output, self.render_bytes(markup)?)?;
        Ok(())
    }
}
