//! USFM reader producing a USX-shaped element tree.
//!
//! The tree mirrors USX 3: `book` and `chapter` are direct children of the `usx`
//! root next to `para` elements, verses are milestones whose following text is
//! their tail, and notes carry their `fr`/`ft`/... parts as `char` children.
use std::iter::Peekable;
use std::sync::LazyLock;
use std::vec::IntoIter;

use logos::Logos;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::element::Element;
use crate::types::Tag;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsfmError {
    #[error("line {line}: unknown marker \\{marker}")]
    UnknownMarker { marker: String, line: usize },

    #[error("line {line}: \\{marker} is missing its {what}")]
    MissingArgument {
        marker: &'static str,
        what: &'static str,
        line: usize,
    },

    #[error("line {line}: \\{marker} outside of a paragraph")]
    OutsideParagraph { marker: String, line: usize },

    #[error("line {line}: text outside of a paragraph")]
    StrayText { line: usize },

    #[error("line {line}: closing marker \\{marker}* does not match an open marker")]
    UnmatchedClose { marker: String, line: usize },

    #[error("line {line}: \\{marker} is never closed")]
    Unclosed { marker: String, line: usize },
}

const PARA_MARKERS: &[&str] = &[
    // identification and headers
    "ide", "h", "toc", "toca", "rem", "sts", "usfm",
    // titles and headings
    "mt", "mte", "ms", "mr", "s", "sr", "r", "d", "sp", "sd", "cl", "cd",
    // introduction
    "imt", "imte", "is", "ip", "ipi", "im", "imi", "ipq", "imq", "ipr", "iq", "ib", "ili",
    "iot", "io", "iex", "ie",
    // body paragraphs, poetry and lists
    "p", "m", "po", "pr", "cls", "pmo", "pm", "pmc", "pmr", "pi", "mi", "nb", "pc", "ph", "b",
    "q", "qr", "qc", "qa", "qm", "qd", "lh", "li", "lf", "lim",
];

const CHAR_MARKERS: &[&str] = &[
    "add", "bk", "dc", "k", "nd", "ord", "pn", "png", "addpn", "qt", "sig", "sls", "tl", "wj",
    "em", "bd", "it", "bdit", "no", "sc", "sup", "w", "rb", "pro", "wg", "wh", "wa", "qs", "qac",
    "lik", "liv", "jmp", "ior", "iqt", "rq", "va", "vp", "ca", "cat", "fig",
];

const NOTE_MARKERS: &[&str] = &["f", "fe", "ef", "x", "ex"];

const NOTE_CHAR_MARKERS: &[&str] = &[
    "fr", "ft", "fk", "fq", "fqa", "fl", "fw", "fp", "fv", "fdc", "fm", "xo", "xk", "xq", "xt",
    "xta", "xop", "xot", "xnt", "xdc",
];

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum MarkerKind {
    Book,
    Chapter,
    Verse,
    Para,
    Char,
    Note,
    NoteChar,
    Unknown,
}

fn classify(name: &str) -> MarkerKind {
    match name {
        "id" => return MarkerKind::Book,
        "c" => return MarkerKind::Chapter,
        "v" => return MarkerKind::Verse,
        _ => {}
    }
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if PARA_MARKERS.contains(&base) {
        MarkerKind::Para
    } else if CHAR_MARKERS.contains(&base) {
        MarkerKind::Char
    } else if NOTE_MARKERS.contains(&name) {
        MarkerKind::Note
    } else if NOTE_CHAR_MARKERS.contains(&name) {
        MarkerKind::NoteChar
    } else {
        MarkerKind::Unknown
    }
}

/// Lexical pieces of USFM source.
///
/// A `//` only lexes as an optional break when it stands alone; inside a word
/// (`http://...`) the longer `Word` match wins.
#[derive(Logos, Debug, PartialEq, Clone, Copy)]
enum RawToken {
    /// `\name`, `\+name`, `\name*` or `\+name*`
    #[regex(r"\\\+?[A-Za-z0-9-]+\*?")]
    Marker,

    #[token("//")]
    OptionalBreak,

    #[regex(r"\r\n|\n|\r")]
    Newline,

    #[regex(r"[ \t]+")]
    Whitespace,

    #[regex(r"[^\\\r\n \t]+")]
    Word,

    // A backslash that does not start a marker is kept as text
    #[token("\\")]
    Backslash,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Marker {
        name: String,
        closing: bool,
        line: usize,
    },
    Text {
        text: String,
        line: usize,
    },
}

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapse whitespace runs and map USFM's `~` to a no-break space.
fn normalize_text(raw: &str) -> String {
    WHITESPACE_RUN.replace_all(raw, " ").replace('~', "\u{a0}")
}

/// Accumulates text between markers, remembering the line it started on.
#[derive(Default)]
struct PendingText {
    text: String,
    line: usize,
}

impl PendingText {
    fn push(&mut self, s: &str, line: usize) {
        if s.is_empty() {
            return;
        }
        if self.text.is_empty() {
            self.line = line;
        }
        self.text.push_str(s);
    }

    fn flush(&mut self, tokens: &mut Vec<Token>) {
        if !self.text.is_empty() {
            tokens.push(Token::Text {
                text: normalize_text(&self.text),
                line: self.line,
            });
            self.text.clear();
        }
    }
}

fn tokenize(src: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(src);
    let mut pending = PendingText::default();
    let mut line = 1;
    // An opening marker swallows the single whitespace character after it
    let mut after_marker = false;

    while let Some(result) = lexer.next() {
        let slice = lexer.slice();
        let swallow = std::mem::take(&mut after_marker);
        match result.unwrap_or(RawToken::Word) {
            RawToken::Marker => {
                pending.flush(&mut tokens);
                let closing = slice.ends_with('*');
                let name = slice
                    .trim_start_matches('\\')
                    .trim_start_matches('+')
                    .trim_end_matches('*');
                tokens.push(Token::Marker {
                    name: name.to_string(),
                    closing,
                    line,
                });
                after_marker = !closing;
            }
            RawToken::Newline => {
                if !swallow {
                    pending.push(slice, line);
                }
                line += 1;
            }
            RawToken::Whitespace => {
                let rest = if swallow { &slice[1..] } else { slice };
                pending.push(rest, line);
            }
            RawToken::OptionalBreak => pending.push(" ", line),
            RawToken::Word | RawToken::Backslash => pending.push(slice, line),
        }
    }
    pending.flush(&mut tokens);
    tokens
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenKind {
    Char,
    Note,
    NoteChar,
}

#[derive(Debug)]
struct Open {
    marker: String,
    kind: OpenKind,
    line: usize,
}

/// Builds the tree while walking the token stream.
///
/// Open inline elements are always the last child at each level, so the
/// innermost one is found by following `last_mut()` `open.len()` times.
struct TreeBuilder {
    root: Element,
    para_open: bool,
    open: Vec<Open>,
    ignore_errors: bool,
}

impl TreeBuilder {
    fn new(ignore_errors: bool) -> Self {
        let mut root = Element::new(Tag::Usx);
        root.set_attribute("version", "3.0".to_string());
        Self {
            root,
            para_open: false,
            open: Vec::new(),
            ignore_errors,
        }
    }

    /// Report a recoverable problem; fails unless errors are being ignored.
    fn recover(&self, err: UsfmError) -> Result<(), UsfmError> {
        if self.ignore_errors {
            warn!("Ignoring USFM error: {}", err);
            Ok(())
        } else {
            Err(err)
        }
    }

    fn current(&mut self) -> Option<&mut Element> {
        if !self.para_open {
            return None;
        }
        let mut node = self.root.children.last_mut()?;
        for _ in 0..self.open.len() {
            node = node.children.last_mut()?;
        }
        Some(node)
    }

    fn open_para(&mut self, style: &str) {
        self.root
            .children
            .push(Element::new(Tag::Para).with_style(style));
        self.para_open = true;
    }

    /// Make sure inline content has a paragraph to go into.
    fn require_para(&mut self, marker: &str, line: usize) -> Result<(), UsfmError> {
        if !self.para_open {
            self.recover(UsfmError::OutsideParagraph {
                marker: marker.to_string(),
                line,
            })?;
            self.open_para("p");
        }
        Ok(())
    }

    fn close_inline(&mut self) -> Result<(), UsfmError> {
        while let Some(open) = self.open.pop() {
            if open.kind != OpenKind::NoteChar {
                self.recover(UsfmError::Unclosed {
                    marker: open.marker,
                    line: open.line,
                })?;
            }
        }
        Ok(())
    }

    fn close_para(&mut self) -> Result<(), UsfmError> {
        self.close_inline()?;
        self.para_open = false;
        Ok(())
    }

    fn text(&mut self, text: &str, line: usize) -> Result<(), UsfmError> {
        if !self.para_open {
            if text.trim().is_empty() {
                return Ok(());
            }
            self.recover(UsfmError::StrayText { line })?;
            self.open_para("p");
        }
        let Some(node) = self.current() else {
            return Ok(());
        };
        let fresh = node.tag == Tag::Para && node.text.is_none() && node.children.is_empty();
        let text = if fresh { text.trim_start() } else { text };
        if !text.is_empty() {
            node.append_text(text);
        }
        Ok(())
    }

    fn push_inline(&mut self, elem: Element, open: Option<Open>) {
        if let Some(node) = self.current() {
            node.children.push(elem);
            if let Some(open) = open {
                self.open.push(open);
            }
        }
    }

    fn close_marker(&mut self, name: &str, line: usize) -> Result<(), UsfmError> {
        let top = self.open.len();
        let matches_at = |open: &[Open], i: usize| open.get(i).is_some_and(|o| o.marker == name);

        if top > 0 && matches_at(&self.open, top - 1) {
            self.open.pop();
        } else if top > 1
            && self.open[top - 1].kind == OpenKind::NoteChar
            && matches_at(&self.open, top - 2)
        {
            self.open.truncate(top - 2);
        } else {
            self.recover(UsfmError::UnmatchedClose {
                marker: name.to_string(),
                line,
            })?;
        }
        Ok(())
    }
}

/// Split the first word off the text token that follows a marker.
fn take_argument(tokens: &mut Peekable<IntoIter<Token>>) -> (Option<String>, String) {
    let Some(Token::Text { text, .. }) = tokens.peek() else {
        return (None, String::new());
    };
    let trimmed = text.trim_start();
    let (word, rest) = match trimmed.split_once(' ') {
        Some((word, rest)) => (word.to_string(), rest.to_string()),
        None => (trimmed.to_string(), String::new()),
    };
    tokens.next();
    if word.is_empty() {
        (None, rest)
    } else {
        (Some(word), rest)
    }
}

/// Parse USFM text into a USX-shaped tree.
///
/// With `ignore_errors` every malformed construct is logged and recovered from
/// instead of aborting: unknown markers are dropped, stray content opens an
/// implicit `\p`, unmatched closers are skipped and open markers auto-close.
pub fn parse_usfm(src: &str, ignore_errors: bool) -> Result<Element, UsfmError> {
    let mut builder = TreeBuilder::new(ignore_errors);
    let mut tokens = tokenize(src).into_iter().peekable();

    while let Some(token) = tokens.next() {
        let (name, closing, line) = match token {
            Token::Text { text, line } => {
                builder.text(&text, line)?;
                continue;
            }
            Token::Marker {
                name,
                closing,
                line,
            } => (name, closing, line),
        };

        if closing {
            builder.close_marker(&name, line)?;
            continue;
        }

        match classify(&name) {
            MarkerKind::Book => {
                builder.close_para()?;
                let (code, rest) = take_argument(&mut tokens);
                match code {
                    Some(code) => {
                        let mut book = Element::new(Tag::Book).with_code(code).with_style("id");
                        let rest = rest.trim();
                        if !rest.is_empty() {
                            book.text = Some(rest.to_string());
                        }
                        builder.root.children.push(book);
                    }
                    None => builder.recover(UsfmError::MissingArgument {
                        marker: "id",
                        what: "book code",
                        line,
                    })?,
                }
            }
            MarkerKind::Chapter => {
                builder.close_para()?;
                let (number, rest) = take_argument(&mut tokens);
                match number {
                    Some(number) => {
                        debug!("Chapter {} at line {}", number, line);
                        builder.root.children.push(
                            Element::new(Tag::Chapter)
                                .with_number(number)
                                .with_style("c"),
                        );
                    }
                    None => builder.recover(UsfmError::MissingArgument {
                        marker: "c",
                        what: "chapter number",
                        line,
                    })?,
                }
                builder.text(&rest, line)?;
            }
            MarkerKind::Verse => {
                builder.require_para("v", line)?;
                builder.close_inline()?;
                let (number, rest) = take_argument(&mut tokens);
                match number {
                    Some(number) => builder.push_inline(
                        Element::new(Tag::Verse).with_number(number).with_style("v"),
                        None,
                    ),
                    None => builder.recover(UsfmError::MissingArgument {
                        marker: "v",
                        what: "verse number",
                        line,
                    })?,
                }
                builder.text(&rest, line)?;
            }
            MarkerKind::Para => {
                builder.close_para()?;
                builder.open_para(&name);
            }
            MarkerKind::Char => {
                builder.require_para(&name, line)?;
                builder.push_inline(
                    Element::new(Tag::Char).with_style(name.as_str()),
                    Some(Open {
                        marker: name,
                        kind: OpenKind::Char,
                        line,
                    }),
                );
            }
            MarkerKind::Note => {
                builder.require_para(&name, line)?;
                let (caller, rest) = take_argument(&mut tokens);
                let mut note = Element::new(Tag::Note).with_style(name.as_str());
                note.caller = Some(caller.unwrap_or_else(|| "+".to_string()));
                builder.push_inline(
                    note,
                    Some(Open {
                        marker: name,
                        kind: OpenKind::Note,
                        line,
                    }),
                );
                builder.text(&rest, line)?;
            }
            MarkerKind::NoteChar => {
                if builder
                    .open
                    .last()
                    .is_some_and(|o| o.kind == OpenKind::NoteChar)
                {
                    builder.open.pop();
                }
                if builder.open.last().is_some_and(|o| o.kind == OpenKind::Note) {
                    builder.push_inline(
                        Element::new(Tag::Char).with_style(name.as_str()),
                        Some(Open {
                            marker: name,
                            kind: OpenKind::NoteChar,
                            line,
                        }),
                    );
                } else {
                    builder.recover(UsfmError::OutsideParagraph {
                        marker: name,
                        line,
                    })?;
                }
            }
            MarkerKind::Unknown => builder.recover(UsfmError::UnknownMarker {
                marker: name,
                line,
            })?,
        }
    }

    builder.close_para()?;
    Ok(builder.root)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS: &str = "\\id GEN World English Bible
\\h Genesis
\\mt1 The First Book of Moses,  Commonly Called Genesis
\\c 1
\\s1 The Creation
\\p
\\v 1 In the beginning, \\nd God\\nd* created the heavens and the earth.\\f + \\fr 1:1 \\ft Or, sky\\f*
\\v 2 The earth was formless~and empty.
\\b
\\q1
\\v 3 Let there be light.
";

    #[test]
    fn builds_usx_shaped_tree() {
        let root = parse_usfm(GENESIS, false).unwrap();
        assert_eq!(root.tag, Tag::Usx);

        let shape: Vec<(String, Option<&str>)> = root
            .children
            .iter()
            .map(|c| (c.tag.to_string(), c.style.as_deref()))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("book".to_string(), Some("id")),
                ("para".to_string(), Some("h")),
                ("para".to_string(), Some("mt1")),
                ("chapter".to_string(), Some("c")),
                ("para".to_string(), Some("s1")),
                ("para".to_string(), Some("p")),
                ("para".to_string(), Some("b")),
                ("para".to_string(), Some("q1")),
            ]
        );

        let book = &root.children[0];
        assert_eq!(book.code.as_deref(), Some("GEN"));
        assert_eq!(book.text.as_deref(), Some("World English Bible"));
        assert_eq!(
            root.children[2].text.as_deref(),
            Some("The First Book of Moses, Commonly Called Genesis ")
        );
        assert_eq!(root.children[3].number.as_deref(), Some("1"));
    }

    #[test]
    fn verses_chars_and_notes() {
        let root = parse_usfm(GENESIS, false).unwrap();
        let para = &root.children[5];
        assert_eq!(para.text, None);

        let v1 = &para.children[0];
        assert_eq!(v1.tag, Tag::Verse);
        assert_eq!(v1.number.as_deref(), Some("1"));
        assert_eq!(v1.tail.as_deref(), Some("In the beginning, "));

        let nd = &para.children[1];
        assert_eq!(nd.style.as_deref(), Some("nd"));
        assert_eq!(nd.text.as_deref(), Some("God"));
        assert_eq!(nd.tail.as_deref(), Some(" created the heavens and the earth."));

        let note = &para.children[2];
        assert_eq!(note.tag, Tag::Note);
        assert_eq!(note.caller.as_deref(), Some("+"));
        let parts: Vec<(&str, &str)> = note
            .children
            .iter()
            .map(|c| (c.style.as_deref().unwrap(), c.text.as_deref().unwrap()))
            .collect();
        assert_eq!(parts, vec![("fr", "1:1 "), ("ft", "Or, sky")]);
        assert_eq!(note.tail.as_deref(), Some(" "));

        let v2 = &para.children[3];
        assert_eq!(v2.number.as_deref(), Some("2"));
        assert_eq!(v2.tail.as_deref(), Some("The earth was formless\u{a0}and empty. "));

        let q1 = &root.children[7];
        assert_eq!(q1.children[0].number.as_deref(), Some("3"));
    }

    #[test]
    fn nested_char_markers_close_in_order() {
        let root = parse_usfm("\\c 1\n\\p \\wj Hear \\+nd Lord\\+nd*!\\wj* end", false).unwrap();
        let para = &root.children[1];
        let wj = &para.children[0];
        assert_eq!(wj.text.as_deref(), Some("Hear "));
        assert_eq!(wj.children[0].style.as_deref(), Some("nd"));
        assert_eq!(wj.children[0].tail.as_deref(), Some("!"));
        assert_eq!(wj.tail.as_deref(), Some(" end"));
    }

    #[test]
    fn strict_mode_reports_line_numbers() {
        let err = parse_usfm("\\id GEN\n\\c 1\n\\p\n\\zz odd\n", false).unwrap_err();
        assert_eq!(
            err,
            UsfmError::UnknownMarker {
                marker: "zz".to_string(),
                line: 4
            }
        );
        assert_eq!(err.to_string(), "line 4: unknown marker \\zz");

        let err = parse_usfm("\\c 1\n\\v 1 text", false).unwrap_err();
        assert!(matches!(err, UsfmError::OutsideParagraph { line: 2, .. }));

        let err = parse_usfm("\\c 1\n\\p \\nd Lord\n\\p next", false).unwrap_err();
        assert!(matches!(err, UsfmError::Unclosed { ref marker, line: 2 } if marker == "nd"));

        let err = parse_usfm("\\c 1\n\\p text\\wj*", false).unwrap_err();
        assert!(matches!(err, UsfmError::UnmatchedClose { .. }));

        let err = parse_usfm("\\c\n\\p", false).unwrap_err();
        assert!(matches!(err, UsfmError::MissingArgument { marker: "c", .. }));
    }

    #[test]
    fn tolerant_mode_recovers() {
        let src = "\\id GEN\n\\c 1\n\\v 1 first \\zz odd \\nd Lord\n\\p text\\wj* more";
        let root = parse_usfm(src, true).unwrap();

        let implicit = &root.children[2];
        assert_eq!(implicit.style.as_deref(), Some("p"));
        assert_eq!(implicit.children[0].tail.as_deref(), Some("first odd "));
        assert_eq!(implicit.children[1].text.as_deref(), Some("Lord "));

        let next = &root.children[3];
        assert_eq!(next.text.as_deref(), Some("text more"));
    }

    #[test]
    fn lexer_splits_markers_from_text() {
        let tokens = tokenize("\\v 1 a\\+nd b\\+nd*\n\\p");
        assert_eq!(
            tokens,
            vec![
                Token::Marker {
                    name: "v".to_string(),
                    closing: false,
                    line: 1
                },
                Token::Text {
                    text: "1 a".to_string(),
                    line: 1
                },
                Token::Marker {
                    name: "nd".to_string(),
                    closing: false,
                    line: 1
                },
                Token::Text {
                    text: "b".to_string(),
                    line: 1
                },
                Token::Marker {
                    name: "nd".to_string(),
                    closing: true,
                    line: 1
                },
                Token::Text {
                    text: " ".to_string(),
                    line: 1
                },
                Token::Marker {
                    name: "p".to_string(),
                    closing: false,
                    line: 2
                },
            ]
        );
    }

    #[test]
    fn slashes_inside_words_are_kept() {
        let root = parse_usfm("\\p \\v 2 see http://example.org now", false).unwrap();
        let verse = &root.children[0].children[0];
        assert_eq!(verse.tail.as_deref(), Some("see http://example.org now"));
    }

    #[test]
    fn standalone_optional_break_is_dropped() {
        let root = parse_usfm("\\q1 \\v 3 first line // second line\n", false).unwrap();
        let verse = &root.children[0].children[0];
        assert_eq!(verse.tail.as_deref(), Some("first line second line "));
    }

    #[test]
    fn stray_backslash_stays_in_the_text() {
        let root = parse_usfm("\\p a \\ b", false).unwrap();
        assert_eq!(root.children[0].text.as_deref(), Some("a \\ b"));
    }

    #[test]
    fn crlf_line_endings_count_lines() {
        let err = parse_usfm("\\id GEN\r\n\\c 1\r\n\\p\r\n\\qq x\r\n", false).unwrap_err();
        assert!(matches!(err, UsfmError::UnknownMarker { line: 4, .. }));
    }
}
