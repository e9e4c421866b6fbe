//! Shared types and enums used across usfm2pdf.
//! Includes the document `Tag` set, `InputFormat` and `OutputFormat`.
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Element tags of a USX tree. Unknown tags are preserved as `Other`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Tag {
    Usx,
    Book,
    Chapter,
    Para,
    Verse,
    Char,
    Note,
    Other(String),
}

impl Tag {
    pub fn from_name(name: &str) -> Self {
        match name {
            "usx" => Tag::Usx,
            "book" => Tag::Book,
            "chapter" => Tag::Chapter,
            "para" => Tag::Para,
            "verse" => Tag::Verse,
            "char" => Tag::Char,
            "note" => Tag::Note,
            other => Tag::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Tag::Usx => "usx",
            Tag::Book => "book",
            Tag::Chapter => "chapter",
            Tag::Para => "para",
            Tag::Verse => "verse",
            Tag::Char => "char",
            Tag::Note => "note",
            Tag::Other(name) => name,
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum InputFormat {
    Usfm,
    Usx,
}

impl InputFormat {
    /// `.usx` and `.xml` files are read as USX, everything else as USFM.
    pub fn from_path(path: &Path) -> Self {
        match extension_lowercase(path).as_deref() {
            Some("usx") | Some("xml") => InputFormat::Usx,
            _ => InputFormat::Usfm,
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Usfm => write!(f, "USFM"),
            InputFormat::Usx => write!(f, "USX"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum OutputFormat {
    Pdf,
    Html,
    Usx, // Intermediate tree, for debugging the reader
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Html => "html",
            OutputFormat::Usx => "usx",
        }
    }

    /// Infer the format from an output file name; `None` for unknown extensions.
    pub fn from_path(path: &Path) -> Option<Self> {
        match extension_lowercase(path).as_deref() {
            Some("pdf") => Some(OutputFormat::Pdf),
            Some("html") | Some("htm") => Some(OutputFormat::Html),
            Some("usx") | Some("xml") => Some(OutputFormat::Usx),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Pdf => write!(f, "PDF"),
            OutputFormat::Html => write!(f, "HTML"),
            OutputFormat::Usx => write!(f, "USX"),
        }
    }
}

fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_follow_file_extensions() {
        assert_eq!(InputFormat::from_path(Path::new("a/GEN.USX")), InputFormat::Usx);
        assert_eq!(InputFormat::from_path(Path::new("01GEN.SFM")), InputFormat::Usfm);
        assert_eq!(InputFormat::from_path(Path::new("noext")), InputFormat::Usfm);
        assert_eq!(OutputFormat::from_path(Path::new("out.htm")), Some(OutputFormat::Html));
        assert_eq!(OutputFormat::from_path(Path::new("out.PDF")), Some(OutputFormat::Pdf));
        assert_eq!(OutputFormat::from_path(Path::new("out.docx")), None);
    }

    #[test]
    fn unknown_tags_round_trip_by_name() {
        assert_eq!(Tag::from_name("para"), Tag::Para);
        let other = Tag::from_name("table");
        assert_eq!(other, Tag::Other("table".to_string()));
        assert_eq!(other.as_str(), "table");
    }
}
