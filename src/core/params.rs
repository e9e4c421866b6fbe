use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{InputFormat, OutputFormat};

pub const DEFAULT_ENGINE: &str = "weasyprint";

/// Engine name selecting the in-process renderer instead of an external program
pub const BUILTIN_ENGINE: &str = "builtin";

/// Knobs of the generated stylesheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOptions {
    /// Running header printed top-center on every page
    pub header: Option<String>,
    /// Stylesheet imported ahead of everything else, e.g. a Noto Serif web font
    pub font_url: Option<String>,
}

/// Conversion parameters suitable for config files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertParams {
    /// None infers the format from the output file name, falling back to PDF
    pub format: Option<OutputFormat>,
    /// None infers the format from the input file name
    pub input_format: Option<InputFormat>,
    pub style: StyleOptions,
    /// Recover from malformed USFM instead of failing the file
    pub ignore_errors: bool,
    /// HTML-to-PDF program, invoked as `<engine> -s <css> <html> <pdf>`,
    /// or [`BUILTIN_ENGINE`]
    pub engine: String,
}

impl Default for ConvertParams {
    fn default() -> Self {
        Self {
            format: None,
            input_format: None,
            style: StyleOptions::default(),
            ignore_errors: true,
            engine: DEFAULT_ENGINE.to_string(),
        }
    }
}

impl ConvertParams {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| Error::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn output_format_for(&self, output: &Path) -> OutputFormat {
        self.format
            .or_else(|| OutputFormat::from_path(output))
            .unwrap_or(OutputFormat::Pdf)
    }

    pub fn input_format_for(&self, input: &Path) -> InputFormat {
        self.input_format
            .unwrap_or_else(|| InputFormat::from_path(input))
    }
}
