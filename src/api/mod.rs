//! High-level library API: read USFM/USX files, render them to HTML fragments
//! and a stylesheet, and write PDF, HTML or USX outputs. Prefer these entry
//! points over the low-level `core` and `io` modules when embedding usfm2pdf.
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::element::Element;
use crate::core::markup::{Markup, emit_markup};
use crate::core::params::{ConvertParams, StyleOptions};
use crate::core::stylesheet::generate_css;
use crate::error::{Error, Result};
use crate::io::writers::{PdfEngine, write_html, write_pdf};
use crate::io::{parse_usfm, parse_usx, to_usx_string};
use crate::types::{InputFormat, OutputFormat};

/// Markup and stylesheet of one document, ready to be written
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub markup: Markup,
    pub css: String,
}

/// Read an input file into an element tree.
pub fn load_document(input: &Path, params: &ConvertParams) -> Result<Element> {
    let text = std::fs::read_to_string(input)?;
    let root = match params.input_format_for(input) {
        InputFormat::Usfm => parse_usfm(&text, params.ignore_errors)?,
        InputFormat::Usx => parse_usx(&text)?,
    };
    Ok(root)
}

pub fn render_document(root: &Element, style: &StyleOptions) -> RenderedDocument {
    RenderedDocument {
        markup: emit_markup(root),
        css: generate_css(style),
    }
}

/// Write `root` to `output` in the given format.
pub fn write_document(
    root: &Element,
    output: &Path,
    format: OutputFormat,
    params: &ConvertParams,
    engine: &dyn PdfEngine,
) -> Result<()> {
    match format {
        OutputFormat::Usx => std::fs::write(output, to_usx_string(root)?)?,
        OutputFormat::Html => {
            let doc = render_document(root, &params.style);
            write_html(output, &doc.markup, &doc.css)?;
        }
        OutputFormat::Pdf => {
            let doc = render_document(root, &params.style);
            write_pdf(output, &doc.markup, &doc.css, engine)?;
        }
    }
    Ok(())
}

/// Convert a single input file to `output`, overwriting it if present.
pub fn convert_file_to_path(
    input: &Path,
    output: &Path,
    params: &ConvertParams,
    engine: &dyn PdfEngine,
) -> Result<()> {
    let format = params.output_format_for(output);
    info!("Converting {:?} -> {:?} ({})", input, output, format);
    let root = load_document(input, params)?;
    write_document(&root, output, format, params, engine)
}

/// Output path for `input`: its basename with the format's extension, placed in
/// `output_dir` when given, otherwise next to the input.
pub fn derive_output_path(
    input: &Path,
    output_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<PathBuf> {
    let stem = input.file_stem().ok_or_else(|| Error::InvalidArgument {
        arg: "input",
        value: input.display().to_string(),
    })?;
    let file_name = Path::new(stem).with_extension(format.extension());
    Ok(match output_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    })
}

/// Expand a glob pattern to the regular files it matches, in sorted order.
pub fn expand_input_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|e| Error::InvalidArgument {
        arg: "pattern",
        value: format!("{pattern} ({e})"),
    })?;
    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable path: {}", e),
        }
    }
    files.sort();
    Ok(files)
}

/// Summary of a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Decides whether an existing output file may be replaced.
pub trait ConfirmOverwrite {
    fn confirm_overwrite(&mut self, output: &Path) -> std::io::Result<bool>;
}

/// Replaces existing outputs without asking.
pub struct AssumeYes;

impl ConfirmOverwrite for AssumeYes {
    fn confirm_overwrite(&mut self, _output: &Path) -> std::io::Result<bool> {
        Ok(true)
    }
}

/// Leaves existing outputs alone.
pub struct KeepExisting;

impl ConfirmOverwrite for KeepExisting {
    fn confirm_overwrite(&mut self, _output: &Path) -> std::io::Result<bool> {
        Ok(false)
    }
}

/// What happened to one planned conversion
#[derive(Debug)]
pub enum FileOutcome {
    Created,
    /// The output existed and replacing it was declined
    Skipped,
    Failed(Error),
}

/// Convert every `(input, output)` pair of `plan`.
///
/// Existing outputs are only replaced when `confirm` agrees; declined files are
/// counted as skipped. `on_file` sees each outcome as it happens. If
/// `continue_on_error` is false, the first failure is returned instead.
pub fn convert_plan(
    plan: &[(PathBuf, PathBuf)],
    params: &ConvertParams,
    engine: &dyn PdfEngine,
    confirm: &mut dyn ConfirmOverwrite,
    continue_on_error: bool,
    on_file: &mut dyn FnMut(&Path, &Path, &FileOutcome),
) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    for (input, output) in plan {
        let outcome = match confirm_output(output, confirm) {
            Ok(true) => match convert_file_to_path(input, output, params, engine) {
                Ok(()) => FileOutcome::Created,
                Err(e) => FileOutcome::Failed(e),
            },
            Ok(false) => FileOutcome::Skipped,
            Err(e) => FileOutcome::Failed(e),
        };

        match outcome {
            FileOutcome::Created => report.processed += 1,
            FileOutcome::Skipped => report.skipped += 1,
            FileOutcome::Failed(e) if !continue_on_error => return Err(e),
            FileOutcome::Failed(_) => report.errors += 1,
        }
        on_file(input, output, &outcome);
    }
    Ok(report)
}

fn confirm_output(output: &Path, confirm: &mut dyn ConfirmOverwrite) -> Result<bool> {
    if !output.exists() {
        return Ok(true);
    }
    Ok(confirm.confirm_overwrite(output)?)
}

/// Convert many inputs into `output_dir` (or next to each input).
///
/// Outputs are named by [`derive_output_path`] using `params.format` (PDF when
/// unset). With `overwrite` false, inputs whose output already exists are
/// skipped. If `continue_on_error` is true, failures are counted and the batch
/// goes on; otherwise the first error is returned.
pub fn convert_paths(
    inputs: &[PathBuf],
    output_dir: Option<&Path>,
    params: &ConvertParams,
    engine: &dyn PdfEngine,
    overwrite: bool,
    continue_on_error: bool,
) -> Result<BatchReport> {
    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)?;
    }
    let format = params.format.unwrap_or(OutputFormat::Pdf);
    let plan = inputs
        .iter()
        .map(|input| -> Result<(PathBuf, PathBuf)> {
            Ok((input.clone(), derive_output_path(input, output_dir, format)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut log_outcome = |input: &Path, _output: &Path, outcome: &FileOutcome| match outcome {
        FileOutcome::Created => {}
        FileOutcome::Skipped => info!("Skipping {:?}: output exists", input),
        FileOutcome::Failed(e) => warn!("Error processing {:?}: {}", input, e),
    };
    if overwrite {
        convert_plan(&plan, params, engine, &mut AssumeYes, continue_on_error, &mut log_outcome)
    } else {
        convert_plan(&plan, params, engine, &mut KeepExisting, continue_on_error, &mut log_outcome)
    }
}
