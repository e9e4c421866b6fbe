//! PDF output: the engine trait, the external command engine and engine selection.
use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::markup::Markup;
use crate::core::params::{BUILTIN_ENGINE, ConvertParams};
use crate::io::writers::builtin::BuiltinEngine;
use crate::io::writers::html::html_document;

/// Errors raised while rendering a PDF
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("cannot read markup: {0}")]
    Markup(#[from] quick_xml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that turns rendered markup plus its stylesheet into a PDF file.
pub trait PdfEngine {
    fn render(&self, markup: &Markup, css: &str, output: &Path) -> Result<(), EngineError>;
}

/// Engine driven through a command line of the form `<program> -s <css> <html> <pdf>`,
/// which is what `weasyprint` accepts.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    pub program: String,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, html: &Path, css: &Path, output: &Path) -> Result<(), EngineError> {
        debug!("Running {} on {:?}", self.program, html);
        let result = Command::new(&self.program)
            .arg("-s")
            .arg(css)
            .arg(html)
            .arg(output)
            .output()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !result.status.success() {
            return Err(EngineError::Failed {
                program: self.program.clone(),
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl PdfEngine for CommandEngine {
    fn render(&self, markup: &Markup, css: &str, output: &Path) -> Result<(), EngineError> {
        with_temp_inputs(markup, css, |html, css| self.run(html, css, output))
    }
}

fn temp_file_with(suffix: &str, contents: &str) -> Result<NamedTempFile, EngineError> {
    let mut file = tempfile::Builder::new()
        .prefix("usfm2pdf_")
        .suffix(suffix)
        .tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Write the HTML document (without inline style) and the stylesheet to
/// temporary files and pass their paths to `render`. Both files are removed
/// whether or not `render` succeeds.
fn with_temp_inputs<F>(markup: &Markup, css: &str, render: F) -> Result<(), EngineError>
where
    F: FnOnce(&Path, &Path) -> Result<(), EngineError>,
{
    let html_file = temp_file_with(".html", &html_document(markup, None))?;
    let css_file = temp_file_with(".css", css)?;

    let rendered = render(html_file.path(), css_file.path());
    let cleanup = html_file.close().and(css_file.close());
    rendered?;
    cleanup?;
    Ok(())
}

/// Engine named by `params.engine`: [`BUILTIN_ENGINE`] renders in-process,
/// anything else is run as an external program.
pub fn engine_for(params: &ConvertParams) -> Box<dyn PdfEngine> {
    if params.engine == BUILTIN_ENGINE {
        Box::new(BuiltinEngine::new(params.style.header.clone()))
    } else {
        Box::new(CommandEngine::new(params.engine.clone()))
    }
}

/// Render the markup to `output` with `engine`.
pub fn write_pdf(
    output: &Path,
    markup: &Markup,
    css: &str,
    engine: &dyn PdfEngine,
) -> Result<(), EngineError> {
    engine.render(markup, css, output)?;
    info!("PDF created: {:?}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    fn sample() -> Markup {
        Markup {
            title: Some("GEN".to_string()),
            fragments: vec!["<p class=\"paragraph\">x</p>".to_string()],
        }
    }

    /// Runs `with_temp_inputs` and returns the temp paths it saw.
    fn record_temp_paths(fail: bool, output: &Path) -> (Result<(), EngineError>, Vec<PathBuf>) {
        let seen = RefCell::new(Vec::new());
        let result = with_temp_inputs(&sample(), "p {}", |html, css| {
            assert!(std::fs::read_to_string(html).unwrap().contains("bible-content"));
            assert!(!std::fs::read_to_string(html).unwrap().contains("<style>"));
            assert_eq!(std::fs::read_to_string(css).unwrap(), "p {}");
            seen.borrow_mut().extend([html.to_path_buf(), css.to_path_buf()]);
            if fail {
                return Err(EngineError::Io(std::io::Error::other("boom")));
            }
            std::fs::write(output, b"%PDF-1.7").map_err(EngineError::from)
        });
        (result, seen.into_inner())
    }

    #[test]
    fn temp_files_are_removed_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");

        let (result, seen) = record_temp_paths(false, &output);
        result.unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"%PDF-1.7");
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|p| !p.exists()));
    }

    #[test]
    fn temp_files_are_removed_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");

        let (result, seen) = record_temp_paths(true, &output);
        assert!(result.is_err());

        assert!(!output.exists());
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|p| !p.exists()));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = CommandEngine::new("usfm2pdf-no-such-engine");
        let err = write_pdf(&dir.path().join("out.pdf"), &sample(), "p {}", &engine).unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }));
        assert!(err.to_string().contains("usfm2pdf-no-such-engine"));
    }

    #[test]
    fn builtin_engine_is_selected_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");
        let params = ConvertParams {
            engine: BUILTIN_ENGINE.to_string(),
            ..ConvertParams::default()
        };

        write_pdf(&output, &sample(), "p {}", engine_for(&params).as_ref()).unwrap();
        assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF"));
    }
}
