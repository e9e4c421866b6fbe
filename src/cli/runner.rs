use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use usfm2pdf::api::{
    AssumeYes, ConfirmOverwrite, FileOutcome, convert_plan, derive_output_path,
    expand_input_pattern,
};
use usfm2pdf::io::writers::{PdfEngine, engine_for};
use usfm2pdf::{BatchReport, ConvertParams, OutputFormat};

use super::args::CliArgs;
use super::errors::AppError;

/// Asks on stdout and reads the answer from stdin; only `y` overwrites.
pub struct StdinPrompt;

impl ConfirmOverwrite for StdinPrompt {
    fn confirm_overwrite(&mut self, output: &Path) -> io::Result<bool> {
        print!(
            "Output file {} already exists. Overwrite? (y/n): ",
            output.display()
        );
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }
}

fn build_params(args: &CliArgs) -> Result<ConvertParams, AppError> {
    let mut params = match &args.config {
        Some(path) => ConvertParams::from_json_file(path)?,
        None => ConvertParams::default(),
    };
    if args.format.is_some() {
        params.format = args.format;
    }
    if args.input_format.is_some() {
        params.input_format = args.input_format;
    }
    if let Some(header) = &args.header {
        params.style.header = Some(header.clone());
    }
    if let Some(url) = &args.noto_url {
        params.style.font_url = Some(url.clone());
    }
    if let Some(engine) = &args.engine {
        params.engine = engine.clone();
    }
    if args.strict {
        params.ignore_errors = false;
    }
    Ok(params)
}

/// Pair every input with its output path.
fn plan_outputs(
    inputs: &[PathBuf],
    output: Option<&Path>,
    output_dir: Option<&Path>,
    params: &ConvertParams,
) -> Result<Vec<(PathBuf, PathBuf)>, AppError> {
    if let [input] = inputs {
        if let Some(output) = output {
            return Ok(vec![(input.clone(), output.to_path_buf())]);
        }
    } else if output.is_some() {
        warn!("--output is ignored when the pattern matches several files");
    }

    let format = params.format.unwrap_or(OutputFormat::Pdf);
    inputs
        .iter()
        .map(|input| -> Result<(PathBuf, PathBuf), AppError> {
            let output = derive_output_path(input, output_dir, format)?;
            Ok((input.clone(), output))
        })
        .collect()
}

/// Convert every planned file, reporting each outcome on stdout. Failures are
/// counted and never stop the batch.
fn process_files(
    plan: &[(PathBuf, PathBuf)],
    params: &ConvertParams,
    engine: &dyn PdfEngine,
    confirm: &mut dyn ConfirmOverwrite,
) -> Result<BatchReport, AppError> {
    let report = convert_plan(plan, params, engine, confirm, true, &mut |input, output, outcome| {
        match outcome {
            FileOutcome::Created => println!("Created {}", output.display()),
            FileOutcome::Skipped => println!("Skipping {}", input.display()),
            FileOutcome::Failed(e) => println!("Error processing {}: {}", input.display(), e),
        }
    })?;
    Ok(report)
}

pub fn run(args: CliArgs) -> Result<(), AppError> {
    if args.log {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .init();
    }

    let params = build_params(&args)?;
    let inputs = expand_input_pattern(&args.input)?;
    if inputs.is_empty() {
        return Err(AppError::NoMatches {
            pattern: args.input.clone(),
        });
    }
    info!("Matched {} file(s) for {:?}", inputs.len(), args.input);

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)?;
    }
    let plan = plan_outputs(
        &inputs,
        args.output.as_deref(),
        args.output_dir.as_deref(),
        &params,
    )?;

    let engine = engine_for(&params);
    let report = if args.yes {
        process_files(&plan, &params, engine.as_ref(), &mut AssumeYes)?
    } else {
        process_files(&plan, &params, engine.as_ref(), &mut StdinPrompt)?
    };

    info!("Skipped: {}", report.skipped);
    info!("Errors: {}", report.errors);
    println!("Processed {} file(s).", report.processed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const USFM: &str = "\\id JHN\n\\c 1\n\\p\n\\v 1 In the beginning was the Word.\n";

    /// Answers every prompt with a fixed reply and counts the questions.
    struct Scripted {
        answer: bool,
        asked: usize,
    }

    impl ConfirmOverwrite for Scripted {
        fn confirm_overwrite(&mut self, _output: &Path) -> io::Result<bool> {
            self.asked += 1;
            Ok(self.answer)
        }
    }

    fn html_params() -> ConvertParams {
        ConvertParams {
            format: Some(OutputFormat::Html),
            engine: "usfm2pdf-no-such-engine".to_string(),
            ..ConvertParams::default()
        }
    }

    #[test]
    fn declined_overwrite_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("43JHN.usfm");
        let output = dir.path().join("43JHN.html");
        fs::write(&input, USFM).unwrap();
        fs::write(&output, "original").unwrap();

        let params = html_params();
        let engine = engine_for(&params);
        let plan = vec![(input, output.clone())];
        let mut prompt = Scripted {
            answer: false,
            asked: 0,
        };

        let report = process_files(&plan, &params, engine.as_ref(), &mut prompt).unwrap();
        assert_eq!(prompt.asked, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.processed, 0);
        assert_eq!(fs::read_to_string(&output).unwrap(), "original");

        let mut prompt = Scripted {
            answer: true,
            asked: 0,
        };
        let report = process_files(&plan, &params, engine.as_ref(), &mut prompt).unwrap();
        assert_eq!(report.processed, 1);
        assert!(fs::read_to_string(&output).unwrap().contains("In the beginning was the Word."));
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a.usfm");
        fs::write(&good, USFM).unwrap();
        let plan = vec![
            (dir.path().join("missing.usfm"), dir.path().join("missing.html")),
            (good, dir.path().join("a.html")),
        ];
        let params = html_params();
        let engine = engine_for(&params);

        let report = process_files(&plan, &params, engine.as_ref(), &mut AssumeYes).unwrap();
        assert_eq!(report.errors, 1);
        assert_eq!(report.processed, 1);
    }

    #[test]
    fn single_input_uses_explicit_output() {
        let inputs = vec![PathBuf::from("books/GEN.SFM")];
        let params = ConvertParams::default();
        let plan = plan_outputs(&inputs, Some(Path::new("review.pdf")), None, &params).unwrap();
        assert_eq!(plan[0].1, PathBuf::from("review.pdf"));

        let plan = plan_outputs(&inputs, None, Some(Path::new("out")), &params).unwrap();
        assert_eq!(plan[0].1, PathBuf::from("out/GEN.pdf"));
    }

    #[test]
    fn multiple_inputs_derive_names_and_ignore_output() {
        let inputs = vec![PathBuf::from("a/GEN.SFM"), PathBuf::from("a/EXO.SFM")];
        let params = ConvertParams::default();
        let plan = plan_outputs(&inputs, Some(Path::new("x.pdf")), None, &params).unwrap();
        assert_eq!(plan[0].1, PathBuf::from("a/GEN.pdf"));
        assert_eq!(plan[1].1, PathBuf::from("a/EXO.pdf"));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.json");
        fs::write(
            &config,
            r#"{ "style": { "header": "From config", "font_url": "https://a/b.css" }, "engine": "prince" }"#,
        )
        .unwrap();

        let args = CliArgs::parse_from([
            "usfm2pdf",
            "*.sfm",
            "--config",
            config.to_str().unwrap(),
            "--header",
            "From flag",
            "--strict",
        ]);
        let params = build_params(&args).unwrap();
        assert_eq!(params.style.header.as_deref(), Some("From flag"));
        assert_eq!(params.style.font_url.as_deref(), Some("https://a/b.css"));
        assert_eq!(params.engine, "prince");
        assert!(!params.ignore_errors);
    }
}
