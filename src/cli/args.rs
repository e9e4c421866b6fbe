use clap::Parser;
use std::path::PathBuf;

use usfm2pdf::{InputFormat, OutputFormat};

#[derive(Parser, Debug)]
#[command(
    name = "usfm2pdf",
    version,
    about = "Convert USFM/USX files into two-column review PDFs"
)]
pub struct CliArgs {
    /// Input file or glob pattern (quote it to keep the shell from expanding it)
    pub input: String,

    /// Output file (single input only)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory for derived output files; defaults to each input's directory
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,

    /// Running header text printed at the top of every page
    #[arg(long)]
    pub header: Option<String>,

    /// URL of a stylesheet providing the Noto Serif font
    #[arg(long)]
    pub noto_url: Option<String>,

    /// Output format (pdf, html or usx); inferred from --output when omitted
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Input format (usfm or usx); inferred from the file extension when omitted
    #[arg(long, value_enum)]
    pub input_format: Option<InputFormat>,

    /// HTML-to-PDF program, called as `<engine> -s <css> <html> <pdf>`;
    /// `builtin` renders in-process instead
    #[arg(long)]
    pub engine: Option<String>,

    /// Fail on malformed USFM instead of recovering
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Overwrite existing output files without asking
    #[arg(short = 'y', long, default_value_t = false)]
    pub yes: bool,

    /// JSON file with conversion defaults; command-line flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
