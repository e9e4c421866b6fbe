#![doc = r#"
usfm2pdf: turn USFM scripture files into two-column review documents.

This crate reads USFM (or already-parsed USX), walks the resulting element tree
once to produce HTML fragments, and pairs them with a print stylesheet: letter
pages, two text columns, a running header and page counters. The result is
written as a standalone HTML file, handed to an external HTML/CSS-to-PDF engine
(`weasyprint` by default), laid out in-process by the `builtin` engine, or
serialized back to USX.

Requirements
------------
- For PDF output through a command engine, a program on `PATH` that accepts
  `<engine> -s <css> <html> <pdf>`. The `builtin` engine needs nothing extra but
  only covers Latin scripts.
- Rust 2024 edition toolchain.

Quick start: convert a file
---------------------------
```rust,no_run
use std::path::Path;
use usfm2pdf::{convert_file_to_path, CommandEngine, ConvertParams, StyleOptions};

fn main() -> usfm2pdf::Result<()> {
    let params = ConvertParams {
        style: StyleOptions {
            header: Some("Draft for review".to_string()),
            font_url: None,
        },
        ..ConvertParams::default()
    };
    let engine = CommandEngine::new("weasyprint");

    convert_file_to_path(
        Path::new("01GEN.SFM"),
        Path::new("genesis.pdf"),
        &params,
        &engine,
    )
}
```

Render in memory
----------------
```rust
use usfm2pdf::{parse_usfm, render_document, StyleOptions};

let root = parse_usfm("\\id GEN\n\\c 1\n\\p\n\\v 1 In the beginning...", true).unwrap();
let doc = render_document(&root, &StyleOptions::default());
assert!(doc.markup.fragments[0].contains("GEN"));
assert!(doc.css.contains("column-count: 2;"));
```

PDF without external tools
--------------------------
```rust,no_run
use std::path::Path;
use usfm2pdf::{BuiltinEngine, ConvertParams, convert_file_to_path};

let engine = BuiltinEngine::new(Some("Draft for review".to_string()));
convert_file_to_path(Path::new("08RUT.SFM"), Path::new("ruth.pdf"), &ConvertParams::default(), &engine)?;
# Ok::<(), usfm2pdf::Error>(())
```

Error handling
--------------
All public functions return `usfm2pdf::Result<T>`; match on `usfm2pdf::Error` to
tell USFM problems from engine failures.

```rust,no_run
use std::path::Path;
use usfm2pdf::{convert_file_to_path, CommandEngine, ConvertParams, Error};

let engine = CommandEngine::new("weasyprint");
match convert_file_to_path(Path::new("bad.usfm"), Path::new("out.pdf"), &ConvertParams::default(), &engine) {
    Ok(()) => {}
    Err(Error::Usfm(e)) => eprintln!("USFM error: {e}"),
    Err(Error::Engine(e)) => eprintln!("Engine error: {e}"),
    Err(other) => eprintln!("Other error: {other}"),
}
```

Useful modules
--------------
- [`api`]: high-level entry points and batch helpers.
- [`core`]: element tree, markup emitter, stylesheet, parameters.
- [`io`]: USFM/USX readers and the HTML/PDF/USX writers.
- [`types`]: `Tag`, `InputFormat`, `OutputFormat`.
- [`error`]: crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::element::Element;
pub use crate::core::markup::{Markup, ParaClass, emit_markup};
pub use crate::core::params::{BUILTIN_ENGINE, ConvertParams, DEFAULT_ENGINE, StyleOptions};
pub use crate::core::stylesheet::generate_css;
pub use error::{Error, Result};
pub use types::{InputFormat, OutputFormat, Tag};

// Readers and writers
pub use io::writers::{BuiltinEngine, CommandEngine, EngineError, PdfEngine, engine_for};
pub use io::{UsfmError, UsxError, parse_usfm, parse_usx, to_usx_string};

// High-level API re-exports
pub use api::{
    AssumeYes, BatchReport, ConfirmOverwrite, FileOutcome, KeepExisting, RenderedDocument,
    convert_file_to_path, convert_paths, convert_plan, derive_output_path, expand_input_pattern,
    load_document, render_document, write_document,
};
