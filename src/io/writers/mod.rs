//! Output writers: standalone HTML, PDF (external engine or built-in layout), and USX.
pub mod builtin;
pub mod html;
pub mod pdf;

pub use builtin::BuiltinEngine;
pub use html::{html_document, write_html};
pub use pdf::{CommandEngine, EngineError, PdfEngine, engine_for, write_pdf};
