//! I/O layer: the USFM and USX readers, the USX writer, and the output
//! `writers` for HTML and PDF documents.
pub mod usfm;
pub use usfm::{UsfmError, parse_usfm};

pub mod usx;
pub use usx::{UsxError, parse_usx, to_usx_string};

pub mod writers;
