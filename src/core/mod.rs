//! Core building blocks: the element tree, conversion parameters, the markup
//! emitter and the stylesheet generator. These are consumed by the high-level
//! `api` module.
pub mod element;
pub mod markup;
pub mod params;
pub mod stylesheet;
