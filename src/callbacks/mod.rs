//! Callback handlers for the annotator application.
//!
//! - `annotation` - label selection, save-and-next, previous

pub mod annotation;

pub use annotation::{render, setup_annotation_callbacks};
