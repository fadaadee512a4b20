//! Session state for the annotator application.
//!
//! This module contains:
//! - The annotation table and its CSV persistence
//! - The annotation session (cursor, pending label, flush cadence)

mod session;
mod table;

pub use session::*;
pub use table::*;
