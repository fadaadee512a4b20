//! Single-user cell annotation: step through a per-user image sequence,
//! assign one label per cell, and persist the labels as they are made so
//! an interrupted run can be resumed.

pub mod classes;
pub mod config;
pub mod error;
pub mod images;
pub mod state;

pub use classes::{LabelCounts, LabelId};
pub use config::AppConfig;
pub use error::{ImageError, SessionError, TableError};
pub use images::ImageSequence;
pub use state::{AnnotationTable, Session, SessionView};
