//! The annotation session: a cursor over the image sequence, a pending
//! label, and the label table that is flushed as the cursor advances.

use crate::classes::{LabelCounts, LabelId};
use crate::config::AppConfig;
use crate::error::{SessionError, TableError};
use crate::images::ImageSequence;
use crate::state::table::AnnotationTable;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Snapshot of what the presentation layer should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub cursor: usize,
    pub total: usize,
    /// Index of the image to display; `None` once every cell is annotated.
    pub image: Option<usize>,
    pub pending_label: Option<LabelId>,
    pub counts: LabelCounts,
    pub can_advance: bool,
    pub can_retreat: bool,
}

impl SessionView {
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.total
    }

    pub fn heading(&self) -> String {
        if self.is_complete() {
            format!("All {} cells annotated", self.total)
        } else {
            format!("Cell #{}", self.cursor + 1)
        }
    }
}

#[derive(Debug)]
pub struct Session {
    images: ImageSequence,
    table: AnnotationTable,
    output: PathBuf,
    backup_every: NonZeroUsize,
    cursor: usize,
    pending: Option<LabelId>,
    can_retreat: bool,
}

/// Reject identifiers that cannot safely name a file.
fn validate_user(user: &str) -> Result<(), SessionError> {
    let unusable = user.is_empty()
        || user == "."
        || user == ".."
        || user.contains(['/', '\\', '\0']);
    if unusable {
        return Err(SessionError::InvalidUser(user.to_string()));
    }
    Ok(())
}

impl Session {
    /// Open (or resume) the session for `user` using the configured storage.
    pub fn initialize(user: &str, config: &AppConfig) -> Result<Self, SessionError> {
        validate_user(user)?;
        let input = config.storage.input_path(user);
        if !input.is_file() {
            return Err(SessionError::MissingImages(input));
        }
        let images = ImageSequence::load(&input)?;
        let session = Self::resume(
            images,
            config.storage.output_path(user),
            config.session.backup_every,
        )?;
        log::info!(
            "Session for '{}': {} cells, {} annotated, starting at cell #{}",
            user,
            session.len(),
            session.table.len(),
            session.cursor + 1
        );
        Ok(session)
    }

    /// Pair an already loaded image sequence with the table at `output`,
    /// picking up where a previous run left off.
    pub fn resume(
        images: ImageSequence,
        output: PathBuf,
        backup_every: NonZeroUsize,
    ) -> Result<Self, SessionError> {
        let prior = AnnotationTable::load(&output, images.len())?;
        let resumed = prior.is_some();
        let table = prior.unwrap_or_default();

        let mut cursor = table.len();
        if cursor == images.len() {
            // reopen on the last image rather than past the end
            cursor -= 1;
        }

        Ok(Self {
            images,
            table,
            output,
            backup_every,
            cursor,
            pending: None,
            can_retreat: resumed,
        })
    }

    pub fn images(&self) -> &ImageSequence {
        &self.images
    }

    pub fn table(&self) -> &AnnotationTable {
        &self.table
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Number of cells (N).
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn pending_label(&self) -> Option<LabelId> {
        self.pending
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.len()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            cursor: self.cursor,
            total: self.len(),
            image: (!self.is_complete()).then_some(self.cursor),
            pending_label: self.pending,
            counts: self.table.counts(),
            can_advance: self.pending.is_some() && !self.is_complete(),
            can_retreat: self.can_retreat,
        }
    }

    pub fn set_pending_label(&mut self, label: LabelId) -> SessionView {
        self.pending = Some(label);
        self.view()
    }

    pub fn clear_pending_label(&mut self) -> SessionView {
        self.pending = None;
        self.view()
    }

    /// Write the whole table to the output file.
    pub fn flush(&self) -> Result<(), TableError> {
        self.table.save(&self.output)?;
        log::debug!("Flushed {} rows to {}", self.table.len(), self.output.display());
        Ok(())
    }

    /// Commit the pending label for the current cell and move on.
    ///
    /// Without a pending label this only refreshes the view. If the flush
    /// fails the cursor stays put and the label stays pending, so calling
    /// again retries the same commit.
    pub fn advance(&mut self) -> Result<SessionView, TableError> {
        if let Some(label) = self.pending {
            let last = self.len() - 1;
            if self.cursor <= last {
                self.table.upsert(self.cursor, label);
                let finishing = self.cursor == last;
                if finishing || self.cursor % self.backup_every.get() != 0 {
                    self.flush()?;
                }
                if finishing {
                    self.cursor = self.len();
                    log::info!("All {} cells annotated", self.len());
                } else {
                    self.cursor += 1;
                }
            } else {
                self.flush()?;
            }
            self.pending = None;
        }
        self.can_retreat = self.cursor > 0;
        Ok(self.view())
    }

    /// Step back one cell, dropping the most recently inserted table row.
    ///
    /// The dropped row is the last one inserted, not necessarily the row
    /// for the new cursor. Rows always form the prefix `0..rows`, so this
    /// keeps the row count in step with the resume rule.
    pub fn retreat(&mut self) -> SessionView {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.table.pop_last();
            self.pending = None;
        } else {
            self.can_retreat = false;
        }
        self.view()
    }
}
