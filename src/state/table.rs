//! The annotation table: one label per cell, kept in insertion order and
//! persisted as a `CellID,ClassID` CSV file.

use crate::classes::{LabelCounts, LabelId};
use crate::error::TableError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One annotated cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub cell: usize,
    pub label: LabelId,
}

/// On-disk row. Header names match the files already in the wild.
#[derive(Debug, Serialize, Deserialize)]
struct Record {
    #[serde(rename = "CellID")]
    cell_id: i64,
    #[serde(rename = "ClassID")]
    class_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationTable {
    rows: Vec<Annotation>,
}

impl AnnotationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[Annotation] {
        &self.rows
    }

    pub fn label_of(&self, cell: usize) -> Option<LabelId> {
        self.rows.iter().find(|a| a.cell == cell).map(|a| a.label)
    }

    /// Set the label for a cell, overwriting its existing row in place.
    pub fn upsert(&mut self, cell: usize, label: LabelId) {
        match self.rows.iter_mut().find(|a| a.cell == cell) {
            Some(row) => row.label = label,
            None => self.rows.push(Annotation { cell, label }),
        }
    }

    /// Drop the most recently inserted row, whichever cell it belongs to.
    pub fn pop_last(&mut self) -> Option<Annotation> {
        self.rows.pop()
    }

    pub fn counts(&self) -> LabelCounts {
        LabelCounts::from_labels(self.rows.iter().map(|a| a.label))
    }

    /// Load a table written by a previous run, validated against a
    /// sequence of `cells` images. Returns `None` when no file exists.
    pub fn load(path: &Path, cells: usize) -> Result<Option<Self>, TableError> {
        if !path.is_file() {
            return Ok(None);
        }
        let csv_err = |source: csv::Error| TableError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_err)?;

        let mut table = Self::new();
        let mut seen = HashSet::new();
        for record in reader.deserialize::<Record>() {
            let Record { cell_id, class_id } = record.map_err(csv_err)?;
            let cell = usize::try_from(cell_id)
                .ok()
                .filter(|c| *c < cells)
                .ok_or(TableError::CellOutOfRange {
                    cell: cell_id,
                    len: cells,
                })?;
            let label = LabelId::from_i64(class_id).ok_or(TableError::UnknownLabel {
                cell: cell_id,
                label: class_id,
            })?;
            if !seen.insert(cell) {
                return Err(TableError::DuplicateCell { cell: cell_id });
            }
            table.rows.push(Annotation { cell, label });
        }
        Ok(Some(table))
    }

    /// Rewrite the whole table at `path` via a sibling temp file.
    pub fn save(&self, path: &Path) -> Result<(), TableError> {
        let io_err = |source: std::io::Error| TableError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &self.rows {
            writer
                .serialize(Record {
                    cell_id: row.cell as i64,
                    class_id: row.label.get() as i64,
                })
                .map_err(|source| TableError::Csv {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        // serialize() only emits the header alongside the first row
        if self.rows.is_empty() {
            writer
                .write_record(["CellID", "ClassID"])
                .map_err(|source| TableError::Csv {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| io_err(e.into_error()))?;

        let tmp = path.with_extension("csv.tmp");
        fs::write(&tmp, bytes).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn label(id: u8) -> LabelId {
        LabelId::new(id).unwrap()
    }

    #[test]
    fn test_upsert_overwrites_in_place() {
        let mut table = AnnotationTable::new();
        table.upsert(0, label(2));
        table.upsert(1, label(5));
        table.upsert(0, label(7));

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0], Annotation { cell: 0, label: label(7) });
        assert_eq!(table.label_of(1), Some(label(5)));
    }

    #[test]
    fn test_pop_last_follows_insertion_order() {
        let mut table = AnnotationTable::new();
        table.upsert(3, label(1));
        table.upsert(1, label(1));

        assert_eq!(table.pop_last().map(|a| a.cell), Some(1));
        assert_eq!(table.pop_last().map(|a| a.cell), Some(3));
        assert_eq!(table.pop_last(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("alice.csv");

        let mut table = AnnotationTable::new();
        table.upsert(0, label(2));
        table.upsert(1, LabelId::SKIP);
        table.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "CellID,ClassID\n0,2\n1,8\n");
        assert!(!path.with_extension("csv.tmp").exists());

        let loaded = AnnotationTable::load(&path, 5).unwrap().unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        AnnotationTable::new().save(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "CellID,ClassID\n");
        assert_eq!(AnnotationTable::load(&path, 3).unwrap(), Some(AnnotationTable::new()));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        assert_eq!(AnnotationTable::load(&dir.path().join("none.csv"), 3).unwrap(), None);
    }

    #[test]
    fn test_load_accepts_swapped_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("swapped.csv");
        fs::write(&path, "ClassID,CellID\n4,0\n6,1\n").unwrap();

        let table = AnnotationTable::load(&path, 2).unwrap().unwrap();
        assert_eq!(table.label_of(0), Some(label(4)));
        assert_eq!(table.label_of(1), Some(label(6)));
    }

    #[test]
    fn test_load_rejects_corrupt_tables() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");

        let cases = [
            "CellID,ClassID\n0,1\n0,2\n",
            "CellID,ClassID\n3,1\n",
            "CellID,ClassID\n-1,1\n",
            "CellID,ClassID\n0,9\n",
            "CellID,ClassID\n0,abc\n",
            "Cell,Class\n0,1\n",
        ];
        for text in cases {
            fs::write(&path, text).unwrap();
            assert!(AnnotationTable::load(&path, 3).is_err(), "accepted {text:?}");
        }
    }
}
