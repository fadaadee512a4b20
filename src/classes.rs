//! The fixed label vocabulary used to classify cells.

use std::collections::BTreeMap;

/// Display names, indexed by label id.
pub const LABEL_NAMES: [&str; 9] = [
    "Smooth Disc",
    "Crenated Disc",
    "Crenated Discoid",
    "Crenated Spheroid",
    "Crenated Sphere",
    "Smooth sphere",
    "Side view",
    "Undecidable",
    "SKIP",
];

/// Bar colours for the tallied labels (Spectral8).
pub const BAR_COLORS: [&str; 8] = [
    "#3288bd", "#66c2a5", "#abdda4", "#e6f598", "#fee08b", "#fdae61", "#f46d43", "#d53e4f",
];

/// Number of labels that show up in the count chart.
pub const TALLIED: usize = 8;

/// A validated label id in `0..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelId(u8);

impl LabelId {
    /// The "SKIP" label: a valid annotation that is never counted.
    pub const SKIP: LabelId = LabelId(8);

    pub fn new(id: u8) -> Option<Self> {
        ((id as usize) < LABEL_NAMES.len()).then_some(Self(id))
    }

    /// Convert a raw table value, rejecting anything outside the vocabulary.
    pub fn from_i64(id: i64) -> Option<Self> {
        u8::try_from(id).ok().and_then(Self::new)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        LABEL_NAMES[self.0 as usize]
    }

    pub fn is_tallied(self) -> bool {
        self != Self::SKIP
    }

    /// Every label that appears in the count chart, in id order.
    pub fn tallied() -> impl Iterator<Item = LabelId> {
        (0..LABEL_NAMES.len() as u8)
            .map(LabelId)
            .filter(|label| label.is_tallied())
    }
}

/// Per-label row counts over an annotation table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelCounts {
    counts: BTreeMap<LabelId, usize>,
}

impl LabelCounts {
    pub fn from_labels(labels: impl IntoIterator<Item = LabelId>) -> Self {
        let mut counts = BTreeMap::new();
        for label in labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Count for one label; labels never used count as zero.
    pub fn get(&self, label: LabelId) -> usize {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    /// Counts for the charted labels, SKIP excluded.
    pub fn tallied(&self) -> [usize; TALLIED] {
        let mut out = [0; TALLIED];
        for label in LabelId::tallied() {
            out[label.get() as usize] = self.get(label);
        }
        out
    }
}
