//! Generation tokens that tie every unit of work to the dispatch that
//! created it.

use serde::{Deserialize, Serialize};

use crate::region::RegionLabel;

/// Kind of dispatch pass. Each kind has its own generation counter, so a
/// new translation pass does not invalidate pending recognition results.
/// The result board ties translation to recognition: a new recognition
/// pass supersedes the translation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PassKind {
    Recognition,
    Description,
    Translation,
}

impl PassKind {
    pub const ALL: [Self; 3] = [Self::Recognition, Self::Description, Self::Translation];

    const fn slot(self) -> usize {
        match self {
            Self::Recognition => 0,
            Self::Description => 1,
            Self::Translation => 2,
        }
    }
}

impl std::fmt::Display for PassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Recognition => "recognition",
            Self::Description => "description",
            Self::Translation => "translation",
        })
    }
}

/// Monotonic dispatch counter. Larger is newer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Generation(pub u64);

/// Per-pass generation counters.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    latest: [Generation; 3],
}

impl GenerationCounter {
    /// Bump and return the generation for `pass`.
    pub const fn next(&mut self, pass: PassKind) -> Generation {
        let slot = &mut self.latest[pass.slot()];
        *slot = Generation(slot.0 + 1);
        *slot
    }

    /// The most recently issued generation for `pass`.
    #[must_use]
    pub const fn latest(&self, pass: PassKind) -> Generation {
        self.latest[pass.slot()]
    }
}

/// Names one result slot of one image: the pass, the service, and the
/// region that produced it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResultLabel {
    pub pass: PassKind,
    pub service: String,
    pub region: RegionLabel,
}

impl ResultLabel {
    #[must_use]
    pub fn new(pass: PassKind, service: impl Into<String>, region: RegionLabel) -> Self {
        Self {
            pass,
            service: service.into(),
            region,
        }
    }
}

impl std::fmt::Display for ResultLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.service, self.pass, self.region)
    }
}

/// Carried by every unit of work and by its completion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub generation: Generation,
    pub image_index: usize,
    pub label: ResultLabel,
}
