//! Per-image result slots with stale-result filtering.
//!
//! The board is the single consumer of dispatcher completions. Starting a
//! pass with [`ResultBoard::begin`] clears that pass's slots and records
//! its generation; completions from older generations are dropped.
//!
//! Translations are derived from recognition text, so beginning a
//! recognition pass also supersedes the translation pass. Superseding a
//! pass raises its floor: nothing at or below the floor is ever stored
//! again, even after [`ResultBoard::clear`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dispatcher::{Completion, DispatchTicket, TranslationSource};
use crate::service::ServiceError;
use crate::token::{Generation, PassKind, ResultLabel};

/// Text shown for an image whose selections yielded no regions.
pub const NO_TEXT_DETECTED: &str = "No text detected";

/// Content of one result slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotValue {
    /// Successful service output.
    Text(String),
    /// Error-tagged failure text, ready for display.
    Failed(String),
    /// The image had no regions to send.
    NoRegions,
}

impl SlotValue {
    /// Text to display in the slot.
    #[must_use]
    pub fn display(&self) -> &str {
        match self {
            Self::Text(text) | Self::Failed(text) => text,
            Self::NoRegions => NO_TEXT_DETECTED,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// Whether a completion was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    Stored,
    Stale,
}

/// Tag a failure the way each pass presents it.
fn failure_text(pass: PassKind, image_index: usize, error: &ServiceError) -> String {
    match pass {
        PassKind::Recognition => format!("Error: {error}"),
        PassKind::Description => format!("Error in description for image {image_index}: {error}"),
        PassKind::Translation => format!("Translation error: {error}"),
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PassState {
    generation: Generation,
    /// Completions at or below this generation are stale.
    floor: Generation,
    pending: usize,
}

/// Result slots keyed by `(image_index, label)`.
#[derive(Debug, Clone, Default)]
pub struct ResultBoard {
    slots: BTreeMap<(usize, ResultLabel), SlotValue>,
    passes: BTreeMap<PassKind, PassState>,
}

impl ResultBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the pass described by `ticket`.
    ///
    /// Clears every slot of that pass, makes `ticket.generation` current,
    /// and fills the ticket's placeholder slots.
    ///
    /// A recognition pass also supersedes the translation pass: its slots
    /// are cleared and translations still in flight become stale.
    pub fn begin(&mut self, ticket: &DispatchTicket) {
        if ticket.pass == PassKind::Recognition {
            self.supersede(PassKind::Translation);
        }
        self.clear_pass(ticket.pass);
        let state = self.passes.entry(ticket.pass).or_default();
        state.generation = ticket.generation;
        state.pending = ticket.units;
        for (image_index, label) in &ticket.placeholders {
            self.slots
                .insert((*image_index, label.clone()), SlotValue::NoRegions);
        }
    }

    /// Store a completion unless it belongs to an older generation than
    /// its pass's current one.
    pub fn accept(&mut self, completion: Completion) -> Accepted {
        let Completion { token, result } = completion;
        let pass = token.label.pass;
        let state = self.passes.entry(pass).or_default();
        if token.generation < state.generation || token.generation <= state.floor {
            debug!(
                %pass,
                stale = token.generation.0,
                current = state.generation.0,
                floor = state.floor.0,
                "dropping stale result"
            );
            return Accepted::Stale;
        }
        if token.generation > state.generation {
            // Completion of a pass that was never begun here; adopt it.
            state.generation = token.generation;
            state.pending = 0;
        }
        state.pending = state.pending.saturating_sub(1);

        let value = match result {
            Ok(text) => SlotValue::Text(text),
            Err(error) => SlotValue::Failed(failure_text(pass, token.image_index, &error)),
        };
        self.slots.insert((token.image_index, token.label), value);
        Accepted::Stored
    }

    /// Completions still expected for the current generation of `pass`.
    #[must_use]
    pub fn pending(&self, pass: PassKind) -> usize {
        self.passes.get(&pass).map_or(0, |s| s.pending)
    }

    /// `true` once no pass has completions outstanding.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.passes.values().all(|s| s.pending == 0)
    }

    /// Current generation of `pass`.
    #[must_use]
    pub fn generation(&self, pass: PassKind) -> Generation {
        self.passes.get(&pass).map_or_else(Generation::default, |s| s.generation)
    }

    #[must_use]
    pub fn get(&self, image_index: usize, label: &ResultLabel) -> Option<&SlotValue> {
        self.slots.get(&(image_index, label.clone()))
    }

    /// All slots of one image, ordered by label.
    pub fn slots_for(&self, image_index: usize) -> impl Iterator<Item = (&ResultLabel, &SlotValue)> {
        self.slots
            .iter()
            .filter(move |((index, _), _)| *index == image_index)
            .map(|((_, label), value)| (label, value))
    }

    /// All slots, ordered by image then label.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ResultLabel, &SlotValue)> {
        self.slots
            .iter()
            .map(|((index, label), value)| (*index, label, value))
    }

    /// Successful, non-empty recognition results, as translation input.
    #[must_use]
    pub fn translation_sources(&self) -> Vec<TranslationSource> {
        self.iter()
            .filter(|(_, label, _)| label.pass == PassKind::Recognition)
            .filter_map(|(image_index, label, value)| match value {
                SlotValue::Text(text) if !text.trim().is_empty() => Some(TranslationSource {
                    image_index,
                    label: label.clone(),
                    text: text.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Remove every slot of `pass`.
    pub fn clear_pass(&mut self, pass: PassKind) {
        self.slots.retain(|(_, label), _| label.pass != pass);
    }

    /// Remove every slot of `pass` and make every completion of its
    /// current or earlier generations stale.
    pub fn supersede(&mut self, pass: PassKind) {
        self.clear_pass(pass);
        let state = self.passes.entry(pass).or_default();
        state.floor = state.floor.max(state.generation);
        state.pending = 0;
    }

    /// Remove every slot and supersede every pass, so no result still in
    /// flight can land afterwards.
    pub fn clear(&mut self) {
        for pass in PassKind::ALL {
            self.supersede(pass);
        }
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionLabel;
    use crate::token::Token;

    fn label(pass: PassKind, service: &str, region: RegionLabel) -> ResultLabel {
        ResultLabel::new(pass, service, region)
    }

    fn ticket(pass: PassKind, generation: u64, units: usize) -> DispatchTicket {
        DispatchTicket {
            pass,
            generation: Generation(generation),
            units,
            placeholders: Vec::new(),
        }
    }

    fn completion(
        generation: u64,
        image_index: usize,
        label: ResultLabel,
        result: Result<String, ServiceError>,
    ) -> Completion {
        Completion {
            token: Token {
                generation: Generation(generation),
                image_index,
                label,
            },
            result,
        }
    }

    #[test]
    fn stale_result_never_overwrites_newer() {
        let slot = label(PassKind::Recognition, "ocr", RegionLabel::Whole);
        let mut board = ResultBoard::new();
        board.begin(&ticket(PassKind::Recognition, 1, 1));
        board.begin(&ticket(PassKind::Recognition, 2, 1));

        let newer = completion(2, 0, slot.clone(), Ok("new".into()));
        let older = completion(1, 0, slot.clone(), Ok("old".into()));
        assert_eq!(board.accept(newer), Accepted::Stored);
        assert_eq!(board.accept(older), Accepted::Stale);
        assert_eq!(board.get(0, &slot), Some(&SlotValue::Text("new".into())));
    }

    #[test]
    fn clear_keeps_in_flight_results_out() {
        let slot = label(PassKind::Recognition, "ocr", RegionLabel::Whole);
        let mut board = ResultBoard::new();
        board.begin(&ticket(PassKind::Recognition, 1, 1));
        board.clear();
        assert!(board.is_settled());

        let late = completion(1, 0, slot.clone(), Ok("old image text".into()));
        assert_eq!(board.accept(late), Accepted::Stale);
        assert!(board.get(0, &slot).is_none());

        board.begin(&ticket(PassKind::Recognition, 2, 1));
        let fresh = completion(2, 0, slot.clone(), Ok("new image text".into()));
        assert_eq!(board.accept(fresh), Accepted::Stored);
        assert_eq!(board.get(0, &slot), Some(&SlotValue::Text("new image text".into())));
    }

    #[test]
    fn new_recognition_supersedes_translations() {
        let ocr = label(PassKind::Recognition, "ocr", RegionLabel::Whole);
        let tr = label(PassKind::Translation, "ocr", RegionLabel::Whole);
        let mut board = ResultBoard::new();
        board.begin(&ticket(PassKind::Recognition, 1, 1));
        board.accept(completion(1, 0, ocr.clone(), Ok("bonjour".into())));
        board.begin(&ticket(PassKind::Translation, 1, 2));
        board.accept(completion(1, 0, tr.clone(), Ok("hello".into())));

        board.begin(&ticket(PassKind::Recognition, 2, 1));
        assert!(board.get(0, &tr).is_none());
        assert_eq!(board.pending(PassKind::Translation), 0);

        let late = completion(1, 1, tr.clone(), Ok("stale hello".into()));
        assert_eq!(board.accept(late), Accepted::Stale);
        assert!(board.get(1, &tr).is_none());

        board.begin(&ticket(PassKind::Translation, 2, 1));
        let fresh = completion(2, 0, tr.clone(), Ok("hi".into()));
        assert_eq!(board.accept(fresh), Accepted::Stored);
    }

    #[test]
    fn begin_clears_only_its_pass() {
        let ocr = label(PassKind::Recognition, "ocr", RegionLabel::Whole);
        let desc = label(PassKind::Description, "llava", RegionLabel::Whole);
        let mut board = ResultBoard::new();
        board.begin(&ticket(PassKind::Recognition, 1, 1));
        board.begin(&ticket(PassKind::Description, 1, 1));
        board.accept(completion(1, 0, ocr.clone(), Ok("text".into())));
        board.accept(completion(1, 0, desc.clone(), Ok("a card".into())));

        board.begin(&ticket(PassKind::Recognition, 2, 0));
        assert!(board.get(0, &ocr).is_none());
        assert!(board.get(0, &desc).is_some());
    }

    #[test]
    fn failures_are_tagged_per_pass() {
        let mut board = ResultBoard::new();
        let err = || Err(ServiceError::failed("offline"));
        let ocr = label(PassKind::Recognition, "ocr", RegionLabel::Selection(0));
        let desc = label(PassKind::Description, "llava", RegionLabel::Whole);
        let tr = label(PassKind::Translation, "ocr", RegionLabel::Selection(0));
        board.accept(completion(1, 2, ocr.clone(), err()));
        board.accept(completion(1, 2, desc.clone(), err()));
        board.accept(completion(1, 2, tr.clone(), err()));
        assert_eq!(board.get(2, &ocr).unwrap_or(&SlotValue::NoRegions).display(), "Error: offline");
        assert_eq!(
            board.get(2, &desc).unwrap_or(&SlotValue::NoRegions).display(),
            "Error in description for image 2: offline"
        );
        assert_eq!(
            board.get(2, &tr).unwrap_or(&SlotValue::NoRegions).display(),
            "Translation error: offline"
        );
    }

    #[test]
    fn placeholders_fill_on_begin() {
        let slot = label(PassKind::Recognition, "ocr", RegionLabel::Whole);
        let mut board = ResultBoard::new();
        board.begin(&DispatchTicket {
            placeholders: vec![(1, slot.clone())],
            ..ticket(PassKind::Recognition, 1, 0)
        });
        let value = board.get(1, &slot).cloned();
        assert_eq!(value, Some(SlotValue::NoRegions));
        assert_eq!(SlotValue::NoRegions.display(), NO_TEXT_DETECTED);
        assert!(board.is_settled());
    }

    #[test]
    fn pending_counts_down() {
        let slot = label(PassKind::Recognition, "ocr", RegionLabel::Whole);
        let mut board = ResultBoard::new();
        board.begin(&ticket(PassKind::Recognition, 1, 2));
        assert_eq!(board.pending(PassKind::Recognition), 2);
        board.accept(completion(1, 0, slot.clone(), Ok("a".into())));
        assert!(!board.is_settled());
        board.accept(completion(1, 1, slot, Ok("b".into())));
        assert_eq!(board.pending(PassKind::Recognition), 0);
        assert!(board.is_settled());
    }

    #[test]
    fn translation_sources_skip_failures_and_blanks() {
        let mut board = ResultBoard::new();
        board.begin(&ticket(PassKind::Recognition, 1, 3));
        let a = label(PassKind::Recognition, "a", RegionLabel::Whole);
        let b = label(PassKind::Recognition, "b", RegionLabel::Whole);
        let c = label(PassKind::Recognition, "c", RegionLabel::Whole);
        board.accept(completion(1, 0, a.clone(), Ok("hola".into())));
        board.accept(completion(1, 0, b, Ok("  \n".into())));
        board.accept(completion(1, 0, c, Err(ServiceError::Cancelled)));

        let sources = board.translation_sources();
        assert_eq!(
            sources,
            vec![TranslationSource {
                image_index: 0,
                label: a,
                text: "hola".into(),
            }]
        );
    }
}
