//! Narrative state machine for the vignette.
//!
//! INTRO -> EXPLORING -> RESONANCE -> PURIFIED -> ENDING -> (restart) INTRO.
//! Any action invoked outside the state it belongs to is ignored.

mod dialogue;
mod points;

pub use dialogue::DialogueMessage;
pub use points::{HIT_RADIUS, Interaction, InteractionRouter, POINTS_OF_INTEREST, PointOfInterest};

use futures_util::future::join;

use crate::config::PacingConfig;
use crate::reflection::{ReflectionGenerator, Sleeper, TextService};

/// Fixed moment the reflection is asked to contemplate.
pub const PURIFICATION_CONTEXT: &str = "黛玉葬花，生命如落红般无常而洁净";
pub const COLLECTION_TITLE: &str = "黛玉葬花 · 尘缘";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NarrativeState {
    Intro,
    Exploring,
    Resonance,
    Purified,
    Ending,
}

/// One earned reflection. Immutable once recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionItem {
    pub id: String,
    pub title: String,
    pub reflection: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl CollectionItem {
    pub fn new(reflection: String, timestamp: i64) -> Self {
        Self {
            id: format!("mote_{timestamp}"),
            title: COLLECTION_TITLE.to_string(),
            reflection,
            timestamp,
        }
    }
}

/// Work the host must run after the minigame succeeds: generate a reflection
/// while the minimum dwell elapses, then hand the text back through
/// [`AppOrchestrator::complete_purification`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurificationRequest {
    pub context: &'static str,
    pub dwell_ms: u64,
}

impl PurificationRequest {
    /// Resolves after BOTH the generator and the dwell timer are done.
    pub async fn resolve<S: TextService, Z: Sleeper>(&self, generator: &ReflectionGenerator<S, Z>) -> String {
        let (text, ()) = join(generator.generate(self.context), generator.sleeper().sleep(self.dwell_ms)).await;
        text
    }
}

pub struct AppOrchestrator {
    state: NarrativeState,
    /// Newest first.
    collection: Vec<CollectionItem>,
    dialogue: DialogueMessage,
    purifying: bool,
    gallery_open: bool,
    pacing: PacingConfig,
}

impl AppOrchestrator {
    pub fn new(pacing: PacingConfig) -> Self {
        Self {
            state: NarrativeState::Intro,
            collection: Vec::new(),
            dialogue: DialogueMessage::default(),
            purifying: false,
            gallery_open: false,
            pacing,
        }
    }

    fn transition(&mut self, to: NarrativeState) {
        tracing::debug!(from = ?self.state, ?to, "narrative transition");
        self.state = to;
    }

    /// INTRO -> EXPLORING.
    pub fn start(&mut self) {
        if self.state == NarrativeState::Intro {
            self.transition(NarrativeState::Exploring);
        }
    }

    /// Activate a point of interest. Only meaningful while exploring.
    pub fn activate(&mut self, point: &PointOfInterest, now_ms: f64) {
        if self.state != NarrativeState::Exploring || self.gallery_open {
            return;
        }
        match InteractionRouter::route(point) {
            Interaction::EnterResonance => {
                self.dialogue.clear();
                self.transition(NarrativeState::Resonance);
            }
            Interaction::Dialogue(text) => {
                tracing::trace!(point = point.id, "dialogue shown");
                self.dialogue.show(text, now_ms, self.pacing.dialogue_dismiss_ms);
            }
        }
    }

    /// Per-frame housekeeping (dialogue auto-dismiss).
    pub fn tick(&mut self, now_ms: f64) {
        self.dialogue.expire(now_ms);
    }

    /// Called once when the minigame reports resonance. Enters the purifying
    /// sub-state and returns the async work the host must run; `None` when
    /// not in RESONANCE or already purifying.
    pub fn on_minigame_success(&mut self) -> Option<PurificationRequest> {
        if self.state != NarrativeState::Resonance || self.purifying {
            return None;
        }
        self.purifying = true;
        tracing::info!("purification started");
        Some(PurificationRequest {
            context: PURIFICATION_CONTEXT,
            dwell_ms: self.pacing.purify_dwell_ms,
        })
    }

    /// Record the produced reflection and move RESONANCE -> PURIFIED.
    ///
    /// The item is recorded even if the narrative has moved on in the
    /// meantime; only the state transition is conditional.
    pub fn complete_purification(&mut self, reflection: String, timestamp: i64) -> &CollectionItem {
        let item = CollectionItem::new(reflection, timestamp);
        tracing::info!(id = %item.id, "reflection collected");
        self.collection.insert(0, item);
        if self.purifying && self.state == NarrativeState::Resonance {
            self.transition(NarrativeState::Purified);
        }
        self.purifying = false;
        &self.collection[0]
    }

    /// PURIFIED -> ENDING, ENDING -> INTRO (fresh start).
    pub fn advance(&mut self) {
        match self.state {
            NarrativeState::Purified => self.transition(NarrativeState::Ending),
            NarrativeState::Ending => {
                tracing::debug!("restarting vignette");
                *self = Self::new(self.pacing.clone());
            }
            _ => {}
        }
    }

    /// Open / close the collection gallery; only available while exploring.
    pub fn toggle_gallery(&mut self) {
        if self.state == NarrativeState::Exploring {
            self.gallery_open = !self.gallery_open;
        }
    }

    pub fn state(&self) -> NarrativeState {
        self.state
    }

    pub fn collection(&self) -> &[CollectionItem] {
        &self.collection
    }

    pub fn latest_reflection(&self) -> Option<&str> {
        self.collection.first().map(|c| c.reflection.as_str())
    }

    pub fn dialogue(&self) -> &DialogueMessage {
        &self.dialogue
    }

    pub fn is_purifying(&self) -> bool {
        self.purifying
    }

    pub fn is_gallery_open(&self) -> bool {
        self.gallery_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str) -> &'static PointOfInterest {
        InteractionRouter::find(id).unwrap()
    }

    fn exploring() -> AppOrchestrator {
        let mut o = AppOrchestrator::new(PacingConfig::default());
        o.start();
        o
    }

    #[test]
    fn test_starts_in_intro_with_empty_collection() {
        let o = AppOrchestrator::new(PacingConfig::default());
        assert_eq!(o.state(), NarrativeState::Intro);
        assert!(o.collection().is_empty());
        assert!(!o.dialogue().is_visible());
    }

    #[test]
    fn test_core_point_enters_resonance_and_clears_dialogue() {
        let mut o = exploring();
        o.activate(point("hoe"), 0.0);
        assert!(o.dialogue().is_visible());
        o.activate(point("daiyu"), 100.0);
        assert_eq!(o.state(), NarrativeState::Resonance);
        assert!(!o.dialogue().is_visible());
        // the old deadline must not resurrect anything
        o.tick(6000.0);
        assert!(!o.dialogue().is_visible());
    }

    #[test]
    fn test_dialogue_clears_after_five_seconds() {
        let mut o = exploring();
        o.activate(point("pouch"), 1000.0);
        assert_eq!(o.dialogue().text(), Some(point("pouch").text));
        o.tick(5999.0);
        assert!(o.dialogue().is_visible());
        o.tick(6000.0);
        assert!(!o.dialogue().is_visible());
        assert_eq!(o.state(), NarrativeState::Exploring);
    }

    #[test]
    fn test_newer_dialogue_is_not_cleared_early() {
        let mut o = exploring();
        o.activate(point("hoe"), 0.0);
        o.activate(point("pouch"), 4000.0);
        o.tick(5000.0);
        assert_eq!(o.dialogue().text(), Some(point("pouch").text));
        o.tick(9000.0);
        assert!(!o.dialogue().is_visible());
    }

    #[test]
    fn test_actions_outside_their_state_are_noops() {
        let mut o = AppOrchestrator::new(PacingConfig::default());
        o.activate(point("daiyu"), 0.0);
        assert_eq!(o.state(), NarrativeState::Intro);
        assert!(o.on_minigame_success().is_none());
        o.advance();
        assert_eq!(o.state(), NarrativeState::Intro);
        o.toggle_gallery();
        assert!(!o.is_gallery_open());

        o.start();
        o.start();
        assert_eq!(o.state(), NarrativeState::Exploring);
        o.advance();
        assert_eq!(o.state(), NarrativeState::Exploring);
    }

    #[test]
    fn test_gallery_blocks_activation() {
        let mut o = exploring();
        o.toggle_gallery();
        o.activate(point("daiyu"), 0.0);
        assert_eq!(o.state(), NarrativeState::Exploring);
        o.toggle_gallery();
        o.activate(point("daiyu"), 0.0);
        assert_eq!(o.state(), NarrativeState::Resonance);
    }

    #[test]
    fn test_success_is_accepted_once() {
        let mut o = exploring();
        o.activate(point("daiyu"), 0.0);
        let req = o.on_minigame_success().unwrap();
        assert_eq!(req.context, PURIFICATION_CONTEXT);
        assert_eq!(req.dwell_ms, 1500);
        assert!(o.is_purifying());
        assert!(o.on_minigame_success().is_none());
        assert_eq!(o.state(), NarrativeState::Resonance);
    }

    #[test]
    fn test_completion_prepends_and_purifies() {
        let mut o = exploring();
        o.activate(point("daiyu"), 0.0);
        o.on_minigame_success();
        let item = o.complete_purification("一花一世界".into(), 1_700_000_000_000).clone();
        assert_eq!(item.id, "mote_1700000000000");
        assert_eq!(item.title, COLLECTION_TITLE);
        assert_eq!(o.state(), NarrativeState::Purified);
        assert!(!o.is_purifying());
        assert_eq!(o.latest_reflection(), Some("一花一世界"));

        o.advance();
        assert_eq!(o.state(), NarrativeState::Ending);
        o.advance();
        assert_eq!(o.state(), NarrativeState::Intro);
        assert!(o.collection().is_empty());
    }

    #[test]
    fn test_late_result_is_still_recorded() {
        let mut o = exploring();
        // no purification pending: the item is kept, the state is untouched
        o.complete_purification("迟来的尘缘".into(), 5);
        assert_eq!(o.state(), NarrativeState::Exploring);
        assert_eq!(o.collection().len(), 1);
        o.complete_purification("更迟".into(), 6);
        assert_eq!(o.collection()[0].reflection, "更迟");
        assert_eq!(o.collection()[1].reflection, "迟来的尘缘");
    }
}
