//! Composition root: one orchestrator plus the components it wires together.
//!
//! Each loop owns disjoint state. The frame loop drives the cursor and the
//! minigame, the particle loop drives the scene animator, and the only
//! cross-component traffic is the one-shot success hand-off in [`Vignette::frame`].

use crate::config::VignetteConfig;
use crate::minigame::BreathingMinigame;
use crate::narrative::{
    AppOrchestrator, CollectionItem, InteractionRouter, NarrativeState, PurificationRequest,
};
use crate::scene::{Point, SceneAnimator, SmoothedPosition};

pub struct Vignette {
    orchestrator: AppOrchestrator,
    cursor: SmoothedPosition,
    scene: SceneAnimator,
    /// Mounted while RESONANCE is active, dropped the moment it succeeds.
    minigame: Option<BreathingMinigame>,
}

impl Vignette {
    pub fn new(config: &VignetteConfig) -> Self {
        Self::with_scene(
            config,
            SceneAnimator::new(config.scene.petal_count, config.scene.spark_target),
        )
    }

    pub fn with_scene(config: &VignetteConfig, scene: SceneAnimator) -> Self {
        Self {
            orchestrator: AppOrchestrator::new(config.pacing.clone()),
            cursor: SmoothedPosition::default(),
            scene,
            minigame: None,
        }
    }

    pub fn start(&mut self) {
        self.orchestrator.start();
    }

    /// Pointer moved, already normalised to 0..100. Ignored while the cursor
    /// is hidden (minigame running or gallery open).
    pub fn pointer_move(&mut self, at: Point) {
        if self.cursor_frozen() {
            return;
        }
        self.cursor.set_target(at);
    }

    pub fn cursor_frozen(&self) -> bool {
        self.orchestrator.state() == NarrativeState::Resonance || self.orchestrator.is_gallery_open()
    }

    pub fn press_start(&mut self) {
        if let Some(game) = self.minigame.as_mut() {
            game.press_start();
        }
    }

    pub fn press_end(&mut self) {
        if let Some(game) = self.minigame.as_mut() {
            game.press_end();
        }
    }

    /// Click / tap on the scene. Returns true when a point was hit.
    pub fn activate_at(&mut self, at: Point, now_ms: f64) -> bool {
        match InteractionRouter::hit_test(at) {
            Some(point) => {
                self.activate_point(point, now_ms);
                true
            }
            None => false,
        }
    }

    pub fn activate_id(&mut self, id: &str, now_ms: f64) -> bool {
        match InteractionRouter::find(id) {
            Some(point) => {
                self.activate_point(point, now_ms);
                true
            }
            None => false,
        }
    }

    fn activate_point(&mut self, point: &crate::narrative::PointOfInterest, now_ms: f64) {
        self.orchestrator.activate(point, now_ms);
        if self.orchestrator.state() == NarrativeState::Resonance && self.minigame.is_none() {
            self.minigame = Some(BreathingMinigame::new());
        }
    }

    /// Animation-frame step: smooth the cursor, refresh parallax, expire
    /// dialogue and run the minigame. Returns the purification work to spawn
    /// on the frame the minigame succeeds.
    pub fn frame(&mut self, now_ms: f64) -> Option<PurificationRequest> {
        let cursor = self.cursor.step();
        self.scene.update_parallax(cursor);
        self.orchestrator.tick(now_ms);

        let achieved = self.minigame.as_mut().and_then(|g| g.tick(now_ms));
        if achieved.is_some() {
            // unmount: no further minigame updates after success
            self.minigame = None;
            return self.orchestrator.on_minigame_success();
        }
        None
    }

    /// Fixed-cadence particle step.
    pub fn particle_tick(&mut self, now_ms: f64) {
        self.scene.tick(now_ms, self.orchestrator.state());
    }

    pub fn complete_purification(&mut self, reflection: String, timestamp: i64) -> &CollectionItem {
        self.orchestrator.complete_purification(reflection, timestamp)
    }

    pub fn advance(&mut self) {
        self.orchestrator.advance();
        if self.orchestrator.state() == NarrativeState::Intro {
            self.minigame = None;
            self.cursor = SmoothedPosition::default();
        }
    }

    pub fn toggle_gallery(&mut self) {
        self.orchestrator.toggle_gallery();
    }

    pub fn orchestrator(&self) -> &AppOrchestrator {
        &self.orchestrator
    }

    pub fn state(&self) -> NarrativeState {
        self.orchestrator.state()
    }

    pub fn cursor(&self) -> Point {
        self.cursor.position()
    }

    pub fn scene(&self) -> &SceneAnimator {
        &self.scene
    }

    pub fn minigame(&self) -> Option<&BreathingMinigame> {
        self.minigame.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn vignette() -> Vignette {
        let cfg = VignetteConfig::default();
        Vignette::with_scene(&cfg, SceneAnimator::with_rng(10, 30, StdRng::seed_from_u64(5)))
    }

    #[test]
    fn test_cursor_starts_home_and_follows_pointer() {
        let mut v = vignette();
        assert_eq!(v.cursor(), crate::scene::CURSOR_HOME);
        v.start();
        v.pointer_move(Point::new(10.0, 10.0));
        v.frame(0.0);
        assert!(v.cursor().x < 90.0);
    }

    #[test]
    fn test_cursor_frozen_during_resonance() {
        let mut v = vignette();
        v.start();
        v.activate_id("daiyu", 0.0);
        assert!(v.minigame().is_some());
        v.pointer_move(Point::new(0.0, 0.0));
        v.frame(0.0);
        assert_eq!(v.cursor(), crate::scene::CURSOR_HOME);
    }

    #[test]
    fn test_minigame_unmounts_on_success() {
        let mut v = vignette();
        v.start();
        v.activate_at(Point::new(65.0, 65.0), 0.0);
        assert_eq!(v.state(), NarrativeState::Resonance);
        v.press_start();
        let mut requests = 0;
        for i in 0..1000 {
            // inhale half of the cycle, pressing the whole time
            if v.frame(100.0 + (i % 50) as f64).is_some() {
                requests += 1;
            }
        }
        assert_eq!(requests, 1);
        assert!(v.minigame().is_none());
        assert!(v.orchestrator().is_purifying());
    }

    #[test]
    fn test_press_without_minigame_is_ignored() {
        let mut v = vignette();
        v.start();
        v.press_start();
        v.press_end();
        assert!(v.minigame().is_none());
        assert!(v.frame(0.0).is_none());
    }

    #[test]
    fn test_missed_click_does_nothing() {
        let mut v = vignette();
        v.start();
        assert!(!v.activate_at(Point::new(1.0, 1.0), 0.0));
        assert_eq!(v.state(), NarrativeState::Exploring);
    }
}
