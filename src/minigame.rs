//! Resonance minigame: hold while the light inhales, let go while it exhales.
//!
//! The breath phase is derived from the frame timestamp every frame; nothing
//! is stored between frames. Progress moves a fixed amount per frame, so
//! pacing depends on the frame rate.

/// Full inhale + exhale period.
pub const BREATH_PERIOD_MS: f64 = 4000.0;
pub const ALIGNED_GAIN: f64 = 0.35;
pub const MISALIGNED_DECAY: f64 = 0.2;
pub const PROGRESS_MAX: f64 = 100.0;
const SHAKE_PER_PROGRESS: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreathPhase {
    Inhale,
    Exhale,
}

impl BreathPhase {
    /// Line shown under the light for each half of the cycle.
    pub fn prompt(self) -> &'static str {
        match self {
            BreathPhase::Inhale => "同频：敛神",
            BreathPhase::Exhale => "同频：化尘",
        }
    }
}

/// Snapshot of the breath cycle at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreathCycle {
    pub phase: BreathPhase,
    /// Progress within the current half, in [0, 1).
    pub phase_t: f64,
}

impl BreathCycle {
    pub fn at(now_ms: f64) -> Self {
        let t = now_ms.rem_euclid(BREATH_PERIOD_MS) / BREATH_PERIOD_MS;
        if t < 0.5 {
            Self { phase: BreathPhase::Inhale, phase_t: t * 2.0 }
        } else {
            Self { phase: BreathPhase::Exhale, phase_t: (t - 0.5) * 2.0 }
        }
    }

    /// Light scale: grows 1.0 -> 2.0 while inhaling, shrinks back while exhaling.
    pub fn scale(&self) -> f64 {
        match self.phase {
            BreathPhase::Inhale => 1.0 + self.phase_t,
            BreathPhase::Exhale => 2.0 - self.phase_t,
        }
    }
}

/// Emitted by [`BreathingMinigame::tick`] on the frame progress reaches 100.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResonanceAchieved;

pub struct BreathingMinigame {
    progress: f64,
    pressing: bool,
    shake: f64,
    cycle: BreathCycle,
    finished: bool,
}

impl Default for BreathingMinigame {
    fn default() -> Self {
        Self::new()
    }
}

impl BreathingMinigame {
    pub fn new() -> Self {
        Self {
            progress: 0.0,
            pressing: false,
            shake: 0.0,
            cycle: BreathCycle { phase: BreathPhase::Inhale, phase_t: 0.0 },
            finished: false,
        }
    }

    /// Mouse-down and touch-start both land here.
    pub fn press_start(&mut self) {
        if !self.finished {
            self.pressing = true;
        }
    }

    /// Mouse-up and touch-end both land here.
    pub fn press_end(&mut self) {
        if !self.finished {
            self.pressing = false;
        }
    }

    /// Advance one frame. Returns `Some` exactly once, on the frame that
    /// completes the resonance; every later call is a no-op.
    pub fn tick(&mut self, now_ms: f64) -> Option<ResonanceAchieved> {
        if self.finished {
            return None;
        }
        self.cycle = BreathCycle::at(now_ms);
        let aligned = self.is_aligned();
        self.progress = if aligned {
            (self.progress + ALIGNED_GAIN).min(PROGRESS_MAX)
        } else {
            (self.progress - MISALIGNED_DECAY).max(0.0)
        };
        self.shake = if aligned { self.progress * SHAKE_PER_PROGRESS } else { 0.0 };

        if self.progress >= PROGRESS_MAX {
            self.finished = true;
            self.pressing = false;
            tracing::debug!("resonance achieved");
            return Some(ResonanceAchieved);
        }
        None
    }

    fn is_aligned(&self) -> bool {
        match self.cycle.phase {
            BreathPhase::Inhale => self.pressing,
            BreathPhase::Exhale => !self.pressing,
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_pressing(&self) -> bool {
        self.pressing
    }

    /// Display-only jitter amplitude in pixels.
    pub fn shake(&self) -> f64 {
        self.shake
    }

    pub fn cycle(&self) -> BreathCycle {
        self.cycle
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INHALE_MS: f64 = 500.0; // 1/8 into the cycle
    const EXHALE_MS: f64 = 2500.0; // 5/8 into the cycle

    #[test]
    fn test_breath_cycle_halves() {
        let c = BreathCycle::at(0.0);
        assert_eq!(c.phase, BreathPhase::Inhale);
        assert!((c.scale() - 1.0).abs() < 1e-9);

        let c = BreathCycle::at(1000.0);
        assert_eq!(c.phase, BreathPhase::Inhale);
        assert!((c.phase_t - 0.5).abs() < 1e-9);
        assert!((c.scale() - 1.5).abs() < 1e-9);

        let c = BreathCycle::at(2000.0);
        assert_eq!(c.phase, BreathPhase::Exhale);
        assert!((c.scale() - 2.0).abs() < 1e-9);

        let c = BreathCycle::at(4000.0 * 7.0 + 3000.0);
        assert_eq!(c.phase, BreathPhase::Exhale);
        assert!((c.scale() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_breath_cycle_depends_only_on_period_offset() {
        // frame timestamps start near zero, wall-clock ones near 1.7e12
        for offset in [0.0, 250.0, 1999.0, 2000.0, 3999.0] {
            let frame = BreathCycle::at(offset);
            let wall = BreathCycle::at(1_700_000_000_000.0 + offset);
            assert_eq!(frame.phase, wall.phase, "offset {offset}");
            assert!((frame.phase_t - wall.phase_t).abs() < 1e-6, "offset {offset}");
        }
    }

    #[test]
    fn test_pressing_during_inhale_gains() {
        let mut g = BreathingMinigame::new();
        g.press_start();
        g.tick(INHALE_MS);
        assert!((g.progress() - ALIGNED_GAIN).abs() < 1e-9);
        assert!(g.shake() > 0.0);
    }

    #[test]
    fn test_releasing_during_exhale_gains() {
        let mut g = BreathingMinigame::new();
        g.tick(EXHALE_MS);
        g.tick(EXHALE_MS + 16.0);
        assert!((g.progress() - 2.0 * ALIGNED_GAIN).abs() < 1e-9);
    }

    #[test]
    fn test_misaligned_decays_and_floors_at_zero() {
        let mut g = BreathingMinigame::new();
        g.press_start();
        for i in 0..10 {
            g.tick(INHALE_MS + i as f64);
        }
        let before = g.progress();
        g.press_end();
        g.tick(INHALE_MS + 20.0);
        assert!((before - g.progress() - MISALIGNED_DECAY).abs() < 1e-9);
        assert_eq!(g.shake(), 0.0);
        for i in 0..100 {
            g.tick(INHALE_MS + 30.0 + i as f64);
        }
        assert_eq!(g.progress(), 0.0);
    }

    #[test]
    fn test_progress_stays_clamped_for_arbitrary_input() {
        let mut g = BreathingMinigame::new();
        let mut now = 0.0;
        for i in 0..5000u32 {
            // pseudo-random press pattern
            if i.wrapping_mul(2654435761) % 7 < 3 {
                g.press_start();
            } else {
                g.press_end();
            }
            g.tick(now);
            now += 16.7;
            assert!((0.0..=PROGRESS_MAX).contains(&g.progress()));
        }
    }

    #[test]
    fn test_success_fires_exactly_once() {
        let mut g = BreathingMinigame::new();
        g.press_start();
        let mut fired = 0;
        for i in 0..400 {
            // stay inside the inhale half the whole time
            if g.tick(INHALE_MS + (i % 100) as f64).is_some() {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
        assert!(g.is_finished());
        assert_eq!(g.progress(), PROGRESS_MAX);
    }

    #[test]
    fn test_no_updates_after_finish() {
        let mut g = BreathingMinigame::new();
        g.press_start();
        while g.tick(INHALE_MS).is_none() {}
        g.press_start();
        g.tick(EXHALE_MS);
        assert_eq!(g.progress(), PROGRESS_MAX);
        assert!(!g.is_pressing());
        assert!(g.tick(EXHALE_MS).is_none());
    }
}
