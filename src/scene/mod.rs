//! Scene animation: cursor parallax plus the petal / spark particle timelines.
//!
//! The animator only ever reads the narrative state. Particle state is private;
//! renderers get read-only slices.

mod parallax;
mod particles;

pub use parallax::{CURSOR_HOME, DepthLayer, Parallax, Point, SMOOTHING_FACTOR, SmoothedPosition};
pub use particles::{PETAL_BOTTOM, PETAL_RESPAWN_Y, Petal, SPARK_ORIGIN, Spark};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::narrative::NarrativeState;

/// Cadence of the particle interval (roughly one 60 Hz frame).
pub const PARTICLE_TICK_MS: u32 = 16;

pub struct SceneAnimator {
    petals: Vec<Petal>,
    sparks: Vec<Spark>,
    spark_target: usize,
    parallax: Parallax,
    rng: StdRng,
}

impl SceneAnimator {
    pub fn new(petal_count: usize, spark_target: usize) -> Self {
        Self::with_rng(petal_count, spark_target, StdRng::from_entropy())
    }

    /// Deterministic construction for tests and replays.
    pub fn with_rng(petal_count: usize, spark_target: usize, mut rng: StdRng) -> Self {
        let petals = (0..petal_count).map(|_| Petal::random(&mut rng)).collect();
        Self {
            petals,
            sparks: Vec::with_capacity(spark_target),
            spark_target,
            parallax: Parallax::from_cursor(CURSOR_HOME),
            rng,
        }
    }

    /// Recompute layer offsets after the smoothed cursor moved.
    pub fn update_parallax(&mut self, cursor: Point) {
        self.parallax = Parallax::from_cursor(cursor);
    }

    /// One fixed-cadence particle step. Petals always fall; sparks only live
    /// while the scene is purified and are dropped as soon as it is not.
    pub fn tick(&mut self, now_ms: f64, state: NarrativeState) {
        for p in &mut self.petals {
            p.advance(now_ms);
        }

        if state == NarrativeState::Purified {
            self.sparks.retain_mut(Spark::advance);
            if self.sparks.len() < self.spark_target {
                self.sparks.push(Spark::spawn(&mut self.rng));
            }
        } else if !self.sparks.is_empty() {
            self.sparks.clear();
        }
    }

    pub fn parallax(&self) -> &Parallax {
        &self.parallax
    }

    pub fn petals(&self) -> &[Petal] {
        &self.petals
    }

    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }
}
