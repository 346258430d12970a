// Decorative particles: falling petals (always) and purification sparks.

use rand::Rng;

use super::parallax::Point;

/// Petals wrap once they pass this row...
pub const PETAL_BOTTOM: f64 = 105.0;
/// ...and re-enter from this one.
pub const PETAL_RESPAWN_Y: f64 = -5.0;
const PETAL_SWAY: f64 = 0.03;
const PETAL_SWAY_PERIOD_MS: f64 = 2000.0;

/// Sparks rise from the figure kneeling by the flower mound.
pub const SPARK_ORIGIN: Point = Point::new(65.0, 65.0);
const SPARK_SPREAD: f64 = 5.0;
pub const SPARK_LIFE_DECAY: f64 = 0.01;

#[derive(Clone, Debug, PartialEq)]
pub struct Petal {
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub phase: f64,
    pub rotation: f64,
    pub rotation_speed: f64,
    pub size: f64,
}

impl Petal {
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            x: rng.gen_range(0.0..100.0),
            y: rng.gen_range(0.0..100.0),
            speed: rng.gen_range(0.1..0.4),
            phase: rng.gen_range(0.0..std::f64::consts::TAU),
            rotation: rng.gen_range(0.0..360.0),
            rotation_speed: rng.gen_range(-0.75..0.75),
            size: rng.gen_range(2.0..6.0),
        }
    }

    pub fn advance(&mut self, now_ms: f64) {
        let next_y = self.y + self.speed;
        self.y = if next_y > PETAL_BOTTOM { PETAL_RESPAWN_Y } else { next_y };
        self.x += (now_ms / PETAL_SWAY_PERIOD_MS + self.phase).sin() * PETAL_SWAY;
        self.rotation += self.rotation_speed;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Spark {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Fades 1.0 -> 0.0; drives opacity and scale.
    pub life: f64,
}

impl Spark {
    pub fn spawn<R: Rng>(rng: &mut R) -> Self {
        let half = SPARK_SPREAD / 2.0;
        Self {
            x: SPARK_ORIGIN.x + rng.gen_range(-half..half),
            y: SPARK_ORIGIN.y + rng.gen_range(-half..half),
            vx: rng.gen_range(-0.1..0.1),
            // upward-biased: always rising, between 0.2 and 0.5 per tick
            vy: -0.2 - rng.gen_range(0.0..0.3),
            life: 1.0,
        }
    }

    /// Move and fade. Returns false once the spark has burnt out.
    pub fn advance(&mut self) -> bool {
        self.x += self.vx;
        self.y += self.vy;
        self.life -= SPARK_LIFE_DECAY;
        self.life > 0.0
    }
}
