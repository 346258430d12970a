// Spirit cursor smoothing and depth-layer parallax offsets.
// All coordinates live in the 0..100 viewport percentage space.

pub const SMOOTHING_FACTOR: f64 = 0.06;
/// Where the spirit rests before the first pointer move.
pub const CURSOR_HOME: Point = Point { x: 90.0, y: 50.0 };
const CENTER: f64 = 50.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Raw pointer target plus an exponentially smoothed follower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothedPosition {
    target: Point,
    follower: Point,
}

impl Default for SmoothedPosition {
    fn default() -> Self {
        Self::at(CURSOR_HOME)
    }
}

impl SmoothedPosition {
    pub fn at(p: Point) -> Self {
        Self { target: p, follower: p }
    }

    pub fn set_target(&mut self, target: Point) {
        self.target = target;
    }

    /// One animation frame: `follower += (target - follower) * 0.06`.
    pub fn step(&mut self) -> Point {
        self.follower.x += (self.target.x - self.follower.x) * SMOOTHING_FACTOR;
        self.follower.y += (self.target.y - self.follower.y) * SMOOTHING_FACTOR;
        self.follower
    }

    pub fn target(&self) -> Point {
        self.target
    }

    pub fn position(&self) -> Point {
        self.follower
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthLayer {
    Sky,
    Far,
    Mid,
    Near,
}

impl DepthLayer {
    pub const ALL: [DepthLayer; 4] = [DepthLayer::Sky, DepthLayer::Far, DepthLayer::Mid, DepthLayer::Near];

    pub fn factor(self) -> f64 {
        match self {
            DepthLayer::Sky => 0.02,
            DepthLayer::Far => 0.08,
            DepthLayer::Mid => 0.15,
            DepthLayer::Near => 0.45,
        }
    }
}

/// Per-layer offsets derived from the smoothed cursor. Renderers translate each
/// layer by the negated offset so near layers swing the most.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Parallax {
    pub sky: Point,
    pub far: Point,
    pub mid: Point,
    pub near: Point,
}

impl Parallax {
    pub fn from_cursor(cursor: Point) -> Self {
        let offset = |layer: DepthLayer| {
            Point::new((cursor.x - CENTER) * layer.factor(), (cursor.y - CENTER) * layer.factor())
        };
        Self {
            sky: offset(DepthLayer::Sky),
            far: offset(DepthLayer::Far),
            mid: offset(DepthLayer::Mid),
            near: offset(DepthLayer::Near),
        }
    }

    pub fn layer(&self, layer: DepthLayer) -> Point {
        match layer {
            DepthLayer::Sky => self.sky,
            DepthLayer::Far => self.far,
            DepthLayer::Mid => self.mid,
            DepthLayer::Near => self.near,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follower_converges_monotonically() {
        let mut s = SmoothedPosition::at(Point::new(0.0, 0.0));
        let target = Point::new(80.0, 30.0);
        s.set_target(target);
        let mut last = s.position().distance(target);
        for _ in 0..300 {
            let p = s.step();
            let d = p.distance(target);
            assert!(d < last, "distance must shrink every frame");
            // geometric decay, never overshoots
            assert!((d - last * (1.0 - SMOOTHING_FACTOR)).abs() < 1e-9);
            assert!(p.x <= target.x && p.y <= target.y);
            last = d;
        }
        assert!(last < 0.01);
    }

    #[test]
    fn test_follower_never_jumps() {
        let mut s = SmoothedPosition::default();
        s.set_target(Point::new(0.0, 100.0));
        let before = s.position();
        let after = s.step();
        assert!(before.distance(after) <= before.distance(s.target()) * SMOOTHING_FACTOR + 1e-9);
    }

    #[test]
    fn test_parallax_centered_cursor_has_no_offset() {
        let p = Parallax::from_cursor(Point::new(50.0, 50.0));
        for layer in DepthLayer::ALL {
            assert_eq!(p.layer(layer), Point::new(0.0, 0.0));
        }
    }

    #[test]
    fn test_parallax_layer_factors() {
        let p = Parallax::from_cursor(Point::new(60.0, 40.0));
        assert!((p.sky.x - 0.2).abs() < 1e-9);
        assert!((p.far.x - 0.8).abs() < 1e-9);
        assert!((p.mid.y + 1.5).abs() < 1e-9);
        assert!((p.near.x - 4.5).abs() < 1e-9);
    }
}
