// Points of interest in the garden and the router that decides what
// activating one does.

use crate::scene::Point;

/// Static, immutable scene hotspot. Positions are viewport percentages.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointOfInterest {
    pub id: &'static str,
    pub x: f64,
    pub y: f64,
    pub label: &'static str,
    pub text: &'static str,
    /// The single point that opens the resonance minigame instead of dialogue.
    pub is_core: bool,
}

impl PointOfInterest {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

pub const POINTS_OF_INTEREST: &[PointOfInterest] = &[
    PointOfInterest {
        id: "hoe",
        x: 28.0,
        y: 72.0,
        label: "探看：落花锄",
        text: "质本洁来还洁去，强于污淖陷渠沟。",
        is_core: false,
    },
    PointOfInterest {
        id: "pouch",
        x: 52.0,
        y: 78.0,
        label: "探看：锦囊袋",
        text: "一抔净土掩风流，莫向春风怨离情。",
        is_core: false,
    },
    PointOfInterest {
        id: "daiyu",
        x: 65.0,
        y: 65.0,
        label: "共鸣：离人之泪",
        text: "试看春残花渐落，便是红颜老死时。一朝春尽红颜老，花落人亡两不知。",
        is_core: true,
    },
];

/// Clickable radius around each marker, in viewport percent.
pub const HIT_RADIUS: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interaction {
    Dialogue(&'static str),
    EnterResonance,
}

pub struct InteractionRouter;

impl InteractionRouter {
    pub fn route(point: &PointOfInterest) -> Interaction {
        if point.is_core {
            Interaction::EnterResonance
        } else {
            Interaction::Dialogue(point.text)
        }
    }

    pub fn find(id: &str) -> Option<&'static PointOfInterest> {
        POINTS_OF_INTEREST.iter().find(|p| p.id == id)
    }

    /// Closest point within [`HIT_RADIUS`] of `at`, if any.
    pub fn hit_test(at: Point) -> Option<&'static PointOfInterest> {
        POINTS_OF_INTEREST
            .iter()
            .map(|p| (p, p.position().distance(at)))
            .filter(|(_, d)| *d <= HIT_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_point_enters_resonance() {
        let daiyu = InteractionRouter::find("daiyu").unwrap();
        assert_eq!(InteractionRouter::route(daiyu), Interaction::EnterResonance);
    }

    #[test]
    fn test_plain_point_shows_its_text() {
        let hoe = InteractionRouter::find("hoe").unwrap();
        assert_eq!(InteractionRouter::route(hoe), Interaction::Dialogue(hoe.text));
    }

    #[test]
    fn test_hit_test() {
        assert_eq!(InteractionRouter::hit_test(Point::new(29.0, 73.0)).map(|p| p.id), Some("hoe"));
        assert_eq!(InteractionRouter::hit_test(Point::new(65.0, 65.0)).map(|p| p.id), Some("daiyu"));
        assert!(InteractionRouter::hit_test(Point::new(5.0, 5.0)).is_none());
    }
}
