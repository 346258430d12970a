// Invariants over the static narrative data.
// Native-only; no browser APIs involved.

use std::collections::HashSet;

use dust_dream::narrative::{HIT_RADIUS, POINTS_OF_INTEREST};
use dust_dream::reflection::FALLBACK_REFLECTIONS;

#[test]
fn point_ids_are_unique_and_exactly_one_is_core() {
    let mut seen = HashSet::new();
    for p in POINTS_OF_INTEREST {
        assert!(seen.insert(p.id), "duplicate point id '{}'", p.id);
        assert!(!p.label.is_empty(), "point '{}' has no label", p.id);
    }
    let cores = POINTS_OF_INTEREST.iter().filter(|p| p.is_core).count();
    assert_eq!(cores, 1, "expected exactly one core point, found {}", cores);
}

#[test]
fn points_sit_inside_the_viewport() {
    for p in POINTS_OF_INTEREST {
        assert!((0.0..=100.0).contains(&p.x), "point '{}' x out of range: {}", p.id, p.x);
        assert!((0.0..=100.0).contains(&p.y), "point '{}' y out of range: {}", p.id, p.y);
    }
}

#[test]
fn hit_areas_do_not_overlap() {
    for (i, a) in POINTS_OF_INTEREST.iter().enumerate() {
        for b in &POINTS_OF_INTEREST[i + 1..] {
            let d = a.position().distance(b.position());
            assert!(d > 2.0 * HIT_RADIUS, "'{}' and '{}' overlap ({:.2})", a.id, b.id, d);
        }
    }
}

#[test]
fn non_core_points_carry_dialogue() {
    for p in POINTS_OF_INTEREST.iter().filter(|p| !p.is_core) {
        assert!(!p.text.trim().is_empty(), "point '{}' has no dialogue", p.id);
    }
}

#[test]
fn fallback_reflections_are_distinct_and_nonempty() {
    assert!(!FALLBACK_REFLECTIONS.is_empty());
    let mut seen = HashSet::new();
    for r in FALLBACK_REFLECTIONS {
        assert!(!r.trim().is_empty());
        assert!(seen.insert(*r), "duplicate fallback '{}'", r);
    }
}
