use crate::constants::{CRITICAL_DEPTH_FACTOR, POOR_DEPTH_FACTOR};

use super::holes::HoleDescriptor;

/// Depth above which a hole is flagged as hard to reach
pub fn poor_ratio(radius: f64) -> f64 {
    radius * 2.0 * POOR_DEPTH_FACTOR
}

/// Depth above which a hole is flagged as unreachable
pub fn critical_ratio(radius: f64) -> f64 {
    radius * 2.0 * CRITICAL_DEPTH_FACTOR
}

/// True as soon as one hole is deeper than the threshold derived from its own radius.
///
/// Absent holes never trigger. Radius is used as-is, so a zero radius flags
/// any hole with a positive length.
pub fn exceeds_any<F>(holes: Option<&[HoleDescriptor]>, ratio: F) -> bool
where
    F: Fn(f64) -> f64,
{
    match holes {
        None => false,
        Some(holes) => holes.iter().any(|hole| hole.length > ratio(hole.radius)),
    }
}

pub fn has_unreachable_hole_warning(holes: Option<&[HoleDescriptor]>) -> bool {
    exceeds_any(holes, poor_ratio)
}

pub fn has_unreachable_hole_error(holes: Option<&[HoleDescriptor]>) -> bool {
    exceeds_any(holes, critical_ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hole(length: f64, radius: f64) -> HoleDescriptor {
        HoleDescriptor { length, radius }
    }

    fn warns(holes: &[HoleDescriptor]) -> bool {
        has_unreachable_hole_warning(Some(holes))
    }

    fn errors(holes: &[HoleDescriptor]) -> bool {
        has_unreachable_hole_error(Some(holes))
    }

    #[test]
    fn test_ratio_constants() {
        assert_eq!(poor_ratio(1.0), 20.0);
        assert_eq!(critical_ratio(1.0), 80.0);
        assert_eq!(poor_ratio(0.25), 5.0);
        assert_eq!(critical_ratio(0.25), 20.0);
    }

    #[test]
    fn test_shallow_hole_flags_nothing() {
        let holes = [hole(5.0, 1.0)];
        assert!(!warns(&holes));
        assert!(!errors(&holes));
    }

    #[test]
    fn test_poor_but_not_critical() {
        let holes = [hole(25.0, 1.0)];
        assert!(warns(&holes));
        assert!(!errors(&holes));
    }

    #[test]
    fn test_critical_hole_flags_both() {
        let holes = [hole(90.0, 1.0)];
        assert!(warns(&holes));
        assert!(errors(&holes));
    }

    #[test]
    fn test_any_hole_in_list_triggers() {
        let holes = [hole(5.0, 1.0), hole(90.0, 1.0)];
        assert!(warns(&holes));
        assert!(errors(&holes));
    }

    #[test]
    fn test_threshold_is_strict() {
        let holes = [hole(20.0, 1.0)];
        assert!(!warns(&holes));
        let holes = [hole(80.0, 1.0)];
        assert!(!errors(&holes));
    }

    #[test]
    fn test_absent_and_empty_lists_flag_nothing() {
        assert!(!has_unreachable_hole_warning(None));
        assert!(!has_unreachable_hole_error(None));
        assert!(!warns(&[]));
        assert!(!errors(&[]));
    }

    #[test]
    fn test_each_hole_uses_its_own_radius() {
        // 30 > 1*20 but 30 <= 2*20
        let holes = [hole(30.0, 2.0), hole(15.0, 0.5)];
        assert!(warns(&holes));
        assert!(!errors(&holes));
    }

    // Non-positive radius is computed as-is rather than rejected
    #[test]
    fn test_zero_radius_flags_any_positive_length() {
        let holes = [hole(0.1, 0.0)];
        assert!(warns(&holes));
        assert!(errors(&holes));

        let holes = [hole(0.0, 0.0)];
        assert!(!warns(&holes));
    }

    #[test]
    fn test_negative_radius_flags_zero_length() {
        let holes = [hole(0.0, -1.0)];
        assert!(warns(&holes));
        assert!(errors(&holes));
    }

    #[test]
    fn test_below_poor_never_warns() {
        for radius in [0.1, 0.5, 1.0, 3.0, 12.5] {
            let holes: Vec<_> = (0..=10)
                .map(|step| hole(poor_ratio(radius) * (step as f64 / 10.0), radius))
                .collect();
            assert!(!warns(&holes), "radius {radius}");
        }
    }

    #[test]
    fn test_above_critical_always_warns_too() {
        for radius in [0.1, 0.5, 1.0, 3.0, 12.5] {
            let holes = [hole(1.0, radius), hole(critical_ratio(radius) + 0.5, radius)];
            assert!(errors(&holes), "radius {radius}");
            assert!(warns(&holes), "radius {radius}");
        }
    }
}
