// src/analysis/departure.rs
//
// Lane departure check.
//
// The curve's independent variable is the image row, and it is evaluated at
// y = width / 2 (half the frame WIDTH, used as a row index). On a landscape
// frame that point may lie below the bottom row; the curve is extrapolated.
// The offset is compared with a strict `>` so a vehicle exactly at the
// threshold is not departing. No state is kept between calls.

use crate::types::{DepartureStatus, LaneSide, PolynomialCurve};
use tracing::{debug, warn};

/// Row at which lane x is read: half the frame width.
pub fn reference_y(width: usize) -> f64 {
    (width / 2) as f64
}

/// Compare `vehicle_x` with the curve's x at `reference_y`.
pub fn check_lane_departure(
    curve: &PolynomialCurve,
    side: LaneSide,
    reference_y: f64,
    vehicle_x: f64,
    threshold_px: f64,
) -> DepartureStatus {
    let lane_x = curve.eval(reference_y);
    let offset_px = (vehicle_x - lane_x).abs();
    let departing = offset_px > threshold_px;

    if departing {
        warn!(
            "⚠️  Lane departure ({}): offset {:.1}px > {:.1}px | lane_x={:.1} vehicle_x={:.1}",
            side.as_str(),
            offset_px,
            threshold_px,
            lane_x,
            vehicle_x
        );
    } else {
        debug!(
            "Departure check ({}): offset {:.1}px within {:.1}px",
            side.as_str(),
            offset_px,
            threshold_px
        );
    }

    DepartureStatus {
        side,
        lane_x,
        vehicle_x,
        offset_px,
        departing,
    }
}

/// Curve the vehicle is compared against: the midline when both sides
/// exist, otherwise whichever side was found.
pub fn lane_center_curve(
    left: Option<&PolynomialCurve>,
    right: Option<&PolynomialCurve>,
) -> Option<(LaneSide, PolynomialCurve)> {
    match (left, right) {
        (Some(l), Some(r)) => Some((LaneSide::Center, l.mean(r))),
        (Some(l), None) => Some((LaneSide::Left, *l)),
        (None, Some(r)) => Some((LaneSide::Right, *r)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(x: f64) -> PolynomialCurve {
        PolynomialCurve::from_coefficients(0.0, 0.0, x)
    }

    #[test]
    fn test_threshold_boundary() {
        let curve = flat(300.0);
        let y = reference_y(640);

        let inside = check_lane_departure(&curve, LaneSide::Center, y, 349.0, 50.0);
        assert!(!inside.departing);
        assert_eq!(inside.offset_px, 49.0);

        let outside = check_lane_departure(&curve, LaneSide::Center, y, 351.0, 50.0);
        assert!(outside.departing);

        let exact = check_lane_departure(&curve, LaneSide::Center, y, 350.0, 50.0);
        assert!(!exact.departing);

        // Offset is symmetric
        let left_of = check_lane_departure(&curve, LaneSide::Center, y, 249.0, 50.0);
        assert!(left_of.departing);
        assert_eq!(left_of.offset_px, 51.0);
    }

    #[test]
    fn test_reference_point_is_half_width() {
        assert_eq!(reference_y(1280), 640.0);
        assert_eq!(reference_y(641), 320.0);

        // x = y: lane_x equals the reference row itself
        let curve = PolynomialCurve::from_coefficients(0.0, 1.0, 0.0);
        let status = check_lane_departure(&curve, LaneSide::Left, reference_y(1280), 640.0, 50.0);
        assert_eq!(status.lane_x, 640.0);
        assert!(!status.departing);
        assert_eq!(status.side, LaneSide::Left);
    }

    #[test]
    fn test_center_curve_selection() {
        let l = flat(100.0);
        let r = flat(500.0);

        let (side, center) = lane_center_curve(Some(&l), Some(&r)).unwrap();
        assert_eq!(side, LaneSide::Center);
        assert_eq!(center.eval(0.0), 300.0);

        assert_eq!(lane_center_curve(Some(&l), None), Some((LaneSide::Left, l)));
        assert_eq!(lane_center_curve(None, Some(&r)), Some((LaneSide::Right, r)));
        assert!(lane_center_curve(None, None).is_none());
    }
}
