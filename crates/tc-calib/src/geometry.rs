//! Closed-form volume of a horizontal cylinder filled to a given height.
//!
//! All lengths are inches and volumes are US gallons. The partial fill is the
//! circular segment below the liquid line extruded along the tank length:
//!
//! ```text
//! y = R - h
//! θ = 2·acos(y / R)
//! A = (R² / 2)(θ - sin θ)
//! V = A · L / 231
//! ```

use std::f64::consts::PI;

use tc_core::units::{GALLONS_PER_CUBIC_INCH, Length, Volume, gallon, to_inches};
use tc_core::{clamp_to, ensure_positive, linspace};

use crate::error::{CalibError, CalibResult};

/// Gallons held by a full tank.
pub fn full_volume_gallons(diameter: f64, length: f64) -> f64 {
    let r = diameter / 2.0;
    PI * r * r * length * GALLONS_PER_CUBIC_INCH
}

/// Gallons held at `height` inches of liquid.
///
/// Heights at or below zero give 0, heights at or above the diameter give the
/// full volume. NaN heights are treated as empty.
pub fn volume_gallons(height: f64, diameter: f64, length: f64) -> f64 {
    if height.is_nan() || height <= 0.0 {
        return 0.0;
    }
    if height >= diameter {
        return full_volume_gallons(diameter, length);
    }

    let r = diameter / 2.0;
    let y = r - height;
    // acos is undefined outside [-1, 1]; rounding can push y/R just past it
    let theta = 2.0 * clamp_to(y / r, -1.0, 1.0).acos();
    let area_segment = (r * r / 2.0) * (theta - theta.sin());
    area_segment * length * GALLONS_PER_CUBIC_INCH
}

/// Typed variant of [`volume_gallons`].
pub fn tank_volume(height: Length, diameter: Length, length: Length) -> Volume {
    gallon(volume_gallons(
        to_inches(height),
        to_inches(diameter),
        to_inches(length),
    ))
}

/// Fraction of the diameter covered by the liquid, in `[0, 1]`.
pub fn fill_fraction(height: f64, diameter: f64) -> f64 {
    if diameter <= 0.0 {
        return 0.0;
    }
    clamp_to(height / diameter, 0.0, 1.0)
}

/// `n` evenly spaced heights over `[0, diameter]` paired with their analytic volumes.
pub fn analytic_samples(
    diameter: f64,
    length: f64,
    n: usize,
) -> CalibResult<(Vec<f64>, Vec<f64>)> {
    let diameter = ensure_positive(diameter, "diameter")?;
    let length = ensure_positive(length, "length")?;
    if n < 2 {
        return Err(CalibError::InvalidArg {
            what: "analytic sample count must be at least 2",
        });
    }

    let heights = linspace(0.0, diameter, n);
    let volumes = heights
        .iter()
        .map(|&h| volume_gallons(h, diameter, length))
        .collect();
    Ok((heights, volumes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_core::units::{inch, to_gallons};
    use tc_core::{Tolerances, nearly_equal};

    const D: f64 = 45.0;
    const L: f64 = 71.0;

    fn tol() -> Tolerances {
        Tolerances {
            abs: 1e-9,
            rel: 1e-12,
        }
    }

    #[test]
    fn empty_and_full() {
        assert_eq!(volume_gallons(0.0, D, L), 0.0);
        assert_eq!(volume_gallons(-4.0, D, L), 0.0);
        assert_eq!(volume_gallons(f64::NAN, D, L), 0.0);

        let full = PI * 22.5 * 22.5 * 71.0 / 231.0;
        assert!(nearly_equal(volume_gallons(D, D, L), full, tol()));
        assert!(nearly_equal(volume_gallons(60.0, D, L), full, tol()));
        assert!((full - 488.834).abs() < 1e-3);
    }

    #[test]
    fn half_height_is_half_volume() {
        let half = volume_gallons(22.5, D, L);
        assert!(nearly_equal(half, full_volume_gallons(D, L) / 2.0, tol()));
        assert!((half - 244.417).abs() < 1e-3);
    }

    #[test]
    fn continuous_at_boundaries() {
        let eps = 1e-9;
        assert!(volume_gallons(eps, D, L) < 1e-6);
        let near_full = volume_gallons(D - eps, D, L);
        assert!((full_volume_gallons(D, L) - near_full).abs() < 1e-6);
    }

    #[test]
    fn symmetric_about_centerline() {
        // V(h) + V(D - h) = V(full)
        let full = full_volume_gallons(D, L);
        for h in [1.0, 7.5, 13.0, 20.0] {
            let sum = volume_gallons(h, D, L) + volume_gallons(D - h, D, L);
            assert!(nearly_equal(sum, full, Tolerances { abs: 1e-9, rel: 1e-9 }));
        }
    }

    #[test]
    fn typed_volume_matches_scalar() {
        let v = tank_volume(inch(10.0), inch(D), inch(L));
        let tol = Tolerances {
            abs: 1e-9,
            rel: 1e-6,
        };
        assert!(nearly_equal(to_gallons(v), volume_gallons(10.0, D, L), tol));
    }

    #[test]
    fn fill_fraction_clamps() {
        assert_eq!(fill_fraction(-1.0, D), 0.0);
        assert_eq!(fill_fraction(22.5, D), 0.5);
        assert_eq!(fill_fraction(90.0, D), 1.0);
        assert_eq!(fill_fraction(1.0, 0.0), 0.0);
    }

    #[test]
    fn analytic_samples_cover_range() {
        let (hs, vs) = analytic_samples(D, L, 361).unwrap();
        assert_eq!(hs.len(), 361);
        assert_eq!(vs.len(), 361);
        assert_eq!(hs[0], 0.0);
        assert_eq!(hs[360], D);
        assert_eq!(vs[0], 0.0);
        assert!(nearly_equal(vs[360], full_volume_gallons(D, L), tol()));
    }

    #[test]
    fn analytic_samples_reject_bad_args() {
        assert!(analytic_samples(0.0, L, 361).is_err());
        assert!(analytic_samples(D, -1.0, 361).is_err());
        assert!(matches!(
            analytic_samples(D, L, 1),
            Err(CalibError::InvalidArg { .. })
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn monotonic_in_height(
            d in 1.0_f64..200.0,
            l in 1.0_f64..500.0,
            a in -0.1_f64..1.1,
            b in -0.1_f64..1.1,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let v_lo = volume_gallons(lo * d, d, l);
            let v_hi = volume_gallons(hi * d, d, l);
            prop_assert!(v_lo <= v_hi + 1e-9 * full_volume_gallons(d, l));
        }

        #[test]
        fn bounded_by_empty_and_full(d in 1.0_f64..200.0, l in 1.0_f64..500.0, f in -0.5_f64..1.5) {
            let v = volume_gallons(f * d, d, l);
            prop_assert!(v >= 0.0);
            prop_assert!(v <= full_volume_gallons(d, l) * (1.0 + 1e-12));
        }

        #[test]
        fn endpoints_hold_for_any_dimensions(d in 0.5_f64..300.0, l in 0.5_f64..600.0) {
            prop_assert_eq!(volume_gallons(0.0, d, l), 0.0);
            let full = std::f64::consts::PI * (d / 2.0).powi(2) * l / 231.0;
            prop_assert!((volume_gallons(d, d, l) - full).abs() <= 1e-9 * full.max(1.0));
        }
    }
}
