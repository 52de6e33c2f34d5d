//! Gimbal pitch correction.
//!
//! The tilt sensors report pitch about an axis that rolls with the
//! instrument. The effective ("gimbal") pitch, as a mechanically
//! stabilised sensor would measure it, is atan(tan(pitch) * cos(roll)).

use crate::types::AngleSeries;
use ndarray::{Array1, Zip};

/// Compute the per-timestep gimbal pitch in degrees.
///
/// When the tilt sensor was disabled (`tilt_used == false`) the instrument
/// recorded meaningless tilt values, so the result is all zero regardless
/// of input; a warning is logged. Pitch of exactly +/-90 degrees has no
/// defined tangent and yields NaN, which is left in place.
///
/// Output is bounded in (-90, 90) by construction of atan.
pub fn gimbal_pitch(pitch: &AngleSeries, roll: &AngleSeries, tilt_used: bool) -> AngleSeries {
    if !tilt_used {
        log::warn!(
            "Tilt sensor was not used; gimbal pitch forced to zero for {} samples",
            pitch.len()
        );
        return Array1::zeros(pitch.len());
    }

    Zip::from(pitch).and(roll).map_collect(|&p, &r| {
        (p.to_radians().tan() * r.to_radians().cos()).atan().to_degrees()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;

    #[test]
    fn test_zero_pitch_gives_zero_for_any_roll() {
        let pitch = Array1::zeros(37);
        let roll = Array1::linspace(-180.0, 180.0, 37);
        let gp = gimbal_pitch(&pitch, &roll, true);
        for &g in gp.iter() {
            assert_abs_diff_eq!(g, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_tilt_bit_off_forces_zero() {
        let pitch = Array1::from_vec(vec![10.0, -45.0, 89.0]);
        let roll = Array1::from_vec(vec![5.0, 170.0, -30.0]);
        let gp = gimbal_pitch(&pitch, &roll, false);
        assert!(gp.iter().all(|&g| g == 0.0));
    }

    #[test]
    fn test_zero_roll_passes_pitch_through() {
        let pitch = Array1::from_vec(vec![-30.0, -5.0, 0.0, 5.0, 30.0]);
        let roll = Array1::zeros(5);
        let gp = gimbal_pitch(&pitch, &roll, true);
        for (&g, &p) in gp.iter().zip(pitch.iter()) {
            assert_abs_diff_eq!(g, p, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_output_bounded() {
        let pitch = Array1::linspace(-89.0, 89.0, 90);
        let roll = Array1::linspace(-180.0, 180.0, 90);
        let gp = gimbal_pitch(&pitch, &roll, true);
        assert!(gp.iter().all(|&g| g > -90.0 && g < 90.0));
    }

    #[test]
    fn test_right_angle_pitch_boundary() {
        let pitch = Array1::from_vec(vec![90.0]);
        let roll = Array1::from_vec(vec![0.0]);
        let gp = gimbal_pitch(&pitch, &roll, true);
        // tan(90 deg) is undefined; the boundary case is documented, not
        // clamped, so either NaN or a value saturating toward 90 is valid
        assert!(gp[0].is_nan() || gp[0].abs() < 90.0);
    }
}
