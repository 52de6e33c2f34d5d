//! Tilt-adjusted height above sensor for every beam and bin.
//!
//! Range gating fixes bin centres at set distances along each beam. Once
//! the instrument tilts, beams on opposite sides of the head sample
//! different true heights; these projections recover the per-beam
//! vertical distance so bin mapping can put everything back on a common
//! axis. At zero roll and zero pitch every beam reproduces the nominal
//! along-beam distances exactly.

use crate::types::{AngleSeries, HeightCube};
use ndarray::Array3;

/// Per-beam heights for a 4-beam Janus (workhorse-style) head.
///
/// `pitch_sign` is +1 for an up-facing instrument and -1 for down-facing;
/// the down-facing case inverts the output sign and shifts the roll by
/// -180 degrees so the same projection geometry applies to both faces.
/// Output is time x bin x beam.
pub fn adjust4(
    roll: &AngleSeries,
    pitch: &AngleSeries,
    pitch_sign: f32,
    dist_along_beams: &[f32],
    beam_angle_deg: f32,
) -> HeightCube {
    let t_len = roll.len();
    let n_bins = dist_along_beams.len();
    let theta = beam_angle_deg.to_radians();
    let cos_theta = theta.cos();

    log::debug!(
        "Computing 4-beam bin heights: {} timesteps x {} bins, sign {}",
        t_len,
        n_bins,
        pitch_sign
    );

    let roll_shift = if pitch_sign < 0.0 { -180.0 } else { 0.0 };

    let mut height = Array3::<f32>::zeros((t_len, n_bins, 4));
    for t in 0..t_len {
        let r = (roll[t] + roll_shift).to_radians();
        let p = pitch[t].to_radians();
        let cos_p = p.cos();
        let cos_r = r.cos();

        // Beams 1-2 straddle the roll axis, beams 3-4 the pitch axis
        let scale = [
            pitch_sign * cos_p * (theta - r).cos() / cos_theta,
            pitch_sign * cos_p * (theta + r).cos() / cos_theta,
            pitch_sign * cos_r * (theta + pitch_sign * p).cos() / cos_theta,
            pitch_sign * cos_r * (theta - pitch_sign * p).cos() / cos_theta,
        ];

        for (n, &dist) in dist_along_beams.iter().enumerate() {
            for (beam, &s) in scale.iter().enumerate() {
                height[[t, n, beam]] = dist * s;
            }
        }
    }

    height
}

/// Per-beam heights for a 3-beam (Nortek-style) head.
///
/// Beam 1 projects directly through roll and pitch; beams 2-3 sit at 120
/// degree offsets, so their beam angle is first projected onto the local
/// X and Y axes via atan(tan(angle) * cos(60)) and atan(tan(angle) *
/// cos(30)). Output is time x bin x beam.
pub fn adjust3(
    roll: &AngleSeries,
    pitch: &AngleSeries,
    dist_along_beams: &[f32],
    beam_angle_deg: f32,
) -> HeightCube {
    let t_len = roll.len();
    let n_bins = dist_along_beams.len();
    let theta = beam_angle_deg.to_radians();
    let cos_theta = theta.cos();

    // Beam angle seen from the local X and Y axes for the offset beams
    let theta_x = (theta.tan() * 60.0f32.to_radians().cos()).atan();
    let theta_y = (theta.tan() * 30.0f32.to_radians().cos()).atan();
    let cos_theta_x = theta_x.cos();
    let cos_theta_y = theta_y.cos();

    log::debug!(
        "Computing 3-beam bin heights: {} timesteps x {} bins",
        t_len,
        n_bins
    );

    let mut height = Array3::<f32>::zeros((t_len, n_bins, 3));
    for t in 0..t_len {
        let r = roll[t].to_radians();
        let p = pitch[t].to_radians();

        let scale = [
            r.cos() * (theta - p).cos() / cos_theta,
            ((theta_x + p).cos() / cos_theta_x) * ((theta_y - r).cos() / cos_theta_y),
            ((theta_x + p).cos() / cos_theta_x) * ((theta_y + r).cos() / cos_theta_y),
        ];

        for (n, &dist) in dist_along_beams.iter().enumerate() {
            for (beam, &s) in scale.iter().enumerate() {
                height[[t, n, beam]] = dist * s;
            }
        }
    }

    height
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;

    fn sweep(start: f32, stop: f32, step: f32) -> AngleSeries {
        let count = ((stop - start) / step).round() as usize + 1;
        Array1::from_iter((0..count).map(|i| start + step * i as f32))
    }

    #[test]
    fn test_zero_tilt_identity_4_beam() {
        let dist = [2.0f32, 4.0, 6.0, 8.0];
        for &angle in &[20.0f32, 25.0, 30.0] {
            for &sign in &[1.0f32, -1.0] {
                let zeros = Array1::zeros(2);
                let height = adjust4(&zeros, &zeros, sign, &dist, angle);
                for t in 0..2 {
                    for (n, &d) in dist.iter().enumerate() {
                        for beam in 0..4 {
                            assert_abs_diff_eq!(height[[t, n, beam]], d, epsilon = 1e-5);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_zero_tilt_identity_3_beam() {
        let dist = [1.5f32, 3.0, 4.5];
        for &angle in &[25.0f32, 45.0] {
            let zeros = Array1::zeros(1);
            let height = adjust3(&zeros, &zeros, &dist, angle);
            for (n, &d) in dist.iter().enumerate() {
                for beam in 0..3 {
                    assert_abs_diff_eq!(height[[0, n, beam]], d, epsilon = 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_up_down_symmetry_boundary() {
        // Beams 1-2 depend on roll only, and the -180 degree roll shift
        // cancels against the sign inversion; beams 3-4 pick up the pitch
        // flip, so they differ between faces whenever pitch is nonzero.
        let roll = sweep(-180.0, 180.0, 10.0);
        let pitch = sweep(-180.0, 180.0, 10.0);
        let dist = [5.0f32];

        let up = adjust4(&roll, &pitch, 1.0, &dist, 20.0);
        let down = adjust4(&roll, &pitch, -1.0, &dist, 20.0);

        let mut beam34_diverged = false;
        for t in 0..roll.len() {
            assert_abs_diff_eq!(up[[t, 0, 0]], down[[t, 0, 0]], epsilon = 1e-4);
            assert_abs_diff_eq!(up[[t, 0, 1]], down[[t, 0, 1]], epsilon = 1e-4);
            if (up[[t, 0, 2]] - down[[t, 0, 2]]).abs() > 1e-3 {
                beam34_diverged = true;
            }
        }
        assert!(beam34_diverged);
    }

    #[test]
    fn test_roll_shortens_beam12_heights() {
        let roll = Array1::from_vec(vec![15.0f32]);
        let pitch = Array1::zeros(1);
        let dist = [10.0f32];
        let height = adjust4(&roll, &pitch, 1.0, &dist, 20.0);

        // Rolling toward beam 1 lengthens its projection and shortens
        // beam 2's, keeping the pitch-axis beams symmetric
        assert!(height[[0, 0, 0]] > height[[0, 0, 1]]);
        assert_abs_diff_eq!(height[[0, 0, 2]], height[[0, 0, 3]], epsilon = 1e-5);
    }

    #[test]
    fn test_single_precision_output() {
        let zeros = Array1::<f32>::zeros(1);
        let height = adjust4(&zeros, &zeros, 1.0, &[1.0], 20.0);
        // Output stays single precision to match instrument storage
        let _: &Array3<f32> = &height;
    }
}
