//! Static beam-to-instrument rotation matrices.
//!
//! The instrument transformation matrix maps the four along-beam velocity
//! components onto instrument X/Y/Z plus an error-velocity axis. It depends
//! only on the beam angle and head pattern, so it is built once per
//! configuration and reused across every timestep.

use crate::types::{AdcpResult, BeamPattern, RotationMatrix};
use ndarray::Array2;

/// Build the 4-beam Janus (workhorse-style) beam-to-instrument matrix.
///
/// Row layout is fixed: row 1 carries the east components of beams 1-2,
/// row 2 the north components of beams 3-4, row 3 the vertical component
/// (equal weight, all beams), row 4 the error velocity (alternating sign).
/// A concave head flips the sign of the beam 1-2 entries.
pub fn build(beam_angle_deg: f32, pattern: BeamPattern) -> AdcpResult<RotationMatrix> {
    let theta = beam_angle_deg.to_radians();

    let a = 1.0 / (2.0 * theta.sin());
    let b = 1.0 / (4.0 * theta.cos());
    let d = a / std::f32::consts::SQRT_2;

    let c = match pattern {
        BeamPattern::Convex => 1.0,
        BeamPattern::Concave => -1.0,
    };

    log::debug!(
        "Building beam-to-instrument matrix: angle={} deg, pattern={}",
        beam_angle_deg,
        pattern
    );

    let matrix = Array2::from_shape_vec(
        (4, 4),
        vec![
            c * a, -c * a, 0.0, 0.0, //
            0.0, 0.0, -c * a, c * a, //
            b, b, b, b, //
            d, d, -d, -d,
        ],
    )
    .expect("fixed 4x4 layout");

    Ok(matrix)
}

/// Build the horizontal (H-ADCP) beam-to-instrument matrix.
///
/// The H-ADCP head carries its beams in a horizontal plane: beams 1-2 at
/// +/- beam_angle about the instrument Y axis and beam 3 along Y itself,
/// so there is no vertical solution and the fourth beam column is unused.
/// This transform is experimental; output must not be trusted without
/// independent validation, hence the warning on every call.
pub fn build_hadcp(beam_angle_deg: f32) -> RotationMatrix {
    log::warn!(
        "H-ADCP beam-to-instrument transform is not supported yet; \
         the computed matrix is experimental"
    );

    let theta = beam_angle_deg.to_radians();
    let a = 1.0 / (2.0 * theta.sin());
    let b = 1.0 / (2.0 * theta.cos());

    // x = a(v1 - v2), y = b(v1 + v2), no w, error checks beam 3 against
    // the y solution from beams 1-2.
    Array2::from_shape_vec(
        (4, 4),
        vec![
            a, -a, 0.0, 0.0, //
            b, b, 0.0, 0.0, //
            0.0, 0.0, 0.0, 0.0, //
            -b, -b, 1.0, 0.0,
        ],
    )
    .expect("fixed 4x4 layout")
}
