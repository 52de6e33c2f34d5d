//! Beam-to-earth velocity rotation.
//!
//! For every timestep the static beam-to-instrument matrix is composed
//! with heading, gimbal-pitch and adjusted-roll rotations, and applied to
//! the (possibly three-beam-recovered) beam velocities of every depth
//! cell. The error-velocity axis is carried through untouched by the
//! attitude rotations.

use crate::core::{gimbal, three_beam};
use crate::types::{
    AdcpError, AdcpResult, AngleSeries, EnuVelocity, FaceConfig, RotationMatrix, VelGrid,
};
use ndarray::{Array2, ArrayView2, Axis};

/// Standard right-handed rotation about the vertical (heading) axis
fn heading_matrix(deg: f32) -> [[f32; 3]; 3] {
    let (s, c) = deg.to_radians().sin_cos();
    [[c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]]
}

/// Rotation about the pitch axis
fn pitch_matrix(deg: f32) -> [[f32; 3]; 3] {
    let (s, c) = deg.to_radians().sin_cos();
    [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]]
}

/// Rotation about the roll axis
fn roll_matrix(deg: f32) -> [[f32; 3]; 3] {
    let (s, c) = deg.to_radians().sin_cos();
    [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]]
}

fn mat3_mul(a: &[[f32; 3]; 3], b: &[[f32; 3]; 3]) -> [[f32; 3]; 3] {
    let mut out = [[0.0f32; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                out[i][j] += a[i][k] * b[k][j];
            }
        }
    }
    out
}

/// Compose the full 4x4 beam-to-earth matrix for one timestep.
///
/// The attitude rotation acts on the instrument X/Y/Z rows of the static
/// beam matrix; the error row is appended unchanged.
fn compose(
    matrix: &RotationMatrix,
    heading_deg: f32,
    gpitch_deg: f32,
    roll_deg: f32,
) -> Array2<f32> {
    let hp = mat3_mul(&heading_matrix(heading_deg), &pitch_matrix(gpitch_deg));
    let attitude = mat3_mul(&hp, &roll_matrix(roll_deg));

    let mut composed = Array2::<f32>::zeros((4, 4));
    for i in 0..3 {
        for j in 0..4 {
            let mut acc = 0.0;
            for k in 0..3 {
                acc += attitude[i][k] * matrix[[k, j]];
            }
            composed[[i, j]] = acc;
        }
    }
    for j in 0..4 {
        composed[[3, j]] = matrix[[3, j]];
    }
    composed
}

/// Rotate all depth cells of a single timestep.
///
/// `beam_rows` is bins x 4. Three-beam recovery runs on the raw beam rows
/// before any rotation is applied. Returns bins x 4 (east, north, up,
/// error columns).
fn rotate_timestep(
    matrix: &RotationMatrix,
    heading_deg: f32,
    gpitch_deg: f32,
    roll_deg: f32,
    beam_rows: ArrayView2<f32>,
) -> AdcpResult<Array2<f32>> {
    let solved = three_beam::solve(matrix, beam_rows)?;
    let composed = compose(matrix, heading_deg, gpitch_deg, roll_deg);

    let n_bins = solved.nrows();
    let mut enu = Array2::<f32>::zeros((n_bins, 4));
    for n in 0..n_bins {
        for i in 0..4 {
            let mut acc = 0.0;
            for j in 0..4 {
                acc += composed[[i, j]] * solved[[n, j]];
            }
            enu[[n, i]] = acc;
        }
    }
    Ok(enu)
}

fn check_shapes(
    heading: &AngleSeries,
    pitch: &AngleSeries,
    roll: &AngleSeries,
    beams: &[&VelGrid; 4],
) -> AdcpResult<(usize, usize)> {
    let t_len = heading.len();
    if pitch.len() != t_len || roll.len() != t_len {
        return Err(AdcpError::ShapeMismatch(format!(
            "Orientation series lengths differ: heading={}, pitch={}, roll={}",
            t_len,
            pitch.len(),
            roll.len()
        )));
    }

    let dim = beams[0].dim();
    for (i, beam) in beams.iter().enumerate() {
        if beam.dim() != dim {
            return Err(AdcpError::ShapeMismatch(format!(
                "Beam {} velocity shape {:?} differs from beam 1 shape {:?}",
                i + 1,
                beam.dim(),
                dim
            )));
        }
    }
    if dim.0 != t_len {
        return Err(AdcpError::ShapeMismatch(format!(
            "Beam velocity time length {} does not match orientation length {}",
            dim.0, t_len
        )));
    }
    Ok(dim)
}

/// Gather the per-bin beam rows for one timestep into a bins x 4 block
fn beam_rows_at(beams: &[&VelGrid; 4], t: usize, n_bins: usize) -> Array2<f32> {
    let mut rows = Array2::<f32>::zeros((n_bins, 4));
    for (j, beam) in beams.iter().enumerate() {
        for n in 0..n_bins {
            rows[[n, j]] = beam[[t, n]];
        }
    }
    rows
}

fn scatter_output(enu_blocks: Vec<Array2<f32>>, t_len: usize, n_bins: usize) -> EnuVelocity {
    let mut east = Array2::<f32>::zeros((t_len, n_bins));
    let mut north = east.clone();
    let mut up = east.clone();
    let mut error = east.clone();

    for (t, block) in enu_blocks.into_iter().enumerate() {
        for n in 0..n_bins {
            east[[t, n]] = block[[n, 0]];
            north[[t, n]] = block[[n, 1]];
            up[[t, n]] = block[[n, 2]];
            error[[t, n]] = block[[n, 3]];
        }
    }

    EnuVelocity {
        east,
        north,
        up,
        error,
    }
}

/// Rotate beam velocities to earth (ENU) coordinates.
///
/// All shape preconditions are checked before any per-timestep work so a
/// failure never leaves partial output. Up-facing instruments get their
/// roll offset by 180 degrees to account for the flipped transducer face.
/// NaN beam values that cannot be three-beam-recovered propagate into the
/// output.
pub fn rotate(
    face: FaceConfig,
    heading: &AngleSeries,
    pitch: &AngleSeries,
    roll: &AngleSeries,
    tilt_used: bool,
    matrix: &RotationMatrix,
    beams: [&VelGrid; 4],
) -> AdcpResult<EnuVelocity> {
    let (t_len, n_bins) = check_shapes(heading, pitch, roll, &beams)?;

    log::info!(
        "Rotating beam velocities to ENU: {} timesteps x {} bins, face {}",
        t_len,
        n_bins,
        face
    );

    let gpitch = gimbal::gimbal_pitch(pitch, roll, tilt_used);
    let roll_adjust = match face {
        FaceConfig::Up => 180.0,
        FaceConfig::Down => 0.0,
    };

    let mut blocks = Vec::with_capacity(t_len);
    for t in 0..t_len {
        let rows = beam_rows_at(&beams, t, n_bins);
        let block = rotate_timestep(
            matrix,
            heading[t],
            gpitch[t],
            roll[t] + roll_adjust,
            rows.view(),
        )?;
        blocks.push(block);
    }

    log::debug!("Beam-to-earth rotation complete");
    Ok(scatter_output(blocks, t_len, n_bins))
}

/// Parallel beam-to-earth rotation over the time axis.
///
/// Each timestep reads only the shared immutable matrix and its own
/// orientation scalars, so the map is embarrassingly parallel; results
/// are bitwise identical to [`rotate`].
#[cfg(feature = "parallel")]
pub fn rotate_parallel(
    face: FaceConfig,
    heading: &AngleSeries,
    pitch: &AngleSeries,
    roll: &AngleSeries,
    tilt_used: bool,
    matrix: &RotationMatrix,
    beams: [&VelGrid; 4],
) -> AdcpResult<EnuVelocity> {
    use rayon::prelude::*;

    let (t_len, n_bins) = check_shapes(heading, pitch, roll, &beams)?;

    log::info!(
        "Rotating beam velocities to ENU (parallel): {} timesteps x {} bins",
        t_len,
        n_bins
    );

    let gpitch = gimbal::gimbal_pitch(pitch, roll, tilt_used);
    let roll_adjust = match face {
        FaceConfig::Up => 180.0,
        FaceConfig::Down => 0.0,
    };

    let blocks: Result<Vec<Array2<f32>>, AdcpError> = (0..t_len)
        .into_par_iter()
        .map(|t| {
            let rows = beam_rows_at(&beams, t, n_bins);
            rotate_timestep(
                matrix,
                heading[t],
                gpitch[t],
                roll[t] + roll_adjust,
                rows.view(),
            )
        })
        .collect();

    Ok(scatter_output(blocks?, t_len, n_bins))
}

/// Fraction of depth cells with a valid (finite) solution per timestep.
///
/// Handy diagnostic for deciding whether a converted dataset is worth
/// keeping; mirrors the NaN-as-data contract by never erroring.
pub fn valid_fraction(enu: &EnuVelocity) -> AngleSeries {
    let n_bins = enu.east.len_of(Axis(1)).max(1);
    enu.east
        .axis_iter(Axis(0))
        .map(|row| row.iter().filter(|v| v.is_finite()).count() as f32 / n_bins as f32)
        .collect()
}
