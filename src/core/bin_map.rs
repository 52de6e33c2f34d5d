//! Bin mapping: from along-beam distances to a common vertical axis.
//!
//! Every beam-indexed variable (velocities, echo intensity, correlation
//! magnitude, percent good) is interpolated per timestep from its own
//! tilt-adjusted bin heights onto the shared height-above-sensor grid.
//! Once no variable references the raw along-beam dimension it is dropped
//! from the dataset.

use crate::core::bin_height;
use crate::dataset::{
    SampleDataset, VariableData, DIM_DIST_ALONG_BEAMS, DIM_HEIGHT_ABOVE_SENSOR,
};
use crate::types::{AdcpError, AdcpResult, FaceConfig, HeightCube, VelGrid};
use ndarray::Array2;
use num_traits::Float;

/// Provenance marker appended to every mapped variable and to the dataset
/// history. Downstream consumers check for this string to confirm the
/// operation ran.
pub const BIN_MAPPING_COMMENT: &str =
    "binMapping: data mapped to a common height above sensor axis using tilt information.";

/// Detect the transducer face from the sign of the along-beam distances.
///
/// Negative distances mean down-facing by convention. A mix of signs is a
/// configuration error: the axis cannot face both ways.
pub fn detect_face(dist_along_beams: &[f32]) -> AdcpResult<FaceConfig> {
    let any_negative = dist_along_beams.iter().any(|&d| d < 0.0);
    let any_positive = dist_along_beams.iter().any(|&d| d > 0.0);

    match (any_negative, any_positive) {
        (true, false) => Ok(FaceConfig::Down),
        (false, true) => Ok(FaceConfig::Up),
        _ => Err(AdcpError::Config(
            "Ambiguous face configuration: along-beam distances mix signs".to_string(),
        )),
    }
}

/// Linear interpolation over a monotonic axis; NaN outside coverage.
///
/// Handles ascending and descending axes; pairs with a NaN height are
/// skipped, narrowing coverage rather than poisoning the whole profile.
fn interp_linear<T: Float>(xs: &[T], ys: &[T], x0: T) -> T {
    let descending = xs.first().zip(xs.last()).map_or(false, |(a, b)| a > b);
    let key = |x: T| if descending { -x } else { x };
    let target = key(x0);

    let mut prev: Option<(T, T)> = None;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        if x.is_nan() {
            continue;
        }
        let xk = key(x);
        if let Some((px, py)) = prev {
            if px <= target && target <= xk {
                if xk == px {
                    return py;
                }
                let w = (target - px) / (xk - px);
                return py * (T::one() - w) + y * w;
            }
        } else if xk == target {
            return y;
        }
        prev = Some((xk, y));
    }
    T::nan()
}

/// Interpolate one variable's grid from per-beam heights onto the target axis
fn map_grid(grid: &VelGrid, heights: &HeightCube, beam: usize, target: &[f32]) -> VelGrid {
    let (t_len, n_bins) = grid.dim();
    let mut mapped = Array2::<f32>::from_elem((t_len, target.len()), f32::NAN);

    for t in 0..t_len {
        let xs: Vec<f32> = (0..n_bins).map(|n| heights[[t, n, beam]]).collect();
        let ys: Vec<f32> = (0..n_bins).map(|n| grid[[t, n]]).collect();
        for (m, &x0) in target.iter().enumerate() {
            mapped[[t, m]] = interp_linear(&xs, &ys, x0);
        }
    }
    mapped
}

/// Beam index (0-based) from a trailing variable-name digit, e.g. VEL2 -> 1
fn beam_index(name: &str, number_of_beams: usize) -> Option<usize> {
    name.chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .map(|d| d as usize)
        .filter(|&d| d >= 1 && d <= number_of_beams)
        .map(|d| d - 1)
}

/// Map every along-beam-indexed variable onto the common vertical axis.
///
/// A dataset with no along-beam dimension left (already mapped, or never
/// range-gated) is a no-op; heights are never re-derived. The face
/// configuration comes from instrument metadata when present, otherwise
/// from the sign of the along-beam distances.
pub fn map(dataset: &mut SampleDataset) -> AdcpResult<()> {
    let dist: Vec<f32> = match dataset.dimension(DIM_DIST_ALONG_BEAMS) {
        Some(dim) => dim.values.iter().map(|&v| v as f32).collect(),
        None => {
            log::info!("No along-beam dimension present; bin mapping skipped");
            return Ok(());
        }
    };

    let face = match dataset.metadata.orientation {
        Some(face) => face,
        None => detect_face(&dist)?,
    };

    let n_beams = dataset.metadata.number_of_beams;
    let beam_angle = dataset.metadata.beam_angle;
    let pitch = dataset.require_series("PITCH")?.clone();
    let roll = dataset.require_series("ROLL")?.clone();

    log::info!(
        "Bin mapping {} bins for a {}-beam {}-facing instrument",
        dist.len(),
        n_beams,
        face
    );

    let heights = match n_beams {
        4 => bin_height::adjust4(&roll, &pitch, face.pitch_sign(), &dist, beam_angle),
        3 => bin_height::adjust3(&roll, &pitch, &dist, beam_angle),
        other => {
            return Err(AdcpError::Config(format!(
                "Bin mapping supports 3 or 4 beams, got {}",
                other
            )))
        }
    };

    // The common vertical axis keeps the nominal bin-centre spacing
    let target = dist.clone();

    let to_map: Vec<String> = dataset
        .variables
        .iter()
        .filter(|v| v.references(DIM_DIST_ALONG_BEAMS))
        .map(|v| v.name.clone())
        .collect();

    let mut mapped_any = false;
    for name in to_map {
        let beam = match beam_index(&name, n_beams) {
            Some(beam) => beam,
            None => {
                log::warn!(
                    "Variable {} is along-beam indexed but names no beam; left unmapped",
                    name
                );
                continue;
            }
        };

        let variable = match dataset.variable_mut(&name) {
            Some(variable) => variable,
            None => continue,
        };
        let grid = match &variable.data {
            VariableData::Grid(grid) => grid,
            VariableData::Series(_) => {
                return Err(AdcpError::Config(format!(
                    "Along-beam variable {} is not a time x bin grid",
                    name
                )))
            }
        };

        log::debug!("Mapping {} with beam {} heights", name, beam + 1);
        let mapped = map_grid(grid, &heights, beam, &target);

        variable.data = VariableData::Grid(mapped);
        for dim in variable.dimensions.iter_mut() {
            if dim == DIM_DIST_ALONG_BEAMS {
                *dim = DIM_HEIGHT_ABOVE_SENSOR.to_string();
            }
        }
        variable.append_comment(BIN_MAPPING_COMMENT);
        mapped_any = true;
    }

    if mapped_any {
        if !dataset.has_dimension(DIM_HEIGHT_ABOVE_SENSOR) {
            dataset.add_dimension(
                DIM_HEIGHT_ABOVE_SENSOR,
                target.iter().map(|&v| v as f64).collect(),
            );
        }
        dataset.append_history(BIN_MAPPING_COMMENT);
    }

    if !dataset.dimension_referenced(DIM_DIST_ALONG_BEAMS) {
        dataset.remove_dimension(DIM_DIST_ALONG_BEAMS);
        log::debug!("Dropped unreferenced {} dimension", DIM_DIST_ALONG_BEAMS);
    }

    Ok(())
}
