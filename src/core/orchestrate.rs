//! Dataset-level orchestration of the transform pipeline.
//!
//! Selects the datasets eligible for beam-to-earth conversion and drives
//! the full chain on each: bin mapping first, so every beam's samples
//! share a vertical axis before beams are combined, then the rotation to
//! ENU velocities. The sample-data structure is rewritten in place:
//! UCUR/VCUR/WCUR/ECUR replace the raw beam velocities and the history
//! trail records both steps.

use crate::core::{beam_geometry, bin_map, rotation};
use crate::dataset::{SampleDataset, Variable, DIM_DIST_ALONG_BEAMS, DIM_TIME};
use crate::types::{AdcpError, AdcpResult, CoordinateFrame, FaceConfig};

/// Provenance marker for the beam-to-earth conversion step
pub const BEAM_TO_EARTH_COMMENT: &str =
    "beam2earth: velocity data converted from beam to earth (ENU) coordinates.";

const BEAM_VELOCITY_NAMES: [&str; 4] = ["VEL1", "VEL2", "VEL3", "VEL4"];

/// Indices of the datasets eligible for beam-to-earth conversion.
///
/// Eligible datasets are Teledyne RDI instruments still in beam
/// coordinates, carrying all four beam velocities, the orientation
/// series and the raw along-beam distance dimension.
pub fn select_eligible(datasets: &[SampleDataset]) -> Vec<usize> {
    datasets
        .iter()
        .enumerate()
        .filter(|(_, ds)| {
            let make = ds.metadata.instrument_make.to_lowercase();
            let is_rdi = make.contains("rdi") || make.contains("teledyne");

            is_rdi
                && ds.metadata.coordinate_frame == CoordinateFrame::Beam
                && BEAM_VELOCITY_NAMES.iter().all(|name| ds.has_variable(name))
                && ds.has_variable("PITCH")
                && ds.has_variable("ROLL")
                && ds.has_variable(ds.heading_name())
                && ds.has_dimension(DIM_DIST_ALONG_BEAMS)
        })
        .map(|(i, _)| i)
        .collect()
}

/// Face configuration for the rotation step.
///
/// Metadata wins when present; otherwise the sign of the vertical axis
/// the velocity variables sit on decides.
fn resolve_face(dataset: &SampleDataset) -> AdcpResult<FaceConfig> {
    if let Some(face) = dataset.metadata.orientation {
        return Ok(face);
    }

    let vertical_dim = dataset
        .variable("VEL1")
        .and_then(|v| v.dimensions.iter().find(|d| *d != DIM_TIME).cloned())
        .ok_or_else(|| AdcpError::Config("VEL1 carries no vertical dimension".to_string()))?;

    let values: Vec<f32> = dataset
        .dimension(&vertical_dim)
        .ok_or_else(|| AdcpError::Config(format!("Missing dimension: {}", vertical_dim)))?
        .values
        .iter()
        .map(|&v| v as f32)
        .collect();

    bin_map::detect_face(&values)
}

/// Run the full beam-to-earth transform chain on one dataset.
///
/// Configuration problems surface immediately; the caller decides whether
/// to skip the dataset or abort its batch. On success the beam velocity
/// variables are gone, the ENU variables are in place on the mapped
/// vertical axis and the coordinate frame is retagged as earth.
pub fn transform(dataset: &mut SampleDataset) -> AdcpResult<()> {
    if dataset.metadata.coordinate_frame != CoordinateFrame::Beam {
        return Err(AdcpError::Config(format!(
            "Dataset is in {} coordinates, expected beam",
            dataset.metadata.coordinate_frame
        )));
    }

    log::info!(
        "Transforming dataset from {} {} ({} beams, {} deg)",
        dataset.metadata.instrument_make,
        dataset.metadata.instrument_model,
        dataset.metadata.number_of_beams,
        dataset.metadata.beam_angle
    );

    // Bin mapping first: rotation mixes beams per bin, which is only
    // meaningful once the bins of all beams sit at the same height
    bin_map::map(dataset)?;

    let matrix = beam_geometry::build(
        dataset.metadata.beam_angle,
        dataset.metadata.beam_pattern,
    )?;
    let face = resolve_face(dataset)?;

    let heading = dataset.require_series(dataset.heading_name())?.clone();
    let pitch = dataset.require_series("PITCH")?.clone();
    let roll = dataset.require_series("ROLL")?.clone();

    let b1 = dataset.require_grid("VEL1")?.clone();
    let b2 = dataset.require_grid("VEL2")?.clone();
    let b3 = dataset.require_grid("VEL3")?.clone();
    let b4 = dataset.require_grid("VEL4")?.clone();

    let enu = rotation::rotate(
        face,
        &heading,
        &pitch,
        &roll,
        dataset.metadata.tilt_sensor_used,
        &matrix,
        [&b1, &b2, &b3, &b4],
    )?;

    let vertical_dim = dataset
        .variable("VEL1")
        .and_then(|v| v.dimensions.iter().find(|d| *d != DIM_TIME).cloned())
        .ok_or_else(|| AdcpError::Config("VEL1 carries no vertical dimension".to_string()))?;

    // Magnetic-heading data yields magnetic-referenced horizontal names
    let (east_name, north_name) = if dataset.metadata.compass_correction_applied {
        ("UCUR", "VCUR")
    } else {
        ("UCUR_MAG", "VCUR_MAG")
    };

    let outputs = [
        (east_name, enu.east),
        (north_name, enu.north),
        ("WCUR", enu.up),
        ("ECUR", enu.error),
    ];
    for (name, data) in outputs {
        let mut variable = Variable::grid(name, &vertical_dim, data);
        variable.append_comment(BEAM_TO_EARTH_COMMENT);
        dataset.add_variable(variable);
    }

    for name in BEAM_VELOCITY_NAMES {
        dataset.remove_variable(name);
    }

    dataset.metadata.coordinate_frame = CoordinateFrame::Earth;
    dataset.append_history(BEAM_TO_EARTH_COMMENT);

    log::info!("Beam-to-earth transform complete");
    Ok(())
}
