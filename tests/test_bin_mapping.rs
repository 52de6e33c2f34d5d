use adcpkit::core::{bin_height, bin_map, orchestrate};
use adcpkit::dataset::{
    SampleDataset, Variable, DIM_DIST_ALONG_BEAMS, DIM_HEIGHT_ABOVE_SENSOR, DIM_TIME,
};
use adcpkit::types::{BeamPattern, CoordinateFrame, InstrumentMetadata};
use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array2};

fn workhorse_metadata() -> InstrumentMetadata {
    InstrumentMetadata {
        instrument_make: "Teledyne RDI".to_string(),
        instrument_model: "Workhorse Quartermaster".to_string(),
        beam_angle: 20.0,
        beam_pattern: BeamPattern::Convex,
        number_of_beams: 4,
        coordinate_frame: CoordinateFrame::Beam,
        orientation: None,
        tilt_sensor_used: true,
        compass_correction_applied: true,
    }
}

fn moored_dataset(t_len: usize, dist: &[f64]) -> SampleDataset {
    let mut ds = SampleDataset::new(workhorse_metadata());
    ds.add_dimension(DIM_TIME, (0..t_len).map(|t| t as f64 * 3600.0).collect());
    ds.add_dimension(DIM_DIST_ALONG_BEAMS, dist.to_vec());
    ds.add_variable(Variable::series("HEADING", Array1::zeros(t_len)));
    ds.add_variable(Variable::series("PITCH", Array1::zeros(t_len)));
    ds.add_variable(Variable::series("ROLL", Array1::zeros(t_len)));
    for name in ["VEL1", "VEL2", "VEL3", "VEL4"] {
        ds.add_variable(Variable::grid(
            name,
            DIM_DIST_ALONG_BEAMS,
            Array2::from_elem((t_len, dist.len()), 0.25),
        ));
    }
    for name in ["ABSIC1", "ABSIC2", "ABSIC3", "ABSIC4"] {
        ds.add_variable(Variable::grid(
            name,
            DIM_DIST_ALONG_BEAMS,
            Array2::from_elem((t_len, dist.len()), 90.0),
        ));
    }
    ds
}

#[test]
fn test_zero_tilt_heights_reproduce_bin_distances() {
    let dist = [2.0f32, 4.0, 6.0, 8.0, 10.0];
    let zeros = Array1::zeros(3);

    for &angle in &[20.0f32, 25.0, 30.0] {
        let h4 = bin_height::adjust4(&zeros, &zeros, 1.0, &dist, angle);
        let h3 = bin_height::adjust3(&zeros, &zeros, &dist, angle);
        for t in 0..3 {
            for (n, &d) in dist.iter().enumerate() {
                for beam in 0..4 {
                    assert_abs_diff_eq!(h4[[t, n, beam]], d, epsilon = 1e-5);
                }
                for beam in 0..3 {
                    assert_abs_diff_eq!(h3[[t, n, beam]], d, epsilon = 1e-5);
                }
            }
        }
    }
}

#[test]
fn test_up_down_facing_height_symmetry() {
    // Full roll/pitch sweep: the roll-axis beams (1-2) agree between
    // faces, the pitch-axis beams (3-4) must not
    let count = 37;
    let roll = Array1::linspace(-180.0, 180.0, count);
    let pitch = Array1::linspace(-180.0, 180.0, count);
    let dist = [5.0f32, 10.0];

    let up = bin_height::adjust4(&roll, &pitch, 1.0, &dist, 20.0);
    let down = bin_height::adjust4(&roll, &pitch, -1.0, &dist, 20.0);

    let mut pitch_axis_diverged = false;
    for t in 0..count {
        for n in 0..2 {
            assert_abs_diff_eq!(up[[t, n, 0]], down[[t, n, 0]], epsilon = 1e-3);
            assert_abs_diff_eq!(up[[t, n, 1]], down[[t, n, 1]], epsilon = 1e-3);
            if (up[[t, n, 2]] - down[[t, n, 2]]).abs() > 1e-3 {
                pitch_axis_diverged = true;
            }
        }
    }
    assert!(pitch_axis_diverged);
}

#[test]
fn test_bin_mapping_drops_dimension_and_stamps_provenance() {
    let mut ds = moored_dataset(4, &[-2.0, -4.0, -6.0]);

    bin_map::map(&mut ds).expect("mapping succeeds");

    // No variable references the raw axis any more, so it is gone
    assert!(!ds.has_dimension(DIM_DIST_ALONG_BEAMS));
    assert!(ds.has_dimension(DIM_HEIGHT_ABOVE_SENSOR));

    for name in [
        "VEL1", "VEL2", "VEL3", "VEL4", "ABSIC1", "ABSIC2", "ABSIC3", "ABSIC4",
    ] {
        let var = ds.variable(name).expect("variable kept");
        assert!(var.references(DIM_HEIGHT_ABOVE_SENSOR));
        assert!(
            var.comment.contains(bin_map::BIN_MAPPING_COMMENT),
            "{} missing provenance marker",
            name
        );
    }
    assert!(ds
        .history
        .iter()
        .any(|h| h.contains(bin_map::BIN_MAPPING_COMMENT)));
}

#[test]
fn test_bin_mapping_twice_is_a_noop() {
    let mut ds = moored_dataset(2, &[-2.0, -4.0]);

    bin_map::map(&mut ds).unwrap();
    let history_len = ds.history.len();
    let vel1 = ds.require_grid("VEL1").unwrap().clone();

    // Second call hits the dimension-presence guard and re-derives nothing
    bin_map::map(&mut ds).unwrap();
    assert_eq!(ds.history.len(), history_len);
    assert_eq!(ds.require_grid("VEL1").unwrap(), &vel1);
}

#[test]
fn test_full_pipeline_on_moored_deployment() {
    let datasets = vec![moored_dataset(6, &[-2.0, -4.0, -6.0, -8.0])];
    let eligible = orchestrate::select_eligible(&datasets);
    assert_eq!(eligible, vec![0]);

    let mut ds = datasets.into_iter().next().unwrap();
    orchestrate::transform(&mut ds).expect("transform succeeds");

    assert_eq!(ds.metadata.coordinate_frame, CoordinateFrame::Earth);
    assert!(ds.has_variable("UCUR"));
    assert!(ds.has_variable("WCUR"));
    assert!(!ds.has_variable("VEL1"));

    // Echo intensity survived the chain on the mapped axis
    let absic = ds.variable("ABSIC1").expect("echo intensity kept");
    assert!(absic.references(DIM_HEIGHT_ABOVE_SENSOR));

    // History records bin mapping then the coordinate conversion
    assert_eq!(ds.history.len(), 2);
    assert!(ds.history[0].contains(bin_map::BIN_MAPPING_COMMENT));
    assert!(ds.history[1].contains(orchestrate::BEAM_TO_EARTH_COMMENT));

    // Once converted, the dataset is no longer eligible for selection
    assert!(orchestrate::select_eligible(std::slice::from_ref(&ds)).is_empty());
}
