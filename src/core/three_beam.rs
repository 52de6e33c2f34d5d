//! Three-beam solution for degraded four-beam ensembles.
//!
//! A four-beam Janus head is redundant: the error-velocity combination of
//! all four beams is theoretically zero. When exactly one beam of a depth
//! cell is invalid, that constraint pins down the missing along-beam
//! velocity from the other three.

use crate::types::{AdcpError, AdcpResult, RotationMatrix};
use ndarray::{Array2, ArrayView2};

/// Recover single-beam dropouts in a set of depth-cell rows.
///
/// `beam_rows` holds one depth cell per row and exactly four beam columns.
/// Rows with all four beams finite pass through unchanged. Rows with two
/// or fewer finite beams also pass through unchanged, NaN markers
/// included; recovery is strictly three-beam-only. Only rows with exactly
/// three finite beams are rewritten.
pub fn solve(matrix: &RotationMatrix, beam_rows: ArrayView2<f32>) -> AdcpResult<Array2<f32>> {
    if beam_rows.ncols() != 4 {
        return Err(AdcpError::Config(format!(
            "Three-beam solution needs 4 beam columns, got {}",
            beam_rows.ncols()
        )));
    }
    if matrix.dim() != (4, 4) {
        return Err(AdcpError::Config(format!(
            "Three-beam solution needs a 4x4 instrument matrix, got {:?}",
            matrix.dim()
        )));
    }

    let error_row = matrix.row(3);
    let mut corrected = beam_rows.to_owned();

    for mut row in corrected.rows_mut() {
        let missing: Vec<usize> = (0..4).filter(|&j| row[j].is_nan()).collect();
        if missing.len() != 1 {
            continue;
        }
        let j = missing[0];
        let weight = error_row[j];
        if weight == 0.0 {
            // Beam carries no error-velocity weight; constraint cannot
            // resolve it.
            continue;
        }

        row[j] = 0.0;
        let err: f32 = (0..4).map(|k| row[k] * error_row[k]).sum();
        row[j] = -err / weight;
    }

    Ok(corrected)
}
