//! In-memory sample-data record structure.
//!
//! Instrument parsers (out of scope here) produce one `SampleDataset` per
//! deployment file: named dimensions, named variables and the per-instrument
//! metadata the transform pipeline dispatches on. The pipeline rewrites the
//! structure in place and appends to its history trail.

use crate::types::{AdcpError, AdcpResult, AngleSeries, InstrumentMetadata, VelGrid};
use chrono::Utc;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Time dimension name
pub const DIM_TIME: &str = "TIME";
/// Along-beam bin-centre distance dimension (raw, pre bin-mapping)
pub const DIM_DIST_ALONG_BEAMS: &str = "DIST_ALONG_BEAMS";
/// Common vertical axis dimension (post bin-mapping)
pub const DIM_HEIGHT_ABOVE_SENSOR: &str = "HEIGHT_ABOVE_SENSOR";

/// A named coordinate dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub values: Vec<f64>,
}

/// Variable payload: a per-timestep series or a time x bin grid
#[derive(Debug, Clone)]
pub enum VariableData {
    Series(AngleSeries),
    Grid(VelGrid),
}

impl VariableData {
    pub fn as_grid(&self) -> Option<&VelGrid> {
        match self {
            VariableData::Grid(g) => Some(g),
            VariableData::Series(_) => None,
        }
    }

    pub fn as_series(&self) -> Option<&AngleSeries> {
        match self {
            VariableData::Series(s) => Some(s),
            VariableData::Grid(_) => None,
        }
    }
}

/// A named variable with its dimension references and provenance comment
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub dimensions: Vec<String>,
    pub data: VariableData,
    pub comment: String,
}

impl Variable {
    /// New per-timestep series variable
    pub fn series(name: &str, data: AngleSeries) -> Self {
        Variable {
            name: name.to_string(),
            dimensions: vec![DIM_TIME.to_string()],
            data: VariableData::Series(data),
            comment: String::new(),
        }
    }

    /// New time x bin grid variable on the given vertical dimension
    pub fn grid(name: &str, vertical_dim: &str, data: VelGrid) -> Self {
        Variable {
            name: name.to_string(),
            dimensions: vec![DIM_TIME.to_string(), vertical_dim.to_string()],
            data: VariableData::Grid(data),
            comment: String::new(),
        }
    }

    pub fn references(&self, dim_name: &str) -> bool {
        self.dimensions.iter().any(|d| d == dim_name)
    }

    /// Append a provenance comment, separated from any existing text
    pub fn append_comment(&mut self, text: &str) {
        if self.comment.is_empty() {
            self.comment = text.to_string();
        } else {
            self.comment.push(' ');
            self.comment.push_str(text);
        }
    }
}

/// One instrument deployment's worth of sample data
#[derive(Debug, Clone)]
pub struct SampleDataset {
    pub dimensions: Vec<Dimension>,
    pub variables: Vec<Variable>,
    pub metadata: InstrumentMetadata,
    pub history: Vec<String>,
}

impl SampleDataset {
    pub fn new(metadata: InstrumentMetadata) -> Self {
        SampleDataset {
            dimensions: Vec::new(),
            variables: Vec::new(),
            metadata,
            history: Vec::new(),
        }
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn has_dimension(&self, name: &str) -> bool {
        self.dimension(name).is_some()
    }

    pub fn add_dimension(&mut self, name: &str, values: Vec<f64>) {
        self.dimensions.push(Dimension {
            name: name.to_string(),
            values,
        });
    }

    pub fn remove_dimension(&mut self, name: &str) {
        self.dimensions.retain(|d| d.name != name);
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.name == name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }

    pub fn add_variable(&mut self, variable: Variable) {
        self.variables.push(variable);
    }

    pub fn remove_variable(&mut self, name: &str) {
        self.variables.retain(|v| v.name != name);
    }

    /// Any variable still indexed by the given dimension?
    pub fn dimension_referenced(&self, dim_name: &str) -> bool {
        self.variables.iter().any(|v| v.references(dim_name))
    }

    /// Fetch a per-timestep series variable, or fail with a configuration error
    pub fn require_series(&self, name: &str) -> AdcpResult<&AngleSeries> {
        self.variable(name)
            .and_then(|v| v.data.as_series())
            .ok_or_else(|| {
                AdcpError::Config(format!("Missing per-timestep variable: {}", name))
            })
    }

    /// Fetch a time x bin grid variable, or fail with a configuration error
    pub fn require_grid(&self, name: &str) -> AdcpResult<&VelGrid> {
        self.variable(name)
            .and_then(|v| v.data.as_grid())
            .ok_or_else(|| AdcpError::Config(format!("Missing gridded variable: {}", name)))
    }

    /// Heading variable to use, depending on compass correction status
    pub fn heading_name(&self) -> &'static str {
        if self.metadata.compass_correction_applied {
            "HEADING"
        } else {
            "HEADING_MAG"
        }
    }

    /// Number of timesteps, from the TIME dimension
    pub fn time_len(&self) -> usize {
        self.dimension(DIM_TIME).map(|d| d.values.len()).unwrap_or(0)
    }

    /// Append a timestamped entry to the dataset history trail
    pub fn append_history(&mut self, entry: &str) {
        let stamped = format!("{} - {}", Utc::now().format("%Y-%m-%dT%H:%M:%SZ"), entry);
        log::debug!("History: {}", stamped);
        self.history.push(stamped);
    }
}

/// Convenience: series variable filled from a slice
pub fn series_from(values: &[f32]) -> AngleSeries {
    Array1::from_vec(values.to_vec())
}
