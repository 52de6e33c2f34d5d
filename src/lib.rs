//! adcpkit: A Fast, Modular ADCP Beam-to-Earth Current Processor
//!
//! This library converts raw acoustic Doppler current profiler (ADCP)
//! beam-velocity measurements into earth-referenced (ENU) current vectors,
//! correcting for instrument tilt, degraded three-beam ensembles and
//! per-beam bin heights. It is the numerical core of a larger ingest
//! toolbox; file parsing, QC flagging and NetCDF export live elsewhere
//! and talk to this crate through the [`dataset::SampleDataset`]
//! structure.

pub mod types;
pub mod dataset;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    AdcpError, AdcpResult, AngleSeries, BeamPattern, CoordinateFrame, EnuVelocity, FaceConfig,
    HeightCube, InstrumentMetadata, RotationMatrix, TransformConfig, VelGrid, VelReal,
};

pub use dataset::{Dimension, SampleDataset, Variable, VariableData};
