use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

/// Real-valued velocity or backscatter sample (single precision, matching
/// the precision the instruments record at)
pub type VelReal = f32;

/// 2D time x bin data array
pub type VelGrid = Array2<VelReal>;

/// Per-timestep orientation series (degrees)
pub type AngleSeries = Array1<VelReal>;

/// time x bin x beam tilt-adjusted height array
pub type HeightCube = Array3<VelReal>;

/// Beam-to-instrument rotation matrix (4x4, beam space -> XYZ + error)
pub type RotationMatrix = Array2<VelReal>;

/// Transducer head beam pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeamPattern {
    Convex,
    Concave,
}

impl std::fmt::Display for BeamPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BeamPattern::Convex => write!(f, "convex"),
            BeamPattern::Concave => write!(f, "concave"),
        }
    }
}

impl std::str::FromStr for BeamPattern {
    type Err = AdcpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "convex" => Ok(BeamPattern::Convex),
            "concave" => Ok(BeamPattern::Concave),
            other => Err(AdcpError::Config(format!(
                "Invalid beam pattern: {}",
                other
            ))),
        }
    }
}

/// Which way the transducer face points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceConfig {
    Up,
    Down,
}

impl FaceConfig {
    /// Sign convention used by the bin-height geometry (+1 up, -1 down)
    pub fn pitch_sign(&self) -> f32 {
        match self {
            FaceConfig::Up => 1.0,
            FaceConfig::Down => -1.0,
        }
    }
}

impl std::fmt::Display for FaceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaceConfig::Up => write!(f, "up"),
            FaceConfig::Down => write!(f, "down"),
        }
    }
}

/// Coordinate frame the velocity data is referenced to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinateFrame {
    Beam,
    Instrument,
    Ship,
    Earth,
}

impl std::fmt::Display for CoordinateFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinateFrame::Beam => write!(f, "beam"),
            CoordinateFrame::Instrument => write!(f, "instrument"),
            CoordinateFrame::Ship => write!(f, "ship"),
            CoordinateFrame::Earth => write!(f, "earth"),
        }
    }
}

/// Decoded manufacturer coordinate-transformation configuration byte.
///
/// Bits are numbered 1 (LSB) to 8. Bits 4-5 select the coordinate frame
/// (00 = beam, 01 = instrument, 10 = ship, 11 = earth); bits 6, 7 and 8
/// flag tilt compensation, three-beam solution and bin mapping use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformConfig {
    pub frame: CoordinateFrame,
    pub tilts_used: bool,
    pub three_beam_used: bool,
    pub bin_mapping_used: bool,
}

impl TransformConfig {
    /// Decode the 8-bit EX-style configuration byte
    pub fn from_byte(byte: u8) -> Self {
        let frame = match (byte >> 3) & 0b11 {
            0b00 => CoordinateFrame::Beam,
            0b01 => CoordinateFrame::Instrument,
            0b10 => CoordinateFrame::Ship,
            _ => CoordinateFrame::Earth,
        };

        TransformConfig {
            frame,
            tilts_used: (byte >> 5) & 1 == 1,
            three_beam_used: (byte >> 6) & 1 == 1,
            bin_mapping_used: (byte >> 7) & 1 == 1,
        }
    }
}

/// Per-instrument metadata carried alongside the sample data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentMetadata {
    pub instrument_make: String,
    pub instrument_model: String,

    // Beam geometry
    pub beam_angle: f32, // degrees
    pub beam_pattern: BeamPattern,
    pub number_of_beams: usize,

    // Orientation
    pub coordinate_frame: CoordinateFrame,
    pub orientation: Option<FaceConfig>,
    pub tilt_sensor_used: bool,

    // Heading handling
    pub compass_correction_applied: bool,
}

/// East/north/up/error velocity arrays, all time x bin
#[derive(Debug, Clone)]
pub struct EnuVelocity {
    pub east: VelGrid,
    pub north: VelGrid,
    pub up: VelGrid,
    pub error: VelGrid,
}

/// Error types for ADCP processing
#[derive(Debug, thiserror::Error)]
pub enum AdcpError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for ADCP operations
pub type AdcpResult<T> = Result<T, AdcpError>;
