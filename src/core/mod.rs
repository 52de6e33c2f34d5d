//! Core ADCP transform modules

pub mod beam_geometry;
pub mod gimbal;
pub mod three_beam;
pub mod rotation;
pub mod bin_height;
pub mod bin_map;
pub mod orchestrate;

// Re-export main entry points
pub use bin_map::{detect_face, BIN_MAPPING_COMMENT};
pub use gimbal::gimbal_pitch;
pub use orchestrate::{select_eligible, transform, BEAM_TO_EARTH_COMMENT};
pub use rotation::rotate;
#[cfg(feature = "parallel")]
pub use rotation::rotate_parallel;
