//! Chart formation detectors
//!
//! Each detector is stateless and reads only the bar series and the swing
//! points the engine extracted for it.
//!
//! # Formations
//!
//! - **Head and shoulders**: three consecutive swing highs with a dominant middle peak
//! - **Bull / bear flag**: a strong pole followed by a tight consolidation, mirror pair
//! - **Volume breakout**: last bar closes above recent highs on outsized volume

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod flag;
pub mod head_shoulders;
pub mod volume;

// Re-export all detectors for convenience
pub use flag::*;
pub use head_shoulders::*;
pub use volume::*;
