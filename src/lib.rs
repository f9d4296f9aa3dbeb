pub mod constants;
pub mod ephemeris;
pub mod ground_track;
pub mod observers;
pub mod orbitrack;
pub mod orbitrack_errors;
pub mod passes;
pub mod propagator;
pub mod ref_system;
pub mod satellite;
pub mod time;
pub mod tle;

pub use orbitrack::Orbitrack;
pub use orbitrack_errors::OrbitrackError;
pub use satellite::{Satellite, SatellitePosition};
pub use tle::OrbitalElementSet;
