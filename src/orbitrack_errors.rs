use thiserror::Error;

use crate::{
    constants::CatalogNumber, observers::GeometryError, propagator::PropagationError,
    tle::TleError,
};

/// Crate-level error.
///
/// Each variant keeps the failure category distinct, so that a caller can tell an
/// invalid element set apart from a single instant where the propagation failed, or
/// from a look-angle computation that has no defined value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitrackError {
    #[error("Malformed two-line element set: {0}")]
    MalformedElementSet(#[from] TleError),

    #[error("Propagation failed: {0}")]
    Propagation(#[from] PropagationError),

    #[error("Undefined observer geometry: {0}")]
    UndefinedGeometry(#[from] GeometryError),

    #[error("Invalid observer site: {0}")]
    InvalidObserver(String),

    #[error("Invalid sampling parameters: {0}")]
    InvalidSampling(String),

    #[error("Unknown satellite: catalog number {0}")]
    UnknownSatellite(CatalogNumber),
}
