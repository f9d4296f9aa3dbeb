//! A tracked satellite: its element set and the propagation state derived from it.
//!
//! Both halves are held behind `Arc`, so cloning a [`Satellite`] is cheap and clones
//! can be handed to other threads. A new element set for the same object means a new
//! `Satellite`; the propagation state of an existing one never changes.
use std::sync::Arc;

use hifitime::Epoch;
use nalgebra::Vector3;
use serde::Serialize;

use crate::{
    constants::{CatalogNumber, Minute},
    ground_track::{sample, GroundTrack},
    observers::{look_angles, LookAngles, ObserverSite},
    orbitrack_errors::OrbitrackError,
    passes::{find_passes, PassSearch, PassWindow},
    propagator::{PropagationError, Propagator, StateVector},
    ref_system::{earth_fixed_to_geodetic, inertial_to_earth_fixed, GeodeticPosition},
    tle::{OrbitSummary, OrbitalElementSet},
};

/// Everything a display needs about a satellite at an instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatellitePosition {
    pub catalog_number: CatalogNumber,
    pub name: Option<String>,
    pub epoch: Epoch,
    pub geodetic: GeodeticPosition,
    /// Earth-fixed position, km
    pub earth_fixed: Vector3<f64>,
    /// Inertial (TEME) position, km
    pub inertial: Vector3<f64>,
    /// Inertial velocity, km/s
    pub velocity: Vector3<f64>,
    /// Norm of the inertial velocity, km/s
    pub speed: f64,
}

#[derive(Debug, Clone)]
pub struct Satellite {
    elements: Arc<OrbitalElementSet>,
    propagator: Arc<Propagator>,
}

impl Satellite {
    pub fn new(elements: OrbitalElementSet) -> Self {
        let propagator = Propagator::new(&elements);
        Satellite {
            elements: Arc::new(elements),
            propagator: Arc::new(propagator),
        }
    }

    /// Parse an element set and derive its propagation state.
    ///
    /// Arguments
    /// ---------
    /// * `name`: optional title of the element set
    /// * `line1`, `line2`: the two 69-column lines
    ///
    /// Return
    /// ------
    /// * the satellite, or `MalformedElementSet` naming the rejected line and field
    pub fn from_tle(
        name: Option<&str>,
        line1: &str,
        line2: &str,
    ) -> Result<Self, OrbitrackError> {
        Ok(Satellite::new(OrbitalElementSet::from_lines(
            name, line1, line2,
        )?))
    }

    pub fn catalog_number(&self) -> CatalogNumber {
        self.elements.catalog_number()
    }

    pub fn name(&self) -> Option<&str> {
        self.elements.name()
    }

    pub fn elements(&self) -> &OrbitalElementSet {
        &self.elements
    }

    pub fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    pub fn orbit_summary(&self) -> OrbitSummary {
        self.elements.orbit_summary()
    }

    /// Inertial state vector at `epoch`.
    pub fn state(&self, epoch: &Epoch) -> Result<StateVector, PropagationError> {
        self.propagator.propagate(epoch)
    }

    /// Inertial, earth-fixed and geodetic position at `epoch`.
    ///
    /// See also
    /// --------
    /// * [`Satellite::state`] – inertial state vector only
    pub fn position(&self, epoch: &Epoch) -> Result<SatellitePosition, PropagationError> {
        let state = self.propagator.propagate(epoch)?;
        let fixed = inertial_to_earth_fixed(&state.position, epoch);

        Ok(SatellitePosition {
            catalog_number: self.catalog_number(),
            name: self.name().map(str::to_owned),
            epoch: *epoch,
            geodetic: earth_fixed_to_geodetic(&fixed.position),
            earth_fixed: fixed.position,
            inertial: state.position,
            velocity: state.velocity,
            speed: state.speed(),
        })
    }

    /// Look angles of the satellite from `site` at `epoch`.
    ///
    /// Return
    /// ------
    /// * the look angles, `Propagation` when no position exists at `epoch`, or
    ///   `UndefinedGeometry` when the position is not finite
    pub fn look_angles(
        &self,
        epoch: &Epoch,
        site: &ObserverSite,
    ) -> Result<LookAngles, OrbitrackError> {
        let state = self.propagator.propagate(epoch)?;
        let fixed = inertial_to_earth_fixed(&state.position, epoch);
        Ok(look_angles(&fixed.position, site)?)
    }

    /// Lazily sampled ground track, see [`crate::ground_track::sample`].
    pub fn ground_track(
        &self,
        start: Epoch,
        duration: Minute,
        step_seconds: f64,
    ) -> Result<GroundTrack<'_>, OrbitrackError> {
        sample(&self.propagator, start, duration, step_seconds)
    }

    /// Visibility passes over `site`, see [`crate::passes::find_passes`].
    pub fn passes(
        &self,
        site: &ObserverSite,
        search: &PassSearch,
    ) -> Result<Vec<PassWindow>, OrbitrackError> {
        find_passes(self, site, search)
    }
}
