//! # Orbitrack: catalog of tracked satellites
//!
//! [`Orbitrack`] is the entry point for a presentation layer. It keeps the tracked
//! satellites by catalog number and answers the batch questions a display asks every
//! frame:
//!
//! * where is one satellite, or every satellite, at an instant
//!   ([`Orbitrack::position`], [`Orbitrack::positions`]),
//! * which satellites a site sees at an instant ([`Orbitrack::visible_from`]),
//! * when a satellite will pass over a site ([`Orbitrack::next_passes`]).
//!
//! The catalog performs no I/O: element sets come in as text or as parsed
//! [`OrbitalElementSet`](crate::tle::OrbitalElementSet) values, and nothing is cached
//! besides the propagation state of each satellite.
//!
//! ## Replacing element sets
//!
//! Inserting a satellite whose catalog number is already tracked replaces the entry.
//! The new entry carries a freshly derived propagation state. Clones of the old
//! [`Satellite`] held elsewhere keep working with the old elements.
//!
//! ## Batch results
//!
//! Batch queries return one result per satellite, ordered by catalog number, so that a
//! single decayed object never hides the others. With the `parallel` feature the batch
//! positions are computed on the rayon thread pool; the results are identical to the
//! sequential ones.
//!
//! ## Example
//!
//! ```rust
//! use hifitime::Epoch;
//! use orbitrack::orbitrack::Orbitrack;
//!
//! let mut tracker = Orbitrack::new();
//! let id = tracker.insert_tle(
//!     Some("ISS (ZARYA)"),
//!     "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927",
//!     "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537",
//! )?;
//!
//! let epoch = Epoch::from_gregorian_utc(2008, 9, 20, 13, 0, 0, 0);
//! let position = tracker.position(id, &epoch)?;
//! assert!(position.geodetic.latitude.abs() < 52.0);
//! # Ok::<(), orbitrack::orbitrack_errors::OrbitrackError>(())
//! ```
use std::collections::HashMap;

use hifitime::Epoch;
use itertools::Itertools;
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    constants::CatalogNumber,
    observers::{LookAngles, ObserverSite},
    orbitrack_errors::OrbitrackError,
    passes::{PassSearch, PassWindow},
    propagator::PropagationError,
    satellite::{Satellite, SatellitePosition},
};

/// Position of one satellite in a batch, or the reason it has none at that instant.
pub type BatchPosition = (CatalogNumber, Result<SatellitePosition, PropagationError>);

#[derive(Debug, Clone, Default)]
pub struct Orbitrack {
    satellites: HashMap<CatalogNumber, Satellite>,
}

impl Orbitrack {
    pub fn new() -> Self {
        Orbitrack::default()
    }

    /// Track a satellite, replacing any entry with the same catalog number.
    ///
    /// Return
    /// ------
    /// * the replaced satellite, if any
    pub fn insert(&mut self, satellite: Satellite) -> Option<Satellite> {
        let id = satellite.catalog_number();
        let previous = self.satellites.insert(id, satellite);
        if let Some(old) = &previous {
            info!(
                catalog_number = id,
                old_epoch = %old.elements().epoch(),
                "element set replaced"
            );
        }
        previous
    }

    /// Parse an element set and track it.
    ///
    /// Arguments
    /// ---------
    /// * `name`: optional title of the element set
    /// * `line1`, `line2`: the two 69-column lines
    ///
    /// Return
    /// ------
    /// * the catalog number of the satellite, or `MalformedElementSet`. A rejected element
    ///   set leaves the catalog untouched.
    pub fn insert_tle(
        &mut self,
        name: Option<&str>,
        line1: &str,
        line2: &str,
    ) -> Result<CatalogNumber, OrbitrackError> {
        let satellite = Satellite::from_tle(name, line1, line2)?;
        let id = satellite.catalog_number();
        self.insert(satellite);
        Ok(id)
    }

    pub fn remove(&mut self, id: CatalogNumber) -> Option<Satellite> {
        self.satellites.remove(&id)
    }

    pub fn get(&self, id: CatalogNumber) -> Option<&Satellite> {
        self.satellites.get(&id)
    }

    /// Same as [`Orbitrack::get`], with an `UnknownSatellite` error instead of `None`.
    pub fn satellite(&self, id: CatalogNumber) -> Result<&Satellite, OrbitrackError> {
        self.get(id).ok_or(OrbitrackError::UnknownSatellite(id))
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }

    /// Tracked catalog numbers, ascending.
    pub fn catalog_numbers(&self) -> Vec<CatalogNumber> {
        self.satellites.keys().copied().sorted().collect()
    }

    /// Display bundle of one satellite at `epoch`.
    pub fn position(
        &self,
        id: CatalogNumber,
        epoch: &Epoch,
    ) -> Result<SatellitePosition, OrbitrackError> {
        Ok(self.satellite(id)?.position(epoch)?)
    }

    /// Display bundles of every tracked satellite at `epoch`, by catalog number.
    ///
    /// See also
    /// --------
    /// * [`Orbitrack::position`] – single satellite
    #[cfg(not(feature = "parallel"))]
    pub fn positions(&self, epoch: &Epoch) -> Vec<BatchPosition> {
        self.satellites
            .iter()
            .map(|(id, sat)| (*id, sat.position(epoch)))
            .sorted_by_key(|(id, _)| *id)
            .collect()
    }

    /// Display bundles of every tracked satellite at `epoch`, by catalog number.
    ///
    /// See also
    /// --------
    /// * [`Orbitrack::position`] – single satellite
    #[cfg(feature = "parallel")]
    pub fn positions(&self, epoch: &Epoch) -> Vec<BatchPosition> {
        let mut positions: Vec<BatchPosition> = self
            .satellites
            .par_iter()
            .map(|(id, sat)| (*id, sat.position(epoch)))
            .collect();
        positions.sort_by_key(|(id, _)| *id);
        positions
    }

    /// Satellites above the elevation mask of `site` at `epoch`, by catalog number.
    ///
    /// Satellites without look angles at `epoch` are left out, whether the propagation
    /// failed or the geometry is undefined. Each one is logged at debug level.
    pub fn visible_from(
        &self,
        site: &ObserverSite,
        epoch: &Epoch,
    ) -> Vec<(CatalogNumber, LookAngles)> {
        self.satellites
            .iter()
            .filter_map(|(id, sat)| {
                let look = sat
                    .look_angles(epoch, site)
                    .map_err(|err| {
                        debug!(
                            catalog_number = *id,
                            site = site.id(),
                            %epoch,
                            error = %err,
                            "satellite left out of the visibility query"
                        );
                    })
                    .ok()?;
                site.is_visible(&look).then_some((*id, look))
            })
            .sorted_by_key(|(id, _)| *id)
            .collect()
    }

    /// Passes of one satellite over `site`.
    ///
    /// See also
    /// --------
    /// * [`crate::passes::find_passes`] – scan rules and truncated passes
    pub fn next_passes(
        &self,
        id: CatalogNumber,
        site: &ObserverSite,
        search: &PassSearch,
    ) -> Result<Vec<PassWindow>, OrbitrackError> {
        self.satellite(id)?.passes(site, search)
    }
}

#[cfg(test)]
mod orbitrack_test {
    use super::*;

    const ISS: [&str; 2] = [
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927",
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537",
    ];
    const TLE_88888: [&str; 2] = [
        "1 88888U 88888A   80275.98708465  .00073094  13844-3  66816-4 0  5554",
        "2 88888  72.8435 115.9689 0086731  52.6988 110.5714 16.05824518   103",
    ];

    fn tracker() -> Orbitrack {
        let mut tracker = Orbitrack::new();
        tracker.insert_tle(Some("ISS"), ISS[0], ISS[1]).unwrap();
        tracker.insert_tle(None, TLE_88888[0], TLE_88888[1]).unwrap();
        tracker
    }

    #[test]
    fn test_catalog_management() {
        let mut tracker = tracker();
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.catalog_numbers(), vec![25544, 88888]);

        let replaced = tracker.insert_tle(Some("ISS (ZARYA)"), ISS[0], ISS[1]).unwrap();
        assert_eq!(replaced, 25544);
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.get(25544).unwrap().name(), Some("ISS (ZARYA)"));

        assert!(tracker.remove(88888).is_some());
        assert_eq!(
            tracker.satellite(88888).unwrap_err(),
            OrbitrackError::UnknownSatellite(88888)
        );
        assert!(!tracker.is_empty());
    }

    #[test]
    fn test_rejected_tle_leaves_catalog_untouched() {
        let mut tracker = tracker();
        let broken = ISS[1].replace("563537", "563538");
        assert!(matches!(
            tracker.insert_tle(None, ISS[0], &broken),
            Err(OrbitrackError::MalformedElementSet(_))
        ));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_positions_cover_every_satellite() {
        let tracker = tracker();
        let epoch = tracker.get(25544).unwrap().elements().epoch();
        let positions = tracker.positions(&epoch);
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].0, 25544);
        assert_eq!(positions[1].0, 88888);
        assert!(positions[0].1.is_ok());

        let single = tracker.position(25544, &epoch).unwrap();
        assert_eq!(positions[0].1.as_ref().unwrap(), &single);
        assert_eq!(
            tracker.position(1, &epoch),
            Err(OrbitrackError::UnknownSatellite(1))
        );
    }

    #[test]
    fn test_visible_from_sub_satellite_point() {
        let tracker = tracker();
        let epoch = tracker.get(25544).unwrap().elements().epoch();
        let sub = tracker.position(25544, &epoch).unwrap().geodetic;
        let site = ObserverSite::new("SUB", "under ISS", sub.latitude, sub.longitude, 0.0)
            .unwrap();

        let visible = tracker.visible_from(&site, &epoch);
        let (id, look) = visible.iter().find(|(id, _)| *id == 25544).unwrap();
        assert_eq!(*id, 25544);
        assert!(look.elevation > 89.0);
    }

    #[test]
    fn test_decayed_satellite_is_left_out() {
        let mut tracker = Orbitrack::new();
        tracker.insert_tle(None, TLE_88888[0], TLE_88888[1]).unwrap();
        let epoch = tracker.get(88888).unwrap().elements().epoch() + hifitime::Unit::Day * 365;
        let site = ObserverSite::new("ANY", "anywhere", 10.0, 20.0, 0.0).unwrap();

        assert!(tracker.positions(&epoch)[0].1.is_err());
        assert!(tracker.visible_from(&site, &epoch).is_empty());
    }
}
