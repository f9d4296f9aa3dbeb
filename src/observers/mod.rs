//! # Ground sites and topocentric geometry
//!
//! An [`ObserverSite`] is a named location on the WGS-84 ellipsoid with a minimum
//! elevation below which satellites are considered hidden (terrain mask, antenna
//! limit). Its earth-fixed position is computed once at construction.
//!
//! [`look_angles`] expresses an earth-fixed satellite position in the topocentric
//! south-east-zenith (SEZ) frame of the site:
//!
//! ```text
//!          zenith
//!            |   satellite
//!            |  /
//!            | / elevation
//!            |/_________ east
//!           /
//!          /  azimuth measured clockwise from north
//!       south
//! ```
//!
//! ## Conventions
//!
//! - Azimuth: degrees clockwise from geographic north, in [0, 360).
//! - Elevation: degrees above the local horizontal plane of the ellipsoid, in [-90, 90].
//! - Range: kilometers, never negative.
//!
//! A satellite located exactly at the site has no direction. The look angles are then
//! reported as elevation 90°, azimuth 0°, range 0 rather than an error.
//!
//! ## Errors
//!
//! - [`ObserverSite::new`] rejects NaN coordinates and latitudes or elevation masks
//!   outside [-90, 90] with [`OrbitrackError::InvalidObserver`].
//! - [`look_angles`] returns [`GeometryError::NonFinitePosition`] when the satellite
//!   position has a non-finite component.
use nalgebra::Vector3;
use ordered_float::NotNan;
use serde::Serialize;
use thiserror::Error;

use crate::{
    constants::{Degree, Kilometer, SiteId},
    orbitrack_errors::OrbitrackError,
    ref_system::{geodetic_to_earth_fixed, normalize_longitude, GeodeticPosition},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("satellite position has a non-finite component")]
    NonFinitePosition,
}

/// Direction and distance of a satellite seen from a site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LookAngles {
    /// Degrees clockwise from north, [0, 360)
    pub azimuth: Degree,
    /// Degrees above the horizon, [-90, 90]
    pub elevation: Degree,
    /// Slant range, km
    pub range: Kilometer,
}

fn not_nan(value: f64, what: &str) -> Result<NotNan<f64>, OrbitrackError> {
    NotNan::new(value).map_err(|_| OrbitrackError::InvalidObserver(format!("{what} is NaN")))
}

/// Ground site with its precomputed earth-fixed position.
///
/// `NotNan` guards the geometry so that sites can be compared and hashed, and so that a
/// NaN can never reach the look-angle computation through a site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObserverSite {
    id: SiteId,
    name: String,
    latitude: NotNan<f64>,
    longitude: NotNan<f64>,
    altitude: NotNan<f64>,
    min_elevation: NotNan<f64>,
    #[serde(skip)]
    earth_fixed: Vector3<NotNan<f64>>,
}

impl ObserverSite {
    /// Create a site from geodetic coordinates, with a 0° elevation mask.
    ///
    /// Arguments
    /// ---------
    /// * `id`: stable identifier of the site, reported in pass windows
    /// * `name`: display name
    /// * `latitude`: geodetic latitude, degrees in [-90, 90]
    /// * `longitude`: degrees east, any value (normalized to (-180, 180])
    /// * `altitude`: height above the ellipsoid, km
    ///
    /// Return
    /// ------
    /// * the site, or `InvalidObserver` for NaN inputs or an out-of-range latitude
    ///
    /// See also
    /// --------
    /// * [`ObserverSite::with_min_elevation`] – change the visibility threshold
    pub fn new(
        id: impl Into<SiteId>,
        name: impl Into<String>,
        latitude: Degree,
        longitude: Degree,
        altitude: Kilometer,
    ) -> Result<Self, OrbitrackError> {
        let latitude = not_nan(latitude, "latitude")?;
        let longitude = not_nan(longitude, "longitude")?;
        let altitude = not_nan(altitude, "altitude")?;
        if !(-90.0..=90.0).contains(&latitude.into_inner()) {
            return Err(OrbitrackError::InvalidObserver(format!(
                "latitude {latitude} outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !altitude.is_finite() {
            return Err(OrbitrackError::InvalidObserver(
                "longitude and altitude must be finite".into(),
            ));
        }
        let longitude = not_nan(normalize_longitude(longitude.into_inner()), "longitude")?;

        let fixed = geodetic_to_earth_fixed(&GeodeticPosition {
            latitude: latitude.into_inner(),
            longitude: longitude.into_inner(),
            altitude: altitude.into_inner(),
        });

        Ok(ObserverSite {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
            altitude,
            min_elevation: not_nan(0.0, "minimum elevation")?,
            earth_fixed: Vector3::new(
                not_nan(fixed.x, "x")?,
                not_nan(fixed.y, "y")?,
                not_nan(fixed.z, "z")?,
            ),
        })
    }

    /// Replace the elevation mask, degrees in [-90, 90].
    pub fn with_min_elevation(mut self, min_elevation: Degree) -> Result<Self, OrbitrackError> {
        let value = not_nan(min_elevation, "minimum elevation")?;
        if !(-90.0..=90.0).contains(&value.into_inner()) {
            return Err(OrbitrackError::InvalidObserver(format!(
                "minimum elevation {min_elevation} outside [-90, 90]"
            )));
        }
        self.min_elevation = value;
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latitude(&self) -> Degree {
        self.latitude.into_inner()
    }

    pub fn longitude(&self) -> Degree {
        self.longitude.into_inner()
    }

    pub fn altitude(&self) -> Kilometer {
        self.altitude.into_inner()
    }

    pub fn min_elevation(&self) -> Degree {
        self.min_elevation.into_inner()
    }

    pub fn geodetic(&self) -> GeodeticPosition {
        GeodeticPosition {
            latitude: self.latitude(),
            longitude: self.longitude(),
            altitude: self.altitude(),
        }
    }

    /// Earth-fixed position of the site, km.
    pub fn earth_fixed(&self) -> Vector3<f64> {
        self.earth_fixed.map(|x| x.into_inner())
    }

    /// True when the elevation reaches the site mask.
    pub fn is_visible(&self, look: &LookAngles) -> bool {
        look.elevation >= self.min_elevation()
    }
}

/// Azimuth, elevation and range of an earth-fixed position seen from a site.
///
/// Arguments
/// ---------
/// * `satellite`: earth-fixed satellite position, km
/// * `site`: the observing site
///
/// Return
/// ------
/// * the look angles, or `NonFinitePosition` if `satellite` holds a NaN or an infinity
///
/// See also
/// --------
/// * [`crate::ref_system::inertial_to_earth_fixed`] – to get `satellite` from a state vector
/// * [`ObserverSite::is_visible`]
pub fn look_angles(
    satellite: &Vector3<f64>,
    site: &ObserverSite,
) -> Result<LookAngles, GeometryError> {
    if satellite.iter().any(|x| !x.is_finite()) {
        return Err(GeometryError::NonFinitePosition);
    }

    let rho = satellite - site.earth_fixed();
    let range = rho.norm();
    if range == 0.0 {
        return Ok(LookAngles {
            azimuth: 0.0,
            elevation: 90.0,
            range: 0.0,
        });
    }

    let (sin_lat, cos_lat) = site.latitude().to_radians().sin_cos();
    let (sin_lon, cos_lon) = site.longitude().to_radians().sin_cos();

    // Earth-fixed to south-east-zenith
    let south = sin_lat * cos_lon * rho.x + sin_lat * sin_lon * rho.y - cos_lat * rho.z;
    let east = -sin_lon * rho.x + cos_lon * rho.y;
    let zenith = cos_lat * cos_lon * rho.x + cos_lat * sin_lon * rho.y + sin_lat * rho.z;

    let elevation = (zenith / range).clamp(-1.0, 1.0).asin().to_degrees();
    let mut azimuth = east.atan2(-south).to_degrees().rem_euclid(360.0);
    if azimuth >= 360.0 {
        azimuth = 0.0;
    }

    Ok(LookAngles {
        azimuth,
        elevation,
        range,
    })
}
