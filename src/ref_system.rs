//! # Reference frames
//!
//! Conversions between the three frames positions go through on their way from the
//! propagator to the observer:
//!
//! ```text
//! TEME (inertial)  --(rotation by -GMST about z)-->  earth-fixed  --(WGS-84)-->  geodetic
//! ```
//!
//! The inertial frame of the propagator is treated as the true-of-date equator and
//! equinox: the earth rotation is a single rotation about the z axis by the Greenwich
//! mean sidereal angle ([`gmst`](crate::time::gmst)). Polar motion, nutation and the
//! equation of the equinoxes are not applied, which keeps the result within a few
//! tens of meters of a full IERS reduction for tracking purposes.
//!
//! ## Conventions
//!
//! * Distances in kilometers.
//! * Latitude in degrees, [-90, 90], geodetic (WGS-84).
//! * Longitude in degrees east, normalized to (-180, 180].
//! * Altitude in kilometers above the WGS-84 ellipsoid.
use hifitime::Epoch;
use nalgebra::{Rotation3, Vector3};
use serde::Serialize;

use crate::{
    constants::{
        Degree, Kilometer, Radian, EARTH_ECCENTRICITY_SQUARED, EARTH_MAJOR_AXIS,
        EARTH_MEAN_RADIUS,
    },
    time::gmst,
};

/// Earth-fixed position at an instant, km.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EarthFixedVector {
    pub epoch: Epoch,
    pub position: Vector3<f64>,
}

/// Geodetic coordinates on the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeodeticPosition {
    /// Geodetic latitude, degrees
    pub latitude: Degree,
    /// Longitude east of Greenwich, degrees in (-180, 180]
    pub longitude: Degree,
    /// Height above the ellipsoid, km
    pub altitude: Kilometer,
}

/// Rotation of angle `alpha` (radians) around the z axis.
///
/// The matrix rotates the vector, so the frame change from inertial to earth-fixed at
/// sidereal angle θ is `rotz(-θ)`.
pub fn rotz(alpha: Radian) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), alpha)
}

/// Bring a longitude in degrees into (-180, 180].
pub fn normalize_longitude(longitude: Degree) -> Degree {
    let lon = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    if lon <= -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

/// Rotate an inertial (TEME) position into the earth-fixed frame.
///
/// Arguments
/// ---------
/// * `position`: inertial position, km
/// * `epoch`: instant of the position, fixes the sidereal angle
///
/// Return
/// ------
/// * the earth-fixed position tagged with `epoch`
///
/// See also
/// --------
/// * [`earth_fixed_to_inertial`] – inverse rotation
/// * [`crate::time::gmst`] – sidereal angle used for the rotation
pub fn inertial_to_earth_fixed(position: &Vector3<f64>, epoch: &Epoch) -> EarthFixedVector {
    EarthFixedVector {
        epoch: *epoch,
        position: rotz(-gmst(epoch)) * position,
    }
}

/// Rotate an earth-fixed position back into the inertial frame of its epoch.
pub fn earth_fixed_to_inertial(fixed: &EarthFixedVector) -> Vector3<f64> {
    rotz(gmst(&fixed.epoch)) * fixed.position
}

/// Geodetic coordinates of an earth-fixed position.
///
/// Fixed-point iteration on the geodetic latitude (at most 20 rounds, stops once the
/// latitude moves by less than 1e-12 rad). The height is evaluated with the form that
/// stays well conditioned near the poles.
///
/// Arguments
/// ---------
/// * `position`: earth-fixed position, km
///
/// Return
/// ------
/// * latitude and longitude in degrees, altitude in km. On the polar axis the longitude
///   is reported as 0.
pub fn earth_fixed_to_geodetic(position: &Vector3<f64>) -> GeodeticPosition {
    const MAX_ITER: usize = 20;
    const TOL: f64 = 1e-12;

    let a = EARTH_MAJOR_AXIS;
    let e2 = EARTH_ECCENTRICITY_SQUARED;
    let (x, y, z) = (position.x, position.y, position.z);
    let p = x.hypot(y);

    let longitude = if p < 1e-9 {
        0.0
    } else {
        normalize_longitude(y.atan2(x).to_degrees())
    };

    let mut lat = z.atan2(p * (1.0 - e2));
    for _ in 0..MAX_ITER {
        let sin_lat = lat.sin();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let next = (z + e2 * n * sin_lat).atan2(p);
        let delta = (next - lat).abs();
        lat = next;
        if delta < TOL {
            break;
        }
    }

    let (sin_lat, cos_lat) = lat.sin_cos();
    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let altitude = p * cos_lat + (z + e2 * n * sin_lat) * sin_lat - n;

    GeodeticPosition {
        latitude: lat.to_degrees(),
        longitude,
        altitude,
    }
}

/// Earth-fixed position of geodetic coordinates, km. Exact inverse of
/// [`earth_fixed_to_geodetic`].
pub fn geodetic_to_earth_fixed(geodetic: &GeodeticPosition) -> Vector3<f64> {
    let e2 = EARTH_ECCENTRICITY_SQUARED;
    let (sin_lat, cos_lat) = geodetic.latitude.to_radians().sin_cos();
    let (sin_lon, cos_lon) = geodetic.longitude.to_radians().sin_cos();
    let n = EARTH_MAJOR_AXIS / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let h = geodetic.altitude;

    Vector3::new(
        (n + h) * cos_lat * cos_lon,
        (n + h) * cos_lat * sin_lon,
        (n * (1.0 - e2) + h) * sin_lat,
    )
}

/// Sub-satellite point of an inertial position.
pub fn eci_to_geodetic(position: &Vector3<f64>, epoch: &Epoch) -> GeodeticPosition {
    earth_fixed_to_geodetic(&inertial_to_earth_fixed(position, epoch).position)
}

/// Haversine distance between two surface points on the mean earth sphere, km.
///
/// Altitudes are ignored.
pub fn great_circle_distance(from: &GeodeticPosition, to: &GeodeticPosition) -> Kilometer {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let dphi = phi2 - phi1;
    let dlambda = (to.longitude - from.longitude).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_MEAN_RADIUS * h.sqrt().min(1.0).asin()
}
