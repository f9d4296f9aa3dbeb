//! # Low-precision sun and moon ephemerides
//!
//! Closed-form positions of the sun and the moon, meant to light and orient a scene:
//!
//! * sun: the low-precision formula of the *Astronomical Almanac* (mean longitude, mean
//!   anomaly and equation of center), about 0.01° from 1950 to 2050,
//! * moon: mean longitude with the first periodic term in longitude and latitude, and a
//!   distance with one term. Errors reach a few tenths of a degree and a few thousand
//!   kilometers.
//!
//! None of these functions is suitable for navigation, eclipse timing or occultation
//! prediction. [`PRECISION_NOTICE`] carries that warning for user-facing displays.
//!
//! All functions are pure functions of the instant.
use hifitime::Epoch;
use nalgebra::Vector3;
use serde::Serialize;

use crate::{
    constants::{Degree, Kilometer, JD_J2000},
    ref_system::{normalize_longitude, GeodeticPosition},
    time::{greenwich_sidereal_angle, julian_date},
};

/// Warning to show next to anything derived from this module.
pub const PRECISION_NOTICE: &str = "Sun and moon positions are low-precision \
approximations (about 0.01° for the sun, a few tenths of a degree for the moon), \
suitable for display only.";

/// Mean obliquity of the ecliptic at J2000, degrees
const OBLIQUITY_J2000: Degree = 23.439;
/// Linear drift of the obliquity, degrees per day
const OBLIQUITY_RATE: Degree = -4e-7;

/// Geocentric equatorial direction, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquatorialCoordinates {
    /// Right ascension, (-180, 180]
    pub right_ascension: Degree,
    /// Declination, [-90, 90]
    pub declination: Degree,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoonPosition {
    pub coordinates: EquatorialCoordinates,
    /// Geocentric distance, km
    pub distance: Kilometer,
}

/// Days since J2000.0 (UTC is used for TT).
fn days_since_j2000(epoch: &Epoch) -> f64 {
    julian_date(epoch) - JD_J2000
}

fn obliquity(days: f64) -> Degree {
    OBLIQUITY_J2000 + OBLIQUITY_RATE * days
}

/// Ecliptic longitude and latitude (degrees) to equatorial coordinates.
fn ecliptic_to_equatorial(
    longitude: Degree,
    latitude: Degree,
    obliquity: Degree,
) -> EquatorialCoordinates {
    let (sin_l, cos_l) = longitude.to_radians().sin_cos();
    let (sin_b, cos_b) = latitude.to_radians().sin_cos();
    let (sin_e, cos_e) = obliquity.to_radians().sin_cos();

    let right_ascension = (sin_l * cos_e - sin_b / cos_b * sin_e).atan2(cos_l);
    let declination = (sin_b * cos_e + cos_b * sin_e * sin_l).clamp(-1.0, 1.0).asin();

    EquatorialCoordinates {
        right_ascension: right_ascension.to_degrees(),
        declination: declination.to_degrees(),
    }
}

/// Unit vector of an equatorial direction in the earth-fixed frame at `epoch`.
fn earth_fixed_direction(coordinates: &EquatorialCoordinates, epoch: &Epoch) -> Vector3<f64> {
    let hour_angle = (greenwich_sidereal_angle(epoch) - coordinates.right_ascension).to_radians();
    let (sin_d, cos_d) = coordinates.declination.to_radians().sin_cos();
    let (sin_h, cos_h) = hour_angle.sin_cos();
    Vector3::new(cos_d * cos_h, -cos_d * sin_h, sin_d)
}

/// Apparent direction of the sun.
///
/// Low precision, see [`PRECISION_NOTICE`].
///
/// Arguments
/// ---------
/// * `epoch`: the instant
///
/// Return
/// ------
/// * right ascension and declination of the sun, degrees
pub fn sun_position(epoch: &Epoch) -> EquatorialCoordinates {
    let n = days_since_j2000(epoch);
    let mean_longitude = (280.460 + 0.985_647_4 * n).rem_euclid(360.0);
    let mean_anomaly = (357.528 + 0.985_600_3 * n).rem_euclid(360.0).to_radians();
    let longitude =
        mean_longitude + 1.915 * mean_anomaly.sin() + 0.020 * (2.0 * mean_anomaly).sin();

    ecliptic_to_equatorial(longitude, 0.0, obliquity(n))
}

/// Direction and distance of the moon.
///
/// Low precision, see [`PRECISION_NOTICE`].
pub fn moon_position(epoch: &Epoch) -> MoonPosition {
    let d = days_since_j2000(epoch);
    let mean_longitude = (218.316 + 13.176_396 * d).rem_euclid(360.0);
    let mean_anomaly = (134.963 + 13.064_993 * d).rem_euclid(360.0).to_radians();
    let argument_of_latitude = (93.272 + 13.229_350 * d).rem_euclid(360.0).to_radians();

    let longitude = mean_longitude + 6.289 * mean_anomaly.sin();
    let latitude = 5.128 * argument_of_latitude.sin();

    MoonPosition {
        coordinates: ecliptic_to_equatorial(longitude, latitude, obliquity(d)),
        distance: 385_000.0 - 20_905.0 * mean_anomaly.cos(),
    }
}

/// Rotation angle of the earth, i.e. the Greenwich mean sidereal angle in degrees [0, 360).
pub fn earth_rotation_angle(epoch: &Epoch) -> Degree {
    greenwich_sidereal_angle(epoch)
}

/// Unit vector towards the sun in the earth-fixed frame. Low precision.
pub fn sun_direction_earth_fixed(epoch: &Epoch) -> Vector3<f64> {
    earth_fixed_direction(&sun_position(epoch), epoch)
}

/// Unit vector towards the moon in the earth-fixed frame. Low precision.
pub fn moon_direction_earth_fixed(epoch: &Epoch) -> Vector3<f64> {
    earth_fixed_direction(&moon_position(epoch).coordinates, epoch)
}

/// Point of the earth where the sun is at the zenith. Low precision.
pub fn subsolar_point(epoch: &Epoch) -> GeodeticPosition {
    let sun = sun_position(epoch);
    GeodeticPosition {
        latitude: sun.declination,
        longitude: normalize_longitude(sun.right_ascension - greenwich_sidereal_angle(epoch)),
        altitude: 0.0,
    }
}

#[cfg(test)]
mod ephemeris_test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use hifitime::Unit;

    #[test]
    fn test_sun_declination_at_equinox_and_solstices() {
        let march = Epoch::from_gregorian_utc(2024, 3, 20, 3, 6, 0, 0);
        assert_abs_diff_eq!(sun_position(&march).declination, 0.0, epsilon = 0.05);

        let june = Epoch::from_gregorian_utc(2024, 6, 20, 20, 51, 0, 0);
        assert_abs_diff_eq!(sun_position(&june).declination, 23.44, epsilon = 0.05);

        let december = Epoch::from_gregorian_utc(2024, 12, 21, 9, 20, 0, 0);
        assert_abs_diff_eq!(sun_position(&december).declination, -23.44, epsilon = 0.05);
    }

    #[test]
    fn test_sun_right_ascension_at_equinox() {
        let march = Epoch::from_gregorian_utc(2024, 3, 20, 3, 6, 0, 0);
        assert_abs_diff_eq!(sun_position(&march).right_ascension, 0.0, epsilon = 0.05);
    }

    #[test]
    fn test_subsolar_point_near_noon() {
        // equation of time is close to zero mid-April
        let noon = Epoch::from_gregorian_utc(2024, 4, 15, 12, 0, 0, 0);
        let point = subsolar_point(&noon);
        assert_abs_diff_eq!(point.longitude, 0.0, epsilon = 1.0);
        assert_abs_diff_eq!(point.latitude, 9.9, epsilon = 0.5);
    }

    #[test]
    fn test_sun_direction_matches_subsolar_point() {
        let epoch = Epoch::from_gregorian_utc(2023, 8, 1, 17, 30, 0, 0);
        let direction = sun_direction_earth_fixed(&epoch);
        let point = subsolar_point(&epoch);
        assert_abs_diff_eq!(direction.norm(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            direction.y.atan2(direction.x).to_degrees(),
            point.longitude,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(direction.z.asin().to_degrees(), point.latitude, epsilon = 1e-9);
    }

    #[test]
    fn test_moon_stays_in_its_band() {
        let start = Epoch::from_gregorian_utc_at_midnight(2024, 1, 1);
        for day in 0..60 {
            let moon = moon_position(&(start + Unit::Day * day));
            assert!(moon.distance >= 364_095.0 && moon.distance <= 405_905.0);
            assert!(moon.coordinates.declination.abs() < 23.44 + 5.13 + 0.1);
            assert!(moon_direction_earth_fixed(&(start + Unit::Day * day)).norm() > 0.999);
        }
    }

    #[test]
    fn test_moon_moves_about_thirteen_degrees_a_day() {
        let start = Epoch::from_gregorian_utc_at_midnight(2024, 5, 1);
        let a = moon_position(&start).coordinates;
        let b = moon_position(&(start + Unit::Day * 1)).coordinates;
        let delta = normalize_longitude(b.right_ascension - a.right_ascension);
        assert!(delta > 10.0 && delta < 17.0);
    }

    #[test]
    fn test_earth_rotation_angle() {
        let epoch = Epoch::from_gregorian_utc(2000, 1, 1, 12, 0, 0, 0);
        assert_abs_diff_eq!(earth_rotation_angle(&epoch), 280.46, epsilon = 0.01);
        assert!(!PRECISION_NOTICE.is_empty());
    }
}
