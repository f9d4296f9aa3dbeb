//! # Constants and type definitions for Orbitrack
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! definitions** used throughout the `orbitrack` library.
//!
//! ## Overview
//!
//! - Geopotential constants of the **WGS-72** model, as expected by SGP4/SDP4
//! - Ellipsoid parameters of **WGS-84**, used for geodetic conversions
//! - Unit conversions (degrees ↔ radians, days ↔ minutes ↔ seconds)
//! - Core type aliases used across the crate
//!
//! The propagator works internally in **earth radii** and **minutes**; the public API
//! exposes kilometers, kilometers per second and degrees.

// -------------------------------------------------------------------------------------------------
// Unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Number of seconds in a day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of minutes in a day
pub const MINUTES_PER_DAY: f64 = 1_440.0;

/// Julian date of the J2000.0 epoch (2000-01-01 12:00:00)
pub const JD_J2000: f64 = 2_451_545.0;

/// Number of days in a Julian century
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;

// -------------------------------------------------------------------------------------------------
// WGS-72 geopotential (SGP4/SDP4)
// -------------------------------------------------------------------------------------------------

/// Earth equatorial radius of the WGS-72 model, in kilometers
pub const XKMPER: f64 = 6378.135;

/// Earth gravitational parameter of the WGS-72 model, km³/s²
pub const MU: f64 = 398_600.8;

/// Second zonal harmonic (WGS-72)
pub const J2: f64 = 1.082_616e-3;

/// Third zonal harmonic (WGS-72)
pub const J3: f64 = -2.538_81e-6;

/// Fourth zonal harmonic (WGS-72)
pub const J4: f64 = -1.655_97e-6;

/// sqrt(GM) in earth radii^1.5 per minute
pub const XKE: f64 = 7.436_691_613_317_342e-2;

/// Earth rotation rate relative to the stars, radians per minute
pub const EARTH_ROTATION_RATE: f64 = 4.375_269_088_011_3e-3;

/// Threshold period separating near-earth from deep-space orbits, in minutes
pub const DEEP_SPACE_PERIOD: f64 = 225.0;

// -------------------------------------------------------------------------------------------------
// Sampling
// -------------------------------------------------------------------------------------------------

/// Largest number of instants a ground track or a pass search may sample
pub const MAX_SAMPLES: u64 = 100_000_000;

// -------------------------------------------------------------------------------------------------
// WGS-84 ellipsoid (geodetic conversions)
// -------------------------------------------------------------------------------------------------

/// Earth equatorial radius in kilometers (WGS-84)
pub const EARTH_MAJOR_AXIS: f64 = 6378.137;

/// Earth polar radius in kilometers (WGS-84)
pub const EARTH_MINOR_AXIS: f64 = 6356.752_314_2;

/// Flattening of the WGS-84 ellipsoid
pub const EARTH_FLATTENING: f64 = (EARTH_MAJOR_AXIS - EARTH_MINOR_AXIS) / EARTH_MAJOR_AXIS;

/// First eccentricity squared of the WGS-84 ellipsoid
pub const EARTH_ECCENTRICITY_SQUARED: f64 =
    EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);

/// Mean earth radius in kilometers, used for great-circle distances
pub const EARTH_MEAN_RADIUS: f64 = 6371.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Time span in minutes
pub type Minute = f64;
/// Julian date (days)
pub type JulianDate = f64;

/// NORAD catalog number identifying a satellite
pub type CatalogNumber = u32;

/// Identifier of a ground site
pub type SiteId = String;
