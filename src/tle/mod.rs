//! # Two-line element sets
//!
//! Decoding and validation of the NORAD two-line element format into an
//! [`OrbitalElementSet`], the only input accepted by the propagator.
//!
//! ## Overview
//!
//! - [`OrbitalElementSet::from_lines`] decodes a name and the two data lines.
//! - [`OrbitalElementSet`] also implements [`FromStr`] for two- or three-line text, so a
//!   block copied from a catalog can be parsed directly.
//! - Every line must be exactly 69 ASCII characters with a valid modulo 10 checksum, the
//!   catalog number must agree on both lines and every numeric field must decode and lie
//!   in its physical range. Nothing is substituted by a default value.
//!
//! ## Example
//!
//! ```rust
//! use orbitrack::tle::OrbitalElementSet;
//!
//! let tle: OrbitalElementSet = "ISS (ZARYA)
//! 1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927
//! 2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537"
//!     .parse()
//!     .unwrap();
//!
//! assert_eq!(tle.catalog_number(), 25544);
//! assert_eq!(tle.name(), Some("ISS (ZARYA)"));
//! ```
pub mod fields;

use std::str::FromStr;

use hifitime::Epoch;
use serde::Serialize;
use thiserror::Error;

use crate::{
    constants::{CatalogNumber, Degree, Kilometer, Minute, MINUTES_PER_DAY, MU, XKMPER},
    time::tle_epoch,
};

pub use fields::{checksum, TleField, LINE_LENGTH};
use fields::{
    invalid, parse_catalog_number, parse_decimal, parse_exponent_field, parse_field,
    parse_implied_decimal,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TleError {
    #[error("line {line} has {length} characters, expected 69")]
    InvalidLength { line: u8, length: usize },

    #[error("line {line} contains non ASCII characters")]
    NonAscii { line: u8 },

    #[error("line {line} has an invalid checksum: computed {expected}, found {found}")]
    Checksum { line: u8, expected: u8, found: u8 },

    #[error("line {line}: invalid {field} field {value:?}")]
    InvalidField {
        line: u8,
        field: TleField,
        value: String,
    },

    #[error("line {line}: {field} {value} is out of range")]
    OutOfRange { line: u8, field: TleField, value: f64 },

    #[error("catalog numbers differ between line 1 ({line1}) and line 2 ({line2})")]
    CatalogMismatch {
        line1: CatalogNumber,
        line2: CatalogNumber,
    },

    #[error("expected two or three non blank lines, found {0}")]
    LineCount(usize),
}

/// Decoded and validated two-line element set.
///
/// Angles are kept in degrees and the mean motion in revolutions per day, exactly as
/// written in the element set. The propagator performs its own unit conversions.
///
/// An `OrbitalElementSet` can only be obtained through the parser, so every instance
/// satisfies `0 <= e < 1`, `mean_motion > 0` and `0 <= i <= 180`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbitalElementSet {
    name: Option<String>,
    catalog_number: CatalogNumber,
    classification: char,
    international_designator: String,
    line1: String,
    line2: String,
    epoch: Epoch,
    mean_motion_dot: f64,
    mean_motion_ddot: f64,
    bstar: f64,
    ephemeris_type: u8,
    element_set_number: u32,
    inclination: Degree,
    right_ascension: Degree,
    eccentricity: f64,
    argument_of_perigee: Degree,
    mean_anomaly: Degree,
    mean_motion: f64,
    revolution_number: u32,
}

/// Derived size and shape of an orbit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrbitSummary {
    /// Orbital period, minutes
    pub period: Minute,
    /// Semi-major axis from the third Kepler law, km
    pub semi_major_axis: Kilometer,
    /// Perigee altitude above the equatorial radius, km
    pub perigee_altitude: Kilometer,
    /// Apogee altitude above the equatorial radius, km
    pub apogee_altitude: Kilometer,
}

impl OrbitalElementSet {
    /// Decode an element set from its two data lines.
    ///
    /// Arguments
    /// ---------
    /// * `name`: optional title of the object (the "line 0" of three-line sets)
    /// * `line1`: first data line, starting with `1 `
    /// * `line2`: second data line, starting with `2 `
    ///
    /// Trailing whitespace, including a carriage return, is removed from both lines
    /// before validation.
    ///
    /// Return
    /// ------
    /// * the validated element set, or the first `TleError` encountered
    pub fn from_lines(name: Option<&str>, line1: &str, line2: &str) -> Result<Self, TleError> {
        let line1 = line1.trim_end();
        let line2 = line2.trim_end();
        check_line(line1, 1)?;
        check_line(line2, 2)?;

        let catalog_number = parse_catalog_number(line1, 1)?;
        let catalog_line2 = parse_catalog_number(line2, 2)?;
        if catalog_number != catalog_line2 {
            return Err(TleError::CatalogMismatch {
                line1: catalog_number,
                line2: catalog_line2,
            });
        }

        let classification = line1.as_bytes()[fields::CLASSIFICATION] as char;
        if !matches!(classification, 'U' | 'C' | 'S') {
            return Err(invalid(
                1,
                TleField::Classification,
                &classification.to_string(),
            ));
        }
        let international_designator = line1[fields::INTERNATIONAL_DESIGNATOR].trim().to_string();

        let year: u32 = parse_field(line1, 1, fields::EPOCH_YEAR, TleField::EpochYear)?;
        let day: f64 = parse_field(line1, 1, fields::EPOCH_DAY, TleField::EpochDay)?;
        in_range(1, TleField::EpochDay, day, (1.0..367.0).contains(&day))?;

        let mean_motion_dot =
            parse_decimal(line1, 1, fields::MEAN_MOTION_DOT, TleField::MeanMotionDot)?;
        let mean_motion_ddot =
            parse_exponent_field(line1, 1, fields::MEAN_MOTION_DDOT, TleField::MeanMotionDdot)?;
        let bstar = parse_exponent_field(line1, 1, fields::BSTAR, TleField::Bstar)?;
        let ephemeris_type = parse_field(
            line1,
            1,
            fields::EPHEMERIS_TYPE..fields::EPHEMERIS_TYPE + 1,
            TleField::EphemerisType,
        )?;
        let element_set_number = parse_field(
            line1,
            1,
            fields::ELEMENT_SET_NUMBER,
            TleField::ElementSetNumber,
        )?;

        let inclination: f64 = parse_field(line2, 2, fields::INCLINATION, TleField::Inclination)?;
        in_range(
            2,
            TleField::Inclination,
            inclination,
            (0.0..=180.0).contains(&inclination),
        )?;
        let right_ascension = parse_angle(line2, fields::RIGHT_ASCENSION, TleField::RightAscension)?;
        let eccentricity =
            parse_implied_decimal(line2, 2, fields::ECCENTRICITY, TleField::Eccentricity)?;
        let argument_of_perigee = parse_angle(
            line2,
            fields::ARGUMENT_OF_PERIGEE,
            TleField::ArgumentOfPerigee,
        )?;
        let mean_anomaly = parse_angle(line2, fields::MEAN_ANOMALY, TleField::MeanAnomaly)?;
        let mean_motion: f64 = parse_field(line2, 2, fields::MEAN_MOTION, TleField::MeanMotion)?;
        in_range(
            2,
            TleField::MeanMotion,
            mean_motion,
            mean_motion > 0.0 && mean_motion.is_finite(),
        )?;
        let revolution_number = parse_field(
            line2,
            2,
            fields::REVOLUTION_NUMBER,
            TleField::RevolutionNumber,
        )?;

        Ok(OrbitalElementSet {
            name: name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            catalog_number,
            classification,
            international_designator,
            line1: line1.to_string(),
            line2: line2.to_string(),
            epoch: tle_epoch(year, day),
            mean_motion_dot,
            mean_motion_ddot,
            bstar,
            ephemeris_type,
            element_set_number,
            inclination,
            right_ascension,
            eccentricity,
            argument_of_perigee,
            mean_anomaly,
            mean_motion,
            revolution_number,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn catalog_number(&self) -> CatalogNumber {
        self.catalog_number
    }

    pub fn classification(&self) -> char {
        self.classification
    }

    pub fn international_designator(&self) -> &str {
        &self.international_designator
    }

    /// The first data line, as it was validated.
    pub fn line1(&self) -> &str {
        &self.line1
    }

    /// The second data line, as it was validated.
    pub fn line2(&self) -> &str {
        &self.line2
    }

    /// Reference epoch of the mean elements (UTC).
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// First derivative of the mean motion divided by two, rev/day².
    pub fn mean_motion_dot(&self) -> f64 {
        self.mean_motion_dot
    }

    /// Second derivative of the mean motion divided by six, rev/day³.
    pub fn mean_motion_ddot(&self) -> f64 {
        self.mean_motion_ddot
    }

    /// BSTAR drag term, inverse earth radii.
    pub fn bstar(&self) -> f64 {
        self.bstar
    }

    pub fn ephemeris_type(&self) -> u8 {
        self.ephemeris_type
    }

    pub fn element_set_number(&self) -> u32 {
        self.element_set_number
    }

    pub fn inclination(&self) -> Degree {
        self.inclination
    }

    pub fn right_ascension(&self) -> Degree {
        self.right_ascension
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity
    }

    pub fn argument_of_perigee(&self) -> Degree {
        self.argument_of_perigee
    }

    pub fn mean_anomaly(&self) -> Degree {
        self.mean_anomaly
    }

    /// Mean motion, revolutions per day.
    pub fn mean_motion(&self) -> f64 {
        self.mean_motion
    }

    pub fn revolution_number(&self) -> u32 {
        self.revolution_number
    }

    /// Orbital period in minutes, from the mean motion of the element set.
    pub fn period(&self) -> Minute {
        MINUTES_PER_DAY / self.mean_motion
    }

    /// Size and shape of the orbit derived from the mean elements.
    ///
    /// The semi-major axis follows from the third Kepler law with the WGS-72
    /// gravitational parameter; altitudes are measured above the WGS-72 equatorial
    /// radius.
    ///
    /// See also
    /// --------
    /// * [`OrbitalElementSet::period`]
    pub fn orbit_summary(&self) -> OrbitSummary {
        let n = self.mean_motion * crate::constants::DPI / crate::constants::SECONDS_PER_DAY;
        let semi_major_axis = (MU / (n * n)).cbrt();

        OrbitSummary {
            period: self.period(),
            semi_major_axis,
            perigee_altitude: semi_major_axis * (1.0 - self.eccentricity) - XKMPER,
            apogee_altitude: semi_major_axis * (1.0 + self.eccentricity) - XKMPER,
        }
    }
}

impl FromStr for OrbitalElementSet {
    type Err = TleError;

    /// Parse a two-line or three-line block. Blank lines are ignored; in three-line
    /// blocks the first line is the object name, with an optional `0 ` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect();

        match lines.as_slice() {
            [line1, line2] => OrbitalElementSet::from_lines(None, line1, line2),
            [name, line1, line2] => {
                let name = name.strip_prefix("0 ").unwrap_or(*name);
                OrbitalElementSet::from_lines(Some(name), line1, line2)
            }
            other => Err(TleError::LineCount(other.len())),
        }
    }
}

fn check_line(line: &str, line_number: u8) -> Result<(), TleError> {
    if !line.is_ascii() {
        return Err(TleError::NonAscii { line: line_number });
    }
    if line.len() != LINE_LENGTH {
        return Err(TleError::InvalidLength {
            line: line_number,
            length: line.len(),
        });
    }

    let expected_tag = b'0' + line_number;
    if line.as_bytes()[0] != expected_tag {
        return Err(invalid(line_number, TleField::LineNumber, &line[0..1]));
    }

    let found = line.as_bytes()[fields::CHECKSUM];
    if !found.is_ascii_digit() {
        return Err(invalid(
            line_number,
            TleField::Checksum,
            &line[fields::CHECKSUM..],
        ));
    }
    let expected = checksum(line);
    let found = found - b'0';
    if expected != found {
        return Err(TleError::Checksum {
            line: line_number,
            expected,
            found,
        });
    }
    Ok(())
}

fn parse_angle(
    line: &str,
    range: std::ops::Range<usize>,
    field: TleField,
) -> Result<Degree, TleError> {
    let value: f64 = parse_field(line, 2, range, field)?;
    in_range(2, field, value, (0.0..=360.0).contains(&value))?;
    Ok(value)
}

fn in_range(line: u8, field: TleField, value: f64, ok: bool) -> Result<(), TleError> {
    if ok {
        Ok(())
    } else {
        Err(TleError::OutOfRange { line, field, value })
    }
}

#[cfg(test)]
mod tle_test {
    use super::*;
    use approx::assert_relative_eq;

    const ISS_LINE1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    /// Recompute the checksum of a line whose content was edited.
    fn with_checksum(line: &str) -> String {
        format!("{}{}", &line[..68], checksum(line))
    }

    #[test]
    fn test_parse_iss() {
        let tle = OrbitalElementSet::from_lines(Some("ISS (ZARYA)"), ISS_LINE1, ISS_LINE2).unwrap();

        assert_eq!(tle.name(), Some("ISS (ZARYA)"));
        assert_eq!(tle.catalog_number(), 25544);
        assert_eq!(tle.classification(), 'U');
        assert_eq!(tle.international_designator(), "98067A");
        assert_relative_eq!(tle.mean_motion_dot(), -0.00002182);
        assert_eq!(tle.mean_motion_ddot(), 0.0);
        assert_relative_eq!(tle.bstar(), -0.11606e-4);
        assert_eq!(tle.ephemeris_type(), 0);
        assert_eq!(tle.element_set_number(), 292);
        assert_relative_eq!(tle.inclination(), 51.6416);
        assert_relative_eq!(tle.right_ascension(), 247.4627);
        assert_relative_eq!(tle.eccentricity(), 0.0006703);
        assert_relative_eq!(tle.argument_of_perigee(), 130.5360);
        assert_relative_eq!(tle.mean_anomaly(), 325.0288);
        assert_relative_eq!(tle.mean_motion(), 15.72125391);
        assert_eq!(tle.revolution_number(), 56353);
        assert_eq!(tle.epoch(), tle_epoch(8, 264.51782528));
    }

    #[test]
    fn test_from_str_variants() {
        let two = format!("{ISS_LINE1}\r\n{ISS_LINE2}\r\n");
        let tle: OrbitalElementSet = two.parse().unwrap();
        assert_eq!(tle.name(), None);

        let three = format!("0 ISS (ZARYA)\n\n{ISS_LINE1}\n{ISS_LINE2}\n");
        let tle: OrbitalElementSet = three.parse().unwrap();
        assert_eq!(tle.name(), Some("ISS (ZARYA)"));

        let err = ISS_LINE1.parse::<OrbitalElementSet>().unwrap_err();
        assert_eq!(err, TleError::LineCount(1));
    }

    #[test]
    fn test_checksum_digit_altered() {
        let mut line = ISS_LINE1[..68].to_string();
        line.push('8');
        let err = OrbitalElementSet::from_lines(None, &line, ISS_LINE2).unwrap_err();
        assert_eq!(
            err,
            TleError::Checksum {
                line: 1,
                expected: 7,
                found: 8
            }
        );
    }

    #[test]
    fn test_content_altered_without_checksum() {
        let line = ISS_LINE2.replacen("51.6416", "51.6417", 1);
        let err = OrbitalElementSet::from_lines(None, ISS_LINE1, &line).unwrap_err();
        assert!(matches!(err, TleError::Checksum { line: 2, .. }));
    }

    #[test]
    fn test_length_and_line_number() {
        let err = OrbitalElementSet::from_lines(None, &ISS_LINE1[..60], ISS_LINE2).unwrap_err();
        assert_eq!(err, TleError::InvalidLength { line: 1, length: 60 });

        let err = OrbitalElementSet::from_lines(None, ISS_LINE2, ISS_LINE1).unwrap_err();
        assert!(matches!(
            err,
            TleError::InvalidField {
                line: 1,
                field: TleField::LineNumber,
                ..
            }
        ));
    }

    #[test]
    fn test_catalog_mismatch() {
        let line2 = with_checksum(&ISS_LINE2.replacen("25544", "25545", 1));
        let err = OrbitalElementSet::from_lines(None, ISS_LINE1, &line2).unwrap_err();
        assert_eq!(
            err,
            TleError::CatalogMismatch {
                line1: 25544,
                line2: 25545
            }
        );
    }

    #[test]
    fn test_out_of_range_inclination() {
        let line2 = with_checksum(&ISS_LINE2.replacen(" 51.6416", "181.6416", 1));
        let err = OrbitalElementSet::from_lines(None, ISS_LINE1, &line2).unwrap_err();
        assert!(matches!(
            err,
            TleError::OutOfRange {
                field: TleField::Inclination,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_mean_motion_rejected() {
        let line2 = with_checksum(&ISS_LINE2.replacen("15.72125391", " 0.00000000", 1));
        let err = OrbitalElementSet::from_lines(None, ISS_LINE1, &line2).unwrap_err();
        assert!(matches!(
            err,
            TleError::OutOfRange {
                field: TleField::MeanMotion,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = OrbitalElementSet::from_lines(None, ISS_LINE1, ISS_LINE2).unwrap();
        let b = OrbitalElementSet::from_lines(None, ISS_LINE1, ISS_LINE2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_orbit_summary() {
        let tle = OrbitalElementSet::from_lines(None, ISS_LINE1, ISS_LINE2).unwrap();
        let summary = tle.orbit_summary();

        assert_relative_eq!(summary.period, 1440.0 / 15.72125391);
        assert_relative_eq!(summary.semi_major_axis, 6730.96, epsilon = 0.5);
        assert!(summary.perigee_altitude > 330.0 && summary.perigee_altitude < 350.0);
        assert!(summary.apogee_altitude > summary.perigee_altitude);
    }
}
