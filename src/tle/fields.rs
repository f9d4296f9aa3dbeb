//! Fixed-column decoding of the two-line element format.
//!
//! Every field of a TLE lives at a fixed position of a 69 character line. The column
//! ranges below are 0-based and half-open, so they can be used directly to slice the
//! line.
//!
//! ```text
//! 1 NNNNNC NNNNNAAA NNNNN.NNNNNNNN +.NNNNNNNN +NNNNN-N +NNNNN-N N NNNNN
//! 2 NNNNN NNN.NNNN NNN.NNNN NNNNNNN NNN.NNNN NNN.NNNN NN.NNNNNNNNNNNNNN
//! ```
use std::{fmt, ops::Range, str::FromStr};

use serde::Serialize;

use super::TleError;

/// Length of a TLE line, checksum included.
pub const LINE_LENGTH: usize = 69;

pub(crate) const CATALOG_NUMBER: Range<usize> = 2..7;
pub(crate) const CLASSIFICATION: usize = 7;
pub(crate) const INTERNATIONAL_DESIGNATOR: Range<usize> = 9..17;
pub(crate) const EPOCH_YEAR: Range<usize> = 18..20;
pub(crate) const EPOCH_DAY: Range<usize> = 20..32;
pub(crate) const MEAN_MOTION_DOT: Range<usize> = 33..43;
pub(crate) const MEAN_MOTION_DDOT: Range<usize> = 44..52;
pub(crate) const BSTAR: Range<usize> = 53..61;
pub(crate) const EPHEMERIS_TYPE: usize = 62;
pub(crate) const ELEMENT_SET_NUMBER: Range<usize> = 64..68;

pub(crate) const INCLINATION: Range<usize> = 8..16;
pub(crate) const RIGHT_ASCENSION: Range<usize> = 17..25;
pub(crate) const ECCENTRICITY: Range<usize> = 26..33;
pub(crate) const ARGUMENT_OF_PERIGEE: Range<usize> = 34..42;
pub(crate) const MEAN_ANOMALY: Range<usize> = 43..51;
pub(crate) const MEAN_MOTION: Range<usize> = 52..63;
pub(crate) const REVOLUTION_NUMBER: Range<usize> = 63..68;

pub(crate) const CHECKSUM: usize = 68;

/// Field of a two-line element set, used to locate parse failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TleField {
    LineNumber,
    CatalogNumber,
    Classification,
    InternationalDesignator,
    EpochYear,
    EpochDay,
    MeanMotionDot,
    MeanMotionDdot,
    Bstar,
    EphemerisType,
    ElementSetNumber,
    Inclination,
    RightAscension,
    Eccentricity,
    ArgumentOfPerigee,
    MeanAnomaly,
    MeanMotion,
    RevolutionNumber,
    Checksum,
}

impl fmt::Display for TleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TleField::LineNumber => "line number",
            TleField::CatalogNumber => "catalog number",
            TleField::Classification => "classification",
            TleField::InternationalDesignator => "international designator",
            TleField::EpochYear => "epoch year",
            TleField::EpochDay => "epoch day",
            TleField::MeanMotionDot => "first derivative of mean motion",
            TleField::MeanMotionDdot => "second derivative of mean motion",
            TleField::Bstar => "BSTAR drag term",
            TleField::EphemerisType => "ephemeris type",
            TleField::ElementSetNumber => "element set number",
            TleField::Inclination => "inclination",
            TleField::RightAscension => "right ascension of the ascending node",
            TleField::Eccentricity => "eccentricity",
            TleField::ArgumentOfPerigee => "argument of perigee",
            TleField::MeanAnomaly => "mean anomaly",
            TleField::MeanMotion => "mean motion",
            TleField::RevolutionNumber => "revolution number",
            TleField::Checksum => "checksum",
        };
        f.write_str(name)
    }
}

/// Modulo 10 checksum of a TLE line.
///
/// Digits add their value, the minus sign counts as 1, every other character as 0.
/// Only the first 68 characters are summed, the 69th being the checksum itself.
pub fn checksum(line: &str) -> u8 {
    let sum: u32 = line
        .bytes()
        .take(LINE_LENGTH - 1)
        .map(|b| match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'-' => 1,
            _ => 0,
        })
        .sum();
    (sum % 10) as u8
}

/// Slice a field and parse it after trimming the surrounding blanks.
///
/// Arguments
/// ---------
/// * `line`: a validated 69 character ASCII line
/// * `line_number`: 1 or 2, reported in errors
/// * `range`: column range of the field
/// * `field`: field identifier, reported in errors
///
/// Return
/// ------
/// * the parsed value, or `TleError::InvalidField` when the field is blank or does not parse
pub(crate) fn parse_field<T: FromStr>(
    line: &str,
    line_number: u8,
    range: Range<usize>,
    field: TleField,
) -> Result<T, TleError> {
    let raw = &line[range];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid(line_number, field, raw));
    }
    trimmed
        .parse::<T>()
        .map_err(|_| invalid(line_number, field, raw))
}

/// Parse a decimal field that may omit the leading zero, such as `-.00002182`.
pub(crate) fn parse_decimal(
    line: &str,
    line_number: u8,
    range: Range<usize>,
    field: TleField,
) -> Result<f64, TleError> {
    let raw = &line[range];
    let trimmed = raw.trim();
    let (sign, digits) = split_sign(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(invalid(line_number, field, raw));
    }
    let normalized = if digits.starts_with('.') {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    normalized
        .parse::<f64>()
        .map(|v| sign * v)
        .map_err(|_| invalid(line_number, field, raw))
}

/// Parse a field written with an implied leading decimal point, such as the
/// eccentricity `0086731` which stands for 0.0086731.
pub(crate) fn parse_implied_decimal(
    line: &str,
    line_number: u8,
    range: Range<usize>,
    field: TleField,
) -> Result<f64, TleError> {
    let raw = &line[range];
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(line_number, field, raw));
    }
    format!("0.{trimmed}")
        .parse::<f64>()
        .map_err(|_| invalid(line_number, field, raw))
}

/// Parse the exponent notation with an implied decimal point used by the second
/// derivative of the mean motion and by BSTAR.
///
/// ` 13844-3` stands for 0.13844e-3, `-11606-4` for -0.11606e-4 and ` 00000-0` for 0.
pub(crate) fn parse_exponent_field(
    line: &str,
    line_number: u8,
    range: Range<usize>,
    field: TleField,
) -> Result<f64, TleError> {
    let raw = &line[range];
    decode_exponent(raw.trim()).ok_or_else(|| invalid(line_number, field, raw))
}

fn decode_exponent(field: &str) -> Option<f64> {
    let (sign, body) = split_sign(field);
    // the exponent is the trailing signed digit
    let exp_start = body.rfind(['-', '+'])?;
    let (mantissa, exponent) = body.split_at(exp_start);
    if mantissa.is_empty() || !mantissa.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let exponent: i32 = exponent.parse().ok()?;
    let mantissa: f64 = format!("0.{mantissa}").parse().ok()?;
    Some(sign * mantissa * 10f64.powi(exponent))
}

fn split_sign(field: &str) -> (f64, &str) {
    match field.as_bytes().first() {
        Some(b'-') => (-1.0, &field[1..]),
        Some(b'+') => (1.0, &field[1..]),
        _ => (1.0, field),
    }
}

/// Decode a catalog number, either plain five digits or the Alpha-5 extension where
/// the leading letter encodes the ten-thousands (A = 10, ..., Z = 33, skipping I and O).
pub(crate) fn parse_catalog_number(line: &str, line_number: u8) -> Result<u32, TleError> {
    let raw = &line[CATALOG_NUMBER];
    let trimmed = raw.trim();
    let err = || invalid(line_number, TleField::CatalogNumber, raw);

    let mut chars = trimmed.chars();
    let first = chars.next().ok_or_else(err)?;
    if first.is_ascii_digit() {
        return trimmed.parse::<u32>().map_err(|_| err());
    }

    let prefix = alpha5_prefix(first).ok_or_else(err)?;
    let rest = chars.as_str();
    if rest.len() != 4 || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }
    let rest: u32 = rest.parse().map_err(|_| err())?;
    Ok(prefix * 10_000 + rest)
}

fn alpha5_prefix(letter: char) -> Option<u32> {
    let letter = letter.to_ascii_uppercase();
    if !letter.is_ascii_uppercase() || letter == 'I' || letter == 'O' {
        return None;
    }
    let mut value = 10 + (letter as u32 - 'A' as u32);
    if letter > 'I' {
        value -= 1;
    }
    if letter > 'O' {
        value -= 1;
    }
    Some(value)
}

pub(crate) fn invalid(line_number: u8, field: TleField, raw: &str) -> TleError {
    TleError::InvalidField {
        line: line_number,
        field,
        value: raw.to_string(),
    }
}

#[cfg(test)]
mod fields_test {
    use super::*;
    use approx::assert_relative_eq;

    const LINE1: &str = "1 88888U 88888A   80275.98708465  .00073094  13844-3  66816-4 0  5554";
    const LINE2: &str = "2 88888  72.8435 115.9689 0086731  52.6988 110.5714 16.05824518   103";

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(LINE1), 4);
        assert_eq!(checksum(LINE2), 3);
        assert_eq!(
            checksum("1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927"),
            7
        );
    }

    #[test]
    fn test_exponent_field() {
        assert_relative_eq!(decode_exponent("13844-3").unwrap(), 0.13844e-3);
        assert_relative_eq!(decode_exponent("-11606-4").unwrap(), -0.11606e-4);
        assert_relative_eq!(decode_exponent("14311-1").unwrap(), 0.14311e-1);
        assert_relative_eq!(decode_exponent("+12345+1").unwrap(), 1.2345);
        assert_eq!(decode_exponent("00000-0"), Some(0.0));
        assert_eq!(decode_exponent("00000"), None);
        assert_eq!(decode_exponent("1a344-3"), None);
        assert_eq!(decode_exponent(""), None);
    }

    #[test]
    fn test_decimal_without_leading_zero() {
        let ndot = parse_decimal(LINE1, 1, MEAN_MOTION_DOT, TleField::MeanMotionDot).unwrap();
        assert_relative_eq!(ndot, 0.00073094);

        let line = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
        let ndot = parse_decimal(line, 1, MEAN_MOTION_DOT, TleField::MeanMotionDot).unwrap();
        assert_relative_eq!(ndot, -0.00002182);
    }

    #[test]
    fn test_implied_decimal() {
        let ecc = parse_implied_decimal(LINE2, 2, ECCENTRICITY, TleField::Eccentricity).unwrap();
        assert_relative_eq!(ecc, 0.0086731);
    }

    #[test]
    fn test_blank_field_is_an_error() {
        let line = LINE2.replace("110.5714", "        ");
        let err = parse_field::<f64>(&line, 2, MEAN_ANOMALY, TleField::MeanAnomaly).unwrap_err();
        assert_eq!(
            err,
            TleError::InvalidField {
                line: 2,
                field: TleField::MeanAnomaly,
                value: "        ".into()
            }
        );
    }

    #[test]
    fn test_catalog_number() {
        assert_eq!(parse_catalog_number(LINE1, 1).unwrap(), 88888);
        let alpha5 = LINE1.replacen("88888U", "A0001U", 1);
        assert_eq!(parse_catalog_number(&alpha5, 1).unwrap(), 100_001);
        let alpha5 = LINE1.replacen("88888U", "Z9999U", 1);
        assert_eq!(parse_catalog_number(&alpha5, 1).unwrap(), 339_999);
        let alpha5 = LINE1.replacen("88888U", "J0000U", 1);
        assert_eq!(parse_catalog_number(&alpha5, 1).unwrap(), 180_000);
        let bad = LINE1.replacen("88888U", "I0001U", 1);
        assert!(parse_catalog_number(&bad, 1).is_err());
    }

    #[test]
    fn test_field_display() {
        assert_eq!(TleField::Bstar.to_string(), "BSTAR drag term");
        assert_eq!(TleField::Checksum.to_string(), "checksum");
    }
}
