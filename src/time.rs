use hifitime::{Epoch, Unit};

use crate::constants::{
    Degree, JulianDate, Minute, Radian, DAYS_PER_JULIAN_CENTURY, DPI, JD_J2000, RADEG,
};

/// Build the epoch encoded in a two-line element set.
///
/// Argument
/// --------
/// * `two_digit_year`: year field of line 1 (columns 19-20). Values 57..=99 map to
///   1957..=1999, 00..=56 to 2000..=2056.
/// * `day_of_year`: fractional day of the year, 1.0 being January 1st at 00:00 UTC.
///
/// Return
/// ------
/// * the epoch in the UTC time scale
pub fn tle_epoch(two_digit_year: u32, day_of_year: f64) -> Epoch {
    let year = if two_digit_year < 57 {
        2000 + two_digit_year as i32
    } else {
        1900 + two_digit_year as i32
    };
    Epoch::from_gregorian_utc_at_midnight(year, 1, 1) + Unit::Day * (day_of_year - 1.0)
}

/// Julian date (UTC) of an epoch.
pub fn julian_date(epoch: &Epoch) -> JulianDate {
    epoch.to_jde_utc_days()
}

/// Signed number of minutes elapsed from `from` to `to`.
pub fn minutes_between(from: &Epoch, to: &Epoch) -> Minute {
    (*to - *from).to_unit(Unit::Minute)
}

/// Julian centuries elapsed since J2000.0 for a given Julian date.
pub fn julian_centuries(jd: JulianDate) -> f64 {
    (jd - JD_J2000) / DAYS_PER_JULIAN_CENTURY
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians.
///
/// This function implements the IAU 1982 polynomial of the mean sidereal time
/// expressed in Julian centuries of UT1 since J2000.0. UT1 is approximated by UTC,
/// which keeps the error below one second of time (about 4e-3 degrees).
///
/// # Arguments
/// * `epoch` - the instant at which the earth orientation is required.
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
///
/// # Details
/// The polynomial gives the sidereal time in seconds of time:
///
/// ```text
/// θ = 67310.54841 + (876600 h + 8640184.812866) s·T + 0.093104 s·T² − 6.2e-6 s·T³
/// ```
///
/// which is converted into radians (240 seconds of time per degree) and wrapped.
///
/// # References
/// * IAU 1982, Explanatory Supplement to the Astronomical Almanac (1992).
pub fn gmst(epoch: &Epoch) -> Radian {
    // Polynomial coefficients, seconds of time
    const C0: f64 = 67310.54841;
    const C1: f64 = 876_600.0 * 3600.0 + 8_640_184.812866;
    const C2: f64 = 0.093104;
    const C3: f64 = -6.2e-6;

    let t = julian_centuries(julian_date(epoch));
    let seconds = ((C3 * t + C2) * t + C1) * t + C0;

    (seconds * RADEG / 240.0).rem_euclid(DPI)
}

/// Greenwich sidereal angle in degrees, normalized to [0, 360).
///
/// Same quantity as [`gmst`], exposed in degrees for presentation layers that rotate
/// an earth model.
pub fn greenwich_sidereal_angle(epoch: &Epoch) -> Degree {
    let deg = gmst(epoch).to_degrees();
    if deg >= 360.0 {
        0.0
    } else {
        deg
    }
}
