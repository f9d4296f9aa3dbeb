#![allow(dead_code)]

use approx::assert_abs_diff_eq;
use nalgebra::Vector3;
use orbitrack::tle::OrbitalElementSet;

pub const ISS: [&str; 3] = [
    "ISS (ZARYA)",
    "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927",
    "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537",
];

/// Near-earth test case of Spacetrack Report #3
pub const SGP4_TEST: [&str; 2] = [
    "1 88888U 88888A   80275.98708465  .00073094  13844-3  66816-4 0  5554",
    "2 88888  72.8435 115.9689 0086731  52.6988 110.5714 16.05824518   103",
];

/// Vanguard 1, near-earth with a perigee of about 650 km (full drag model)
pub const HIGH_PERIGEE_TEST: [&str; 2] = [
    "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753",
    "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667",
];

/// Deep-space test case of Spacetrack Report #3
pub const SDP4_TEST: [&str; 2] = [
    "1 11801U 88888A   80230.29629788  .01431103  00000-0  14311-1 0  5557",
    "2 11801  46.7916 230.4354 7318036  47.4722  10.4117  2.28537848   103",
];

/// Circular orbit at 10° of inclination, about 570 km high
pub const LOW_INCLINATION: [&str; 2] = [
    "1 99998U 24001A   24001.50000000  .00000000  00000-0  10000-3 0  9997",
    "2 99998  10.0000  20.0000 0000500  30.0000  40.0000 15.00000000    18",
];

pub fn element_set(lines: [&str; 2]) -> OrbitalElementSet {
    OrbitalElementSet::from_lines(None, lines[0], lines[1]).unwrap()
}

pub fn iss() -> OrbitalElementSet {
    OrbitalElementSet::from_lines(Some(ISS[0]), ISS[1], ISS[2]).unwrap()
}

pub fn assert_vector_close(actual: &Vector3<f64>, expected: [f64; 3], epsilon: f64) {
    assert_abs_diff_eq!(actual.x, expected[0], epsilon = epsilon);
    assert_abs_diff_eq!(actual.y, expected[1], epsilon = epsilon);
    assert_abs_diff_eq!(actual.z, expected[2], epsilon = epsilon);
}
