mod common;

use approx::assert_abs_diff_eq;
use hifitime::Unit;
use nalgebra::Vector3;
use orbitrack::ground_track::{split_antimeridian, unwrap_longitudes};
use orbitrack::observers::{look_angles, ObserverSite};
use orbitrack::passes::PassSearch;
use orbitrack::ref_system::{
    earth_fixed_to_geodetic, geodetic_to_earth_fixed, inertial_to_earth_fixed,
};
use orbitrack::{Orbitrack, Satellite};

use crate::common::{element_set, iss, LOW_INCLINATION, SDP4_TEST};

#[test]
fn test_half_period_puts_the_satellite_on_the_other_side() {
    let sat = Satellite::new(iss());
    let epoch = sat.elements().epoch();
    let start = sat.state(&epoch).unwrap();
    let later = sat.state(&(epoch + Unit::Minute * 45)).unwrap();

    let angle = start.position.angle(&later.position).to_degrees();
    assert!(angle > 170.0, "angle after 45 min: {angle}");
}

#[test]
fn test_geodetic_round_trip_along_a_track() {
    let sat = Satellite::new(iss());
    for point in sat.ground_track(sat.elements().epoch(), 95.0, 60.0).unwrap() {
        let fixed = geodetic_to_earth_fixed(&orbitrack::ref_system::GeodeticPosition {
            latitude: point.latitude,
            longitude: point.longitude,
            altitude: point.altitude,
        });
        let back = earth_fixed_to_geodetic(&fixed);
        assert_abs_diff_eq!(back.latitude, point.latitude, epsilon = 1e-9);
        assert_abs_diff_eq!(back.longitude, point.longitude, epsilon = 1e-9);
        assert_abs_diff_eq!(back.altitude, point.altitude, epsilon = 1e-6);
    }
}

#[test]
fn test_earth_fixed_round_trip() {
    let sat = Satellite::new(element_set(SDP4_TEST));
    let epoch = sat.elements().epoch();
    let mut positions: Vec<Vector3<f64>> = (0..1440_i64)
        .step_by(90)
        .map(|minutes| {
            sat.position(&(epoch + Unit::Minute * minutes))
                .unwrap()
                .earth_fixed
        })
        .collect();
    positions.extend([
        Vector3::new(6378.137, 0.0, 0.0),
        Vector3::new(0.0, 0.0, 6356.7523142),
        Vector3::new(0.0, 0.0, -7000.0),
        Vector3::new(-4000.0, 3000.0, -3500.0),
    ]);

    for position in positions {
        let back = geodetic_to_earth_fixed(&earth_fixed_to_geodetic(&position));
        assert!(
            (back - position).norm() < 1e-6,
            "{position:?} came back as {back:?}"
        );
    }
}

#[test]
fn test_longitudes_stay_normalized_over_a_day() {
    let sat = Satellite::new(iss());
    let points: Vec<_> = sat
        .ground_track(sat.elements().epoch(), 1440.0, 120.0)
        .unwrap()
        .collect();
    assert_eq!(points.len(), 721);
    assert!(points
        .iter()
        .all(|p| p.longitude > -180.0 && p.longitude <= 180.0));

    // about 15 revolutions relative to the ground, one antimeridian crossing each
    let segments = split_antimeridian(&points);
    assert!(segments.len() >= 14 && segments.len() <= 18);
    assert_eq!(segments.iter().map(Vec::len).sum::<usize>(), points.len());

    let unwrapped = unwrap_longitudes(&points);
    assert!(unwrapped.windows(2).all(|w| (w[1] - w[0]).abs() < 180.0));
}

#[test]
fn test_deep_space_look_angles_are_finite() {
    let sat = Satellite::new(element_set(SDP4_TEST));
    let site = ObserverSite::new("GSFC", "Greenbelt", 38.99, -76.85, 0.05).unwrap();
    for minutes in (0..1440_i64).step_by(60) {
        let epoch = sat.elements().epoch() + Unit::Minute * minutes;
        let look = sat.look_angles(&epoch, &site).unwrap();
        assert!((0.0..360.0).contains(&look.azimuth));
        assert!((-90.0..=90.0).contains(&look.elevation));
        assert!(look.range > 0.0);
    }
}

#[test]
fn test_look_angles_from_earth_fixed_state() {
    let sat = Satellite::new(iss());
    let epoch = sat.elements().epoch() + Unit::Minute * 10;
    let site = ObserverSite::new("TLS", "Toulouse", 43.6, 1.44, 0.15).unwrap();

    let state = sat.state(&epoch).unwrap();
    let fixed = inertial_to_earth_fixed(&state.position, &epoch);
    assert_eq!(
        look_angles(&fixed.position, &site).unwrap(),
        sat.look_angles(&epoch, &site).unwrap()
    );
}

#[test]
fn test_one_pass_per_revolution_under_the_track() {
    let sat = Satellite::new(element_set(LOW_INCLINATION));
    let epoch = sat.elements().epoch();
    let sub = sat.position(&(epoch + Unit::Minute * 50)).unwrap().geodetic;
    let site = ObserverSite::new("EQ", "under the track", sub.latitude, sub.longitude, 0.0)
        .unwrap();

    // three synodic periods of about 103 minutes
    let search = PassSearch::new(epoch, 3.0 * 103.0).with_step(0.5);
    let passes = sat.passes(&site, &search).unwrap();
    assert!(passes.len() >= 3, "{} passes", passes.len());
    assert!(passes.iter().any(|p| p.peak_elevation > 89.9));
    assert!(passes
        .windows(2)
        .all(|w| w[0].set.epoch() <= w[1].rise.epoch()));
    for pass in &passes {
        assert!(pass.rise.epoch() < pass.set.epoch());
        assert!(pass.peak_elevation >= 0.0);
        if pass.set.is_truncated() {
            assert_eq!(Some(pass), passes.last());
        }
    }
}

#[test]
fn test_catalog_scenario() {
    let mut tracker = Orbitrack::new();
    let id = tracker
        .insert_tle(Some("LOW"), LOW_INCLINATION[0], LOW_INCLINATION[1])
        .unwrap();
    let sat = tracker.get(id).unwrap().clone();
    let epoch = sat.elements().epoch() + Unit::Minute * 50;
    let sub = sat.position(&epoch).unwrap().geodetic;
    let site = ObserverSite::new("EQ", "under the track", sub.latitude, sub.longitude, 0.0)
        .unwrap();

    let visible = tracker.visible_from(&site, &epoch);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].0, id);

    let search = PassSearch::new(sat.elements().epoch(), 120.0);
    assert_eq!(
        tracker.next_passes(id, &site, &search).unwrap(),
        sat.passes(&site, &search).unwrap()
    );
}
