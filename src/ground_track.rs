//! # Ground tracks
//!
//! A ground track is the sequence of sub-satellite points over a time window, sampled
//! at a fixed step. [`sample`] returns a lazy [`GroundTrack`] iterator: points are
//! computed on demand, and cloning the iterator restarts nothing but its own cursor, so
//! the same inputs always produce the same points.
//!
//! Instants where the propagation fails (decayed orbit, diverged eccentricity) are
//! skipped: the sequence has a gap, never an interpolated point.
//!
//! The sampler does not split the track where it crosses the ±180° meridian. A consumer
//! drawing the track uses [`split_antimeridian`] (one polyline per segment) or
//! [`unwrap_longitudes`] (continuous longitudes) on the collected points.
use hifitime::{Epoch, Unit};
use serde::Serialize;
use tracing::debug;

use crate::{
    constants::{Degree, Kilometer, Minute, MAX_SAMPLES},
    orbitrack_errors::OrbitrackError,
    propagator::Propagator,
    ref_system::eci_to_geodetic,
};

/// Sub-satellite point at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroundTrackPoint {
    pub epoch: Epoch,
    pub latitude: Degree,
    /// Degrees in (-180, 180]
    pub longitude: Degree,
    pub altitude: Kilometer,
}

/// Lazy iterator over the sampled sub-satellite points.
#[derive(Debug, Clone)]
pub struct GroundTrack<'a> {
    propagator: &'a Propagator,
    start: Epoch,
    step_seconds: f64,
    next: u64,
    count: u64,
}

impl GroundTrack<'_> {
    /// Number of sampling instants left, including those that may fail.
    pub fn remaining_instants(&self) -> u64 {
        self.count - self.next
    }
}

impl Iterator for GroundTrack<'_> {
    type Item = GroundTrackPoint;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.count {
            let epoch = self.start + Unit::Second * (self.step_seconds * self.next as f64);
            self.next += 1;

            match self.propagator.propagate(&epoch) {
                Ok(state) => {
                    let geodetic = eci_to_geodetic(&state.position, &epoch);
                    return Some(GroundTrackPoint {
                        epoch,
                        latitude: geodetic.latitude,
                        longitude: geodetic.longitude,
                        altitude: geodetic.altitude,
                    });
                }
                Err(err) => {
                    debug!(
                        catalog_number = self.propagator.catalog_number(),
                        %epoch,
                        error = %err,
                        "ground track sample skipped"
                    );
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, usize::try_from(self.remaining_instants()).ok())
    }
}

/// Sample the ground track of a satellite.
///
/// Arguments
/// ---------
/// * `propagator`: propagation state of the satellite
/// * `start`: first sampling instant
/// * `duration`: length of the window, minutes (0 gives the single point at `start`)
/// * `step_seconds`: sampling step, seconds
///
/// Return
/// ------
/// * an iterator over the points at `start + i·step` for `i = 0..=floor(duration·60/step)`,
///   or `InvalidSampling` when the step is not strictly positive, the duration is
///   negative or not finite, or the window holds more than [`MAX_SAMPLES`] instants
///
/// See also
/// --------
/// * [`split_antimeridian`] – split the collected points for drawing
pub fn sample(
    propagator: &Propagator,
    start: Epoch,
    duration: Minute,
    step_seconds: f64,
) -> Result<GroundTrack<'_>, OrbitrackError> {
    if !(step_seconds.is_finite() && step_seconds > 0.0) {
        return Err(OrbitrackError::InvalidSampling(format!(
            "step must be a positive number of seconds, got {step_seconds}"
        )));
    }
    if !(duration.is_finite() && duration >= 0.0) {
        return Err(OrbitrackError::InvalidSampling(format!(
            "duration must be a non-negative number of minutes, got {duration}"
        )));
    }

    let steps = (duration * 60.0 / step_seconds).floor();
    if steps >= MAX_SAMPLES as f64 {
        return Err(OrbitrackError::InvalidSampling(format!(
            "{duration} min sampled every {step_seconds} s exceeds {MAX_SAMPLES} instants"
        )));
    }

    Ok(GroundTrack {
        propagator,
        start,
        step_seconds,
        next: 0,
        count: steps as u64 + 1,
    })
}

/// Split a time-ordered track wherever two consecutive longitudes differ by more
/// than 180°.
pub fn split_antimeridian(points: &[GroundTrackPoint]) -> Vec<Vec<GroundTrackPoint>> {
    let mut segments: Vec<Vec<GroundTrackPoint>> = Vec::new();
    let mut current: Vec<GroundTrackPoint> = Vec::new();

    for point in points {
        if let Some(last) = current.last() {
            if (point.longitude - last.longitude).abs() > 180.0 {
                segments.push(std::mem::take(&mut current));
            }
        }
        current.push(*point);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Longitudes of a time-ordered track with the ±360° jumps removed.
///
/// The first longitude is kept as is, every following one is shifted by a multiple of
/// 360° to stay within 180° of its predecessor.
pub fn unwrap_longitudes(points: &[GroundTrackPoint]) -> Vec<Degree> {
    points
        .iter()
        .scan(None::<Degree>, |previous, point| {
            let lon = match *previous {
                None => point.longitude,
                Some(prev) => {
                    let delta = (point.longitude - prev + 180.0).rem_euclid(360.0) - 180.0;
                    prev + delta
                }
            };
            *previous = Some(lon);
            Some(lon)
        })
        .collect()
}
