//! # Visibility passes
//!
//! A pass is an interval during which the elevation of a satellite seen from a site
//! stays at or above the site's elevation mask. [`find_passes`] scans a time window
//! forward with a fixed step and reports every pass it samples.
//!
//! ## Scan rules
//!
//! * A pass rises at the first sample at or above the mask that follows a sample below it.
//! * It sets at the first following sample below the mask: that sample's instant is the
//!   set time, so the reported duration is a multiple of the step.
//! * The peak is the highest sampled elevation of the pass, with its instant and azimuth.
//! * A sample where the propagation fails counts as below the mask.
//!
//! ## Truncated passes
//!
//! The scan only knows what it samples. Two boundaries are therefore reported as
//! [`PassBoundary::Truncated`] instead of [`PassBoundary::Crossing`]:
//!
//! * the rise of a pass already in progress at the window start (the instant is the
//!   window start, a lower bound of the true rise being earlier),
//! * the set of a pass still in progress at the last sample (the instant is that last
//!   sample).
//!
//! Callers wanting true rise and set times for every pass pad the search window.
use hifitime::{Epoch, Unit};
use serde::Serialize;
use tracing::debug;

use crate::{
    constants::{CatalogNumber, Degree, Minute, SiteId, MAX_SAMPLES},
    observers::ObserverSite,
    orbitrack_errors::OrbitrackError,
    satellite::Satellite,
    time::minutes_between,
};

/// Default scan step, minutes.
pub const DEFAULT_STEP: Minute = 1.0;

/// Rise or set instant of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PassBoundary {
    /// Threshold crossing found between two samples
    Crossing(Epoch),
    /// The pass extends beyond the search window on this side
    Truncated(Epoch),
}

impl PassBoundary {
    pub fn epoch(&self) -> Epoch {
        match *self {
            PassBoundary::Crossing(epoch) | PassBoundary::Truncated(epoch) => epoch,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, PassBoundary::Truncated(_))
    }
}

/// Time window and step of a pass search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PassSearch {
    pub start: Epoch,
    /// Length of the window, minutes
    pub window_minutes: Minute,
    /// Scan step, minutes
    pub step_minutes: Minute,
}

impl PassSearch {
    /// Search of `window_minutes` from `start` with the default one-minute step.
    pub fn new(start: Epoch, window_minutes: Minute) -> Self {
        PassSearch {
            start,
            window_minutes,
            step_minutes: DEFAULT_STEP,
        }
    }

    pub fn with_step(self, step_minutes: Minute) -> Self {
        PassSearch {
            step_minutes,
            ..self
        }
    }

    /// Number of steps after the first sample, or `InvalidSampling`.
    fn steps(&self) -> Result<u64, OrbitrackError> {
        if !(self.step_minutes.is_finite() && self.step_minutes > 0.0) {
            return Err(OrbitrackError::InvalidSampling(format!(
                "pass search step must be a positive number of minutes, got {}",
                self.step_minutes
            )));
        }
        if !(self.window_minutes.is_finite() && self.window_minutes >= 0.0) {
            return Err(OrbitrackError::InvalidSampling(format!(
                "pass search window must be a non-negative number of minutes, got {}",
                self.window_minutes
            )));
        }
        let steps = (self.window_minutes / self.step_minutes).floor();
        if steps >= MAX_SAMPLES as f64 {
            return Err(OrbitrackError::InvalidSampling(format!(
                "{} min scanned every {} min exceeds {MAX_SAMPLES} samples",
                self.window_minutes, self.step_minutes
            )));
        }
        Ok(steps as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassWindow {
    pub satellite: CatalogNumber,
    pub observer: SiteId,
    pub rise: PassBoundary,
    pub set: PassBoundary,
    /// Highest sampled elevation, degrees
    pub peak_elevation: Degree,
    pub peak_time: Epoch,
    pub peak_azimuth: Degree,
    /// Minutes between the known rise and set
    pub duration: Minute,
}

impl PassWindow {
    /// True when both the rise and the set were sampled inside the window.
    pub fn is_complete(&self) -> bool {
        !self.rise.is_truncated() && !self.set.is_truncated()
    }
}

/// Pass being followed by the scan.
struct OpenPass {
    rise: PassBoundary,
    peak_elevation: Degree,
    peak_time: Epoch,
    peak_azimuth: Degree,
}

impl OpenPass {
    fn close(self, satellite: &Satellite, site: &ObserverSite, set: PassBoundary) -> PassWindow {
        PassWindow {
            satellite: satellite.catalog_number(),
            observer: site.id().to_owned(),
            duration: minutes_between(&self.rise.epoch(), &set.epoch()),
            rise: self.rise,
            set,
            peak_elevation: self.peak_elevation,
            peak_time: self.peak_time,
            peak_azimuth: self.peak_azimuth,
        }
    }
}

/// Passes of a satellite over a site within a search window.
///
/// Arguments
/// ---------
/// * `satellite`: the satellite to follow
/// * `site`: the observing site; its elevation mask is the visibility threshold
/// * `search`: window start, length and scan step
///
/// Return
/// ------
/// * the passes in chronological order, or `InvalidSampling` when the step is not
///   strictly positive, the window is negative, or the scan would exceed
///   [`MAX_SAMPLES`] samples
///
/// See also
/// --------
/// * [`PassBoundary`] – how passes cut by the window edges are reported
pub fn find_passes(
    satellite: &Satellite,
    site: &ObserverSite,
    search: &PassSearch,
) -> Result<Vec<PassWindow>, OrbitrackError> {
    let steps = search.steps()?;
    let mut passes = Vec::new();
    let mut open: Option<OpenPass> = None;
    let mut last = search.start;

    for i in 0..=steps {
        let epoch = search.start + Unit::Minute * (search.step_minutes * i as f64);
        last = epoch;

        let look = match satellite.look_angles(&epoch, site) {
            Ok(look) => Some(look),
            Err(err) => {
                debug!(
                    catalog_number = satellite.catalog_number(),
                    site = site.id(),
                    %epoch,
                    error = %err,
                    "pass scan sample counted as not visible"
                );
                None
            }
        };

        match (look.filter(|l| site.is_visible(l)), open.take()) {
            (Some(look), None) => {
                let rise = if i == 0 {
                    PassBoundary::Truncated(epoch)
                } else {
                    PassBoundary::Crossing(epoch)
                };
                open = Some(OpenPass {
                    rise,
                    peak_elevation: look.elevation,
                    peak_time: epoch,
                    peak_azimuth: look.azimuth,
                });
            }
            (Some(look), Some(mut pass)) => {
                if look.elevation > pass.peak_elevation {
                    pass.peak_elevation = look.elevation;
                    pass.peak_time = epoch;
                    pass.peak_azimuth = look.azimuth;
                }
                open = Some(pass);
            }
            (None, Some(pass)) => {
                passes.push(pass.close(satellite, site, PassBoundary::Crossing(epoch)));
            }
            (None, None) => {}
        }
    }

    if let Some(pass) = open {
        passes.push(pass.close(satellite, site, PassBoundary::Truncated(last)));
    }
    Ok(passes)
}
