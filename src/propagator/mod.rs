//! # Analytic orbit propagation (SGP4 / SDP4)
//!
//! This module turns an [`OrbitalElementSet`] into position and velocity vectors in the
//! inertial TEME frame at arbitrary instants, using the NORAD analytic perturbation
//! models the element sets are fitted with.
//!
//! ## Overview
//!
//! - [`Propagator::new`] recovers the Brouwer mean motion and semi-major axis from the
//!   Kozai mean motion of the element set, precomputes the secular rates and drag
//!   coefficients, and selects the model:
//!     * **near-earth** (SGP4, [`near_earth`]) for periods below 225 minutes,
//!     * **deep-space** (SDP4, [`deep_space`]) above, adding the lunar and solar
//!       perturbations and the 12 h / 24 h geopotential resonances.
//! - [`Propagator::propagate`] evaluates the model at an absolute epoch. The short
//!   periodic corrections and the final orientation are shared by both models
//!   ([`osculating`]).
//!
//! ## Determinism
//!
//! A `Propagator` is never mutated after construction: the resonance integrator of the
//! deep-space model restarts from the element epoch on each call and the lunar/solar
//! periodics are evaluated on each call. Two calls with the same instant return
//! bit-identical state vectors, and a single `Propagator` can be shared between threads
//! through an `Arc`.
//!
//! ## Units
//!
//! Internally the models work in earth radii (WGS-72) and minutes. [`StateVector`]
//! exposes kilometers and kilometers per second.
//!
//! ## References
//!
//! * Hoots, F. R., Roehrich, R. L. (1980). *Spacetrack Report No. 3: Models for
//!   Propagation of NORAD Element Sets*.
//! * Vallado, D. A., Crawford, P., Hujsak, R., Kelso, T. S. (2006). *Revisiting
//!   Spacetrack Report #3*. AIAA 2006-6753.
pub mod deep_space;
pub mod near_earth;
pub mod osculating;

use hifitime::{Epoch, Unit};
use nalgebra::Vector3;
use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::{
    constants::{CatalogNumber, Kilometer, Minute, DEEP_SPACE_PERIOD, DPI, J2, J3, J4, XKE, XKMPER},
    time::minutes_between,
    tle::OrbitalElementSet,
};

use deep_space::DeepSpace;
use near_earth::NearEarth;
use osculating::{osculating_state, MeanState};

/// J2/2, in earth radii squared
pub(crate) const CK2: f64 = 0.5 * J2;
/// -3/8 J4, in earth radii to the fourth
pub(crate) const CK4: f64 = -0.375 * J4;
/// -J3/CK2
pub(crate) const A3OVK2: f64 = -J3 / CK2;
/// Reference altitude of the atmospheric density function, earth radii
const S: f64 = 1.0 + 78.0 / XKMPER;
/// (q0 - s)^4 with q0 = 120 km, earth radii to the fourth
const QOMS2T: f64 = {
    let q = (120.0 - 78.0) / XKMPER;
    q * q * q * q
};
const TWO_THIRDS: f64 = 2.0 / 3.0;

/// Reason why a propagation produced no position.
///
/// Each variant is reported for a single instant only. Callers are expected to treat the
/// satellite position as unknown at that instant and carry on with the next one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropagationError {
    #[error("satellite has decayed (radius {radius_km:.3} km)")]
    Decayed { radius_km: Kilometer },

    #[error("eccentricity diverged to {eccentricity}")]
    EccentricityDiverged { eccentricity: f64 },

    #[error("invalid orbit geometry: {quantity} = {value}")]
    InvalidGeometry { quantity: &'static str, value: f64 },
}

/// Inertial (TEME) position and velocity at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateVector {
    pub epoch: Epoch,
    /// Position, km
    pub position: Vector3<f64>,
    /// Velocity, km/s
    pub velocity: Vector3<f64>,
}

impl StateVector {
    /// Norm of the velocity, km/s.
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Geocentric distance, km.
    pub fn radius(&self) -> Kilometer {
        self.position.norm()
    }
}

/// Mean elements recovered from the element set, with the secular rates and the
/// coefficients shared by the near-earth and deep-space models.
///
/// Angles are in radians, distances in earth radii and rates per minute.
#[derive(Debug, Clone)]
pub(crate) struct MeanElements {
    pub inclination: f64,
    pub right_ascension: f64,
    pub argument_of_perigee: f64,
    pub mean_anomaly: f64,
    pub eccentricity: f64,
    pub bstar: f64,

    pub cosio: f64,
    pub sinio: f64,
    pub theta2: f64,
    pub x3thm1: f64,
    pub x1mth2: f64,
    pub x7thm1: f64,
    pub eosq: f64,
    pub betao: f64,
    pub betao2: f64,

    /// Brouwer mean motion, rad/min
    pub xnodp: f64,
    /// Brouwer semi-major axis, earth radii
    pub aodp: f64,
    /// Perigee altitude, km
    pub perigee: Kilometer,
    pub s4: f64,
    pub tsi: f64,
    pub eta: f64,
    pub etasq: f64,
    pub eeta: f64,
    pub coef: f64,
    pub coef1: f64,

    pub c1: f64,
    pub c4: f64,
    pub xmdot: f64,
    pub omgdot: f64,
    pub xnodot: f64,
    pub xnodcf: f64,
    pub t2cof: f64,
    pub xlcof: f64,
    pub aycof: f64,
}

impl MeanElements {
    fn new(tle: &OrbitalElementSet) -> Self {
        let inclination = tle.inclination().to_radians();
        let argument_of_perigee = tle.argument_of_perigee().to_radians();
        let eccentricity = tle.eccentricity();
        let bstar = tle.bstar();
        let xno = tle.mean_motion() * DPI / crate::constants::MINUTES_PER_DAY;

        // Recover the original mean motion and semi-major axis
        let a1 = (XKE / xno).powf(TWO_THIRDS);
        let (sinio, cosio) = inclination.sin_cos();
        let theta2 = cosio * cosio;
        let x3thm1 = 3.0 * theta2 - 1.0;
        let eosq = eccentricity * eccentricity;
        let betao2 = 1.0 - eosq;
        let betao = betao2.sqrt();
        let del1 = 1.5 * CK2 * x3thm1 / (a1 * a1 * betao * betao2);
        let ao = a1 * (1.0 - del1 * (0.5 * TWO_THIRDS + del1 * (1.0 + 134.0 / 81.0 * del1)));
        let delo = 1.5 * CK2 * x3thm1 / (ao * ao * betao * betao2);
        let xnodp = xno / (1.0 + delo);
        let aodp = ao / (1.0 - delo);

        // Below 156 km of perigee the atmospheric parameters are adjusted
        let perigee = (aodp * (1.0 - eccentricity) - 1.0) * XKMPER;
        let (s4, qoms24) = if perigee < 156.0 {
            let s = if perigee <= 98.0 { 20.0 } else { perigee - 78.0 };
            let q = (120.0 - s) / XKMPER;
            (s / XKMPER + 1.0, q * q * q * q)
        } else {
            (S, QOMS2T)
        };

        let pinvsq = 1.0 / (aodp * aodp * betao2 * betao2);
        let tsi = 1.0 / (aodp - s4);
        let eta = aodp * eccentricity * tsi;
        let etasq = eta * eta;
        let eeta = eccentricity * eta;
        let psisq = (1.0 - etasq).abs();
        let coef = qoms24 * tsi.powi(4);
        let coef1 = coef / psisq.powf(3.5);
        let c2 = coef1
            * xnodp
            * (aodp * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
                + 0.75 * CK2 * tsi / psisq * x3thm1 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
        let c1 = bstar * c2;
        let x1mth2 = 1.0 - theta2;
        let c4 = 2.0
            * xnodp
            * coef1
            * aodp
            * betao2
            * (eta * (2.0 + 0.5 * etasq) + eccentricity * (0.5 + 2.0 * etasq)
                - 2.0 * CK2 * tsi / (aodp * psisq)
                    * (-3.0 * x3thm1 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                        + 0.75
                            * x1mth2
                            * (2.0 * etasq - eeta * (1.0 + etasq))
                            * (2.0 * argument_of_perigee).cos()));

        // Secular rates of the mean anomaly, argument of perigee and node
        let theta4 = theta2 * theta2;
        let temp1 = 3.0 * CK2 * pinvsq * xnodp;
        let temp2 = temp1 * CK2 * pinvsq;
        let temp3 = 1.25 * CK4 * pinvsq * pinvsq * xnodp;
        let xmdot = xnodp
            + 0.5 * temp1 * betao * x3thm1
            + 0.0625 * temp2 * betao * (13.0 - 78.0 * theta2 + 137.0 * theta4);
        let x1m5th = 1.0 - 5.0 * theta2;
        let omgdot = -0.5 * temp1 * x1m5th
            + 0.0625 * temp2 * (7.0 - 114.0 * theta2 + 395.0 * theta4)
            + temp3 * (3.0 - 36.0 * theta2 + 49.0 * theta4);
        let xhdot1 = -temp1 * cosio;
        let xnodot = xhdot1
            + (0.5 * temp2 * (4.0 - 19.0 * theta2) + 2.0 * temp3 * (3.0 - 7.0 * theta2)) * cosio;

        // 1 + cos(i) vanishes for retrograde equatorial orbits
        let mut one_plus_cosio = 1.0 + cosio;
        if one_plus_cosio.abs() <= 1.5e-12 {
            one_plus_cosio = 1.5e-12;
        }

        MeanElements {
            inclination,
            right_ascension: tle.right_ascension().to_radians(),
            argument_of_perigee,
            mean_anomaly: tle.mean_anomaly().to_radians(),
            eccentricity,
            bstar,
            cosio,
            sinio,
            theta2,
            x3thm1,
            x1mth2,
            x7thm1: 7.0 * theta2 - 1.0,
            eosq,
            betao,
            betao2,
            xnodp,
            aodp,
            perigee,
            s4,
            tsi,
            eta,
            etasq,
            eeta,
            coef,
            coef1,
            c1,
            c4,
            xmdot,
            omgdot,
            xnodot,
            xnodcf: 3.5 * betao2 * xhdot1 * c1,
            t2cof: 1.5 * c1,
            xlcof: 0.125 * A3OVK2 * sinio * (3.0 + 5.0 * cosio) / one_plus_cosio,
            aycof: 0.25 * A3OVK2 * sinio,
        }
    }

    /// Anomalistic period from the recovered mean motion, minutes.
    fn period(&self) -> Minute {
        DPI / self.xnodp
    }

    /// Mean anomaly, argument of perigee and node advanced by the secular gravity rates,
    /// with the quadratic drag term on the node.
    pub(crate) fn secular(&self, tsince: Minute) -> (f64, f64, f64) {
        let xmdf = self.mean_anomaly + self.xmdot * tsince;
        let omgadf = self.argument_of_perigee + self.omgdot * tsince;
        let xnode = self.right_ascension
            + self.xnodot * tsince
            + self.xnodcf * tsince * tsince;
        (xmdf, omgadf, xnode)
    }
}

#[derive(Debug, Clone)]
enum Model {
    NearEarth(NearEarth),
    DeepSpace(Box<DeepSpace>),
}

/// Propagation state derived from an element set.
///
/// Built once per element set and immutable afterwards. Replacing the element set of a
/// satellite means building a new `Propagator`.
#[derive(Debug, Clone)]
pub struct Propagator {
    catalog_number: CatalogNumber,
    epoch: Epoch,
    elements: MeanElements,
    model: Model,
}

impl Propagator {
    /// Derive the propagation state of an element set.
    ///
    /// Arguments
    /// ---------
    /// * `tle`: a validated element set
    ///
    /// Return
    /// ------
    /// * the propagator, using the deep-space model when the period recovered from the
    ///   mean motion is at least 225 minutes
    pub fn new(tle: &OrbitalElementSet) -> Self {
        let elements = MeanElements::new(tle);
        let deep = elements.period() >= DEEP_SPACE_PERIOD;
        trace!(
            catalog_number = tle.catalog_number(),
            period = elements.period(),
            deep_space = deep,
            "propagator initialized"
        );

        let model = if deep {
            Model::DeepSpace(Box::new(DeepSpace::new(&elements, &tle.epoch())))
        } else {
            Model::NearEarth(NearEarth::new(&elements))
        };

        Propagator {
            catalog_number: tle.catalog_number(),
            epoch: tle.epoch(),
            elements,
            model,
        }
    }

    pub fn catalog_number(&self) -> CatalogNumber {
        self.catalog_number
    }

    /// Epoch of the element set the propagator was built from.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// True when the deep-space model (SDP4) is used.
    pub fn is_deep_space(&self) -> bool {
        matches!(self.model, Model::DeepSpace(_))
    }

    /// Position and velocity at an absolute instant.
    ///
    /// Arguments
    /// ---------
    /// * `epoch`: the instant, before or after the element epoch
    ///
    /// Return
    /// ------
    /// * the inertial state vector, or the reason why no position exists at this instant
    ///
    /// See also
    /// --------
    /// * [`Propagator::propagate_minutes`]
    pub fn propagate(&self, epoch: &Epoch) -> Result<StateVector, PropagationError> {
        let tsince = minutes_between(&self.epoch, epoch);
        self.state_at(*epoch, tsince)
    }

    /// Position and velocity `tsince` minutes after the element epoch.
    ///
    /// A non-finite `tsince` has no instant and is rejected as `InvalidGeometry`.
    pub fn propagate_minutes(&self, tsince: Minute) -> Result<StateVector, PropagationError> {
        if !tsince.is_finite() {
            return Err(PropagationError::InvalidGeometry {
                quantity: "minutes since epoch",
                value: tsince,
            });
        }
        self.state_at(self.epoch + Unit::Minute * tsince, tsince)
    }

    fn state_at(&self, epoch: Epoch, tsince: Minute) -> Result<StateVector, PropagationError> {
        let mean: MeanState = match &self.model {
            Model::NearEarth(model) => model.mean_state(&self.elements, tsince)?,
            Model::DeepSpace(model) => model.mean_state(&self.elements, tsince)?,
        };
        let (position, velocity) = osculating_state(&self.elements, &mean)?;

        Ok(StateVector {
            epoch,
            position: position * XKMPER,
            velocity: velocity * (XKMPER / 60.0),
        })
    }
}

/// Reject the mean state when the eccentricity left its domain or the orbit collapsed.
pub(crate) fn check_mean_state(
    semi_major_axis: f64,
    eccentricity: f64,
) -> Result<(), PropagationError> {
    if !(-0.001..1.0).contains(&eccentricity) {
        return Err(PropagationError::EccentricityDiverged { eccentricity });
    }
    if !semi_major_axis.is_finite() {
        return Err(PropagationError::InvalidGeometry {
            quantity: "semi-major axis",
            value: semi_major_axis,
        });
    }
    if semi_major_axis < 0.95 {
        return Err(PropagationError::Decayed {
            radius_km: semi_major_axis * XKMPER,
        });
    }
    Ok(())
}
