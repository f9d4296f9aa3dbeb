//! Long and short periodic corrections shared by SGP4 and SDP4, from the perturbed mean
//! elements to the osculating position and velocity.
use nalgebra::Vector3;

use super::{MeanElements, PropagationError, CK2};
use crate::constants::{DPI, XKE};

/// Mean elements at the requested instant, once secular, drag and (for deep-space
/// orbits) lunar-solar effects are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MeanState {
    /// Semi-major axis, earth radii
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub argument_of_perigee: f64,
    pub right_ascension: f64,
    /// Mean longitude: mean anomaly + argument of perigee + node
    pub mean_longitude: f64,
}

/// Solve Kepler's equation for the eccentric longitude `E + ω`.
///
/// Newton iteration on `U = E + ω - axn sin(E + ω) + ayn cos(E + ω)`, with the step
/// clamped to 0.95 rad so that highly eccentric orbits cannot overshoot.
fn solve_kepler(capu: f64, axn: f64, ayn: f64) -> f64 {
    const MAX_ITER: usize = 10;
    const TOL: f64 = 1e-12;

    let mut epw = capu;
    for _ in 0..MAX_ITER {
        let (sinepw, cosepw) = epw.sin_cos();
        let mut step = (capu - ayn * cosepw + axn * sinepw - epw)
            / (1.0 - cosepw * axn - sinepw * ayn);
        if step.abs() >= 0.95 {
            step = 0.95_f64.copysign(step);
        }
        epw += step;
        if step.abs() < TOL {
            break;
        }
    }
    epw
}

/// Osculating position (earth radii) and velocity (earth radii per minute).
///
/// Arguments
/// ---------
/// * `elements`: constants derived from the element set
/// * `mean`: perturbed mean elements at the instant
///
/// Return
/// ------
/// * the position and velocity in the TEME frame, or
///   `InvalidGeometry` when the semi-latus rectum becomes negative and `Decayed` when
///   the osculating radius falls below one earth radius
pub(crate) fn osculating_state(
    elements: &MeanElements,
    mean: &MeanState,
) -> Result<(Vector3<f64>, Vector3<f64>), PropagationError> {
    let a = mean.semi_major_axis;
    let e = mean.eccentricity;
    let omega = mean.argument_of_perigee;
    let xnode = mean.right_ascension;

    let xn = XKE / a.powf(1.5);
    if !(xn.is_finite() && xn > 0.0) {
        return Err(PropagationError::InvalidGeometry {
            quantity: "mean motion",
            value: xn,
        });
    }

    // Long period periodics
    let beta2 = 1.0 - e * e;
    let (sin_omega, cos_omega) = omega.sin_cos();
    let axn = e * cos_omega;
    let temp = 1.0 / (a * beta2);
    let xll = temp * elements.xlcof * axn;
    let aynl = temp * elements.aycof;
    let xlt = mean.mean_longitude + xll;
    let ayn = e * sin_omega + aynl;

    let capu = (xlt - xnode).rem_euclid(DPI);
    let epw = solve_kepler(capu, axn, ayn);
    let (sinepw, cosepw) = epw.sin_cos();

    // Short period preliminary quantities
    let ecose = axn * cosepw + ayn * sinepw;
    let esine = axn * sinepw - ayn * cosepw;
    let elsq = axn * axn + ayn * ayn;
    let temp = 1.0 - elsq;
    let pl = a * temp;
    if pl < 0.0 {
        return Err(PropagationError::InvalidGeometry {
            quantity: "semi-latus rectum",
            value: pl,
        });
    }

    let r = a * (1.0 - ecose);
    let temp1 = 1.0 / r;
    let rdot = XKE * a.sqrt() * esine * temp1;
    let rfdot = XKE * pl.sqrt() * temp1;
    let temp2 = a * temp1;
    let betal = temp.sqrt();
    let temp3 = 1.0 / (1.0 + betal);
    let cosu = temp2 * (cosepw - axn + ayn * esine * temp3);
    let sinu = temp2 * (sinepw - ayn - axn * esine * temp3);
    let u = sinu.atan2(cosu);
    let sin2u = 2.0 * sinu * cosu;
    let cos2u = 2.0 * cosu * cosu - 1.0;
    let temp = 1.0 / pl;
    let temp1 = CK2 * temp;
    let temp2 = temp1 * temp;

    // Short periodics
    let rk = r * (1.0 - 1.5 * temp2 * betal * elements.x3thm1)
        + 0.5 * temp1 * elements.x1mth2 * cos2u;
    if !rk.is_finite() {
        return Err(PropagationError::InvalidGeometry {
            quantity: "radius",
            value: rk,
        });
    }
    if rk < 1.0 {
        return Err(PropagationError::Decayed {
            radius_km: rk * crate::constants::XKMPER,
        });
    }
    let uk = u - 0.25 * temp2 * elements.x7thm1 * sin2u;
    let xnodek = xnode + 1.5 * temp2 * elements.cosio * sin2u;
    let xinck =
        mean.inclination + 1.5 * temp2 * elements.cosio * elements.sinio * cos2u;
    let rdotk = rdot - xn * temp1 * elements.x1mth2 * sin2u;
    let rfdotk = rfdot + xn * temp1 * (elements.x1mth2 * cos2u + 1.5 * elements.x3thm1);

    // Orientation vectors
    let (sinuk, cosuk) = uk.sin_cos();
    let (sinik, cosik) = xinck.sin_cos();
    let (sinnok, cosnok) = xnodek.sin_cos();
    let xmx = -sinnok * cosik;
    let xmy = cosnok * cosik;
    let u_vec = Vector3::new(
        xmx * sinuk + cosnok * cosuk,
        xmy * sinuk + sinnok * cosuk,
        sinik * sinuk,
    );
    let v_vec = Vector3::new(
        xmx * cosuk - cosnok * sinuk,
        xmy * cosuk - sinnok * sinuk,
        sinik * cosuk,
    );

    Ok((rk * u_vec, rdotk * u_vec + rfdotk * v_vec))
}

#[cfg(test)]
mod osculating_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_solve_kepler_circular() {
        assert_abs_diff_eq!(solve_kepler(1.234, 0.0, 0.0), 1.234, epsilon = 1e-15);
    }

    #[test]
    fn test_solve_kepler_eccentric() {
        // perigee on the x axis: axn = e, ayn = 0 reduces to M = E - e sin E
        let e = 0.73;
        let m = 0.3;
        let big_e = solve_kepler(m, e, 0.0);
        assert_abs_diff_eq!(big_e - e * big_e.sin(), m, epsilon = 1e-10);
    }
}
