//! SGP4 near-earth model: secular gravity and atmospheric drag for orbits with a
//! period below 225 minutes.
use super::{check_mean_state, osculating::MeanState, MeanElements, PropagationError, A3OVK2};
use crate::constants::{Minute, XKMPER};

/// Drag coefficients of the full SGP4 model. Absent for the truncated model used when
/// the perigee is below 220 km.
#[derive(Debug, Clone, PartialEq)]
struct HigherOrderDrag {
    d2: f64,
    d3: f64,
    d4: f64,
    t3cof: f64,
    t4cof: f64,
    t5cof: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NearEarth {
    c5: f64,
    omgcof: f64,
    xmcof: f64,
    delmo: f64,
    sinmo: f64,
    higher_order: Option<HigherOrderDrag>,
}

impl NearEarth {
    pub(crate) fn new(el: &MeanElements) -> Self {
        let e = el.eccentricity;

        // The c3 and delta M terms are singular for circular orbits
        let (c3, xmcof) = if e > 1e-4 {
            (
                el.coef * el.tsi * A3OVK2 * el.xnodp * el.sinio / e,
                -2.0 / 3.0 * el.coef * el.bstar / el.eeta,
            )
        } else {
            (0.0, 0.0)
        };

        // Perigee below 220 km: linear variation in sqrt(a), quadratic in mean anomaly
        let truncated = el.aodp * (1.0 - e) < 220.0 / XKMPER + 1.0;
        let higher_order = (!truncated).then(|| {
            let c1 = el.c1;
            let c1sq = c1 * c1;
            let d2 = 4.0 * el.aodp * el.tsi * c1sq;
            let temp = d2 * el.tsi * c1 / 3.0;
            let d3 = (17.0 * el.aodp + el.s4) * temp;
            let d4 = 0.5 * temp * el.aodp * el.tsi * (221.0 * el.aodp + 31.0 * el.s4) * c1;
            HigherOrderDrag {
                d2,
                d3,
                d4,
                t3cof: d2 + 2.0 * c1sq,
                t4cof: 0.25 * (3.0 * d3 + c1 * (12.0 * d2 + 10.0 * c1sq)),
                t5cof: 0.2
                    * (3.0 * d4 + 12.0 * c1 * d3 + 6.0 * d2 * d2 + 15.0 * c1sq * (2.0 * d2 + c1sq)),
            }
        });

        NearEarth {
            c5: 2.0
                * el.coef1
                * el.aodp
                * el.betao2
                * (1.0 + 2.75 * (el.etasq + el.eeta) + el.eeta * el.etasq),
            omgcof: el.bstar * c3 * el.argument_of_perigee.cos(),
            xmcof,
            delmo: (1.0 + el.eta * el.mean_anomaly.cos()).powi(3),
            sinmo: el.mean_anomaly.sin(),
            higher_order,
        }
    }

    /// Mean elements `tsince` minutes after the epoch.
    pub(crate) fn mean_state(
        &self,
        el: &MeanElements,
        tsince: Minute,
    ) -> Result<MeanState, PropagationError> {
        let (xmdf, omgadf, xnode) = el.secular(tsince);
        let tsq = tsince * tsince;

        let mut omega = omgadf;
        let mut xmp = xmdf;
        let mut tempa = 1.0 - el.c1 * tsince;
        let mut tempe = el.bstar * el.c4 * tsince;
        let mut templ = el.t2cof * tsq;

        if let Some(drag) = &self.higher_order {
            let delomg = self.omgcof * tsince;
            let delm = self.xmcof * ((1.0 + el.eta * xmdf.cos()).powi(3) - self.delmo);
            let temp = delomg + delm;
            xmp = xmdf + temp;
            omega = omgadf - temp;
            let tcube = tsq * tsince;
            let tfour = tsince * tcube;
            tempa -= drag.d2 * tsq + drag.d3 * tcube + drag.d4 * tfour;
            tempe += el.bstar * self.c5 * (xmp.sin() - self.sinmo);
            templ += drag.t3cof * tcube + tfour * (drag.t4cof + tsince * drag.t5cof);
        }

        let a = el.aodp * tempa * tempa;
        let e = el.eccentricity - tempe;
        check_mean_state(a, e)?;

        Ok(MeanState {
            semi_major_axis: a,
            eccentricity: e.max(1e-6),
            inclination: el.inclination,
            argument_of_perigee: omega,
            right_ascension: xnode,
            mean_longitude: xmp + omega + xnode + el.xnodp * templ,
        })
    }
}

#[cfg(test)]
mod near_earth_test {
    use super::*;
    use crate::{propagator::Propagator, tle::OrbitalElementSet};
    use approx::assert_abs_diff_eq;

    fn tle_88888() -> OrbitalElementSet {
        OrbitalElementSet::from_lines(
            None,
            "1 88888U 88888A   80275.98708465  .00073094  13844-3  66816-4 0  5554",
            "2 88888  72.8435 115.9689 0086731  52.6988 110.5714 16.05824518   103",
        )
        .unwrap()
    }

    #[test]
    fn test_full_drag_model_above_220_km() {
        let tle = OrbitalElementSet::from_lines(
            None,
            "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753",
            "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667",
        )
        .unwrap();
        let el = MeanElements::new(&tle);
        assert_abs_diff_eq!(el.perigee, 651.33, epsilon = 0.01);
        assert!(NearEarth::new(&el).higher_order.is_some());
    }

    #[test]
    fn test_reference_case_below_220_km_uses_truncated_drag() {
        // perigee of the 88888 test case is about 198 km
        let el = MeanElements::new(&tle_88888());
        assert_abs_diff_eq!(el.perigee, 198.34, epsilon = 0.01);
        assert!(NearEarth::new(&el).higher_order.is_none());
    }

    #[test]
    fn test_truncated_drag_model_below_220_km() {
        // perigee around 190 km
        let tle = OrbitalElementSet::from_lines(
            None,
            "1 99999U 24001A   24001.50000000  .00010000  00000-0  10000-3 0  9999",
            "2 99999  51.6000  10.0000 0010000  90.0000 270.0000 16.30000000    10",
        )
        .unwrap();
        let el = MeanElements::new(&tle);
        assert!(el.perigee < 220.0 && el.perigee > 156.0);
        assert!(NearEarth::new(&el).higher_order.is_none());
        assert!(Propagator::new(&tle).propagate_minutes(60.0).is_ok());
    }

    #[test]
    fn test_circular_orbit_has_no_c3() {
        let tle = OrbitalElementSet::from_lines(
            None,
            "1 99998U 24001A   24001.50000000  .00000000  00000-0  10000-3 0  9997",
            "2 99998  10.0000  20.0000 0000500  30.0000  40.0000 15.00000000    18",
        )
        .unwrap();
        let model = NearEarth::new(&MeanElements::new(&tle));
        assert_eq!(model.omgcof, 0.0);
        assert_eq!(model.xmcof, 0.0);
    }

    #[test]
    fn test_secular_drag_lowers_semi_major_axis() {
        let el = MeanElements::new(&tle_88888());
        let model = NearEarth::new(&el);
        let start = model.mean_state(&el, 0.0).unwrap();
        let later = model.mean_state(&el, 1440.0).unwrap();
        assert_abs_diff_eq!(start.semi_major_axis, el.aodp, epsilon = 1e-12);
        assert!(later.semi_major_axis < start.semi_major_axis);
    }
}
