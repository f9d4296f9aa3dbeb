//! SDP4 deep-space model.
//!
//! On top of the secular gravity and drag terms, orbits with a period of 225 minutes or
//! more receive:
//!
//! * the secular and long-period perturbations of the sun and the moon, each computed
//!   by [`ThirdBody`] from the orientation of the perturbing body at epoch,
//! * the geopotential resonance terms of synchronous (24 h) orbits and of eccentric
//!   12 h orbits (Molniya type), integrated numerically in mean motion and mean
//!   longitude by [`Resonance`].
//!
//! The resonance integrator always restarts from the element epoch, with a fixed step of
//! 720 minutes. The cost of a call is therefore proportional to `|tsince| / 720`, and no
//! state survives between calls.
use hifitime::Epoch;

use super::{check_mean_state, osculating::MeanState, MeanElements, PropagationError};
use crate::{
    constants::{Minute, DPI, EARTH_ROTATION_RATE, XKE},
    time::julian_date,
};
use std::f64::consts::PI;

// Solar perturbation constants
const ZNS: f64 = 1.19459e-5;
const C1SS: f64 = 2.9864797e-6;
const ZES: f64 = 1.675e-2;
const ZCOSIS: f64 = 9.1744867e-1;
const ZSINIS: f64 = 3.9785416e-1;
const ZSINGS: f64 = -9.8088458e-1;
const ZCOSGS: f64 = 1.945905e-1;

// Lunar perturbation constants
const ZNL: f64 = 1.5835218e-4;
const C1L: f64 = 4.7968065e-7;
const ZEL: f64 = 5.490e-2;

// Geopotential resonance
const Q22: f64 = 1.7891679e-6;
const Q31: f64 = 2.1460748e-6;
const Q33: f64 = 2.2123015e-7;
const G22: f64 = 5.7686396;
const G32: f64 = 9.5240898e-1;
const G44: f64 = 1.8014998;
const G52: f64 = 1.0508330;
const G54: f64 = 4.4108898;
const ROOT22: f64 = 1.7891679e-6;
const ROOT32: f64 = 3.7393792e-7;
const ROOT44: f64 = 7.3636953e-9;
const ROOT52: f64 = 1.1428639e-7;
const ROOT54: f64 = 2.1765803e-9;
const FASX2: f64 = 0.13130908;
const FASX4: f64 = 2.8843198;
const FASX6: f64 = 0.37448087;

/// Integration step of the resonance terms, minutes
const STEP: f64 = 720.0;
/// STEP² / 2
const STEP2: f64 = 259_200.0;

/// Inclination below which (or above π minus which) the node rate is not perturbed.
const SMALL_INCLINATION: f64 = 5.2359877e-2;
/// Inclination below which the Lyddane form of the periodics is used.
const LYDDANE_INCLINATION: f64 = 0.2;

/// Greenwich sidereal angle at epoch and days elapsed since 1950 January 0.0.
fn sidereal_angle_1950(epoch: &Epoch) -> (f64, f64) {
    let ds50 = julian_date(epoch) - 2_433_281.5;
    ((6.300_388_098_7 * ds50 + 1.729_444_94).rem_euclid(DPI), ds50)
}

/// Orientation of the orbit of a perturbing body relative to the equator.
struct BodyOrientation {
    zcosg: f64,
    zsing: f64,
    zcosi: f64,
    zsini: f64,
    zcosh: f64,
    zsinh: f64,
}

/// Lunar-solar periodic contributions at an instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Periodics {
    e: f64,
    i: f64,
    l: f64,
    gh: f64,
    h: f64,
}

impl std::ops::Add for Periodics {
    type Output = Periodics;

    fn add(self, rhs: Periodics) -> Periodics {
        Periodics {
            e: self.e + rhs.e,
            i: self.i + rhs.i,
            l: self.l + rhs.l,
            gh: self.gh + rhs.gh,
            h: self.h + rhs.h,
        }
    }
}

/// Secular rates and long-period coefficients induced by the sun or the moon.
#[derive(Debug, Clone, PartialEq)]
struct ThirdBody {
    // secular rates (eccentricity, inclination, mean anomaly, perigee, node)
    se: f64,
    si: f64,
    sl: f64,
    sgh: f64,
    sh: f64,
    // long-period coefficients
    e2: f64,
    e3: f64,
    i2: f64,
    i3: f64,
    l2: f64,
    l3: f64,
    l4: f64,
    gh2: f64,
    gh3: f64,
    gh4: f64,
    h2: f64,
    h3: f64,
    /// mean anomaly of the body at epoch
    zmo: f64,
    /// mean motion of the body, rad/min
    zn: f64,
    /// eccentricity of the body orbit
    ze: f64,
}

impl ThirdBody {
    fn new(el: &MeanElements, body: &BodyOrientation, cc: f64, zn: f64, ze: f64, zmo: f64) -> Self {
        let (sing, cosg) = el.argument_of_perigee.sin_cos();
        let (cosio, sinio, eosq) = (el.cosio, el.sinio, el.eosq);

        let a1 = body.zcosg * body.zcosh + body.zsing * body.zcosi * body.zsinh;
        let a3 = -body.zsing * body.zcosh + body.zcosg * body.zcosi * body.zsinh;
        let a7 = -body.zcosg * body.zsinh + body.zsing * body.zcosi * body.zcosh;
        let a8 = body.zsing * body.zsini;
        let a9 = body.zsing * body.zsinh + body.zcosg * body.zcosi * body.zcosh;
        let a10 = body.zcosg * body.zsini;
        let a2 = cosio * a7 + sinio * a8;
        let a4 = cosio * a9 + sinio * a10;
        let a5 = -sinio * a7 + cosio * a8;
        let a6 = -sinio * a9 + cosio * a10;

        let x1 = a1 * cosg + a2 * sing;
        let x2 = a3 * cosg + a4 * sing;
        let x3 = -a1 * sing + a2 * cosg;
        let x4 = -a3 * sing + a4 * cosg;
        let x5 = a5 * sing;
        let x6 = a6 * sing;
        let x7 = a5 * cosg;
        let x8 = a6 * cosg;

        let z31 = 12.0 * x1 * x1 - 3.0 * x3 * x3;
        let z32 = 24.0 * x1 * x2 - 6.0 * x3 * x4;
        let z33 = 12.0 * x2 * x2 - 3.0 * x4 * x4;
        let z1 = 3.0 * (a1 * a1 + a2 * a2) + z31 * eosq;
        let z2 = 6.0 * (a1 * a3 + a2 * a4) + z32 * eosq;
        let z3 = 3.0 * (a3 * a3 + a4 * a4) + z33 * eosq;
        let z11 = -6.0 * a1 * a5 + eosq * (-24.0 * x1 * x7 - 6.0 * x3 * x5);
        let z12 = -6.0 * (a1 * a6 + a3 * a5)
            + eosq * (-24.0 * (x2 * x7 + x1 * x8) - 6.0 * (x3 * x6 + x4 * x5));
        let z13 = -6.0 * a3 * a6 + eosq * (-24.0 * x2 * x8 - 6.0 * x4 * x6);
        let z21 = 6.0 * a2 * a5 + eosq * (24.0 * x1 * x5 - 6.0 * x3 * x7);
        let z22 = 6.0 * (a4 * a5 + a2 * a6)
            + eosq * (24.0 * (x2 * x5 + x1 * x6) - 6.0 * (x4 * x7 + x3 * x8));
        let z23 = 6.0 * a4 * a6 + eosq * (24.0 * x2 * x6 - 6.0 * x4 * x8);
        let z1 = 2.0 * z1 + el.betao2 * z31;
        let z2 = 2.0 * z2 + el.betao2 * z32;
        let z3 = 2.0 * z3 + el.betao2 * z33;

        let s3 = cc / el.xnodp;
        let s2 = -0.5 * s3 / el.betao;
        let s4 = s3 * el.betao;
        let s1 = -15.0 * el.eccentricity * s4;
        let s5 = x1 * x3 + x2 * x4;
        let s6 = x2 * x3 + x1 * x4;
        let s7 = x2 * x4 - x1 * x3;

        let sh = if el.inclination < SMALL_INCLINATION || el.inclination > PI - SMALL_INCLINATION
        {
            0.0
        } else {
            -zn * s2 * (z21 + z23)
        };

        ThirdBody {
            se: s1 * zn * s5,
            si: s2 * zn * (z11 + z13),
            sl: -zn * s3 * (z1 + z3 - 14.0 - 6.0 * eosq),
            sgh: s4 * zn * (z31 + z33 - 6.0),
            sh,
            e2: 2.0 * s1 * s6,
            e3: 2.0 * s1 * s7,
            i2: 2.0 * s2 * z12,
            i3: 2.0 * s2 * (z13 - z11),
            l2: -2.0 * s3 * z2,
            l3: -2.0 * s3 * (z3 - z1),
            l4: -2.0 * s3 * (-21.0 - 9.0 * eosq) * ze,
            gh2: 2.0 * s4 * z32,
            gh3: 2.0 * s4 * (z33 - z31),
            gh4: -18.0 * s4 * ze,
            h2: -2.0 * s2 * z22,
            h3: -2.0 * s2 * (z23 - z21),
            zmo,
            zn,
            ze,
        }
    }

    fn periodics(&self, tsince: Minute) -> Periodics {
        let zm = self.zmo + self.zn * tsince;
        let zf = zm + 2.0 * self.ze * zm.sin();
        let (sinzf, coszf) = zf.sin_cos();
        let f2 = 0.5 * sinzf * sinzf - 0.25;
        let f3 = -0.5 * sinzf * coszf;

        Periodics {
            e: self.e2 * f2 + self.e3 * f3,
            i: self.i2 * f2 + self.i3 * f3,
            l: self.l2 * f2 + self.l3 * f3 + self.l4 * sinzf,
            gh: self.gh2 * f2 + self.gh3 * f3 + self.gh4 * sinzf,
            h: self.h2 * f2 + self.h3 * f3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ResonanceTerms {
    /// One revolution per sidereal day
    Synchronous { del1: f64, del2: f64, del3: f64 },
    /// Two revolutions per sidereal day, eccentricity at least 0.5
    HalfDay {
        d2201: f64,
        d2211: f64,
        d3210: f64,
        d3222: f64,
        d4410: f64,
        d4422: f64,
        d5220: f64,
        d5232: f64,
        d5421: f64,
        d5433: f64,
    },
}

/// Geopotential resonance integrator state at epoch.
#[derive(Debug, Clone, PartialEq)]
struct Resonance {
    terms: ResonanceTerms,
    /// mean longitude at epoch
    xlamo: f64,
    xfact: f64,
}

impl Resonance {
    fn new(el: &MeanElements, gsto: f64, ssl: f64, ssg: f64, ssh: f64) -> Option<Self> {
        let xnq = el.xnodp;
        let eq = el.eccentricity;
        let (cosio, sinio, theta2, eosq) = (el.cosio, el.sinio, el.theta2, el.eosq);
        let aqnv = 1.0 / el.aodp;

        if xnq > 0.0034906585 && xnq < 0.0052359877 {
            let g200 = 1.0 + eosq * (-2.5 + 0.8125 * eosq);
            let g310 = 1.0 + 2.0 * eosq;
            let g300 = 1.0 + eosq * (-6.0 + 6.60937 * eosq);
            let f220 = 0.75 * (1.0 + cosio) * (1.0 + cosio);
            let f311 = 0.9375 * sinio * sinio * (1.0 + 3.0 * cosio) - 0.75 * (1.0 + cosio);
            let f330 = 1.875 * (1.0 + cosio).powi(3);
            let del1 = 3.0 * xnq * xnq * aqnv * aqnv;

            let xpidot = el.omgdot + el.xnodot;
            let bfact = el.xmdot + xpidot - EARTH_ROTATION_RATE + ssl + ssg + ssh;
            return Some(Resonance {
                terms: ResonanceTerms::Synchronous {
                    del1: del1 * f311 * g310 * Q31 * aqnv,
                    del2: 2.0 * del1 * f220 * g200 * Q22,
                    del3: 3.0 * del1 * f330 * g300 * Q33 * aqnv,
                },
                xlamo: el.mean_anomaly + el.right_ascension + el.argument_of_perigee - gsto,
                xfact: bfact - xnq,
            });
        }

        if !(0.00826..=0.00924).contains(&xnq) || eq < 0.5 {
            return None;
        }

        let eoc = eq * eosq;
        let g201 = -0.306 - (eq - 0.64) * 0.440;
        let (g211, g310, g322, g410, g422, g520) = if eq <= 0.65 {
            (
                3.616 - 13.247 * eq + 16.290 * eosq,
                -19.302 + 117.390 * eq - 228.419 * eosq + 156.591 * eoc,
                -18.9068 + 109.7927 * eq - 214.6334 * eosq + 146.5816 * eoc,
                -41.122 + 242.694 * eq - 471.094 * eosq + 313.953 * eoc,
                -146.407 + 841.880 * eq - 1629.014 * eosq + 1083.435 * eoc,
                -532.114 + 3017.977 * eq - 5740.0 * eosq + 3708.276 * eoc,
            )
        } else {
            let g520 = if eq <= 0.715 {
                1464.74 - 4664.75 * eq + 3763.64 * eosq
            } else {
                -5149.66 + 29936.92 * eq - 54087.36 * eosq + 31324.56 * eoc
            };
            (
                -72.099 + 331.819 * eq - 508.738 * eosq + 266.724 * eoc,
                -346.844 + 1582.851 * eq - 2415.925 * eosq + 1246.113 * eoc,
                -342.585 + 1554.908 * eq - 2366.899 * eosq + 1215.972 * eoc,
                -1052.797 + 4758.686 * eq - 7193.992 * eosq + 3651.957 * eoc,
                -3581.69 + 16178.11 * eq - 24462.77 * eosq + 12422.52 * eoc,
                g520,
            )
        };
        let (g533, g521, g532) = if eq < 0.7 {
            (
                -919.2277 + 4988.61 * eq - 9064.77 * eosq + 5542.21 * eoc,
                -822.71072 + 4568.6173 * eq - 8491.4146 * eosq + 5337.524 * eoc,
                -853.666 + 4690.25 * eq - 8624.77 * eosq + 5341.4 * eoc,
            )
        } else {
            (
                -37995.78 + 161616.52 * eq - 229838.2 * eosq + 109377.94 * eoc,
                -51752.104 + 218913.95 * eq - 309468.16 * eosq + 146349.42 * eoc,
                -40023.88 + 170470.89 * eq - 242699.48 * eosq + 115605.82 * eoc,
            )
        };

        let sini2 = sinio * sinio;
        let f220 = 0.75 * (1.0 + 2.0 * cosio + theta2);
        let f221 = 1.5 * sini2;
        let f321 = 1.875 * sinio * (1.0 - 2.0 * cosio - 3.0 * theta2);
        let f322 = -1.875 * sinio * (1.0 + 2.0 * cosio - 3.0 * theta2);
        let f441 = 35.0 * sini2 * f220;
        let f442 = 39.3750 * sini2 * sini2;
        let f522 = 9.84375
            * sinio
            * (sini2 * (1.0 - 2.0 * cosio - 5.0 * theta2)
                + 0.33333333 * (-2.0 + 4.0 * cosio + 6.0 * theta2));
        let f523 = sinio
            * (4.92187512 * sini2 * (-2.0 - 4.0 * cosio + 10.0 * theta2)
                + 6.56250012 * (1.0 + 2.0 * cosio - 3.0 * theta2));
        let f542 = 29.53125
            * sinio
            * (2.0 - 8.0 * cosio + theta2 * (-12.0 + 8.0 * cosio + 10.0 * theta2));
        let f543 = 29.53125
            * sinio
            * (-2.0 - 8.0 * cosio + theta2 * (12.0 + 8.0 * cosio - 10.0 * theta2));

        let temp1 = 3.0 * xnq * xnq * aqnv * aqnv;
        let temp = temp1 * ROOT22;
        let (d2201, d2211) = (temp * f220 * g201, temp * f221 * g211);
        let temp1 = temp1 * aqnv;
        let temp = temp1 * ROOT32;
        let (d3210, d3222) = (temp * f321 * g310, temp * f322 * g322);
        let temp1 = temp1 * aqnv;
        let temp = 2.0 * temp1 * ROOT44;
        let (d4410, d4422) = (temp * f441 * g410, temp * f442 * g422);
        let temp1 = temp1 * aqnv;
        let temp = temp1 * ROOT52;
        let (d5220, d5232) = (temp * f522 * g520, temp * f523 * g532);
        let temp = 2.0 * temp1 * ROOT54;
        let (d5421, d5433) = (temp * f542 * g521, temp * f543 * g533);

        let bfact = el.xmdot + 2.0 * el.xnodot - 2.0 * EARTH_ROTATION_RATE + ssl + 2.0 * ssh;
        Some(Resonance {
            terms: ResonanceTerms::HalfDay {
                d2201,
                d2211,
                d3210,
                d3222,
                d4410,
                d4422,
                d5220,
                d5232,
                d5421,
                d5433,
            },
            xlamo: el.mean_anomaly + 2.0 * el.right_ascension - 2.0 * gsto,
            xfact: bfact - xnq,
        })
    }

    /// First and second derivatives of the mean motion, and the mean longitude rate.
    fn derivatives(&self, el: &MeanElements, xli: f64, xni: f64, atime: f64) -> (f64, f64, f64) {
        let (xndot, xnddt) = match self.terms {
            ResonanceTerms::Synchronous { del1, del2, del3 } => (
                del1 * (xli - FASX2).sin()
                    + del2 * (2.0 * (xli - FASX4)).sin()
                    + del3 * (3.0 * (xli - FASX6)).sin(),
                del1 * (xli - FASX2).cos()
                    + 2.0 * del2 * (2.0 * (xli - FASX4)).cos()
                    + 3.0 * del3 * (3.0 * (xli - FASX6)).cos(),
            ),
            ResonanceTerms::HalfDay {
                d2201,
                d2211,
                d3210,
                d3222,
                d4410,
                d4422,
                d5220,
                d5232,
                d5421,
                d5433,
            } => {
                let xomi = el.argument_of_perigee + el.omgdot * atime;
                let x2omi = 2.0 * xomi;
                let x2li = 2.0 * xli;
                let xndot = d2201 * (x2omi + xli - G22).sin()
                    + d2211 * (xli - G22).sin()
                    + d3210 * (xomi + xli - G32).sin()
                    + d3222 * (-xomi + xli - G32).sin()
                    + d4410 * (x2omi + x2li - G44).sin()
                    + d4422 * (x2li - G44).sin()
                    + d5220 * (xomi + xli - G52).sin()
                    + d5232 * (-xomi + xli - G52).sin()
                    + d5421 * (xomi + x2li - G54).sin()
                    + d5433 * (-xomi + x2li - G54).sin();
                let xnddt = d2201 * (x2omi + xli - G22).cos()
                    + d2211 * (xli - G22).cos()
                    + d3210 * (xomi + xli - G32).cos()
                    + d3222 * (-xomi + xli - G32).cos()
                    + d5220 * (xomi + xli - G52).cos()
                    + d5232 * (-xomi + xli - G52).cos()
                    + 2.0
                        * (d4410 * (x2omi + x2li - G44).cos()
                            + d4422 * (x2li - G44).cos()
                            + d5421 * (xomi + x2li - G54).cos()
                            + d5433 * (-xomi + x2li - G54).cos());
                (xndot, xnddt)
            }
        };
        let xldot = xni + self.xfact;
        (xndot, xnddt * xldot, xldot)
    }

    /// Integrate from the epoch to `tsince`.
    ///
    /// Return
    /// ------
    /// * the resonant mean motion (rad/min) and mean longitude at `tsince`
    fn integrate(&self, el: &MeanElements, tsince: Minute) -> (f64, f64) {
        let delt = if tsince >= 0.0 { STEP } else { -STEP };
        let mut atime = 0.0;
        let mut xli = self.xlamo;
        let mut xni = el.xnodp;

        loop {
            let (xndot, xnddt, xldot) = self.derivatives(el, xli, xni, atime);
            if (tsince - atime).abs() < STEP {
                let ft = tsince - atime;
                let xn = xni + xndot * ft + xnddt * ft * ft * 0.5;
                let xl = xli + xldot * ft + xndot * ft * ft * 0.5;
                return (xn, xl);
            }
            xli += xldot * delt + xndot * STEP2;
            xni += xndot * delt + xnddt * STEP2;
            atime += delt;
        }
    }
}

/// Deep-space perturbation state, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DeepSpace {
    /// Greenwich sidereal angle at epoch
    gsto: f64,
    sun: ThirdBody,
    moon: ThirdBody,
    sse: f64,
    ssi: f64,
    ssl: f64,
    ssg: f64,
    ssh: f64,
    resonance: Option<Resonance>,
}

impl DeepSpace {
    pub(crate) fn new(el: &MeanElements, epoch: &Epoch) -> Self {
        let (gsto, ds50) = sidereal_angle_1950(epoch);
        let (sinq, cosq) = el.right_ascension.sin_cos();

        // Lunar orbit orientation, from days since 1900 January 0.5
        let day = ds50 + 18_261.5;
        let xnodce = 4.5236020 - 9.2422029e-4 * day;
        let (stem, ctem) = xnodce.sin_cos();
        let zcosil = 0.91375164 - 0.03568096 * ctem;
        let zsinil = (1.0 - zcosil * zcosil).sqrt();
        let zsinhl = 0.089683511 * stem / zsinil;
        let zcoshl = (1.0 - zsinhl * zsinhl).sqrt();
        let c = 4.7199672 + 0.22997150 * day;
        let gam = 5.8351514 + 0.0019443680 * day;
        let zmol = (c - gam).rem_euclid(DPI);
        let zx = 0.39785416 * stem / zsinil;
        let zy = zcoshl * ctem + 0.91744867 * zsinhl * stem;
        let zx = gam + zx.atan2(zy) - xnodce;
        let (zsingl, zcosgl) = zx.sin_cos();
        let zmos = (6.2565837 + 0.017201977 * day).rem_euclid(DPI);

        let sun = ThirdBody::new(
            el,
            &BodyOrientation {
                zcosg: ZCOSGS,
                zsing: ZSINGS,
                zcosi: ZCOSIS,
                zsini: ZSINIS,
                zcosh: cosq,
                zsinh: sinq,
            },
            C1SS,
            ZNS,
            ZES,
            zmos,
        );
        let moon = ThirdBody::new(
            el,
            &BodyOrientation {
                zcosg: zcosgl,
                zsing: zsingl,
                zcosi: zcosil,
                zsini: zsinil,
                zcosh: zcoshl * cosq + zsinhl * sinq,
                zsinh: sinq * zcoshl - cosq * zsinhl,
            },
            C1L,
            ZNL,
            ZEL,
            zmol,
        );

        let sh = sun.sh + moon.sh;
        let ssh = if el.sinio != 0.0 { sh / el.sinio } else { 0.0 };
        let ssl = sun.sl + moon.sl;
        let ssg = sun.sgh + moon.sgh - el.cosio * ssh;

        DeepSpace {
            gsto,
            sse: sun.se + moon.se,
            ssi: sun.si + moon.si,
            ssl,
            ssg,
            ssh,
            resonance: Resonance::new(el, gsto, ssl, ssg, ssh),
            sun,
            moon,
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
        let tempa = 1.0 - el.c1 * tsince;
        let tempe = el.bstar * el.c4 * tsince;
        let templ = el.t2cof * tsq;

        // Lunar-solar secular effects
        let mut xll = xmdf + self.ssl * tsince;
        let mut omgadf = omgadf + self.ssg * tsince;
        let mut xnode = xnode + self.ssh * tsince;
        let mut em = el.eccentricity + self.sse * tsince;
        let mut xinc = el.inclination + self.ssi * tsince;
        let mut xn = el.xnodp;

        if let Some(resonance) = &self.resonance {
            let (n, xl) = resonance.integrate(el, tsince);
            let theta = -xnode + self.gsto + tsince * EARTH_ROTATION_RATE;
            xn = n;
            xll = match resonance.terms {
                ResonanceTerms::Synchronous { .. } => xl - omgadf + theta,
                ResonanceTerms::HalfDay { .. } => xl + 2.0 * theta,
            };
        }

        if !(xn.is_finite() && xn > 0.0) {
            return Err(PropagationError::InvalidGeometry {
                quantity: "mean motion",
                value: xn,
            });
        }
        let a = (XKE / xn).powf(2.0 / 3.0) * tempa * tempa;
        em -= tempe;
        check_mean_state(a, em)?;
        em = em.max(1e-6);
        let mut xmam = xll + el.xnodp * templ;

        // Lunar-solar periodics
        let p = self.sun.periodics(tsince) + self.moon.periodics(tsince);
        xinc += p.i;
        em += p.e;
        let (sinis, cosis) = xinc.sin_cos();

        if el.inclination >= LYDDANE_INCLINATION {
            let ph = p.h / sinis;
            omgadf += p.gh - cosis * ph;
            xnode += ph;
            xmam += p.l;
        } else {
            // Lyddane modification for low inclinations
            let (sinok, cosok) = xnode.sin_cos();
            let alfdp = sinis * sinok + p.h * cosok + p.i * cosis * sinok;
            let betdp = sinis * cosok - p.h * sinok + p.i * cosis * cosok;
            xnode = xnode.rem_euclid(DPI);
            let xls = xmam + omgadf + cosis * xnode + p.l + p.gh - p.i * xnode * sinis;
            let xnoh = xnode;
            xnode = alfdp.atan2(betdp).rem_euclid(DPI);
            // keep the node on the same branch as before the correction
            if (xnoh - xnode).abs() > PI {
                if xnode < xnoh {
                    xnode += DPI;
                } else {
                    xnode -= DPI;
                }
            }
            xmam += p.l;
            omgadf = xls - xmam - cosis * xnode;
        }

        if !(0.0..=1.0).contains(&em) {
            return Err(PropagationError::EccentricityDiverged { eccentricity: em });
        }
        if xinc < 0.0 {
            xinc = -xinc;
            xnode += PI;
            omgadf -= PI;
        }

        Ok(MeanState {
            semi_major_axis: a,
            eccentricity: em,
            inclination: xinc,
            argument_of_perigee: omgadf,
            right_ascension: xnode,
            mean_longitude: xmam + omgadf + xnode,
        })
    }
}

#[cfg(test)]
mod deep_space_test {
    use super::*;
    use crate::{propagator::Propagator, tle::OrbitalElementSet};
    use approx::assert_abs_diff_eq;

    fn molniya() -> OrbitalElementSet {
        OrbitalElementSet::from_lines(
            None,
            "1 08195U 75081A   06176.33215444  .00000099  00000-0  11873-3 0   813",
            "2 08195  64.1586 279.0717 6877146 264.7651  20.2257  2.00491383225656",
        )
        .unwrap()
    }

    fn geostationary() -> OrbitalElementSet {
        OrbitalElementSet::from_lines(
            None,
            "1 28626U 05008A   24100.50000000 -.00000100  00000-0  00000-0 0  9991",
            "2 28626   0.0150 250.0000 0002000 120.0000 180.0000  1.00271000 70001",
        )
        .unwrap()
    }

    #[test]
    fn test_resonance_selection() {
        let tle = molniya();
        let el = MeanElements::new(&tle);
        let deep = DeepSpace::new(&el, &tle.epoch());
        assert!(matches!(
            deep.resonance.as_ref().map(|r| &r.terms),
            Some(ResonanceTerms::HalfDay { .. })
        ));

        let tle = geostationary();
        let el = MeanElements::new(&tle);
        let deep = DeepSpace::new(&el, &tle.epoch());
        assert!(matches!(
            deep.resonance.as_ref().map(|r| &r.terms),
            Some(ResonanceTerms::Synchronous { .. })
        ));
        // equatorial orbit: no node rate from the third bodies
        assert_eq!(deep.ssh, 0.0);
    }

    #[test]
    fn test_molniya_epoch_radius() {
        let propagator = Propagator::new(&molniya());
        let state = propagator.propagate_minutes(0.0).unwrap();
        assert_abs_diff_eq!(state.position.x, 2349.89, epsilon = 1.0);
        assert_abs_diff_eq!(state.position.y, -14785.94, epsilon = 1.0);
        assert_abs_diff_eq!(state.radius(), 14971.5, epsilon = 1.0);
    }

    #[test]
    fn test_geostationary_radius_is_stable() {
        let propagator = Propagator::new(&geostationary());
        for tsince in [-1440.0, 0.0, 1000.0, 5000.0, 20000.0] {
            let state = propagator.propagate_minutes(tsince).unwrap();
            assert_abs_diff_eq!(state.radius(), 42165.0, epsilon = 25.0);
        }
    }

    #[test]
    fn test_resonance_restart_is_deterministic() {
        let propagator = Propagator::new(&molniya());
        let later = propagator.propagate_minutes(5000.0).unwrap();
        let _ = propagator.propagate_minutes(-3000.0).unwrap();
        let again = propagator.propagate_minutes(5000.0).unwrap();
        assert_eq!(later, again);
    }

    #[test]
    fn test_velocity_is_position_derivative() {
        let propagator = Propagator::new(&molniya());
        let h = 0.01;
        for tsince in [0.0, 1000.0, 20000.0] {
            let state = propagator.propagate_minutes(tsince).unwrap();
            let after = propagator.propagate_minutes(tsince + h).unwrap();
            let before = propagator.propagate_minutes(tsince - h).unwrap();
            let numeric = (after.position - before.position) / (2.0 * h * 60.0);
            assert!((numeric - state.velocity).amax() < 2e-3);
        }
    }
}
