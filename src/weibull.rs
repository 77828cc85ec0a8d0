//! Two-parameter Weibull reliability model.
//!
//! Given shape beta > 0 and scale eta > 0:
//! - failure probability: F(t) = 1 - exp(-(t/eta)^beta)
//! - survival: R(t) = 1 - F(t)
//! - hazard rate: h(t) = (beta/eta) * (t/eta)^(beta-1)
//! - MTBF: eta * Gamma(1 + 1/beta)

use serde::{Deserialize, Serialize};
use statrs::function::gamma::gamma;

use crate::error::FatigueError;

/// Damage floor used when deriving a scale from a near-zero damage sum.
pub const MIN_DAMAGE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeibullParameters {
    /// Shape parameter beta
    pub shape: f64,
    /// Scale parameter eta [cycles]
    pub scale: f64,
}

impl WeibullParameters {
    pub fn new(shape: f64, scale: f64) -> Result<Self, FatigueError> {
        let params = Self { shape, scale };
        params.validate()?;
        Ok(params)
    }

    /// Scale taken as the life at which one damage unit accrues:
    /// `eta = reference_life / max(damage, MIN_DAMAGE)`.
    pub fn from_damage(shape: f64, damage: f64, reference_life: f64) -> Result<Self, FatigueError> {
        if !damage.is_finite() || damage < 0.0 {
            return Err(FatigueError::InvalidInput(damage));
        }
        if !reference_life.is_finite() || reference_life <= 0.0 {
            return Err(FatigueError::InvalidWeibull {
                field: "reference_life",
                value: reference_life,
            });
        }
        Self::new(shape, reference_life / damage.max(MIN_DAMAGE))
    }

    pub fn validate(&self) -> Result<(), FatigueError> {
        if !self.shape.is_finite() || self.shape <= 0.0 {
            return Err(FatigueError::InvalidWeibull {
                field: "shape",
                value: self.shape,
            });
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(FatigueError::InvalidWeibull {
                field: "scale",
                value: self.scale,
            });
        }
        Ok(())
    }
}

/// One sample of the reliability curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub cycles: f64,
    pub failure_probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeibullReliabilityModel {
    params: WeibullParameters,
}

impl WeibullReliabilityModel {
    pub fn new(params: WeibullParameters) -> Result<Self, FatigueError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> WeibullParameters {
        self.params
    }

    pub fn failure_probability(&self, t: f64) -> Result<f64, FatigueError> {
        check_cycles(t)?;
        let z = t / self.params.scale;
        Ok(1.0 - (-z.powf(self.params.shape)).exp())
    }

    pub fn survival_probability(&self, t: f64) -> Result<f64, FatigueError> {
        Ok(1.0 - self.failure_probability(t)?)
    }

    /// Instantaneous failure rate. At t = 0 this is infinite for beta < 1.
    pub fn hazard_rate(&self, t: f64) -> Result<f64, FatigueError> {
        check_cycles(t)?;
        let WeibullParameters { shape, scale } = self.params;
        Ok((shape / scale) * (t / scale).powf(shape - 1.0))
    }

    pub fn mtbf(&self) -> f64 {
        self.params.scale * gamma(1.0 + 1.0 / self.params.shape)
    }

    /// Cycle count at which survival drops to `reliability`, for `reliability` in (0, 1).
    pub fn time_to_reliability(&self, reliability: f64) -> Result<f64, FatigueError> {
        if !(reliability > 0.0 && reliability < 1.0) {
            return Err(FatigueError::InvalidInput(reliability));
        }
        Ok(self.params.scale * (-reliability.ln()).powf(1.0 / self.params.shape))
    }

    /// B-life: cycles by which `fraction_failed` of the population has failed.
    pub fn b_life(&self, fraction_failed: f64) -> Result<f64, FatigueError> {
        if !(fraction_failed > 0.0 && fraction_failed < 1.0) {
            return Err(FatigueError::InvalidInput(fraction_failed));
        }
        self.time_to_reliability(1.0 - fraction_failed)
    }

    pub fn failure_probabilities(&self, cycles: &[f64]) -> Result<Vec<f64>, FatigueError> {
        cycles
            .iter()
            .map(|&t| self.failure_probability(t))
            .collect()
    }

    /// `points` evenly spaced samples of F(t) over `[0, t_max]`, endpoints included.
    pub fn curve(&self, t_max: f64, points: usize) -> Result<Vec<CurvePoint>, FatigueError> {
        check_cycles(t_max)?;
        if points < 2 {
            return Err(FatigueError::InvalidWeibull {
                field: "curve_points",
                value: points as f64,
            });
        }
        let step = t_max / (points - 1) as f64;
        (0..points)
            .map(|i| {
                let cycles = if i == points - 1 { t_max } else { step * i as f64 };
                Ok(CurvePoint {
                    cycles,
                    failure_probability: self.failure_probability(cycles)?,
                })
            })
            .collect()
    }
}

fn check_cycles(t: f64) -> Result<(), FatigueError> {
    if t.is_nan() || t < 0.0 {
        return Err(FatigueError::InvalidInput(t));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn model(shape: f64, scale: f64) -> WeibullReliabilityModel {
        WeibullReliabilityModel::new(WeibullParameters::new(shape, scale).expect("valid"))
            .expect("valid")
    }

    #[test]
    fn failure_at_scale_is_one_minus_inv_e() {
        let f = model(2.0, 10_000.0)
            .failure_probability(10_000.0)
            .expect("t >= 0");
        assert!((f - (1.0 - (-1.0_f64).exp())).abs() < 1e-12);
        assert!((f - 0.6321).abs() < 1e-4);
    }

    #[test]
    fn zero_cycles_never_failed() {
        let m = model(1.6, 5e5);
        assert_eq!(m.failure_probability(0.0), Ok(0.0));
        assert_eq!(m.survival_probability(0.0), Ok(1.0));
    }

    #[test]
    fn negative_cycles_rejected() {
        let m = model(2.0, 100.0);
        assert_eq!(m.failure_probability(-1.0), Err(FatigueError::InvalidInput(-1.0)));
        assert!(m.survival_probability(-1.0).is_err());
        assert!(m.hazard_rate(-0.5).is_err());
        assert!(m.failure_probabilities(&[0.0, 10.0, -3.0]).is_err());
        assert!(m.failure_probability(f64::NAN).is_err());
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(WeibullParameters::new(0.0, 10.0).is_err());
        assert!(WeibullParameters::new(2.0, -10.0).is_err());
        assert!(WeibullParameters::new(f64::INFINITY, 10.0).is_err());
    }

    #[test]
    fn exponential_case() {
        let m = model(1.0, 50.0);
        assert!((m.mtbf() - 50.0).abs() < 1e-8);
        for t in [1.0, 10.0, 80.0] {
            assert!((m.hazard_rate(t).expect("valid") - 0.02).abs() < 1e-12);
        }
    }

    #[test]
    fn rayleigh_mtbf() {
        let m = model(2.0, 1.0);
        let expected = std::f64::consts::PI.sqrt() / 2.0;
        assert!((m.mtbf() - expected).abs() < 1e-10);
    }

    #[test]
    fn hazard_times_survival_is_density() {
        let m = model(2.5, 50.0);
        for t in [5.0, 20.0, 50.0, 80.0] {
            let z: f64 = t / 50.0;
            let pdf = (2.5 / 50.0) * z.powf(1.5) * (-z.powf(2.5)).exp();
            let h = m.hazard_rate(t).expect("valid");
            let r = m.survival_probability(t).expect("valid");
            assert!((h * r - pdf).abs() < 1e-10);
        }
    }

    #[test]
    fn b_life_inverts_failure_probability() {
        let m = model(1.6, 2e6);
        let b10 = m.b_life(0.10).expect("valid fraction");
        assert!((m.failure_probability(b10).expect("valid") - 0.10).abs() < 1e-10);
        assert!(m.b_life(0.0).is_err());
        assert!(m.b_life(1.0).is_err());
        assert!(m.time_to_reliability(1.5).is_err());
    }

    #[test]
    fn scale_from_damage() {
        let p = WeibullParameters::from_damage(1.6, 0.25, 1e6).expect("valid");
        assert!((p.scale - 4e6).abs() < 1e-6);
        let floored = WeibullParameters::from_damage(1.6, 0.0, 1e6).expect("valid");
        assert!((floored.scale - 1e12).abs() < 1.0);
        assert!(WeibullParameters::from_damage(1.6, -0.1, 1e6).is_err());
    }

    #[test]
    fn curve_spans_range() {
        let m = model(2.0, 1000.0);
        let curve = m.curve(2000.0, 500).expect("valid curve");
        assert_eq!(curve.len(), 500);
        assert_eq!(curve[0].cycles, 0.0);
        assert_eq!(curve[0].failure_probability, 0.0);
        assert_eq!(curve[499].cycles, 2000.0);
        assert!(curve
            .windows(2)
            .all(|w| w[1].failure_probability >= w[0].failure_probability));
        assert!(m.curve(2000.0, 1).is_err());
        assert!(m.curve(-1.0, 10).is_err());
    }

    proptest! {
        #[test]
        fn probabilities_are_complementary(
            shape in 0.3_f64..6.0,
            scale in 1.0_f64..1e7,
            t in 0.0_f64..1e8,
        ) {
            let m = model(shape, scale);
            let f = m.failure_probability(t).unwrap();
            let r = m.survival_probability(t).unwrap();
            prop_assert!((f + r - 1.0).abs() <= 1e-12);
            prop_assert!((0.0..=1.0).contains(&f));
        }

        #[test]
        fn failure_probability_non_decreasing(
            shape in 0.3_f64..6.0,
            scale in 1.0_f64..1e7,
            t in 0.0_f64..1e8,
            dt in 0.0_f64..1e6,
        ) {
            let m = model(shape, scale);
            let later = m.failure_probability(t + dt).unwrap();
            prop_assert!(later >= m.failure_probability(t).unwrap());
        }
    }
}
