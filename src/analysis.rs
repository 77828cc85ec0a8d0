//! End-to-end fatigue and reliability analysis of a load spectrum.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chain::{BlockDamage, FatigueChain};
use crate::error::FatigueError;
use crate::goodman::CompressiveMeanPolicy;
use crate::load::{LoadCycle, LoadSpectrum};
use crate::material::MaterialProperties;
use crate::miner::{DamageState, DamageStatus};
use crate::monte_carlo::{
    LifeHistogram, MonteCarloConfig, MonteCarloResult, MonteCarloSimulator,
    DEFAULT_HISTOGRAM_BINS,
};
use crate::weibull::{CurvePoint, WeibullParameters, WeibullReliabilityModel};

/// Source of the Weibull scale parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum WeibullScale {
    /// `eta = reference_life / D` from the deterministic spectrum damage.
    FromDamage { reference_life: f64 },
    Fixed { scale: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliabilityConfig {
    pub shape: f64,
    pub scale: WeibullScale,
    /// Number of points on the failure-probability curve
    pub curve_points: usize,
    /// Curve upper bound as a multiple of eta
    pub curve_span: f64,
    /// Population fraction for the reported B-life
    pub b_life_fraction: f64,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            shape: 1.6,
            scale: WeibullScale::FromDamage {
                reference_life: 1_000_000.0,
            },
            curve_points: 500,
            curve_span: 2.0,
            b_life_fraction: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub material: MaterialProperties,
    pub load_spectrum: LoadSpectrum,
    pub compressive_mean: CompressiveMeanPolicy,
    pub reliability: ReliabilityConfig,
    /// Its `compressive_mean` is replaced by the analysis-wide policy.
    pub monte_carlo: MonteCarloConfig,
    pub histogram_bins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            material: MaterialProperties::aisi_1045(),
            load_spectrum: LoadSpectrum::new(vec![
                LoadCycle::new(320.0, 40.0, 120_000),
                LoadCycle::new(240.0, 60.0, 200_000),
                LoadCycle::new(180.0, 80.0, 500_000),
            ]),
            compressive_mean: CompressiveMeanPolicy::default(),
            reliability: ReliabilityConfig::default(),
            monte_carlo: MonteCarloConfig::default(),
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), FatigueError> {
        self.material.validate()?;

        if self.load_spectrum.is_empty() {
            return Err(FatigueError::InvalidConfig(
                "load_spectrum must contain at least one block".to_string(),
            ));
        }
        if self.load_spectrum.total_cycles() == 0 {
            return Err(FatigueError::InvalidConfig(
                "load_spectrum must apply at least one cycle".to_string(),
            ));
        }

        let rel = &self.reliability;
        match rel.scale {
            WeibullScale::FromDamage { reference_life } => {
                WeibullParameters::from_damage(rel.shape, 1.0, reference_life)?;
            }
            WeibullScale::Fixed { scale } => {
                WeibullParameters::new(rel.shape, scale)?;
            }
        }
        if rel.curve_points < 2 {
            return Err(FatigueError::InvalidConfig(format!(
                "reliability.curve_points must be at least 2, got {}",
                rel.curve_points
            )));
        }
        if !rel.curve_span.is_finite() || rel.curve_span <= 0.0 {
            return Err(FatigueError::InvalidConfig(format!(
                "reliability.curve_span must be finite and > 0, got {}",
                rel.curve_span
            )));
        }
        if !(rel.b_life_fraction > 0.0 && rel.b_life_fraction < 1.0) {
            return Err(FatigueError::InvalidConfig(format!(
                "reliability.b_life_fraction must be in (0, 1), got {}",
                rel.b_life_fraction
            )));
        }
        if self.histogram_bins == 0 {
            return Err(FatigueError::InvalidConfig(
                "histogram_bins must be at least 1".to_string(),
            ));
        }

        self.monte_carlo.validate()
    }

    fn simulation_config(&self) -> MonteCarloConfig {
        MonteCarloConfig {
            compressive_mean: self.compressive_mean,
            ..self.monte_carlo.clone()
        }
    }
}

/// Everything the analysis produces, in memory.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub material: MaterialProperties,
    pub blocks: Vec<BlockDamage>,
    pub damage: DamageState,
    pub weibull: WeibullParameters,
    pub mtbf: f64,
    pub b_life_fraction: f64,
    pub b_life: f64,
    pub curve: Vec<CurvePoint>,
    pub monte_carlo: MonteCarloResult,
    pub histogram: Option<LifeHistogram>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloSummary {
    pub seed: u64,
    pub trials: usize,
    pub rejected_trials: usize,
    pub failed_trial_rate: f64,
    pub mean_life: f64,
    pub std_life: f64,
    pub standard_error: f64,
    pub p5_life: Option<f64>,
    pub p50_life: Option<f64>,
    pub p95_life: Option<f64>,
    /// Central 90% band of completed lives.
    pub ci90_life: Option<(f64, f64)>,
    /// Share of completed trials whose damage reached 1.0.
    pub failure_fraction: f64,
}

impl MonteCarloSummary {
    pub fn from_result(result: &MonteCarloResult) -> Self {
        Self {
            seed: result.seed(),
            trials: result.trial_count(),
            rejected_trials: result.rejected_trials(),
            failed_trial_rate: result.failed_trial_rate(),
            mean_life: result.mean_life(),
            std_life: result.std_life(),
            standard_error: result.standard_error(),
            p5_life: result.percentile(5.0),
            p50_life: result.percentile(50.0),
            p95_life: result.percentile(95.0),
            ci90_life: result.confidence_interval(0.90),
            failure_fraction: result.failure_fraction(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub material: String,
    pub blocks: Vec<BlockDamage>,
    pub total_damage: f64,
    pub status: DamageStatus,
    pub weibull_shape: f64,
    pub weibull_scale: f64,
    pub mtbf: f64,
    pub b_life_fraction: f64,
    pub b_life: f64,
    pub monte_carlo: MonteCarloSummary,
}

impl AnalysisReport {
    pub fn total_damage(&self) -> f64 {
        self.damage.cumulative_damage
    }

    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            material: self.material.name.clone(),
            blocks: self.blocks.clone(),
            total_damage: self.damage.cumulative_damage,
            status: self.damage.status(),
            weibull_shape: self.weibull.shape,
            weibull_scale: self.weibull.scale,
            mtbf: self.mtbf,
            b_life_fraction: self.b_life_fraction,
            b_life: self.b_life,
            monte_carlo: MonteCarloSummary::from_result(&self.monte_carlo),
        }
    }
}

pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisReport, FatigueError> {
    config.validate()?;

    let chain = FatigueChain::new(&config.material, config.compressive_mean)?;
    let spectrum = chain.accumulate(&config.load_spectrum)?;
    for block in &spectrum.blocks {
        debug!(
            block = block.block,
            equivalent_stress = block.equivalent_stress,
            cycles_to_failure = block.cycles_to_failure,
            damage = block.damage,
            "block damage"
        );
    }
    info!(
        material = %config.material.name,
        blocks = spectrum.blocks.len(),
        damage = spectrum.total_damage(),
        failed = spectrum.state.is_failed,
        "spectrum damage"
    );

    let rel = &config.reliability;
    let weibull = match rel.scale {
        WeibullScale::FromDamage { reference_life } => {
            WeibullParameters::from_damage(rel.shape, spectrum.total_damage(), reference_life)?
        }
        WeibullScale::Fixed { scale } => WeibullParameters::new(rel.shape, scale)?,
    };
    let model = WeibullReliabilityModel::new(weibull)?;
    let mtbf = model.mtbf();
    let b_life = model.b_life(rel.b_life_fraction)?;
    let curve = model.curve(rel.curve_span * weibull.scale, rel.curve_points)?;
    info!(
        shape = weibull.shape,
        scale = weibull.scale,
        mtbf,
        "reliability model"
    );

    let simulator = MonteCarloSimulator::new(config.simulation_config())?;
    let monte_carlo = simulator.run_spectrum(&config.material, &config.load_spectrum)?;
    let histogram = monte_carlo.histogram(config.histogram_bins);

    Ok(AnalysisReport {
        material: config.material.clone(),
        blocks: spectrum.blocks,
        damage: spectrum.state,
        weibull,
        mtbf,
        b_life_fraction: rel.b_life_fraction,
        b_life,
        curve,
        monte_carlo,
        histogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monte_carlo::{Perturbation, PerturbationSpec};
    use approx::assert_relative_eq;

    fn small_config() -> AnalysisConfig {
        AnalysisConfig {
            monte_carlo: MonteCarloConfig {
                trial_count: 200,
                seed: Some(2026),
                ..MonteCarloConfig::default()
            },
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn default_scenario_runs() {
        let report = run_analysis(&small_config()).expect("default config is valid");
        assert_eq!(report.blocks.len(), 3);
        assert!(report.total_damage() > 0.0 && report.total_damage() < 1.0);
        assert_eq!(report.damage.status(), DamageStatus::Safe);
        assert_relative_eq!(
            report.weibull.scale,
            1_000_000.0 / report.total_damage(),
            max_relative = 1e-12
        );
        assert!(report.mtbf > 0.0);
        assert!(report.b_life < report.mtbf);
        assert_eq!(report.curve.len(), 500);
        assert_relative_eq!(
            report.curve[499].cycles,
            2.0 * report.weibull.scale,
            max_relative = 1e-12
        );
        assert_eq!(report.monte_carlo.trial_count(), 200);
        assert_eq!(report.monte_carlo.rejected_trials(), 0);
        let hist = report.histogram.as_ref().expect("completed trials");
        assert_eq!(hist.counts.len(), DEFAULT_HISTOGRAM_BINS);
    }

    #[test]
    fn summary_mirrors_report() {
        let report = run_analysis(&small_config()).expect("valid");
        let summary = report.summary();
        assert_eq!(summary.material, "AISI 1045 Steel");
        assert_eq!(summary.total_damage, report.total_damage());
        assert_eq!(summary.monte_carlo.trials, 200);
        assert_eq!(summary.monte_carlo.seed, 2026);
        let p5 = summary.monte_carlo.p5_life.expect("completed trials");
        let p95 = summary.monte_carlo.p95_life.expect("completed trials");
        assert!(p5 < summary.monte_carlo.mean_life && summary.monte_carlo.mean_life < p95);
    }

    #[test]
    fn fixed_scale_is_used_verbatim() {
        let config = AnalysisConfig {
            reliability: ReliabilityConfig {
                shape: 2.0,
                scale: WeibullScale::Fixed { scale: 10_000.0 },
                ..ReliabilityConfig::default()
            },
            ..small_config()
        };
        let report = run_analysis(&config).expect("valid");
        assert_eq!(
            report.weibull,
            WeibullParameters {
                shape: 2.0,
                scale: 10_000.0
            }
        );
    }

    #[test]
    fn overloaded_spectrum_propagates_error() {
        let config = AnalysisConfig {
            load_spectrum: LoadSpectrum::new(vec![LoadCycle::new(900.0, 700.0, 10)]),
            ..small_config()
        };
        assert!(matches!(
            run_analysis(&config),
            Err(FatigueError::Overload { .. })
        ));
    }

    #[test]
    fn invalid_configs_fail_before_running() {
        let cases = [
            AnalysisConfig {
                load_spectrum: LoadSpectrum::default(),
                ..small_config()
            },
            AnalysisConfig {
                load_spectrum: LoadSpectrum::new(vec![LoadCycle::new(100.0, 0.0, 0)]),
                ..small_config()
            },
            AnalysisConfig {
                histogram_bins: 0,
                ..small_config()
            },
            AnalysisConfig {
                monte_carlo: MonteCarloConfig {
                    trial_count: 0,
                    ..MonteCarloConfig::default()
                },
                ..small_config()
            },
            AnalysisConfig {
                reliability: ReliabilityConfig {
                    curve_points: 1,
                    ..ReliabilityConfig::default()
                },
                ..small_config()
            },
        ];
        for config in cases {
            assert!(matches!(
                config.validate(),
                Err(FatigueError::InvalidConfig(_))
            ));
        }

        let bad_shape = AnalysisConfig {
            reliability: ReliabilityConfig {
                shape: -1.0,
                ..ReliabilityConfig::default()
            },
            ..small_config()
        };
        assert!(matches!(
            bad_shape.validate(),
            Err(FatigueError::InvalidWeibull { field: "shape", .. })
        ));
    }

    #[test]
    fn omitted_perturbation_keeps_strength_scatter() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "monte_carlo": { "trial_count": 5 } }"#).expect("valid");
        assert_eq!(
            config.monte_carlo.perturbation,
            PerturbationSpec::strength_scatter(0.05)
        );
    }

    #[test]
    fn summary_carries_confidence_band() {
        let report = run_analysis(&small_config()).expect("valid");
        let mc = MonteCarloSummary::from_result(&report.monte_carlo);
        let (lo, hi) = mc.ci90_life.expect("completed trials");
        assert_relative_eq!(lo, mc.p5_life.expect("p5"), max_relative = 1e-9);
        assert_relative_eq!(hi, mc.p95_life.expect("p95"), max_relative = 1e-9);
        assert!(lo <= hi);
        assert!((0.0..=1.0).contains(&mc.failure_fraction));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = r#"{
            "material": {
                "name": "test",
                "ultimate_tensile_strength": 600.0,
                "basquin_coefficient": 900.0,
                "basquin_exponent": -0.12
            },
            "load_spectrum": [
                { "max_stress": 300.0, "min_stress": -100.0, "applied_cycles": 1000 }
            ],
            "monte_carlo": {
                "trial_count": 10,
                "seed": 1,
                "perturbation": { "load_scale": { "kind": "uniform", "low": 0.95, "high": 1.05 } }
            }
        }"#;
        let config: AnalysisConfig = serde_json::from_str(json).expect("valid json");
        assert_eq!(config.load_spectrum.len(), 1);
        assert_eq!(config.monte_carlo.trial_count, 10);
        assert_eq!(config.monte_carlo.seed, Some(1));
        // unset factors stay fixed even when another factor is configured
        assert_eq!(
            config.monte_carlo.perturbation.strength_scale,
            Perturbation::fixed(1.0)
        );
        assert_eq!(
            config.monte_carlo.perturbation.exponent_shift,
            Perturbation::fixed(0.0)
        );
        assert_eq!(config.reliability, ReliabilityConfig::default());
        assert!(config.validate().is_ok());
    }
}
