//! Monte Carlo propagation of material and load scatter through the
//! Goodman -> Basquin -> Miner chain.
//!
//! Trial `i` draws only from the ChaCha8 stream `(seed, i)`, so samples do not
//! depend on the order in which trials execute. A trial whose numbers fall
//! outside the models' domain is recorded as rejected instead of aborting the
//! batch.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chain::FatigueChain;
use crate::error::FatigueError;
use crate::goodman::CompressiveMeanPolicy;
use crate::load::{LoadCycle, LoadSpectrum, StressCycleDecomposer};
use crate::material::MaterialProperties;
use crate::miner::FAILURE_DAMAGE;
use crate::weibull::MIN_DAMAGE;

pub const DEFAULT_TRIAL_COUNT: usize = 10_000;
pub const DEFAULT_HISTOGRAM_BINS: usize = 60;

/// Life recorded for a rejected trial.
pub const REJECTED_LIFE: f64 = 0.0;

/// Distribution of one uncertain factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Perturbation {
    Normal { mean: f64, std: f64 },
    Uniform { low: f64, high: f64 },
    Fixed { value: f64 },
}

impl Perturbation {
    pub fn fixed(value: f64) -> Self {
        Perturbation::Fixed { value }
    }

    fn sampler(&self, field: &str) -> Result<Sampler, FatigueError> {
        match *self {
            Perturbation::Normal { mean, std } => {
                let dist = Normal::new(mean, std).map_err(|_| {
                    FatigueError::InvalidConfig(format!(
                        "{field}: normal(mean={mean}, std={std}) needs finite mean and std >= 0"
                    ))
                })?;
                if !mean.is_finite() {
                    return Err(FatigueError::InvalidConfig(format!(
                        "{field}: normal mean must be finite, got {mean}"
                    )));
                }
                Ok(Sampler::Normal(dist))
            }
            Perturbation::Uniform { low, high } => {
                if !low.is_finite()
                    || !high.is_finite()
                    || low > high
                    || !(high - low).is_finite()
                {
                    return Err(FatigueError::InvalidConfig(format!(
                        "{field}: uniform(low={low}, high={high}) needs finite low <= high \
                         with a finite width"
                    )));
                }
                Ok(Sampler::Uniform(Uniform::new_inclusive(low, high)))
            }
            Perturbation::Fixed { value } => {
                if !value.is_finite() {
                    return Err(FatigueError::InvalidConfig(format!(
                        "{field}: fixed value must be finite, got {value}"
                    )));
                }
                Ok(Sampler::Fixed(value))
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Sampler {
    Normal(Normal<f64>),
    Uniform(Uniform<f64>),
    Fixed(f64),
}

impl Sampler {
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Sampler::Normal(dist) => dist.sample(rng),
            Sampler::Uniform(dist) => dist.sample(rng),
            Sampler::Fixed(value) => *value,
        }
    }
}

/// Uncertain factors applied to the base inputs in every trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerturbationSpec {
    /// Common factor on both Su and sigma'_f (correlated strength scatter).
    pub strength_scale: Perturbation,
    /// Independent factor on Su.
    pub ultimate_strength_scale: Perturbation,
    /// Independent factor on sigma'_f.
    pub coefficient_scale: Perturbation,
    /// Added to the Basquin exponent b.
    pub exponent_shift: Perturbation,
    /// Factor on max and min stress of every cycle.
    pub load_scale: Perturbation,
}

impl PerturbationSpec {
    /// No scatter at all; every trial equals the deterministic result.
    pub fn none() -> Self {
        Self {
            strength_scale: Perturbation::fixed(1.0),
            ultimate_strength_scale: Perturbation::fixed(1.0),
            coefficient_scale: Perturbation::fixed(1.0),
            exponent_shift: Perturbation::fixed(0.0),
            load_scale: Perturbation::fixed(1.0),
        }
    }

    /// Normal strength scatter around 1.0 with the given coefficient of variation.
    pub fn strength_scatter(cov: f64) -> Self {
        Self {
            strength_scale: Perturbation::Normal {
                mean: 1.0,
                std: cov,
            },
            ..Self::none()
        }
    }

    pub fn validate(&self) -> Result<(), FatigueError> {
        self.samplers().map(|_| ())
    }

    fn samplers(&self) -> Result<Samplers, FatigueError> {
        Ok(Samplers {
            strength: self.strength_scale.sampler("strength_scale")?,
            ultimate: self.ultimate_strength_scale.sampler("ultimate_strength_scale")?,
            coefficient: self.coefficient_scale.sampler("coefficient_scale")?,
            exponent: self.exponent_shift.sampler("exponent_shift")?,
            load: self.load_scale.sampler("load_scale")?,
        })
    }
}

impl Default for PerturbationSpec {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Clone)]
struct Samplers {
    strength: Sampler,
    ultimate: Sampler,
    coefficient: Sampler,
    exponent: Sampler,
    load: Sampler,
}

/// Factors drawn for one trial.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TrialDraw {
    ultimate_factor: f64,
    coefficient_factor: f64,
    exponent_shift: f64,
    load_factor: f64,
}

impl Samplers {
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> TrialDraw {
        let strength = self.strength.draw(rng);
        let ultimate = self.ultimate.draw(rng);
        let coefficient = self.coefficient.draw(rng);
        let exponent_shift = self.exponent.draw(rng);
        let load_factor = self.load.draw(rng);
        TrialDraw {
            ultimate_factor: strength * ultimate,
            coefficient_factor: strength * coefficient,
            exponent_shift,
            load_factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub trial_count: usize,
    /// Fixed seed for reproducible runs; drawn from OS entropy when absent.
    pub seed: Option<u64>,
    pub perturbation: PerturbationSpec,
    pub compressive_mean: CompressiveMeanPolicy,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            trial_count: DEFAULT_TRIAL_COUNT,
            seed: None,
            perturbation: PerturbationSpec::strength_scatter(0.05),
            compressive_mean: CompressiveMeanPolicy::default(),
        }
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> Result<(), FatigueError> {
        if self.trial_count == 0 {
            return Err(FatigueError::InvalidConfig(
                "trial_count must be at least 1, got 0".to_string(),
            ));
        }
        self.perturbation.validate()
    }
}

/// Result of one trial.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    Completed { life: f64, damage: f64 },
    Rejected { error: FatigueError },
}

impl TrialOutcome {
    pub fn life(&self) -> Option<f64> {
        match self {
            TrialOutcome::Completed { life, .. } => Some(*life),
            TrialOutcome::Rejected { .. } => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, TrialOutcome::Rejected { .. })
    }
}

/// Bin edges and counts over completed trial lives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifeHistogram {
    pub bin_width: f64,
    /// `counts.len() + 1` edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Empirical life distribution of a simulation run.
///
/// `life_samples` is in trial order and holds [`REJECTED_LIFE`] for rejected
/// trials. Summary statistics cover completed trials only.
#[derive(Debug, Clone)]
pub struct MonteCarloResult {
    seed: u64,
    outcomes: Vec<TrialOutcome>,
    life_samples: Vec<f64>,
    sorted_lives: Vec<f64>,
    mean_life: f64,
    std_life: f64,
}

impl MonteCarloResult {
    fn from_outcomes(seed: u64, outcomes: Vec<TrialOutcome>) -> Self {
        let life_samples: Vec<f64> = outcomes
            .iter()
            .map(|o| o.life().unwrap_or(REJECTED_LIFE))
            .collect();
        let mut sorted_lives: Vec<f64> = outcomes.iter().filter_map(TrialOutcome::life).collect();
        sorted_lives.sort_by(f64::total_cmp);

        let n = sorted_lives.len();
        let mean_life = if n == 0 {
            0.0
        } else {
            sorted_lives.iter().sum::<f64>() / n as f64
        };
        let std_life = if n < 2 {
            0.0
        } else {
            let ss: f64 = sorted_lives.iter().map(|x| (x - mean_life).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        };

        Self {
            seed,
            outcomes,
            life_samples,
            sorted_lives,
            mean_life,
            std_life,
        }
    }

    /// Seed that reproduces this run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn trial_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn outcomes(&self) -> &[TrialOutcome] {
        &self.outcomes
    }

    pub fn life_samples(&self) -> &[f64] {
        &self.life_samples
    }

    /// Completed lives in ascending order.
    pub fn sorted_lives(&self) -> &[f64] {
        &self.sorted_lives
    }

    pub fn completed_trials(&self) -> usize {
        self.sorted_lives.len()
    }

    pub fn rejected_trials(&self) -> usize {
        self.trial_count() - self.completed_trials()
    }

    pub fn failed_trial_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.rejected_trials() as f64 / self.trial_count() as f64
    }

    /// Fraction of completed trials whose damage reached 1.0.
    pub fn failure_fraction(&self) -> f64 {
        let completed = self.completed_trials();
        if completed == 0 {
            return 0.0;
        }
        let failed = self
            .outcomes
            .iter()
            .filter(|o| {
                matches!(o, TrialOutcome::Completed { damage, .. } if *damage >= FAILURE_DAMAGE)
            })
            .count();
        failed as f64 / completed as f64
    }

    pub fn mean_life(&self) -> f64 {
        self.mean_life
    }

    /// Sample standard deviation (n - 1 denominator).
    pub fn std_life(&self) -> f64 {
        self.std_life
    }

    /// Standard error of the mean life.
    pub fn standard_error(&self) -> f64 {
        let n = self.completed_trials();
        if n == 0 {
            return 0.0;
        }
        self.std_life / (n as f64).sqrt()
    }

    /// Percentile `p` in [0, 100], interpolating linearly between order statistics.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if !(0.0..=100.0).contains(&p) || self.sorted_lives.is_empty() {
            return None;
        }
        let s = &self.sorted_lives;
        let rank = p / 100.0 * (s.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        Some(s[lo] + (s[hi] - s[lo]) * (rank - lo as f64))
    }

    /// Central band holding `level` (in (0, 1)) of the completed lives.
    pub fn confidence_interval(&self, level: f64) -> Option<(f64, f64)> {
        if !(level > 0.0 && level < 1.0) {
            return None;
        }
        let tail = (1.0 - level) / 2.0 * 100.0;
        Some((self.percentile(tail)?, self.percentile(100.0 - tail)?))
    }

    pub fn histogram(&self, bins: usize) -> Option<LifeHistogram> {
        let s = &self.sorted_lives;
        if bins == 0 || s.is_empty() {
            return None;
        }
        let min = s[0];
        let max = s[s.len() - 1];
        let bin_width = (max - min) / bins as f64;
        let edges: Vec<f64> = (0..=bins)
            .map(|i| if i == bins { max } else { min + bin_width * i as f64 })
            .collect();

        let mut counts = vec![0_usize; bins];
        for &x in s {
            let idx = if bin_width > 0.0 {
                (((x - min) / bin_width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[idx] += 1;
        }

        Some(LifeHistogram {
            bin_width,
            edges,
            counts,
        })
    }

    /// Running mean of completed lives in trial order, sampled every `stride` trials.
    pub fn convergence_trace(&self, stride: usize) -> Vec<(usize, f64)> {
        let stride = stride.max(1);
        let mut trace = Vec::new();
        let mut sum = 0.0;
        let mut completed = 0_usize;
        for (i, outcome) in self.outcomes.iter().enumerate() {
            if let Some(life) = outcome.life() {
                sum += life;
                completed += 1;
            }
            let trial = i + 1;
            if completed > 0 && (trial % stride == 0 || trial == self.outcomes.len()) {
                trace.push((trial, sum / completed as f64));
            }
        }
        trace
    }
}

/// Runs independent perturbed trials of the deterministic chain.
#[derive(Debug, Clone)]
pub struct MonteCarloSimulator {
    config: MonteCarloConfig,
    samplers: Samplers,
}

impl MonteCarloSimulator {
    pub fn new(config: MonteCarloConfig) -> Result<Self, FatigueError> {
        config.validate()?;
        let samplers = config.perturbation.samplers()?;
        Ok(Self { config, samplers })
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Life per trial is the Basquin life of the perturbed cycle; damage is
    /// `applied_cycles / Nf`.
    pub fn run(
        &self,
        material: &MaterialProperties,
        load: &LoadCycle,
    ) -> Result<MonteCarloResult, FatigueError> {
        material.validate()?;
        StressCycleDecomposer::decompose(load)?;
        Ok(self.run_trials(material, |chain, load_factor| {
            let prediction = chain.predict(&load.scaled(load_factor))?;
            let damage = load.applied_cycles as f64 / prediction.cycles_to_failure;
            Ok((prediction.cycles_to_failure, damage))
        }))
    }

    /// Life per trial is `total_cycles / D`: the cycle count at which the
    /// repeated spectrum reaches unit damage.
    pub fn run_spectrum(
        &self,
        material: &MaterialProperties,
        spectrum: &LoadSpectrum,
    ) -> Result<MonteCarloResult, FatigueError> {
        material.validate()?;
        for block in spectrum.blocks() {
            StressCycleDecomposer::decompose(block)?;
        }
        let total_cycles = spectrum.total_cycles();
        if total_cycles == 0 {
            return Err(FatigueError::InvalidConfig(
                "load spectrum must apply at least one cycle".to_string(),
            ));
        }
        Ok(self.run_trials(material, |chain, load_factor| {
            let scaled = LoadSpectrum::new(
                spectrum
                    .blocks()
                    .iter()
                    .map(|block| block.scaled(load_factor))
                    .collect(),
            );
            let damage = chain.accumulate(&scaled)?.total_damage();
            Ok((total_cycles as f64 / damage.max(MIN_DAMAGE), damage))
        }))
    }

    fn run_trials<F>(&self, material: &MaterialProperties, evaluate: F) -> MonteCarloResult
    where
        F: Fn(&FatigueChain, f64) -> Result<(f64, f64), FatigueError>,
    {
        let seed = self.config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let outcomes: Vec<TrialOutcome> = (0..self.config.trial_count)
            .map(|trial| self.trial(trial, seed, material, &evaluate))
            .collect();
        let result = MonteCarloResult::from_outcomes(seed, outcomes);

        info!(
            trials = result.trial_count(),
            rejected = result.rejected_trials(),
            seed,
            mean_life = result.mean_life(),
            "monte carlo run complete"
        );
        result
    }

    fn trial<F>(
        &self,
        trial: usize,
        seed: u64,
        material: &MaterialProperties,
        evaluate: &F,
    ) -> TrialOutcome
    where
        F: Fn(&FatigueChain, f64) -> Result<(f64, f64), FatigueError>,
    {
        let mut rng = trial_rng(seed, trial);
        let draw = self.samplers.draw(&mut rng);
        let perturbed = MaterialProperties {
            name: material.name.clone(),
            ultimate_tensile_strength: material.ultimate_tensile_strength * draw.ultimate_factor,
            basquin_coefficient: material.basquin_coefficient * draw.coefficient_factor,
            basquin_exponent: material.basquin_exponent + draw.exponent_shift,
        };

        let evaluated = FatigueChain::new(&perturbed, self.config.compressive_mean)
            .and_then(|chain| evaluate(&chain, draw.load_factor));
        match evaluated {
            Ok((life, damage)) if life.is_finite() && life > 0.0 => {
                TrialOutcome::Completed { life, damage }
            }
            Ok((life, _)) => {
                debug!(trial, life, "trial rejected: non-finite life");
                TrialOutcome::Rejected {
                    error: FatigueError::InvalidLife(life),
                }
            }
            Err(error) => {
                debug!(trial, stage = %error.stage(), %error, "trial rejected");
                TrialOutcome::Rejected { error }
            }
        }
    }
}

fn trial_rng(seed: u64, trial: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(trial as u64);
    rng
}

/// Single-cycle simulation with an explicit trial count, perturbation and seed.
pub fn run_monte_carlo(
    trial_count: usize,
    material: &MaterialProperties,
    load: &LoadCycle,
    perturbation: PerturbationSpec,
    seed: Option<u64>,
) -> Result<MonteCarloResult, FatigueError> {
    let simulator = MonteCarloSimulator::new(MonteCarloConfig {
        trial_count,
        seed,
        perturbation,
        ..MonteCarloConfig::default()
    })?;
    simulator.run(material, load)
}
