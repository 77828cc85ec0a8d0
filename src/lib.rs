//! Fatigue life and reliability prediction under variable-amplitude loading.
//!
//! The numeric core chains five classical models:
//! Goodman mean-stress correction, Basquin S-N life, Miner damage
//! accumulation, Weibull reliability, and Monte Carlo propagation of material
//! and load scatter. Every stage returns plain numbers; plotting and file
//! handling live outside the core (see [`output`]).

pub mod analysis;
pub mod basquin;
pub mod chain;
pub mod error;
pub mod goodman;
pub mod load;
pub mod material;
pub mod miner;
pub mod monte_carlo;
pub mod output;
pub mod weibull;

pub use analysis::{run_analysis, AnalysisConfig, AnalysisReport, AnalysisSummary};
pub use basquin::BasquinLifeModel;
pub use chain::{BlockDamage, CyclePrediction, FatigueChain, SpectrumDamage};
pub use error::{FatigueError, Stage};
pub use goodman::{CompressiveMeanPolicy, GoodmanCorrector};
pub use load::{LoadCycle, LoadSpectrum, StressCycleDecomposer, StressPair};
pub use material::MaterialProperties;
pub use miner::{DamageState, DamageStatus, MinerDamageAccumulator};
pub use monte_carlo::{
    run_monte_carlo, MonteCarloConfig, MonteCarloResult, MonteCarloSimulator, Perturbation,
    PerturbationSpec, TrialOutcome,
};
pub use weibull::{CurvePoint, WeibullParameters, WeibullReliabilityModel};
