//! Error taxonomy for the fatigue pipeline.
//!
//! Every error names the pipeline stage that produced it and carries the
//! numeric value that was rejected.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Pipeline stage that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Decomposition,
    Correction,
    LifeModel,
    DamageAccumulation,
    Reliability,
    Simulation,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Decomposition => "decomposition",
            Stage::Correction => "correction",
            Stage::LifeModel => "life model",
            Stage::DamageAccumulation => "damage accumulation",
            Stage::Reliability => "reliability",
            Stage::Simulation => "simulation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FatigueError {
    #[error("decomposition: max stress {max_stress} is below min stress {min_stress}")]
    InvalidLoad { max_stress: f64, min_stress: f64 },
    #[error(
        "correction: mean stress {mean_stress} reaches ultimate strength {ultimate_strength}, \
         no finite equivalent stress"
    )]
    Overload {
        mean_stress: f64,
        ultimate_strength: f64,
    },
    #[error("correction: stress pair must be finite, got alternating {alternating}, mean {mean}")]
    NonFiniteStress { alternating: f64, mean: f64 },
    #[error("life model: equivalent stress must be positive and finite, got {0}")]
    InvalidStress(f64),
    #[error("life model: cycles to failure must be positive and finite, got {0}")]
    InvalidLife(f64),
    #[error("damage accumulation: cycles to failure must be positive, got {0}")]
    ZeroLife(f64),
    #[error("reliability: cycle count must be finite and >= 0, got {0}")]
    InvalidInput(f64),
    #[error("{stage}: invalid {field}: {value}")]
    InvalidMaterial {
        stage: Stage,
        field: &'static str,
        value: f64,
    },
    #[error("reliability: invalid weibull {field}: {value}")]
    InvalidWeibull { field: &'static str, value: f64 },
    #[error("simulation: invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FatigueError {
    pub fn stage(&self) -> Stage {
        match self {
            FatigueError::InvalidLoad { .. } => Stage::Decomposition,
            FatigueError::Overload { .. } | FatigueError::NonFiniteStress { .. } => {
                Stage::Correction
            }
            FatigueError::InvalidStress(_) | FatigueError::InvalidLife(_) => Stage::LifeModel,
            FatigueError::ZeroLife(_) => Stage::DamageAccumulation,
            FatigueError::InvalidInput(_) | FatigueError::InvalidWeibull { .. } => {
                Stage::Reliability
            }
            FatigueError::InvalidMaterial { stage, .. } => *stage,
            FatigueError::InvalidConfig(_) => Stage::Simulation,
        }
    }
}
