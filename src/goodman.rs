//! Goodman mean-stress correction.
//!
//! ```text
//! sigma_eq = sigma_a / (1 - sigma_m / Su)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{FatigueError, Stage};
use crate::load::StressPair;

/// Treatment of compressive (negative) mean stress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressiveMeanPolicy {
    /// Compressive mean stress is taken as zero; it never extends life.
    #[default]
    Clamp,
    /// The linear Goodman line is applied as-is, so compression lowers sigma_eq.
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoodmanCorrector {
    ultimate_tensile_strength: f64,
    policy: CompressiveMeanPolicy,
}

impl GoodmanCorrector {
    pub fn new(ultimate_tensile_strength: f64) -> Result<Self, FatigueError> {
        Self::with_policy(ultimate_tensile_strength, CompressiveMeanPolicy::default())
    }

    pub fn with_policy(
        ultimate_tensile_strength: f64,
        policy: CompressiveMeanPolicy,
    ) -> Result<Self, FatigueError> {
        if !ultimate_tensile_strength.is_finite() || ultimate_tensile_strength <= 0.0 {
            return Err(FatigueError::InvalidMaterial {
                stage: Stage::Correction,
                field: "ultimate_tensile_strength",
                value: ultimate_tensile_strength,
            });
        }
        Ok(Self {
            ultimate_tensile_strength,
            policy,
        })
    }

    pub fn ultimate_tensile_strength(&self) -> f64 {
        self.ultimate_tensile_strength
    }

    pub fn policy(&self) -> CompressiveMeanPolicy {
        self.policy
    }

    /// Equivalent fully-reversed stress for an (alternating, mean) pair.
    pub fn equivalent_stress(&self, alternating: f64, mean: f64) -> Result<f64, FatigueError> {
        if !alternating.is_finite() || !mean.is_finite() {
            return Err(FatigueError::NonFiniteStress { alternating, mean });
        }
        let su = self.ultimate_tensile_strength;
        if mean >= su {
            return Err(FatigueError::Overload {
                mean_stress: mean,
                ultimate_strength: su,
            });
        }
        let effective_mean = match self.policy {
            CompressiveMeanPolicy::Clamp => mean.max(0.0),
            CompressiveMeanPolicy::Linear => mean,
        };
        if effective_mean == 0.0 {
            return Ok(alternating);
        }
        Ok(alternating / (1.0 - effective_mean / su))
    }

    pub fn correct(&self, pair: StressPair) -> Result<f64, FatigueError> {
        self.equivalent_stress(pair.alternating, pair.mean)
    }
}
