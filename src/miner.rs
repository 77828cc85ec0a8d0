//! Miner's rule linear damage accumulation.

use serde::Serialize;
use tracing::trace;

use crate::error::FatigueError;

/// Damage threshold at which a component is considered failed.
pub const FAILURE_DAMAGE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DamageStatus {
    Safe,
    FailureExpected,
}

/// Snapshot of accumulated damage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DamageState {
    pub cumulative_damage: f64,
    pub is_failed: bool,
}

impl DamageState {
    pub fn status(&self) -> DamageStatus {
        if self.is_failed {
            DamageStatus::FailureExpected
        } else {
            DamageStatus::Safe
        }
    }

    /// Damage still available before the failure threshold, never negative.
    pub fn remaining_fraction(&self) -> f64 {
        (FAILURE_DAMAGE - self.cumulative_damage).max(0.0)
    }
}

/// Owns a [`DamageState`] and sums cycle-ratio increments into it.
///
/// Once the total reaches 1.0 the state is failed for good; later increments
/// are still added to the total for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct MinerDamageAccumulator {
    state: DamageState,
}

impl MinerDamageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `applied_cycles / cycles_to_failure` and returns the increment.
    pub fn add_cycle(
        &mut self,
        applied_cycles: u64,
        cycles_to_failure: f64,
    ) -> Result<f64, FatigueError> {
        if cycles_to_failure.is_nan() || cycles_to_failure <= 0.0 {
            return Err(FatigueError::ZeroLife(cycles_to_failure));
        }
        let increment = applied_cycles as f64 / cycles_to_failure;
        self.state.cumulative_damage += increment;
        if self.state.cumulative_damage >= FAILURE_DAMAGE {
            self.state.is_failed = true;
        }
        trace!(
            applied_cycles,
            cycles_to_failure,
            increment,
            total = self.state.cumulative_damage,
            "miner increment"
        );
        Ok(increment)
    }

    pub fn state(&self) -> DamageState {
        self.state
    }

    pub fn cumulative_damage(&self) -> f64 {
        self.state.cumulative_damage
    }

    pub fn is_failed(&self) -> bool {
        self.state.is_failed
    }
}
