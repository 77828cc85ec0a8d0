//! Load cycles and their decomposition into alternating and mean stress.

use serde::{Deserialize, Serialize};

use crate::error::FatigueError;

/// One block of constant-amplitude loading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadCycle {
    /// Peak stress of the cycle [MPa]
    pub max_stress: f64,
    /// Valley stress of the cycle [MPa]
    pub min_stress: f64,
    /// Number of cycles applied at this amplitude
    pub applied_cycles: u64,
}

impl LoadCycle {
    pub fn new(max_stress: f64, min_stress: f64, applied_cycles: u64) -> Self {
        Self {
            max_stress,
            min_stress,
            applied_cycles,
        }
    }

    /// Half the stress range.
    pub fn alternating_stress(&self) -> f64 {
        0.5 * (self.max_stress - self.min_stress)
    }

    /// Average of peak and valley.
    pub fn mean_stress(&self) -> f64 {
        0.5 * (self.max_stress + self.min_stress)
    }

    /// Same cycle with both extremes multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            max_stress: self.max_stress * factor,
            min_stress: self.min_stress * factor,
            applied_cycles: self.applied_cycles,
        }
    }
}

/// Alternating and mean components of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StressPair {
    pub alternating: f64,
    pub mean: f64,
}

/// Splits a load cycle into its alternating and mean components.
#[derive(Debug, Clone, Copy, Default)]
pub struct StressCycleDecomposer;

impl StressCycleDecomposer {
    pub fn decompose(cycle: &LoadCycle) -> Result<StressPair, FatigueError> {
        if !cycle.max_stress.is_finite()
            || !cycle.min_stress.is_finite()
            || cycle.max_stress < cycle.min_stress
        {
            return Err(FatigueError::InvalidLoad {
                max_stress: cycle.max_stress,
                min_stress: cycle.min_stress,
            });
        }
        Ok(StressPair {
            alternating: cycle.alternating_stress(),
            mean: cycle.mean_stress(),
        })
    }
}

/// Ordered variable-amplitude load history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadSpectrum {
    blocks: Vec<LoadCycle>,
}

impl LoadSpectrum {
    pub fn new(blocks: Vec<LoadCycle>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[LoadCycle] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Sum of applied cycles over all blocks.
    pub fn total_cycles(&self) -> u64 {
        self.blocks.iter().map(|b| b.applied_cycles).sum()
    }
}

impl From<Vec<LoadCycle>> for LoadSpectrum {
    fn from(blocks: Vec<LoadCycle>) -> Self {
        Self::new(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decomposes_reference_cycle() {
        let pair = StressCycleDecomposer::decompose(&LoadCycle::new(300.0, -100.0, 1))
            .expect("valid cycle");
        assert_eq!(pair.alternating, 200.0);
        assert_eq!(pair.mean, 100.0);
    }

    #[test]
    fn rejects_inverted_cycle() {
        let err = StressCycleDecomposer::decompose(&LoadCycle::new(-10.0, 50.0, 1))
            .expect_err("max below min");
        assert_eq!(
            err,
            FatigueError::InvalidLoad {
                max_stress: -10.0,
                min_stress: 50.0
            }
        );
    }

    #[test]
    fn rejects_nan_stress() {
        assert!(StressCycleDecomposer::decompose(&LoadCycle::new(f64::NAN, 0.0, 1)).is_err());
    }

    #[test]
    fn constant_stress_has_zero_amplitude() {
        let pair = StressCycleDecomposer::decompose(&LoadCycle::new(120.0, 120.0, 10))
            .expect("valid cycle");
        assert_eq!(pair.alternating, 0.0);
        assert_eq!(pair.mean, 120.0);
    }

    #[test]
    fn spectrum_totals_cycles() {
        let spectrum = LoadSpectrum::new(vec![
            LoadCycle::new(320.0, 40.0, 120_000),
            LoadCycle::new(240.0, 60.0, 200_000),
        ]);
        assert_eq!(spectrum.len(), 2);
        assert_eq!(spectrum.total_cycles(), 320_000);
    }

    proptest! {
        #[test]
        fn alternating_non_negative_and_mean_is_midpoint(
            min in -1e3_f64..1e3,
            range in 0.0_f64..2e3,
        ) {
            let max = min + range;
            let pair = StressCycleDecomposer::decompose(&LoadCycle::new(max, min, 1)).unwrap();
            prop_assert!(pair.alternating >= 0.0);
            prop_assert_eq!(pair.mean, 0.5 * (max + min));
        }
    }
}
