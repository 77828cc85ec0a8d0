//! Deterministic decomposition -> Goodman -> Basquin -> Miner chain.

use serde::Serialize;
use tracing::trace;

use crate::basquin::BasquinLifeModel;
use crate::error::FatigueError;
use crate::goodman::{CompressiveMeanPolicy, GoodmanCorrector};
use crate::load::{LoadCycle, LoadSpectrum, StressCycleDecomposer, StressPair};
use crate::material::MaterialProperties;
use crate::miner::{DamageState, MinerDamageAccumulator};

/// Single-cycle life prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CyclePrediction {
    pub stress: StressPair,
    pub equivalent_stress: f64,
    pub cycles_to_failure: f64,
}

/// Damage contributed by one block of a spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlockDamage {
    pub block: usize,
    pub max_stress: f64,
    pub min_stress: f64,
    pub applied_cycles: u64,
    pub equivalent_stress: f64,
    pub cycles_to_failure: f64,
    pub damage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumDamage {
    pub state: DamageState,
    pub blocks: Vec<BlockDamage>,
}

impl SpectrumDamage {
    pub fn total_damage(&self) -> f64 {
        self.state.cumulative_damage
    }
}

/// Goodman and Basquin models bound to one material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FatigueChain {
    corrector: GoodmanCorrector,
    life_model: BasquinLifeModel,
}

impl FatigueChain {
    pub fn new(
        material: &MaterialProperties,
        policy: CompressiveMeanPolicy,
    ) -> Result<Self, FatigueError> {
        material.validate()?;
        Ok(Self {
            corrector: GoodmanCorrector::with_policy(material.ultimate_tensile_strength, policy)?,
            life_model: BasquinLifeModel::new(material)?,
        })
    }

    pub fn corrector(&self) -> &GoodmanCorrector {
        &self.corrector
    }

    pub fn life_model(&self) -> &BasquinLifeModel {
        &self.life_model
    }

    pub fn predict(&self, cycle: &LoadCycle) -> Result<CyclePrediction, FatigueError> {
        let stress = StressCycleDecomposer::decompose(cycle)?;
        let equivalent_stress = self.corrector.correct(stress)?;
        let cycles_to_failure = self.life_model.cycles_to_failure(equivalent_stress)?;
        Ok(CyclePrediction {
            stress,
            equivalent_stress,
            cycles_to_failure,
        })
    }

    /// Runs every block through the chain and sums damage with Miner's rule.
    pub fn accumulate(&self, spectrum: &LoadSpectrum) -> Result<SpectrumDamage, FatigueError> {
        let mut accumulator = MinerDamageAccumulator::new();
        let mut blocks = Vec::with_capacity(spectrum.len());

        for (block, cycle) in spectrum.blocks().iter().enumerate() {
            let prediction = self.predict(cycle)?;
            let damage = accumulator.add_cycle(cycle.applied_cycles, prediction.cycles_to_failure)?;
            trace!(
                block,
                equivalent_stress = prediction.equivalent_stress,
                cycles_to_failure = prediction.cycles_to_failure,
                damage,
                "block damage"
            );
            blocks.push(BlockDamage {
                block,
                max_stress: cycle.max_stress,
                min_stress: cycle.min_stress,
                applied_cycles: cycle.applied_cycles,
                equivalent_stress: prediction.equivalent_stress,
                cycles_to_failure: prediction.cycles_to_failure,
                damage,
            });
        }

        Ok(SpectrumDamage {
            state: accumulator.state(),
            blocks,
        })
    }
}
