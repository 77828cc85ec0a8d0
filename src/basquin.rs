//! Basquin power-law S-N life model.
//!
//! ```text
//! Nf = (sigma_eq / sigma'_f)^(1/b)
//! ```
//!
//! With b < 0 the predicted life falls strictly as stress rises.

use crate::error::FatigueError;
use crate::material::MaterialProperties;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasquinLifeModel {
    coefficient: f64,
    exponent: f64,
}

impl BasquinLifeModel {
    pub fn new(material: &MaterialProperties) -> Result<Self, FatigueError> {
        material.validate()?;
        Ok(Self {
            coefficient: material.basquin_coefficient,
            exponent: material.basquin_exponent,
        })
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    /// Predicted cycles to failure at an equivalent fully-reversed stress.
    pub fn cycles_to_failure(&self, equivalent_stress: f64) -> Result<f64, FatigueError> {
        if !equivalent_stress.is_finite() || equivalent_stress <= 0.0 {
            return Err(FatigueError::InvalidStress(equivalent_stress));
        }
        let life = (equivalent_stress / self.coefficient).powf(1.0 / self.exponent);
        if !life.is_finite() || life <= 0.0 {
            return Err(FatigueError::InvalidLife(life));
        }
        Ok(life)
    }

    /// Stress amplitude that fails at `cycles`, the inverse of [`Self::cycles_to_failure`].
    pub fn stress_at_life(&self, cycles: f64) -> Result<f64, FatigueError> {
        if !cycles.is_finite() || cycles <= 0.0 {
            return Err(FatigueError::InvalidLife(cycles));
        }
        Ok(self.coefficient * cycles.powf(self.exponent))
    }
}
