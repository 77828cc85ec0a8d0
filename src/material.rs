//! Material strength and S-N curve parameters.

use serde::{Deserialize, Serialize};

use crate::error::{FatigueError, Stage};

/// Static strength and Basquin fatigue parameters of a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    pub name: String,
    /// Ultimate tensile strength Su [MPa]
    pub ultimate_tensile_strength: f64,
    /// Fatigue strength coefficient sigma'_f [MPa]
    pub basquin_coefficient: f64,
    /// Basquin exponent b, negative
    pub basquin_exponent: f64,
}

impl MaterialProperties {
    pub fn new(
        name: impl Into<String>,
        ultimate_tensile_strength: f64,
        basquin_coefficient: f64,
        basquin_exponent: f64,
    ) -> Result<Self, FatigueError> {
        let material = Self {
            name: name.into(),
            ultimate_tensile_strength,
            basquin_coefficient,
            basquin_exponent,
        };
        material.validate()?;
        Ok(material)
    }

    /// AISI 1045 normalized steel.
    pub fn aisi_1045() -> Self {
        Self {
            name: "AISI 1045 Steel".to_string(),
            ultimate_tensile_strength: 625.0,
            basquin_coefficient: 900.0,
            basquin_exponent: -0.11,
        }
    }

    pub fn validate(&self) -> Result<(), FatigueError> {
        let su = self.ultimate_tensile_strength;
        if !su.is_finite() || su <= 0.0 {
            return Err(FatigueError::InvalidMaterial {
                stage: Stage::Correction,
                field: "ultimate_tensile_strength",
                value: su,
            });
        }
        let sf = self.basquin_coefficient;
        if !sf.is_finite() || sf <= 0.0 {
            return Err(FatigueError::InvalidMaterial {
                stage: Stage::LifeModel,
                field: "basquin_coefficient",
                value: sf,
            });
        }
        let b = self.basquin_exponent;
        if !b.is_finite() || b >= 0.0 {
            return Err(FatigueError::InvalidMaterial {
                stage: Stage::LifeModel,
                field: "basquin_exponent",
                value: b,
            });
        }
        Ok(())
    }
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self::aisi_1045()
    }
}
