// MIT License
// Copyright 2023--present additive developers

//! Porosity simulation on a rectangular sample block.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{self, ConfigObject};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::machine::{Machine, MachineConfig};
use crate::material::Material;
use crate::proto;

/// Edge length of the sample block along each axis (m).
pub const SIZE: Limits = Limits::new(3e-3, 1e-3, 1e-2);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PorosityInput {
    pub id: String,
    size_x: f64,
    size_y: f64,
    size_z: f64,
    pub machine: Machine,
    pub material: Material,
}

impl Default for PorosityInput {
    fn default() -> Self {
        Self {
            id: String::new(),
            size_x: SIZE.default,
            size_y: SIZE.default,
            size_z: SIZE.default,
            machine: Machine::default(),
            material: Material::default(),
        }
    }
}

impl PorosityInput {
    pub fn new(id: impl Into<String>, machine: Machine, material: Material) -> Self {
        Self {
            id: id.into(),
            machine,
            material,
            ..Default::default()
        }
    }

    pub fn size_x(&self) -> f64 {
        self.size_x
    }

    pub fn size_y(&self) -> f64 {
        self.size_y
    }

    pub fn size_z(&self) -> f64 {
        self.size_z
    }

    pub fn set_size_x(&mut self, value: f64) -> Result<()> {
        self.size_x = SIZE.check("size_x", value)?;
        Ok(())
    }

    pub fn set_size_y(&mut self, value: f64) -> Result<()> {
        self.size_y = SIZE.check("size_y", value)?;
        Ok(())
    }

    pub fn set_size_z(&mut self, value: f64) -> Result<()> {
        self.size_z = SIZE.check("size_z", value)?;
        Ok(())
    }

    pub fn to_request(&self) -> proto::SimulationRequest {
        let input = proto::PorosityInput {
            machine: Some(self.machine.to_message()),
            material: Some(self.material.to_message()),
            size_x: self.size_x,
            size_y: self.size_y,
            size_z: self.size_z,
        };
        proto::SimulationRequest {
            id: self.id.clone(),
            input: Some(proto::simulation_request::Input::PorosityInput(input)),
        }
    }
}

impl fmt::Display for PorosityInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PorosityInput")?;
        writeln!(f, "id: {}", self.id)?;
        writeln!(f, "size_x: {}", self.size_x)?;
        writeln!(f, "size_y: {}", self.size_y)?;
        writeln!(f, "size_z: {}", self.size_z)?;
        write!(f, "\nmachine: {}", self.machine)?;
        write!(f, "\nmaterial: {}", self.material)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PorosityConfig {
    pub id: Option<String>,
    pub size_x: Option<f64>,
    pub size_y: Option<f64>,
    pub size_z: Option<f64>,
    #[serde(default, deserialize_with = "config::optional_object")]
    pub machine: Option<MachineConfig>,
    #[serde(default, deserialize_with = "config::optional_object")]
    pub material: Option<Material>,
}

impl ConfigObject for PorosityConfig {
    const OBJECT: &'static str = "PorosityInput";
}

impl TryFrom<PorosityConfig> for PorosityInput {
    type Error = Error;

    fn try_from(cfg: PorosityConfig) -> Result<Self> {
        let mut input = PorosityInput {
            id: cfg.id.unwrap_or_default(),
            machine: cfg.machine.map(Machine::try_from).transpose()?.unwrap_or_default(),
            material: cfg.material.unwrap_or_default(),
            ..Default::default()
        };
        if let Some(v) = cfg.size_x {
            input.set_size_x(v)?;
        }
        if let Some(v) = cfg.size_y {
            input.set_size_y(v)?;
        }
        if let Some(v) = cfg.size_z {
            input.set_size_z(v)?;
        }
        Ok(input)
    }
}

/// Volume fractions of the simulated sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PorositySummary {
    input: PorosityInput,
    void_ratio: f64,
    powder_ratio: f64,
    solid_ratio: f64,
}

impl PorositySummary {
    pub fn new(input: PorosityInput, result: &proto::PorosityResult) -> Self {
        Self {
            input,
            void_ratio: result.void_ratio,
            powder_ratio: result.powder_ratio,
            solid_ratio: result.solid_ratio,
        }
    }

    pub fn input(&self) -> &PorosityInput {
        &self.input
    }

    pub fn void_ratio(&self) -> f64 {
        self.void_ratio
    }

    pub fn powder_ratio(&self) -> f64 {
        self.powder_ratio
    }

    pub fn solid_ratio(&self) -> f64 {
        self.solid_ratio
    }

    pub fn relative_density(&self) -> f64 {
        self.solid_ratio
    }
}

impl fmt::Display for PorositySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PorositySummary")?;
        writeln!(f, "input: {}", self.input)?;
        writeln!(f, "void_ratio: {}", self.void_ratio)?;
        writeln!(f, "powder_ratio: {}", self.powder_ratio)?;
        writeln!(f, "solid_ratio: {}", self.solid_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_bounds() {
        let mut input = PorosityInput::default();
        let err = input.set_size_x(0.0009).unwrap_err();
        assert_eq!(err.to_string(), "size_x must be between 0.001 and 0.01.");
        assert!(input.set_size_x(0.001).is_ok());
        assert!(input.set_size_y(0.01).is_ok());
        assert!(input.set_size_z(0.011).is_err());
        assert_eq!(input.size_z(), 3e-3);
    }

    #[test]
    fn request_carries_sizes() {
        let mut input = PorosityInput::new("p1", Machine::default(), Material::named("316L"));
        input.set_size_y(5e-3).unwrap();
        match input.to_request().input {
            Some(proto::simulation_request::Input::PorosityInput(p)) => {
                assert_eq!((p.size_x, p.size_y, p.size_z), (3e-3, 5e-3, 3e-3));
                assert_eq!(p.material.unwrap().name, "316L");
            }
            other => panic!("unexpected input: {other:?}"),
        }
    }

    #[test]
    fn config_rejects_unknown_field() {
        let err = crate::config::from_json::<PorosityConfig>("PorosityInput", r#"{"size_w": 1}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "'PorosityInput' object has no attribute 'size_w'");
    }

    #[test]
    fn summary_copies_ratios() {
        let result = proto::PorosityResult {
            void_ratio: 0.1,
            powder_ratio: 0.2,
            solid_ratio: 0.7,
        };
        let summary = PorositySummary::new(PorosityInput::default(), &result);
        assert_eq!(summary.void_ratio(), 0.1);
        assert_eq!(summary.powder_ratio(), 0.2);
        assert_eq!(summary.relative_density(), 0.7);
    }
}
