// MIT License
// Copyright 2023--present additive developers

//! Single bead simulation: input, melt pool time series and summary.

use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::config::{self, ConfigObject};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::machine::{Machine, MachineConfig};
use crate::material::Material;
use crate::proto;

/// Length of the simulated bead (m).
pub const BEAD_LENGTH: Limits = Limits::new(3e-3, 1e-3, 1e-2);

/// Input parameters of a single bead simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleBeadInput {
    /// Caller supplied identifier, passed through untouched.
    pub id: String,
    bead_length: f64,
    pub machine: Machine,
    pub material: Material,
}

impl Default for SingleBeadInput {
    fn default() -> Self {
        Self {
            id: String::new(),
            bead_length: BEAD_LENGTH.default,
            machine: Machine::default(),
            material: Material::default(),
        }
    }
}

impl SingleBeadInput {
    pub fn new(id: impl Into<String>, machine: Machine, material: Material) -> Self {
        Self {
            id: id.into(),
            machine,
            material,
            ..Default::default()
        }
    }

    pub fn bead_length(&self) -> f64 {
        self.bead_length
    }

    pub fn set_bead_length(&mut self, value: f64) -> Result<()> {
        self.bead_length = BEAD_LENGTH.check("bead_length", value)?;
        Ok(())
    }

    pub fn with_bead_length(mut self, value: f64) -> Result<Self> {
        self.set_bead_length(value)?;
        Ok(self)
    }

    pub fn to_request(&self) -> proto::SimulationRequest {
        let input = proto::SingleBeadInput {
            machine: Some(self.machine.to_message()),
            material: Some(self.material.to_message()),
            bead_length: self.bead_length,
        };
        proto::SimulationRequest {
            id: self.id.clone(),
            input: Some(proto::simulation_request::Input::SingleBeadInput(input)),
        }
    }
}

impl fmt::Display for SingleBeadInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SingleBeadInput")?;
        writeln!(f, "id: {}", self.id)?;
        writeln!(f, "bead_length: {}", self.bead_length)?;
        write!(f, "\nmachine: {}", self.machine)?;
        write!(f, "\nmaterial: {}", self.material)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SingleBeadConfig {
    pub id: Option<String>,
    pub bead_length: Option<f64>,
    #[serde(default, deserialize_with = "config::optional_object")]
    pub machine: Option<MachineConfig>,
    #[serde(default, deserialize_with = "config::optional_object")]
    pub material: Option<Material>,
}

impl ConfigObject for SingleBeadConfig {
    const OBJECT: &'static str = "SingleBeadInput";
}

impl TryFrom<SingleBeadConfig> for SingleBeadInput {
    type Error = Error;

    fn try_from(cfg: SingleBeadConfig) -> Result<Self> {
        let mut input = SingleBeadInput {
            id: cfg.id.unwrap_or_default(),
            machine: cfg.machine.map(Machine::try_from).transpose()?.unwrap_or_default(),
            material: cfg.material.unwrap_or_default(),
            ..Default::default()
        };
        if let Some(v) = cfg.bead_length {
            input.set_bead_length(v)?;
        }
        Ok(input)
    }
}

/// Columns of the melt pool table, all in meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeltPoolColumn {
    Length,
    Width,
    Depth,
    /// Width at the surface of the base plate.
    ReferenceWidth,
    /// Depth measured from the surface of the base plate.
    ReferenceDepth,
}

impl MeltPoolColumn {
    pub const ALL: [MeltPoolColumn; 5] = [
        MeltPoolColumn::Length,
        MeltPoolColumn::Width,
        MeltPoolColumn::Depth,
        MeltPoolColumn::ReferenceWidth,
        MeltPoolColumn::ReferenceDepth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MeltPoolColumn::Length => "length",
            MeltPoolColumn::Width => "width",
            MeltPoolColumn::Depth => "depth",
            MeltPoolColumn::ReferenceWidth => "reference_width",
            MeltPoolColumn::ReferenceDepth => "reference_depth",
        }
    }
}

/// Index column name of the melt pool table.
pub const BEAD_LENGTH_INDEX: &str = "bead_length";

/// One row of the melt pool table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeltPoolRow {
    pub bead_length: f64,
    pub length: f64,
    pub width: f64,
    pub depth: f64,
    pub reference_width: f64,
    pub reference_depth: f64,
}

/// Melt pool dimensions for every time step of a single bead simulation.
///
/// Stored column-wise; all columns have the same length. The index is the
/// laser position along the bead at each step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeltPool {
    bead_length: Vec<f64>,
    length: Vec<f64>,
    width: Vec<f64>,
    depth: Vec<f64>,
    reference_width: Vec<f64>,
    reference_depth: Vec<f64>,
}

impl MeltPool {
    pub fn from_message(msg: &proto::MeltPool) -> Self {
        let steps = &msg.time_steps;
        let collect = |f: fn(&proto::MeltPoolTimeStep) -> f64| steps.iter().map(f).collect();
        Self {
            bead_length: collect(|ts| ts.laser_x),
            length: collect(|ts| ts.length),
            width: collect(|ts| ts.width),
            depth: collect(|ts| ts.depth),
            reference_width: collect(|ts| ts.reference_width),
            reference_depth: collect(|ts| ts.reference_depth),
        }
    }

    pub fn len(&self) -> usize {
        self.bead_length.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bead_length.is_empty()
    }

    /// Table index: bead length traveled at each time step (m).
    pub fn index(&self) -> &[f64] {
        &self.bead_length
    }

    pub fn column(&self, column: MeltPoolColumn) -> &[f64] {
        match column {
            MeltPoolColumn::Length => &self.length,
            MeltPoolColumn::Width => &self.width,
            MeltPoolColumn::Depth => &self.depth,
            MeltPoolColumn::ReferenceWidth => &self.reference_width,
            MeltPoolColumn::ReferenceDepth => &self.reference_depth,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = MeltPoolRow> + '_ {
        (0..self.len()).map(move |i| MeltPoolRow {
            bead_length: self.bead_length[i],
            length: self.length[i],
            width: self.width[i],
            depth: self.depth[i],
            reference_width: self.reference_width[i],
            reference_depth: self.reference_depth[i],
        })
    }

    /// Write the table as CSV, index first.
    pub fn write_csv<W: Write>(&self, mut out: W) -> Result<()> {
        write!(out, "{BEAD_LENGTH_INDEX}")?;
        for column in MeltPoolColumn::ALL {
            write!(out, ",{}", column.name())?;
        }
        writeln!(out)?;
        for row in self.rows() {
            writeln!(
                out,
                "{},{},{},{},{},{}",
                row.bead_length,
                row.length,
                row.width,
                row.depth,
                row.reference_width,
                row.reference_depth
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for MeltPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MeltPool")?;
        write!(f, "{BEAD_LENGTH_INDEX}")?;
        for column in MeltPoolColumn::ALL {
            write!(f, " {}", column.name())?;
        }
        writeln!(f)?;
        for row in self.rows() {
            writeln!(
                f,
                "{} {} {} {} {} {}",
                row.bead_length,
                row.length,
                row.width,
                row.depth,
                row.reference_width,
                row.reference_depth
            )?;
        }
        Ok(())
    }
}

/// Result of a single bead simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleBeadSummary {
    input: SingleBeadInput,
    melt_pool: MeltPool,
}

impl SingleBeadSummary {
    pub fn new(input: SingleBeadInput, msg: &proto::MeltPool) -> Self {
        Self {
            input,
            melt_pool: MeltPool::from_message(msg),
        }
    }

    pub fn input(&self) -> &SingleBeadInput {
        &self.input
    }

    pub fn melt_pool(&self) -> &MeltPool {
        &self.melt_pool
    }
}

impl fmt::Display for SingleBeadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SingleBeadSummary")?;
        writeln!(f, "input: {}", self.input)?;
        write!(f, "melt_pool: {}", self.melt_pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn melt_pool_msg() -> proto::MeltPool {
        proto::MeltPool {
            time_steps: (0..3)
                .map(|i| {
                    let i = i as f64;
                    proto::MeltPoolTimeStep {
                        laser_x: i * 1e-4,
                        laser_y: 0.0,
                        length: 1.0 + i,
                        width: 2.0 + i,
                        depth: 3.0 + i,
                        reference_width: 4.0 + i,
                        reference_depth: 5.0 + i,
                    }
                })
                .collect(),
        }
    }

    #[test]
    fn defaults() {
        let input = SingleBeadInput::default();
        assert_eq!(input.id, "");
        assert_eq!(input.bead_length(), 3e-3);
        assert_eq!(input.machine, Machine::default());
        assert_eq!(input.material, Material::default());
    }

    #[test]
    fn bead_length_bounds() {
        let mut input = SingleBeadInput::default();
        assert!(input.set_bead_length(1e-3).is_ok());
        assert!(input.set_bead_length(1e-2).is_ok());
        let err = input.set_bead_length(0.02).unwrap_err();
        assert_eq!(err.to_string(), "bead_length must be between 0.001 and 0.01.");
        assert_eq!(input.bead_length(), 1e-2);
    }

    #[test]
    fn request_embeds_machine_material_and_length() {
        let mut machine = Machine::default();
        machine.set_laser_power(99.0).unwrap();
        let input = SingleBeadInput::new("myId", machine, Material::named("vibranium"))
            .with_bead_length(0.0012)
            .unwrap();

        let request = input.to_request();
        assert_eq!(request.id, "myId");
        match request.input {
            Some(proto::simulation_request::Input::SingleBeadInput(sb)) => {
                assert_eq!(sb.machine.unwrap().laser_power, 99.0);
                assert_eq!(sb.material.unwrap().name, "vibranium");
                assert_eq!(sb.bead_length, 0.0012);
            }
            other => panic!("unexpected input: {other:?}"),
        }
    }

    #[test]
    fn request_building_is_idempotent() {
        let input = SingleBeadInput::new("x", Machine::default(), Material::named("m"));
        assert_eq!(input.to_request(), input.to_request());
    }

    #[test]
    fn config_applies_range_checks() {
        let cfg = SingleBeadConfig {
            bead_length: Some(0.5),
            ..Default::default()
        };
        assert!(SingleBeadInput::try_from(cfg).is_err());
    }

    #[test]
    fn melt_pool_expands_time_steps_into_columns() {
        let pool = MeltPool::from_message(&melt_pool_msg());
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.index(), &[0.0, 1e-4, 2e-4]);
        assert_eq!(pool.column(MeltPoolColumn::Width), &[2.0, 3.0, 4.0]);
        assert_eq!(pool.column(MeltPoolColumn::ReferenceDepth), &[5.0, 6.0, 7.0]);
        let last = pool.rows().last().unwrap();
        assert_eq!(last.depth, 5.0);
    }

    #[test]
    fn melt_pool_csv() {
        let pool = MeltPool::from_message(&melt_pool_msg());
        let mut buf = Vec::new();
        pool.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("bead_length,length,width,depth,reference_width,reference_depth")
        );
        assert_eq!(lines.next(), Some("0,1,2,3,4,5"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn empty_melt_pool() {
        let pool = MeltPool::from_message(&proto::MeltPool::default());
        assert!(pool.is_empty());
        assert_eq!(pool.rows().count(), 0);
    }

    #[test]
    fn summary_equality_uses_table() {
        let input = SingleBeadInput::default();
        let a = SingleBeadSummary::new(input.clone(), &melt_pool_msg());
        let b = SingleBeadSummary::new(input, &melt_pool_msg());
        assert_eq!(a, b);
        assert_eq!(a.melt_pool().len(), 3);
    }
}
