// MIT License
// Copyright 2023--present additive developers

//! Microstructure simulation: grain structure of a sample cube.
//!
//! The sample cube is placed at `sample_min_*` with edge lengths
//! `sample_size_*`. The server cuts three orthogonal planes through it of
//! side `sensor_dimension` and returns one VTK file plus circle equivalence
//! grain statistics per plane.
//!
//! Unless `use_provided_thermal_parameters` is set the server derives cooling
//! rate, thermal gradient and melt pool size from the machine and material
//! and the corresponding fields here are ignored.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{self, ConfigObject};
use crate::error::{check_range, Error, Result};
use crate::limits::Limits;
use crate::machine::{Machine, MachineConfig};
use crate::material::Material;
use crate::proto;

pub const SAMPLE_MIN: Limits = Limits::new(0.0, 0.0, 0.01);
pub const SAMPLE_SIZE: Limits = Limits::new(1.5e-3, 1e-3, 1e-2);
pub const SENSOR_DIMENSION: Limits = Limits::new(5e-4, 1e-4, 1e-3);
/// K/s
pub const COOLING_RATE: Limits = Limits::new(1e6, 1e5, 1e7);
/// K/m
pub const THERMAL_GRADIENT: Limits = Limits::new(1e7, 1e5, 1e8);
pub const MELT_POOL_WIDTH: Limits = Limits::new(1.5e-4, 7.5e-5, 8e-4);
pub const MELT_POOL_DEPTH: Limits = Limits::new(1e-4, 1.5e-5, 8e-4);
pub const MIN_RANDOM_SEED: u32 = 1;
pub const MAX_RANDOM_SEED: u32 = u32::MAX;

/// Minimum margin between the sensor plane and the sample edge (m).
pub const MIN_SIZE_MARGIN: f64 = 5e-4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MicrostructureInput {
    pub id: String,
    sample_min_x: f64,
    sample_min_y: f64,
    sample_min_z: f64,
    sample_size_x: f64,
    sample_size_y: f64,
    sample_size_z: f64,
    sensor_dimension: f64,
    pub use_provided_thermal_parameters: bool,
    cooling_rate: f64,
    thermal_gradient: f64,
    melt_pool_width: f64,
    melt_pool_depth: f64,
    random_seed: Option<u32>,
    pub machine: Machine,
    pub material: Material,
}

impl Default for MicrostructureInput {
    fn default() -> Self {
        Self {
            id: String::new(),
            sample_min_x: SAMPLE_MIN.default,
            sample_min_y: SAMPLE_MIN.default,
            sample_min_z: SAMPLE_MIN.default,
            sample_size_x: SAMPLE_SIZE.default,
            sample_size_y: SAMPLE_SIZE.default,
            sample_size_z: SAMPLE_SIZE.default,
            sensor_dimension: SENSOR_DIMENSION.default,
            use_provided_thermal_parameters: false,
            cooling_rate: COOLING_RATE.default,
            thermal_gradient: THERMAL_GRADIENT.default,
            melt_pool_width: MELT_POOL_WIDTH.default,
            melt_pool_depth: MELT_POOL_DEPTH.default,
            random_seed: None,
            machine: Machine::default(),
            material: Material::default(),
        }
    }
}

macro_rules! bounded_field {
    ($field:ident, $setter:ident, $limits:expr) => {
        pub fn $field(&self) -> f64 {
            self.$field
        }

        pub fn $setter(&mut self, value: f64) -> Result<()> {
            self.$field = $limits.check(stringify!($field), value)?;
            Ok(())
        }
    };
}

impl MicrostructureInput {
    pub fn new(id: impl Into<String>, machine: Machine, material: Material) -> Self {
        Self {
            id: id.into(),
            machine,
            material,
            ..Default::default()
        }
    }

    bounded_field!(sample_min_x, set_sample_min_x, SAMPLE_MIN);
    bounded_field!(sample_min_y, set_sample_min_y, SAMPLE_MIN);
    bounded_field!(sample_min_z, set_sample_min_z, SAMPLE_MIN);
    bounded_field!(sample_size_x, set_sample_size_x, SAMPLE_SIZE);
    bounded_field!(sample_size_y, set_sample_size_y, SAMPLE_SIZE);
    bounded_field!(sample_size_z, set_sample_size_z, SAMPLE_SIZE);
    bounded_field!(sensor_dimension, set_sensor_dimension, SENSOR_DIMENSION);
    bounded_field!(cooling_rate, set_cooling_rate, COOLING_RATE);
    bounded_field!(thermal_gradient, set_thermal_gradient, THERMAL_GRADIENT);
    bounded_field!(melt_pool_width, set_melt_pool_width, MELT_POOL_WIDTH);
    bounded_field!(melt_pool_depth, set_melt_pool_depth, MELT_POOL_DEPTH);

    pub fn random_seed(&self) -> Option<u32> {
        self.random_seed
    }

    /// `None` lets the server pick a seed.
    pub fn set_random_seed(&mut self, seed: Option<u32>) -> Result<()> {
        if let Some(seed) = seed {
            check_range("random_seed", seed, MIN_RANDOM_SEED, MAX_RANDOM_SEED)?;
        }
        self.random_seed = seed;
        Ok(())
    }

    fn check_sample_sizes(&self) -> Result<()> {
        let required = self.sensor_dimension + MIN_SIZE_MARGIN;
        for (axis, size) in [
            ("sample_size_x", self.sample_size_x),
            ("sample_size_y", self.sample_size_y),
            ("sample_size_z", self.sample_size_z),
        ] {
            if size < required {
                return Err(Error::InvalidValue(format!(
                    "{axis} must be at least {MIN_SIZE_MARGIN} larger than sensor_dimension."
                )));
            }
        }
        Ok(())
    }

    /// Fails when a sample edge is too short to hold the sensor planes.
    pub fn to_request(&self) -> Result<proto::SimulationRequest> {
        self.check_sample_sizes()?;
        let input = proto::MicrostructureInput {
            machine: Some(self.machine.to_message()),
            material: Some(self.material.to_message()),
            cube_min_x: self.sample_min_x,
            cube_min_y: self.sample_min_y,
            cube_min_z: self.sample_min_z,
            cube_size_x: self.sample_size_x,
            cube_size_y: self.sample_size_y,
            cube_size_z: self.sample_size_z,
            sensor_dimension: self.sensor_dimension,
            use_provided_thermal_parameters: self.use_provided_thermal_parameters,
            cooling_rate: self.cooling_rate,
            thermal_gradient: self.thermal_gradient,
            melt_pool_width: self.melt_pool_width,
            melt_pool_depth: self.melt_pool_depth,
            use_random_seed: self.random_seed.is_some(),
            random_seed: self.random_seed.unwrap_or_default(),
        };
        Ok(proto::SimulationRequest {
            id: self.id.clone(),
            input: Some(proto::simulation_request::Input::MicrostructureInput(input)),
        })
    }
}

impl fmt::Display for MicrostructureInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MicrostructureInput")?;
        writeln!(f, "id: {}", self.id)?;
        writeln!(f, "sample_min_x: {}", self.sample_min_x)?;
        writeln!(f, "sample_min_y: {}", self.sample_min_y)?;
        writeln!(f, "sample_min_z: {}", self.sample_min_z)?;
        writeln!(f, "sample_size_x: {}", self.sample_size_x)?;
        writeln!(f, "sample_size_y: {}", self.sample_size_y)?;
        writeln!(f, "sample_size_z: {}", self.sample_size_z)?;
        writeln!(f, "sensor_dimension: {}", self.sensor_dimension)?;
        writeln!(
            f,
            "use_provided_thermal_parameters: {}",
            self.use_provided_thermal_parameters
        )?;
        writeln!(f, "cooling_rate: {}", self.cooling_rate)?;
        writeln!(f, "thermal_gradient: {}", self.thermal_gradient)?;
        writeln!(f, "melt_pool_width: {}", self.melt_pool_width)?;
        writeln!(f, "melt_pool_depth: {}", self.melt_pool_depth)?;
        match self.random_seed {
            Some(seed) => writeln!(f, "random_seed: {seed}")?,
            None => writeln!(f, "random_seed: none")?,
        }
        write!(f, "\nmachine: {}", self.machine)?;
        write!(f, "\nmaterial: {}", self.material)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MicrostructureConfig {
    pub id: Option<String>,
    pub sample_min_x: Option<f64>,
    pub sample_min_y: Option<f64>,
    pub sample_min_z: Option<f64>,
    pub sample_size_x: Option<f64>,
    pub sample_size_y: Option<f64>,
    pub sample_size_z: Option<f64>,
    pub sensor_dimension: Option<f64>,
    pub use_provided_thermal_parameters: Option<bool>,
    pub cooling_rate: Option<f64>,
    pub thermal_gradient: Option<f64>,
    pub melt_pool_width: Option<f64>,
    pub melt_pool_depth: Option<f64>,
    pub random_seed: Option<u32>,
    #[serde(default, deserialize_with = "config::optional_object")]
    pub machine: Option<MachineConfig>,
    #[serde(default, deserialize_with = "config::optional_object")]
    pub material: Option<Material>,
}

impl ConfigObject for MicrostructureConfig {
    const OBJECT: &'static str = "MicrostructureInput";
}

impl TryFrom<MicrostructureConfig> for MicrostructureInput {
    type Error = Error;

    fn try_from(cfg: MicrostructureConfig) -> Result<Self> {
        let mut input = MicrostructureInput {
            id: cfg.id.unwrap_or_default(),
            use_provided_thermal_parameters: cfg.use_provided_thermal_parameters.unwrap_or(false),
            machine: cfg.machine.map(Machine::try_from).transpose()?.unwrap_or_default(),
            material: cfg.material.unwrap_or_default(),
            ..Default::default()
        };
        let setters: [(Option<f64>, fn(&mut MicrostructureInput, f64) -> Result<()>); 11] = [
            (cfg.sample_min_x, MicrostructureInput::set_sample_min_x),
            (cfg.sample_min_y, MicrostructureInput::set_sample_min_y),
            (cfg.sample_min_z, MicrostructureInput::set_sample_min_z),
            (cfg.sample_size_x, MicrostructureInput::set_sample_size_x),
            (cfg.sample_size_y, MicrostructureInput::set_sample_size_y),
            (cfg.sample_size_z, MicrostructureInput::set_sample_size_z),
            (cfg.sensor_dimension, MicrostructureInput::set_sensor_dimension),
            (cfg.cooling_rate, MicrostructureInput::set_cooling_rate),
            (cfg.thermal_gradient, MicrostructureInput::set_thermal_gradient),
            (cfg.melt_pool_width, MicrostructureInput::set_melt_pool_width),
            (cfg.melt_pool_depth, MicrostructureInput::set_melt_pool_depth),
        ];
        for (value, set) in setters {
            if let Some(v) = value {
                set(&mut input, v)?;
            }
        }
        input.set_random_seed(cfg.random_seed)?;
        Ok(input)
    }
}

/// Circle equivalence statistics of one grain in a sensor plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrainStatistics {
    pub grain_number: i32,
    pub area_fraction: f64,
    pub diameter_um: f64,
    /// Degrees.
    pub orientation_angle: f64,
}

impl GrainStatistics {
    pub fn from_message(msg: &proto::GrainStatistics) -> Self {
        Self {
            grain_number: msg.grain_number,
            area_fraction: msg.area_fraction,
            diameter_um: msg.diameter_um,
            orientation_angle: msg.orientation_angle,
        }
    }
}

/// Sensor plane of a microstructure result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    Xy,
    Xz,
    Yz,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Xy, Plane::Xz, Plane::Yz];

    pub fn file_name(self) -> &'static str {
        match self {
            Plane::Xy => "xy.vtk",
            Plane::Xz => "xz.vtk",
            Plane::Yz => "yz.vtk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MicrostructureSummary {
    input: MicrostructureInput,
    #[serde(skip)]
    xy_vtk: Vec<u8>,
    #[serde(skip)]
    xz_vtk: Vec<u8>,
    #[serde(skip)]
    yz_vtk: Vec<u8>,
    xy_circle_equivalence: Vec<GrainStatistics>,
    xz_circle_equivalence: Vec<GrainStatistics>,
    yz_circle_equivalence: Vec<GrainStatistics>,
}

impl MicrostructureSummary {
    pub fn new(input: MicrostructureInput, result: &proto::MicrostructureResult) -> Self {
        let stats = |rows: &[proto::GrainStatistics]| {
            rows.iter().map(GrainStatistics::from_message).collect()
        };
        Self {
            input,
            xy_vtk: result.xy_vtk.clone(),
            xz_vtk: result.xz_vtk.clone(),
            yz_vtk: result.yz_vtk.clone(),
            xy_circle_equivalence: stats(&result.xy_circle_equivalence),
            xz_circle_equivalence: stats(&result.xz_circle_equivalence),
            yz_circle_equivalence: stats(&result.yz_circle_equivalence),
        }
    }

    pub fn input(&self) -> &MicrostructureInput {
        &self.input
    }

    /// Raw VTK file content of one plane.
    pub fn vtk(&self, plane: Plane) -> &[u8] {
        match plane {
            Plane::Xy => &self.xy_vtk,
            Plane::Xz => &self.xz_vtk,
            Plane::Yz => &self.yz_vtk,
        }
    }

    pub fn circle_equivalence(&self, plane: Plane) -> &[GrainStatistics] {
        match plane {
            Plane::Xy => &self.xy_circle_equivalence,
            Plane::Xz => &self.xz_circle_equivalence,
            Plane::Yz => &self.yz_circle_equivalence,
        }
    }

    /// Write `xy.vtk`, `xz.vtk` and `yz.vtk` into `dir`, creating it if needed.
    pub fn write_vtk_files(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(Plane::ALL.len());
        for plane in Plane::ALL {
            let path = dir.join(plane.file_name());
            fs::write(&path, self.vtk(plane))?;
            written.push(path);
        }
        tracing::debug!(dir = %dir.display(), "wrote microstructure vtk files");
        Ok(written)
    }
}

impl fmt::Display for MicrostructureSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MicrostructureSummary")?;
        writeln!(f, "input: {}", self.input)?;
        for plane in Plane::ALL {
            writeln!(
                f,
                "{}: {} bytes, {} grains",
                plane.file_name(),
                self.vtk(plane).len(),
                self.circle_equivalence(plane).len()
            )?;
        }
        Ok(())
    }
}
