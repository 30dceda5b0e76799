// MIT License
// Copyright 2023--present additive developers

//! Thermal history simulation of a part geometry, sampled by a coaxial
//! average sensor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{self, ConfigObject};
use crate::error::{Error, Result};
use crate::geometry::{Geometry, GeometryConfig};
use crate::machine::{Machine, MachineConfig};
use crate::material::Material;
use crate::proto;

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RangeConfig")]
pub struct Range {
    min: f64,
    max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        // NaN fails the comparison and is rejected with the inverted case.
        if !(min <= max) {
            return Err(Error::InvalidValue(
                "Attempted to initialize Range with min greater than max".into(),
            ));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn to_message(&self) -> proto::Range {
        proto::Range {
            min: self.min,
            max: self.max,
        }
    }

    pub fn from_message(msg: &proto::Range) -> Result<Self> {
        Self::new(msg.min, msg.max)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Range")?;
        writeln!(f, "min: {}", self.min)?;
        writeln!(f, "max: {}", self.max)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeConfig {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ConfigObject for RangeConfig {
    const OBJECT: &'static str = "Range";
}

impl TryFrom<RangeConfig> for Range {
    type Error = Error;

    fn try_from(cfg: RangeConfig) -> Result<Self> {
        Range::new(cfg.min.unwrap_or_default(), cfg.max.unwrap_or_default())
    }
}

/// Coaxial average sensor: a radius around the laser axis and the z
/// intervals over which readings are averaged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoaxialAverageSensorInputs {
    radius: f64,
    z_heights: Vec<Range>,
}

impl CoaxialAverageSensorInputs {
    pub fn new(radius: f64, z_heights: Vec<Range>) -> Result<Self> {
        let mut sensor = Self {
            radius: 0.0,
            z_heights,
        };
        sensor.set_radius(radius)?;
        Ok(sensor)
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f64) -> Result<()> {
        if !(radius >= 0.0) {
            return Err(Error::InvalidValue(
                "Attempted to initialize CoaxialAverageSensorInputs with negative sensor radius"
                    .into(),
            ));
        }
        self.radius = radius;
        Ok(())
    }

    pub fn z_heights(&self) -> &[Range] {
        &self.z_heights
    }

    pub fn push_z_height(&mut self, range: Range) {
        self.z_heights.push(range);
    }

    pub fn to_message(&self) -> proto::CoaxialAverageSensorInputs {
        proto::CoaxialAverageSensorInputs {
            sensor_radius: self.radius,
            z_heights: self.z_heights.iter().map(Range::to_message).collect(),
        }
    }

    pub fn from_message(msg: &proto::CoaxialAverageSensorInputs) -> Result<Self> {
        let z_heights = msg
            .z_heights
            .iter()
            .map(Range::from_message)
            .collect::<Result<Vec<_>>>()?;
        Self::new(msg.sensor_radius, z_heights)
    }
}

impl fmt::Display for CoaxialAverageSensorInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CoaxialAverageSensorInputs")?;
        writeln!(f, "radius: {}", self.radius)?;
        write!(f, "z_heights:")?;
        for range in &self.z_heights {
            write!(f, " [{}, {}]", range.min, range.max)?;
        }
        writeln!(f)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoaxialAverageSensorConfig {
    pub radius: Option<f64>,
    #[serde(default, deserialize_with = "config::optional_objects")]
    pub z_heights: Option<Vec<RangeConfig>>,
}

impl ConfigObject for CoaxialAverageSensorConfig {
    const OBJECT: &'static str = "CoaxialAverageSensorInputs";
}

impl TryFrom<CoaxialAverageSensorConfig> for CoaxialAverageSensorInputs {
    type Error = Error;

    fn try_from(cfg: CoaxialAverageSensorConfig) -> Result<Self> {
        let z_heights = cfg
            .z_heights
            .unwrap_or_default()
            .into_iter()
            .map(Range::try_from)
            .collect::<Result<Vec<_>>>()?;
        Self::new(cfg.radius.unwrap_or_default(), z_heights)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThermalHistoryInput {
    pub id: String,
    pub machine: Machine,
    pub material: Material,
    pub coax_ave_sensor_inputs: CoaxialAverageSensorInputs,
    /// Must be assigned before a request can be built.
    pub geometry: Option<Geometry>,
}

impl ThermalHistoryInput {
    pub fn new(id: impl Into<String>, machine: Machine, material: Material) -> Self {
        Self {
            id: id.into(),
            machine,
            material,
            ..Default::default()
        }
    }

    pub fn with_geometry(mut self, geometry: impl Into<Geometry>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    /// Build the request referencing the geometry already uploaded to
    /// `remote_geometry_path` on the server.
    pub fn to_request(&self, remote_geometry_path: &str) -> Result<proto::SimulationRequest> {
        let geometry = self.geometry.as_ref().ok_or_else(|| {
            Error::MissingPrerequisite(
                "Attempted to create simulation request without defining geometry".into(),
            )
        })?;
        if remote_geometry_path.is_empty() {
            return Err(Error::MissingPrerequisite(
                "Attempted to create simulation request with empty remote_geometry_path".into(),
            ));
        }
        let input = proto::ThermalHistoryInput {
            machine: Some(self.machine.to_message()),
            material: Some(self.material.to_message()),
            coax_ave_sensor_inputs: Some(self.coax_ave_sensor_inputs.to_message()),
            geometry: Some(geometry.to_message(remote_geometry_path)),
        };
        Ok(proto::SimulationRequest {
            id: self.id.clone(),
            input: Some(proto::simulation_request::Input::ThermalHistoryInput(input)),
        })
    }
}

impl fmt::Display for ThermalHistoryInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ThermalHistoryInput")?;
        writeln!(f, "id: {}", self.id)?;
        write!(f, "\nmachine: {}", self.machine)?;
        write!(f, "\nmaterial: {}", self.material)?;
        write!(f, "\ncoax_ave_sensor_inputs: {}", self.coax_ave_sensor_inputs)?;
        match &self.geometry {
            Some(geometry) => write!(f, "\ngeometry: {geometry}"),
            None => writeln!(f, "\ngeometry: none"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThermalHistoryConfig {
    pub id: Option<String>,
    #[serde(default, deserialize_with = "config::optional_object")]
    pub machine: Option<MachineConfig>,
    #[serde(default, deserialize_with = "config::optional_object")]
    pub material: Option<Material>,
    #[serde(default, deserialize_with = "config::optional_object")]
    pub coax_ave_sensor_inputs: Option<CoaxialAverageSensorConfig>,
    #[serde(default, deserialize_with = "config::optional_object")]
    pub geometry: Option<GeometryConfig>,
}

impl ConfigObject for ThermalHistoryConfig {
    const OBJECT: &'static str = "ThermalHistoryInput";
}

impl TryFrom<ThermalHistoryConfig> for ThermalHistoryInput {
    type Error = Error;

    fn try_from(cfg: ThermalHistoryConfig) -> Result<Self> {
        Ok(ThermalHistoryInput {
            id: cfg.id.unwrap_or_default(),
            machine: cfg.machine.map(Machine::try_from).transpose()?.unwrap_or_default(),
            material: cfg.material.unwrap_or_default(),
            coax_ave_sensor_inputs: cfg
                .coax_ave_sensor_inputs
                .map(CoaxialAverageSensorInputs::try_from)
                .transpose()?
                .unwrap_or_default(),
            geometry: cfg.geometry.map(Geometry::try_from).transpose()?,
        })
    }
}

/// Result of a thermal history simulation.
///
/// The sensor data stays on the server; download it with
/// [`crate::AdditiveClient::download_file`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThermalHistorySummary {
    input: ThermalHistoryInput,
    remote_coax_ave_zip_file: String,
}

impl ThermalHistorySummary {
    pub fn new(input: ThermalHistoryInput, result: &proto::ThermalHistoryResult) -> Self {
        Self {
            input,
            remote_coax_ave_zip_file: result.coax_ave_zip_file.clone(),
        }
    }

    pub fn input(&self) -> &ThermalHistoryInput {
        &self.input
    }

    pub fn remote_coax_ave_zip_file(&self) -> &str {
        &self.remote_coax_ave_zip_file
    }
}

impl fmt::Display for ThermalHistorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ThermalHistorySummary")?;
        writeln!(f, "input: {}", self.input)?;
        writeln!(f, "remote_coax_ave_zip_file: {}", self.remote_coax_ave_zip_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BuildFile, MachineType, StlFile};

    #[test]
    fn range_rejects_inverted_bounds() {
        let err = Range::new(100.0, 99.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attempted to initialize Range with min greater than max"
        );
        let range = Range::new(99.0, 100.0).unwrap();
        assert_eq!((range.min(), range.max()), (99.0, 100.0));
        assert!(Range::new(5.0, 5.0).is_ok());
    }

    #[test]
    fn range_rejects_nan_bounds() {
        assert!(matches!(Range::new(f64::NAN, 1.0), Err(Error::InvalidValue(_))));
        assert!(matches!(Range::new(1.0, f64::NAN), Err(Error::InvalidValue(_))));
        assert!(Range::new(f64::NAN, f64::NAN).is_err());
    }

    #[test]
    fn sensor_radius_rejects_nan() {
        assert!(matches!(
            CoaxialAverageSensorInputs::new(f64::NAN, Vec::new()),
            Err(Error::InvalidValue(_))
        ));
        let mut sensor = CoaxialAverageSensorInputs::default();
        assert!(sensor.set_radius(f64::NAN).is_err());
        assert_eq!(sensor.radius(), 0.0);
    }

    #[test]
    fn inverted_range_in_config_is_value_error() {
        let text = r#"{"coax_ave_sensor_inputs": {"z_heights": [{"min": 3, "max": 2}]}}"#;
        let cfg: ThermalHistoryConfig =
            crate::config::from_json("ThermalHistoryInput", text).unwrap();
        let err = ThermalHistoryInput::try_from(cfg).unwrap_err();
        assert!(matches!(err, Error::InvalidValue(_)));
        assert_eq!(
            err.to_string(),
            "Attempted to initialize Range with min greater than max"
        );
    }

    #[test]
    fn config_builds_sensor_ranges() {
        let text = r#"{"coax_ave_sensor_inputs": {"radius": 1e-4, "z_heights": [{"min": 1, "max": 2}]}}"#;
        let cfg: ThermalHistoryConfig =
            crate::config::from_json("ThermalHistoryInput", text).unwrap();
        let input = ThermalHistoryInput::try_from(cfg).unwrap();
        assert_eq!(
            input.coax_ave_sensor_inputs.z_heights(),
            &[Range::new(1.0, 2.0).unwrap()]
        );
    }

    #[test]
    fn range_from_inverted_message_fails() {
        assert!(Range::from_message(&proto::Range { min: 2.0, max: 1.0 }).is_err());
    }

    #[test]
    fn range_deserialize_validates() {
        let ok: Range = serde_json::from_str(r#"{"min": 1.0, "max": 2.0}"#).unwrap();
        assert_eq!(ok.max(), 2.0);
        assert!(serde_json::from_str::<Range>(r#"{"min": 3.0, "max": 2.0}"#).is_err());
    }

    #[test]
    fn negative_sensor_radius() {
        let err = CoaxialAverageSensorInputs::new(-1.0, Vec::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attempted to initialize CoaxialAverageSensorInputs with negative sensor radius"
        );
        let sensor = CoaxialAverageSensorInputs::new(0.0, Vec::new()).unwrap();
        assert_eq!(sensor, CoaxialAverageSensorInputs::default());
    }

    #[test]
    fn sensor_message_round_trip() {
        let sensor = CoaxialAverageSensorInputs::new(
            5e-4,
            vec![Range::new(0.0, 1e-3).unwrap(), Range::new(2e-3, 3e-3).unwrap()],
        )
        .unwrap();
        let back = CoaxialAverageSensorInputs::from_message(&sensor.to_message()).unwrap();
        assert_eq!(back, sensor);
    }

    #[test]
    fn request_without_geometry_fails() {
        let err = ThermalHistoryInput::default()
            .to_request("remote.stl")
            .unwrap_err();
        assert!(matches!(err, Error::MissingPrerequisite(_)));
        assert_eq!(
            err.to_string(),
            "Attempted to create simulation request without defining geometry"
        );
    }

    #[test]
    fn request_with_empty_remote_path_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let input = ThermalHistoryInput::default().with_geometry(StlFile::new(file.path()).unwrap());
        let err = input.to_request("").unwrap_err();
        assert!(err.to_string().contains("empty remote_geometry_path"));
    }

    #[test]
    fn request_uses_geometry_branch() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let input = ThermalHistoryInput::new("th", Machine::default(), Material::named("IN718"))
            .with_geometry(BuildFile::new(MachineType::Renishaw, file.path()).unwrap());
        let request = input.to_request("uploads/part.zip").unwrap();
        assert_eq!(request.id, "th");
        match request.input {
            Some(proto::simulation_request::Input::ThermalHistoryInput(th)) => match th.geometry {
                Some(proto::thermal_history_input::Geometry::BuildFile(build)) => {
                    assert_eq!(build.name, "uploads/part.zip");
                    assert_eq!(build.r#type, proto::BuildFileMachineType::Renishaw as i32);
                }
                other => panic!("unexpected geometry: {other:?}"),
            },
            other => panic!("unexpected input: {other:?}"),
        }
    }

    #[test]
    fn summary_keeps_remote_path() {
        let result = proto::ThermalHistoryResult {
            coax_ave_zip_file: "out/coax.zip".into(),
        };
        let summary = ThermalHistorySummary::new(ThermalHistoryInput::default(), &result);
        assert_eq!(summary.remote_coax_ave_zip_file(), "out/coax.zip");
    }
}
