// MIT License
// Copyright 2023--present additive developers

//! Material tuning: fit custom material parameters to measured melt pool
//! dimensions.
//!
//! The input files are the ones described in the tuning tool documentation:
//! an experiment CSV, a material parameter JSON, a thermal properties lookup
//! CSV and, optionally, a characteristic width lookup CSV to refine.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{check_exists, check_range, Error, Result};
use crate::limits::Limits;
use crate::proto;

pub const ALLOWABLE_ERROR_DEFAULT: f64 = 0.05;
pub const MAX_ITERATIONS_DEFAULT: i32 = 15;
pub const MAX_ITERATIONS_MIN: i32 = 1;
pub const MAX_ITERATIONS_MAX: i32 = 1000;
/// Kelvin.
pub const BASE_PLATE_TEMPERATURE: Limits = Limits::new(353.15, 293.15, 773.15);

pub const OPTIMIZED_PARAMETERS_FILE: &str = "optimized_parameters.json";
pub const CHARACTERISTIC_WIDTH_LOOKUP_FILE: &str = "characteristic_width_lookup.csv";
pub const LOG_FILE: &str = "tuning.log";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialTuningInput {
    pub id: String,
    experiment_data_file: PathBuf,
    material_parameters_file: PathBuf,
    thermal_properties_lookup_file: PathBuf,
    characteristic_width_lookup_file: Option<PathBuf>,
    allowable_error: f64,
    max_iterations: i32,
    base_plate_temperature: f64,
}

impl MaterialTuningInput {
    /// Every path must exist.
    pub fn new(
        id: impl Into<String>,
        experiment_data_file: impl Into<PathBuf>,
        material_parameters_file: impl Into<PathBuf>,
        thermal_properties_lookup_file: impl Into<PathBuf>,
    ) -> Result<Self> {
        let experiment_data_file = existing(experiment_data_file)?;
        let material_parameters_file = existing(material_parameters_file)?;
        let thermal_properties_lookup_file = existing(thermal_properties_lookup_file)?;
        Ok(Self {
            id: id.into(),
            experiment_data_file,
            material_parameters_file,
            thermal_properties_lookup_file,
            characteristic_width_lookup_file: None,
            allowable_error: ALLOWABLE_ERROR_DEFAULT,
            max_iterations: MAX_ITERATIONS_DEFAULT,
            base_plate_temperature: BASE_PLATE_TEMPERATURE.default,
        })
    }

    pub fn experiment_data_file(&self) -> &Path {
        &self.experiment_data_file
    }

    pub fn set_experiment_data_file(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.experiment_data_file = existing(path)?;
        Ok(())
    }

    pub fn material_parameters_file(&self) -> &Path {
        &self.material_parameters_file
    }

    pub fn set_material_parameters_file(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.material_parameters_file = existing(path)?;
        Ok(())
    }

    pub fn thermal_properties_lookup_file(&self) -> &Path {
        &self.thermal_properties_lookup_file
    }

    pub fn set_thermal_properties_lookup_file(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.thermal_properties_lookup_file = existing(path)?;
        Ok(())
    }

    pub fn characteristic_width_lookup_file(&self) -> Option<&Path> {
        self.characteristic_width_lookup_file.as_deref()
    }

    pub fn set_characteristic_width_lookup_file(
        &mut self,
        path: Option<impl Into<PathBuf>>,
    ) -> Result<()> {
        self.characteristic_width_lookup_file = path.map(existing).transpose()?;
        Ok(())
    }

    pub fn allowable_error(&self) -> f64 {
        self.allowable_error
    }

    /// Relative error at which the fit stops, in `(0, 1]`.
    pub fn set_allowable_error(&mut self, value: f64) -> Result<()> {
        if !(value > 0.0 && value <= 1.0) {
            return Err(Error::InvalidValue(
                "allowable_error must be greater than 0 and at most 1.".into(),
            ));
        }
        self.allowable_error = value;
        Ok(())
    }

    pub fn max_iterations(&self) -> i32 {
        self.max_iterations
    }

    pub fn set_max_iterations(&mut self, value: i32) -> Result<()> {
        check_range("max_iterations", value, MAX_ITERATIONS_MIN, MAX_ITERATIONS_MAX)?;
        self.max_iterations = value;
        Ok(())
    }

    pub fn base_plate_temperature(&self) -> f64 {
        self.base_plate_temperature
    }

    pub fn set_base_plate_temperature(&mut self, value: f64) -> Result<()> {
        self.base_plate_temperature =
            BASE_PLATE_TEMPERATURE.check("base_plate_temperature", value)?;
        Ok(())
    }

    /// Read every input file into a request.
    pub fn to_request(&self) -> Result<proto::MaterialTuningRequest> {
        let characteristic_width_lookup = match &self.characteristic_width_lookup_file {
            Some(path) => fs::read(path)?,
            None => Vec::new(),
        };
        let input = proto::MaterialTuningInput {
            experiment_data: fs::read(&self.experiment_data_file)?,
            material_parameters: fs::read(&self.material_parameters_file)?,
            thermal_properties_lookup: fs::read(&self.thermal_properties_lookup_file)?,
            characteristic_width_lookup,
            allowable_error: self.allowable_error,
            max_iterations: self.max_iterations,
            base_plate_temperature: self.base_plate_temperature,
        };
        Ok(proto::MaterialTuningRequest {
            id: self.id.clone(),
            input: Some(input),
        })
    }
}

fn existing(path: impl Into<PathBuf>) -> Result<PathBuf> {
    let path = path.into();
    check_exists(&path)?;
    Ok(path)
}

impl fmt::Display for MaterialTuningInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MaterialTuningInput")?;
        writeln!(f, "id: {}", self.id)?;
        writeln!(f, "experiment_data_file: {}", self.experiment_data_file.display())?;
        writeln!(
            f,
            "material_parameters_file: {}",
            self.material_parameters_file.display()
        )?;
        writeln!(
            f,
            "thermal_properties_lookup_file: {}",
            self.thermal_properties_lookup_file.display()
        )?;
        match &self.characteristic_width_lookup_file {
            Some(path) => writeln!(f, "characteristic_width_lookup_file: {}", path.display())?,
            None => writeln!(f, "characteristic_width_lookup_file: none")?,
        }
        writeln!(f, "allowable_error: {}", self.allowable_error)?;
        writeln!(f, "max_iterations: {}", self.max_iterations)?;
        writeln!(f, "base_plate_temperature: {}", self.base_plate_temperature)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialTuningConfig {
    pub id: Option<String>,
    pub experiment_data_file: PathBuf,
    pub material_parameters_file: PathBuf,
    pub thermal_properties_lookup_file: PathBuf,
    pub characteristic_width_lookup_file: Option<PathBuf>,
    pub allowable_error: Option<f64>,
    pub max_iterations: Option<i32>,
    pub base_plate_temperature: Option<f64>,
}

impl TryFrom<MaterialTuningConfig> for MaterialTuningInput {
    type Error = Error;

    fn try_from(cfg: MaterialTuningConfig) -> Result<Self> {
        let mut input = MaterialTuningInput::new(
            cfg.id.unwrap_or_default(),
            cfg.experiment_data_file,
            cfg.material_parameters_file,
            cfg.thermal_properties_lookup_file,
        )?;
        input.set_characteristic_width_lookup_file(cfg.characteristic_width_lookup_file)?;
        if let Some(v) = cfg.allowable_error {
            input.set_allowable_error(v)?;
        }
        if let Some(v) = cfg.max_iterations {
            input.set_max_iterations(v)?;
        }
        if let Some(v) = cfg.base_plate_temperature {
            input.set_base_plate_temperature(v)?;
        }
        Ok(input)
    }
}

/// Files produced by a tuning run, held in memory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialTuningSummary {
    input: MaterialTuningInput,
    #[serde(skip)]
    optimized_parameters: Vec<u8>,
    #[serde(skip)]
    characteristic_width_lookup: Vec<u8>,
    #[serde(skip)]
    log: Vec<u8>,
}

impl MaterialTuningSummary {
    pub fn new(input: MaterialTuningInput, result: &proto::MaterialTuningResult) -> Self {
        Self {
            input,
            optimized_parameters: result.optimized_parameters.clone(),
            characteristic_width_lookup: result.characteristic_width_lookup.clone(),
            log: result.log.clone(),
        }
    }

    pub fn input(&self) -> &MaterialTuningInput {
        &self.input
    }

    /// Material parameter JSON with the fitted coefficients.
    pub fn optimized_parameters(&self) -> &[u8] {
        &self.optimized_parameters
    }

    pub fn characteristic_width_lookup(&self) -> &[u8] {
        &self.characteristic_width_lookup
    }

    pub fn log(&self) -> &[u8] {
        &self.log
    }

    /// Write the three result files into `dir`, creating it if needed.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        fs::write(dir.join(OPTIMIZED_PARAMETERS_FILE), &self.optimized_parameters)?;
        fs::write(
            dir.join(CHARACTERISTIC_WIDTH_LOOKUP_FILE),
            &self.characteristic_width_lookup,
        )?;
        fs::write(dir.join(LOG_FILE), &self.log)?;
        tracing::info!(dir = %dir.display(), id = %self.input.id, "wrote material tuning results");
        Ok(())
    }
}

impl fmt::Display for MaterialTuningSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MaterialTuningSummary")?;
        writeln!(f, "input: {}", self.input)?;
        writeln!(f, "optimized_parameters: {} bytes", self.optimized_parameters.len())?;
        writeln!(
            f,
            "characteristic_width_lookup: {} bytes",
            self.characteristic_width_lookup.len()
        )?;
        writeln!(f, "log: {} bytes", self.log.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            for (name, body) in [
                ("experiment.csv", "power,speed,width\n"),
                ("material.json", "{}"),
                ("thermal.csv", "Temperature(K)\n"),
                ("cw.csv", "Laser Power(W)\n"),
            ] {
                let mut f = fs::File::create(dir.path().join(name)).unwrap();
                f.write_all(body.as_bytes()).unwrap();
            }
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn input(&self) -> MaterialTuningInput {
            MaterialTuningInput::new(
                "tune",
                self.path("experiment.csv"),
                self.path("material.json"),
                self.path("thermal.csv"),
            )
            .unwrap()
        }
    }

    #[test]
    fn defaults() {
        let fx = Fixture::new();
        let input = fx.input();
        assert_eq!(input.allowable_error(), 0.05);
        assert_eq!(input.max_iterations(), 15);
        assert_eq!(input.base_plate_temperature(), 353.15);
        assert_eq!(input.characteristic_width_lookup_file(), None);
    }

    #[test]
    fn missing_file_rejected() {
        let fx = Fixture::new();
        let err = MaterialTuningInput::new(
            "tune",
            fx.path("nope.csv"),
            fx.path("material.json"),
            fx.path("thermal.csv"),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("File does not exist, "));

        let mut input = fx.input();
        assert!(input
            .set_characteristic_width_lookup_file(Some(fx.path("nope.csv")))
            .is_err());
    }

    #[test]
    fn scalar_bounds() {
        let fx = Fixture::new();
        let mut input = fx.input();
        assert!(input.set_allowable_error(0.0).is_err());
        assert!(input.set_allowable_error(1.0).is_ok());
        assert!(input.set_max_iterations(MAX_ITERATIONS_MIN).is_ok());
        assert!(input.set_max_iterations(MAX_ITERATIONS_MAX).is_ok());
        assert!(input.set_max_iterations(0).is_err());
        let err = input.set_max_iterations(1001).unwrap_err();
        assert_eq!(err.to_string(), "max_iterations must be between 1 and 1000.");
        assert!(input.set_base_plate_temperature(200.0).is_err());
        assert!(input.set_base_plate_temperature(773.15).is_ok());
    }

    #[test]
    fn request_reads_files() {
        let fx = Fixture::new();
        let mut input = fx.input();
        let request = input.to_request().unwrap();
        let body = request.input.unwrap();
        assert_eq!(body.experiment_data, b"power,speed,width\n");
        assert_eq!(body.material_parameters, b"{}");
        assert!(body.characteristic_width_lookup.is_empty());

        input
            .set_characteristic_width_lookup_file(Some(fx.path("cw.csv")))
            .unwrap();
        let body = input.to_request().unwrap().input.unwrap();
        assert_eq!(body.characteristic_width_lookup, b"Laser Power(W)\n");
    }

    #[test]
    fn summary_write_to() {
        let fx = Fixture::new();
        let result = proto::MaterialTuningResult {
            log: b"done".to_vec(),
            optimized_parameters: b"{\"absorptivity_maximum\": 0.8}".to_vec(),
            characteristic_width_lookup: b"a,b\n".to_vec(),
        };
        let summary = MaterialTuningSummary::new(fx.input(), &result);
        let out = fx.path("results");
        summary.write_to(&out).unwrap();
        assert_eq!(fs::read(out.join(LOG_FILE)).unwrap(), b"done");
        assert_eq!(
            fs::read(out.join(CHARACTERISTIC_WIDTH_LOOKUP_FILE)).unwrap(),
            b"a,b\n"
        );
        assert!(out.join(OPTIMIZED_PARAMETERS_FILE).exists());
    }
}
