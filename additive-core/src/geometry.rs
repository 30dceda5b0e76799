// MIT License
// Copyright 2023--present additive developers

//! Local geometry file descriptors.
//!
//! A descriptor only records a path on the local filesystem. The path must
//! exist when the descriptor is created and every time it is reassigned; the
//! file itself is read later, when it is uploaded to the server.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{check_exists, Result};
use crate::proto;

/// Machine family a build file was written for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineType {
    #[default]
    None,
    AdditiveIndustries,
    Slm,
    Renishaw,
    Eos,
    Trumpf,
    Hb3d,
    Sisma,
}

impl MachineType {
    pub fn to_message(self) -> proto::BuildFileMachineType {
        use proto::BuildFileMachineType as Wire;
        match self {
            MachineType::None => Wire::None,
            MachineType::AdditiveIndustries => Wire::Ai,
            MachineType::Slm => Wire::Slm,
            MachineType::Renishaw => Wire::Renishaw,
            MachineType::Eos => Wire::Eos,
            MachineType::Trumpf => Wire::Trumpf,
            MachineType::Hb3d => Wire::Hb3d,
            MachineType::Sisma => Wire::Sisma,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MachineType::None => "NONE",
            MachineType::AdditiveIndustries => "ADDITIVE_INDUSTRIES",
            MachineType::Slm => "SLM",
            MachineType::Renishaw => "RENISHAW",
            MachineType::Eos => "EOS",
            MachineType::Trumpf => "TRUMPF",
            MachineType::Hb3d => "HB3D",
            MachineType::Sisma => "SISMA",
        }
    }
}

/// A bare STL geometry file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StlFile {
    path: PathBuf,
}

impl StlFile {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        check_exists(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        check_exists(&path)?;
        self.path = path;
        Ok(())
    }
}

impl fmt::Display for StlFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "StlFile")?;
        writeln!(f, "path: {}", self.path.display())
    }
}

/// Machine specific ZIP bundle holding build instructions, the part geometry
/// and optional support geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildFile {
    machine_type: MachineType,
    path: PathBuf,
}

impl BuildFile {
    pub fn new(machine_type: MachineType, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        check_exists(&path)?;
        Ok(Self { machine_type, path })
    }

    pub fn machine_type(&self) -> MachineType {
        self.machine_type
    }

    pub fn set_machine_type(&mut self, machine_type: MachineType) {
        self.machine_type = machine_type;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        check_exists(&path)?;
        self.path = path;
        Ok(())
    }
}

impl fmt::Display for BuildFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BuildFile")?;
        writeln!(f, "type: {}", self.machine_type.name())?;
        writeln!(f, "path: {}", self.path.display())
    }
}

/// Geometry consumed by simulations that run on a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Geometry {
    Stl(StlFile),
    Build(BuildFile),
}

impl Geometry {
    pub fn local_path(&self) -> &Path {
        match self {
            Geometry::Stl(stl) => stl.path(),
            Geometry::Build(build) => build.path(),
        }
    }

    /// Wire form referencing the already uploaded copy at `remote_path`.
    pub(crate) fn to_message(&self, remote_path: &str) -> proto::thermal_history_input::Geometry {
        use proto::thermal_history_input::Geometry as Wire;
        match self {
            Geometry::Stl(_) => Wire::StlFile(proto::StlFile {
                name: remote_path.to_string(),
            }),
            Geometry::Build(build) => Wire::BuildFile(proto::BuildFile {
                r#type: build.machine_type().to_message() as i32,
                name: remote_path.to_string(),
            }),
        }
    }
}

impl From<StlFile> for Geometry {
    fn from(stl: StlFile) -> Self {
        Geometry::Stl(stl)
    }
}

impl From<BuildFile> for Geometry {
    fn from(build: BuildFile) -> Self {
        Geometry::Build(build)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Geometry::Stl(stl) => fmt::Display::fmt(stl, f),
            Geometry::Build(build) => fmt::Display::fmt(build, f),
        }
    }
}

/// Geometry reference read from a configuration document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum GeometryConfig {
    Stl {
        path: PathBuf,
    },
    Build {
        machine_type: MachineType,
        path: PathBuf,
    },
}

impl crate::config::ConfigObject for GeometryConfig {
    const OBJECT: &'static str = "Geometry";
}

impl TryFrom<GeometryConfig> for Geometry {
    type Error = crate::Error;

    fn try_from(cfg: GeometryConfig) -> Result<Self> {
        Ok(match cfg {
            GeometryConfig::Stl { path } => Geometry::Stl(StlFile::new(path)?),
            GeometryConfig::Build { machine_type, path } => {
                Geometry::Build(BuildFile::new(machine_type, path)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn missing_file_is_rejected_at_construction() {
        let err = StlFile::new("/no/such/part.stl").unwrap_err();
        assert!(matches!(err, Error::InvalidValue(_)));
        assert_eq!(err.to_string(), "File does not exist, /no/such/part.stl");
    }

    #[test]
    fn reassignment_rechecks_existence() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut stl = StlFile::new(file.path()).unwrap();
        assert!(stl.set_path("/no/such/part.stl").is_err());
        assert_eq!(stl.path(), file.path());

        let mut build = BuildFile::new(MachineType::Eos, file.path()).unwrap();
        assert!(build.set_path("/no/such/build.zip").is_err());
        assert_eq!(build.path(), file.path());
    }

    #[test]
    fn variant_selects_wire_branch() {
        use proto::thermal_history_input::Geometry as Wire;
        let file = tempfile::NamedTempFile::new().unwrap();

        let stl: Geometry = StlFile::new(file.path()).unwrap().into();
        assert_eq!(
            stl.to_message("remote.stl"),
            Wire::StlFile(proto::StlFile {
                name: "remote.stl".into()
            })
        );

        let build: Geometry = BuildFile::new(MachineType::Eos, file.path()).unwrap().into();
        match build.to_message("remote.zip") {
            Wire::BuildFile(msg) => {
                assert_eq!(msg.name, "remote.zip");
                assert_eq!(msg.r#type, proto::BuildFileMachineType::Eos as i32);
            }
            other => panic!("unexpected branch: {other:?}"),
        }
    }

    #[test]
    fn build_file_display() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let build = BuildFile::new(MachineType::Slm, file.path()).unwrap();
        let text = build.to_string();
        assert!(text.starts_with("BuildFile\ntype: SLM\npath: "));
    }
}
