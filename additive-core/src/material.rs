// MIT License
// Copyright 2023--present additive developers

//! Material coefficients and temperature-indexed lookup tables.
//!
//! A [`Material`] is plain data: nothing is range-checked and every scalar
//! defaults to zero. It comes from one of three places:
//!
//! - the server catalog (`AdditiveClient::material`),
//! - a custom material on disk ([`Material::load`]): a JSON parameters file
//!   plus two CSV lookup tables produced by the material tuning tool,
//! - direct construction by the caller.
//!
//! The lookup tables keep their rows in the order they were supplied.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{Error, Result};
use crate::proto;

pub const CW_LASER_POWER_COLUMN: &str = "Laser Power(W)";
pub const CW_SCAN_SPEED_COLUMN: &str = "Scan Speed(m/s)";
pub const CW_WIDTH_COLUMN: &str = "Characteristic Width(m)";

pub const TP_TEMPERATURE_COLUMN: &str = "Temperature(K)";
pub const TP_DENSITY_COLUMN: &str = "Density(kg/m^3)";
pub const TP_SPECIFIC_HEAT_COLUMN: &str = "Specific Heat(J/kg/K)";
pub const TP_THERMAL_CONDUCTIVITY_COLUMN: &str = "Thermal Conductivity(W/m/K)";
pub const TP_DENSITY_RATIO_COLUMN: &str = "Density Ratio";
pub const TP_SPECIFIC_HEAT_RATIO_COLUMN: &str = "Specific Heat Ratio";
pub const TP_THERMAL_CONDUCTIVITY_RATIO_COLUMN: &str = "Thermal Conductivity Ratio";

/// Melt pool characteristic width measured at one laser power / scan speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CharacteristicWidthDataPoint {
    pub laser_power: f64,
    pub scan_speed: f64,
    pub characteristic_width: f64,
}

impl CharacteristicWidthDataPoint {
    pub fn to_message(&self) -> proto::CharacteristicWidthDataPoint {
        proto::CharacteristicWidthDataPoint {
            characteristic_width: self.characteristic_width,
            scan_speed: self.scan_speed,
            laser_power: self.laser_power,
        }
    }

    pub fn from_message(msg: &proto::CharacteristicWidthDataPoint) -> Self {
        Self {
            laser_power: msg.laser_power,
            scan_speed: msg.scan_speed,
            characteristic_width: msg.characteristic_width,
        }
    }
}

/// Thermal properties at one temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThermalPropertiesDataPoint {
    pub temperature: f64,
    pub density: f64,
    pub specific_heat: f64,
    pub thermal_conductivity: f64,
    pub density_ratio: f64,
    pub specific_heat_ratio: f64,
    pub thermal_conductivity_ratio: f64,
}

impl ThermalPropertiesDataPoint {
    pub fn to_message(&self) -> proto::ThermalPropertiesDataPoint {
        proto::ThermalPropertiesDataPoint {
            density: self.density,
            density_ratio: self.density_ratio,
            specific_heat: self.specific_heat,
            specific_heat_ratio: self.specific_heat_ratio,
            temperature: self.temperature,
            thermal_conductivity: self.thermal_conductivity,
            thermal_conductivity_ratio: self.thermal_conductivity_ratio,
        }
    }

    pub fn from_message(msg: &proto::ThermalPropertiesDataPoint) -> Self {
        Self {
            temperature: msg.temperature,
            density: msg.density,
            specific_heat: msg.specific_heat,
            thermal_conductivity: msg.thermal_conductivity,
            density_ratio: msg.density_ratio,
            specific_heat_ratio: msg.specific_heat_ratio,
            thermal_conductivity_ratio: msg.thermal_conductivity_ratio,
        }
    }
}

/// Thermal and mechanical description of a build material.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Material {
    pub absorptivity_maximum: f64,
    pub absorptivity_minimum: f64,
    pub absorptivity_powder_coefficient_a: f64,
    pub absorptivity_powder_coefficient_b: f64,
    pub absorptivity_solid_coefficient_a: f64,
    pub absorptivity_solid_coefficient_b: f64,
    pub anisotropic_strain_coefficient_parallel: f64,
    pub anisotropic_strain_coefficient_perpendicular: f64,
    pub anisotropic_strain_coefficient_z: f64,
    pub elastic_modulus: f64,
    pub hardening_factor: f64,
    pub liquidus_temperature: f64,
    pub material_yield_strength: f64,
    pub name: String,
    pub nucleation_constant_bulk: f64,
    pub nucleation_constant_interface: f64,
    pub penetration_depth_maximum: f64,
    pub penetration_depth_minimum: f64,
    pub penetration_depth_powder_coefficient_a: f64,
    pub penetration_depth_powder_coefficient_b: f64,
    pub penetration_depth_solid_coefficient_a: f64,
    pub penetration_depth_solid_coefficient_b: f64,
    pub poisson_ratio: f64,
    pub powder_packing_density: f64,
    pub purging_gas_convection_coefficient: f64,
    pub solid_density_at_room_temperature: f64,
    pub solid_specific_heat_at_room_temperature: f64,
    pub solid_thermal_conductivity_at_room_temperature: f64,
    pub solidus_temperature: f64,
    pub strain_scaling_factor: f64,
    pub support_yield_strength_ratio: f64,
    pub thermal_expansion_coefficient: f64,
    pub vaporization_temperature: f64,
    pub characteristic_width_data: Vec<CharacteristicWidthDataPoint>,
    pub thermal_properties_data: Vec<ThermalPropertiesDataPoint>,
}

impl config::ConfigObject for Material {
    const OBJECT: &'static str = "Material";
}

impl Material {
    /// Material with every coefficient zeroed and the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load a custom material from the files written by the material tuning
    /// tool.
    ///
    /// - `parameters_file`: JSON object keyed by the field names of
    ///   [`Material`]; unknown keys are rejected.
    /// - `thermal_lookup_file`: CSV with the `TP_*_COLUMN` headers.
    /// - `characteristic_width_file`: CSV with the `CW_*_COLUMN` headers.
    pub fn load(
        parameters_file: impl AsRef<Path>,
        thermal_lookup_file: impl AsRef<Path>,
        characteristic_width_file: impl AsRef<Path>,
    ) -> Result<Self> {
        let parameters_file = parameters_file.as_ref();
        tracing::debug!(path = %parameters_file.display(), "loading material parameters");
        let text = fs::read_to_string(parameters_file)?;
        let mut material: Material = config::from_json("Material", &text)?;
        material.thermal_properties_data = load_thermal_properties(thermal_lookup_file)?;
        material.characteristic_width_data = load_characteristic_width(characteristic_width_file)?;
        Ok(material)
    }

    pub fn to_message(&self) -> proto::AdditiveMaterial {
        proto::AdditiveMaterial {
            absorptivity_maximum: self.absorptivity_maximum,
            absorptivity_minimum: self.absorptivity_minimum,
            absorptivity_powder_coefficient_a: self.absorptivity_powder_coefficient_a,
            absorptivity_powder_coefficient_b: self.absorptivity_powder_coefficient_b,
            absorptivity_solid_coefficient_a: self.absorptivity_solid_coefficient_a,
            absorptivity_solid_coefficient_b: self.absorptivity_solid_coefficient_b,
            anisotropic_strain_coefficient_parallel: self.anisotropic_strain_coefficient_parallel,
            anisotropic_strain_coefficient_perpendicular: self
                .anisotropic_strain_coefficient_perpendicular,
            anisotropic_strain_coefficient_z: self.anisotropic_strain_coefficient_z,
            elastic_modulus: self.elastic_modulus,
            hardening_factor: self.hardening_factor,
            liquidus_temperature: self.liquidus_temperature,
            material_yield_strength: self.material_yield_strength,
            name: self.name.clone(),
            nucleation_constant_bulk: self.nucleation_constant_bulk,
            nucleation_constant_interface: self.nucleation_constant_interface,
            penetration_depth_maximum: self.penetration_depth_maximum,
            penetration_depth_minimum: self.penetration_depth_minimum,
            penetration_depth_powder_coefficient_a: self.penetration_depth_powder_coefficient_a,
            penetration_depth_powder_coefficient_b: self.penetration_depth_powder_coefficient_b,
            penetration_depth_solid_coefficient_a: self.penetration_depth_solid_coefficient_a,
            penetration_depth_solid_coefficient_b: self.penetration_depth_solid_coefficient_b,
            poisson_ratio: self.poisson_ratio,
            powder_packing_density: self.powder_packing_density,
            purging_gas_convection_coefficient: self.purging_gas_convection_coefficient,
            solid_density_at_room_temperature: self.solid_density_at_room_temperature,
            solid_specific_heat_at_room_temperature: self.solid_specific_heat_at_room_temperature,
            solid_thermal_conductivity_at_room_temperature: self
                .solid_thermal_conductivity_at_room_temperature,
            solidus_temperature: self.solidus_temperature,
            strain_scaling_factor: self.strain_scaling_factor,
            support_yield_strength_ratio: self.support_yield_strength_ratio,
            thermal_expansion_coefficient: self.thermal_expansion_coefficient,
            vaporization_temperature: self.vaporization_temperature,
            characteristic_width_data_points: self
                .characteristic_width_data
                .iter()
                .map(CharacteristicWidthDataPoint::to_message)
                .collect(),
            thermal_properties_data_points: self
                .thermal_properties_data
                .iter()
                .map(ThermalPropertiesDataPoint::to_message)
                .collect(),
        }
    }

    pub fn from_message(msg: &proto::AdditiveMaterial) -> Self {
        Self {
            absorptivity_maximum: msg.absorptivity_maximum,
            absorptivity_minimum: msg.absorptivity_minimum,
            absorptivity_powder_coefficient_a: msg.absorptivity_powder_coefficient_a,
            absorptivity_powder_coefficient_b: msg.absorptivity_powder_coefficient_b,
            absorptivity_solid_coefficient_a: msg.absorptivity_solid_coefficient_a,
            absorptivity_solid_coefficient_b: msg.absorptivity_solid_coefficient_b,
            anisotropic_strain_coefficient_parallel: msg.anisotropic_strain_coefficient_parallel,
            anisotropic_strain_coefficient_perpendicular: msg
                .anisotropic_strain_coefficient_perpendicular,
            anisotropic_strain_coefficient_z: msg.anisotropic_strain_coefficient_z,
            elastic_modulus: msg.elastic_modulus,
            hardening_factor: msg.hardening_factor,
            liquidus_temperature: msg.liquidus_temperature,
            material_yield_strength: msg.material_yield_strength,
            name: msg.name.clone(),
            nucleation_constant_bulk: msg.nucleation_constant_bulk,
            nucleation_constant_interface: msg.nucleation_constant_interface,
            penetration_depth_maximum: msg.penetration_depth_maximum,
            penetration_depth_minimum: msg.penetration_depth_minimum,
            penetration_depth_powder_coefficient_a: msg.penetration_depth_powder_coefficient_a,
            penetration_depth_powder_coefficient_b: msg.penetration_depth_powder_coefficient_b,
            penetration_depth_solid_coefficient_a: msg.penetration_depth_solid_coefficient_a,
            penetration_depth_solid_coefficient_b: msg.penetration_depth_solid_coefficient_b,
            poisson_ratio: msg.poisson_ratio,
            powder_packing_density: msg.powder_packing_density,
            purging_gas_convection_coefficient: msg.purging_gas_convection_coefficient,
            solid_density_at_room_temperature: msg.solid_density_at_room_temperature,
            solid_specific_heat_at_room_temperature: msg.solid_specific_heat_at_room_temperature,
            solid_thermal_conductivity_at_room_temperature: msg
                .solid_thermal_conductivity_at_room_temperature,
            solidus_temperature: msg.solidus_temperature,
            strain_scaling_factor: msg.strain_scaling_factor,
            support_yield_strength_ratio: msg.support_yield_strength_ratio,
            thermal_expansion_coefficient: msg.thermal_expansion_coefficient,
            vaporization_temperature: msg.vaporization_temperature,
            characteristic_width_data: msg
                .characteristic_width_data_points
                .iter()
                .map(CharacteristicWidthDataPoint::from_message)
                .collect(),
            thermal_properties_data: msg
                .thermal_properties_data_points
                .iter()
                .map(ThermalPropertiesDataPoint::from_message)
                .collect(),
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scalars: [(&str, f64); 12] = [
            ("absorptivity_maximum", self.absorptivity_maximum),
            ("absorptivity_minimum", self.absorptivity_minimum),
            ("absorptivity_powder_coefficient_a", self.absorptivity_powder_coefficient_a),
            ("absorptivity_powder_coefficient_b", self.absorptivity_powder_coefficient_b),
            ("absorptivity_solid_coefficient_a", self.absorptivity_solid_coefficient_a),
            ("absorptivity_solid_coefficient_b", self.absorptivity_solid_coefficient_b),
            ("anisotropic_strain_coefficient_parallel", self.anisotropic_strain_coefficient_parallel),
            (
                "anisotropic_strain_coefficient_perpendicular",
                self.anisotropic_strain_coefficient_perpendicular,
            ),
            ("anisotropic_strain_coefficient_z", self.anisotropic_strain_coefficient_z),
            ("elastic_modulus", self.elastic_modulus),
            ("hardening_factor", self.hardening_factor),
            ("liquidus_temperature", self.liquidus_temperature),
        ];
        let after_name: [(&str, f64); 20] = [
            ("material_yield_strength", self.material_yield_strength),
            ("nucleation_constant_bulk", self.nucleation_constant_bulk),
            ("nucleation_constant_interface", self.nucleation_constant_interface),
            ("penetration_depth_maximum", self.penetration_depth_maximum),
            ("penetration_depth_minimum", self.penetration_depth_minimum),
            ("penetration_depth_powder_coefficient_a", self.penetration_depth_powder_coefficient_a),
            ("penetration_depth_powder_coefficient_b", self.penetration_depth_powder_coefficient_b),
            ("penetration_depth_solid_coefficient_a", self.penetration_depth_solid_coefficient_a),
            ("penetration_depth_solid_coefficient_b", self.penetration_depth_solid_coefficient_b),
            ("poisson_ratio", self.poisson_ratio),
            ("powder_packing_density", self.powder_packing_density),
            ("purging_gas_convection_coefficient", self.purging_gas_convection_coefficient),
            ("solid_density_at_room_temperature", self.solid_density_at_room_temperature),
            (
                "solid_specific_heat_at_room_temperature",
                self.solid_specific_heat_at_room_temperature,
            ),
            (
                "solid_thermal_conductivity_at_room_temperature",
                self.solid_thermal_conductivity_at_room_temperature,
            ),
            ("solidus_temperature", self.solidus_temperature),
            ("strain_scaling_factor", self.strain_scaling_factor),
            ("support_yield_strength_ratio", self.support_yield_strength_ratio),
            ("thermal_expansion_coefficient", self.thermal_expansion_coefficient),
            ("vaporization_temperature", self.vaporization_temperature),
        ];

        writeln!(f, "Material")?;
        for (key, value) in scalars {
            writeln!(f, "{key}: {value}")?;
        }
        // `material_yield_strength` sorts before `name`, everything else after.
        let (first, rest) = after_name.split_at(1);
        writeln!(f, "{}: {}", first[0].0, first[0].1)?;
        writeln!(f, "name: {}", self.name)?;
        for (key, value) in rest {
            writeln!(f, "{key}: {value}")?;
        }
        writeln!(
            f,
            "characteristic_width_data: {} rows",
            self.characteristic_width_data.len()
        )?;
        writeln!(
            f,
            "thermal_properties_data: {} rows",
            self.thermal_properties_data.len()
        )
    }
}

/// Header-addressed numeric CSV table.
struct LookupTable {
    source: String,
    headers: Vec<String>,
    rows: Vec<(usize, Vec<String>)>,
}

impl LookupTable {
    fn read(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading lookup table");
        let text = fs::read_to_string(path)?;
        let source = path.display().to_string();
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let headers = match lines.next() {
            Some((_, header)) => header.split(',').map(|h| h.trim().to_string()).collect(),
            None => return Err(Error::InvalidValue(format!("{source}: file is empty"))),
        };
        let rows = lines
            .map(|(idx, line)| (idx + 1, line.split(',').map(|c| c.trim().to_string()).collect()))
            .collect();

        Ok(Self {
            source,
            headers,
            rows,
        })
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.headers.iter().position(|h| h == name).ok_or_else(|| {
            Error::InvalidValue(format!("{}: missing column '{name}'", self.source))
        })
    }

    fn cell(&self, row: &(usize, Vec<String>), column: usize, name: &str) -> Result<f64> {
        let (line, cells) = row;
        let raw = cells.get(column).map(String::as_str).unwrap_or("");
        raw.parse::<f64>().map_err(|_| {
            Error::InvalidValue(format!(
                "{}: line {line}, column '{name}': cannot parse '{raw}' as a number",
                self.source
            ))
        })
    }
}

pub(crate) fn load_characteristic_width(
    path: impl AsRef<Path>,
) -> Result<Vec<CharacteristicWidthDataPoint>> {
    let table = LookupTable::read(path.as_ref())?;
    let power = table.column(CW_LASER_POWER_COLUMN)?;
    let speed = table.column(CW_SCAN_SPEED_COLUMN)?;
    let width = table.column(CW_WIDTH_COLUMN)?;

    table
        .rows
        .iter()
        .map(|row| {
            Ok(CharacteristicWidthDataPoint {
                laser_power: table.cell(row, power, CW_LASER_POWER_COLUMN)?,
                scan_speed: table.cell(row, speed, CW_SCAN_SPEED_COLUMN)?,
                characteristic_width: table.cell(row, width, CW_WIDTH_COLUMN)?,
            })
        })
        .collect()
}

pub(crate) fn load_thermal_properties(
    path: impl AsRef<Path>,
) -> Result<Vec<ThermalPropertiesDataPoint>> {
    let table = LookupTable::read(path.as_ref())?;
    let columns = [
        TP_TEMPERATURE_COLUMN,
        TP_DENSITY_COLUMN,
        TP_SPECIFIC_HEAT_COLUMN,
        TP_THERMAL_CONDUCTIVITY_COLUMN,
        TP_DENSITY_RATIO_COLUMN,
        TP_SPECIFIC_HEAT_RATIO_COLUMN,
        TP_THERMAL_CONDUCTIVITY_RATIO_COLUMN,
    ];
    let mut idx = [0usize; 7];
    for (slot, name) in idx.iter_mut().zip(columns) {
        *slot = table.column(name)?;
    }

    table
        .rows
        .iter()
        .map(|row| {
            let v = |i: usize| table.cell(row, idx[i], columns[i]);
            Ok(ThermalPropertiesDataPoint {
                temperature: v(0)?,
                density: v(1)?,
                specific_heat: v(2)?,
                thermal_conductivity: v(3)?,
                density_ratio: v(4)?,
                specific_heat_ratio: v(5)?,
                thermal_conductivity_ratio: v(6)?,
            })
        })
        .collect()
}
