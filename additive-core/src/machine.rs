// MIT License
// Copyright 2023--present additive developers

//! Machine parameters of a powder bed fusion build.
//!
//! Every field has a fixed [`Limits`] entry. The invariant is that a
//! [`Machine`] never holds an out-of-range value: the fields are private and
//! the only ways in are the validating setters, [`Machine::try_from`] on a
//! [`MachineConfig`] and [`Machine::from_message`].
//!
//! | field | unit | default | min | max |
//! |-------|------|---------|-----|-----|
//! | `laser_power` | W | 195 | 50 | 700 |
//! | `scan_speed` | m/s | 1.0 | 0.35 | 2.5 |
//! | `heater_temperature` | °C | 80 | 20 | 500 |
//! | `layer_thickness` | m | 5e-5 | 1e-5 | 1e-4 |
//! | `beam_diameter` | m | 1e-4 | 2e-5 | 1.4e-4 |
//! | `starting_layer_angle` | ° | 57 | 0 | 180 |
//! | `layer_rotation_angle` | ° | 67 | 0 | 180 |
//! | `hatch_spacing` | m | 1e-4 | 6e-5 | 2e-4 |
//! | `slicing_stripe_width` | m | 0.01 | 0.001 | 0.1 |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::proto;

pub const LASER_POWER: Limits = Limits::new(195.0, 50.0, 700.0);
pub const SCAN_SPEED: Limits = Limits::new(1.0, 0.35, 2.5);
pub const HEATER_TEMPERATURE: Limits = Limits::new(80.0, 20.0, 500.0);
pub const LAYER_THICKNESS: Limits = Limits::new(5e-5, 1e-5, 1e-4);
pub const BEAM_DIAMETER: Limits = Limits::new(1e-4, 2e-5, 1.4e-4);
pub const STARTING_LAYER_ANGLE: Limits = Limits::new(57.0, 0.0, 180.0);
pub const LAYER_ROTATION_ANGLE: Limits = Limits::new(67.0, 0.0, 180.0);
pub const HATCH_SPACING: Limits = Limits::new(1e-4, 6e-5, 2e-4);
pub const SLICING_STRIPE_WIDTH: Limits = Limits::new(0.01, 0.001, 0.1);

/// Range-checked machine parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Machine {
    laser_power: f64,
    scan_speed: f64,
    heater_temperature: f64,
    layer_thickness: f64,
    beam_diameter: f64,
    starting_layer_angle: f64,
    layer_rotation_angle: f64,
    hatch_spacing: f64,
    slicing_stripe_width: f64,
}

impl Default for Machine {
    fn default() -> Self {
        Self {
            laser_power: LASER_POWER.default,
            scan_speed: SCAN_SPEED.default,
            heater_temperature: HEATER_TEMPERATURE.default,
            layer_thickness: LAYER_THICKNESS.default,
            beam_diameter: BEAM_DIAMETER.default,
            starting_layer_angle: STARTING_LAYER_ANGLE.default,
            layer_rotation_angle: LAYER_ROTATION_ANGLE.default,
            hatch_spacing: HATCH_SPACING.default,
            slicing_stripe_width: SLICING_STRIPE_WIDTH.default,
        }
    }
}

macro_rules! bounded_field {
    ($field:ident, $setter:ident, $limits:ident, $doc:literal) => {
        #[doc = $doc]
        pub fn $field(&self) -> f64 {
            self.$field
        }

        #[doc = concat!("Set `", stringify!($field), "`, rejecting values outside [`", stringify!($limits), "`].")]
        pub fn $setter(&mut self, value: f64) -> Result<()> {
            self.$field = $limits.check(stringify!($field), value)?;
            Ok(())
        }
    };
}

impl Machine {
    bounded_field!(laser_power, set_laser_power, LASER_POWER, "Laser power (W).");
    bounded_field!(scan_speed, set_scan_speed, SCAN_SPEED, "Laser scan speed (m/s).");
    bounded_field!(
        heater_temperature,
        set_heater_temperature,
        HEATER_TEMPERATURE,
        "Heater temperature (°C)."
    );
    bounded_field!(
        layer_thickness,
        set_layer_thickness,
        LAYER_THICKNESS,
        "Powder layer thickness (m)."
    );
    bounded_field!(beam_diameter, set_beam_diameter, BEAM_DIAMETER, "Beam diameter (m).");
    bounded_field!(
        starting_layer_angle,
        set_starting_layer_angle,
        STARTING_LAYER_ANGLE,
        "Scan angle of the first layer (°)."
    );
    bounded_field!(
        layer_rotation_angle,
        set_layer_rotation_angle,
        LAYER_ROTATION_ANGLE,
        "Scan angle increment applied per layer (°)."
    );
    bounded_field!(
        hatch_spacing,
        set_hatch_spacing,
        HATCH_SPACING,
        "Distance between adjacent scan vectors (m)."
    );
    bounded_field!(
        slicing_stripe_width,
        set_slicing_stripe_width,
        SLICING_STRIPE_WIDTH,
        "Width of the scan stripes (m)."
    );

    pub fn to_message(&self) -> proto::MachineSettings {
        proto::MachineSettings {
            laser_power: self.laser_power,
            scan_speed: self.scan_speed,
            heater_temperature: self.heater_temperature,
            layer_thickness: self.layer_thickness,
            beam_diameter: self.beam_diameter,
            starting_layer_angle: self.starting_layer_angle,
            layer_rotation_angle: self.layer_rotation_angle,
            hatch_spacing: self.hatch_spacing,
            slicing_stripe_width: self.slicing_stripe_width,
        }
    }

    /// Build a machine from a wire message, applying the same range checks
    /// as the setters.
    pub fn from_message(msg: &proto::MachineSettings) -> Result<Self> {
        let mut machine = Self::default();
        machine.set_laser_power(msg.laser_power)?;
        machine.set_scan_speed(msg.scan_speed)?;
        machine.set_heater_temperature(msg.heater_temperature)?;
        machine.set_layer_thickness(msg.layer_thickness)?;
        machine.set_beam_diameter(msg.beam_diameter)?;
        machine.set_starting_layer_angle(msg.starting_layer_angle)?;
        machine.set_layer_rotation_angle(msg.layer_rotation_angle)?;
        machine.set_hatch_spacing(msg.hatch_spacing)?;
        machine.set_slicing_stripe_width(msg.slicing_stripe_width)?;
        Ok(machine)
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Machine")?;
        writeln!(f, "laser_power: {}", self.laser_power)?;
        writeln!(f, "scan_speed: {}", self.scan_speed)?;
        writeln!(f, "heater_temperature: {}", self.heater_temperature)?;
        writeln!(f, "layer_thickness: {}", self.layer_thickness)?;
        writeln!(f, "beam_diameter: {}", self.beam_diameter)?;
        writeln!(f, "starting_layer_angle: {}", self.starting_layer_angle)?;
        writeln!(f, "layer_rotation_angle: {}", self.layer_rotation_angle)?;
        writeln!(f, "hatch_spacing: {}", self.hatch_spacing)?;
        writeln!(f, "slicing_stripe_width: {}", self.slicing_stripe_width)
    }
}

/// Partial machine description read from a configuration document.
///
/// Omitted fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineConfig {
    pub laser_power: Option<f64>,
    pub scan_speed: Option<f64>,
    pub heater_temperature: Option<f64>,
    pub layer_thickness: Option<f64>,
    pub beam_diameter: Option<f64>,
    pub starting_layer_angle: Option<f64>,
    pub layer_rotation_angle: Option<f64>,
    pub hatch_spacing: Option<f64>,
    pub slicing_stripe_width: Option<f64>,
}

impl crate::config::ConfigObject for MachineConfig {
    const OBJECT: &'static str = "Machine";
}

impl TryFrom<MachineConfig> for Machine {
    type Error = Error;

    fn try_from(cfg: MachineConfig) -> Result<Self> {
        let mut machine = Machine::default();
        if let Some(v) = cfg.laser_power {
            machine.set_laser_power(v)?;
        }
        if let Some(v) = cfg.scan_speed {
            machine.set_scan_speed(v)?;
        }
        if let Some(v) = cfg.heater_temperature {
            machine.set_heater_temperature(v)?;
        }
        if let Some(v) = cfg.layer_thickness {
            machine.set_layer_thickness(v)?;
        }
        if let Some(v) = cfg.beam_diameter {
            machine.set_beam_diameter(v)?;
        }
        if let Some(v) = cfg.starting_layer_angle {
            machine.set_starting_layer_angle(v)?;
        }
        if let Some(v) = cfg.layer_rotation_angle {
            machine.set_layer_rotation_angle(v)?;
        }
        if let Some(v) = cfg.hatch_spacing {
            machine.set_hatch_spacing(v)?;
        }
        if let Some(v) = cfg.slicing_stripe_width {
            machine.set_slicing_stripe_width(v)?;
        }
        Ok(machine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Setter = fn(&mut Machine, f64) -> Result<()>;

    fn field(name: &'static str, limits: Limits, set: Setter) -> (&'static str, Limits, Setter) {
        (name, limits, set)
    }

    fn all_fields() -> Vec<(&'static str, Limits, Setter)> {
        vec![
            field("laser_power", LASER_POWER, Machine::set_laser_power),
            field("scan_speed", SCAN_SPEED, Machine::set_scan_speed),
            field("heater_temperature", HEATER_TEMPERATURE, Machine::set_heater_temperature),
            field("layer_thickness", LAYER_THICKNESS, Machine::set_layer_thickness),
            field("beam_diameter", BEAM_DIAMETER, Machine::set_beam_diameter),
            field("starting_layer_angle", STARTING_LAYER_ANGLE, Machine::set_starting_layer_angle),
            field("layer_rotation_angle", LAYER_ROTATION_ANGLE, Machine::set_layer_rotation_angle),
            field("hatch_spacing", HATCH_SPACING, Machine::set_hatch_spacing),
            field("slicing_stripe_width", SLICING_STRIPE_WIDTH, Machine::set_slicing_stripe_width),
        ]
    }

    #[test]
    fn boundary_values_are_accepted() {
        for (name, limits, set) in all_fields() {
            let mut m = Machine::default();
            assert!(set(&mut m, limits.min).is_ok(), "{name} min");
            assert!(set(&mut m, limits.max).is_ok(), "{name} max");
        }
    }

    #[test]
    fn out_of_range_values_are_rejected_and_not_stored() {
        for (name, limits, set) in all_fields() {
            let mut m = Machine::default();
            let below = limits.min - limits.min.abs().max(1.0) * 0.01;
            let err = set(&mut m, below).unwrap_err();
            assert!(err.to_string().starts_with(name), "{err}");
            assert!(set(&mut m, limits.max * 1.01 + 1e-9).is_err(), "{name} above");
            assert_eq!(m, Machine::default());
        }
    }

    #[test]
    fn message_carries_every_field() {
        let mut m = Machine::default();
        m.set_laser_power(99.0).unwrap();
        m.set_hatch_spacing(1.5e-4).unwrap();
        let msg = m.to_message();
        assert_eq!(msg.laser_power, 99.0);
        assert_eq!(msg.hatch_spacing, 1.5e-4);
        assert_eq!(Machine::from_message(&msg).unwrap(), m);
    }

    #[test]
    fn from_message_validates() {
        let msg = proto::MachineSettings::default();
        assert!(Machine::from_message(&msg).is_err());
    }

    #[test]
    fn config_overrides_defaults() {
        let cfg = MachineConfig {
            laser_power: Some(300.0),
            ..Default::default()
        };
        let m = Machine::try_from(cfg).unwrap();
        assert_eq!(m.laser_power(), 300.0);
        assert_eq!(m.scan_speed(), SCAN_SPEED.default);
    }

    #[test]
    fn display_lists_fields_in_order() {
        let text = Machine::default().to_string();
        let keys: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|l| l.split(':').next().unwrap())
            .collect();
        assert_eq!(text.lines().next(), Some("Machine"));
        assert_eq!(
            keys,
            [
                "laser_power",
                "scan_speed",
                "heater_temperature",
                "layer_thickness",
                "beam_diameter",
                "starting_layer_angle",
                "layer_rotation_angle",
                "hatch_spacing",
                "slicing_stripe_width",
            ]
        );
        assert!(text.contains("laser_power: 195\n"));
    }
}
