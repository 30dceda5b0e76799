// MIT License
// Copyright 2023--present additive developers

//! Wire messages of the `ansys.api.additive.v0` protocol.
//!
//! The schema is owned by the server vendor and is not shipped with this
//! crate, so the messages are declared here with `prost` derives instead of
//! being generated by a build script. Field tags and names follow the
//! vendor's `additive_domain.proto`, `additive_simulation.proto`,
//! `additive_materials.proto` and `about.proto`; do not renumber them.
//!
//! Nothing in this module validates anything. The value objects in the rest
//! of the crate are the only producers of requests and the only consumers of
//! responses.

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

/// Machine settings shared by every simulation kind.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MachineSettings {
    #[prost(double, tag = "1")]
    pub laser_power: f64,
    #[prost(double, tag = "2")]
    pub scan_speed: f64,
    #[prost(double, tag = "3")]
    pub heater_temperature: f64,
    #[prost(double, tag = "4")]
    pub layer_thickness: f64,
    #[prost(double, tag = "5")]
    pub beam_diameter: f64,
    #[prost(double, tag = "6")]
    pub starting_layer_angle: f64,
    #[prost(double, tag = "7")]
    pub layer_rotation_angle: f64,
    #[prost(double, tag = "8")]
    pub hatch_spacing: f64,
    #[prost(double, tag = "9")]
    pub slicing_stripe_width: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CharacteristicWidthDataPoint {
    #[prost(double, tag = "1")]
    pub characteristic_width: f64,
    #[prost(double, tag = "2")]
    pub scan_speed: f64,
    #[prost(double, tag = "3")]
    pub laser_power: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ThermalPropertiesDataPoint {
    #[prost(double, tag = "1")]
    pub density: f64,
    #[prost(double, tag = "2")]
    pub density_ratio: f64,
    #[prost(double, tag = "3")]
    pub specific_heat: f64,
    #[prost(double, tag = "4")]
    pub specific_heat_ratio: f64,
    #[prost(double, tag = "5")]
    pub temperature: f64,
    #[prost(double, tag = "6")]
    pub thermal_conductivity: f64,
    #[prost(double, tag = "7")]
    pub thermal_conductivity_ratio: f64,
}

/// Material description, either a catalog entry or a tuned custom material.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AdditiveMaterial {
    #[prost(double, tag = "1")]
    pub absorptivity_maximum: f64,
    #[prost(double, tag = "2")]
    pub absorptivity_minimum: f64,
    #[prost(double, tag = "3")]
    pub absorptivity_powder_coefficient_a: f64,
    #[prost(double, tag = "4")]
    pub absorptivity_powder_coefficient_b: f64,
    #[prost(double, tag = "5")]
    pub absorptivity_solid_coefficient_a: f64,
    #[prost(double, tag = "6")]
    pub absorptivity_solid_coefficient_b: f64,
    #[prost(double, tag = "7")]
    pub anisotropic_strain_coefficient_parallel: f64,
    #[prost(double, tag = "8")]
    pub anisotropic_strain_coefficient_perpendicular: f64,
    #[prost(double, tag = "9")]
    pub anisotropic_strain_coefficient_z: f64,
    #[prost(double, tag = "10")]
    pub elastic_modulus: f64,
    #[prost(double, tag = "11")]
    pub hardening_factor: f64,
    #[prost(double, tag = "12")]
    pub liquidus_temperature: f64,
    #[prost(double, tag = "13")]
    pub material_yield_strength: f64,
    #[prost(string, tag = "14")]
    pub name: String,
    #[prost(double, tag = "15")]
    pub nucleation_constant_bulk: f64,
    #[prost(double, tag = "16")]
    pub nucleation_constant_interface: f64,
    #[prost(double, tag = "17")]
    pub penetration_depth_maximum: f64,
    #[prost(double, tag = "18")]
    pub penetration_depth_minimum: f64,
    #[prost(double, tag = "19")]
    pub penetration_depth_powder_coefficient_a: f64,
    #[prost(double, tag = "20")]
    pub penetration_depth_powder_coefficient_b: f64,
    #[prost(double, tag = "21")]
    pub penetration_depth_solid_coefficient_a: f64,
    #[prost(double, tag = "22")]
    pub penetration_depth_solid_coefficient_b: f64,
    #[prost(double, tag = "23")]
    pub poisson_ratio: f64,
    #[prost(double, tag = "24")]
    pub powder_packing_density: f64,
    #[prost(double, tag = "25")]
    pub purging_gas_convection_coefficient: f64,
    #[prost(double, tag = "26")]
    pub solid_density_at_room_temperature: f64,
    #[prost(double, tag = "27")]
    pub solid_specific_heat_at_room_temperature: f64,
    #[prost(double, tag = "28")]
    pub solid_thermal_conductivity_at_room_temperature: f64,
    #[prost(double, tag = "29")]
    pub solidus_temperature: f64,
    #[prost(double, tag = "30")]
    pub strain_scaling_factor: f64,
    #[prost(double, tag = "31")]
    pub support_yield_strength_ratio: f64,
    #[prost(double, tag = "32")]
    pub thermal_expansion_coefficient: f64,
    #[prost(double, tag = "33")]
    pub vaporization_temperature: f64,
    #[prost(message, repeated, tag = "34")]
    pub characteristic_width_data_points: Vec<CharacteristicWidthDataPoint>,
    #[prost(message, repeated, tag = "35")]
    pub thermal_properties_data_points: Vec<ThermalPropertiesDataPoint>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum BuildFileMachineType {
    None = 0,
    Ai = 1,
    Slm = 2,
    Renishaw = 3,
    Eos = 4,
    Trumpf = 5,
    Hb3d = 6,
    Sisma = 7,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StlFile {
    /// Remote (server-side) file name.
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuildFile {
    #[prost(enumeration = "BuildFileMachineType", tag = "1")]
    pub r#type: i32,
    /// Remote (server-side) file name.
    #[prost(string, tag = "2")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Range {
    #[prost(double, tag = "1")]
    pub min: f64,
    #[prost(double, tag = "2")]
    pub max: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CoaxialAverageSensorInputs {
    #[prost(double, tag = "1")]
    pub sensor_radius: f64,
    #[prost(message, repeated, tag = "2")]
    pub z_heights: Vec<Range>,
}

// ---------------------------------------------------------------------------
// Simulation inputs
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SingleBeadInput {
    #[prost(message, optional, tag = "1")]
    pub machine: Option<MachineSettings>,
    #[prost(message, optional, tag = "2")]
    pub material: Option<AdditiveMaterial>,
    #[prost(double, tag = "3")]
    pub bead_length: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PorosityInput {
    #[prost(message, optional, tag = "1")]
    pub machine: Option<MachineSettings>,
    #[prost(message, optional, tag = "2")]
    pub material: Option<AdditiveMaterial>,
    #[prost(double, tag = "3")]
    pub size_x: f64,
    #[prost(double, tag = "4")]
    pub size_y: f64,
    #[prost(double, tag = "5")]
    pub size_z: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MicrostructureInput {
    #[prost(message, optional, tag = "1")]
    pub machine: Option<MachineSettings>,
    #[prost(message, optional, tag = "2")]
    pub material: Option<AdditiveMaterial>,
    #[prost(double, tag = "3")]
    pub cube_min_x: f64,
    #[prost(double, tag = "4")]
    pub cube_min_y: f64,
    #[prost(double, tag = "5")]
    pub cube_min_z: f64,
    #[prost(double, tag = "6")]
    pub cube_size_x: f64,
    #[prost(double, tag = "7")]
    pub cube_size_y: f64,
    #[prost(double, tag = "8")]
    pub cube_size_z: f64,
    #[prost(double, tag = "9")]
    pub sensor_dimension: f64,
    #[prost(bool, tag = "10")]
    pub use_provided_thermal_parameters: bool,
    #[prost(double, tag = "11")]
    pub cooling_rate: f64,
    #[prost(double, tag = "12")]
    pub thermal_gradient: f64,
    #[prost(double, tag = "13")]
    pub melt_pool_width: f64,
    #[prost(double, tag = "14")]
    pub melt_pool_depth: f64,
    #[prost(bool, tag = "15")]
    pub use_random_seed: bool,
    #[prost(uint32, tag = "16")]
    pub random_seed: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ThermalHistoryInput {
    #[prost(message, optional, tag = "1")]
    pub machine: Option<MachineSettings>,
    #[prost(message, optional, tag = "2")]
    pub material: Option<AdditiveMaterial>,
    #[prost(message, optional, tag = "3")]
    pub coax_ave_sensor_inputs: Option<CoaxialAverageSensorInputs>,
    #[prost(oneof = "thermal_history_input::Geometry", tags = "4, 5")]
    pub geometry: Option<thermal_history_input::Geometry>,
}

pub mod thermal_history_input {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Geometry {
        #[prost(message, tag = "4")]
        StlFile(super::StlFile),
        #[prost(message, tag = "5")]
        BuildFile(super::BuildFile),
    }
}

/// Envelope sent to `SimulationService/Simulate`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SimulationRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(oneof = "simulation_request::Input", tags = "2, 3, 4, 5")]
    pub input: Option<simulation_request::Input>,
}

pub mod simulation_request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Input {
        #[prost(message, tag = "2")]
        SingleBeadInput(super::SingleBeadInput),
        #[prost(message, tag = "3")]
        PorosityInput(super::PorosityInput),
        #[prost(message, tag = "4")]
        MicrostructureInput(super::MicrostructureInput),
        #[prost(message, tag = "5")]
        ThermalHistoryInput(super::ThermalHistoryInput),
    }
}

// ---------------------------------------------------------------------------
// Simulation results
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ProgressState {
    New = 0,
    Waiting = 1,
    Running = 2,
    Completed = 3,
    Error = 4,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Progress {
    #[prost(enumeration = "ProgressState", tag = "1")]
    pub state: i32,
    #[prost(int32, tag = "2")]
    pub percent_complete: i32,
    #[prost(string, tag = "3")]
    pub message: String,
}

/// Melt pool dimensions at one simulation time step.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeltPoolTimeStep {
    #[prost(double, tag = "1")]
    pub laser_x: f64,
    #[prost(double, tag = "2")]
    pub laser_y: f64,
    #[prost(double, tag = "3")]
    pub length: f64,
    #[prost(double, tag = "4")]
    pub width: f64,
    #[prost(double, tag = "5")]
    pub depth: f64,
    #[prost(double, tag = "6")]
    pub reference_width: f64,
    #[prost(double, tag = "7")]
    pub reference_depth: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeltPool {
    #[prost(message, repeated, tag = "1")]
    pub time_steps: Vec<MeltPoolTimeStep>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PorosityResult {
    #[prost(double, tag = "1")]
    pub void_ratio: f64,
    #[prost(double, tag = "2")]
    pub powder_ratio: f64,
    #[prost(double, tag = "3")]
    pub solid_ratio: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GrainStatistics {
    #[prost(int32, tag = "1")]
    pub grain_number: i32,
    #[prost(double, tag = "2")]
    pub area_fraction: f64,
    #[prost(double, tag = "3")]
    pub diameter_um: f64,
    #[prost(double, tag = "4")]
    pub orientation_angle: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MicrostructureResult {
    #[prost(bytes = "vec", tag = "1")]
    pub xy_vtk: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub xz_vtk: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub yz_vtk: Vec<u8>,
    #[prost(message, repeated, tag = "4")]
    pub xy_circle_equivalence: Vec<GrainStatistics>,
    #[prost(message, repeated, tag = "5")]
    pub xz_circle_equivalence: Vec<GrainStatistics>,
    #[prost(message, repeated, tag = "6")]
    pub yz_circle_equivalence: Vec<GrainStatistics>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ThermalHistoryResult {
    /// Remote path of the zip archive holding the coaxial average sensor data.
    #[prost(string, tag = "1")]
    pub coax_ave_zip_file: String,
}

/// One message of the `Simulate` response stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SimulationResponse {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(oneof = "simulation_response::ResponseType", tags = "2, 3, 4, 5, 6")]
    pub response_type: Option<simulation_response::ResponseType>,
}

pub mod simulation_response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ResponseType {
        #[prost(message, tag = "2")]
        Progress(super::Progress),
        #[prost(message, tag = "3")]
        MeltPool(super::MeltPool),
        #[prost(message, tag = "4")]
        PorosityResult(super::PorosityResult),
        #[prost(message, tag = "5")]
        MicrostructureResult(super::MicrostructureResult),
        #[prost(message, tag = "6")]
        ThermalHistoryResult(super::ThermalHistoryResult),
    }
}

// ---------------------------------------------------------------------------
// Material tuning
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MaterialTuningInput {
    #[prost(bytes = "vec", tag = "1")]
    pub experiment_data: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub material_parameters: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub thermal_properties_lookup: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub characteristic_width_lookup: Vec<u8>,
    #[prost(double, tag = "5")]
    pub allowable_error: f64,
    #[prost(int32, tag = "6")]
    pub max_iterations: i32,
    #[prost(double, tag = "7")]
    pub base_plate_temperature: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MaterialTuningRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, optional, tag = "2")]
    pub input: Option<MaterialTuningInput>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MaterialTuningResult {
    #[prost(bytes = "vec", tag = "1")]
    pub log: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub optimized_parameters: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub characteristic_width_lookup: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MaterialTuningResponse {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(oneof = "material_tuning_response::ResponseType", tags = "2, 3")]
    pub response_type: Option<material_tuning_response::ResponseType>,
}

pub mod material_tuning_response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ResponseType {
        #[prost(message, tag = "2")]
        Progress(super::Progress),
        #[prost(message, tag = "3")]
        Result(super::MaterialTuningResult),
    }
}

// ---------------------------------------------------------------------------
// File transfer
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UploadFileRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(int64, tag = "2")]
    pub total_size: i64,
    #[prost(bytes = "vec", tag = "3")]
    pub content: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UploadFileResponse {
    #[prost(string, tag = "1")]
    pub remote_file_name: String,
    #[prost(message, optional, tag = "2")]
    pub progress: Option<Progress>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DownloadFileRequest {
    #[prost(string, tag = "1")]
    pub remote_file_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DownloadFileResponse {
    #[prost(string, tag = "1")]
    pub file_name: String,
    #[prost(int64, tag = "2")]
    pub total_size: i64,
    #[prost(bytes = "vec", tag = "3")]
    pub content: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Materials catalog and about
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetMaterialsListResponse {
    #[prost(string, repeated, tag = "1")]
    pub names: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetMaterialRequest {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AboutResponse {
    #[prost(map = "string, string", tag = "1")]
    pub metadata: HashMap<String, String>,
}
