// MIT License
// Copyright 2023--present additive developers

//! # additive-core
//!
//! Typed client for a remote additive manufacturing simulation server.
//! The simulations themselves (melt pool, porosity, microstructure, thermal
//! history, material tuning) run in the vendor server process; this crate
//! validates inputs, marshals them into the server's protobuf messages, and
//! turns responses into summaries.
//!
//! ## Modules
//!
//! - [`machine`], [`material`], [`geometry`]: parameter value objects.
//!   Machine fields are range-checked on every assignment.
//! - [`single_bead`], [`porosity`], [`microstructure`], [`thermal_history`],
//!   [`material_tuning`]: one input and one summary type per simulation kind.
//! - [`simulation`]: the closed set of simulation kinds and the dispatch to
//!   and from the wire.
//! - [`proto`]: wire messages.
//! - [`server`]: free port discovery, server launch, readiness probing.
//! - [`rpc`] (feature `rpc`, on by default): the gRPC stub and the blocking
//!   [`AdditiveClient`].
//! - [`config`]: client settings and JSON ingestion of inputs.
//!
//! ## Example
//!
//! ```no_run
//! use additive_core::{AdditiveClient, ClientConfig, Machine, SingleBeadInput};
//!
//! # fn main() -> additive_core::Result<()> {
//! let mut client = AdditiveClient::connect(&ClientConfig::default())?;
//! let material = client.material("17-4PH")?;
//!
//! let mut machine = Machine::default();
//! machine.set_laser_power(250.0)?;
//! let input = SingleBeadInput::new("bead-1", machine, material).with_bead_length(0.002)?;
//!
//! if let additive_core::SimulationSummary::SingleBead(summary) = client.simulate(input)? {
//!     summary.melt_pool().write_csv(std::io::stdout())?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events and installs no subscriber.

pub mod config;
pub mod error;
pub mod geometry;
pub mod limits;
pub mod machine;
pub mod material;
pub mod material_tuning;
pub mod microstructure;
pub mod porosity;
pub mod proto;
pub mod server;
pub mod simulation;
pub mod single_bead;
pub mod thermal_history;

#[cfg(feature = "rpc")]
pub mod rpc;

pub use config::{init_user_data_dir, ClientConfig, ConfigObject, DEFAULT_HOST, DEFAULT_PORT};
pub use error::{Error, Result};
pub use geometry::{BuildFile, Geometry, MachineType, StlFile};
pub use machine::Machine;
pub use material::{CharacteristicWidthDataPoint, Material, ThermalPropertiesDataPoint};
pub use material_tuning::{MaterialTuningInput, MaterialTuningSummary};
pub use microstructure::{MicrostructureInput, MicrostructureSummary};
pub use porosity::{PorosityInput, PorositySummary};
pub use server::{find_open_port, ServerLauncher, ServerProcess};
pub use simulation::{SimulationConfig, SimulationInput, SimulationKind, SimulationSummary};
pub use single_bead::{MeltPool, MeltPoolColumn, SingleBeadInput, SingleBeadSummary};
pub use thermal_history::{
    CoaxialAverageSensorInputs, Range, ThermalHistoryInput, ThermalHistorySummary,
};

#[cfg(feature = "rpc")]
pub use rpc::{AdditiveClient, AdditiveStub};
#[cfg(feature = "rpc")]
pub use server::{probe_once, wait_for_server};
