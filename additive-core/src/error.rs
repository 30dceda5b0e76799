// MIT License
// Copyright 2023--present additive developers

//! Error handling for the whole crate.
//!
//! Every fallible operation returns [`Result`], whose error side is the single
//! [`Error`] enum below. The variants follow the causes a caller has to react
//! to differently:
//!
//! 1. **Invalid construction input**: [`Error::UnknownField`],
//!    [`Error::InvalidValue`], [`Error::Config`]. Raised synchronously by
//!    setters, constructors and config ingestion.
//! 2. **Missing prerequisite state**: [`Error::MissingPrerequisite`], raised
//!    when a request is built before everything it needs was assigned.
//! 3. **Environment failures** of the server launcher:
//!    [`Error::UnsupportedOs`], [`Error::InstallationNotFound`],
//!    [`Error::ExecutableNotFound`], [`Error::ServerExited`],
//!    [`Error::ServerNotReady`].
//! 4. **Transport failures**: [`Error::Transport`] and [`Error::Rpc`] wrap the
//!    tonic types transparently; nothing is reclassified.
//!
//! ## Usage
//!
//! ```
//! use additive_core::{Error, Machine};
//!
//! let mut machine = Machine::default();
//! match machine.set_laser_power(10.0) {
//!     Err(Error::InvalidValue(msg)) => {
//!         assert_eq!(msg, "laser_power must be between 50 and 700.");
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration object named a field the target type does not have.
    #[error("'{object}' object has no attribute '{field}'")]
    UnknownField {
        /// Type whose configuration was being read.
        object: String,
        /// Offending field name.
        field: String,
    },

    /// A value was outside its allowed range or otherwise malformed.
    #[error("{0}")]
    InvalidValue(String),

    /// An operation was attempted before a required value was assigned.
    #[error("{0}")]
    MissingPrerequisite(String),

    /// A configuration document could not be parsed.
    #[error("invalid {object} configuration: {source}")]
    Config {
        /// Type whose configuration was being read.
        object: &'static str,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// The server launcher does not know how to run on this platform.
    #[error("Unsupported OS: {0}")]
    UnsupportedOs(String),

    /// The installation root could not be resolved.
    #[error("Cannot find Ansys installation directory: {0}")]
    InstallationNotFound(String),

    /// The installation root exists but the server executable does not.
    #[error("Cannot find {}", .0.display())]
    ExecutableNotFound(PathBuf),

    /// The server process terminated right after it was started.
    #[error("Server exited with code {}", display_code(.code))]
    ServerExited {
        /// Exit code, `None` when the process was killed by a signal.
        code: Option<i32>,
    },

    /// The server did not answer the status service in time.
    #[error("server at {addr} not ready after {timeout:?}")]
    ServerNotReady {
        /// `host:port` that was probed.
        addr: String,
        /// Total time spent waiting.
        timeout: Duration,
    },

    /// The server reported that a simulation failed.
    #[error("simulation {id} failed: {message}")]
    SimulationFailed {
        /// Identifier of the failed simulation.
        id: String,
        /// Message reported by the server.
        message: String,
    },

    /// The server answered with something the client cannot interpret.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Local filesystem or process error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Channel could not be set up.
    #[cfg(feature = "rpc")]
    #[error(transparent)]
    Transport(#[from] tonic::transport::Error),

    /// An RPC completed with a non-OK status.
    #[cfg(feature = "rpc")]
    #[error(transparent)]
    Rpc(#[from] tonic::Status),
}

/// Result type for additive-core operations.
pub type Result<T> = std::result::Result<T, Error>;

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "<terminated by signal>".to_string(),
    }
}

/// Check that `value` lies in `[min, max]`, naming `field` on failure.
pub(crate) fn check_range<T>(field: &str, value: T, min: T, max: T) -> Result<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    // NaN fails both comparisons, so it is rejected as well.
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(Error::InvalidValue(format!(
            "{field} must be between {min} and {max}."
        )))
    }
}

/// Check that `path` exists on the local filesystem.
pub(crate) fn check_exists(path: &std::path::Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::InvalidValue(format!(
            "File does not exist, {}",
            path.display()
        )))
    }
}
