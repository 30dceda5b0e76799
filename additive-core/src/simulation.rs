// MIT License
// Copyright 2023--present additive developers

//! Dispatch over the simulation kinds.
//!
//! [`SimulationInput`] closes the set of inputs the `Simulate` RPC accepts.
//! Converting to a request and pairing a response payload with its input are
//! exhaustive matches, so a new kind fails to compile until every step knows
//! about it.

use std::fmt;

use serde::Deserialize;

use crate::config;
use crate::error::{Error, Result};
use crate::microstructure::{MicrostructureConfig, MicrostructureInput, MicrostructureSummary};
use crate::porosity::{PorosityConfig, PorosityInput, PorositySummary};
use crate::proto;
use crate::proto::simulation_response::ResponseType;
use crate::single_bead::{SingleBeadConfig, SingleBeadInput, SingleBeadSummary};
use crate::thermal_history::{ThermalHistoryConfig, ThermalHistoryInput, ThermalHistorySummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationKind {
    SingleBead,
    Porosity,
    Microstructure,
    ThermalHistory,
}

impl SimulationKind {
    pub fn summary_name(self) -> &'static str {
        match self {
            SimulationKind::SingleBead => "SingleBeadSummary",
            SimulationKind::Porosity => "PorositySummary",
            SimulationKind::Microstructure => "MicrostructureSummary",
            SimulationKind::ThermalHistory => "ThermalHistorySummary",
        }
    }
}

impl fmt::Display for SimulationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SimulationKind::SingleBead => "single bead",
            SimulationKind::Porosity => "porosity",
            SimulationKind::Microstructure => "microstructure",
            SimulationKind::ThermalHistory => "thermal history",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationInput {
    SingleBead(SingleBeadInput),
    Porosity(PorosityInput),
    Microstructure(MicrostructureInput),
    ThermalHistory(ThermalHistoryInput),
}

impl SimulationInput {
    pub fn id(&self) -> &str {
        match self {
            SimulationInput::SingleBead(i) => &i.id,
            SimulationInput::Porosity(i) => &i.id,
            SimulationInput::Microstructure(i) => &i.id,
            SimulationInput::ThermalHistory(i) => &i.id,
        }
    }

    pub fn kind(&self) -> SimulationKind {
        match self {
            SimulationInput::SingleBead(_) => SimulationKind::SingleBead,
            SimulationInput::Porosity(_) => SimulationKind::Porosity,
            SimulationInput::Microstructure(_) => SimulationKind::Microstructure,
            SimulationInput::ThermalHistory(_) => SimulationKind::ThermalHistory,
        }
    }

    /// `remote_geometry_path` is only read for thermal history, where it must
    /// name the uploaded geometry.
    pub fn to_request(&self, remote_geometry_path: Option<&str>) -> Result<proto::SimulationRequest> {
        match self {
            SimulationInput::SingleBead(i) => Ok(i.to_request()),
            SimulationInput::Porosity(i) => Ok(i.to_request()),
            SimulationInput::Microstructure(i) => i.to_request(),
            SimulationInput::ThermalHistory(i) => i.to_request(remote_geometry_path.unwrap_or("")),
        }
    }
}

impl From<SingleBeadInput> for SimulationInput {
    fn from(input: SingleBeadInput) -> Self {
        SimulationInput::SingleBead(input)
    }
}

impl From<PorosityInput> for SimulationInput {
    fn from(input: PorosityInput) -> Self {
        SimulationInput::Porosity(input)
    }
}

impl From<MicrostructureInput> for SimulationInput {
    fn from(input: MicrostructureInput) -> Self {
        SimulationInput::Microstructure(input)
    }
}

impl From<ThermalHistoryInput> for SimulationInput {
    fn from(input: ThermalHistoryInput) -> Self {
        SimulationInput::ThermalHistory(input)
    }
}

impl fmt::Display for SimulationInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationInput::SingleBead(i) => fmt::Display::fmt(i, f),
            SimulationInput::Porosity(i) => fmt::Display::fmt(i, f),
            SimulationInput::Microstructure(i) => fmt::Display::fmt(i, f),
            SimulationInput::ThermalHistory(i) => fmt::Display::fmt(i, f),
        }
    }
}

/// One simulation read from a configuration document, keyed by kind:
/// `{"single_bead": {"bead_length": 0.002}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationConfig {
    #[serde(deserialize_with = "config::object")]
    SingleBead(SingleBeadConfig),
    #[serde(deserialize_with = "config::object")]
    Porosity(PorosityConfig),
    #[serde(deserialize_with = "config::object")]
    Microstructure(MicrostructureConfig),
    #[serde(deserialize_with = "config::object")]
    ThermalHistory(ThermalHistoryConfig),
}

impl TryFrom<SimulationConfig> for SimulationInput {
    type Error = Error;

    fn try_from(cfg: SimulationConfig) -> Result<Self> {
        Ok(match cfg {
            SimulationConfig::SingleBead(c) => SimulationInput::SingleBead(c.try_into()?),
            SimulationConfig::Porosity(c) => SimulationInput::Porosity(c.try_into()?),
            SimulationConfig::Microstructure(c) => SimulationInput::Microstructure(c.try_into()?),
            SimulationConfig::ThermalHistory(c) => SimulationInput::ThermalHistory(c.try_into()?),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationSummary {
    SingleBead(SingleBeadSummary),
    Porosity(PorositySummary),
    Microstructure(MicrostructureSummary),
    ThermalHistory(ThermalHistorySummary),
}

impl SimulationSummary {
    /// Pair `input` with the final payload of its response stream.
    ///
    /// Fails when the payload is not the result kind `input` produces.
    pub fn new(input: SimulationInput, payload: &ResponseType) -> Result<Self> {
        Ok(match (input, payload) {
            (SimulationInput::SingleBead(i), ResponseType::MeltPool(r)) => {
                SimulationSummary::SingleBead(SingleBeadSummary::new(i, r))
            }
            (SimulationInput::Porosity(i), ResponseType::PorosityResult(r)) => {
                SimulationSummary::Porosity(PorositySummary::new(i, r))
            }
            (SimulationInput::Microstructure(i), ResponseType::MicrostructureResult(r)) => {
                SimulationSummary::Microstructure(MicrostructureSummary::new(i, r))
            }
            (SimulationInput::ThermalHistory(i), ResponseType::ThermalHistoryResult(r)) => {
                SimulationSummary::ThermalHistory(ThermalHistorySummary::new(i, r))
            }
            (input, _) => {
                return Err(Error::InvalidValue(format!(
                    "Invalid result type passed to init, {}",
                    input.kind().summary_name()
                )))
            }
        })
    }

    pub fn kind(&self) -> SimulationKind {
        match self {
            SimulationSummary::SingleBead(_) => SimulationKind::SingleBead,
            SimulationSummary::Porosity(_) => SimulationKind::Porosity,
            SimulationSummary::Microstructure(_) => SimulationKind::Microstructure,
            SimulationSummary::ThermalHistory(_) => SimulationKind::ThermalHistory,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SimulationSummary::SingleBead(s) => &s.input().id,
            SimulationSummary::Porosity(s) => &s.input().id,
            SimulationSummary::Microstructure(s) => &s.input().id,
            SimulationSummary::ThermalHistory(s) => &s.input().id,
        }
    }
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationSummary::SingleBead(s) => fmt::Display::fmt(s, f),
            SimulationSummary::Porosity(s) => fmt::Display::fmt(s, f),
            SimulationSummary::Microstructure(s) => fmt::Display::fmt(s, f),
            SimulationSummary::ThermalHistory(s) => fmt::Display::fmt(s, f),
        }
    }
}

/// Log a progress update; an `Error` state ends the simulation `id`.
pub fn check_progress(id: &str, progress: &proto::Progress) -> Result<()> {
    let state = proto::ProgressState::try_from(progress.state).unwrap_or(proto::ProgressState::New);
    if state == proto::ProgressState::Error {
        tracing::warn!(id, message = %progress.message, "simulation reported an error");
        return Err(Error::SimulationFailed {
            id: id.to_string(),
            message: progress.message.clone(),
        });
    }
    tracing::debug!(
        id,
        state = ?state,
        percent = progress.percent_complete,
        message = %progress.message,
        "progress"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::from_json;

    fn progress(state: proto::ProgressState, message: &str) -> proto::Progress {
        proto::Progress {
            state: state as i32,
            percent_complete: 50,
            message: message.into(),
        }
    }

    #[test]
    fn dispatch_picks_wire_branch() {
        use proto::simulation_request::Input;
        let branch = |input: SimulationInput| input.to_request(None).unwrap().input.unwrap();
        assert!(matches!(
            branch(SingleBeadInput::default().into()),
            Input::SingleBeadInput(_)
        ));
        assert!(matches!(
            branch(PorosityInput::default().into()),
            Input::PorosityInput(_)
        ));
        assert!(matches!(
            branch(MicrostructureInput::default().into()),
            Input::MicrostructureInput(_)
        ));
    }

    #[test]
    fn thermal_history_requires_remote_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let input: SimulationInput = ThermalHistoryInput::default()
            .with_geometry(crate::geometry::StlFile::new(file.path()).unwrap())
            .into();
        assert!(matches!(
            input.to_request(None),
            Err(Error::MissingPrerequisite(_))
        ));
        assert!(input.to_request(Some("remote.stl")).is_ok());
    }

    #[test]
    fn summary_matches_payload() {
        let input: SimulationInput = PorosityInput::default().into();
        let payload = ResponseType::PorosityResult(proto::PorosityResult {
            void_ratio: 0.0,
            powder_ratio: 0.1,
            solid_ratio: 0.9,
        });
        match SimulationSummary::new(input, &payload).unwrap() {
            SimulationSummary::Porosity(s) => assert_eq!(s.relative_density(), 0.9),
            other => panic!("unexpected summary: {other:?}"),
        }
    }

    #[test]
    fn summary_rejects_mismatched_payload() {
        let input: SimulationInput = SingleBeadInput::default().into();
        let payload = ResponseType::PorosityResult(proto::PorosityResult::default());
        let err = SimulationSummary::new(input, &payload).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid result type passed to init, SingleBeadSummary"
        );

        let input: SimulationInput = PorosityInput::default().into();
        let payload = ResponseType::Progress(proto::Progress::default());
        assert!(SimulationSummary::new(input, &payload).is_err());
    }

    #[test]
    fn error_progress_fails_simulation() {
        assert!(check_progress("a", &progress(proto::ProgressState::Running, "ok")).is_ok());
        let err = check_progress("a", &progress(proto::ProgressState::Error, "boom")).unwrap_err();
        match err {
            Error::SimulationFailed { id, message } => {
                assert_eq!(id, "a");
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn config_selects_kind() {
        let cfg: SimulationConfig =
            from_json("SimulationInput", r#"{"porosity": {"id": "p", "size_z": 0.004}}"#).unwrap();
        let input = SimulationInput::try_from(cfg).unwrap();
        assert_eq!(input.kind(), SimulationKind::Porosity);
        assert_eq!(input.id(), "p");

        let err = from_json::<SimulationConfig>(
            "SimulationInput",
            r#"{"single_bead": {"bead_lenght": 0.002}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownField { ref field, .. } if field == "bead_lenght"));
        assert_eq!(
            err.to_string(),
            "'SingleBeadInput' object has no attribute 'bead_lenght'"
        );
    }
}
