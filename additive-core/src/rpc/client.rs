// MIT License
// Copyright 2023--present additive developers

//! Blocking client facade over [`AdditiveStub`].
//!
//! The client owns a tokio runtime so callers can drive the async stub
//! synchronously. Each method issues its RPC and blocks until the final
//! response arrives; calls on one client run one after another over the same
//! channel.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::runtime::Runtime;
use tonic::transport::Endpoint;

use crate::config::{ClientConfig, DEFAULT_HOST};
use crate::error::{Error, Result};
use crate::material::Material;
use crate::material_tuning::{MaterialTuningInput, MaterialTuningSummary};
use crate::proto;
use crate::rpc::stub::{upload_chunks, AdditiveStub};
use crate::server::{find_open_port, wait_for_server, ServerLauncher, ServerProcess};
use crate::simulation::{check_progress, SimulationInput, SimulationSummary};

/// Synchronous client of an additive server.
pub struct AdditiveClient {
    runtime: Runtime,
    stub: AdditiveStub,
    config: ClientConfig,
    server: Option<ServerProcess>,
}

impl AdditiveClient {
    /// Create a client for the server described by `config`.
    ///
    /// The connection is established lazily on the first call.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let runtime = Runtime::new()?;
        let mut endpoint =
            Endpoint::from_shared(config.uri())?.connect_timeout(config.connect_timeout());
        if let Some(timeout) = config.request_timeout() {
            endpoint = endpoint.timeout(timeout);
        }
        let channel = {
            let _guard = runtime.enter();
            endpoint.connect_lazy()
        };
        tracing::info!(uri = %config.uri(), "created additive client");
        Ok(Self {
            runtime,
            stub: AdditiveStub::new(channel),
            config: config.clone(),
            server: None,
        })
    }

    /// Launch a server from the local installation and connect to it.
    ///
    /// The server writes its log into `cwd` and is stopped when the client
    /// is dropped.
    pub fn start_local(cwd: impl AsRef<Path>, timeout: Duration) -> Result<Self> {
        let port = find_open_port()?;
        let server = ServerLauncher::from_env().launch(port, cwd)?;
        wait_for_server(DEFAULT_HOST, port, timeout)?;
        let mut client = Self::connect(&ClientConfig::new(DEFAULT_HOST, port))?;
        client.server = Some(server);
        Ok(client)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The server launched by [`Self::start_local`], if any.
    pub fn server(&self) -> Option<&ServerProcess> {
        self.server.as_ref()
    }

    /// Server metadata such as version and build information.
    pub fn about(&mut self) -> Result<HashMap<String, String>> {
        Ok(self.runtime.block_on(self.stub.about())?)
    }

    /// Names of the materials in the server catalog.
    pub fn materials_list(&mut self) -> Result<Vec<String>> {
        Ok(self.runtime.block_on(self.stub.get_materials_list())?)
    }

    pub fn material(&mut self, name: &str) -> Result<Material> {
        let msg = self.runtime.block_on(self.stub.get_material(name))?;
        Ok(Material::from_message(&msg))
    }

    /// Run one simulation to completion.
    ///
    /// Thermal history geometry is uploaded first and the request refers to
    /// the uploaded copy.
    pub fn simulate(&mut self, input: impl Into<SimulationInput>) -> Result<SimulationSummary> {
        let input = input.into();
        let remote_geometry = match &input {
            SimulationInput::ThermalHistory(th) => match &th.geometry {
                Some(geometry) => Some(self.upload_file(geometry.local_path())?),
                None => None,
            },
            _ => None,
        };
        let request = input.to_request(remote_geometry.as_deref())?;
        tracing::info!(id = %request.id, kind = %input.kind(), "starting simulation");

        let payload = self
            .runtime
            .block_on(collect_simulation(&mut self.stub, request))?;
        let summary = SimulationSummary::new(input, &payload)?;
        tracing::info!(id = summary.id(), "simulation complete");
        Ok(summary)
    }

    /// Run `inputs` one after another. A failed simulation does not stop the
    /// ones after it.
    pub fn simulate_all(&mut self, inputs: Vec<SimulationInput>) -> Vec<Result<SimulationSummary>> {
        let total = inputs.len();
        inputs
            .into_iter()
            .enumerate()
            .map(|(n, input)| {
                tracing::info!(n = n + 1, total, id = input.id(), "simulation");
                let result = self.simulate(input);
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "simulation failed");
                }
                result
            })
            .collect()
    }

    pub fn tune_material(&mut self, input: MaterialTuningInput) -> Result<MaterialTuningSummary> {
        let request = input.to_request()?;
        tracing::info!(id = %request.id, "starting material tuning");
        let result = self
            .runtime
            .block_on(collect_tuning(&mut self.stub, request))?;
        Ok(MaterialTuningSummary::new(input, &result))
    }

    /// Upload a local file; returns the name the server stored it under.
    pub fn upload_file(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let content = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!(path = %path.display(), bytes = content.len(), "uploading file");
        let chunks = upload_chunks(&name, &content);

        let stub = &mut self.stub;
        let remote = self.runtime.block_on(async move {
            let mut responses = stub.upload_file(futures::stream::iter(chunks)).await?;
            let mut remote = None;
            while let Some(msg) = responses.message().await? {
                if let Some(progress) = &msg.progress {
                    check_progress(&name, progress)?;
                }
                if !msg.remote_file_name.is_empty() {
                    remote = Some(msg.remote_file_name);
                }
            }
            remote.ok_or_else(|| {
                Error::UnexpectedResponse(format!("upload of {name} returned no remote file name"))
            })
        })?;
        tracing::debug!(remote = %remote, "upload complete");
        Ok(remote)
    }

    /// Download `remote_file_name` into `dir`; returns the local path.
    pub fn download_file(
        &mut self,
        remote_file_name: &str,
        dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let stub = &mut self.stub;
        let path = self.runtime.block_on(async move {
            let mut responses = stub.download_file(remote_file_name).await?;
            let mut out: Option<(PathBuf, File)> = None;
            while let Some(msg) = responses.message().await? {
                if out.is_none() {
                    let path = dir.join(local_file_name(&msg.file_name, remote_file_name)?);
                    let file = File::create(&path)?;
                    out = Some((path, file));
                }
                if let Some((_, file)) = out.as_mut() {
                    file.write_all(&msg.content)?;
                }
            }
            match out {
                Some((path, _)) => Ok(path),
                None => Err(Error::UnexpectedResponse(format!(
                    "download of {remote_file_name} returned no data"
                ))),
            }
        })?;
        tracing::info!(remote = remote_file_name, path = %path.display(), "downloaded file");
        Ok(path)
    }
}

/// Drain a `Simulate` stream up to its first non-progress payload.
async fn collect_simulation(
    stub: &mut AdditiveStub,
    request: proto::SimulationRequest,
) -> Result<proto::simulation_response::ResponseType> {
    use proto::simulation_response::ResponseType;

    let id = request.id.clone();
    let mut responses = stub.simulate(request).await?;
    while let Some(msg) = responses.message().await? {
        match msg.response_type {
            Some(ResponseType::Progress(progress)) => check_progress(&id, &progress)?,
            Some(payload) => return Ok(payload),
            None => {}
        }
    }
    Err(Error::UnexpectedResponse(format!(
        "simulation {id} ended without a result"
    )))
}

async fn collect_tuning(
    stub: &mut AdditiveStub,
    request: proto::MaterialTuningRequest,
) -> Result<proto::MaterialTuningResult> {
    use proto::material_tuning_response::ResponseType;

    let id = request.id.clone();
    let mut responses = stub.tune_material(request).await?;
    while let Some(msg) = responses.message().await? {
        match msg.response_type {
            Some(ResponseType::Progress(progress)) => check_progress(&id, &progress)?,
            Some(ResponseType::Result(result)) => return Ok(result),
            None => {}
        }
    }
    Err(Error::UnexpectedResponse(format!(
        "material tuning {id} ended without a result"
    )))
}

/// File name component of the server supplied name, falling back to the
/// requested remote name. Directory parts are dropped.
fn local_file_name(server_name: &str, remote_file_name: &str) -> Result<PathBuf> {
    [server_name, remote_file_name]
        .into_iter()
        .find_map(|name| Path::new(name).file_name().map(PathBuf::from))
        .ok_or_else(|| {
            Error::UnexpectedResponse(format!("no usable file name for {remote_file_name}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_name_strips_directories() {
        assert_eq!(
            local_file_name("/srv/out/coax.zip", "x").unwrap(),
            PathBuf::from("coax.zip")
        );
        assert_eq!(
            local_file_name("", "results/th.zip").unwrap(),
            PathBuf::from("th.zip")
        );
        assert!(local_file_name("", "..").is_err());
    }

    #[test]
    fn connect_is_lazy() {
        let port = find_open_port().unwrap();
        let client = AdditiveClient::connect(&ClientConfig::new("127.0.0.1", port)).unwrap();
        assert_eq!(client.config().port, port);
        assert!(client.server().is_none());
    }

    #[test]
    fn calls_to_unreachable_server_propagate_transport_errors() {
        let port = find_open_port().unwrap();
        let mut config = ClientConfig::new("127.0.0.1", port);
        config.connect_timeout_ms = 500;
        let mut client = AdditiveClient::connect(&config).unwrap();
        assert!(matches!(client.about(), Err(Error::Rpc(_))));
    }

    #[test]
    fn thermal_history_without_geometry_fails_before_any_rpc() {
        let port = find_open_port().unwrap();
        let mut client = AdditiveClient::connect(&ClientConfig::new("127.0.0.1", port)).unwrap();
        let err = client
            .simulate(crate::ThermalHistoryInput::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingPrerequisite(_)));
    }
}
