// MIT License
// Copyright 2023--present additive developers

//! Local server lifecycle: free port discovery, process launch and readiness
//! polling.
//!
//! A typical sequence, which [`crate::AdditiveClient::start_local`] performs:
//!
//! 1. [`find_open_port`] picks a port. Another process may grab it before the
//!    server binds; nothing here guards against that.
//! 2. [`ServerLauncher::launch`] starts the executable and checks once that it
//!    did not exit straight away.
//! 3. [`wait_for_server`] polls [`probe_once`] until the status service
//!    answers.

use std::fs::{self, File};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
#[cfg(feature = "rpc")]
use std::time::Duration;

use crate::error::{Error, Result};

/// Product version whose installation is launched by default.
pub const DEFAULT_ANSYS_VERSION: &str = "241";
/// Prefix of the environment variable holding the installation root.
pub const INSTALL_ROOT_ENV_PREFIX: &str = "AWP_ROOT";

const LINUX_INSTALL_BASE: &str = "/usr/ansys_inc";
const LOG_FILE_PREFIX: &str = "additive_server_";

/// Ask the OS for a free TCP port on the loopback interface.
///
/// The socket is closed before returning, so the port is only likely to be
/// free, not reserved.
pub fn find_open_port() -> Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    let port = listener.local_addr()?.port();
    tracing::debug!(port, "found open port");
    Ok(port)
}

/// Locates and starts the vendor server executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLauncher {
    os: String,
    version: String,
    install_root: Option<PathBuf>,
}

impl ServerLauncher {
    /// `os` takes the values of [`std::env::consts::OS`]; only `windows` and
    /// `linux` are supported.
    pub fn new(
        os: impl Into<String>,
        version: impl Into<String>,
        install_root: Option<PathBuf>,
    ) -> Self {
        Self {
            os: os.into(),
            version: version.into(),
            install_root,
        }
    }

    /// Launcher for this platform and [`DEFAULT_ANSYS_VERSION`].
    ///
    /// The installation root comes from `AWP_ROOT<version>`. On Linux an
    /// unset variable falls back to `/usr/ansys_inc/v<version>`.
    pub fn from_env() -> Self {
        Self::from_env_for(std::env::consts::OS, DEFAULT_ANSYS_VERSION)
    }

    pub fn from_env_for(os: &str, version: &str) -> Self {
        let var = install_root_env_var(version);
        let install_root = std::env::var_os(&var).map(PathBuf::from).or_else(|| {
            (os == "linux").then(|| Path::new(LINUX_INSTALL_BASE).join(format!("v{version}")))
        });
        Self::new(os, version, install_root)
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn install_root(&self) -> Option<&Path> {
        self.install_root.as_deref()
    }

    /// Path of the executable relative to the installation root.
    pub fn executable_subpath(&self) -> Result<PathBuf> {
        let name = match self.os.as_str() {
            "windows" => "Additive.Grpc.exe",
            "linux" => "Additive.Grpc",
            other => return Err(Error::UnsupportedOs(other.to_string())),
        };
        Ok(Path::new("Additive").join("additive_grpc").join(name))
    }

    /// Resolve the executable, checking the platform first, then the
    /// installation root, then the file itself.
    pub fn locate_executable(&self) -> Result<PathBuf> {
        let subpath = self.executable_subpath()?;
        let root = match &self.install_root {
            Some(root) if root.is_dir() => root,
            Some(root) => return Err(Error::InstallationNotFound(root.display().to_string())),
            None => {
                return Err(Error::InstallationNotFound(format!(
                    "{} is not set",
                    install_root_env_var(&self.version)
                )))
            }
        };
        let exe = root.join(subpath);
        if !exe.exists() {
            return Err(Error::ExecutableNotFound(exe));
        }
        Ok(exe)
    }

    /// Start the server on `port` with `cwd` as working directory.
    ///
    /// Standard output and error both go to a timestamped log file in `cwd`.
    /// Fails if the process has already exited when first polled.
    pub fn launch(&self, port: u16, cwd: impl AsRef<Path>) -> Result<ServerProcess> {
        let exe = self.locate_executable()?;
        let cwd = cwd.as_ref();
        fs::create_dir_all(cwd)?;

        let log_path = cwd.join(log_file_name(chrono::Local::now()));
        let stdout = File::create(&log_path)?;
        let stderr = stdout.try_clone()?;

        let mut child = Command::new(&exe)
            .arg("--port")
            .arg(port.to_string())
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()?;
        tracing::info!(
            exe = %exe.display(),
            port,
            log = %log_path.display(),
            pid = child.id(),
            "launched additive server"
        );

        startup_status(child.try_wait()?)?;
        Ok(ServerProcess {
            child,
            port,
            log_path,
        })
    }
}

fn install_root_env_var(version: &str) -> String {
    format!("{INSTALL_ROOT_ENV_PREFIX}{version}")
}

fn log_file_name<Tz: chrono::TimeZone>(now: chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{LOG_FILE_PREFIX}{}.log", now.format("%Y%m%d-%H%M%S"))
}

/// Map the first exit-status poll of a freshly started server to a result.
fn startup_status(status: Option<ExitStatus>) -> Result<()> {
    match status {
        None => Ok(()),
        Some(status) => {
            tracing::warn!(%status, "server exited during startup");
            Err(Error::ServerExited {
                code: status.code(),
            })
        }
    }
}

/// A running server process.
///
/// The process is killed when the handle is dropped.
#[derive(Debug)]
pub struct ServerProcess {
    child: Child,
    port: u16,
    log_path: PathBuf,
}

impl ServerProcess {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// `None` while the process is running.
    pub fn try_status(&mut self) -> Result<Option<ExitStatus>> {
        Ok(self.child.try_wait()?)
    }

    pub fn kill(&mut self) -> Result<()> {
        if self.child.try_wait()?.is_none() {
            self.child.kill()?;
            self.child.wait()?;
            tracing::info!(port = self.port, "stopped additive server");
        }
        Ok(())
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        if let Err(e) = self.kill() {
            tracing::warn!(error = %e, port = self.port, "failed to stop additive server");
        }
    }
}

#[cfg(feature = "rpc")]
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Ask the status service at `host:port` for its metadata once.
///
/// Returns `false` on any failure, including connection errors and RPC
/// errors, within `timeout`. This is the only call that swallows transport
/// errors; everything in [`crate::AdditiveClient`] propagates them.
#[cfg(feature = "rpc")]
pub fn probe_once(host: &str, port: u16, timeout: Duration) -> bool {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::warn!(error = %e, "probe could not create runtime");
            return false;
        }
    };
    let uri = format!("http://{host}:{port}");
    let reachable = runtime.block_on(async {
        let endpoint = match tonic::transport::Endpoint::from_shared(uri.clone()) {
            Ok(ep) => ep.connect_timeout(timeout).timeout(timeout),
            Err(_) => return false,
        };
        let attempt = async {
            let channel = endpoint.connect().await.ok()?;
            crate::rpc::AdditiveStub::new(channel).about().await.ok()
        };
        matches!(tokio::time::timeout(timeout, attempt).await, Ok(Some(_)))
    });
    tracing::debug!(%uri, reachable, "probed server");
    reachable
}

/// Block until [`probe_once`] succeeds or `timeout` elapses.
#[cfg(feature = "rpc")]
pub fn wait_for_server(host: &str, port: u16, timeout: Duration) -> Result<()> {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(std::time::Instant::now());
        if remaining.is_zero() {
            tracing::warn!(host, port, ?timeout, "server not ready");
            return Err(Error::ServerNotReady {
                addr: format!("{host}:{port}"),
                timeout,
            });
        }
        if probe_once(host, port, remaining) {
            return Ok(());
        }
        let remaining = deadline.saturating_duration_since(std::time::Instant::now());
        std::thread::sleep(POLL_INTERVAL.min(remaining));
    }
}
