use crate::client::Client;
use crate::common::defs::LOCALHOST;
use crate::error::{Error, Result};
use crate::params::LaunchParams;
use itertools::Itertools;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);
pub const READY_TIMEOUT: Duration = Duration::from_secs(120);

#[cfg(target_os = "windows")]
pub const PLATFORM: &str = "Win64";
#[cfg(target_os = "macos")]
pub const PLATFORM: &str = "Mac";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const PLATFORM: &str = "Linux";

/// Which editor binary gets launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineBuild {
    #[default]
    Development,
    DebugGame,
}

impl EngineBuild {
    pub fn from_debug(debug: bool) -> Self {
        if debug {
            Self::DebugGame
        } else {
            Self::Development
        }
    }

    pub fn executable_name(&self) -> String {
        let name = match self {
            Self::Development => "UE4Editor".to_string(),
            Self::DebugGame => format!("UE4Editor-{PLATFORM}-DebugGame"),
        };
        if cfg!(target_os = "windows") {
            format!("{name}.exe")
        } else {
            name
        }
    }
}

/// Where the engine and the projects live on disk.
#[derive(Debug, Clone, Default)]
pub struct EngineLocator {
    pub engine_dir: Option<PathBuf>,
    pub project_dir: Option<PathBuf>,
    pub build: EngineBuild,
}

impl EngineLocator {
    pub fn executable(&self) -> Result<PathBuf> {
        let dir = self
            .engine_dir
            .as_ref()
            .ok_or_else(|| Error::EngineNotFound(PathBuf::from("<engine dir not set>")))?;
        let path = dir
            .join("Engine")
            .join("Binaries")
            .join(PLATFORM)
            .join(self.build.executable_name());
        existing(path)
    }

    pub fn project(&self, project_name: &str) -> Result<PathBuf> {
        let dir = self
            .project_dir
            .as_ref()
            .ok_or_else(|| Error::EngineNotFound(PathBuf::from("<project dir not set>")))?;
        let path = dir
            .join(project_name)
            .join(format!("{project_name}.uproject"));
        existing(path)
    }
}

fn existing(path: PathBuf) -> Result<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(Error::EngineNotFound(path))
    }
}

/// Fails with `PortInUse` when something already listens on `port`.
pub fn ensure_port_free(port: u16) -> Result<()> {
    match TcpListener::bind((LOCALHOST, port)) {
        Ok(listener) => {
            drop(listener);
            Ok(())
        }
        Err(e) => {
            debug!(port, error = %e, "port check failed");
            Err(Error::PortInUse(port))
        }
    }
}

/// An engine instance spawned by us. Killed when dropped.
#[derive(Debug)]
pub struct EngineProcess {
    child: Child,
}

impl EngineProcess {
    pub fn spawn(executable: &Path, args: &[String]) -> Result<Self> {
        info!(
            "launching {} {}",
            executable.display(),
            args.iter().join(" ")
        );
        let child = Command::new(executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(Self { child })
    }

    /// Checks the port, spawns the engine for `project_name` and waits until its control port answers.
    pub fn launch(
        locator: &EngineLocator,
        project_name: &str,
        params: &LaunchParams,
        client: &Client,
        port: u16,
    ) -> Result<Self> {
        Self::launch_with_timeout(locator, project_name, params, client, port, READY_TIMEOUT)
    }

    /// Same as `launch`, giving up after `timeout`. The child is killed on failure.
    pub fn launch_with_timeout(
        locator: &EngineLocator,
        project_name: &str,
        params: &LaunchParams,
        client: &Client,
        port: u16,
        timeout: Duration,
    ) -> Result<Self> {
        ensure_port_free(port)?;
        let executable = locator.executable()?;
        let project = locator.project(project_name)?;

        let mut process = Self::spawn(&executable, &params.command_line(&project, port))?;
        process.wait_until_ready(client, port, timeout)?;
        Ok(process)
    }

    pub fn wait_until_ready(&mut self, client: &Client, port: u16, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Err(Error::EngineExited(status));
            }
            if client.is_ready() {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                info!(port, elapsed_ms, "engine is up");
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(Error::ConnectTimeout {
                    port,
                    secs: timeout.as_secs(),
                });
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Kills and reaps the process. Calling it on an already exited process is fine.
    pub fn terminate(&mut self) {
        match self.child.try_wait() {
            Ok(Some(status)) => debug!(%status, "engine already exited"),
            _ => {
                if let Err(e) = self.child.kill() {
                    warn!(error = %e, "failed to kill engine process");
                }
                let _ = self.child.wait();
            }
        }
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}
