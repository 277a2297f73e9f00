//! Pointer backend invoked as a subprocess.

use std::future::Future;
use std::io::ErrorKind;
use std::process::Stdio;

use autoclick_core::{parse_position, BackendError, BackendMode, Coordinate};
use tokio::process::Command;
use tracing::{debug, trace};

/// Arguments that make cliclick print the pointer position.
const CLICLICK_POSITION_ARGS: &[&str] = &["p"];

/// Arguments that make cliclick click where the pointer is.
const CLICLICK_CLICK_ARGS: &[&str] = &["c:."];

/// Something that can read the pointer position and click.
///
/// The loop driver only talks to this trait, so tests can substitute a
/// scripted backend for the real subprocess.
pub trait Backend {
    /// Sample the current pointer position.
    fn position(&mut self) -> impl Future<Output = Result<Coordinate, BackendError>> + Send;

    /// Click once at the current pointer position.
    fn click(&mut self) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// Captured output of a successful backend run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOutput {
    pub stdout: String,
    pub stderr: String,
}

/// An external executable with one argument list per [`BackendMode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCommand {
    program: String,
    position_args: Vec<String>,
    click_args: Vec<String>,
}

impl BackendCommand {
    /// A cliclick-compatible backend at `program`.
    pub fn cliclick(program: impl Into<String>) -> Self {
        Self::new(
            program,
            CLICLICK_POSITION_ARGS.iter().map(|s| s.to_string()).collect(),
            CLICLICK_CLICK_ARGS.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn new(
        program: impl Into<String>,
        position_args: Vec<String>,
        click_args: Vec<String>,
    ) -> Self {
        Self {
            program: program.into(),
            position_args,
            click_args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn args(&self, mode: BackendMode) -> &[String] {
        match mode {
            BackendMode::Position => &self.position_args,
            BackendMode::Click => &self.click_args,
        }
    }

    /// Run the backend in `mode` and wait for it to exit.
    ///
    /// A missing executable maps to [`BackendError::Unavailable`] and a
    /// non-zero exit to [`BackendError::CommandFailed`] with stderr
    /// attached. The child is killed if the returned future is dropped
    /// before it completes.
    pub async fn run_backend(&self, mode: BackendMode) -> Result<BackendOutput, BackendError> {
        let args = self.args(mode);
        trace!("Running backend: {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| {
                if source.kind() == ErrorKind::NotFound {
                    BackendError::Unavailable {
                        program: self.program.clone(),
                    }
                } else {
                    BackendError::SpawnFailed {
                        program: self.program.clone(),
                        source,
                    }
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            debug!(
                "Backend {} command exited with {}, stdout: {:?}",
                mode, output.status, stdout
            );
            return Err(BackendError::command_failed(
                mode,
                output.status.code(),
                stderr,
            ));
        }

        Ok(BackendOutput { stdout, stderr })
    }
}

impl Backend for BackendCommand {
    async fn position(&mut self) -> Result<Coordinate, BackendError> {
        let output = self.run_backend(BackendMode::Position).await?;
        if !output.stderr.trim().is_empty() {
            debug!("Backend position stderr: {}", output.stderr.trim());
        }
        parse_position(&output.stdout)
    }

    async fn click(&mut self) -> Result<(), BackendError> {
        self.run_backend(BackendMode::Click).await.map(|_| ())
    }
}
