//! Backend error types with suggestions.

use std::fmt;

use thiserror::Error;

/// The two invocation modes of the pointer backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// Report the current pointer position as `"<x>,<y>"`.
    Position,
    /// Click at the current pointer position.
    Click,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::Position => write!(f, "position"),
            BackendMode::Click => write!(f, "click"),
        }
    }
}

/// Why a backend invocation failed. Every variant is fatal to the loop.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend executable could not be found.
    #[error("backend executable '{program}' not found")]
    Unavailable { program: String },

    /// The backend exists but could not be launched.
    #[error("failed to launch backend '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The backend ran and exited unsuccessfully.
    #[error(
        "backend {mode} command failed ({}){}",
        status_text(.status),
        stderr_text(.stderr)
    )]
    CommandFailed {
        mode: BackendMode,
        /// Exit code, or `None` when the process was killed by a signal.
        status: Option<i32>,
        stderr: String,
        /// The diagnostic text points at a missing OS permission.
        permission_denied: bool,
    },

    /// The position report was not two comma-separated integers.
    #[error("backend position output {output:?} is not in '<x>,<y>' form")]
    MalformedOutput { output: String },
}

fn status_text(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

fn stderr_text(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\nstderr: {}", trimmed)
    }
}

/// Whether backend diagnostic text indicates an OS permission restriction.
///
/// This is a substring match against English messages, so a localized or
/// reworded backend will fall through to the generic failure hint.
pub fn is_permission_message(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("permission") || lower.contains("accessibility")
}

impl BackendError {
    /// Build a [`BackendError::CommandFailed`], classifying the stderr text.
    pub fn command_failed(
        mode: BackendMode,
        status: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        let stderr = stderr.into();
        Self::CommandFailed {
            mode,
            status,
            permission_denied: is_permission_message(&stderr),
            stderr,
        }
    }

    /// Actionable remediation for this failure.
    pub fn suggestion(&self) -> String {
        match self {
            BackendError::Unavailable { program } => format!(
                "Install cliclick (macOS: 'brew install cliclick'), or set AUTOCLICK_BACKEND / --backend to a compatible executable (looked for '{}')",
                program
            ),
            BackendError::SpawnFailed { program, .. } => format!(
                "Check that '{}' is executable. Try running it directly in your terminal first.",
                program
            ),
            BackendError::CommandFailed {
                permission_denied: true,
                ..
            } => "Grant Accessibility access to your terminal (System Settings > Privacy & Security > Accessibility), then restart it".to_string(),
            BackendError::CommandFailed { mode, .. } => format!(
                "Run the backend's {} command by hand to see its full output",
                mode
            ),
            BackendError::MalformedOutput { .. } => {
                "The backend must print the pointer position as '<x>,<y>'. Check that --backend points at a compatible tool".to_string()
            }
        }
    }
}
