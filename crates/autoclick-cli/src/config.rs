//! Backend program resolution.
//!
//! Priority:
//! 1. `--backend` on the command line
//! 2. `AUTOCLICK_BACKEND` (ignores empty string)
//! 3. `cliclick`

use std::env;

/// Backend used when nothing else is configured.
pub const DEFAULT_BACKEND: &str = "cliclick";

/// Environment variable naming the backend executable.
pub const BACKEND_ENV: &str = "AUTOCLICK_BACKEND";

/// Resolve the backend program with priority fallback.
pub fn backend_program(cli_override: Option<&str>) -> String {
    if let Some(program) = cli_override {
        if !program.is_empty() {
            return program.to_string();
        }
    }

    if let Ok(program) = env::var(BACKEND_ENV) {
        if !program.is_empty() {
            return program;
        }
    }

    DEFAULT_BACKEND.to_string()
}
