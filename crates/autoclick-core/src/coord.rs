//! Screen coordinates and the backend's position report format.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// A pointer position in screen units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Parse a position report of the form `"<x>,<y>"`.
///
/// Surrounding whitespace (including the trailing newline most backends
/// print) is ignored, as is whitespace around each number. Anything other
/// than exactly two integers separated by a single comma is rejected with
/// [`BackendError::MalformedOutput`] carrying the raw text.
pub fn parse_position(raw: &str) -> Result<Coordinate, BackendError> {
    let malformed = || BackendError::MalformedOutput {
        output: raw.to_string(),
    };

    let (x, y) = raw.trim().split_once(',').ok_or_else(malformed)?;
    let x = x.trim().parse::<i32>().map_err(|_| malformed())?;
    let y = y.trim().parse::<i32>().map_err(|_| malformed())?;

    Ok(Coordinate { x, y })
}
