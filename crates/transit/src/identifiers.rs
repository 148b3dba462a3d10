//! Station codes such as `BL12` or `R10`.
//!
//! The code is shared behind an `Arc<str>`: the directory, the selection set
//! and the marker registry all key on the same allocation.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Directory code of a station. Compared by its text, case-sensitively.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationIdentifier(Arc<str>);

impl StationIdentifier {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StationIdentifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StationIdentifier {
    fn from(code: String) -> Self {
        Self(code.into())
    }
}

impl From<&str> for StationIdentifier {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}
