//! Mailbox backends
//!
//! Two implementations of [`MailBackend`]: a deterministic in-memory
//! fixture and a live adapter over the local Maildir++ store. Callers pick
//! one through [`BackendKind`] and [`create_backend`].

mod fixture;
mod maildir;
mod traits;
pub mod walker;

use log::info;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{MailError, Result};

pub use fixture::{FixtureBackend, fixture_anchor};
pub use maildir::MaildirBackend;
pub use traits::MailBackend;

/// Backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Mock,
    Real,
}

impl BackendKind {
    pub const VALID: &'static str = "mock, real";

    /// The backend used when nothing is configured
    pub fn platform_default() -> Self {
        if cfg!(unix) { Self::Real } else { Self::Mock }
    }

    /// Parse an optional selector, falling back to the platform default
    pub fn resolve(selector: Option<&str>) -> Result<Self> {
        match selector.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.parse(),
            None => Ok(Self::platform_default()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Real => "real",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "real" => Ok(Self::Real),
            _ => Err(MailError::invalid_argument(format!(
                "Invalid backend '{}'. Valid options are: {}",
                s,
                Self::VALID
            ))),
        }
    }
}

/// Construct the backend for `kind`
///
/// The live adapter needs a Maildir root; without one it fails with
/// `InvalidArgument`.
pub fn create_backend(kind: BackendKind, maildir: Option<&Path>) -> Result<Box<dyn MailBackend>> {
    info!("Using {} backend", kind);
    match kind {
        BackendKind::Mock => Ok(Box::new(FixtureBackend::new())),
        BackendKind::Real => {
            let root = maildir.ok_or_else(|| {
                MailError::invalid_argument(
                    "No Maildir configured for the real backend (set DESKMAIL_MAILDIR)",
                )
            })?;
            Ok(Box::new(MaildirBackend::open(root)?))
        }
    }
}
