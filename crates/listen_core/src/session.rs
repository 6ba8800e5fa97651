use std::fmt;

use crate::compat::CompatibilityGuard;
use crate::notice::Notice;
use crate::schema::INTERIM_RESULTS_FIELD;
use crate::store::{ConfigStore, Configuration};
use crate::value::ParamValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    #[default]
    Idle,
    Recording,
    StreamingFile,
}

impl SessionMode {
    pub fn is_live(self) -> bool {
        !matches!(self, SessionMode::Idle)
    }

    /// URL scheme of the display URL in this mode.
    pub fn scheme(self) -> &'static str {
        if self.is_live() {
            "ws"
        } else {
            "http"
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionMode::Idle => "idle",
            SessionMode::Recording => "recording",
            SessionMode::StreamingFile => "file streaming",
        };
        f.write_str(label)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ModeError {
    #[error("{0} is already active")]
    AlreadyActive(SessionMode),
    #[error("cannot start {requested} while {active} is active")]
    Busy {
        requested: SessionMode,
        active: SessionMode,
    },
    #[error("a microphone request is already pending")]
    Pending,
}

/// Tracks the live session mode and drives the compatibility guard on every
/// transition. `Recording` and `StreamingFile` exclude each other.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionModeController {
    mode: SessionMode,
}

impl SessionModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn start_recording(
        &mut self,
        guard: &mut CompatibilityGuard,
        store: &mut ConfigStore,
    ) -> Result<Option<Notice>, ModeError> {
        self.start(SessionMode::Recording, guard, store)
    }

    pub fn start_streaming_file(
        &mut self,
        guard: &mut CompatibilityGuard,
        store: &mut ConfigStore,
    ) -> Result<Option<Notice>, ModeError> {
        self.start(SessionMode::StreamingFile, guard, store)
    }

    /// Returns to idle. Yields the mode that was stopped, or `None` when
    /// already idle, so repeated stops are no-ops.
    pub fn stop(&mut self, guard: &mut CompatibilityGuard) -> Option<SessionMode> {
        if !self.mode.is_live() {
            return None;
        }
        let stopped = std::mem::replace(&mut self.mode, SessionMode::Idle);
        guard.enter_neutral();
        Some(stopped)
    }

    /// The configuration as seen by the backend in the current mode: live
    /// modes always request interim results, while the stored choice is kept
    /// for when the session ends.
    pub fn effective_config(&self, store: &ConfigStore) -> Configuration {
        let config = store.snapshot();
        if self.mode.is_live() {
            config.with_field(INTERIM_RESULTS_FIELD, ParamValue::Bool(true))
        } else {
            config
        }
    }

    fn start(
        &mut self,
        requested: SessionMode,
        guard: &mut CompatibilityGuard,
        store: &mut ConfigStore,
    ) -> Result<Option<Notice>, ModeError> {
        if self.mode == requested {
            return Err(ModeError::AlreadyActive(requested));
        }
        if self.mode.is_live() {
            return Err(ModeError::Busy {
                requested,
                active: self.mode,
            });
        }
        self.mode = requested;
        Ok(guard.enter_streaming(store))
    }
}
