use std::collections::BTreeSet;
use std::fmt;

use crate::notice::Notice;
use crate::schema::{Applicability, Field};
use crate::store::ConfigStore;

/// Which family of fields is currently blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardMode {
    /// Everything enabled.
    #[default]
    Neutral,
    /// Batch-only fields cleared and disabled.
    Streaming,
    /// Streaming-only fields cleared and disabled.
    Batch,
}

impl fmt::Display for GuardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GuardMode::Neutral => "neutral",
            GuardMode::Streaming => "streaming",
            GuardMode::Batch => "batch",
        };
        f.write_str(label)
    }
}

/// Keeps mode-specific fields consistent with the active mode.
///
/// Entering a mode clears every field that is invalid in it before disabling
/// it, so a disabled field never holds a value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompatibilityGuard {
    mode: GuardMode,
    disabled: BTreeSet<&'static str>,
}

impl CompatibilityGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> GuardMode {
        self.mode
    }

    pub fn enter_streaming(&mut self, store: &mut ConfigStore) -> Option<Notice> {
        self.enter(GuardMode::Streaming, store)
    }

    pub fn enter_batch(&mut self, store: &mut ConfigStore) -> Option<Notice> {
        self.enter(GuardMode::Batch, store)
    }

    /// Re-enables every field. Values are left as they are.
    pub fn enter_neutral(&mut self) {
        self.mode = GuardMode::Neutral;
        self.disabled.clear();
    }

    /// Re-applies the current mode after a bulk change to the store
    /// (import, reset, URL edit).
    pub fn reapply(&mut self, store: &mut ConfigStore) -> Option<Notice> {
        match self.mode {
            GuardMode::Neutral => None,
            mode => self.enter(mode, store),
        }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.contains(name)
    }

    pub fn disabled(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.disabled.iter().copied()
    }

    pub fn tooltip(&self, field: &Field) -> String {
        if self.is_enabled(field.name) {
            field.description.to_string()
        } else {
            format!("Not available in {} mode", self.mode)
        }
    }

    fn enter(&mut self, mode: GuardMode, store: &mut ConfigStore) -> Option<Notice> {
        let blocked = match mode {
            GuardMode::Streaming => Applicability::BatchOnly,
            GuardMode::Batch => Applicability::StreamingOnly,
            GuardMode::Neutral => {
                self.enter_neutral();
                return None;
            }
        };

        self.mode = mode;
        self.disabled.clear();
        let names: Vec<&'static str> = store
            .schema()
            .all_fields()
            .iter()
            .filter(|field| field.applicability == blocked)
            .map(|field| field.name)
            .collect();

        let mut cleared = Vec::new();
        for name in names {
            if store.clear_field(name) {
                cleared.push(name);
            }
            self.disabled.insert(name);
        }

        if cleared.is_empty() {
            None
        } else {
            Some(Notice::warning(format!(
                "Cleared for {mode} mode: {}",
                cleared.join(", ")
            )))
        }
    }
}
