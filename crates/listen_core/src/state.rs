use std::sync::Arc;

use crate::compat::CompatibilityGuard;
use crate::effect::{AudioResource, Effect};
use crate::notice::Notice;
use crate::schema::ParamSchema;
use crate::session::{SessionMode, SessionModeController};
use crate::store::{ConfigStore, Configuration};
use crate::transcript::TranscriptFeed;
use crate::url_codec;
use crate::value::ParamMap;
use crate::view_model::{AppViewModel, AudioSettingsView, FieldView};

pub const DEFAULT_LINE_WIDTH: usize = 80;

/// URL text the user typed that did not decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlDraft {
    pub text: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub(crate) store: ConfigStore,
    pub(crate) guard: CompatibilityGuard,
    pub(crate) session: SessionModeController,
    pub(crate) feed: TranscriptFeed,
    pub(crate) imported: bool,
    pub(crate) line_width: usize,
    pub(crate) url_draft: Option<UrlDraft>,
    pub(crate) microphone_pending: bool,
    pub(crate) batch_upload: Option<String>,
    pub(crate) resources: Vec<AudioResource>,
    pub(crate) audio_settings: Option<AudioSettingsView>,
    pub(crate) request_id: Option<String>,
    pub(crate) last_notice: Option<Notice>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_schema(ParamSchema::builtin())
    }

    pub fn with_schema(schema: ParamSchema) -> Self {
        Self {
            store: ConfigStore::new(Arc::new(schema)),
            guard: CompatibilityGuard::new(),
            session: SessionModeController::new(),
            feed: TranscriptFeed::default(),
            imported: false,
            line_width: DEFAULT_LINE_WIDTH,
            url_draft: None,
            microphone_pending: false,
            batch_upload: None,
            resources: Vec::new(),
            audio_settings: None,
            request_id: None,
            last_notice: None,
            dirty: false,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn guard(&self) -> &CompatibilityGuard {
        &self.guard
    }

    pub fn session_mode(&self) -> SessionMode {
        self.session.mode()
    }

    pub fn effective_config(&self) -> Configuration {
        self.session.effective_config(&self.store)
    }

    /// Single-line request URL for the current configuration and mode.
    pub fn request_url(&self) -> String {
        url_codec::request_url(&self.effective_config(), self.session.mode())
    }

    /// Wrapped request URL for display.
    pub fn display_url(&self) -> String {
        url_codec::encode(
            &self.effective_config(),
            self.session.mode(),
            self.line_width,
        )
    }

    /// Configuration sent with live and streaming requests.
    pub fn live_payload(&self) -> ParamMap {
        self.effective_config().to_payload()
    }

    pub fn view(&self) -> AppViewModel {
        let config = self.effective_config();
        let fields = self
            .store
            .schema()
            .all_fields()
            .iter()
            .map(|field| FieldView {
                name: field.name,
                kind: field.kind,
                value: config
                    .get(field.name)
                    .unwrap_or_else(|| field.kind.empty_value()),
                enabled: self.guard.is_enabled(field.name),
                tooltip: self.guard.tooltip(field),
            })
            .collect();

        AppViewModel {
            mode: self.session.mode(),
            guard_mode: self.guard.mode(),
            record_control: self.session.mode().is_live() || self.microphone_pending,
            display_url: self.display_url(),
            request_url: self.request_url(),
            url_error: self.url_draft.as_ref().map(|draft| draft.error.clone()),
            fields,
            extra_json: self.store.extra_json(),
            imported: self.imported,
            changed: self.store.changed().iter().cloned().collect(),
            transcript_lines: self.feed.lines().to_vec(),
            final_text: self.feed.final_text(),
            audio_settings: self.audio_settings.clone(),
            request_id: self.request_id.clone(),
            notice: self.last_notice.clone(),
            upload_in_flight: self.batch_upload.is_some(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn notify(&mut self, effects: &mut Vec<Effect>, notice: Notice) {
        self.last_notice = Some(notice.clone());
        self.dirty = true;
        effects.push(Effect::Notify(notice));
    }
}
