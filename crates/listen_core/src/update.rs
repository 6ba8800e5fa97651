use std::path::Path;
use std::sync::Arc;

use crate::effect::{AudioResource, ChannelRequest, Effect};
use crate::import_export;
use crate::msg::{AudioSettings, Msg};
use crate::notice::Notice;
use crate::schema::{ParamSchema, BASE_URL_FIELD};
use crate::session::{ModeError, SessionMode};
use crate::state::{AppState, UrlDraft};
use crate::transcript::TranscriptUpdate;
use crate::url_codec;
use crate::value::ParamValue;
use crate::view_model::AudioSettingsView;

/// Pure update function: applies a message to state and returns any effects.
///
/// Every message is handled to completion, including re-encoding the URL,
/// before the caller dispatches the next one. Mode and URL changes are
/// reported as `ModeChanged`/`ConfigChanged` effects after the message's own
/// effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let url_before = state.request_url();
    let mode_before = state.session_mode();

    let mut effects = match msg {
        Msg::FieldEdited { name, value } => edit_field(&mut state, name, value),
        Msg::ExtraParamsEdited(text) => edit_extra_params(&mut state, &text),
        Msg::UrlEdited(text) => edit_url(&mut state, text),
        Msg::ImportSubmitted(raw) => import(&mut state, &raw),
        Msg::ResetClicked => {
            import_export::reset_to_defaults(&mut state.store);
            state.imported = false;
            state.url_draft = None;
            let mut effects = Vec::new();
            reapply_guard(&mut state, &mut effects);
            state.mark_dirty();
            effects
        }
        Msg::SimplifyClicked => {
            import_export::simplify(&mut state.store);
            state.imported = false;
            state.mark_dirty();
            Vec::new()
        }
        Msg::ExportClicked => vec![Effect::Exported(import_export::export_json(
            &state.store.snapshot(),
        ))],
        Msg::CopyUrlClicked => vec![Effect::CopyUrl(state.request_url())],
        Msg::LineWidthChanged(width) => {
            if state.line_width != width {
                state.line_width = width;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DefaultsLoaded(result) => defaults_loaded(&mut state, result),
        Msg::RecordToggled(true) => request_recording(&mut state),
        Msg::RecordToggled(false) => {
            let mut effects = Vec::new();
            stop_session(&mut state, &mut effects);
            effects
        }
        Msg::MicrophoneOpened => microphone_opened(&mut state),
        Msg::MicrophoneFailed(reason) => {
            let mut effects = Vec::new();
            state.microphone_pending = false;
            state.notify(
                &mut effects,
                Notice::error(format!("Microphone unavailable: {reason}")),
            );
            effects
        }
        Msg::StreamFileRequested { path } => start_file_stream(&mut state, path),
        Msg::StreamUploadCompleted(Ok(file_path)) => {
            if state.session_mode() == SessionMode::StreamingFile {
                vec![Effect::Send(ChannelRequest::StartFileStreaming {
                    file_path,
                    config: state.live_payload(),
                })]
            } else {
                Vec::new()
            }
        }
        Msg::StreamUploadCompleted(Err(reason)) => {
            fail_stream(&mut state, format!("File upload error: {reason}"))
        }
        Msg::UploadRequested { path } => start_batch_upload(&mut state, path),
        Msg::UploadCompleted(result) => batch_upload_completed(&mut state, result),
        Msg::DetectAudioSettingsClicked => {
            state.audio_settings = Some(AudioSettingsView::Detecting);
            state.mark_dirty();
            vec![Effect::Send(ChannelRequest::DetectAudioSettings)]
        }
        Msg::ClearTranscriptClicked => {
            state.feed.clear();
            state.mark_dirty();
            Vec::new()
        }
        Msg::TranscriptReceived(update) => {
            receive_transcript(&mut state, &update);
            Vec::new()
        }
        Msg::StreamStarted {
            file_path,
            duration,
        } => {
            let mut effects = Vec::new();
            let message = match duration {
                Some(seconds) => format!("Streaming started: {file_path} ({seconds:.1}s)"),
                None => format!("Streaming started: {file_path}"),
            };
            state.notify(&mut effects, Notice::info(message));
            effects
        }
        Msg::StreamError(reason) => fail_stream(&mut state, format!("Stream error: {reason}")),
        Msg::StreamFinished => {
            let mut effects = Vec::new();
            if state.session_mode() == SessionMode::StreamingFile {
                state.notify(&mut effects, Notice::info("File streaming finished"));
                stop_session(&mut state, &mut effects);
            }
            effects
        }
        Msg::AudioSettingsReceived(settings) => {
            apply_audio_settings(&mut state, &settings);
            Vec::new()
        }
        Msg::AudioSettingsFailed(reason) => {
            let mut effects = Vec::new();
            state.audio_settings = Some(AudioSettingsView::Failed(reason.clone()));
            state.notify(
                &mut effects,
                Notice::error(format!("Audio settings detection failed: {reason}")),
            );
            effects
        }
        Msg::RequestIdUpdated(request_id) => {
            state.request_id = Some(request_id);
            state.mark_dirty();
            Vec::new()
        }
        Msg::ChannelDisconnected(reason) => {
            let mut effects = Vec::new();
            if state.session_mode().is_live() || state.microphone_pending {
                state.notify(
                    &mut effects,
                    Notice::error(format!("Connection lost: {reason}")),
                );
                stop_session(&mut state, &mut effects);
            } else {
                state.notify(&mut effects, Notice::warning(format!("Disconnected: {reason}")));
            }
            effects
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    let mode_after = state.session_mode();
    if mode_after != mode_before {
        state.mark_dirty();
        effects.push(Effect::ModeChanged(mode_after));
    }
    let url_after = state.request_url();
    if url_after != url_before {
        state.mark_dirty();
        effects.push(Effect::ConfigChanged { url: url_after });
    }

    (state, effects)
}

fn reapply_guard(state: &mut AppState, effects: &mut Vec<Effect>) {
    if let Some(notice) = state.guard.reapply(&mut state.store) {
        state.notify(effects, notice);
    }
}

fn edit_field(state: &mut AppState, name: String, value: ParamValue) -> Vec<Effect> {
    let mut effects = Vec::new();
    if !state.guard.is_enabled(&name) {
        let notice = Notice::warning(format!(
            "{name} is not available in {} mode",
            state.guard.mode()
        ));
        state.notify(&mut effects, notice);
        return effects;
    }
    state.store.set(&name, value);
    state.url_draft = None;
    state.mark_dirty();
    effects
}

fn edit_extra_params(state: &mut AppState, text: &str) -> Vec<Effect> {
    let mut effects = Vec::new();
    match state.store.set_extra_json(text) {
        Ok(()) => {
            reapply_guard(state, &mut effects);
            state.url_draft = None;
            state.mark_dirty();
        }
        Err(err) => state.notify(&mut effects, Notice::error(err.to_string())),
    }
    effects
}

fn edit_url(state: &mut AppState, text: String) -> Vec<Effect> {
    let mut effects = Vec::new();
    match url_codec::decode(&text) {
        Ok(mut params) => {
            let has_host = params
                .get(BASE_URL_FIELD)
                .is_some_and(|value| !value.is_empty());
            if !has_host {
                let host = state.store.snapshot().base_url().to_string();
                params.insert(BASE_URL_FIELD, ParamValue::Text(host));
            }
            state.store.replace_from(params);
            state.url_draft = None;
            reapply_guard(state, &mut effects);
        }
        Err(err) => {
            state.url_draft = Some(UrlDraft {
                text,
                error: err.to_string(),
            });
        }
    }
    state.mark_dirty();
    effects
}

fn import(state: &mut AppState, raw: &str) -> Vec<Effect> {
    let mut effects = Vec::new();
    match import_export::import_from(&mut state.store, raw) {
        Ok(()) => {
            state.imported = true;
            state.url_draft = None;
            state.mark_dirty();
            reapply_guard(state, &mut effects);
            state.notify(&mut effects, Notice::info("Configuration imported"));
        }
        Err(err) => state.notify(&mut effects, Notice::error(err.to_string())),
    }
    effects
}

fn defaults_loaded(state: &mut AppState, result: Result<String, String>) -> Vec<Effect> {
    let mut effects = Vec::new();
    let schema = result.and_then(|text| {
        ParamSchema::from_defaults_json(&text).map_err(|err| err.to_string())
    });
    match schema {
        Ok(schema) => {
            let untouched = state.store.changed().is_empty() && !state.imported;
            state.store.install_schema(Arc::new(schema));
            if untouched {
                state.store.reset();
                reapply_guard(state, &mut effects);
            }
            state.mark_dirty();
        }
        Err(reason) => state.notify(
            &mut effects,
            Notice::warning(format!("Using built-in defaults: {reason}")),
        ),
    }
    effects
}

/// Rejects a start while another activity owns the session.
fn start_conflict(state: &AppState, requested: SessionMode) -> Option<Notice> {
    let active = state.session_mode();
    if active == requested {
        return Some(Notice::warning(
            ModeError::AlreadyActive(requested).to_string(),
        ));
    }
    if active.is_live() {
        return Some(Notice::warning(
            ModeError::Busy { requested, active }.to_string(),
        ));
    }
    if state.microphone_pending {
        return Some(Notice::warning(ModeError::Pending.to_string()));
    }
    if state.batch_upload.is_some() {
        return Some(Notice::warning(format!(
            "cannot start {requested} while an upload is in progress"
        )));
    }
    None
}

fn request_recording(state: &mut AppState) -> Vec<Effect> {
    let mut effects = Vec::new();
    if let Some(notice) = start_conflict(state, SessionMode::Recording) {
        state.notify(&mut effects, notice);
        return effects;
    }
    state.microphone_pending = true;
    state.mark_dirty();
    effects.push(Effect::OpenMicrophone);
    effects
}

fn microphone_opened(state: &mut AppState) -> Vec<Effect> {
    let mut effects = Vec::new();
    if !state.microphone_pending {
        // Stopped while the device was opening.
        effects.push(Effect::ReleaseAudio(vec![AudioResource::Microphone]));
        return effects;
    }
    state.microphone_pending = false;

    match state
        .session
        .start_recording(&mut state.guard, &mut state.store)
    {
        Ok(notice) => {
            state.resources.push(AudioResource::Microphone);
            if let Some(notice) = notice {
                state.notify(&mut effects, notice);
            }
            let url = state.request_url();
            state.feed.push_url_info(format!("Using URL: {url}"));
            effects.push(Effect::Send(ChannelRequest::StartTranscription {
                config: state.live_payload(),
            }));
        }
        Err(err) => {
            state.notify(&mut effects, Notice::warning(err.to_string()));
            effects.push(Effect::ReleaseAudio(vec![AudioResource::Microphone]));
        }
    }
    state.mark_dirty();
    effects
}

fn start_file_stream(state: &mut AppState, path: String) -> Vec<Effect> {
    let mut effects = Vec::new();
    if let Some(notice) = start_conflict(state, SessionMode::StreamingFile) {
        state.notify(&mut effects, notice);
        return effects;
    }

    match state
        .session
        .start_streaming_file(&mut state.guard, &mut state.store)
    {
        Ok(notice) => {
            state.resources.push(AudioResource::StreamFile(path.clone()));
            if let Some(notice) = notice {
                state.notify(&mut effects, notice);
            }
            let name = Path::new(&path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());
            let url = state.request_url();
            state
                .feed
                .push_url_info(format!("Streaming file: {name} | Using URL: {url}"));
            effects.push(Effect::UploadForStreaming {
                path,
                config: state.live_payload(),
            });
        }
        Err(err) => state.notify(&mut effects, Notice::warning(err.to_string())),
    }
    state.mark_dirty();
    effects
}

/// Tears down a file stream after a transport failure. Late failures for a
/// stream that already stopped are ignored.
fn fail_stream(state: &mut AppState, message: String) -> Vec<Effect> {
    let mut effects = Vec::new();
    if state.session_mode() == SessionMode::StreamingFile {
        state.notify(&mut effects, Notice::error(message));
        stop_session(state, &mut effects);
    }
    effects
}

/// The single stop path for user stops, errors and stream completion.
/// Safe to call repeatedly: a second call finds nothing to stop or release.
fn stop_session(state: &mut AppState, effects: &mut Vec<Effect>) {
    if state.microphone_pending {
        state.microphone_pending = false;
        state.mark_dirty();
    }
    match state.session.stop(&mut state.guard) {
        Some(SessionMode::Recording) => {
            effects.push(Effect::Send(ChannelRequest::StopTranscription));
        }
        Some(SessionMode::StreamingFile) => {
            effects.push(Effect::Send(ChannelRequest::StopStreamFile));
        }
        Some(SessionMode::Idle) | None => {}
    }
    if !state.resources.is_empty() {
        effects.push(Effect::ReleaseAudio(std::mem::take(&mut state.resources)));
        state.mark_dirty();
    }
}

fn start_batch_upload(state: &mut AppState, path: String) -> Vec<Effect> {
    let mut effects = Vec::new();
    let active = state.session_mode();
    if active.is_live() || state.microphone_pending {
        let notice = Notice::warning(format!("cannot upload while {active} is active"));
        state.notify(&mut effects, notice);
        return effects;
    }
    if state.batch_upload.is_some() {
        state.notify(
            &mut effects,
            Notice::warning("an upload is already in progress"),
        );
        return effects;
    }

    if let Some(notice) = state.guard.enter_batch(&mut state.store) {
        state.notify(&mut effects, notice);
    }
    state.batch_upload = Some(path.clone());
    state.mark_dirty();
    effects.push(Effect::UploadBatch {
        path,
        params: url_codec::query_params(&state.effective_config()),
    });
    effects
}

fn batch_upload_completed(
    state: &mut AppState,
    result: Result<Option<String>, String>,
) -> Vec<Effect> {
    let mut effects = Vec::new();
    if state.batch_upload.take().is_none() {
        return effects;
    }
    state.guard.enter_neutral();
    state.mark_dirty();
    match result {
        Ok(Some(transcript)) => state.feed.push_final_text(transcript),
        Ok(None) => state.notify(
            &mut effects,
            Notice::warning("Upload finished without a transcript"),
        ),
        Err(reason) => state.notify(&mut effects, Notice::error(format!("Upload error: {reason}"))),
    }
    effects
}

fn receive_transcript(state: &mut AppState, update: &TranscriptUpdate) {
    if update.text.is_empty() && !update.utterance_end {
        return;
    }
    state.feed.apply(update);
    state.mark_dirty();
}

fn apply_audio_settings(state: &mut AppState, settings: &AudioSettings) {
    if let Some(rate) = settings.sample_rate {
        let rounded = rate.round().max(0.0) as u64;
        state.store.set("sample_rate", ParamValue::from(rounded));
    }
    if let Some(dtype) = &settings.dtype {
        state
            .store
            .set("encoding", ParamValue::text(encoding_for_dtype(dtype)));
    }
    state.audio_settings = Some(AudioSettingsView::Ready(describe_audio_settings(settings)));
    state.mark_dirty();
}

/// Maps a sample dtype reported by the device layer to a request encoding.
fn encoding_for_dtype(dtype: &str) -> &'static str {
    if dtype.contains("float") {
        "LINEAR32F"
    } else if dtype.contains("int16") {
        "LINEAR16"
    } else if dtype.contains("int32") {
        "LINEAR32"
    } else {
        ""
    }
}

fn describe_audio_settings(settings: &AudioSettings) -> Vec<(String, String)> {
    const UNKNOWN: &str = "Unknown";
    vec![
        (
            "Device".to_string(),
            settings
                .device_name
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        (
            "Sample Rate".to_string(),
            settings
                .sample_rate
                .map(|rate| format!("{rate:.0} Hz"))
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        (
            "Encoding".to_string(),
            settings.dtype.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        (
            "Bit Depth".to_string(),
            settings
                .bit_depth
                .map(|bits| format!("{bits} bits"))
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        (
            "Bitrate".to_string(),
            settings
                .bitrate
                .map(|bitrate| format!("{:.1} kbps", bitrate / 1000.0))
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        (
            "Channels".to_string(),
            settings
                .max_input_channels
                .map(|channels| channels.to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ),
    ]
}
