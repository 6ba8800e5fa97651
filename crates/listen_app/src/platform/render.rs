//! Terminal rendering of the view model.
//!
//! [`Renderer::render`] prints only what changed since the previous view;
//! [`full`] prints the whole screen for the `show` command.

use listen_core::{AppViewModel, AudioSettingsView, FieldKind, LineKind, ParamValue, SessionMode};

#[derive(Debug, Default)]
pub struct Renderer {
    last: Option<AppViewModel>,
}

impl Renderer {
    pub fn render(&mut self, view: &AppViewModel) -> Vec<String> {
        let mut out = Vec::new();
        let previous = self.last.take();

        let mode_changed = previous.as_ref().map(|last| last.mode) != Some(view.mode);
        if mode_changed {
            out.push(format!("== {} ==", mode_label(view.mode)));
        }
        if previous.as_ref().map(|last| &last.display_url) != Some(&view.display_url) {
            out.push(view.display_url.clone());
        }
        if view.url_error.is_some()
            && previous.as_ref().map(|last| &last.url_error) != Some(&view.url_error)
        {
            if let Some(error) = &view.url_error {
                out.push(format!("[url] {error}"));
            }
        }
        if previous.as_ref().map(|last| last.upload_in_flight) != Some(view.upload_in_flight)
            && view.upload_in_flight
        {
            out.push("Uploading...".to_string());
        }
        if let Some(last) = &previous {
            if last.upload_in_flight && !view.upload_in_flight && last.final_text != view.final_text
            {
                out.push(format!("Transcript: {}", view.final_text));
            }
        }

        let seen = previous
            .as_ref()
            .map(|last| last.transcript_lines.len())
            .unwrap_or(0);
        if view.transcript_lines.len() < seen {
            out.push("(transcript cleared)".to_string());
            out.extend(view.transcript_lines.iter().map(|line| line_text(line.kind, &line.text)));
        } else {
            out.extend(
                view.transcript_lines[seen..]
                    .iter()
                    .map(|line| line_text(line.kind, &line.text)),
            );
        }

        if previous.as_ref().map(|last| &last.audio_settings) != Some(&view.audio_settings) {
            if let Some(settings) = &view.audio_settings {
                out.extend(audio_settings_lines(settings));
            }
        }
        if previous.as_ref().map(|last| &last.request_id) != Some(&view.request_id) {
            if let Some(request_id) = &view.request_id {
                out.push(format!("Request ID: {request_id}"));
            }
        }

        self.last = Some(view.clone());
        out
    }
}

/// Whole-screen dump of the view.
pub fn full(view: &AppViewModel) -> Vec<String> {
    let mut out = vec![
        format!(
            "Session: {} (fields locked for {} mode)",
            mode_label(view.mode),
            view.guard_mode
        ),
        view.display_url.clone(),
    ];
    if let Some(error) = &view.url_error {
        out.push(format!("[url] {error}"));
    }

    out.push(String::new());
    for field in &view.fields {
        let marker = if view.changed.iter().any(|name| name == field.name) {
            '*'
        } else {
            ' '
        };
        let value = format_value(field.kind, &field.value);
        if field.enabled {
            out.push(format!("{marker} {:<18} {value}", field.name));
        } else {
            out.push(format!("  {:<18} -- ({})", field.name, field.tooltip));
        }
    }
    out.push(format!("  {:<18} {}", "extra", view.extra_json.replace('\n', " ")));
    if view.imported {
        out.push("(imported configuration)".to_string());
    }

    if let Some(settings) = &view.audio_settings {
        out.push(String::new());
        out.extend(audio_settings_lines(settings));
    }
    if let Some(request_id) = &view.request_id {
        out.push(format!("Request ID: {request_id}"));
    }
    if !view.final_text.is_empty() {
        out.push(String::new());
        out.push(view.final_text.clone());
    }
    out
}

fn mode_label(mode: SessionMode) -> &'static str {
    match mode {
        SessionMode::Idle => "idle",
        SessionMode::Recording => "recording",
        SessionMode::StreamingFile => "streaming file",
    }
}

fn line_text(kind: LineKind, text: &str) -> String {
    match kind {
        LineKind::Interim => format!("  ~ {text}"),
        LineKind::UrlInfo => format!("  > {text}"),
        LineKind::Final | LineKind::UtteranceEnd => format!("  {text}"),
    }
}

fn format_value(kind: FieldKind, value: &ParamValue) -> String {
    match (kind, value) {
        (_, ParamValue::Text(text)) if text.is_empty() => "(unset)".to_string(),
        (FieldKind::MultiSelect, ParamValue::List(items)) if items.is_empty() => {
            "(none)".to_string()
        }
        (_, ParamValue::Text(text)) => text.clone(),
        (_, ParamValue::Number(number)) => number.to_string(),
        (_, ParamValue::Bool(flag)) => flag.to_string(),
        (_, ParamValue::List(items)) => items.join(", "),
    }
}

fn audio_settings_lines(settings: &AudioSettingsView) -> Vec<String> {
    match settings {
        AudioSettingsView::Detecting => vec!["Detecting audio settings...".to_string()],
        AudioSettingsView::Failed(reason) => vec![format!("Audio settings unavailable: {reason}")],
        AudioSettingsView::Ready(rows) => rows
            .iter()
            .map(|(label, value)| format!("{label:<12} {value}"))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listen_core::{update, AppState, Msg, TranscriptUpdate};
    use pretty_assertions::assert_eq;

    fn transcript(text: &str, is_final: bool) -> Msg {
        Msg::TranscriptReceived(TranscriptUpdate {
            text: text.to_string(),
            is_final,
            speech_final: false,
            utterance_end: false,
            timing: None,
        })
    }

    #[test]
    fn first_render_shows_mode_and_url() {
        let state = AppState::new();
        let mut renderer = Renderer::default();
        let view = state.view();
        let out = renderer.render(&view);
        assert_eq!(out[0], "== idle ==");
        assert_eq!(out[1], view.display_url);
        assert!(renderer.render(&view).is_empty());
    }

    #[test]
    fn only_new_transcript_lines_are_printed() {
        let mut renderer = Renderer::default();
        let state = AppState::new();
        renderer.render(&state.view());

        let (state, _) = update(state, transcript("hello", true));
        let first = renderer.render(&state.view());
        assert_eq!(first.len(), 1);
        assert!(first[0].contains("hello"));

        let (state, _) = update(state, transcript("world", true));
        let second = renderer.render(&state.view());
        assert_eq!(second.len(), 1);
        assert!(second[0].contains("world"));

        let (state, _) = update(state, Msg::ClearTranscriptClicked);
        assert_eq!(renderer.render(&state.view()), vec!["(transcript cleared)"]);
    }

    #[test]
    fn full_view_marks_changed_fields() {
        let state = AppState::new();
        let (state, _) = update(
            state,
            Msg::FieldEdited {
                name: "model".to_string(),
                value: ParamValue::text("nova-2"),
            },
        );
        let lines = full(&state.view());
        assert!(lines
            .iter()
            .any(|line| line.starts_with("* model") && line.ends_with("nova-2")));
        assert!(lines.iter().any(|line| line.trim_start().starts_with("extra")));
    }

    #[test]
    fn unset_values_are_labelled() {
        assert_eq!(format_value(FieldKind::Text, &ParamValue::text("")), "(unset)");
        assert_eq!(
            format_value(FieldKind::MultiSelect, &ParamValue::List(Vec::new())),
            "(none)"
        );
        assert_eq!(
            format_value(FieldKind::MultiSelect, &ParamValue::list(["pci", "ssn"])),
            "pci, ssn"
        );
    }
}
