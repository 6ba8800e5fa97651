//! JSON shapes exchanged with the transcription server.
//!
//! Channel frames are text envelopes `{"event": name, "data": payload}`;
//! microphone audio travels as binary frames and never passes through here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{
    AudioSettingsReport, FailureKind, SegmentTiming, ServerEvent, TranscriptEvent,
    TransportError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Start,
    Stop,
}

/// Requests the client sends over the event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    ToggleTranscription {
        action: ToggleAction,
        config: Option<Value>,
    },
    StartFileStreaming {
        file_path: String,
        config: Value,
    },
    StopStreamFile,
    DetectAudioSettings,
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::ToggleTranscription { .. } => "toggle_transcription",
            ClientEvent::StartFileStreaming { .. } => "start_file_streaming",
            ClientEvent::StopStreamFile => "stop_stream_file",
            ClientEvent::DetectAudioSettings => "detect_audio_settings",
        }
    }

    fn data(&self) -> Value {
        match self {
            ClientEvent::ToggleTranscription { action, config } => {
                let mut data = serde_json::json!({ "action": action });
                if let Some(config) = config {
                    data["config"] = config.clone();
                }
                data
            }
            ClientEvent::StartFileStreaming { file_path, config } => serde_json::json!({
                "file_path": file_path,
                "config": config,
            }),
            ClientEvent::StopStreamFile | ClientEvent::DetectAudioSettings => Value::Null,
        }
    }

    /// The text frame for this event.
    pub fn to_frame(&self) -> String {
        let envelope = Envelope {
            event: self.name().to_string(),
            data: self.data(),
        };
        serde_json::to_string(&envelope).unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct TranscriptionPayload {
    #[serde(default, alias = "transcript")]
    transcription: String,
    #[serde(default)]
    is_final: bool,
    #[serde(default)]
    speech_final: bool,
    #[serde(default)]
    utterance_end: bool,
    #[serde(default)]
    timing: Option<TimingPayload>,
}

#[derive(Debug, Deserialize)]
struct TimingPayload {
    start: f64,
    end: f64,
}

#[derive(Debug, Default, Deserialize)]
struct AudioSettingsPayload {
    device_name: Option<String>,
    sample_rate: Option<f64>,
    dtype: Option<String>,
    bit_depth: Option<u32>,
    bitrate: Option<f64>,
    max_input_channels: Option<u32>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamStartedPayload {
    #[serde(default)]
    file_path: String,
    duration: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RequestIdPayload {
    request_id: Option<String>,
}

/// Parses one text frame from the server. Unknown events yield `Ok(None)`.
pub fn parse_server_frame(text: &str) -> Result<Option<ServerEvent>, TransportError> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|err| TransportError::new(FailureKind::MalformedResponse, err.to_string()))?;
    let data = envelope.data;

    let event = match envelope.event.as_str() {
        "transcription_update" | "transcript" => {
            let payload: TranscriptionPayload = payload(data)?;
            ServerEvent::Transcript(TranscriptEvent {
                text: payload.transcription,
                is_final: payload.is_final,
                speech_final: payload.speech_final,
                utterance_end: payload.utterance_end,
                timing: payload.timing.map(|timing| SegmentTiming {
                    start: timing.start,
                    end: timing.end,
                }),
            })
        }
        "stream_started" => {
            let payload: StreamStartedPayload = optional_payload(data)?;
            ServerEvent::StreamStarted {
                file_path: payload.file_path,
                duration: payload.duration,
            }
        }
        "stream_error" => ServerEvent::StreamError(error_text(&data)),
        "stream_finished" => ServerEvent::StreamFinished,
        "audio_settings" => {
            let payload: AudioSettingsPayload = payload(data)?;
            match payload.error {
                Some(error) => ServerEvent::AudioSettingsFailed(error),
                None => ServerEvent::AudioSettings(AudioSettingsReport {
                    device_name: payload.device_name,
                    sample_rate: payload.sample_rate,
                    dtype: payload.dtype,
                    bit_depth: payload.bit_depth,
                    bitrate: payload.bitrate,
                    max_input_channels: payload.max_input_channels,
                }),
            }
        }
        "request_id_update" | "raw_response" => {
            let payload: RequestIdPayload = optional_payload(data)?;
            match payload.request_id {
                Some(request_id) => ServerEvent::RequestId(request_id),
                None => return Ok(None),
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(event))
}

fn payload<T: serde::de::DeserializeOwned>(data: Value) -> Result<T, TransportError> {
    serde_json::from_value(data)
        .map_err(|err| TransportError::new(FailureKind::MalformedResponse, err.to_string()))
}

fn optional_payload<T: serde::de::DeserializeOwned + Default>(
    data: Value,
) -> Result<T, TransportError> {
    if data.is_null() {
        Ok(T::default())
    } else {
        payload(data)
    }
}

/// Stream errors arrive as a bare string or as `{error}`/`{message}`.
fn error_text(data: &Value) -> String {
    match data {
        Value::String(text) => text.clone(),
        Value::Object(object) => object
            .get("error")
            .or_else(|| object.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| data.to_string()),
        Value::Null => "unknown stream error".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadRequest<'a> {
    pub file: FilePayload<'a>,
    pub config: &'a Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct FilePayload<'a> {
    pub name: &'a str,
    /// `data:{mime};base64,{bytes}`
    pub data: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub results: Option<BatchResults>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BatchResults {
    #[serde(default)]
    channels: Vec<ChannelResult>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Default, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

impl BatchResults {
    /// Transcript of the first channel's first alternative.
    pub fn first_transcript(&self) -> Option<&str> {
        self.channels
            .first()
            .and_then(|channel| channel.alternatives.first())
            .map(|alternative| alternative.transcript.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_error_accepts_both_shapes() {
        assert_eq!(error_text(&Value::String("boom".into())), "boom");
        assert_eq!(error_text(&serde_json::json!({"message": "bad file"})), "bad file");
        assert_eq!(error_text(&Value::Null), "unknown stream error");
    }

    #[test]
    fn first_transcript_of_empty_results_is_none() {
        let results: BatchResults = serde_json::from_str(r#"{"channels": []}"#).unwrap();
        assert_eq!(results.first_transcript(), None);
    }
}
