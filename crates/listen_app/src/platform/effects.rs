use std::sync::Arc;

use listen_core::{
    AudioResource, AudioSettings, ChannelRequest, Effect, Msg, NoticeLevel, ParamMap, Timing,
    TranscriptUpdate,
};
use listen_engine::{
    AudioSource, ClientEvent, EngineEvent, EngineHandle, EngineSettings, ServerEvent,
    ToggleAction,
};
use listen_logging::{listen_debug, listen_info, listen_warn};
use serde_json::Value;

/// Turns core effects into engine commands and engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: EngineSettings, audio: Arc<dyn AudioSource>) -> Self {
        Self {
            engine: EngineHandle::new(settings, audio),
        }
    }

    pub fn load_defaults(&self) {
        self.engine.load_defaults();
    }

    /// Runs the effects and returns the lines to show the user.
    pub fn enqueue(&self, effects: Vec<Effect>) -> Vec<String> {
        let mut output = Vec::new();
        for effect in effects {
            match effect {
                Effect::ConfigChanged { url } => {
                    listen_debug!("ConfigChanged url_len={} url={}", url.len(), url);
                }
                Effect::ModeChanged(mode) => {
                    listen_info!("ModeChanged mode={}", mode);
                }
                Effect::Notify(notice) => {
                    let prefix = match notice.level {
                        NoticeLevel::Info => "info",
                        NoticeLevel::Warning => {
                            listen_warn!("{}", notice.message);
                            "warning"
                        }
                        NoticeLevel::Error => {
                            listen_warn!("{}", notice.message);
                            "error"
                        }
                    };
                    output.push(format!("[{prefix}] {}", notice.message));
                }
                Effect::OpenMicrophone => {
                    listen_info!("OpenMicrophone");
                    self.engine.open_microphone();
                }
                Effect::ReleaseAudio(resources) => {
                    for resource in resources {
                        match resource {
                            AudioResource::Microphone => self.engine.release_microphone(),
                            // The server stops reading once stop_stream_file is sent.
                            AudioResource::StreamFile(path) => {
                                listen_debug!("Released stream file {}", path);
                            }
                        }
                    }
                }
                Effect::Send(request) => {
                    let event = client_event(request);
                    listen_info!("Send event={}", event.name());
                    self.engine.send(event);
                }
                Effect::UploadBatch { path, params } => {
                    listen_info!("UploadBatch path={}", path);
                    self.engine.upload_batch(path, params_to_json(&params));
                }
                Effect::UploadForStreaming { path, config } => {
                    listen_info!("UploadForStreaming path={}", path);
                    self.engine.upload_for_streaming(path, params_to_json(&config));
                }
                Effect::CopyUrl(url) => output.push(url),
                Effect::Exported(json) => output.push(json),
            }
        }
        output
    }

    /// Next engine event as a core message, if one is waiting.
    pub fn poll(&self) -> Option<Msg> {
        self.engine.try_recv().map(map_event)
    }
}

pub fn params_to_json(params: &ParamMap) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_json()))
            .collect(),
    )
}

pub fn client_event(request: ChannelRequest) -> ClientEvent {
    match request {
        ChannelRequest::StartTranscription { config } => ClientEvent::ToggleTranscription {
            action: ToggleAction::Start,
            config: Some(params_to_json(&config)),
        },
        ChannelRequest::StopTranscription => ClientEvent::ToggleTranscription {
            action: ToggleAction::Stop,
            config: None,
        },
        ChannelRequest::StartFileStreaming { file_path, config } => {
            ClientEvent::StartFileStreaming {
                file_path,
                config: params_to_json(&config),
            }
        }
        ChannelRequest::StopStreamFile => ClientEvent::StopStreamFile,
        ChannelRequest::DetectAudioSettings => ClientEvent::DetectAudioSettings,
    }
}

pub fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::DefaultsLoaded(result) => {
            Msg::DefaultsLoaded(result.map_err(|err| err.to_string()))
        }
        EngineEvent::MicrophoneOpened => Msg::MicrophoneOpened,
        EngineEvent::MicrophoneFailed(err) => Msg::MicrophoneFailed(err.to_string()),
        EngineEvent::BatchUploadCompleted(result) => {
            Msg::UploadCompleted(result.map_err(|err| err.to_string()))
        }
        EngineEvent::StreamUploadCompleted(result) => {
            Msg::StreamUploadCompleted(result.map_err(|err| err.to_string()))
        }
        EngineEvent::ChannelDisconnected(reason) => Msg::ChannelDisconnected(reason),
        EngineEvent::Server(event) => map_server_event(event),
    }
}

fn map_server_event(event: ServerEvent) -> Msg {
    match event {
        ServerEvent::Transcript(transcript) => Msg::TranscriptReceived(TranscriptUpdate {
            text: transcript.text,
            is_final: transcript.is_final,
            speech_final: transcript.speech_final,
            utterance_end: transcript.utterance_end,
            timing: transcript.timing.map(|timing| Timing {
                start: timing.start,
                end: timing.end,
            }),
        }),
        ServerEvent::StreamStarted {
            file_path,
            duration,
        } => Msg::StreamStarted {
            file_path,
            duration,
        },
        ServerEvent::StreamError(reason) => Msg::StreamError(reason),
        ServerEvent::StreamFinished => Msg::StreamFinished,
        ServerEvent::AudioSettings(report) => Msg::AudioSettingsReceived(AudioSettings {
            device_name: report.device_name,
            sample_rate: report.sample_rate,
            dtype: report.dtype,
            bit_depth: report.bit_depth,
            bitrate: report.bitrate,
            max_input_channels: report.max_input_channels,
        }),
        ServerEvent::AudioSettingsFailed(reason) => Msg::AudioSettingsFailed(reason),
        ServerEvent::RequestId(request_id) => Msg::RequestIdUpdated(request_id),
    }
}
