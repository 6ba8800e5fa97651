//! Listen engine: HTTP uploads, defaults loading, the server event channel and
//! audio capture, driven from a background runtime.
mod audio;
mod channel;
mod engine;
mod http;
mod types;
mod wire;

pub use audio::{
    AudioCapture, AudioSource, FileAudioSource, NoAudioSource, DEFAULT_CHUNK_BYTES,
    DEFAULT_CHUNK_INTERVAL,
};
pub use channel::{ChannelEventSink, EventChannel, EventSink};
pub use engine::EngineHandle;
pub use http::{
    load_defaults, AudioFile, DefaultsSource, EngineSettings, ReqwestUploader, Uploader,
    DEFAULT_SERVER_URL,
};
pub use types::{
    AudioSettingsReport, DeviceError, EngineEvent, FailureKind, SegmentTiming, ServerEvent,
    TranscriptEvent, TransportError,
};
pub use wire::{parse_server_frame, ClientEvent, ToggleAction};
