use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// The server answered with an `error` field.
    Server,
    MalformedResponse,
    ChannelClosed,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Server => write!(f, "server error"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::ChannelClosed => write!(f, "channel closed"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("microphone access denied: {0}")]
    PermissionDenied(String),
    #[error("no input device available: {0}")]
    Unavailable(String),
    #[error("failed to read audio: {0}")]
    Read(String),
}

/// Start and end of a segment in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentTiming {
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEvent {
    pub text: String,
    pub is_final: bool,
    pub speech_final: bool,
    pub utterance_end: bool,
    pub timing: Option<SegmentTiming>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioSettingsReport {
    pub device_name: Option<String>,
    pub sample_rate: Option<f64>,
    pub dtype: Option<String>,
    pub bit_depth: Option<u32>,
    pub bitrate: Option<f64>,
    pub max_input_channels: Option<u32>,
}

/// Events pushed by the server over the event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Transcript(TranscriptEvent),
    StreamStarted {
        file_path: String,
        duration: Option<f64>,
    },
    StreamError(String),
    StreamFinished,
    AudioSettings(AudioSettingsReport),
    AudioSettingsFailed(String),
    RequestId(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Text of the defaults document.
    DefaultsLoaded(Result<String, TransportError>),
    MicrophoneOpened,
    MicrophoneFailed(DeviceError),
    /// Transcript of the first channel and alternative, if any.
    BatchUploadCompleted(Result<Option<String>, TransportError>),
    /// Server-side path of the uploaded file.
    StreamUploadCompleted(Result<String, TransportError>),
    Server(ServerEvent),
    ChannelDisconnected(String),
}
