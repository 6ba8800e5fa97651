use crate::notice::Notice;
use crate::session::SessionMode;
use crate::value::ParamMap;

/// Audio handles held while a session runs; released on every stop path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioResource {
    Microphone,
    StreamFile(String),
}

/// Outgoing events on the bidirectional channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRequest {
    StartTranscription { config: ParamMap },
    StopTranscription,
    StartFileStreaming { file_path: String, config: ParamMap },
    StopStreamFile,
    DetectAudioSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// The single-line request URL changed.
    ConfigChanged { url: String },
    ModeChanged(SessionMode),
    Notify(Notice),
    OpenMicrophone,
    ReleaseAudio(Vec<AudioResource>),
    Send(ChannelRequest),
    UploadBatch { path: String, params: ParamMap },
    UploadForStreaming { path: String, config: ParamMap },
    CopyUrl(String),
    Exported(String),
}
