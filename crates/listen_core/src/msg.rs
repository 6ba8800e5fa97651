use crate::transcript::TranscriptUpdate;
use crate::value::ParamValue;

/// Input device properties reported by the backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioSettings {
    pub device_name: Option<String>,
    pub sample_rate: Option<f64>,
    pub dtype: Option<String>,
    pub bit_depth: Option<u32>,
    pub bitrate: Option<f64>,
    pub max_input_channels: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited one configuration field.
    FieldEdited { name: String, value: ParamValue },
    /// User finished editing the extra-parameter JSON blob.
    ExtraParamsEdited(String),
    /// User edited the request URL text in place.
    UrlEdited(String),
    /// User submitted text in the import box.
    ImportSubmitted(String),
    ResetClicked,
    SimplifyClicked,
    ExportClicked,
    CopyUrlClicked,
    /// URL container resized; new character budget per line.
    LineWidthChanged(usize),
    /// Defaults resource fetched (document text) or failed.
    DefaultsLoaded(Result<String, String>),

    /// Record control toggled on or off.
    RecordToggled(bool),
    MicrophoneOpened,
    MicrophoneFailed(String),
    /// User chose a file to stream incrementally.
    StreamFileRequested { path: String },
    /// Upload for streaming finished with the server-side file path.
    StreamUploadCompleted(Result<String, String>),
    /// User chose a file for batch transcription.
    UploadRequested { path: String },
    /// Batch upload finished; `Ok(None)` means no transcript in the response.
    UploadCompleted(Result<Option<String>, String>),
    DetectAudioSettingsClicked,
    ClearTranscriptClicked,

    /// Backend: incremental transcript.
    TranscriptReceived(TranscriptUpdate),
    StreamStarted { file_path: String, duration: Option<f64> },
    StreamError(String),
    StreamFinished,
    AudioSettingsReceived(AudioSettings),
    AudioSettingsFailed(String),
    RequestIdUpdated(String),
    ChannelDisconnected(String),

    /// Render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
