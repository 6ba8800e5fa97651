use crate::compat::GuardMode;
use crate::notice::Notice;
use crate::schema::FieldKind;
use crate::session::SessionMode;
use crate::transcript::TranscriptLine;
use crate::value::ParamValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub name: &'static str,
    pub kind: FieldKind,
    pub value: ParamValue,
    pub enabled: bool,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSettingsView {
    Detecting,
    Ready(Vec<(String, String)>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub mode: SessionMode,
    pub guard_mode: GuardMode,
    /// State of the record toggle, including a pending microphone request.
    pub record_control: bool,
    pub display_url: String,
    pub request_url: String,
    pub url_error: Option<String>,
    pub fields: Vec<FieldView>,
    pub extra_json: String,
    pub imported: bool,
    pub changed: Vec<String>,
    pub transcript_lines: Vec<TranscriptLine>,
    pub final_text: String,
    pub audio_settings: Option<AudioSettingsView>,
    pub request_id: Option<String>,
    pub notice: Option<Notice>,
    pub upload_in_flight: bool,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|field| field.name == name)
    }
}
