//! Listen core: parameter model, URL codec and the pure session state machine.
mod compat;
mod effect;
mod import_export;
mod msg;
mod notice;
mod schema;
mod session;
mod state;
mod store;
mod transcript;
mod update;
mod url_codec;
mod value;
mod view_model;

pub use compat::{CompatibilityGuard, GuardMode};
pub use effect::{AudioResource, ChannelRequest, Effect};
pub use import_export::{
    export_json, import_from, parse_import, reset_to_defaults, simplify, ImportError,
};
pub use msg::{AudioSettings, Msg};
pub use notice::{Notice, NoticeLevel};
pub use schema::{
    Applicability, Field, FieldKind, ParamSchema, Placement, SchemaError, BASE_URL_FIELD,
    DEFAULT_HOST, INTERIM_RESULTS_FIELD,
};
pub use session::{ModeError, SessionMode, SessionModeController};
pub use state::{AppState, UrlDraft, DEFAULT_LINE_WIDTH};
pub use store::{ConfigStore, Configuration, ExtraParamsError, EXTRA_PARAMS_KEY};
pub use transcript::{LineKind, Timing, TranscriptFeed, TranscriptLine, TranscriptUpdate};
pub use update::update;
pub use url_codec::{
    decode, encode, line_width_for, query_pairs, query_params, request_url, to_markup, to_plain,
    DecodeError, LISTEN_PATH, NO_WRAP,
};
pub use value::{ParamMap, ParamValue};
pub use view_model::{AppViewModel, AudioSettingsView, FieldView};
