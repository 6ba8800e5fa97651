use std::sync::Once;

use listen_core::{update, AppState, Effect, Msg, Notice, NoticeLevel, ParamValue};
use pretty_assertions::assert_eq;

const IDLE_URL: &str = "http://api.deepgram.com/v1/listen?";
const DEFAULTS: &str = r#"{
    "base_url": "api.example.com",
    "model": "nova-3",
    "punctuate": true,
    "smart_format": false,
    "extra": {"tag": "demo"}
}"#;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(listen_logging::initialize_for_tests);
}

fn apply(state: AppState, messages: Vec<Msg>) -> (AppState, Vec<Effect>) {
    let mut state = state;
    let mut effects = Vec::new();
    for msg in messages {
        let (next, mut produced) = update(state, msg);
        state = next;
        effects.append(&mut produced);
    }
    (state, effects)
}

fn field(name: &str, value: ParamValue) -> Msg {
    Msg::FieldEdited {
        name: name.to_string(),
        value,
    }
}

#[test]
fn field_edit_re_encodes_the_url() {
    init_logging();
    let (mut state, effects) = update(AppState::new(), field("model", ParamValue::text("nova-3")));

    assert_eq!(
        effects,
        vec![Effect::ConfigChanged {
            url: "http://api.deepgram.com/v1/listen?model=nova-3".to_string(),
        }]
    );
    assert!(state.consume_dirty());
    assert_eq!(state.view().changed, vec!["model".to_string()]);
}

#[test]
fn failed_import_leaves_configuration_untouched() {
    init_logging();
    let (state, _) = update(AppState::new(), field("model", ParamValue::text("nova-3")));
    let before = state.request_url();

    let (state, effects) = update(state, Msg::ImportSubmitted("not a url".to_string()));
    assert_eq!(
        effects,
        vec![Effect::Notify(Notice::error(
            "Invalid configuration format. Please provide a valid JSON object or URL."
        ))]
    );
    assert_eq!(state.request_url(), before);

    let (state, effects) = update(state, Msg::ImportSubmitted("   ".to_string()));
    assert_eq!(
        effects,
        vec![Effect::Notify(Notice::error(
            "Please enter a configuration to import."
        ))]
    );
    assert_eq!(state.request_url(), before);
    assert!(!state.view().imported);
}

#[test]
fn json_import_replaces_everything() {
    init_logging();
    let (state, _) = update(AppState::new(), field("model", ParamValue::text("nova-3")));

    let (state, effects) = update(
        state,
        Msg::ImportSubmitted(r#"{"language": "en", "tags": ["a", "b"]}"#.to_string()),
    );

    let url = "http://api.deepgram.com/v1/listen?language=en&tags=a&tags=b";
    assert_eq!(
        effects,
        vec![
            Effect::Notify(Notice::info("Configuration imported")),
            Effect::ConfigChanged {
                url: url.to_string(),
            },
        ]
    );
    let view = state.view();
    assert!(view.imported);
    assert_eq!(
        view.changed,
        vec![
            "baseUrl".to_string(),
            "language".to_string(),
            "tags".to_string()
        ]
    );
}

#[test]
fn url_import_normalizes_websocket_scheme() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::ImportSubmitted(
            "wss://api.example.com/v1/listen?model=nova-2&punctuate=true".to_string(),
        ),
    );

    assert_eq!(
        state.request_url(),
        "http://api.example.com/v1/listen?model=nova-2&punctuate=true"
    );
}

#[test]
fn extra_params_blob_routes_schema_keys() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::ExtraParamsEdited(r#"{"tag": "x", "model": "nova-3"}"#.to_string()),
    );

    assert_eq!(
        effects,
        vec![Effect::ConfigChanged {
            url: "http://api.deepgram.com/v1/listen?model=nova-3&tag=x".to_string(),
        }]
    );
    let view = state.view();
    assert_eq!(view.extra_json, "{\n  \"tag\": \"x\"\n}");
    assert_eq!(view.changed, vec!["extra".to_string(), "model".to_string()]);
}

#[test]
fn malformed_extra_params_are_reported() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::ExtraParamsEdited(r#"{"tag": "x"}"#.to_string()),
    );
    let before = state.request_url();

    let (state, effects) = update(state, Msg::ExtraParamsEdited("{oops".to_string()));

    assert_eq!(effects.len(), 1);
    match &effects[0] {
        Effect::Notify(notice) => {
            assert_eq!(notice.level, NoticeLevel::Error);
            assert!(notice.message.starts_with("invalid JSON in extra params"));
        }
        other => panic!("unexpected effect {other:?}"),
    }
    assert_eq!(state.request_url(), before);
}

#[test]
fn edited_url_text_replaces_the_configuration() {
    init_logging();
    let (state, _) = update(AppState::new(), field("diarize", ParamValue::Bool(true)));

    let (state, _) = update(
        state,
        Msg::UrlEdited("http://api.deepgram.com/v1/listen?model=nova-3&\n  language=en".to_string()),
    );

    assert_eq!(
        state.request_url(),
        "http://api.deepgram.com/v1/listen?model=nova-3&language=en"
    );
    assert_eq!(state.view().url_error, None);
}

#[test]
fn undecodable_url_text_is_flagged_without_touching_config() {
    init_logging();
    let (state, _) = update(AppState::new(), field("model", ParamValue::text("nova-3")));
    let before = state.request_url();

    let (state, effects) = update(state, Msg::UrlEdited("garbage".to_string()));

    assert!(effects.is_empty());
    assert_eq!(state.request_url(), before);
    assert_eq!(
        state.view().url_error.as_deref(),
        Some("input is not a URL, a path, or a JSON object")
    );
}

#[test]
fn reset_and_simplify() {
    init_logging();
    let (state, _) = apply(
        AppState::new(),
        vec![
            field("model", ParamValue::text("nova-3")),
            field("punctuate", ParamValue::Bool(true)),
        ],
    );

    let (state, effects) = update(state, Msg::SimplifyClicked);
    assert!(effects.is_empty());
    assert!(state.view().changed.is_empty());
    assert_eq!(
        state.request_url(),
        "http://api.deepgram.com/v1/listen?model=nova-3&punctuate=true"
    );

    let (state, effects) = update(state, Msg::ResetClicked);
    assert_eq!(
        effects,
        vec![Effect::ConfigChanged {
            url: IDLE_URL.to_string(),
        }]
    );
    assert_eq!(state.request_url(), IDLE_URL);
}

#[test]
fn exported_json_imports_back() {
    init_logging();
    let (state, _) = apply(
        AppState::new(),
        vec![
            field("model", ParamValue::text("nova-3")),
            field("redact", ParamValue::list(["pci"])),
        ],
    );

    let (state, effects) = update(state, Msg::ExportClicked);
    let exported = match effects.as_slice() {
        [Effect::Exported(json)] => json.clone(),
        other => panic!("unexpected effects {other:?}"),
    };
    assert_eq!(
        exported,
        "{\n  \"baseUrl\": \"api.deepgram.com\",\n  \"model\": \"nova-3\",\n  \"redact\": [\n    \"pci\"\n  ]\n}"
    );

    let (restored, _) = update(AppState::new(), Msg::ImportSubmitted(exported));
    assert_eq!(restored.request_url(), state.request_url());
}

#[test]
fn copy_url_emits_the_single_line_url() {
    init_logging();
    let (state, _) = update(AppState::new(), field("model", ParamValue::text("nova-3")));

    let (_, effects) = update(state, Msg::CopyUrlClicked);

    assert_eq!(
        effects,
        vec![Effect::CopyUrl(
            "http://api.deepgram.com/v1/listen?model=nova-3".to_string()
        )]
    );
}

#[test]
fn loaded_defaults_apply_to_an_untouched_form() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::DefaultsLoaded(Ok(DEFAULTS.to_string())),
    );

    let url = "http://api.example.com/v1/listen?model=nova-3&punctuate=true&tag=demo";
    assert_eq!(
        effects,
        vec![Effect::ConfigChanged {
            url: url.to_string(),
        }]
    );
    assert!(state.view().changed.is_empty());
}

#[test]
fn loaded_defaults_keep_user_edits_until_reset() {
    init_logging();
    let (state, _) = update(AppState::new(), field("language", ParamValue::text("de")));

    let (state, _) = update(state, Msg::DefaultsLoaded(Ok(DEFAULTS.to_string())));
    assert_eq!(
        state.request_url(),
        "http://api.deepgram.com/v1/listen?language=de"
    );

    let (state, _) = update(state, Msg::ResetClicked);
    assert_eq!(
        state.request_url(),
        "http://api.example.com/v1/listen?model=nova-3&punctuate=true&tag=demo"
    );
}

#[test]
fn unavailable_defaults_fall_back_to_builtin() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::DefaultsLoaded(Err("connection refused".to_string())),
    );

    assert_eq!(
        effects,
        vec![Effect::Notify(Notice::warning(
            "Using built-in defaults: connection refused"
        ))]
    );
    assert_eq!(state.request_url(), IDLE_URL);
}

#[test]
fn wrapped_display_url_edits_back_to_the_same_configuration() {
    init_logging();
    let (state, _) = apply(
        AppState::new(),
        vec![
            field("model", ParamValue::text("nova-3")),
            field("language", ParamValue::text("en")),
            field("punctuate", ParamValue::Bool(true)),
            Msg::LineWidthChanged(40),
        ],
    );
    let view = state.view();
    assert_eq!(
        view.display_url,
        "http://api.deepgram.com/v1/listen?model=nova-3&\nlanguage=en&punctuate=true"
    );

    let (state, _) = update(state, Msg::UrlEdited(view.display_url.clone()));
    assert_eq!(state.request_url(), view.request_url);
}

#[test]
fn blank_host_falls_back_to_the_service_host() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::UrlEdited(r#"{"baseUrl": "", "model": "x"}"#.to_string()),
    );
    let url = state.request_url();
    assert_eq!(url, "http://api.deepgram.com/v1/listen?model=x");

    let (state, _) = update(state, Msg::UrlEdited(url.clone()));
    assert_eq!(state.request_url(), url);
    assert_eq!(state.view().url_error, None);

    let (state, _) = update(state, field("baseUrl", ParamValue::text("")));
    assert_eq!(state.request_url(), url);
}
