use std::sync::Once;

use listen_core::{
    decode, encode, query_pairs, request_url, to_plain, update, AppState, ConfigStore,
    DecodeError, Msg, ParamMap, ParamValue, SessionMode,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(listen_logging::initialize_for_tests);
}

fn store_with(entries: &[(&str, ParamValue)]) -> ConfigStore {
    let mut store = ConfigStore::default();
    for (name, value) in entries {
        store.set(name, value.clone());
    }
    store
}

#[test]
fn unset_fields_are_omitted_and_set_fields_follow_schema_order() {
    init_logging();
    let store = store_with(&[
        ("punctuate", ParamValue::Bool(true)),
        ("model", ParamValue::text("nova-3")),
        ("language", ParamValue::text("")),
        ("smart_format", ParamValue::Bool(false)),
        ("redact", ParamValue::List(Vec::new())),
    ]);

    let url = request_url(&store.snapshot(), SessionMode::Idle);

    assert_eq!(
        url,
        "http://api.deepgram.com/v1/listen?model=nova-3&punctuate=true"
    );
}

#[test]
fn streaming_example_url_forces_interim_results() {
    init_logging();
    let state = AppState::new();
    let (state, _) = update(
        state,
        Msg::FieldEdited {
            name: "model".to_string(),
            value: ParamValue::text("nova-3"),
        },
    );
    let (state, _) = update(
        state,
        Msg::FieldEdited {
            name: "punctuate".to_string(),
            value: ParamValue::Bool(true),
        },
    );
    let (state, _) = update(state, Msg::RecordToggled(true));
    let (state, _) = update(state, Msg::MicrophoneOpened);

    assert_eq!(state.session_mode(), SessionMode::Recording);
    assert_eq!(
        state.request_url(),
        "ws://api.deepgram.com/v1/listen?model=nova-3&punctuate=true&interim_results=true"
    );
}

#[test]
fn repeated_query_keys_decode_to_lists() {
    init_logging();
    let params = decode("http://api.deepgram.com/v1/listen?language=en&tags=a&tags=b")
        .expect("decodes");

    let mut expected = ParamMap::new();
    expected.insert("baseUrl", ParamValue::text("api.deepgram.com"));
    expected.insert("language", ParamValue::text("en"));
    expected.insert("tags", ParamValue::list(["a", "b"]));
    assert_eq!(params, expected);
}

#[test]
fn multi_select_values_encode_once_per_element() {
    init_logging();
    let store = store_with(&[("redact", ParamValue::list(["pci", "ssn"]))]);
    assert_eq!(
        request_url(&store.snapshot(), SessionMode::Idle),
        "http://api.deepgram.com/v1/listen?redact=pci&redact=ssn"
    );

    let mut decoded = ConfigStore::default();
    let params = decode("http://api.deepgram.com/v1/listen?redact=pci&redact=ssn").expect("decodes");
    decoded.replace_from(params);
    assert_eq!(
        decoded.get("redact"),
        Some(&ParamValue::list(["pci", "ssn"]))
    );
}

#[test]
fn extras_keep_list_order_and_skip_only_empty_text() {
    init_logging();
    let mut store = ConfigStore::default();
    store
        .set_extra_json(r#"{"tag": ["b", "a"], "mip_opt_out": false, "blank": ""}"#)
        .expect("valid blob");

    let pairs = query_pairs(&store.snapshot());

    assert_eq!(
        pairs,
        vec![
            ("tag".to_string(), "b".to_string()),
            ("tag".to_string(), "a".to_string()),
            ("mip_opt_out".to_string(), "false".to_string()),
        ]
    );
}

#[test]
fn websocket_and_path_shapes_normalize_to_http() {
    init_logging();
    let from_ws = decode("wss://example.com:8443/v1/listen?model=nova-3").expect("wss");
    assert_eq!(from_ws.get("baseUrl"), Some(&ParamValue::text("example.com:8443")));
    assert_eq!(from_ws.get("model"), Some(&ParamValue::text("nova-3")));

    let from_path = decode("/v1/listen?language=de").expect("path");
    assert_eq!(from_path.get("baseUrl"), Some(&ParamValue::text("api.deepgram.com")));
    assert_eq!(from_path.get("language"), Some(&ParamValue::text("de")));
}

#[test]
fn query_base_url_overrides_the_host() {
    init_logging();
    let params = decode("http://a.example.com/v1/listen?baseUrl=b.example.com").expect("decodes");
    assert_eq!(params.get("baseUrl"), Some(&ParamValue::text("b.example.com")));
}

#[test]
fn blank_keys_and_values_are_dropped() {
    init_logging();
    let params = decode("http://h.example.com/v1/listen?model=&=x&language=%20en%20").expect("decodes");
    assert_eq!(params.len(), 2);
    assert_eq!(params.get("language"), Some(&ParamValue::text("en")));
    assert!(!params.contains_key("model"));
}

#[test]
fn unrecognized_text_is_rejected_whole() {
    init_logging();
    assert_eq!(decode("model=nova-3"), Err(DecodeError::UnrecognizedShape));
    assert!(matches!(decode("{not json"), Err(DecodeError::InvalidJson(_))));
}

#[test]
fn wrapped_lines_respect_width_and_end_with_join_marker() {
    init_logging();
    let store = store_with(&[
        ("model", ParamValue::text("nova-3")),
        ("language", ParamValue::text("en")),
        ("punctuate", ParamValue::Bool(true)),
    ]);

    let wrapped = encode(&store.snapshot(), SessionMode::Idle, 40);

    assert_eq!(
        wrapped,
        "http://api.deepgram.com/v1/listen?model=nova-3&\nlanguage=en&punctuate=true"
    );
    assert_eq!(
        to_plain(&wrapped),
        request_url(&store.snapshot(), SessionMode::Idle)
    );
}

#[test]
fn oversized_pair_gets_its_own_line() {
    init_logging();
    let store = store_with(&[
        ("model", ParamValue::text("nova-3")),
        ("keyterm", ParamValue::list(["a-very-long-key-term-that-will-not-fit"])),
    ]);

    let wrapped = encode(&store.snapshot(), SessionMode::Idle, 30);
    let lines: Vec<&str> = wrapped.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with('&'));
    assert_eq!(lines[1], "keyterm=a-very-long-key-term-that-will-not-fit");
}

#[test]
fn encoded_url_decodes_back_to_the_same_url() {
    init_logging();
    let store = store_with(&[
        ("model", ParamValue::text("nova-3")),
        ("sample_rate", ParamValue::text("16000")),
        ("punctuate", ParamValue::Bool(true)),
        ("redact", ParamValue::list(["pci", "ssn"])),
        ("keyterm", ParamValue::list(["hello world"])),
        ("tag", ParamValue::text("a&b")),
    ]);
    let url = request_url(&store.snapshot(), SessionMode::Idle);

    let mut restored = ConfigStore::default();
    restored.replace_from(decode(&url).expect("decodes"));

    assert_eq!(request_url(&restored.snapshot(), SessionMode::Idle), url);
    assert_eq!(restored.get("punctuate"), Some(&ParamValue::Bool(true)));
    assert_eq!(restored.get("tag"), Some(&ParamValue::text("a&b")));
}

fn sorted_pairs(store: &ConfigStore) -> Vec<(String, String)> {
    let mut pairs = query_pairs(&store.snapshot());
    pairs.sort();
    pairs
}

#[test]
fn decoded_configurations_survive_a_second_round_trip() {
    init_logging();
    let inputs = [
        "http://api.deepgram.com/v1/listen?model=nova-3&redact=pci&redact=ssn&tag=a",
        "ws://localhost:8080/v1/listen?interim_results=true&keyterm=hello%20world",
        "/v1/listen?language=en&custom=1&custom=2",
        r#"{"model": " nova-3 ", "tag": ["", "a"], "punctuate": true}"#,
        r#"{"baseUrl": "api.example.com", "extra_list": ["x", "y"], "extra_num": 3, "extra_flag": false}"#,
        r#"{"nested": {"a": 1}, "keyterm": ["  ", "deepgram"], " padded ": "v"}"#,
    ];

    for input in inputs {
        let mut first = ConfigStore::default();
        first.replace_from(decode(input).expect("input decodes"));
        let url = request_url(&first.snapshot(), SessionMode::Idle);

        let mut second = ConfigStore::default();
        second.replace_from(decode(&url).expect("encoded url decodes"));

        assert_eq!(sorted_pairs(&second), sorted_pairs(&first), "input: {input}");
    }
}

#[test]
fn json_shape_is_read_like_a_query() {
    init_logging();
    let params = decode(r#"{" model ": " nova-3 ", "tag": ["", " a "]}"#).expect("decodes");

    assert_eq!(params.get("model"), Some(&ParamValue::text("nova-3")));
    assert_eq!(params.get("tag"), Some(&ParamValue::list(["a"])));
}
