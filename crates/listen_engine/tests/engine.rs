use std::sync::Arc;
use std::time::{Duration, Instant};

use listen_engine::{
    DefaultsSource, DeviceError, EngineEvent, EngineHandle, EngineSettings, FailureKind,
    NoAudioSource,
};

fn wait_for_event(handle: &EngineHandle) -> EngineEvent {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Some(event) = handle.try_recv() {
            return event;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("engine produced no event");
}

#[test]
fn engine_loads_defaults_from_file() {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    std::fs::write(file.path(), r#"{"model": "nova-3"}"#).expect("write defaults");
    let settings = EngineSettings {
        defaults: Some(DefaultsSource::File(file.path().to_path_buf())),
        ..EngineSettings::default()
    };

    let handle = EngineHandle::new(settings, Arc::new(NoAudioSource));
    handle.load_defaults();

    assert_eq!(
        wait_for_event(&handle),
        EngineEvent::DefaultsLoaded(Ok(r#"{"model": "nova-3"}"#.to_string()))
    );
}

#[test]
fn engine_without_defaults_source_reports_failure() {
    let handle = EngineHandle::new(EngineSettings::default(), Arc::new(NoAudioSource));
    handle.load_defaults();

    match wait_for_event(&handle) {
        EngineEvent::DefaultsLoaded(Err(err)) => assert_eq!(err.kind, FailureKind::Io),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn engine_reports_microphone_failure() {
    let handle = EngineHandle::new(EngineSettings::default(), Arc::new(NoAudioSource));
    handle.open_microphone();

    assert!(matches!(
        wait_for_event(&handle),
        EngineEvent::MicrophoneFailed(DeviceError::Unavailable(_))
    ));
}

#[test]
fn engine_reports_missing_upload_file() {
    let handle = EngineHandle::new(EngineSettings::default(), Arc::new(NoAudioSource));
    handle.upload_batch("/nonexistent/clip.wav", serde_json::json!({}));

    match wait_for_event(&handle) {
        EngineEvent::BatchUploadCompleted(Err(err)) => assert_eq!(err.kind, FailureKind::Io),
        other => panic!("unexpected event {other:?}"),
    }
}
