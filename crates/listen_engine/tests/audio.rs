use std::time::Duration;

use listen_engine::{AudioSource, DeviceError, FileAudioSource, NoAudioSource};

#[tokio::test]
async fn file_source_replays_in_fixed_chunks() {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    std::fs::write(file.path(), b"0123456789").expect("write audio");

    let source = FileAudioSource::new(file.path())
        .with_chunk_bytes(4)
        .with_interval(Duration::from_millis(1));
    let mut capture = source.open().await.expect("open");

    let mut chunks = Vec::new();
    while let Some(chunk) = capture.next_chunk().await.expect("read") {
        chunks.push(chunk.to_vec());
    }

    assert_eq!(
        chunks,
        vec![b"0123".to_vec(), b"4567".to_vec(), b"89".to_vec()]
    );
}

#[tokio::test]
async fn missing_device_is_unavailable() {
    let source = FileAudioSource::new("/nonexistent/microphone.raw");
    assert!(matches!(
        source.open().await.err(),
        Some(DeviceError::Unavailable(_))
    ));

    assert!(matches!(
        NoAudioSource.open().await.err(),
        Some(DeviceError::Unavailable(_))
    ));
}
