// Integration tests for configuration loading

use anyhow::Result;
use desk_recorder::config::CaptureBackendKind;
use desk_recorder::{BufferPolicy, Config, SessionConfig};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_missing_config_file_uses_defaults() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("does-not-exist");

    let cfg = Config::load(path.to_str().unwrap())?;

    assert_eq!(cfg.capture.framerate, 30);
    assert_eq!(cfg.capture.timeslice_ms, 1000);
    assert_eq!(cfg.recorder.buffer_policy, BufferPolicy::ResetOnStart);
    Ok(())
}

#[test]
fn test_partial_config_file_overrides_defaults() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("desk-recorder.toml");
    fs::write(
        &path,
        r#"
[recorder]
buffer_policy = "accumulate"

[capture]
backend = "replay"
replay_dir = "/srv/clips"
framerate = 60

[export]
filename_prefix = "capture"
"#,
    )?;

    let cfg = Config::load(path.to_str().unwrap())?;

    assert_eq!(cfg.recorder.buffer_policy, BufferPolicy::Accumulate);
    assert_eq!(cfg.recorder.mime_type, "video/webm; codecs=vp9");
    assert_eq!(cfg.capture.backend, CaptureBackendKind::Replay);
    assert_eq!(cfg.capture.replay_dir, Some(PathBuf::from("/srv/clips")));
    assert_eq!(cfg.capture.framerate, 60);
    assert_eq!(cfg.capture.ffmpeg_path, "ffmpeg");
    assert_eq!(cfg.export.filename_prefix, "capture");
    assert_eq!(cfg.export.extension, "webm");

    let session = SessionConfig::from_config(&cfg);
    assert_eq!(session.buffer_policy, BufferPolicy::Accumulate);
    assert_eq!(session.export.filename_prefix, "capture");
    assert!(session.session_id.starts_with("recording-"));
    Ok(())
}

#[test]
fn test_shipped_sample_config_parses() -> Result<()> {
    let cfg = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/desk-recorder"))?;

    assert_eq!(cfg.capture.backend, CaptureBackendKind::Ffmpeg);
    assert_eq!(cfg.capture.fragment_bytes, 65536);
    assert_eq!(cfg.export.button_label, "Save video");
    Ok(())
}

#[test]
fn test_invalid_value_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("bad.toml");
    fs::write(&path, "[recorder]\nbuffer_policy = \"sometimes\"\n")?;

    assert!(Config::load(path.to_str().unwrap()).is_err());
    Ok(())
}
