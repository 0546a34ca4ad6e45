//! Subscriber setup installs a global default, so it gets its own test binary.

use dojang_progress::config::Config;
use dojang_progress::logging::init_tracing;

#[test]
fn test_file_logging_creates_log_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let log_dir = tmp.path().join("logs").join("progress");

    let config = Config {
        log_level: "dojang_progress=debug".to_string(),
        file_logs: true,
        log_dir: log_dir.to_string_lossy().into_owned(),
        utc_offset_minutes: 0,
    };

    let guard = init_tracing(&config);
    assert!(guard.is_some());
    assert!(log_dir.is_dir());

    tracing::info!(learner_id = "lee", "logging initialised");
    drop(guard);
}
