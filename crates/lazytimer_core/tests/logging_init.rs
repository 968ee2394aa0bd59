use lazytimer_core::{init_logging, logging_status};
use log::LevelFilter;

#[test]
fn init_logging_is_idempotent_and_rejects_conflicts() {
    let log_dir = tempfile::tempdir().unwrap();
    let other_dir = tempfile::tempdir().unwrap();

    init_logging("info", log_dir.path()).expect("first init should succeed");
    init_logging("INFO", log_dir.path()).expect("same config should be idempotent");

    let level_error = init_logging("debug", log_dir.path()).unwrap_err();
    assert!(level_error.contains("refusing to switch"));

    let dir_error = init_logging("info", other_dir.path()).unwrap_err();
    assert!(dir_error.contains("refusing to switch"));

    let unknown_error = init_logging("loud", log_dir.path()).unwrap_err();
    assert!(unknown_error.contains("unsupported log level"));

    let relative_error = init_logging("info", std::path::Path::new("logs")).unwrap_err();
    assert!(relative_error.contains("absolute"));

    let (level, dir) = logging_status().expect("logging should be active");
    assert_eq!(level, LevelFilter::Info);
    assert_eq!(dir, log_dir.path());

    log::info!("event=test_line module=test status=ok");
    log::logger().flush();
    let has_log_file = std::fs::read_dir(log_dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .any(|entry| entry.file_name().to_string_lossy().starts_with("lazytimer"));
    assert!(has_log_file);
}
