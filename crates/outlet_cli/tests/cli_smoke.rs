use std::process::{Command, Output};

fn outlet_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_outlet_cli"))
        .args(args)
        .output()
        .expect("cli binary should start")
}

#[test]
fn default_script_prints_one_report_per_navigation() {
    let output = outlet_cli(&[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("navigate /").count(), 5);
    assert!(stdout.contains("\"kind\": \"attached\""));
}

#[test]
fn config_failure_before_logging_is_reported_on_stderr() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let missing = dir.path().join("absent.json");
    let log_dir = dir.path().join("logs");

    let output = outlet_cli(&[
        missing.to_str().expect("utf-8 path"),
        log_dir.to_str().expect("utf-8 path"),
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("outlet_cli: failed to read config"));
    assert!(!log_dir.exists(), "logging starts only after the config loads");
}

#[test]
fn relative_log_dir_fails_without_panicking() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let config = dir.path().join("router.json");
    std::fs::write(&config, r#"{"log_level":"info,reuse=debug"}"#).expect("config written");

    let output = outlet_cli(&[config.to_str().expect("utf-8 path"), "logs/relative"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not absolute"));
    assert!(!stderr.contains("panicked"));
}

#[test]
fn absolute_log_dir_starts_file_logging() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let log_dir = dir.path().join("logs");

    let config = dir.path().join("router.json");
    std::fs::write(&config, "{}").expect("config written");
    let output = outlet_cli(&[
        config.to_str().expect("utf-8 path"),
        log_dir.to_str().expect("utf-8 path"),
    ]);

    assert!(output.status.success());
    assert!(log_dir.is_dir());
}
