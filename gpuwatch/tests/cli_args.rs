//! CLI arg parsing tests for gpuwatch
use assert_cmd::Command;

fn gpuwatch(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("gpuwatch").expect("gpuwatch binary");
    cmd.env("XDG_CONFIG_HOME", config_home);
    cmd
}

#[test]
fn test_help_mentions_short_and_long_flags() {
    let td = tempfile::tempdir().unwrap();
    let output = gpuwatch(td.path()).arg("--help").output().expect("run gpuwatch --help");
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    for flag in ["--tls-ca", "-t", "--profile", "-P", "--window", "--headless", "--retain-history"] {
        assert!(text.contains(flag), "help text missing {flag}\n{text}");
    }
}

#[test]
fn test_dry_run_prints_resolved_defaults() {
    let td = tempfile::tempdir().unwrap();
    let output = gpuwatch(td.path()).arg("--dry-run").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("endpoint: ws://127.0.0.1:8080/ws"), "{text}");
    assert!(text.contains("window: 60"), "{text}");
    assert!(text.contains("history: Reset"), "{text}");
}

#[test]
fn test_short_and_long_flags_accepted() {
    let td = tempfile::tempdir().unwrap();
    let output = gpuwatch(td.path())
        .args(["-w", "120", "--retries", "0", "--retain-history", "gpu-box:9000", "--dry-run"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("endpoint: ws://gpu-box:9000/ws"), "{text}");
    assert!(text.contains("window: 120"), "{text}");
    assert!(text.contains("retries: 0"), "{text}");
    assert!(text.contains("history: Retain"), "{text}");
}

#[test]
fn test_bad_endpoint_and_window_fail() {
    let td = tempfile::tempdir().unwrap();
    gpuwatch(td.path())
        .args(["http://gpu-box/ws", "--dry-run"])
        .assert()
        .failure();
    gpuwatch(td.path())
        .args(["--window", "0", "--dry-run"])
        .assert()
        .failure();
}
