use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "voyage-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_writes_json_report_to_file() {
    let exe = env!("CARGO_BIN_EXE_voyage-sim");
    let output_path = temp_path("json");
    let status = Command::new(exe)
        .args([
            "--mode",
            "both",
            "--seeds",
            "1337,PV-KRAKEN42",
            "--iterations",
            "3",
            "--difficulty",
            "hard",
            "--strategy",
            "cautious",
            "--initiative",
            "by-speed",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    assert_eq!(report["battles"].as_array().map(Vec::len), Some(6));
    assert_eq!(report["expeditions"].as_array().map(Vec::len), Some(6));
    assert_eq!(report["strategy"], "cautious");
    assert_eq!(report["seeds"][1], "PV-KRAKEN42");
}

#[test]
fn cli_runs_are_reproducible() {
    let exe = env!("CARGO_BIN_EXE_voyage-sim");
    let run = |label: &str| {
        let path = temp_path(label);
        let status = Command::new(exe)
            .args(["--mode", "battle", "--seeds", "42", "--iterations", "4", "--report", "csv", "--output"])
            .arg(&path)
            .status()
            .expect("run cli");
        assert!(status.success());
        std::fs::read_to_string(path).expect("read output")
    };
    let first = run("repro-a");
    let second = run("repro-b");
    assert_eq!(first, second);
    assert_eq!(first.lines().count(), 5);
}

#[test]
fn cli_rejects_bad_seed_tokens() {
    let exe = env!("CARGO_BIN_EXE_voyage-sim");
    let output = Command::new(exe)
        .args(["--seeds", "definitely-not-a-seed", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unrecognized seed token"));
}

#[test]
fn cli_console_report_prints_summary() {
    let exe = env!("CARGO_BIN_EXE_voyage-sim");
    let output = Command::new(exe)
        .args(["--seeds", "7", "--iterations", "2"])
        .env("NO_COLOR", "1")
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Age of Voyage Simulator"));
    assert!(stdout.contains("Simulation Summary"));
    assert!(stdout.contains("Total battles: 2"));
}

#[test]
fn cli_rejects_negative_seeds() {
    let exe = env!("CARGO_BIN_EXE_voyage-sim");
    let output = Command::new(exe)
        .args(["--seeds=-5", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Negative seed"));
}
