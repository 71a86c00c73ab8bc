use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "kinfolk-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_kinfolk-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    for name in ["smoke", "lifetime", "persistence", "determinism", "activity-sweep"] {
        assert!(content.contains(name), "{name} missing from listing");
    }
}

#[test]
fn cli_runs_smoke_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_kinfolk-tester");
    let output_path = temp_path("run");
    let save_dir = temp_path("saves");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "smoke,determinism",
            "--iterations",
            "1",
            "--days",
            "20",
            "--seeds",
            "1,0x2",
            "--save-dir",
        ])
        .arg(&save_dir)
        .arg("--output")
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Kinfolk Automated Tester"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let runs = report.as_array().expect("array of results");
    assert_eq!(runs.len(), 4);
    assert!(runs.iter().all(|run| run["passed"] == true));
}

#[test]
fn cli_rejects_bad_seeds() {
    let exe = env!("CARGO_BIN_EXE_kinfolk-tester");
    let output = Command::new(exe)
        .args(["--seeds", "not-a-seed", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not-a-seed"));
}
