use std::fs;
use std::path::PathBuf;
use std::process::Command;

use activity_recognizer::storage::{DataLogRecord, DataLogSink, FileDataLog};
use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tracker_cli"))
}

fn temp_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "activity_recognizer_cli_{}_{}",
        std::process::id(),
        name
    ));
    let _ = fs::remove_file(&path);
    path
}

#[test]
fn classify_prints_one_line_per_batch() {
    let input = temp_path("samples.json");
    let samples: Vec<Value> = (0..80)
        .map(|_| serde_json::json!({ "x": 0, "y": 0, "z": 1000 }))
        .collect();
    fs::write(&input, serde_json::to_string(&samples).unwrap()).unwrap();

    let output = cli()
        .args(["classify", "--input"])
        .arg(&input)
        .output()
        .expect("classify command");
    assert!(output.status.success(), "exit {:?}", output.status.code());

    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    let lines: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 8);
    assert_eq!(lines[0]["status"], "collecting");
    assert_eq!(lines[7]["status"], "classified");
    assert_eq!(lines[7]["elapsed_secs"], 8);
    let _ = fs::remove_file(&input);
}

#[test]
fn classify_missing_input_fails() {
    let output = cli()
        .args(["classify", "--input", "/nonexistent/samples.json"])
        .output()
        .expect("classify command");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn decode_log_prints_records() {
    let path = temp_path("decode.bin");
    let mut log = FileDataLog::open(&path).unwrap();
    log.append(&DataLogRecord {
        walk_delta: 60,
        steps_delta: 95,
        timestamp: 1_710_032_460,
        ..DataLogRecord::default()
    })
    .unwrap();
    drop(log);

    let output = cli()
        .args(["decode-log", "--file"])
        .arg(&path)
        .output()
        .expect("decode-log command");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    let record: Value = serde_json::from_str(stdout.trim()).expect("json record");
    assert_eq!(record["walk_delta"], 60);
    assert_eq!(record["steps_delta"], 95);
    let _ = fs::remove_file(&path);
}

#[test]
fn simulate_then_dump_store() {
    let state = temp_path("sim_state.json");
    let data_log = temp_path("sim_datalog.bin");
    let config = temp_path("sim_config.json");
    fs::write(
        &config,
        serde_json::json!({
            "storage": { "state_path": state, "data_log_path": data_log }
        })
        .to_string(),
    )
    .unwrap();

    let output = cli()
        .arg("--config")
        .arg(&config)
        .args([
            "simulate",
            "--activity",
            "walk",
            "--minutes",
            "2",
            "--start",
            "1710032400",
        ])
        .output()
        .expect("simulate command");
    assert!(output.status.success(), "exit {:?}", output.status.code());

    let summary: Value = serde_json::from_slice(&output.stdout).expect("summary json");
    assert_eq!(summary["pattern"], "walk");
    assert_eq!(summary["dropped_batches"], 0);
    assert!(summary["counter"]["steps"].as_u64().unwrap() > 0);

    let output = cli()
        .args(["dump-store", "--store"])
        .arg(&state)
        .output()
        .expect("dump-store command");
    assert!(output.status.success());
    let dump: Value = serde_json::from_slice(&output.stdout).expect("dump json");
    assert_eq!(dump["counter"], summary["counter"]);
    assert_eq!(dump["settings"]["sensitivity"], 20);

    for path in [&state, &data_log, &config] {
        let _ = fs::remove_file(path);
    }
}
