use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use wrldgen_core::GeneratorConfig;

const DEMO: &str = "demos/harbor.wrld";

fn repo_dir() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
}

fn temp_path(name: &str, ext: &str) -> PathBuf {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("wrldgen_cli_{name}_{timestamp}.{ext}"))
}

fn wrldgen(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_wrldgen"))
        .args(args)
        .current_dir(repo_dir())
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("run wrldgen")
}

fn success_json(args: &[&str]) -> Value {
    let output = wrldgen(args);
    assert!(
        output.status.success(),
        "wrldgen {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn failure_stderr(args: &[&str]) -> String {
    let output = wrldgen(args);
    assert!(!output.status.success(), "wrldgen {args:?} should fail");
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn world_report_describes_demo_scene() {
    let report = success_json(&["world", DEMO]);

    assert_eq!(report["world_name"], "harbor");
    assert_eq!(report["layers"], 2);
    assert_eq!(report["standing_markers"], 15);

    let markers = report["markers"].as_array().unwrap();
    assert_eq!(markers.len(), 24);
    assert_eq!(markers[0]["name"], "GeneratedStructure_0_0_stack_0");
    assert_eq!(markers[0]["floored"], true);
    let standing = markers.iter().filter(|m| m["floored"] == false).count();
    assert_eq!(standing, 15);

    let summary = &report["terrain"]["summary"];
    assert_eq!(summary["width"], 4);
    assert_eq!(summary["depth"], 3);
    assert_eq!(summary["vertices"], 20);
    assert_eq!(summary["triangles"], 24);
    assert_eq!(summary["hash"].as_str().unwrap().len(), 64);
    assert!(report["terrain"].get("mesh").is_none());
}

#[test]
fn full_world_output_carries_buffers() {
    let out = temp_path("world_full", "json");
    let output = wrldgen(&["world", DEMO, "--full", "--output", out.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let report: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let mesh = &report["terrain"]["mesh"];
    assert_eq!(mesh["positions"].as_array().unwrap().len(), 20);
    assert_eq!(mesh["indices"].as_array().unwrap().len(), 72);
    assert_eq!(mesh["uvs"].as_array().unwrap().len(), 20);
    assert!(report["terrain"].get("summary").is_none());

    let _ = fs::remove_file(&out);
}

#[test]
fn metrics_records_are_appended() {
    let metrics = temp_path("metrics", "jsonl");
    let metrics_arg = metrics.to_str().unwrap();

    let first = success_json(&["world", DEMO, "--metrics", metrics_arg]);
    success_json(&["landscape", "--metrics", metrics_arg]);

    let contents = fs::read_to_string(&metrics).unwrap();
    let lines: Vec<Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);

    assert_eq!(lines[0]["kind"], "world");
    assert_eq!(lines[0]["source"], DEMO);
    assert_eq!(lines[0]["vertices"], 20);
    assert_eq!(lines[0]["triangles"], 24);
    assert_eq!(lines[0]["markers"], 24);
    assert_eq!(lines[0]["standing_markers"], 15);
    assert_eq!(lines[0]["hash"], first["terrain"]["summary"]["hash"]);

    assert_eq!(lines[1]["kind"], "landscape");
    assert_eq!(lines[1]["source"], "flat");
    assert_eq!(lines[1]["markers"], 0);

    let _ = fs::remove_file(&metrics);
}

#[test]
fn landscape_samples_world_layer() {
    let report = success_json(&["landscape", "--world", DEMO, "--layer", "1"]);

    assert_eq!(report["source"], format!("{DEMO}#1"));
    let summary = &report["summary"];
    assert_eq!(summary["vertices"], 51 * 51);
    assert_eq!(summary["triangles"], 50 * 50 * 2);
    // Every level of layer 1 is below 10, so no vertex sits at the floor.
    assert!(summary["bounds"]["min"][1].as_f64().unwrap() > 0.0);
    assert!(summary["bounds"]["max"][1].as_f64().unwrap() <= 12.0);

    let placement = &report["placement"];
    assert!((placement["position"][0].as_f64().unwrap() + 0.1).abs() < 1e-6);
}

#[test]
fn flat_landscape_has_zero_heights() {
    let report = success_json(&["landscape"]);
    assert_eq!(report["source"], "flat");
    assert_eq!(report["summary"]["bounds"]["min"][1], 0.0);
    assert_eq!(report["summary"]["bounds"]["max"][1], 0.0);
}

#[test]
fn inspect_prints_layer_table() {
    let output = wrldgen(&["inspect", DEMO]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].ends_with("4 x 3 grid, 2 layer(s)"));
    assert!(lines[1].starts_with("layer"));
    assert!(lines[2].starts_with("0 ") && lines[2].ends_with("9/12"));
    assert!(lines[3].starts_with("1 ") && lines[3].ends_with("6/12"));
}

#[test]
fn out_of_range_layer_exits_with_error() {
    let stderr = failure_stderr(&["landscape", "--world", DEMO, "--layer", "5"]);
    assert!(stderr.contains("layer 5 out of range"), "stderr: {stderr}");
}

#[test]
fn world_without_layers_exits_with_error_chain() {
    let path = temp_path("empty", "wrld");
    fs::write(&path, r#"{"gridXNum": "2", "gridYNum": "2", "stacks": []}"#).unwrap();

    let stderr = failure_stderr(&["world", path.to_str().unwrap()]);
    assert!(stderr.contains("Failed to generate world"), "stderr: {stderr}");
    assert!(stderr.contains("terrain needs layer 0"), "stderr: {stderr}");

    let stderr = failure_stderr(&["inspect", path.to_str().unwrap()]);
    assert!(stderr.contains("has no layers"), "stderr: {stderr}");

    let _ = fs::remove_file(&path);
}

#[test]
fn missing_world_file_exits_with_error() {
    let stderr = failure_stderr(&["world", "demos/does-not-exist.wrld"]);
    assert!(stderr.contains("Failed to read WRLD file"), "stderr: {stderr}");
}

#[test]
fn config_write_emits_loadable_defaults() {
    let path = temp_path("config", "toml");
    let output = wrldgen(&["config", "--write", path.to_str().unwrap()]);
    assert!(output.status.success());

    let written: GeneratorConfig = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, GeneratorConfig::default());

    let report = success_json(&["world", DEMO, "--config", path.to_str().unwrap()]);
    assert_eq!(report["layers"], 2);

    let _ = fs::remove_file(&path);
}

#[test]
fn explicit_invalid_config_is_rejected() {
    let path = temp_path("invalid", "toml");
    fs::write(&path, "[terrain]\nsteps = 0\n").unwrap();

    let stderr = failure_stderr(&["world", DEMO, "--config", path.to_str().unwrap()]);
    assert!(stderr.contains("Invalid config"), "stderr: {stderr}");

    let _ = fs::remove_file(&path);
}

#[test]
fn closed_stdout_does_not_panic() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_wrldgen"))
        .args(["landscape", "--full"])
        .current_dir(repo_dir())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn wrldgen");
    drop(child.stdout.take());

    let output = child.wait_with_output().expect("wait for wrldgen");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("panicked"), "stderr: {stderr}");
}
