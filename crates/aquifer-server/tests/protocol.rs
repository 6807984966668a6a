//! Protocol-level tests driving the router in-process.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use aquifer_core::{Config, ForwardModel};
use aquifer_server::{router, AppState};

const FORWARD_YAML: &str = r#"
meta:
  name: layprops
  params:
    - layers.conductivity
    - layers.storage
    - precipitation.avg_recharge
domain:
  lengths: [1000, 1000]
  ztop: 900
  divisions: [32, 32]
timestepping:
  n_periods: 8
  n_steps: 2
  period_length: 365
  steady: false
layers:
  material: [soil, saprolite, fractured bedrock]
  thickness: [40, 30, 120]
  conductivity: [8.64, 0.864, 0.00864]
  storage: [1.0e-1, 1.0e-3, 1.0e-4]
  laytype: [1, 0, 0]
precipitation:
  avg_recharge: 120
"#;

fn base_config() -> Config {
    serde_yaml::from_str(FORWARD_YAML).unwrap()
}

fn state_with_exe(exe: &std::path::Path, run_root: &std::path::Path) -> AppState {
    AppState::new(ForwardModel::new(exe, run_root), base_config())
}

async fn call(state: AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(v) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };
    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn dummy_state(tmp: &tempfile::TempDir) -> AppState {
    // introspection endpoints never touch the executable
    state_with_exe(&tmp.path().join("absent"), &tmp.path().join("runs"))
}

#[tokio::test]
async fn info_lists_the_forward_model() {
    let tmp = tempfile::tempdir().unwrap();
    let (status, body) = call(dummy_state(&tmp), "GET", "/Info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["protocolVersion"], json!(1.0));
    assert_eq!(body["models"], json!(["forward"]));
}

#[tokio::test]
async fn model_info_reports_capabilities() {
    let tmp = tempfile::tempdir().unwrap();
    let (status, body) = call(
        dummy_state(&tmp),
        "POST",
        "/ModelInfo",
        Some(json!({ "name": "forward" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["support"]["Evaluate"], json!(true));
    assert_eq!(body["support"]["Gradient"], json!(false));
}

#[tokio::test]
async fn input_sizes_follow_declared_parameters() {
    let tmp = tempfile::tempdir().unwrap();
    let (status, body) = call(
        dummy_state(&tmp),
        "POST",
        "/InputSizes",
        Some(json!({ "name": "forward" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inputSizes"], json!([3, 3, 1]));
}

#[tokio::test]
async fn output_sizes_are_always_one_scalar() {
    let tmp = tempfile::tempdir().unwrap();
    let (status, body) = call(
        dummy_state(&tmp),
        "POST",
        "/OutputSizes",
        Some(json!({ "name": "forward" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outputSizes"], json!([1]));
}

#[tokio::test]
async fn unknown_model_name_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let (status, body) = call(
        dummy_state(&tmp),
        "POST",
        "/InputSizes",
        Some(json!({ "name": "backward" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], json!("UnsupportedModel"));
}

#[tokio::test]
async fn inline_config_overrides_the_base() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = base_config();
    cfg.meta.params.truncate(1);
    let (status, body) = call(
        dummy_state(&tmp),
        "POST",
        "/InputSizes",
        Some(json!({ "name": "forward", "config": serde_json::to_value(&cfg).unwrap() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inputSizes"], json!([3]));
}

#[tokio::test]
async fn malformed_inline_config_is_a_configuration_error() {
    let tmp = tempfile::tempdir().unwrap();
    let (status, body) = call(
        dummy_state(&tmp),
        "POST",
        "/InputSizes",
        Some(json!({ "name": "forward", "config": { "domain": {} } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], json!("ConfigurationError"));
}

#[tokio::test]
async fn wrong_input_length_is_a_configuration_error() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("mf2005"), b"").unwrap();
    let state = state_with_exe(&tmp.path().join("mf2005"), &tmp.path().join("runs"));
    let (status, body) = call(
        state,
        "POST",
        "/Evaluate",
        Some(json!({ "name": "forward", "input": [[1.0, 2.0]] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], json!("ConfigurationError"));
}

#[cfg(unix)]
mod with_stub_simulator {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    fn stub_simulator(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("mf2005");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn head_record(totim: f32, fill: f32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(1i32.to_le_bytes());
        bytes.extend(1i32.to_le_bytes());
        bytes.extend(totim.to_le_bytes());
        bytes.extend(totim.to_le_bytes());
        bytes.extend(b"            HEAD");
        bytes.extend(2i32.to_le_bytes());
        bytes.extend(2i32.to_le_bytes());
        bytes.extend(1i32.to_le_bytes());
        for _ in 0..4 {
            bytes.extend(fill.to_le_bytes());
        }
        bytes
    }

    fn budget_header() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(1i32.to_le_bytes());
        bytes.extend(1i32.to_le_bytes());
        bytes.extend(b"        RECHARGE");
        bytes.extend(2i32.to_le_bytes());
        bytes.extend(2i32.to_le_bytes());
        bytes.extend((-1i32).to_le_bytes());
        bytes
    }

    #[tokio::test]
    async fn evaluate_returns_the_scalar() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("fixture.hds"), head_record(365.0, 5.0)).unwrap();
        std::fs::write(tmp.path().join("fixture.cbc"), budget_header()).unwrap();
        let exe = stub_simulator(
            tmp.path(),
            &format!(
                "base=$(basename \"$1\" .nam)\n\
                 cp {dir}/fixture.hds \"$base.hds\"\n\
                 cp {dir}/fixture.cbc \"$base.cbc\"\n\
                 echo ' Normal termination of simulation'",
                dir = tmp.path().display()
            ),
        );
        let state = state_with_exe(&exe, &tmp.path().join("runs"));

        let (status, body) = call(
            state,
            "POST",
            "/Evaluate",
            Some(json!({ "name": "forward" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        // one layer of 2x2 cells at 5.0
        assert_eq!(body["output"], json!([[20.0]]));
    }

    #[tokio::test]
    async fn simulator_failure_maps_to_the_wire_taxonomy() {
        let tmp = tempfile::tempdir().unwrap();
        let exe = stub_simulator(tmp.path(), "exit 1");
        let state = state_with_exe(&exe, &tmp.path().join("runs"));

        let (status, body) = call(
            state,
            "POST",
            "/Evaluate",
            Some(json!({ "name": "forward" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["type"], json!("SimulationFailure"));
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("layprops-"));
    }
}
