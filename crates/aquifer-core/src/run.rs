//! Execution orchestration.
//!
//! Runs one or more simulator instances concurrently: one task per
//! instance, all started before any is awaited, then a full join
//! barrier before anything is returned to the caller. There is no
//! retry and no partial success; the first abnormal instance fails
//! the whole call. A hung simulator blocks the call indefinitely
//! (no timeout is provided at this layer).

use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tokio::task::JoinSet;

use crate::error::ModelError;
use crate::instance::ModelInstance;

/// Marker the simulator prints on a clean run. A zero exit status
/// alone is not trusted.
const NORMAL_TERMINATION: &str = "normal termination";

/// Diagnostics are capped to keep failure payloads bounded.
const MAX_DIAGNOSTIC: usize = 4096;

/// Run every instance to completion and fail if any terminated
/// abnormally.
///
/// Fan-out: one task per instance, all spawned up front. Fan-in: the
/// join barrier drains every task before this function returns, so no
/// outcome is observed by the caller while any instance is still
/// running. Completion order across instances is unspecified.
pub async fn run_instances(instances: &[ModelInstance]) -> Result<(), ModelError> {
    let mut tasks = JoinSet::new();
    for instance in instances.iter().cloned() {
        tasks.spawn(async move {
            let name = instance.name.clone();
            (name, run_one(&instance).await)
        });
    }

    let started = Instant::now();
    let count = instances.len();
    let mut failure: Option<ModelError> = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((name, Err(err))) => {
                tracing::warn!(instance = %name, error = %err, "instance failed");
                if failure.is_none() {
                    failure = Some(err);
                }
            }
            Err(join_err) => {
                // a panicked worker must not be swallowed
                if failure.is_none() {
                    failure = Some(ModelError::Simulation {
                        name: "<unknown>".into(),
                        diagnostic: format!("worker task failed: {join_err}"),
                    });
                }
            }
        }
    }

    tracing::info!(
        count,
        elapsed_ms = started.elapsed().as_millis() as u64,
        ok = failure.is_none(),
        "ensemble simulation finished"
    );
    match failure {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

async fn run_one(instance: &ModelInstance) -> Result<(), ModelError> {
    tracing::debug!(instance = %instance.name, exe = %instance.exe.display(), "starting simulator");
    let output = Command::new(&instance.exe)
        .arg(instance.artifact("nam"))
        .current_dir(&instance.workspace)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    let normal = output.status.success() && text.to_lowercase().contains(NORMAL_TERMINATION);
    if normal {
        return Ok(());
    }

    Err(ModelError::Simulation {
        name: instance.name.clone(),
        diagnostic: diagnostic(&output.status, &text),
    })
}

/// Condense process output into a bounded diagnostic: exit status plus
/// the tail of the combined stdout/stderr.
fn diagnostic(status: &std::process::ExitStatus, text: &str) -> String {
    let mut start = text.len().saturating_sub(MAX_DIAGNOSTIC);
    while start < text.len() && !text.is_char_boundary(start) {
        start += 1;
    }
    let tail = text[start..].trim();
    if tail.is_empty() {
        format!("{status}, no output")
    } else {
        format!("{status}: {tail}")
    }
}
