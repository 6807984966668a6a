//! Shared helpers: synthetic binary output fixtures and stub
//! simulator scripts.
#![cfg(unix)]
#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// One binary head record: header plus a uniform NCOL x NROW field.
pub fn head_record(totim: f32, ilay: i32, ncol: i32, nrow: i32, fill: f32) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend(1i32.to_le_bytes());
    bytes.extend(1i32.to_le_bytes());
    bytes.extend(totim.to_le_bytes());
    bytes.extend(totim.to_le_bytes());
    bytes.extend(b"            HEAD");
    bytes.extend(ncol.to_le_bytes());
    bytes.extend(nrow.to_le_bytes());
    bytes.extend(ilay.to_le_bytes());
    for _ in 0..(ncol * nrow) {
        bytes.extend(fill.to_le_bytes());
    }
    bytes
}

/// Minimal valid budget-file header.
pub fn budget_header() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend(1i32.to_le_bytes());
    bytes.extend(1i32.to_le_bytes());
    bytes.extend(b"        RECHARGE");
    bytes.extend(2i32.to_le_bytes());
    bytes.extend(2i32.to_le_bytes());
    bytes.extend((-1i32).to_le_bytes());
    bytes
}

/// Write fixture output artifacts and a stub simulator that copies
/// them into its working directory and reports normal termination.
///
/// The stub receives the name file as its argument, exactly like the
/// real executable.
pub fn stub_simulator_with_outputs(dir: &Path, heads: &[Vec<u8>]) -> PathBuf {
    let hds: Vec<u8> = heads.iter().flatten().copied().collect();
    let hds_fixture = dir.join("fixture.hds");
    let cbc_fixture = dir.join("fixture.cbc");
    std::fs::write(&hds_fixture, hds).unwrap();
    std::fs::write(&cbc_fixture, budget_header()).unwrap();

    stub_simulator(
        dir,
        &format!(
            "base=$(basename \"$1\" .nam)\n\
             cp {} \"$base.hds\"\n\
             cp {} \"$base.cbc\"\n\
             echo ' Normal termination of simulation'",
            hds_fixture.display(),
            cbc_fixture.display()
        ),
    )
}

/// Write an executable shell script standing in for the simulator.
pub fn stub_simulator(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("mf2005");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
