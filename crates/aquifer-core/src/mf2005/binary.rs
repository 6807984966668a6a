//! Readers for MODFLOW-2005 binary output artifacts.
//!
//! The head file (`.hds`) is a little-endian stream of per-layer
//! records: KSTP, KPER (i32), PERTIM, TOTIM (f32), a 16-character
//! text label, NCOL, NROW, ILAY (i32), followed by NCOL x NROW f32
//! head values. The cell-by-cell budget file (`.cbc`) shares the
//! record-header shape; this model only validates that it is present
//! and well-formed at the header level.
//!
//! Truncated or malformed artifacts are a hard [`OutputCorrupt`]
//! failure; a simulator that claims success but leaves garbage behind
//! must not produce a scalar.
//!
//! [`OutputCorrupt`]: crate::error::ModelError::OutputCorrupt

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::ModelError;

/// Upper bound on a plausible grid axis, to reject garbage headers.
const MAX_AXIS: i32 = 1_000_000;

/// One saved head field for a single layer at a single time.
#[derive(Debug, Clone)]
pub struct HeadRecord {
    pub kstp: i32,
    pub kper: i32,
    pub pertim: f32,
    pub totim: f32,
    pub ncol: usize,
    pub nrow: usize,
    pub ilay: i32,
    /// Row-major NCOL x NROW head values.
    pub data: Vec<f32>,
}

/// Parsed binary head file.
#[derive(Debug)]
pub struct HeadFile {
    path: String,
    records: Vec<HeadRecord>,
}

impl HeadFile {
    /// Open and fully parse a head file.
    pub fn open(path: &Path) -> Result<Self, ModelError> {
        let display = path.display().to_string();
        let file = File::open(path).map_err(|e| ModelError::OutputCorrupt {
            path: display.clone(),
            reason: format!("cannot open: {e}"),
        })?;
        let mut reader = BufReader::new(file);

        let mut records = Vec::new();
        loop {
            match read_record(&mut reader, &display)? {
                Some(record) => records.push(record),
                None => break,
            }
        }
        if records.is_empty() {
            return Err(ModelError::OutputCorrupt {
                path: display,
                reason: "no head records present".into(),
            });
        }
        Ok(Self {
            path: display,
            records,
        })
    }

    /// Simulated times with saved output, in file order, deduplicated.
    pub fn times(&self) -> Vec<f32> {
        let mut times = Vec::new();
        for record in &self.records {
            if times.last() != Some(&record.totim) {
                times.push(record.totim);
            }
        }
        times
    }

    /// All layer records saved at the given time.
    pub fn records_at(&self, totim: f32) -> Vec<&HeadRecord> {
        self.records
            .iter()
            .filter(|r| r.totim == totim)
            .collect()
    }

    /// Sum of the head field over every layer at the given time.
    pub fn sum_at(&self, totim: f32) -> Result<f64, ModelError> {
        let records = self.records_at(totim);
        if records.is_empty() {
            return Err(ModelError::OutputCorrupt {
                path: self.path.clone(),
                reason: format!("no head records at time {totim}"),
            });
        }
        Ok(records
            .iter()
            .flat_map(|r| r.data.iter())
            .map(|&v| f64::from(v))
            .sum())
    }
}

/// Cell-by-cell budget file, validated at the header level.
#[derive(Debug)]
pub struct BudgetFile {
    pub kstp: i32,
    pub kper: i32,
    pub label: String,
}

impl BudgetFile {
    /// Open a budget file and validate its first record header.
    pub fn open(path: &Path) -> Result<Self, ModelError> {
        let display = path.display().to_string();
        let file = File::open(path).map_err(|e| ModelError::OutputCorrupt {
            path: display.clone(),
            reason: format!("cannot open: {e}"),
        })?;
        let mut reader = BufReader::new(file);

        let kstp = read_i32(&mut reader, &display)?;
        let kper = read_i32(&mut reader, &display)?;
        let label = read_label(&mut reader, &display)?;
        let ncol = read_i32(&mut reader, &display)?;
        let nrow = read_i32(&mut reader, &display)?;
        // NLAY is negative for compact budgets
        let nlay = read_i32(&mut reader, &display)?;
        if kstp < 1 || kper < 1 || !axis_ok(ncol) || !axis_ok(nrow) || nlay == 0 {
            return Err(ModelError::OutputCorrupt {
                path: display,
                reason: format!(
                    "implausible budget header (kstp={kstp}, kper={kper}, \
                     ncol={ncol}, nrow={nrow}, nlay={nlay})"
                ),
            });
        }
        Ok(Self { kstp, kper, label })
    }
}

fn axis_ok(v: i32) -> bool {
    (1..=MAX_AXIS).contains(&v)
}

fn read_record(
    reader: &mut impl Read,
    path: &str,
) -> Result<Option<HeadRecord>, ModelError> {
    // EOF at a record boundary ends the file cleanly
    let kstp = match read_i32_or_eof(reader, path)? {
        Some(v) => v,
        None => return Ok(None),
    };
    let kper = read_i32(reader, path)?;
    let pertim = read_f32(reader, path)?;
    let totim = read_f32(reader, path)?;
    let label = read_label(reader, path)?;
    let ncol = read_i32(reader, path)?;
    let nrow = read_i32(reader, path)?;
    let ilay = read_i32(reader, path)?;

    if !label.contains("HEAD") {
        return Err(ModelError::OutputCorrupt {
            path: path.to_string(),
            reason: format!("unexpected record label {label:?}"),
        });
    }
    if !axis_ok(ncol) || !axis_ok(nrow) || ilay < 1 {
        return Err(ModelError::OutputCorrupt {
            path: path.to_string(),
            reason: format!("implausible head header (ncol={ncol}, nrow={nrow}, ilay={ilay})"),
        });
    }

    let count = ncol as usize * nrow as usize;
    let mut data = Vec::with_capacity(count);
    for _ in 0..count {
        data.push(read_f32(reader, path)?);
    }
    Ok(Some(HeadRecord {
        kstp,
        kper,
        pertim,
        totim,
        ncol: ncol as usize,
        nrow: nrow as usize,
        ilay,
        data,
    }))
}

fn truncated(path: &str) -> ModelError {
    ModelError::OutputCorrupt {
        path: path.to_string(),
        reason: "truncated record".into(),
    }
}

fn read_i32_or_eof(reader: &mut impl Read, path: &str) -> Result<Option<i32>, ModelError> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader
            .read(&mut buf[filled..])
            .map_err(|e| ModelError::OutputCorrupt {
                path: path.to_string(),
                reason: format!("read failed: {e}"),
            })?;
        if n == 0 {
            return if filled == 0 {
                Ok(None)
            } else {
                Err(truncated(path))
            };
        }
        filled += n;
    }
    Ok(Some(i32::from_le_bytes(buf)))
}

fn read_i32(reader: &mut impl Read, path: &str) -> Result<i32, ModelError> {
    read_i32_or_eof(reader, path)?.ok_or_else(|| truncated(path))
}

fn read_f32(reader: &mut impl Read, path: &str) -> Result<f32, ModelError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|_| truncated(path))?;
    Ok(f32::from_le_bytes(buf))
}

fn read_label(reader: &mut impl Read, path: &str) -> Result<String, ModelError> {
    let mut buf = [0u8; 16];
    reader.read_exact(&mut buf).map_err(|_| truncated(path))?;
    Ok(String::from_utf8_lossy(&buf).trim().to_string())
}
