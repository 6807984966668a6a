//! Free-format MODFLOW-2005 input deck writer.
//!
//! Emits the package set the forward model needs: NAM (file registry),
//! DIS (discretization), BAS6 (basin), LPF (layer properties), PCG
//! (solver), OC (output control) and RCH (recharge). Array data is
//! written as `CONSTANT` control records since every field this model
//! derives is uniform over its grid or layer.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::config::Config;
use crate::instance::ModelInstance;
use crate::materialize::{recharge_rate, Grid};
use crate::mf2005::units;

/// Head value reported for cells that go dry.
const HDRY: &str = "-1E+30";
/// Inactive-head marker for the basin package.
const HNOFLO: &str = "-999.99";
/// Specific yield written for convertible layers; the configuration
/// schema carries no sy field, so a conventional value is used.
const DEFAULT_SPECIFIC_YIELD: f64 = 0.15;

/// Write the complete input deck for one instance.
pub(crate) fn write_input_deck(
    instance: &ModelInstance,
    config: &Config,
    grid: &Grid,
) -> io::Result<()> {
    write_package(instance, "nam", |w| write_nam(w, instance))?;
    write_package(instance, "dis", |w| write_dis(w, config, grid))?;
    write_package(instance, "bas", |w| write_bas(w, grid))?;
    write_package(instance, "lpf", |w| write_lpf(w, config, grid))?;
    write_package(instance, "pcg", write_pcg)?;
    write_package(instance, "oc", |w| write_oc(w, config))?;
    write_package(instance, "rch", |w| write_rch(w, config))?;
    Ok(())
}

fn write_package<F>(instance: &ModelInstance, ext: &str, body: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let path = instance.workspace.join(instance.artifact(ext));
    let mut w = BufWriter::new(File::create(path)?);
    body(&mut w)?;
    w.flush()
}

fn write_nam(w: &mut impl Write, instance: &ModelInstance) -> io::Result<()> {
    let name = &instance.name;
    writeln!(w, "LIST {:>3}  {name}.list", units::LIST)?;
    writeln!(w, "DIS  {:>3}  {name}.dis", units::DIS)?;
    writeln!(w, "BAS6 {:>3}  {name}.bas", units::BAS)?;
    writeln!(w, "LPF  {:>3}  {name}.lpf", units::LPF)?;
    writeln!(w, "PCG  {:>3}  {name}.pcg", units::PCG)?;
    writeln!(w, "OC   {:>3}  {name}.oc", units::OC)?;
    writeln!(w, "RCH  {:>3}  {name}.rch", units::RCH)?;
    writeln!(w, "DATA(BINARY) {:>3}  {name}.hds REPLACE", units::HEAD)?;
    writeln!(w, "DATA(BINARY) {:>3}  {name}.cbc REPLACE", units::BUDGET)?;
    Ok(())
}

fn write_dis(w: &mut impl Write, config: &Config, grid: &Grid) -> io::Result<()> {
    let ts = &config.timestepping;
    // ITMUNI 4 = days, LENUNI 2 = meters
    writeln!(
        w,
        "{} {} {} {} 4 2",
        grid.nlay, grid.nrow, grid.ncol, ts.n_periods
    )?;
    // LAYCBD: no quasi-3D confining beds
    writeln!(w, "{}", vec!["0"; grid.nlay].join(" "))?;
    writeln!(w, "CONSTANT {}", grid.delr)?;
    writeln!(w, "CONSTANT {}", grid.delc)?;
    writeln!(w, "CONSTANT {}", grid.top)?;
    for bottom in &grid.botm {
        writeln!(w, "CONSTANT {bottom}")?;
    }
    let state = if ts.steady { "SS" } else { "TR" };
    for _ in 0..ts.n_periods {
        writeln!(w, "{} {} 1.0 {state}", ts.period_length, ts.n_steps)?;
    }
    Ok(())
}

fn write_bas(w: &mut impl Write, grid: &Grid) -> io::Result<()> {
    writeln!(w, "FREE")?;
    // IBOUND: every cell active
    for _ in 0..grid.nlay {
        writeln!(w, "CONSTANT 1")?;
    }
    writeln!(w, "{HNOFLO}")?;
    // initial head uniform at the top elevation
    for _ in 0..grid.nlay {
        writeln!(w, "CONSTANT {}", grid.top)?;
    }
    Ok(())
}

fn write_lpf(w: &mut impl Write, config: &Config, grid: &Grid) -> io::Result<()> {
    let layers = &config.layers;
    writeln!(w, "{} {HDRY} 0", units::BUDGET)?;
    writeln!(w, "{}", join_i32(&layers.laytype))?;
    // LAYAVG: harmonic mean
    writeln!(w, "{}", vec!["0"; grid.nlay].join(" "))?;
    // CHANI: isotropic
    writeln!(w, "{}", vec!["1.0"; grid.nlay].join(" "))?;
    // LAYVKA: vka is vertical conductivity
    writeln!(w, "{}", vec!["0"; grid.nlay].join(" "))?;
    // LAYWET: no rewetting
    writeln!(w, "{}", vec!["0"; grid.nlay].join(" "))?;
    let transient = !config.timestepping.steady;
    for layer in 0..grid.nlay {
        writeln!(w, "CONSTANT {}", layers.conductivity[layer])?;
        // vertical conductivity, uniform
        writeln!(w, "CONSTANT 1.0")?;
        if transient {
            writeln!(w, "CONSTANT {}", layers.storage[layer])?;
            if layers.laytype[layer] != 0 {
                writeln!(w, "CONSTANT {DEFAULT_SPECIFIC_YIELD}")?;
            }
        }
    }
    Ok(())
}

fn write_pcg(w: &mut impl Write) -> io::Result<()> {
    // MXITER ITER1 NPCOND
    writeln!(w, "50 30 1")?;
    // HCLOSE RCLOSE RELAX NBPOL IPRPCG MUTPCG DAMP
    writeln!(w, "1E-5 1E-5 1.0 0 0 1 1.0")?;
    Ok(())
}

fn write_oc(w: &mut impl Write, config: &Config) -> io::Result<()> {
    let ts = &config.timestepping;
    writeln!(w, "HEAD PRINT FORMAT 0")?;
    writeln!(w, "HEAD SAVE UNIT {}", units::HEAD)?;
    writeln!(w, "COMPACT BUDGET")?;
    for period in 1..=ts.n_periods {
        for step in 1..=ts.n_steps {
            writeln!(w, "PERIOD {period} STEP {step}")?;
            writeln!(w, "  PRINT HEAD")?;
            writeln!(w, "  PRINT BUDGET")?;
            writeln!(w, "  SAVE HEAD")?;
            writeln!(w, "  SAVE BUDGET")?;
        }
    }
    Ok(())
}

fn write_rch(w: &mut impl Write, config: &Config) -> io::Result<()> {
    // NRCHOP 3: recharge applied to the highest active cell
    writeln!(w, "3 {}", units::BUDGET)?;
    writeln!(w, "1")?;
    writeln!(w, "CONSTANT {}", recharge_rate(config))?;
    for _ in 1..config.timestepping.n_periods {
        // reuse the first period's recharge
        writeln!(w, "-1")?;
    }
    Ok(())
}

fn join_i32(values: &[i32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
