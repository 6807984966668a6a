use anyhow::{bail, Context as _};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::Command;

/// USGS source distribution of MODFLOW-2005 (public domain).
const MF2005_URL: &str =
    "https://water.usgs.gov/water-resources/software/MODFLOW-2005/MF2005.1_12u.zip";

#[derive(Parser)]
struct Opts {
    #[clap(subcommand)]
    cmd: Cmd,
}

#[derive(Parser)]
enum Cmd {
    /// Ensure the simulator executable exists, building it if absent
    BuildSim(BuildSimOpts),
}

#[derive(Parser)]
struct BuildSimOpts {
    /// Directory the executable is installed into, relative to the workspace root
    #[clap(long, default_value = "bin")]
    bin_dir: PathBuf,

    /// Rebuild even if the executable is already present
    #[clap(long)]
    force: bool,

    /// Source archive to download
    #[clap(long, default_value = MF2005_URL)]
    source_url: String,
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    match opts.cmd {
        Cmd::BuildSim(opts) => build_sim(opts),
    }
}

fn workspace_root() -> anyhow::Result<PathBuf> {
    // CARGO_MANIFEST_DIR points to crates/aquifer-xtask
    let xtask_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let root = xtask_dir
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .context("Failed to resolve workspace root from CARGO_MANIFEST_DIR")?;
    Ok(root.to_path_buf())
}

fn exe_name() -> &'static str {
    if cfg!(windows) {
        "mf2005.exe"
    } else {
        "mf2005"
    }
}

fn build_sim(opts: BuildSimOpts) -> anyhow::Result<()> {
    let root = workspace_root()?;
    let bin_dir = root.join(&opts.bin_dir);
    let exe = bin_dir.join(exe_name());

    if exe.is_file() && !opts.force {
        println!("{} already present, nothing to do", exe.display());
        return Ok(());
    }
    std::fs::create_dir_all(&bin_dir)
        .with_context(|| format!("creating {}", bin_dir.display()))?;

    let scratch = tempfile::tempdir().context("creating scratch directory")?;
    let archive = scratch.path().join("mf2005-src.zip");

    println!("Downloading {} ...", opts.source_url);
    run_step(
        Command::new("curl").args(["-fsSL", "-o"]).arg(&archive).arg(&opts.source_url),
        "downloading MODFLOW-2005 sources (is curl installed?)",
    )?;
    run_step(
        Command::new("unzip").arg("-q").arg(&archive).arg("-d").arg(scratch.path()),
        "unpacking source archive",
    )?;

    let src_dir = find_src_dir(scratch.path())?;
    println!("Compiling sources in {} ...", src_dir.display());
    let built = compile_sources(&src_dir)?;

    std::fs::copy(&built, &exe)
        .with_context(|| format!("installing executable at {}", exe.display()))?;
    if !exe.is_file() {
        bail!("mf2005 was not found in '{}'", exe.display());
    }
    println!("Installed {}", exe.display());
    Ok(())
}

/// Locate the `src` directory of the unpacked distribution.
fn find_src_dir(unpacked: &Path) -> anyhow::Result<PathBuf> {
    for entry in std::fs::read_dir(unpacked)? {
        let path = entry?.path();
        if path.is_dir() {
            let candidate = path.join("src");
            if candidate.is_dir() {
                return Ok(candidate);
            }
        }
    }
    bail!(
        "no src/ directory found under {} after unpacking",
        unpacked.display()
    )
}

/// Compile the Fortran/C sources into an `mf2005` binary inside
/// `src_dir`.
///
/// Fortran module files must be compiled before their users; instead
/// of resolving the dependency graph, compilation is attempted in
/// passes until a full pass produces no new object files.
fn compile_sources(src_dir: &Path) -> anyhow::Result<PathBuf> {
    let mut sources: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(src_dir)? {
        let path = entry?.path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("f" | "f90" | "for") => sources.push(path),
            Some("c") => {
                run_step(
                    Command::new("gcc")
                        .current_dir(src_dir)
                        .args(["-O2", "-D_UF", "-c"])
                        .arg(&path),
                    "compiling C source (is gcc installed?)",
                )?;
            }
            _ => {}
        }
    }
    sources.sort();

    let mut pending = sources;
    for _pass in 0..8 {
        let mut failed = Vec::new();
        for path in &pending {
            let ok = Command::new("gfortran")
                .current_dir(src_dir)
                .args(["-O2", "-fno-second-underscore", "-c"])
                .arg(path)
                .status()
                .context("running gfortran (is it installed?)")?
                .success();
            if !ok {
                failed.push(path.clone());
            }
        }
        if failed.is_empty() {
            break;
        }
        if failed.len() == pending.len() {
            bail!(
                "compilation made no progress; first failing file: {}",
                failed[0].display()
            );
        }
        pending = failed;
    }

    let objects: Vec<PathBuf> = std::fs::read_dir(src_dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("o"))
        .collect();
    if objects.is_empty() {
        bail!("no object files produced in {}", src_dir.display());
    }

    let exe = src_dir.join(exe_name());
    let mut link = Command::new("gfortran");
    link.current_dir(src_dir).arg("-o").arg(&exe);
    for obj in &objects {
        link.arg(obj);
    }
    run_step(&mut link, "linking mf2005")?;
    Ok(exe)
}

fn run_step(cmd: &mut Command, what: &str) -> anyhow::Result<()> {
    let status = cmd.status().with_context(|| what.to_string())?;
    if !status.success() {
        bail!("{what}: command exited with {status}");
    }
    Ok(())
}
