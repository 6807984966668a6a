//! Model instance handles.
//!
//! A [`ModelInstance`] binds a unique name to a working directory that
//! exclusively holds that instance's input and output artifacts, plus
//! the simulator executable to run against it. Instances are created
//! per evaluation call and never reused.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::ModelError;

/// One bound, exclusively-owned execution context for a single
/// simulator run.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    /// Unique instance name; artifact file names derive from it.
    pub name: String,
    /// Working directory, exclusively owned by this instance.
    pub workspace: PathBuf,
    /// Simulator executable invoked against the workspace.
    pub exe: PathBuf,
}

impl ModelInstance {
    /// Create an instance with a fresh, exclusively-owned workspace.
    ///
    /// The instance name is `<base>-<id>` with a generated suffix, so
    /// concurrent evaluations of the same model never collide on a
    /// directory. A leftover directory of the same name is removed
    /// wholesale first; no stale artifacts leak into a new run.
    pub fn create(base_name: &str, run_root: &Path, exe: &Path) -> Result<Self, ModelError> {
        let id = Uuid::new_v4().simple().to_string();
        let name = format!("{base_name}-{}", &id[..8]);
        Self::create_named(&name, run_root, exe)
    }

    /// Create an instance under an exact name. Used directly only when
    /// the caller guarantees the name is not shared.
    pub fn create_named(name: &str, run_root: &Path, exe: &Path) -> Result<Self, ModelError> {
        if !exe.is_file() {
            return Err(ModelError::Configuration(format!(
                "simulator executable not found at {}",
                exe.display()
            )));
        }
        let workspace = run_root.join(name);
        if workspace.is_dir() {
            std::fs::remove_dir_all(&workspace)?;
        }
        std::fs::create_dir_all(&workspace)?;
        Ok(Self {
            name: name.to_string(),
            workspace,
            exe: exe.to_path_buf(),
        })
    }

    /// Name of an artifact file with the given extension, e.g. `nam`.
    pub fn artifact(&self, ext: &str) -> String {
        format!("{}.{ext}", self.name)
    }

    /// Path to the simulator name file.
    pub fn nam_path(&self) -> PathBuf {
        self.workspace.join(self.artifact("nam"))
    }

    /// Path to the binary head output file.
    pub fn head_path(&self) -> PathBuf {
        self.workspace.join(self.artifact("hds"))
    }

    /// Path to the binary cell-by-cell budget output file.
    pub fn budget_path(&self) -> PathBuf {
        self.workspace.join(self.artifact("cbc"))
    }
}
