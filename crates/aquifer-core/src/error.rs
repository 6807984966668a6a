use thiserror::Error;

/// Failure taxonomy for a forward-model evaluation.
///
/// None of these are recovered locally; each surfaces to the
/// evaluation caller unchanged so the protocol layer can translate it
/// into a caller-visible failure response.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Malformed or missing parameter paths / geometry in the configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Working-directory or filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The external simulator reported non-normal termination.
    #[error("simulation \"{name}\" did not terminate normally: {diagnostic}")]
    Simulation { name: String, diagnostic: String },

    /// Expected output artifacts missing or unreadable after a claimed success.
    #[error("corrupt output artifact {path}: {reason}")]
    OutputCorrupt { path: String, reason: String },
}

impl ModelError {
    /// Wire-protocol name of the error kind, matching the published taxonomy.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelError::Configuration(_) => "ConfigurationError",
            ModelError::Io(_) => "IOError",
            ModelError::Simulation { .. } => "SimulationFailure",
            ModelError::OutputCorrupt { .. } => "OutputCorruptError",
        }
    }
}
