//! Pipeline error types.

use tellus_mesh::MeshError;

/// Errors surfaced by the pipeline orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A pass was started while a previous run's resources were still
    /// live. The in-flight pass must drain first.
    #[error("a subdivision pass is already in flight")]
    PassInFlight,

    /// The source mesh violated the indexed-triangle contract.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}
