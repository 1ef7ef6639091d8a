use thiserror::Error;

/// Failure kinds surfaced by the nuance pipeline.
///
/// Per-file and per-category sample failures never reach this type; they are
/// logged and skipped at the catalog boundary. A missing sample root is also
/// not an error: the catalog degrades to synthesis-only dispensing.
#[derive(Debug, Error)]
pub enum NuanceError {
    /// A caller-supplied configuration artifact could not be used.
    #[error("configuration error: {0}")]
    Config(String),

    /// A single sample file could not be decoded.
    #[error("failed to load clip {path}: {reason}")]
    ClipLoad { path: String, reason: String },

    /// The feature digest from the analysis collaborator is unusable.
    /// Fatal for the track it describes.
    #[error("analysis digest error: {0}")]
    Analysis(String),

    /// A numeric edge case inside the synthesis bank.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// The enhanced track or nuance map could not be persisted.
    #[error("failed to write output: {0}")]
    OutputWrite(String),
}
