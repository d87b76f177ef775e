//! Error types for state updates

use thiserror::Error;

/// Boundary misuse of the patch engine.
///
/// Bad paths or unreachable targets inside a well-formed patch are not
/// errors; they are skipped and reported in the outcome.
#[derive(Debug, Error)]
pub enum StateError {
    /// The document being patched was not a JSON object
    #[error("document must be a JSON object, got {0}")]
    DocumentNotAnObject(&'static str),

    /// The patch itself was not a JSON object
    #[error("patch must be a JSON object, got {0}")]
    PatchNotAnObject(&'static str),
}
