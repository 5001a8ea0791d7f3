use thiserror::Error;

/// A failure inside the renderer or clustering engine, caught at the
/// component boundary. Never fatal: the offending feature is skipped and
/// the rest of the map still renders.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("ward {ward_id}: {reason}")]
    Ward { ward_id: String, reason: String },

    #[error("station \"{name}\": {reason}")]
    Station { name: String, reason: String },
}
