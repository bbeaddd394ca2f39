use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a [`crate::ParticleField`], loading its
/// configuration or encoding it for the GPU.
///
/// Stepping the simulation never fails; only caller-supplied parameters are checked.
#[derive(Error, Debug)]
pub enum FieldError {
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to encode particle buffer: {0}")]
    Encode(#[from] encase::internal::Error),
}
