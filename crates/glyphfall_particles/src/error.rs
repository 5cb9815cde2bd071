//! # Engine Error Types
//!
//! Only construction can fail at runtime. Everything inside the frame loop
//! degrades instead of erroring.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the particle engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The drawing surface could not hand out a 2D context.
    ///
    /// Fatal for this engine instance. The host should render no animation.
    #[error("drawing surface could not provide a 2D context")]
    ContextUnavailable,

    /// A config file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigIo {
        /// The file that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A config file was not valid TOML or had unknown keys.
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
