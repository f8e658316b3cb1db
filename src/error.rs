use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub type StampResult<T> = Result<T, StampError>;

#[derive(Debug, Error)]
pub enum StampError {
    #[error("unexpected number of files {count}")]
    UnexpectedFileCount { count: usize },

    #[error("invalid options: {message}")]
    InvalidOptions { message: String },

    #[error("failed to start converter `{program}`: {source}")]
    ConverterSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("converter exited with {status}: {stderr}")]
    ConverterFailed { status: ExitStatus, stderr: String },

    #[error("converter output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to parse mesh: {0}")]
    MeshParse(#[from] tobj::LoadError),

    #[error("mesh contains no triangles")]
    EmptyMesh,

    #[error("export directory unavailable: {}", dir.display())]
    ExportUnavailable { dir: PathBuf },

    #[error("nothing to export yet")]
    NothingToExport,

    #[error("failed to read config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("graphics initialisation failed: {message}")]
    Gpu { message: String },

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StampError {
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }

    pub fn gpu(message: impl std::fmt::Display) -> Self {
        Self::Gpu {
            message: message.to_string(),
        }
    }
}
