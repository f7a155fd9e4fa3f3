//! Error types for KG-Agent

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("toolbox misconfiguration: {0}")]
    ToolboxMisconfiguration(String),

    #[error("seed entity not grounded: {0}")]
    UngroundedSeed(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("graph load error at line {line}: {message}")]
    GraphLoad { line: usize, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn misconfigured(message: impl Into<String>) -> Self {
        Self::ToolboxMisconfiguration(message.into())
    }

    pub fn graph_load(line: usize, message: impl Into<String>) -> Self {
        Self::GraphLoad {
            line,
            message: message.into(),
        }
    }
}
