use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("port {0} is already in use")]
    PortInUse(u16),

    #[error("engine file not found: {}", .0.display())]
    EngineNotFound(PathBuf),

    #[error("engine process exited before accepting connections: {0}")]
    EngineExited(ExitStatus),

    #[error("engine did not answer on port {port} within {secs}s")]
    ConnectTimeout { port: u16, secs: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
