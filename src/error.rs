//! Error types for netsweep.
//!
//! Uses `thiserror` for ergonomic error definitions. Probe- and host-level
//! failures never appear here: they are captured as status values on
//! [`PortResult`](crate::scanner::PortResult) and
//! [`HostResult`](crate::scanner::HostResult).

use crate::types::{PortError, SessionIdError, TargetError};
use std::path::PathBuf;
use thiserror::Error;

/// Run-level error for the scan engine.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid target: {0}")]
    InvalidTarget(#[from] TargetError),

    #[error("session store error: {0}")]
    Storage(#[from] StorageError),

    #[error("host task aborted: {0}")]
    TaskAborted(String),

    #[error("reachability probe failed: {0}")]
    Probe(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors from settings and path discovery.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine a home directory for configuration")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors from session and bookmark persistence.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage directory error: {0}")]
    DirectoryError(String),

    #[error("failed to save: {0}")]
    SaveFailed(String),

    #[error("failed to load: {0}")]
    LoadFailed(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("ambiguous session prefix '{prefix}': {matches} matches")]
    AmbiguousPrefix { prefix: String, matches: usize },

    #[error("bookmark '{0}' already exists")]
    BookmarkExists(String),

    #[error("bookmark '{0}' not found")]
    BookmarkNotFound(String),

    #[error("invalid bookmark: {0}")]
    InvalidBookmark(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Errors surfaced by CLI subcommands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    SessionId(#[from] SessionIdError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type CliResult<T> = Result<T, CliError>;
