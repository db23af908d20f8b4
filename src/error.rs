//! Crate-wide error aggregate.
//!
//! Each stage owns its error enum ([`DecodeError`], [`EncodeError`],
//! [`WriteError`], [`ConfigError`]). [`CompressorError`] wraps them for
//! callers that drive the whole pipeline and just want a message to show.

use crate::config::ConfigError;
use crate::imaging::{DecodeError, EncodeError};
use crate::persist::WriteError;
use thiserror::Error;

/// An operation was requested before the session could support it.
///
/// Raised before any I/O or encoding is attempted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("no image is loaded")]
    NoImage,
    #[error("nothing has been encoded yet")]
    NothingEncoded,
}

#[derive(Error, Debug)]
pub enum CompressorError {
    #[error("Open failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("Compression failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("Save failed: {0}")]
    Write(#[from] WriteError),
    #[error("Not possible yet: {0}")]
    Precondition(#[from] PreconditionError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Cannot start encode worker: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
