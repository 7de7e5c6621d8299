// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Error types shared by every module of the crate.

Validation failures are reported synchronously at the offending call. Each
variant carries a human-readable message; [`Error::kind`] exposes the coarse
category for callers that only want to branch on it.
*/

/// The coarse category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed descriptor content, incompatible attachments, unsupported formats.
    InvalidParameters,
    /// The object is not in a state that allows the operation.
    InvalidState,
    /// A lookup (codec, texture name, cache entry) failed.
    ItemNotFound,
    /// The operation is deliberately unsupported.
    NotImplemented,
    /// The GPU backend reported a failure.
    RenderingApi,
    /// Reading or writing a file failed.
    Io,
    /// Encoding or decoding image data failed.
    Codec,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Item not found: {0}")]
    ItemNotFound(String),
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    #[error("Rendering API error: {0}")]
    RenderingApi(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),
    #[error("PNG decoding error: {0}")]
    PngDecoding(#[from] png::DecodingError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidParameters(_) => ErrorKind::InvalidParameters,
            Error::InvalidState(_) => ErrorKind::InvalidState,
            Error::ItemNotFound(_) => ErrorKind::ItemNotFound,
            Error::NotImplemented(_) => ErrorKind::NotImplemented,
            Error::RenderingApi(_) => ErrorKind::RenderingApi,
            Error::Io(_) => ErrorKind::Io,
            Error::PngEncoding(_) | Error::PngDecoding(_) => ErrorKind::Codec,
        }
    }

    pub(crate) fn invalid_parameters(msg: impl Into<String>) -> Self {
        Error::InvalidParameters(msg.into())
    }

    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }
}
