use std::io;

use thiserror::Error;

/// Failures raised by the encoder itself, as opposed to errors coming from the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("invalid multipart boundary {0:?}")]
    InvalidBoundary(String),

    #[error("encoder is unusable after a previous read failure")]
    Poisoned,
}

impl From<EncodeError> for io::Error {
    fn from(err: EncodeError) -> io::Error {
        let kind = match err {
            EncodeError::InvalidBoundary(_) => io::ErrorKind::InvalidInput,
            EncodeError::Poisoned => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
