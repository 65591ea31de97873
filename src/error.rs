// Error model shared by the transfer client and the command handlers.
// Every variant maps onto one of four kinds so the caller can tell a
// bad argument from a broken network or a misbehaving server.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{} {}: {}", .context, .path.display(), .source)]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("bad status: {}", status_text(.0))]
    Status(StatusCode),

    #[error("response is missing the {0} header")]
    MissingHeader(&'static str),

    #[error("server sent an unusable file name: {0:?}")]
    BadFilename(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or empty operand, caught before any network activity.
    Validation,
    /// Local file open/create/write failure.
    Io,
    /// Request construction or transport failure.
    Network,
    /// The server answered, but not with what a well-formed reply carries.
    Protocol,
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            context,
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Io { .. } => ErrorKind::Io,
            Error::Transport(_) | Error::Url(_) => ErrorKind::Network,
            Error::Status(_) | Error::MissingHeader(_) | Error::BadFilename(_) => {
                ErrorKind::Protocol
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn status_text(status: &StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}
