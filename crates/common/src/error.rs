use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A message kind outside the closed set was encountered.
    #[error("unknown message kind: {kind}")]
    UnknownKind { kind: String },
}

impl Error {
    #[must_use]
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownKind { kind: kind.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
