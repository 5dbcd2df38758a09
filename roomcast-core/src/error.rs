use thiserror::Error;

/// Errors reported by the wire codec.
///
/// All of these are permanent: the caller logs the failure and discards the
/// frame. Retrying the same bytes cannot succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A header line carried no `:` separator.
    #[error("header line has no ':' delimiter: {0:?}")]
    InvalidDelimiter(String),

    /// The header section of a binary frame was not valid UTF-8.
    #[error("header bytes are not valid UTF-8")]
    InvalidHeaderEncoding,

    /// A client message carried neither `broadcast` nor any `to` header.
    #[error("message has no recipients")]
    NoRecipients,

    /// A relay message carried none of the recognized headers.
    #[error("no recognized message header")]
    UnknownHeader,
}

pub type Result<T> = std::result::Result<T, Error>;
