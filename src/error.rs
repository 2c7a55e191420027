//! Error types.

use core::fmt;

/// Result type for SM2 encryption and decryption.
pub type Result<T> = core::result::Result<T, Error>;

/// SM2 encryption and decryption errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A length is outside the range the scheme accepts: an empty or
    /// oversize plaintext, an oversize ciphertext body, or an output buffer
    /// too small for the result.
    InvalidLength,

    /// The ciphertext failed to parse: bad DER structure, trailing input,
    /// wrong OCTET STRING lengths, or coordinates which do not name a point
    /// on the curve.
    Malformed,

    /// Decryption failed.
    ///
    /// Covers both an all-zero derived keystream and an integrity tag
    /// mismatch; the two cases are indistinguishable on purpose.
    DecryptionFailed,

    /// The random number generator backend failed.
    RandomGeneration,

    /// No ephemeral point of the requested encoded size was found within
    /// the retry bound.
    RetryExhausted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::InvalidLength => "invalid plaintext or buffer length",
            Error::Malformed => "malformed ciphertext",
            Error::DecryptionFailed => "decryption failed",
            Error::RandomGeneration => "random number generator failure",
            Error::RetryExhausted => "ephemeral point size retry limit reached",
        })
    }
}

impl core::error::Error for Error {}

impl From<der::Error> for Error {
    fn from(_: der::Error) -> Error {
        Error::Malformed
    }
}

impl From<elliptic_curve::Error> for Error {
    fn from(_: elliptic_curve::Error) -> Error {
        Error::Malformed
    }
}
