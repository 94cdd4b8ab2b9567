use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use maze_descent_core::MazeConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CODE_DOMAIN: &str = "maze";
const CODE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded payload.
pub(crate) const CODE_HEADER: &str = "maze:v1";
const FIELD_DELIMITER: char = ':';

/// Everything needed to regenerate a maze on another machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct MazeCode {
    /// Seed of the generator stream.
    pub seed: u64,
    /// Level layout scalars.
    pub config: MazeConfig,
}

impl MazeCode {
    /// Encodes the code into a single line suitable for sharing.
    pub(crate) fn encode(&self) -> Result<String, MazeCodeError> {
        let json = serde_json::to_vec(self).map_err(MazeCodeError::InvalidPayload)?;
        Ok(format!("{CODE_HEADER}:{}", STANDARD_NO_PAD.encode(json)))
    }

    /// Decodes a code produced by [`MazeCode::encode`].
    pub(crate) fn decode(value: &str) -> Result<Self, MazeCodeError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MazeCodeError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(MazeCodeError::MissingPrefix)?;
        let version = parts.next().ok_or(MazeCodeError::MissingVersion)?;
        let payload = parts.next().ok_or(MazeCodeError::MissingPayload)?;

        if domain != CODE_DOMAIN {
            return Err(MazeCodeError::InvalidPrefix(domain.to_owned()));
        }
        if version != CODE_VERSION {
            return Err(MazeCodeError::UnsupportedVersion(version.to_owned()));
        }

        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(MazeCodeError::InvalidEncoding)?;
        serde_json::from_slice(&bytes).map_err(MazeCodeError::InvalidPayload)
    }
}

/// Errors that can occur while decoding maze codes.
#[derive(Debug, Error)]
pub(crate) enum MazeCodeError {
    /// The provided string was empty or contained only whitespace.
    #[error("maze code was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("maze code is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("maze code is missing the version")]
    MissingVersion,
    /// The payload segment was missing.
    #[error("maze code is missing the payload")]
    MissingPayload,
    /// The code used an unexpected prefix.
    #[error("maze code prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The code used an unsupported version identifier.
    #[error("maze code version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode maze code payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    #[error("could not parse maze code payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}
