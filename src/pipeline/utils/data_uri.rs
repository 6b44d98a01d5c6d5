use anyhow::{Context, Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Returns the decoded payload of a `data:<mime>;base64,<payload>` string.
pub fn decode_data_uri(data_uri: &str) -> Result<Vec<u8>, Error> {
    let (_, payload) = data_uri
        .split_once(',')
        .ok_or_else(|| Error::msg("image is not a data URI"))?;

    STANDARD
        .decode(payload.trim())
        .context("invalid base64 image payload")
}
