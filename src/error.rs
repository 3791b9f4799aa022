//! Crate-wide error type. Variants follow the pipeline stages so callers
//! can tell a transport problem from a malformed container.

use thiserror::Error;

pub type SvgaResult<T> = Result<T, SvgaError>;

#[derive(Debug, Error)]
pub enum SvgaError {
    /// The loader could not produce the container bytes.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The container bytes are not a zlib or raw DEFLATE stream.
    #[error("decompression failed: {0}")]
    Decompression(String),

    /// The inflated payload is not a valid movie.
    #[error("container decode failed: {0}")]
    Decode(String),

    /// A drawing surface could not be created or used.
    #[error("surface error: {0}")]
    Surface(String),

    /// An embedded bitmap asset could not be decoded.
    #[error("asset load failed: {0}")]
    AssetLoad(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SvgaError {
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    pub fn decompression(message: impl Into<String>) -> Self {
        Self::Decompression(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn surface(message: impl Into<String>) -> Self {
        Self::Surface(message.into())
    }

    pub fn asset_load(message: impl Into<String>) -> Self {
        Self::AssetLoad(message.into())
    }
}

impl From<prost::DecodeError> for SvgaError {
    fn from(error: prost::DecodeError) -> Self {
        Self::Decode(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_stage() {
        assert_eq!(
            SvgaError::fetch("no loader").to_string(),
            "fetch failed: no loader"
        );
        assert_eq!(
            SvgaError::decompression("bad header").to_string(),
            "decompression failed: bad header"
        );
        assert_eq!(
            SvgaError::decode("truncated").to_string(),
            "container decode failed: truncated"
        );
        assert_eq!(
            SvgaError::asset_load("not a png").to_string(),
            "asset load failed: not a png"
        );
    }

    #[test]
    fn wire_errors_map_to_decode() {
        let err: SvgaError = prost::DecodeError::new("buffer underflow").into();
        assert!(matches!(err, SvgaError::Decode(_)));
    }
}
