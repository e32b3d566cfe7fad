use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataUriError {
    #[error("Missing data: prefix")]
    MissingPrefix,
    #[error("Only base64 data URIs are supported")]
    NotBase64,
    #[error("Expected an image, got {0}")]
    NotAnImage(String),
    #[error("Invalid base64 payload")]
    InvalidPayload,
}

/// Builds `data:<mime>;base64,<payload>`.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Decoded image data URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageDataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageDataUri {
    pub fn parse(uri: &str) -> Result<Self, DataUriError> {
        let rest = uri.strip_prefix("data:").ok_or(DataUriError::MissingPrefix)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUriError::NotBase64)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(DataUriError::NotBase64)?;
        if !mime.starts_with("image/") {
            return Err(DataUriError::NotAnImage(mime.to_string()));
        }
        let bytes = STANDARD
            .decode(payload)
            .map_err(|_| DataUriError::InvalidPayload)?;
        Ok(Self {
            mime: mime.to_string(),
            bytes,
        })
    }
}
