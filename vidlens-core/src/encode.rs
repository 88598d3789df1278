use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// MIME tag sent with every payload, whatever the source served.
pub const VIDEO_MIME_TYPE: &str = "video/mp4";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("video payload is empty")]
    EmptyPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub data: String,
    pub mime_type: &'static str,
}

pub fn encode_payload(bytes: &[u8]) -> Result<EncodedPayload, EncodingError> {
    if bytes.is_empty() {
        return Err(EncodingError::EmptyPayload);
    }
    Ok(EncodedPayload {
        data: STANDARD.encode(bytes),
        mime_type: VIDEO_MIME_TYPE,
    })
}
