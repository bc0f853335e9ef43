//! Inline media: base64 data URIs and WAV packaging.
//!
//! The flow layer never touches file paths or raw binary in its public
//! contract. Every image or audio payload crossing a flow boundary is a
//! self-describing `data:<mime-type>;base64,<payload>` string, parsed into
//! a [`DataUri`] where the bytes are needed.

use crate::error::{FlowError, Result};
use base64::Engine as _;
use std::fmt;

/// A parsed `data:<mime-type>;base64,<payload>` URI.
///
/// The payload is kept base64-encoded; [`DataUri::decode`] produces bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime_type: String,
    data: String,
}

impl DataUri {
    /// Build from a MIME type and an already base64-encoded payload.
    pub fn new(mime_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: base64_data.into(),
        }
    }

    /// Encode raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(
            mime_type,
            base64::engine::general_purpose::STANDARD.encode(bytes),
        )
    }

    /// Parse a data URI string. Only base64 payloads with an explicit MIME
    /// type are accepted.
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| FlowError::InvalidDataUri("missing 'data:' prefix".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| FlowError::InvalidDataUri("missing ',' separator".into()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| FlowError::InvalidDataUri("payload must be base64".into()))?;
        if mime_type.is_empty() || !mime_type.contains('/') {
            return Err(FlowError::InvalidDataUri(format!(
                "missing or malformed MIME type '{}'",
                mime_type
            )));
        }
        if payload.is_empty() {
            return Err(FlowError::InvalidDataUri("empty payload".into()));
        }
        Ok(Self::new(mime_type, payload))
    }

    /// Whether `uri` parses as a data URI.
    pub fn is_valid(uri: &str) -> bool {
        Self::parse(uri).is_ok()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 payload, without the header.
    pub fn base64_data(&self) -> &str {
        &self.data
    }

    /// Decode the payload into bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| FlowError::InvalidDataUri(format!("bad base64 payload: {}", e)))
    }

    /// Whether the MIME type is `image/*`.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Whether the MIME type is `audio/*`.
    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.data)
    }
}

/// PCM layout of raw speech output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub channels: u16,
    pub sample_rate: u32,
    /// Bytes per sample (2 = 16-bit).
    pub sample_width: u16,
}

impl Default for PcmFormat {
    /// Mono, 24 kHz, 16-bit: what the speech models emit.
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 24_000,
            sample_width: 2,
        }
    }
}

/// Wrap little-endian PCM samples in a RIFF/WAVE container.
pub fn pcm_to_wav(pcm: &[u8], format: PcmFormat) -> Vec<u8> {
    let block_align = format.channels * format.sample_width;
    let byte_rate = format.sample_rate * u32::from(block_align);
    let data_len = pcm.len() as u32;

    let mut out = Vec::with_capacity(44 + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&(format.sample_width * 8).to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

/// Whether `bytes` already carry a RIFF/WAVE header.
pub fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_display() {
        let uri = "data:image/png;base64,iVBORw0KGgo=";
        let parsed = DataUri::parse(uri).unwrap();
        assert_eq!(parsed.mime_type(), "image/png");
        assert_eq!(parsed.base64_data(), "iVBORw0KGgo=");
        assert!(parsed.is_image());
        assert_eq!(parsed.to_string(), uri);
    }

    #[test]
    fn test_parse_rejects_paths_and_plain_urls() {
        assert!(DataUri::parse("/tmp/slide.png").is_err());
        assert!(DataUri::parse("https://example.com/a.png").is_err());
        assert!(DataUri::parse("data:image/png,rawbytes").is_err());
        assert!(DataUri::parse("data:;base64,AAAA").is_err());
        assert!(DataUri::parse("data:image/png;base64,").is_err());
    }

    #[test]
    fn test_from_bytes_decode() {
        let uri = DataUri::from_bytes("audio/L16", &[1, 2, 3, 4]);
        assert!(uri.is_audio());
        assert_eq!(uri.decode().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_pcm_to_wav_header() {
        let pcm = vec![0u8; 480];
        let wav = pcm_to_wav(&pcm, PcmFormat::default());
        assert_eq!(wav.len(), 44 + 480);
        assert!(is_wav(&wav));
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 24_000);
        assert_eq!(u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]), 48_000);
        assert_eq!(u16::from_le_bytes([wav[34], wav[35]]), 16);
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 480);
    }
}
