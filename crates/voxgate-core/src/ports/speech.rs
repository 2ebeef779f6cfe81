//! Speech provider ports - the downstream work the gate protects.
//!
//! Provider wire protocols stay in adapter crates; these traits only carry
//! text in and audio out (or the reverse).

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors from a speech provider.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Provider could not be reached or returned a failure status.
    #[error("Speech provider unavailable: {0}")]
    Unavailable(String),

    /// The request was rejected before reaching the provider.
    #[error("Invalid speech request: {0}")]
    InvalidRequest(String),
}

/// Encoded audio returned by a synthesizer.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// MIME type of `data` (e.g. `audio/wav`).
    pub content_type: String,
    pub data: Bytes,
}

/// Text-to-speech provider.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, SpeechError>;

    /// Cheap reachability probe for health reporting.
    async fn is_up(&self) -> bool {
        true
    }
}

/// Speech-to-text provider fed with raw audio chunks from a session.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one chunk. `Ok(None)` means nothing recognisable yet.
    async fn transcribe(&self, audio: Bytes) -> Result<Option<String>, SpeechError>;

    async fn is_up(&self) -> bool {
        true
    }
}
