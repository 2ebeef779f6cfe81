//! HTTP forwarders for the speech ports.
//!
//! Provider SDK protocols are out of scope here: synthesis posts JSON text to
//! `{base}/tts`, transcription posts raw audio to `{base}/transcribe`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use voxgate_core::{SpeechError, SpeechSynthesizer, SynthesizedAudio, Transcriber};

const DEFAULT_AUDIO_CONTENT_TYPE: &str = "audio/wav";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

fn build_client() -> Result<Client, SpeechError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| SpeechError::Unavailable(format!("HTTP client: {e}")))
}

/// GET the base URL; any HTTP answer counts as reachable.
async fn probe(client: &Client, base_url: &str) -> bool {
    match client.get(base_url).timeout(PROBE_TIMEOUT).send().await {
        Ok(response) => !response.status().is_server_error(),
        Err(e) => {
            debug!(base_url, error = %e, "Speech provider probe failed");
            false
        }
    }
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

/// Forwards synthesis requests to a TTS server.
#[derive(Debug, Clone)]
pub struct HttpSpeechSynthesizer {
    client: Client,
    base_url: String,
    voice: String,
}

impl HttpSpeechSynthesizer {
    pub fn new(base_url: &str, voice: impl Into<String>) -> Result<Self, SpeechError> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            voice: voice.into(),
        })
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, SpeechError> {
        let url = format!("{}/tts", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SynthesisRequest {
                text,
                voice: &self.voice,
            })
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "TTS request failed");
                SpeechError::Unavailable("TTS server unreachable".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "TTS server returned an error");
            return Err(SpeechError::Unavailable(format!("TTS server returned {status}")));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_AUDIO_CONTENT_TYPE)
            .to_string();
        let data = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Unavailable(format!("TTS response body: {e}")))?;

        Ok(SynthesizedAudio { content_type, data })
    }

    async fn is_up(&self) -> bool {
        probe(&self.client, &self.base_url).await
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Forwards audio chunks to an STT server.
#[derive(Debug, Clone)]
pub struct HttpTranscriber {
    client: Client,
    base_url: String,
}

impl HttpTranscriber {
    pub fn new(base_url: &str) -> Result<Self, SpeechError> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, audio: Bytes) -> Result<Option<String>, SpeechError> {
        let url = format!("{}/transcribe", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(audio)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "STT request failed");
                SpeechError::Unavailable("STT server unreachable".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "STT server returned an error");
            return Err(SpeechError::Unavailable(format!("STT server returned {status}")));
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Unavailable(format!("STT response body: {e}")))?;
        Ok(body.text.filter(|t| !t.trim().is_empty()))
    }

    async fn is_up(&self) -> bool {
        probe(&self.client, &self.base_url).await
    }
}

/// Stand-in for a provider that has no server configured.
#[derive(Debug, Clone, Copy)]
pub struct UnconfiguredSpeech {
    service: &'static str,
}

impl UnconfiguredSpeech {
    pub const fn tts() -> Self {
        Self { service: "TTS" }
    }

    pub const fn stt() -> Self {
        Self { service: "STT" }
    }

    fn error(self) -> SpeechError {
        SpeechError::Unavailable(format!("No {} server configured", self.service))
    }
}

#[async_trait]
impl SpeechSynthesizer for UnconfiguredSpeech {
    async fn synthesize(&self, _text: &str) -> Result<SynthesizedAudio, SpeechError> {
        Err(self.error())
    }

    async fn is_up(&self) -> bool {
        false
    }
}

#[async_trait]
impl Transcriber for UnconfiguredSpeech {
    async fn transcribe(&self, _audio: Bytes) -> Result<Option<String>, SpeechError> {
        Err(self.error())
    }

    async fn is_up(&self) -> bool {
        false
    }
}
