use crate::error::{NarravidError, Result};
use crate::transcribe::{Caption, Transcriber};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

/// OpenAI Whisper API endpoint.
const WHISPER_API_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Maximum file size for the Whisper API (25 MB).
const MAX_FILE_SIZE: usize = 25 * 1024 * 1024;

/// Maximum retries for API calls.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const BASE_DELAY_MS: u64 = 1000;

/// OpenAI Whisper client requesting word-level timestamps.
pub struct WhisperClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    language: Option<String>,
}

impl WhisperClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: WHISPER_API_URL.to_string(),
            api_key,
            language: None,
        }
    }

    /// Set the source language (ISO 639-1 code).
    pub fn with_language(mut self, language: String) -> Self {
        self.language = Some(language);
        self
    }

    /// Override the API endpoint (used by tests).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.api_url = url;
        self
    }

    async fn build_form(&self, audio_path: &Path) -> Result<Form> {
        let file_bytes = fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let mime_type = match audio_path.extension().and_then(|e| e.to_str()) {
            Some("wav") => "audio/wav",
            Some("mp3") => "audio/mpeg",
            Some("m4a") => "audio/mp4",
            Some("flac") => "audio/flac",
            Some("ogg") => "audio/ogg",
            Some("webm") => "audio/webm",
            _ => "application/octet-stream",
        };

        let file_part = Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str(mime_type)?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", "whisper-1")
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word");

        if let Some(ref lang) = self.language {
            form = form.text("language", lang.clone());
        }

        Ok(form)
    }

    /// Make the API request (the form is consumed, so retries rebuild it).
    async fn call_api(&self, form: Form) -> Result<WhisperResponse> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        debug!("Whisper API response status: {}", status);

        if status.is_success() {
            let body = response.text().await?;
            let parsed: WhisperResponse = serde_json::from_str(&body)?;
            return Ok(parsed);
        }

        let error_body = response.text().await.unwrap_or_default();

        if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
            return Err(NarravidError::Api(format!(
                "Whisper API error ({}): {} ({})",
                status, api_error.error.message, api_error.error.r#type
            )));
        }

        Err(NarravidError::Api(format!(
            "Whisper API error ({}): {}",
            status, error_body
        )))
    }

    async fn transcribe_with_retry(&self, audio_path: &Path) -> Result<WhisperResponse> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = BASE_DELAY_MS * 2u64.pow(attempt - 1);
                debug!("Retry attempt {} after {}ms delay", attempt, delay);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let form = self.build_form(audio_path).await?;

            match self.call_api(form).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    // Don't retry on client errors
                    let error_str = e.to_string();
                    if error_str.contains("API error (4") {
                        return Err(e);
                    }
                    warn!("Attempt {} failed: {}", attempt + 1, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| NarravidError::Api("Unknown error".to_string())))
    }

    /// Flatten the API response into the ordered caption stream. Words carry
    /// second-precision floats; the composition layer wants milliseconds.
    fn parse_response(&self, response: WhisperResponse) -> Vec<Caption> {
        response
            .words
            .unwrap_or_default()
            .into_iter()
            .map(|w| Caption {
                text: w.word.trim().to_string(),
                start_ms: secs_to_ms(w.start),
                end_ms: secs_to_ms(w.end),
            })
            .collect()
    }
}

fn secs_to_ms(secs: f64) -> u64 {
    (secs * 1000.0).round() as u64
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: &Path) -> Result<Vec<Caption>> {
        debug!("Transcribing {:?} with Whisper", audio);

        let metadata = fs::metadata(audio).await?;
        if metadata.len() as usize > MAX_FILE_SIZE {
            return Err(NarravidError::Transcription(format!(
                "File too large for Whisper API: {} bytes (max {} bytes)",
                metadata.len(),
                MAX_FILE_SIZE
            )));
        }

        let response = self.transcribe_with_retry(audio).await?;
        let captions = self.parse_response(response);

        if captions.is_empty() {
            warn!("Whisper returned no word timestamps for {:?}", audio);
        } else {
            debug!("Whisper returned {} words", captions.len());
        }

        Ok(captions)
    }

    fn name(&self) -> &'static str {
        "OpenAI Whisper"
    }
}

// API response types

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    #[allow(dead_code)]
    text: String,
    #[serde(default)]
    words: Option<Vec<WhisperWord>>,
}

#[derive(Debug, Deserialize)]
struct WhisperWord {
    word: String,
    start: f64,
    end: f64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    r#type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_words_to_millis() {
        let client = WhisperClient::new("test-key".to_string());

        let response = WhisperResponse {
            text: "hello world".to_string(),
            words: Some(vec![
                WhisperWord {
                    word: " hello".to_string(),
                    start: 0.0,
                    end: 0.5,
                },
                WhisperWord {
                    word: "world".to_string(),
                    start: 0.5,
                    end: 1.02,
                },
            ]),
        };

        let captions = client.parse_response(response);

        assert_eq!(captions.len(), 2);
        assert_eq!(captions[0].text, "hello");
        assert_eq!(captions[0].start_ms, 0);
        assert_eq!(captions[0].end_ms, 500);
        assert_eq!(captions[1].end_ms, 1020);
    }

    #[test]
    fn test_parse_response_without_words() {
        let client = WhisperClient::new("test-key".to_string());
        let response = WhisperResponse {
            text: "hello".to_string(),
            words: None,
        };

        assert!(client.parse_response(response).is_empty());
    }

    #[tokio::test]
    async fn test_transcribe_missing_file_fails() {
        let client = WhisperClient::new("test-key".to_string());
        let result = client.transcribe(Path::new("/tmp/nonexistent_test.wav")).await;
        assert!(result.is_err());
    }
}
