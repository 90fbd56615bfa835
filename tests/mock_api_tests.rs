//! Mock API tests for the HTTP clients
//!
//! Each client takes a base-URL override, so these round-trip real request
//! and response bodies against a local wiremock server.

use narravid::images::GoogleImageClient;
use narravid::plan::OpenRouterClient;
use narravid::transcribe::{Transcriber, WhisperClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Whisper transcription
// ============================================================================

mod whisper_tests {
    use super::*;

    fn temp_audio_file() -> std::path::PathBuf {
        let path = std::env::temp_dir().join("narravid_mock_audio.wav");
        std::fs::write(&path, b"RIFF....WAVEfmt ").unwrap();
        path
    }

    #[tokio::test]
    async fn transcribes_word_timestamps() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "task": "transcribe",
            "language": "english",
            "duration": 1.5,
            "text": "hello world",
            "words": [
                {"word": "hello", "start": 0.0, "end": 0.5},
                {"word": "world", "start": 0.5, "end": 1.0}
            ]
        });

        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = WhisperClient::new("test-key".to_string())
            .with_base_url(format!("{}/v1/audio/transcriptions", server.uri()));

        let captions = client.transcribe(&temp_audio_file()).await.unwrap();

        assert_eq!(captions.len(), 2);
        assert_eq!(captions[0].text, "hello");
        assert_eq!(captions[0].start_ms, 0);
        assert_eq!(captions[0].end_ms, 500);
        assert_eq!(captions[1].text, "world");
        assert_eq!(captions[1].end_ms, 1000);
    }

    #[tokio::test]
    async fn surfaces_api_errors_without_retrying_4xx() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "error": {"message": "Invalid file format", "type": "invalid_request_error"}
        });

        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let client = WhisperClient::new("test-key".to_string())
            .with_base_url(format!("{}/v1/audio/transcriptions", server.uri()));

        let result = client.transcribe(&temp_audio_file()).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid file format"));
    }

    #[tokio::test]
    async fn missing_file_fails_before_any_request() {
        let server = MockServer::start().await;

        let client = WhisperClient::new("test-key".to_string())
            .with_base_url(format!("{}/v1/audio/transcriptions", server.uri()));

        let result = client
            .transcribe(std::path::Path::new("/tmp/narravid_missing.wav"))
            .await;

        assert!(result.is_err());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}

// ============================================================================
// OpenRouter chat completions
// ============================================================================

mod openrouter_tests {
    use super::*;

    #[tokio::test]
    async fn generates_text_from_prompt() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "reply text"}}]
        });

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new("test-key".to_string(), "test/model".to_string())
            .with_base_url(format!("{}/api/v1/chat/completions", server.uri()));

        let reply = client.generate("say something").await.unwrap();
        assert_eq!(reply, "reply text");
    }

    #[tokio::test]
    async fn rejects_server_error_after_retries() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(3)
            .mount(&server)
            .await;

        let client = OpenRouterClient::new("test-key".to_string(), "test/model".to_string())
            .with_base_url(format!("{}/api/v1/chat/completions", server.uri()));

        let result = client.generate("say something").await;
        assert!(result.is_err());
    }
}

// ============================================================================
// Google image search
// ============================================================================

mod google_tests {
    use super::*;

    #[tokio::test]
    async fn returns_first_image_link() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "items": [
                {"link": "https://example.com/mothman.jpg"},
                {"link": "https://example.com/other.jpg"}
            ]
        });

        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("searchType", "image"))
            .and(query_param("q", "Mothman sighting"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = GoogleImageClient::new("g-key".to_string(), "cx-id".to_string())
            .with_base_url(format!("{}/customsearch/v1", server.uri()));

        let url = client.first_image_url("Mothman sighting").await.unwrap();
        assert_eq!(url.as_deref(), Some("https://example.com/mothman.jpg"));
    }

    #[tokio::test]
    async fn empty_results_yield_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = GoogleImageClient::new("g-key".to_string(), "cx-id".to_string())
            .with_base_url(format!("{}/customsearch/v1", server.uri()));

        let url = client.first_image_url("anything").await.unwrap();
        assert!(url.is_none());
    }

    #[tokio::test]
    async fn http_error_is_an_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let client = GoogleImageClient::new("g-key".to_string(), "cx-id".to_string())
            .with_base_url(format!("{}/customsearch/v1", server.uri()));

        let result = client.first_image_url("anything").await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("403"));
    }
}
