//! Gemini `generateContent` client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::json;

use super::{CompletionClient, CompletionRequest};
use crate::config::AutofillConfig;
use crate::{Error, Result};

/// Blocking Gemini client with its own current-thread runtime.
pub struct GeminiClient {
    model: String,
    endpoint: String,
    api_key: String,
    runtime: tokio::runtime::Runtime,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: &AutofillConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            Error::Config(format!(
                "autofill.api_key (or ${}) is required",
                config.api_key_env
            ))
        })?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Http(format!("failed to build tokio runtime: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            api_key,
            runtime,
            http,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(&self.model)
        )
    }
}

/// Request body for `generateContent`.
fn request_body(request: &CompletionRequest) -> serde_json::Value {
    json!({
        "systemInstruction": {
            "parts": [{ "text": request.system_instruction }],
        },
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }],
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.response_schema,
        },
    })
}

/// Concatenate `candidates[0].content.parts[*].text`.
fn response_text(json: &serde_json::Value) -> String {
    json.get("candidates")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default()
}

impl CompletionClient for GeminiClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.runtime.block_on(async {
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            headers.insert(
                "x-goog-api-key",
                HeaderValue::from_str(&self.api_key)
                    .map_err(|e| Error::Config(format!("invalid gemini api key header: {e}")))?,
            );

            let resp = self
                .http
                .post(self.url())
                .headers(headers)
                .json(&request_body(request))
                .send()
                .await
                .map_err(|e| Error::Http(format!("gemini request failed: {e}")))?;
            let status = resp.status();
            let body = resp
                .text()
                .await
                .map_err(|e| Error::Http(format!("gemini read body failed: {e}")))?;
            if !status.is_success() {
                return Err(Error::Autofill(format!(
                    "gemini returned {}: {}",
                    status.as_u16(),
                    body
                )));
            }

            let json: serde_json::Value = serde_json::from_str(&body)?;
            Ok(response_text(&json))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autofill::build_request;

    fn config_with_key() -> AutofillConfig {
        AutofillConfig {
            api_key: Some("test-key".to_string()),
            ..AutofillConfig::default()
        }
    }

    #[test]
    fn test_url_targets_model() {
        let client = GeminiClient::new(&config_with_key()).unwrap();
        assert_eq!(
            client.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = AutofillConfig {
            api_key: Some("   ".to_string()),
            api_key_env: "WRAPCARD_TEST_UNSET_KEY_9C2E".to_string(),
            ..AutofillConfig::default()
        };
        assert!(matches!(GeminiClient::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body(&build_request("a jazz drummer"));
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert!(body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("a jazz drummer"));
        assert!(body["systemInstruction"]["parts"][0]["text"].is_string());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let json = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] }
            }]
        });
        assert_eq!(response_text(&json), "{\"a\":1}");
        assert_eq!(response_text(&json!({ "candidates": [] })), "");
    }
}
