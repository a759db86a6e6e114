//! Anthropic Messages API gateway

use async_trait::async_trait;
use fincounsel_application::ports::llm_gateway::{GatewayError, LlmGateway};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection settings, usually built from the `[llm]` config section.
#[derive(Debug, Clone)]
pub struct AnthropicSettings {
    pub base_url: String,
    pub model: String,
    pub api_version: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [RequestMessage<'a>; 1],
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct AnthropicGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    settings: AnthropicSettings,
}

impl AnthropicGateway {
    pub fn new(settings: AnthropicSettings, api_key: Option<String>) -> Result<Self, GatewayError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GatewayError::MissingCredentials("Anthropic API key".into()))?;
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/messages", settings.base_url.trim_end_matches('/')),
            api_key,
            settings,
        })
    }

    /// Create the gateway, or `None` (with a warning) when it cannot be built.
    pub fn try_new(settings: AnthropicSettings, api_key: Option<String>) -> Option<Self> {
        match Self::new(settings, api_key) {
            Ok(gateway) => {
                info!(model = %gateway.settings.model, "Anthropic gateway initialized");
                Some(gateway)
            }
            Err(e) => {
                warn!("Anthropic gateway not available: {}", e);
                None
            }
        }
    }

    fn request_body<'a>(&'a self, system: &'a str, prompt: &'a str) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            system,
            messages: [RequestMessage {
                role: "user",
                content: prompt,
            }],
        }
    }

    fn parse_success(body: &str) -> Result<String, GatewayError> {
        let response: MessagesResponse = serde_json::from_str(body)
            .map_err(|e| GatewayError::RequestFailed(format!("JSON parse error: {}", e)))?;
        if response.stop_reason.as_deref() == Some("max_tokens") {
            debug!("Completion stopped at max_tokens");
        }
        let text: String = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");
        Ok(text)
    }

    fn map_status(status: reqwest::StatusCode, body: &str) -> GatewayError {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| status.to_string());
        match status.as_u16() {
            401 | 403 => GatewayError::MissingCredentials(message),
            404 => GatewayError::ModelNotAvailable(message),
            _ => GatewayError::RequestFailed(format!("{}: {}", status, message)),
        }
    }
}

#[async_trait]
impl LlmGateway for AnthropicGateway {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.settings.api_version)
            .json(&self.request_body(system, prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::ConnectionError(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        if !status.is_success() {
            return Err(Self::map_status(status, &body));
        }

        debug!(model = %self.settings.model, bytes = body.len(), "Completion received");
        Self::parse_success(&body)
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AnthropicSettings {
        AnthropicSettings {
            base_url: "https://api.anthropic.com/".to_string(),
            model: "claude-sonnet-4-5".to_string(),
            api_version: "2023-06-01".to_string(),
            max_tokens: 512,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_missing_key_is_rejected() {
        assert!(matches!(
            AnthropicGateway::new(settings(), None),
            Err(GatewayError::MissingCredentials(_))
        ));
        assert!(AnthropicGateway::try_new(settings(), Some("  ".into())).is_none());
    }

    #[test]
    fn test_request_body_shape() {
        let gateway = AnthropicGateway::new(settings(), Some("sk-test".into())).unwrap();
        assert_eq!(gateway.endpoint, "https://api.anthropic.com/v1/messages");
        let body = serde_json::to_value(gateway.request_body("be brief", "What is WACC?")).unwrap();
        assert_eq!(body["model"], "claude-sonnet-4-5");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "What is WACC?");
    }

    #[test]
    fn test_parse_joins_text_blocks() {
        let body = r#"{
            "content": [
                {"type": "text", "text": "WACC blends "},
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "equity and debt [1]."}
            ],
            "stop_reason": "end_turn"
        }"#;
        assert_eq!(
            AnthropicGateway::parse_success(body).unwrap(),
            "WACC blends equity and debt [1]."
        );
    }

    #[test]
    fn test_error_status_mapping() {
        let body = r#"{"type": "error", "error": {"type": "authentication_error", "message": "invalid x-api-key"}}"#;
        assert!(matches!(
            AnthropicGateway::map_status(reqwest::StatusCode::UNAUTHORIZED, body),
            GatewayError::MissingCredentials(m) if m == "invalid x-api-key"
        ));
        assert!(matches!(
            AnthropicGateway::map_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            GatewayError::RequestFailed(_)
        ));
    }
}
