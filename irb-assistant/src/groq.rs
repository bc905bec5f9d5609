use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::analysis::CompletionProvider;
use crate::analysis::prompt::build_comparison_prompt;
use crate::config::CompletionConfig;
use crate::error::{CompletionError, ServiceError, ServiceResult};

/// Returned when the endpoint answers successfully but carries no message text.
pub const EMPTY_COMPLETION_FALLBACK: &str = "No response from Groq.";

/// Groq chat-completion client (OpenAI-compatible API)
pub struct GroqClient {
    client: Client,
    config: CompletionConfig,
}

impl GroqClient {
    /// Create a new Groq client
    pub fn new(config: CompletionConfig) -> ServiceResult<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder.build().map_err(|e| {
            ServiceError::Completion(CompletionError::Connection {
                url: config.base_url.clone(),
                source: e,
            })
        })?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one non-streaming chat completion request and return the first choice's text
    pub async fn generate_simple(&self, messages: Vec<ChatMessage>) -> ServiceResult<String> {
        let api_key = self
            .config
            .resolve_api_key()
            .ok_or(CompletionError::MissingApiKey)?;

        let url = self.completions_url();
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
        };

        debug!(url = %url, model = %self.config.model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Connection {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        info!(status = status.as_u16(), "Chat completion response received");

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %message, "Chat completion request failed");
            return Err(ServiceError::Completion(CompletionError::ApiRequest {
                status: status.as_u16(),
                message,
            }));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse { source: e })?;

        Ok(completion.into_first_content().unwrap_or_else(|| {
            warn!("Chat completion carried no message content");
            EMPTY_COMPLETION_FALLBACK.to_string()
        }))
    }
}

impl CompletionProvider for GroqClient {
    fn complete<'a>(
        &'a self,
        form_text: &'a str,
        policy_text: &'a str,
    ) -> BoxFuture<'a, ServiceResult<String>> {
        async move {
            let prompt = build_comparison_prompt(form_text, policy_text);
            self.generate_simple(vec![ChatMessage::user(prompt)]).await
        }
        .boxed()
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

// Internal API types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionResponse {
    fn into_first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .flatten()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKey;
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    #[derive(Default)]
    struct Captured {
        authorization: Option<String>,
        body: Option<serde_json::Value>,
    }

    /// Serve a canned response on an ephemeral port, recording the request.
    async fn mock_endpoint(
        status: StatusCode,
        body: &'static str,
    ) -> (String, Arc<Mutex<Captured>>) {
        let captured = Arc::new(Mutex::new(Captured::default()));
        let recorder = captured.clone();

        let app = Router::new().route(
            "/openai/v1/chat/completions",
            post(move |headers: HeaderMap, Json(request): Json<serde_json::Value>| {
                let recorder = recorder.clone();
                async move {
                    let mut captured = recorder.lock().unwrap();
                    captured.authorization = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    captured.body = Some(request);
                    (status, [("content-type", "application/json")], body)
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/openai/v1", addr), captured)
    }

    fn client_for(base_url: String) -> GroqClient {
        GroqClient::new(CompletionConfig {
            base_url,
            model: "mixtral-8x7b-32768".to_string(),
            temperature: 0.3,
            api_key: Some(ApiKey::new("gsk_test_key")),
            request_timeout_secs: Some(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let (url, captured) = mock_endpoint(
            StatusCode::OK,
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"**Compliant Sections:** all"}}]}"#,
        )
        .await;
        let client = client_for(url);

        let result = client.complete("form text", "policy text").await.unwrap();
        assert_eq!(result, "**Compliant Sections:** all");

        let captured = captured.lock().unwrap();
        assert_eq!(
            captured.authorization.as_deref(),
            Some("Bearer gsk_test_key")
        );
        let body = captured.body.as_ref().unwrap();
        assert_eq!(body["model"], "mixtral-8x7b-32768");
        assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        let content = messages[0]["content"].as_str().unwrap();
        assert!(content.contains("form text"));
        assert!(content.contains("policy text"));
    }

    #[tokio::test]
    async fn test_missing_content_falls_back() {
        let (url, _) = mock_endpoint(StatusCode::OK, r#"{"choices":[]}"#).await;
        let client = client_for(url);

        let result = client.complete("form", "policy").await.unwrap();
        assert_eq!(result, EMPTY_COMPLETION_FALLBACK);
    }

    #[tokio::test]
    async fn test_null_content_falls_back() {
        let (url, _) = mock_endpoint(
            StatusCode::OK,
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
        )
        .await;
        let client = client_for(url);

        let result = client.complete("form", "policy").await.unwrap();
        assert_eq!(result, "No response from Groq.");
    }

    #[tokio::test]
    async fn test_null_choices_falls_back() {
        let (url, _) =
            mock_endpoint(StatusCode::OK, r#"{"id":"chatcmpl-1","choices":null}"#).await;
        let client = client_for(url);

        let result = client.complete("form", "policy").await.unwrap();
        assert_eq!(result, EMPTY_COMPLETION_FALLBACK);
    }

    #[tokio::test]
    async fn test_missing_choices_and_message_fall_back() {
        for body in [
            r#"{}"#,
            r#"{"choices":[{"index":0}]}"#,
            r#"{"choices":[{"message":{"content":""}}]}"#,
        ] {
            let (url, _) = mock_endpoint(StatusCode::OK, body).await;
            let client = client_for(url);

            let result = client.complete("form", "policy").await.unwrap();
            assert_eq!(result, EMPTY_COMPLETION_FALLBACK, "body: {}", body);
        }
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let (url, _) = mock_endpoint(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Invalid API Key"}}"#,
        )
        .await;
        let client = client_for(url);

        match client.complete("form", "policy").await {
            Err(ServiceError::Completion(CompletionError::ApiRequest { status, message })) => {
                assert_eq!(status, 401);
                assert!(message.contains("Invalid API Key"));
            }
            other => panic!("Expected ApiRequest error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_success_is_invalid_response() {
        let (url, _) = mock_endpoint(StatusCode::OK, "<html>gateway</html>").await;
        let client = client_for(url);

        assert!(matches!(
            client.complete("form", "policy").await,
            Err(ServiceError::Completion(CompletionError::InvalidResponse { .. }))
        ));
    }

    #[tokio::test]
    async fn test_missing_api_key_sends_nothing() {
        let (url, captured) = mock_endpoint(StatusCode::OK, r#"{"choices":[]}"#).await;
        let mut config = client_for(url).config;
        config.api_key = Some(ApiKey::new(""));
        let client = GroqClient::new(config).unwrap();

        if std::env::var(crate::config::API_KEY_ENV_VAR).is_err() {
            assert!(matches!(
                client.complete("form", "policy").await,
                Err(ServiceError::Completion(CompletionError::MissingApiKey))
            ));
            assert!(captured.lock().unwrap().body.is_none());
        }
    }

    #[test]
    fn test_completions_url() {
        let client = client_for("https://api.groq.com/openai/v1/".to_string());
        assert_eq!(
            client.completions_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }
}
