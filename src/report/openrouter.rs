use crate::error::{RecapError, Result};
use crate::report::prompt::SYSTEM_INSTRUCTION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.2-3b-instruct:free";
const APP_REFERER: &str = "https://github.com/yourusername/worklog-recap";
const APP_TITLE: &str = "Jira Worklog Resume Generator";

/// OpenRouter chat completions client
pub struct OpenRouterClient {
    client: Client,
    api_url: String,
    model: String,
}

impl OpenRouterClient {
    /// Create a new OpenRouter client
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_url: OPENROUTER_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Set the model to use
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Point the client at a different endpoint
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }

    /// Generate report text from a prompt
    pub async fn generate(&self, prompt: &str, api_key: &str) -> Result<String> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(RecapError::ApiKeyMissing);
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        tracing::debug!(model = %self.model, url = %self.api_url, "requesting completion");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", APP_REFERER)
            .header("X-Title", APP_TITLE)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            tracing::debug!(%status, body = %error_text, "completion request rejected");
            return Err(RecapError::generation(format!(
                "request failed with status {}",
                status
            )));
        }

        let chat_response: ChatResponse = response.json().await?;

        // Extract text from first choice
        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| RecapError::generation("no choices in response"))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::Server) -> OpenRouterClient {
        OpenRouterClient::new(None)
            .unwrap()
            .with_api_url(format!("{}/api/v1/chat/completions", server.url()))
    }

    #[test]
    fn test_client_builder() {
        let client = OpenRouterClient::new(None)
            .unwrap()
            .with_model("openai/gpt-4o-mini".to_string());

        assert_eq!(client.model, "openai/gpt-4o-mini");
        assert_eq!(client.api_url, OPENROUTER_API_URL);
    }

    #[tokio::test]
    async fn test_generate_returns_trimmed_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/chat/completions")
            .match_header("authorization", "Bearer sk-or-v1-test")
            .match_body(Matcher::Json(json!({
                "model": DEFAULT_MODEL,
                "messages": [
                    {"role": "system", "content": SYSTEM_INSTRUCTION},
                    {"role": "user", "content": "Summarize PROJ-1"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "  OVERVIEW:\n* Shipped login  \n"}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let text = client_for(&server)
            .generate("Summarize PROJ-1", "sk-or-v1-test")
            .await
            .unwrap();

        assert_eq!(text, "OVERVIEW:\n* Shipped login");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_without_key_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = client_for(&server).generate("prompt", "").await.unwrap_err();

        assert!(matches!(err, RecapError::ApiKeyMissing));
        assert!(err.is_configuration());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/chat/completions")
            .with_status(429)
            .with_body(r#"{"error": {"message": "Rate limit exceeded"}}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .generate("prompt", "sk-or-v1-test")
            .await
            .unwrap_err();

        assert!(matches!(err, RecapError::GenerationFailed(_)));
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_generate_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .generate("prompt", "sk-or-v1-test")
            .await
            .unwrap_err();

        assert!(matches!(err, RecapError::GenerationFailed(_)));
    }
}
