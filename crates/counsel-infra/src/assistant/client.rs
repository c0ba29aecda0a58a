//! OpenAiAssistant -- concrete [`AssistantGateway`] implementation.
//!
//! Wraps the assistant service's thread/run lifecycle behind the gateway's
//! synchronous-looking `converse`: create or resume a thread, append the
//! user turn, start a run, poll at a fixed interval until the run reaches a
//! terminal state, then fetch the newest reply. Polling is bounded; an
//! exhausted bound surfaces [`AssistantError::Timeout`].
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use counsel_core::assistant::gateway::{AssistantGateway, AssistantReply};
use counsel_types::error::AssistantError;

use super::types::{
    AppendMessageRequest, AttachmentRef, ChatCompletionMessage, ChatCompletionRequest,
    ChatCompletionResponse, CreateAssistantRequest, CreateAssistantResponse, CreateRunRequest,
    CreateThreadResponse, FileUploadResponse, ListMessagesResponse, RunResponse, ToolRef,
};

/// System instructions for the legal assistant persona.
const ASSISTANT_INSTRUCTIONS: &str = "You are a knowledgeable legal assistant specializing in \
Nigerian law. Provide clear, accurate guidance on legal questions, citing relevant statutes and \
case law where applicable. When documents are attached, ground your analysis in their contents. \
Always remind users that your guidance is informational and not a substitute for a licensed \
lawyer.";

/// Gateway client for the external assistant service.
pub struct OpenAiAssistant {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    assistant_id: OnceCell<String>,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl OpenAiAssistant {
    /// Run states that mean "keep polling".
    const PENDING_STATES: [&'static str; 2] = ["queued", "in_progress"];

    /// Create a new assistant client.
    pub fn new(api_key: SecretString, base_url: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url,
            model,
            assistant_id: OnceCell::new(),
            poll_interval: Duration::from_secs(1),
            max_poll_attempts: 120,
        }
    }

    /// Override the poll cadence (useful for testing).
    #[allow(dead_code)]
    pub fn with_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.max_poll_attempts = max_attempts;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(self.api_key.expose_secret())
            .header("OpenAI-Beta", "assistants=v2")
    }

    /// Decode a response, mapping non-success statuses to [`AssistantError::Api`].
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AssistantError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AssistantError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| AssistantError::Http(e.to_string()))
    }

    /// The assistant id, created lazily on first use and cached for the
    /// process lifetime.
    async fn ensure_assistant(&self) -> Result<&str, AssistantError> {
        let id = self
            .assistant_id
            .get_or_try_init(|| async {
                let response = self
                    .request(reqwest::Method::POST, "/assistants")
                    .json(&CreateAssistantRequest {
                        model: self.model.clone(),
                        name: "Legal Assistant".to_string(),
                        instructions: ASSISTANT_INSTRUCTIONS.to_string(),
                        tools: vec![ToolRef::file_search()],
                    })
                    .send()
                    .await
                    .map_err(|e| AssistantError::Http(e.to_string()))?;
                let created: CreateAssistantResponse = Self::decode(response).await?;
                debug!(assistant_id = %created.id, "assistant created");
                Ok::<_, AssistantError>(created.id)
            })
            .await?;
        Ok(id)
    }

    async fn create_thread(&self) -> Result<String, AssistantError> {
        let response = self
            .request(reqwest::Method::POST, "/threads")
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| AssistantError::Http(e.to_string()))?;
        let thread: CreateThreadResponse = Self::decode(response).await?;
        Ok(thread.id)
    }

    async fn append_user_message(
        &self,
        thread_id: &str,
        text: &str,
        attachments: &[String],
    ) -> Result<(), AssistantError> {
        let attachments = if attachments.is_empty() {
            None
        } else {
            Some(
                attachments
                    .iter()
                    .map(|file_id| AttachmentRef {
                        file_id: file_id.clone(),
                        tools: vec![ToolRef::file_search()],
                    })
                    .collect(),
            )
        };

        let response = self
            .request(reqwest::Method::POST, &format!("/threads/{thread_id}/messages"))
            .json(&AppendMessageRequest {
                role: "user".to_string(),
                content: text.to_string(),
                attachments,
            })
            .send()
            .await
            .map_err(|e| AssistantError::Http(e.to_string()))?;
        Self::decode::<serde_json::Value>(response).await?;
        Ok(())
    }

    /// Poll the run at a fixed interval until it reaches a terminal state.
    async fn wait_for_run(&self, thread_id: &str, run_id: &str) -> Result<(), AssistantError> {
        for attempt in 0..self.max_poll_attempts {
            let response = self
                .request(
                    reqwest::Method::GET,
                    &format!("/threads/{thread_id}/runs/{run_id}"),
                )
                .send()
                .await
                .map_err(|e| AssistantError::Http(e.to_string()))?;
            let run: RunResponse = Self::decode(response).await?;

            if run.status == "completed" {
                debug!(run_id, attempt, "run completed");
                return Ok(());
            }
            if !Self::PENDING_STATES.contains(&run.status.as_str()) {
                let detail = run
                    .last_error
                    .map(|e| e.message)
                    .unwrap_or_else(|| run.status.clone());
                warn!(run_id, status = %run.status, "run reached failure state");
                return Err(AssistantError::RunFailed(detail));
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        warn!(run_id, attempts = self.max_poll_attempts, "run poll bound exhausted");
        Err(AssistantError::Timeout)
    }

    /// Fetch the newest message on the thread; it must be an assistant-
    /// authored text reply.
    async fn latest_reply(&self, thread_id: &str) -> Result<String, AssistantError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/threads/{thread_id}/messages?limit=1"),
            )
            .send()
            .await
            .map_err(|e| AssistantError::Http(e.to_string()))?;
        let list: ListMessagesResponse = Self::decode(response).await?;

        let newest = list.data.into_iter().next().ok_or(AssistantError::NoReply)?;
        if newest.role != "assistant" {
            return Err(AssistantError::NoReply);
        }
        newest
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .map(|text| text.value)
            .ok_or(AssistantError::NoReply)
    }
}

impl AssistantGateway for OpenAiAssistant {
    async fn converse(
        &self,
        thread_id: Option<&str>,
        text: &str,
        attachments: &[String],
    ) -> Result<AssistantReply, AssistantError> {
        let assistant_id = self.ensure_assistant().await?.to_string();

        let thread_id = match thread_id {
            Some(id) => id.to_string(),
            None => self.create_thread().await?,
        };

        self.append_user_message(&thread_id, text, attachments)
            .await?;

        let response = self
            .request(reqwest::Method::POST, &format!("/threads/{thread_id}/runs"))
            .json(&CreateRunRequest { assistant_id })
            .send()
            .await
            .map_err(|e| AssistantError::Http(e.to_string()))?;
        let run: RunResponse = Self::decode(response).await?;

        self.wait_for_run(&thread_id, &run.id).await?;
        let text = self.latest_reply(&thread_id).await?;

        Ok(AssistantReply { text, thread_id })
    }

    async fn analyze(&self, content: &str, file_name: &str) -> Result<String, AssistantError> {
        let response = self
            .request(reqwest::Method::POST, "/chat/completions")
            .json(&ChatCompletionRequest {
                model: self.model.clone(),
                messages: vec![
                    ChatCompletionMessage {
                        role: "system".to_string(),
                        content: ASSISTANT_INSTRUCTIONS.to_string(),
                    },
                    ChatCompletionMessage {
                        role: "user".to_string(),
                        content: format!(
                            "Analyze the following legal document ({file_name}) and summarize \
                             its key terms, obligations, and any clauses that deserve \
                             attention:\n\n{content}"
                        ),
                    },
                ],
            })
            .send()
            .await
            .map_err(|e| AssistantError::Http(e.to_string()))?;
        let completion: ChatCompletionResponse = Self::decode(response).await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(AssistantError::NoReply)
    }

    async fn upload_file(&self, bytes: &[u8], file_name: &str) -> Result<String, AssistantError> {
        let part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| AssistantError::Http(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", "assistants")
            .part("file", part);

        let response = self
            .request(reqwest::Method::POST, "/files")
            .multipart(form)
            .send()
            .await
            .map_err(|e| AssistantError::Http(e.to_string()))?;
        let uploaded: FileUploadResponse = Self::decode(response).await?;

        debug!(file_id = %uploaded.id, file_name, "file uploaded to assistant service");
        Ok(uploaded.id)
    }
}
