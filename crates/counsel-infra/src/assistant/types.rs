//! Wire types for the assistant service API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct CreateAssistantRequest {
    pub model: String,
    pub name: String,
    pub instructions: String,
    pub tools: Vec<ToolRef>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAssistantResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateThreadResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ToolRef {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ToolRef {
    pub fn file_search() -> Self {
        Self {
            kind: "file_search".to_string(),
        }
    }
}

/// Attachment reference pointing at a previously uploaded file.
#[derive(Debug, Serialize)]
pub struct AttachmentRef {
    pub file_id: String,
    pub tools: Vec<ToolRef>,
}

#[derive(Debug, Serialize)]
pub struct AppendMessageRequest {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<AttachmentRef>>,
}

#[derive(Debug, Serialize)]
pub struct CreateRunRequest {
    pub assistant_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RunResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

#[derive(Debug, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesResponse {
    pub data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadMessage {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextBlock>,
}

#[derive(Debug, Deserialize)]
pub struct TextBlock {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct FileUploadResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatCompletionMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionReply,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionReply {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_response_with_error() {
        let json = r#"{
            "id": "run_1",
            "status": "failed",
            "last_error": { "code": "rate_limit_exceeded", "message": "Rate limit reached" }
        }"#;
        let run: RunResponse = serde_json::from_str(json).unwrap();
        assert_eq!(run.status, "failed");
        assert_eq!(run.last_error.unwrap().message, "Rate limit reached");
    }

    #[test]
    fn test_message_list_text_block() {
        let json = r#"{
            "data": [{
                "role": "assistant",
                "content": [{ "type": "text", "text": { "value": "Under the Land Use Act..." } }]
            }]
        }"#;
        let list: ListMessagesResponse = serde_json::from_str(json).unwrap();
        let newest = &list.data[0];
        assert_eq!(newest.role, "assistant");
        assert_eq!(newest.content[0].kind, "text");
        assert_eq!(
            newest.content[0].text.as_ref().unwrap().value,
            "Under the Land Use Act..."
        );
    }

    #[test]
    fn test_append_message_skips_empty_attachments() {
        let req = AppendMessageRequest {
            role: "user".to_string(),
            content: "hello".to_string(),
            attachments: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("attachments"));
    }
}
