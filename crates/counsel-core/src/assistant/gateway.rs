//! AssistantGateway trait definition.
//!
//! A synchronous-looking facade over a stateful external conversational
//! service. The conversation's accumulated context is identified by an
//! opaque thread id; callers must persist the returned id to keep the
//! conversation threaded across turns.

use counsel_types::error::AssistantError;

/// One completed conversational turn.
#[derive(Debug, Clone)]
pub struct AssistantReply {
    /// The assistant's reply text.
    pub text: String,
    /// The (possibly newly created) thread id to pass on the next turn.
    pub thread_id: String,
}

/// Gateway to the external assistant service.
///
/// The concrete implementation lives in counsel-infra and hides the
/// service's asynchronous run/poll lifecycle: submit the message, trigger
/// a run, poll at a fixed interval until the run reaches a terminal state
/// (bounded, surfacing [`AssistantError::Timeout`] when the bound is
/// exhausted), then fetch the newest assistant reply.
pub trait AssistantGateway: Send + Sync {
    /// Send one user turn, resuming the thread identified by `thread_id`
    /// or starting a new one when `None`. `attachments` are external file
    /// references previously returned by [`upload_file`](Self::upload_file).
    fn converse(
        &self,
        thread_id: Option<&str>,
        text: &str,
        attachments: &[String],
    ) -> impl std::future::Future<Output = Result<AssistantReply, AssistantError>> + Send;

    /// One-shot document analysis. No thread state, no polling.
    fn analyze(
        &self,
        content: &str,
        file_name: &str,
    ) -> impl std::future::Future<Output = Result<String, AssistantError>> + Send;

    /// Upload raw document bytes; returns the provider's opaque file id
    /// used later as an attachment reference.
    fn upload_file(
        &self,
        bytes: &[u8],
        file_name: &str,
    ) -> impl std::future::Future<Output = Result<String, AssistantError>> + Send;
}
