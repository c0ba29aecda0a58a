//! Chat service orchestrating the usage-gated message pipeline.
//!
//! `ChatService` ties the quota ledger, conversation store, object store,
//! and assistant gateway together: admission check, persist the inbound
//! message, invoke the gateway, persist the reply, increment the ledger.
//!
//! Partial-failure policy: once admission has passed, a later failure does
//! NOT roll back earlier steps. The conversation log keeps the user's turn
//! even when the assistant never replies, and the usage counter is only
//! incremented after a successful reply. The same policy applies to the
//! upload pipeline (object store first, so a gateway failure never leaves
//! metadata pointing at bytes that were not stored).

use chrono::Utc;
use counsel_types::chat::{ChatReply, ChatSession, Message, MessageKind};
use counsel_types::error::{ChatError, RepositoryError, UploadError};
use counsel_types::file::UploadedFile;
use counsel_types::quota::Resource;
use tracing::{info, warn};
use uuid::Uuid;

use crate::assistant::gateway::AssistantGateway;
use crate::quota::ledger::QuotaLedger;
use crate::repository::chat::ChatRepository;
use crate::repository::file::FileRepository;
use crate::repository::quota::QuotaRepository;
use crate::repository::user::UserRepository;
use crate::storage::object::ObjectStore;

/// Object store bucket holding uploaded legal documents.
const DOCUMENT_BUCKET: &str = "legal-documents";

/// Orchestrates chat sessions, message sends, and document uploads.
///
/// Generic over its repository and gateway ports to maintain clean
/// architecture (counsel-core never depends on counsel-infra).
pub struct ChatService<C, F, G, O, Q, U>
where
    C: ChatRepository,
    F: FileRepository,
    G: AssistantGateway,
    O: ObjectStore,
    Q: QuotaRepository,
    U: UserRepository,
{
    chat_repo: C,
    file_repo: F,
    gateway: G,
    object_store: O,
    ledger: QuotaLedger<Q, U>,
}

impl<C, F, G, O, Q, U> ChatService<C, F, G, O, Q, U>
where
    C: ChatRepository,
    F: FileRepository,
    G: AssistantGateway,
    O: ObjectStore,
    Q: QuotaRepository,
    U: UserRepository,
{
    pub fn new(
        chat_repo: C,
        file_repo: F,
        gateway: G,
        object_store: O,
        ledger: QuotaLedger<Q, U>,
    ) -> Self {
        Self {
            chat_repo,
            file_repo,
            gateway,
            object_store,
            ledger,
        }
    }

    /// Access the quota ledger.
    pub fn ledger(&self) -> &QuotaLedger<Q, U> {
        &self.ledger
    }

    /// Access the chat repository.
    pub fn chat_repo(&self) -> &C {
        &self.chat_repo
    }

    /// Access the file repository.
    pub fn file_repo(&self) -> &F {
        &self.file_repo
    }

    // --- Session lifecycle ---

    /// Create a new named session for a user.
    pub async fn create_session(
        &self,
        user_id: Uuid,
        name: String,
    ) -> Result<ChatSession, RepositoryError> {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::now_v7(),
            user_id,
            name,
            created_at: now,
            updated_at: now,
        };
        self.chat_repo.create_session(&session).await
    }

    /// List a user's sessions, newest-updated first.
    pub async fn list_sessions(&self, user_id: &Uuid) -> Result<Vec<ChatSession>, RepositoryError> {
        self.chat_repo.list_sessions(user_id).await
    }

    /// Get a session's messages in creation order.
    pub async fn get_messages(&self, session_id: &Uuid) -> Result<Vec<Message>, RepositoryError> {
        self.chat_repo.get_messages(session_id).await
    }

    /// Number of messages in a session's log.
    pub async fn get_message_count(&self, session_id: &Uuid) -> Result<u32, RepositoryError> {
        self.chat_repo.get_message_count(session_id).await
    }

    // --- Message pipeline ---

    /// Process one inbound user message.
    ///
    /// Pipeline: admission check -> persist user turn -> gather processed
    /// attachments -> assistant gateway -> persist reply -> increment
    /// ledger -> touch session. A gateway failure after step 2 keeps the
    /// user's turn in the log and leaves usage unincremented.
    pub async fn send_message(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        content: String,
        thread_id: Option<String>,
    ) -> Result<ChatReply, ChatError> {
        self.ledger
            .user_repo()
            .get_user(&user_id)
            .await?
            .ok_or(ChatError::UserNotFound)?;

        self.chat_repo
            .get_session(&session_id)
            .await?
            .ok_or(ChatError::SessionNotFound)?;

        if !self
            .ledger
            .check_admission(&user_id, Resource::Messages)
            .await?
        {
            info!(%user_id, "message denied by admission control");
            return Err(ChatError::QuotaExceeded(Resource::Messages));
        }

        let user_message = Message {
            id: Uuid::now_v7(),
            session_id,
            kind: MessageKind::User,
            content: content.clone(),
            thread_id: thread_id.clone(),
            created_at: Utc::now(),
        };
        self.chat_repo.save_message(&user_message).await?;

        // Only files the gateway has already accepted contribute an
        // attachment reference.
        let attachments: Vec<String> = self
            .file_repo
            .list_session_files(&session_id)
            .await?
            .into_iter()
            .filter(|f| f.processed)
            .filter_map(|f| f.assistant_file_id)
            .collect();

        let reply = match self
            .gateway
            .converse(thread_id.as_deref(), &content, &attachments)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                // The user's turn stays in the log; quota is untouched.
                warn!(%session_id, error = %err, "assistant gateway failed after user turn persisted");
                return Err(ChatError::Assistant(err));
            }
        };

        let assistant_message = Message {
            id: Uuid::now_v7(),
            session_id,
            kind: MessageKind::Assistant,
            content: reply.text.clone(),
            thread_id: Some(reply.thread_id.clone()),
            created_at: Utc::now(),
        };
        self.chat_repo.save_message(&assistant_message).await?;

        self.ledger.increment(&user_id, Resource::Messages).await?;
        self.chat_repo.touch_session(&session_id).await?;

        Ok(ChatReply {
            reply: reply.text,
            thread_id: reply.thread_id,
        })
    }

    // --- Upload pipeline ---

    /// Process one document upload.
    ///
    /// Pipeline: admission check -> object store put -> gateway upload ->
    /// persist metadata (processed, with the gateway file id) -> increment
    /// ledger -> append a system message announcing the upload. The object
    /// store runs first so a gateway failure never writes metadata for
    /// bytes that were not stored; failures after admission leave prior
    /// steps' effects in place.
    pub async fn upload_document(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<UploadedFile, UploadError> {
        self.ledger
            .user_repo()
            .get_user(&user_id)
            .await?
            .ok_or(UploadError::UserNotFound)?;

        if !self
            .ledger
            .check_admission(&user_id, Resource::Documents)
            .await?
        {
            info!(%user_id, "upload denied by admission control");
            return Err(UploadError::QuotaExceeded(Resource::Documents));
        }

        let storage_path = format!(
            "{user_id}/{session_id}/{}-{file_name}",
            Utc::now().timestamp_millis()
        );
        self.object_store
            .put(DOCUMENT_BUCKET, &storage_path, bytes, content_type)
            .await?;

        let assistant_file_id = self.gateway.upload_file(bytes, file_name).await?;

        let file = UploadedFile {
            id: Uuid::now_v7(),
            user_id,
            session_id: Some(session_id),
            file_name: file_name.to_string(),
            file_size: bytes.len() as i64,
            content_type: content_type.to_string(),
            storage_path,
            processed: true,
            assistant_file_id: Some(assistant_file_id),
            created_at: Utc::now(),
        };
        let file = self.file_repo.create_file(&file).await?;

        self.ledger.increment(&user_id, Resource::Documents).await?;

        let size_mb = bytes.len() as f64 / 1024.0 / 1024.0;
        let announcement = Message {
            id: Uuid::now_v7(),
            session_id,
            kind: MessageKind::System,
            content: format!(
                "Document uploaded: {file_name} ({size_mb:.2}MB). Ready for legal analysis."
            ),
            thread_id: None,
            created_at: Utc::now(),
        };
        self.chat_repo.save_message(&announcement).await?;
        self.chat_repo.touch_session(&session_id).await?;

        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counsel_types::error::{AssistantError, ObjectStoreError};
    use counsel_types::quota::Quota;
    use counsel_types::user::{Tier, User};
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::assistant::gateway::AssistantReply;

    // --- In-memory test doubles ---

    struct MemoryUserRepo {
        users: Mutex<HashMap<Uuid, User>>,
    }

    impl UserRepository for MemoryUserRepo {
        async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
            self.users.lock().unwrap().insert(user.id, user.clone());
            Ok(user.clone())
        }

        async fn get_user(&self, user_id: &Uuid) -> Result<Option<User>, RepositoryError> {
            Ok(self.users.lock().unwrap().get(user_id).cloned())
        }

        async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn update_tier(&self, user_id: &Uuid, tier: Tier) -> Result<(), RepositoryError> {
            let mut users = self.users.lock().unwrap();
            let user = users.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
            user.tier = tier;
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryQuotaRepo {
        quotas: Mutex<HashMap<Uuid, Quota>>,
    }

    impl QuotaRepository for MemoryQuotaRepo {
        async fn get_quota(&self, user_id: &Uuid) -> Result<Option<Quota>, RepositoryError> {
            Ok(self.quotas.lock().unwrap().get(user_id).cloned())
        }

        async fn create_quota(&self, quota: &Quota) -> Result<Quota, RepositoryError> {
            self.quotas
                .lock()
                .unwrap()
                .insert(quota.user_id, quota.clone());
            Ok(quota.clone())
        }

        async fn increment_quota(
            &self,
            user_id: &Uuid,
            resource: Resource,
        ) -> Result<Quota, RepositoryError> {
            let mut quotas = self.quotas.lock().unwrap();
            let quota = quotas.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
            match resource {
                Resource::Messages => quota.messages_used += 1,
                Resource::Documents => quota.documents_used += 1,
            }
            Ok(quota.clone())
        }
    }

    #[derive(Default)]
    struct MemoryChatRepo {
        sessions: Mutex<HashMap<Uuid, ChatSession>>,
        messages: Mutex<Vec<Message>>,
    }

    impl ChatRepository for MemoryChatRepo {
        async fn create_session(
            &self,
            session: &ChatSession,
        ) -> Result<ChatSession, RepositoryError> {
            self.sessions
                .lock()
                .unwrap()
                .insert(session.id, session.clone());
            Ok(session.clone())
        }

        async fn get_session(
            &self,
            session_id: &Uuid,
        ) -> Result<Option<ChatSession>, RepositoryError> {
            Ok(self.sessions.lock().unwrap().get(session_id).cloned())
        }

        async fn list_sessions(
            &self,
            user_id: &Uuid,
        ) -> Result<Vec<ChatSession>, RepositoryError> {
            let mut sessions: Vec<_> = self
                .sessions
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.user_id == *user_id)
                .cloned()
                .collect();
            sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(sessions)
        }

        async fn touch_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
            let mut sessions = self.sessions.lock().unwrap();
            let session = sessions
                .get_mut(session_id)
                .ok_or(RepositoryError::NotFound)?;
            session.updated_at = Utc::now();
            Ok(())
        }

        async fn save_message(&self, message: &Message) -> Result<(), RepositoryError> {
            self.messages.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn get_messages(
            &self,
            session_id: &Uuid,
        ) -> Result<Vec<Message>, RepositoryError> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.session_id == *session_id)
                .cloned()
                .collect())
        }

        async fn get_message_count(&self, session_id: &Uuid) -> Result<u32, RepositoryError> {
            Ok(self.get_messages(session_id).await?.len() as u32)
        }
    }

    #[derive(Default)]
    struct MemoryFileRepo {
        files: Mutex<Vec<UploadedFile>>,
    }

    impl FileRepository for MemoryFileRepo {
        async fn create_file(
            &self,
            file: &UploadedFile,
        ) -> Result<UploadedFile, RepositoryError> {
            self.files.lock().unwrap().push(file.clone());
            Ok(file.clone())
        }

        async fn get_file(
            &self,
            file_id: &Uuid,
        ) -> Result<Option<UploadedFile>, RepositoryError> {
            Ok(self
                .files
                .lock()
                .unwrap()
                .iter()
                .find(|f| f.id == *file_id)
                .cloned())
        }

        async fn list_session_files(
            &self,
            session_id: &Uuid,
        ) -> Result<Vec<UploadedFile>, RepositoryError> {
            Ok(self
                .files
                .lock()
                .unwrap()
                .iter()
                .filter(|f| f.session_id == Some(*session_id))
                .cloned()
                .collect())
        }

        async fn list_user_files(
            &self,
            user_id: &Uuid,
        ) -> Result<Vec<UploadedFile>, RepositoryError> {
            Ok(self
                .files
                .lock()
                .unwrap()
                .iter()
                .filter(|f| f.user_id == *user_id)
                .cloned()
                .collect())
        }
    }

    /// Gateway double recording every converse call; optionally fails.
    struct MockGateway {
        fail: bool,
        /// (prior thread id, attachments) per converse call.
        calls: Mutex<Vec<(Option<String>, Vec<String>)>>,
        reply_thread: String,
    }

    impl MockGateway {
        fn ok(reply_thread: &str) -> Self {
            Self {
                fail: false,
                calls: Mutex::new(Vec::new()),
                reply_thread: reply_thread.to_string(),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: Mutex::new(Vec::new()),
                reply_thread: String::new(),
            }
        }
    }

    impl AssistantGateway for MockGateway {
        async fn converse(
            &self,
            thread_id: Option<&str>,
            _text: &str,
            attachments: &[String],
        ) -> Result<AssistantReply, AssistantError> {
            self.calls
                .lock()
                .unwrap()
                .push((thread_id.map(String::from), attachments.to_vec()));
            if self.fail {
                return Err(AssistantError::RunFailed("upstream exploded".to_string()));
            }
            Ok(AssistantReply {
                text: "Under Nigerian law...".to_string(),
                thread_id: self.reply_thread.clone(),
            })
        }

        async fn analyze(
            &self,
            _content: &str,
            _file_name: &str,
        ) -> Result<String, AssistantError> {
            Ok("analysis".to_string())
        }

        async fn upload_file(
            &self,
            _bytes: &[u8],
            _file_name: &str,
        ) -> Result<String, AssistantError> {
            if self.fail {
                return Err(AssistantError::RunFailed("upload rejected".to_string()));
            }
            Ok("file-ext-1".to_string())
        }
    }

    #[derive(Default)]
    struct MockObjectStore {
        puts: Mutex<Vec<String>>,
    }

    impl ObjectStore for MockObjectStore {
        async fn put(
            &self,
            _bucket: &str,
            path: &str,
            _bytes: &[u8],
            _content_type: &str,
        ) -> Result<String, ObjectStoreError> {
            self.puts.lock().unwrap().push(path.to_string());
            Ok(path.to_string())
        }

        async fn get(&self, _bucket: &str, _path: &str) -> Result<Vec<u8>, ObjectStoreError> {
            Ok(Vec::new())
        }

        async fn delete(&self, _bucket: &str, _path: &str) -> Result<(), ObjectStoreError> {
            Ok(())
        }

        fn public_url(&self, bucket: &str, path: &str) -> String {
            format!("https://storage.test/{bucket}/{path}")
        }
    }

    type TestService = ChatService<
        MemoryChatRepo,
        MemoryFileRepo,
        MockGateway,
        MockObjectStore,
        MemoryQuotaRepo,
        MemoryUserRepo,
    >;

    /// A service around a free-tier user with the given pre-existing
    /// message usage, plus a session to chat in.
    async fn service_with_usage(gateway: MockGateway, messages_used: i64) -> (TestService, Uuid, Uuid) {
        let user = User {
            id: Uuid::now_v7(),
            email: "ada@example.com".to_string(),
            full_name: "Ada Obi".to_string(),
            tier: Tier::Free,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let user_id = user.id;
        let user_repo = MemoryUserRepo {
            users: Mutex::new(HashMap::from([(user_id, user)])),
        };
        let quota_repo = MemoryQuotaRepo::default();
        let mut quota = Quota::zero(user_id);
        quota.messages_used = messages_used;
        quota_repo.create_quota(&quota).await.unwrap();

        let service = ChatService::new(
            MemoryChatRepo::default(),
            MemoryFileRepo::default(),
            gateway,
            MockObjectStore::default(),
            QuotaLedger::new(quota_repo, user_repo),
        );
        let session = service
            .create_session(user_id, "Land dispute".to_string())
            .await
            .unwrap();
        (service, user_id, session.id)
    }

    #[tokio::test]
    async fn test_send_happy_path() {
        let (service, user_id, session_id) =
            service_with_usage(MockGateway::ok("thread-1"), 19).await;

        let reply = service
            .send_message(session_id, user_id, "Is my lease valid?".to_string(), None)
            .await
            .unwrap();
        assert_eq!(reply.thread_id, "thread-1");
        assert!(!reply.reply.is_empty());

        let messages = service.get_messages(&session_id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].kind, MessageKind::User);
        assert_eq!(messages[1].kind, MessageKind::Assistant);
        assert_eq!(messages[1].thread_id.as_deref(), Some("thread-1"));

        let quota = service.ledger().get_usage(&user_id).await.unwrap().unwrap();
        assert_eq!(quota.messages_used, 20);
    }

    #[tokio::test]
    async fn test_send_blocked_at_limit() {
        let (service, user_id, session_id) =
            service_with_usage(MockGateway::ok("thread-1"), 20).await;

        let err = service
            .send_message(session_id, user_id, "One more?".to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::QuotaExceeded(Resource::Messages)));

        // No side effects: empty log, usage unchanged.
        assert!(service.get_messages(&session_id).await.unwrap().is_empty());
        let quota = service.ledger().get_usage(&user_id).await.unwrap().unwrap();
        assert_eq!(quota.messages_used, 20);
    }

    #[tokio::test]
    async fn test_gateway_failure_preserves_user_turn() {
        let (service, user_id, session_id) =
            service_with_usage(MockGateway::failing(), 5).await;

        let err = service
            .send_message(session_id, user_id, "Hello?".to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChatError::Assistant(AssistantError::RunFailed(_))
        ));

        let messages = service.get_messages(&session_id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::User);

        // Increment only happens after a successful reply.
        let quota = service.ledger().get_usage(&user_id).await.unwrap().unwrap();
        assert_eq!(quota.messages_used, 5);
    }

    #[tokio::test]
    async fn test_continuation_token_threads_turns() {
        let (service, user_id, session_id) =
            service_with_usage(MockGateway::ok("thread-next"), 0).await;

        let first = service
            .send_message(session_id, user_id, "First".to_string(), None)
            .await
            .unwrap();
        service
            .send_message(
                session_id,
                user_id,
                "Second".to_string(),
                Some(first.thread_id.clone()),
            )
            .await
            .unwrap();

        let calls = service.gateway.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, None);
        assert_eq!(calls[1].0.as_deref(), Some("thread-next"));
    }

    #[tokio::test]
    async fn test_processed_files_attached() {
        let (service, user_id, session_id) =
            service_with_usage(MockGateway::ok("thread-1"), 0).await;

        // One processed file with an external id, one unprocessed.
        for (processed, ext) in [(true, Some("ext-9")), (false, None)] {
            service
                .file_repo()
                .create_file(&UploadedFile {
                    id: Uuid::now_v7(),
                    user_id,
                    session_id: Some(session_id),
                    file_name: "doc.pdf".to_string(),
                    file_size: 10,
                    content_type: "application/pdf".to_string(),
                    storage_path: "p".to_string(),
                    processed,
                    assistant_file_id: ext.map(String::from),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        service
            .send_message(session_id, user_id, "Review my doc".to_string(), None)
            .await
            .unwrap();

        let calls = service.gateway.calls.lock().unwrap();
        assert_eq!(calls[0].1, vec!["ext-9".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_session_rejected() {
        let (service, user_id, _session_id) =
            service_with_usage(MockGateway::ok("thread-1"), 0).await;
        let err = service
            .send_message(Uuid::now_v7(), user_id, "hi".to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::SessionNotFound));
    }

    #[tokio::test]
    async fn test_upload_happy_path() {
        let (service, user_id, session_id) =
            service_with_usage(MockGateway::ok("thread-1"), 0).await;

        let bytes = vec![0u8; 2048];
        let file = service
            .upload_document(user_id, session_id, "lease.pdf", "application/pdf", &bytes)
            .await
            .unwrap();

        assert!(file.processed);
        assert_eq!(file.assistant_file_id.as_deref(), Some("file-ext-1"));
        assert_eq!(file.file_size, 2048);
        assert!(file.storage_path.starts_with(&format!("{user_id}/{session_id}/")));
        assert!(file.storage_path.ends_with("-lease.pdf"));

        let quota = service.ledger().get_usage(&user_id).await.unwrap().unwrap();
        assert_eq!(quota.documents_used, 1);

        // A system message announces the upload.
        let messages = service.get_messages(&session_id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::System);
        assert!(messages[0].content.contains("lease.pdf"));
    }

    #[tokio::test]
    async fn test_upload_blocked_at_document_limit() {
        let (service, user_id, session_id) =
            service_with_usage(MockGateway::ok("thread-1"), 0).await;

        // Free tier caps documents at 3.
        for i in 0..3 {
            service
                .upload_document(
                    user_id,
                    session_id,
                    &format!("doc-{i}.pdf"),
                    "application/pdf",
                    b"x",
                )
                .await
                .unwrap();
        }

        let err = service
            .upload_document(user_id, session_id, "doc-4.pdf", "application/pdf", b"x")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UploadError::QuotaExceeded(Resource::Documents)
        ));

        // Denied upload wrote nothing to the object store.
        assert_eq!(service.object_store.puts.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_message_count_tracks_pipeline() {
        let (service, user_id, session_id) =
            service_with_usage(MockGateway::ok("thread-1"), 0).await;
        assert_eq!(service.get_message_count(&session_id).await.unwrap(), 0);

        // One send appends the user turn and the assistant reply.
        service
            .send_message(session_id, user_id, "Is my lease valid?".to_string(), None)
            .await
            .unwrap();
        assert_eq!(service.get_message_count(&session_id).await.unwrap(), 2);

        // An upload appends the system announcement.
        service
            .upload_document(user_id, session_id, "lease.pdf", "application/pdf", b"x")
            .await
            .unwrap();
        assert_eq!(service.get_message_count(&session_id).await.unwrap(), 3);
    }
}
