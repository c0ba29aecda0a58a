//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by the REST API.
//! Services are generic over repository/gateway traits, but AppState pins
//! them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;

use counsel_core::billing::BillingService;
use counsel_core::chat::ChatService;
use counsel_core::quota::ledger::QuotaLedger;
use counsel_core::realtime::{SessionRegistry, SignalRelay};
use counsel_infra::assistant::OpenAiAssistant;
use counsel_infra::config::{data_dir, load_config};
use counsel_infra::object_store::SupabaseStorage;
use counsel_infra::payment::PaystackProvider;
use counsel_infra::sqlite::{
    DatabasePool, SqliteChatRepository, SqliteFileRepository, SqliteQuotaRepository,
    SqliteSubscriptionRepository, SqliteUserRepository,
};
use counsel_types::config::CounselConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<
    SqliteChatRepository,
    SqliteFileRepository,
    OpenAiAssistant,
    SupabaseStorage,
    SqliteQuotaRepository,
    SqliteUserRepository,
>;

pub type ConcreteBillingService =
    BillingService<PaystackProvider, SqliteSubscriptionRepository, SqliteUserRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub billing_service: Arc<ConcreteBillingService>,
    pub registry: Arc<SessionRegistry>,
    pub relay: SignalRelay,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        // Initialize database
        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("counsel.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        let chat_service = build_chat_service(&config, db_pool.clone());
        let billing_service = build_billing_service(&config, db_pool.clone());

        let registry = Arc::new(SessionRegistry::new());
        let relay = SignalRelay::new(registry.clone());

        Ok(Self {
            chat_service: Arc::new(chat_service),
            billing_service: Arc::new(billing_service),
            registry,
            relay,
            data_dir,
            db_pool,
        })
    }
}

fn env_secret(name: &str) -> SecretString {
    match std::env::var(name) {
        Ok(value) => SecretString::from(value),
        Err(_) => {
            tracing::warn!("{name} is not set; the dependent service will reject requests");
            SecretString::from("")
        }
    }
}

fn build_chat_service(config: &CounselConfig, db_pool: DatabasePool) -> ConcreteChatService {
    let gateway = OpenAiAssistant::new(
        env_secret("OPENAI_API_KEY"),
        config.assistant.base_url.clone(),
        config.assistant.model.clone(),
    );
    let object_store = SupabaseStorage::new(
        config.storage.base_url.clone(),
        env_secret("SUPABASE_SERVICE_KEY"),
    );
    let ledger = QuotaLedger::new(
        SqliteQuotaRepository::new(db_pool.clone()),
        SqliteUserRepository::new(db_pool.clone()),
    );

    ChatService::new(
        SqliteChatRepository::new(db_pool.clone()),
        SqliteFileRepository::new(db_pool),
        gateway,
        object_store,
        ledger,
    )
}

fn build_billing_service(config: &CounselConfig, db_pool: DatabasePool) -> ConcreteBillingService {
    let provider = PaystackProvider::new(
        config.payment.base_url.clone(),
        env_secret("PAYSTACK_SECRET_KEY"),
    );

    BillingService::new(
        provider,
        SqliteSubscriptionRepository::new(db_pool.clone()),
        SqliteUserRepository::new(db_pool),
    )
}
