use sea_orm::DatabaseConnection;

use mailcraft_core::retry::RetryPolicy;

use crate::domain::types::Participant;
use crate::infra::db::{DbCampaignRepository, DbRecipientRepository};
use crate::infra::nylas::NylasClient;
use crate::infra::openai::OpenAiClient;
use crate::infra::retry::RetryingMailProvider;
use crate::infra::session::SessionStore;
use crate::scheduler::CampaignScheduler;
use crate::usecase::assist::AssistUseCase;
use crate::usecase::campaign::FireCampaignUseCase;
use crate::usecase::session::SessionUseCase;

/// Job handler the scheduler runs with in production.
pub type CampaignJobRunner =
    FireCampaignUseCase<DbCampaignRepository, DbRecipientRepository, RetryingMailProvider<NylasClient>>;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub sessions: SessionStore,
    pub nylas: NylasClient,
    pub openai: OpenAiClient,
    pub scheduler: CampaignScheduler,
    pub retry: RetryPolicy,
    pub session_ttl_secs: u64,
    pub cookie_secure: bool,
    /// Reply-to on bulk and campaign sends.
    pub sender: Option<Participant>,
    /// Source text of the recurrence rule, echoed to clients.
    pub recurrence_expr: String,
}

impl AppState {
    pub fn recipient_repo(&self) -> DbRecipientRepository {
        DbRecipientRepository {
            db: self.db.clone(),
        }
    }

    pub fn campaign_repo(&self) -> DbCampaignRepository {
        DbCampaignRepository {
            db: self.db.clone(),
        }
    }

    /// Provider client with retry applied to every call.
    pub fn mail_provider(&self) -> RetryingMailProvider<NylasClient> {
        RetryingMailProvider::new(self.nylas.clone(), self.retry)
    }

    pub fn assist(&self) -> AssistUseCase<OpenAiClient> {
        AssistUseCase {
            completion: self.openai.clone(),
        }
    }

    pub fn session(&self) -> SessionUseCase<SessionStore> {
        SessionUseCase {
            grants: self.sessions.clone(),
        }
    }

    pub fn campaign_runner(&self) -> CampaignJobRunner {
        FireCampaignUseCase {
            campaigns: self.campaign_repo(),
            recipients: self.recipient_repo(),
            provider: self.mail_provider(),
            sender: self.sender.clone(),
        }
    }
}
