use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

use mailcraft_mailer_schema::{campaigns, recipients};

use crate::domain::repository::{CampaignRepository, RecipientRepository};
use crate::domain::types::{Campaign, CampaignStatus, NewCampaign, NewRecipient, Recipient};
use crate::error::MailerError;

// ── Recipient repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRecipientRepository {
    pub db: DatabaseConnection,
}

impl RecipientRepository for DbRecipientRepository {
    async fn list(&self) -> Result<Vec<Recipient>, MailerError> {
        let models = recipients::Entity::find()
            .order_by_asc(recipients::Column::Id)
            .all(&self.db)
            .await
            .context("list recipients")?;
        Ok(models.into_iter().map(recipient_from_model).collect())
    }

    async fn upsert(&self, recipient: &NewRecipient) -> Result<Recipient, MailerError> {
        let model = recipients::ActiveModel {
            name: Set(recipient.name.clone()),
            email: Set(recipient.email.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        recipients::Entity::insert(model)
            .on_conflict(
                OnConflict::column(recipients::Column::Email)
                    .update_column(recipients::Column::Name)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("upsert recipient")?;

        let model = recipients::Entity::find()
            .filter(recipients::Column::Email.eq(recipient.email.as_str()))
            .one(&self.db)
            .await
            .context("load upserted recipient")?
            .context("upserted recipient missing")?;
        Ok(recipient_from_model(model))
    }

    async fn count(&self) -> Result<u64, MailerError> {
        let count = recipients::Entity::find()
            .count(&self.db)
            .await
            .context("count recipients")?;
        Ok(count)
    }
}

fn recipient_from_model(model: recipients::Model) -> Recipient {
    Recipient {
        id: model.id,
        name: model.name,
        email: model.email,
        created_at: model.created_at,
    }
}

// ── Campaign repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCampaignRepository {
    pub db: DatabaseConnection,
}

impl CampaignRepository for DbCampaignRepository {
    async fn create(&self, campaign: &NewCampaign) -> Result<Campaign, MailerError> {
        let model = campaigns::ActiveModel {
            name: Set(campaign.name.clone()),
            subject: Set(campaign.subject.clone()),
            body: Set(campaign.body.clone()),
            created_at: Set(Utc::now()),
            scheduled_at: Set(campaign.scheduled_at),
            status: Set(campaign.status.as_str().to_owned()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .context("insert campaign")?;
        campaign_from_model(model)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Campaign>, MailerError> {
        let model = campaigns::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find campaign by id")?;
        model.map(campaign_from_model).transpose()
    }

    async fn list(&self) -> Result<Vec<Campaign>, MailerError> {
        campaigns::Entity::find()
            .order_by_desc(campaigns::Column::CreatedAt)
            .order_by_desc(campaigns::Column::Id)
            .all(&self.db)
            .await
            .context("list campaigns")?
            .into_iter()
            .map(campaign_from_model)
            .collect()
    }

    async fn update_status(&self, id: i32, status: CampaignStatus) -> Result<(), MailerError> {
        let result = campaigns::Entity::update_many()
            .col_expr(campaigns::Column::Status, Expr::value(status.as_str()))
            .filter(campaigns::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("update campaign status")?;
        if result.rows_affected == 0 {
            return Err(MailerError::CampaignNotFound);
        }
        Ok(())
    }
}

fn campaign_from_model(model: campaigns::Model) -> Result<Campaign, MailerError> {
    let status = CampaignStatus::parse(&model.status)
        .with_context(|| format!("unknown campaign status {:?}", model.status))?;
    Ok(Campaign {
        id: model.id,
        name: model.name,
        subject: model.subject,
        body: model.body,
        created_at: model.created_at,
        scheduled_at: model.scheduled_at,
        status,
    })
}
