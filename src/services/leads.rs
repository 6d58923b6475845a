use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::{LeadKind, LeadStatus};
use crate::entities::lead;
use crate::errors::ServiceError;
use crate::services::activity::ActivityLogService;
use crate::validation::{ContactSubmission, ValuationSubmission};

/// Valuation and contact submissions, worked as leads by the back office.
#[derive(Clone)]
pub struct LeadService {
    db: Arc<DbPool>,
    activity: ActivityLogService,
}

impl LeadService {
    pub fn new(db: Arc<DbPool>, activity: ActivityLogService) -> Self {
        Self { db, activity }
    }

    /// Persist a validated valuation request.
    #[instrument(skip(self, submission))]
    pub async fn create_valuation(
        &self,
        submission: &ValuationSubmission,
    ) -> Result<lead::Model, ServiceError> {
        let model = lead::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(LeadKind::Valuation.to_string()),
            name: Set(submission.name.clone()),
            email: Set(submission.email.clone()),
            phone: Set(Some(submission.phone.clone())),
            address: Set(Some(submission.address.clone())),
            property_id: Set(None),
            message: Set(submission.message.clone()),
            status: Set(LeadStatus::New.to_string()),
            created_at: Set(Utc::now()),
        };
        Ok(model.insert(&*self.db).await?)
    }

    /// Persist a validated contact-form message.
    #[instrument(skip(self, submission))]
    pub async fn create_contact(
        &self,
        submission: &ContactSubmission,
    ) -> Result<lead::Model, ServiceError> {
        let model = lead::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(LeadKind::Contact.to_string()),
            name: Set(submission.name.clone()),
            email: Set(submission.email.clone()),
            phone: Set(submission.phone.clone()),
            address: Set(None),
            property_id: Set(submission.property_id),
            message: Set(Some(submission.message.clone())),
            status: Set(LeadStatus::New.to_string()),
            created_at: Set(Utc::now()),
        };
        Ok(model.insert(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        kind: Option<LeadKind>,
        status: Option<LeadStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<lead::Model>, u64), ServiceError> {
        let mut query = lead::Entity::find();
        if let Some(kind) = kind {
            query = query.filter(lead::Column::Kind.eq(kind.to_string()));
        }
        if let Some(status) = status {
            query = query.filter(lead::Column::Status.eq(status.to_string()));
        }

        let total = query.clone().count(&*self.db).await?;
        let leads = query
            .order_by_desc(lead::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok((leads, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<lead::Model, ServiceError> {
        lead::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        status: LeadStatus,
        actor: &str,
    ) -> Result<lead::Model, ServiceError> {
        let lead = self.get(id).await?;
        let previous = lead.status.clone();

        let mut active: lead::ActiveModel = lead.into();
        active.status = Set(status.to_string());
        let updated = active.update(&*self.db).await?;

        self.activity
            .record(
                actor,
                "lead.status_changed",
                "lead",
                id,
                Some(serde_json::json!({ "from": previous, "to": status.to_string() })),
            )
            .await?;

        Ok(updated)
    }
}
