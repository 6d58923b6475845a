use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::InvoiceStatus;
use crate::entities::invoice_request;
use crate::errors::ServiceError;
use crate::services::activity::ActivityLogService;
use crate::validation::InvoiceSubmission;

/// Invoice requests submitted by clients and worked by agents.
#[derive(Clone)]
pub struct InvoiceRequestService {
    db: Arc<DbPool>,
    activity: ActivityLogService,
}

impl InvoiceRequestService {
    pub fn new(db: Arc<DbPool>, activity: ActivityLogService) -> Self {
        Self { db, activity }
    }

    /// Persist a validated invoice request for a client.
    #[instrument(skip(self, submission))]
    pub async fn create(
        &self,
        client_id: Uuid,
        submission: &InvoiceSubmission,
        actor: &str,
    ) -> Result<invoice_request::Model, ServiceError> {
        let now = Utc::now();
        let model = invoice_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            client_id: Set(client_id),
            invoice_type: Set(submission.invoice_type.to_string()),
            amount: Set(submission.amount),
            notes: Set(submission.notes.clone()),
            status: Set(InvoiceStatus::Pending.to_string()),
            processed_at: Set(None),
            processed_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&*self.db).await?;

        self.activity
            .record(actor, "invoice_request.created", "invoice_request", created.id, None)
            .await?;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        status: Option<InvoiceStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<invoice_request::Model>, u64), ServiceError> {
        let mut query = invoice_request::Entity::find();
        if let Some(status) = status {
            query = query.filter(invoice_request::Column::Status.eq(status.to_string()));
        }

        let total = query.clone().count(&*self.db).await?;
        let requests = query
            .order_by_desc(invoice_request::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok((requests, total))
    }

    #[instrument(skip(self))]
    pub async fn list_for_client(
        &self,
        client_id: Uuid,
    ) -> Result<Vec<invoice_request::Model>, ServiceError> {
        let requests = invoice_request::Entity::find()
            .filter(invoice_request::Column::ClientId.eq(client_id))
            .order_by_desc(invoice_request::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(requests)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<invoice_request::Model, ServiceError> {
        invoice_request::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Fetch one of the client's own requests. A request owned by someone
    /// else is indistinguishable from a missing one.
    #[instrument(skip(self))]
    pub async fn get_for_client(
        &self,
        client_id: Uuid,
        id: Uuid,
    ) -> Result<invoice_request::Model, ServiceError> {
        invoice_request::Entity::find_by_id(id)
            .filter(invoice_request::Column::ClientId.eq(client_id))
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Transition a request's status.
    ///
    /// Moving into a terminal status stamps `processed_at` and
    /// `processed_by`. A transition to the current status is a no-op and
    /// stamps nothing; a transition out of a terminal status is a conflict.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        next: InvoiceStatus,
        admin_id: Uuid,
    ) -> Result<invoice_request::Model, ServiceError> {
        let request = self.get(id).await?;

        let current = InvoiceStatus::from_str(&request.status)
            .map_err(|_| ServiceError::internal(format!("corrupt invoice status: {}", request.status)))?;

        if next == current {
            return Ok(request);
        }
        if current.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "invoice request already {}",
                current
            )));
        }

        let mut active: invoice_request::ActiveModel = request.into();
        active.status = Set(next.to_string());
        active.updated_at = Set(Utc::now());
        if next.is_terminal() {
            active.processed_at = Set(Some(Utc::now()));
            active.processed_by = Set(Some(admin_id));
        }
        let updated = active.update(&*self.db).await?;

        self.activity
            .record(
                &admin_id.to_string(),
                "invoice_request.status_changed",
                "invoice_request",
                id,
                Some(serde_json::json!({
                    "from": current.to_string(),
                    "to": next.to_string(),
                })),
            )
            .await?;

        Ok(updated)
    }
}
