use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, QuerySelect, Set};
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::activity_log;
use crate::errors::ServiceError;

/// Records back-office activity alongside the mutations it describes.
#[derive(Clone)]
pub struct ActivityLogService {
    db: Arc<DbPool>,
}

impl ActivityLogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// `detail` is stored JSON-encoded so the feed can render structured
    /// payloads (e.g. status transitions) without parsing free text.
    #[instrument(skip(self, detail))]
    pub async fn record(
        &self,
        actor: &str,
        action: &str,
        entity_type: &str,
        entity_id: Uuid,
        detail: Option<serde_json::Value>,
    ) -> Result<(), ServiceError> {
        let entry = activity_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            actor: Set(actor.to_string()),
            action: Set(action.to_string()),
            entity_type: Set(entity_type.to_string()),
            entity_id: Set(entity_id),
            detail: Set(detail.map(|value| value.to_string())),
            created_at: Set(Utc::now()),
        };
        entry.insert(&*self.db).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_recent(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<activity_log::Model>, ServiceError> {
        let entries = activity_log::Entity::find()
            .order_by_desc(activity_log::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(entries)
    }
}
