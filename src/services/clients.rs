use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::client;
use crate::errors::ServiceError;

/// Client profiles, keyed by the external identity provider's subject.
#[derive(Clone)]
pub struct ClientService {
    db: Arc<DbPool>,
}

impl ClientService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Option<client::Model>, ServiceError> {
        Ok(client::Entity::find_by_id(id).one(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_by_identity(
        &self,
        identity_id: &str,
    ) -> Result<Option<client::Model>, ServiceError> {
        let found = client::Entity::find()
            .filter(client::Column::IdentityId.eq(identity_id))
            .one(&*self.db)
            .await?;
        Ok(found)
    }

    /// Portal access requires a provisioned profile; a signed-in identity
    /// without one is rejected, not auto-created.
    pub async fn require_by_identity(
        &self,
        identity_id: &str,
    ) -> Result<client::Model, ServiceError> {
        self.get_by_identity(identity_id)
            .await?
            .ok_or(ServiceError::Forbidden)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<client::Model>, u64), ServiceError> {
        let total = client::Entity::find().count(&*self.db).await?;
        let clients = client::Entity::find()
            .order_by_desc(client::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok((clients, total))
    }

    /// Provision a profile for an identity. Used by back-office tooling and
    /// the test harness; the public surface never creates clients.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        identity_id: &str,
        name: &str,
        email: &str,
        phone: Option<String>,
    ) -> Result<client::Model, ServiceError> {
        let model = client::ActiveModel {
            id: Set(Uuid::new_v4()),
            identity_id: Set(identity_id.to_string()),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            phone: Set(phone),
            created_at: Set(Utc::now()),
        };
        Ok(model.insert(&*self.db).await?)
    }
}
