use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::{PropertyStatus, PropertyType};
use crate::entities::{property, property_image};
use crate::errors::ServiceError;
use crate::services::activity::ActivityLogService;
use crate::storage::ObjectStorage;
use crate::validation::{ImageMetadata, PropertyDraft};

/// Filters for the public listing search.
#[derive(Debug, Default, Clone)]
pub struct PropertyFilters {
    pub city: Option<String>,
    pub property_type: Option<PropertyType>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_bedrooms: Option<i16>,
}

/// Listings: public reads, portal submissions and back-office management.
#[derive(Clone)]
pub struct PropertyService {
    db: Arc<DbPool>,
    activity: ActivityLogService,
    storage: Arc<dyn ObjectStorage>,
}

impl PropertyService {
    pub fn new(
        db: Arc<DbPool>,
        activity: ActivityLogService,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            db,
            activity,
            storage,
        }
    }

    /// Create a listing. Admin-created listings may carry an explicit
    /// status; portal submissions always land as pending review.
    #[instrument(skip(self, draft))]
    pub async fn create(
        &self,
        owner_id: Option<Uuid>,
        draft: &PropertyDraft,
        status: PropertyStatus,
        published: bool,
        actor: &str,
    ) -> Result<property::Model, ServiceError> {
        let now = Utc::now();
        let model = property::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
            title: Set(draft.title.clone()),
            description: Set(draft.description.clone()),
            price: Set(draft.price),
            bedrooms: Set(draft.bedrooms),
            bathrooms: Set(draft.bathrooms),
            square_meters: Set(draft.square_meters),
            year_built: Set(draft.year_built),
            floor: Set(draft.floor),
            property_type: Set(draft.property_type.to_string()),
            status: Set(status.to_string()),
            address: Set(draft.address.clone()),
            city: Set(draft.city.clone()),
            published: Set(published),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&*self.db).await?;

        self.activity
            .record(actor, "property.created", "property", created.id, None)
            .await?;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<property::Model, ServiceError> {
        property::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Public detail view: unpublished listings do not exist.
    #[instrument(skip(self))]
    pub async fn get_published(&self, id: Uuid) -> Result<property::Model, ServiceError> {
        property::Entity::find_by_id(id)
            .filter(property::Column::Published.eq(true))
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// One of the owner's own listings; someone else's listing is
    /// indistinguishable from a missing one.
    #[instrument(skip(self))]
    pub async fn get_for_owner(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<property::Model, ServiceError> {
        property::Entity::find_by_id(id)
            .filter(property::Column::OwnerId.eq(owner_id))
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn list_published(
        &self,
        filters: &PropertyFilters,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<property::Model>, u64), ServiceError> {
        let mut query =
            property::Entity::find().filter(property::Column::Published.eq(true));

        if let Some(city) = &filters.city {
            query = query.filter(property::Column::City.eq(city.clone()));
        }
        if let Some(property_type) = filters.property_type {
            query = query.filter(property::Column::PropertyType.eq(property_type.to_string()));
        }
        if let Some(min_price) = filters.min_price {
            query = query.filter(property::Column::Price.gte(min_price));
        }
        if let Some(max_price) = filters.max_price {
            query = query.filter(property::Column::Price.lte(max_price));
        }
        if let Some(min_bedrooms) = filters.min_bedrooms {
            query = query.filter(property::Column::Bedrooms.gte(min_bedrooms));
        }

        let total = query.clone().count(&*self.db).await?;
        let properties = query
            .order_by_desc(property::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok((properties, total))
    }

    #[instrument(skip(self))]
    pub async fn list_all(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<property::Model>, u64), ServiceError> {
        let total = property::Entity::find().count(&*self.db).await?;
        let properties = property::Entity::find()
            .order_by_desc(property::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok((properties, total))
    }

    #[instrument(skip(self))]
    pub async fn list_for_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<property::Model>, ServiceError> {
        let properties = property::Entity::find()
            .filter(property::Column::OwnerId.eq(owner_id))
            .order_by_desc(property::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(properties)
    }

    /// Back-office update of any listing.
    #[instrument(skip(self, draft))]
    pub async fn update(
        &self,
        id: Uuid,
        draft: &PropertyDraft,
        actor: &str,
    ) -> Result<property::Model, ServiceError> {
        let current = self.get(id).await?;
        let updated = self.apply_draft(current, draft, true).await?;

        self.activity
            .record(actor, "property.updated", "property", id, None)
            .await?;

        Ok(updated)
    }

    /// Portal edit of the caller's own listing. Owners cannot set status.
    #[instrument(skip(self, draft))]
    pub async fn update_for_owner(
        &self,
        owner_id: Uuid,
        id: Uuid,
        draft: &PropertyDraft,
        actor: &str,
    ) -> Result<property::Model, ServiceError> {
        let current = self.get_for_owner(owner_id, id).await?;
        let updated = self.apply_draft(current, draft, false).await?;

        self.activity
            .record(actor, "property.updated", "property", id, None)
            .await?;

        Ok(updated)
    }

    async fn apply_draft(
        &self,
        current: property::Model,
        draft: &PropertyDraft,
        allow_status: bool,
    ) -> Result<property::Model, ServiceError> {
        let mut active: property::ActiveModel = current.into();
        active.title = Set(draft.title.clone());
        active.description = Set(draft.description.clone());
        active.price = Set(draft.price);
        active.bedrooms = Set(draft.bedrooms);
        active.bathrooms = Set(draft.bathrooms);
        active.square_meters = Set(draft.square_meters);
        active.year_built = Set(draft.year_built);
        active.floor = Set(draft.floor);
        active.property_type = Set(draft.property_type.to_string());
        active.address = Set(draft.address.clone());
        active.city = Set(draft.city.clone());
        if allow_status {
            if let Some(status) = draft.status {
                active.status = Set(status.to_string());
            }
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, actor: &str) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        existing.delete(&*self.db).await?;

        self.activity
            .record(actor, "property.deleted", "property", id, None)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn publish(&self, id: Uuid, actor: &str) -> Result<property::Model, ServiceError> {
        self.set_published(id, true, actor).await
    }

    #[instrument(skip(self))]
    pub async fn unpublish(&self, id: Uuid, actor: &str) -> Result<property::Model, ServiceError> {
        self.set_published(id, false, actor).await
    }

    async fn set_published(
        &self,
        id: Uuid,
        published: bool,
        actor: &str,
    ) -> Result<property::Model, ServiceError> {
        let current = self.get(id).await?;
        let mut active: property::ActiveModel = current.into();
        active.published = Set(published);
        if published {
            active.status = Set(PropertyStatus::Active.to_string());
        } else {
            active.status = Set(PropertyStatus::Withdrawn.to_string());
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        let action = if published {
            "property.published"
        } else {
            "property.unpublished"
        };
        self.activity
            .record(actor, action, "property", id, None)
            .await?;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn images(
        &self,
        property_id: Uuid,
    ) -> Result<Vec<property_image::Model>, ServiceError> {
        let images = property_image::Entity::find()
            .filter(property_image::Column::PropertyId.eq(property_id))
            .order_by_asc(property_image::Column::Position)
            .all(&*self.db)
            .await?;
        Ok(images)
    }

    /// Attach a validated image to one of the owner's listings.
    #[instrument(skip(self, metadata))]
    pub async fn add_image_for_owner(
        &self,
        owner_id: Uuid,
        property_id: Uuid,
        metadata: &ImageMetadata,
        actor: &str,
    ) -> Result<property_image::Model, ServiceError> {
        // Ownership first; the masked NotFound covers foreign listings.
        self.get_for_owner(owner_id, property_id).await?;

        let image_id = Uuid::new_v4();
        let key = format!("properties/{}/{}", property_id, image_id);
        let url = self
            .storage
            .store(&key, metadata)
            .await
            .map_err(|e| ServiceError::ExternalService(e.to_string()))?;

        let position = property_image::Entity::find()
            .filter(property_image::Column::PropertyId.eq(property_id))
            .count(&*self.db)
            .await? as i32;

        let model = property_image::ActiveModel {
            id: Set(image_id),
            property_id: Set(property_id),
            file_name: Set(metadata.file_name.clone()),
            content_type: Set(metadata.content_type.clone()),
            size_bytes: Set(metadata.size_bytes as i64),
            url: Set(url),
            position: Set(position),
            created_at: Set(Utc::now()),
        };
        let created = model.insert(&*self.db).await?;

        self.activity
            .record(actor, "property.image_added", "property", property_id, None)
            .await?;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn remove_image_for_owner(
        &self,
        owner_id: Uuid,
        property_id: Uuid,
        image_id: Uuid,
        actor: &str,
    ) -> Result<(), ServiceError> {
        self.get_for_owner(owner_id, property_id).await?;

        let image = property_image::Entity::find_by_id(image_id)
            .filter(property_image::Column::PropertyId.eq(property_id))
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let key = format!("properties/{}/{}", property_id, image.id);
        self.storage
            .remove(&key)
            .await
            .map_err(|e| ServiceError::ExternalService(e.to_string()))?;

        image.delete(&*self.db).await?;

        self.activity
            .record(actor, "property.image_removed", "property", property_id, None)
            .await?;
        Ok(())
    }
}
