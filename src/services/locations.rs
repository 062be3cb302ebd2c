use crate::{
    db::DbPool,
    entities::{
        inventory_item::{self, Entity as InventoryItem},
        location::{self, Entity as Location, LocationType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{optional_text, required_text},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLocationInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLocationInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub location_type: Option<LocationType>,
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationFilter {
    pub active: Option<bool>,
    #[serde(rename = "type")]
    #[param(value_type = Option<String>, example = "warehouse")]
    pub location_type: Option<LocationType>,
}

/// Substring search over active locations
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationSearch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    #[param(value_type = Option<String>, example = "store")]
    pub location_type: Option<LocationType>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Location registry
pub struct LocationService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl LocationService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_location(
        &self,
        input: CreateLocationInput,
    ) -> Result<location::Model, ServiceError> {
        let name = required_text("name", &input.name)?;
        let db = &*self.db_pool;
        ensure_active_name_free(db, &name, None).await?;

        let now = Utc::now();
        let location = location::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            location_type: Set(input.location_type),
            address: Set(optional_text(input.address)),
            city: Set(optional_text(input.city)),
            country: Set(optional_text(input.country)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        self.event_sender
            .send_or_log(Event::LocationCreated(location.id))
            .await;
        info!(
            location_id = %location.id,
            location_type = %location.location_type,
            "Location created"
        );
        Ok(location)
    }

    /// All locations ordered by type, then name
    #[instrument(skip(self))]
    pub async fn list_locations(
        &self,
        filter: LocationFilter,
    ) -> Result<Vec<location::Model>, ServiceError> {
        let mut query = Location::find();
        if let Some(active) = filter.active {
            query = query.filter(location::Column::IsActive.eq(active));
        }
        if let Some(location_type) = filter.location_type {
            query = query.filter(location::Column::LocationType.eq(location_type));
        }

        Ok(query
            .order_by_asc(location::Column::LocationType)
            .order_by_asc(location::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_location(&self, id: Uuid) -> Result<location::Model, ServiceError> {
        Location::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", id)))
    }

    #[instrument(skip(self, input))]
    pub async fn update_location(
        &self,
        id: Uuid,
        input: UpdateLocationInput,
    ) -> Result<location::Model, ServiceError> {
        let existing = self.get_location(id).await?;
        let db = &*self.db_pool;

        let name = match input.name.as_deref() {
            Some(name) => required_text("name", name)?,
            None => existing.name.clone(),
        };
        let will_be_active = input.is_active.unwrap_or(existing.is_active);
        if will_be_active && (name != existing.name || !existing.is_active) {
            ensure_active_name_free(db, &name, Some(id)).await?;
        }

        let mut active: location::ActiveModel = existing.into();
        active.name = Set(name);
        if let Some(location_type) = input.location_type {
            active.location_type = Set(location_type);
        }
        if input.address.is_some() {
            active.address = Set(optional_text(input.address));
        }
        if input.city.is_some() {
            active.city = Set(optional_text(input.city));
        }
        if input.country.is_some() {
            active.country = Set(optional_text(input.country));
        }
        active.is_active = Set(will_be_active);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;

        self.event_sender
            .send_or_log(Event::LocationUpdated(id))
            .await;
        info!(location_id = %id, "Location updated");
        Ok(updated)
    }

    /// Hides the location from selection without touching its stock
    #[instrument(skip(self))]
    pub async fn deactivate_location(&self, id: Uuid) -> Result<location::Model, ServiceError> {
        let existing = self.get_location(id).await?;
        if !existing.is_active {
            return Ok(existing);
        }

        let mut active: location::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db_pool).await?;

        self.event_sender
            .send_or_log(Event::LocationDeactivated(id))
            .await;
        info!(location_id = %id, "Location deactivated");
        Ok(updated)
    }

    /// Hard delete, refused while any inventory item sits at the location
    #[instrument(skip(self))]
    pub async fn delete_location(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;

        let existing = Location::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", id)))?;

        let referencing = InventoryItem::find()
            .filter(inventory_item::Column::LocationId.eq(id))
            .count(&txn)
            .await?;
        if referencing > 0 {
            warn!(location_id = %id, items = referencing, "Refusing to delete referenced location");
            return Err(ServiceError::ReferentialIntegrity(format!(
                "Location '{}' still holds {} inventory item(s); deactivate it instead",
                existing.name, referencing
            )));
        }

        existing.delete(&txn).await.map_err(|e| {
            ServiceError::referential_on_fk(e, format!("Location {} is still referenced", id))
        })?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::LocationDeleted(id))
            .await;
        info!(location_id = %id, "Location deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn search_locations(
        &self,
        search: LocationSearch,
    ) -> Result<Vec<location::Model>, ServiceError> {
        let mut query = Location::find().filter(location::Column::IsActive.eq(true));
        if let Some(name) = optional_text(search.name) {
            query = query.filter(location::Column::Name.contains(&name));
        }
        if let Some(location_type) = search.location_type {
            query = query.filter(location::Column::LocationType.eq(location_type));
        }
        if let Some(city) = optional_text(search.city) {
            query = query.filter(location::Column::City.contains(&city));
        }
        if let Some(country) = optional_text(search.country) {
            query = query.filter(location::Column::Country.contains(&country));
        }

        Ok(query
            .order_by_asc(location::Column::LocationType)
            .order_by_asc(location::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }
}

async fn ensure_active_name_free<C: ConnectionTrait>(
    db: &C,
    name: &str,
    exclude: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = Location::find()
        .filter(location::Column::Name.eq(name))
        .filter(location::Column::IsActive.eq(true));
    if let Some(id) = exclude {
        query = query.filter(location::Column::Id.ne(id));
    }

    if query.count(db).await? > 0 {
        warn!(name = %name, "Duplicate active location name");
        return Err(ServiceError::Conflict(format!(
            "An active location named '{}' already exists",
            name
        )));
    }
    Ok(())
}
