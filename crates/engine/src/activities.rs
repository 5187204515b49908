//! The module contains the `Activity` struct: a capacity-bounded slot actors
//! can reserve.

use sea_orm::entity::{ActiveValue, prelude::*};

use crate::{ActivityId, EngineError, ResultEngine};

/// Capacity used when an administrator does not provide one.
pub const DEFAULT_CAPACITY: u32 = 50;

/// Largest capacity the `activities.capacity` column can hold.
pub const MAX_CAPACITY: u32 = i32::MAX as u32;

/// An activity.
///
/// Activities are created by administrators and never edited afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub description: String,
    /// Free-form display string ("15 November, 14:00").
    pub scheduled_at: String,
    /// Maximum number of simultaneous bookings. Always > 0.
    pub capacity: u32,
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: String,
    pub scheduled_at: String,
    pub capacity: i32,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Activity {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let capacity = u32::try_from(model.capacity)
            .ok()
            .filter(|c| *c > 0)
            .ok_or_else(|| {
                EngineError::Corrupted(format!(
                    "activity {} has invalid capacity {}",
                    model.id, model.capacity
                ))
            })?;
        Ok(Self {
            id: model.id,
            name: model.name,
            description: model.description,
            scheduled_at: model.scheduled_at,
            capacity,
            is_active: model.is_active,
        })
    }
}

impl ActiveModel {
    pub(crate) fn new_activity(
        name: String,
        description: String,
        scheduled_at: String,
        capacity: u32,
    ) -> ResultEngine<Self> {
        let capacity = i32::try_from(capacity)
            .map_err(|_| EngineError::ValidationFailed("capacity is too large".to_string()))?;
        Ok(Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name),
            description: ActiveValue::Set(description),
            scheduled_at: ActiveValue::Set(scheduled_at),
            capacity: ActiveValue::Set(capacity),
            is_active: ActiveValue::Set(true),
        })
    }
}
