//! Bookings link one actor to one activity.
//!
//! There is at most one booking per (actor, activity) pair, enforced by a
//! unique index, and never more bookings than the activity's capacity.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::{Activity, Actor};

/// Result of [`Store::book`](crate::Store::book).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingOutcome {
    Booked,
    AlreadyBooked,
    CapacityFull,
    NotFound,
}

/// A booking as seen from the actor side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActorBooking {
    pub activity: Activity,
    pub booked_at: DateTime<Utc>,
}

/// A booking as seen from the activity side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityBooking {
    pub actor: Actor,
    pub booked_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub actor_id: i64,
    pub activity_id: i32,
    pub booked_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::actors::Entity",
        from = "Column::ActorId",
        to = "super::actors::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Actors,
    #[sea_orm(
        belongs_to = "super::activities::Entity",
        from = "Column::ActivityId",
        to = "super::activities::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Activities,
}

impl Related<super::actors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actors.def()
    }
}

impl Related<super::activities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
