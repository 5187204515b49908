//! Actors: everyone who interacted with the bot at least once.
//!
//! The id is the chat platform's user id. Actors are never deleted.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};

use crate::ActorId;

/// An actor as seen by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Privilege flag recorded at registration. Privilege checks use the
    /// configured [`AccessPolicy`](crate::AccessPolicy), not this column.
    pub is_admin: bool,
    pub registered_at: DateTime<Utc>,
}

impl Actor {
    /// First and last name joined, falling back to the handle and then to the id.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        self.handle().unwrap_or_else(|| self.id.to_string())
    }

    /// `@username`, if the actor has one.
    pub fn handle(&self) -> Option<String> {
        self.username
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|u| format!("@{u}"))
    }
}

/// Mutable profile fields refreshed on every interaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActorProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "actors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
    pub registered_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::poll_votes::Entity")]
    PollVotes,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::poll_votes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PollVotes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Actor {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            is_admin: model.is_admin,
            registered_at: model.registered_at,
        }
    }
}

impl ActiveModel {
    pub(crate) fn registration(
        id: ActorId,
        profile: &ActorProfile,
        is_admin: bool,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActiveValue::Set(id),
            username: ActiveValue::Set(profile.username.clone()),
            first_name: ActiveValue::Set(profile.first_name.clone()),
            last_name: ActiveValue::Set(profile.last_name.clone()),
            is_admin: ActiveValue::Set(is_admin),
            registered_at: ActiveValue::Set(registered_at),
        }
    }
}
