//! Poll votes: at most one per (poll, actor), enforced by a unique index.

use std::collections::BTreeMap;

use sea_orm::entity::prelude::*;

/// Result of [`Store::vote`](crate::Store::vote).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BallotOutcome {
    Voted,
    AlreadyVoted,
    NotFound,
}

/// Vote count per option index.
pub type Tally = BTreeMap<usize, u64>;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "poll_votes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub poll_id: i32,
    pub actor_id: i64,
    pub option_index: i32,
    pub voted_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::polls::Entity",
        from = "Column::PollId",
        to = "super::polls::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Polls,
    #[sea_orm(
        belongs_to = "super::actors::Entity",
        from = "Column::ActorId",
        to = "super::actors::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Actors,
}

impl Related<super::polls::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Polls.def()
    }
}

impl Related<super::actors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
