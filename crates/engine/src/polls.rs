//! The module contains the `Poll` struct: a single-choice question.
//!
//! Options are kept in order and persisted as a JSON array in one column.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};

use crate::{EngineError, PollId, ResultEngine};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;

/// A poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Poll {
    pub id: PollId,
    pub question: String,
    pub options: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    /// Label of the option at `index`, if it exists.
    pub fn option(&self, index: i64) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }
}

/// Check the option list bounds.
pub(crate) fn validate_options(options: &[String]) -> ResultEngine<()> {
    if options.len() < MIN_OPTIONS || options.len() > MAX_OPTIONS {
        return Err(EngineError::ValidationFailed(format!(
            "a poll needs between {MIN_OPTIONS} and {MAX_OPTIONS} options, got {}",
            options.len()
        )));
    }
    if options.iter().any(|o| o.trim().is_empty()) {
        return Err(EngineError::ValidationFailed(
            "poll options must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "polls")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub question: String,
    #[sea_orm(column_type = "Text")]
    pub options: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::poll_votes::Entity")]
    PollVotes,
}

impl Related<super::poll_votes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PollVotes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Poll {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let options: Vec<String> = serde_json::from_str(&model.options).map_err(|err| {
            EngineError::Corrupted(format!("poll {} options: {err}", model.id))
        })?;
        Ok(Self {
            id: model.id,
            question: model.question,
            options,
            is_active: model.is_active,
            created_at: model.created_at,
        })
    }
}

impl ActiveModel {
    pub(crate) fn new_poll(
        question: String,
        options: &[String],
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        let options = serde_json::to_string(options)
            .map_err(|err| EngineError::ValidationFailed(format!("poll options: {err}")))?;
        Ok(Self {
            id: ActiveValue::NotSet,
            question: ActiveValue::Set(question),
            options: ActiveValue::Set(options),
            is_active: ActiveValue::Set(true),
            created_at: ActiveValue::Set(created_at),
        })
    }
}
