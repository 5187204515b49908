use chrono::Utc;
use sea_orm::{QueryOrder, TransactionTrait, prelude::*, sea_query::OnConflict};

use crate::{Actor, ActorId, ActorProfile, EngineError, ResultEngine, actors};

use super::{Store, normalize_optional_text, with_tx};

impl Store {
    /// Insert the actor on first sight, otherwise refresh its profile fields.
    ///
    /// Last write wins on `username`, names and `is_admin`; `registered_at`
    /// keeps the value of the first insert.
    pub async fn upsert_actor(
        &self,
        id: ActorId,
        profile: &ActorProfile,
        is_admin: bool,
    ) -> ResultEngine<Actor> {
        let profile = ActorProfile {
            username: normalize_optional_text(
                profile.username.as_deref().map(|u| u.trim_start_matches('@')),
            ),
            first_name: normalize_optional_text(profile.first_name.as_deref()),
            last_name: normalize_optional_text(profile.last_name.as_deref()),
        };
        let model = actors::ActiveModel::registration(id, &profile, is_admin, Utc::now());

        with_tx!(self, |db_tx| {
            actors::Entity::insert(model)
                .on_conflict(
                    OnConflict::column(actors::Column::Id)
                        .update_columns([
                            actors::Column::Username,
                            actors::Column::FirstName,
                            actors::Column::LastName,
                            actors::Column::IsAdmin,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&db_tx)
                .await?;

            let stored = actors::Entity::find_by_id(id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("actor {id}")))?;
            Ok(Actor::from(stored))
        })
    }

    pub async fn actor(&self, id: ActorId) -> ResultEngine<Option<Actor>> {
        Ok(actors::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(Actor::from))
    }

    /// Every registered actor, oldest registration first.
    pub async fn list_actors(&self) -> ResultEngine<Vec<Actor>> {
        let models = actors::Entity::find()
            .order_by_asc(actors::Column::RegisteredAt)
            .order_by_asc(actors::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Actor::from).collect())
    }
}
