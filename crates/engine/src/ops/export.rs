use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{ActivityId, EngineError, ExportRow, ResultEngine, activities, actors, bookings};

use super::{Store, with_tx};

impl Store {
    /// Flat extract of an activity's bookings, in booking order.
    pub async fn export_bookings(&self, activity_id: ActivityId) -> ResultEngine<Vec<ExportRow>> {
        with_tx!(self, |db_tx| {
            if activities::Entity::find_by_id(activity_id)
                .one(&db_tx)
                .await?
                .is_none()
            {
                return Err(EngineError::NotFound(format!("activity {activity_id}")));
            }

            let rows = bookings::Entity::find()
                .filter(bookings::Column::ActivityId.eq(activity_id))
                .order_by_asc(bookings::Column::Id)
                .find_also_related(actors::Entity)
                .all(&db_tx)
                .await?;

            rows.into_iter()
                .enumerate()
                .map(|(position, (booking, actor))| {
                    let actor = actor.ok_or_else(|| {
                        EngineError::Corrupted(format!("booking {} has no actor", booking.id))
                    })?;
                    Ok(ExportRow {
                        ordinal: position + 1,
                        first_name: actor.first_name.unwrap_or_default(),
                        last_name: actor.last_name.unwrap_or_default(),
                        username: actor.username.unwrap_or_default(),
                        actor_id: actor.id,
                        booked_at: booking.booked_at,
                    })
                })
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
