use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryFilter, QueryOrder, Statement, prelude::*};

use crate::{
    ActivityBooking, ActivityId, Actor, ActorBooking, ActorId, BookingOutcome, EngineError,
    ResultEngine, activities, actors, bookings,
};

use super::{Store, Violation, violation};

// The count check and the insert are one statement: SQLite holds the writer
// lock for the whole statement, so two bookers can never both see the last
// free slot.
const GUARDED_BOOKING: &str = "INSERT INTO bookings (actor_id, activity_id, booked_at) \
     SELECT ?, a.id, ? FROM activities a \
     WHERE a.id = ? AND a.is_active = ? \
     AND (SELECT COUNT(*) FROM bookings b WHERE b.activity_id = a.id) < a.capacity;";

impl Store {
    /// Reserve a slot of `activity_id` for `actor_id`.
    ///
    /// The actor must already be registered, whether or not a slot is free. An
    /// inactive activity is reported as `NotFound`. When the actor already holds a booking the outcome is
    /// `AlreadyBooked`, even if the activity is also full.
    pub async fn book(
        &self,
        actor_id: ActorId,
        activity_id: ActivityId,
    ) -> ResultEngine<BookingOutcome> {
        let backend = self.database.get_database_backend();
        let inserted = self
            .database
            .execute(Statement::from_sql_and_values(
                backend,
                GUARDED_BOOKING,
                vec![
                    actor_id.into(),
                    Utc::now().into(),
                    activity_id.into(),
                    true.into(),
                ],
            ))
            .await;

        match inserted {
            Ok(result) if result.rows_affected() > 0 => {
                tracing::debug!("actor {actor_id} booked activity {activity_id}");
                Ok(BookingOutcome::Booked)
            }
            Ok(_) => self.classify_rejected_booking(actor_id, activity_id).await,
            Err(err) => match violation(&err) {
                Some(Violation::Unique) => Ok(BookingOutcome::AlreadyBooked),
                Some(Violation::ForeignKey) => {
                    Err(EngineError::NotFound(format!("actor {actor_id}")))
                }
                None => {
                    tracing::error!("booking insert failed: {err}");
                    Err(err.into())
                }
            },
        }
    }

    async fn classify_rejected_booking(
        &self,
        actor_id: ActorId,
        activity_id: ActivityId,
    ) -> ResultEngine<BookingOutcome> {
        let active = activities::Entity::find_by_id(activity_id)
            .one(&self.database)
            .await?
            .is_some_and(|activity| activity.is_active);
        if !active {
            return Ok(BookingOutcome::NotFound);
        }
        if actors::Entity::find_by_id(actor_id)
            .one(&self.database)
            .await?
            .is_none()
        {
            return Err(EngineError::NotFound(format!("actor {actor_id}")));
        }
        if self.is_booked(actor_id, activity_id).await? {
            return Ok(BookingOutcome::AlreadyBooked);
        }
        Ok(BookingOutcome::CapacityFull)
    }

    /// Drop the booking if present. Returns whether one existed.
    pub async fn cancel(&self, actor_id: ActorId, activity_id: ActivityId) -> ResultEngine<bool> {
        let deleted = bookings::Entity::delete_many()
            .filter(bookings::Column::ActorId.eq(actor_id))
            .filter(bookings::Column::ActivityId.eq(activity_id))
            .exec(&self.database)
            .await?;
        if deleted.rows_affected > 0 {
            tracing::debug!("actor {actor_id} cancelled activity {activity_id}");
        }
        Ok(deleted.rows_affected > 0)
    }

    pub async fn count_bookings(&self, activity_id: ActivityId) -> ResultEngine<u64> {
        Ok(bookings::Entity::find()
            .filter(bookings::Column::ActivityId.eq(activity_id))
            .count(&self.database)
            .await?)
    }

    pub async fn is_booked(&self, actor_id: ActorId, activity_id: ActivityId) -> ResultEngine<bool> {
        Ok(bookings::Entity::find()
            .filter(bookings::Column::ActorId.eq(actor_id))
            .filter(bookings::Column::ActivityId.eq(activity_id))
            .one(&self.database)
            .await?
            .is_some())
    }

    /// Bookings of one actor, in booking order.
    pub async fn list_bookings_for_actor(
        &self,
        actor_id: ActorId,
    ) -> ResultEngine<Vec<ActorBooking>> {
        let rows = bookings::Entity::find()
            .filter(bookings::Column::ActorId.eq(actor_id))
            .order_by_asc(bookings::Column::Id)
            .find_also_related(activities::Entity)
            .all(&self.database)
            .await?;

        rows.into_iter()
            .map(|(booking, activity)| {
                let activity = activity.ok_or_else(|| {
                    EngineError::Corrupted(format!("booking {} has no activity", booking.id))
                })?;
                Ok(ActorBooking {
                    activity: activity.try_into()?,
                    booked_at: booking.booked_at,
                })
            })
            .collect()
    }

    /// Bookings of one activity, in booking order.
    pub async fn list_bookings_for_activity(
        &self,
        activity_id: ActivityId,
    ) -> ResultEngine<Vec<ActivityBooking>> {
        let rows = bookings::Entity::find()
            .filter(bookings::Column::ActivityId.eq(activity_id))
            .order_by_asc(bookings::Column::Id)
            .find_also_related(actors::Entity)
            .all(&self.database)
            .await?;

        rows.into_iter()
            .map(|(booking, actor)| {
                let actor = actor.ok_or_else(|| {
                    EngineError::Corrupted(format!("booking {} has no actor", booking.id))
                })?;
                Ok(ActivityBooking {
                    actor: Actor::from(actor),
                    booked_at: booking.booked_at,
                })
            })
            .collect()
    }
}
