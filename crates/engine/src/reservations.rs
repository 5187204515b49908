//! Reservation engine: booking and cancellation on top of the store's atomic
//! operations, plus the read models the presentation layer shows around them.

use chrono_tz::Tz;

use crate::{
    AccessPolicy, Activity, ActivityBooking, ActivityId, ActorBooking, ActorId, BookingOutcome,
    ResultEngine, Store, export,
};

/// Outcome of [`ReservationEngine::request_booking`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingReply {
    /// Booked; carries the capacity view read right after the insert.
    Booked(CapacityView),
    AlreadyBooked,
    CapacityFull,
    UnknownActivity,
}

/// Outcome of [`ReservationEngine::request_cancellation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancellationReply {
    Cancelled,
    NothingToCancel,
}

/// Occupancy of an activity as seen by one actor. Never cached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapacityView {
    pub activity: Activity,
    pub booked: u64,
    pub is_booked: bool,
}

impl CapacityView {
    pub fn capacity(&self) -> u64 {
        u64::from(self.activity.capacity)
    }

    pub fn remaining(&self) -> u64 {
        self.capacity().saturating_sub(self.booked)
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }
}

/// An activity of the catalogue with the viewer's booking marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogueEntry {
    pub activity: Activity,
    pub is_booked: bool,
}

/// An activity with everyone who booked it, in booking order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Roster {
    pub activity: Activity,
    pub bookings: Vec<ActivityBooking>,
}

#[derive(Clone, Debug)]
pub struct ReservationEngine {
    store: Store,
    access: AccessPolicy,
}

impl ReservationEngine {
    pub fn new(store: Store, access: AccessPolicy) -> Self {
        Self { store, access }
    }

    pub async fn request_booking(
        &self,
        actor_id: ActorId,
        activity_id: ActivityId,
    ) -> ResultEngine<BookingReply> {
        let reply = match self.store.book(actor_id, activity_id).await? {
            BookingOutcome::Booked => {
                BookingReply::Booked(self.capacity_view(actor_id, activity_id).await?)
            }
            BookingOutcome::AlreadyBooked => BookingReply::AlreadyBooked,
            BookingOutcome::CapacityFull => BookingReply::CapacityFull,
            BookingOutcome::NotFound => BookingReply::UnknownActivity,
        };
        tracing::debug!("booking {actor_id} -> {activity_id}: {reply:?}");
        Ok(reply)
    }

    pub async fn request_cancellation(
        &self,
        actor_id: ActorId,
        activity_id: ActivityId,
    ) -> ResultEngine<CancellationReply> {
        if self.store.cancel(actor_id, activity_id).await? {
            Ok(CancellationReply::Cancelled)
        } else {
            Ok(CancellationReply::NothingToCancel)
        }
    }

    /// Fresh occupancy of `activity_id`.
    pub async fn capacity_view(
        &self,
        actor_id: ActorId,
        activity_id: ActivityId,
    ) -> ResultEngine<CapacityView> {
        let activity = self.store.require_activity(activity_id).await?;
        let booked = self.store.count_bookings(activity_id).await?;
        let is_booked = self.store.is_booked(actor_id, activity_id).await?;
        Ok(CapacityView {
            activity,
            booked,
            is_booked,
        })
    }

    /// Active activities, each marked when `actor_id` holds a booking.
    pub async fn catalogue(&self, actor_id: ActorId) -> ResultEngine<Vec<CatalogueEntry>> {
        let booked: Vec<ActivityId> = self
            .store
            .list_bookings_for_actor(actor_id)
            .await?
            .into_iter()
            .map(|booking| booking.activity.id)
            .collect();
        Ok(self
            .store
            .list_activities(true)
            .await?
            .into_iter()
            .map(|activity| CatalogueEntry {
                is_booked: booked.contains(&activity.id),
                activity,
            })
            .collect())
    }

    pub async fn bookings_of(&self, actor_id: ActorId) -> ResultEngine<Vec<ActorBooking>> {
        self.store.list_bookings_for_actor(actor_id).await
    }

    /// Every booker of an activity. Administrators only.
    pub async fn roster(&self, admin_id: ActorId, activity_id: ActivityId) -> ResultEngine<Roster> {
        self.access.require_admin(admin_id, "viewing bookings")?;
        let activity = self.store.require_activity(activity_id).await?;
        let bookings = self.store.list_bookings_for_activity(activity_id).await?;
        Ok(Roster { activity, bookings })
    }

    /// CSV extract of an activity's bookings. Administrators only.
    pub async fn export_csv(
        &self,
        admin_id: ActorId,
        activity_id: ActivityId,
        tz: Tz,
    ) -> ResultEngine<Vec<u8>> {
        self.access.require_admin(admin_id, "exporting bookings")?;
        let rows = self.store.export_bookings(activity_id).await?;
        tracing::info!("exporting {} bookings of activity {activity_id}", rows.len());
        export::write_csv(&rows, tz)
    }
}
