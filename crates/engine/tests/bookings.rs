mod common;

use chrono_tz::Tz;

use common::{activity, register, store_with_db, store_with_file_db};
use engine::{
    AccessPolicy, BookingOutcome, BookingReply, CancellationReply, EngineError,
    ReservationEngine, Store,
};

async fn race(store: Store, capacity: u32, extra: i64) {
    let activity_id = activity(&store, "Keynote", capacity).await;
    let bookers: Vec<i64> = (1..=i64::from(capacity) + extra).collect();
    register(&store, bookers.clone()).await;

    let handles: Vec<_> = bookers
        .into_iter()
        .map(|actor_id| {
            let store = store.clone();
            tokio::spawn(async move { store.book(actor_id, activity_id).await.unwrap() })
        })
        .collect();

    let mut booked = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap() {
            BookingOutcome::Booked => booked += 1,
            BookingOutcome::CapacityFull => full += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    assert_eq!(booked, capacity);
    assert_eq!(full, extra);
    assert_eq!(
        store.count_bookings(activity_id).await.unwrap(),
        u64::from(capacity)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookers_never_exceed_capacity() {
    race(store_with_db().await, 5, 7).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookers_never_exceed_capacity_on_file_db() {
    let (store, path) = store_with_file_db("booking_race").await;
    race(store, 3, 9).await;
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn second_booking_is_already_booked() {
    let store = store_with_db().await;
    let activity_id = activity(&store, "Workshop", 1).await;
    register(&store, [1]).await;

    assert_eq!(store.book(1, activity_id).await, Ok(BookingOutcome::Booked));
    // The activity is now full too; the duplicate still wins.
    assert_eq!(
        store.book(1, activity_id).await,
        Ok(BookingOutcome::AlreadyBooked)
    );
    assert_eq!(store.count_bookings(activity_id).await, Ok(1));
}

#[tokio::test]
async fn unknown_activity_is_not_found() {
    let store = store_with_db().await;
    register(&store, [1]).await;
    assert_eq!(store.book(1, 404).await, Ok(BookingOutcome::NotFound));
}

#[tokio::test]
async fn unregistered_actor_cannot_book() {
    let store = store_with_db().await;
    let activity_id = activity(&store, "Workshop", 3).await;
    assert_eq!(
        store.book(99, activity_id).await,
        Err(EngineError::NotFound("actor 99".to_string()))
    );
}

#[tokio::test]
async fn unregistered_actor_on_a_full_activity_is_still_unknown() {
    let store = store_with_db().await;
    let activity_id = activity(&store, "Workshop", 1).await;
    register(&store, [1]).await;
    assert_eq!(store.book(1, activity_id).await, Ok(BookingOutcome::Booked));

    assert_eq!(
        store.book(99, activity_id).await,
        Err(EngineError::NotFound("actor 99".to_string()))
    );
    assert_eq!(store.count_bookings(activity_id).await, Ok(1));
}

#[tokio::test]
async fn cancel_is_idempotent() {
    let store = store_with_db().await;
    let activity_id = activity(&store, "Workshop", 3).await;
    register(&store, [1]).await;

    assert_eq!(store.cancel(1, activity_id).await, Ok(false));
    store.book(1, activity_id).await.unwrap();
    assert_eq!(store.cancel(1, activity_id).await, Ok(true));
    assert_eq!(store.cancel(1, activity_id).await, Ok(false));
    assert_eq!(store.count_bookings(activity_id).await, Ok(0));
}

#[tokio::test]
async fn book_cancel_book_restores_the_count() {
    let store = store_with_db().await;
    let activity_id = activity(&store, "Workshop", 3).await;
    register(&store, [1, 2]).await;
    store.book(2, activity_id).await.unwrap();
    let before = store.count_bookings(activity_id).await.unwrap();

    assert_eq!(store.book(1, activity_id).await, Ok(BookingOutcome::Booked));
    assert_eq!(store.cancel(1, activity_id).await, Ok(true));
    assert_eq!(store.count_bookings(activity_id).await, Ok(before));
    assert_eq!(store.book(1, activity_id).await, Ok(BookingOutcome::Booked));
    assert_eq!(store.count_bookings(activity_id).await, Ok(before + 1));
}

#[tokio::test]
async fn freed_slot_goes_to_the_rejected_actor() {
    let store = store_with_db().await;
    let reservations = ReservationEngine::new(store.clone(), AccessPolicy::default());
    let activity_id = activity(&store, "Lab tour", 2).await;
    let (x, y, z) = (10, 20, 30);
    register(&store, [x, y, z]).await;

    assert!(matches!(
        reservations.request_booking(x, activity_id).await,
        Ok(BookingReply::Booked(_))
    ));
    let Ok(BookingReply::Booked(view)) = reservations.request_booking(y, activity_id).await else {
        panic!("second booker should get a slot");
    };
    assert!(view.is_full());
    assert!(view.is_booked);
    assert_eq!(
        reservations.request_booking(z, activity_id).await,
        Ok(BookingReply::CapacityFull)
    );

    assert_eq!(
        reservations.request_cancellation(x, activity_id).await,
        Ok(CancellationReply::Cancelled)
    );
    let Ok(BookingReply::Booked(view)) = reservations.request_booking(z, activity_id).await else {
        panic!("freed slot should go to z");
    };
    assert_eq!(view.booked, 2);
    assert_eq!(view.remaining(), 0);
    assert_eq!(
        reservations.request_cancellation(x, activity_id).await,
        Ok(CancellationReply::NothingToCancel)
    );
}

#[tokio::test]
async fn catalogue_marks_own_bookings() {
    let store = store_with_db().await;
    let reservations = ReservationEngine::new(store.clone(), AccessPolicy::default());
    let first = activity(&store, "Keynote", 10).await;
    let second = activity(&store, "Workshop", 10).await;
    register(&store, [1]).await;
    store.book(1, second).await.unwrap();

    let catalogue = reservations.catalogue(1).await.unwrap();
    let marks: Vec<_> = catalogue
        .iter()
        .map(|entry| (entry.activity.id, entry.is_booked))
        .collect();
    assert_eq!(marks, vec![(first, false), (second, true)]);

    let mine = reservations.bookings_of(1).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].activity.name, "Workshop");
}

#[tokio::test]
async fn roster_and_export_are_for_administrators() {
    let store = store_with_db().await;
    let reservations = ReservationEngine::new(store.clone(), AccessPolicy::new([1]));
    let activity_id = activity(&store, "Workshop", 10).await;
    register(&store, [1, 2, 3]).await;
    store.book(3, activity_id).await.unwrap();
    store.book(2, activity_id).await.unwrap();

    assert!(matches!(
        reservations.roster(2, activity_id).await,
        Err(EngineError::PermissionDenied(_))
    ));
    assert!(matches!(
        reservations.export_csv(2, activity_id, Tz::UTC).await,
        Err(EngineError::PermissionDenied(_))
    ));

    let roster = reservations.roster(1, activity_id).await.unwrap();
    let order: Vec<_> = roster.bookings.iter().map(|b| b.actor.id).collect();
    assert_eq!(order, vec![3, 2]);

    let rows = store.export_bookings(activity_id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].ordinal, rows[0].actor_id), (1, 3));
    assert_eq!((rows[1].ordinal, rows[1].username.as_str()), (2, "user2"));

    let csv = reservations.export_csv(1, activity_id, Tz::UTC).await.unwrap();
    let text = String::from_utf8(csv).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().nth(1).unwrap().starts_with("1,First3,,user3,3,"));
}

#[tokio::test]
async fn upsert_keeps_registration_time() {
    let store = store_with_db().await;
    let first = store
        .upsert_actor(7, &engine::ActorProfile::default(), false)
        .await
        .unwrap();
    let profile = engine::ActorProfile {
        username: Some("@grace".to_string()),
        first_name: Some("Grace".to_string()),
        last_name: Some("Hopper".to_string()),
    };
    let second = store.upsert_actor(7, &profile, true).await.unwrap();

    assert_eq!(second.registered_at, first.registered_at);
    assert_eq!(second.username.as_deref(), Some("grace"));
    assert!(second.is_admin);
    assert_eq!(second.display_name(), "Grace Hopper");
    assert_eq!(store.list_actors().await.unwrap().len(), 1);
}

#[tokio::test]
async fn capacity_must_be_positive() {
    let store = store_with_db().await;
    assert!(matches!(
        store.create_activity("Empty", "", "", 0).await,
        Err(EngineError::ValidationFailed(_))
    ));
}
