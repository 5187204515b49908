mod common;

use std::time::Duration;

use common::store_with_db;
use engine::{
    AccessPolicy, Completed, EngineError, FieldError, FormEngine, FormKind, FormSettings,
    FormState, Store, SubmitOutcome, forms::ActivityForm,
};

const ADMIN: i64 = 1;
const OTHER_ADMIN: i64 = 2;
const PARTICIPANT: i64 = 3;

fn forms_with(store: &Store, idle_timeout: Option<Duration>) -> FormEngine {
    FormEngine::new(
        store.clone(),
        AccessPolicy::new([ADMIN, OTHER_ADMIN]),
        FormSettings {
            default_capacity: 50,
            idle_timeout,
        },
    )
}

async fn forms() -> (Store, FormEngine) {
    let store = store_with_db().await;
    let forms = forms_with(&store, None);
    (store, forms)
}

#[tokio::test]
async fn activity_chain_commits_on_the_fourth_answer() {
    let (store, forms) = forms().await;
    let position = forms.start(ADMIN, FormKind::Activity).await.unwrap();
    assert_eq!((position.step, position.total), (1, 4));

    for answer in ["Rust workshop", "Hands-on session", "15 Nov, 14:00"] {
        assert!(matches!(
            forms.submit(ADMIN, answer).await,
            Ok(SubmitOutcome::Advanced(_))
        ));
    }
    let position = forms.session(ADMIN).await.unwrap();
    assert_eq!(position.step, 4);
    assert_eq!(position.field, "capacity");
    assert!(store.list_activities(false).await.unwrap().is_empty());

    let Ok(SubmitOutcome::Completed(Completed::Activity(activity))) =
        forms.submit(ADMIN, "12").await
    else {
        panic!("fourth answer should commit");
    };
    assert_eq!(activity.name, "Rust workshop");
    assert_eq!(activity.capacity, 12);
    assert!(activity.is_active);
    assert_eq!(forms.session(ADMIN).await, None);
    assert_eq!(
        forms.submit(ADMIN, "anything").await,
        Ok(SubmitOutcome::NoSession)
    );
    assert_eq!(store.list_activities(true).await.unwrap(), vec![activity]);
}

#[tokio::test]
async fn invalid_capacity_keeps_the_session() {
    let (store, forms) = forms().await;
    forms.start(ADMIN, FormKind::Activity).await.unwrap();
    for answer in ["Rust workshop", "Hands-on session", "15 Nov, 14:00"] {
        forms.submit(ADMIN, answer).await.unwrap();
    }

    let outcome = forms.submit(ADMIN, "abc").await.unwrap();
    let SubmitOutcome::Rejected { position, error } = outcome else {
        panic!("expected a rejection, got {outcome:?}");
    };
    assert_eq!(position.step, 4);
    assert_eq!(error, FieldError::InvalidCapacity("abc".to_string()));
    assert_eq!(
        forms.state(ADMIN).await,
        Some(FormState::Activity(ActivityForm::AwaitingCapacity {
            name: "Rust workshop".to_string(),
            description: "Hands-on session".to_string(),
            scheduled_at: "15 Nov, 14:00".to_string(),
        }))
    );

    let Ok(SubmitOutcome::Completed(Completed::Activity(activity))) =
        forms.submit(ADMIN, "-").await
    else {
        panic!("placeholder should commit");
    };
    assert_eq!(activity.capacity, 50);
    assert_eq!(store.list_activities(false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn oversized_capacity_is_reprompted() {
    let (store, forms) = forms().await;
    forms.start(ADMIN, FormKind::Activity).await.unwrap();
    for answer in ["Rust workshop", "Hands-on session", "15 Nov, 14:00"] {
        forms.submit(ADMIN, answer).await.unwrap();
    }

    for answer in ["3000000000", "2147483648"] {
        let outcome = forms.submit(ADMIN, answer).await.unwrap();
        let SubmitOutcome::Rejected { position, error } = outcome else {
            panic!("expected a rejection for {answer}, got {outcome:?}");
        };
        assert_eq!(position.step, 4);
        assert_eq!(error, FieldError::InvalidCapacity(answer.to_string()));
    }
    assert!(store.list_activities(false).await.unwrap().is_empty());

    let Ok(SubmitOutcome::Completed(Completed::Activity(activity))) =
        forms.submit(ADMIN, "2147483647").await
    else {
        panic!("largest storable capacity should commit");
    };
    assert_eq!(activity.capacity, engine::MAX_CAPACITY);
}

#[tokio::test]
async fn cancel_discards_the_session() {
    let (store, forms) = forms().await;
    forms.start(ADMIN, FormKind::Activity).await.unwrap();
    forms.submit(ADMIN, "Rust workshop").await.unwrap();

    assert_eq!(forms.cancel(ADMIN).await, Ok(true));
    assert_eq!(forms.cancel(ADMIN).await, Ok(false));
    assert_eq!(forms.cancel(OTHER_ADMIN).await, Ok(false));
    assert_eq!(
        forms.submit(ADMIN, "Hands-on session").await,
        Ok(SubmitOutcome::NoSession)
    );
    assert!(store.list_activities(false).await.unwrap().is_empty());
}

#[tokio::test]
async fn sessions_are_isolated_per_actor() {
    let (store, forms) = forms().await;
    forms.start(ADMIN, FormKind::Activity).await.unwrap();
    forms.start(OTHER_ADMIN, FormKind::Poll).await.unwrap();

    forms.submit(ADMIN, "Rust workshop").await.unwrap();
    forms.submit(OTHER_ADMIN, "Lunch?").await.unwrap();
    assert_eq!(forms.session(ADMIN).await.map(|p| p.step), Some(2));
    assert_eq!(forms.session(OTHER_ADMIN).await.map(|p| p.kind), Some(FormKind::Poll));

    assert_eq!(
        forms.submit(PARTICIPANT, "Pizza\nSushi").await,
        Ok(SubmitOutcome::NoSession)
    );
    let Ok(SubmitOutcome::Completed(Completed::Poll(poll))) =
        forms.submit(OTHER_ADMIN, "Pizza\nSushi").await
    else {
        panic!("poll should commit");
    };
    assert_eq!(poll.question, "Lunch?");
    assert_eq!(store.list_polls(false).await.unwrap().len(), 1);

    assert_eq!(forms.cancel(OTHER_ADMIN).await, Ok(false));
    assert_eq!(forms.session(ADMIN).await.map(|p| p.step), Some(2));
}

#[tokio::test]
async fn participants_cannot_use_forms() {
    let (_, forms) = forms().await;
    assert!(matches!(
        forms.start(PARTICIPANT, FormKind::Broadcast).await,
        Err(EngineError::PermissionDenied(_))
    ));
    assert!(matches!(
        forms.cancel(PARTICIPANT).await,
        Err(EngineError::PermissionDenied(_))
    ));
    assert_eq!(forms.session(PARTICIPANT).await, None);
}

#[tokio::test]
async fn last_start_wins() {
    let (_, forms) = forms().await;
    forms.start(ADMIN, FormKind::Activity).await.unwrap();
    forms.submit(ADMIN, "Rust workshop").await.unwrap();

    let position = forms.start(ADMIN, FormKind::Broadcast).await.unwrap();
    assert_eq!((position.kind, position.step), (FormKind::Broadcast, 1));
    assert_eq!(
        forms.submit(ADMIN, "  Doors open at 9  ").await,
        Ok(SubmitOutcome::Completed(Completed::Broadcast {
            message: "Doors open at 9".to_string()
        }))
    );
}

#[tokio::test]
async fn poll_options_are_validated() {
    let (store, forms) = forms().await;
    forms.start(ADMIN, FormKind::Poll).await.unwrap();
    forms.submit(ADMIN, "Lunch?").await.unwrap();

    assert_eq!(
        forms.submit(ADMIN, "Pizza\n  \n").await,
        Ok(SubmitOutcome::Rejected {
            position: forms.session(ADMIN).await.unwrap(),
            error: FieldError::TooFewOptions(1),
        })
    );
    assert!(store.list_polls(false).await.unwrap().is_empty());
    assert!(matches!(
        forms.submit(ADMIN, "Pizza\nSushi\nSalad").await,
        Ok(SubmitOutcome::Completed(Completed::Poll(_)))
    ));
}

#[tokio::test]
async fn idle_sessions_expire() {
    let store = store_with_db().await;
    let forms = forms_with(&store, Some(Duration::ZERO));
    forms.start(ADMIN, FormKind::Broadcast).await.unwrap();

    assert_eq!(forms.session(ADMIN).await, None);
    assert_eq!(
        forms.submit(ADMIN, "hello").await,
        Ok(SubmitOutcome::NoSession)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn double_submitted_last_step_commits_once() {
    let (store, forms) = forms().await;
    forms.start(ADMIN, FormKind::Poll).await.unwrap();
    forms.submit(ADMIN, "Lunch?").await.unwrap();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let forms = forms.clone();
            tokio::spawn(async move { forms.submit(ADMIN, "Pizza\nSushi").await.unwrap() })
        })
        .collect();
    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, SubmitOutcome::Completed(_)))
            .count(),
        1
    );
    assert!(outcomes.contains(&SubmitOutcome::NoSession));
    assert_eq!(store.list_polls(false).await.unwrap().len(), 1);
}
