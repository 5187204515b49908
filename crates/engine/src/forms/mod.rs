//! Conversational forms: multi-step data collection for administrators.
//!
//! Each form kind is a linear chain of steps modelled as an enum whose
//! variants carry the fields collected so far. A step either rejects the
//! input (and the state is left as it was) or yields the next state, and the
//! last step yields a complete draft that the engine commits.
//!
//! Sessions live in memory, one slot per actor. The slot's lock is held for
//! the whole submit, commit included, so two concurrent submits from the same
//! actor are applied one after the other.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    AccessPolicy, Activity, ActorId, DEFAULT_CAPACITY, MAX_CAPACITY, MAX_OPTIONS, MIN_OPTIONS,
    Poll, ResultEngine, Store,
};

pub use activity::{ActivityDraft, ActivityForm};
pub use broadcast::{BroadcastDraft, BroadcastForm};
pub use poll::{PollDraft, PollForm};

mod activity;
mod broadcast;
mod poll;

/// Answer to the capacity step meaning "use the default capacity".
pub const CAPACITY_PLACEHOLDER: &str = "-";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormKind {
    Activity,
    Poll,
    Broadcast,
}

/// Why a step refused its input. The session does not move.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("capacity must be a positive integer or \"{placeholder}\", got \"{0}\"", placeholder = CAPACITY_PLACEHOLDER)]
    InvalidCapacity(String),
    #[error("a poll needs at least {min} options, got {0}", min = MIN_OPTIONS)]
    TooFewOptions(usize),
    #[error("a poll accepts at most {max} options, got {0}", max = MAX_OPTIONS)]
    TooManyOptions(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormSettings {
    pub default_capacity: u32,
    /// Sessions untouched for this long are dropped. `None` keeps them until
    /// completion, cancellation or the next `start`.
    pub idle_timeout: Option<Duration>,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_CAPACITY,
            idle_timeout: None,
        }
    }
}

/// Where a session stands: `step` is 1-based, `field` names what is awaited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepPosition {
    pub kind: FormKind,
    pub step: usize,
    pub total: usize,
    pub field: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step<S, D> {
    Next(S),
    Complete(D),
}

impl<S, D> Step<S, D> {
    fn map<S2, D2>(self, next: impl FnOnce(S) -> S2, complete: impl FnOnce(D) -> D2) -> Step<S2, D2> {
        match self {
            Self::Next(state) => Step::Next(next(state)),
            Self::Complete(draft) => Step::Complete(complete(draft)),
        }
    }
}

/// A linear chain of form steps.
pub trait FormChain: Sized {
    type Draft;

    const KIND: FormKind;
    /// Field awaited at each step, in order.
    const FIELDS: &'static [&'static str];

    fn first() -> Self;

    /// 0-based index of the current step.
    fn step(&self) -> usize;

    /// Validate `input` for the current step.
    fn accept(
        &self,
        input: &str,
        settings: &FormSettings,
    ) -> Result<Step<Self, Self::Draft>, FieldError>;

    fn position(&self) -> StepPosition {
        StepPosition {
            kind: Self::KIND,
            step: self.step() + 1,
            total: Self::FIELDS.len(),
            field: Self::FIELDS.get(self.step()).copied().unwrap_or_default(),
        }
    }
}

fn required(input: &str, field: &'static str) -> Result<String, FieldError> {
    let value = input.trim();
    if value.is_empty() {
        return Err(FieldError::Empty { field });
    }
    Ok(value.to_string())
}

fn parse_capacity(input: &str, default: u32) -> Result<u32, FieldError> {
    let value = input.trim();
    if value == CAPACITY_PLACEHOLDER {
        return Ok(default);
    }
    value
        .parse::<u32>()
        .ok()
        .filter(|capacity| (1..=MAX_CAPACITY).contains(capacity))
        .ok_or_else(|| FieldError::InvalidCapacity(value.to_string()))
}

fn parse_options(input: &str) -> Result<Vec<String>, FieldError> {
    let options: Vec<String> = input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect();
    if options.len() < MIN_OPTIONS {
        return Err(FieldError::TooFewOptions(options.len()));
    }
    if options.len() > MAX_OPTIONS {
        return Err(FieldError::TooManyOptions(options.len()));
    }
    Ok(options)
}

/// Current state of a session, whatever its kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormState {
    Activity(ActivityForm),
    Poll(PollForm),
    Broadcast(BroadcastForm),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Draft {
    Activity(ActivityDraft),
    Poll(PollDraft),
    Broadcast(BroadcastDraft),
}

impl FormState {
    pub fn start(kind: FormKind) -> Self {
        match kind {
            FormKind::Activity => Self::Activity(ActivityForm::first()),
            FormKind::Poll => Self::Poll(PollForm::first()),
            FormKind::Broadcast => Self::Broadcast(BroadcastForm::first()),
        }
    }

    pub fn position(&self) -> StepPosition {
        match self {
            Self::Activity(form) => form.position(),
            Self::Poll(form) => form.position(),
            Self::Broadcast(form) => form.position(),
        }
    }

    fn accept(&self, input: &str, settings: &FormSettings) -> Result<Step<Self, Draft>, FieldError> {
        Ok(match self {
            Self::Activity(form) => form
                .accept(input, settings)?
                .map(Self::Activity, Draft::Activity),
            Self::Poll(form) => form.accept(input, settings)?.map(Self::Poll, Draft::Poll),
            Self::Broadcast(form) => form
                .accept(input, settings)?
                .map(Self::Broadcast, Draft::Broadcast),
        })
    }
}

/// What a finished form produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completed {
    Activity(Activity),
    Poll(Poll),
    /// Text to fan out to every actor.
    Broadcast { message: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The actor has no live session; the input was not consumed.
    NoSession,
    Advanced(StepPosition),
    Rejected {
        position: StepPosition,
        error: FieldError,
    },
    Completed(Completed),
}

#[derive(Debug)]
struct Session {
    state: FormState,
    touched_at: Instant,
}

impl Session {
    fn new(state: FormState) -> Self {
        Self {
            state,
            touched_at: Instant::now(),
        }
    }

    fn is_expired(&self, idle_timeout: Option<Duration>) -> bool {
        idle_timeout.is_some_and(|timeout| self.touched_at.elapsed() >= timeout)
    }
}

type Slot = Arc<Mutex<Option<Session>>>;

#[derive(Clone, Debug)]
pub struct FormEngine {
    store: Store,
    access: AccessPolicy,
    settings: FormSettings,
    slots: Arc<Mutex<HashMap<ActorId, Slot>>>,
}

impl FormEngine {
    pub fn new(store: Store, access: AccessPolicy, settings: FormSettings) -> Self {
        Self {
            store,
            access,
            settings,
            slots: Arc::default(),
        }
    }

    pub fn settings(&self) -> &FormSettings {
        &self.settings
    }

    async fn slot(&self, actor_id: ActorId) -> Slot {
        self.slots
            .lock()
            .await
            .entry(actor_id)
            .or_default()
            .clone()
    }

    async fn existing_slot(&self, actor_id: ActorId) -> Option<Slot> {
        self.slots.lock().await.get(&actor_id).cloned()
    }

    /// Open a fresh session of `kind`, replacing any previous one.
    pub async fn start(&self, actor_id: ActorId, kind: FormKind) -> ResultEngine<StepPosition> {
        self.access.require_admin(actor_id, "starting a form")?;
        let slot = self.slot(actor_id).await;
        let mut session = slot.lock().await;
        if let Some(previous) = session.as_ref() {
            tracing::debug!(
                "actor {actor_id} abandoned {:?} form at step {}",
                previous.state.position().kind,
                previous.state.position().step
            );
        }
        let state = FormState::start(kind);
        let position = state.position();
        *session = Some(Session::new(state));
        tracing::debug!("actor {actor_id} started {kind:?} form");
        Ok(position)
    }

    /// Feed one answer to the actor's session.
    ///
    /// On a storage failure during the commit the session stays on its last
    /// step and the error is returned, so the answer can be sent again.
    pub async fn submit(&self, actor_id: ActorId, input: &str) -> ResultEngine<SubmitOutcome> {
        let Some(slot) = self.existing_slot(actor_id).await else {
            return Ok(SubmitOutcome::NoSession);
        };
        let mut guard = slot.lock().await;
        let Some(session) = guard.as_mut() else {
            return Ok(SubmitOutcome::NoSession);
        };
        if session.is_expired(self.settings.idle_timeout) {
            tracing::debug!("form session of actor {actor_id} expired");
            *guard = None;
            return Ok(SubmitOutcome::NoSession);
        }

        session.touched_at = Instant::now();
        let draft = match session.state.accept(input, &self.settings) {
            Err(error) => {
                return Ok(SubmitOutcome::Rejected {
                    position: session.state.position(),
                    error,
                });
            }
            Ok(Step::Next(next)) => {
                let position = next.position();
                session.state = next;
                return Ok(SubmitOutcome::Advanced(position));
            }
            Ok(Step::Complete(draft)) => draft,
        };

        let completed = self.commit(actor_id, draft).await?;
        *guard = None;
        Ok(SubmitOutcome::Completed(completed))
    }

    async fn commit(&self, actor_id: ActorId, draft: Draft) -> ResultEngine<Completed> {
        match draft {
            Draft::Activity(draft) => {
                let id = self
                    .store
                    .create_activity(
                        &draft.name,
                        &draft.description,
                        &draft.scheduled_at,
                        draft.capacity,
                    )
                    .await?;
                tracing::info!("actor {actor_id} created activity {id}");
                Ok(Completed::Activity(self.store.require_activity(id).await?))
            }
            Draft::Poll(draft) => {
                let id = self.store.create_poll(&draft.question, &draft.options).await?;
                tracing::info!("actor {actor_id} created poll {id}");
                Ok(Completed::Poll(self.store.require_poll(id).await?))
            }
            Draft::Broadcast(draft) => {
                tracing::info!("actor {actor_id} composed a broadcast");
                Ok(Completed::Broadcast {
                    message: draft.message,
                })
            }
        }
    }

    /// Drop the actor's session. Returns whether there was one.
    pub async fn cancel(&self, actor_id: ActorId) -> ResultEngine<bool> {
        self.access.require_admin(actor_id, "cancelling a form")?;
        let Some(slot) = self.existing_slot(actor_id).await else {
            return Ok(false);
        };
        let cancelled = slot.lock().await.take().is_some();
        if cancelled {
            tracing::debug!("actor {actor_id} cancelled the form");
        }
        Ok(cancelled)
    }

    /// Position of the actor's live session, if any.
    pub async fn session(&self, actor_id: ActorId) -> Option<StepPosition> {
        let slot = self.existing_slot(actor_id).await?;
        let guard = slot.lock().await;
        guard
            .as_ref()
            .filter(|session| !session.is_expired(self.settings.idle_timeout))
            .map(|session| session.state.position())
    }

    /// Snapshot of the actor's live session state.
    pub async fn state(&self, actor_id: ActorId) -> Option<FormState> {
        let slot = self.existing_slot(actor_id).await?;
        let guard = slot.lock().await;
        guard
            .as_ref()
            .filter(|session| !session.is_expired(self.settings.idle_timeout))
            .map(|session| session.state.clone())
    }
}
