//! Booking, voting and conversational forms for a capacity-limited event.
//!
//! [`Store`] owns the durable state and its atomic operations. The
//! [`ReservationEngine`], [`VotingEngine`] and [`FormEngine`] sit on top of it
//! and are what a chat front end calls into.

pub use access::{AccessPolicy, Role};
pub use activities::{Activity, DEFAULT_CAPACITY, MAX_CAPACITY};
pub use actors::{Actor, ActorProfile};
pub use bookings::{ActivityBooking, ActorBooking, BookingOutcome};
pub use broadcast::{FanOutReport, fan_out};
pub use error::EngineError;
pub use export::{ExportRow, write_csv};
pub use forms::{
    CAPACITY_PLACEHOLDER, Completed, FieldError, FormEngine, FormKind, FormSettings, FormState,
    StepPosition, SubmitOutcome,
};
pub use ops::{Store, StoreBuilder};
pub use poll_votes::{BallotOutcome, Tally};
pub use polls::{MAX_OPTIONS, MIN_OPTIONS, Poll};
pub use reservations::{
    BookingReply, CancellationReply, CapacityView, CatalogueEntry, ReservationEngine, Roster,
};
pub use voting::{OptionResult, PollResults, VoteOutcome, VotingEngine};

mod access;
mod activities;
mod actors;
mod bookings;
pub mod broadcast;
mod error;
pub mod export;
pub mod forms;
mod ops;
mod poll_votes;
mod polls;
mod reservations;
mod voting;

/// Chat platform user id.
pub type ActorId = i64;
pub type ActivityId = i32;
pub type PollId = i32;

pub type ResultEngine<T> = Result<T, EngineError>;
