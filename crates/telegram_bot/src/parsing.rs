//! Callback payloads.
//!
//! Every inline button carries a short `kind:arg[:arg]` string. `Action`
//! renders to that string with `Display` and parses back with `FromStr`, so
//! the keyboards and the dispatcher cannot drift apart.

use std::{fmt, str::FromStr};

use engine::{ActivityId, PollId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AdminAction {
    NewActivity,
    NewPoll,
    Broadcast,
    Activities,
    Polls,
    Participants,
}

impl AdminAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::NewActivity => "new_activity",
            Self::NewPoll => "new_poll",
            Self::Broadcast => "broadcast",
            Self::Activities => "activities",
            Self::Polls => "polls",
            Self::Participants => "participants",
        }
    }
}

impl FromStr for AdminAction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "new_activity" => Self::NewActivity,
            "new_poll" => Self::NewPoll,
            "broadcast" => Self::Broadcast,
            "activities" => Self::Activities,
            "polls" => Self::Polls,
            "participants" => Self::Participants,
            other => return Err(ParseError::Unknown(format!("admin:{other}"))),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    ShowActivity(ActivityId),
    Book(ActivityId),
    CancelBooking(ActivityId),
    /// The index is kept signed and unchecked; the voting engine rejects
    /// anything outside the poll's options.
    Vote { poll: PollId, option: i64 },
    Results(PollId),
    ClosePoll(PollId),
    Admin(AdminAction),
    Roster(ActivityId),
    Export(ActivityId),
    FormCancel,
    NavHome,
    NavActivities,
    NavBookings,
    NavAdmin,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ParseError {
    #[error("unknown action \"{0}\"")]
    Unknown(String),
    #[error("invalid id in \"{0}\"")]
    InvalidId(String),
}

fn id<T: FromStr>(raw: &str, payload: &str) -> Result<T, ParseError> {
    raw.parse()
        .map_err(|_| ParseError::InvalidId(payload.to_string()))
}

impl FromStr for Action {
    type Err = ParseError;

    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = payload.split_once(':').unwrap_or((payload, ""));
        Ok(match (kind, rest) {
            ("activity", arg) => Self::ShowActivity(id(arg, payload)?),
            ("book", arg) => Self::Book(id(arg, payload)?),
            ("cancel", arg) => Self::CancelBooking(id(arg, payload)?),
            ("vote", args) => {
                let (poll, option) = args
                    .split_once(':')
                    .ok_or_else(|| ParseError::InvalidId(payload.to_string()))?;
                Self::Vote {
                    poll: id(poll, payload)?,
                    option: id(option, payload)?,
                }
            }
            ("results", arg) => Self::Results(id(arg, payload)?),
            ("close", arg) => Self::ClosePoll(id(arg, payload)?),
            ("admin", arg) => Self::Admin(arg.parse()?),
            ("roster", arg) => Self::Roster(id(arg, payload)?),
            ("export", arg) => Self::Export(id(arg, payload)?),
            ("form", "cancel") => Self::FormCancel,
            ("nav", "home") => Self::NavHome,
            ("nav", "activities") => Self::NavActivities,
            ("nav", "bookings") => Self::NavBookings,
            ("nav", "admin") => Self::NavAdmin,
            _ => return Err(ParseError::Unknown(payload.to_string())),
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShowActivity(id) => write!(f, "activity:{id}"),
            Self::Book(id) => write!(f, "book:{id}"),
            Self::CancelBooking(id) => write!(f, "cancel:{id}"),
            Self::Vote { poll, option } => write!(f, "vote:{poll}:{option}"),
            Self::Results(id) => write!(f, "results:{id}"),
            Self::ClosePoll(id) => write!(f, "close:{id}"),
            Self::Admin(action) => write!(f, "admin:{}", action.as_str()),
            Self::Roster(id) => write!(f, "roster:{id}"),
            Self::Export(id) => write!(f, "export:{id}"),
            Self::FormCancel => f.write_str("form:cancel"),
            Self::NavHome => f.write_str("nav:home"),
            Self::NavActivities => f.write_str("nav:activities"),
            Self::NavBookings => f.write_str("nav:bookings"),
            Self::NavAdmin => f.write_str("nav:admin"),
        }
    }
}
