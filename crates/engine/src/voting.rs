//! Voting engine: single-choice votes, results and closing.
//!
//! Votes are not refused on closed polls. Closing only stops solicitation,
//! the presentation layer drops the vote buttons of a closed poll.

use crate::{AccessPolicy, ActorId, BallotOutcome, Poll, PollId, ResultEngine, Store};

/// Outcome of [`VotingEngine::cast_vote`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    Voted { option: String },
    AlreadyVoted,
    InvalidOption,
    PollNotFound,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OptionResult {
    pub label: String,
    pub votes: u64,
    /// Share of all votes cast, in [0, 100].
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PollResults {
    pub poll: Poll,
    /// One entry per option, in the poll's order.
    pub options: Vec<OptionResult>,
    pub total: u64,
}

impl PollResults {
    pub fn is_active(&self) -> bool {
        self.poll.is_active
    }
}

fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    votes as f64 * 100.0 / total as f64
}

#[derive(Clone, Debug)]
pub struct VotingEngine {
    store: Store,
    access: AccessPolicy,
}

impl VotingEngine {
    pub fn new(store: Store, access: AccessPolicy) -> Self {
        Self { store, access }
    }

    pub async fn cast_vote(
        &self,
        poll_id: PollId,
        actor_id: ActorId,
        option_index: i64,
    ) -> ResultEngine<VoteOutcome> {
        let Some(poll) = self.store.poll(poll_id).await? else {
            return Ok(VoteOutcome::PollNotFound);
        };
        let Some((index, label)) = usize::try_from(option_index)
            .ok()
            .and_then(|index| poll.options.get(index).map(|label| (index, label.clone())))
        else {
            tracing::debug!("actor {actor_id} sent option {option_index} for poll {poll_id}");
            return Ok(VoteOutcome::InvalidOption);
        };

        Ok(match self.store.vote(poll_id, actor_id, index).await? {
            BallotOutcome::Voted => VoteOutcome::Voted { option: label },
            BallotOutcome::AlreadyVoted => VoteOutcome::AlreadyVoted,
            BallotOutcome::NotFound => VoteOutcome::PollNotFound,
        })
    }

    pub async fn results(&self, poll_id: PollId) -> ResultEngine<PollResults> {
        let poll = self.store.require_poll(poll_id).await?;
        let tally = self.store.tally(poll_id).await?;
        let total: u64 = tally.values().sum();
        let options = poll
            .options
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let votes = tally.get(&index).copied().unwrap_or_default();
                OptionResult {
                    label: label.clone(),
                    votes,
                    percentage: percentage(votes, total),
                }
            })
            .collect();
        Ok(PollResults {
            poll,
            options,
            total,
        })
    }

    /// Close a poll. Administrators only. Returns `false` when it was
    /// already closed.
    pub async fn close(&self, admin_id: ActorId, poll_id: PollId) -> ResultEngine<bool> {
        self.access.require_admin(admin_id, "closing a poll")?;
        self.store.require_poll(poll_id).await?;
        self.store.close_poll(poll_id).await
    }

    pub async fn poll(&self, poll_id: PollId) -> ResultEngine<Option<Poll>> {
        self.store.poll(poll_id).await
    }

    pub async fn polls(&self, active_only: bool) -> ResultEngine<Vec<Poll>> {
        self.store.list_polls(active_only).await
    }
}
