use chrono::Utc;
use sea_orm::{
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Statement, prelude::*, sea_query::Expr,
};

use crate::{
    ActorId, BallotOutcome, EngineError, Poll, PollId, ResultEngine, Tally, poll_votes, polls,
};

use super::{Store, Violation, normalize_required_text, violation};

const GUARDED_VOTE: &str = "INSERT INTO poll_votes (poll_id, actor_id, option_index, voted_at) \
     SELECT p.id, ?, ?, ? FROM polls p WHERE p.id = ?;";

impl Store {
    /// Add a poll with 2 to 10 options and return its id.
    pub async fn create_poll(&self, question: &str, options: &[String]) -> ResultEngine<PollId> {
        let question = normalize_required_text(question, "poll question")?;
        let options: Vec<String> = options.iter().map(|o| o.trim().to_string()).collect();
        polls::validate_options(&options)?;

        let model = polls::ActiveModel::new_poll(question.clone(), &options, Utc::now())?;
        let inserted = model.insert(&self.database).await?;
        tracing::info!(
            "created poll {} \"{}\" with {} options",
            inserted.id,
            question,
            options.len()
        );
        Ok(inserted.id)
    }

    pub async fn poll(&self, id: PollId) -> ResultEngine<Option<Poll>> {
        polls::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(Poll::try_from)
            .transpose()
    }

    /// Return the poll or `NotFound`.
    pub async fn require_poll(&self, id: PollId) -> ResultEngine<Poll> {
        self.poll(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("poll {id}")))
    }

    /// Polls, newest first.
    pub async fn list_polls(&self, active_only: bool) -> ResultEngine<Vec<Poll>> {
        let mut query = polls::Entity::find();
        if active_only {
            query = query.filter(polls::Column::IsActive.eq(true));
        }
        query
            .order_by_desc(polls::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Poll::try_from)
            .collect()
    }

    /// Record one vote. `option_index` is not checked here; callers validate
    /// it against the poll's options first.
    pub async fn vote(
        &self,
        poll_id: PollId,
        actor_id: ActorId,
        option_index: usize,
    ) -> ResultEngine<BallotOutcome> {
        let option_index = i32::try_from(option_index)
            .map_err(|_| EngineError::ValidationFailed("option index is too large".to_string()))?;
        let backend = self.database.get_database_backend();
        let inserted = self
            .database
            .execute(Statement::from_sql_and_values(
                backend,
                GUARDED_VOTE,
                vec![
                    actor_id.into(),
                    option_index.into(),
                    Utc::now().into(),
                    poll_id.into(),
                ],
            ))
            .await;

        match inserted {
            Ok(result) if result.rows_affected() > 0 => {
                tracing::debug!("actor {actor_id} voted {option_index} in poll {poll_id}");
                Ok(BallotOutcome::Voted)
            }
            Ok(_) => Ok(BallotOutcome::NotFound),
            Err(err) => match violation(&err) {
                Some(Violation::Unique) => Ok(BallotOutcome::AlreadyVoted),
                Some(Violation::ForeignKey) => {
                    Err(EngineError::NotFound(format!("actor {actor_id}")))
                }
                None => {
                    tracing::error!("vote insert failed: {err}");
                    Err(err.into())
                }
            },
        }
    }

    /// Votes per option index.
    ///
    /// Every option of the poll is present, zero-filled. The counts always
    /// add up to the number of vote rows of the poll.
    pub async fn tally(&self, poll_id: PollId) -> ResultEngine<Tally> {
        let poll = self.require_poll(poll_id).await?;
        let rows: Vec<(i32, i64)> = poll_votes::Entity::find()
            .select_only()
            .column(poll_votes::Column::OptionIndex)
            .column_as(poll_votes::Column::Id.count(), "votes")
            .filter(poll_votes::Column::PollId.eq(poll_id))
            .group_by(poll_votes::Column::OptionIndex)
            .into_tuple()
            .all(&self.database)
            .await?;

        let mut tally: Tally = (0..poll.options.len()).map(|i| (i, 0)).collect();
        for (index, votes) in rows {
            let index = usize::try_from(index).map_err(|_| {
                EngineError::Corrupted(format!("poll {poll_id} has a negative option index"))
            })?;
            *tally.entry(index).or_default() += u64::try_from(votes).unwrap_or_default();
        }
        Ok(tally)
    }

    pub async fn count_votes(&self, poll_id: PollId) -> ResultEngine<u64> {
        Ok(poll_votes::Entity::find()
            .filter(poll_votes::Column::PollId.eq(poll_id))
            .count(&self.database)
            .await?)
    }

    /// Mark the poll inactive. Returns whether it was still active.
    pub async fn close_poll(&self, poll_id: PollId) -> ResultEngine<bool> {
        let updated = polls::Entity::update_many()
            .col_expr(polls::Column::IsActive, Expr::value(false))
            .filter(polls::Column::Id.eq(poll_id))
            .filter(polls::Column::IsActive.eq(true))
            .exec(&self.database)
            .await?;
        if updated.rows_affected > 0 {
            tracing::info!("closed poll {poll_id}");
        }
        Ok(updated.rows_affected > 0)
    }
}
