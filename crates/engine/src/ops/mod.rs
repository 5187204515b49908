use sea_orm::{DatabaseConnection, DbErr, SqlErr};

use crate::{EngineError, ResultEngine};

mod activities;
mod actors;
mod bookings;
mod export;
mod polls;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Durable record of actors, activities, bookings, polls and votes.
///
/// Every write that checks a capacity or a uniqueness rule does the check and
/// the write in a single SQL statement, so SQLite's writer lock covers both.
/// Expected outcomes (full, duplicate, missing) are returned as values; only
/// storage trouble surfaces as [`EngineError::StorageUnavailable`].
#[derive(Clone, Debug)]
pub struct Store {
    database: DatabaseConnection,
}

impl Store {
    /// Return a builder for `Store`. Help to build the struct.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Violation {
    Unique,
    ForeignKey,
}

fn violation(err: &DbErr) -> Option<Violation> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Some(Violation::Unique),
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => Some(Violation::ForeignKey),
        _ => None,
    }
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::ValidationFailed(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Store`
#[derive(Default)]
pub struct StoreBuilder {
    database: DatabaseConnection,
}

impl StoreBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> StoreBuilder {
        self.database = db;
        self
    }

    /// Construct `Store`
    pub async fn build(self) -> ResultEngine<Store> {
        self.database.ping().await?;
        Ok(Store {
            database: self.database,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_is_trimmed() {
        assert_eq!(
            normalize_required_text("  Workshop ", "name"),
            Ok("Workshop".to_string())
        );
        assert_eq!(
            normalize_required_text("   ", "name"),
            Err(EngineError::ValidationFailed(
                "name must not be empty".to_string()
            ))
        );
    }

    #[test]
    fn optional_text_drops_blanks() {
        assert_eq!(normalize_optional_text(Some(" ada ")), Some("ada".to_string()));
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(normalize_optional_text(None), None);
    }
}
