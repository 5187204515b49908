//! Sample activities for a fresh database.

use sea_orm::{ConnectionTrait, DbErr};
use sea_orm_migration::prelude::*;

use crate::m20251101_000000_init::Activities;

const SAMPLE_ACTIVITIES: [(&str, &str, &str, i32); 4] = [
    (
        "Воркшоп по AI и ML",
        "Практический воркшоп по применению машинного обучения в реальных проектах",
        "15 ноября, 11:00",
        50,
    ),
    (
        "Нетворкинг-сессия",
        "Неформальное общение участников, обмен контактами и опытом",
        "15 ноября, 14:00",
        50,
    ),
    (
        "Мастер-класс по Python",
        "Продвинутые техники программирования на Python для профессионалов",
        "16 ноября, 10:00",
        30,
    ),
    (
        "Круглый стол: Будущее IT",
        "Дискуссия о трендах и перспективах развития IT-индустрии",
        "16 ноября, 14:00",
        50,
    ),
];

/// Insert the sample activities when the `activities` table is empty.
///
/// Returns the number of inserted rows, `0` if the table already had data.
pub async fn seed_sample_activities<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    let backend = db.get_database_backend();

    let count = Query::select()
        .expr(Func::count(Expr::col(Activities::Id)))
        .from(Activities::Table)
        .to_owned();
    let existing = match db.query_one(backend.build(&count)).await? {
        Some(row) => row.try_get_by_index::<i64>(0)?,
        None => 0,
    };
    if existing > 0 {
        return Ok(0);
    }

    let mut insert = Query::insert();
    insert.into_table(Activities::Table).columns([
        Activities::Name,
        Activities::Description,
        Activities::ScheduledAt,
        Activities::Capacity,
        Activities::IsActive,
    ]);
    for (name, description, scheduled_at, capacity) in SAMPLE_ACTIVITIES {
        let row: [SimpleExpr; 5] = [
            name.into(),
            description.into(),
            scheduled_at.into(),
            capacity.into(),
            true.into(),
        ];
        insert
            .values(row)
            .map_err(|err| DbErr::Custom(err.to_string()))?;
    }

    Ok(db.execute(backend.build(&insert)).await?.rows_affected())
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;

    use super::*;
    use crate::Migrator;

    #[tokio::test]
    async fn seeds_an_empty_database_once() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        assert_eq!(seed_sample_activities(&db).await.unwrap(), 4);
        assert_eq!(seed_sample_activities(&db).await.unwrap(), 0);

        let row = db
            .query_one(db.get_database_backend().build(
                Query::select()
                    .expr(Func::sum(Expr::col(Activities::Capacity)))
                    .from(Activities::Table),
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.try_get_by_index::<i64>(0).unwrap(), 180);
    }
}
