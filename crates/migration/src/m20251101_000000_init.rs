//! Initial schema migration.
//!
//! Creates the complete schema for the conference bot:
//!
//! - `actors`: everyone who ever talked to the bot
//! - `activities`: capacity-bounded slots actors can reserve
//! - `bookings`: one row per (actor, activity) reservation
//! - `polls`: single-choice questions, options stored as a JSON array
//! - `poll_votes`: one row per (poll, actor) vote

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Actors {
    Table,
    Id,
    Username,
    FirstName,
    LastName,
    IsAdmin,
    RegisteredAt,
}

#[derive(Iden)]
pub(crate) enum Activities {
    Table,
    Id,
    Name,
    Description,
    ScheduledAt,
    Capacity,
    IsActive,
}

#[derive(Iden)]
enum Bookings {
    Table,
    Id,
    ActorId,
    ActivityId,
    BookedAt,
}

#[derive(Iden)]
enum Polls {
    Table,
    Id,
    Question,
    Options,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum PollVotes {
    Table,
    Id,
    PollId,
    ActorId,
    OptionIndex,
    VotedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Actors
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Actors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Actors::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Actors::Username).string())
                    .col(ColumnDef::new(Actors::FirstName).string())
                    .col(ColumnDef::new(Actors::LastName).string())
                    .col(
                        ColumnDef::new(Actors::IsAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Actors::RegisteredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Activities
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Activities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activities::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Activities::Name).string().not_null())
                    .col(
                        ColumnDef::new(Activities::Description)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Activities::ScheduledAt)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Activities::Capacity)
                            .integer()
                            .not_null()
                            .default(50),
                    )
                    .col(
                        ColumnDef::new(Activities::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Bookings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::ActorId).big_integer().not_null())
                    .col(ColumnDef::new(Bookings::ActivityId).integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::BookedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-actor_id")
                            .from(Bookings::Table, Bookings::ActorId)
                            .to(Actors::Table, Actors::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-activity_id")
                            .from(Bookings::Table, Bookings::ActivityId)
                            .to(Activities::Table, Activities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-actor_id-activity_id-unique")
                    .table(Bookings::Table)
                    .col(Bookings::ActorId)
                    .col(Bookings::ActivityId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-activity_id")
                    .table(Bookings::Table)
                    .col(Bookings::ActivityId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Polls
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Polls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Polls::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Polls::Question).string().not_null())
                    .col(ColumnDef::new(Polls::Options).text().not_null())
                    .col(
                        ColumnDef::new(Polls::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Polls::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Poll votes
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PollVotes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PollVotes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PollVotes::PollId).integer().not_null())
                    .col(ColumnDef::new(PollVotes::ActorId).big_integer().not_null())
                    .col(ColumnDef::new(PollVotes::OptionIndex).integer().not_null())
                    .col(
                        ColumnDef::new(PollVotes::VotedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-poll_votes-poll_id")
                            .from(PollVotes::Table, PollVotes::PollId)
                            .to(Polls::Table, Polls::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-poll_votes-actor_id")
                            .from(PollVotes::Table, PollVotes::ActorId)
                            .to(Actors::Table, Actors::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-poll_votes-poll_id-actor_id-unique")
                    .table(PollVotes::Table)
                    .col(PollVotes::PollId)
                    .col(PollVotes::ActorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(PollVotes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Polls::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Activities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Actors::Table).to_owned())
            .await?;
        Ok(())
    }
}
