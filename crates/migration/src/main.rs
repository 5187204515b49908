use clap::{Parser, Subcommand};
use migration::Migrator;
use sea_orm::Database;
use sea_orm_migration::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "confbot_migration")]
#[command(about = "Apply or inspect the confbot database schema")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./confbot.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Option<Operation>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Operation {
    /// Apply pending migrations (default).
    Up,
    /// Roll back the last applied migration.
    Down,
    /// Drop every table and re-apply all migrations.
    Fresh,
    /// Print applied and pending migrations.
    Status,
    /// Apply pending migrations, then add sample activities to an empty database.
    Seed,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let db = Database::connect(&cli.database_url).await?;

    match cli.command.unwrap_or(Operation::Up) {
        Operation::Up => Migrator::up(&db, None).await?,
        Operation::Down => Migrator::down(&db, Some(1)).await?,
        Operation::Fresh => Migrator::fresh(&db).await?,
        Operation::Status => Migrator::status(&db).await?,
        Operation::Seed => {
            Migrator::up(&db, None).await?;
            let inserted = migration::seed_sample_activities(&db).await?;
            println!("Inserted {inserted} sample activities");
        }
    }

    Ok(())
}
