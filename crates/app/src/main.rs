use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "confbot={level},telegram_bot={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    let Some(telegram) = settings.telegram.as_ref() else {
        tracing::error!("missing telegram settings, nothing to run");
        return Ok(());
    };
    let export_tz = settings.export.timezone()?;

    let db = parse_database(&settings.database).await?;
    let store = engine::Store::builder().database(db).build().await?;

    let bot = telegram_bot::Bot::builder()
        .token(&telegram.token)
        .store(store)
        .admins(telegram.admins.clone())
        .form_settings(settings.form_settings())
        .export_timezone(export_tz)
        .build()?;
    bot.run().await;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
    };

    tracing::info!("opening database {url}");
    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
