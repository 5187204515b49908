#![allow(dead_code)]

use std::path::PathBuf;

use sea_orm::Database;

use engine::{ActivityId, ActorId, ActorProfile, Store};
use migration::MigratorTrait;

async fn store_at(url: &str) -> Store {
    let db = Database::connect(url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Store::builder().database(db).build().await.unwrap()
}

pub async fn store_with_db() -> Store {
    store_at("sqlite::memory:").await
}

/// A store backed by a fresh file under `target/test_dbs`, so that several
/// pooled connections really compete for the writer lock.
pub async fn store_with_file_db(name: &str) -> (Store, PathBuf) {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("{name}_{}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let url = format!("sqlite:{}?mode=rwc", path.display());
    (store_at(&url).await, path)
}

pub async fn register(store: &Store, ids: impl IntoIterator<Item = ActorId>) {
    for id in ids {
        let profile = ActorProfile {
            username: Some(format!("user{id}")),
            first_name: Some(format!("First{id}")),
            last_name: None,
        };
        store.upsert_actor(id, &profile, false).await.unwrap();
    }
}

pub async fn activity(store: &Store, name: &str, capacity: u32) -> ActivityId {
    store
        .create_activity(name, "description", "15 November, 14:00", capacity)
        .await
        .unwrap()
}
