pub use sea_orm_migration::prelude::*;

pub use seed::seed_sample_activities;

mod m20251101_000000_init;
mod seed;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20251101_000000_init::Migration)]
    }
}
