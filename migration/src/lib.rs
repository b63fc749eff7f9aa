mod m20251019_000001_create_users_table;
mod m20251019_000002_create_reference_tables;
mod m20251019_000003_create_recipes_table;
mod m20251019_000004_create_recipe_links_tables;
mod m20251019_000005_create_membership_tables;
mod m20251019_000006_seed_default_tags;

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251019_000001_create_users_table::Migration),
            Box::new(m20251019_000002_create_reference_tables::Migration),
            Box::new(m20251019_000003_create_recipes_table::Migration),
            Box::new(m20251019_000004_create_recipe_links_tables::Migration),
            Box::new(m20251019_000005_create_membership_tables::Migration),
            Box::new(m20251019_000006_seed_default_tags::Migration),
        ]
    }
}
