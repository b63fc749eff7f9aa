use sea_orm_migration::prelude::*;

const DEFAULT_TAGS: [(&str, &str); 4] = [
    ("Breakfast", "breakfast"),
    ("Lunch", "lunch"),
    ("Dinner", "dinner"),
    ("Dessert", "dessert"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert
            .into_table(Tags::Table)
            .columns([Tags::Name, Tags::Slug]);

        for (name, slug) in DEFAULT_TAGS {
            insert.values_panic([name.into(), slug.into()]);
        }

        manager.exec_stmt(insert.to_owned()).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Tags::Table)
                    .and_where(Expr::col(Tags::Slug).is_in(DEFAULT_TAGS.map(|(_, slug)| slug)))
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Name,
    Slug,
}
