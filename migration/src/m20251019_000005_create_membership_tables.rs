use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Builds a `(user_id, recipe_id)` membership table; favorites and the
/// shopping cart share the same shape.
fn user_recipe_table<T: Iden + Copy + 'static>(table: T, prefix: &str) -> TableCreateStatement {
    Table::create()
        .table(table)
        .if_not_exists()
        .col(ColumnDef::new(Membership::UserId).integer().not_null())
        .col(ColumnDef::new(Membership::RecipeId).integer().not_null())
        .primary_key(
            Index::create()
                .col(Membership::UserId)
                .col(Membership::RecipeId),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{prefix}_user_id"))
                .from(table, Membership::UserId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{prefix}_recipe_id"))
                .from(table, Membership::RecipeId)
                .to(Recipes::Table, Recipes::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(user_recipe_table(Favorites::Table, "favorites"))
            .await?;

        manager
            .create_table(user_recipe_table(ShoppingCart::Table, "shopping_cart"))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Follows::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Follows::UserId).integer().not_null())
                    .col(ColumnDef::new(Follows::AuthorId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(Follows::UserId)
                            .col(Follows::AuthorId),
                    )
                    .check(Expr::col(Follows::UserId).ne(Expr::col(Follows::AuthorId)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follows_user_id")
                            .from(Follows::Table, Follows::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follows_author_id")
                            .from(Follows::Table, Follows::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Follows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShoppingCart::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Favorites::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Favorites {
    Table,
}

#[derive(DeriveIden, Clone, Copy)]
enum ShoppingCart {
    Table,
}

#[derive(DeriveIden)]
enum Membership {
    UserId,
    RecipeId,
}

#[derive(DeriveIden)]
enum Follows {
    Table,
    UserId,
    AuthorId,
}

// Foreign key targets
#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Recipes {
    Table,
    Id,
}
