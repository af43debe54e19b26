use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SearchTerm::Table)
                    .if_not_exists()
                    .col(pk_auto(SearchTerm::Id))
                    .col(string(SearchTerm::Term).unique_key())
                    .col(big_integer(SearchTerm::LastSearch))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SearchTerm::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum SearchTerm {
    Table,
    Id,
    Term,
    LastSearch,
}
