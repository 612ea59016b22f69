//! Initial migration creating the outcome and organization tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_feeder_repos(manager).await?;
        self.create_feeder_orgs(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FeederOrgs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FeederRepos::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_feeder_repos(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FeederRepos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FeederRepos::OwnerRepo)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FeederRepos::Status).string().not_null())
                    .col(ColumnDef::new(FeederRepos::FailureCategory).string().null())
                    .col(ColumnDef::new(FeederRepos::Organization).string().null())
                    .col(
                        ColumnDef::new(FeederRepos::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Status reports group by outcome.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_feeder_repos_status")
                    .table(FeederRepos::Table)
                    .col(FeederRepos::Status)
                    .col(FeederRepos::FailureCategory)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_feeder_orgs(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FeederOrgs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FeederOrgs::Name)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FeederOrgs::DeclaredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum FeederRepos {
    Table,
    OwnerRepo,
    Status,
    FailureCategory,
    Organization,
    RecordedAt,
}

#[derive(DeriveIden)]
enum FeederOrgs {
    Table,
    Name,
    DeclaredAt,
}
