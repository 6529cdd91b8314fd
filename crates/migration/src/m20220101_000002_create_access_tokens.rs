//! Create `access_tokens` table.
//! One row per issued bearer token; deleting the row revokes the token.
//! Rows cascade with their owning user.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccessTokens::Table)
                    .if_not_exists()
                    .col(uuid(AccessTokens::Id).primary_key())
                    .col(uuid(AccessTokens::UserId).not_null())
                    .col(string_len(AccessTokens::Name, 64).not_null())
                    .col(timestamp_with_time_zone(AccessTokens::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(AccessTokens::ExpiresAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_access_tokens_user")
                            .from(AccessTokens::Table, AccessTokens::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccessTokens::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AccessTokens {
    Table,
    Id,
    UserId,
    Name,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum Users { Table, Id }
