use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActivationOtps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivationOtps::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivationOtps::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(ActivationOtps::Secret)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivationOtps::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ActivationOtps::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ActivationOtps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ActivationOtps::Table, ActivationOtps::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(ActivationOtps::Table)
                    .col(ActivationOtps::UserId)
                    .col(ActivationOtps::CreatedAt)
                    .name("idx_activation_otps_user_id_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivationOtps::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ActivationOtps {
    Table,
    Id,
    UserId,
    Secret,
    Attempts,
    IsVerified,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
