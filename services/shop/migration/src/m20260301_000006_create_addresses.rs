use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Addresses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Addresses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Addresses::UserId).uuid().not_null())
                    .col(ColumnDef::new(Addresses::Phone).string_len(15).not_null())
                    .col(
                        ColumnDef::new(Addresses::AddressType)
                            .string_len(10)
                            .not_null()
                            .default("home"),
                    )
                    .col(ColumnDef::new(Addresses::Street).string().not_null())
                    .col(ColumnDef::new(Addresses::City).string_len(100).not_null())
                    .col(ColumnDef::new(Addresses::State).string_len(100).not_null())
                    .col(ColumnDef::new(Addresses::ZipCode).string_len(10).not_null())
                    .col(
                        ColumnDef::new(Addresses::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Addresses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Addresses::Table, Addresses::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Addresses::Table)
                    .col(Addresses::UserId)
                    .name("idx_addresses_user_id")
                    .to_owned(),
            )
            .await?;

        // At most one default address per user.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_addresses_user_default \
                 ON addresses (user_id) WHERE is_default",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Addresses::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Addresses {
    Table,
    Id,
    UserId,
    Phone,
    AddressType,
    Street,
    City,
    State,
    ZipCode,
    IsDefault,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
