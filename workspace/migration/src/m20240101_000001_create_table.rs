use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(string_null(Users::FirstName))
                    .col(string_null(Users::LastName))
                    .col(string_null(Users::Avatar))
                    .col(string_null(Users::Phone))
                    .col(string_null(Users::Country))
                    .col(boolean(Users::IsActive).default(true))
                    .col(boolean(Users::IsStaff).default(false))
                    .col(boolean(Users::IsSuperuser).default(false))
                    .col(timestamp_with_time_zone(Users::DateJoined))
                    .col(timestamp_with_time_zone_null(Users::LastLogin))
                    .to_owned(),
            )
            .await?;

        // Create network_entities table
        manager
            .create_table(
                Table::create()
                    .table(NetworkEntities::Table)
                    .if_not_exists()
                    .col(pk_auto(NetworkEntities::Id))
                    .col(string(NetworkEntities::Name))
                    .col(integer_null(NetworkEntities::SupplierId))
                    .col(decimal(NetworkEntities::Debt).decimal_len(10, 2).default(0))
                    .col(timestamp_with_time_zone(NetworkEntities::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_network_entity_supplier")
                            .from(NetworkEntities::Table, NetworkEntities::SupplierId)
                            .to(NetworkEntities::Table, NetworkEntities::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create contacts table
        manager
            .create_table(
                Table::create()
                    .table(Contacts::Table)
                    .if_not_exists()
                    .col(pk_auto(Contacts::Id))
                    .col(integer(Contacts::NetworkEntityId).unique_key())
                    .col(string(Contacts::Email))
                    .col(string(Contacts::Country))
                    .col(string(Contacts::City))
                    .col(string(Contacts::Street))
                    .col(string(Contacts::HouseNumber))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contact_network_entity")
                            .from(Contacts::Table, Contacts::NetworkEntityId)
                            .to(NetworkEntities::Table, NetworkEntities::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create products table
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(pk_auto(Products::Id))
                    .col(integer(Products::NetworkEntityId))
                    .col(string(Products::Name))
                    .col(string(Products::Model))
                    .col(date(Products::ReleaseDate))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_network_entity")
                            .from(Products::Table, Products::NetworkEntityId)
                            .to(NetworkEntities::Table, NetworkEntities::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Contacts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(NetworkEntities::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

// Define identifiers for all tables

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    Avatar,
    Phone,
    Country,
    IsActive,
    IsStaff,
    IsSuperuser,
    DateJoined,
    LastLogin,
}

#[derive(DeriveIden)]
enum NetworkEntities {
    Table,
    Id,
    Name,
    SupplierId,
    Debt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Contacts {
    Table,
    Id,
    NetworkEntityId,
    Email,
    Country,
    City,
    Street,
    HouseNumber,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    NetworkEntityId,
    Name,
    Model,
    ReleaseDate,
}
