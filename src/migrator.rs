use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_categories_table::Migration),
            Box::new(m20240601_000002_create_products_table::Migration),
            Box::new(m20240601_000003_create_quotes_table::Migration),
            Box::new(m20240601_000004_create_quote_items_table::Migration),
            Box::new(m20240601_000005_create_inquiries_table::Migration),
        ]
    }
}

mod m20240601_000001_create_categories_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_categories_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .col(
                            ColumnDef::new(Categories::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Categories::Description).text().null())
                        .col(ColumnDef::new(Categories::ImageUrl).string().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Categories {
        Table,
        Id,
        Name,
        Slug,
        Description,
        ImageUrl,
    }
}

mod m20240601_000002_create_products_table {
    use super::m20240601_000001_create_categories_table::Categories;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Description).text().not_null())
                        .col(ColumnDef::new(Products::Price).big_integer().null())
                        .col(ColumnDef::new(Products::CategoryId).integer().null())
                        .col(ColumnDef::new(Products::ImageUrl).string().not_null())
                        .col(ColumnDef::new(Products::Gallery).json().null())
                        .col(ColumnDef::new(Products::Specifications).json().null())
                        .col(
                            ColumnDef::new(Products::IsCustomizable)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Products::Material).string().null())
                        .col(ColumnDef::new(Products::SeatingCapacity).string().null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_category_id")
                                .from(Products::Table, Products::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category_id")
                        .table(Products::Table)
                        .col(Products::CategoryId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Name,
        Description,
        Price,
        CategoryId,
        ImageUrl,
        Gallery,
        Specifications,
        IsCustomizable,
        Material,
        SeatingCapacity,
        CreatedAt,
    }
}

mod m20240601_000003_create_quotes_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_quotes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Quotes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Quotes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Quotes::UserId).string().null())
                        .col(
                            ColumnDef::new(Quotes::Status)
                                .string_len(20)
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(Quotes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_quotes_user_id")
                        .table(Quotes::Table)
                        .col(Quotes::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Quotes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Quotes {
        Table,
        Id,
        UserId,
        Status,
        CreatedAt,
    }
}

mod m20240601_000004_create_quote_items_table {
    use super::m20240601_000002_create_products_table::Products;
    use super::m20240601_000003_create_quotes_table::Quotes;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_quote_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(QuoteItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuoteItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(QuoteItems::QuoteId).integer().not_null())
                        .col(ColumnDef::new(QuoteItems::ProductId).integer().not_null())
                        .col(
                            ColumnDef::new(QuoteItems::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(QuoteItems::CustomizationNotes).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quote_items_quote_id")
                                .from(QuoteItems::Table, QuoteItems::QuoteId)
                                .to(Quotes::Table, Quotes::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quote_items_product_id")
                                .from(QuoteItems::Table, QuoteItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_quote_items_quote_id")
                        .table(QuoteItems::Table)
                        .col(QuoteItems::QuoteId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(QuoteItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum QuoteItems {
        Table,
        Id,
        QuoteId,
        ProductId,
        Quantity,
        CustomizationNotes,
    }
}

mod m20240601_000005_create_inquiries_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000005_create_inquiries_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Inquiries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Inquiries::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Inquiries::Name).string().not_null())
                        .col(ColumnDef::new(Inquiries::Email).string().not_null())
                        .col(ColumnDef::new(Inquiries::Company).string().null())
                        .col(ColumnDef::new(Inquiries::Message).text().not_null())
                        .col(
                            ColumnDef::new(Inquiries::Type)
                                .string_len(32)
                                .not_null()
                                .default("general"),
                        )
                        .col(
                            ColumnDef::new(Inquiries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Inquiries::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Inquiries {
        Table,
        Id,
        Name,
        Email,
        Company,
        Message,
        Type,
        CreatedAt,
    }
}
