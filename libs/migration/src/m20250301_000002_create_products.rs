use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250301_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

const CATEGORIES: [ProductCategory; 4] = [
    ProductCategory::Laptops,
    ProductCategory::Desktops,
    ProductCategory::GamingPcs,
    ProductCategory::Accessories,
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create product_category enum
        manager
            .create_type(
                Type::create()
                    .as_enum(ProductCategory::Enum)
                    .values(CATEGORIES)
                    .to_owned(),
            )
            .await?;

        // Create products table
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(pk_uuid(Products::Id))
                    .col(string_len(Products::Name, 200))
                    .col(
                        ColumnDef::new(Products::Category)
                            .enumeration(ProductCategory::Enum, CATEGORIES)
                            .not_null(),
                    )
                    .col(string_len(Products::Price, 50))
                    .col(big_integer(Products::PriceAmount))
                    .col(json_binary(Products::Specs).default(Expr::cust("'[]'::jsonb")))
                    .col(string_len(Products::Warranty, 50).default("3 Months"))
                    .col(boolean(Products::Trending).default(false))
                    .col(uuid_null(Products::CreatorId))
                    .col(
                        timestamp_with_time_zone(Products::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Products::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_creator_id")
                            .from(Products::Table, Products::CreatorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Create indexes
        for (name, column) in [
            ("idx_products_category", Products::Category),
            ("idx_products_name", Products::Name),
            ("idx_products_price_amount", Products::PriceAmount),
            ("idx_products_created_at", Products::CreatedAt),
            ("idx_products_creator_id", Products::CreatorId),
            ("idx_products_trending", Products::Trending),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Products::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        // Create product_images table
        manager
            .create_table(
                Table::create()
                    .table(ProductImages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductImages::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(uuid(ProductImages::ProductId))
                    .col(string_len(ProductImages::Image, 255))
                    .col(
                        timestamp_with_time_zone(ProductImages::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_images_product_id")
                            .from(ProductImages::Table, ProductImages::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_images_product_id_created_at")
                    .table(ProductImages::Table)
                    .col(ProductImages::ProductId)
                    .col(ProductImages::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Add updated_at trigger
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER products_touch_updated_at
                    BEFORE UPDATE ON products
                    FOR EACH ROW
                    EXECUTE FUNCTION util.touch_updated_at()
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TRIGGER IF EXISTS products_touch_updated_at ON products")
            .await?;

        manager
            .drop_table(Table::drop().table(ProductImages::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(ProductCategory::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Name,
    Category,
    Price,
    PriceAmount,
    Specs,
    Warranty,
    Trending,
    CreatorId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProductImages {
    Table,
    Id,
    ProductId,
    Image,
    CreatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum ProductCategory {
    #[sea_orm(iden = "product_category")]
    Enum,
    #[sea_orm(iden = "Laptops")]
    Laptops,
    #[sea_orm(iden = "Desktops")]
    Desktops,
    #[sea_orm(iden = "Gaming PCs")]
    GamingPcs,
    #[sea_orm(iden = "Accessories")]
    Accessories,
}
