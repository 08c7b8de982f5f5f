use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::models::{Category, NewProduct, Price, Product, ProductImage};

/// Sea-ORM Entity for the products table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    /// Canonical `N,NNN TZS` text
    pub price: String,
    /// Whole shillings, used for ordering
    pub price_amount: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub specs: Json,
    pub warranty: String,
    pub trending: bool,
    pub creator_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_image::Entity")]
    Images,
}

impl Related<super::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Domain product with the given images, which must already be ordered
    pub fn into_product(self, images: Vec<ProductImage>) -> Product {
        let specs: Vec<String> = serde_json::from_value(self.specs).unwrap_or_default();
        let price = Price::from_amount(self.price_amount)
            .or_else(|_| self.price.parse())
            .unwrap_or_else(|_| {
                tracing::warn!(product_id = %self.id, "Stored price is unreadable");
                Price::default()
            });

        Product {
            id: self.id,
            name: self.name,
            category: self.category,
            price,
            specs,
            warranty: self.warranty,
            trending: self.trending,
            creator: self.creator_id,
            images,
            created_at: self.created_at.into(),
            updated_at: self.updated_at.into(),
        }
    }
}

impl From<(Uuid, NewProduct)> for ActiveModel {
    fn from((id, input): (Uuid, NewProduct)) -> Self {
        let now = chrono::Utc::now();

        ActiveModel {
            id: Set(id),
            name: Set(input.name),
            category: Set(input.category),
            price: Set(input.price.to_string()),
            price_amount: Set(input.price.amount()),
            specs: Set(serde_json::json!(input.specs)),
            warranty: Set(input.warranty),
            trending: Set(input.trending),
            creator_id: Set(input.creator),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    }
}
