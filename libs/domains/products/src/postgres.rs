use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entity::{product, product_image};
use crate::error::{ProductError, ProductResult};
use crate::images::MAX_IMAGES;
use crate::models::{
    NewProduct, Product, ProductChanges, ProductImage, ProductPage, ProductQuery, ProductSort,
};
use crate::repository::ProductRepository;

pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Escape LIKE wildcards so the search term matches literally
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn filtered(query: &ProductQuery) -> Select<product::Entity> {
    let mut select = product::Entity::find();

    if let Some(category) = query.category {
        select = select.filter(product::Column::Category.eq(category));
    }
    if let Some(trending) = query.trending {
        select = select.filter(product::Column::Trending.eq(trending));
    }
    if let Some(creator) = query.creator {
        select = select.filter(product::Column::CreatorId.eq(creator));
    }
    if let Some(search) = &query.search {
        select = select.filter(Expr::cust_with_values(
            r#""products"."name" ILIKE $1"#,
            [like_pattern(search)],
        ));
    }
    select
}

fn sorted(select: Select<product::Entity>, sort: ProductSort) -> Select<product::Entity> {
    use product::Column;

    let select = match sort {
        ProductSort::Name => select.order_by(lower_name(), Order::Asc),
        ProductSort::NameDesc => select.order_by(lower_name(), Order::Desc),
        ProductSort::Price => select.order_by(Column::PriceAmount, Order::Asc),
        ProductSort::PriceDesc => select.order_by(Column::PriceAmount, Order::Desc),
        ProductSort::Date => {
            return select.order_by_asc(Column::CreatedAt).order_by_asc(Column::Id);
        }
        ProductSort::DateDesc => {
            return select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);
        }
    };
    select
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
}

/// Name ordering ignores case, matching `compare_products`
fn lower_name() -> SimpleExpr {
    Expr::cust(r#"LOWER("products"."name")"#)
}

/// Images of the given products keyed by product, oldest first
async fn images_for<C: ConnectionTrait>(
    conn: &C,
    product_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<ProductImage>>, DbErr> {
    let mut grouped: HashMap<Uuid, Vec<ProductImage>> = HashMap::new();
    if product_ids.is_empty() {
        return Ok(grouped);
    }

    let models = product_image::Entity::find()
        .filter(product_image::Column::ProductId.is_in(product_ids))
        .order_by_asc(product_image::Column::CreatedAt)
        .order_by_asc(product_image::Column::Id)
        .all(conn)
        .await?;

    for model in models {
        grouped
            .entry(model.product_id)
            .or_default()
            .push(model.into());
    }
    Ok(grouped)
}

async fn insert_images<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    paths: Vec<String>,
) -> Result<(), DbErr> {
    let now = Utc::now();
    for path in paths {
        product_image::ActiveModel {
            id: NotSet,
            product_id: Set(product_id),
            image: Set(path),
            created_at: Set(now.into()),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn image_count<C: ConnectionTrait>(conn: &C, product_id: Uuid) -> Result<u64, DbErr> {
    product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(product_id))
        .count(conn)
        .await
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(
        &self,
        id: Uuid,
        input: NewProduct,
        images: Vec<String>,
    ) -> ProductResult<Product> {
        let active_model: product::ActiveModel = (id, input).into();

        let txn = self.db.begin().await?;
        let model = active_model.insert(&txn).await?;
        insert_images(&txn, id, images).await?;
        let mut images = images_for(&txn, vec![id]).await?;
        txn.commit().await?;

        tracing::info!(product_id = %id, "Created product");
        Ok(model.into_product(images.remove(&id).unwrap_or_default()))
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let Some(model) = product::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        let mut images = images_for(&self.db, vec![id]).await?;
        Ok(Some(model.into_product(images.remove(&id).unwrap_or_default())))
    }

    async fn list(&self, query: &ProductQuery) -> ProductResult<ProductPage> {
        let select = filtered(query);
        let count = select.clone().count(&self.db).await?;

        let models = sorted(select, query.sort)
            .offset(query.offset)
            .limit(query.limit)
            .all(&self.db)
            .await?;

        let ids = models.iter().map(|m| m.id).collect();
        let mut images = images_for(&self.db, ids).await?;
        let products = models
            .into_iter()
            .map(|model| {
                let own = images.remove(&model.id).unwrap_or_default();
                model.into_product(own)
            })
            .collect();

        Ok(ProductPage::new(products, count, query))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ProductChanges,
        new_images: Vec<String>,
    ) -> ProductResult<Product> {
        let txn = self.db.begin().await?;

        let model = product::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ProductError::NotFound)?;

        if !new_images.is_empty() {
            let current = image_count(&txn, id).await? as usize;
            if current + new_images.len() > MAX_IMAGES {
                return Err(ProductError::TooManyImages { current });
            }
        }

        let mut active: product::ActiveModel = model.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(category) = changes.category {
            active.category = Set(category);
        }
        if let Some(price) = changes.price {
            active.price = Set(price.to_string());
            active.price_amount = Set(price.amount());
        }
        if let Some(specs) = changes.specs {
            active.specs = Set(serde_json::json!(specs));
        }
        if let Some(warranty) = changes.warranty {
            active.warranty = Set(warranty);
        }
        if let Some(trending) = changes.trending {
            active.trending = Set(trending);
        }
        active.updated_at = Set(Utc::now().into());

        let model = active.update(&txn).await?;
        insert_images(&txn, id, new_images).await?;
        let mut images = images_for(&txn, vec![id]).await?;
        txn.commit().await?;

        tracing::info!(product_id = %id, "Updated product");
        Ok(model.into_product(images.remove(&id).unwrap_or_default()))
    }

    async fn delete(&self, id: Uuid) -> ProductResult<Option<Vec<String>>> {
        let txn = self.db.begin().await?;

        let Some(_) = product::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        let paths = images_for(&txn, vec![id])
            .await?
            .remove(&id)
            .unwrap_or_default()
            .into_iter()
            .map(|image| image.image)
            .collect();

        // Image rows go with the product through the cascading foreign key
        product::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(product_id = %id, "Deleted product");
        Ok(Some(paths))
    }

    async fn delete_image(&self, product_id: Uuid, image_id: i64) -> ProductResult<String> {
        let txn = self.db.begin().await?;

        product::Entity::find_by_id(product_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ProductError::NotFound)?;

        let image = product_image::Entity::find_by_id(image_id)
            .filter(product_image::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?
            .ok_or(ProductError::ImageNotFound)?;

        if image_count(&txn, product_id).await? <= 1 {
            return Err(ProductError::LastImage);
        }

        product_image::Entity::delete_by_id(image.id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!(product_id = %product_id, image_id, "Deleted product image");
        Ok(image.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("xps"), "%xps%");
        assert_eq!(like_pattern("100%_off"), r"%100\%\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }
}
