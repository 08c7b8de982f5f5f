use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::images::MAX_IMAGES;
use crate::models::{
    NewProduct, Product, ProductChanges, ProductImage, ProductPage, ProductQuery, ProductSort,
};

/// Repository trait for Product persistence
///
/// Writes are atomic per call: a product is never visible without its images,
/// and the image cap is enforced inside the same critical section as the write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a product under a caller-chosen id together with its stored image paths
    async fn create(
        &self,
        id: Uuid,
        input: NewProduct,
        images: Vec<String>,
    ) -> ProductResult<Product>;

    /// Get a product by ID, images included
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Filtered, sorted page plus the total match count
    async fn list(&self, query: &ProductQuery) -> ProductResult<ProductPage>;

    /// Apply changes and append images; bumps `updated_at`
    ///
    /// Fails with [`ProductError::TooManyImages`] if the product would exceed
    /// the image cap.
    async fn update(
        &self,
        id: Uuid,
        changes: ProductChanges,
        new_images: Vec<String>,
    ) -> ProductResult<Product>;

    /// Delete a product and its images, returning the removed image paths
    async fn delete(&self, id: Uuid) -> ProductResult<Option<Vec<String>>>;

    /// Delete one image of a product, returning its path
    ///
    /// Refuses to remove the product's last image.
    async fn delete_image(&self, product_id: Uuid, image_id: i64) -> ProductResult<String>;
}

/// Ordering shared by every repository implementation
///
/// Names compare case-insensitively. Ties on name or price fall back to
/// creation order; `-date` is the exact reverse of `date`.
pub fn compare_products(a: &Product, b: &Product, sort: ProductSort) -> Ordering {
    let created = || {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    };

    match sort {
        ProductSort::Name => by_name(a, b).then_with(created),
        ProductSort::NameDesc => by_name(b, a).then_with(created),
        ProductSort::Price => a.price.cmp(&b.price).then_with(created),
        ProductSort::PriceDesc => b.price.cmp(&a.price).then_with(created),
        ProductSort::Date => created(),
        ProductSort::DateDesc => created().reverse(),
    }
}

/// Case-insensitive, like `ORDER BY LOWER(name)`
fn by_name(a: &Product, b: &Product) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

fn matches(product: &Product, query: &ProductQuery) -> bool {
    if query.category.is_some_and(|c| c != product.category) {
        return false;
    }
    if query.trending.is_some_and(|t| t != product.trending) {
        return false;
    }
    if query.creator.is_some() && query.creator != product.creator {
        return false;
    }
    if let Some(search) = &query.search {
        if !product.name.to_lowercase().contains(&search.to_lowercase()) {
            return false;
        }
    }
    true
}

#[derive(Default)]
struct Store {
    products: HashMap<Uuid, Product>,
    next_image_id: i64,
}

impl Store {
    fn image(&mut self, product_id: Uuid, path: String) -> ProductImage {
        self.next_image_id += 1;
        ProductImage {
            id: self.next_image_id,
            product_id,
            image: path,
            created_at: Utc::now(),
        }
    }
}

/// In-memory implementation for development and tests
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(
        &self,
        id: Uuid,
        input: NewProduct,
        images: Vec<String>,
    ) -> ProductResult<Product> {
        let mut store = self.store.write().await;
        let now = Utc::now();

        let images = images
            .into_iter()
            .map(|path| store.image(id, path))
            .collect();

        let product = Product {
            id,
            name: input.name,
            category: input.category,
            price: input.price,
            specs: input.specs,
            warranty: input.warranty,
            trending: input.trending,
            creator: input.creator,
            images,
            created_at: now,
            updated_at: now,
        };
        store.products.insert(id, product.clone());

        tracing::info!(product_id = %id, "Created product");
        Ok(product)
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let store = self.store.read().await;
        Ok(store.products.get(&id).cloned())
    }

    async fn list(&self, query: &ProductQuery) -> ProductResult<ProductPage> {
        let store = self.store.read().await;

        let mut matching: Vec<&Product> = store
            .products
            .values()
            .filter(|p| matches(p, query))
            .collect();
        matching.sort_by(|a, b| compare_products(a, b, query.sort));

        let count = matching.len() as u64;
        let products = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(ProductPage::new(products, count, query))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ProductChanges,
        new_images: Vec<String>,
    ) -> ProductResult<Product> {
        let mut store = self.store.write().await;

        let current = store
            .products
            .get(&id)
            .map(|p| p.images.len())
            .ok_or(ProductError::NotFound)?;
        if current + new_images.len() > MAX_IMAGES {
            return Err(ProductError::TooManyImages { current });
        }

        let appended: Vec<ProductImage> = new_images
            .into_iter()
            .map(|path| store.image(id, path))
            .collect();

        let product = store.products.get_mut(&id).ok_or(ProductError::NotFound)?;
        changes.apply(product);
        product.images.extend(appended);

        tracing::info!(product_id = %id, "Updated product");
        Ok(product.clone())
    }

    async fn delete(&self, id: Uuid) -> ProductResult<Option<Vec<String>>> {
        let mut store = self.store.write().await;

        Ok(store.products.remove(&id).map(|product| {
            tracing::info!(product_id = %id, "Deleted product");
            product.images.into_iter().map(|image| image.image).collect()
        }))
    }

    async fn delete_image(&self, product_id: Uuid, image_id: i64) -> ProductResult<String> {
        let mut store = self.store.write().await;

        let product = store
            .products
            .get_mut(&product_id)
            .ok_or(ProductError::NotFound)?;
        let position = product
            .images
            .iter()
            .position(|image| image.id == image_id)
            .ok_or(ProductError::ImageNotFound)?;
        if product.images.len() <= 1 {
            return Err(ProductError::LastImage);
        }

        let removed = product.images.remove(position);
        tracing::info!(product_id = %product_id, image_id, "Deleted product image");
        Ok(removed.image)
    }
}
