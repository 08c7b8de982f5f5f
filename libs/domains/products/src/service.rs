//! Product Service - Business logic layer

use axum_helpers::AuthUser;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::images::{
    DecodedImage, ImageStore, ImageUpload, validate_additional_images, validate_images,
};
use crate::models::{ListParams, Product, ProductInput, ProductPage, WritePolicy};
use crate::repository::ProductRepository;
use crate::validation::{InputMode, new_product, validate_input};

/// Product service providing business logic operations
///
/// The service validates payloads, stores image files, enforces the write
/// policy and orchestrates repository operations. Files written for a write
/// that then fails are removed again.
pub struct ProductService<R: ProductRepository, S: ImageStore> {
    repository: Arc<R>,
    images: Arc<S>,
    policy: WritePolicy,
}

impl<R: ProductRepository, S: ImageStore> ProductService<R, S> {
    /// Create a new ProductService with the given repository and image store
    pub fn new(repository: R, images: S) -> Self {
        Self {
            repository: Arc::new(repository),
            images: Arc::new(images),
            policy: WritePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Public listing
    #[instrument(skip(self))]
    pub async fn list(&self, params: ListParams) -> ProductResult<ProductPage> {
        let (limit, offset) = (params.limit.clone(), params.offset.clone());
        let Some(query) = params.into_query() else {
            return Ok(unmatched(limit, offset));
        };
        self.repository.list(&query).await
    }

    /// Listing scoped to the products the caller created
    #[instrument(skip(self, params))]
    pub async fn dashboard(&self, params: ListParams, creator: Uuid) -> ProductResult<ProductPage> {
        let (limit, offset) = (params.limit.clone(), params.offset.clone());
        let Some(mut query) = params.into_query() else {
            return Ok(unmatched(limit, offset));
        };
        query.creator = Some(creator);
        self.repository.list(&query).await
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound)
    }

    /// Create a product owned by `creator` with 1 to 10 images
    #[instrument(skip(self, input, uploads, creator), fields(user_id = %creator.id))]
    pub async fn create(
        &self,
        input: ProductInput,
        uploads: Vec<ImageUpload>,
        creator: &AuthUser,
    ) -> ProductResult<Product> {
        let changes = validate_input(&input, InputMode::Full)?;
        let decoded = validate_images(uploads)?;
        let fields = new_product(changes, Some(creator.id))?;

        let id = Uuid::now_v7();
        let paths = self.store_all(id, &decoded).await?;

        match self.repository.create(id, fields, paths.clone()).await {
            Ok(product) => Ok(product),
            Err(e) => {
                self.discard(&paths).await;
                Err(e)
            }
        }
    }

    /// Full (`InputMode::Full`) or partial update, optionally appending images
    #[instrument(skip(self, input, uploads, caller), fields(user_id = %caller.id))]
    pub async fn update(
        &self,
        id: Uuid,
        input: ProductInput,
        uploads: Vec<ImageUpload>,
        caller: &AuthUser,
        mode: InputMode,
    ) -> ProductResult<Product> {
        let current = self.get(id).await?;
        self.authorize(&current, caller)?;

        let changes = validate_input(&input, mode)?;
        let decoded = validate_additional_images(uploads, current.images.len())?;
        let paths = self.store_all(id, &decoded).await?;

        match self.repository.update(id, changes, paths.clone()).await {
            Ok(product) => Ok(product),
            Err(e) => {
                self.discard(&paths).await;
                Err(e)
            }
        }
    }

    /// Delete a product together with its image files
    #[instrument(skip(self, caller), fields(user_id = %caller.id))]
    pub async fn delete(&self, id: Uuid, caller: &AuthUser) -> ProductResult<()> {
        let current = self.get(id).await?;
        self.authorize(&current, caller)?;

        let paths = self
            .repository
            .delete(id)
            .await?
            .ok_or(ProductError::NotFound)?;
        self.discard(&paths).await;
        Ok(())
    }

    /// Delete one image of a product; the last image cannot be removed
    #[instrument(skip(self, caller), fields(user_id = %caller.id))]
    pub async fn delete_image(
        &self,
        product_id: Uuid,
        image_id: i64,
        caller: &AuthUser,
    ) -> ProductResult<()> {
        let current = self.get(product_id).await?;
        self.authorize(&current, caller)?;

        let path = self.repository.delete_image(product_id, image_id).await?;
        self.discard(std::slice::from_ref(&path)).await;
        Ok(())
    }

    fn authorize(&self, product: &Product, caller: &AuthUser) -> ProductResult<()> {
        match self.policy {
            WritePolicy::Any => Ok(()),
            WritePolicy::Creator if product.creator == Some(caller.id) => Ok(()),
            WritePolicy::Creator => {
                tracing::warn!(
                    product_id = %product.id,
                    user_id = %caller.id,
                    "Write denied by creator policy"
                );
                Err(ProductError::Forbidden)
            }
        }
    }

    async fn store_all(
        &self,
        product_id: Uuid,
        images: &[DecodedImage],
    ) -> ProductResult<Vec<String>> {
        let mut paths = Vec::with_capacity(images.len());
        for image in images {
            match self.images.save(product_id, image).await {
                Ok(path) => paths.push(path),
                Err(e) => {
                    self.discard(&paths).await;
                    return Err(e);
                }
            }
        }
        Ok(paths)
    }

    /// Best-effort file removal; the database is the source of truth
    async fn discard(&self, paths: &[String]) {
        for path in paths {
            if let Err(e) = self.images.remove(path).await {
                tracing::warn!(path = %path, error = %e, "Failed to remove image file");
            }
        }
    }
}

/// Empty page for a filter that can match nothing, e.g. an unknown category
fn unmatched(limit: Option<String>, offset: Option<String>) -> ProductPage {
    let query = ListParams {
        limit,
        offset,
        ..Default::default()
    }
    .into_query()
    .unwrap_or_default();
    ProductPage::empty(&query)
}

impl<R: ProductRepository, S: ImageStore> Clone for ProductService<R, S> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            images: Arc::clone(&self.images),
            policy: self.policy,
        }
    }
}
