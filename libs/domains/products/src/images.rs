//! Product image uploads: decoding, validation and storage.
//!
//! Uploads arrive either as multipart file parts or as base64 strings. Each one
//! is decoded, size-checked and type-sniffed from its magic bytes before any
//! product row is written. Accepted bytes are stored unchanged under
//! `products/` with an extension matching the detected type.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use image::ImageFormat;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};

pub const MAX_IMAGES: usize = 10;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Subdirectory of the media root holding product images
pub const PRODUCTS_DIR: &str = "products";

pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// One submitted image, before validation
#[derive(Debug, Clone, PartialEq)]
pub enum ImageUpload {
    /// Base64 text, optionally with a `data:image/<type>;base64,` prefix
    Base64(String),
    /// Multipart file part
    File {
        bytes: Vec<u8>,
        content_type: Option<String>,
    },
}

/// Image types accepted for products
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::Webp => "webp",
        }
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Gif => Some(ImageKind::Gif),
            ImageFormat::WebP => Some(ImageKind::Webp),
            _ => None,
        }
    }
}

/// Image that passed validation and is ready to store
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
}

fn invalid_type() -> String {
    format!(
        "Invalid image type. Allowed types: {}",
        ALLOWED_CONTENT_TYPES.join(", ")
    )
}

fn declared_type_allowed(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_CONTENT_TYPES.contains(&essence.as_str())
}

/// Decode and check a single upload; the error is the client-facing reason
pub fn decode_image(upload: ImageUpload) -> Result<DecodedImage, String> {
    let bytes = match upload {
        ImageUpload::Base64(text) => {
            let payload = text.split_once(',').map_or(text.as_str(), |(_, data)| data);
            let compact: String = payload
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            STANDARD
                .decode(compact)
                .map_err(|e| format!("Invalid base64 image: {e}"))?
        }
        ImageUpload::File {
            bytes,
            content_type,
        } => {
            if let Some(content_type) = content_type.as_deref() {
                if !declared_type_allowed(content_type) {
                    return Err(invalid_type());
                }
            }
            bytes
        }
    };

    if bytes.len() > MAX_IMAGE_BYTES {
        return Err("Image size exceeds 5MB limit".to_string());
    }

    let kind = ImageKind::sniff(&bytes).ok_or_else(invalid_type)?;
    Ok(DecodedImage { bytes, kind })
}

fn decode_all(uploads: Vec<ImageUpload>) -> ProductResult<Vec<DecodedImage>> {
    uploads
        .into_iter()
        .enumerate()
        .map(|(index, upload)| {
            decode_image(upload).map_err(|reason| {
                ProductError::Validation(format!("Error processing image {}: {}", index + 1, reason))
            })
        })
        .collect()
}

/// Images for a new product: between 1 and 10
pub fn validate_images(uploads: Vec<ImageUpload>) -> ProductResult<Vec<DecodedImage>> {
    if uploads.is_empty() {
        return Err(ProductError::Validation(
            "At least one image is required".to_string(),
        ));
    }
    if uploads.len() > MAX_IMAGES {
        return Err(ProductError::Validation(format!(
            "Maximum {MAX_IMAGES} images allowed per product"
        )));
    }
    decode_all(uploads)
}

/// Images appended to a product that already has `current` images
pub fn validate_additional_images(
    uploads: Vec<ImageUpload>,
    current: usize,
) -> ProductResult<Vec<DecodedImage>> {
    if uploads.is_empty() {
        return Ok(Vec::new());
    }
    if current + uploads.len() > MAX_IMAGES {
        return Err(ProductError::TooManyImages { current });
    }
    decode_all(uploads)
}

/// Storage for image files, addressed by media-relative path
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist the image and return its path, e.g. `products/<id>_<uuid>.png`
    async fn save(&self, product_id: Uuid, image: &DecodedImage) -> ProductResult<String>;

    /// Remove a stored image; missing files are not an error
    async fn remove(&self, path: &str) -> ProductResult<()>;
}

fn new_image_path(product_id: Uuid, kind: ImageKind) -> String {
    format!(
        "{PRODUCTS_DIR}/{}_{}.{}",
        product_id,
        Uuid::new_v4().simple(),
        kind.extension()
    )
}

/// Only paths this module generated may be touched
fn is_managed_path(path: &str) -> bool {
    path.strip_prefix(PRODUCTS_DIR)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|file| !file.is_empty() && !file.contains('/') && !file.contains(".."))
}

/// Images stored on the local filesystem beneath the media root
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, product_id: Uuid, image: &DecodedImage) -> ProductResult<String> {
        let path = new_image_path(product_id, image.kind);
        let target = self.root.join(&path);

        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| ProductError::Storage(format!("{}: {e}", dir.display())))?;
        }
        tokio::fs::write(&target, &image.bytes)
            .await
            .map_err(|e| ProductError::Storage(format!("{}: {e}", target.display())))?;

        tracing::debug!(path = %path, bytes = image.bytes.len(), "Stored product image");
        Ok(path)
    }

    async fn remove(&self, path: &str) -> ProductResult<()> {
        if !is_managed_path(path) {
            tracing::warn!(path = %path, "Refusing to remove unmanaged media path");
            return Ok(());
        }

        match tokio::fs::remove_file(self.root.join(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ProductError::Storage(format!("{path}: {e}"))),
        }
    }
}

/// In-memory image store for development and tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryImageStore {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.files.read().await.contains_key(path)
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn save(&self, product_id: Uuid, image: &DecodedImage) -> ProductResult<String> {
        let path = new_image_path(product_id, image.kind);
        self.files
            .write()
            .await
            .insert(path.clone(), image.bytes.clone());
        Ok(path)
    }

    async fn remove(&self, path: &str) -> ProductResult<()> {
        self.files.write().await.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const GIF: &[u8] = b"GIF89a\x01\0\x01\0";

    fn png_upload() -> ImageUpload {
        ImageUpload::File {
            bytes: PNG.to_vec(),
            content_type: Some("image/png".to_string()),
        }
    }

    #[test]
    fn test_decode_base64_with_data_url_prefix() {
        let encoded = format!("data:image/gif;base64,{}", STANDARD.encode(GIF));
        let decoded = decode_image(ImageUpload::Base64(encoded)).unwrap();
        assert_eq!(decoded.kind, ImageKind::Gif);
        assert_eq!(decoded.bytes, GIF);
    }

    #[test]
    fn test_decode_rejects_bad_base64_and_unknown_types() {
        let err = decode_image(ImageUpload::Base64("not base64!!".to_string())).unwrap_err();
        assert!(err.starts_with("Invalid base64 image"));

        let text = STANDARD.encode(b"plain text, not an image");
        let err = decode_image(ImageUpload::Base64(text)).unwrap_err();
        assert!(err.starts_with("Invalid image type"));
    }

    #[test]
    fn test_decode_checks_declared_content_type() {
        let upload = ImageUpload::File {
            bytes: PNG.to_vec(),
            content_type: Some("application/pdf".to_string()),
        };
        assert!(decode_image(upload).unwrap_err().starts_with("Invalid image type"));

        let upload = ImageUpload::File {
            bytes: PNG.to_vec(),
            content_type: Some("IMAGE/PNG; charset=binary".to_string()),
        };
        assert_eq!(decode_image(upload).unwrap().kind, ImageKind::Png);
    }

    #[test]
    fn test_decode_rejects_oversized() {
        let mut bytes = PNG.to_vec();
        bytes.resize(MAX_IMAGE_BYTES + 1, 0);
        let upload = ImageUpload::File {
            bytes,
            content_type: None,
        };
        assert_eq!(decode_image(upload).unwrap_err(), "Image size exceeds 5MB limit");
    }

    #[test]
    fn test_image_count_bounds() {
        let err = validate_images(Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "At least one image is required");

        let err = validate_images(vec![png_upload(); 11]).unwrap_err();
        assert_eq!(err.to_string(), "Maximum 10 images allowed per product");

        assert_eq!(validate_images(vec![png_upload(); 10]).unwrap().len(), 10);
    }

    #[test]
    fn test_error_names_offending_image() {
        let uploads = vec![png_upload(), ImageUpload::Base64("%%%".to_string())];
        let err = validate_images(uploads).unwrap_err();
        assert!(err.to_string().starts_with("Error processing image 2: "));
    }

    #[test]
    fn test_additional_images_respect_cap() {
        assert!(validate_additional_images(Vec::new(), 10).unwrap().is_empty());
        assert_eq!(
            validate_additional_images(vec![png_upload(); 2], 8).unwrap().len(),
            2
        );
        let err = validate_additional_images(vec![png_upload(); 2], 9).unwrap_err();
        assert!(matches!(err, ProductError::TooManyImages { current: 9 }));
    }

    #[test]
    fn test_managed_paths() {
        assert!(is_managed_path("products/abc.png"));
        assert!(!is_managed_path("products/../secrets.txt"));
        assert!(!is_managed_path("other/abc.png"));
        assert!(!is_managed_path("products/"));
        assert!(!is_managed_path("products/nested/abc.png"));
    }

    #[tokio::test]
    async fn test_local_store_roundtrip() {
        let root = std::env::temp_dir().join(format!("product-media-{}", Uuid::new_v4()));
        let store = LocalImageStore::new(&root);
        let image = decode_image(png_upload()).unwrap();
        let product_id = Uuid::new_v4();

        let path = store.save(product_id, &image).await.unwrap();
        assert!(path.starts_with(&format!("products/{product_id}_")));
        assert!(path.ends_with(".png"));
        assert_eq!(tokio::fs::read(root.join(&path)).await.unwrap(), PNG);

        store.remove(&path).await.unwrap();
        assert!(!root.join(&path).exists());
        // Second removal is a no-op
        store.remove(&path).await.unwrap();

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryImageStore::new();
        let image = decode_image(png_upload()).unwrap();

        let path = store.save(Uuid::new_v4(), &image).await.unwrap();
        assert!(store.contains(&path).await);
        assert_eq!(store.len().await, 1);

        store.remove(&path).await.unwrap();
        assert!(store.is_empty().await);
    }
}
