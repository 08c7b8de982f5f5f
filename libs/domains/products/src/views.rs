//! Response shapes for the products API.
//!
//! Stored image paths are media-relative; views add absolute URLs built from
//! [`MediaLinks`].

use axum::http::{HeaderMap, header::HOST};
use axum_helpers::AuthUser;
use chrono::{DateTime, Utc};
use core_config::media::MediaConfig;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Category, Product, ProductImage, ProductPage};

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Turns media-relative paths into URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLinks {
    /// `scheme://host`, or `None` to emit host-relative URLs
    origin: Option<String>,
    prefix: String,
}

impl MediaLinks {
    /// Origin from `PUBLIC_BASE_URL`, else `{X-Forwarded-Proto|http}://{Host}`
    pub fn from_request(config: &MediaConfig, headers: &HeaderMap) -> Self {
        let origin = config.public_base_url.clone().or_else(|| {
            let host = headers.get(HOST)?.to_str().ok()?;
            let scheme = headers
                .get(FORWARDED_PROTO)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or("http");
            Some(format!("{scheme}://{host}"))
        });

        Self {
            origin,
            prefix: config.url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        match &self.origin {
            Some(origin) => format!("{origin}{}/{path}", self.prefix),
            None => format!("{}/{path}", self.prefix),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductImageView {
    pub id: i64,
    /// Media-relative path
    #[schema(example = "products/0190a1b2-..._3f2a.png")]
    pub image: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

impl ProductImageView {
    fn new(image: ProductImage, links: &MediaLinks) -> Self {
        Self {
            id: image.id,
            image_url: links.url(&image.image),
            image: image.image,
            created_at: image.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    #[schema(example = "720,000 TZS")]
    pub price: String,
    pub specs: Vec<String>,
    pub warranty: String,
    pub trending: bool,
    /// ID of the creating user
    pub creator: Option<Uuid>,
    pub images: Vec<ProductImageView>,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductView {
    pub fn new(product: Product, links: &MediaLinks) -> Self {
        let images: Vec<ProductImageView> = product
            .images
            .into_iter()
            .map(|image| ProductImageView::new(image, links))
            .collect();
        let image_urls = images.iter().map(|image| image.image_url.clone()).collect();

        Self {
            id: product.id,
            name: product.name,
            category: product.category,
            price: product.price.to_string(),
            specs: product.specs,
            warranty: product.warranty,
            trending: product.trending,
            creator: product.creator,
            images,
            image_urls,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductListView {
    pub products: Vec<ProductView>,
    /// Total matches ignoring pagination
    pub count: u64,
    pub limit: u64,
    pub offset: u64,
    pub total_pages: u64,
}

impl ProductListView {
    pub fn new(page: ProductPage, links: &MediaLinks) -> Self {
        Self {
            products: page
                .products
                .into_iter()
                .map(|product| ProductView::new(product, links))
                .collect(),
            count: page.count,
            limit: page.limit,
            offset: page.offset,
            total_pages: page.total_pages,
        }
    }
}

/// Listing of the caller's own products
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardView {
    #[serde(flatten)]
    pub listing: ProductListView,
    pub creator: AuthUser,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Price;
    use axum::http::HeaderValue;

    fn headers(host: Option<&'static str>, proto: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(host) = host {
            headers.insert(HOST, HeaderValue::from_static(host));
        }
        if let Some(proto) = proto {
            headers.insert(FORWARDED_PROTO, HeaderValue::from_static(proto));
        }
        headers
    }

    #[test]
    fn test_links_from_host_headers() {
        let config = MediaConfig::default();

        let links = MediaLinks::from_request(&config, &headers(Some("shop.local:8080"), None));
        assert_eq!(
            links.url("products/a.png"),
            "http://shop.local:8080/media/products/a.png"
        );

        let links =
            MediaLinks::from_request(&config, &headers(Some("shop.example.com"), Some("https")));
        assert_eq!(
            links.url("products/a.png"),
            "https://shop.example.com/media/products/a.png"
        );

        let links = MediaLinks::from_request(&config, &headers(None, None));
        assert_eq!(links.url("products/a.png"), "/media/products/a.png");
    }

    #[test]
    fn test_public_base_url_wins() {
        let config = MediaConfig {
            public_base_url: Some("https://cdn.example.com".to_string()),
            ..Default::default()
        };
        let links = MediaLinks::from_request(&config, &headers(Some("internal:8080"), None));
        assert_eq!(
            links.url("products/a.png"),
            "https://cdn.example.com/media/products/a.png"
        );
    }

    #[test]
    fn test_product_view_lists_image_urls() {
        let links = MediaLinks::from_request(&MediaConfig::default(), &headers(Some("h"), None));
        let id = Uuid::now_v7();
        let now = Utc::now();
        let product = Product {
            id,
            name: "Corsair K70".to_string(),
            category: Category::Accessories,
            price: Price::from_amount(380_000).unwrap(),
            specs: vec!["Cherry MX Red".to_string()],
            warranty: "1 Year".to_string(),
            trending: true,
            creator: None,
            images: vec![ProductImage {
                id: 7,
                product_id: id,
                image: "products/k70.png".to_string(),
                created_at: now,
            }],
            created_at: now,
            updated_at: now,
        };

        let view = ProductView::new(product, &links);
        assert_eq!(view.price, "380,000 TZS");
        assert_eq!(view.image_urls, vec!["http://h/media/products/k70.png"]);
        assert_eq!(view.images[0].image, "products/k70.png");
        assert_eq!(view.images[0].id, 7);
    }
}
