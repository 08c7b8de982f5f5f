//! Product write bodies: JSON or `multipart/form-data`.

use axum::{
    extract::{FromRequest, Json, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use axum_helpers::AppError;

use crate::images::ImageUpload;
use crate::models::{PriceInput, ProductInput, parse_flag};

/// Product fields plus the images submitted with them, in submission order
#[derive(Debug, Clone, Default)]
pub struct ProductSubmission {
    pub input: ProductInput,
    pub images: Vec<ImageUpload>,
}

/// Reads a [`ProductSubmission`] from either body encoding.
///
/// Multipart bodies carry text fields `name`, `category`, `price`,
/// `warranty` and `trending`, repeated `specs` fields (or a single JSON array
/// string), `images` file parts and `images_data` base64 parts. JSON bodies
/// carry the same fields with `images_data` as an array of base64 strings.
pub struct ProductForm(pub ProductSubmission);

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
}

impl<S> FromRequest<S> for ProductForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state).await?;
            return read_multipart(multipart).await.map(ProductForm);
        }

        let Json(mut input) = Json::<ProductInput>::from_request(req, state).await?;
        let images = std::mem::take(&mut input.images_data)
            .into_iter()
            .filter(|data| !data.is_empty())
            .map(ImageUpload::Base64)
            .collect();
        Ok(ProductForm(ProductSubmission { input, images }))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<ProductSubmission, AppError> {
    let mut submission = ProductSubmission::default();
    let mut specs: Vec<String> = Vec::new();
    let input = &mut submission.input;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "images" => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                // A file input left blank still sends an empty part
                if !bytes.is_empty() {
                    submission.images.push(ImageUpload::File {
                        bytes: bytes.to_vec(),
                        content_type,
                    });
                }
            }
            "images_data" => {
                let data = field.text().await?;
                if !data.is_empty() {
                    submission.images.push(ImageUpload::Base64(data));
                }
            }
            "name" => input.name = Some(field.text().await?),
            "category" => input.category = Some(field.text().await?),
            "price" => input.price = Some(PriceInput::Text(field.text().await?)),
            "warranty" => input.warranty = Some(field.text().await?),
            "trending" => input.trending = Some(parse_flag(&field.text().await?)),
            "specs" => specs.push(field.text().await?),
            other => tracing::debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    if !specs.is_empty() {
        submission.input.specs = Some(collect_specs(specs));
    }
    Ok(submission)
}

/// A lone value holding a JSON array is unpacked; otherwise each field is one spec
fn collect_specs(values: Vec<String>) -> Vec<String> {
    if let [only] = values.as_slice() {
        if only.trim_start().starts_with('[') {
            if let Ok(parsed) = serde_json::from_str::<Vec<String>>(only) {
                return parsed;
            }
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::post,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const BOUNDARY: &str = "XBOUNDARYX";

    async fn summary(ProductForm(submission): ProductForm) -> String {
        let input = submission.input;
        format!(
            "{}|{}|{:?}|{:?}|{}",
            input.name.unwrap_or_default(),
            input.category.unwrap_or_default(),
            input.specs.unwrap_or_default(),
            input.trending,
            submission.images.len()
        )
    }

    async fn send(content_type: &str, body: String) -> (StatusCode, String) {
        let response = Router::new()
            .route("/", post(summary))
            .oneshot(
                Request::post("/")
                    .header(CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    #[test]
    fn test_collect_specs() {
        assert_eq!(
            collect_specs(vec![r#"["16GB RAM", "1TB SSD"]"#.to_string()]),
            vec!["16GB RAM", "1TB SSD"]
        );
        assert_eq!(
            collect_specs(vec!["16GB RAM".to_string(), "1TB SSD".to_string()]),
            vec!["16GB RAM", "1TB SSD"]
        );
        assert_eq!(collect_specs(vec!["[draft".to_string()]), vec!["[draft"]);
    }

    #[tokio::test]
    async fn test_json_body_moves_images_data() {
        let body = serde_json::json!({
            "name": "Logitech MX Master 3S",
            "category": "Accessories",
            "price": 250000,
            "specs": ["8K DPI"],
            "images_data": ["aGVsbG8=", "d29ybGQ="]
        });
        let (status, text) = send("application/json", body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, r#"Logitech MX Master 3S|Accessories|["8K DPI"]|None|2"#);
    }

    #[tokio::test]
    async fn test_multipart_fields_and_files() {
        let mut body = String::new();
        body.push_str(&text_part("name", "Razer Blade 16"));
        body.push_str(&text_part("category", "Laptops"));
        body.push_str(&text_part("specs", "RTX 4090"));
        body.push_str(&text_part("specs", "32GB RAM"));
        body.push_str(&text_part("trending", "yes"));
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n"
        ));
        body.push_str(&text_part("images_data", "aGVsbG8="));
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        let (status, text) = send(
            &format!("multipart/form-data; boundary={BOUNDARY}"),
            body,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            text,
            r#"Razer Blade 16|Laptops|["RTX 4090", "32GB RAM"]|Some(true)|2"#
        );
    }

    #[tokio::test]
    async fn test_blank_image_entries_are_skipped() {
        let body = serde_json::json!({
            "name": "Dell XPS 13",
            "images_data": ["", "aGVsbG8="]
        });
        let (status, text) = send("application/json", body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.ends_with("|1"), "{text}");

        let mut body = String::new();
        body.push_str(&text_part("name", "Dell XPS 13"));
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"\"\r\nContent-Type: application/octet-stream\r\n\r\n\r\n"
        ));
        body.push_str(&text_part("images_data", ""));
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        let (status, text) = send(
            &format!("multipart/form-data; boundary={BOUNDARY}"),
            body,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.ends_with("|0"), "{text}");
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let (status, _) = send("application/json", "{oops".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
