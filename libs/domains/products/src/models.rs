use chrono::{DateTime, Utc};
use regex::Regex;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{
    validate_category, validate_name, validate_price, validate_specs, validate_warranty,
};

pub const DEFAULT_WARRANTY: &str = "3 Months";
pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;

/// Product category
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "product_category")]
pub enum Category {
    #[sea_orm(string_value = "Laptops")]
    #[serde(rename = "Laptops")]
    #[strum(serialize = "Laptops")]
    Laptops,
    #[sea_orm(string_value = "Desktops")]
    #[serde(rename = "Desktops")]
    #[strum(serialize = "Desktops")]
    Desktops,
    #[sea_orm(string_value = "Gaming PCs")]
    #[serde(rename = "Gaming PCs")]
    #[strum(serialize = "Gaming PCs")]
    GamingPcs,
    #[sea_orm(string_value = "Accessories")]
    #[serde(rename = "Accessories")]
    #[strum(serialize = "Accessories")]
    Accessories,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Laptops,
        Category::Desktops,
        Category::GamingPcs,
        Category::Accessories,
    ];
}

/// Listing order selected by the `sort` query parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
pub enum ProductSort {
    #[strum(serialize = "name")]
    Name,
    #[strum(serialize = "-name")]
    NameDesc,
    #[strum(serialize = "price")]
    Price,
    #[strum(serialize = "-price")]
    PriceDesc,
    #[strum(serialize = "date")]
    Date,
    /// Newest first
    #[default]
    #[strum(serialize = "-date")]
    DateDesc,
}

impl ProductSort {
    /// Unknown or missing values fall back to newest first
    pub fn from_param(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_default()
    }
}

/// Who may update or delete a product
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WritePolicy {
    /// Any authenticated user
    #[default]
    Any,
    /// Only the user recorded as the product's creator
    Creator,
}

static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+|\d{1,3}(?:,\d{3})+)(?:\s+TZS)?$").expect("price pattern is valid")
});

/// Price in Tanzanian shillings
///
/// Always rendered as `N,NNN TZS`; the whole-shilling amount is kept for ordering.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub struct Price(i64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid price format. Use format like '720,000 TZS' or '720000'")]
pub struct InvalidPrice;

impl Price {
    pub fn from_amount(amount: i64) -> Result<Self, InvalidPrice> {
        if amount < 0 {
            return Err(InvalidPrice);
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> i64 {
        self.0
    }
}

impl FromStr for Price {
    type Err = InvalidPrice;

    /// Accepts `720000`, `720,000`, and either form followed by ` TZS`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = PRICE_PATTERN.captures(s.trim()).ok_or(InvalidPrice)?;
        let digits: String = captures[1].chars().filter(|c| *c != ',').collect();
        let amount = digits.parse::<i64>().map_err(|_| InvalidPrice)?;
        Self::from_amount(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        write!(f, "{grouped} TZS")
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        price.to_string()
    }
}

impl TryFrom<String> for Price {
    type Error = InvalidPrice;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Raw price as submitted: a JSON number or formatted text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(serde_json::Number),
    Text(String),
}

impl PriceInput {
    /// Numbers are truncated to whole shillings
    pub fn to_price(&self) -> Result<Price, InvalidPrice> {
        match self {
            PriceInput::Text(text) => text.parse(),
            PriceInput::Number(number) => {
                if let Some(amount) = number.as_i64() {
                    return Price::from_amount(amount);
                }
                match number.as_f64() {
                    Some(value) if value.is_finite() && value >= 0.0 && value < i64::MAX as f64 => {
                        Price::from_amount(value.trunc() as i64)
                    }
                    _ => Err(InvalidPrice),
                }
            }
        }
    }
}

/// Product image record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: i64,
    pub product_id: Uuid,
    /// Media-relative path, e.g. `products/<file>.png`
    pub image: String,
    pub created_at: DateTime<Utc>,
}

/// Product entity with its images ordered by creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    pub price: Price,
    pub specs: Vec<String>,
    pub warranty: String,
    pub trending: bool,
    /// User who created the product; cleared if that user is deleted
    pub creator: Option<Uuid>,
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for a new product
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub category: Category,
    pub price: Price,
    pub specs: Vec<String>,
    pub warranty: String,
    pub trending: bool,
    pub creator: Option<Uuid>,
}

/// Validated field changes; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub price: Option<Price>,
    pub specs: Option<Vec<String>>,
    pub warranty: Option<String>,
    pub trending: Option<bool>,
}

impl ProductChanges {
    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(specs) = self.specs {
            product.specs = specs;
        }
        if let Some(warranty) = self.warranty {
            product.warranty = warranty;
        }
        if let Some(trending) = self.trending {
            product.trending = trending;
        }
        product.updated_at = Utc::now();
    }
}

/// Product fields as submitted in JSON or multipart bodies
///
/// Everything is optional here; which fields are required depends on the
/// operation and is checked during validation.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProductInput {
    #[validate(custom(function = "validate_name"))]
    #[schema(example = "Dell XPS 15")]
    pub name: Option<String>,
    #[validate(custom(function = "validate_category"))]
    #[schema(example = "Laptops")]
    pub category: Option<String>,
    /// Number or text such as `720000`, `720,000` or `720,000 TZS`
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = Option<String>, example = "720,000 TZS")]
    pub price: Option<PriceInput>,
    #[validate(custom(function = "validate_specs"))]
    pub specs: Option<Vec<String>>,
    #[validate(custom(function = "validate_warranty"))]
    #[schema(example = "1 Year")]
    pub warranty: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub trending: Option<bool>,
    /// Base64 images, optionally prefixed with `data:image/<type>;base64,`
    #[serde(default)]
    pub images_data: Vec<String>,
}

/// `true`, `1`, `yes` and `on` (any case) are true; other strings are false
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(b) => b,
        Flag::Int(i) => i == 1,
        Flag::Text(s) => parse_flag(&s),
    }))
}

/// Raw listing query parameters
///
/// Kept as strings so malformed values fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Exact category, e.g. `Gaming PCs`
    pub category: Option<String>,
    /// Case-insensitive substring of the name
    pub search: Option<String>,
    /// `true`/`1`/`yes`/`on` for trending products, anything else for the rest
    pub trending: Option<String>,
    /// One of `name`, `-name`, `price`, `-price`, `date`, `-date` (default)
    pub sort: Option<String>,
    /// Page size, 1 to 100 (default 20)
    pub limit: Option<String>,
    /// Items to skip (default 0)
    pub offset: Option<String>,
}

impl ListParams {
    /// Normalized query, or `None` when the category names no known category
    pub fn into_query(self) -> Option<ProductQuery> {
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<Category>().ok()?),
        };

        Some(ProductQuery {
            category,
            search: self.search.filter(|s| !s.is_empty()),
            trending: self.trending.as_deref().map(parse_flag),
            creator: None,
            sort: ProductSort::from_param(self.sort.as_deref()),
            limit: parse_limit(self.limit.as_deref()),
            offset: parse_offset(self.offset.as_deref()),
        })
    }
}

fn parse_limit(raw: Option<&str>) -> u64 {
    match raw.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(limit) if (1..=MAX_LIMIT as i64).contains(&limit) => limit as u64,
        _ => DEFAULT_LIMIT,
    }
}

fn parse_offset(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|offset| *offset > 0)
        .map_or(0, |offset| offset as u64)
}

/// Normalized listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<Category>,
    pub search: Option<String>,
    pub trending: Option<bool>,
    /// Restricts the listing to one creator (dashboard)
    pub creator: Option<Uuid>,
    pub sort: ProductSort,
    pub limit: u64,
    pub offset: u64,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            trending: None,
            creator: None,
            sort: ProductSort::default(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Total matches ignoring pagination
    pub count: u64,
    pub limit: u64,
    pub offset: u64,
    pub total_pages: u64,
}

impl ProductPage {
    pub fn new(products: Vec<Product>, count: u64, query: &ProductQuery) -> Self {
        Self {
            products,
            count,
            limit: query.limit,
            offset: query.offset,
            total_pages: count.div_ceil(query.limit.max(1)),
        }
    }

    pub fn empty(query: &ProductQuery) -> Self {
        Self::new(Vec::new(), 0, query)
    }
}
