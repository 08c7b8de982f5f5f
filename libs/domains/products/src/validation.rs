//! Field rules for product payloads.
//!
//! The `validate_*` functions plug into `validator`'s `custom` attribute on
//! [`ProductInput`]. [`validate_input`] runs them together with the
//! required-field checks and reports the first violation as `"<field>: <message>"`.

use axum_helpers::first_violation;
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{ProductError, ProductResult};
use crate::models::{
    Category, DEFAULT_WARRANTY, NewProduct, PriceInput, ProductChanges, ProductInput,
};

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 200;
pub const SPEC_MAX_CHARS: usize = 500;
pub const WARRANTY_MAX_CHARS: usize = 50;

/// Order in which field violations are reported
pub const FIELD_ORDER: [&str; 5] = ["name", "category", "price", "specs", "warranty"];

const REQUIRED: &str = "This field is required.";

/// Which fields a write must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Create and full update: name, category and price are required
    Full,
    /// Partial update: every field is optional
    Partial,
}

fn violation(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let length = name.trim().chars().count();
    if length < NAME_MIN_CHARS {
        return Err(violation(
            "name_too_short",
            "Product name must be at least 3 characters long.",
        ));
    }
    if length > NAME_MAX_CHARS {
        return Err(violation(
            "name_too_long",
            "Product name cannot exceed 200 characters.",
        ));
    }
    Ok(())
}

pub fn validate_category(category: &str) -> Result<(), ValidationError> {
    match category.parse::<Category>() {
        Ok(_) => Ok(()),
        Err(_) => {
            let allowed: Vec<String> = Category::ALL.iter().map(ToString::to_string).collect();
            Err(violation(
                "invalid_category",
                format!("Invalid category. Must be one of: {}", allowed.join(", ")),
            ))
        }
    }
}

pub fn validate_price(price: &PriceInput) -> Result<(), ValidationError> {
    price
        .to_price()
        .map(|_| ())
        .map_err(|e| violation("invalid_price", e.to_string()))
}

pub fn validate_specs(specs: &[String]) -> Result<(), ValidationError> {
    if specs.iter().any(|spec| spec.chars().count() > SPEC_MAX_CHARS) {
        return Err(violation(
            "spec_too_long",
            "Each specification must be 500 characters or fewer.",
        ));
    }
    Ok(())
}

pub fn validate_warranty(warranty: &str) -> Result<(), ValidationError> {
    if warranty.trim().chars().count() > WARRANTY_MAX_CHARS {
        return Err(violation(
            "warranty_too_long",
            "Warranty cannot exceed 50 characters.",
        ));
    }
    Ok(())
}

/// Check every field rule and convert the input into typed changes
pub fn validate_input(input: &ProductInput, mode: InputMode) -> ProductResult<ProductChanges> {
    let mut errors = input.validate().err().unwrap_or_else(ValidationErrors::new);

    if mode == InputMode::Full {
        let present = [
            ("name", input.name.is_some()),
            ("category", input.category.is_some()),
            ("price", input.price.is_some()),
        ];
        for (field, is_present) in present {
            if !is_present && !errors.field_errors().contains_key(field) {
                errors.add(field, violation("required", REQUIRED));
            }
        }
    }

    if let Some(message) = first_violation(&errors, &FIELD_ORDER) {
        return Err(ProductError::Validation(message));
    }

    Ok(ProductChanges {
        name: input.name.as_deref().map(|n| n.trim().to_string()),
        category: input.category.as_deref().and_then(|c| c.parse().ok()),
        price: input.price.as_ref().and_then(|p| p.to_price().ok()),
        specs: input.specs.clone(),
        warranty: input
            .warranty
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string),
        trending: input.trending,
    })
}

/// Build a new product from fields validated in [`InputMode::Full`]
pub fn new_product(changes: ProductChanges, creator: Option<Uuid>) -> ProductResult<NewProduct> {
    match (changes.name, changes.category, changes.price) {
        (Some(name), Some(category), Some(price)) => Ok(NewProduct {
            name,
            category,
            price,
            specs: changes.specs.unwrap_or_default(),
            warranty: changes
                .warranty
                .unwrap_or_else(|| DEFAULT_WARRANTY.to_string()),
            trending: changes.trending.unwrap_or(false),
            creator,
        }),
        _ => Err(ProductError::Validation(format!("name: {REQUIRED}"))),
    }
}
