//! Turning `validator` reports into a single client-facing message.

use validator::{ValidationError, ValidationErrors};

/// Picks the first violation as `"<field>: <message>"`.
///
/// Fields listed in `order` are checked first, in that order; remaining fields
/// follow alphabetically so the result is deterministic.
pub fn first_violation(errors: &ValidationErrors, order: &[&str]) -> Option<String> {
    let field_errors = errors.field_errors();

    let mut remaining: Vec<&str> = field_errors
        .keys()
        .map(|k| k.as_ref())
        .filter(|field| !order.contains(field))
        .collect();
    remaining.sort_unstable();

    order
        .iter()
        .copied()
        .chain(remaining)
        .find_map(|field| {
            field_errors
                .get(field)
                .and_then(|errs| errs.first())
                .map(|err| format!("{}: {}", field, describe(err)))
        })
}

fn describe(error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => error.code.to_string(),
    }
}
