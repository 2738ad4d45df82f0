use super::{error::ApiError, models::PageQuery};
use crate::types::{Page, PageBounds, NAME_MAX_LEN, ROLE_MAX_LEN};

/// Length is counted in characters, the same unit SQLite's `length()` uses
/// once NUL is ruled out.
fn bounded_text(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.contains('\0') {
        return Err(ApiError::InvalidInput(format!(
            "{field} must not contain NUL characters"
        )));
    }
    let len = value.chars().count();
    if len > max {
        return Err(ApiError::InvalidInput(format!(
            "{field} must be at most {max} characters, got {len}"
        )));
    }
    Ok(())
}

pub(crate) fn name(value: &str) -> Result<(), ApiError> {
    bounded_text("name", value, NAME_MAX_LEN)
}

pub(crate) fn role(value: &str) -> Result<(), ApiError> {
    bounded_text("role", value, ROLE_MAX_LEN)
}

pub(crate) fn page(query: &PageQuery, bounds: PageBounds) -> Result<Page, ApiError> {
    let offset = query.offset.unwrap_or(0);
    if offset < 0 {
        return Err(ApiError::InvalidInput(format!(
            "offset must be >= 0, got {offset}"
        )));
    }

    let limit = query.limit.unwrap_or(i64::from(bounds.default_limit));
    if limit < 1 || limit > i64::from(bounds.max_limit) {
        return Err(ApiError::InvalidInput(format!(
            "limit must be between 1 and {}, got {limit}",
            bounds.max_limit
        )));
    }

    Ok(Page::new(offset as u64, limit as u32))
}
