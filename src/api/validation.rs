use super::ApiError;

pub fn validate_id(kind: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {} ID: {}. ID must be a positive integer",
            kind, id
        )));
    }
    Ok(id)
}

pub fn validate_slug(slug: &str) -> Result<&str, ApiError> {
    let trimmed = slug.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Slug cannot be empty"));
    }

    if trimmed.len() > 200 {
        return Err(ApiError::validation("Slug must be 200 characters or less"));
    }

    Ok(trimmed)
}

/// Parses an integer form field. Empty input counts as absent.
pub fn parse_id_field(name: &str, value: &str) -> Result<Option<i32>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let id: i32 = value
        .parse()
        .map_err(|_| ApiError::validation(format!("{} must be a number", name)))?;
    validate_id(name, id).map(Some)
}

/// Parses a price form field. Empty input counts as absent.
pub fn parse_price_field(value: &str) -> Result<Option<f64>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let price: f64 = value
        .parse()
        .map_err(|_| ApiError::validation("Price must be a number"))?;
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::validation("Price must be a non-negative number"));
    }
    Ok(Some(price))
}
