use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid contract address format: {0}")]
    InvalidAddress(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// EVM addresses are `0x` followed by 40 hex digits.
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    if address.trim().is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    let stripped = match address.strip_prefix("0x") {
        Some(rest) => rest,
        None => return Err(ValidationError::InvalidAddress(address.to_string())),
    };

    if stripped.len() != 40 || !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidAddress(address.to_string()));
    }

    Ok(())
}

pub fn validate_page(raw: Option<i64>) -> Result<i64, ValidationError> {
    let page = raw.unwrap_or(1);
    if page < 1 {
        return Err(ValidationError::InvalidParameter(
            "page must be >= 1".to_string(),
        ));
    }
    Ok(page)
}

pub fn validate_page_size(raw: Option<i64>) -> Result<i64, ValidationError> {
    let page_size = raw.unwrap_or(25);
    if !(1..=500).contains(&page_size) {
        return Err(ValidationError::InvalidParameter(
            "page_size must be between 1 and 500".to_string(),
        ));
    }
    Ok(page_size)
}

/// Optional `[start_time, end_time)` filter; defaults to all history.
pub fn validate_time_range(
    start: Option<i64>,
    end: Option<i64>,
) -> Result<(i64, i64), ValidationError> {
    let start = start.unwrap_or(0);
    let end = end.unwrap_or(i64::MAX);
    if start < 0 {
        return Err(ValidationError::InvalidParameter(
            "start_time must be >= 0".to_string(),
        ));
    }
    if start >= end {
        return Err(ValidationError::InvalidParameter(
            "start_time must be less than end_time".to_string(),
        ));
    }
    Ok((start, end))
}

/// Canonical lowercase form used for storage keys and comparisons.
pub fn normalize_address(address: &str) -> String {
    address.to_lowercase()
}
