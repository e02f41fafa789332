use url::Url;

use crate::errors::AppError;

/// Accepts absolute `http`/`https` URLs with a host. Returns the trimmed input.
pub fn validate_url(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("url cannot be empty".to_string()));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|e| AppError::Validation(format!("'{trimmed}' is not a valid URL: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "'{trimmed}' must use http or https"
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(AppError::Validation(format!("'{trimmed}' has no host")));
    }

    Ok(trimmed.to_string())
}

/// Validates every URL up front; the first invalid one rejects the batch.
pub fn validate_urls(raw: &[String]) -> Result<Vec<String>, AppError> {
    raw.iter().map(|u| validate_url(u)).collect()
}
