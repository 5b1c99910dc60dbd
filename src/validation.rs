use url::Url;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("URL is required")]
    Empty,
    #[error("Invalid URL format: {0}")]
    Malformed(String),
    #[error("Invalid URL format: unsupported scheme {0}, use http or https")]
    UnsupportedScheme(String),
    #[error("Invalid URL format: missing host")]
    MissingHost,
}

/// Accepts absolute `http`/`https` URLs with a host.
pub fn validate_target_url(raw: &str) -> Result<Url, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Empty);
    }

    let url = Url::parse(raw).map_err(|e| UrlError::Malformed(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}
