use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderName},
};

use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
}

/// Resolves the current principal for a request, if any.
pub trait PrincipalProvider: Send + Sync {
    fn current_principal(&self, headers: &HeaderMap) -> Option<Principal>;
}

/// Trusts a header injected by the authenticating proxy in front of the service.
#[derive(Debug, Clone)]
pub struct HeaderPrincipalProvider {
    header: HeaderName,
}

impl HeaderPrincipalProvider {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl PrincipalProvider for HeaderPrincipalProvider {
    fn current_principal(&self, headers: &HeaderMap) -> Option<Principal> {
        let id = headers.get(&self.header)?.to_str().ok()?.trim();
        if id.is_empty() {
            return None;
        }
        Some(Principal { id: id.to_string() })
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state
            .auth
            .current_principal(&parts.headers)
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_provider() {
        let provider = HeaderPrincipalProvider::new(HeaderName::from_static("x-user-id"));
        let mut headers = HeaderMap::new();
        assert_eq!(provider.current_principal(&headers), None);

        headers.insert("x-user-id", HeaderValue::from_static("   "));
        assert_eq!(provider.current_principal(&headers), None);

        headers.insert("x-user-id", HeaderValue::from_static("user-42"));
        assert_eq!(
            provider.current_principal(&headers),
            Some(Principal {
                id: "user-42".into()
            })
        );
    }
}
