use std::sync::Arc;

use tracing::{debug, error};

use crate::clicks::ClickRecorder;
use crate::store::{LinkStore, StoreError};

/// Who followed the link, as reported by the request headers.
#[derive(Debug, Clone, Default)]
pub struct ClickContext {
    pub user_agent: String,
    pub referrer: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("slug not found")]
    NotFound,
    #[error(transparent)]
    Storage(StoreError),
}

#[derive(Clone)]
pub struct RedirectResolver {
    store: Arc<dyn LinkStore>,
    clicks: ClickRecorder,
}

impl RedirectResolver {
    pub fn new(store: Arc<dyn LinkStore>, clicks: ClickRecorder) -> Self {
        Self { store, clicks }
    }

    /// Looks up `slug` and returns its target URL.
    ///
    /// A click is recorded only for resolved slugs, on a detached task that is
    /// not awaited here.
    pub async fn resolve(&self, slug: &str, context: ClickContext) -> Result<String, ResolveError> {
        let link = match self.store.find_by_slug(slug).await {
            Ok(link) => link,
            Err(StoreError::NotFound) => {
                debug!(slug, "redirect slug not found");
                return Err(ResolveError::NotFound);
            }
            Err(e) => {
                error!(slug, error = %e, "database error during redirect lookup");
                return Err(ResolveError::Storage(e));
            }
        };

        self.clicks.spawn_record(link.id, context.user_agent, context.referrer);

        Ok(link.target_url)
    }
}
