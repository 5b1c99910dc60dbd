use std::sync::Arc;

use crate::analytics::AnalyticsAggregator;
use crate::auth::PrincipalProvider;
use crate::clicks::ClickRecorder;
use crate::redirect::RedirectResolver;
use crate::slug::{SlugAllocator, SlugGenerator};
use crate::store::LinkStore;

pub struct AppState {
    pub allocator: SlugAllocator,
    pub resolver: RedirectResolver,
    pub clicks: ClickRecorder,
    pub analytics: AnalyticsAggregator,
    pub auth: Arc<dyn PrincipalProvider>,
    pub public_base_url: String,
}

impl AppState {
    /// Wires every component to the one shared store.
    pub fn new(
        store: Arc<dyn LinkStore>,
        generator: SlugGenerator,
        auth: Arc<dyn PrincipalProvider>,
        public_base_url: impl Into<String>,
    ) -> Self {
        let public_base_url: String = public_base_url.into();
        let clicks = ClickRecorder::new(store.clone());
        Self {
            allocator: SlugAllocator::new(store.clone(), generator),
            resolver: RedirectResolver::new(store.clone(), clicks.clone()),
            analytics: AnalyticsAggregator::new(store),
            clicks,
            auth,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn short_url(&self, slug: &str) -> String {
        format!("{}/links/{}", self.public_base_url, slug)
    }
}
