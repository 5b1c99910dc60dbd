use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::models::{ClickEvent, LinkWithClicks};
use crate::store::{LinkStore, StoreResult};

/// Builds per-link click statistics with two bulk reads per call.
#[derive(Clone)]
pub struct AnalyticsAggregator {
    store: Arc<dyn LinkStore>,
}

impl AnalyticsAggregator {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self { store }
    }

    /// Links owned by `owner_id` (newest first), each with its clicks (newest first).
    pub async fn list(&self, owner_id: &str) -> StoreResult<Vec<LinkWithClicks>> {
        info!(owner_id, "fetching analytics data");

        let links = self.store.list_by_owner(owner_id).await.map_err(|e| {
            error!(error = %e, "error fetching short links");
            e
        })?;

        if links.is_empty() {
            info!(owner_id, "no short links found");
            return Ok(Vec::new());
        }

        info!(links = links.len(), "fetching click data");

        let ids: HashSet<Uuid> = links.iter().map(|link| link.id).collect();
        let clicks = self.store.list_clicks_for_links(&ids).await.map_err(|e| {
            error!(error = %e, "error fetching link clicks");
            e
        })?;

        info!(clicks = clicks.len(), "found clicks");

        // clicks arrive newest first; pushing preserves that order per link
        let mut by_link: HashMap<Uuid, Vec<ClickEvent>> = HashMap::with_capacity(links.len());
        for click in clicks {
            by_link.entry(click.short_link_id).or_default().push(click);
        }

        let result: Vec<LinkWithClicks> = links
            .into_iter()
            .map(|link| {
                let clicks = by_link.remove(&link.id).unwrap_or_default();
                LinkWithClicks {
                    click_count: clicks.len(),
                    clicks,
                    link,
                }
            })
            .collect();

        info!(links = result.len(), "prepared analytics data");
        Ok(result)
    }
}
