use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error};
use uuid::Uuid;

use crate::models::ClickEvent;
use crate::store::{LinkStore, StoreResult};

/// Appends click events in the background.
///
/// Every write runs on its own spawned task, so it outlives the request that
/// triggered it. Failures are logged and dropped.
#[derive(Clone)]
pub struct ClickRecorder {
    store: Arc<dyn LinkStore>,
    tracker: TaskTracker,
}

impl ClickRecorder {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self {
            store,
            tracker: TaskTracker::new(),
        }
    }

    /// Writes one click event and waits for the store to acknowledge it.
    pub async fn record(
        &self,
        short_link_id: Uuid,
        user_agent: String,
        referrer: Option<String>,
        clicked_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let click = ClickEvent {
            id: Uuid::new_v4(),
            short_link_id,
            user_agent,
            referrer,
            clicked_at,
        };
        self.store.record_click(click).await
    }

    /// Launches `record` as a detached task. The returned handle may be dropped.
    pub fn spawn_record(
        &self,
        short_link_id: Uuid,
        user_agent: String,
        referrer: Option<String>,
    ) -> JoinHandle<()> {
        let recorder = self.clone();
        let clicked_at = Utc::now();

        self.tracker.spawn(async move {
            match recorder
                .record(short_link_id, user_agent, referrer, clicked_at)
                .await
            {
                Ok(()) => debug!(%short_link_id, "click recorded"),
                Err(e) => error!(%short_link_id, error = %e, "failed to record click"),
            }
        })
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until every click write launched so far has finished.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShortLink;
    use crate::store::tests::memory_store;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_spawned_click_is_persisted() {
        let store = Arc::new(memory_store().await);
        let link = ShortLink::new("abc123".into(), "https://example.com".into(), "u1".into());
        store.insert(link.clone()).await.unwrap();

        let recorder = ClickRecorder::new(store.clone());
        recorder.spawn_record(link.id, "curl/8.0".into(), Some("https://ref.example".into()));
        recorder.drain().await;

        let clicks = store
            .list_clicks_for_links(&HashSet::from([link.id]))
            .await
            .unwrap();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].user_agent, "curl/8.0");
        assert_eq!(clicks[0].referrer.as_deref(), Some("https://ref.example"));
        assert_eq!(recorder.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_is_swallowed() {
        let store = Arc::new(memory_store().await);
        let recorder = ClickRecorder::new(store.clone());

        // no such link: the foreign key rejects the write
        let handle = recorder.spawn_record(Uuid::new_v4(), String::new(), None);
        assert!(handle.await.is_ok());
    }
}
