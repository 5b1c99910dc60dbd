use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted slug → target URL mapping. Never updated once inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShortLink {
    pub id: Uuid,
    pub slug: String,
    pub target_url: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl ShortLink {
    pub fn new(slug: String, target_url: String, owner_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug,
            target_url,
            owner_id,
            created_at: Utc::now(),
        }
    }
}

/// One redirect traversal of a [`ShortLink`]. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClickEvent {
    pub id: Uuid,
    pub short_link_id: Uuid,
    pub user_agent: String,
    pub referrer: Option<String>,
    pub clicked_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateLinkResponse {
    #[serde(flatten)]
    pub link: ShortLink,
    #[serde(rename = "shortUrl")]
    pub short_url: String,
}

/// A link together with every click recorded against it, newest click first.
#[derive(Debug, Clone, Serialize)]
pub struct LinkWithClicks {
    #[serde(flatten)]
    pub link: ShortLink,
    pub click_count: usize,
    pub clicks: Vec<ClickEvent>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}
