use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use crate::models::ShortLink;
use crate::store::{LinkStore, StoreError};

pub const DEFAULT_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DEFAULT_LENGTH: usize = 6;
pub const MAX_LENGTH: usize = 255;

/// Attempts per allocation, and insert attempts per created link.
pub const MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("no unique slug found after {attempts} attempts")]
    Exhausted { attempts: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SlugConfigError {
    #[error("slug.length must be between 1 and 255")]
    InvalidLength,
    #[error("slug.alphabet must contain at least 2 distinct characters")]
    AlphabetTooSmall,
}

/// Random slug generator over a fixed alphabet.
#[derive(Debug, Clone)]
pub struct SlugGenerator {
    alphabet: Vec<char>,
    length: usize,
}

impl SlugGenerator {
    pub fn new(alphabet: &str, length: usize) -> Result<Self, SlugConfigError> {
        if length == 0 || length > MAX_LENGTH {
            return Err(SlugConfigError::InvalidLength);
        }

        let mut symbols: Vec<char> = Vec::with_capacity(alphabet.len());
        for c in alphabet.chars() {
            if !symbols.contains(&c) {
                symbols.push(c);
            }
        }
        if symbols.len() < 2 {
            return Err(SlugConfigError::AlphabetTooSmall);
        }

        Ok(Self {
            alphabet: symbols,
            length,
        })
    }

    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| self.alphabet[rng.gen_range(0..self.alphabet.len())])
            .collect()
    }
}

impl Default for SlugGenerator {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.chars().collect(),
            length: DEFAULT_LENGTH,
        }
    }
}

/// Hands out slugs that are not yet present in the store.
#[derive(Clone)]
pub struct SlugAllocator {
    store: Arc<dyn LinkStore>,
    generator: SlugGenerator,
}

impl SlugAllocator {
    pub fn new(store: Arc<dyn LinkStore>, generator: SlugGenerator) -> Self {
        Self { store, generator }
    }

    /// Draws candidates until one is absent from the store.
    ///
    /// The existence check is only a fast path: another writer may claim the
    /// returned slug before it is inserted.
    pub async fn allocate(&self) -> Result<String, AllocationError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = self.generator.generate();
            if !self.store.exists_by_slug(&candidate).await? {
                return Ok(candidate);
            }
            debug!(attempt, slug = %candidate, "slug collision");
        }

        warn!(attempts = MAX_ATTEMPTS, "slug allocation exhausted");
        Err(AllocationError::Exhausted {
            attempts: MAX_ATTEMPTS,
        })
    }

    /// Allocates a slug and inserts the link, drawing a fresh slug whenever a
    /// concurrent writer wins the insert race.
    pub async fn create_link(
        &self,
        owner_id: &str,
        target_url: &str,
    ) -> Result<ShortLink, AllocationError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let slug = self.allocate().await?;
            let link = ShortLink::new(slug, target_url.to_string(), owner_id.to_string());

            match self.store.insert(link).await {
                Ok(link) => return Ok(link),
                Err(StoreError::UniquenessViolation) => {
                    debug!(attempt, "slug claimed concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(attempts = MAX_ATTEMPTS, "link insert retries exhausted");
        Err(AllocationError::Exhausted {
            attempts: MAX_ATTEMPTS,
        })
    }
}
