//! News feed store.

use std::sync::Arc;

use pedidoflex_core::NewsPost;
use tokio::sync::RwLock;

use super::{StoreError, decode, encode};
use crate::persist::{SharedStore, collections};

/// Informational posts shown on the portal's news page.
///
/// Read-mostly: representatives only read; admins publish through upsert.
#[derive(Clone)]
pub struct NewsStore {
    posts: Arc<RwLock<Vec<NewsPost>>>,
    persist: SharedStore,
}

impl NewsStore {
    /// Create an empty store over the given backend.
    #[must_use]
    pub fn new(persist: SharedStore) -> Self {
        Self {
            posts: Arc::new(RwLock::new(Vec::new())),
            persist,
        }
    }

    /// Load posts from the backend, replacing in-memory state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub async fn hydrate(&self) -> Result<usize, StoreError> {
        let records = self.persist.load_all(collections::NEWS).await?;
        let mut posts = Vec::with_capacity(records.len());
        for record in records {
            posts.push(decode::<NewsPost>(collections::NEWS, record)?);
        }
        let count = posts.len();
        *self.posts.write().await = posts;
        Ok(count)
    }

    /// All posts, newest first.
    pub async fn all(&self) -> Vec<NewsPost> {
        let mut posts = self.posts.read().await.clone();
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        posts
    }

    /// Insert or replace a post.
    ///
    /// # Errors
    ///
    /// Returns an error if the write-through to the backend fails.
    pub async fn upsert(&self, post: NewsPost) -> Result<(), StoreError> {
        let record = encode(collections::NEWS, &post)?;
        let mut posts = self.posts.write().await;
        self.persist
            .save(collections::NEWS, post.id.as_str(), record)
            .await?;
        match posts.iter_mut().find(|p| p.id == post.id) {
            Some(slot) => *slot = post,
            None => posts.insert(0, post),
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pedidoflex_core::PostId;

    use super::*;
    use crate::persist::MemoryStore;

    fn post(id: &str, title: &str, day: u32) -> NewsPost {
        NewsPost {
            id: PostId::new(id),
            title: title.to_owned(),
            body: String::new(),
            date: Utc.with_ymd_and_hms(2025, 7, day, 9, 0, 0).unwrap(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_all_sorted_newest_first() {
        let store = NewsStore::new(Arc::new(MemoryStore::new()));
        store.upsert(post("n1", "Frete", 1)).await.unwrap();
        store.upsert(post("n2", "Orgânicos", 15)).await.unwrap();
        store.upsert(post("n3", "Tabela", 7)).await.unwrap();

        let titles: Vec<_> = store.all().await.into_iter().map(|p| p.title).collect();
        assert_eq!(titles, ["Orgânicos", "Tabela", "Frete"]);
    }
}
