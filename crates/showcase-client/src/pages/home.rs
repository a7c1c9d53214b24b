use tracing::warn;

use showcase_types::api::ProjectQuery;
use showcase_types::models::Project;

use crate::store::BackingStore;

/// Number of projects featured on the landing page.
pub const RECENT_PROJECTS: u32 = 3;

#[derive(Debug, Clone, Default)]
pub struct HomeFeed {
    pub projects: Vec<Project>,
}

impl HomeFeed {
    /// The most recent projects. A failed fetch shows an empty feed.
    pub async fn load(store: &dyn BackingStore) -> Self {
        let query = ProjectQuery {
            limit: Some(RECENT_PROJECTS),
            ..Default::default()
        };
        let projects = store.list_projects(query).await.unwrap_or_else(|e| {
            warn!("Failed to load recent projects: {}", e);
            Vec::new()
        });
        Self { projects }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn shows_three_newest() {
        let store = MemoryStore::new();
        for title in ["one", "two", "three", "four", "five"] {
            store.seed_project(title, "", 0);
        }
        let feed = HomeFeed::load(&store).await;
        let titles: Vec<&str> = feed.projects.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["five", "four", "three"]);
    }

    #[tokio::test]
    async fn fewer_than_three_is_fine() {
        let store = MemoryStore::new();
        store.seed_project("only", "", 0);
        assert_eq!(HomeFeed::load(&store).await.projects.len(), 1);
    }
}
