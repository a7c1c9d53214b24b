use std::collections::HashSet;

use tracing::warn;
use uuid::Uuid;

use showcase_types::api::ProjectQuery;
use showcase_types::models::{Project, VoteDirection};

use crate::error::ClientError;
use crate::filter;
use crate::mutator::{FireAndForget, VoteStrategy};
use crate::store::BackingStore;

/// Browse page: every project, newest first, narrowed by tag chips and a
/// search box.
#[derive(Debug, Clone, Default)]
pub struct ExploreState {
    projects: Vec<Project>,
    tags: Vec<String>,
    selected: HashSet<String>,
    query: String,
}

impl ExploreState {
    /// A failed fetch leaves the page with no projects and no tags.
    pub async fn load(store: &dyn BackingStore) -> Self {
        let mut state = Self::default();
        state.refresh(store).await;
        state
    }

    pub async fn refresh(&mut self, store: &dyn BackingStore) {
        match store.list_projects(ProjectQuery::default()).await {
            Ok(projects) => {
                self.tags = filter::all_tags(&projects);
                self.projects = projects;
            }
            Err(e) => {
                warn!("Failed to load projects: {}", e);
                self.projects.clear();
                self.tags.clear();
            }
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Tag chips, sorted.
    pub fn all_tags(&self) -> &[String] {
        &self.tags
    }

    pub fn is_selected(&self, tag: &str) -> bool {
        self.selected.contains(tag)
    }

    pub fn has_filters(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        if !self.selected.remove(tag) {
            self.selected.insert(tag.to_string());
        }
    }

    /// Drops the tag selection; the search text stays.
    pub fn clear_filters(&mut self) {
        self.selected.clear();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn visible(&self) -> Vec<&Project> {
        filter::apply(&self.projects, &self.selected, &self.query)
    }

    pub async fn vote(
        &mut self,
        store: &dyn BackingStore,
        project_id: Uuid,
        direction: VoteDirection,
    ) -> Result<(), ClientError> {
        let Some(project) = self.projects.iter_mut().find(|p| p.id == project_id) else {
            return Ok(());
        };
        FireAndForget.vote(store, project, direction).await
    }
}
