//! Tag filtering and free-text search over an already fetched project list.

use std::collections::{BTreeSet, HashSet};

use showcase_types::models::Project;

pub use showcase_types::models::{normalize_tags, split_tags};

/// Every distinct tag across `projects`, sorted.
pub fn all_tags(projects: &[Project]) -> Vec<String> {
    projects
        .iter()
        .flat_map(|p| p.tag_list())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Projects carrying at least one of `selected`, compared without case.
/// An empty selection keeps everything.
pub fn filter_by_tags<'a>(projects: &'a [Project], selected: &HashSet<String>) -> Vec<&'a Project> {
    if selected.is_empty() {
        return projects.iter().collect();
    }
    let wanted: HashSet<String> = selected.iter().map(|t| t.to_lowercase()).collect();
    projects
        .iter()
        .filter(|p| p.tag_list().iter().any(|t| wanted.contains(&t.to_lowercase())))
        .collect()
}

/// Case-insensitive substring match on title or description. A blank query
/// keeps everything.
pub fn search<'a>(projects: Vec<&'a Project>, query: &str) -> Vec<&'a Project> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return projects;
    }
    projects
        .into_iter()
        .filter(|p| {
            p.title.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Tag filter, then search.
pub fn apply<'a>(
    projects: &'a [Project],
    selected: &HashSet<String>,
    query: &str,
) -> Vec<&'a Project> {
    search(filter_by_tags(projects, selected), query)
}
