use tracing::info;

use showcase_types::api::NewProject;
use showcase_types::models::{Project, normalize_tags};
use showcase_types::validate;

use crate::error::ClientError;
use crate::store::BackingStore;

/// The "submit a project" form.
#[derive(Debug, Clone, Default)]
pub struct SubmitForm {
    pub title: String,
    pub description: String,
    /// Comma-separated, as typed
    pub tags: String,
    pub loading: bool,
    pub error: Option<String>,
}

impl SubmitForm {
    /// Validate and insert. The creator is the signed-in user, if any; the
    /// store attaches it.
    pub async fn submit(&mut self, store: &dyn BackingStore) -> Result<Project, ClientError> {
        self.error = None;
        if let Err(message) = validate::project(&self.title, &self.description) {
            self.error = Some(message.clone());
            return Err(ClientError::Validation(message));
        }

        self.loading = true;
        let result = store
            .insert_project(NewProject {
                title: self.title.clone(),
                description: self.description.clone(),
                tags: normalize_tags(&self.tags),
            })
            .await;
        self.loading = false;

        match result {
            Ok(project) => {
                info!("Submitted project {}", project.id);
                *self = Self::default();
                Ok(project)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
