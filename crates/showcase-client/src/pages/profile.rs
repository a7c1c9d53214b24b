use tracing::warn;
use uuid::Uuid;

use showcase_types::api::{ProfilePatch, ProjectQuery};
use showcase_types::models::{Comment, Profile, Project};

use crate::error::ClientError;
use crate::store::BackingStore;

/// Public profile page with the owner's projects and comments.
#[derive(Debug, Clone, Default)]
pub struct ProfilePage {
    pub id: Uuid,
    pub profile: Option<Profile>,
    /// Newest first
    pub projects: Vec<Project>,
    /// Newest first
    pub comments: Vec<Comment>,
    pub viewer: Option<Uuid>,
    pub error: Option<String>,
}

impl ProfilePage {
    /// Profile lookup failures land in `error`; the project and comment
    /// lists fall back to empty independently.
    pub async fn load(store: &dyn BackingStore, id: Uuid) -> Self {
        let viewer = store.current_session().await.map(|s| s.user.id);

        let (profile, error) = match store.get_profile(id).await {
            Ok(Some(profile)) => (Some(profile), None),
            Ok(None) => (None, Some("Profile not found".to_string())),
            Err(e) => (None, Some(e.to_string())),
        };

        let query = ProjectQuery {
            creator_id: Some(id),
            ..Default::default()
        };
        let projects = store.list_projects(query).await.unwrap_or_else(|e| {
            warn!("Failed to load projects for {}: {}", id, e);
            Vec::new()
        });
        let comments = store.list_comments_by_user(id).await.unwrap_or_else(|e| {
            warn!("Failed to load comments for {}: {}", id, e);
            Vec::new()
        });

        Self {
            id,
            profile,
            projects,
            comments,
            viewer,
            error,
        }
    }

    /// Only the owner may edit.
    pub fn can_edit(&self) -> bool {
        self.viewer == Some(self.id)
    }

    pub fn initials(&self) -> String {
        self.profile
            .as_ref()
            .map(Profile::initials)
            .unwrap_or_else(|| "U".to_string())
    }

    /// Persist the edit form and show the stored result.
    pub async fn save_profile(
        &mut self,
        store: &dyn BackingStore,
        form: &ProfileForm,
    ) -> Result<(), ClientError> {
        if form.full_name.trim().is_empty() {
            return Err(ClientError::Validation("Name is required.".into()));
        }
        let updated = store.update_profile(self.id, form.to_patch()).await?;
        self.profile = Some(updated);
        Ok(())
    }
}

/// Edit-profile form fields, as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileForm {
    pub full_name: String,
    pub bio: String,
    pub website: String,
    pub github: String,
    pub twitter: String,
}

impl ProfileForm {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            full_name: profile.full_name.clone(),
            bio: profile.bio.clone().unwrap_or_default(),
            website: profile.website.clone().unwrap_or_default(),
            github: profile.github.clone().unwrap_or_default(),
            twitter: profile.twitter.clone().unwrap_or_default(),
        }
    }

    /// Blank optional fields are cleared.
    pub fn to_patch(&self) -> ProfilePatch {
        fn optional(value: &str) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }
        ProfilePatch {
            full_name: self.full_name.trim().to_string(),
            bio: optional(&self.bio),
            website: optional(&self.website),
            github: optional(&self.github),
            twitter: optional(&self.twitter),
        }
    }
}
