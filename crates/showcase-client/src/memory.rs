//! In-memory `BackingStore` for tests. Mirrors the service's rules closely
//! enough to exercise the client deterministically, and can be told to fail
//! every write.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use showcase_types::api::{NewProject, ProfilePatch, ProjectQuery};
use showcase_types::models::{
    Comment, CommentVote, Profile, Project, Session, User, VoteDirection, normalize_tags,
};

use crate::error::ClientError;
use crate::store::{AuthSubscription, BackingStore, SessionCell, StoreResult};

#[derive(Default)]
struct Tables {
    clock: i64,
    users: HashMap<String, (User, String)>,
    projects: Vec<Project>,
    comments: Vec<Comment>,
    votes: Vec<CommentVote>,
    profiles: HashMap<Uuid, Profile>,
}

impl Tables {
    /// Strictly increasing timestamps so "newest first" is deterministic.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(self.clock)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    session: SessionCell,
    fail_writes: AtomicBool,
    comment_reads: AtomicUsize,
    vote_reads: AtomicUsize,
}

fn api(status: u16, message: &str) -> ClientError {
    ClientError::Api {
        status,
        message: message.to_string(),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a 500.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn comment_reads(&self) -> usize {
        self.comment_reads.load(Ordering::SeqCst)
    }

    pub fn vote_reads(&self) -> usize {
        self.vote_reads.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(api(500, "Service unavailable"));
        }
        Ok(())
    }

    async fn require_user(&self) -> StoreResult<Uuid> {
        self.session.user_id().await.ok_or(ClientError::NotSignedIn)
    }

    pub fn seed_project(&self, title: &str, tags: &str, vote_count: i64) -> Project {
        let mut t = self.tables.lock().unwrap();
        let project = Project {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("{title} description"),
            tags: tags.to_string(),
            creator_id: None,
            created_at: t.tick(),
            vote_count,
        };
        t.projects.push(project.clone());
        project
    }

    pub fn seed_comment(&self, project_id: Uuid, content: &str) -> Comment {
        let mut t = self.tables.lock().unwrap();
        let comment = Comment {
            id: Uuid::new_v4(),
            project_id,
            user_id: None,
            content: content.to_string(),
            created_at: t.tick(),
        };
        t.comments.push(comment.clone());
        comment
    }

    pub fn seed_vote(&self, comment_id: Uuid, user_id: Uuid, direction: VoteDirection) -> CommentVote {
        let mut t = self.tables.lock().unwrap();
        let vote = CommentVote {
            id: Uuid::new_v4(),
            comment_id,
            user_id,
            vote_type: direction,
            created_at: t.tick(),
        };
        t.votes.push(vote.clone());
        vote
    }

    pub fn project(&self, id: Uuid) -> Option<Project> {
        let t = self.tables.lock().unwrap();
        t.projects.iter().find(|p| p.id == id).cloned()
    }

    pub fn all_votes(&self) -> Vec<CommentVote> {
        self.tables.lock().unwrap().votes.clone()
    }

    pub fn profile(&self, id: Uuid) -> Option<Profile> {
        self.tables.lock().unwrap().profiles.get(&id).cloned()
    }

    /// Register (if needed) and sign in as a fresh user; returns their id.
    pub async fn sign_in_as(&self, email: &str) -> Uuid {
        let user = {
            let mut t = self.tables.lock().unwrap();
            let created_at = t.tick();
            t.users
                .entry(email.to_string())
                .or_insert_with(|| {
                    (
                        User {
                            id: Uuid::new_v4(),
                            email: email.to_string(),
                            full_name: String::new(),
                            created_at,
                        },
                        "password".to_string(),
                    )
                })
                .0
                .clone()
        };
        let id = user.id;
        self.session
            .set(Some(Session {
                access_token: format!("token-{id}"),
                user,
            }))
            .await;
        id
    }

    fn session_for(user: User) -> Session {
        Session {
            access_token: format!("token-{}", user.id),
            user,
        }
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn list_projects(&self, query: ProjectQuery) -> StoreResult<Vec<Project>> {
        let t = self.tables.lock().unwrap();
        let mut projects: Vec<Project> = t
            .projects
            .iter()
            .filter(|p| query.creator_id.is_none() || p.creator_id == query.creator_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = query.limit {
            projects.truncate(limit as usize);
        }
        Ok(projects)
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.project(id))
    }

    async fn insert_project(&self, project: NewProject) -> StoreResult<Project> {
        self.check_write()?;
        let creator_id = self.session.user_id().await;
        let mut t = self.tables.lock().unwrap();
        let project = Project {
            id: Uuid::new_v4(),
            title: project.title.trim().to_string(),
            description: project.description.trim().to_string(),
            tags: normalize_tags(&project.tags),
            creator_id,
            created_at: t.tick(),
            vote_count: 0,
        };
        t.projects.push(project.clone());
        Ok(project)
    }

    async fn apply_project_vote(&self, id: Uuid, delta: i64) -> StoreResult<i64> {
        self.check_write()?;
        let mut t = self.tables.lock().unwrap();
        let project = t
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| api(404, "Project not found"))?;
        project.vote_count += delta;
        Ok(project.vote_count)
    }

    async fn list_comments_for_project(&self, project_id: Uuid) -> StoreResult<Vec<Comment>> {
        self.comment_reads.fetch_add(1, Ordering::SeqCst);
        let t = self.tables.lock().unwrap();
        let mut comments: Vec<Comment> = t
            .comments
            .iter()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn list_comments_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Comment>> {
        let t = self.tables.lock().unwrap();
        let mut comments: Vec<Comment> = t
            .comments
            .iter()
            .filter(|c| c.user_id == Some(user_id))
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn insert_comment(&self, project_id: Uuid, content: String) -> StoreResult<Comment> {
        self.check_write()?;
        let user_id = self.session.user_id().await;
        let mut t = self.tables.lock().unwrap();
        if !t.projects.iter().any(|p| p.id == project_id) {
            return Err(api(404, "Project not found"));
        }
        let comment = Comment {
            id: Uuid::new_v4(),
            project_id,
            user_id,
            content,
            created_at: t.tick(),
        };
        t.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comment_votes(&self, comment_ids: &[Uuid]) -> StoreResult<Vec<CommentVote>> {
        self.vote_reads.fetch_add(1, Ordering::SeqCst);
        let t = self.tables.lock().unwrap();
        Ok(t.votes
            .iter()
            .filter(|v| comment_ids.contains(&v.comment_id))
            .cloned()
            .collect())
    }

    async fn insert_comment_vote(
        &self,
        comment_id: Uuid,
        direction: VoteDirection,
    ) -> StoreResult<CommentVote> {
        self.check_write()?;
        let user_id = self.require_user().await?;
        let mut t = self.tables.lock().unwrap();
        if t.votes.iter().any(|v| v.comment_id == comment_id && v.user_id == user_id) {
            return Err(api(409, "You have already voted on this comment"));
        }
        let vote = CommentVote {
            id: Uuid::new_v4(),
            comment_id,
            user_id,
            vote_type: direction,
            created_at: t.tick(),
        };
        t.votes.push(vote.clone());
        Ok(vote)
    }

    async fn update_comment_vote(
        &self,
        vote_id: Uuid,
        direction: VoteDirection,
    ) -> StoreResult<CommentVote> {
        self.check_write()?;
        let user_id = self.require_user().await?;
        let mut t = self.tables.lock().unwrap();
        let vote = t
            .votes
            .iter_mut()
            .find(|v| v.id == vote_id && v.user_id == user_id)
            .ok_or_else(|| api(404, "Vote not found"))?;
        vote.vote_type = direction;
        Ok(vote.clone())
    }

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.profile(id))
    }

    async fn insert_profile(&self, full_name: String) -> StoreResult<Profile> {
        self.check_write()?;
        let id = self.require_user().await?;
        let mut t = self.tables.lock().unwrap();
        if t.profiles.contains_key(&id) {
            return Err(api(409, "Profile already exists"));
        }
        let profile = Profile {
            id,
            full_name,
            bio: None,
            website: None,
            github: None,
            twitter: None,
            created_at: t.tick(),
        };
        t.profiles.insert(id, profile.clone());
        Ok(profile)
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> StoreResult<Profile> {
        self.check_write()?;
        if self.require_user().await? != id {
            return Err(api(403, "You can only edit your own profile"));
        }
        let mut t = self.tables.lock().unwrap();
        let profile = t
            .profiles
            .get_mut(&id)
            .ok_or_else(|| api(404, "Profile not found"))?;
        profile.full_name = patch.full_name;
        profile.bio = patch.bio;
        profile.website = patch.website;
        profile.github = patch.github;
        profile.twitter = patch.twitter;
        Ok(profile.clone())
    }

    async fn current_user(&self) -> StoreResult<Option<User>> {
        Ok(self.session.get().await.map(|s| s.user))
    }

    async fn current_session(&self) -> Option<Session> {
        self.session.get().await
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        self.session.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<Session> {
        let user = {
            let t = self.tables.lock().unwrap();
            match t.users.get(email) {
                Some((user, stored)) if stored == password => user.clone(),
                _ => return Err(api(400, "Invalid login credentials")),
            }
        };
        let session = Self::session_for(user);
        self.session.set(Some(session.clone())).await;
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> StoreResult<Session> {
        let user = {
            let mut t = self.tables.lock().unwrap();
            if t.users.contains_key(email) {
                return Err(api(409, "User already registered"));
            }
            let user = User {
                id: Uuid::new_v4(),
                email: email.to_string(),
                full_name: full_name.to_string(),
                created_at: t.tick(),
            };
            t.users
                .insert(email.to_string(), (user.clone(), password.to_string()));
            user
        };
        let session = Self::session_for(user);
        self.session.set(Some(session.clone())).await;
        Ok(session)
    }

    async fn sign_out(&self) -> StoreResult<()> {
        self.session.set(None).await;
        Ok(())
    }

    async fn send_password_reset(&self, _email: &str) -> StoreResult<()> {
        Ok(())
    }

    async fn sign_in_with_magic_link(&self, _email: &str) -> StoreResult<()> {
        Ok(())
    }

    async fn verify_magic_link(&self, token: &str) -> StoreResult<Session> {
        // Tokens in the fake are just the account's email address
        let user = {
            let t = self.tables.lock().unwrap();
            t.users
                .get(token)
                .map(|(user, _)| user.clone())
                .ok_or_else(|| api(401, "Token has expired or is invalid"))?
        };
        let session = Self::session_for(user);
        self.session.set(Some(session.clone())).await;
        Ok(session)
    }
}
