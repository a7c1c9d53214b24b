use crate::models::{
    CommentRow, CommentVoteRow, ProfileRow, ProfileUpdate, ProjectRow, TokenPurpose, UserRow,
};
use crate::{Database, now_timestamp};
use anyhow::Result;
use rusqlite::{Connection, Row};

const USER_COLUMNS: &str = "id, email, password, full_name, created_at";
const PROFILE_COLUMNS: &str = "id, full_name, bio, website, github, twitter, created_at";
const PROJECT_COLUMNS: &str = "id, title, description, tags, creator_id, created_at, vote_count";
const COMMENT_COLUMNS: &str = "id, project_id, user_id, content, created_at";
const VOTE_COLUMNS: &str = "id, comment_id, user_id, vote_type, created_at";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        full_name: &str,
    ) -> Result<UserRow> {
        let created_at = now_timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, full_name, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, email, password_hash, full_name, &created_at),
            )?;
            Ok(UserRow {
                id: id.to_string(),
                email: email.to_string(),
                password: password_hash.to_string(),
                full_name: full_name.to_string(),
                created_at,
            })
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
            conn.query_row(&sql, [email], user_from_row).optional()
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
            conn.query_row(&sql, [id], user_from_row).optional()
        })
    }

    pub fn update_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                (password_hash, id),
            )?;
            Ok(changed == 1)
        })
    }

    // -- One-time auth tokens --

    pub fn insert_auth_token(
        &self,
        token_hash: &str,
        user_id: &str,
        purpose: TokenPurpose,
        expires_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO auth_tokens (token_hash, user_id, purpose, expires_at) VALUES (?1, ?2, ?3, ?4)",
                (token_hash, user_id, purpose.as_str(), expires_at),
            )?;
            Ok(())
        })
    }

    /// Mark a live token as used and return its owner. Unknown, expired,
    /// already used or wrong-purpose tokens yield `None`.
    pub fn consume_auth_token(
        &self,
        token_hash: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<String>> {
        let now = now_timestamp();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let user_id: Option<String> = tx
                .query_row(
                    "SELECT user_id FROM auth_tokens
                     WHERE token_hash = ?1 AND purpose = ?2 AND used = 0 AND expires_at > ?3",
                    (token_hash, purpose.as_str(), &now),
                    |row| row.get(0),
                )
                .optional()?;

            if user_id.is_some() {
                tx.execute(
                    "UPDATE auth_tokens SET used = 1 WHERE token_hash = ?1",
                    [token_hash],
                )?;
            }
            tx.commit()?;
            Ok(user_id)
        })
    }

    // -- Profiles --

    pub fn get_profile(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, id))
    }

    pub fn insert_profile(&self, id: &str, full_name: &str) -> Result<ProfileRow> {
        let created_at = now_timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO profiles (id, full_name, created_at) VALUES (?1, ?2, ?3)",
                (id, full_name, &created_at),
            )?;
            Ok(ProfileRow {
                id: id.to_string(),
                full_name: full_name.to_string(),
                bio: None,
                website: None,
                github: None,
                twitter: None,
                created_at,
            })
        })
    }

    pub fn update_profile(&self, id: &str, update: &ProfileUpdate<'_>) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE profiles SET full_name = ?1, bio = ?2, website = ?3, github = ?4, twitter = ?5
                 WHERE id = ?6",
                rusqlite::params![
                    update.full_name,
                    update.bio,
                    update.website,
                    update.github,
                    update.twitter,
                    id
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_profile(conn, id)
        })
    }

    // -- Projects --

    pub fn insert_project(
        &self,
        id: &str,
        title: &str,
        description: &str,
        tags: &str,
        creator_id: Option<&str>,
    ) -> Result<ProjectRow> {
        let created_at = now_timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (id, title, description, tags, creator_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, title, description, tags, creator_id, created_at],
            )?;
            Ok(ProjectRow {
                id: id.to_string(),
                title: title.to_string(),
                description: description.to_string(),
                tags: tags.to_string(),
                creator_id: creator_id.map(str::to_string),
                created_at,
                vote_count: 0,
            })
        })
    }

    /// Projects newest first, optionally restricted to one creator.
    pub fn list_projects(&self, creator_id: Option<&str>, limit: Option<u32>) -> Result<Vec<ProjectRow>> {
        self.with_conn(|conn| {
            // SQLite treats a negative LIMIT as "no limit"
            let limit = limit.map(i64::from).unwrap_or(-1);
            let sql = format!(
                "SELECT {PROJECT_COLUMNS} FROM projects
                 WHERE (?1 IS NULL OR creator_id = ?1)
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![creator_id, limit], project_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_project(&self, id: &str) -> Result<Option<ProjectRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1");
            conn.query_row(&sql, [id], project_from_row).optional()
        })
    }

    /// Add `delta` to a project's counter in place and return the new value.
    /// `None` when the project does not exist.
    pub fn apply_project_vote(&self, id: &str, delta: i64) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            conn.query_row(
                "UPDATE projects SET vote_count = vote_count + ?1 WHERE id = ?2 RETURNING vote_count",
                rusqlite::params![delta, id],
                |row| row.get(0),
            )
            .optional()
        })
    }

    // -- Comments --

    pub fn insert_comment(
        &self,
        id: &str,
        project_id: &str,
        user_id: Option<&str>,
        content: &str,
    ) -> Result<CommentRow> {
        let created_at = now_timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, project_id, user_id, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, project_id, user_id, content, created_at],
            )?;
            Ok(CommentRow {
                id: id.to_string(),
                project_id: project_id.to_string(),
                user_id: user_id.map(str::to_string),
                content: content.to_string(),
                created_at,
            })
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1");
            conn.query_row(&sql, [id], comment_from_row).optional()
        })
    }

    pub fn comments_for_project(&self, project_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| query_comments(conn, "project_id", project_id))
    }

    pub fn comments_by_user(&self, user_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| query_comments(conn, "user_id", user_id))
    }

    // -- Comment votes --

    pub fn insert_comment_vote(
        &self,
        id: &str,
        comment_id: &str,
        user_id: &str,
        vote_type: &str,
    ) -> Result<CommentVoteRow> {
        let created_at = now_timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comment_votes (id, comment_id, user_id, vote_type, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, comment_id, user_id, vote_type, &created_at),
            )?;
            Ok(CommentVoteRow {
                id: id.to_string(),
                comment_id: comment_id.to_string(),
                user_id: user_id.to_string(),
                vote_type: vote_type.to_string(),
                created_at,
            })
        })
    }

    /// Change the direction of an existing vote owned by `user_id`.
    /// Identity and `created_at` are untouched. `None` when no such row
    /// belongs to that user.
    pub fn update_comment_vote(
        &self,
        id: &str,
        user_id: &str,
        vote_type: &str,
    ) -> Result<Option<CommentVoteRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE comment_votes SET vote_type = ?1 WHERE id = ?2 AND user_id = ?3
                 RETURNING {VOTE_COLUMNS}"
            );
            conn.query_row(&sql, (vote_type, id, user_id), vote_from_row)
                .optional()
        })
    }

    /// Batch-fetch votes for a set of comment IDs.
    pub fn votes_for_comments(&self, comment_ids: &[String]) -> Result<Vec<CommentVoteRow>> {
        if comment_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=comment_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT {VOTE_COLUMNS} FROM comment_votes WHERE comment_id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = comment_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), vote_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_profile(conn: &Connection, id: &str) -> Result<Option<ProfileRow>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1");
    conn.query_row(&sql, [id], |row| {
        Ok(ProfileRow {
            id: row.get(0)?,
            full_name: row.get(1)?,
            bio: row.get(2)?,
            website: row.get(3)?,
            github: row.get(4)?,
            twitter: row.get(5)?,
            created_at: row.get(6)?,
        })
    })
    .optional()
}

/// `column` is one of our own column names, never user input.
fn query_comments(conn: &Connection, column: &str, value: &str) -> Result<Vec<CommentRow>> {
    let sql = format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE {column} = ?1
         ORDER BY created_at DESC, rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([value], comment_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        full_name: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectRow> {
    Ok(ProjectRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        tags: row.get(3)?,
        creator_id: row.get(4)?,
        created_at: row.get(5)?,
        vote_count: row.get(6)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        project_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn vote_from_row(row: &Row<'_>) -> rusqlite::Result<CommentVoteRow> {
    Ok(CommentVoteRow {
        id: row.get(0)?,
        comment_id: row.get(1)?,
        user_id: row.get(2)?,
        vote_type: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
