use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            full_name   TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        -- One-time tokens for password recovery and magic-link sign in.
        -- Only the SHA-256 of the token is stored.
        CREATE TABLE IF NOT EXISTS auth_tokens (
            token_hash  TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            purpose     TEXT NOT NULL CHECK (purpose IN ('recovery', 'magic_link')),
            expires_at  TEXT NOT NULL,
            used        INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE TABLE IF NOT EXISTS profiles (
            id          TEXT PRIMARY KEY REFERENCES users(id),
            full_name   TEXT NOT NULL DEFAULT '',
            bio         TEXT,
            website     TEXT,
            github      TEXT,
            twitter     TEXT,
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE TABLE IF NOT EXISTS projects (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            description TEXT NOT NULL,
            tags        TEXT NOT NULL DEFAULT '',
            creator_id  TEXT REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            vote_count  INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_projects_created
            ON projects(created_at);

        CREATE INDEX IF NOT EXISTS idx_projects_creator
            ON projects(creator_id, created_at);

        CREATE TABLE IF NOT EXISTS comments (
            id          TEXT PRIMARY KEY,
            project_id  TEXT NOT NULL REFERENCES projects(id),
            user_id     TEXT REFERENCES users(id),
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_project
            ON comments(project_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_comments_user
            ON comments(user_id, created_at);

        CREATE TABLE IF NOT EXISTS comment_votes (
            id          TEXT PRIMARY KEY,
            comment_id  TEXT NOT NULL REFERENCES comments(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            vote_type   TEXT NOT NULL CHECK (vote_type IN ('up', 'down')),
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            UNIQUE(comment_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_comment_votes_comment
            ON comment_votes(comment_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
