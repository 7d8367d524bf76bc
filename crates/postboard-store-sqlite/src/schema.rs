//! SQL schema for the Postboard SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,  -- normalised: trimmed, lowercase
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,         -- argon2 PHC string
    status        TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS posts (
    post_id     TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    image_url   TEXT NOT NULL,
    creator_id  TEXT NOT NULL REFERENCES users(user_id),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- A user's own post list. No foreign key on post_id: the post row and its
-- link are written and removed as separate steps.
CREATE TABLE IF NOT EXISTS user_posts (
    seq      INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id  TEXT NOT NULL REFERENCES users(user_id),
    post_id  TEXT NOT NULL,
    UNIQUE (user_id, post_id)
);

CREATE TABLE IF NOT EXISTS chats (
    chat_id     TEXT PRIMARY KEY,
    user_a      TEXT NOT NULL REFERENCES users(user_id),
    user_b      TEXT NOT NULL REFERENCES users(user_id),
    created_at  TEXT NOT NULL,
    CHECK (user_a != user_b)
);

CREATE TABLE IF NOT EXISTS user_chats (
    seq      INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id  TEXT NOT NULL REFERENCES users(user_id),
    chat_id  TEXT NOT NULL REFERENCES chats(chat_id),
    UNIQUE (user_id, chat_id)
);

-- Messages are append-only; seq gives insertion order.
CREATE TABLE IF NOT EXISTS chat_messages (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id   TEXT NOT NULL UNIQUE,
    chat_id      TEXT NOT NULL REFERENCES chats(chat_id),
    content      TEXT NOT NULL,
    sender_id    TEXT NOT NULL,
    sender_name  TEXT NOT NULL,
    sent_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS posts_created_idx    ON posts(created_at);
CREATE INDEX IF NOT EXISTS chats_pair_idx       ON chats(user_a, user_b);
CREATE INDEX IF NOT EXISTS chat_messages_idx    ON chat_messages(chat_id);

PRAGMA user_version = 1;
";
