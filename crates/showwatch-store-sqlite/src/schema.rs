//! SQL schema for the Showwatch SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS theaters (
    theater_id    TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    city          TEXT NOT NULL,
    external_code TEXT NOT NULL UNIQUE,   -- site venue code, e.g. 'PRHN'
    external_path TEXT NOT NULL,          -- 'city/slug'
    address       TEXT,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    user_id          TEXT PRIMARY KEY,
    email            TEXT UNIQUE,
    telegram_chat_id TEXT UNIQUE,
    channel          TEXT NOT NULL,       -- 'email' | 'telegram'
    created_at       TEXT NOT NULL,
    CHECK (email IS NOT NULL OR telegram_chat_id IS NOT NULL)
);

-- Subscriptions are never deleted; only the active flag moves.
CREATE TABLE IF NOT EXISTS subscriptions (
    subscription_id    TEXT PRIMARY KEY,
    user_id            TEXT NOT NULL REFERENCES users(user_id),
    theater_id         TEXT NOT NULL REFERENCES theaters(theater_id),
    movie_query        TEXT NOT NULL,
    target_date        TEXT NOT NULL,     -- YYYY-MM-DD
    active             INTEGER NOT NULL DEFAULT 1,
    notify_new_shows   INTEGER NOT NULL DEFAULT 1,
    notify_new_times   INTEGER NOT NULL DEFAULT 1,
    deactivated_reason TEXT,              -- 'notification_sent' | 'user_unsubscribed'
    deactivated_at     TEXT,
    created_at         TEXT NOT NULL,
    UNIQUE (user_id, theater_id, movie_query, target_date)
);

-- The current snapshot per (theater, date); replaced wholesale each cycle.
CREATE TABLE IF NOT EXISTS movies (
    movie_id    TEXT PRIMARY KEY,
    theater_id  TEXT NOT NULL REFERENCES theaters(theater_id),
    show_date   TEXT NOT NULL,
    position    INTEGER NOT NULL,
    title       TEXT NOT NULL,
    full_title  TEXT NOT NULL,
    language    TEXT,
    rating      TEXT,
    format      TEXT,
    external_id TEXT,
    url_path    TEXT
);

CREATE TABLE IF NOT EXISTS showtimes (
    movie_id   TEXT NOT NULL REFERENCES movies(movie_id) ON DELETE CASCADE,
    position   INTEGER NOT NULL,
    start_time TEXT NOT NULL,
    screen     TEXT,
    PRIMARY KEY (movie_id, position)
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL REFERENCES users(user_id),
    subscription_id TEXT REFERENCES subscriptions(subscription_id),
    kind            TEXT NOT NULL,        -- 'new_movie' | 'new_showtime' | 'movie_removed'
    message         TEXT NOT NULL,
    sent            INTEGER NOT NULL DEFAULT 0,
    attempts        INTEGER NOT NULL DEFAULT 0,  -- failed deliveries so far
    channel         TEXT,
    created_at      TEXT NOT NULL,
    sent_at         TEXT
);

CREATE INDEX IF NOT EXISTS subscriptions_active_idx ON subscriptions(active, target_date);
CREATE INDEX IF NOT EXISTS subscriptions_user_idx   ON subscriptions(user_id);
CREATE INDEX IF NOT EXISTS movies_group_idx         ON movies(theater_id, show_date);
CREATE INDEX IF NOT EXISTS notifications_sent_idx   ON notifications(sent, attempts, created_at);

PRAGMA user_version = 1;
";
