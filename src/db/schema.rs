//! Database schema and migrations for nimbus.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Byte capacity of the plan seeded as the default service.
pub const DEFAULT_SERVICE_CAPACITY: i64 = 536_870_912;

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Accounts - services, users and profiles
    r#"
-- Subscription plans
CREATE TABLE services (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 100),
    price_cents INTEGER NOT NULL DEFAULT 0 CHECK (price_cents >= 0),
    capacity    INTEGER NOT NULL DEFAULT 536870912,  -- bytes, 512 MB or 1 GB
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

-- The plan every new profile starts on
INSERT INTO services (name, price_cents, capacity) VALUES ('Basic', 0, 536870912);

CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email       TEXT,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE profiles (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    service_id  INTEGER NOT NULL REFERENCES services(id) ON DELETE RESTRICT,
    language    TEXT NOT NULL DEFAULT 'en',
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_profiles_service ON profiles(service_id);
"#,
    // v2: Storages - one bucket per (profile, type)
    r#"
CREATE TABLE storages (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id     INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    storage_type INTEGER NOT NULL CHECK (storage_type IN (1, 2, 3)),  -- main, trash, thumb
    created_at   TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (owner_id, storage_type)
);
"#,
    // v3: Metadata tree - MIME lookup, directories and files
    r#"
CREATE TABLE mime_content_types (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 100),
    extension   TEXT NOT NULL UNIQUE  -- lower-case, no dot; '' for none
);

CREATE TABLE dir_meta (
    id          BLOB PRIMARY KEY,  -- UUID
    storage_id  INTEGER NOT NULL REFERENCES storages(id) ON DELETE CASCADE,
    name        TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 4096),
    parent_id   BLOB REFERENCES dir_meta(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    modified_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (name, parent_id)
);

-- UNIQUE (name, parent_id) does not cover NULL parents
CREATE UNIQUE INDEX idx_dir_meta_root_name ON dir_meta(storage_id, name) WHERE parent_id IS NULL;
CREATE INDEX idx_dir_meta_storage ON dir_meta(storage_id);
CREATE INDEX idx_dir_meta_parent ON dir_meta(parent_id);

CREATE TABLE file_meta (
    id           BLOB PRIMARY KEY,  -- UUID
    storage_id   INTEGER NOT NULL REFERENCES storages(id) ON DELETE CASCADE,
    name         TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 4096),
    parent_id    BLOB REFERENCES dir_meta(id) ON DELETE CASCADE,
    mime_type_id INTEGER NOT NULL REFERENCES mime_content_types(id),
    size         INTEGER NOT NULL DEFAULT 0 CHECK (size >= 0),
    created_at   TEXT NOT NULL DEFAULT (datetime('now')),
    modified_at  TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (name, parent_id)
);

CREATE UNIQUE INDEX idx_file_meta_root_name ON file_meta(storage_id, name) WHERE parent_id IS NULL;
CREATE INDEX idx_file_meta_storage ON file_meta(storage_id);
CREATE INDEX idx_file_meta_parent ON file_meta(parent_id);
"#,
];
