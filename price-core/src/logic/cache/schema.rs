//! Cache database schema

/// Applied on every open; all statements are idempotent.
/// Timestamps are Unix milliseconds.
pub const SCHEMA_SQL: &str = r#"
-- Cached predictions (one row per input fingerprint)
CREATE TABLE IF NOT EXISTS predictions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    fingerprint TEXT NOT NULL UNIQUE,
    features TEXT NOT NULL,
    predicted_class INTEGER NOT NULL,
    label TEXT NOT NULL,
    confidence REAL,
    created_at INTEGER NOT NULL,
    access_count INTEGER NOT NULL DEFAULT 1,
    last_accessed INTEGER NOT NULL
);

-- Client sessions
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL UNIQUE,
    user_agent TEXT,
    ip_address TEXT,
    created_at INTEGER NOT NULL,
    last_activity INTEGER NOT NULL,
    prediction_count INTEGER NOT NULL DEFAULT 0
);

-- Append-only audit trail of prediction requests
CREATE TABLE IF NOT EXISTS prediction_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT,
    fingerprint TEXT,
    predicted_class INTEGER,
    latency_ms REAL NOT NULL,
    success INTEGER NOT NULL,
    error_message TEXT,
    created_at INTEGER NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_predictions_created ON predictions(created_at);
CREATE INDEX IF NOT EXISTS idx_logs_session ON prediction_logs(session_id, created_at);
"#;
