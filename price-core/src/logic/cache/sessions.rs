//! Session tracking and the prediction audit trail
//!
//! Write-only telemetry kept next to the cache. Same failure policy as the
//! cache: log and return `false`.

use rusqlite::params;

use super::store::{now_millis, to_datetime, PredictionCache};
use super::types::{CacheError, FailedPrediction, PredictionLog};

impl PredictionCache {
    /// Create the session or refresh its last activity
    pub fn touch_session(
        &self,
        session_id: &str,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
    ) -> bool {
        let result = self.connect().and_then(|conn| {
            conn.execute(
                r#"
                INSERT INTO sessions (session_id, user_agent, ip_address, created_at, last_activity, prediction_count)
                VALUES (?1, ?2, ?3, ?4, ?4, 0)
                ON CONFLICT(session_id) DO UPDATE SET
                    user_agent = COALESCE(excluded.user_agent, user_agent),
                    ip_address = COALESCE(excluded.ip_address, ip_address),
                    last_activity = excluded.last_activity
                "#,
                params![session_id, user_agent, ip_address, now_millis()],
            )
            .map_err(CacheError::from)
        });

        match result {
            Ok(_) => true,
            Err(e) => {
                log::error!("Failed to touch session {}: {}", session_id, e);
                false
            }
        }
    }

    /// Count one more prediction against a session
    pub fn record_session_prediction(&self, session_id: &str) -> bool {
        let result = self.connect().and_then(|conn| {
            conn.execute(
                r#"
                UPDATE sessions
                SET last_activity = ?2, prediction_count = prediction_count + 1
                WHERE session_id = ?1
                "#,
                params![session_id, now_millis()],
            )
            .map_err(CacheError::from)
        });

        match result {
            Ok(updated) => updated > 0,
            Err(e) => {
                log::error!("Failed to update session activity: {}", e);
                false
            }
        }
    }

    /// Append one request to the audit trail
    pub fn log_prediction(&self, entry: &PredictionLog) -> bool {
        let result = self.connect().and_then(|conn| {
            conn.execute(
                r#"
                INSERT INTO prediction_logs
                    (session_id, fingerprint, predicted_class, latency_ms, success, error_message, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    entry.session_id,
                    entry.fingerprint,
                    entry.predicted_class,
                    entry.latency_ms,
                    entry.success,
                    entry.error_message,
                    now_millis(),
                ],
            )
            .map_err(CacheError::from)
        });

        match result {
            Ok(_) => true,
            Err(e) => {
                log::error!("Failed to log prediction: {}", e);
                false
            }
        }
    }

    /// Newest failed requests first; empty on storage failure
    pub fn recent_failures(&self, limit: usize) -> Vec<FailedPrediction> {
        match self.try_recent_failures(limit) {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("Failed to read prediction log: {}", e);
                Vec::new()
            }
        }
    }

    fn try_recent_failures(&self, limit: usize) -> Result<Vec<FailedPrediction>, CacheError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT session_id, latency_ms, error_message, created_at
            FROM prediction_logs
            WHERE success = 0
            ORDER BY created_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(FailedPrediction {
                    session_id: row.get(0)?,
                    latency_ms: row.get(1)?,
                    error_message: row.get(2)?,
                    logged_at: to_datetime(row.get(3)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
