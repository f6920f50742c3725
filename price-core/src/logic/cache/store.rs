//! Prediction Cache - SQLite-backed store of model answers
//!
//! The cache is an optimization, never a correctness dependency: every
//! public operation catches storage errors, logs them, and degrades to
//! `false` / `None` / zero.
//!
//! Each call opens its own connection, so one `PredictionCache` can be
//! cloned into any number of threads. Concurrent writers are serialized by
//! SQLite itself (busy timeout + transactions).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::fingerprint;
use super::schema::SCHEMA_SQL;
use super::types::{CacheError, CacheStats, CachedPrediction};
use crate::logic::features::FeatureVector;

// ============================================================================
// CONSTANTS
// ============================================================================

/// How long a connection waits on a locked database
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}

// ============================================================================
// PREDICTION CACHE
// ============================================================================

#[derive(Debug, Clone)]
pub struct PredictionCache {
    db_path: PathBuf,
}

impl PredictionCache {
    /// Open (or create) the cache database and apply the schema.
    ///
    /// This is the one place a storage error reaches the caller: a cache
    /// that cannot even be created is a startup problem.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let cache = Self {
            db_path: path.as_ref().to_path_buf(),
        };
        let conn = cache.connect()?;
        conn.execute_batch(SCHEMA_SQL)?;

        log::info!("Prediction cache initialized: {:?}", cache.db_path);
        Ok(cache)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub(crate) fn connect(&self) -> Result<Connection, CacheError> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Store a prediction, or count another access if the input is known.
    ///
    /// An existing entry keeps its original prediction.
    pub fn put(
        &self,
        features: &FeatureVector,
        predicted_class: i64,
        label: &str,
        confidence: Option<f64>,
    ) -> bool {
        match self.try_put(features, predicted_class, label, confidence) {
            Ok(key) => {
                log::info!("Prediction cached for fingerprint {}", key);
                true
            }
            Err(e) => {
                log::error!("Failed to cache prediction: {}", e);
                false
            }
        }
    }

    fn try_put(
        &self,
        features: &FeatureVector,
        predicted_class: i64,
        label: &str,
        confidence: Option<f64>,
    ) -> Result<String, CacheError> {
        let key = fingerprint(features);
        let now = now_millis();
        let conn = self.connect()?;

        conn.execute(
            r#"
            INSERT INTO predictions
                (fingerprint, features, predicted_class, label, confidence, created_at, access_count, last_accessed)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?6)
            ON CONFLICT(fingerprint) DO UPDATE SET
                access_count = access_count + 1,
                last_accessed = excluded.last_accessed
            "#,
            params![key, features.canonical_json(), predicted_class, label, confidence, now],
        )?;

        Ok(key)
    }

    /// Look up a cached prediction; a hit counts as an access.
    pub fn get(&self, features: &FeatureVector) -> Option<CachedPrediction> {
        match self.try_get(features) {
            Ok(hit) => hit,
            Err(e) => {
                log::error!("Failed to retrieve cached prediction: {}", e);
                None
            }
        }
    }

    fn try_get(&self, features: &FeatureVector) -> Result<Option<CachedPrediction>, CacheError> {
        let key = fingerprint(features);
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let row = tx
            .query_row(
                r#"
                SELECT predicted_class, label, confidence, created_at, access_count
                FROM predictions WHERE fingerprint = ?1
                "#,
                params![key],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;

        // Miss: dropping `tx` rolls back, nothing was written
        let Some((prediction, prediction_text, confidence, created_at, access_count)) = row else {
            return Ok(None);
        };

        tx.execute(
            r#"
            UPDATE predictions
            SET access_count = access_count + 1, last_accessed = ?2
            WHERE fingerprint = ?1
            "#,
            params![key, now_millis()],
        )?;
        tx.commit()?;

        log::debug!("Cache hit for fingerprint {}", key);

        Ok(Some(CachedPrediction {
            fingerprint: key,
            prediction,
            prediction_text,
            confidence,
            cached_at: to_datetime(created_at),
            access_count: access_count.max(0) as u64 + 1,
        }))
    }

    /// Aggregate statistics; zeroed on storage failure.
    pub fn stats(&self) -> CacheStats {
        match self.try_stats() {
            Ok(stats) => stats,
            Err(e) => {
                log::error!("Failed to get cache stats: {}", e);
                CacheStats::default()
            }
        }
    }

    fn try_stats(&self) -> Result<CacheStats, CacheError> {
        let conn = self.connect()?;

        let (total, accesses, avg_confidence): (i64, i64, Option<f64>) = conn.query_row(
            r#"
            SELECT COUNT(*), COALESCE(SUM(access_count), 0), AVG(confidence)
            FROM predictions
            "#,
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let recent: i64 = conn.query_row(
            "SELECT COUNT(*) FROM predictions WHERE created_at > ?1",
            params![now_millis() - MILLIS_PER_DAY],
            |row| row.get(0),
        )?;

        let size_bytes = self.database_size();

        Ok(CacheStats {
            total_predictions: total.max(0) as u64,
            total_accesses: accesses.max(0) as u64,
            recent_predictions_24h: recent.max(0) as u64,
            average_confidence: avg_confidence.map(|c| (c * 100.0).round() / 100.0),
            cache_size_bytes: size_bytes,
            cache_size_mb: (size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
        })
    }

    fn database_size(&self) -> u64 {
        fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0)
    }

    /// Delete entries created `max_age_days` or more ago; returns rows removed.
    pub fn cleanup(&self, max_age_days: u32) -> usize {
        match self.try_cleanup(max_age_days) {
            Ok(deleted) => {
                log::info!("Cleaned up {} old predictions", deleted);
                deleted
            }
            Err(e) => {
                log::error!("Failed to cleanup old predictions: {}", e);
                0
            }
        }
    }

    fn try_cleanup(&self, max_age_days: u32) -> Result<usize, CacheError> {
        let cutoff = now_millis() - i64::from(max_age_days) * MILLIS_PER_DAY;
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let deleted = tx.execute(
            "DELETE FROM predictions WHERE created_at <= ?1",
            params![cutoff],
        )?;
        tx.commit()?;
        Ok(deleted)
    }

    /// Cheap connectivity check for health endpoints
    pub fn is_available(&self) -> bool {
        self.connect()
            .and_then(|conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                    .map_err(CacheError::from)
            })
            .is_ok()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ValidationLimits;
    use tempfile::TempDir;

    fn open_cache() -> (TempDir, PredictionCache) {
        let temp_dir = TempDir::new().unwrap();
        let cache = PredictionCache::open(temp_dir.path().join("predictions.db")).unwrap();
        (temp_dir, cache)
    }

    fn phone(battery: f64) -> FeatureVector {
        let raw = [
            battery, 1.0, 1.5, 1.0, 5.0, 1.0, 16.0, 0.1, 150.0, 4.0, 8.0, 1000.0, 2000.0, 2000.0,
            10.0, 5.0, 10.0, 1.0, 1.0, 1.0,
        ];
        FeatureVector::parse(&raw, &ValidationLimits::default()).unwrap()
    }

    #[test]
    fn test_put_then_get() {
        let (_dir, cache) = open_cache();
        let v = phone(1000.0);

        assert!(cache.put(&v, 2, "Upper mid-range phone", Some(87.5)));
        let hit = cache.get(&v).unwrap();

        assert_eq!(hit.prediction, 2);
        assert_eq!(hit.prediction_text, "Upper mid-range phone");
        assert_eq!(hit.confidence, Some(87.5));
        assert_eq!(hit.access_count, 2);
        assert_eq!(hit.fingerprint, fingerprint(&v));
    }

    #[test]
    fn test_miss_has_no_side_effect() {
        let (_dir, cache) = open_cache();
        assert!(cache.get(&phone(1000.0)).is_none());
        assert_eq!(cache.stats().total_predictions, 0);
        assert_eq!(cache.stats().total_accesses, 0);
    }

    #[test]
    fn test_put_existing_keeps_prediction() {
        let (_dir, cache) = open_cache();
        let v = phone(1000.0);

        cache.put(&v, 1, "Lower mid-range phone", None);
        cache.put(&v, 3, "Premium phone", Some(99.0));

        let hit = cache.get(&v).unwrap();
        assert_eq!(hit.prediction, 1);
        assert_eq!(hit.confidence, None);
        assert_eq!(hit.access_count, 3);
    }

    #[test]
    fn test_stats_distinct_inputs() {
        let (_dir, cache) = open_cache();
        for i in 0..5 {
            cache.put(&phone(1000.0 + i as f64), 0, "Budget mobile phone", Some(80.0));
        }

        let stats = cache.stats();
        assert_eq!(stats.total_predictions, 5);
        assert_eq!(stats.total_accesses, 5);
        assert_eq!(stats.recent_predictions_24h, 5);
        assert_eq!(stats.average_confidence, Some(80.0));
        assert!(stats.cache_size_bytes > 0);
    }

    #[test]
    fn test_stats_same_input() {
        let (_dir, cache) = open_cache();
        let v = phone(1500.0);
        for _ in 0..4 {
            cache.put(&v, 0, "Budget mobile phone", None);
        }

        let stats = cache.stats();
        assert_eq!(stats.total_predictions, 1);
        assert_eq!(stats.total_accesses, 4);
        assert_eq!(stats.average_confidence, None);
    }

    #[test]
    fn test_average_confidence_ignores_missing() {
        let (_dir, cache) = open_cache();
        cache.put(&phone(1000.0), 0, "Budget mobile phone", Some(70.0));
        cache.put(&phone(1001.0), 1, "Lower mid-range phone", Some(90.0));
        cache.put(&phone(1002.0), 99, "Unknown prediction result", None);

        assert_eq!(cache.stats().average_confidence, Some(80.0));
    }

    #[test]
    fn test_cleanup() {
        let (_dir, cache) = open_cache();
        cache.put(&phone(1000.0), 0, "Budget mobile phone", None);
        cache.put(&phone(2000.0), 1, "Lower mid-range phone", None);

        assert_eq!(cache.cleanup(36_500), 0);
        assert_eq!(cache.stats().total_predictions, 2);

        assert_eq!(cache.cleanup(0), 2);
        assert_eq!(cache.stats().total_predictions, 0);
        assert!(cache.get(&phone(1000.0)).is_none());
    }

    #[test]
    fn test_cleanup_respects_age() {
        let (_dir, cache) = open_cache();
        cache.put(&phone(1000.0), 0, "Budget mobile phone", None);
        cache.put(&phone(2000.0), 1, "Lower mid-range phone", None);

        // Age one entry by ten days
        let conn = cache.connect().unwrap();
        conn.execute(
            "UPDATE predictions SET created_at = created_at - ?1 WHERE fingerprint = ?2",
            params![10 * MILLIS_PER_DAY, fingerprint(&phone(1000.0))],
        )
        .unwrap();

        assert_eq!(cache.cleanup(7), 1);
        assert!(cache.get(&phone(1000.0)).is_none());
        assert!(cache.get(&phone(2000.0)).is_some());
        assert_eq!(cache.stats().recent_predictions_24h, 1);
    }

    #[test]
    fn test_storage_failure_degrades() {
        let (_dir, cache) = open_cache();
        let v = phone(1000.0);
        cache.put(&v, 0, "Budget mobile phone", None);

        cache
            .connect()
            .unwrap()
            .execute_batch("DROP TABLE predictions")
            .unwrap();

        assert!(!cache.put(&v, 0, "Budget mobile phone", None));
        assert!(cache.get(&v).is_none());
        assert_eq!(cache.stats(), CacheStats::default());
        assert_eq!(cache.cleanup(0), 0);
    }

    #[test]
    fn test_reopen_keeps_entries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("predictions.db");
        let v = phone(1000.0);

        PredictionCache::open(&path).unwrap().put(&v, 3, "Premium phone", Some(91.0));
        let reopened = PredictionCache::open(&path).unwrap();

        assert_eq!(reopened.get(&v).map(|hit| hit.prediction), Some(3));
        assert!(reopened.is_available());
    }

    #[test]
    fn test_concurrent_puts() {
        let (_dir, cache) = open_cache();
        let v = phone(1000.0);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                let v = v.clone();
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        assert!(cache.put(&v, 0, "Budget mobile phone", None));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.total_predictions, 1);
        assert_eq!(stats.total_accesses, 20);
    }
}
