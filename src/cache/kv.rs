//! TTL-bound persistent key/value cache (spec section 4.1).
//!
//! `original_source/src/cache.py` backs this with LMDB; there's no LMDB
//! crate in the teacher's stack, so this is re-grounded on
//! `link_index/mod.rs`'s SQLite-with-WAL pattern instead, carrying over its
//! connect options verbatim and adding the secondary expiry index the
//! original's LMDB cursor-scan eviction needs an equivalent for.
//!
//! A single `write_lock` serializes writers; WAL mode still lets readers
//! proceed without blocking on it (spec section 5, "Shared resources").

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS cache (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    expires_at_nanos INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cache_expiry ON cache(expires_at_nanos);
"#;

/// Run a sweep of expired rows after this many `set` calls, amortizing the
/// range-scan delete instead of paying it on every write (spec section 4.1,
/// "Eviction cadence").
const EVICT_EVERY_N_SETS: u64 = 1000;

pub struct KvCache {
    pool: SqlitePool,
    ttl: std::time::Duration,
    write_lock: Mutex<()>,
    sets_since_evict: AtomicU64,
}

fn now_nanos() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is after 1970")
        .as_nanos() as i64
}

impl KvCache {
    /// Open (creating if absent) a cache database at `path`, with entries
    /// expiring `ttl` after they're set. Runs one eviction sweep on open,
    /// mirroring the original's startup behavior of discarding stale
    /// entries before serving traffic.
    pub async fn open(path: &Path, ttl: std::time::Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("failed to create cache directory")?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .context("failed to open cache database")?;

        sqlx::query(SCHEMA_SQL)
            .execute(&pool)
            .await
            .context("failed to initialize cache schema")?;

        let cache = KvCache {
            pool,
            ttl,
            write_lock: Mutex::new(()),
            sets_since_evict: AtomicU64::new(0),
        };
        cache.evict().await;
        Ok(cache)
    }

    /// Store `value` under `key`, resetting its TTL. Backing-store errors
    /// are logged and swallowed: a failed write just means the next `get`
    /// sees a miss, which is within the cache's stated contract (spec
    /// section 4.1, "Failure semantics").
    pub async fn set(&self, key: &str, value: &[u8]) {
        let expires_at = now_nanos() + self.ttl.as_nanos() as i64;
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query(
            "INSERT INTO cache (key, value, expires_at_nanos) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at_nanos = excluded.expires_at_nanos",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            tracing::error!(%key, %err, "kv cache set failed");
            return;
        }

        if self.sets_since_evict.fetch_add(1, Ordering::Relaxed) + 1 >= EVICT_EVERY_N_SETS {
            self.sets_since_evict.store(0, Ordering::Relaxed);
            drop(_guard);
            self.evict().await;
        }
    }

    /// Fetch `key`'s value if present and not expired. An expired row is
    /// deleted opportunistically and treated as a miss.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let row = sqlx::query("SELECT value, expires_at_nanos FROM cache WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .inspect_err(|err| tracing::error!(%key, %err, "kv cache get failed"))
            .ok()??;

        let expires_at: i64 = row.get("expires_at_nanos");
        if expires_at <= now_nanos() {
            let _guard = self.write_lock.lock().await;
            let _ = sqlx::query("DELETE FROM cache WHERE key = ?1")
                .bind(key)
                .execute(&self.pool)
                .await;
            return None;
        }

        Some(row.get("value"))
    }

    /// Delete every expired row. Cheap relative to a full scan thanks to
    /// the index on `expires_at_nanos`.
    pub async fn evict(&self) {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM cache WHERE expires_at_nanos <= ?1")
            .bind(now_nanos())
            .execute(&self.pool)
            .await;
        if let Err(err) = result {
            tracing::error!(%err, "kv cache eviction sweep failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = KvCache::open(&dir.path().join("c.sqlite"), std::time::Duration::from_secs(60))
            .await
            .unwrap();

        cache.set("k", b"v1").await;
        assert_eq!(cache.get("k").await, Some(b"v1".to_vec()));

        cache.set("k", b"v2").await;
        assert_eq!(cache.get("k").await, Some(b"v2".to_vec()));
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = KvCache::open(&dir.path().join("c.sqlite"), std::time::Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("nope").await, None);
    }

    #[tokio::test]
    async fn expired_entry_is_treated_as_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = KvCache::open(&dir.path().join("c.sqlite"), std::time::Duration::from_millis(10))
            .await
            .unwrap();

        cache.set("k", b"v").await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn evict_removes_expired_rows_but_keeps_live_ones() {
        let dir = tempfile::tempdir().unwrap();
        let cache = KvCache::open(&dir.path().join("c.sqlite"), std::time::Duration::from_millis(10))
            .await
            .unwrap();
        cache.set("stale", b"v").await;

        let long_lived =
            KvCache::open(&dir.path().join("c2.sqlite"), std::time::Duration::from_secs(60))
                .await
                .unwrap();
        long_lived.set("fresh", b"v").await;

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        cache.evict().await;
        assert_eq!(cache.get("stale").await, None);
        assert_eq!(long_lived.get("fresh").await, Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn reopening_an_existing_database_preserves_live_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.sqlite");
        {
            let cache = KvCache::open(&path, std::time::Duration::from_secs(60)).await.unwrap();
            cache.set("k", b"persisted").await;
        }
        let reopened = KvCache::open(&path, std::time::Duration::from_secs(60)).await.unwrap();
        assert_eq!(reopened.get("k").await, Some(b"persisted".to_vec()));
    }
}
