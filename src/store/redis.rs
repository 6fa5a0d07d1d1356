//! Redis-backed store implementation
//!
//! The production [`FrontierStore`] backend. All multi-key operations that
//! must be atomic across workers (insert-if-absent, pop-and-checkout, the
//! stale sweep) run as Lua scripts; single-key operations use plain
//! commands or `MULTI`/`EXEC` pipelines. One multiplexed connection is
//! shared by all callers in the process.

use crate::config::StoreConfig;
use crate::store::traits::{FrontierStore, StoreError, StoreResult};
use crate::store::{FrontierEntry, ProcessingOutcome, StoreCounts, UrlRecord, WorkerState};
use crate::url::Fingerprint;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

// Keyspace. The frontier is a zset of fingerprints scored by priority,
// with the serialized task payloads in a sibling hash; in-flight entries
// move to their own hash keyed by fingerprint.
const FRONTIER_KEY: &str = "to_visit_urls";
const TASKS_KEY: &str = "to_visit_tasks";
const PROCESSING_KEY: &str = "processing_urls";
const VISITED_KEY: &str = "visited_urls";
const FAILED_KEY: &str = "failed_urls";
const PROCESSED_KEY: &str = "processed_urls";
const DOMAIN_COUNT_KEY: &str = "domain_count";
const ARTIFACTS_KEY: &str = "scraped_emails";
const ARTIFACTS_DOMAIN_PREFIX: &str = "scraped_emails:";
const HANDLED_KEY: &str = "sent_emails";
const HANDLED_FAILED_KEY: &str = "failed_emails";
const SHUTDOWN_KEY: &str = "shutdown";
const REGISTER_KEY: &str = "register";

// KEYS: visited, failed, processing, frontier, tasks
// ARGV: (fingerprint, score, task_json) triples
const SCRIPT_INSERT_IF_ABSENT: &str = r"
    local added = 0
    for i = 1, #ARGV, 3 do
        local fp = ARGV[i]
        if redis.call('SISMEMBER', KEYS[1], fp) == 0
            and redis.call('SISMEMBER', KEYS[2], fp) == 0
            and redis.call('HEXISTS', KEYS[3], fp) == 0
            and redis.call('HEXISTS', KEYS[5], fp) == 0 then
            redis.call('ZADD', KEYS[4], ARGV[i + 1], fp)
            redis.call('HSET', KEYS[5], fp, ARGV[i + 2])
            added = added + 1
        end
    end
    return added
";

// KEYS: frontier, tasks, processing
// ARGV: count, now_epoch_secs
// Pops the lowest-score entries and parks them in the in-flight hash in
// the same script, so a worker crash between pop and fetch cannot lose
// them. Returns a flat (fingerprint, task_json, score) list.
const SCRIPT_POP_BATCH: &str = r"
    local popped = redis.call('ZPOPMIN', KEYS[1], tonumber(ARGV[1]))
    local out = {}
    for i = 1, #popped, 2 do
        local fp = popped[i]
        local score = popped[i + 1]
        local task = redis.call('HGET', KEYS[2], fp)
        if task then
            redis.call('HDEL', KEYS[2], fp)
            local rec = cjson.decode(task)
            rec.score = tonumber(score)
            rec.checked_out_at = tonumber(ARGV[2])
            redis.call('HSET', KEYS[3], fp, cjson.encode(rec))
            table.insert(out, fp)
            table.insert(out, task)
            table.insert(out, score)
        end
    end
    return out
";

// KEYS: processing, frontier, tasks
// ARGV: cutoff_epoch_secs
const SCRIPT_RECLAIM_STALE: &str = r"
    local entries = redis.call('HGETALL', KEYS[1])
    local moved = 0
    for i = 1, #entries, 2 do
        local fp = entries[i]
        local rec = cjson.decode(entries[i + 1])
        if tonumber(rec.checked_out_at) <= tonumber(ARGV[1]) then
            redis.call('HDEL', KEYS[1], fp)
            redis.call('ZADD', KEYS[2], rec.score, fp)
            redis.call('HSET', KEYS[3], fp,
                cjson.encode({ url = rec.url, depth = rec.depth }))
            moved = moved + 1
        end
    end
    return moved
";

/// Serialized frontier task payload
#[derive(Debug, Serialize, Deserialize)]
struct TaskPayload {
    url: String,
    depth: u32,
}

impl TaskPayload {
    fn from_record(record: &UrlRecord) -> Self {
        Self {
            url: record.url.to_string(),
            depth: record.depth,
        }
    }

    fn into_record(self) -> StoreResult<UrlRecord> {
        let url = Url::parse(&self.url)
            .map_err(|e| StoreError::Corrupt(format!("bad task url '{}': {}", self.url, e)))?;
        UrlRecord::new(url, self.depth)
            .map_err(|e| StoreError::Corrupt(format!("hostless task url '{}': {}", self.url, e)))
    }
}

/// Production store backend over a shared Redis instance
pub struct RedisStore {
    conn: MultiplexedConnection,
    insert_script: Script,
    pop_script: Script,
    reclaim_script: Script,
}

impl RedisStore {
    /// Connects to the configured endpoint
    ///
    /// Retries with linear backoff up to `connect-retries` times before
    /// declaring the store unavailable; a worker that cannot reach the
    /// store cannot make progress and should exit rather than busy-loop.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut attempt: u32 = 0;
        let conn = loop {
            match client.get_multiplexed_async_connection().await {
                Ok(conn) => break conn,
                Err(e) if attempt < config.connect_retries => {
                    attempt += 1;
                    let backoff = Duration::from_millis(config.connect_backoff_ms * attempt as u64);
                    tracing::warn!(
                        attempt,
                        retries = config.connect_retries,
                        error = %e,
                        "Store connection failed, retrying in {:?}",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(StoreError::Unavailable(e.to_string())),
            }
        };

        tracing::info!(url = %config.url, "Connected to shared store");

        Ok(Self {
            conn,
            insert_script: Script::new(SCRIPT_INSERT_IF_ABSENT),
            pop_script: Script::new(SCRIPT_POP_BATCH),
            reclaim_script: Script::new(SCRIPT_RECLAIM_STALE),
        })
    }

    fn now_epoch() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_io_error() || err.is_timeout() {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Command(err.to_string())
        }
    }
}

#[async_trait]
impl FrontierStore for RedisStore {
    async fn is_visited(&self, fingerprint: &Fingerprint) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let member: bool = conn.sismember(VISITED_KEY, fingerprint.as_str()).await?;
        Ok(member)
    }

    async fn any_visited(&self, fingerprints: &[Fingerprint]) -> StoreResult<Vec<bool>> {
        if fingerprints.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SMISMEMBER");
        cmd.arg(VISITED_KEY);
        for fp in fingerprints {
            cmd.arg(fp.as_str());
        }
        let members: Vec<bool> = cmd.query_async(&mut conn).await?;
        Ok(members)
    }

    async fn mark_visited(&self, fingerprint: &Fingerprint) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.sadd(VISITED_KEY, fingerprint.as_str()).await?;
        Ok(())
    }

    async fn next_domain_count(&self, domain: &str) -> StoreResult<u64> {
        let mut conn = self.conn.clone();
        let count: i64 = conn.hincr(DOMAIN_COUNT_KEY, domain, 1i64).await?;
        Ok(count.max(0) as u64)
    }

    async fn any_queued(&self, fingerprints: &[Fingerprint]) -> StoreResult<Vec<bool>> {
        if fingerprints.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        for fp in fingerprints {
            pipe.hexists(TASKS_KEY, fp.as_str());
            pipe.hexists(PROCESSING_KEY, fp.as_str());
        }
        let flags: Vec<bool> = pipe.query_async(&mut conn).await?;

        Ok(flags
            .chunks_exact(2)
            .map(|pair| pair[0] || pair[1])
            .collect())
    }

    async fn insert_if_absent(&self, entries: &[FrontierEntry]) -> StoreResult<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.clone();
        let mut invocation = self.insert_script.prepare_invoke();
        invocation
            .key(VISITED_KEY)
            .key(FAILED_KEY)
            .key(PROCESSING_KEY)
            .key(FRONTIER_KEY)
            .key(TASKS_KEY);
        for entry in entries {
            let payload = serde_json::to_string(&TaskPayload::from_record(&entry.record))
                .map_err(|e| StoreError::Corrupt(e.to_string()))?;
            invocation
                .arg(entry.record.fingerprint().as_str())
                .arg(entry.score)
                .arg(payload);
        }

        let added: usize = invocation.invoke_async(&mut conn).await?;
        Ok(added)
    }

    async fn pop_batch(&self, max: usize) -> StoreResult<Vec<FrontierEntry>> {
        if max == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let raw: Vec<String> = self
            .pop_script
            .prepare_invoke()
            .key(FRONTIER_KEY)
            .key(TASKS_KEY)
            .key(PROCESSING_KEY)
            .arg(max)
            .arg(Self::now_epoch())
            .invoke_async(&mut conn)
            .await?;

        let mut entries = Vec::with_capacity(raw.len() / 3);
        for chunk in raw.chunks_exact(3) {
            let payload: TaskPayload = serde_json::from_str(&chunk[1])
                .map_err(|e| StoreError::Corrupt(format!("bad task payload: {}", e)))?;
            let score: f64 = chunk[2]
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("bad score '{}': {}", chunk[2], e)))?;
            entries.push(FrontierEntry {
                record: payload.into_record()?,
                score,
            });
        }
        Ok(entries)
    }

    async fn frontier_len(&self) -> StoreResult<u64> {
        let mut conn = self.conn.clone();
        let len: u64 = conn.zcard(FRONTIER_KEY).await?;
        Ok(len)
    }

    async fn complete(
        &self,
        fingerprint: &Fingerprint,
        outcome: ProcessingOutcome,
    ) -> StoreResult<()> {
        let terminal_key = match outcome {
            ProcessingOutcome::Visited => VISITED_KEY,
            ProcessingOutcome::Failed => FAILED_KEY,
        };

        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .hdel(PROCESSING_KEY, fingerprint.as_str())
            .ignore()
            .sadd(terminal_key, fingerprint.as_str())
            .ignore()
            .sadd(PROCESSED_KEY, fingerprint.as_str())
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn reclaim_stale(&self, older_than: Duration) -> StoreResult<usize> {
        let cutoff = Self::now_epoch() - older_than.as_secs() as i64;

        let mut conn = self.conn.clone();
        let moved: usize = self
            .reclaim_script
            .prepare_invoke()
            .key(PROCESSING_KEY)
            .key(FRONTIER_KEY)
            .key(TASKS_KEY)
            .arg(cutoff)
            .invoke_async(&mut conn)
            .await?;
        Ok(moved)
    }

    async fn add_artifacts(
        &self,
        source_domain: Option<&str>,
        values: &[String],
    ) -> StoreResult<u64> {
        if values.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.clone();
        let added: u64 = conn.sadd(ARTIFACTS_KEY, values).await?;

        if let Some(domain) = source_domain {
            let key = format!("{}{}", ARTIFACTS_DOMAIN_PREFIX, domain);
            let _: u64 = conn.sadd(key, values).await?;
        }

        Ok(added)
    }

    async fn artifact_backlog(&self) -> StoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let backlog: Vec<String> = redis::cmd("SDIFF")
            .arg(ARTIFACTS_KEY)
            .arg(HANDLED_KEY)
            .arg(HANDLED_FAILED_KEY)
            .query_async(&mut conn)
            .await?;
        Ok(backlog)
    }

    async fn register_worker(&self, worker_id: &str, state: WorkerState) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.hset(REGISTER_KEY, worker_id, state.as_str()).await?;
        Ok(())
    }

    async fn request_shutdown(&self, worker_id: Option<&str>) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        match worker_id {
            None => {
                let _: () = conn.set(SHUTDOWN_KEY, "yes").await?;
            }
            Some(id) => {
                let _: i64 = conn
                    .hset(REGISTER_KEY, id, WorkerState::Shutdown.as_str())
                    .await?;
            }
        }
        Ok(())
    }

    async fn shutdown_requested(&self, worker_id: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let (global, own): (Option<String>, Option<String>) = redis::pipe()
            .get(SHUTDOWN_KEY)
            .hget(REGISTER_KEY, worker_id)
            .query_async(&mut conn)
            .await?;

        let global_set = global.as_deref() == Some("yes");
        let own_set = own.as_deref().and_then(WorkerState::parse) == Some(WorkerState::Shutdown);
        Ok(global_set || own_set)
    }

    async fn counts(&self) -> StoreResult<StoreCounts> {
        let mut conn = self.conn.clone();
        let (frontier, processing, visited, failed, processed, domains, artifacts): (
            u64,
            u64,
            u64,
            u64,
            u64,
            u64,
            u64,
        ) = redis::pipe()
            .zcard(FRONTIER_KEY)
            .hlen(PROCESSING_KEY)
            .scard(VISITED_KEY)
            .scard(FAILED_KEY)
            .scard(PROCESSED_KEY)
            .hlen(DOMAIN_COUNT_KEY)
            .scard(ARTIFACTS_KEY)
            .query_async(&mut conn)
            .await?;

        Ok(StoreCounts {
            frontier,
            processing,
            visited,
            failed,
            processed,
            domains,
            artifacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_payload_roundtrip() {
        let url = Url::parse("https://example.com/page").unwrap();
        let record = UrlRecord::new(url, 3).unwrap();

        let json = serde_json::to_string(&TaskPayload::from_record(&record)).unwrap();
        let payload: TaskPayload = serde_json::from_str(&json).unwrap();
        let restored = payload.into_record().unwrap();

        assert_eq!(restored, record);
    }

    #[test]
    fn test_task_payload_rejects_bad_url() {
        let payload = TaskPayload {
            url: "not a url".to_string(),
            depth: 0,
        };
        assert!(matches!(
            payload.into_record(),
            Err(StoreError::Corrupt(_))
        ));
    }
}
