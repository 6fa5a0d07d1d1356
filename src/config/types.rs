use serde::Deserialize;

/// Main configuration structure for Driftnet
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub seeds: SeedConfig,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
}

/// Shared store connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Connection URL of the shared store
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Connection attempts before the store is declared unavailable
    #[serde(rename = "connect-retries", default = "default_connect_retries")]
    pub connect_retries: u32,

    /// Backoff between connection attempts (milliseconds)
    #[serde(rename = "connect-backoff-ms", default = "default_connect_backoff_ms")]
    pub connect_backoff_ms: u64,
}

/// Dispatcher pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DispatcherConfig {
    /// Number of dispatcher loops to supervise in this process
    #[serde(default = "default_dispatchers")]
    pub dispatchers: u32,

    /// Concurrent fetches per dispatcher; also the pop-batch size
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Sleep between polls while the frontier is empty (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-fetch timeout (milliseconds)
    #[serde(rename = "fetch-timeout-ms", default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Age after which an in-flight entry is considered abandoned (seconds)
    #[serde(
        rename = "processing-timeout-secs",
        default = "default_processing_timeout_secs"
    )]
    pub processing_timeout_secs: u64,

    /// Interval between reconciliation sweeps of abandoned entries (seconds)
    #[serde(
        rename = "sweep-interval-secs",
        default = "default_sweep_interval_secs"
    )]
    pub sweep_interval_secs: u64,

    /// Optional wall-clock budget after which dispatchers drain and exit (seconds)
    #[serde(rename = "time-budget-secs")]
    pub time_budget_secs: Option<u64>,
}

/// Which admission policy filters discovered links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeKind {
    /// Admit hosts under a fixed domain suffix
    DomainSuffix,
    /// Admit hosts sharing the source's suffix at a configurable label count
    HostLevel,
    /// Admit anything up to a depth ceiling
    Depth,
    /// Admit everything (seed-file-driven crawls)
    Unrestricted,
}

/// Link admission configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    #[serde(default = "default_scope_kind")]
    pub policy: ScopeKind,

    /// Domain suffix for the `domain-suffix` policy
    pub domain: Option<String>,

    /// Label count for the `host-level` policy
    #[serde(rename = "host-level")]
    pub host_level: Option<u32>,

    /// Depth ceiling for the `depth` policy
    #[serde(rename = "max-depth")]
    pub max_depth: Option<u32>,
}

/// Seed ingestion configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedConfig {
    /// Path to a seed file (JSON array of {name, links} or one URL per line)
    pub file: Option<String>,
}

/// Artifact set configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactConfig {
    /// Also record artifacts in a per-source-domain set
    #[serde(rename = "namespace-by-domain", default)]
    pub namespace_by_domain: bool,
}

fn default_store_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_connect_retries() -> u32 {
    3
}

fn default_connect_backoff_ms() -> u64 {
    500
}

fn default_dispatchers() -> u32 {
    1
}

fn default_workers() -> u32 {
    8
}

fn default_poll_interval_ms() -> u64 {
    10_000
}

fn default_fetch_timeout_ms() -> u64 {
    3_000
}

fn default_processing_timeout_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_scope_kind() -> ScopeKind {
    ScopeKind::Unrestricted
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            connect_retries: default_connect_retries(),
            connect_backoff_ms: default_connect_backoff_ms(),
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            dispatchers: default_dispatchers(),
            workers: default_workers(),
            poll_interval_ms: default_poll_interval_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            processing_timeout_secs: default_processing_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            time_budget_secs: None,
        }
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            policy: default_scope_kind(),
            domain: None,
            host_level: None,
            max_depth: None,
        }
    }
}
