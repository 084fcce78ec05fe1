//! Configuration types for qbank-dl
//!
//! A [`Config`] replaces the interactive menus of a typical download script: it is
//! built from a JSON file and/or command-line flags and handed to the
//! [`RunController`](crate::runner::RunController) or the API server.

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Default question-bank endpoint
pub const DEFAULT_ENDPOINT: &str = "https://qbank-api.collegeboard.org/msreportingquestionbank-prod/questionbank/digital/get-question";

/// Inclusive bounds for the bounded-parallel admission limit
pub const MAX_IN_FLIGHT_RANGE: std::ops::RangeInclusive<usize> = 1..=200;

/// Delays (seconds) an operator may choose for sequential mode
pub const SEQUENTIAL_DELAY_CHOICES: [f64; 3] = [1.0, 2.0, 3.0];

/// Remote fetch endpoint settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Endpoint receiving `POST {"external_id": ...}`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Total per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// TCP connect timeout (default: 10 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// How long idle pooled connections are kept alive (default: 60 seconds)
    #[serde(default = "default_pool_idle_timeout", with = "duration_serde")]
    pub pool_idle_timeout: Duration,

    /// Client identifier sent as `User-Agent`
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            pool_idle_timeout: default_pool_idle_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Where persisted records go
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory under which one folder per input list is created (default: ".")
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

/// Execution strategy for one run
///
/// Chosen once per run and never changed while the run is in progress.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    /// Up to `max_in_flight` fetch+persist operations in flight at once
    Bounded {
        /// Admission limit (default: 50)
        #[serde(default = "default_max_in_flight")]
        max_in_flight: usize,
    },
    /// One item at a time, in input order, pausing `delay` after each dispatched item
    Sequential {
        /// Pause between dispatched items (default: 2 seconds)
        #[serde(default = "default_sequential_delay", with = "fractional_duration_serde")]
        delay: Duration,
    },
}

impl Default for ConcurrencyPolicy {
    fn default() -> Self {
        ConcurrencyPolicy::Bounded {
            max_in_flight: default_max_in_flight(),
        }
    }
}

impl ConcurrencyPolicy {
    /// Bounded-parallel policy with the given admission limit
    pub fn bounded(max_in_flight: usize) -> Self {
        ConcurrencyPolicy::Bounded { max_in_flight }
    }

    /// Sequential policy with the given pause
    pub fn sequential(delay: Duration) -> Self {
        ConcurrencyPolicy::Sequential { delay }
    }

    /// Check operator-facing limits: 1-200 in flight, or a 1/2/3 second delay
    pub fn validate(&self) -> crate::Result<()> {
        match *self {
            ConcurrencyPolicy::Bounded { max_in_flight } => {
                if !MAX_IN_FLIGHT_RANGE.contains(&max_in_flight) {
                    return Err(crate::Error::config(
                        "policy.max_in_flight",
                        format!(
                            "concurrent requests must be between {} and {}, got {}",
                            MAX_IN_FLIGHT_RANGE.start(),
                            MAX_IN_FLIGHT_RANGE.end(),
                            max_in_flight
                        ),
                    ));
                }
            }
            ConcurrencyPolicy::Sequential { delay } => {
                let secs = delay.as_secs_f64();
                if !SEQUENTIAL_DELAY_CHOICES
                    .iter()
                    .any(|choice| (choice - secs).abs() < f64::EPSILON)
                {
                    return Err(crate::Error::config(
                        "policy.delay",
                        format!("delay must be one of 1.0, 2.0 or 3.0 seconds, got {secs}"),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for ConcurrencyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConcurrencyPolicy::Bounded { max_in_flight } => {
                write!(f, "bounded ({max_in_flight} concurrent requests)")
            }
            ConcurrencyPolicy::Sequential { delay } => {
                write!(f, "sequential ({:.1}s between requests)", delay.as_secs_f64())
            }
        }
    }
}

/// Progress reporting cadence
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Log an item message every N completions in bounded mode (default: 50)
    #[serde(default = "default_log_every")]
    pub log_every: u64,

    /// Bounded-mode reporting boundary; the effective value is `min(batch_size, total)` (default: 100)
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    /// Report progress every N items in sequential mode (default: 10)
    #[serde(default = "default_sequential_every")]
    pub sequential_every: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            log_every: default_log_every(),
            batch_size: default_batch_size(),
            sequential_every: default_sequential_every(),
        }
    }
}

/// Where to look for input lists
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directories scanned for `*.json` input lists (default: eng, math)
    #[serde(default = "default_search_dirs")]
    pub search_dirs: Vec<PathBuf>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            search_dirs: default_search_dirs(),
        }
    }
}

/// Layout of the downloaded question library served by the API
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root directory of the library (default: ".")
    #[serde(default = "default_base_dir")]
    pub root: PathBuf,

    /// Content directories whose subfolders hold question files
    #[serde(default = "default_content_dirs")]
    pub content_dirs: Vec<String>,

    /// Topic folders checked at the root level
    #[serde(default = "default_known_folders")]
    pub known_folders: Vec<String>,

    /// Root-level directories never treated as question folders
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: default_base_dir(),
            content_dirs: default_content_dirs(),
            known_folders: default_known_folders(),
            excluded_dirs: default_excluded_dirs(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind the API server (default: 0.0.0.0:5000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Directory with the browser front-end, served at `/` when set
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// Serve Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            static_dir: None,
            swagger_ui: true,
        }
    }
}

/// Main configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoint settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Output location settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Execution strategy
    #[serde(default)]
    pub policy: ConcurrencyPolicy,

    /// Progress reporting cadence
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Input list discovery
    #[serde(default)]
    pub input: InputConfig,

    /// Question library layout
    #[serde(default)]
    pub library: LibraryConfig,

    /// API server
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load a configuration file (JSON). Missing fields take their defaults.
    pub async fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Validate operator-supplied settings
    pub fn validate(&self) -> crate::Result<()> {
        url::Url::parse(&self.fetch.endpoint)
            .map_err(|e| crate::Error::config("fetch.endpoint", format!("invalid URL: {e}")))?;

        if self.fetch.timeout.is_zero() {
            return Err(crate::Error::config(
                "fetch.timeout",
                "timeout must be greater than zero",
            ));
        }

        if self.progress.log_every == 0
            || self.progress.batch_size == 0
            || self.progress.sequential_every == 0
        {
            return Err(crate::Error::config(
                "progress",
                "progress intervals must be greater than zero",
            ));
        }

        self.policy.validate()
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_pool_idle_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_in_flight() -> usize {
    50
}

fn default_sequential_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_log_every() -> u64 {
    50
}

fn default_batch_size() -> u64 {
    100
}

fn default_sequential_every() -> u64 {
    10
}

fn default_search_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("eng"), PathBuf::from("math")]
}

fn default_content_dirs() -> Vec<String> {
    vec!["math".into(), "eng".into()]
}

fn default_known_folders() -> Vec<String> {
    vec![
        "craftAndStructure".into(),
        "expressionOfIdea".into(),
        "informationAndIdeas".into(),
        "standardEnglish".into(),
        "geometry".into(),
        "problemsolving".into(),
        "advancedmath".into(),
        "algebra".into(),
    ]
}

fn default_excluded_dirs() -> Vec<String> {
    vec![
        "math".into(),
        "eng".into(),
        "templates".into(),
        "static".into(),
    ]
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Sequential delays are chosen in seconds but may be fractional
mod fractional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
