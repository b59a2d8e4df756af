use reqwest::header::{HeaderValue, CONTENT_TYPE};
use std::time::Duration;
use tracing::debug;

/// Content type of every request body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Connection pool settings for the shared client.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum idle connections to keep per host
    pub max_idle_per_host: usize,

    /// How long idle connections stay in the pool before cleanup
    pub idle_timeout: Duration,
}

impl PoolConfig {
    /// One idle slot per worker, so each worker can reuse its connection.
    pub fn for_workers(num_workers: usize) -> Self {
        Self {
            max_idle_per_host: num_workers,
            idle_timeout: Duration::from_secs(90),
        }
    }

    /// Apply this configuration to a reqwest ClientBuilder.
    pub fn apply_to_builder(&self, builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        builder
            .pool_max_idle_per_host(self.max_idle_per_host)
            .pool_idle_timeout(self.idle_timeout)
    }
}

/// Builds the client shared by all workers.
///
/// No request timeout is set: requests wait as long as the client defaults allow.
pub fn build_client(num_workers: usize) -> Result<reqwest::Client, reqwest::Error> {
    let pool_config = PoolConfig::for_workers(num_workers);
    debug!(
        max_idle_per_host = pool_config.max_idle_per_host,
        idle_timeout = ?pool_config.idle_timeout,
        "Connection pool configured"
    );

    pool_config.apply_to_builder(reqwest::Client::builder()).build()
}

/// Builds one POST carrying `payload` as a JSON body.
pub fn build_request(
    client: &reqwest::Client,
    url: &str,
    payload: &'static [u8],
) -> reqwest::RequestBuilder {
    client
        .post(url)
        .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))
        .body(payload)
}
