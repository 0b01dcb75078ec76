use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub capacity: f64,
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // 30 requests per minute per client.
        Self {
            capacity: 30.0,
            refill_per_sec: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Facets change only on re-import; cached in-process and advertised
    /// cacheable for this long.
    pub facets_ttl: Duration,
    /// Search responses are request-specific; advertised cacheable briefly.
    pub search_ttl: Duration,
    pub rate_limit_per_ip: RateLimitConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            facets_ttl: Duration::from_secs(3600),
            search_ttl: Duration::from_secs(60),
            rate_limit_per_ip: RateLimitConfig::default(),
        }
    }
}
