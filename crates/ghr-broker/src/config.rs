#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// REST API base, without trailing slash (GitHub Enterprise: `https://host/api/v3`).
    pub api_base: String,
    /// Whole-request timeout; `0` disables it.
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            timeout_ms: 30_000,
            user_agent: concat!("ghr/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
