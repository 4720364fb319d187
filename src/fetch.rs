use crate::error::ScraperError;
use async_trait::async_trait;
use std::time::Duration;

pub const USER_AGENT: &str = "careers-crawler/0.1 (+https://github.com)";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// The page-fetching capability the static driver paginates with. Split out
/// as a trait so tests can feed canned pages through the pipeline.
#[async_trait]
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<String, ScraperError>;
}

/// reqwest-backed fetcher with a bounded timeout and a fixed user agent.
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Result<Fetcher, ScraperError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Fetcher { client })
    }
}

#[async_trait]
impl Fetch for Fetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
