#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("browser automation failed: {0}")]
    Browser(#[from] anyhow::Error),

    /// Launching the browser itself failed. Unlike other acquisition errors
    /// this one surfaces to the caller: it indicates misconfiguration rather
    /// than a transient scrape failure.
    #[error("browser unavailable: {0}")]
    BrowserUnavailable(String),

    #[error("browser task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("json export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
