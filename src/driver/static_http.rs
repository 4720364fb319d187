use super::Driver;
use crate::error::ScraperError;
use crate::fetch::Fetch;
use crate::listing;
use crate::record::JobRecord;
use async_trait::async_trait;
use tracing::{error, info};

/// Plain-HTTP acquisition: paginate by incrementing a `pagenum` query
/// parameter and parse each page's markup.
pub struct StaticDriver<F> {
    fetcher: F,
}

impl<F: Fetch> StaticDriver<F> {
    pub fn new(fetcher: F) -> StaticDriver<F> {
        StaticDriver { fetcher }
    }
}

fn page_url(base_url: &str, page: u32) -> String {
    if page <= 1 {
        return base_url.to_string();
    }
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}pagenum={page}")
}

#[async_trait]
impl<F: Fetch + Send + Sync> Driver for StaticDriver<F> {
    /// Fetch failures and empty pages both end pagination early; records
    /// gathered so far are always kept.
    async fn acquire(
        &self,
        base_url: &str,
        max_pages: u32,
    ) -> Result<Vec<JobRecord>, ScraperError> {
        let mut records = Vec::new();
        for page in 1..=max_pages {
            let url = page_url(base_url, page);
            info!("Fetching {}", url);
            let html = match self.fetcher.fetch(&url).await {
                Ok(html) => html,
                Err(err) => {
                    error!("Failed to fetch page {}: {}", page, err);
                    break;
                }
            };
            let page_records = listing::parse_listing(&html);
            info!("Found {} jobs on page {}", page_records.len(), page);
            if page_records.is_empty() {
                break;
            }
            records.extend(page_records);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    const ROW_PAGE: &str = r#"
        <table class="table-result-search"><tbody>
        <tr><td>J0001-0001</td><td>Test Job</td><td>Engineering</td><td>Toronto</td><td>Canada</td></tr>
        </tbody></table>
    "#;
    const EMPTY_PAGE: &str = r#"<table class="table-result-search"><tbody></tbody></table>"#;

    struct CannedFetcher {
        pages: Vec<Result<String, ()>>,
        requested: Mutex<Vec<String>>,
    }

    impl CannedFetcher {
        fn new(pages: Vec<Result<String, ()>>) -> CannedFetcher {
            CannedFetcher {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetch for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
            let mut requested = self.requested.lock().unwrap();
            requested.push(url.to_string());
            match self.pages.get(requested.len() - 1) {
                Some(Ok(html)) => Ok(html.clone()),
                _ => Err(ScraperError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "canned failure",
                ))),
            }
        }
    }

    #[test]
    fn first_page_url_is_the_base_url_unmodified() {
        let base = "https://example.com/xweb.asp?Page=joblisting";
        assert_eq!(page_url(base, 1), base);
        assert_eq!(
            page_url(base, 2),
            "https://example.com/xweb.asp?Page=joblisting&pagenum=2"
        );
        assert_eq!(page_url("https://example.com/jobs", 3), "https://example.com/jobs?pagenum=3");
    }

    #[tokio::test]
    async fn stops_after_an_empty_page_without_spending_the_budget() {
        let fetcher = CannedFetcher::new(vec![
            Ok(ROW_PAGE.to_string()),
            Ok(EMPTY_PAGE.to_string()),
            Ok(ROW_PAGE.to_string()),
        ]);
        let driver = StaticDriver::new(fetcher);
        let records = driver.acquire("https://example.com/jobs?x=1", 3).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].position_id, "J0001-0001");
        // Page 3 must never be fetched.
        assert_eq!(
            driver.fetcher.requested(),
            vec![
                "https://example.com/jobs?x=1".to_string(),
                "https://example.com/jobs?x=1&pagenum=2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn fetch_failure_keeps_records_gathered_so_far() {
        let fetcher = CannedFetcher::new(vec![Ok(ROW_PAGE.to_string()), Err(())]);
        let driver = StaticDriver::new(fetcher);
        let records = driver.acquire("https://example.com/jobs", 5).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(driver.fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn paginates_until_the_page_budget_runs_out() {
        let fetcher = CannedFetcher::new(vec![
            Ok(ROW_PAGE.to_string()),
            Ok(ROW_PAGE.to_string()),
        ]);
        let driver = StaticDriver::new(fetcher);
        let records = driver.acquire("https://example.com/jobs", 2).await.unwrap();

        // Duplicate position IDs across pages are preserved as-is.
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].position_id, records[1].position_id);
    }
}
