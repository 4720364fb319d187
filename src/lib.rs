pub mod detail;
pub mod driver;
pub mod error;
pub mod export;
pub mod fetch;
pub mod filter;
pub mod listing;
pub mod record;

pub use detail::{parse_detail, DetailFields};
pub use driver::{Driver, RenderedDriver, StaticDriver};
pub use error::ScraperError;
pub use fetch::{Fetch, Fetcher};
pub use filter::{filter_records, MatchMode};
pub use listing::parse_listing;
pub use record::{JobRecord, FIELD_NAMES};

use tracing::{error, info};

/// The careers portal this crawler targets.
pub const DEFAULT_BASE_URL: &str =
    "https://cgi.njoyn.com/corp/xweb/xweb.asp?NTKN=c&clid=21001&Page=joblisting";

/// One scrape invocation's inputs. The base URL is threaded through
/// explicitly; there is no mutable global to override.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Override of [`DEFAULT_BASE_URL`] for this invocation.
    pub url: Option<String>,
    pub keywords: Vec<String>,
    pub match_mode: MatchMode,
    pub use_regex: bool,
    pub max_pages: u32,
    /// Render JS and paginate with a headless browser instead of plain HTTP.
    pub rendered: bool,
    /// Visit each row's detail page to fill Duration/Skills/Deadline.
    pub follow_details: bool,
}

impl Default for ScrapeOptions {
    fn default() -> ScrapeOptions {
        ScrapeOptions {
            url: None,
            keywords: Vec::new(),
            match_mode: MatchMode::Any,
            use_regex: false,
            max_pages: 1,
            rendered: false,
            follow_details: false,
        }
    }
}

/// Acquire, filter and finalize job records.
///
/// A failing rendered session yields an empty result rather than an error,
/// with one exception: a browser that cannot launch at all surfaces as
/// [`ScraperError::BrowserUnavailable`], since that is misconfiguration, not
/// a transient scrape failure.
pub async fn scrape_jobs(opts: &ScrapeOptions) -> Result<Vec<JobRecord>, ScraperError> {
    let base_url = opts.url.as_deref().unwrap_or(DEFAULT_BASE_URL);

    let all_jobs = if opts.rendered {
        info!("Using the rendered browser driver (JS pagination)");
        let search_keyword = if opts.keywords.is_empty() {
            None
        } else {
            Some(opts.keywords.join(" "))
        };
        let driver = RenderedDriver::new(search_keyword, opts.follow_details);
        match driver.acquire(base_url, opts.max_pages).await {
            Ok(records) => records,
            Err(err @ ScraperError::BrowserUnavailable(_)) => return Err(err),
            Err(err) => {
                error!("Rendered driver failed: {}", err);
                Vec::new()
            }
        }
    } else {
        let driver = StaticDriver::new(Fetcher::new()?);
        driver.acquire(base_url, opts.max_pages).await?
    };

    let total = all_jobs.len();
    let mut filtered = filter_records(all_jobs, &opts.keywords, opts.match_mode, opts.use_regex);
    info!(
        "Total jobs found: {}; after filter (keywords={:?}, mode={:?}): {}",
        total,
        opts.keywords,
        opts.match_mode,
        filtered.len()
    );

    for record in &mut filtered {
        record.finalize();
    }
    Ok(filtered)
}
