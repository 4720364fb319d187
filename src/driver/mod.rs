mod rendered;
mod static_http;

pub use rendered::RenderedDriver;
pub use static_http::StaticDriver;

use crate::error::ScraperError;
use crate::record::JobRecord;
use async_trait::async_trait;

/// One way of acquiring listing records from the live site. The orchestrator
/// picks a driver once per invocation instead of branching on a mode flag
/// through the pipeline.
#[async_trait]
pub trait Driver {
    async fn acquire(
        &self,
        base_url: &str,
        max_pages: u32,
    ) -> Result<Vec<JobRecord>, ScraperError>;
}
