use super::Driver;
use crate::detail::{self, DetailFields};
use crate::error::ScraperError;
use crate::listing;
use crate::record::JobRecord;
use async_trait::async_trait;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause after navigations and in-page updates; the portal re-renders the
/// result table asynchronously.
const SETTLE_DELAY: Duration = Duration::from_millis(1500);

const KEYWORD_INPUTS: [&str; 4] = [
    "input[name*='keyword']",
    "input[id*='keyword']",
    "input[placeholder*='Keyword']",
    "input[type='search']",
];
const RESULT_ROWS: &str = "table[class*='table-result-search'] tbody tr";
const PAGINATION_LINK: &str = r#"a[href^="javascript:gotopage("]"#;

/// Browser-rendered acquisition: drive a headless Chrome session through the
/// portal's JS pagination, reading rows from the live DOM.
pub struct RenderedDriver {
    search_keyword: Option<String>,
    follow_details: bool,
}

impl RenderedDriver {
    pub fn new(search_keyword: Option<String>, follow_details: bool) -> RenderedDriver {
        RenderedDriver {
            search_keyword,
            follow_details,
        }
    }
}

#[async_trait]
impl Driver for RenderedDriver {
    async fn acquire(
        &self,
        base_url: &str,
        max_pages: u32,
    ) -> Result<Vec<JobRecord>, ScraperError> {
        let base_url = base_url.to_string();
        let keyword = self.search_keyword.clone();
        let follow_details = self.follow_details;
        tokio::task::spawn_blocking(move || {
            run_session(&base_url, max_pages, keyword.as_deref(), follow_details)
        })
        .await?
    }
}

/// One browser session per acquisition; the browser and every tab are torn
/// down when this returns, on the error paths included.
fn run_session(
    base_url: &str,
    max_pages: u32,
    keyword: Option<&str>,
    follow_details: bool,
) -> Result<Vec<JobRecord>, ScraperError> {
    let browser = Browser::new(LaunchOptions {
        headless: true,
        sandbox: false,
        idle_browser_timeout: Duration::from_secs(120),
        ..Default::default()
    })
    .map_err(|err| ScraperError::BrowserUnavailable(err.to_string()))?;

    let tab = browser.new_tab()?;
    tab.navigate_to(base_url)?;
    tab.wait_until_navigated()?;
    std::thread::sleep(SETTLE_DELAY);

    if let Some(keyword) = keyword {
        submit_search(&tab, keyword);
    }

    let mut records = Vec::new();
    for page in 1..=max_pages {
        info!("Rendering page {}", page);
        if page > 1 && !goto_page(&tab, page) {
            info!("Could not navigate to page {}; stopping pagination", page);
            break;
        }

        let html = tab.get_content()?;
        let mut page_records = match extract_rows(&tab, base_url) {
            Ok(rows) => rows,
            Err(err) => {
                debug!("Live DOM extraction failed ({}); parsing markup snapshot", err);
                listing::parse_listing(&html)
            }
        };
        info!("Found {} jobs on page {}", page_records.len(), page);

        if follow_details && !page_records.is_empty() {
            follow_detail_pages(&browser, &html, base_url, &mut page_records);
        }

        for record in &mut page_records {
            record.finalize();
        }
        records.extend(page_records);

        if reached_last_page(&html, page) {
            break;
        }
    }

    Ok(records)
}

/// End-of-results signal for this portal: past the first page, a footer that
/// still says "Page" but offers no "NEXT" control means the listing is
/// exhausted. Deliberately not generalized.
fn reached_last_page(html: &str, page: u32) -> bool {
    page > 1 && html.contains("Page") && !html.contains("NEXT")
}

/// Best-effort search submission. Every step is allowed to fail; pagination
/// proceeds whether or not the keyword actually reached the portal.
fn submit_search(tab: &Arc<Tab>, keyword: &str) {
    info!("Submitting search with keyword: {}", keyword);

    if !fill_keyword_input(tab, keyword) {
        info!("Could not find a search input to submit keyword; continuing without search");
        return;
    }

    if !click_submit(tab) {
        match tab.press_key("Enter") {
            Ok(_) => debug!("Pressed Enter to submit search"),
            Err(err) => debug!("Enter key press failed: {}", err),
        }
    }

    if let Err(err) = tab.wait_until_navigated() {
        debug!("Wait after search submit failed: {}", err);
    }
    std::thread::sleep(SETTLE_DELAY);
}

fn fill_keyword_input(tab: &Arc<Tab>, keyword: &str) -> bool {
    for selector in KEYWORD_INPUTS {
        match tab.find_element(selector) {
            Ok(input) => match input.type_into(keyword) {
                Ok(_) => {
                    debug!("Filled input using selector {}", selector);
                    return true;
                }
                Err(err) => debug!("Failed to type into {}: {}", selector, err),
            },
            Err(_) => continue,
        }
    }
    fill_input_near_label(tab, keyword)
}

/// Label-proximity fallback: find a label mentioning "keyword" and set the
/// input it points at (nested, `for`-referenced, or a sibling).
fn fill_input_near_label(tab: &Arc<Tab>, keyword: &str) -> bool {
    let quoted = serde_json::to_string(keyword).unwrap_or_else(|_| String::from("\"\""));
    let script = format!(
        r#"(function() {{
            var labels = Array.prototype.slice.call(document.querySelectorAll('label'));
            var label = labels.filter(function (l) {{ return /keyword/i.test(l.textContent || ''); }})[0];
            if (!label) return false;
            var input = label.querySelector('input')
                || (label.htmlFor && document.getElementById(label.htmlFor))
                || (label.parentElement && label.parentElement.querySelector('input'));
            if (!input) return false;
            input.value = {quoted};
            input.dispatchEvent(new Event('input', {{ bubbles: true }}));
            return true;
        }})()"#
    );

    match tab.evaluate(&script, false) {
        Ok(result) => {
            let filled = matches!(result.value, Some(serde_json::Value::Bool(true)));
            if filled {
                debug!("Filled input using label-based lookup");
            }
            filled
        }
        Err(err) => {
            debug!("Label-based keyword lookup failed: {}", err);
            false
        }
    }
}

fn click_submit(tab: &Arc<Tab>) -> bool {
    if let Ok(submit) = tab.find_element("input[type='submit']") {
        if submit.click().is_ok() {
            debug!("Clicked input[type='submit']");
            return true;
        }
    }

    let candidates = match tab.find_elements("button, a") {
        Ok(candidates) => candidates,
        Err(_) => return false,
    };
    for candidate in &candidates {
        let text = candidate.get_inner_text().unwrap_or_default();
        if text.to_lowercase().contains("search") && candidate.click().is_ok() {
            debug!("Clicked search control with text {:?}", text.trim());
            return true;
        }
    }
    false
}

/// Advance to `page` via the portal's `gotopage` function, falling back to
/// clicking a pagination link. False means pagination is over.
fn goto_page(tab: &Arc<Tab>, page: u32) -> bool {
    match tab.evaluate(&format!("if (window.gotopage) gotopage({page});"), false) {
        Ok(_) => {
            settle(tab);
            true
        }
        Err(err) => {
            debug!("gotopage({}) evaluation failed: {}", page, err);
            match tab.find_element(PAGINATION_LINK) {
                Ok(link) => match link.click() {
                    Ok(_) => {
                        settle(tab);
                        true
                    }
                    Err(err) => {
                        debug!("Pagination link click failed: {}", err);
                        false
                    }
                },
                Err(err) => {
                    debug!("No pagination link found: {}", err);
                    false
                }
            }
        }
    }
}

fn settle(tab: &Arc<Tab>) {
    if let Err(err) = tab.wait_until_navigated() {
        debug!("Wait after page change failed: {}", err);
    }
    std::thread::sleep(SETTLE_DELAY);
}

/// Read result rows straight from the live DOM: five cells in listing order
/// plus the first anchor's href as the transient detail link.
fn extract_rows(tab: &Arc<Tab>, base_url: &str) -> Result<Vec<JobRecord>, anyhow::Error> {
    let mut records = Vec::new();
    for row in tab.find_elements(RESULT_ROWS)? {
        let cells: Vec<String> = row
            .find_elements("td")?
            .iter()
            .map(|td| td.get_inner_text().unwrap_or_default().trim().to_string())
            .collect();

        let mut record = JobRecord::new();
        record.position_id = cells.first().cloned().unwrap_or_default();
        record.position_title = cells.get(1).cloned().unwrap_or_default();
        record.category = cells.get(2).cloned().unwrap_or_default();
        record.city = cells.get(3).cloned().unwrap_or_default();
        record.country = cells.get(4).cloned().unwrap_or_default();
        record.detail_href = first_anchor_href(&row).map(|href| resolve_href(base_url, &href));
        records.push(record);
    }
    Ok(records)
}

fn first_anchor_href(row: &Element) -> Option<String> {
    row.find_element("td a")
        .ok()
        .and_then(|anchor| anchor.get_attribute_value("href").ok().flatten())
        .filter(|href| !href.is_empty())
}

fn resolve_href(base_url: &str, href: &str) -> String {
    match reqwest::Url::parse(base_url).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Enrich each row from its detail page. A row without a captured link gets
/// a second chance via an href search over the page snapshot; rows that fail
/// are logged and left as listed, never aborting their siblings.
fn follow_detail_pages(
    browser: &Browser,
    page_html: &str,
    base_url: &str,
    records: &mut [JobRecord],
) {
    for record in records.iter_mut() {
        let href = record
            .detail_href
            .clone()
            .or_else(|| find_detail_link(page_html, &record.position_id, base_url));
        let Some(href) = href else { continue };

        match enrich_from_detail(browser, &href) {
            Ok(fields) => {
                record.apply_detail(&fields);
                info!("Fetched details for {}", record.position_id);
            }
            Err(err) => warn!("Failed to fetch detail for {}: {}", record.position_id, err),
        }
    }
}

/// Detail pages open in their own short-lived tab, closed before the next
/// row regardless of outcome.
fn enrich_from_detail(browser: &Browser, url: &str) -> Result<DetailFields, anyhow::Error> {
    let tab = browser.new_tab()?;
    let fields = (|| {
        tab.navigate_to(url)?;
        tab.wait_until_navigated()?;
        std::thread::sleep(SETTLE_DELAY);
        let html = tab.get_content()?;
        Ok(detail::parse_detail(&html))
    })();
    if let Err(err) = tab.close_target() {
        debug!("Failed to close detail tab: {}", err);
    }
    fields
}

/// Search raw markup for an href containing the position ID, resolved
/// against the base URL.
fn find_detail_link(html: &str, position_id: &str, base_url: &str) -> Option<String> {
    if position_id.is_empty() {
        return None;
    }
    let pattern = format!(
        r#"(?i)href=["']([^"']*{}[^"']*)["']"#,
        regex::escape(position_id)
    );
    let re = Regex::new(&pattern).ok()?;
    let href = re.captures(html)?.get(1)?.as_str();
    Some(resolve_href(base_url, href))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn last_page_signal_requires_page_without_next() {
        let exhausted = "<html><body>Page 3 of 3</body></html>";
        let more = "<html><body>Page 2 <a>NEXT</a></body></html>";
        assert!(reached_last_page(exhausted, 2));
        assert!(!reached_last_page(more, 2));
        // Never fires on the first page.
        assert!(!reached_last_page(exhausted, 1));
        assert!(!reached_last_page("<html><body></body></html>", 2));
    }

    #[test]
    fn detail_link_found_by_position_id() {
        let html = r#"<a href="/corp/xweb/details?jobid=J0001-0002&lang=1">Test Job</a>"#;
        assert_eq!(
            find_detail_link(html, "J0001-0002", "https://example.com/corp/xweb/xweb.asp"),
            Some("https://example.com/corp/xweb/details?jobid=J0001-0002&lang=1".to_string())
        );
    }

    #[test]
    fn detail_link_absent_when_id_not_in_markup() {
        let html = r#"<a href="/details?jobid=J0009-0009">Other</a>"#;
        assert_eq!(find_detail_link(html, "J0001-0002", "https://example.com/"), None);
        assert_eq!(find_detail_link(html, "", "https://example.com/"), None);
    }

    #[test]
    fn hrefs_resolve_against_the_listing_url() {
        assert_eq!(
            resolve_href("https://example.com/corp/xweb/xweb.asp?x=1", "details.asp?id=2"),
            "https://example.com/corp/xweb/details.asp?id=2"
        );
        assert_eq!(
            resolve_href("https://example.com/a", "https://other.example/b"),
            "https://other.example/b"
        );
        // An unparseable base leaves the href untouched.
        assert_eq!(resolve_href("not a url", "/x"), "/x");
    }
}
