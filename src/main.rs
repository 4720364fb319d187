use careers_crawler::{scrape_jobs, MatchMode, ScrapeOptions};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "careers-crawler", about = "Scrape job listings from the careers portal")]
struct Args {
    /// Output CSV path (default: data/jobs_<YYYYMMDD>.csv)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Repeatable keyword filter (substring match)
    #[arg(short = 'k', long = "keyword")]
    keywords: Vec<String>,

    /// Newline-separated keywords file ('#' starts a comment)
    #[arg(long)]
    keywords_file: Option<PathBuf>,

    /// 'any' (OR) or 'all' (AND) when multiple keywords are supplied
    #[arg(long, default_value = "any")]
    match_mode: MatchMode,

    /// Treat keywords as regular expressions (case-insensitive)
    #[arg(long)]
    regex: bool,

    /// Max pages to try when paginating
    #[arg(long, default_value_t = 50)]
    max_pages: u32,

    /// Render JS and paginate with a headless browser
    #[arg(long)]
    rendered: bool,

    /// Follow detail pages to extract Duration/Skills/Deadline (slower)
    #[arg(long)]
    follow_details: bool,

    /// Override the careers listing URL
    #[arg(long)]
    url: Option<String>,
}

fn parse_keywords_file(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

fn collect_keywords(args: &Args) -> Vec<String> {
    let mut keywords = Vec::new();
    if let Some(path) = &args.keywords_file {
        match fs::read_to_string(path) {
            Ok(contents) => keywords.extend(parse_keywords_file(&contents)),
            Err(err) => warn!("Failed to read keywords file {}: {}", path.display(), err),
        }
    }
    keywords.extend(args.keywords.iter().cloned());
    if keywords.is_empty() {
        // Default filter kept for backward compatibility.
        keywords.push("Summer 2026".to_string());
    }
    keywords
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let args = Args::parse();
    let keywords = collect_keywords(&args);

    let opts = ScrapeOptions {
        url: args.url.clone(),
        keywords,
        match_mode: args.match_mode,
        use_regex: args.regex,
        max_pages: args.max_pages,
        rendered: args.rendered,
        follow_details: args.follow_details,
    };
    let jobs = scrape_jobs(&opts).await?;

    let output = args.output.unwrap_or_else(|| {
        PathBuf::from(format!("data/jobs_{}.csv", chrono::Local::now().format("%Y%m%d")))
    });
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = fs::File::create(&output)?;
    careers_crawler::export::write_csv(&jobs, file)?;
    info!("Saved {} rows to {}", jobs.len(), output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keywords_file_skips_comments_and_blanks() {
        let contents = "\n# wishlist\nSummer 2026\n  Rust  \n\n# done\nToronto\n";
        assert_eq!(
            parse_keywords_file(contents),
            vec!["Summer 2026".to_string(), "Rust".to_string(), "Toronto".to_string()]
        );
    }
}
