use crate::record::JobRecord;
use regex::Regex;
use tracing::warn;

/// How multiple keywords combine: `any` keeps a record when at least one
/// keyword matches, `all` only when every keyword does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    #[default]
    Any,
    All,
}

impl std::str::FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<MatchMode, String> {
        match s {
            "any" => Ok(MatchMode::Any),
            "all" => Ok(MatchMode::All),
            other => Err(format!("unknown match mode {other:?}, expected 'any' or 'all'")),
        }
    }
}

/// Filter records by keyword over the space-joined field values. An empty
/// keyword list bypasses the filter entirely. Input order is preserved.
///
/// With `use_regex`, each keyword compiles as a case-insensitive pattern
/// tested with search-anywhere semantics; a keyword that fails to compile is
/// logged and matches nothing. Without it, matching is case-insensitive
/// substring containment.
pub fn filter_records(
    records: Vec<JobRecord>,
    keywords: &[String],
    mode: MatchMode,
    use_regex: bool,
) -> Vec<JobRecord> {
    if keywords.is_empty() {
        return records;
    }

    let patterns: Vec<Option<Regex>> = if use_regex {
        keywords
            .iter()
            .map(|kw| match Regex::new(&format!("(?i){kw}")) {
                Ok(re) => Some(re),
                Err(err) => {
                    warn!("Ignoring unparseable keyword pattern {:?}: {}", kw, err);
                    None
                }
            })
            .collect()
    } else {
        Vec::new()
    };
    let needles: Vec<String> = keywords.iter().map(|kw| kw.to_lowercase()).collect();

    records
        .into_iter()
        .filter(|record| {
            let haystack = record.haystack();
            let hits: Vec<bool> = if use_regex {
                patterns
                    .iter()
                    .map(|p| p.as_ref().map(|re| re.is_match(&haystack)).unwrap_or(false))
                    .collect()
            } else {
                let haystack = haystack.to_lowercase();
                needles.iter().map(|n| haystack.contains(n)).collect()
            };
            match mode {
                MatchMode::Any => hits.iter().any(|&hit| hit),
                MatchMode::All => hits.iter().all(|&hit| hit),
            }
        })
        .collect()
}
