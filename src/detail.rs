use chrono::NaiveDate;
use lazy_regex::regex;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

const E: &str = "Invalid selector";
lazy_static! {
    static ref OG_TITLE: Selector = Selector::parse(r#"meta[property="og:title"]"#).expect(E);
    static ref TITLE: Selector = Selector::parse("title").expect(E);
    static ref JSON_LD: Selector =
        Selector::parse(r#"script[type="application/ld+json"]"#).expect(E);
    static ref HEADING_LIKE: Selector = Selector::parse("h1, h2, h3, strong, b").expect(E);
    static ref LIST_ITEM: Selector = Selector::parse("li").expect(E);
}

/// Detail-page fields merged into a listed record during enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub duration: String,
    pub skills: String,
    pub deadline: String,
}

/// Extract Duration, Skills and Deadline from a job detail page. Never
/// fails: every field falls back to the empty string when no heuristic
/// succeeds, whatever the markup looks like.
pub fn parse_detail(html: &str) -> DetailFields {
    let doc = Html::parse_document(html);
    let visible = visible_text_nodes(&doc);
    let full_text = visible.join("\n");

    DetailFields {
        duration: extract_duration(&doc, &full_text),
        skills: extract_skills(&doc, &visible),
        deadline: extract_deadline(&doc, &visible, &full_text),
    }
}

/// Trimmed, non-empty text nodes in document order, excluding script and
/// style content. JSON blobs live in script tags and must not leak into the
/// text heuristics.
fn visible_text_nodes(doc: &Html) -> Vec<String> {
    let mut nodes = Vec::new();
    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element())
            .map(|el| matches!(el.name(), "script" | "style"))
            .unwrap_or(false);
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            nodes.push(trimmed.to_string());
        }
    }
    nodes
}

// ---------------------------------------------------------------------------
// Duration

fn extract_duration(doc: &Html, full_text: &str) -> String {
    let title_text = doc
        .select(&OG_TITLE)
        .next()
        .and_then(|meta| meta.value().attr("content").map(ToString::to_string))
        .or_else(|| doc.select(&TITLE).next().map(|t| t.text().collect::<String>()))
        .unwrap_or_default();

    let mut duration = regex!(r"(?i)\((\d+\s*months?)\)")
        .captures(&title_text)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    if duration.is_empty() {
        if let Some(c) = regex!(r"(?i)\b(\d+)\s*months?\b").captures(full_text) {
            duration = format!("{} months", &c[1]);
        }
    }

    let duration = duration.trim().to_string();
    if duration.chars().count() > 100 {
        return regex!(r"(?i)\b(\d+\s*months?)\b")
            .captures(&duration)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_else(|| duration.chars().take(100).collect::<String>().trim().to_string());
    }
    duration
}

// ---------------------------------------------------------------------------
// Deadline

fn extract_deadline(doc: &Html, visible: &[String], full_text: &str) -> String {
    deadline_from_json_ld(doc)
        .or_else(|| deadline_near_label(visible, full_text))
        .or_else(|| first_month_name_date(full_text))
        .unwrap_or_default()
}

/// JSON-LD path: decode every `application/ld+json` block independently and
/// search each decoded structure depth-first for a `validThrough` key. A
/// block that fails to decode or normalize never aborts the remaining ones.
fn deadline_from_json_ld(doc: &Html) -> Option<String> {
    for script in doc.select(&JSON_LD) {
        let raw = script.text().collect::<String>();
        if raw.trim().is_empty() {
            continue;
        }
        let decoded: Option<Value> = serde_json::from_str(&raw).ok().or_else(|| {
            // Some blocks wrap the object in comments or trailing junk; retry
            // on the outermost brace-delimited chunk.
            regex!(r"\{[\s\S]*\}")
                .find(&raw)
                .and_then(|m| serde_json::from_str(m.as_str()).ok())
        });
        let Some(value) = decoded else { continue };
        let Some(valid_through) = find_valid_through(&value) else {
            continue;
        };
        if let Some(date) = normalize_iso_date(valid_through.trim()) {
            return Some(date);
        }
    }
    None
}

fn find_valid_through(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => {
            if let Some(s) = map.get("validThrough").and_then(Value::as_str) {
                if !s.is_empty() {
                    return Some(s);
                }
            }
            map.values().find_map(find_valid_through)
        }
        Value::Array(items) => items.iter().find_map(find_valid_through),
        _ => None,
    }
}

/// Normalize a `validThrough` value to `YYYY-MM-DD`. Accepts a full RFC 3339
/// date-time (trailing `Z` included), a bare `YYYY-MM-DD`, or `YYYY-MM` with
/// the day forced to `01`.
fn normalize_iso_date(s: &str) -> Option<String> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive().format("%Y-%m-%d").to_string());
    }
    if let Some(c) = regex!(r"^(\d{4})-(\d{2})-(\d{2})").captures(s) {
        return Some(format!("{}-{}-{}", &c[1], &c[2], &c[3]));
    }
    if let Some(c) = regex!(r"^(\d{4})-(\d{2})").captures(s) {
        return Some(format!("{}-{}-01", &c[1], &c[2]));
    }
    None
}

/// Label path: find the first visible node mentioning a deadline, then look
/// for a month-name date inside a +-200 character window of the full visible
/// text around it.
fn deadline_near_label(visible: &[String], full_text: &str) -> Option<String> {
    let label = visible.iter().find(|t| {
        regex!(r"(?i)application deadline|application closing|closing date|closing|deadline")
            .is_match(t)
    })?;
    let center = full_text.find(label.as_str()).unwrap_or(0);
    let start = floor_char_boundary(full_text, center.saturating_sub(200));
    let end = ceil_char_boundary(full_text, (center + 200).min(full_text.len()));
    first_month_name_date(&full_text[start..end])
}

/// First `D Month YYYY` or `Month D, YYYY` expression, parsed to
/// `YYYY-MM-DD`. Returns None when nothing parses; raw unparsed matches are
/// never emitted.
fn first_month_name_date(text: &str) -> Option<String> {
    let text = normalize_date_text(text);

    if let Some(c) = regex!(r"(?i)\b(\d{1,2})\s+(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)[\s,]+(\d{4})\b")
        .captures(&text)
    {
        return assemble_date(&c[1], &c[2], &c[3]);
    }
    if let Some(c) = regex!(r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\s+(\d{1,2})[\s,]+(\d{4})\b")
        .captures(&text)
    {
        return assemble_date(&c[2], &c[1], &c[3]);
    }
    None
}

/// Strip non-breaking spaces and ordinal suffixes ("30th" -> "30") so the
/// date patterns match.
fn normalize_date_text(text: &str) -> String {
    let text = text.replace('\u{a0}', " ");
    regex!(r"(?i)(\d+)(st|nd|rd|th)\b")
        .replace_all(&text, "$1")
        .into_owned()
}

fn assemble_date(day: &str, month: &str, year: &str) -> Option<String> {
    let composed = format!("{} {} {}", day, month, year);
    NaiveDate::parse_from_str(&composed, "%d %B %Y")
        .or_else(|_| NaiveDate::parse_from_str(&composed, "%d %b %Y"))
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

// ---------------------------------------------------------------------------
// Skills

const SKILLS_LIMIT: usize = 2000;

fn extract_skills(doc: &Html, visible: &[String]) -> String {
    let skills = skills_from_headings(doc)
        .or_else(|| skills_from_lines(visible))
        .unwrap_or_default();

    if skills.chars().count() > SKILLS_LIMIT {
        let truncated: String = skills.chars().take(SKILLS_LIMIT).collect();
        return truncated + "...";
    }
    skills
}

/// Heading path: the first heading-like element (h1-h3, strong, b) in
/// document order whose text mentions skills or requirements claims the
/// first `ul` following it, or failing that the first `p`. A heading that
/// yields neither passes the turn to the next one.
fn skills_from_headings(doc: &Html) -> Option<String> {
    for heading in doc.select(&HEADING_LIKE) {
        let text = heading.text().collect::<String>();
        if !regex!(r"(?i)skill|technical|programming|requirements|required").is_match(&text) {
            continue;
        }
        if let Some(list) = following_element(doc, heading, "ul") {
            let items: Vec<String> = list
                .select(&LIST_ITEM)
                .map(|li| li.text().collect::<Vec<_>>().join(" ").trim().to_string())
                .collect();
            return Some(items.join(" ; "));
        }
        if let Some(para) = following_element(doc, heading, "p") {
            return Some(
                para.text().collect::<Vec<_>>().join(" ").trim().to_string(),
            );
        }
    }
    None
}

/// First element named `name` that follows `from` in document order.
fn following_element<'a>(
    doc: &'a Html,
    from: ElementRef<'a>,
    name: &str,
) -> Option<ElementRef<'a>> {
    let mut past_anchor = false;
    for node in doc.root_element().descendants() {
        if node.id() == from.id() {
            past_anchor = true;
            continue;
        }
        if !past_anchor {
            continue;
        }
        if let Some(el) = ElementRef::wrap(node) {
            if el.value().name() == name {
                return Some(el);
            }
        }
    }
    None
}

/// Line path: a window from one line before to three lines after the first
/// visible line mentioning skills or experience.
fn skills_from_lines(visible: &[String]) -> Option<String> {
    let idx = visible.iter().position(|line| {
        regex!(r"(?i)skill|technical|programming|requirements|required|experience").is_match(line)
    })?;
    let start = idx.saturating_sub(1);
    let end = (idx + 4).min(visible.len());
    Some(visible[start..end].join(" ; "))
}
