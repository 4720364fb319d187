use crate::record::JobRecord;
use lazy_regex::regex;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

const E: &str = "Invalid selector";
lazy_static! {
    static ref RESULT_TABLE: Selector =
        Selector::parse(r#"table[class*="table-result-search"]"#).expect(E);
    static ref BODY_ROW: Selector = Selector::parse("tbody tr").expect(E);
    static ref CELL: Selector = Selector::parse("td").expect(E);
}

/// Parse one listing page into records. Never fails; unrecognizable markup
/// yields an empty vector.
///
/// The structured results table wins when present, even with zero rows.
/// Only pages without such a table fall back to the loose text heuristic.
pub fn parse_listing(html: &str) -> Vec<JobRecord> {
    let doc = Html::parse_document(html);

    if let Some(table) = doc.select(&RESULT_TABLE).next() {
        return table
            .select(&BODY_ROW)
            .filter_map(row_to_record)
            .collect();
    }

    parse_pipe_delimited_lines(&doc)
}

fn row_to_record(row: ElementRef) -> Option<JobRecord> {
    let cells: Vec<String> = row
        .select(&CELL)
        .map(|td| td.text().collect::<String>().trim().to_string())
        .collect();
    if cells.is_empty() {
        return None;
    }

    let mut record = JobRecord::new();
    record.position_id = cells.first().cloned().unwrap_or_default();
    record.position_title = cells.get(1).cloned().unwrap_or_default();
    record.category = cells.get(2).cloned().unwrap_or_default();
    record.city = cells.get(3).cloned().unwrap_or_default();
    record.country = cells.get(4).cloned().unwrap_or_default();
    Some(record)
}

/// Loose fallback for pages that render listings as pipe-delimited text:
/// `J0001-0002 | Title | Category | City | Country`. A line only counts when
/// its first segment starts with the position-ID pattern.
fn parse_pipe_delimited_lines(doc: &Html) -> Vec<JobRecord> {
    let text = doc.root_element().text().collect::<Vec<_>>().join("\n");

    let mut records = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !regex!(r"J\d{4}-\d{4}").is_match(line) {
            continue;
        }
        let parts: Vec<&str> = line
            .split('|')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 2 || !regex!(r"^J\d{4}-\d{4}").is_match(parts[0]) {
            continue;
        }

        let mut record = JobRecord::new();
        record.position_id = parts[0].to_string();
        record.position_title = parts.get(1).unwrap_or(&"").to_string();
        record.category = parts.get(2).unwrap_or(&"").to_string();
        record.city = parts.get(3).unwrap_or(&"").to_string();
        record.country = parts.get(4).unwrap_or(&"").to_string();
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_result_table_rows_positionally() {
        let html = r#"
            <html><body>
            <table class="views-table table-result-search"><tbody>
            <tr><td>J0001-0001</td><td>Test Job</td><td>Engineering</td><td>Toronto</td><td>Canada</td></tr>
            <tr><td>J0002-0001</td><td>Analyst</td></tr>
            </tbody></table>
            </body></html>
        "#;
        let records = parse_listing(html);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].position_id, "J0001-0001");
        assert_eq!(records[0].position_title, "Test Job");
        assert_eq!(records[0].category, "Engineering");
        assert_eq!(records[0].city, "Toronto");
        assert_eq!(records[0].country, "Canada");
        // Missing trailing columns default to empty.
        assert_eq!(records[1].position_id, "J0002-0001");
        assert_eq!(records[1].category, "");
        // Enrichment fields stay empty on the listing path.
        assert_eq!(records[0].duration, "");
        assert_eq!(records[0].skills, "");
        assert_eq!(records[0].deadline, "");
        assert_eq!(records[0].detail_href, None);
    }

    #[test]
    fn empty_table_does_not_fall_through_to_text_heuristic() {
        // The pipe-delimited line outside the table must be ignored: the
        // table strategy claimed the page.
        let html = r#"
            <html><body>
            <p>J0009-0009 | Orphan Row | Misc | Nowhere | Canada</p>
            <table class="table-result-search"><tbody></tbody></table>
            </body></html>
        "#;
        assert_eq!(parse_listing(html), vec![]);
    }

    #[test]
    fn falls_back_to_pipe_delimited_lines() {
        let html = r#"
            <html><body>
            <div>J0003-0004 | Software Developer | IT | Montreal | Canada</div>
            <div>J0005-0006 | QA Analyst</div>
            </body></html>
        "#;
        let records = parse_listing(html);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].position_id, "J0003-0004");
        assert_eq!(records[0].city, "Montreal");
        assert_eq!(records[1].position_title, "QA Analyst");
        assert_eq!(records[1].country, "");
    }

    #[test]
    fn skips_lines_where_the_id_is_not_leading() {
        let html = "<html><body><div>Apply before Friday | see J0001-0001 | HR</div></body></html>";
        assert_eq!(parse_listing(html), vec![]);
    }

    #[test]
    fn skips_id_lines_with_a_single_segment() {
        let html = "<html><body><div>J0001-0001</div></body></html>";
        assert_eq!(parse_listing(html), vec![]);
    }

    #[test]
    fn garbage_markup_yields_no_records() {
        assert_eq!(parse_listing("<<<>>> not html at all &&&"), vec![]);
        assert_eq!(parse_listing(""), vec![]);
    }
}
