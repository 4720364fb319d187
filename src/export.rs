use crate::error::ScraperError;
use crate::record::{JobRecord, FIELD_NAMES};
use std::io::Write;

/// Write records as CSV with the eight persisted field names as headers, in
/// the fixed record order.
pub fn write_csv<W: Write>(records: &[JobRecord], writer: W) -> Result<(), ScraperError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(FIELD_NAMES)?;
    for record in records {
        csv.write_record(record.field_values())?;
    }
    csv.flush()?;
    Ok(())
}

/// Serialize records as a JSON array, field names matching the CSV headers.
pub fn write_json<W: Write>(records: &[JobRecord], mut writer: W) -> Result<(), ScraperError> {
    let payload = serde_json::to_string_pretty(records)?;
    writer.write_all(payload.as_bytes())?;
    Ok(())
}
