//! Tabular extract of an activity's bookings for external reporting.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use csv::WriterBuilder;
use serde::Serialize;

use crate::{ActorId, EngineError, ResultEngine};

/// Spreadsheet applications need it to detect UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const HEADER: [&str; 6] = [
    "#",
    "First name",
    "Last name",
    "Username",
    "User ID",
    "Booked at",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One booking of the extract. `ordinal` starts at 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportRow {
    pub ordinal: usize,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub actor_id: ActorId,
    pub booked_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    ordinal: usize,
    first_name: &'a str,
    last_name: &'a str,
    username: &'a str,
    actor_id: ActorId,
    booked_at: String,
}

/// Render rows as CSV, timestamps shown in `tz`.
pub fn write_csv(rows: &[ExportRow], tz: Tz) -> ResultEngine<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(UTF8_BOM.to_vec());
    writer
        .write_record(HEADER)
        .map_err(|err| EngineError::Export(err.to_string()))?;

    for row in rows {
        writer
            .serialize(CsvRow {
                ordinal: row.ordinal,
                first_name: &row.first_name,
                last_name: &row.last_name,
                username: &row.username,
                actor_id: row.actor_id,
                booked_at: row
                    .booked_at
                    .with_timezone(&tz)
                    .format(TIMESTAMP_FORMAT)
                    .to_string(),
            })
            .map_err(|err| EngineError::Export(err.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|err| EngineError::Export(err.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn row(ordinal: usize, first: &str, username: &str) -> ExportRow {
        ExportRow {
            ordinal,
            first_name: first.to_string(),
            last_name: String::new(),
            username: username.to_string(),
            actor_id: 1000 + ordinal as ActorId,
            booked_at: Utc.with_ymd_and_hms(2025, 11, 15, 11, 30, 0).unwrap(),
        }
    }

    #[test]
    fn starts_with_bom_and_header() {
        let data = write_csv(&[], Tz::UTC).unwrap();
        assert!(data.starts_with(UTF8_BOM));
        let text = String::from_utf8(data[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text, "#,First name,Last name,Username,User ID,Booked at\n");
    }

    #[test]
    fn rows_use_the_configured_timezone() {
        let data = write_csv(&[row(1, "Ada", "ada"), row(2, "Grace, H.", "")], Tz::Europe__Moscow)
            .unwrap();
        let text = String::from_utf8(data[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1,Ada,,ada,1001,2025-11-15 14:30:00");
        assert_eq!(lines[2], "2,\"Grace, H.\",,,1002,2025-11-15 14:30:00");
    }
}
