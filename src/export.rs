//! JSON and CSV writers for a generated ticket set.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GeneratorError;
use crate::ticket::Ticket;

/// One CSV row per status entry, ticket fields repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRow {
    #[serde(rename = "Ticket ID")]
    pub ticket_id: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Open Date")]
    pub open_date: String,
    #[serde(rename = "Initial Description")]
    pub initial_description: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Status Date")]
    pub status_date: String,
    #[serde(rename = "Comment")]
    pub comment: String,
}

pub fn flatten(tickets: &[Ticket]) -> Vec<StatusRow> {
    tickets
        .iter()
        .flat_map(|t| {
            t.status_history.iter().map(move |entry| StatusRow {
                ticket_id: t.id.clone(),
                category: t.category.clone(),
                open_date: t.open_date.format("%Y-%m-%d").to_string(),
                initial_description: t.initial_description.clone(),
                status: entry.status.clone(),
                status_date: entry.date.format("%Y-%m-%d").to_string(),
                comment: entry.comment.clone(),
            })
        })
        .collect()
}

/// Pretty-printed JSON array of tickets, UTF-8.
pub fn write_json(path: &Path, tickets: &[Ticket]) -> Result<(), GeneratorError> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, tickets)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// Flat CSV, header always written, one row per status entry.
pub fn write_csv(path: &Path, tickets: &[Ticket]) -> Result<usize, GeneratorError> {
    let mut writer = csv::Writer::from_path(path)?;
    let rows = flatten(tickets);
    if rows.is_empty() {
        writer.write_record([
            "Ticket ID",
            "Category",
            "Open Date",
            "Initial Description",
            "Status",
            "Status Date",
            "Comment",
        ])?;
    }
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::StatusEntry;
    use chrono::NaiveDate;

    fn tickets() -> Vec<Ticket> {
        let d = |m, day| NaiveDate::from_ymd_opt(2021, m, day).unwrap();
        vec![
            Ticket {
                id: "ELE-0001".into(),
                category: "Electrical Non-Conformities".into(),
                open_date: d(2, 1),
                initial_description: "Blown fuse, \"F12\" on panel B".into(),
                status_history: vec![
                    StatusEntry {
                        status: "Open".into(),
                        date: d(2, 1),
                        comment: "Line one\nline two".into(),
                    },
                    StatusEntry {
                        status: "Closure".into(),
                        date: d(2, 20),
                        comment: "Closed, replaced fuse".into(),
                    },
                ],
            },
            Ticket {
                id: "ELE-0002".into(),
                category: "Electrical Non-Conformities".into(),
                open_date: d(3, 5),
                initial_description: "Grounding problem".into(),
                status_history: vec![StatusEntry {
                    status: "Open".into(),
                    date: d(3, 5),
                    comment: "Raised".into(),
                }],
            },
        ]
    }

    #[test]
    fn flatten_repeats_ticket_fields() {
        let rows = flatten(&tickets());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].ticket_id, "ELE-0001");
        assert_eq!(rows[1].status, "Closure");
        assert_eq!(rows[1].status_date, "2021-02-20");
        assert_eq!(rows[1].open_date, "2021-02-01");
        assert_eq!(rows[2].ticket_id, "ELE-0002");
    }

    #[test]
    fn csv_has_header_and_quotes_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        assert_eq!(write_csv(&path, &tickets()).unwrap(), 3);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(
            "Ticket ID,Category,Open Date,Initial Description,Status,Status Date,Comment\n"
        ));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<StatusRow> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, flatten(&tickets()));
        assert_eq!(rows[0].comment, "Line one\nline two");
        assert_eq!(rows[0].initial_description, "Blown fuse, \"F12\" on panel B");
    }

    #[test]
    fn csv_for_empty_set_is_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        assert_eq!(write_csv(&path, &[]).unwrap(), 0);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn json_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &tickets()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"Status History\""));
        let back: Vec<Ticket> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, tickets());
    }
}
