use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One dated entry in a ticket's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Comment")]
    pub comment: String,
}

/// A fully generated non-conformity ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "Ticket ID")]
    pub id: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Open Date")]
    pub open_date: NaiveDate,
    #[serde(rename = "Initial Description")]
    pub initial_description: String,
    #[serde(rename = "Status History")]
    pub status_history: Vec<StatusEntry>,
}

impl Ticket {
    /// Date of the last history entry, or the open date for an empty history.
    #[cfg(test)]
    pub fn last_update(&self) -> NaiveDate {
        self.status_history
            .last()
            .map(|e| e.date)
            .unwrap_or(self.open_date)
    }

    #[cfg(test)]
    pub fn count_status(&self, status: &str) -> usize {
        self.status_history
            .iter()
            .filter(|e| e.status == status)
            .count()
    }
}

/// `[<prefix>-]<CODE>-<NNNN>`, sequence starting at 1.
pub fn ticket_id(prefix: Option<&str>, code: &str, seq: usize) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}-{code}-{seq:04}"),
        _ => format!("{code}-{seq:04}"),
    }
}

/// Label of one per-action entry.
pub fn action_label(status: &str, action: &str) -> String {
    format!("{status} - {action}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Ticket {
        let d = |day| NaiveDate::from_ymd_opt(2023, 5, day).unwrap();
        Ticket {
            id: "MEC-0001".into(),
            category: "Mechanical Non-Conformities".into(),
            open_date: d(1),
            initial_description: "Torque out of tolerance".into(),
            status_history: vec![
                StatusEntry {
                    status: "Open".into(),
                    date: d(1),
                    comment: "Raised".into(),
                },
                StatusEntry {
                    status: "Closure".into(),
                    date: d(9),
                    comment: "Closed".into(),
                },
            ],
        }
    }

    #[test]
    fn ids_are_zero_padded() {
        assert_eq!(ticket_id(None, "MEC", 1), "MEC-0001");
        assert_eq!(ticket_id(None, "QUAL", 123), "QUAL-0123");
        assert_eq!(ticket_id(Some("A220"), "ELE", 7), "A220-ELE-0007");
        assert_eq!(ticket_id(Some(""), "ELE", 7), "ELE-0007");
    }

    #[test]
    fn action_label_suffix() {
        assert_eq!(
            action_label("Validation of corrective actions", "Action 2"),
            "Validation of corrective actions - Action 2"
        );
    }

    #[test]
    fn json_uses_report_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["Ticket ID"], "MEC-0001");
        assert_eq!(json["Open Date"], "2023-05-01");
        assert_eq!(json["Status History"][1]["Date"], "2023-05-09");
        assert_eq!(json["Status History"][0]["Status"], "Open");
    }

    #[test]
    fn json_reads_back() {
        let json = serde_json::to_string(&sample()).unwrap();
        let parsed: Ticket = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn last_update_and_counts() {
        let t = sample();
        assert_eq!(t.last_update(), NaiveDate::from_ymd_opt(2023, 5, 9).unwrap());
        assert_eq!(t.count_status("Open"), 1);
        assert_eq!(t.count_status("Missing"), 0);
    }
}
