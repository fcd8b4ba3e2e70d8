use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::event::EventId;

/// Ticket state as reported by the backend. Never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketInfo {
    pub id: i64,
    /// Stored by the backend as text or as an integer, depending on who
    /// issued the ticket.
    #[serde(default, deserialize_with = "holder_id")]
    pub user_id: Option<String>,
    pub seat: String,
    #[serde(alias = "scaned")]
    pub scanned: bool,
    #[serde(default, alias = "scaned_at")]
    pub scanned_at: Option<String>,
}

impl TicketInfo {
    pub fn holder(&self) -> &str {
        self.user_id.as_deref().unwrap_or("N/A")
    }

    /// Parsed prior scan time. The backend has emitted both RFC 3339 and
    /// `%Y-%m-%d %H:%M:%S` (implicitly UTC).
    pub fn scanned_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.scanned_at.as_deref()?.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHolderId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

fn holder_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(
        Option::<RawHolderId>::deserialize(deserializer)?.map(|raw| match raw {
            RawHolderId::Text(text) => text,
            RawHolderId::Signed(n) => n.to_string(),
            RawHolderId::Unsigned(n) => n.to_string(),
        }),
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub ticket_info: TicketInfo,
}

/// Body shared by `/ticket/validate` and `/ticket/update_scaned`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub qr_content: String,
    pub event_id: EventId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub event_id: EventId,
    pub seat: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl NewTicket {
    /// File name the rendered ticket is saved under.
    pub fn file_name(&self) -> String {
        format!(
            "ticket_{}_{}.pdf",
            self.event_id,
            self.user_id.as_deref().unwrap_or("generated")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_info_accepts_backend_spelling() {
        let info: TicketInfo = serde_json::from_str(
            r#"{"id": 1, "user_id": "bob", "seat": "A1", "scaned": true, "scaned_at": "2024-01-01 10:00:00"}"#,
        )
        .unwrap();
        assert!(info.scanned);
        assert_eq!(
            info.scanned_at_utc().unwrap().to_rfc3339(),
            "2024-01-01T10:00:00+00:00"
        );
    }

    #[test]
    fn test_scanned_at_rfc3339() {
        let info: TicketInfo = serde_json::from_str(
            r#"{"id": 1, "seat": "A1", "scanned": true, "scanned_at": "2024-01-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(info.holder(), "N/A");
        assert!(info.scanned_at_utc().is_some());
    }

    #[test]
    fn test_numeric_holder_id() {
        let info: TicketInfo = serde_json::from_str(
            r#"{"id": 1, "user_id": 7, "seat": "A1", "scaned": false, "scaned_at": null}"#,
        )
        .unwrap();
        assert_eq!(info.holder(), "7");

        let info: TicketInfo =
            serde_json::from_str(r#"{"id": 2, "user_id": null, "seat": "A2", "scaned": false}"#)
                .unwrap();
        assert!(info.user_id.is_none());
    }

    #[test]
    fn test_new_ticket_omits_missing_user() {
        let ticket = NewTicket {
            event_id: EventId::new("42"),
            seat: "B7".into(),
            user_id: None,
        };
        let body = serde_json::to_value(&ticket).unwrap();
        assert!(body.get("user_id").is_none());
        assert_eq!(ticket.file_name(), "ticket_42_generated.pdf");
    }
}
